use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const SALT_LEN: usize = 16;

#[derive(Debug, FromRow, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: &str, display_name: &str, password: &str) -> Self {
        User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            display_name: display_name.to_string(),
            password_hash: hash_password(password),
            created_at: Utc::now(),
        }
    }

    pub async fn create(
        pool: &PgPool,
        username: &str,
        display_name: &str,
        password: &str,
    ) -> Result<Self, sqlx::Error> {
        let user = User::new(username, display_name, password);

        sqlx::query(
            r#"
            INSERT INTO users (id, username, display_name, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, display_name, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(pool)
        .await
    }

    /// Looks up the user and checks the password. Returns None on unknown
    /// username or mismatch; the caller cannot tell which.
    pub async fn authenticate(
        pool: &PgPool,
        username: &str,
        password: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = Self::find_by_username(pool, username).await?;
        Ok(user.filter(|u| verify_password(&u.password_hash, password)))
    }

    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, display_name, password_hash, created_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Deletes by id without checking existence first.
    pub async fn delete(pool: &PgPool, id: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }
}

/// Salted SHA-256, stored as `<hex salt>$<hex digest>`.
fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    let digest = salted_digest(&salt, password);
    format!("{}${}", hex::encode(salt), hex::encode(digest))
}

fn salted_digest(salt: &[u8], password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().into()
}

fn verify_password(stored: &str, password: &str) -> bool {
    let (salt_hex, digest_hex) = match stored.split_once('$') {
        Some(parts) => parts,
        None => return false,
    };

    match (hex::decode(salt_hex), hex::decode(digest_hex)) {
        (Ok(salt), Ok(expected)) => salted_digest(&salt, password).as_slice() == expected,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trips() {
        let stored = hash_password("hunter2");
        assert!(verify_password(&stored, "hunter2"));
        assert!(!verify_password(&stored, "hunter3"));
        assert!(!verify_password(&stored, ""));
    }

    #[test]
    fn salts_are_random() {
        assert_ne!(hash_password("hunter2"), hash_password("hunter2"));
    }

    #[test]
    fn malformed_stored_hash_never_verifies() {
        assert!(!verify_password("", "hunter2"));
        assert!(!verify_password("no-separator", "hunter2"));
        assert!(!verify_password("zz$not-hex", "hunter2"));
    }

    #[test]
    fn serialization_excludes_password_hash() {
        let user = User::new("bob", "Bob", "hunter2");
        let body = serde_json::to_value(&user).unwrap();

        assert_eq!(body["username"], "bob");
        assert_eq!(body["display_name"], "Bob");
        assert!(body.get("password_hash").is_none());
        assert!(body.get("password").is_none());
    }
}
