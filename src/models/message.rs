use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use std::collections::HashSet;
use std::hash::Hash;
use uuid::Uuid;

/// One stored turn of a conversation. Immutable once written.
#[derive(Debug, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: String,
    pub user_id: Option<String>,
    pub content: String,
    pub is_user: bool,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// One row of the admin session overview: the session plus the user metadata
/// of its most recent message.
#[derive(Debug, FromRow, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, FromRow, Serialize)]
pub struct UserSession {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub async fn insert(
        pool: &PgPool,
        session_id: &str,
        user_id: Option<&str>,
        content: &str,
        is_user: bool,
    ) -> Result<Self, sqlx::Error> {
        let message = ChatMessage {
            id: Uuid::new_v4(),
            session_id: session_id.to_string(),
            user_id: user_id.map(str::to_string),
            content: content.to_string(),
            is_user,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO chat_messages (id, session_id, user_id, content, is_user, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(message.id)
        .bind(&message.session_id)
        .bind(&message.user_id)
        .bind(&message.content)
        .bind(message.is_user)
        .bind(message.created_at)
        .execute(pool)
        .await?;

        Ok(message)
    }

    /// All messages of a session in chronological replay order.
    pub async fn for_session(pool: &PgPool, session_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChatMessage>(
            r#"
            SELECT id, session_id, user_id, content, is_user, created_at
            FROM chat_messages
            WHERE session_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(pool)
        .await
    }

    /// One summary per session across all users, most recent first. Sessions
    /// are derived by grouping messages; the first row seen per session (the
    /// newest message) supplies the user metadata.
    pub async fn sessions_overview(pool: &PgPool) -> Result<Vec<SessionSummary>, sqlx::Error> {
        let rows = sqlx::query_as::<_, SessionSummary>(
            r#"
            SELECT m.session_id, m.created_at, m.user_id, u.username, u.display_name
            FROM chat_messages m
            LEFT JOIN users u ON u.id = m.user_id
            ORDER BY m.created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(dedupe_first_seen(rows, |row| row.session_id.clone()))
    }

    /// Session list for a single user, most recent first.
    pub async fn sessions_for_user(
        pool: &PgPool,
        user_id: &str,
    ) -> Result<Vec<UserSession>, sqlx::Error> {
        let rows = sqlx::query_as::<_, UserSession>(
            r#"
            SELECT session_id, created_at
            FROM chat_messages
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(dedupe_first_seen(rows, |row| row.session_id.clone()))
    }
}

/// Keeps the first occurrence of each key, preserving input order.
fn dedupe_first_seen<T, K, F>(rows: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    rows.into_iter().filter(|row| seen.insert(key(row))).collect()
}
