use anyhow::{anyhow, bail, Context};
use std::env;

const DEFAULT_PORT: u16 = 3000;

/// Origins the browser frontend is served from. Overridable with
/// `CORS_ALLOWED_ORIGINS` (comma-separated); only consulted in production,
/// development allows any origin.
const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["https://app.pipewise.io", "https://www.pipewise.io"];

#[derive(Clone)]
pub struct AppConfig {
    pub gemini_api_key: String,
    pub database_url: String,
    pub port: u16,
    pub production: bool,
    pub allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, anyhow::Error> {
        let gemini_api_key = get("GEMINI_API_KEY").ok_or_else(|| anyhow!("GEMINI_API_KEY not found"))?;

        let database_url = get("DATABASE_URL").ok_or_else(|| anyhow!("DATABASE_URL not found"))?;

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port number: {}", raw))?,
            None => DEFAULT_PORT,
        };

        let production = get("APP_ENV").as_deref() == Some("production");

        // Keys are opaque tokens of [A-Za-z0-9_-]; anything else in production
        // is almost certainly a paste error, so refuse to start.
        if production && !is_well_formed_key(&gemini_api_key) {
            bail!("GEMINI_API_KEY appears to be malformed");
        }

        let allowed_origins = match get("CORS_ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            None => DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        Ok(AppConfig {
            gemini_api_key,
            database_url,
            port,
            production,
            allowed_origins,
        })
    }
}

fn is_well_formed_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + '_ {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        move |key| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn requires_api_key_and_database_url() {
        let err = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/pipewise")]))
            .unwrap_err();
        assert!(err.to_string().contains("GEMINI_API_KEY"));

        let err = AppConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "abc123")])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn port_defaults_and_parses() {
        let base = [
            ("GEMINI_API_KEY", "abc123"),
            ("DATABASE_URL", "postgres://localhost/pipewise"),
        ];
        let config = AppConfig::from_lookup(lookup(&base)).unwrap();
        assert_eq!(config.port, 3000);
        assert!(!config.production);

        let with_port = [
            ("GEMINI_API_KEY", "abc123"),
            ("DATABASE_URL", "postgres://localhost/pipewise"),
            ("PORT", "8080"),
        ];
        let config = AppConfig::from_lookup(lookup(&with_port)).unwrap();
        assert_eq!(config.port, 8080);

        let bad_port = [
            ("GEMINI_API_KEY", "abc123"),
            ("DATABASE_URL", "postgres://localhost/pipewise"),
            ("PORT", "not-a-port"),
        ];
        assert!(AppConfig::from_lookup(lookup(&bad_port)).is_err());
    }

    #[test]
    fn production_rejects_malformed_key() {
        let vars = [
            ("GEMINI_API_KEY", "abc 123!"),
            ("DATABASE_URL", "postgres://localhost/pipewise"),
            ("APP_ENV", "production"),
        ];
        let err = AppConfig::from_lookup(lookup(&vars)).unwrap_err();
        assert!(err.to_string().contains("malformed"));

        // The same key is accepted outside production.
        let vars = [
            ("GEMINI_API_KEY", "abc 123!"),
            ("DATABASE_URL", "postgres://localhost/pipewise"),
        ];
        assert!(AppConfig::from_lookup(lookup(&vars)).is_ok());
    }

    #[test]
    fn origin_allowlist_parses_and_defaults() {
        let vars = [
            ("GEMINI_API_KEY", "abc-123_XYZ"),
            ("DATABASE_URL", "postgres://localhost/pipewise"),
            ("APP_ENV", "production"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example ,"),
        ];
        let config = AppConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.allowed_origins, vec!["https://a.example", "https://b.example"]);

        let vars = [
            ("GEMINI_API_KEY", "abc-123_XYZ"),
            ("DATABASE_URL", "postgres://localhost/pipewise"),
        ];
        let config = AppConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(config.allowed_origins.len(), DEFAULT_ALLOWED_ORIGINS.len());
    }
}
