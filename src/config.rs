use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::env;
use config; // Explicitly import the config crate

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    // These fields are populated from the .env file
    pub database_path: String,
    pub allowed_origins: String,
    pub log_level: String,
    pub session_secret_key: String,
    pub admin_url_prefix: String,
    pub use_secure_cookies: bool,
    pub db_pool_size: u32,
    pub db_connection_timeout_secs: u64,
    pub activity_log_retention_days: u32,
    pub bcrypt_cost: u32,
    pub default_admin_password: String,
}

/// The session key must be 128 hexadecimal characters (64 bytes).
pub fn is_valid_session_key(key: &str) -> bool {
    key.len() == 128 && key.chars().all(|c| c.is_ascii_hexdigit())
}

pub fn is_valid_url_prefix(prefix: &str) -> bool {
    !prefix.is_empty() && prefix.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

fn required_env(name: &str) -> Result<String, config::ConfigError> {
    env::var(name).map_err(|_| {
        config::ConfigError::Message(format!("FATAL: Environment variable '{}' is not set in your .env file.", name))
    })
}

fn parse_env_number<T: std::str::FromStr>(name: &str, default: T) -> Result<T, config::ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw.trim().parse::<T>().map_err(|_| {
            config::ConfigError::Message(format!("FATAL: '{}' must be a whole number, got '{}'.", name, raw))
        }),
        _ => Ok(default),
    }
}

impl Config {
    pub fn from_env(env_path: &Path) -> Result<Self, config::ConfigError> {
        // Load the specified .env file. Propagate an error if it fails.
        dotenvy::from_path(env_path)
            .map_err(|e| config::ConfigError::Message(format!(
                "FATAL: Failed to load .env file from '{}'. Error: {}", env_path.display(), e
            )))?;

        let database_path = required_env("DATABASE_PATH")?;

        let session_secret_key = required_env("SESSION_SECRET_KEY")?;
        if !is_valid_session_key(&session_secret_key) {
            return Err(config::ConfigError::Message(
                "FATAL: 'SESSION_SECRET_KEY' must be 128 hexadecimal characters long (64 bytes).".to_string()
            ));
        }

        let admin_url_prefix = required_env("ADMIN_URL_PREFIX")?;
        if !is_valid_url_prefix(&admin_url_prefix) {
            return Err(config::ConfigError::Message(
                "FATAL: 'ADMIN_URL_PREFIX' must not be empty and can only contain letters, numbers, underscores, and hyphens.".to_string()
            ));
        }

        let allowed_origins = env::var("ALLOWED_ORIGINS").unwrap_or_default();
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let use_secure_cookies = env::var("USE_SECURE_COOKIES")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let db_pool_size: u32 = parse_env_number("DB_POOL_SIZE", 10)?;
        let db_connection_timeout_secs: u64 = parse_env_number("DB_CONNECTION_TIMEOUT_SECS", 5)?;
        let activity_log_retention_days: u32 = parse_env_number("ACTIVITY_LOG_RETENTION_DAYS", 30)?;
        let bcrypt_cost: u32 = parse_env_number("BCRYPT_COST", bcrypt::DEFAULT_COST)?;

        if db_pool_size == 0 {
            return Err(config::ConfigError::Message("FATAL: 'DB_POOL_SIZE' must be at least 1.".to_string()));
        }
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(config::ConfigError::Message("FATAL: 'BCRYPT_COST' must be between 4 and 31.".to_string()));
        }

        let default_admin_password = env::var("DEFAULT_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());

        if Path::new(&database_path).is_relative() {
            return Err(config::ConfigError::Message(format!(
                "FATAL: The 'DATABASE_PATH' in your .env file is a relative path ('{}'). It MUST be an absolute path.",
                database_path
            )));
        }

        let builder = config::Config::builder()
            // Web host/port live in the TOML file.
            .add_source(config::File::new("config/default.toml", config::FileFormat::Toml))
            .set_override("database_path", database_path)?
            .set_override("session_secret_key", session_secret_key)?
            .set_override("allowed_origins", allowed_origins)?
            .set_override("log_level", log_level)?
            .set_override("use_secure_cookies", use_secure_cookies)?
            .set_override("admin_url_prefix", admin_url_prefix)?
            .set_override("db_pool_size", i64::from(db_pool_size))?
            .set_override("db_connection_timeout_secs", db_connection_timeout_secs as i64)?
            .set_override("activity_log_retention_days", i64::from(activity_log_retention_days))?
            .set_override("bcrypt_cost", i64::from(bcrypt_cost))?
            .set_override("default_admin_password", default_admin_password)?
            .build()?;

        builder.try_deserialize()
    }

    /// Returns the full path to the SQLite database file.
    pub fn database_file(&self) -> PathBuf {
        PathBuf::from(&self.database_path).join("baituljannah.db")
    }

    pub fn admin_base_url(&self) -> String {
        format!("/management/{}", self.admin_url_prefix)
    }

    pub fn admin_login_url(&self) -> String {
        format!("{}/login", self.admin_base_url())
    }

    pub fn admin_dashboard_url(&self) -> String {
        format!("{}/dashboard", self.admin_base_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_key_must_be_128_hex_chars() {
        assert!(is_valid_session_key(&"ab".repeat(64)));
        assert!(!is_valid_session_key(&"ab".repeat(63)));
        assert!(!is_valid_session_key(&"zz".repeat(64)));
    }

    #[test]
    fn url_prefix_rejects_slashes_and_empty() {
        assert!(is_valid_url_prefix("admin-panel_2"));
        assert!(!is_valid_url_prefix(""));
        assert!(!is_valid_url_prefix("admin/panel"));
    }
}
