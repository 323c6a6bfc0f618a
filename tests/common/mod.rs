use baituljannah_web::config::{Config, WebConfig};
use baituljannah_web::setup::db_setup::{initialize_database, SeedAdmin};
use baituljannah_web::{build_pool, DbPool};
use r2d2_sqlite::SqliteConnectionManager;
use std::time::Duration;
use tera::Tera;

pub const ADMIN_PREFIX: &str = "test-admin";
pub const ADMIN_PASSWORD: &str = "admin123";

pub fn test_config() -> Config {
    Config {
        web: WebConfig { host: "127.0.0.1".to_string(), port: 0 },
        database_path: "/tmp".to_string(),
        allowed_origins: "*".to_string(),
        log_level: "warn".to_string(),
        session_secret_key: "ab".repeat(64),
        admin_url_prefix: ADMIN_PREFIX.to_string(),
        use_secure_cookies: false,
        db_pool_size: 1,
        db_connection_timeout_secs: 5,
        activity_log_retention_days: 30,
        bcrypt_cost: 4,
        default_admin_password: ADMIN_PASSWORD.to_string(),
    }
}

/// In-memory database with the schema and seed rows applied.
pub fn test_pool() -> DbPool {
    let pool = build_pool(SqliteConnectionManager::memory(), 1, Duration::from_secs(5));
    let seed = SeedAdmin { password: ADMIN_PASSWORD.to_string(), bcrypt_cost: 4 };
    initialize_database(&pool, &seed).expect("schema setup");
    pool
}

pub fn test_tera() -> Tera {
    Tera::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*.html")).expect("templates")
}

pub fn admin_url(path: &str) -> String {
    format!("/management/{}{}", ADMIN_PREFIX, path)
}
