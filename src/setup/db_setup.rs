use crate::helper::public_helpers::{FallbackContent, StaticFallbackContent};
use crate::models::db_operations::content_db_operations;
use crate::models::{SliderInput, TestimonialInput};
use crate::DbPool;
use bcrypt::{hash, BcryptError};
use chrono::Utc;
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, OptionalExtension, Result as RusqliteResult, Transaction};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
    #[error("R2D2 pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Password hashing error: {0}")]
    Bcrypt(#[from] BcryptError),
    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@smpbaituljannah.sch.id";
pub const DEFAULT_ADMIN_FULL_NAME: &str = "Administrator";

/// `app_settings` key written once the placeholder homepage content has been seeded.
const HOMEPAGE_SEEDED_KEY: &str = "homepage_content_seeded";

/// Credentials for the super-admin seeded on first run.
#[derive(Debug, Clone)]
pub struct SeedAdmin {
    pub password: String,
    pub bcrypt_cost: u32,
}

/// Per-connection setup run by the pool for every new connection.
pub fn prepare_connection(conn: &Connection) -> RusqliteResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    // SQLite's lower() only folds ASCII; searches need full Unicode folding.
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|v| v.to_lowercase()))
        },
    )?;
    Ok(())
}

/// Creates every table, applies additive migrations and seeds default rows.
/// Safe to run on every startup.
pub fn setup_database(conn: &mut Connection, seed: &SeedAdmin) -> Result<(), SetupError> {
    let tx = conn.transaction()?;
    create_tables(&tx)?;
    migrate_additive_columns(&tx)?;
    seed_default_admin(&tx, seed)?;
    seed_homepage_content(&tx, &StaticFallbackContent)?;
    tx.commit()?;
    Ok(())
}

/// Runs [`setup_database`] on a pooled connection.
pub fn initialize_database(pool: &DbPool, seed: &SeedAdmin) -> Result<(), SetupError> {
    let mut conn = pool.get()?;
    setup_database(&mut conn, seed)
}

fn create_tables(tx: &Transaction) -> RusqliteResult<()> {
    log::info!("- Ensuring 'admin_users' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS admin_users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            full_name TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'admin' CHECK(role IN ('admin', 'super_admin')),
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    log::info!("- Ensuring 'student_registrations' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS student_registrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            nama_lengkap TEXT NOT NULL,
            tempat_lahir TEXT NOT NULL,
            tanggal_lahir TEXT NOT NULL,
            jenis_kelamin TEXT NOT NULL,
            agama TEXT NOT NULL,
            alamat TEXT NOT NULL,
            no_telepon TEXT,
            email TEXT,
            asal_sekolah TEXT NOT NULL,
            alamat_sekolah TEXT NOT NULL,
            tahun_lulus INTEGER NOT NULL,
            nama_ayah TEXT NOT NULL,
            nama_ibu TEXT NOT NULL,
            pekerjaan_ayah TEXT NOT NULL,
            pekerjaan_ibu TEXT NOT NULL,
            no_telepon_ortu TEXT NOT NULL,
            email_ortu TEXT,
            program_pilihan TEXT NOT NULL,
            motivasi TEXT,
            status TEXT NOT NULL DEFAULT 'pending' CHECK(status IN ('pending', 'approved', 'rejected')),
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    tx.execute("CREATE INDEX IF NOT EXISTS idx_registrations_status ON student_registrations(status)", [])?;
    tx.execute("CREATE INDEX IF NOT EXISTS idx_registrations_program ON student_registrations(program_pilihan)", [])?;
    tx.execute("CREATE INDEX IF NOT EXISTS idx_registrations_created_at ON student_registrations(created_at)", [])?;

    log::info!("- Ensuring 'activity_logs' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS activity_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            admin_id INTEGER,
            action TEXT NOT NULL,
            description TEXT NOT NULL,
            ip_address TEXT,
            user_agent TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (admin_id) REFERENCES admin_users(id) ON DELETE SET NULL
        )",
        [],
    )?;
    tx.execute("CREATE INDEX IF NOT EXISTS idx_activity_logs_admin_id ON activity_logs(admin_id)", [])?;
    tx.execute("CREATE INDEX IF NOT EXISTS idx_activity_logs_created_at ON activity_logs(created_at)", [])?;

    log::info!("- Ensuring 'news' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS news (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            slug TEXT NOT NULL UNIQUE,
            content TEXT NOT NULL,
            excerpt TEXT,
            featured_image TEXT,
            author_id INTEGER,
            status TEXT NOT NULL DEFAULT 'draft' CHECK(status IN ('draft', 'published', 'archived')),
            published_at TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (author_id) REFERENCES admin_users(id) ON DELETE SET NULL
        )",
        [],
    )?;
    tx.execute("CREATE INDEX IF NOT EXISTS idx_news_status ON news(status)", [])?;
    tx.execute("CREATE INDEX IF NOT EXISTS idx_news_published_at ON news(published_at)", [])?;

    log::info!("- Ensuring 'testimonials' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS testimonials (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            image TEXT,
            rating INTEGER NOT NULL DEFAULT 5 CHECK(rating BETWEEN 1 AND 5),
            is_active INTEGER NOT NULL DEFAULT 1,
            display_order INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    log::info!("- Ensuring 'sliders' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS sliders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            subtitle TEXT,
            image TEXT NOT NULL,
            link_url TEXT,
            link_text TEXT,
            is_active INTEGER NOT NULL DEFAULT 1,
            display_order INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    log::info!("- Ensuring 'app_settings' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS app_settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    log::info!("- Ensuring 'contact_messages' table...");
    tx.execute(
        "CREATE TABLE IF NOT EXISTS contact_messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL CHECK(kind IN ('contact', 'consultation')),
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT,
            consultation_type TEXT,
            message TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    Ok(())
}

fn column_exists(tx: &Transaction, table: &str, column: &str) -> RusqliteResult<bool> {
    let mut stmt = tx.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Columns added after the first release. Each one is only added when missing.
fn migrate_additive_columns(tx: &Transaction) -> RusqliteResult<()> {
    if !column_exists(tx, "news", "category")? {
        log::info!("- Adding 'category' column to 'news'...");
        tx.execute("ALTER TABLE news ADD COLUMN category TEXT", [])?;
    }
    tx.execute("CREATE INDEX IF NOT EXISTS idx_news_category ON news(category)", [])?;
    Ok(())
}

fn seed_default_admin(tx: &Transaction, seed: &SeedAdmin) -> Result<(), SetupError> {
    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM admin_users WHERE username = ?1",
            [DEFAULT_ADMIN_USERNAME],
            |row| row.get(0),
        )
        .optional()?;
    if existing.is_some() {
        return Ok(());
    }

    let hashed_password = hash(&seed.password, seed.bcrypt_cost)?;
    let now = Utc::now();
    tx.execute(
        "INSERT OR IGNORE INTO admin_users (username, email, password, full_name, role, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, 'super_admin', ?5, ?5)",
        params![DEFAULT_ADMIN_USERNAME, DEFAULT_ADMIN_EMAIL, hashed_password, DEFAULT_ADMIN_FULL_NAME, now],
    )?;
    log::info!("  > Default admin user '{}' created", DEFAULT_ADMIN_USERNAME);
    Ok(())
}

fn table_is_empty(tx: &Transaction, table: &str) -> RusqliteResult<bool> {
    let count: i64 = tx.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
    Ok(count == 0)
}

fn setting_exists(tx: &Transaction, key: &str) -> RusqliteResult<bool> {
    let found: Option<i64> = tx
        .query_row("SELECT 1 FROM app_settings WHERE key = ?1", [key], |row| row.get(0))
        .optional()?;
    Ok(found.is_some())
}

/// Fills empty testimonial/slider tables with the placeholder dataset, once per database.
/// Content an admin deletes later is not brought back on the next startup.
fn seed_homepage_content(tx: &Transaction, source: &dyn FallbackContent) -> RusqliteResult<()> {
    if setting_exists(tx, HOMEPAGE_SEEDED_KEY)? {
        return Ok(());
    }

    if table_is_empty(tx, "testimonials")? {
        log::info!("- Seeding default testimonials...");
        for t in source.testimonials() {
            content_db_operations::insert_testimonial(
                tx,
                &TestimonialInput {
                    name: t.name,
                    role: t.role,
                    content: t.content,
                    image: t.image,
                    rating: Some(t.rating),
                    is_active: Some(t.is_active),
                    display_order: Some(t.display_order),
                },
            )?;
        }
    }

    if table_is_empty(tx, "sliders")? {
        log::info!("- Seeding default sliders...");
        for s in source.sliders() {
            content_db_operations::insert_slider(
                tx,
                &SliderInput {
                    title: s.title,
                    subtitle: s.subtitle,
                    image: s.image,
                    link_url: s.link_url,
                    link_text: s.link_text,
                    is_active: Some(s.is_active),
                    display_order: Some(s.display_order),
                },
            )?;
        }
    }

    tx.execute(
        "INSERT INTO app_settings (key, value, updated_at) VALUES (?1, 'true', ?2)",
        params![HOMEPAGE_SEEDED_KEY, Utc::now()],
    )?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use r2d2_sqlite::SqliteConnectionManager;
    use std::time::Duration;

    pub const TEST_BCRYPT_COST: u32 = 4;

    /// Single-connection in-memory pool with the full schema applied.
    pub fn migrated_pool() -> DbPool {
        let pool = crate::build_pool(SqliteConnectionManager::memory(), 1, Duration::from_secs(5));
        let seed = SeedAdmin { password: "admin123".to_string(), bcrypt_cost: TEST_BCRYPT_COST };
        if let Err(e) = initialize_database(&pool, &seed) {
            panic!("schema setup failed: {}", e);
        }
        pool
    }

    /// Same pool type, but no tables exist, so every query fails.
    pub fn unmigrated_pool() -> DbPool {
        crate::build_pool(SqliteConnectionManager::memory(), 1, Duration::from_secs(5))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::helper::content_helpers;

    fn count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn setup_is_idempotent() {
        let pool = migrated_pool();
        let seed = SeedAdmin { password: "other".to_string(), bcrypt_cost: TEST_BCRYPT_COST };
        initialize_database(&pool, &seed).unwrap();
        initialize_database(&pool, &seed).unwrap();

        let conn = pool.get().unwrap();
        assert_eq!(count(&conn, "admin_users"), 1);
        assert_eq!(count(&conn, "testimonials") as usize, StaticFallbackContent.testimonials().len());
        assert_eq!(count(&conn, "sliders") as usize, StaticFallbackContent.sliders().len());
    }

    #[test]
    fn deleted_homepage_content_stays_deleted_after_restart() {
        let pool = migrated_pool();
        for t in content_helpers::list_testimonials(&pool).unwrap() {
            content_helpers::delete_testimonial(&pool, t.id).unwrap();
        }
        for s in content_helpers::list_sliders(&pool).unwrap() {
            content_helpers::delete_slider(&pool, s.id).unwrap();
        }

        let seed = SeedAdmin { password: "admin123".to_string(), bcrypt_cost: TEST_BCRYPT_COST };
        initialize_database(&pool, &seed).unwrap();

        assert!(content_helpers::list_testimonials(&pool).unwrap().is_empty());
        assert!(content_helpers::list_sliders(&pool).unwrap().is_empty());
    }

    #[test]
    fn existing_homepage_content_is_not_reseeded_on_upgrade() {
        let pool = migrated_pool();
        {
            let conn = pool.get().unwrap();
            conn.execute("DELETE FROM app_settings", []).unwrap();
        }
        let seed = SeedAdmin { password: "admin123".to_string(), bcrypt_cost: TEST_BCRYPT_COST };
        initialize_database(&pool, &seed).unwrap();

        let conn = pool.get().unwrap();
        assert_eq!(count(&conn, "testimonials") as usize, StaticFallbackContent.testimonials().len());
        assert_eq!(count(&conn, "app_settings"), 1);
    }

    #[test]
    fn seeded_admin_is_super_admin_with_hashed_password() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();
        let (role, password): (String, String) = conn
            .query_row(
                "SELECT role, password FROM admin_users WHERE username = 'admin'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(role, "super_admin");
        assert_ne!(password, "admin123");
        assert!(bcrypt::verify("admin123", &password).unwrap());
    }

    #[test]
    fn category_column_is_added_to_legacy_news_table() {
        let mut conn = Connection::open_in_memory().unwrap();
        prepare_connection(&conn).unwrap();
        conn.execute_batch(
            "CREATE TABLE admin_users (id INTEGER PRIMARY KEY AUTOINCREMENT, username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE, password TEXT NOT NULL, full_name TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'admin', created_at TEXT, updated_at TEXT);
             CREATE TABLE news (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL, slug TEXT NOT NULL UNIQUE,
                content TEXT NOT NULL, excerpt TEXT, featured_image TEXT, author_id INTEGER,
                status TEXT NOT NULL DEFAULT 'draft', published_at TEXT, created_at TEXT, updated_at TEXT);",
        )
        .unwrap();
        let seed = SeedAdmin { password: "admin123".to_string(), bcrypt_cost: TEST_BCRYPT_COST };
        setup_database(&mut conn, &seed).unwrap();
        setup_database(&mut conn, &seed).unwrap();

        let tx = conn.transaction().unwrap();
        assert!(column_exists(&tx, "news", "category").unwrap());
    }

    #[test]
    fn deleting_admin_nulls_activity_log_reference() {
        let pool = migrated_pool();
        let conn = pool.get().unwrap();
        conn.execute("INSERT INTO activity_logs (admin_id, action, description) VALUES (1, 'login', 'x')", [])
            .unwrap();
        conn.execute("DELETE FROM admin_users WHERE id = 1", []).unwrap();
        let admin_id: Option<i64> = conn.query_row("SELECT admin_id FROM activity_logs", [], |row| row.get(0)).unwrap();
        assert_eq!(admin_id, None);
    }
}
