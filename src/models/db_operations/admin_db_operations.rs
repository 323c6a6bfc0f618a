use crate::models::{AdminRole, AdminUser};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result as RusqliteResult, Row};

const ADMIN_COLUMNS: &str = "id, username, email, password, full_name, role, created_at, updated_at";

fn map_admin(row: &Row) -> RusqliteResult<AdminUser> {
    Ok(AdminUser {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        full_name: row.get(4)?,
        role: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Inserts an admin whose password is already hashed. Returns the new id.
pub fn insert_admin(
    conn: &Connection,
    username: &str,
    email: &str,
    password_hash: &str,
    full_name: &str,
    role: AdminRole,
) -> RusqliteResult<i64> {
    let now = Utc::now();
    conn.execute(
        "INSERT INTO admin_users (username, email, password, full_name, role, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![username, email, password_hash, full_name, role, now],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_all_admins(conn: &Connection) -> RusqliteResult<Vec<AdminUser>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM admin_users ORDER BY created_at DESC, id DESC",
        ADMIN_COLUMNS
    ))?;
    let rows = stmt.query_map([], map_admin)?;
    rows.collect()
}

pub fn read_admin_by_id(conn: &Connection, id: i64) -> RusqliteResult<Option<AdminUser>> {
    conn.query_row(
        &format!("SELECT {} FROM admin_users WHERE id = ?1", ADMIN_COLUMNS),
        [id],
        map_admin,
    )
    .optional()
}

pub fn read_admin_by_username(conn: &Connection, username: &str) -> RusqliteResult<Option<AdminUser>> {
    conn.query_row(
        &format!("SELECT {} FROM admin_users WHERE username = ?1", ADMIN_COLUMNS),
        [username],
        map_admin,
    )
    .optional()
}

pub fn read_admin_by_email(conn: &Connection, email: &str) -> RusqliteResult<Option<AdminUser>> {
    conn.query_row(
        &format!("SELECT {} FROM admin_users WHERE email = ?1", ADMIN_COLUMNS),
        [email],
        map_admin,
    )
    .optional()
}

/// Updates profile fields, and the password hash when one is given. Returns affected rows.
pub fn update_admin(
    conn: &Connection,
    id: i64,
    username: &str,
    email: &str,
    full_name: &str,
    role: AdminRole,
    new_password_hash: Option<&str>,
) -> RusqliteResult<usize> {
    let now = Utc::now();
    if let Some(password_hash) = new_password_hash {
        return conn.execute(
            "UPDATE admin_users SET username = ?1, email = ?2, full_name = ?3, role = ?4, password = ?5, updated_at = ?6 WHERE id = ?7",
            params![username, email, full_name, role, password_hash, now, id],
        );
    }

    conn.execute(
        "UPDATE admin_users SET username = ?1, email = ?2, full_name = ?3, role = ?4, updated_at = ?5 WHERE id = ?6",
        params![username, email, full_name, role, now, id],
    )
}

pub fn update_password(conn: &Connection, id: i64, password_hash: &str) -> RusqliteResult<usize> {
    conn.execute(
        "UPDATE admin_users SET password = ?1, updated_at = ?2 WHERE id = ?3",
        params![password_hash, Utc::now(), id],
    )
}

pub fn delete_admin(conn: &Connection, id: i64) -> RusqliteResult<usize> {
    conn.execute("DELETE FROM admin_users WHERE id = ?1", [id])
}

/// Whether `username` or `email` is taken by an account other than `exclude_id`.
pub fn find_conflicts(
    conn: &Connection,
    username: &str,
    email: &str,
    exclude_id: Option<i64>,
) -> RusqliteResult<(bool, bool)> {
    let exclude = exclude_id.unwrap_or(-1);
    let username_taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM admin_users WHERE username = ?1 AND id != ?2)",
        params![username, exclude],
        |row| row.get(0),
    )?;
    let email_taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM admin_users WHERE email = ?1 AND id != ?2)",
        params![email, exclude],
        |row| row.get(0),
    )?;
    Ok((username_taken, email_taken))
}
