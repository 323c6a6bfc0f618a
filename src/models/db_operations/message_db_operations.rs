use crate::models::{ContactMessage, MessageKind};
use chrono::Utc;
use rusqlite::{params, Connection, Result as RusqliteResult, Row};

fn map_message(row: &Row) -> RusqliteResult<ContactMessage> {
    Ok(ContactMessage {
        id: row.get(0)?,
        kind: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        consultation_type: row.get(5)?,
        message: row.get(6)?,
        created_at: row.get(7)?,
    })
}

pub fn insert_message(
    conn: &Connection,
    kind: MessageKind,
    name: &str,
    email: &str,
    phone: Option<&str>,
    consultation_type: Option<&str>,
    message: &str,
) -> RusqliteResult<i64> {
    conn.execute(
        "INSERT INTO contact_messages (kind, name, email, phone, consultation_type, message, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![kind, name, email, phone, consultation_type, message, Utc::now()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Newest first, optionally restricted to one kind.
pub fn read_messages(conn: &Connection, kind: Option<MessageKind>, limit: u32) -> RusqliteResult<Vec<ContactMessage>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, name, email, phone, consultation_type, message, created_at
         FROM contact_messages
         WHERE (?1 IS NULL OR kind = ?1)
         ORDER BY created_at DESC, id DESC
         LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![kind, limit], map_message)?;
    rows.collect()
}
