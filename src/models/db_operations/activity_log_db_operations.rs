use super::FilterClause;
use crate::models::{ActivityLog, NewActivityLog};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Result as RusqliteResult, Row};

pub const DEFAULT_LOG_LIMIT: u32 = 100;

fn map_log(row: &Row) -> RusqliteResult<ActivityLog> {
    Ok(ActivityLog {
        id: row.get(0)?,
        admin_id: row.get(1)?,
        action: row.get(2)?,
        description: row.get(3)?,
        ip_address: row.get(4)?,
        user_agent: row.get(5)?,
        created_at: row.get(6)?,
        username: row.get(7)?,
        full_name: row.get(8)?,
    })
}

pub fn insert_log(conn: &Connection, entry: &NewActivityLog) -> RusqliteResult<i64> {
    insert_log_at(conn, entry, Utc::now())
}

/// Inserts with an explicit timestamp.
pub fn insert_log_at(conn: &Connection, entry: &NewActivityLog, created_at: DateTime<Utc>) -> RusqliteResult<i64> {
    conn.execute(
        "INSERT INTO activity_logs (admin_id, action, description, ip_address, user_agent, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entry.admin_id,
            entry.action,
            entry.description,
            entry.ip_address,
            entry.user_agent,
            created_at
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Lists logs newest first, joined with the acting admin.
/// `action` is a substring match, `date` matches the calendar day (`YYYY-MM-DD`).
pub fn read_logs(
    conn: &Connection,
    action: Option<&str>,
    date: Option<&str>,
    admin_id: Option<i64>,
    limit: u32,
) -> RusqliteResult<Vec<ActivityLog>> {
    let mut clause = FilterClause::new();
    if let Some(action) = action {
        clause.search(&["al.action"], action);
    }
    if let Some(date) = date {
        clause.raw("date(al.created_at) = ?", vec![Value::Text(date.to_string())]);
    }
    if let Some(admin_id) = admin_id {
        clause.eq("al.admin_id", admin_id);
    }

    let mut sql = format!(
        "SELECT al.id, al.admin_id, al.action, al.description, al.ip_address, al.user_agent, al.created_at,
                au.username, au.full_name
         FROM activity_logs al
         LEFT JOIN admin_users au ON al.admin_id = au.id{}
         ORDER BY al.created_at DESC, al.id DESC",
        clause.where_sql()
    );
    let mut params: Vec<Value> = clause.params().to_vec();
    clause.paginate(&mut sql, &mut params, Some(limit), None);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), map_log)?;
    rows.collect()
}

/// Removes logs created before `cutoff`. Returns the number of rows removed.
pub fn delete_logs_before(conn: &Connection, cutoff: DateTime<Utc>) -> RusqliteResult<usize> {
    conn.execute("DELETE FROM activity_logs WHERE created_at < ?1", [cutoff])
}
