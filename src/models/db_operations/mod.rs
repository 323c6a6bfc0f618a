use rusqlite::types::Value;
use rusqlite::{Error as RusqliteError, ErrorCode};

pub mod activity_log_db_operations;
pub mod admin_db_operations;
pub mod content_db_operations;
pub mod message_db_operations;
pub mod news_db_operations;
pub mod registration_db_operations;

/// Accumulates `AND`-joined conditions with positional parameters for list/count queries.
#[derive(Debug, Default)]
pub struct FilterClause {
    conditions: Vec<String>,
    params: Vec<Value>,
}

impl FilterClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.conditions.push(format!("{} = ?", column));
        self.params.push(value.into());
        self
    }

    pub fn raw(&mut self, condition: &str, values: Vec<Value>) -> &mut Self {
        self.conditions.push(condition.to_string());
        self.params.extend(values);
        self
    }

    /// Case-insensitive substring match of `term` against any of `columns`.
    /// A blank term adds no condition.
    pub fn search(&mut self, columns: &[&str], term: &str) -> &mut Self {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() || columns.is_empty() {
            return self;
        }
        let any_column = columns
            .iter()
            .map(|column| format!("instr(unicode_lower(COALESCE({}, '')), ?) > 0", column))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.conditions.push(format!("({})", any_column));
        for _ in columns {
            self.params.push(Value::Text(needle.clone()));
        }
        self
    }

    pub fn where_sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Appends `LIMIT`/`OFFSET`; the offset is only honoured when a limit is set.
    pub fn paginate(&self, sql: &mut String, params: &mut Vec<Value>, limit: Option<u32>, offset: Option<u32>) {
        if let Some(limit) = limit {
            sql.push_str(" LIMIT ?");
            params.push(Value::Integer(i64::from(limit)));
            if let Some(offset) = offset {
                sql.push_str(" OFFSET ?");
                params.push(Value::Integer(i64::from(offset)));
            }
        }
    }
}

/// True when the error is a UNIQUE (or other constraint) violation reported by SQLite.
pub fn is_unique_violation(error: &RusqliteError) -> bool {
    matches!(
        error,
        RusqliteError::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}
