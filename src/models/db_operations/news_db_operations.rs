use super::FilterClause;
use crate::models::{News, NewsQuery, NewsRecord, NewsStats, NewsStatus};
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Result as RusqliteResult, Row};

const NEWS_SELECT: &str = "SELECT n.id, n.title, n.slug, n.content, n.excerpt, n.featured_image, n.category,
        n.author_id, au.username, au.full_name, n.status, n.published_at, n.created_at, n.updated_at
     FROM news n
     LEFT JOIN admin_users au ON n.author_id = au.id";

pub const SEARCH_COLUMNS: [&str; 3] = ["n.title", "n.content", "n.excerpt"];

fn map_news(row: &Row) -> RusqliteResult<News> {
    Ok(News {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        content: row.get(3)?,
        excerpt: row.get(4)?,
        featured_image: row.get(5)?,
        category: row.get(6)?,
        author_id: row.get(7)?,
        author_name: row.get(8)?,
        author_full_name: row.get(9)?,
        status: row.get(10)?,
        published_at: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn filter_clause(query: &NewsQuery) -> FilterClause {
    let mut clause = FilterClause::new();
    if let Some(status) = query.status {
        clause.eq("n.status", status.as_str().to_string());
    }
    if let Some(author_id) = query.author_id {
        clause.eq("n.author_id", author_id);
    }
    if let Some(category) = &query.category {
        clause.eq("n.category", category.clone());
    }
    if let Some(term) = &query.search {
        clause.search(&SEARCH_COLUMNS, term);
    }
    clause
}

fn published_clause(now: DateTime<Utc>) -> FilterClause {
    let mut clause = FilterClause::new();
    clause.eq("n.status", NewsStatus::Published.as_str().to_string());
    clause.raw(
        "n.published_at IS NOT NULL AND julianday(n.published_at) <= julianday(?)",
        vec![Value::Text(now.format("%F %T%.f%:z").to_string())],
    );
    clause
}

pub fn insert_news(conn: &Connection, record: &NewsRecord, author_id: Option<i64>) -> RusqliteResult<i64> {
    conn.execute(
        "INSERT INTO news (title, slug, content, excerpt, featured_image, category, author_id, status, published_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
        params![
            record.title,
            record.slug,
            record.content,
            record.excerpt,
            record.featured_image,
            record.category,
            author_id,
            record.status,
            record.published_at,
            Utc::now()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Rewrites every editable column. The author is left untouched.
pub fn update_news(conn: &Connection, id: i64, record: &NewsRecord) -> RusqliteResult<usize> {
    conn.execute(
        "UPDATE news SET title = ?1, slug = ?2, content = ?3, excerpt = ?4, featured_image = ?5,
            category = ?6, status = ?7, published_at = ?8, updated_at = ?9
         WHERE id = ?10",
        params![
            record.title,
            record.slug,
            record.content,
            record.excerpt,
            record.featured_image,
            record.category,
            record.status,
            record.published_at,
            Utc::now(),
            id
        ],
    )
}

/// Changes the status; `published_at` is only written when it is still NULL.
pub fn update_news_status(
    conn: &Connection,
    id: i64,
    status: NewsStatus,
    published_at: Option<DateTime<Utc>>,
) -> RusqliteResult<usize> {
    conn.execute(
        "UPDATE news SET status = ?1, published_at = COALESCE(published_at, ?2), updated_at = ?3 WHERE id = ?4",
        params![status, published_at, Utc::now(), id],
    )
}

pub fn delete_news(conn: &Connection, id: i64) -> RusqliteResult<usize> {
    conn.execute("DELETE FROM news WHERE id = ?1", [id])
}

pub fn read_news(conn: &Connection, id: i64) -> RusqliteResult<Option<News>> {
    conn.query_row(&format!("{} WHERE n.id = ?1", NEWS_SELECT), [id], map_news)
        .optional()
}

pub fn read_published_news_by_slug(conn: &Connection, slug: &str, now: DateTime<Utc>) -> RusqliteResult<Option<News>> {
    let mut clause = published_clause(now);
    clause.eq("n.slug", slug.to_string());
    conn.query_row(
        &format!("{}{}", NEWS_SELECT, clause.where_sql()),
        params_from_iter(clause.params().iter()),
        map_news,
    )
    .optional()
}

pub fn read_news_list(conn: &Connection, query: &NewsQuery) -> RusqliteResult<Vec<News>> {
    let clause = filter_clause(query);
    let mut sql = format!("{}{} ORDER BY n.created_at DESC, n.id DESC", NEWS_SELECT, clause.where_sql());
    let mut params: Vec<Value> = clause.params().to_vec();
    clause.paginate(&mut sql, &mut params, query.limit, query.offset);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), map_news)?;
    rows.collect()
}

pub fn count_news(conn: &Connection, query: &NewsQuery) -> RusqliteResult<i64> {
    let clause = filter_clause(query);
    conn.query_row(
        &format!("SELECT COUNT(*) FROM news n{}", clause.where_sql()),
        params_from_iter(clause.params().iter()),
        |row| row.get(0),
    )
}

/// Published items visible at `now`, most recently published first.
pub fn read_published_news(
    conn: &Connection,
    now: DateTime<Utc>,
    limit: Option<u32>,
    offset: Option<u32>,
) -> RusqliteResult<Vec<News>> {
    let clause = published_clause(now);
    let mut sql = format!(
        "{}{} ORDER BY n.published_at DESC, n.id DESC",
        NEWS_SELECT,
        clause.where_sql()
    );
    let mut params: Vec<Value> = clause.params().to_vec();
    clause.paginate(&mut sql, &mut params, limit, offset);

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params.iter()), map_news)?;
    rows.collect()
}

pub fn count_published_news(conn: &Connection, now: DateTime<Utc>) -> RusqliteResult<i64> {
    let clause = published_clause(now);
    conn.query_row(
        &format!("SELECT COUNT(*) FROM news n{}", clause.where_sql()),
        params_from_iter(clause.params().iter()),
        |row| row.get(0),
    )
}

/// Whether `slug` belongs to a row other than `exclude_id`.
pub fn slug_exists(conn: &Connection, slug: &str, exclude_id: Option<i64>) -> RusqliteResult<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM news WHERE slug = ?1 AND id IS NOT ?2)",
        params![slug, exclude_id],
        |row| row.get(0),
    )
}

pub fn read_news_stats(conn: &Connection) -> RusqliteResult<NewsStats> {
    conn.query_row(
        "SELECT
            COUNT(*),
            COUNT(CASE WHEN status = 'published' THEN 1 END),
            COUNT(CASE WHEN status = 'draft' THEN 1 END),
            COUNT(CASE WHEN status = 'archived' THEN 1 END),
            COUNT(CASE WHEN date(created_at) = date('now') THEN 1 END)
         FROM news",
        [],
        |row| {
            Ok(NewsStats {
                total: row.get(0)?,
                published: row.get(1)?,
                draft: row.get(2)?,
                archived: row.get(3)?,
                today: row.get(4)?,
            })
        },
    )
}
