use super::form_helpers::{filter_value, optional_non_empty};
use super::sanitization_helpers::{excerpt_from, slugify, strip_all_html};
use super::{with_conn, ServiceError, ServiceResult};
use crate::models::db_operations::news_db_operations;
use crate::models::{News, NewsFilter, NewsInput, NewsQuery, NewsRecord, NewsStats, NewsStatus, Page, PageRequest};
use crate::DbPool;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

pub const PUBLIC_PER_PAGE: u32 = 9;

pub fn parse_status(raw: &str) -> ServiceResult<NewsStatus> {
    NewsStatus::parse(raw).ok_or_else(|| {
        ServiceError::validation(format!(
            "Status tidak valid: '{}'. Gunakan draft, published atau archived",
            raw
        ))
    })
}

pub fn parse_filter(filter: &NewsFilter) -> ServiceResult<NewsQuery> {
    let status = match filter_value(filter.status.as_deref()) {
        Some(raw) => Some(parse_status(&raw)?),
        None => None,
    };
    Ok(NewsQuery {
        status,
        author_id: filter.author_id,
        category: filter_value(filter.category.as_deref()),
        search: filter_value(filter.search.as_deref()),
        limit: filter.limit,
        offset: filter.offset,
    })
}

/// First free slug among `base`, `base-2`, `base-3`, ... ignoring the row `exclude_id`.
fn unique_slug(conn: &Connection, base: &str, exclude_id: Option<i64>) -> rusqlite::Result<String> {
    let mut candidate = base.to_string();
    let mut suffix = 2;
    while news_db_operations::slug_exists(conn, &candidate, exclude_id)? {
        candidate = format!("{}-{}", base, suffix);
        suffix += 1;
    }
    Ok(candidate)
}

/// Cleans and validates input. The slug is resolved separately.
fn build_record(
    conn: &Connection,
    input: &NewsInput,
    exclude_id: Option<i64>,
    previous_published_at: Option<DateTime<Utc>>,
) -> ServiceResult<NewsRecord> {
    let title = strip_all_html(input.title.trim());
    if title.is_empty() {
        return Err(ServiceError::validation("Judul wajib diisi"));
    }
    let content = input.content.trim().to_string();
    if content.is_empty() {
        return Err(ServiceError::validation("Konten wajib diisi"));
    }
    let status = match optional_non_empty(input.status.as_deref()) {
        Some(raw) => parse_status(&raw)?,
        None => NewsStatus::Draft,
    };
    let excerpt = optional_non_empty(input.excerpt.as_deref())
        .map(|e| strip_all_html(&e))
        .unwrap_or_else(|| excerpt_from(&content));
    let published_at = match (previous_published_at, status) {
        (Some(at), _) => Some(at),
        (None, NewsStatus::Published) => Some(Utc::now()),
        (None, _) => None,
    };

    Ok(NewsRecord {
        slug: unique_slug(conn, &slugify(&title), exclude_id)?,
        title,
        content,
        excerpt: Some(excerpt),
        featured_image: optional_non_empty(input.featured_image.as_deref()),
        category: optional_non_empty(input.category.as_deref()).map(|c| strip_all_html(&c)),
        status,
        published_at,
    })
}

pub fn create_news(pool: &DbPool, input: &NewsInput, author_id: Option<i64>) -> ServiceResult<News> {
    let id = with_conn(pool, |conn| {
        let record = build_record(conn, input, None, None)?;
        Ok(news_db_operations::insert_news(conn, &record, author_id)?)
    })?;
    find_news(pool, id)
}

/// Rewrites the article. The slug follows the new title; `published_at` is kept once set.
pub fn update_news(pool: &DbPool, id: i64, input: &NewsInput) -> ServiceResult<News> {
    let existing = find_news(pool, id)?;
    with_conn(pool, |conn| {
        let record = build_record(conn, input, Some(id), existing.published_at)?;
        Ok(news_db_operations::update_news(conn, id, &record)?)
    })?;
    find_news(pool, id)
}

pub fn update_news_status(pool: &DbPool, id: i64, raw_status: &str) -> ServiceResult<News> {
    let status = parse_status(raw_status.trim())?;
    let stamp = (status == NewsStatus::Published).then(Utc::now);
    let changed = with_conn(pool, |conn| Ok(news_db_operations::update_news_status(conn, id, status, stamp)?))?;
    if changed == 0 {
        return Err(ServiceError::not_found("Berita tidak ditemukan"));
    }
    find_news(pool, id)
}

pub fn delete_news(pool: &DbPool, id: i64) -> ServiceResult<News> {
    let news = find_news(pool, id)?;
    with_conn(pool, |conn| Ok(news_db_operations::delete_news(conn, id)?))?;
    Ok(news)
}

pub fn find_news(pool: &DbPool, id: i64) -> ServiceResult<News> {
    with_conn(pool, |conn| Ok(news_db_operations::read_news(conn, id)?))?
        .ok_or_else(|| ServiceError::not_found("Berita tidak ditemukan"))
}

pub fn find_published_news_by_slug(pool: &DbPool, slug: &str) -> ServiceResult<News> {
    with_conn(pool, |conn| Ok(news_db_operations::read_published_news_by_slug(conn, slug, Utc::now())?))?
        .ok_or_else(|| ServiceError::not_found("Berita tidak ditemukan"))
}

pub fn list_news(pool: &DbPool, query: &NewsQuery) -> ServiceResult<Vec<News>> {
    with_conn(pool, |conn| Ok(news_db_operations::read_news_list(conn, query)?))
}

pub fn count_news(pool: &DbPool, query: &NewsQuery) -> ServiceResult<i64> {
    with_conn(pool, |conn| Ok(news_db_operations::count_news(conn, query)?))
}

pub fn list_news_page(pool: &DbPool, filter: &NewsFilter, request: PageRequest) -> ServiceResult<Page<News>> {
    let mut query = parse_filter(filter)?;
    query.limit = Some(request.per_page);
    query.offset = Some(request.offset());
    let items = list_news(pool, &query)?;
    let total = count_news(pool, &query)?;
    Ok(Page::new(items, total, request))
}

pub fn list_published_news(pool: &DbPool, request: PageRequest) -> ServiceResult<Page<News>> {
    let now = Utc::now();
    let items = with_conn(pool, |conn| {
        Ok(news_db_operations::read_published_news(conn, now, Some(request.per_page), Some(request.offset()))?)
    })?;
    let total = with_conn(pool, |conn| Ok(news_db_operations::count_published_news(conn, now)?))?;
    Ok(Page::new(items, total, request))
}

pub fn news_stats(pool: &DbPool) -> ServiceResult<NewsStats> {
    with_conn(pool, |conn| Ok(news_db_operations::read_news_stats(conn)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::db_setup::test_support::migrated_pool;

    fn input(title: &str, status: Option<&str>) -> NewsInput {
        NewsInput {
            title: title.to_string(),
            content: "Isi **berita** sekolah.".to_string(),
            status: status.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn published_at_is_set_once() {
        let pool = migrated_pool();
        let draft = create_news(&pool, &input("Rapat Wali Murid", None), Some(1)).unwrap();
        assert_eq!(draft.status, NewsStatus::Draft);
        assert!(draft.published_at.is_none());

        let published = update_news_status(&pool, draft.id, "published").unwrap();
        let first_stamp = published.published_at.unwrap();

        let edited = update_news(&pool, draft.id, &input("Rapat Wali Murid (Revisi)", Some("published"))).unwrap();
        assert_eq!(edited.published_at, Some(first_stamp));
        assert_eq!(edited.slug, "rapat-wali-murid-revisi");

        update_news_status(&pool, draft.id, "archived").unwrap();
        let republished = update_news_status(&pool, draft.id, "published").unwrap();
        assert_eq!(republished.published_at, Some(first_stamp));
    }

    #[test]
    fn slug_collisions_get_numeric_suffix() {
        let pool = migrated_pool();
        let a = create_news(&pool, &input("Libur Semester", None), None).unwrap();
        let b = create_news(&pool, &input("Libur Semester!", None), None).unwrap();
        let c = create_news(&pool, &input("libur   semester", None), None).unwrap();
        assert_eq!(a.slug, "libur-semester");
        assert_eq!(b.slug, "libur-semester-2");
        assert_eq!(c.slug, "libur-semester-3");

        // Updating keeps the row's own slug instead of bumping it.
        let a2 = update_news(&pool, a.id, &input("Libur Semester", None)).unwrap();
        assert_eq!(a2.slug, "libur-semester");
    }

    #[test]
    fn slug_lookup_excludes_only_the_given_row() {
        let pool = migrated_pool();
        let news = create_news(&pool, &input("Pentas Seni", None), None).unwrap();
        let conn = pool.get().unwrap();
        assert!(news_db_operations::slug_exists(&conn, "pentas-seni", None).unwrap());
        assert!(!news_db_operations::slug_exists(&conn, "pentas-seni", Some(news.id)).unwrap());
        assert!(news_db_operations::slug_exists(&conn, "pentas-seni", Some(news.id + 1)).unwrap());
        assert!(!news_db_operations::slug_exists(&conn, "pentas-seni-2", None).unwrap());
    }

    #[test]
    fn invalid_status_is_rejected_before_storage() {
        let pool = migrated_pool();
        let err = create_news(&pool, &input("Judul", Some("live")), None).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(news_stats(&pool).unwrap().total, 0);
    }

    #[test]
    fn public_listing_only_shows_published() {
        let pool = migrated_pool();
        create_news(&pool, &input("Draf", None), Some(1)).unwrap();
        let live = create_news(&pool, &input("Tayang", Some("published")), Some(1)).unwrap();
        assert_eq!(live.author_name.as_deref(), Some("admin"));
        assert!(live.excerpt.as_deref().unwrap_or_default().contains("Isi berita"));

        let page = list_published_news(&pool, PageRequest::new(None, None, PUBLIC_PER_PAGE)).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(find_published_news_by_slug(&pool, "tayang").unwrap().id, live.id);
        assert!(matches!(find_published_news_by_slug(&pool, "draf"), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn search_spans_title_content_and_excerpt() {
        let pool = migrated_pool();
        create_news(&pool, &input("Lomba Robotik", None), None).unwrap();
        let mut other = input("Kegiatan Pramuka", None);
        other.excerpt = Some("Perkemahan di Puncak".to_string());
        create_news(&pool, &other, None).unwrap();

        let query = parse_filter(&NewsFilter { search: Some("puncak".into()), ..Default::default() }).unwrap();
        let found = list_news(&pool, &query).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Kegiatan Pramuka");
        assert_eq!(count_news(&pool, &parse_filter(&NewsFilter::default()).unwrap()).unwrap(), 2);
    }
}
