use super::form_helpers::filter_value;
use super::{with_conn, ServiceError, ServiceResult};
use crate::models::db_operations::activity_log_db_operations::{self, DEFAULT_LOG_LIMIT};
use crate::models::{ActivityLog, ActivityLogFilter, NewActivityLog};
use crate::DbPool;
use actix_web::HttpRequest;
use chrono::{Duration, NaiveDate, Utc};

/// Client details attached to every activity entry.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestMeta {
    /// Takes the first `X-Forwarded-For` hop when behind a proxy, else the peer address.
    pub fn from_request(req: &HttpRequest) -> Self {
        let ip_address = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()));
        let user_agent = req
            .headers()
            .get("User-Agent")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Self { ip_address, user_agent }
    }
}

/// Appends an audit entry. Failures are logged and never reach the caller.
pub fn record_activity(pool: &DbPool, admin_id: Option<i64>, action: &str, description: &str, meta: &RequestMeta) {
    let entry = NewActivityLog {
        admin_id,
        action: action.to_string(),
        description: description.to_string(),
        ip_address: meta.ip_address.clone(),
        user_agent: meta.user_agent.clone(),
    };
    if let Err(e) = with_conn(pool, |conn| Ok(activity_log_db_operations::insert_log(conn, &entry)?)) {
        log::error!("Failed to record activity '{}': {}", action, e);
    }
}

pub fn list_activity(pool: &DbPool, filter: &ActivityLogFilter) -> ServiceResult<Vec<ActivityLog>> {
    let action = filter_value(filter.action.as_deref());
    let date = filter_value(filter.date.as_deref());
    if let Some(date) = &date {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| ServiceError::validation("Format tanggal harus YYYY-MM-DD"))?;
    }
    let limit = filter.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, 1000);

    with_conn(pool, |conn| {
        Ok(activity_log_db_operations::read_logs(
            conn,
            action.as_deref(),
            date.as_deref(),
            filter.admin_id,
            limit,
        )?)
    })
}

/// Deletes entries older than `days` days. Returns how many were removed.
pub fn cleanup_activity(pool: &DbPool, days: u32) -> ServiceResult<usize> {
    let cutoff = Utc::now() - Duration::days(i64::from(days));
    let removed = with_conn(pool, |conn| Ok(activity_log_db_operations::delete_logs_before(conn, cutoff)?))?;
    log::info!("Removed {} activity log entries older than {} days", removed, days);
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::db_setup::test_support::{migrated_pool, unmigrated_pool};

    fn entry(action: &str) -> NewActivityLog {
        NewActivityLog {
            admin_id: Some(1),
            action: action.to_string(),
            description: format!("{} test", action),
            ..Default::default()
        }
    }

    #[test]
    fn record_activity_swallows_storage_errors() {
        let pool = unmigrated_pool();
        record_activity(&pool, Some(1), "login", "Admin login", &RequestMeta::default());
    }

    #[test]
    fn list_filters_by_action_and_joins_admin() {
        let pool = migrated_pool();
        let meta = RequestMeta { ip_address: Some("10.0.0.1".to_string()), user_agent: None };
        record_activity(&pool, Some(1), "login", "Admin login", &meta);
        record_activity(&pool, Some(1), "update_news", "Edit berita", &meta);

        let all = list_activity(&pool, &ActivityLogFilter { action: Some("all".to_string()), ..Default::default() })
            .unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].action, "update_news");
        assert_eq!(all[0].username.as_deref(), Some("admin"));

        let news_only =
            list_activity(&pool, &ActivityLogFilter { action: Some("news".to_string()), ..Default::default() })
                .unwrap();
        assert_eq!(news_only.len(), 1);
    }

    #[test]
    fn invalid_date_filter_is_rejected() {
        let pool = migrated_pool();
        let filter = ActivityLogFilter { date: Some("18-10-2024".to_string()), ..Default::default() };
        assert!(matches!(list_activity(&pool, &filter), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn cleanup_removes_only_old_entries() {
        let pool = migrated_pool();
        {
            let conn = pool.get().unwrap();
            let old = Utc::now() - Duration::days(45);
            activity_log_db_operations::insert_log_at(&conn, &entry("old"), old).unwrap();
            activity_log_db_operations::insert_log(&conn, &entry("fresh")).unwrap();
        }
        assert_eq!(cleanup_activity(&pool, 30).unwrap(), 1);
        let remaining = list_activity(&pool, &ActivityLogFilter::default()).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].action, "fresh");
    }
}
