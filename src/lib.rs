use std::sync::Arc;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::helper::public_helpers::FallbackContent;

pub type DbPool = Pool<SqliteConnectionManager>;

pub struct AppState {
    /// Content shown on the homepage when the database cannot be read.
    pub fallback: Arc<dyn FallbackContent>,
}

/// Builds the shared connection pool.
///
/// The pool is created without eagerly opening connections so an unreachable
/// database leaves the server running in degraded mode instead of aborting.
pub fn build_pool(manager: SqliteConnectionManager, max_size: u32, connection_timeout: Duration) -> DbPool {
    let manager = manager.with_init(|conn| setup::db_setup::prepare_connection(conn));
    Pool::builder()
        .max_size(max_size)
        .connection_timeout(connection_timeout)
        .build_unchecked(manager)
}

pub mod config;
pub mod helper;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod setup;
