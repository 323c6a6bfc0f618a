use crate::models::ApiResponse;
use crate::DbPool;
use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use bcrypt::BcryptError;
use rusqlite::Connection;
use thiserror::Error;

pub mod activity_helpers;
pub mod admin_helpers;
pub mod content_helpers;
pub mod export_helpers;
pub mod form_helpers;
pub mod message_helpers;
pub mod news_helpers;
pub mod public_helpers;
pub mod registration_helpers;
pub mod sanitization_helpers;
pub mod school_page_helpers;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Username atau password salah")]
    InvalidCredentials,
    #[error("Database unavailable: {0}")]
    DatabaseUnavailable(#[from] r2d2::Error),
    #[error("Database operation failed: {0}")]
    DatabaseOperationFailed(#[from] rusqlite::Error),
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] BcryptError),
    #[error("Export failed: {0}")]
    Export(String),
    #[error("Background task was cancelled")]
    Blocking,
}

impl From<BlockingError> for ServiceError {
    fn from(_: BlockingError) -> Self {
        ServiceError::Blocking
    }
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    /// Message safe to show to the client. Internal failures stay generic.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Validation(_) | ServiceError::NotFound(_) | ServiceError::InvalidCredentials => {
                self.to_string()
            }
            _ => "Terjadi kesalahan pada server".to_string(),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        }
        HttpResponse::build(status).json(ApiResponse::error(self.public_message()))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Runs one operation on its own pooled connection, released before returning.
pub fn with_conn<T>(pool: &DbPool, op: impl FnOnce(&Connection) -> ServiceResult<T>) -> ServiceResult<T> {
    let conn = pool.get()?;
    op(&conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn internal_errors_hide_details() {
        let err = ServiceError::DatabaseOperationFailed(rusqlite::Error::InvalidQuery);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("Terjadi kesalahan pada server"));
        assert!(!text.contains("InvalidQuery"));
    }

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(ServiceError::validation("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ServiceError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ServiceError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
    }
}
