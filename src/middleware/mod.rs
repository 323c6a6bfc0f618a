use crate::config::Config;
use crate::models::AdminRole;
use actix_session::storage::CookieSessionStore;
use actix_session::{Session, SessionExt, SessionInsertError, SessionMiddleware};
use actix_web::cookie::{Key, SameSite};
use actix_web::error::InternalError;
use actix_web::{dev, web, FromRequest, HttpRequest, HttpResponse};
use serde::Serialize;
use std::future::{ready, Ready};

pub const SESSION_ADMIN_ID: &str = "admin_id";
pub const SESSION_ADMIN_USERNAME: &str = "admin_username";
pub const SESSION_ADMIN_ROLE: &str = "admin_role";

/// Cookie-backed sessions: http-only, SameSite=Lax, `secure` per configuration.
pub fn session_middleware(key: Key, secure: bool) -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_secure(secure)
        .cookie_http_only(true)
        .cookie_same_site(SameSite::Lax)
        .build()
}

/// The admin attached to the current session.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedAdmin {
    pub id: i64,
    pub username: String,
    pub role: AdminRole,
}

impl AuthenticatedAdmin {
    pub fn store(&self, session: &Session) -> Result<(), SessionInsertError> {
        session.renew();
        session.insert(SESSION_ADMIN_ID, self.id)?;
        session.insert(SESSION_ADMIN_USERNAME, &self.username)?;
        session.insert(SESSION_ADMIN_ROLE, self.role)?;
        Ok(())
    }

    fn from_session(session: &Session) -> Option<Self> {
        let id = session.get::<i64>(SESSION_ADMIN_ID).ok()??;
        let username = session.get::<String>(SESSION_ADMIN_USERNAME).ok()??;
        let role = session.get::<AdminRole>(SESSION_ADMIN_ROLE).ok()??;
        Some(Self { id, username, role })
    }
}

impl FromRequest for AuthenticatedAdmin {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    /// Missing or malformed session markers redirect to the login page.
    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        if let Some(admin) = Self::from_session(&req.get_session()) {
            return ready(Ok(admin));
        }
        let login_url = req
            .app_data::<web::Data<Config>>()
            .map(|config| config.admin_login_url())
            .unwrap_or_else(|| "/".to_string());
        let redirect = HttpResponse::Found().append_header(("location", login_url)).finish();
        ready(Err(InternalError::from_response("Not logged in.", redirect).into()))
    }
}
