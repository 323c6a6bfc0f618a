use super::{blocking, error_page, json_ok, page_context, redirect, render};
use crate::config::Config;
use crate::helper::activity_helpers::{self, RequestMeta};
use crate::helper::{admin_helpers, message_helpers, news_helpers, registration_helpers, ServiceError};
use crate::middleware::AuthenticatedAdmin;
use crate::models::{ActivityLogFilter, AdminInput, ApiResponse, PasswordChange};
use crate::DbPool;
use actix_session::Session;
use actix_web::http::StatusCode;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};

const DASHBOARD_RECENT_COUNT: u32 = 5;

#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
pub struct CleanupQuery {
    days: Option<u32>,
}

#[derive(Deserialize)]
pub struct MessageQuery {
    kind: Option<String>,
    limit: Option<u32>,
}

#[derive(Serialize)]
struct CleanupResult {
    removed: usize,
    days: u32,
}

pub fn config_admin(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::get().to(show_login_form))
        .route("/login", web::post().to(handle_login))
        .route("/logout", web::post().to(handle_logout))
        .route("/dashboard", web::get().to(show_dashboard))
        .route("/api/me", web::get().to(current_admin))
        .route("/api/admins", web::get().to(list_admins))
        .route("/api/admins", web::post().to(create_admin))
        .route("/api/admins/{id}", web::get().to(get_admin))
        .route("/api/admins/{id}", web::put().to(update_admin))
        .route("/api/admins/{id}", web::delete().to(delete_admin))
        .route("/api/account/password", web::post().to(change_password))
        .route("/api/activity-logs", web::get().to(list_activity_logs))
        .route("/api/activity-logs/cleanup", web::post().to(cleanup_activity_logs))
        .route("/api/messages", web::get().to(list_messages));
}

fn login_context(config: &Config, username: &str, error: Option<&str>) -> Context {
    let mut ctx = page_context("Login Admin - SMPTI Baituljannah");
    ctx.insert("admin_base_url", &config.admin_base_url());
    ctx.insert("username", username);
    if let Some(error) = error {
        ctx.insert("error", error);
    }
    ctx
}

async fn show_login_form(
    admin: Option<AuthenticatedAdmin>,
    tera: web::Data<Tera>,
    config: web::Data<Config>,
) -> HttpResponse {
    if admin.is_some() {
        return redirect(&config.admin_dashboard_url());
    }
    render(&tera, "admin/login.html", &login_context(&config, "", None), StatusCode::OK)
}

async fn handle_login(
    req: HttpRequest,
    session: Session,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    form: web::Form<LoginForm>,
) -> HttpResponse {
    let LoginForm { username, password } = form.into_inner();
    let meta = RequestMeta::from_request(&req);
    let attempted = username.clone();

    let result = blocking(move || {
        let admin = admin_helpers::authenticate_admin(&pool, &username, &password)?;
        activity_helpers::record_activity(&pool, Some(admin.id), "login", "Login ke panel admin", &meta);
        Ok(admin)
    })
    .await;

    match result {
        Ok(admin) => {
            let signed_in = AuthenticatedAdmin { id: admin.id, username: admin.username, role: admin.role };
            if let Err(e) = signed_in.store(&session) {
                log::error!("Failed to store admin session: {}", e);
                return HttpResponse::InternalServerError().body("Session error");
            }
            log::info!("Admin '{}' logged in", signed_in.username);
            redirect(&config.admin_dashboard_url())
        }
        Err(e) => {
            let status = actix_web::ResponseError::status_code(&e);
            if status.is_server_error() {
                log::error!("Login failed for '{}': {}", attempted, e);
            }
            let ctx = login_context(&config, &attempted, Some(e.public_message().as_str()));
            render(&tera, "admin/login.html", &ctx, status)
        }
    }
}

async fn handle_logout(
    req: HttpRequest,
    admin: Option<AuthenticatedAdmin>,
    session: Session,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> HttpResponse {
    if let Some(admin) = admin {
        let meta = RequestMeta::from_request(&req);
        let logged = blocking(move || {
            activity_helpers::record_activity(&pool, Some(admin.id), "logout", "Logout dari panel admin", &meta);
            Ok(())
        })
        .await;
        if let Err(e) = logged {
            log::error!("Failed to record logout: {}", e);
        }
    }
    session.purge();
    redirect(&config.admin_login_url())
}

async fn show_dashboard(
    admin: AuthenticatedAdmin,
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> HttpResponse {
    let loaded = blocking(move || {
        let registration_stats = registration_helpers::registration_stats(&pool)?;
        let news_stats = news_helpers::news_stats(&pool)?;
        let recent = registration_helpers::recent_registrations(&pool, DASHBOARD_RECENT_COUNT)?;
        Ok((registration_stats, news_stats, recent))
    })
    .await;

    match loaded {
        Ok((registration_stats, news_stats, recent)) => {
            let mut ctx = page_context("Dashboard Admin - SMPTI Baituljannah");
            ctx.insert("admin", &admin);
            ctx.insert("admin_base_url", &config.admin_base_url());
            ctx.insert("registration_stats", &registration_stats);
            ctx.insert("news_stats", &news_stats);
            ctx.insert("recent_registrations", &recent);
            render(&tera, "admin/dashboard.html", &ctx, StatusCode::OK)
        }
        Err(e) => error_page(&tera, &e),
    }
}

async fn current_admin(admin: AuthenticatedAdmin) -> HttpResponse {
    json_ok(admin)
}

// --- Admin accounts ---

async fn list_admins(_admin: AuthenticatedAdmin, pool: web::Data<DbPool>) -> Result<HttpResponse, ServiceError> {
    let admins = blocking(move || admin_helpers::list_admins(&pool)).await?;
    Ok(json_ok(admins))
}

async fn get_admin(
    _admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let found = blocking(move || admin_helpers::find_admin_by_id(&pool, id)).await?;
    Ok(json_ok(found))
}

async fn create_admin(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    input: web::Json<AdminInput>,
) -> Result<HttpResponse, ServiceError> {
    let meta = RequestMeta::from_request(&req);
    let cost = config.bcrypt_cost;
    let created = blocking(move || {
        let created = admin_helpers::create_admin(&pool, &input, cost)?;
        let description = format!("Membuat admin: {}", created.username);
        activity_helpers::record_activity(&pool, Some(admin.id), "create_admin", &description, &meta);
        Ok(created)
    })
    .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(created)))
}

async fn update_admin(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    id: web::Path<i64>,
    input: web::Json<AdminInput>,
) -> Result<HttpResponse, ServiceError> {
    let meta = RequestMeta::from_request(&req);
    let cost = config.bcrypt_cost;
    let id = id.into_inner();
    let updated = blocking(move || {
        let updated = admin_helpers::update_admin(&pool, id, &input, cost)?;
        let description = format!("Memperbarui admin: {}", updated.username);
        activity_helpers::record_activity(&pool, Some(admin.id), "update_admin", &description, &meta);
        Ok(updated)
    })
    .await?;
    Ok(json_ok(updated))
}

async fn delete_admin(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let meta = RequestMeta::from_request(&req);
    let id = id.into_inner();
    let deleted = blocking(move || {
        let deleted = admin_helpers::delete_admin(&pool, id, admin.id)?;
        let description = format!("Menghapus admin: {}", deleted.username);
        activity_helpers::record_activity(&pool, Some(admin.id), "delete_admin", &description, &meta);
        Ok(deleted)
    })
    .await?;
    Ok(json_ok(deleted))
}

async fn change_password(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    change: web::Json<PasswordChange>,
) -> Result<HttpResponse, ServiceError> {
    let meta = RequestMeta::from_request(&req);
    let cost = config.bcrypt_cost;
    blocking(move || {
        admin_helpers::change_password(&pool, admin.id, &change, cost)?;
        activity_helpers::record_activity(&pool, Some(admin.id), "change_password", "Mengubah password", &meta);
        Ok(())
    })
    .await?;
    Ok(json_ok("Password berhasil diubah"))
}

// --- Activity logs and messages ---

async fn list_activity_logs(
    _admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    filter: web::Query<ActivityLogFilter>,
) -> Result<HttpResponse, ServiceError> {
    let filter = filter.into_inner();
    let logs = blocking(move || activity_helpers::list_activity(&pool, &filter)).await?;
    Ok(json_ok(logs))
}

async fn cleanup_activity_logs(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    query: web::Query<CleanupQuery>,
) -> Result<HttpResponse, ServiceError> {
    let meta = RequestMeta::from_request(&req);
    let days = query.days.unwrap_or(config.activity_log_retention_days);
    let removed = blocking(move || {
        let removed = activity_helpers::cleanup_activity(&pool, days)?;
        let description = format!("Menghapus {} log aktivitas lebih dari {} hari", removed, days);
        activity_helpers::record_activity(&pool, Some(admin.id), "cleanup_logs", &description, &meta);
        Ok(removed)
    })
    .await?;
    Ok(json_ok(CleanupResult { removed, days }))
}

async fn list_messages(
    _admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    query: web::Query<MessageQuery>,
) -> Result<HttpResponse, ServiceError> {
    let MessageQuery { kind, limit } = query.into_inner();
    let messages = blocking(move || message_helpers::list_messages(&pool, kind.as_deref(), limit)).await?;
    Ok(json_ok(messages))
}
