use crate::helper::{ServiceError, ServiceResult};
use crate::models::ApiResponse;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};

pub mod admin;
pub mod admin_content;
pub mod admin_registrations;
pub mod public;

/// Body of every status-change endpoint.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// Mounts the public site and the admin back-office under `/management/<prefix>`.
pub fn config_app(cfg: &mut web::ServiceConfig, admin_url_prefix: &str) {
    cfg.configure(public::config_public)
        .service(
            web::scope(&format!("/management/{}", admin_url_prefix))
                .configure(admin::config_admin)
                .configure(admin_registrations::config_registrations)
                .configure(admin_content::config_content),
        )
        .default_service(web::to(public::not_found));
}

/// Runs storage work on the blocking pool.
pub(crate) async fn blocking<T, F>(op: F) -> ServiceResult<T>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    web::block(op).await?
}

pub(crate) fn page_context(title: &str) -> Context {
    let mut ctx = Context::new();
    ctx.insert("title", title);
    ctx
}

pub(crate) fn render(tera: &Tera, template: &str, ctx: &Context, status: StatusCode) -> HttpResponse {
    match tera.render(template, ctx) {
        Ok(rendered) => HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(rendered),
        Err(e) => {
            log::error!("Failed to render template '{}': {:?}", template, e);
            HttpResponse::InternalServerError().body("Template error")
        }
    }
}

/// HTML counterpart of `ServiceError::error_response`.
pub(crate) fn error_page(tera: &Tera, err: &ServiceError) -> HttpResponse {
    let status = actix_web::ResponseError::status_code(err);
    if status.is_server_error() {
        log::error!("{}", err);
    }
    if status == StatusCode::NOT_FOUND {
        let mut ctx = page_context("Halaman Tidak Ditemukan");
        ctx.insert("message", &err.public_message());
        return render(tera, "errors/404.html", &ctx, status);
    }
    let mut ctx = page_context("Terjadi Kesalahan");
    ctx.insert("message", &err.public_message());
    render(tera, "errors/error.html", &ctx, status)
}

pub(crate) fn json_ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(data))
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found().append_header(("location", location)).finish()
}
