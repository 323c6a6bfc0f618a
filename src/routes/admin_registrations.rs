use super::{blocking, json_ok, StatusUpdate};
use crate::helper::activity_helpers::{self, RequestMeta};
use crate::helper::export_helpers::{self, ExportParams};
use crate::helper::{registration_helpers, ServiceError};
use crate::middleware::AuthenticatedAdmin;
use crate::models::{PageRequest, RegistrationFilter};
use crate::DbPool;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

#[derive(Deserialize)]
pub struct RegistrationListQuery {
    status: Option<String>,
    program: Option<String>,
    search: Option<String>,
    page: Option<u32>,
    per_page: Option<u32>,
}

pub fn config_registrations(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/registrations", web::get().to(list_registrations))
        .route("/api/registrations/stats", web::get().to(registration_stats))
        .route("/api/registrations/export", web::get().to(export_registrations))
        .route("/api/registrations/{id:\\d+}", web::get().to(get_registration))
        .route("/api/registrations/{id:\\d+}", web::delete().to(delete_registration))
        .route("/api/registrations/{id:\\d+}/status", web::put().to(update_status));
}

async fn list_registrations(
    _admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    query: web::Query<RegistrationListQuery>,
) -> Result<HttpResponse, ServiceError> {
    let query = query.into_inner();
    let request = PageRequest::new(query.page, query.per_page, registration_helpers::DEFAULT_PER_PAGE);
    let filter = RegistrationFilter {
        status: query.status,
        program: query.program,
        search: query.search,
        limit: None,
        offset: None,
    };
    let page = blocking(move || registration_helpers::list_registrations_page(&pool, &filter, request)).await?;
    Ok(json_ok(page))
}

async fn registration_stats(_admin: AuthenticatedAdmin, pool: web::Data<DbPool>) -> Result<HttpResponse, ServiceError> {
    let stats = blocking(move || registration_helpers::registration_stats(&pool)).await?;
    Ok(json_ok(stats))
}

async fn get_registration(
    _admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let registration = blocking(move || registration_helpers::find_registration(&pool, id)).await?;
    Ok(json_ok(registration))
}

async fn update_status(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
    body: web::Json<StatusUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let meta = RequestMeta::from_request(&req);
    let id = id.into_inner();
    let updated = blocking(move || {
        let updated = registration_helpers::update_registration_status(&pool, id, &body.status)?;
        let description = format!(
            "Mengubah status pendaftaran {} menjadi {}",
            updated.nama_lengkap,
            updated.status.label()
        );
        activity_helpers::record_activity(&pool, Some(admin.id), "update_registration_status", &description, &meta);
        Ok(updated)
    })
    .await?;
    Ok(json_ok(updated))
}

async fn delete_registration(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let meta = RequestMeta::from_request(&req);
    let id = id.into_inner();
    let deleted = blocking(move || {
        let deleted = registration_helpers::delete_registration(&pool, id)?;
        let description = format!("Menghapus pendaftaran: {}", deleted.nama_lengkap);
        activity_helpers::record_activity(&pool, Some(admin.id), "delete_registration", &description, &meta);
        Ok(deleted)
    })
    .await?;
    Ok(json_ok(deleted))
}

/// Streams the selected registrations back as an attachment.
async fn export_registrations(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    params: web::Query<ExportParams>,
) -> Result<HttpResponse, ServiceError> {
    let meta = RequestMeta::from_request(&req);
    let params = params.into_inner();
    let file = blocking(move || {
        let file = export_helpers::export_registrations(&pool, &params)?;
        let description = format!("Export data pendaftaran: {}", file.filename);
        activity_helpers::record_activity(&pool, Some(admin.id), "export_registrations", &description, &meta);
        Ok(file)
    })
    .await?;

    Ok(HttpResponse::Ok()
        .content_type(file.content_type)
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.filename),
        ))
        .body(file.bytes))
}
