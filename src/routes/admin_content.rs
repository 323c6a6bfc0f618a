use super::{blocking, json_ok, StatusUpdate};
use crate::helper::activity_helpers::{self, RequestMeta};
use crate::helper::{content_helpers, news_helpers, ServiceError};
use crate::middleware::AuthenticatedAdmin;
use crate::models::{ApiResponse, NewsFilter, NewsInput, PageRequest, SliderInput, TestimonialInput};
use crate::DbPool;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

const ADMIN_NEWS_PER_PAGE: u32 = 20;

#[derive(Deserialize)]
pub struct NewsListQuery {
    status: Option<String>,
    category: Option<String>,
    search: Option<String>,
    author_id: Option<i64>,
    page: Option<u32>,
    per_page: Option<u32>,
}

pub fn config_content(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/news", web::get().to(list_news))
        .route("/api/news", web::post().to(create_news))
        .route("/api/news/stats", web::get().to(news_stats))
        .route("/api/news/{id:\\d+}", web::get().to(get_news))
        .route("/api/news/{id:\\d+}", web::put().to(update_news))
        .route("/api/news/{id:\\d+}", web::delete().to(delete_news))
        .route("/api/news/{id:\\d+}/status", web::put().to(update_news_status))
        .route("/api/testimonials", web::get().to(list_testimonials))
        .route("/api/testimonials", web::post().to(create_testimonial))
        .route("/api/testimonials/{id:\\d+}", web::get().to(get_testimonial))
        .route("/api/testimonials/{id:\\d+}", web::put().to(update_testimonial))
        .route("/api/testimonials/{id:\\d+}", web::delete().to(delete_testimonial))
        .route("/api/sliders", web::get().to(list_sliders))
        .route("/api/sliders", web::post().to(create_slider))
        .route("/api/sliders/{id:\\d+}", web::get().to(get_slider))
        .route("/api/sliders/{id:\\d+}", web::put().to(update_slider))
        .route("/api/sliders/{id:\\d+}", web::delete().to(delete_slider));
}

// --- News ---

async fn list_news(
    _admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    query: web::Query<NewsListQuery>,
) -> Result<HttpResponse, ServiceError> {
    let query = query.into_inner();
    let request = PageRequest::new(query.page, query.per_page, ADMIN_NEWS_PER_PAGE);
    let filter = NewsFilter {
        status: query.status,
        author_id: query.author_id,
        category: query.category,
        search: query.search,
        limit: None,
        offset: None,
    };
    let page = blocking(move || news_helpers::list_news_page(&pool, &filter, request)).await?;
    Ok(json_ok(page))
}

async fn news_stats(_admin: AuthenticatedAdmin, pool: web::Data<DbPool>) -> Result<HttpResponse, ServiceError> {
    let stats = blocking(move || news_helpers::news_stats(&pool)).await?;
    Ok(json_ok(stats))
}

async fn get_news(
    _admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let news = blocking(move || news_helpers::find_news(&pool, id)).await?;
    Ok(json_ok(news))
}

async fn create_news(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    input: web::Json<NewsInput>,
) -> Result<HttpResponse, ServiceError> {
    let meta = RequestMeta::from_request(&req);
    let news = blocking(move || {
        let news = news_helpers::create_news(&pool, &input, Some(admin.id))?;
        let description = format!("Membuat berita: {}", news.title);
        activity_helpers::record_activity(&pool, Some(admin.id), "create_news", &description, &meta);
        Ok(news)
    })
    .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(news)))
}

async fn update_news(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
    input: web::Json<NewsInput>,
) -> Result<HttpResponse, ServiceError> {
    let meta = RequestMeta::from_request(&req);
    let id = id.into_inner();
    let news = blocking(move || {
        let news = news_helpers::update_news(&pool, id, &input)?;
        let description = format!("Memperbarui berita: {}", news.title);
        activity_helpers::record_activity(&pool, Some(admin.id), "update_news", &description, &meta);
        Ok(news)
    })
    .await?;
    Ok(json_ok(news))
}

async fn update_news_status(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
    body: web::Json<StatusUpdate>,
) -> Result<HttpResponse, ServiceError> {
    let meta = RequestMeta::from_request(&req);
    let id = id.into_inner();
    let news = blocking(move || {
        let news = news_helpers::update_news_status(&pool, id, &body.status)?;
        let description = format!("Mengubah status berita {} menjadi {}", news.title, news.status);
        activity_helpers::record_activity(&pool, Some(admin.id), "update_news_status", &description, &meta);
        Ok(news)
    })
    .await?;
    Ok(json_ok(news))
}

async fn delete_news(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let meta = RequestMeta::from_request(&req);
    let id = id.into_inner();
    let news = blocking(move || {
        let news = news_helpers::delete_news(&pool, id)?;
        let description = format!("Menghapus berita: {}", news.title);
        activity_helpers::record_activity(&pool, Some(admin.id), "delete_news", &description, &meta);
        Ok(news)
    })
    .await?;
    Ok(json_ok(news))
}

// --- Testimonials ---

async fn list_testimonials(_admin: AuthenticatedAdmin, pool: web::Data<DbPool>) -> Result<HttpResponse, ServiceError> {
    let items = blocking(move || content_helpers::list_testimonials(&pool)).await?;
    Ok(json_ok(items))
}

async fn get_testimonial(
    _admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let item = blocking(move || content_helpers::find_testimonial(&pool, id)).await?;
    Ok(json_ok(item))
}

async fn create_testimonial(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    input: web::Json<TestimonialInput>,
) -> Result<HttpResponse, ServiceError> {
    let meta = RequestMeta::from_request(&req);
    let item = blocking(move || {
        let item = content_helpers::create_testimonial(&pool, &input)?;
        let description = format!("Membuat testimoni: {}", item.name);
        activity_helpers::record_activity(&pool, Some(admin.id), "create_testimonial", &description, &meta);
        Ok(item)
    })
    .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(item)))
}

async fn update_testimonial(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
    input: web::Json<TestimonialInput>,
) -> Result<HttpResponse, ServiceError> {
    let meta = RequestMeta::from_request(&req);
    let id = id.into_inner();
    let item = blocking(move || {
        let item = content_helpers::update_testimonial(&pool, id, &input)?;
        let description = format!("Memperbarui testimoni: {}", item.name);
        activity_helpers::record_activity(&pool, Some(admin.id), "update_testimonial", &description, &meta);
        Ok(item)
    })
    .await?;
    Ok(json_ok(item))
}

async fn delete_testimonial(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let meta = RequestMeta::from_request(&req);
    let id = id.into_inner();
    let item = blocking(move || {
        let item = content_helpers::delete_testimonial(&pool, id)?;
        let description = format!("Menghapus testimoni: {}", item.name);
        activity_helpers::record_activity(&pool, Some(admin.id), "delete_testimonial", &description, &meta);
        Ok(item)
    })
    .await?;
    Ok(json_ok(item))
}

// --- Sliders ---

async fn list_sliders(_admin: AuthenticatedAdmin, pool: web::Data<DbPool>) -> Result<HttpResponse, ServiceError> {
    let items = blocking(move || content_helpers::list_sliders(&pool)).await?;
    Ok(json_ok(items))
}

async fn get_slider(
    _admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let id = id.into_inner();
    let item = blocking(move || content_helpers::find_slider(&pool, id)).await?;
    Ok(json_ok(item))
}

async fn create_slider(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    input: web::Json<SliderInput>,
) -> Result<HttpResponse, ServiceError> {
    let meta = RequestMeta::from_request(&req);
    let item = blocking(move || {
        let item = content_helpers::create_slider(&pool, &input)?;
        let description = format!("Membuat slider: {}", item.title);
        activity_helpers::record_activity(&pool, Some(admin.id), "create_slider", &description, &meta);
        Ok(item)
    })
    .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(item)))
}

async fn update_slider(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
    input: web::Json<SliderInput>,
) -> Result<HttpResponse, ServiceError> {
    let meta = RequestMeta::from_request(&req);
    let id = id.into_inner();
    let item = blocking(move || {
        let item = content_helpers::update_slider(&pool, id, &input)?;
        let description = format!("Memperbarui slider: {}", item.title);
        activity_helpers::record_activity(&pool, Some(admin.id), "update_slider", &description, &meta);
        Ok(item)
    })
    .await?;
    Ok(json_ok(item))
}

async fn delete_slider(
    req: HttpRequest,
    admin: AuthenticatedAdmin,
    pool: web::Data<DbPool>,
    id: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let meta = RequestMeta::from_request(&req);
    let id = id.into_inner();
    let item = blocking(move || {
        let item = content_helpers::delete_slider(&pool, id)?;
        let description = format!("Menghapus slider: {}", item.title);
        activity_helpers::record_activity(&pool, Some(admin.id), "delete_slider", &description, &meta);
        Ok(item)
    })
    .await?;
    Ok(json_ok(item))
}
