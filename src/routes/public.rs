use super::{blocking, error_page, json_ok, page_context, render};
use crate::helper::sanitization_helpers::render_markdown;
use crate::helper::school_page_helpers::{SchoolPage, SCHOOL_PAGES};
use crate::helper::{message_helpers, news_helpers, public_helpers, registration_helpers, ServiceError};
use crate::models::{MessageForm, MessageKind, PageRequest, RegistrationForm};
use crate::{AppState, DbPool};
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tera::{Context, Tera};

const HOME_NEWS_COUNT: u32 = 3;

#[derive(Deserialize)]
pub struct CourseQuery {
    search: Option<String>,
    category: Option<String>,
    sort: Option<String>,
}

#[derive(Deserialize)]
pub struct PageQuery {
    page: Option<u32>,
    per_page: Option<u32>,
}

pub fn config_public(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(home))
        .route("/courses", web::get().to(courses))
        .route("/courses/{id:\\d+}", web::get().to(course_detail))
        .route("/berita", web::get().to(news_list))
        .route("/berita/{slug}", web::get().to(news_detail))
        .route("/contact", web::get().to(contact_form))
        .route("/contact", web::post().to(submit_contact))
        .route("/konsultasi", web::get().to(consultation_form))
        .route("/konsultasi", web::post().to(submit_consultation))
        .route("/daftar-siswa", web::get().to(registration_form))
        .route("/daftar-siswa", web::post().to(submit_registration))
        .service(
            web::scope("/api")
                .route("/is_server_active", web::get().to(is_server_active))
                .route("/news", web::get().to(published_news_api)),
        );

    for page in SCHOOL_PAGES {
        for path in page.paths {
            cfg.route(path, web::get().to(move |tera: web::Data<Tera>| school_page(tera, page)));
        }
    }
}

async fn is_server_active() -> impl Responder {
    HttpResponse::Ok().body("active")
}

pub async fn not_found(tera: web::Data<Tera>) -> HttpResponse {
    error_page(&tera, &ServiceError::not_found("Halaman tidak ditemukan"))
}

async fn home(tera: web::Data<Tera>, pool: web::Data<DbPool>, state: web::Data<AppState>) -> HttpResponse {
    let loaded = blocking(move || {
        let sliders = public_helpers::homepage_sliders(&pool, state.fallback.as_ref());
        let testimonials = public_helpers::homepage_testimonials(&pool, state.fallback.as_ref());
        let news = public_helpers::latest_news(&pool, HOME_NEWS_COUNT).unwrap_or_else(|e| {
            log::warn!("Homepage rendered without news: {}", e);
            Vec::new()
        });
        Ok((sliders, testimonials, news))
    })
    .await;

    match loaded {
        Ok((sliders, testimonials, news)) => {
            let mut ctx = page_context("Beranda - SMPTI Baituljannah");
            ctx.insert("sliders", &sliders);
            ctx.insert("testimonials", &testimonials);
            ctx.insert("latest_news", &news);
            render(&tera, "public/home.html", &ctx, StatusCode::OK)
        }
        Err(e) => error_page(&tera, &e),
    }
}

async fn school_page(tera: web::Data<Tera>, page: &'static SchoolPage) -> HttpResponse {
    let mut ctx = page_context(&format!("{} - SMPTI Baituljannah", page.title));
    ctx.insert("page", page);
    render(&tera, "public/school_page.html", &ctx, StatusCode::OK)
}

async fn courses(tera: web::Data<Tera>, query: web::Query<CourseQuery>) -> HttpResponse {
    let sort = public_helpers::ProgramSort::from_query(query.sort.as_deref());
    let programs = public_helpers::search_programs(query.search.as_deref(), query.category.as_deref(), sort);
    let mut ctx = page_context("Program - SMPTI Baituljannah");
    ctx.insert("programs", &programs);
    ctx.insert("categories", &public_helpers::program_categories());
    ctx.insert("sort_options", public_helpers::PROGRAM_SORT_OPTIONS);
    ctx.insert("search", &query.search.clone().unwrap_or_default());
    ctx.insert("selected_category", &query.category.clone().unwrap_or_else(|| "all".to_string()));
    ctx.insert("selected_sort", query.sort.as_deref().unwrap_or("default"));
    ctx.insert("total_results", &programs.len());
    render(&tera, "public/courses.html", &ctx, StatusCode::OK)
}

async fn course_detail(tera: web::Data<Tera>, id: web::Path<u32>) -> HttpResponse {
    match public_helpers::find_program(id.into_inner()) {
        Some(program) => {
            let mut ctx = page_context(&format!("{} - SMPTI Baituljannah", program.title));
            ctx.insert("program", program);
            render(&tera, "public/course_detail.html", &ctx, StatusCode::OK)
        }
        None => error_page(&tera, &ServiceError::not_found("Program tidak ditemukan")),
    }
}

async fn news_list(tera: web::Data<Tera>, pool: web::Data<DbPool>, query: web::Query<PageQuery>) -> HttpResponse {
    let request = PageRequest::new(query.page, None, news_helpers::PUBLIC_PER_PAGE);
    match blocking(move || news_helpers::list_published_news(&pool, request)).await {
        Ok(page) => {
            let mut ctx = page_context("Berita - SMPTI Baituljannah");
            ctx.insert("page", &page);
            render(&tera, "public/news_list.html", &ctx, StatusCode::OK)
        }
        Err(e) => error_page(&tera, &e),
    }
}

async fn news_detail(tera: web::Data<Tera>, pool: web::Data<DbPool>, slug: web::Path<String>) -> HttpResponse {
    let slug = slug.into_inner();
    match blocking(move || news_helpers::find_published_news_by_slug(&pool, &slug)).await {
        Ok(news) => {
            let mut ctx = page_context(&format!("{} - SMPTI Baituljannah", news.title));
            ctx.insert("content_html", &render_markdown(&news.content));
            ctx.insert("news", &news);
            render(&tera, "public/news_detail.html", &ctx, StatusCode::OK)
        }
        Err(e) => error_page(&tera, &e),
    }
}

async fn published_news_api(pool: web::Data<DbPool>, query: web::Query<PageQuery>) -> Result<HttpResponse, ServiceError> {
    let request = PageRequest::new(query.page, query.per_page, news_helpers::PUBLIC_PER_PAGE);
    let page = blocking(move || news_helpers::list_published_news(&pool, request)).await?;
    Ok(json_ok(page))
}

// --- Forms ---

fn form_context<T: serde::Serialize>(title: &str, form: &T, errors: &[String], success: bool) -> Context {
    let mut ctx = page_context(title);
    ctx.insert("form_data", form);
    ctx.insert("errors", errors);
    ctx.insert("success", &success);
    ctx
}

async fn contact_form(tera: web::Data<Tera>) -> HttpResponse {
    let ctx = form_context("Kontak - SMPTI Baituljannah", &MessageForm::default(), &[], false);
    render(&tera, "public/contact.html", &ctx, StatusCode::OK)
}

async fn consultation_form(tera: web::Data<Tera>) -> HttpResponse {
    let ctx = form_context("Konsultasi - SMPTI Baituljannah", &MessageForm::default(), &[], false);
    render(&tera, "public/konsultasi.html", &ctx, StatusCode::OK)
}

async fn submit_contact(tera: web::Data<Tera>, pool: web::Data<DbPool>, form: web::Form<MessageForm>) -> HttpResponse {
    submit_message(tera, pool, MessageKind::Contact, form.into_inner()).await
}

async fn submit_consultation(tera: web::Data<Tera>, pool: web::Data<DbPool>, form: web::Form<MessageForm>) -> HttpResponse {
    submit_message(tera, pool, MessageKind::Consultation, form.into_inner()).await
}

async fn submit_message(tera: web::Data<Tera>, pool: web::Data<DbPool>, kind: MessageKind, form: MessageForm) -> HttpResponse {
    let (title, template) = match kind {
        MessageKind::Contact => ("Kontak - SMPTI Baituljannah", "public/contact.html"),
        MessageKind::Consultation => ("Konsultasi - SMPTI Baituljannah", "public/konsultasi.html"),
    };

    let errors = message_helpers::validate_message(kind, &form);
    if !errors.is_empty() {
        let ctx = form_context(title, &form, &errors, false);
        return render(&tera, template, &ctx, StatusCode::BAD_REQUEST);
    }

    match blocking(move || message_helpers::submit_message(&pool, kind, &form)).await {
        Ok(id) => {
            log::info!("Stored {} message #{}", kind, id);
            let ctx = form_context(title, &MessageForm::default(), &[], true);
            render(&tera, template, &ctx, StatusCode::OK)
        }
        Err(e) => error_page(&tera, &e),
    }
}

const REGISTRATION_TITLE: &str = "Pendaftaran Siswa Baru - SMPTI Baituljannah";

async fn registration_form(tera: web::Data<Tera>) -> HttpResponse {
    let mut ctx = form_context(REGISTRATION_TITLE, &RegistrationForm::default(), &[], false);
    ctx.insert("programs", public_helpers::PROGRAMS);
    render(&tera, "public/daftar_siswa.html", &ctx, StatusCode::OK)
}

async fn submit_registration(
    tera: web::Data<Tera>,
    pool: web::Data<DbPool>,
    form: web::Form<RegistrationForm>,
) -> HttpResponse {
    let form = form.into_inner();
    if let Err(errors) = registration_helpers::validate_registration_form(&form) {
        let mut ctx = form_context(REGISTRATION_TITLE, &form, &errors, false);
        ctx.insert("programs", public_helpers::PROGRAMS);
        return render(&tera, "public/daftar_siswa.html", &ctx, StatusCode::BAD_REQUEST);
    }

    match blocking(move || registration_helpers::submit_registration(&pool, &form)).await {
        Ok(registration) => {
            log::info!("New registration #{} for program '{}'", registration.id, registration.program_pilihan);
            let mut ctx = form_context(REGISTRATION_TITLE, &RegistrationForm::default(), &[], true);
            ctx.insert("programs", public_helpers::PROGRAMS);
            render(&tera, "public/daftar_siswa.html", &ctx, StatusCode::OK)
        }
        Err(e) => error_page(&tera, &e),
    }
}
