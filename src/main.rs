use actix_cors::Cors;
use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::{cookie::Key, web, App, HttpServer};
use baituljannah_web::config::Config;
use baituljannah_web::helper::public_helpers::StaticFallbackContent;
use baituljannah_web::setup::db_setup::{self, SeedAdmin};
use baituljannah_web::{build_pool, middleware, routes, AppState};
use clap::Parser;
use r2d2_sqlite::SqliteConnectionManager;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tera::Tera;

#[derive(Parser, Debug)]
#[command(name = "baituljannah_server", author, version, about = "Starts the Baituljannah school website.")]
struct Cli {
    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

fn fatal(context: &str, e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("FATAL: {}: {}", context, e))
}

fn build_cors(allowed_origins: &str) -> Cors {
    let cors = if allowed_origins.trim() == "*" {
        Cors::default().allow_any_origin()
    } else {
        allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };
    cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
        .allowed_headers(vec![header::AUTHORIZATION, header::ACCEPT, header::CONTENT_TYPE])
        .supports_credentials()
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env(&cli.env_file).map_err(|e| fatal("Failed to load configuration", e))?;

    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    let tera = Tera::new("templates/**/*.html").map_err(|e| fatal("Tera initialization failed", e))?;

    fs::create_dir_all(&config.database_path)?;

    let pool = build_pool(
        SqliteConnectionManager::file(config.database_file()),
        config.db_pool_size,
        Duration::from_secs(config.db_connection_timeout_secs),
    );

    // A broken database must not stop the site; homepage reads fall back to placeholders.
    let seed = SeedAdmin {
        password: config.default_admin_password.clone(),
        bcrypt_cost: config.bcrypt_cost,
    };
    match db_setup::initialize_database(&pool, &seed) {
        Ok(()) => log::info!("Database ready at {}", config.database_file().display()),
        Err(e) => log::error!("Database initialization failed, continuing in degraded mode: {}", e),
    }

    let app_state = web::Data::new(AppState {
        fallback: Arc::new(StaticFallbackContent),
    });

    let session_key_bytes = hex::decode(&config.session_secret_key)
        .map_err(|e| fatal("SESSION_SECRET_KEY is not a valid hex string", e))?;
    let session_key = Key::try_from(session_key_bytes.as_slice())
        .map_err(|e| fatal("SESSION_SECRET_KEY is too short (64 bytes required)", e))?;

    let server_address = format!("{}:{}", config.web.host, config.web.port);
    log::info!("Server starting at http://{}", server_address);
    log::info!("Admin panel at {}", config.admin_login_url());

    let config_data = web::Data::new(config.clone());
    let tera_data = web::Data::new(tera);
    let pool_data = web::Data::new(pool);

    HttpServer::new(move || {
        let admin_url_prefix = config_data.admin_url_prefix.clone();
        App::new()
            .wrap(middleware::session_middleware(session_key.clone(), config_data.use_secure_cookies))
            .wrap(build_cors(&config_data.allowed_origins))
            .wrap(Logger::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block")),
            )
            .app_data(config_data.clone())
            .app_data(tera_data.clone())
            .app_data(pool_data.clone())
            .app_data(app_state.clone())
            .service(actix_files::Files::new("/public", "./public"))
            .configure(|cfg| routes::config_app(cfg, &admin_url_prefix))
    })
    .bind(server_address)?
    .run()
    .await
}
