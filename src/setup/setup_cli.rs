use baituljannah_web::config::Config;
use baituljannah_web::helper::{activity_helpers, admin_helpers};
use baituljannah_web::models::{AdminInput, AdminRole};
use baituljannah_web::setup::db_setup::{self, SeedAdmin};
use baituljannah_web::{build_pool, DbPool};
use clap::{Parser, Subcommand};
use r2d2_sqlite::SqliteConnectionManager;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "setup_cli", author, version, about = "Setup and maintenance tasks for the Baituljannah website.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the .env configuration file.
    #[arg(long, required = true, value_name = "FILE")]
    env_file: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    Logs {
        #[command(subcommand)]
        action: LogsAction,
    },
}

#[derive(Subcommand, Debug)]
enum DbAction {
    /// Creates missing tables and seeds the default admin and homepage content.
    Setup,
}

#[derive(Subcommand, Debug)]
enum AdminAction {
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        super_admin: bool,
    },
    List,
    ChangePassword {
        #[arg(long)]
        username: String,
        #[arg(long)]
        new_password: String,
    },
}

#[derive(Subcommand, Debug)]
enum LogsAction {
    /// Deletes activity log entries older than the retention period.
    Cleanup {
        /// Defaults to ACTIVITY_LOG_RETENTION_DAYS.
        #[arg(long)]
        days: Option<u32>,
    },
}

fn open_pool(config: &Config) -> Result<DbPool, std::io::Error> {
    fs::create_dir_all(&config.database_path)?;
    Ok(build_pool(
        SqliteConnectionManager::file(config.database_file()),
        1,
        Duration::from_secs(config.db_connection_timeout_secs),
    ))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env(&cli.env_file) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(&config.log_level));

    let pool = match open_pool(&config) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("❌ Could not create database directory '{}': {}", config.database_path, e);
            return ExitCode::FAILURE;
        }
    };

    let succeeded = match &cli.command {
        Commands::Db { action: DbAction::Setup } => setup_database(&config, &pool),
        Commands::Admin { action } => match action {
            AdminAction::Create { username, email, full_name, password, super_admin } => {
                let role = if *super_admin { AdminRole::SuperAdmin } else { AdminRole::Admin };
                let input = AdminInput {
                    username: username.clone(),
                    email: email.clone(),
                    full_name: full_name.clone(),
                    role: Some(role.as_str().to_string()),
                    password: Some(password.clone()),
                };
                create_admin_user(&config, &pool, &input)
            }
            AdminAction::List => list_admin_users(&pool),
            AdminAction::ChangePassword { username, new_password } => {
                change_admin_password(&config, &pool, username, new_password)
            }
        },
        Commands::Logs { action: LogsAction::Cleanup { days } } => {
            cleanup_logs(&pool, days.unwrap_or(config.activity_log_retention_days))
        }
    };

    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn setup_database(config: &Config, pool: &DbPool) -> bool {
    println!("Setting up database at '{}'...", config.database_file().display());
    let seed = SeedAdmin {
        password: config.default_admin_password.clone(),
        bcrypt_cost: config.bcrypt_cost,
    };
    match db_setup::initialize_database(pool, &seed) {
        Ok(()) => {
            println!("✅ Database setup completed successfully.");
            true
        }
        Err(e) => {
            eprintln!("❌ Error setting up database: {}", e);
            false
        }
    }
}

fn create_admin_user(config: &Config, pool: &DbPool, input: &AdminInput) -> bool {
    match admin_helpers::create_admin(pool, input, config.bcrypt_cost) {
        Ok(admin) => {
            println!("✅ Admin user '{}' ({}) created with id {}.", admin.username, admin.role, admin.id);
            true
        }
        Err(e) => {
            eprintln!("❌ Error creating admin user: {}", e);
            false
        }
    }
}

fn list_admin_users(pool: &DbPool) -> bool {
    match admin_helpers::list_admins(pool) {
        Ok(admins) => {
            println!("Listing Admin Users:");
            for admin in admins {
                println!("- {} <{}> [{}] {}", admin.username, admin.email, admin.role, admin.full_name);
            }
            true
        }
        Err(e) => {
            eprintln!("❌ Error fetching admins: {}", e);
            false
        }
    }
}

fn change_admin_password(config: &Config, pool: &DbPool, username: &str, new_password: &str) -> bool {
    match admin_helpers::reset_password(pool, username, new_password, config.bcrypt_cost) {
        Ok(()) => {
            println!("✅ Password for admin user '{}' changed successfully.", username);
            true
        }
        Err(e) => {
            eprintln!("❌ Error updating password: {}", e);
            false
        }
    }
}

fn cleanup_logs(pool: &DbPool, days: u32) -> bool {
    match activity_helpers::cleanup_activity(pool, days) {
        Ok(removed) => {
            println!("✅ Removed {} activity log entries older than {} days.", removed, days);
            true
        }
        Err(e) => {
            eprintln!("❌ Error cleaning up activity logs: {}", e);
            false
        }
    }
}
