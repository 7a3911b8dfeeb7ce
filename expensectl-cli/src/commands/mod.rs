//! Command implementations for expensectl CLI

pub mod board;
pub mod csv;
pub mod expenses;
pub mod serve;
pub mod user;

// Re-export main dispatcher functions for flat access from main.rs
pub use board::run_board;
pub use csv::run_csv;
pub use expenses::{run_export, run_import, run_report};
pub use serve::run_serve;
pub use user::run_user;

use anyhow::{Context, Result};
use clap::Args;
use sqlx::SqlitePool;

use expensectl_core::models::{Email, User};
use expensectl_core::ExpenseConfig;
use expensectl_server::db::{create_pool_with_options, migrations, UserRepo};

/// Database selection shared by every command that touches storage
#[derive(Args, Debug, Clone, Default)]
pub struct DbArgs {
    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

/// Open the configured database and bring its schema up to date.
pub async fn connect(args: &DbArgs) -> Result<SqlitePool> {
    let config = ExpenseConfig::load()?;
    let url = args
        .database_url
        .clone()
        .unwrap_or(config.database.url);

    tracing::debug!(url = %url, "Opening database");
    let pool = create_pool_with_options(&url, config.database.max_connections)
        .await
        .with_context(|| format!("Failed to open database {url}"))?;
    migrations::run(&pool)
        .await
        .context("Failed to run migrations")?;
    Ok(pool)
}

/// The account a per-user command acts on
pub async fn find_user(pool: &SqlitePool, email: &str) -> Result<User> {
    let email = Email::new(email)?;
    UserRepo::new(pool)
        .find_by_email(&email)
        .await?
        .with_context(|| format!("No user with email '{}'", email.as_str()))
}

pub async fn run_migrate(args: DbArgs) -> Result<()> {
    connect(&args).await?;
    println!("Database is up to date");
    Ok(())
}
