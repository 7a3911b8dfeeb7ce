//! Account management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use expensectl_core::models::{Email, Password, UserName};
use expensectl_server::auth::{hash_password, DEFAULT_ITERATIONS};
use expensectl_server::db::UserRepo;

use super::{connect, DbArgs};

#[derive(Parser, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommands,
}

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Register a new account
    Create(CreateArgs),
    /// List registered accounts
    List(ListArgs),
}

#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Login email
    #[arg(long)]
    pub email: String,

    /// Display name
    #[arg(long)]
    pub name: String,

    /// Password (at least 8 characters)
    #[arg(long, env = "EXPENSECTL_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[command(flatten)]
    pub db: DbArgs,
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub db: DbArgs,
}

pub async fn run_user(args: UserArgs) -> Result<()> {
    match args.command {
        UserCommands::Create(args) => run_create(args).await,
        UserCommands::List(args) => run_list(args).await,
    }
}

async fn run_create(args: CreateArgs) -> Result<()> {
    let email = Email::new(&args.email)?;
    let name = UserName::new(&args.name)?;
    let password = Password::new(&args.password)?;

    let pool = connect(&args.db).await?;
    let hash = tokio::task::spawn_blocking(move || hash_password(&password, DEFAULT_ITERATIONS))
        .await
        .context("Password hashing failed")?;

    let user = UserRepo::new(&pool).create(&email, &name, &hash).await?;
    println!("Created user {} <{}> ({})", user.name, user.email, user.id);
    Ok(())
}

async fn run_list(args: ListArgs) -> Result<()> {
    let pool = connect(&args.db).await?;
    let users = UserRepo::new(&pool).list().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&users)?);
        return Ok(());
    }

    if users.is_empty() {
        println!("No users yet. Create one with: expensectl user create");
        return Ok(());
    }
    for user in users {
        println!(
            "{}  {:<32} {}  (since {})",
            user.id,
            user.email,
            user.name,
            user.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}
