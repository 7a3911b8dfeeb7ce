//! HTTP server command for the expensectl API

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;

use expensectl_core::ExpenseConfig;
use expensectl_server::http::{run_server, ServerConfig};

use super::{connect, DbArgs};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default from config: 127.0.0.1:3030)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    #[command(flatten)]
    pub db: DbArgs,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = ExpenseConfig::load()?;
    let bind_addr = match args.bind {
        Some(addr) => addr,
        None => config
            .server
            .bind
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", config.server.bind))?,
    };
    let session_ttl_hours = u32::try_from(config.auth.session_ttl_hours)
        .context("auth.session_ttl_hours must be between 0 and 4294967295")?;

    let pool = connect(&args.db).await?;
    tracing::info!("Starting expensectl server on {}", bind_addr);

    let server_config = ServerConfig {
        bind_addr,
        cors_permissive: args.cors_permissive || config.server.cors_permissive,
        session_ttl_hours,
        default_currency: config.defaults.currency,
    };

    // Run server (blocks until shutdown)
    run_server(pool, server_config)
        .await
        .context("Server error")?;

    Ok(())
}
