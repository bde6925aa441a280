//! HTTP server command
//!
//! Builds the engine once, proves the database is reachable, then serves
//! until Ctrl+C / SIGTERM and disposes the engine on the way out.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;

use diglib_server::db::Engine;
use diglib_server::http::{run_server, ServerConfig};

use super::load_settings;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (overrides BIND_ADDR, default: 127.0.0.1:8000)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Database URL
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Log every SQL statement (same as DEBUG=true)
    #[arg(long)]
    pub echo: bool,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Request timeout in seconds (overrides REQUEST_TIMEOUT_SECS)
    #[arg(long)]
    pub request_timeout: Option<u64>,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut settings = load_settings(args.database_url)?;
    if args.echo {
        settings.debug = true;
    }

    let mut config = ServerConfig::from(&settings);
    config.cors_permissive = args.cors_permissive;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(secs) = args.request_timeout {
        config.request_timeout = std::time::Duration::from_secs(secs);
    }

    tracing::info!(
        database = %settings.redacted_database_url(),
        echo = settings.debug,
        pre_ping = settings.pool_pre_ping,
        "Starting Digital Library API on {}",
        config.bind_addr
    );

    let engine = Engine::from_settings(&settings).context("Invalid database configuration")?;
    engine
        .verify()
        .await
        .context("Failed to connect to database")?;

    // Run server (blocks until shutdown)
    let served = run_server(engine.clone(), config).await.context("Server error");

    engine.dispose().await;
    served
}
