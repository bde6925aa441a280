//! Database maintenance commands
//!
//! Commands: ping

use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use diglib_server::db::{Engine, Session, SessionProvider};

use super::load_settings;

#[derive(Parser, Debug)]
pub struct DbArgs {
    #[command(subcommand)]
    pub command: DbCommands,
}

#[derive(Subcommand, Debug)]
pub enum DbCommands {
    /// Open a session, round-trip a query, and report pool status
    Ping(PingArgs),
}

#[derive(Parser, Debug)]
pub struct PingArgs {
    /// Database URL
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run_db(args: DbArgs) -> Result<()> {
    match args.command {
        DbCommands::Ping(ping_args) => run_ping(ping_args).await,
    }
}

async fn run_ping(args: PingArgs) -> Result<()> {
    let settings = load_settings(args.database_url)?;
    let engine = Engine::from_settings(&settings).context("Invalid database configuration")?;
    let sessions = SessionProvider::new(engine.clone());

    let started = Instant::now();
    let pinged = sessions
        .scoped(|session| Box::pin(async move { session.ping().await }))
        .await;
    let elapsed_ms = started.elapsed().as_millis();
    let status = engine.status();
    engine.dispose().await;

    pinged.with_context(|| format!("Database ping failed ({})", settings.redacted_database_url()))?;

    if args.json {
        let out = json!({
            "database": settings.redacted_database_url(),
            "reachable": true,
            "elapsed_ms": elapsed_ms,
            "pool": status,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("✓ {} reachable in {} ms", settings.redacted_database_url(), elapsed_ms);
        println!(
            "  pool: {} open, {} idle, max {}",
            status.size, status.idle, status.max_connections
        );
    }

    Ok(())
}
