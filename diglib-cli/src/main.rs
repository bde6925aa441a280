//! diglib - Digital Library API server
//!
//! Entry point for the HTTP API. Provides:
//! - `serve`: run the API (root welcome, health and database readiness probes)
//! - `db ping`: check database connectivity through a scoped session

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod tracing_setup;

use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "diglib",
    author,
    version,
    about = "Digital Library API server",
    long_about = "Serve the Digital Library HTTP API backed by a pooled PostgreSQL engine. \
                  Settings come from the environment (DATABASE_URL, DEBUG, ...) or a .env file."
)]
struct Cli {
    /// Debug logging (RUST_LOG still takes precedence)
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (requires the telemetry feature)
    #[arg(long, global = true)]
    otel: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Database connectivity checks
    Db(commands::db::DbArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; real environment variables win
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let echo_flag = matches!(&cli.command, Commands::Serve(args) if args.echo);
    tracing_setup::init(&TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
        echo: TracingConfig::echo_from_env(echo_flag),
    })
    .ok();

    let result = match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await,
        Commands::Db(args) => commands::run_db(args).await,
    };

    tracing_setup::shutdown_otel();
    result
}
