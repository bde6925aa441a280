//! Command implementations for the diglib CLI

use anyhow::{Context, Result};
use diglib_core::config::DATABASE_URL;
use diglib_core::Settings;

pub mod db;
pub mod serve;

// Re-export main dispatcher functions for flat access from main.rs
pub use db::run_db;
pub use serve::run_serve;

/// Load settings from the environment. `database_url` comes from clap, which
/// already prefers `--database-url` over `DATABASE_URL`.
pub(crate) fn load_settings(database_url: Option<String>) -> Result<Settings> {
    Settings::from_lookup(|key| match (key, &database_url) {
        (DATABASE_URL, Some(url)) => Some(url.clone()),
        _ => std::env::var(key).ok(),
    })
    .context("Failed to load settings (set DATABASE_URL via --database-url, the environment, or .env)")
}
