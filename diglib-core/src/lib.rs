//! diglib-core: settings and errors shared by the Digital Library API crates

pub mod config;
pub mod error;

pub use config::Settings;
pub use error::{ConfigError, Result};
