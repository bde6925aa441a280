//! Structured error types for diglib-core.
//!
//! Uses `thiserror` so library consumers get composable errors.
//! The binary crate (diglib-cli) wraps these in `anyhow` with context.

use thiserror::Error;

/// Errors raised while loading [`crate::Settings`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variable is unset or empty
    #[error("Missing required setting '{key}'")]
    Missing { key: &'static str },

    /// Variable is set but its value cannot be used
    #[error("Invalid value '{value}' for setting '{key}': {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Result type alias for diglib-core operations
pub type Result<T> = std::result::Result<T, ConfigError>;

impl ConfigError {
    /// Create a missing setting error
    pub fn missing(key: &'static str) -> Self {
        Self::Missing { key }
    }

    /// Create an invalid value error
    pub fn invalid(key: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Name of the offending variable
    pub fn key(&self) -> &'static str {
        match self {
            Self::Missing { key } | Self::Invalid { key, .. } => key,
        }
    }
}
