//! Database error type shared by the engine, sessions and the provider

use uuid::Uuid;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("invalid database URL: {reason}")]
    InvalidUrl { reason: String },

    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("session {id} is closed")]
    SessionClosed { id: Uuid },

    #[error("engine has been disposed")]
    Disposed,
}

impl DbError {
    pub fn invalid_url(reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            reason: reason.into(),
        }
    }

    /// True when the database could not be reached at all, as opposed to
    /// a statement failing on a live connection.
    pub fn is_connectivity(&self) -> bool {
        match self {
            Self::Sqlx(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::Io(_)
                    | sqlx::Error::Tls(_)
            ),
            Self::Disposed => true,
            Self::InvalidUrl { .. } | Self::SessionClosed { .. } => false,
        }
    }
}
