//! Database layer - engine, sessions and the per-request session provider
//!
//! # Design Principles
//!
//! - One engine per process, built at startup and injected (no globals)
//! - One session per request, never shared, never reused after close
//! - Sessions close on every exit path; close failures are reported, not swallowed

pub mod engine;
pub mod error;
pub mod provider;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use engine::{normalize_url, Engine, EngineOptions, PoolStatus};
pub use error::DbError;
pub use provider::{ScopeError, SessionProvider};
pub use session::{PgSession, Session, SessionFactory};
