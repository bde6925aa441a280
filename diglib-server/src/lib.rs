//! diglib-server: HTTP surface and database session lifecycle
//!
//! A process-wide [`db::Engine`] owns the connection pool. Each request that
//! needs the database gets exactly one session from [`db::SessionProvider`],
//! closed on every exit path.

pub mod db;
pub mod http;

pub use db::{DbError, Engine, EngineOptions, ScopeError, Session, SessionFactory, SessionProvider};
pub use http::{run_server, ServerConfig};
