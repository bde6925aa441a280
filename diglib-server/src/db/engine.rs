//! Database engine - pooled PostgreSQL connections
//!
//! Wraps a lazily-connected sqlx `PgPool`:
//! - echo: every statement is logged at INFO when enabled
//! - pre-ping: pooled connections are pinged before checkout and replaced if dead
//! - bounded checkout via the acquire timeout

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use diglib_core::config::{DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_MAX_CONNECTIONS};
use diglib_core::Settings;
use log::LevelFilter;
use serde::Serialize;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use url::Url;

use super::error::DbError;
use super::session::{PgSession, SessionFactory};

/// Statements slower than this are logged at WARN even without echo.
const SLOW_STATEMENT_THRESHOLD: Duration = Duration::from_secs(1);

/// Engine construction options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    pub url: String,
    pub echo: bool,
    pub pre_ping: bool,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl EngineOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            echo: false,
            pre_ping: true,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn pre_ping(mut self, pre_ping: bool) -> Self {
        self.pre_ping = pre_ping;
        self
    }

    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn acquire_timeout(mut self, acquire_timeout: Duration) -> Self {
        self.acquire_timeout = acquire_timeout;
        self
    }
}

impl From<&Settings> for EngineOptions {
    fn from(settings: &Settings) -> Self {
        Self::new(settings.database_url.clone())
            .echo(settings.debug)
            .pre_ping(settings.pool_pre_ping)
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
    }
}

/// Pool occupancy snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub size: u32,
    pub idle: usize,
    pub max_connections: u32,
    pub closed: bool,
}

/// Process-wide connection factory.
///
/// Cloning is cheap and every clone shares the same pool. Build one at
/// startup and pass it to whatever opens sessions.
#[derive(Debug, Clone)]
pub struct Engine {
    pool: PgPool,
    echo: bool,
    pre_ping: bool,
}

impl Engine {
    /// Build an engine without connecting.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidUrl`] if the URL cannot be parsed. Reachability
    /// is only checked by [`Engine::verify`] or the first session that needs a
    /// connection.
    pub fn new(options: EngineOptions) -> Result<Self, DbError> {
        let url = normalize_url(&options.url)?;
        let connect = PgConnectOptions::from_str(&url)
            .map_err(|e| DbError::invalid_url(e.to_string()))?;

        let connect = if options.echo {
            connect
                .log_statements(LevelFilter::Info)
                .log_slow_statements(LevelFilter::Warn, SLOW_STATEMENT_THRESHOLD)
        } else {
            connect
                .disable_statement_logging()
                .log_slow_statements(LevelFilter::Warn, SLOW_STATEMENT_THRESHOLD)
        };

        let pool = PgPoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .test_before_acquire(options.pre_ping)
            .connect_lazy_with(connect);

        tracing::debug!(
            echo = options.echo,
            pre_ping = options.pre_ping,
            max_connections = options.max_connections,
            "database engine created"
        );

        Ok(Self {
            pool,
            echo: options.echo,
            pre_ping: options.pre_ping,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, DbError> {
        Self::new(EngineOptions::from(settings))
    }

    /// Round-trip a trivial query to prove the database is reachable.
    pub async fn verify(&self) -> Result<(), DbError> {
        let (one,): (i32,) = sqlx::query_as("SELECT 1").fetch_one(&self.pool).await?;
        tracing::debug!(result = one, "database connectivity verified");
        Ok(())
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
            max_connections: self.pool.options().get_max_connections(),
            closed: self.pool.is_closed(),
        }
    }

    pub fn echo(&self) -> bool {
        self.echo
    }

    pub fn pre_ping(&self) -> bool {
        self.pre_ping
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Open a session bound to this engine. No connection is checked out
    /// until the session first needs one.
    pub fn session(&self) -> Result<PgSession, DbError> {
        if self.pool.is_closed() {
            return Err(DbError::Disposed);
        }
        Ok(PgSession::new(self.pool.clone()))
    }

    /// Close every pooled connection. Safe to call more than once.
    pub async fn dispose(&self) {
        if !self.pool.is_closed() {
            self.pool.close().await;
            tracing::info!("database engine disposed");
        }
    }
}

#[async_trait]
impl SessionFactory for Engine {
    type Session = PgSession;

    async fn open_session(&self) -> Result<PgSession, DbError> {
        self.session()
    }
}

/// Accept `postgres://`, `postgresql://` and ORM-style driver suffixes such as
/// `postgresql+psycopg2://`, returning a URL sqlx understands.
pub fn normalize_url(raw: &str) -> Result<String, DbError> {
    let mut url = Url::parse(raw.trim()).map_err(|e| match e {
        url::ParseError::RelativeUrlWithoutBase => {
            DbError::invalid_url("missing scheme, expected postgres://...")
        }
        other => DbError::invalid_url(other.to_string()),
    })?;

    // The parser has already lowercased the scheme
    let base = url
        .scheme()
        .split_once('+')
        .map_or(url.scheme(), |(base, _driver)| base)
        .to_string();

    match base.as_str() {
        "postgres" | "postgresql" => {
            if base != url.scheme() {
                url.set_scheme(&base).map_err(|()| {
                    DbError::invalid_url(format!("cannot rewrite scheme '{}'", url.scheme()))
                })?;
            }
            Ok(url.into())
        }
        other => Err(DbError::invalid_url(format!(
            "unsupported scheme '{}', expected postgres or postgresql",
            other
        ))),
    }
}
