//! Database sessions - one unit of work per request
//!
//! A session never autocommits: work becomes durable only on [`Session::commit`],
//! and [`Session::close`] rolls back whatever is still pending. The PostgreSQL
//! session checks out a pooled connection and begins its transaction lazily,
//! on first use.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::error::DbError;

/// One logical unit of work against the database.
#[async_trait]
pub trait Session: Send {
    /// Unique for the lifetime of the process
    fn id(&self) -> Uuid;

    fn is_closed(&self) -> bool;

    /// Lightweight liveness round-trip through this session
    async fn ping(&mut self) -> Result<(), DbError>;

    async fn commit(&mut self) -> Result<(), DbError>;

    async fn rollback(&mut self) -> Result<(), DbError>;

    /// Release the session. Pending work is rolled back. Closing an already
    /// closed session is a no-op.
    async fn close(&mut self) -> Result<(), DbError>;
}

/// Produces fresh sessions. Implemented by [`super::Engine`] and by test doubles.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    type Session: Session + 'static;

    async fn open_session(&self) -> Result<Self::Session, DbError>;
}

/// PostgreSQL-backed session
pub struct PgSession {
    id: Uuid,
    pool: PgPool,
    tx: Option<Transaction<'static, Postgres>>,
    closed: bool,
}

impl PgSession {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self {
            id: Uuid::new_v4(),
            pool,
            tx: None,
            closed: false,
        }
    }

    /// Connection running this session's transaction, beginning it on first use.
    pub async fn connection(&mut self) -> Result<&mut PgConnection, DbError> {
        self.ensure_open()?;

        let tx = match self.tx.take() {
            Some(tx) => tx,
            None => {
                let tx = self.pool.begin().await?;
                tracing::trace!(session_id = %self.id, "transaction begun");
                tx
            }
        };

        Ok(&mut **self.tx.insert(tx))
    }

    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    fn ensure_open(&self) -> Result<(), DbError> {
        if self.closed {
            return Err(DbError::SessionClosed { id: self.id });
        }
        Ok(())
    }
}

#[async_trait]
impl Session for PgSession {
    fn id(&self) -> Uuid {
        self.id
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn ping(&mut self) -> Result<(), DbError> {
        let conn = self.connection().await?;
        sqlx::query("SELECT 1").execute(conn).await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        self.ensure_open()?;
        if let Some(tx) = self.tx.take() {
            tx.commit().await?;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DbError> {
        self.ensure_open()?;
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DbError> {
        if self.closed {
            return Ok(());
        }
        // Marked closed even if the rollback fails; the connection is gone either way.
        self.closed = true;
        if let Some(tx) = self.tx.take() {
            tx.rollback().await?;
        }
        Ok(())
    }
}

impl Drop for PgSession {
    fn drop(&mut self) {
        // sqlx rolls the transaction back when it is dropped
        if self.tx.is_some() {
            tracing::warn!(
                session_id = %self.id,
                "session dropped without close, rolling back open transaction"
            );
        }
    }
}

impl std::fmt::Debug for PgSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgSession")
            .field("id", &self.id)
            .field("in_transaction", &self.tx.is_some())
            .field("closed", &self.closed)
            .finish()
    }
}
