//! Session provider - scoped, per-request sessions
//!
//! [`SessionProvider::scoped`] opens a fresh session, lends it to the caller's
//! operation and closes it on every exit path: success, error, or panic.
//! Failures from the operation and from the close are both reported.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};

use super::error::DbError;
use super::session::{Session, SessionFactory};

/// Outcome of a scoped session that did not complete cleanly
#[derive(Debug, thiserror::Error)]
pub enum ScopeError<E> {
    /// No session could be opened; the operation never ran
    #[error("failed to open session: {0}")]
    Open(#[source] DbError),

    /// The operation failed; the session was closed cleanly
    #[error(transparent)]
    Handler(E),

    /// The operation succeeded but the session failed to close
    #[error("failed to close session: {0}")]
    Close(#[source] DbError),

    /// The operation failed and so did the close
    #[error("{handler} (closing the session also failed: {close})")]
    HandlerAndClose {
        #[source]
        handler: E,
        close: DbError,
    },
}

impl<E> ScopeError<E> {
    /// Error returned by the caller's operation, if it failed
    pub fn handler_error(&self) -> Option<&E> {
        match self {
            Self::Handler(e) | Self::HandlerAndClose { handler: e, .. } => Some(e),
            Self::Open(_) | Self::Close(_) => None,
        }
    }

    /// Error raised while closing the session, if any
    pub fn close_error(&self) -> Option<&DbError> {
        match self {
            Self::Close(e) | Self::HandlerAndClose { close: e, .. } => Some(e),
            Self::Open(_) | Self::Handler(_) => None,
        }
    }
}

/// Hands out one session per invocation.
///
/// Holds no locks and no session state; clones share the factory.
pub struct SessionProvider<F> {
    factory: Arc<F>,
}

impl<F> Clone for SessionProvider<F> {
    fn clone(&self) -> Self {
        Self {
            factory: Arc::clone(&self.factory),
        }
    }
}

impl<F: SessionFactory> SessionProvider<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory: Arc::new(factory),
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Run `op` with a fresh session and close it afterwards.
    ///
    /// The session is closed before this returns, whether `op` returns `Ok`,
    /// returns `Err`, or panics. A panic resumes after the close.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let count: i64 = provider
    ///     .scoped(|session| Box::pin(async move {
    ///         let conn = session.connection().await?;
    ///         sqlx::query_scalar("SELECT count(*) FROM books").fetch_one(conn).await
    ///             .map_err(DbError::from)
    ///     }))
    ///     .await?;
    /// ```
    pub async fn scoped<T, E, Op>(&self, op: Op) -> Result<T, ScopeError<E>>
    where
        Op: for<'s> FnOnce(&'s mut F::Session) -> BoxFuture<'s, Result<T, E>>,
    {
        let mut session = self.factory.open_session().await.map_err(ScopeError::Open)?;
        let session_id = session.id();
        tracing::debug!(session_id = %session_id, "session opened");

        // Building the future runs caller code too, so it sits inside the guard
        let outcome = AssertUnwindSafe(async { op(&mut session).await })
            .catch_unwind()
            .await;

        let closed = session.close().await;
        match &closed {
            Ok(()) => tracing::debug!(session_id = %session_id, "session closed"),
            Err(e) => tracing::error!(session_id = %session_id, error = %e, "failed to close session"),
        }

        match (outcome, closed) {
            (Err(panic), _) => std::panic::resume_unwind(panic),
            (Ok(Ok(value)), Ok(())) => Ok(value),
            (Ok(Err(handler)), Ok(())) => Err(ScopeError::Handler(handler)),
            (Ok(Ok(_)), Err(close)) => Err(ScopeError::Close(close)),
            (Ok(Err(handler)), Err(close)) => Err(ScopeError::HandlerAndClose { handler, close }),
        }
    }
}
