//! In-memory session doubles that record their lifecycle

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use super::error::DbError;
use super::session::{Session, SessionFactory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Opened(Uuid),
    Pinged(Uuid),
    Closed(Uuid),
    /// Dropped while still open, without a close
    Abandoned(Uuid),
}

#[derive(Default)]
struct Shared {
    events: Mutex<Vec<Event>>,
    close_attempts: AtomicUsize,
}

impl Shared {
    fn record(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

/// Factory handing out [`MockSession`]s; clones share one event log.
#[derive(Clone, Default)]
pub struct MockFactory {
    shared: Arc<Shared>,
    fail_open: bool,
    fail_ping: bool,
    stall_ping: bool,
    fail_close: bool,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn failing_ping(mut self) -> Self {
        self.fail_ping = true;
        self
    }

    /// Pings never complete, as with a database that stopped answering
    pub fn stalling_ping(mut self) -> Self {
        self.stall_ping = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.shared.events.lock().unwrap().clone()
    }

    pub fn opened(&self) -> usize {
        self.count(|e| matches!(e, Event::Opened(_)))
    }

    pub fn closed(&self) -> usize {
        self.count(|e| matches!(e, Event::Closed(_)))
    }

    pub fn close_attempts(&self) -> usize {
        self.shared.close_attempts.load(Ordering::SeqCst)
    }

    fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|&e| pred(e)).count()
    }
}

#[async_trait]
impl SessionFactory for MockFactory {
    type Session = MockSession;

    async fn open_session(&self) -> Result<MockSession, DbError> {
        if self.fail_open {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        let id = Uuid::new_v4();
        self.shared.record(Event::Opened(id));
        Ok(MockSession {
            id,
            shared: Arc::clone(&self.shared),
            fail_ping: self.fail_ping,
            stall_ping: self.stall_ping,
            fail_close: self.fail_close,
            closed: false,
        })
    }
}

pub struct MockSession {
    id: Uuid,
    shared: Arc<Shared>,
    fail_ping: bool,
    stall_ping: bool,
    fail_close: bool,
    closed: bool,
}

impl MockSession {
    fn ensure_open(&self) -> Result<(), DbError> {
        if self.closed {
            return Err(DbError::SessionClosed { id: self.id });
        }
        Ok(())
    }
}

#[async_trait]
impl Session for MockSession {
    fn id(&self) -> Uuid {
        self.id
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn ping(&mut self) -> Result<(), DbError> {
        self.ensure_open()?;
        if self.fail_ping {
            return Err(DbError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        if self.stall_ping {
            std::future::pending::<()>().await;
        }
        self.shared.record(Event::Pinged(self.id));
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        self.ensure_open()
    }

    async fn rollback(&mut self) -> Result<(), DbError> {
        self.ensure_open()
    }

    async fn close(&mut self) -> Result<(), DbError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.shared.close_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_close {
            return Err(DbError::Sqlx(sqlx::Error::Protocol(
                "connection reset during rollback".to_string(),
            )));
        }
        self.shared.record(Event::Closed(self.id));
        Ok(())
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        if !self.closed {
            self.shared.record(Event::Abandoned(self.id));
        }
    }
}
