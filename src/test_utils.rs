/// # Test Utilities Module
///
/// Recording doubles for the connection and session layers. Every double
/// appends to one shared event log so tests can assert both call counts and
/// the relative order of rollback, clear, close and reinitialize.

use crate::core::db::connection::{Connection, DynamicConnection, Reinitializable, TransactionState};
use crate::core::db::driver::{Driver, PhysicalConnection};
use crate::core::params::ConnectionParameters;
use crate::core::{DynconnError, Result};
use crate::session::Session;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Something observable that happened to a double.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Open(ConnectionParameters),
    Execute(String),
    Close,
    Reinitialize(ConnectionParameters),
    Rollback,
    Clear,
}

pub type EventLog = Arc<Mutex<Vec<Event>>>;

fn push(log: &EventLog, event: Event) {
    log.lock().unwrap().push(event);
}

/// Driver whose physical connections only record what is done to them.
#[derive(Debug, Clone, Default)]
pub struct RecordingDriver {
    log: EventLog,
    fail_close: Arc<AtomicBool>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> EventLog {
        Arc::clone(&self.log)
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, wanted: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| wanted(e)).count()
    }

    pub fn opens(&self) -> usize {
        self.count(|e| matches!(e, Event::Open(_)))
    }

    pub fn closes(&self) -> usize {
        self.count(|e| matches!(e, Event::Close))
    }

    /// Makes the next physical `close` fail with an I/O error.
    pub fn fail_next_close(&self) {
        self.fail_close.store(true, Ordering::SeqCst);
    }
}

impl Driver for RecordingDriver {
    fn name(&self) -> &str {
        "recording"
    }

    fn connect(&self, params: &ConnectionParameters) -> Result<Box<dyn PhysicalConnection>> {
        push(&self.log, Event::Open(params.clone()));
        Ok(Box::new(RecordingPhysical {
            log: self.log(),
            fail_close: Arc::clone(&self.fail_close),
        }))
    }
}

struct RecordingPhysical {
    log: EventLog,
    fail_close: Arc<AtomicBool>,
}

impl PhysicalConnection for RecordingPhysical {
    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        push(&self.log, Event::Execute(sql.to_string()));
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        if self.fail_close.swap(false, Ordering::SeqCst) {
            return Err(DynconnError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "socket already gone",
            )));
        }
        push(&self.log, Event::Close);
        Ok(())
    }
}

/// Wraps a `DynamicConnection` and records every `reinitialize` call with
/// the exact override map it received.
#[derive(Debug)]
pub struct RecordingConnection {
    pub inner: DynamicConnection,
    log: EventLog,
}

impl RecordingConnection {
    pub fn new(params: ConnectionParameters, driver: &RecordingDriver) -> Self {
        RecordingConnection {
            inner: DynamicConnection::new(params, Arc::new(driver.clone())),
            log: driver.log(),
        }
    }
}

impl Connection for RecordingConnection {
    fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }

    fn params(&self) -> &ConnectionParameters {
        self.inner.params()
    }

    fn transaction_state(&self) -> TransactionState {
        self.inner.transaction_state()
    }

    fn begin_transaction(&mut self) -> Result<()> {
        self.inner.begin_transaction()
    }

    fn commit(&mut self) -> Result<()> {
        self.inner.commit()
    }

    fn rollback(&mut self) -> Result<()> {
        self.inner.rollback()
    }

    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.inner.execute_batch(sql)
    }

    fn as_reinitializable(&mut self) -> Option<&mut dyn Reinitializable> {
        Some(self)
    }
}

impl Reinitializable for RecordingConnection {
    fn reinitialize(&mut self, overrides: ConnectionParameters) -> Result<()> {
        push(&self.log, Event::Reinitialize(overrides.clone()));
        self.inner.reinitialize(overrides)
    }
}

/// Session double recording `rollback` and `clear`.
#[derive(Debug)]
pub struct RecordingSession<C> {
    pub connection: C,
    log: EventLog,
    fail_rollback: bool,
}

impl<C: Connection> RecordingSession<C> {
    pub fn new(connection: C, log: EventLog) -> Self {
        RecordingSession {
            connection,
            log,
            fail_rollback: false,
        }
    }

    /// Makes the next `rollback` fail with an I/O error before reaching the
    /// connection.
    pub fn fail_next_rollback(&mut self) {
        self.fail_rollback = true;
    }
}

impl<C: Connection> Session for RecordingSession<C> {
    fn connection(&mut self) -> &mut dyn Connection {
        &mut self.connection
    }

    fn rollback(&mut self) -> Result<()> {
        push(&self.log, Event::Rollback);
        if std::mem::take(&mut self.fail_rollback) {
            return Err(DynconnError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset during rollback",
            )));
        }
        self.connection.rollback()
    }

    fn clear(&mut self) {
        push(&self.log, Event::Clear);
    }
}
