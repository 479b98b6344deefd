/// Connection Management Module
///
/// This module provides the connection handle: one logical connection slot
/// holding the current target parameters, the transaction state and at most
/// one physical connection. The slot can be redirected in place with
/// `Reinitializable::reinitialize`.

use crate::core::db::driver::{driver_for, Driver, PhysicalConnection};
use crate::core::params::ConnectionParameters;
use crate::core::{DynconnError, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Represents database transaction states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionState {
    /// No active transaction (autocommit mode)
    #[default]
    Autocommit,
    /// Transaction in progress
    Transaction,
    /// A COMMIT failed; the transaction is still open and must be rolled back
    Failed,
}

/// Operations every connection handle exposes.
pub trait Connection {
    /// `true` while a physical connection is live.
    fn is_connected(&self) -> bool;

    /// Closes the physical connection, if any. The slot is empty afterwards
    /// even when the driver reports an error.
    fn close(&mut self) -> Result<()>;

    /// The last-applied parameter set.
    fn params(&self) -> &ConnectionParameters;

    fn database_name(&self) -> Option<&str> {
        self.params().database()
    }

    fn transaction_state(&self) -> TransactionState;

    fn is_transaction_active(&self) -> bool {
        self.transaction_state() != TransactionState::Autocommit
    }

    fn begin_transaction(&mut self) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    /// Runs SQL on the current target, connecting first if needed.
    fn execute_batch(&mut self, sql: &str) -> Result<()>;

    /// Capability check for runtime redirection. Fixed-target handles keep
    /// the default `None`.
    fn as_reinitializable(&mut self) -> Option<&mut dyn Reinitializable> {
        None
    }
}

/// A handle whose target can be changed at runtime.
pub trait Reinitializable: Connection {
    /// Closes the live connection (if open) and re-primes the handle with
    /// `params() merged with overrides`. The override map is taken literally.
    /// No connection is opened until the next use.
    fn reinitialize(&mut self, overrides: ConnectionParameters) -> Result<()>;
}

/// Connection handle that can be redirected to another database.
///
/// The handle keeps its identity across switches: anyone holding it sees the
/// new target afterwards. It carries no internal lock; callers that share a
/// handle between threads must serialize switches with their own mutex.
pub struct DynamicConnection {
    id: Uuid,
    params: ConnectionParameters,
    driver: Arc<dyn Driver>,
    physical: Option<Box<dyn PhysicalConnection>>,
    transaction_state: TransactionState,
    generation: u64,
}

impl DynamicConnection {
    /// Creates a handle for `params`. Nothing is opened yet.
    pub fn new(params: ConnectionParameters, driver: Arc<dyn Driver>) -> Self {
        let id = Uuid::new_v4();
        debug!(%id, driver = driver.name(), "Created connection handle");
        DynamicConnection {
            id,
            params,
            driver,
            physical: None,
            transaction_state: TransactionState::default(),
            generation: 0,
        }
    }

    /// Creates a handle using the driver named by the `driver` parameter.
    pub fn from_params(params: ConnectionParameters) -> Result<Self> {
        let driver = driver_for(&params)?;
        Ok(Self::new(params, driver))
    }

    /// Stable identifier of this handle, unchanged by `reinitialize`.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Number of times the handle has been reinitialized.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn driver_name(&self) -> &str {
        self.driver.name()
    }

    /// Opens the physical connection if it is not open yet.
    pub fn connect(&mut self) -> Result<()> {
        self.physical_mut().map(|_| ())
    }

    fn physical_mut(&mut self) -> Result<&mut (dyn PhysicalConnection + 'static)> {
        if self.physical.is_none() {
            debug!(id = %self.id, database = ?self.params.database(), "Connecting");
            self.physical = Some(self.driver.connect(&self.params)?);
        }
        match self.physical.as_deref_mut() {
            Some(physical) => Ok(physical),
            None => Err(DynconnError::Driver("Connection slot is empty".to_string())),
        }
    }
}

impl Connection for DynamicConnection {
    fn is_connected(&self) -> bool {
        self.physical.is_some()
    }

    fn close(&mut self) -> Result<()> {
        let Some(physical) = self.physical.take() else {
            return Ok(());
        };
        self.transaction_state = TransactionState::Autocommit;
        debug!(id = %self.id, database = ?self.params.database(), "Closing connection");
        physical.close()
    }

    fn params(&self) -> &ConnectionParameters {
        &self.params
    }

    fn transaction_state(&self) -> TransactionState {
        self.transaction_state
    }

    fn begin_transaction(&mut self) -> Result<()> {
        if self.transaction_state != TransactionState::Autocommit {
            return Err(DynconnError::Transaction("Transaction already in progress".to_string()));
        }
        self.physical_mut()?.execute_batch("BEGIN")?;
        self.transaction_state = TransactionState::Transaction;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if self.transaction_state != TransactionState::Transaction {
            return Err(DynconnError::Transaction("No transaction in progress".to_string()));
        }
        let committed = self.physical_mut()?.execute_batch("COMMIT");
        if let Err(e) = committed {
            self.transaction_state = TransactionState::Failed;
            return Err(e);
        }
        self.transaction_state = TransactionState::Autocommit;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if self.transaction_state == TransactionState::Autocommit {
            return Err(DynconnError::Transaction("No transaction in progress".to_string()));
        }
        self.physical_mut()?.execute_batch("ROLLBACK")?;
        self.transaction_state = TransactionState::Autocommit;
        Ok(())
    }

    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.physical_mut()?.execute_batch(sql)
    }

    fn as_reinitializable(&mut self) -> Option<&mut dyn Reinitializable> {
        Some(self)
    }
}

impl Reinitializable for DynamicConnection {
    fn reinitialize(&mut self, overrides: ConnectionParameters) -> Result<()> {
        if self.is_connected() {
            self.close()?;
        }

        self.params = self.params.merged_with(&overrides);
        self.transaction_state = TransactionState::Autocommit;
        self.generation += 1;

        info!(
            id = %self.id,
            generation = self.generation,
            params = ?self.params,
            "Connection reinitialized"
        );
        Ok(())
    }
}

impl fmt::Debug for DynamicConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicConnection")
            .field("id", &self.id)
            .field("driver", &self.driver.name())
            .field("params", &self.params)
            .field("connected", &self.is_connected())
            .field("transaction_state", &self.transaction_state)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Connection handle bound to a single target for its whole life.
#[derive(Debug)]
pub struct StaticConnection {
    inner: DynamicConnection,
}

impl StaticConnection {
    pub fn new(params: ConnectionParameters, driver: Arc<dyn Driver>) -> Self {
        StaticConnection {
            inner: DynamicConnection::new(params, driver),
        }
    }

    pub fn from_params(params: ConnectionParameters) -> Result<Self> {
        Ok(StaticConnection {
            inner: DynamicConnection::from_params(params)?,
        })
    }
}

impl Connection for StaticConnection {
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
}
