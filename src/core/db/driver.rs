/// Driver Module
///
/// A driver turns a parameter set into a live physical connection. The
/// handle owns at most one such connection at a time and asks the driver
/// for a new one lazily, on first use after construction or a switch.
use crate::core::params::{ConnectionParameters, DRIVER};
use crate::core::{DynconnError, Result};
use rusqlite::Connection as SqliteConn;
use std::sync::Arc;
use tracing::debug;

/// One open socket or file handle, exclusively owned by a connection handle.
pub trait PhysicalConnection: Send {
    /// Runs one or more SQL statements, discarding any rows.
    fn execute_batch(&mut self, sql: &str) -> Result<()>;

    /// Closes the resource. The resource is released even when this fails.
    fn close(self: Box<Self>) -> Result<()>;
}

/// Factory for physical connections.
pub trait Driver: Send + Sync {
    fn name(&self) -> &str;

    /// Opens a physical connection for `params`.
    fn connect(&self, params: &ConnectionParameters) -> Result<Box<dyn PhysicalConnection>>;
}

/// SQLite driver backed by rusqlite.
///
/// The `database` parameter is the file path (`:memory:` for an in-memory
/// database). Network parameters have no meaning for SQLite and are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDriver;

impl Driver for SqliteDriver {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn connect(&self, params: &ConnectionParameters) -> Result<Box<dyn PhysicalConnection>> {
        let path = params.database().ok_or_else(|| {
            DynconnError::Parameter("SQLite connections require a 'database' path".to_string())
        })?;
        if params.host().is_some() || params.port().is_some() {
            debug!("Ignoring host/port for SQLite database {}", path);
        }

        let conn = SqliteConn::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        debug!("Opened SQLite database {}", path);

        Ok(Box::new(SqlitePhysical { conn }))
    }
}

struct SqlitePhysical {
    conn: SqliteConn,
}

impl PhysicalConnection for SqlitePhysical {
    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn close(self: Box<Self>) -> Result<()> {
        // On failure rusqlite hands the connection back; dropping it releases the file.
        self.conn.close().map_err(|(_conn, e)| DynconnError::Database(e))
    }
}

/// Resolves the driver named by the `driver` parameter.
///
/// A missing `driver` key selects SQLite.
pub fn driver_for(params: &ConnectionParameters) -> Result<Arc<dyn Driver>> {
    match params.get_str(DRIVER) {
        None | Some("sqlite") | Some("sqlite3") | Some("pdo_sqlite") => Ok(Arc::new(SqliteDriver)),
        Some(other) => Err(DynconnError::Config(format!("Unsupported driver '{}'", other))),
    }
}
