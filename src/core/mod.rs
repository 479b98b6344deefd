/// Core Module for dynconn
///
/// Shared infrastructure: error handling, connection parameters and the
/// connection handle with its drivers.

pub mod db;
pub mod error;
pub mod params;

// Re-export commonly used types for convenience
pub use db::{Connection, DynamicConnection, Reinitializable, StaticConnection, TransactionState};
pub use error::{CommandResult, DynconnError, Result};
pub use params::{ConnectionParameters, ParamValue};
