/// Database Module
///
/// ## Architecture
///
/// The database layer is split into two concerns:
/// - **Drivers** (`driver.rs`): open and close physical connections
/// - **Connection Handles** (`connection.rs`): own one physical connection,
///   its parameters and transaction state, and redirect it on request
///
/// All database operations use `DynconnError`; driver failures are passed
/// through without translation.
pub mod connection;
pub mod driver;

pub use connection::*;
pub use driver::*;
