/// Dynconn Error Module
///
/// This module defines the error types for dynconn. Only one failure is
/// produced by the switching protocol itself; everything else is a driver,
/// session or configuration failure passed through unchanged.
use thiserror::Error;

/// Name of the capability a handle must implement to be switched.
pub const REINITIALIZABLE: &str = "Reinitializable";

/// Error type for the dynconn crate.
///
/// Covers:
/// - Capability rejection when a session hands back a fixed-target handle
/// - Driver failures (SQLite) while opening, closing or executing
/// - Parameter, configuration and transaction misuse
#[derive(Error, Debug)]
pub enum DynconnError {
    /// The session's handle cannot be redirected at runtime
    #[error("Wrong connection type. Implementation of {expected} expected.")]
    UnsupportedConnectionType { expected: &'static str },

    /// Database-related errors from SQLite operations
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors from the session identity map
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML configuration parse errors
    #[error("Configuration parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed connection parameters or DSN
    #[error("Parameter error: {0}")]
    Parameter(String),

    /// Transaction-related errors
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Driver-level failures not covered by a more specific variant
    #[error("Driver error: {0}")]
    Driver(String),

    /// REPL command validation errors
    #[error("Command error: {0}")]
    Command(String),
}

impl DynconnError {
    /// Builds the capability rejection for handles lacking `reinitialize`.
    pub fn unsupported_connection_type() -> Self {
        DynconnError::UnsupportedConnectionType {
            expected: REINITIALIZABLE,
        }
    }
}

/// Type alias for Result to use DynconnError as the error type.
pub type Result<T> = std::result::Result<T, DynconnError>;

/// Type alias for REPL command results that may carry a message to print
pub type CommandResult = Result<Option<String>>;
