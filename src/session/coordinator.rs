//! Switch coordination.
//!
//! `DynamicSession` decorates a session and redirects its connection handle
//! in four steps: check the handle can be reinitialized, roll back an active
//! transaction, clear cached entities, then reinitialize the handle with the
//! supplied overrides. A rejected handle leaves the session untouched.

use crate::core::params::{ConnectionParameters, DATABASE, HOST, PASSWORD, PORT, USER};
use crate::core::{Connection, DynconnError, Result};
use crate::session::Session;
use serde::Deserialize;
use std::fmt;
use std::ops::{Deref, DerefMut};
use tracing::{debug, info, warn};

/// Named arguments of a switch. Unset fields keep their current value.
///
/// Empty strings and port `0` count as unset. The string `"0"` is a real
/// value here (a database may be named `0`), unlike loosely-typed callers
/// that treat every falsy value as absent.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SwitchTarget {
    #[serde(default, alias = "dbname", alias = "dbName")]
    pub database: Option<String>,
    #[serde(default, alias = "user")]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

impl SwitchTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Builds the override map from the supplied, non-empty arguments only.
    pub fn into_overrides(self) -> ConnectionParameters {
        let mut overrides = ConnectionParameters::new();
        let fields = [
            (DATABASE, self.database),
            (USER, self.username),
            (PASSWORD, self.password),
            (HOST, self.host),
        ];
        for (key, value) in fields {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                overrides.insert(key, value);
            }
        }
        if let Some(port) = self.port.filter(|p| *p != 0) {
            overrides.insert(PORT, port);
        }
        overrides
    }
}

impl fmt::Debug for SwitchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwitchTarget")
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

/// Session decorator adding runtime connection switching.
///
/// All other session calls reach the wrapped session through `Deref`.
#[derive(Debug)]
pub struct DynamicSession<S> {
    inner: S,
}

impl<S: Session> DynamicSession<S> {
    pub fn new(inner: S) -> Self {
        DynamicSession { inner }
    }

    /// Redirects the session's connection to `target`.
    ///
    /// Fails with `UnsupportedConnectionType` before touching anything when
    /// the handle cannot be reinitialized. Any other failure comes straight
    /// from the session or driver.
    pub fn switch_target(&mut self, target: SwitchTarget) -> Result<()> {
        let transaction_active = match self.inner.connection().as_reinitializable() {
            Some(handle) => handle.is_transaction_active(),
            None => {
                warn!("Rejected switch: connection handle cannot be reinitialized");
                return Err(DynconnError::unsupported_connection_type());
            }
        };

        if transaction_active {
            warn!("Rolling back active transaction before switching target");
            self.inner.rollback()?;
        }

        self.inner.clear();
        debug!("Session cache cleared");

        let overrides = target.into_overrides();
        info!(?overrides, "Switching connection target");

        // Capability was checked above; a session that swaps its handle
        // mid-switch is a session bug, not an unsupported handle.
        match self.inner.connection().as_reinitializable() {
            Some(handle) => handle.reinitialize(overrides),
            None => Err(DynconnError::Driver(
                "Connection handle lost its reinitialize capability during the switch".to_string(),
            )),
        }
    }

    /// Single-argument form of `switch_target`.
    pub fn switch_database(&mut self, database: &str) -> Result<()> {
        self.switch_target(SwitchTarget::new().database(database))
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S> Deref for DynamicSession<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.inner
    }
}

impl<S> DerefMut for DynamicSession<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.inner
    }
}

impl<S: Session> Session for DynamicSession<S> {
    fn connection(&mut self) -> &mut dyn Connection {
        self.inner.connection()
    }

    fn rollback(&mut self) -> Result<()> {
        self.inner.rollback()
    }

    fn clear(&mut self) {
        self.inner.clear()
    }
}
