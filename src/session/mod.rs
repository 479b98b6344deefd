//! Session layer: the object holding cached entities and transaction state
//! on top of a connection handle, and the coordinator that redirects it.

pub mod coordinator;
pub mod entity;

pub use coordinator::{DynamicSession, SwitchTarget};
pub use entity::EntitySession;

use crate::core::db::connection::Connection;
use crate::core::Result;

/// What the switch protocol needs from a session.
pub trait Session {
    /// The session's current connection handle.
    fn connection(&mut self) -> &mut dyn Connection;

    /// Aborts the session's active transaction.
    fn rollback(&mut self) -> Result<()>;

    /// Drops every cached entity.
    fn clear(&mut self);
}
