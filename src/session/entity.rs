use crate::core::db::connection::Connection;
use crate::core::Result;
use crate::session::Session;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Minimal session: a connection plus an identity map of loaded entities,
/// keyed by entity name and id.
#[derive(Debug)]
pub struct EntitySession<C> {
    connection: C,
    identity_map: HashMap<(String, String), Value>,
}

impl<C: Connection> EntitySession<C> {
    pub fn new(connection: C) -> Self {
        EntitySession {
            connection,
            identity_map: HashMap::new(),
        }
    }

    /// Caches `entity` under `(kind, id)`, replacing any previous copy.
    pub fn remember<T: Serialize>(&mut self, kind: &str, id: &str, entity: &T) -> Result<()> {
        let value = serde_json::to_value(entity)?;
        self.identity_map.insert((kind.to_string(), id.to_string()), value);
        Ok(())
    }

    /// Returns the cached copy of `(kind, id)`, if any.
    pub fn find<T: DeserializeOwned>(&self, kind: &str, id: &str) -> Result<Option<T>> {
        match self.identity_map.get(&(kind.to_string(), id.to_string())) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.identity_map.len()
    }

    pub fn begin_transaction(&mut self) -> Result<()> {
        self.connection.begin_transaction()
    }

    pub fn commit(&mut self) -> Result<()> {
        self.connection.commit()
    }

    pub fn execute_batch(&mut self, sql: &str) -> Result<()> {
        self.connection.execute_batch(sql)
    }

    pub fn get_connection(&self) -> &C {
        &self.connection
    }

    pub fn get_connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }
}

impl<C: Connection> Session for EntitySession<C> {
    fn connection(&mut self) -> &mut dyn Connection {
        &mut self.connection
    }

    fn rollback(&mut self) -> Result<()> {
        self.connection.rollback()
    }

    fn clear(&mut self) {
        debug!(entries = self.identity_map.len(), "Clearing identity map");
        self.identity_map.clear();
    }
}
