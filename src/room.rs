//! Room struct definition
//!
//! The room is the set of all open connections. It owns the connection
//! registry and the fan-out primitives used by the server.

use std::collections::HashMap;

use tracing::debug;

use crate::connection::Connection;
use crate::error::SendError;
use crate::message::ServerMessage;
use crate::types::ConnectionId;

/// Broadcast chat room
///
/// Membership changes only through connect/disconnect. The participant
/// count is derived from the registry, so it always equals the number of
/// connections that completed join.
#[derive(Debug, Default)]
pub struct Room {
    connections: HashMap<ConnectionId, Connection>,
}

impl Room {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly opened connection
    pub fn insert(&mut self, connection: Connection) {
        self.connections.insert(connection.id, connection);
    }

    /// Remove a connection, returning its final state
    pub fn remove(&mut self, id: ConnectionId) -> Option<Connection> {
        self.connections.remove(&id)
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(&id)
    }

    /// Number of open connections (joined or not)
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Number of connections that have joined
    pub fn participant_count(&self) -> usize {
        self.connections.values().filter(|c| c.is_joined()).count()
    }

    /// Send to a single connection
    pub fn send_to(&self, id: ConnectionId, msg: ServerMessage) {
        if let Some(connection) = self.connections.get(&id) {
            deliver(connection, msg);
        }
    }

    /// Deliver to every connection except `sender`
    ///
    /// Never waits on a recipient: closed or backed-up connections miss the
    /// message and everyone else still gets it.
    pub fn broadcast(&self, sender: ConnectionId, msg: ServerMessage) {
        for connection in self.connections.values().filter(|c| c.id != sender) {
            deliver(connection, msg.clone());
        }
    }

    /// Deliver to every connection, sender included
    pub fn send_all(&self, msg: ServerMessage) {
        for connection in self.connections.values() {
            deliver(connection, msg.clone());
        }
    }
}

fn deliver(connection: &Connection, msg: ServerMessage) {
    match connection.send(msg) {
        Ok(()) => {}
        Err(SendError::ChannelClosed) => {
            debug!("Dropped message for closed connection {}", connection.id);
        }
        Err(SendError::Full) => {
            debug!("Dropped message for lagging connection {}", connection.id);
        }
    }
}
