//! Connection struct definition
//!
//! Represents one open transport session with its presence and typing state.

use tokio::sync::mpsc;

use crate::error::SendError;
use crate::message::ServerMessage;
use crate::typing::{TypingState, TypingTimer};
use crate::types::ConnectionId;

/// Connected session state
///
/// The username is set at most once (on join) and never changes for the
/// lifetime of the connection.
#[derive(Debug)]
pub struct Connection {
    /// Transport-level identifier
    pub id: ConnectionId,
    /// Display name (None until joined)
    username: Option<String>,
    /// Server → Client message channel
    pub sender: mpsc::Sender<ServerMessage>,
    /// Typing debounce state
    pub typing: TypingState,
    /// Pending typing expiry check
    pub typing_timer: TypingTimer,
}

impl Connection {
    /// Create a new connection with the given ID and sender channel
    pub fn new(id: ConnectionId, sender: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            id,
            username: None,
            sender,
            typing: TypingState::default(),
            typing_timer: TypingTimer::default(),
        }
    }

    /// Queue a message for this connection without waiting
    ///
    /// Fails if the connection is gone or its outbound buffer is full; a
    /// reader that stopped draining never holds up the caller.
    pub fn send(&self, msg: ServerMessage) -> Result<(), SendError> {
        self.sender.try_send(msg).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SendError::Full,
            mpsc::error::TrySendError::Closed(_) => SendError::ChannelClosed,
        })
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Get the display name for logging
    pub fn display_name(&self) -> &str {
        self.username().unwrap_or("Unknown")
    }

    /// Whether this connection has completed join
    pub fn is_joined(&self) -> bool {
        self.username.is_some()
    }

    /// Bind a username to this connection
    ///
    /// Returns false (and keeps the existing name) if already joined.
    pub fn set_username(&mut self, username: String) -> bool {
        if self.is_joined() {
            return false;
        }
        self.username = Some(username);
        true
    }
}
