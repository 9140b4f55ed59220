//! Message protocol definitions
//!
//! JSON-based bidirectional message protocol using Serde's tagged enum
//! for type-safe serialization/deserialization. Event names are snake_case,
//! field names camelCase.

use serde::{Deserialize, Serialize};

use crate::todo::Todo;

/// Client → Server message
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Bind a display name to this connection (once)
    Join { username: String },
    /// Send a chat message to the room
    Message { text: String },
    /// Keystroke activity
    Typing,
    /// Explicitly stopped typing
    StopTyping,
    /// Request the todo list
    TodoGet,
    /// Append a todo
    TodoAdd { title: String },
    /// Remove a todo by id
    TodoRemove { id: String },
}

/// Server → Client message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Join acknowledged (to the joiner only)
    #[serde(rename_all = "camelCase")]
    Welcome { participant_count: usize },
    /// Someone else joined
    #[serde(rename_all = "camelCase")]
    ParticipantJoined {
        username: String,
        participant_count: usize,
    },
    /// Chat message from another participant
    Message { username: String, text: String },
    /// Another participant started typing
    Typing { username: String },
    /// Another participant stopped typing
    StopTyping { username: String },
    /// A joined participant disconnected
    #[serde(rename_all = "camelCase")]
    ParticipantLeft {
        username: String,
        participant_count: usize,
    },
    /// Full todo list snapshot
    Todos { todos: Vec<Todo> },
}
