//! ChatServer Actor implementation
//!
//! The central actor that owns the room and the todo list. Every inbound
//! event is handled to completion before the next one, so registry updates
//! and fan-out for one event never interleave with another.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info};

use crate::connection::Connection;
use crate::message::ServerMessage;
use crate::room::Room;
use crate::todo::TodoList;
use crate::typing::{TypingExpired, DEFAULT_TYPING_TIMEOUT};
use crate::types::{ConnectionId, TodoId};

/// Commands sent from handlers to the ChatServer actor
#[derive(Debug)]
pub enum ServerCommand {
    /// New connection opened
    Connect {
        connection_id: ConnectionId,
        sender: mpsc::Sender<ServerMessage>,
    },
    /// Connection closed
    Disconnect { connection_id: ConnectionId },
    /// Bind a username to the connection
    Join {
        connection_id: ConnectionId,
        username: String,
    },
    /// Chat message to the room
    Message {
        connection_id: ConnectionId,
        text: String,
    },
    /// Keystroke activity
    Typing { connection_id: ConnectionId },
    /// Explicit stop typing
    StopTyping { connection_id: ConnectionId },
    /// Re-send the todo list
    TodoGet { connection_id: ConnectionId },
    /// Append a todo
    TodoAdd {
        connection_id: ConnectionId,
        title: String,
    },
    /// Remove a todo
    TodoRemove {
        connection_id: ConnectionId,
        id: String,
    },
}

/// The main ChatServer actor
pub struct ChatServer {
    /// All open connections
    room: Room,
    /// Shared todo list
    todos: TodoList,
    /// Inactivity threshold for typing indicators
    typing_timeout: Duration,
    /// Command receiver channel
    receiver: mpsc::Receiver<ServerCommand>,
    /// Handed to typing timers; they report back here
    expired_tx: mpsc::UnboundedSender<TypingExpired>,
    expired_rx: mpsc::UnboundedReceiver<TypingExpired>,
}

impl ChatServer {
    /// Create a new ChatServer with the given command receiver
    pub fn new(receiver: mpsc::Receiver<ServerCommand>) -> Self {
        let (expired_tx, expired_rx) = mpsc::unbounded_channel();
        Self {
            room: Room::new(),
            todos: TodoList::new(),
            typing_timeout: DEFAULT_TYPING_TIMEOUT,
            receiver,
            expired_tx,
            expired_rx,
        }
    }

    pub fn with_todos(mut self, todos: TodoList) -> Self {
        self.todos = todos;
        self
    }

    pub fn with_typing_timeout(mut self, timeout: Duration) -> Self {
        self.typing_timeout = timeout;
        self
    }

    /// Run the ChatServer event loop
    ///
    /// Processes commands and typing expiries until all command senders
    /// are dropped.
    pub async fn run(mut self) {
        info!("ChatServer started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => break,
                },
                Some(expired) = self.expired_rx.recv() => {
                    self.handle_typing_expired(expired.connection_id).await;
                }
            }
        }

        info!("ChatServer shutting down");
    }

    /// Process a single command
    async fn handle_command(&mut self, cmd: ServerCommand) {
        match cmd {
            ServerCommand::Connect {
                connection_id,
                sender,
            } => {
                self.handle_connect(connection_id, sender);
            }
            ServerCommand::Disconnect { connection_id } => {
                self.handle_disconnect(connection_id).await;
            }
            ServerCommand::Join {
                connection_id,
                username,
            } => {
                self.handle_join(connection_id, username).await;
            }
            ServerCommand::Message {
                connection_id,
                text,
            } => {
                self.handle_message(connection_id, text).await;
            }
            ServerCommand::Typing { connection_id } => {
                self.handle_typing(connection_id).await;
            }
            ServerCommand::StopTyping { connection_id } => {
                self.stop_typing(connection_id).await;
            }
            ServerCommand::TodoGet { connection_id } => {
                debug!("Connection {} requested todos", connection_id);
                self.publish_todos().await;
            }
            ServerCommand::TodoAdd {
                connection_id,
                title,
            } => {
                self.handle_todo_add(connection_id, title).await;
            }
            ServerCommand::TodoRemove { connection_id, id } => {
                self.handle_todo_remove(connection_id, TodoId(id)).await;
            }
        }
    }

    fn handle_connect(&mut self, connection_id: ConnectionId, sender: mpsc::Sender<ServerMessage>) {
        self.room.insert(Connection::new(connection_id, sender));
        debug!(
            "Connection {} registered, total connections: {}",
            connection_id,
            self.room.len()
        );
    }

    /// Handle connection close
    ///
    /// Only joined connections are announced to the room.
    async fn handle_disconnect(&mut self, connection_id: ConnectionId) {
        let Some(mut connection) = self.room.remove(connection_id) else {
            return;
        };

        connection.typing_timer.cancel();
        let was_typing = connection.typing.stop();

        let Some(username) = connection.username().map(str::to_string) else {
            debug!("Connection {} closed without joining", connection_id);
            return;
        };

        if was_typing {
            self.room.broadcast(
                connection_id,
                ServerMessage::StopTyping {
                    username: username.clone(),
                },
            );
        }

        let participant_count = self.room.participant_count();
        info!("'{}' left, participants: {}", username, participant_count);

        self.room.broadcast(
            connection_id,
            ServerMessage::ParticipantLeft {
                username,
                participant_count,
            },
        );
    }

    /// Handle join
    ///
    /// Blank names and repeated joins are ignored.
    async fn handle_join(&mut self, connection_id: ConnectionId, username: String) {
        let username = username.trim();
        if username.is_empty() {
            debug!("Ignoring blank join from {}", connection_id);
            return;
        }

        let Some(connection) = self.room.get_mut(connection_id) else {
            return;
        };

        if !connection.set_username(username.to_string()) {
            debug!(
                "Ignoring repeated join from {} ('{}')",
                connection_id,
                connection.display_name()
            );
            return;
        }

        let participant_count = self.room.participant_count();
        info!(
            "Connection {} joined as '{}', participants: {}",
            connection_id, username, participant_count
        );

        self.room.send_to(connection_id, ServerMessage::Welcome { participant_count });
        self.room.broadcast(
            connection_id,
            ServerMessage::ParticipantJoined {
                username: username.to_string(),
                participant_count,
            },
        );
    }

    /// Handle chat message
    ///
    /// Ends the sender's typing state first so recipients see
    /// `stop_typing` before the message.
    async fn handle_message(&mut self, connection_id: ConnectionId, text: String) {
        let Some(username) = self.joined_username(connection_id) else {
            debug!("Ignoring message from unjoined connection {}", connection_id);
            return;
        };

        if text.trim().is_empty() {
            return;
        }

        self.stop_typing(connection_id).await;

        self.room.broadcast(connection_id, ServerMessage::Message { username, text });
    }

    /// Handle keystroke activity
    async fn handle_typing(&mut self, connection_id: ConnectionId) {
        let now = Instant::now();

        let Some(connection) = self.room.get_mut(connection_id) else {
            return;
        };
        let Some(username) = connection.username().map(str::to_string) else {
            return;
        };

        let started = connection.typing.keystroke(now);
        connection
            .typing_timer
            .reschedule(connection_id, self.typing_timeout, self.expired_tx.clone());

        if started {
            self.room.broadcast(connection_id, ServerMessage::Typing { username });
        }
    }

    /// Force `typing → idle`, announcing it if the connection was typing
    async fn stop_typing(&mut self, connection_id: ConnectionId) {
        let Some(connection) = self.room.get_mut(connection_id) else {
            return;
        };

        connection.typing_timer.cancel();
        if !connection.typing.stop() {
            return;
        }

        if let Some(username) = connection.username().map(str::to_string) {
            self.room.broadcast(connection_id, ServerMessage::StopTyping { username });
        }
    }

    /// Handle a fired typing timer
    ///
    /// No-op unless the threshold has really elapsed since the last
    /// keystroke and the connection is still typing.
    async fn handle_typing_expired(&mut self, connection_id: ConnectionId) {
        let now = Instant::now();

        let Some(connection) = self.room.get_mut(connection_id) else {
            return;
        };

        if !connection.typing.expire(now, self.typing_timeout) {
            return;
        }

        if let Some(username) = connection.username().map(str::to_string) {
            debug!("'{}' stopped typing (timeout)", username);
            self.room.broadcast(connection_id, ServerMessage::StopTyping { username });
        }
    }

    async fn handle_todo_add(&mut self, connection_id: ConnectionId, title: String) {
        let title = title.trim();
        if title.is_empty() {
            return;
        }

        if let Err(e) = self.todos.add(title.to_string()) {
            error!("Failed to persist todo from {}: {}", connection_id, e);
        }
        self.publish_todos().await;
    }

    async fn handle_todo_remove(&mut self, connection_id: ConnectionId, id: TodoId) {
        if let Err(e) = self.todos.remove(&id) {
            error!("Failed to persist todo removal from {}: {}", connection_id, e);
        }
        self.publish_todos().await;
    }

    /// Send the full todo list to every connection
    async fn publish_todos(&self) {
        self.room.send_all(ServerMessage::Todos {
            todos: self.todos.all().to_vec(),
        });
    }

    fn joined_username(&self, connection_id: ConnectionId) -> Option<String> {
        self.room
            .get(connection_id)
            .and_then(|c| c.username())
            .map(str::to_string)
    }
}
