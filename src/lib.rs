//! Broadcast WebSocket Chat Room Library
//!
//! A single-room chat server built with tokio-tungstenite using the Actor
//! pattern for state management.
//!
//! # Features
//! - One-time join binding a display name to a connection
//! - Broadcast of chat messages to everyone except the sender
//! - Typing indicators with a server-side inactivity debounce
//! - Presence announcements with a live participant count
//! - A shared todo list pushed to every connection on change
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `ChatServer` is the central actor owning the `Room` and todo list
//! - Each connection has a `handler` task communicating with the server
//! - Typing timers report back to the actor over their own channel
//! - No locks needed - all state access goes through message passing
//!
//! # Example
//! ```ignore
//! use tokio::net::TcpListener;
//! use tokio::sync::mpsc;
//! use room_chat::{ChatServer, handle_connection};
//!
//! #[tokio::main]
//! async fn main() {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await.unwrap();
//!     let (cmd_tx, cmd_rx) = mpsc::channel(256);
//!
//!     tokio::spawn(ChatServer::new(cmd_rx).run());
//!
//!     while let Ok((stream, _)) = listener.accept().await {
//!         let cmd_tx = cmd_tx.clone();
//!         tokio::spawn(handle_connection(stream, cmd_tx, 32));
//!     }
//! }
//! ```

pub mod config;
pub mod connection;
pub mod error;
pub mod handler;
pub mod message;
pub mod room;
pub mod server;
pub mod todo;
pub mod types;
pub mod typing;

// Re-export main types for convenience
pub use config::Config;
pub use connection::Connection;
pub use error::{AppError, SendError, StoreError};
pub use handler::handle_connection;
pub use message::{ClientMessage, ServerMessage};
pub use room::Room;
pub use server::{ChatServer, ServerCommand};
pub use todo::{Todo, TodoList};
pub use types::{ConnectionId, TodoId};
pub use typing::{TypingState, DEFAULT_TYPING_TIMEOUT};
