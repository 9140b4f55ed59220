//! Error types for the chat server
//!
//! Defines connection-level, configuration, and message send errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Application-level errors
///
/// All of these end the affected connection (or startup); none are
/// reported back to clients.
#[derive(Debug, Error)]
pub enum AppError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send error (fatal - internal channel broken)
    #[error("Channel send error")]
    ChannelSend,

    /// Configuration file could not be parsed
    #[error("Invalid config file: {0}")]
    Config(#[from] toml::de::Error),

    /// Host/port do not form a socket address
    #[error("Invalid bind address '{0}'")]
    BindAddr(String),
}

/// Message send errors
///
/// Occurs when attempting to send messages through closed channels.
#[derive(Debug, Error)]
pub enum SendError {
    /// The receiving end of the channel has been closed
    #[error("Channel closed")]
    ChannelClosed,

    /// The receiver is not keeping up; the message was dropped
    #[error("Channel full")]
    Full,
}

/// Todo store persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store format error: {0}")]
    Json(#[from] serde_json::Error),
}
