//! Server configuration
//!
//! Loaded from a TOML file when one is present, otherwise from defaults.
//! `ROOM_CHAT_HOST` / `ROOM_CHAT_PORT` override the default bind address.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::AppError;

/// Config file consulted when `ROOM_CHAT_CONFIG` is not set
const DEFAULT_CONFIG_FILE: &str = "room_chat.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Inactivity before a typing participant is reported as stopped
    #[serde(default = "default_typing_timeout_ms")]
    pub typing_timeout_ms: u64,

    /// Buffer size of the handler → server command channel
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,

    /// Buffer size of each server → connection channel
    #[serde(default = "default_client_buffer")]
    pub client_buffer: usize,

    /// JSON file backing the todo list (in-memory only when unset)
    #[serde(default)]
    pub todo_file: Option<PathBuf>,
}

fn default_host() -> String {
    std::env::var("ROOM_CHAT_HOST").unwrap_or_else(|_| "127.0.0.1".to_string())
}

fn default_port() -> u16 {
    std::env::var("ROOM_CHAT_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080)
}

fn default_typing_timeout_ms() -> u64 {
    800
}

fn default_channel_buffer() -> usize {
    256
}

fn default_client_buffer() -> usize {
    32
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            typing_timeout_ms: default_typing_timeout_ms(),
            channel_buffer: default_channel_buffer(),
            client_buffer: default_client_buffer(),
            todo_file: None,
        }
    }
}

impl Config {
    /// Load from `ROOM_CHAT_CONFIG`, then `room_chat.toml`, then defaults
    pub fn load() -> Result<Self, AppError> {
        if let Ok(path) = std::env::var("ROOM_CHAT_CONFIG") {
            return Self::from_file(path);
        }

        if Path::new(DEFAULT_CONFIG_FILE).exists() {
            return Self::from_file(DEFAULT_CONFIG_FILE);
        }

        Ok(Self::default())
    }

    /// Load from a specific TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, AppError> {
        Ok(toml::from_str(contents)?)
    }

    /// Socket address to bind to
    pub fn bind_addr(&self) -> Result<SocketAddr, AppError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| AppError::BindAddr(addr))
    }

    pub fn typing_timeout(&self) -> Duration {
        Duration::from_millis(self.typing_timeout_ms)
    }
}
