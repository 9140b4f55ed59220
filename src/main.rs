//! Broadcast WebSocket Chat Room - Entry Point
//!
//! Loads configuration, starts the TCP listener and ChatServer actor,
//! and accepts connections.

use std::env;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use room_chat::{handle_connection, ChatServer, Config, TodoList};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Use RUST_LOG to control log level,
    // e.g. RUST_LOG=debug or RUST_LOG=room_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("room_chat=info")),
        )
        .init();

    let config = Config::load()?;

    // Bind address from command line overrides the config
    let addr = match env::args().nth(1) {
        Some(addr) => addr,
        None => config.bind_addr()?.to_string(),
    };

    let todos = match &config.todo_file {
        Some(path) => TodoList::open(path).unwrap_or_else(|e| {
            warn!("Could not open todo file {}: {}, using defaults", path.display(), e);
            TodoList::new()
        }),
        None => TodoList::new(),
    };

    let listener = TcpListener::bind(&addr).await?;
    info!("WebSocket Chat Room listening on {}", addr);

    let (cmd_tx, cmd_rx) = mpsc::channel(config.channel_buffer);
    let server = ChatServer::new(cmd_rx)
        .with_todos(todos)
        .with_typing_timeout(config.typing_timeout());
    tokio::spawn(server.run());

    info!("ChatServer actor started");

    let client_buffer = config.client_buffer;

    // Connection accept loop
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let cmd_tx = cmd_tx.clone();

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, cmd_tx, client_buffer).await {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
