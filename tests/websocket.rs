//! End-to-end tests over real WebSocket connections

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use room_chat::{handle_connection, ChatServer};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(2);

async fn start_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    tokio::spawn(
        ChatServer::new(cmd_rx)
            .with_typing_timeout(Duration::from_millis(50))
            .run(),
    );

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(handle_connection(stream, cmd_tx.clone(), 32));
        }
    });

    format!("ws://{}", addr)
}

async fn open(url: &str) -> Ws {
    let (ws, _) = connect_async(url).await.unwrap();
    ws
}

/// Open a connection and wait until the server has registered it
///
/// Registration is observed through a `todos` snapshot, which goes to
/// every open connection, so each peer in `others` gets one as well.
async fn open_registered(url: &str, others: &mut [&mut Ws]) -> Ws {
    let mut ws = open(url).await;
    send(&mut ws, json!({"type": "todo_get"})).await;
    assert_eq!(recv(&mut ws).await["type"], "todos");
    for other in others.iter_mut() {
        assert_eq!(recv(other).await["type"], "todos");
    }
    ws
}

async fn send(ws: &mut Ws, value: Value) {
    ws.send(Message::Text(value.to_string().into())).await.unwrap();
}

async fn recv(ws: &mut Ws) -> Value {
    loop {
        let msg = timeout(WAIT, ws.next()).await.unwrap().unwrap().unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

#[tokio::test]
async fn test_chat_over_websocket() {
    let url = start_server().await;
    let mut alice = open_registered(&url, &mut []).await;
    let mut bob = open_registered(&url, &mut [&mut alice]).await;

    send(&mut alice, json!({"type": "join", "username": "alice"})).await;
    assert_eq!(
        recv(&mut alice).await,
        json!({"type": "welcome", "participantCount": 1})
    );
    assert_eq!(
        recv(&mut bob).await,
        json!({"type": "participant_joined", "username": "alice", "participantCount": 1})
    );

    send(&mut bob, json!({"type": "join", "username": "bob"})).await;
    assert_eq!(
        recv(&mut bob).await,
        json!({"type": "welcome", "participantCount": 2})
    );
    assert_eq!(
        recv(&mut alice).await,
        json!({"type": "participant_joined", "username": "bob", "participantCount": 2})
    );

    // Malformed input is dropped without closing the connection
    alice
        .send(Message::Text("{not json".to_string().into()))
        .await
        .unwrap();

    send(&mut alice, json!({"type": "message", "text": "hi"})).await;
    assert_eq!(
        recv(&mut bob).await,
        json!({"type": "message", "username": "alice", "text": "hi"})
    );

    send(&mut bob, json!({"type": "typing"})).await;
    assert_eq!(
        recv(&mut alice).await,
        json!({"type": "typing", "username": "bob"})
    );
    assert_eq!(
        recv(&mut alice).await,
        json!({"type": "stop_typing", "username": "bob"})
    );

    bob.close(None).await.unwrap();
    assert_eq!(
        recv(&mut alice).await,
        json!({"type": "participant_left", "username": "bob", "participantCount": 1})
    );

    // Reconnect: a fresh connection joins again under the old name
    let mut bob = open_registered(&url, &mut [&mut alice]).await;
    send(&mut bob, json!({"type": "join", "username": "bob"})).await;
    assert_eq!(
        recv(&mut bob).await,
        json!({"type": "welcome", "participantCount": 2})
    );
    assert_eq!(
        recv(&mut alice).await,
        json!({"type": "participant_joined", "username": "bob", "participantCount": 2})
    );

    send(&mut alice, json!({"type": "message", "text": "welcome back"})).await;
    assert_eq!(
        recv(&mut bob).await,
        json!({"type": "message", "username": "alice", "text": "welcome back"})
    );
}

#[tokio::test]
async fn test_todos_over_websocket() {
    let url = start_server().await;
    let mut first = open_registered(&url, &mut []).await;
    let mut second = open_registered(&url, &mut [&mut first]).await;

    send(&mut first, json!({"type": "todo_add", "title": "   "})).await;
    send(&mut first, json!({"type": "todo_get"})).await;
    let snapshot = recv(&mut first).await;
    assert_eq!(snapshot["todos"].as_array().unwrap().len(), 3);
    recv(&mut second).await;

    send(&mut second, json!({"type": "todo_remove", "id": "1"})).await;
    for ws in [&mut first, &mut second] {
        let update = recv(ws).await;
        assert_eq!(
            update["todos"],
            json!([{"id": "2", "title": "Sleep"}, {"id": "3", "title": "Repeat"}])
        );
    }
}
