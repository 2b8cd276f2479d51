//! Integration tests for the server assembly: the administrative
//! [`ServerHandle`] working alongside live WebSocket clients.

use std::time::Duration;

use bingo::prelude::*;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio_tungstenite::tungstenite::Message;

type Ws = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn start() -> (String, ServerHandle) {
    let server = BingoServer::builder()
        .bind("127.0.0.1:0")
        .build()
        .await
        .unwrap();
    let addr = server.local_addr().unwrap().to_string();
    let handle = server.handle();
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    tokio::time::sleep(Duration::from_millis(10)).await;
    (addr, handle)
}

async fn connect_and_join(addr: &str, code: &RoomCode, name: &str) -> Ws {
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/{code}"))
        .await
        .unwrap();
    ws.send(Message::Text(
        json!({"type": "join", "name": name}).to_string().into(),
    ))
    .await
    .unwrap();
    // state + player_joined
    let _ = ws.next().await.unwrap().unwrap();
    let _ = ws.next().await.unwrap().unwrap();
    ws
}

#[tokio::test]
async fn test_precreated_room_is_joinable() {
    let (addr, handle) = start().await;

    let code = handle.create_room().await;
    assert!(handle.room_codes().await.contains(&code));

    let _alice = connect_and_join(&addr, &code, "Alice").await;

    let snapshot = handle.room_snapshot(&code).await.unwrap();
    assert_eq!(snapshot.room_id, code);
    assert_eq!(snapshot.players.len(), 1);
    assert_eq!(snapshot.players[0].as_str(), "Alice");
    assert!(snapshot.numbers_drawn.is_empty());
    assert!(snapshot.winner.is_none());
}

#[tokio::test]
async fn test_snapshot_tracks_drawn_numbers() {
    let (addr, handle) = start().await;
    let code = handle.create_room().await;

    let mut alice = connect_and_join(&addr, &code, "Alice").await;
    alice
        .send(Message::Text(
            json!({"type": "mark_number", "number": 17}).to_string().into(),
        ))
        .await
        .unwrap();
    // mark_number + next_turn
    let _ = alice.next().await.unwrap().unwrap();
    let _ = alice.next().await.unwrap().unwrap();

    let snapshot = handle.room_snapshot(&code).await.unwrap();
    assert_eq!(snapshot.numbers_drawn, vec![17]);
}

#[tokio::test]
async fn test_snapshot_of_unknown_room_fails() {
    let (_addr, handle) = start().await;
    let code = RoomCode::parse("ZZ999").unwrap();
    assert!(matches!(
        handle.room_snapshot(&code).await,
        Err(RoomError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_emptied_room_disappears_from_the_registry() {
    let (addr, handle) = start().await;
    let code = handle.create_room().await;

    let mut alice = connect_and_join(&addr, &code, "Alice").await;
    alice.close(None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(handle.room_snapshot(&code).await.is_err());
    assert!(!handle.room_codes().await.contains(&code));
}
