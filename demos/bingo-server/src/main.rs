use bingo::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("BINGO_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

    let server = BingoServer::builder().bind(&addr).build().await?;
    tracing::info!(addr = %server.local_addr()?, "bingo server listening");

    server.run().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::{SinkExt, StreamExt};
    use serde_json::{Value, json};
    use std::time::Duration;
    use tokio_tungstenite::tungstenite::Message;

    type Ws = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn start() -> String {
        let server = BingoServer::builder()
            .bind("127.0.0.1:0")
            .build()
            .await
            .unwrap();
        let addr = server.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let _ = server.run().await;
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        addr
    }

    async fn ws(addr: &str, code: &str) -> Ws {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/{code}"))
            .await
            .unwrap();
        ws
    }

    async fn send(ws: &mut Ws, msg: Value) {
        ws.send(Message::Text(msg.to_string().into())).await.unwrap();
    }

    async fn recv(ws: &mut Ws) -> Value {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout")
            .unwrap()
            .unwrap();
        serde_json::from_slice(&msg.into_data()).unwrap()
    }

    /// Joins and drains the joiner's own `state` + `player_joined` pair.
    /// Returns the `state` snapshot.
    async fn join(ws: &mut Ws, name: &str) -> Value {
        send(ws, json!({"type": "join", "name": name})).await;
        let state = recv(ws).await;
        assert_eq!(state["type"], "state");
        let joined = recv(ws).await;
        assert_eq!(joined["type"], "player_joined");
        assert_eq!(joined["player"], name);
        state
    }

    /// Setup: Alice and Bob in one room, all join traffic drained.
    /// Turn order is [Alice, Bob] with Alice to move.
    async fn setup_pair(addr: &str, code: &str) -> (Ws, Ws) {
        let mut alice = ws(addr, code).await;
        let mut bob = ws(addr, code).await;
        join(&mut alice, "Alice").await;
        join(&mut bob, "Bob").await;
        let joined = recv(&mut alice).await; // Bob's player_joined broadcast
        assert_eq!(joined["player"], "Bob");
        (alice, bob)
    }

    /// Marks a number and drains the mark_number + next_turn broadcasts
    /// from both players.
    async fn mark(sender: &mut Ws, other: &mut Ws, number: u8) {
        send(sender, json!({"type": "mark_number", "number": number})).await;
        for ws in [sender, other] {
            let marked = recv(ws).await;
            assert_eq!(marked["type"], "mark_number");
            assert_eq!(marked["number"], number);
            let turn = recv(ws).await;
            assert_eq!(turn["type"], "next_turn");
        }
    }

    #[tokio::test]
    async fn test_join_creates_room_and_snapshots_state() {
        let addr = start().await;
        let mut alice = ws(&addr, "AA111").await;

        send(&mut alice, json!({"type": "join", "name": "Alice"})).await;

        // The joiner's snapshot reflects the room *before* their join.
        let state = recv(&mut alice).await;
        assert_eq!(state["type"], "state");
        assert_eq!(state["phase"], "waiting");
        assert_eq!(state["round"], 1);
        assert_eq!(state["players"], json!([]));
        assert_eq!(state["numbers_drawn"], json!([]));
        assert_eq!(state["winner"], Value::Null);

        // Then the roster broadcast, which flips the room active.
        let joined = recv(&mut alice).await;
        assert_eq!(joined["type"], "player_joined");
        assert_eq!(joined["player"], "Alice");
        assert_eq!(joined["players"], json!(["Alice"]));
        assert_eq!(joined["current_player"], "Alice");
        assert_eq!(joined["phase"], "active");
    }

    #[tokio::test]
    async fn test_second_join_broadcasts_to_everyone() {
        let addr = start().await;
        let (_alice, mut bob) = setup_pair(&addr, "AA222").await;

        // Bob's own join already showed Alice in the room.
        send(&mut bob, json!({"type": "heartbeat"})).await;
        let ack = recv(&mut bob).await;
        assert_eq!(ack["type"], "heartbeat_ack");
    }

    #[tokio::test]
    async fn test_mark_rotates_turns() {
        let addr = start().await;
        let (mut alice, mut bob) = setup_pair(&addr, "AA333").await;

        send(&mut alice, json!({"type": "mark_number", "number": 7})).await;

        for ws in [&mut alice, &mut bob] {
            let marked = recv(ws).await;
            assert_eq!(marked["type"], "mark_number");
            assert_eq!(marked["number"], 7);
            assert_eq!(marked["marked_by"], "Alice");

            let turn = recv(ws).await;
            assert_eq!(turn["type"], "next_turn");
            assert_eq!(turn["current_player"], "Bob");
        }
    }

    #[tokio::test]
    async fn test_out_of_turn_mark_rejected_privately() {
        let addr = start().await;
        let (mut alice, mut bob) = setup_pair(&addr, "AA444").await;

        // Bob moves out of turn; only Bob hears about it.
        send(&mut bob, json!({"type": "mark_number", "number": 3})).await;
        let rejected = recv(&mut bob).await;
        assert_eq!(rejected["type"], "invalid_move");
        assert_eq!(rejected["reason"], "not_your_turn");
        assert_eq!(rejected["current_player"], "Alice");

        // Alice saw nothing: her next message is her own mark broadcast.
        send(&mut alice, json!({"type": "mark_number", "number": 3})).await;
        let marked = recv(&mut alice).await;
        assert_eq!(marked["type"], "mark_number");
        assert_eq!(marked["marked_by"], "Alice");
    }

    #[tokio::test]
    async fn test_duplicate_number_rejected() {
        let addr = start().await;
        let (mut alice, mut bob) = setup_pair(&addr, "AA555").await;

        mark(&mut alice, &mut bob, 12).await;

        // Bob re-marks 12: already drawn, rejected privately, turn keeps.
        send(&mut bob, json!({"type": "mark_number", "number": 12})).await;
        let rejected = recv(&mut bob).await;
        assert_eq!(rejected["type"], "invalid_move");
        assert_eq!(rejected["reason"], "already_drawn");
        assert_eq!(rejected["current_player"], "Bob");

        mark(&mut bob, &mut alice, 13).await;
    }

    #[tokio::test]
    async fn test_winner_claim_finishes_round() {
        let addr = start().await;
        let (mut alice, mut bob) = setup_pair(&addr, "AA666").await;

        mark(&mut alice, &mut bob, 1).await;

        send(&mut bob, json!({"type": "winner"})).await;
        for ws in [&mut alice, &mut bob] {
            let won = recv(ws).await;
            assert_eq!(won["type"], "winner");
            assert_eq!(won["winner"], "Bob");
            assert_eq!(won["winners"], json!(["Bob"]));
            assert_eq!(won["draw"], false);
            assert_eq!(won["phase"], "finished");
        }

        // The outcome is latched: no moves until a reset.
        send(&mut alice, json!({"type": "mark_number", "number": 2})).await;
        let rejected = recv(&mut alice).await;
        assert_eq!(rejected["type"], "invalid_move");
        assert_eq!(rejected["reason"], "not_your_turn");
    }

    #[tokio::test]
    async fn test_reset_starts_a_fresh_round() {
        let addr = start().await;
        let (mut alice, mut bob) = setup_pair(&addr, "AA777").await;

        mark(&mut alice, &mut bob, 5).await;
        send(&mut alice, json!({"type": "winner"})).await;
        let _ = recv(&mut alice).await;
        let _ = recv(&mut bob).await;

        send(&mut bob, json!({"type": "reset"})).await;
        for ws in [&mut alice, &mut bob] {
            let reset = recv(ws).await;
            assert_eq!(reset["type"], "reset");
            assert_eq!(reset["phase"], "active");
            assert_eq!(reset["turn_order"], json!(["Alice", "Bob"]));
            assert_eq!(reset["current_player"], "Alice");
        }

        // Numbers from the last round are drawable again.
        mark(&mut alice, &mut bob, 5).await;
    }

    #[tokio::test]
    async fn test_reconnect_resumes_the_same_seat() {
        let addr = start().await;
        let (mut alice, mut bob) = setup_pair(&addr, "AA888").await;

        mark(&mut alice, &mut bob, 9).await;

        // Alice drops; Bob sees her leave.
        alice.close(None).await.unwrap();
        let left = recv(&mut bob).await;
        assert_eq!(left["type"], "player_left");
        assert_eq!(left["player"], "Alice");
        assert_eq!(left["players"], json!(["Bob"]));

        // Alice comes back under the same name: same seat, and the state
        // snapshot carries the drawn numbers so her client can rebuild
        // its board deterministically.
        let mut alice2 = ws(&addr, "AA888").await;
        let state = join(&mut alice2, "Alice").await;
        assert_eq!(state["players"], json!(["Bob"]));
        assert_eq!(state["numbers_drawn"], json!([9]));
        assert_eq!(state["round"], 1);

        let rejoined = recv(&mut bob).await;
        assert_eq!(rejoined["type"], "player_joined");
        assert_eq!(rejoined["player"], "Alice");
        assert_eq!(rejoined["players"], json!(["Bob", "Alice"]));
    }

    #[tokio::test]
    async fn test_last_player_leaving_destroys_the_room() {
        let addr = start().await;
        let mut alice = ws(&addr, "AA999").await;
        join(&mut alice, "Alice").await;
        send(&mut alice, json!({"type": "mark_number", "number": 4})).await;
        let _ = recv(&mut alice).await; // mark_number
        let _ = recv(&mut alice).await; // next_turn
        alice.close(None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Same code, but the room is gone: a fresh one has no history.
        let mut alice2 = ws(&addr, "AA999").await;
        let state = join(&mut alice2, "Alice").await;
        assert_eq!(state["numbers_drawn"], json!([]));
        assert_eq!(state["round"], 1);
    }

    #[tokio::test]
    async fn test_messages_before_join_are_dropped() {
        let addr = start().await;
        let mut alice = ws(&addr, "BB111").await;

        // Nothing before a join gets a reply, not even heartbeats.
        send(&mut alice, json!({"type": "mark_number", "number": 8})).await;
        send(&mut alice, json!({"type": "heartbeat"})).await;

        // First thing Alice ever receives is her join snapshot.
        let state = join(&mut alice, "Alice").await;
        assert_eq!(state["numbers_drawn"], json!([]));
    }

    #[tokio::test]
    async fn test_malformed_frames_keep_the_connection_alive() {
        let addr = start().await;
        let mut alice = ws(&addr, "BB222").await;
        join(&mut alice, "Alice").await;

        send(&mut alice, json!({"type": "no_such_message"})).await;
        alice
            .send(Message::Text("this is not json".into()))
            .await
            .unwrap();

        send(&mut alice, json!({"type": "heartbeat"})).await;
        let ack = recv(&mut alice).await;
        assert_eq!(ack["type"], "heartbeat_ack");
    }

    #[tokio::test]
    async fn test_bad_room_code_closes_the_connection() {
        let addr = start().await;
        // Lowercase codes are invalid; the server hangs up.
        let mut alice = ws(&addr, "nope!").await;
        let next = tokio::time::timeout(Duration::from_secs(5), alice.next())
            .await
            .expect("timeout");
        match next {
            None | Some(Ok(Message::Close(_))) | Some(Err(_)) => {}
            other => panic!("expected close, got {other:?}"),
        }
    }

    // Clients rebuild boards locally; two clients in the same room must
    // agree on each other's boards without ever exchanging them.
    #[test]
    fn test_clients_agree_on_generated_boards() {
        let ours = bingo_board::generate_board("AB123", "Alice");
        let theirs = bingo_board::generate_board("AB123", "Alice");
        assert_eq!(ours, theirs);
        assert_ne!(ours, bingo_board::generate_board("AB123", "Bob"));
    }

    // The board generator and the wire protocol define the 25-cell board
    // independently; this pins them together.
    #[test]
    fn test_board_size_matches_drawable_range() {
        assert_eq!(bingo_board::CELLS, usize::from(bingo_protocol::BOARD_CELLS));
    }
}
