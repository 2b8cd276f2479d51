//! Per-connection gateway: the task that sits between one socket and the
//! room actors.
//!
//! Each accepted socket gets one task running [`handle_connection`]. The
//! task parses the room code out of the request path, waits for the
//! client's `join`, then pumps frames both ways until the socket closes.
//! Leave cleanup runs unconditionally on the way out, so an abrupt
//! disconnect and a clean close take the same path.

use std::sync::Arc;

use bingo_protocol::{ClientMessage, Codec, PlayerName, RoomCode, ServerMessage};
use bingo_room::{ConnectionSender, RoomHandle};
use bingo_transport::{Connection, TransportError};
use tokio::sync::mpsc;

use crate::BingoError;
use crate::server::ServerState;

/// Prefix the room code is parsed out of, e.g. `/ws/AB123`.
const WS_PATH_PREFIX: &str = "/ws/";

/// Drives one client connection from accept to close.
///
/// The `Error = TransportError` bound lets transport failures flow into
/// [`BingoError`] through `?`.
pub(crate) async fn handle_connection<C: Connection<Error = TransportError>>(
    conn: C,
    state: Arc<ServerState>,
) -> Result<(), BingoError> {
    let conn_id = conn.id();

    let Some(code) = room_code_from_path(conn.path()) else {
        tracing::debug!(%conn_id, path = conn.path(), "unroutable request path, closing");
        let _ = conn.close().await;
        return Ok(());
    };

    // The connection is anonymous until a join lands; everything else is
    // dropped until then.
    let Some((room, name, mut outbound)) = await_join(&conn, &state, &code).await? else {
        return Ok(());
    };

    tracing::info!(%conn_id, room = %code, player = %name, "player connected");

    let result = pump(&conn, &state, &room, &name, &mut outbound).await;

    // Leave runs whether the pump ended cleanly or not. A stale close of a
    // superseded socket is ignored inside the room.
    match room.leave(name.clone(), conn_id).await {
        Ok(true) => remove_if_empty(&state, &code).await,
        Ok(false) => {}
        Err(err) => {
            // Room already gone; nothing left to clean up.
            tracing::debug!(%conn_id, room = %code, %err, "leave on departed room");
        }
    }

    tracing::info!(%conn_id, room = %code, player = %name, "player disconnected");
    result
}

/// Extracts the room code from a `/ws/{CODE}` request path.
fn room_code_from_path(path: &str) -> Option<RoomCode> {
    let raw = path.strip_prefix(WS_PATH_PREFIX)?;
    RoomCode::parse(raw).ok()
}

/// Destroys `code` unless a join has repopulated it since the emptiness
/// report. The report from `leave` is stale by the time the registry lock
/// is held, so the roster is re-checked under the lock — `get_or_create`
/// serializes behind the same mutex, so a landed join cannot be undone.
async fn remove_if_empty(state: &ServerState, code: &RoomCode) {
    let mut registry = state.registry.lock().await;
    let Ok(room) = registry.get(code) else {
        return;
    };
    let repopulated = matches!(room.snapshot().await, Ok(snap) if !snap.players.is_empty());
    if !repopulated {
        let _ = registry.remove(code).await;
    }
}

/// Reads frames until a valid `join` arrives, then attaches the connection
/// to its room. Returns `None` if the socket closed first.
///
/// A join to an unknown code creates the room on the spot.
async fn await_join<C: Connection<Error = TransportError>>(
    conn: &C,
    state: &ServerState,
    code: &RoomCode,
) -> Result<Option<(RoomHandle, PlayerName, mpsc::UnboundedReceiver<ServerMessage>)>, BingoError> {
    loop {
        let Some(data) = recv_frame(conn).await? else {
            return Ok(None);
        };

        match state.codec.decode::<ClientMessage>(&data) {
            Ok(ClientMessage::Join { name }) => {
                let room = {
                    let mut registry = state.registry.lock().await;
                    registry.get_or_create(code)
                };

                let (tx, rx): (ConnectionSender, _) = mpsc::unbounded_channel();
                room.join(name.clone(), conn.id(), tx).await?;
                return Ok(Some((room, name, rx)));
            }
            Ok(other) => {
                tracing::debug!(conn = %conn.id(), ?other, "message before join dropped");
            }
            Err(err) => {
                tracing::debug!(conn = %conn.id(), %err, "malformed frame dropped");
            }
        }
    }
}

/// The steady-state loop: shuttles inbound frames to the room and outbound
/// room messages to the socket, whichever is ready first.
async fn pump<C: Connection<Error = TransportError>>(
    conn: &C,
    state: &ServerState,
    room: &RoomHandle,
    name: &PlayerName,
    outbound: &mut mpsc::UnboundedReceiver<ServerMessage>,
) -> Result<(), BingoError> {
    loop {
        tokio::select! {
            inbound = recv_frame(conn) => match inbound? {
                Some(data) => dispatch(conn, state, room, name, &data).await?,
                // Clean close or peer error; either way the socket is done.
                None => return Ok(()),
            },
            msg = outbound.recv() => match msg {
                Some(msg) => {
                    let bytes = state.codec.encode(&msg)?;
                    conn.send(&bytes).await?;
                }
                // Room actor dropped our sender: the room was destroyed
                // underneath us (e.g. this connection was superseded and
                // the room later emptied).
                None => return Ok(()),
            },
        }
    }
}

/// Routes one decoded client message. Malformed frames are dropped without
/// a reply; well-formed game messages go to the room actor; heartbeats are
/// answered directly, bypassing the room.
async fn dispatch<C: Connection<Error = TransportError>>(
    conn: &C,
    state: &ServerState,
    room: &RoomHandle,
    name: &PlayerName,
    data: &[u8],
) -> Result<(), BingoError> {
    let msg = match state.codec.decode::<ClientMessage>(data) {
        Ok(msg) => msg,
        Err(err) => {
            tracing::debug!(conn = %conn.id(), %err, "malformed frame dropped");
            return Ok(());
        }
    };

    match msg {
        // The name on this socket is fixed at join time.
        ClientMessage::Join { name: again } => {
            tracing::debug!(conn = %conn.id(), player = %again, "repeat join ignored");
        }
        ClientMessage::MarkNumber { number } => {
            room.mark_number(name.clone(), number).await?;
        }
        ClientMessage::Winner => {
            room.claim_winner(name.clone()).await?;
        }
        ClientMessage::Reset => {
            room.reset(name.clone()).await?;
        }
        ClientMessage::Heartbeat => {
            let bytes = state.codec.encode(&ServerMessage::HeartbeatAck)?;
            conn.send(&bytes).await?;
        }
    }

    Ok(())
}

/// Receives one frame, folding transport errors into a close. A peer that
/// vanishes mid-read looks the same as one that closed politely.
async fn recv_frame<C: Connection<Error = TransportError>>(
    conn: &C,
) -> Result<Option<Vec<u8>>, BingoError> {
    match conn.recv().await {
        Ok(frame) => Ok(frame),
        Err(err) => {
            tracing::debug!(conn = %conn.id(), %err, "connection lost");
            Ok(None)
        }
    }
}
