//! Error types for the room layer.

use bingo_protocol::RoomCode;

/// Errors that can occur during room operations.
///
/// Note that an invalid move is NOT an error here — it is a protocol
/// message (`invalid_move`) delivered to the offending sender, with no
/// state mutation. Errors in this enum are infrastructure failures.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room is registered under this code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The room's command channel is closed or full — the actor is gone
    /// or shutting down.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}
