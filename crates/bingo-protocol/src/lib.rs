//! Wire protocol for the bingo server.
//!
//! This crate defines the "language" clients and server speak:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`RoomCode`], …) —
//!   the JSON message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong doing so.
//!
//! The protocol layer sits between transport (raw frames) and the room
//! layer (game state). It knows nothing about connections or rooms — only
//! how messages are shaped.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    BOARD_CELLS, ClientMessage, InvalidMoveReason, Phase, PlayerName, ROOM_CODE_LEN, Recipient,
    RoomCode, RoomSnapshot, ServerMessage,
};
