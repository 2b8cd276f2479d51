//! Real-time room session engine for multiplayer bingo.
//!
//! Pulls the stack together: the [`BingoServer`] accepts WebSocket
//! connections, the gateway routes each socket's messages to a per-room
//! actor, and the actors own all game state.
//!
//! - `bingo-protocol` — wire types and the JSON codec
//! - `bingo-transport` — WebSocket listener and connection traits
//! - `bingo-room` — room actors, turn order, claim arbitration
//! - `bingo-board` — deterministic client-side board generation
//!
//! # Quick Start
//!
//! ```no_run
//! #[tokio::main]
//! async fn main() -> Result<(), bingo::BingoError> {
//!     let server = bingo::BingoServer::builder()
//!         .bind("0.0.0.0:8000")
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```
//!
//! Clients connect to `ws://host:port/ws/{CODE}` and must send a `join`
//! before anything else. Joining an unknown code creates the room.

mod error;
mod gateway;
mod server;

pub use error::BingoError;
pub use server::{BingoServer, BingoServerBuilder, ServerHandle};

/// Commonly used types, re-exported for one-line imports.
pub mod prelude {
    pub use bingo_protocol::{
        ClientMessage, InvalidMoveReason, Phase, PlayerName, RoomCode, RoomSnapshot, ServerMessage,
    };
    pub use bingo_room::{RoomError, RoomRegistry};

    pub use crate::{BingoError, BingoServer, BingoServerBuilder, ServerHandle};
}
