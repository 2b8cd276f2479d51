//! Core protocol types for the bingo wire format.
//!
//! Every message travels as flat JSON with a `type` field selecting the
//! variant, e.g. `{"type": "mark_number", "number": 7}`. Client and server
//! vocabularies overlap in names (`mark_number`, `winner`, `reset`,
//! `heartbeat`) but carry different payloads per direction, so they are
//! separate enums.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Number of cells on a board, and the upper bound of drawable numbers.
///
/// Mirrors `CELLS` in `bingo-board`; the two must agree for locally
/// generated boards to cover the drawable range.
pub const BOARD_CELLS: u8 = 25;

/// Length of a room code.
pub const ROOM_CODE_LEN: usize = 5;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A 5-character uppercase alphanumeric room code, e.g. `AB123`.
///
/// Newtype over `String` so a code can't be confused with a player name,
/// and so every code in the system is known-valid. Serializes as the bare
/// string; deserialization re-validates via `TryFrom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomCode(String);

impl RoomCode {
    /// Validates and wraps a raw code.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let valid = raw.len() == ROOM_CODE_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(ProtocolError::InvalidRoomCode(raw.to_string()))
        }
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomCode {
    type Error = ProtocolError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<RoomCode> for String {
    fn from(code: RoomCode) -> String {
        code.0
    }
}

impl std::str::FromStr for RoomCode {
    type Err = ProtocolError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A player's display name, which doubles as their identity within a room.
///
/// There is no account system: the name IS the player. Rejoining with the
/// same name resumes the same seat. Must be non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerName(String);

impl PlayerName {
    /// Validates and wraps a raw name.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        if raw.trim().is_empty() {
            Err(ProtocolError::EmptyPlayerName)
        } else {
            Ok(Self(raw.to_string()))
        }
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PlayerName {
    type Error = ProtocolError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

impl From<PlayerName> for String {
    fn from(name: PlayerName) -> String {
        name.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Lifecycle phase of a room.
///
/// ```text
/// waiting ──(first join)──→ active ──(winner latched)──→ finished
///    ↑                         │                             │
///    └──────────(reset)────────┴─────────(reset)─────────────┘
/// ```
///
/// A reset from any phase returns to `waiting` when the room is empty, or
/// straight to `active` when players remain (the turn order is non-empty).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Waiting,
    Active,
    Finished,
}

impl Phase {
    /// Returns `true` if turn-based play is being enforced.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns `true` if a winner (or draw) has been latched.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Active => write!(f, "active"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive a message?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server message.
///
/// Room operations return `(Recipient, ServerMessage)` pairs; this enum
/// tells the fan-out layer where to deliver each one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every player currently connected to the room.
    All,

    /// One specific player (e.g. `invalid_move` goes only to the offender).
    Player(PlayerName),
}

// ---------------------------------------------------------------------------
// Client → server messages
// ---------------------------------------------------------------------------

/// Why a `mark_number` was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidMoveReason {
    /// Sender is not the current player, or the room is not active.
    NotYourTurn,
    /// The number was already drawn this round.
    AlreadyDrawn,
}

impl fmt::Display for InvalidMoveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotYourTurn => write!(f, "not_your_turn"),
            Self::AlreadyDrawn => write!(f, "already_drawn"),
        }
    }
}

/// Messages a client may send.
///
/// Until a `join` succeeds the connection is unauthenticated and every
/// other variant is dropped by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Attach this connection to the room under `name`.
    Join { name: PlayerName },

    /// Draw a number (1..=25). Only valid for the current player.
    MarkNumber { number: u8 },

    /// Claim a completed line. The server does not verify the claim —
    /// a deliberate trust boundary in the protocol.
    Winner,

    /// Start a fresh round.
    Reset,

    /// Keep-alive; answered with `heartbeat_ack`.
    Heartbeat,
}

// ---------------------------------------------------------------------------
// Server → client messages
// ---------------------------------------------------------------------------

/// Messages the server emits, either to the whole room or to one sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full state snapshot, sent to a player right after their join.
    /// A reconnecting client rebuilds its board locally from this plus
    /// the deterministic board generator.
    State {
        players: Vec<PlayerName>,
        numbers_drawn: Vec<u8>,
        winner: Option<PlayerName>,
        winners: Vec<PlayerName>,
        turn_order: Vec<PlayerName>,
        current_player: Option<PlayerName>,
        phase: Phase,
        round: u64,
    },

    /// Broadcast after a player joins (or re-associates).
    PlayerJoined {
        player: PlayerName,
        players: Vec<PlayerName>,
        turn_order: Vec<PlayerName>,
        current_player: Option<PlayerName>,
        phase: Phase,
    },

    /// Broadcast after a player's last connection is gone.
    PlayerLeft {
        player: PlayerName,
        players: Vec<PlayerName>,
        turn_order: Vec<PlayerName>,
        current_player: Option<PlayerName>,
        phase: Phase,
    },

    /// Broadcast for an accepted draw.
    MarkNumber { number: u8, marked_by: PlayerName },

    /// Broadcast after the turn advances.
    NextTurn {
        current_player: Option<PlayerName>,
        turn_order: Vec<PlayerName>,
    },

    /// Sent only to the offending sender; no state was mutated.
    InvalidMove {
        reason: InvalidMoveReason,
        current_player: Option<PlayerName>,
    },

    /// Broadcast once the win/draw outcome is latched.
    Winner {
        winner: Option<PlayerName>,
        winners: Vec<PlayerName>,
        draw: bool,
        phase: Phase,
    },

    /// Broadcast after a round reset.
    Reset {
        turn_order: Vec<PlayerName>,
        current_player: Option<PlayerName>,
        phase: Phase,
    },

    /// Reply to a client `heartbeat`.
    HeartbeatAck,
}

// ---------------------------------------------------------------------------
// State fetch
// ---------------------------------------------------------------------------

/// Room summary returned by the state-fetch interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSnapshot {
    pub room_id: RoomCode,
    pub players: Vec<PlayerName>,
    pub numbers_drawn: Vec<u8>,
    pub winner: Option<PlayerName>,
    pub winners: Vec<PlayerName>,
}

// =========================================================================
// Tests
// =========================================================================
