//! The per-room state machine.
//!
//! [`RoomSession`] is pure and synchronous: every operation mutates local
//! state and returns the messages to deliver, as `(Recipient, ServerMessage)`
//! pairs in emission order. All I/O, fan-out, and concurrency live in the
//! room actor ([`crate::room`]); this keeps the game rules deterministic and
//! directly unit-testable.

use std::collections::BTreeSet;

use bingo_protocol::{
    BOARD_CELLS, InvalidMoveReason, Phase, PlayerName, Recipient, RoomCode, RoomSnapshot,
    ServerMessage,
};

use crate::TurnOrder;

/// Messages produced by one state-machine operation, in emission order.
pub type Outbound = Vec<(Recipient, ServerMessage)>;

/// Authoritative state of one room.
///
/// Invariants maintained across operations:
/// - `numbers_drawn ⊆ 1..=25`, grow-only until reset
/// - `players` and the turn order hold the same names, in join order
/// - phase moves `waiting → active → finished`, plus `reset` back to the
///   join-policy phase; the room is `active` iff the turn order is
///   non-empty and no outcome is latched
/// - `winners` is non-empty iff phase is `finished` (observed between
///   operations; a claim window fills `winners` just before the latch)
#[derive(Debug)]
pub struct RoomSession {
    code: RoomCode,
    phase: Phase,
    players: Vec<PlayerName>,
    numbers_drawn: BTreeSet<u8>,
    turns: TurnOrder,
    winner: Option<PlayerName>,
    winners: Vec<PlayerName>,
    round: u64,
}

impl RoomSession {
    /// Creates an empty room in phase `waiting`, round 1.
    pub fn new(code: RoomCode) -> Self {
        Self {
            code,
            phase: Phase::Waiting,
            players: Vec::new(),
            numbers_drawn: BTreeSet::new(),
            turns: TurnOrder::new(),
            winner: None,
            winners: Vec::new(),
            round: 1,
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn players(&self) -> &[PlayerName] {
        &self.players
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn current_player(&self) -> Option<PlayerName> {
        self.turns.current().cloned()
    }

    /// Adds `name` on first sighting this round; a rejoin of a known name
    /// leaves membership untouched (connection re-association is the
    /// actor's concern). Broadcasts `player_joined` either way so every
    /// client sees the refreshed roster.
    pub fn join(&mut self, name: &PlayerName) -> Outbound {
        let first_seen = !self.players.contains(name);
        if first_seen {
            self.players.push(name.clone());
            self.turns.push_unique(name);
            self.refresh_phase();
        }
        tracing::info!(
            room = %self.code,
            player = %name,
            players = self.players.len(),
            rejoin = !first_seen,
            "player joined"
        );

        vec![(
            Recipient::All,
            ServerMessage::PlayerJoined {
                player: name.clone(),
                players: self.players.clone(),
                turn_order: self.turns.order().to_vec(),
                current_player: self.current_player(),
                phase: self.phase,
            },
        )]
    }

    /// Removes `name` from the roster and turn order, preserving the
    /// logical successor of the turn cursor. No-op for unknown names.
    pub fn leave(&mut self, name: &PlayerName) -> Outbound {
        if !self.turns.remove(name) {
            return Vec::new();
        }
        self.players.retain(|n| n != name);
        tracing::info!(
            room = %self.code,
            player = %name,
            players = self.players.len(),
            "player left"
        );

        vec![(
            Recipient::All,
            ServerMessage::PlayerLeft {
                player: name.clone(),
                players: self.players.clone(),
                turn_order: self.turns.order().to_vec(),
                current_player: self.current_player(),
                phase: self.phase,
            },
        )]
    }

    /// Draws `number` for `name`.
    ///
    /// Rejections go only to the sender and mutate nothing:
    /// `not_your_turn` unless the room is active and `name` is current,
    /// `already_drawn` for duplicates. On success the draw is broadcast
    /// and the turn advances exactly once.
    pub fn mark_number(&mut self, name: &PlayerName, number: u8) -> Outbound {
        if number == 0 || number > BOARD_CELLS {
            // Schema violation, same policy as a malformed frame: drop.
            tracing::debug!(room = %self.code, player = %name, number, "out-of-range mark dropped");
            return Vec::new();
        }
        if !self.phase.is_active() || self.turns.current() != Some(name) {
            return self.rejection(name, InvalidMoveReason::NotYourTurn);
        }
        if self.numbers_drawn.contains(&number) {
            return self.rejection(name, InvalidMoveReason::AlreadyDrawn);
        }

        self.numbers_drawn.insert(number);
        let marked = (
            Recipient::All,
            ServerMessage::MarkNumber {
                number,
                marked_by: name.clone(),
            },
        );
        self.turns.advance();
        let next = (
            Recipient::All,
            ServerMessage::NextTurn {
                current_player: self.current_player(),
                turn_order: self.turns.order().to_vec(),
            },
        );
        tracing::debug!(room = %self.code, player = %name, number, "number marked");
        vec![marked, next]
    }

    /// Accepts a winner claim into the current claim window.
    ///
    /// Returns whether the claim was accepted. Claims are ignored once an
    /// outcome is latched (`finished`) and deduplicated per claimant; the
    /// server never verifies line completion — that trust boundary is part
    /// of the protocol.
    pub fn claim(&mut self, name: &PlayerName) -> bool {
        if self.phase.is_finished() || !self.players.contains(name) {
            tracing::debug!(room = %self.code, player = %name, "claim ignored");
            return false;
        }
        if !self.winners.contains(name) {
            self.winners.push(name.clone());
        }
        true
    }

    /// Latches the outcome of the open claim window and broadcasts it.
    ///
    /// One distinct claimant wins outright; two or more make a draw
    /// (`winner` null, `winners` all of them). Empty window or an already
    /// latched outcome produce nothing.
    pub fn latch_outcome(&mut self) -> Outbound {
        if self.winners.is_empty() || self.phase.is_finished() {
            return Vec::new();
        }
        let draw = self.winners.len() > 1;
        self.winner = if draw {
            None
        } else {
            Some(self.winners[0].clone())
        };
        self.phase = Phase::Finished;
        tracing::info!(
            room = %self.code,
            winners = ?self.winners,
            draw,
            "outcome latched"
        );

        vec![(
            Recipient::All,
            ServerMessage::Winner {
                winner: self.winner.clone(),
                winners: self.winners.clone(),
                draw,
                phase: self.phase,
            },
        )]
    }

    /// Starts a fresh round: clears draws and outcome, bumps the round
    /// counter, rewinds the turn cursor, and re-derives the phase from the
    /// join policy (active while players remain).
    pub fn reset(&mut self) -> Outbound {
        self.numbers_drawn.clear();
        self.winner = None;
        self.winners.clear();
        self.round += 1;
        self.turns.rewind();
        self.phase = Phase::Waiting;
        self.refresh_phase();
        tracing::info!(room = %self.code, round = self.round, "room reset");

        vec![(
            Recipient::All,
            ServerMessage::Reset {
                turn_order: self.turns.order().to_vec(),
                current_player: self.current_player(),
                phase: self.phase,
            },
        )]
    }

    /// Full state for a (re)joining client.
    pub fn state_message(&self) -> ServerMessage {
        ServerMessage::State {
            players: self.players.clone(),
            numbers_drawn: self.numbers_drawn.iter().copied().collect(),
            winner: self.winner.clone(),
            winners: self.winners.clone(),
            turn_order: self.turns.order().to_vec(),
            current_player: self.current_player(),
            phase: self.phase,
            round: self.round,
        }
    }

    /// Summary for the external state-fetch interface.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.code.clone(),
            players: self.players.clone(),
            numbers_drawn: self.numbers_drawn.iter().copied().collect(),
            winner: self.winner.clone(),
            winners: self.winners.clone(),
        }
    }

    /// Single point for the join/start policy: the room is active as soon
    /// as the turn order is non-empty. A latched outcome is never undone
    /// here; only `reset` leaves `finished`.
    fn refresh_phase(&mut self) {
        if self.phase.is_finished() {
            return;
        }
        self.phase = if self.turns.is_empty() {
            Phase::Waiting
        } else {
            Phase::Active
        };
    }

    fn rejection(&self, name: &PlayerName, reason: InvalidMoveReason) -> Outbound {
        tracing::debug!(room = %self.code, player = %name, %reason, "invalid move");
        vec![(
            Recipient::Player(name.clone()),
            ServerMessage::InvalidMove {
                reason,
                current_player: self.current_player(),
            },
        )]
    }
}
