//! Room actor: an isolated Tokio task that owns one room's state.
//!
//! Each room runs in its own task and talks to the outside world through
//! an mpsc channel, so all mutations of one room are linearized without
//! locks. Rooms share nothing with each other.

use std::collections::HashMap;

use bingo_protocol::{PlayerName, Recipient, RoomCode, RoomSnapshot, ServerMessage};
use bingo_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::{RoomError, RoomSession};

/// Channel sender delivering outbound messages to one player's connection.
///
/// Unbounded: the room actor never blocks on a slow client, and rooms are
/// small and turn-paced so the queue stays shallow. A dead receiver is
/// dropped silently.
pub type ConnectionSender = mpsc::UnboundedSender<ServerMessage>;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// Attach (or re-associate) a player's connection and join the room.
    Join {
        name: PlayerName,
        conn: ConnectionId,
        sender: ConnectionSender,
        reply: oneshot::Sender<()>,
    },

    /// Detach a connection. Replies with whether the room is now empty.
    Leave {
        name: PlayerName,
        conn: ConnectionId,
        reply: oneshot::Sender<bool>,
    },

    /// Draw a number for a player.
    Mark { name: PlayerName, number: u8 },

    /// A winner claim. Contiguous queued claims form one claim window.
    Claim { name: PlayerName },

    /// Start a fresh round.
    Reset { name: PlayerName },

    /// Request the state-fetch summary.
    Snapshot { reply: oneshot::Sender<RoomSnapshot> },

    /// Shut down the room.
    Shutdown,
}

/// Handle to a running room actor. Cheap to clone; the registry holds one
/// per room.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room's code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Joins `name` with its outbound channel, re-associating any previous
    /// connection under that name. Resolves once the room has processed
    /// the join (the joiner's `state` snapshot is already queued).
    pub async fn join(
        &self,
        name: PlayerName,
        conn: ConnectionId,
        sender: ConnectionSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            name,
            conn,
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Detaches a connection. Returns whether the room is now empty — the
    /// caller is responsible for removing an emptied room from the
    /// registry immediately.
    pub async fn leave(&self, name: PlayerName, conn: ConnectionId) -> Result<bool, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Leave {
            name,
            conn,
            reply: reply_tx,
        })
        .await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Draws a number (fire-and-forget; results arrive as broadcasts).
    pub async fn mark_number(&self, name: PlayerName, number: u8) -> Result<(), RoomError> {
        self.send(RoomCommand::Mark { name, number }).await
    }

    /// Submits a winner claim (fire-and-forget).
    pub async fn claim_winner(&self, name: PlayerName) -> Result<(), RoomError> {
        self.send(RoomCommand::Claim { name }).await
    }

    /// Triggers a round reset (fire-and-forget).
    pub async fn reset(&self, name: PlayerName) -> Result<(), RoomError> {
        self.send(RoomCommand::Reset { name }).await
    }

    /// Fetches the room's state summary.
    pub async fn snapshot(&self) -> Result<RoomSnapshot, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Snapshot { reply: reply_tx }).await?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Tells the room actor to stop.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }
}

enum Flow {
    Continue,
    Stop,
}

/// The internal room actor. Runs inside a Tokio task.
struct RoomActor {
    session: RoomSession,
    /// Live connections: at most one per player name. The `ConnectionId`
    /// lets a close of a superseded socket be told apart from a close of
    /// the player's current one.
    connections: HashMap<PlayerName, (ConnectionId, ConnectionSender)>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room = %self.session.code(), "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            if let Flow::Stop = self.apply(cmd) {
                break;
            }
        }

        tracing::info!(room = %self.session.code(), "room actor stopped");
    }

    fn apply(&mut self, cmd: RoomCommand) -> Flow {
        match cmd {
            RoomCommand::Join {
                name,
                conn,
                sender,
                reply,
            } => {
                self.handle_join(name, conn, sender);
                let _ = reply.send(());
            }
            RoomCommand::Leave { name, conn, reply } => {
                let empty = self.handle_leave(&name, conn);
                let _ = reply.send(empty);
            }
            RoomCommand::Mark { name, number } => {
                let out = self.session.mark_number(&name, number);
                self.dispatch(out);
            }
            RoomCommand::Claim { name } => return self.claim_window(name),
            RoomCommand::Reset { name } => {
                tracing::debug!(room = %self.session.code(), player = %name, "reset requested");
                let out = self.session.reset();
                self.dispatch(out);
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.session.snapshot());
            }
            RoomCommand::Shutdown => {
                tracing::info!(room = %self.session.code(), "room shutting down");
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    fn handle_join(&mut self, name: PlayerName, conn: ConnectionId, sender: ConnectionSender) {
        // Re-association: the same player resumes on a new socket; the old
        // mapping is retired, never duplicated.
        if let Some((old, _)) = self.connections.insert(name.clone(), (conn, sender)) {
            tracing::debug!(
                room = %self.session.code(),
                player = %name,
                old_conn = %old,
                new_conn = %conn,
                "connection re-associated"
            );
        }

        // The joiner gets the full snapshot first, then everyone (joiner
        // included) sees the roster broadcast.
        let state = self.session.state_message();
        self.send_to(&name, state);
        let out = self.session.join(&name);
        self.dispatch(out);
    }

    fn handle_leave(&mut self, name: &PlayerName, conn: ConnectionId) -> bool {
        match self.connections.get(name) {
            Some((current, _)) if *current == conn => {
                self.connections.remove(name);
                let out = self.session.leave(name);
                self.dispatch(out);
            }
            _ => {
                // A superseded socket closing must not kick the player who
                // already resumed on a new connection.
                tracing::debug!(
                    room = %self.session.code(),
                    player = %name,
                    %conn,
                    "stale leave ignored"
                );
            }
        }
        self.session.is_empty()
    }

    /// Processes one claim window: the triggering claim plus every claim
    /// already sitting in the mailbox, up to the first non-claim command.
    /// That contiguity is the structural definition of "simultaneous" —
    /// claims the room had no chance to order against each other resolve
    /// as a draw.
    fn claim_window(&mut self, first: PlayerName) -> Flow {
        let mut accepted = self.session.claim(&first);
        let mut follow_up = None;

        loop {
            match self.receiver.try_recv() {
                Ok(RoomCommand::Claim { name }) => {
                    accepted |= self.session.claim(&name);
                }
                Ok(other) => {
                    follow_up = Some(other);
                    break;
                }
                Err(_) => break,
            }
        }

        if accepted {
            let out = self.session.latch_outcome();
            self.dispatch(out);
        }

        match follow_up {
            // The dequeued command ran after the latch, preserving its
            // queue position relative to the winner broadcast.
            Some(cmd) => self.apply(cmd),
            None => Flow::Continue,
        }
    }

    /// Delivers outbound messages in emission order.
    fn dispatch(&self, msgs: Vec<(Recipient, ServerMessage)>) {
        for (recipient, msg) in msgs {
            match recipient {
                Recipient::All => {
                    for (name, _) in self.connections.iter() {
                        self.send_to(name, msg.clone());
                    }
                }
                Recipient::Player(name) => self.send_to(&name, msg),
            }
        }
    }

    /// Sends to a single player; silently drops if the receiver is gone.
    fn send_to(&self, name: &PlayerName, msg: ServerMessage) {
        if let Some((_, sender)) = self.connections.get(name) {
            let _ = sender.send(msg);
        }
    }
}

/// Spawns a new room actor task and returns a handle to it.
///
/// `channel_size` bounds the command mailbox; senders wait when it fills.
pub(crate) fn spawn_room(code: RoomCode, channel_size: usize) -> RoomHandle {
    let (tx, rx) = mpsc::channel(channel_size);

    let actor = RoomActor {
        session: RoomSession::new(code.clone()),
        connections: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
