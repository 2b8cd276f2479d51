//! Room layer for the bingo server.
//!
//! Each room runs as an isolated Tokio task (actor model) owning all of
//! its mutable state; the registry maps codes to room handles.
//!
//! # Key types
//!
//! - [`RoomSession`] — the pure per-room state machine
//! - [`TurnOrder`] — round-robin turn coordination
//! - [`RoomRegistry`] — creates/looks up/destroys rooms by code
//! - [`RoomHandle`] — send commands to a running room actor

mod error;
mod registry;
mod room;
mod session;
mod turns;

pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{ConnectionSender, RoomHandle};
pub use session::{Outbound, RoomSession};
pub use turns::TurnOrder;
