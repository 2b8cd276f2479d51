//! Room registry: the shared code→room table.
//!
//! The registry itself is not thread-safe — it is owned behind one
//! `tokio::sync::Mutex` at the server level, which serializes every
//! create/lookup/remove. Rooms stay independent: the registry only hands
//! out cheap `RoomHandle` clones, never room state.

use std::collections::HashMap;

use bingo_protocol::{ROOM_CODE_LEN, RoomCode};
use rand::Rng;

use crate::room::spawn_room;
use crate::{RoomError, RoomHandle};

/// Default command mailbox size for room actors.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Alphabet for generated room codes.
const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Tracks all live rooms by code.
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, RoomHandle>,
    channel_size: usize,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            channel_size: DEFAULT_CHANNEL_SIZE,
        }
    }

    /// Creates a new empty room under a freshly generated unique code.
    pub fn create(&mut self) -> RoomCode {
        let code = loop {
            let candidate = random_code();
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
            // Collision: 36^5 codes, so retries are rare even with many
            // live rooms.
        };
        let handle = spawn_room(code.clone(), self.channel_size);
        self.rooms.insert(code.clone(), handle);
        tracing::info!(room = %code, rooms = self.rooms.len(), "room created");
        code
    }

    /// Looks up a live room.
    pub fn get(&self, code: &RoomCode) -> Result<RoomHandle, RoomError> {
        self.rooms
            .get(code)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(code.clone()))
    }

    /// Looks up a room, creating it if the code is fresh. This is the
    /// join path: the first join to an unknown code brings the room into
    /// existence.
    pub fn get_or_create(&mut self, code: &RoomCode) -> RoomHandle {
        if let Some(handle) = self.rooms.get(code) {
            return handle.clone();
        }
        let handle = spawn_room(code.clone(), self.channel_size);
        self.rooms.insert(code.clone(), handle.clone());
        tracing::info!(room = %code, rooms = self.rooms.len(), "room created on join");
        handle
    }

    /// Removes a room and shuts its actor down. Invoked the moment a
    /// room's player set becomes empty — there is no grace period.
    pub async fn remove(&mut self, code: &RoomCode) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        let _ = handle.shutdown().await;
        tracing::info!(room = %code, rooms = self.rooms.len(), "room destroyed");
        Ok(())
    }

    /// Number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Codes of all live rooms.
    pub fn codes(&self) -> Vec<RoomCode> {
        self.rooms.keys().cloned().collect()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Generates a random 5-character uppercase alphanumeric code.
fn random_code() -> RoomCode {
    let mut rng = rand::rng();
    let raw: String = (0..ROOM_CODE_LEN)
        .map(|_| char::from(CODE_CHARSET[rng.random_range(0..CODE_CHARSET.len())]))
        .collect();
    RoomCode::parse(&raw).expect("generated code is always valid")
}
