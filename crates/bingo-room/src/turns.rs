//! Round-robin turn order with successor-preserving removal.

use bingo_protocol::PlayerName;

/// The ordered sequence of players and the cursor into it.
///
/// The order only ever grows by appending a name the first time it is seen
/// in the current round; it never reorders. The cursor is `Some` exactly
/// when the order is non-empty.
#[derive(Debug, Clone, Default)]
pub struct TurnOrder {
    order: Vec<PlayerName>,
    index: Option<usize>,
}

impl TurnOrder {
    /// Creates an empty turn order.
    pub fn new() -> Self {
        Self::default()
    }

    /// The full order, join order preserved.
    pub fn order(&self) -> &[PlayerName] {
        &self.order
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The player whose turn it is, or `None` if the order is empty.
    pub fn current(&self) -> Option<&PlayerName> {
        self.index.map(|i| &self.order[i])
    }

    /// Appends `name` if it is not already present. Returns whether the
    /// order changed. The first appended player becomes current.
    pub fn push_unique(&mut self, name: &PlayerName) -> bool {
        if self.order.contains(name) {
            return false;
        }
        self.order.push(name.clone());
        if self.index.is_none() {
            self.index = Some(0);
        }
        true
    }

    /// Moves the cursor to the next player, wrapping around.
    ///
    /// Called exactly once per accepted mark; never on a rejected one.
    pub fn advance(&mut self) {
        if let Some(i) = self.index {
            self.index = Some((i + 1) % self.order.len());
        }
    }

    /// Removes `name`, keeping the cursor on the same logical successor:
    /// a removal before the cursor shifts it back by one; removing the
    /// current player leaves the cursor in place (it now points at the
    /// successor), wrapping to the front when the current player was last.
    ///
    /// Returns whether the name was present.
    pub fn remove(&mut self, name: &PlayerName) -> bool {
        let Some(pos) = self.order.iter().position(|n| n == name) else {
            return false;
        };
        self.order.remove(pos);

        self.index = match self.index {
            _ if self.order.is_empty() => None,
            Some(i) if pos < i => Some(i - 1),
            Some(i) if i >= self.order.len() => Some(0),
            other => other,
        };
        true
    }

    /// Resets the cursor to the first player (round reset).
    pub fn rewind(&mut self) {
        self.index = if self.order.is_empty() { None } else { Some(0) };
    }
}
