//! # Being Registry
//!
//! The client's local view of which beings exist on the current map.

use std::collections::HashMap;

use crate::being::{BeingId, BeingInfo, Direction, Position};

/// A being tracked by the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Being {
    /// Server identifier.
    pub id: BeingId,
    /// Identity attributes.
    pub info: BeingInfo,
    /// Last known position.
    pub position: Position,
    /// Last known facing direction.
    pub direction: Direction,
}

/// In-memory registry of beings plus the local player's position.
#[derive(Debug, Default)]
pub struct BeingManager {
    beings: HashMap<BeingId, Being>,
    local_position: Option<Position>,
}

impl BeingManager {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the id is tracked.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: BeingId) -> bool {
        self.beings.contains_key(&id)
    }

    /// Gets a being by id.
    #[must_use]
    pub fn get(&self, id: BeingId) -> Option<&Being> {
        self.beings.get(&id)
    }

    /// Number of tracked beings.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.beings.len()
    }

    /// Returns true if no beings are tracked.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.beings.is_empty()
    }

    /// Iterates over all tracked beings in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Being> {
        self.beings.values()
    }

    /// Inserts a being or replaces its identity.
    ///
    /// `position` of `None` keeps the current position of a known being and
    /// places a new one at the origin.
    pub fn upsert(&mut self, id: BeingId, info: BeingInfo, position: Option<Position>) {
        match self.beings.get_mut(&id) {
            Some(being) => {
                being.info = info;
                if let Some(position) = position {
                    being.position = position;
                }
            }
            None => {
                tracing::debug!("Tracking {} ({})", id, info.name);
                self.beings.insert(
                    id,
                    Being {
                        id,
                        info,
                        position: position.unwrap_or(Position::ORIGIN),
                        direction: Direction::default(),
                    },
                );
            }
        }
    }

    /// Moves a known being. Returns false if the id is not tracked.
    pub fn move_to(&mut self, id: BeingId, position: Position, direction: Direction) -> bool {
        match self.beings.get_mut(&id) {
            Some(being) => {
                being.position = position;
                being.direction = direction;
                true
            }
            None => false,
        }
    }

    /// Stops tracking a being, returning it if it was known.
    pub fn remove(&mut self, id: BeingId) -> Option<Being> {
        let removed = self.beings.remove(&id);
        if removed.is_some() {
            tracing::debug!("Untracked {}", id);
        }
        removed
    }

    /// Removes every being (map change).
    pub fn clear(&mut self) {
        self.beings.clear();
    }

    /// Sets the local player's position.
    pub fn set_local_position(&mut self, position: Position) {
        self.local_position = Some(position);
    }

    /// Returns the local player's position, if the server has sent one.
    #[must_use]
    pub const fn local_position(&self) -> Option<Position> {
        self.local_position
    }
}
