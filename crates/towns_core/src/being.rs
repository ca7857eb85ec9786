//! # Being Types
//!
//! Identity and placement of the movable objects the server synchronizes.

use std::fmt;

/// Server-assigned identifier of a being (player character or NPC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BeingId(pub u32);

impl fmt::Display for BeingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "being#{}", self.0)
    }
}

/// Position on the current map, in map coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
}

impl Position {
    /// Creates a new position.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The map origin.
    pub const ORIGIN: Self = Self::new(0, 0);
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Facing direction of a being.
///
/// Encoded on the wire as a single bit flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Direction {
    /// Facing the viewer.
    #[default]
    Down = 1,
    /// Facing left.
    Left = 2,
    /// Facing away from the viewer.
    Up = 4,
    /// Facing right.
    Right = 8,
}

impl Direction {
    /// Decodes a wire byte. Returns `None` for bytes that are not a
    /// single known direction flag.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Down),
            2 => Some(Self::Left),
            4 => Some(Self::Up),
            8 => Some(Self::Right),
            _ => None,
        }
    }

    /// Returns the wire byte.
    #[inline]
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Visual attributes chosen at character creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Appearance {
    /// Gender byte (0 = male, 1 = female).
    pub gender: u8,
    /// Hair style index.
    pub hair_style: u8,
    /// Hair color index.
    pub hair_color: u8,
}

/// Identity attributes of a being, as sent by the game server.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct BeingInfo {
    /// Display name.
    pub name: String,
    /// Visual attributes.
    pub appearance: Appearance,
    /// Character level.
    pub level: u8,
    /// Permission bits (GM, admin, ...).
    pub rights: u8,
}

impl BeingInfo {
    /// Creates info with only a name set.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A character record from the account server's character list.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct CharacterInfo {
    /// Database identifier of the character.
    pub id: u32,
    /// Slot index on the account.
    pub slot: u8,
    /// Character name.
    pub name: String,
    /// Visual attributes.
    pub appearance: Appearance,
    /// Character level.
    pub level: u8,
    /// Permission bits.
    pub rights: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_bytes() {
        for dir in [Direction::Down, Direction::Left, Direction::Up, Direction::Right] {
            assert_eq!(Direction::from_byte(dir.as_byte()), Some(dir));
        }
        assert_eq!(Direction::from_byte(0), None);
        assert_eq!(Direction::from_byte(3), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(BeingId(7).to_string(), "being#7");
        assert_eq!(Position::new(-1, 2).to_string(), "(-1, 2)");
    }
}
