//! # Small Towns Core
//!
//! Game-domain value types shared between the network layer and the
//! collaborators it drives (game states, interface, being registry).
//!
//! ## Contents
//!
//! - **Beings**: identifiers, tile positions, facing directions, appearance
//! - **Characters**: the account server's per-slot character records
//! - **Registry**: [`BeingManager`], the in-memory set of beings the client
//!   currently tracks
//!
//! ## Example
//!
//! ```rust
//! use towns_core::{BeingId, BeingInfo, BeingManager, Position};
//!
//! let mut beings = BeingManager::new();
//! beings.upsert(BeingId(42), BeingInfo::named("Ferris"), Some(Position::new(3, 4)));
//! assert_eq!(beings.get(BeingId(42)).map(|b| b.position), Some(Position::new(3, 4)));
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod being;
pub mod registry;

pub use being::{Appearance, BeingId, BeingInfo, CharacterInfo, Direction, Position};
pub use registry::{Being, BeingManager};
