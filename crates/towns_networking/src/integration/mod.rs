//! # Integration Layer
//!
//! Seams between the protocol layer and the rest of the client.

pub mod traits;

pub use traits::{
    BeingCall, BeingRegistry, ClientState, GameStates, MockBeingRegistry, MockGameStates,
    MockUserInterface, PasswordHasher, UserInterface,
};
