//! # Integration Traits
//!
//! The collaborators the protocol layer delivers its effects to. The game
//! implements these; the network layer never reaches into rendering, widgets
//! or the map loader directly.
//!
//! ```text
//! NetworkManager            game implements:
//! ┌──────────────────┐      ┌────────────────────┐
//! │ dispatch(packet) │ ───> │ impl GameStates    │
//! │                  │ ───> │ impl UserInterface │
//! │                  │ ───> │ impl BeingRegistry │
//! └──────────────────┘      └────────────────────┘
//! ```

use std::collections::HashMap;

use towns_core::{BeingId, BeingInfo, BeingManager, CharacterInfo, Direction, Position};

/// Game states the protocol layer can request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClientState {
    /// Connecting to the account server.
    AccountConnect,
    /// Login form.
    Login,
    /// Character selection.
    CharSelect,
    /// Connecting to the game server after a handoff.
    GameConnect,
    /// In game.
    Game,
    /// Fatal error screen.
    Error,
}

// ============================================================================
// GAME STATE MACHINE
// ============================================================================

/// The game's state machine.
pub trait GameStates {
    /// Requests a switch to `state` at the end of the frame.
    fn request_state_change(&mut self, state: ClientState);

    /// Loads a map by identifier. An empty identifier names no map and
    /// fails.
    fn load_map(&mut self, map: &str) -> Result<(), String>;
}

// ============================================================================
// USER INTERFACE
// ============================================================================

/// User-facing reporting.
pub trait UserInterface {
    /// Shows an error message.
    fn report_error(&mut self, message: &str);

    /// Shows the account's characters.
    fn show_characters(&mut self, characters: &[CharacterInfo]);

    /// Shows a newly created character.
    fn show_character_created(&mut self, character: &CharacterInfo);

    /// Shows a chat line. `None` speaker means the server.
    fn show_chat(&mut self, speaker: Option<BeingId>, text: &str);
}

// ============================================================================
// BEING REGISTRY
// ============================================================================

/// Local tracking of the beings the game server reports.
pub trait BeingRegistry {
    /// Returns true if `id` is tracked.
    fn contains(&self, id: BeingId) -> bool;

    /// Creates or updates a being. `None` position keeps the current one.
    fn upsert_being(&mut self, id: BeingId, info: &BeingInfo, position: Option<Position>);

    /// Moves a tracked being.
    fn move_being(&mut self, id: BeingId, position: Position, direction: Direction);

    /// Stops tracking a being.
    fn remove_being(&mut self, id: BeingId);

    /// Places the local player.
    fn warp_local_player(&mut self, position: Position);
}

impl BeingRegistry for BeingManager {
    fn contains(&self, id: BeingId) -> bool {
        BeingManager::contains(self, id)
    }

    fn upsert_being(&mut self, id: BeingId, info: &BeingInfo, position: Option<Position>) {
        self.upsert(id, info.clone(), position);
    }

    fn move_being(&mut self, id: BeingId, position: Position, direction: Direction) {
        self.move_to(id, position, direction);
    }

    fn remove_being(&mut self, id: BeingId) {
        self.remove(id);
    }

    fn warp_local_player(&mut self, position: Position) {
        self.set_local_position(position);
    }
}

// ============================================================================
// PASSWORD HASHING
// ============================================================================

/// One-way transform applied before a password goes on the wire.
pub trait PasswordHasher {
    /// Hashes `password` for account `username`.
    fn hash(&self, username: &str, password: &str) -> String;
}

impl<F> PasswordHasher for F
where
    F: Fn(&str, &str) -> String,
{
    fn hash(&self, username: &str, password: &str) -> String {
        self(username, password)
    }
}

// ============================================================================
// MOCK IMPLEMENTATIONS (For Testing)
// ============================================================================

/// Recording implementation of [`GameStates`].
#[derive(Debug, Default)]
pub struct MockGameStates {
    /// Every requested state, oldest first.
    pub requested: Vec<ClientState>,
    /// Every map load, oldest first.
    pub loaded_maps: Vec<String>,
    /// Maps whose load fails.
    pub failing_maps: Vec<String>,
}

impl MockGameStates {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the latest requested state.
    #[must_use]
    pub fn last(&self) -> Option<ClientState> {
        self.requested.last().copied()
    }
}

impl GameStates for MockGameStates {
    fn request_state_change(&mut self, state: ClientState) {
        self.requested.push(state);
    }

    fn load_map(&mut self, map: &str) -> Result<(), String> {
        self.loaded_maps.push(map.to_string());
        if map.is_empty() {
            Err("no map name".to_string())
        } else if self.failing_maps.iter().any(|m| m == map) {
            Err(format!("{map}: missing tiles"))
        } else {
            Ok(())
        }
    }
}

/// Recording implementation of [`UserInterface`].
#[derive(Debug, Default)]
pub struct MockUserInterface {
    /// Reported errors, oldest first.
    pub errors: Vec<String>,
    /// Latest character list.
    pub characters: Vec<CharacterInfo>,
    /// Created characters, oldest first.
    pub created: Vec<CharacterInfo>,
    /// Chat lines, oldest first.
    pub chat: Vec<(Option<BeingId>, String)>,
}

impl MockUserInterface {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserInterface for MockUserInterface {
    fn report_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    fn show_characters(&mut self, characters: &[CharacterInfo]) {
        self.characters = characters.to_vec();
    }

    fn show_character_created(&mut self, character: &CharacterInfo) {
        self.created.push(character.clone());
    }

    fn show_chat(&mut self, speaker: Option<BeingId>, text: &str) {
        self.chat.push((speaker, text.to_string()));
    }
}

/// Call recorded by [`MockBeingRegistry`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BeingCall {
    /// `upsert_being`.
    Upsert(BeingId, String, Option<Position>),
    /// `move_being`.
    Move(BeingId, Position, Direction),
    /// `remove_being`.
    Remove(BeingId),
    /// `warp_local_player`.
    Warp(Position),
}

/// Recording implementation of [`BeingRegistry`].
#[derive(Debug, Default)]
pub struct MockBeingRegistry {
    /// Tracked beings and their positions.
    pub beings: HashMap<BeingId, Option<Position>>,
    /// Every call, oldest first.
    pub calls: Vec<BeingCall>,
}

impl MockBeingRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the last known position of a being.
    #[must_use]
    pub fn position(&self, id: BeingId) -> Option<Position> {
        self.beings.get(&id).copied().flatten()
    }
}

impl BeingRegistry for MockBeingRegistry {
    fn contains(&self, id: BeingId) -> bool {
        self.beings.contains_key(&id)
    }

    fn upsert_being(&mut self, id: BeingId, info: &BeingInfo, position: Option<Position>) {
        let slot = self.beings.entry(id).or_insert(None);
        if position.is_some() {
            *slot = position;
        }
        self.calls
            .push(BeingCall::Upsert(id, info.name.clone(), position));
    }

    fn move_being(&mut self, id: BeingId, position: Position, direction: Direction) {
        if let Some(slot) = self.beings.get_mut(&id) {
            *slot = Some(position);
        }
        self.calls.push(BeingCall::Move(id, position, direction));
    }

    fn remove_being(&mut self, id: BeingId) {
        self.beings.remove(&id);
        self.calls.push(BeingCall::Remove(id));
    }

    fn warp_local_player(&mut self, position: Position) {
        self.calls.push(BeingCall::Warp(position));
    }
}
