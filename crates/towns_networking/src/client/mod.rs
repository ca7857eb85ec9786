//! # Network Manager
//!
//! The client protocol state machine: owns the [`Host`], pops inbound
//! packets once per `process()` call, and turns each into state changes,
//! collaborator calls and follow-up packets.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      NETWORK MANAGER                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  process()                                                  │
//! │    Host::process() ── connect edge ──> PGMSG_CONNECT (tag)  │
//! │    Host::get_packet() x max_packets_per_process             │
//! │         │                                                   │
//! │  ┌──────▼───────────────────────┐                           │
//! │  │ HashMap<Opcode, Handler>     │  decode fully, then apply │
//! │  └──────┬───────────────────────┘                           │
//! │         ├──> GameStates   (state changes, map loads)        │
//! │         ├──> UserInterface (errors, characters, chat)       │
//! │         ├──> BeingRegistry (beings, local player)           │
//! │         └──> Host::send_packet (follow-ups)                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Handoff
//!
//! `APMSG_GAME_SERVER` closes the account connection and reuses the same
//! `Host` for the game server. When that connection comes up the manager
//! sends `PGMSG_CONNECT` with the player id and the tag it was given.

pub mod watchdog;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use towns_core::{Appearance, BeingId, CharacterInfo, Direction, Position};

use crate::config::ClientConfig;
use crate::error::ProtocolResult;
use crate::host::Host;
use crate::integration::{BeingRegistry, ClientState, GameStates, PasswordHasher, UserInterface};
use crate::protocol::{
    map_load_failed_message, unknown_error_message, CharChooseRequest, CharChooseResponse,
    CharCreateRequest, CharCreateResponse, CharDeleteRequest, CharDeleteResponse,
    CharListRequest, CharListResponse, ChatMessage, ConnectRequest, ConnectResponse, ErrorCode,
    GameConnectRequest, GameConnectResponse, GameServerInfo, LoadMap, LoginRequest,
    LoginResponse, MapLoaded, Message, Opcode, Packet, Ping, PlayerInfoRequest,
    PlayerInfoResponse, PlayerLeft, PlayerMove, Pong, RegisterRequest, RegisterResponse,
    SayRequest, WalkRequest, WarpTo, CLIENT_VERSION, MSG_ACCOUNT_NAME_TAKEN,
    MSG_CHARACTER_NAME_TAKEN, MSG_INVALID_CHARACTER, MSG_INVALID_CREDENTIALS, MSG_INVALID_EMAIL,
    MSG_INVALID_PASSWORD, MSG_INVALID_TAG, MSG_INVALID_USERNAME, MSG_INVALID_VERSION,
    MSG_TOO_MANY_CHARACTERS,
};
use crate::transport::Transport;

pub use watchdog::{ConnectWatchdog, WatchdogStatus};

/// Pongs older than this are ignored.
const MAX_LATENCY_SAMPLE: Duration = Duration::from_secs(60);

/// Where the client is in the account and game conversations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// No connection.
    #[default]
    Disconnected,
    /// Connecting to the account server.
    Connecting,
    /// Account server accepted the client version.
    VersionChecked,
    /// Login sent.
    Authenticating,
    /// Registration sent.
    Registering,
    /// Logged in.
    Authenticated,
    /// Character list requested.
    AwaitingCharacterList,
    /// Character chosen; player id known.
    CharacterSelected,
    /// Account connection closed, game connection pending.
    HandedOff,
    /// `PGMSG_CONNECT` sent.
    GameConnecting,
    /// Game server accepted the tag.
    Registered,
    /// Map load in progress.
    MapLoading,
    /// Map loaded and acknowledged.
    MapReady,
    /// Local player position received.
    Synchronized,
}

/// Game server address handed out by the account server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameServerAddress {
    /// Host name.
    pub hostname: String,
    /// Port.
    pub port: u16,
}

/// Moves of a being awaiting its identity: where it was first seen and
/// where it went last. Intermediate moves are dropped.
#[derive(Clone, Copy, Debug)]
struct PendingMoves {
    first: (Position, Direction),
    latest: Option<(Position, Direction)>,
}

type Handler<T, G, U, B> = fn(&mut NetworkManager<T, G, U, B>, &mut Packet) -> ProtocolResult<()>;

/// Client protocol dispatcher.
pub struct NetworkManager<T: Transport, G: GameStates, U: UserInterface, B: BeingRegistry> {
    /// Packet endpoint, reused across the handoff.
    host: Host<T>,
    /// Opcode dispatch table.
    handlers: HashMap<Opcode, Handler<T, G, U, B>>,
    /// Account server host for `connect_default`.
    default_host: String,
    /// Account server port for `connect_default`.
    default_port: u16,
    /// Conversation phase.
    phase: Phase,
    /// Handoff tag from `APMSG_GAME_SERVER`.
    tag: Option<u32>,
    /// Game server from `APMSG_GAME_SERVER`.
    game_server: Option<GameServerAddress>,
    /// Player id from `APMSG_CHAR_CHOOSE_RESPONSE`.
    player_id: Option<u32>,
    /// Version sent in `PAMSG_CONNECT`.
    version: u32,
    /// Update host from `APMSG_CONNECT_RESPONSE`.
    update_host: Option<String>,
    /// Smoothed round-trip time.
    latency: Option<Duration>,
    /// Reference point for ping timestamps.
    clock_origin: Instant,
    /// Moves of beings whose identity was requested but not yet received.
    pending: HashMap<BeingId, PendingMoves>,
    /// Name and appearance of the last character creation request.
    pending_character: Option<(String, Appearance)>,
    /// Packets dispatched per `process()`.
    max_packets_per_process: usize,
    /// Game state machine.
    game_states: G,
    /// User interface.
    ui: U,
    /// Being registry.
    beings: B,
}

impl<T, G, U, B> NetworkManager<T, G, U, B>
where
    T: Transport,
    G: GameStates,
    U: UserInterface,
    B: BeingRegistry,
{
    /// Creates a disconnected manager.
    pub fn new(transport: T, config: &ClientConfig, game_states: G, ui: U, beings: B) -> Self {
        Self {
            host: Host::new(transport),
            handlers: Self::handler_table(),
            default_host: config.account.host.clone(),
            default_port: config.account.port,
            phase: Phase::Disconnected,
            tag: None,
            game_server: None,
            player_id: None,
            version: CLIENT_VERSION,
            update_host: None,
            latency: None,
            clock_origin: Instant::now(),
            pending: HashMap::new(),
            pending_character: None,
            max_packets_per_process: config.max_packets_per_process.max(1),
            game_states,
            ui,
            beings,
        }
    }

    fn handler_table() -> HashMap<Opcode, Handler<T, G, U, B>> {
        let mut table: HashMap<Opcode, Handler<T, G, U, B>> = HashMap::new();
        table.insert(Opcode::APMSG_CONNECT_RESPONSE, Self::handle_connect_response);
        table.insert(Opcode::APMSG_REGISTER_RESPONSE, Self::handle_register_response);
        table.insert(Opcode::APMSG_LOGIN_RESPONSE, Self::handle_login_response);
        table.insert(Opcode::APMSG_CHAR_LIST_RESPONSE, Self::handle_char_list);
        table.insert(Opcode::APMSG_CHAR_CREATE_RESPONSE, Self::handle_char_create);
        table.insert(Opcode::APMSG_CHAR_CHOOSE_RESPONSE, Self::handle_char_choose);
        table.insert(Opcode::APMSG_CHAR_DELETE_RESPONSE, Self::handle_char_delete);
        table.insert(Opcode::APMSG_GAME_SERVER, Self::handle_game_server);
        table.insert(Opcode::GPMSG_CONNECT_RESPONSE, Self::handle_game_connect);
        table.insert(Opcode::GPMSG_LOAD_MAP, Self::handle_load_map);
        table.insert(Opcode::GPMSG_WARPTO, Self::handle_warp_to);
        table.insert(Opcode::GPMSG_PLAYER_MOVE, Self::handle_player_move);
        table.insert(Opcode::GPMSG_PLAYER_INFO_RESPONSE, Self::handle_player_info);
        table.insert(Opcode::GPMSG_PLAYER_LEFT, Self::handle_player_left);
        table.insert(Opcode::GPMSG_CHAT, Self::handle_chat);
        table.insert(Opcode::GPMSG_PONG, Self::handle_pong);
        table
    }

    // ========================================================================
    // CONNECTION
    // ========================================================================

    /// Starts connecting to an account server.
    pub fn connect(&mut self, hostname: &str, port: u16) {
        info!("Connecting to account server {}:{}", hostname, port);
        self.phase = Phase::Connecting;
        self.host.connect(hostname, port);
    }

    /// Starts connecting to the default account server.
    pub fn connect_default(&mut self) {
        let hostname = self.default_host.clone();
        self.connect(&hostname, self.default_port);
    }

    /// Sets the default account server.
    pub fn set_default(&mut self, hostname: &str, port: u16) {
        self.default_host = hostname.to_string();
        self.default_port = port;
    }

    /// Closes the connection and pumps the host once so the closed state
    /// is visible immediately.
    pub fn disconnect(&mut self) {
        debug!("Disconnecting in phase {:?}", self.phase);
        self.host.disconnect();
        self.host.process();
        self.phase = Phase::Disconnected;
        self.pending.clear();
    }

    /// Returns the host's last-known connection state.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.host.is_connected()
    }

    /// Pumps the host and dispatches up to `max_packets_per_process`
    /// packets in arrival order.
    pub fn process(&mut self) {
        let was_connected = self.host.is_connected();
        self.host.process();
        match (was_connected, self.host.is_connected()) {
            (false, true) => self.on_connected(),
            (true, false) => self.on_connection_lost(),
            _ => {}
        }

        for _ in 0..self.max_packets_per_process {
            let Some(packet) = self.host.get_packet() else {
                break;
            };
            self.dispatch(packet);
        }
    }

    fn on_connected(&mut self) {
        info!("Connected in phase {:?}", self.phase);
        if self.phase != Phase::HandedOff {
            return;
        }
        match (self.player_id, self.tag) {
            (Some(player_id), Some(tag)) => {
                debug!("Presenting handoff tag {} for player {}", tag, player_id);
                self.send_message(&GameConnectRequest { player_id, tag });
                self.phase = Phase::GameConnecting;
            }
            _ => warn!("Connected to game server without a player id or tag"),
        }
    }

    fn on_connection_lost(&mut self) {
        info!("Connection lost in phase {:?}", self.phase);
        self.phase = Phase::Disconnected;
        self.pending.clear();
    }

    // ========================================================================
    // SENDING
    // ========================================================================

    /// Sends a packet. The packet is consumed.
    pub fn send_packet(&mut self, packet: Packet) {
        self.host.send_packet(packet);
    }

    fn send_message<M: Message>(&mut self, message: &M) {
        debug!("Sending {}", M::OPCODE);
        self.host.send_packet(message.encode());
    }

    /// Sends `PAMSG_CONNECT` with the client version.
    pub fn send_version(&mut self) {
        self.send_message(&ConnectRequest {
            version: self.version,
        });
    }

    /// Sends `PAMSG_LOGIN`.
    pub fn login(&mut self, username: &str, password: &str, hasher: &impl PasswordHasher) {
        self.send_message(&LoginRequest {
            username: username.to_string(),
            password_hash: hasher.hash(username, password),
        });
        self.phase = Phase::Authenticating;
    }

    /// Sends `PAMSG_REGISTER`.
    pub fn register(
        &mut self,
        username: &str,
        password: &str,
        email: &str,
        hasher: &impl PasswordHasher,
    ) {
        self.send_message(&RegisterRequest {
            username: username.to_string(),
            password_hash: hasher.hash(username, password),
            email: email.to_string(),
        });
        self.phase = Phase::Registering;
    }

    /// Sends `PAMSG_CHAR_LIST`.
    pub fn request_character_list(&mut self) {
        self.send_message(&CharListRequest);
        self.phase = Phase::AwaitingCharacterList;
    }

    /// Sends `PAMSG_CHAR_CREATE`.
    pub fn create_character(&mut self, name: &str, appearance: Appearance) {
        self.send_message(&CharCreateRequest {
            name: name.to_string(),
            appearance,
        });
        self.pending_character = Some((name.to_string(), appearance));
    }

    /// Sends `PAMSG_CHAR_CHOOSE`.
    pub fn choose_character(&mut self, slot: u8) {
        self.send_message(&CharChooseRequest { slot });
    }

    /// Sends `PAMSG_CHAR_DELETE`.
    pub fn delete_character(&mut self, slot: u8) {
        self.send_message(&CharDeleteRequest { slot });
    }

    /// Sends `PGMSG_WALK`.
    pub fn walk(&mut self, destination: Position) {
        self.send_message(&WalkRequest { destination });
    }

    /// Sends `PGMSG_SAY`.
    pub fn say(&mut self, text: &str) {
        self.send_message(&SayRequest {
            text: text.to_string(),
        });
    }

    /// Sends `PGMSG_PING` stamped with the local clock.
    pub fn ping(&mut self) {
        let timestamp = self.clock_millis();
        self.send_message(&Ping { timestamp });
    }

    #[allow(clippy::cast_possible_truncation)]
    fn clock_millis(&self) -> u32 {
        // Wraps after ~49 days; pong handling uses wrapping arithmetic.
        self.clock_origin.elapsed().as_millis() as u32
    }

    // ========================================================================
    // DISPATCH
    // ========================================================================

    /// Routes one inbound packet to its handler.
    ///
    /// Unknown and client-originated opcodes are logged and ignored, as are
    /// packets that fail to decode.
    pub fn dispatch(&mut self, mut packet: Packet) {
        let raw = packet.opcode();
        let Some(opcode) = Opcode::from_u32(raw) else {
            warn!("Ignoring unknown opcode 0x{:04X} ({} bytes)", raw, packet.len());
            return;
        };
        let Some(handler) = self.handlers.get(&opcode).copied() else {
            warn!("Ignoring {} sent by the server ({:?} message)", opcode, opcode.origin());
            return;
        };
        debug!("Dispatching {} in phase {:?}", opcode, self.phase);
        if let Err(e) = handler(self, &mut packet) {
            warn!("Ignoring malformed {}: {}", opcode, e);
        }
    }

    /// Returns true if inbound `opcode` has a handler.
    #[must_use]
    pub fn handles(&self, opcode: Opcode) -> bool {
        self.handlers.contains_key(&opcode)
    }

    fn report(&mut self, message: &str) {
        debug!("Reporting error: {}", message);
        self.ui.report_error(message);
    }

    fn request_state(&mut self, state: ClientState) {
        debug!("Requesting state {:?}", state);
        self.game_states.request_state_change(state);
    }

    // ------------------------------------------------------------------------
    // Account server
    // ------------------------------------------------------------------------

    fn handle_connect_response(&mut self, packet: &mut Packet) -> ProtocolResult<()> {
        let response = ConnectResponse::decode(packet)?;
        match response.error {
            ErrorCode::None => {
                self.update_host = response.update_host;
                self.phase = Phase::VersionChecked;
                self.request_state(ClientState::Login);
            }
            ErrorCode::InvalidVersion => {
                self.report(MSG_INVALID_VERSION);
                self.disconnect();
                self.request_state(ClientState::Error);
            }
            other => {
                self.report(&unknown_error_message(other));
                self.disconnect();
                self.request_state(ClientState::Error);
            }
        }
        Ok(())
    }

    fn handle_login_response(&mut self, packet: &mut Packet) -> ProtocolResult<()> {
        let response = LoginResponse::decode(packet)?;
        match response.error {
            ErrorCode::None => {
                info!("Logged in");
                self.phase = Phase::Authenticated;
                self.request_state(ClientState::CharSelect);
            }
            ErrorCode::InvalidUsername | ErrorCode::InvalidPassword => {
                self.phase = Phase::VersionChecked;
                self.report(MSG_INVALID_CREDENTIALS);
                self.request_state(ClientState::Login);
            }
            ErrorCode::InvalidVersion => {
                self.report(MSG_INVALID_VERSION);
                self.disconnect();
                self.request_state(ClientState::Error);
            }
            other => {
                self.phase = Phase::VersionChecked;
                self.report(&unknown_error_message(other));
                self.request_state(ClientState::Login);
            }
        }
        Ok(())
    }

    fn handle_register_response(&mut self, packet: &mut Packet) -> ProtocolResult<()> {
        let response = RegisterResponse::decode(packet)?;
        let message = match response.error {
            ErrorCode::None => {
                info!("Account registered");
                self.phase = Phase::Authenticated;
                self.request_state(ClientState::CharSelect);
                return Ok(());
            }
            ErrorCode::TakenName => MSG_ACCOUNT_NAME_TAKEN.to_string(),
            ErrorCode::InvalidUsername => MSG_INVALID_USERNAME.to_string(),
            ErrorCode::InvalidPassword => MSG_INVALID_PASSWORD.to_string(),
            ErrorCode::InvalidEmail => MSG_INVALID_EMAIL.to_string(),
            other => unknown_error_message(other),
        };
        self.phase = Phase::VersionChecked;
        self.report(&message);
        self.request_state(ClientState::Login);
        Ok(())
    }

    fn handle_char_list(&mut self, packet: &mut Packet) -> ProtocolResult<()> {
        let response = CharListResponse::decode(packet)?;
        debug!("Received {} characters", response.characters.len());
        self.phase = Phase::Authenticated;
        self.ui.show_characters(&response.characters);
        Ok(())
    }

    fn handle_char_create(&mut self, packet: &mut Packet) -> ProtocolResult<()> {
        let response = CharCreateResponse::decode(packet)?;
        let requested = self.pending_character.take();
        match (response.error, response.created) {
            (ErrorCode::None, Some((id, slot))) => {
                let (name, appearance) = requested.unwrap_or_default();
                let character = CharacterInfo {
                    id,
                    slot,
                    name,
                    appearance,
                    level: 1,
                    rights: 0,
                };
                info!("Created character {} in slot {}", character.name, slot);
                self.ui.show_character_created(&character);
                self.request_state(ClientState::CharSelect);
            }
            (ErrorCode::TakenName, _) => self.report(MSG_CHARACTER_NAME_TAKEN),
            (ErrorCode::TooManyCharacters, _) => self.report(MSG_TOO_MANY_CHARACTERS),
            (ErrorCode::InvalidCharacter | ErrorCode::InvalidUsername, _) => {
                self.report(MSG_INVALID_CHARACTER);
            }
            (other, _) => self.report(&unknown_error_message(other)),
        }
        Ok(())
    }

    fn handle_char_choose(&mut self, packet: &mut Packet) -> ProtocolResult<()> {
        let response = CharChooseResponse::decode(packet)?;
        match (response.error, response.player_id) {
            (ErrorCode::None, Some(player_id)) => {
                info!("Character chosen, player id {}", player_id);
                self.player_id = Some(player_id);
                self.phase = Phase::CharacterSelected;
            }
            (ErrorCode::InvalidCharacter, _) => {
                self.report(MSG_INVALID_CHARACTER);
                self.request_state(ClientState::CharSelect);
            }
            (other, _) => {
                self.report(&unknown_error_message(other));
                self.request_state(ClientState::CharSelect);
            }
        }
        Ok(())
    }

    fn handle_char_delete(&mut self, packet: &mut Packet) -> ProtocolResult<()> {
        let response = CharDeleteResponse::decode(packet)?;
        match response.error {
            ErrorCode::None => {
                info!("Character deleted");
                self.request_state(ClientState::CharSelect);
            }
            ErrorCode::InvalidCharacter => self.report(MSG_INVALID_CHARACTER),
            other => self.report(&unknown_error_message(other)),
        }
        Ok(())
    }

    fn handle_game_server(&mut self, packet: &mut Packet) -> ProtocolResult<()> {
        let GameServerInfo {
            hostname,
            port,
            tag,
        } = GameServerInfo::decode(packet)?;
        info!("Handed off to game server {}:{}", hostname, port);

        self.disconnect();
        self.host.connect(&hostname, port);
        self.tag = Some(tag);
        self.game_server = Some(GameServerAddress { hostname, port });
        self.phase = Phase::HandedOff;
        self.request_state(ClientState::GameConnect);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Game server
    // ------------------------------------------------------------------------

    fn handle_game_connect(&mut self, packet: &mut Packet) -> ProtocolResult<()> {
        let response = GameConnectResponse::decode(packet)?;
        match response.error {
            ErrorCode::None => {
                info!("Game server accepted the handoff");
                self.phase = Phase::Registered;
            }
            other => {
                let message = if other == ErrorCode::InvalidTag {
                    MSG_INVALID_TAG.to_string()
                } else {
                    unknown_error_message(other)
                };
                self.report(&message);
                self.disconnect();
                self.tag = None;
                self.request_state(ClientState::AccountConnect);
            }
        }
        Ok(())
    }

    fn handle_load_map(&mut self, packet: &mut Packet) -> ProtocolResult<()> {
        let LoadMap { map } = LoadMap::decode(packet)?;
        self.phase = Phase::MapLoading;
        self.pending.clear();
        match self.game_states.load_map(&map) {
            Ok(()) => {
                info!("Loaded map {}", map);
                self.send_message(&MapLoaded);
                self.phase = Phase::MapReady;
                self.request_state(ClientState::Game);
            }
            Err(e) => {
                warn!("Map {} failed to load: {}", map, e);
                self.report(&map_load_failed_message(&map));
                self.request_state(ClientState::Error);
            }
        }
        Ok(())
    }

    fn handle_warp_to(&mut self, packet: &mut Packet) -> ProtocolResult<()> {
        let WarpTo { position } = WarpTo::decode(packet)?;
        debug!("Local player warped to {}", position);
        self.beings.warp_local_player(position);
        self.phase = Phase::Synchronized;
        Ok(())
    }

    fn handle_player_move(&mut self, packet: &mut Packet) -> ProtocolResult<()> {
        let PlayerMove {
            id,
            position,
            direction,
        } = PlayerMove::decode(packet)?;

        if self.beings.contains(id) {
            self.beings.move_being(id, position, direction);
            return Ok(());
        }

        if let Some(moves) = self.pending.get_mut(&id) {
            moves.latest = Some((position, direction));
            return Ok(());
        }
        self.pending.insert(
            id,
            PendingMoves {
                first: (position, direction),
                latest: None,
            },
        );
        debug!("Unknown {} at {}, requesting identity", id, position);
        self.send_message(&PlayerInfoRequest { id });
        Ok(())
    }

    fn handle_player_info(&mut self, packet: &mut Packet) -> ProtocolResult<()> {
        let PlayerInfoResponse { id, info } = PlayerInfoResponse::decode(packet)?;

        let Some(PendingMoves { first, latest }) = self.pending.remove(&id) else {
            self.beings.upsert_being(id, &info, None);
            return Ok(());
        };
        debug!("Materializing {} ({}) at {}", id, info.name, first.0);
        self.beings.upsert_being(id, &info, Some(first.0));
        for (position, direction) in std::iter::once(first).chain(latest) {
            self.beings.move_being(id, position, direction);
        }
        Ok(())
    }

    fn handle_player_left(&mut self, packet: &mut Packet) -> ProtocolResult<()> {
        let PlayerLeft { id } = PlayerLeft::decode(packet)?;
        self.pending.remove(&id);
        self.beings.remove_being(id);
        Ok(())
    }

    fn handle_chat(&mut self, packet: &mut Packet) -> ProtocolResult<()> {
        let ChatMessage { speaker, text } = ChatMessage::decode(packet)?;
        self.ui.show_chat(speaker, &text);
        Ok(())
    }

    fn handle_pong(&mut self, packet: &mut Packet) -> ProtocolResult<()> {
        let Pong { timestamp } = Pong::decode(packet)?;
        let sample =
            Duration::from_millis(u64::from(self.clock_millis().wrapping_sub(timestamp)));
        if sample > MAX_LATENCY_SAMPLE {
            warn!("Ignoring pong with implausible round trip {:?}", sample);
            return Ok(());
        }
        self.record_latency(sample);
        Ok(())
    }

    fn record_latency(&mut self, sample: Duration) {
        let smoothed = match self.latency {
            Some(previous) => (previous * 7 + sample) / 8,
            None => sample,
        };
        debug!("Round trip {:?}, smoothed {:?}", sample, smoothed);
        self.latency = Some(smoothed);
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// Returns the conversation phase.
    #[inline]
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns the latest handoff tag.
    #[inline]
    #[must_use]
    pub const fn tag(&self) -> Option<u32> {
        self.tag
    }

    /// Returns the player id of the chosen character.
    #[inline]
    #[must_use]
    pub const fn player_id(&self) -> Option<u32> {
        self.player_id
    }

    /// Returns the update host announced by the account server.
    #[must_use]
    pub fn update_host(&self) -> Option<&str> {
        self.update_host.as_deref()
    }

    /// Returns the smoothed round-trip time.
    #[inline]
    #[must_use]
    pub const fn latency(&self) -> Option<Duration> {
        self.latency
    }

    /// Returns the game server of the latest handoff.
    #[must_use]
    pub const fn game_server(&self) -> Option<&GameServerAddress> {
        self.game_server.as_ref()
    }

    /// Returns the number of beings awaiting identity.
    #[must_use]
    pub fn pending_beings(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if `id` awaits identity.
    #[must_use]
    pub fn is_pending(&self, id: BeingId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Returns the default account server.
    #[must_use]
    pub fn default_server(&self) -> (&str, u16) {
        (&self.default_host, self.default_port)
    }

    /// Returns the host.
    pub fn host(&self) -> &Host<T> {
        &self.host
    }

    /// Returns the game state machine.
    pub fn game_states(&self) -> &G {
        &self.game_states
    }

    /// Returns the game state machine mutably.
    pub fn game_states_mut(&mut self) -> &mut G {
        &mut self.game_states
    }

    /// Returns the user interface.
    pub fn ui(&self) -> &U {
        &self.ui
    }

    /// Returns the being registry.
    pub fn beings(&self) -> &B {
        &self.beings
    }
}
