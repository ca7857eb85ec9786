//! # Message Shapes
//!
//! Typed views of every opcode's payload. Each message knows how to write
//! its fields into a [`Packet`] and how to read them back, so handlers work
//! with owned, length-bounded values and never with raw cursors.
//!
//! Decoding reads every field before returning; a short or malformed packet
//! yields a [`ProtocolError`] and nothing is applied.

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]

use towns_core::{Appearance, BeingId, BeingInfo, CharacterInfo, Direction, Position};

use super::errors::ErrorCode;
use super::opcodes::Opcode;
use super::packet::Packet;
use crate::error::{ProtocolError, ProtocolResult};

/// Field-level reader that attaches the opcode and field name to errors.
pub struct FieldReader<'a> {
    packet: &'a mut Packet,
}

impl<'a> FieldReader<'a> {
    /// Wraps a packet positioned at its first field.
    pub fn new(packet: &'a mut Packet) -> Self {
        Self { packet }
    }

    fn missing(&self, field: &'static str) -> ProtocolError {
        ProtocolError::MissingField {
            opcode: self.packet.opcode(),
            field,
        }
    }

    fn invalid(&self, field: &'static str, value: i64) -> ProtocolError {
        ProtocolError::InvalidField {
            opcode: self.packet.opcode(),
            field,
            value,
        }
    }

    /// Reads a required byte.
    pub fn byte(&mut self, field: &'static str) -> ProtocolResult<u8> {
        self.packet.get_byte().ok_or_else(|| self.missing(field))
    }

    /// Reads a required integer.
    pub fn integer(&mut self, field: &'static str) -> ProtocolResult<i32> {
        self.packet.get_integer().ok_or_else(|| self.missing(field))
    }

    /// Reads a required integer reinterpreted as unsigned.
    pub fn unsigned(&mut self, field: &'static str) -> ProtocolResult<u32> {
        self.integer(field).map(|value| value as u32)
    }

    /// Reads a required string.
    pub fn string(&mut self, field: &'static str) -> ProtocolResult<String> {
        self.packet.get_string().ok_or_else(|| self.missing(field))
    }

    /// Reads an optional trailing string; absent reads as empty.
    pub fn trailing_string(&mut self) -> String {
        self.packet.get_string().unwrap_or_default()
    }

    /// Reads an error byte.
    pub fn error_code(&mut self) -> ProtocolResult<ErrorCode> {
        self.byte("error").map(ErrorCode::from_byte)
    }

    /// Reads a position (two integers).
    pub fn position(&mut self) -> ProtocolResult<Position> {
        let x = self.integer("x")?;
        let y = self.integer("y")?;
        Ok(Position::new(x, y))
    }

    /// Reads a direction byte.
    pub fn direction(&mut self) -> ProtocolResult<Direction> {
        let byte = self.byte("direction")?;
        Direction::from_byte(byte).ok_or_else(|| self.invalid("direction", i64::from(byte)))
    }

    /// Reads three appearance bytes.
    pub fn appearance(&mut self) -> ProtocolResult<Appearance> {
        Ok(Appearance {
            gender: self.byte("gender")?,
            hair_style: self.byte("hair_style")?,
            hair_color: self.byte("hair_color")?,
        })
    }
}

fn write_position(packet: &mut Packet, position: Position) {
    packet.set_integer(position.x);
    packet.set_integer(position.y);
}

fn write_appearance(packet: &mut Packet, appearance: Appearance) {
    packet.set_byte(appearance.gender);
    packet.set_byte(appearance.hair_style);
    packet.set_byte(appearance.hair_color);
}

/// A message with a fixed opcode and field layout.
pub trait Message: Sized {
    /// Opcode identifying this message on the wire.
    const OPCODE: Opcode;

    /// Appends the fields in wire order.
    fn write(&self, packet: &mut Packet);

    /// Reads the fields in wire order.
    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self>;

    /// Builds an outbound packet.
    fn encode(&self) -> Packet {
        let mut packet = Packet::new(Self::OPCODE);
        self.write(&mut packet);
        packet
    }

    /// Decodes an inbound packet positioned at its first field.
    fn decode(packet: &mut Packet) -> ProtocolResult<Self> {
        Self::read(&mut FieldReader::new(packet))
    }
}

// ============================================================================
// ACCOUNT SERVER CONVERSATION
// ============================================================================

/// `PAMSG_CONNECT`: version handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConnectRequest {
    /// Client protocol version.
    pub version: u32,
}

impl Message for ConnectRequest {
    const OPCODE: Opcode = Opcode::PAMSG_CONNECT;

    fn write(&self, packet: &mut Packet) {
        packet.set_integer(self.version as i32);
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            version: reader.unsigned("version")?,
        })
    }
}

/// `APMSG_CONNECT_RESPONSE`: version verdict and optional update host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectResponse {
    /// Verdict.
    pub error: ErrorCode,
    /// Where newer client data can be downloaded from.
    pub update_host: Option<String>,
}

impl Message for ConnectResponse {
    const OPCODE: Opcode = Opcode::APMSG_CONNECT_RESPONSE;

    fn write(&self, packet: &mut Packet) {
        packet.set_byte(self.error.as_byte());
        if let Some(host) = &self.update_host {
            packet.set_string(host);
        }
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        let error = reader.error_code()?;
        let host = reader.trailing_string();
        Ok(Self {
            error,
            update_host: (!host.is_empty()).then_some(host),
        })
    }
}

/// `PAMSG_REGISTER`: create an account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterRequest {
    /// Account name.
    pub username: String,
    /// Output of the password hasher.
    pub password_hash: String,
    /// Contact address.
    pub email: String,
}

impl Message for RegisterRequest {
    const OPCODE: Opcode = Opcode::PAMSG_REGISTER;

    fn write(&self, packet: &mut Packet) {
        packet.set_terminated_string(&self.username);
        packet.set_terminated_string(&self.password_hash);
        packet.set_string(&self.email);
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            username: reader.string("username")?,
            password_hash: reader.string("password_hash")?,
            email: reader.trailing_string(),
        })
    }
}

/// `PAMSG_LOGIN`: authenticate an account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginRequest {
    /// Account name.
    pub username: String,
    /// Output of the password hasher.
    pub password_hash: String,
}

impl Message for LoginRequest {
    const OPCODE: Opcode = Opcode::PAMSG_LOGIN;

    fn write(&self, packet: &mut Packet) {
        packet.set_terminated_string(&self.username);
        packet.set_string(&self.password_hash);
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            username: reader.string("username")?,
            password_hash: reader.trailing_string(),
        })
    }
}

macro_rules! error_response {
    ($(#[$doc:meta])* $name:ident => $opcode:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub struct $name {
            /// Verdict.
            pub error: ErrorCode,
        }

        impl Message for $name {
            const OPCODE: Opcode = Opcode::$opcode;

            fn write(&self, packet: &mut Packet) {
                packet.set_byte(self.error.as_byte());
            }

            fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
                Ok(Self {
                    error: reader.error_code()?,
                })
            }
        }
    };
}

error_response!(
    /// `APMSG_REGISTER_RESPONSE`.
    RegisterResponse => APMSG_REGISTER_RESPONSE
);
error_response!(
    /// `APMSG_LOGIN_RESPONSE`.
    LoginResponse => APMSG_LOGIN_RESPONSE
);
error_response!(
    /// `APMSG_CHAR_DELETE_RESPONSE`.
    CharDeleteResponse => APMSG_CHAR_DELETE_RESPONSE
);
error_response!(
    /// `GPMSG_CONNECT_RESPONSE`.
    GameConnectResponse => GPMSG_CONNECT_RESPONSE
);

macro_rules! empty_message {
    ($(#[$doc:meta])* $name:ident => $opcode:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
        pub struct $name;

        impl Message for $name {
            const OPCODE: Opcode = Opcode::$opcode;

            fn write(&self, _packet: &mut Packet) {}

            fn read(_reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
                Ok(Self)
            }
        }
    };
}

empty_message!(
    /// `PAMSG_CHAR_LIST`: ask for the account's characters.
    CharListRequest => PAMSG_CHAR_LIST
);
empty_message!(
    /// `PGMSG_MAP_LOADED`: the map named by `GPMSG_LOAD_MAP` is ready.
    MapLoaded => PGMSG_MAP_LOADED
);

/// `APMSG_CHAR_LIST_RESPONSE`: the account's characters.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct CharListResponse {
    /// One entry per occupied slot.
    pub characters: Vec<CharacterInfo>,
}

impl Message for CharListResponse {
    const OPCODE: Opcode = Opcode::APMSG_CHAR_LIST_RESPONSE;

    #[allow(clippy::cast_possible_truncation)]
    fn write(&self, packet: &mut Packet) {
        packet.set_byte(self.characters.len().min(usize::from(u8::MAX)) as u8);
        for character in self.characters.iter().take(usize::from(u8::MAX)) {
            packet.set_integer(character.id as i32);
            packet.set_byte(character.slot);
            packet.set_terminated_string(&character.name);
            write_appearance(packet, character.appearance);
            packet.set_byte(character.level);
            packet.set_byte(character.rights);
        }
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        let count = reader.byte("count")?;
        let mut characters = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            characters.push(CharacterInfo {
                id: reader.unsigned("id")?,
                slot: reader.byte("slot")?,
                name: reader.string("name")?,
                appearance: reader.appearance()?,
                level: reader.byte("level")?,
                rights: reader.byte("rights")?,
            });
        }
        Ok(Self { characters })
    }
}

/// `PAMSG_CHAR_CREATE`: create a character.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CharCreateRequest {
    /// Character name.
    pub name: String,
    /// Chosen appearance.
    pub appearance: Appearance,
}

impl Message for CharCreateRequest {
    const OPCODE: Opcode = Opcode::PAMSG_CHAR_CREATE;

    fn write(&self, packet: &mut Packet) {
        packet.set_terminated_string(&self.name);
        write_appearance(packet, self.appearance);
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            name: reader.string("name")?,
            appearance: reader.appearance()?,
        })
    }
}

/// `APMSG_CHAR_CREATE_RESPONSE`: verdict and, on success, the new
/// character's identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharCreateResponse {
    /// Verdict.
    pub error: ErrorCode,
    /// `(id, slot)` assigned on success.
    pub created: Option<(u32, u8)>,
}

impl Message for CharCreateResponse {
    const OPCODE: Opcode = Opcode::APMSG_CHAR_CREATE_RESPONSE;

    fn write(&self, packet: &mut Packet) {
        packet.set_byte(self.error.as_byte());
        if let Some((id, slot)) = self.created {
            packet.set_integer(id as i32);
            packet.set_byte(slot);
        }
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        let error = reader.error_code()?;
        let created = if error.is_ok() {
            Some((reader.unsigned("id")?, reader.byte("slot")?))
        } else {
            None
        };
        Ok(Self { error, created })
    }
}

/// `PAMSG_CHAR_CHOOSE`: play a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharChooseRequest {
    /// Slot of the chosen character.
    pub slot: u8,
}

impl Message for CharChooseRequest {
    const OPCODE: Opcode = Opcode::PAMSG_CHAR_CHOOSE;

    fn write(&self, packet: &mut Packet) {
        packet.set_byte(self.slot);
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            slot: reader.byte("slot")?,
        })
    }
}

/// `APMSG_CHAR_CHOOSE_RESPONSE`: verdict and, on success, the player id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharChooseResponse {
    /// Verdict.
    pub error: ErrorCode,
    /// Player id assigned on success.
    pub player_id: Option<u32>,
}

impl Message for CharChooseResponse {
    const OPCODE: Opcode = Opcode::APMSG_CHAR_CHOOSE_RESPONSE;

    fn write(&self, packet: &mut Packet) {
        packet.set_byte(self.error.as_byte());
        if let Some(id) = self.player_id {
            packet.set_integer(id as i32);
        }
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        let error = reader.error_code()?;
        let player_id = if error.is_ok() {
            Some(reader.unsigned("player_id")?)
        } else {
            None
        };
        Ok(Self { error, player_id })
    }
}

/// `PAMSG_CHAR_DELETE`: delete a character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CharDeleteRequest {
    /// Slot of the character.
    pub slot: u8,
}

impl Message for CharDeleteRequest {
    const OPCODE: Opcode = Opcode::PAMSG_CHAR_DELETE;

    fn write(&self, packet: &mut Packet) {
        packet.set_byte(self.slot);
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            slot: reader.byte("slot")?,
        })
    }
}

/// `APMSG_GAME_SERVER`: where to continue and the one-time tag to use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameServerInfo {
    /// Game server host name.
    pub hostname: String,
    /// Game server port.
    pub port: u16,
    /// One-time handoff tag.
    pub tag: u32,
}

impl Message for GameServerInfo {
    const OPCODE: Opcode = Opcode::APMSG_GAME_SERVER;

    fn write(&self, packet: &mut Packet) {
        packet.set_terminated_string(&self.hostname);
        packet.set_integer(i32::from(self.port));
        packet.set_integer(self.tag as i32);
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        let hostname = reader.string("hostname")?;
        let raw_port = reader.integer("port")?;
        let port = u16::try_from(raw_port)
            .map_err(|_| reader.invalid("port", i64::from(raw_port)))?;
        let tag = reader.unsigned("tag")?;
        Ok(Self {
            hostname,
            port,
            tag,
        })
    }
}

// ============================================================================
// GAME SERVER CONVERSATION
// ============================================================================

/// `PGMSG_CONNECT`: authenticate the handoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameConnectRequest {
    /// Player id from `APMSG_CHAR_CHOOSE_RESPONSE`.
    pub player_id: u32,
    /// Tag from `APMSG_GAME_SERVER`.
    pub tag: u32,
}

impl Message for GameConnectRequest {
    const OPCODE: Opcode = Opcode::PGMSG_CONNECT;

    fn write(&self, packet: &mut Packet) {
        packet.set_integer(self.player_id as i32);
        packet.set_integer(self.tag as i32);
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            player_id: reader.unsigned("player_id")?,
            tag: reader.unsigned("tag")?,
        })
    }
}

/// `GPMSG_LOAD_MAP`: switch to a map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadMap {
    /// Map identifier.
    pub map: String,
}

impl Message for LoadMap {
    const OPCODE: Opcode = Opcode::GPMSG_LOAD_MAP;

    fn write(&self, packet: &mut Packet) {
        packet.set_string(&self.map);
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            map: reader.trailing_string(),
        })
    }
}

/// `GPMSG_WARPTO`: authoritative local player position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WarpTo {
    /// New position.
    pub position: Position,
}

impl Message for WarpTo {
    const OPCODE: Opcode = Opcode::GPMSG_WARPTO;

    fn write(&self, packet: &mut Packet) {
        write_position(packet, self.position);
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            position: reader.position()?,
        })
    }
}

/// `GPMSG_PLAYER_MOVE`: another being moved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerMove {
    /// Being that moved.
    pub id: BeingId,
    /// New position.
    pub position: Position,
    /// New facing.
    pub direction: Direction,
}

impl Message for PlayerMove {
    const OPCODE: Opcode = Opcode::GPMSG_PLAYER_MOVE;

    fn write(&self, packet: &mut Packet) {
        packet.set_integer(self.id.0 as i32);
        write_position(packet, self.position);
        packet.set_byte(self.direction.as_byte());
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            id: BeingId(reader.unsigned("id")?),
            position: reader.position()?,
            direction: reader.direction()?,
        })
    }
}

/// `PGMSG_PLAYER_INFO`: ask who a being is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerInfoRequest {
    /// Being to identify.
    pub id: BeingId,
}

impl Message for PlayerInfoRequest {
    const OPCODE: Opcode = Opcode::PGMSG_PLAYER_INFO;

    fn write(&self, packet: &mut Packet) {
        packet.set_integer(self.id.0 as i32);
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            id: BeingId(reader.unsigned("id")?),
        })
    }
}

/// `GPMSG_PLAYER_INFO_RESPONSE`: identity of a being.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerInfoResponse {
    /// Being described.
    pub id: BeingId,
    /// Its identity attributes.
    pub info: BeingInfo,
}

impl Message for PlayerInfoResponse {
    const OPCODE: Opcode = Opcode::GPMSG_PLAYER_INFO_RESPONSE;

    fn write(&self, packet: &mut Packet) {
        packet.set_integer(self.id.0 as i32);
        packet.set_terminated_string(&self.info.name);
        write_appearance(packet, self.info.appearance);
        packet.set_byte(self.info.level);
        packet.set_byte(self.info.rights);
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        let id = BeingId(reader.unsigned("id")?);
        let info = BeingInfo {
            name: reader.string("name")?,
            appearance: reader.appearance()?,
            level: reader.byte("level")?,
            rights: reader.byte("rights")?,
        };
        Ok(Self { id, info })
    }
}

/// `GPMSG_PLAYER_LEFT`: a being left the visible area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerLeft {
    /// Being that left.
    pub id: BeingId,
}

impl Message for PlayerLeft {
    const OPCODE: Opcode = Opcode::GPMSG_PLAYER_LEFT;

    fn write(&self, packet: &mut Packet) {
        packet.set_integer(self.id.0 as i32);
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            id: BeingId(reader.unsigned("id")?),
        })
    }
}

/// `PGMSG_WALK`: request to walk to a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WalkRequest {
    /// Destination.
    pub destination: Position,
}

impl Message for WalkRequest {
    const OPCODE: Opcode = Opcode::PGMSG_WALK;

    fn write(&self, packet: &mut Packet) {
        write_position(packet, self.destination);
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            destination: reader.position()?,
        })
    }
}

/// `PGMSG_SAY`: public chat line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SayRequest {
    /// Chat text.
    pub text: String,
}

impl Message for SayRequest {
    const OPCODE: Opcode = Opcode::PGMSG_SAY;

    fn write(&self, packet: &mut Packet) {
        packet.set_string(&self.text);
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            text: reader.trailing_string(),
        })
    }
}

/// `GPMSG_CHAT`: chat line from a being or the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    /// Speaker, `None` for server announcements (id 0 on the wire).
    pub speaker: Option<BeingId>,
    /// Chat text.
    pub text: String,
}

impl Message for ChatMessage {
    const OPCODE: Opcode = Opcode::GPMSG_CHAT;

    fn write(&self, packet: &mut Packet) {
        packet.set_integer(self.speaker.map_or(0, |id| id.0 as i32));
        packet.set_string(&self.text);
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        let speaker = reader.unsigned("speaker")?;
        Ok(Self {
            speaker: (speaker != 0).then_some(BeingId(speaker)),
            text: reader.trailing_string(),
        })
    }
}

/// `PGMSG_PING`: latency measurement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ping {
    /// Client clock in milliseconds.
    pub timestamp: u32,
}

impl Message for Ping {
    const OPCODE: Opcode = Opcode::PGMSG_PING;

    fn write(&self, packet: &mut Packet) {
        packet.set_integer(self.timestamp as i32);
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            timestamp: reader.unsigned("timestamp")?,
        })
    }
}

/// `GPMSG_PONG`: echo of a ping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pong {
    /// Timestamp copied from the ping.
    pub timestamp: u32,
}

impl Message for Pong {
    const OPCODE: Opcode = Opcode::GPMSG_PONG;

    fn write(&self, packet: &mut Packet) {
        packet.set_integer(self.timestamp as i32);
    }

    fn read(reader: &mut FieldReader<'_>) -> ProtocolResult<Self> {
        Ok(Self {
            timestamp: reader.unsigned("timestamp")?,
        })
    }
}
