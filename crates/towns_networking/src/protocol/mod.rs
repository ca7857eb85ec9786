//! # Protocol
//!
//! Wire contract shared with the account and game servers.
//!
//! ## Conversation
//!
//! ```text
//! CLIENT                     ACCOUNT SERVER
//!   |--- PAMSG_CONNECT ---------->|
//!   |<-- APMSG_CONNECT_RESPONSE --|
//!   |--- PAMSG_LOGIN ------------>|
//!   |<-- APMSG_LOGIN_RESPONSE ----|
//!   |--- PAMSG_CHAR_LIST -------->|
//!   |<-- APMSG_CHAR_LIST_RESP. ---|
//!   |--- PAMSG_CHAR_CHOOSE ------>|
//!   |<-- APMSG_CHAR_CHOOSE_RESP. -|
//!   |<-- APMSG_GAME_SERVER -------|  (hostname, port, tag)
//!
//! CLIENT                     GAME SERVER
//!   |--- PGMSG_CONNECT ---------->|  (player id, tag)
//!   |<-- GPMSG_CONNECT_RESPONSE --|
//!   |<-- GPMSG_LOAD_MAP ----------|
//!   |--- PGMSG_MAP_LOADED ------->|
//!   |<-- GPMSG_WARPTO / MOVE / ...|
//! ```

pub mod errors;
pub mod messages;
pub mod opcodes;
pub mod packet;

pub use errors::{
    map_load_failed_message, unknown_error_message, ErrorCode, MSG_ACCOUNT_NAME_TAKEN,
    MSG_CHARACTER_NAME_TAKEN, MSG_INVALID_CHARACTER, MSG_INVALID_CREDENTIALS, MSG_INVALID_EMAIL,
    MSG_INVALID_PASSWORD, MSG_INVALID_TAG, MSG_INVALID_USERNAME, MSG_INVALID_VERSION,
    MSG_TOO_MANY_CHARACTERS,
};
pub use messages::{
    CharChooseRequest, CharChooseResponse, CharCreateRequest, CharCreateResponse,
    CharDeleteRequest, CharDeleteResponse, CharListRequest, CharListResponse, ChatMessage,
    ConnectRequest, ConnectResponse, FieldReader, GameConnectRequest, GameConnectResponse,
    GameServerInfo, LoadMap, LoginRequest, LoginResponse, MapLoaded, Message, Ping,
    PlayerInfoRequest, PlayerInfoResponse, PlayerLeft, PlayerMove, Pong, RegisterRequest,
    RegisterResponse, SayRequest, WalkRequest, WarpTo,
};
pub use opcodes::{Opcode, Origin};
pub use packet::{Packet, PacketError, DEFAULT_CAPACITY, OPCODE_SIZE};

/// Protocol version sent in `PAMSG_CONNECT`.
pub const CLIENT_VERSION: u32 = 1;
