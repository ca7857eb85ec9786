//! # Opcode Table
//!
//! Every message type of the account and game server conversations.
//!
//! Naming: `P*` = player (client) originated, `A*` = account server
//! originated, `G*` = game server originated. Values are fixed by the
//! table below; nothing relies on a response being `request + 1`.

use std::fmt;

/// Which side of the conversation sends a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    /// Sent by the client.
    Client,
    /// Sent by the account server.
    AccountServer,
    /// Sent by the game server.
    GameServer,
}

macro_rules! opcodes {
    ($( $(#[$doc:meta])* $name:ident = $value:literal, $origin:ident; )*) => {
        /// Protocol message type.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u32)]
        #[allow(non_camel_case_types)]
        pub enum Opcode {
            $( $(#[$doc])* $name = $value, )*
        }

        impl Opcode {
            /// Every opcode in the table.
            pub const ALL: &'static [Opcode] = &[$(Opcode::$name),*];

            /// Looks up a raw opcode. `None` for values outside the table.
            #[must_use]
            pub const fn from_u32(value: u32) -> Option<Self> {
                match value {
                    $( $value => Some(Opcode::$name), )*
                    _ => None,
                }
            }

            /// Returns the side that sends this message.
            #[must_use]
            pub const fn origin(self) -> Origin {
                match self {
                    $( Opcode::$name => Origin::$origin, )*
                }
            }

            /// Returns the protocol name, e.g. `APMSG_LOGIN_RESPONSE`.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $( Opcode::$name => stringify!($name), )*
                }
            }
        }
    };
}

opcodes! {
    /// int version
    PAMSG_CONNECT = 0x0001, Client;
    /// byte error, [string update host]
    APMSG_CONNECT_RESPONSE = 0x0002, AccountServer;
    /// cstring username, cstring password hash, string email
    PAMSG_REGISTER = 0x0003, Client;
    /// byte error
    APMSG_REGISTER_RESPONSE = 0x0004, AccountServer;
    /// cstring username, string password hash
    PAMSG_LOGIN = 0x0005, Client;
    /// byte error
    APMSG_LOGIN_RESPONSE = 0x0006, AccountServer;
    /// no fields
    PAMSG_CHAR_LIST = 0x0007, Client;
    /// byte count, then per character: int id, byte slot, cstring name,
    /// byte gender, byte hair style, byte hair color, byte level, byte rights
    APMSG_CHAR_LIST_RESPONSE = 0x0008, AccountServer;
    /// cstring name, byte gender, byte hair style, byte hair color
    PAMSG_CHAR_CREATE = 0x0009, Client;
    /// byte error, on success: int id, byte slot
    APMSG_CHAR_CREATE_RESPONSE = 0x000A, AccountServer;
    /// byte slot
    PAMSG_CHAR_CHOOSE = 0x000B, Client;
    /// byte error, on success: int player id
    APMSG_CHAR_CHOOSE_RESPONSE = 0x000C, AccountServer;
    /// cstring hostname, int port, int tag
    APMSG_GAME_SERVER = 0x000D, AccountServer;
    /// byte slot
    PAMSG_CHAR_DELETE = 0x000E, Client;
    /// byte error
    APMSG_CHAR_DELETE_RESPONSE = 0x000F, AccountServer;
    /// int player id, int tag
    PGMSG_CONNECT = 0x0101, Client;
    /// byte error
    GPMSG_CONNECT_RESPONSE = 0x0102, GameServer;
    /// string map name
    GPMSG_LOAD_MAP = 0x0103, GameServer;
    /// no fields
    PGMSG_MAP_LOADED = 0x0104, Client;
    /// int x, int y
    GPMSG_WARPTO = 0x0105, GameServer;
    /// int id, int x, int y, byte direction
    GPMSG_PLAYER_MOVE = 0x0106, GameServer;
    /// int id
    PGMSG_PLAYER_INFO = 0x0107, Client;
    /// int id, cstring name, byte gender, byte hair style, byte hair color,
    /// byte level, byte rights
    GPMSG_PLAYER_INFO_RESPONSE = 0x0108, GameServer;
    /// int id
    GPMSG_PLAYER_LEFT = 0x0109, GameServer;
    /// int x, int y
    PGMSG_WALK = 0x010A, Client;
    /// string text
    PGMSG_SAY = 0x010B, Client;
    /// int speaker id (0 = server), string text
    GPMSG_CHAT = 0x010C, GameServer;
    /// int timestamp in milliseconds
    PGMSG_PING = 0x010D, Client;
    /// int echoed timestamp
    GPMSG_PONG = 0x010E, GameServer;
}

impl From<Opcode> for u32 {
    fn from(opcode: Opcode) -> Self {
        opcode as u32
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:04X})", self.name(), *self as u32)
    }
}
