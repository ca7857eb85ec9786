//! # Protocol Error Codes
//!
//! The single-byte error taxonomy carried as the first field of most
//! `*_RESPONSE` messages, and the user-facing text for each.
//!
//! The server is authoritative: the client reports exactly what the code
//! says and never guesses a finer cause.

use std::fmt;

/// Error byte of a response message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Success.
    None,
    /// Client version rejected.
    InvalidVersion,
    /// Username malformed or unknown.
    InvalidUsername,
    /// Password malformed or wrong.
    InvalidPassword,
    /// Email malformed.
    InvalidEmail,
    /// Account or character name already in use.
    TakenName,
    /// Account has no free character slot.
    TooManyCharacters,
    /// Character name or slot invalid.
    InvalidCharacter,
    /// Handoff tag unknown or expired.
    InvalidTag,
    /// A byte outside the table.
    Unknown(u8),
}

impl ErrorCode {
    /// Decodes an error byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0 => Self::None,
            1 => Self::InvalidVersion,
            2 => Self::InvalidUsername,
            3 => Self::InvalidPassword,
            4 => Self::InvalidEmail,
            5 => Self::TakenName,
            6 => Self::TooManyCharacters,
            7 => Self::InvalidCharacter,
            8 => Self::InvalidTag,
            other => Self::Unknown(other),
        }
    }

    /// Returns the wire byte.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::None => 0,
            Self::InvalidVersion => 1,
            Self::InvalidUsername => 2,
            Self::InvalidPassword => 3,
            Self::InvalidEmail => 4,
            Self::TakenName => 5,
            Self::TooManyCharacters => 6,
            Self::InvalidCharacter => 7,
            Self::InvalidTag => 8,
            Self::Unknown(byte) => byte,
        }
    }

    /// Returns true for the success code.
    #[inline]
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("ERR_NONE"),
            Self::InvalidVersion => f.write_str("ERR_INVALID_VERSION"),
            Self::InvalidUsername => f.write_str("ERR_INVALID_USERNAME"),
            Self::InvalidPassword => f.write_str("ERR_INVALID_PASSWORD"),
            Self::InvalidEmail => f.write_str("ERR_INVALID_EMAIL"),
            Self::TakenName => f.write_str("ERR_TAKEN_NAME"),
            Self::TooManyCharacters => f.write_str("ERR_TOO_MANY_CHARACTERS"),
            Self::InvalidCharacter => f.write_str("ERR_INVALID_CHARACTER"),
            Self::InvalidTag => f.write_str("ERR_INVALID_TAG"),
            Self::Unknown(byte) => write!(f, "ERR_UNKNOWN({byte})"),
        }
    }
}

/// Shown when the account server rejects the client version.
pub const MSG_INVALID_VERSION: &str =
    "Your client is too old. Please update to the latest version.";
/// Shown for rejected login credentials.
pub const MSG_INVALID_CREDENTIALS: &str = "Invalid username or password.";
/// Shown when a registration picks an existing account name.
pub const MSG_ACCOUNT_NAME_TAKEN: &str = "This username is already taken.";
/// Shown when a registration username is malformed.
pub const MSG_INVALID_USERNAME: &str = "Invalid username.";
/// Shown when a registration password is malformed.
pub const MSG_INVALID_PASSWORD: &str = "Invalid password.";
/// Shown when a registration email is malformed.
pub const MSG_INVALID_EMAIL: &str = "Invalid email address.";
/// Shown when a new character picks an existing name.
pub const MSG_CHARACTER_NAME_TAKEN: &str = "This character name is already taken.";
/// Shown when the account has no free character slot.
pub const MSG_TOO_MANY_CHARACTERS: &str = "You cannot create any more characters.";
/// Shown for an invalid character name or slot.
pub const MSG_INVALID_CHARACTER: &str = "Invalid character.";
/// Shown when the game server rejects the handoff tag.
pub const MSG_INVALID_TAG: &str =
    "The game server rejected your session. Please log in again.";

/// Text for codes a given response does not document.
#[must_use]
pub fn unknown_error_message(code: ErrorCode) -> String {
    format!("Unknown server error (code {}).", code.as_byte())
}

/// Text for a map that failed to load.
#[must_use]
pub fn map_load_failed_message(map: &str) -> String {
    format!("Could not load map {map}.")
}
