//! # Networking Error Types
//!
//! Errors of the transport, protocol decoding, and configuration layers.
//!
//! None of these reach the user directly: transport failures surface as
//! `is_connected()` flips and protocol failures are logged and dropped.
//! User-visible text comes only from server error codes
//! (see [`crate::protocol::ErrorCode`]).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while decoding a message's fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The packet ended before a required field.
    #[error("opcode 0x{opcode:04X}: missing field `{field}`")]
    MissingField {
        /// Raw opcode of the packet.
        opcode: u32,
        /// Field name.
        field: &'static str,
    },

    /// A field held a value outside its domain.
    #[error("opcode 0x{opcode:04X}: invalid value {value} for field `{field}`")]
    InvalidField {
        /// Raw opcode of the packet.
        opcode: u32,
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: i64,
    },
}

/// Errors raised by a transport.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Socket could not be created or configured.
    #[error("failed to bind socket: {0}")]
    Bind(#[source] io::Error),

    /// Operation needs a connected peer.
    #[error("not connected")]
    NotConnected,

    /// Payload exceeds the frame size.
    #[error("payload of {len} bytes exceeds the {max} byte limit")]
    PayloadTooLarge {
        /// Payload length.
        len: usize,
        /// Maximum payload length.
        max: usize,
    },

    /// Socket-level send failure.
    #[error("send failed: {0}")]
    Send(#[source] io::Error),
}

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Config text is not valid TOML for the schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for protocol decoding.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
