//! # Packet Codec
//!
//! A growable byte buffer carrying one message: a 4-byte opcode followed by
//! fields in the order the opcode defines.
//!
//! ## Wire Layout
//!
//! ```text
//! ┌────────────────────┬──────────────────────────────────────────┐
//! │ Opcode (4, BE)     │ Fields (opcode-defined order)            │
//! └────────────────────┴──────────────────────────────────────────┘
//!
//! byte    : 1 byte
//! integer : 4 bytes, big-endian, signed
//! string  : raw bytes, no length prefix, no terminator; a reader stops at
//!           a nul byte or at the end of the buffer
//! ```
//!
//! Strings followed by further fields are written with
//! [`Packet::set_terminated_string`] so the reader can find their end.

use thiserror::Error;

/// Default body capacity of an outbound packet in bytes.
pub const DEFAULT_CAPACITY: usize = 255;

/// Size of the opcode prefix in bytes.
pub const OPCODE_SIZE: usize = 4;

/// Errors produced while building a packet from wire bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PacketError {
    /// Fewer bytes than the opcode prefix.
    #[error("packet truncated: {len} bytes, need at least {OPCODE_SIZE}")]
    Truncated {
        /// Bytes received.
        len: usize,
    },
}

/// One protocol message.
///
/// A packet has exactly one owner: it is built, then either sent (which
/// consumes it) or dispatched and dropped.
#[derive(Debug, PartialEq, Eq)]
pub struct Packet {
    /// Raw opcode, kept raw so unknown opcodes survive decoding.
    opcode: u32,
    /// Full wire image, opcode prefix included.
    data: Vec<u8>,
    /// Read position within `data`.
    cursor: usize,
}

impl Packet {
    /// Creates an empty outbound packet for `opcode`.
    #[must_use]
    pub fn new(opcode: impl Into<u32>) -> Self {
        let opcode = opcode.into();
        let mut data = Vec::with_capacity(OPCODE_SIZE + DEFAULT_CAPACITY);
        data.extend_from_slice(&opcode.to_be_bytes());
        Self {
            opcode,
            data,
            cursor: OPCODE_SIZE,
        }
    }

    /// Creates an inbound packet from wire bytes, consuming the opcode.
    pub fn from_wire(bytes: &[u8]) -> Result<Self, PacketError> {
        if bytes.len() < OPCODE_SIZE {
            return Err(PacketError::Truncated { len: bytes.len() });
        }
        let opcode = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        Ok(Self {
            opcode,
            data: bytes.to_vec(),
            cursor: OPCODE_SIZE,
        })
    }

    /// Returns the raw opcode.
    #[inline]
    #[must_use]
    pub const fn opcode(&self) -> u32 {
        self.opcode
    }

    /// Returns the wire image (opcode and fields).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Returns the wire length in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the packet carries no fields.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.len() == OPCODE_SIZE
    }

    /// Returns the allocated buffer capacity in bytes.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    /// Returns the number of unread bytes.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.cursor)
    }

    /// Grows the buffer so `additional` more bytes fit.
    ///
    /// Capacity doubles, or jumps straight to the required size when
    /// doubling is not enough.
    fn reserve(&mut self, additional: usize) {
        let required = self.data.len() + additional;
        let capacity = self.data.capacity();
        if required <= capacity {
            return;
        }
        let target = (capacity * 2).max(required);
        self.data.reserve_exact(target - self.data.len());
    }

    /// Reads one byte. `None` when no byte is left.
    pub fn get_byte(&mut self) -> Option<u8> {
        let value = *self.data.get(self.cursor)?;
        self.cursor += 1;
        Some(value)
    }

    /// Appends one byte.
    pub fn set_byte(&mut self, value: u8) {
        self.reserve(1);
        self.data.push(value);
    }

    /// Reads a big-endian 32-bit integer. `None` when fewer than 4 bytes
    /// are left; the cursor does not move in that case.
    pub fn get_integer(&mut self) -> Option<i32> {
        let end = self.cursor.checked_add(4)?;
        let bytes = self.data.get(self.cursor..end)?;
        let value = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        self.cursor = end;
        Some(value)
    }

    /// Appends a big-endian 32-bit integer.
    pub fn set_integer(&mut self, value: i32) {
        self.reserve(4);
        self.data.extend_from_slice(&value.to_be_bytes());
    }

    /// Reads a string up to a nul byte or the end of the buffer.
    ///
    /// The cursor moves past the nul. Returns `None` only when no byte is
    /// left, so an empty trailing string reads as `None`.
    pub fn get_string(&mut self) -> Option<String> {
        let rest = self.data.get(self.cursor..).filter(|rest| !rest.is_empty())?;
        let (text, consumed) = match rest.iter().position(|&b| b == 0) {
            Some(nul) => (&rest[..nul], nul + 1),
            None => (rest, rest.len()),
        };
        let text = String::from_utf8_lossy(text).into_owned();
        self.cursor += consumed;
        Some(text)
    }

    /// Appends a string's bytes verbatim, without terminator.
    pub fn set_string(&mut self, value: &str) {
        self.reserve(value.len());
        self.data.extend_from_slice(value.as_bytes());
    }

    /// Appends a string followed by a nul byte.
    pub fn set_terminated_string(&mut self, value: &str) {
        self.reserve(value.len() + 1);
        self.data.extend_from_slice(value.as_bytes());
        self.data.push(0);
    }
}
