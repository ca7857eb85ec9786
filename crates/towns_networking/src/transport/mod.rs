//! # Transport Layer
//!
//! Connection-oriented, reliable, ordered delivery of discrete messages.
//!
//! ## Design
//!
//! - One peer per transport; [`crate::host::Host`] sits on top
//! - Non-blocking: [`Transport::service`] returns at most one event and
//!   never waits
//! - Failures are events, not errors: a lost peer is a
//!   [`TransportEvent::Disconnected`], an unreachable one simply never
//!   produces [`TransportEvent::Connected`]
//!
//! Two implementations: [`UdpTransport`] for real sockets and
//! [`LoopbackTransport`] for in-process tests.

use std::net::SocketAddr;

use crate::error::TransportError;

pub mod loopback;
pub mod reliability;
pub mod udp;

pub use loopback::{LoopbackServer, LoopbackTransport};
pub use reliability::ReliabilityLayer;
pub use udp::{FrameKind, UdpTransport, FRAME_HEADER_SIZE, MAX_MESSAGE_SIZE, MAX_PAYLOAD_SIZE};

/// Something that happened on the connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake with the peer completed.
    Connected,
    /// One complete message, in send order.
    Received(Vec<u8>),
    /// Connection closed by either side or lost.
    Disconnected,
}

/// Reliable message transport to a single peer.
pub trait Transport {
    /// Starts connecting to `addr`. Completion is reported by
    /// [`Transport::service`].
    fn connect(&mut self, addr: SocketAddr) -> Result<(), TransportError>;

    /// Starts closing the connection. Safe to call mid-connect or when
    /// already disconnected.
    fn disconnect(&mut self);

    /// Queues one message for reliable, ordered delivery.
    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError>;

    /// Pumps the connection and returns the next event, if any.
    fn service(&mut self) -> Option<TransportEvent>;
}

/// Transport statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransportStats {
    /// Datagrams sent.
    pub packets_sent: u64,
    /// Datagrams received.
    pub packets_received: u64,
    /// Bytes sent.
    pub bytes_sent: u64,
    /// Bytes received.
    pub bytes_received: u64,
    /// Data frames resent after a timeout.
    pub resends: u64,
    /// Send errors.
    pub send_errors: u64,
    /// Receive errors, including malformed frames.
    pub recv_errors: u64,
}
