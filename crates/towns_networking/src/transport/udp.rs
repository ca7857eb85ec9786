//! # UDP Transport
//!
//! Reliable, ordered message delivery over a non-blocking `UdpSocket`.
//!
//! ## Frame Layout
//!
//! ```text
//! ┌───────────┬────────────────────┬──────────────────────────────┐
//! │ Kind (1)  │ Sequence (2, BE)   │ Payload (Data, Fragment)     │
//! └───────────┴────────────────────┴──────────────────────────────┘
//! ```
//!
//! A message longer than [`MAX_PAYLOAD_SIZE`] is split over consecutive
//! sequence numbers: `Fragment` frames followed by one closing `Data`
//! frame. Datagrams longer than [`MAX_DATAGRAM_SIZE`] are dropped unread.
//!
//! ## Handshake
//!
//! ```text
//! client                       listener
//!   |--- CONNECT -------------->|   resent every resend timeout,
//!   |<-- ACCEPT ----------------|   up to `connect_attempts` times
//!   |--- DATA n --------------->|
//!   |<-- ACK n -----------------|
//!   |--- DISCONNECT ----------->|
//! ```
//!
//! A client-mode transport binds a fresh ephemeral socket on every
//! [`Transport::connect`], so a reconnect never sees frames of the previous
//! connection.

use std::collections::VecDeque;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::Instant;

use tracing::{debug, info, warn};

use super::reliability::{Accepted, ReliabilityLayer, MAX_FRAGMENTS};
use super::{Transport, TransportEvent, TransportStats};
use crate::config::{TransportConfig, MAX_DATAGRAM_SIZE};
use crate::error::TransportError;

/// Size of the frame header in bytes.
pub const FRAME_HEADER_SIZE: usize = 3;

/// Largest payload a single data frame carries.
pub const MAX_PAYLOAD_SIZE: usize = MAX_DATAGRAM_SIZE - FRAME_HEADER_SIZE;

/// Largest message [`Transport::send`] accepts.
pub const MAX_MESSAGE_SIZE: usize = MAX_PAYLOAD_SIZE * MAX_FRAGMENTS;

/// Frame type byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameKind {
    /// Connection request.
    Connect = 1,
    /// Connection accepted.
    Accept = 2,
    /// Reliable payload.
    Data = 3,
    /// Acknowledges one data frame.
    Ack = 4,
    /// Connection closed.
    Disconnect = 5,
    /// Reliable payload continued by the next sequence number.
    Fragment = 6,
}

impl FrameKind {
    /// Decodes a kind byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Connect),
            2 => Some(Self::Accept),
            3 => Some(Self::Data),
            4 => Some(Self::Ack),
            5 => Some(Self::Disconnect),
            6 => Some(Self::Fragment),
            _ => None,
        }
    }
}

/// Encodes one frame.
#[must_use]
pub fn encode_frame(kind: FrameKind, sequence: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    frame.push(kind as u8);
    frame.extend_from_slice(&sequence.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Splits a datagram into kind, sequence, and payload.
#[must_use]
pub fn decode_frame(datagram: &[u8]) -> Option<(FrameKind, u16, &[u8])> {
    if datagram.len() < FRAME_HEADER_SIZE {
        return None;
    }
    let kind = FrameKind::from_byte(datagram[0])?;
    let sequence = u16::from_be_bytes([datagram[1], datagram[2]]);
    Some((kind, sequence, &datagram[FRAME_HEADER_SIZE..]))
}

/// Connection state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LinkState {
    /// No socket activity.
    Idle,
    /// Waiting for a peer's connect frame.
    Listening,
    /// Connect frame sent, waiting for accept.
    Connecting {
        /// Connect frames sent so far.
        attempts: u32,
        /// Time of the last connect frame.
        last_sent: Instant,
    },
    /// Handshake complete.
    Connected,
}

/// Reliable UDP transport to one peer.
pub struct UdpTransport {
    /// The underlying socket; client mode binds one per connect.
    socket: Option<UdpSocket>,
    /// Accepts a peer instead of connecting to one.
    listening: bool,
    /// Remote address.
    peer: Option<SocketAddr>,
    /// Connection state.
    state: LinkState,
    /// Sequencing and resends.
    reliability: ReliabilityLayer,
    /// Events not yet returned by `service`.
    events: VecDeque<TransportEvent>,
    /// Receive buffer, one byte longer than the largest valid datagram.
    recv_buffer: Vec<u8>,
    /// Tuning.
    config: TransportConfig,
    /// Statistics.
    stats: TransportStats,
}

impl UdpTransport {
    /// Creates a client-mode transport. No socket is bound until
    /// [`Transport::connect`].
    #[must_use]
    pub fn new(config: TransportConfig) -> Self {
        Self {
            socket: None,
            listening: false,
            peer: None,
            state: LinkState::Idle,
            reliability: ReliabilityLayer::new(config.resend_timeout(), config.max_resends),
            events: VecDeque::new(),
            recv_buffer: vec![0u8; config.recv_buffer_size.max(MAX_DATAGRAM_SIZE) + 1],
            config,
            stats: TransportStats::default(),
        }
    }

    /// Creates a transport bound to `addr` that accepts a single peer.
    pub fn listen(addr: SocketAddr, config: TransportConfig) -> Result<Self, TransportError> {
        let socket = bind_nonblocking(addr)?;
        info!(
            "Listening on {}",
            socket.local_addr().map_err(TransportError::Bind)?
        );
        let mut transport = Self::new(config);
        transport.socket = Some(socket);
        transport.listening = true;
        transport.state = LinkState::Listening;
        Ok(transport)
    }

    /// Returns the bound local address, if a socket is open.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    /// Returns the remote address.
    #[inline]
    #[must_use]
    pub const fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Returns true once the handshake completed.
    #[inline]
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(self.state, LinkState::Connected)
    }

    /// Returns true while a connect attempt is outstanding.
    #[inline]
    #[must_use]
    pub const fn is_connecting(&self) -> bool {
        matches!(self.state, LinkState::Connecting { .. })
    }

    /// Returns statistics.
    #[must_use]
    pub const fn stats(&self) -> &TransportStats {
        &self.stats
    }

    /// Resets statistics.
    pub fn reset_stats(&mut self) {
        self.stats = TransportStats::default();
    }

    /// Sends one frame to the peer.
    fn transmit(&mut self, frame: &[u8]) -> io::Result<()> {
        let (Some(socket), Some(peer)) = (self.socket.as_ref(), self.peer) else {
            return Err(io::ErrorKind::NotConnected.into());
        };
        match socket.send_to(frame, peer) {
            Ok(n) => {
                self.stats.packets_sent += 1;
                self.stats.bytes_sent += n as u64;
                Ok(())
            }
            Err(e) => {
                self.stats.send_errors += 1;
                Err(e)
            }
        }
    }

    /// Sends a header-only frame, logging failures.
    fn transmit_control(&mut self, kind: FrameKind, sequence: u16) {
        if let Err(e) = self.transmit(&encode_frame(kind, sequence, &[])) {
            debug!("Failed to send {:?} frame: {}", kind, e);
        }
    }

    /// Drops all per-connection state.
    fn reset_link(&mut self) {
        self.state = if self.listening {
            LinkState::Listening
        } else {
            LinkState::Idle
        };
        self.peer = None;
        self.reliability =
            ReliabilityLayer::new(self.config.resend_timeout(), self.config.max_resends);
        if !self.listening {
            self.socket = None;
        }
    }

    /// Reads every datagram waiting on the socket.
    fn pump(&mut self) {
        loop {
            let Some(socket) = self.socket.as_ref() else {
                return;
            };
            match socket.recv_from(&mut self.recv_buffer) {
                Ok((len, from)) => {
                    self.stats.packets_received += 1;
                    self.stats.bytes_received += len as u64;
                    if len > MAX_DATAGRAM_SIZE {
                        self.stats.recv_errors += 1;
                        debug!("Dropping oversized datagram from {}", from);
                        continue;
                    }
                    let datagram = self.recv_buffer[..len].to_vec();
                    self.handle_datagram(from, &datagram);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) => {
                    self.stats.recv_errors += 1;
                    debug!("Receive error: {}", e);
                    return;
                }
            }
        }
    }

    fn handle_datagram(&mut self, from: SocketAddr, datagram: &[u8]) {
        let Some((kind, sequence, payload)) = decode_frame(datagram) else {
            self.stats.recv_errors += 1;
            debug!("Dropping malformed frame of {} bytes from {}", datagram.len(), from);
            return;
        };

        if kind == FrameKind::Connect {
            self.handle_connect_request(from);
            return;
        }
        if self.peer != Some(from) {
            debug!("Ignoring {:?} frame from unknown address {}", kind, from);
            return;
        }

        match kind {
            FrameKind::Connect => {}
            FrameKind::Accept => {
                if self.is_connecting() {
                    self.state = LinkState::Connected;
                    info!("Connected to {}", from);
                    self.events.push_back(TransportEvent::Connected);
                }
            }
            FrameKind::Data | FrameKind::Fragment => {
                if !self.is_connected() {
                    return;
                }
                let last = kind == FrameKind::Data;
                match self.reliability.accept(sequence, payload.to_vec(), last) {
                    Accepted::Deliver(ready) => {
                        self.transmit_control(FrameKind::Ack, sequence);
                        self.events
                            .extend(ready.into_iter().map(TransportEvent::Received));
                    }
                    Accepted::Duplicate => self.transmit_control(FrameKind::Ack, sequence),
                    Accepted::OutOfWindow => {
                        debug!("Dropping data frame {} outside receive window", sequence);
                    }
                }
            }
            FrameKind::Ack => self.reliability.acknowledge(sequence),
            FrameKind::Disconnect => {
                let was_connected = self.is_connected();
                info!("Peer {} closed the connection", from);
                self.reset_link();
                if was_connected {
                    self.events.push_back(TransportEvent::Disconnected);
                }
            }
        }
    }

    fn handle_connect_request(&mut self, from: SocketAddr) {
        if !self.listening {
            return;
        }
        match self.state {
            LinkState::Listening => {
                self.peer = Some(from);
                self.state = LinkState::Connected;
                info!("Accepted peer {}", from);
                self.transmit_control(FrameKind::Accept, 0);
                self.events.push_back(TransportEvent::Connected);
            }
            // Our accept was lost; the peer is still knocking.
            LinkState::Connected if self.peer == Some(from) => {
                self.transmit_control(FrameKind::Accept, 0);
            }
            _ => {}
        }
    }

    /// Runs connect retries and data resends.
    fn tick(&mut self, now: Instant) {
        match self.state {
            LinkState::Connecting {
                attempts,
                last_sent,
            } => {
                if now.saturating_duration_since(last_sent) < self.config.resend_timeout() {
                    return;
                }
                if attempts >= self.config.connect_attempts {
                    info!(
                        "No answer from {:?} after {} connect attempts",
                        self.peer, attempts
                    );
                    self.reset_link();
                    return;
                }
                self.state = LinkState::Connecting {
                    attempts: attempts + 1,
                    last_sent: now,
                };
                self.transmit_control(FrameKind::Connect, 0);
            }
            LinkState::Connected => match self.reliability.due_resends(now) {
                Ok(frames) => {
                    for frame in frames {
                        self.stats.resends += 1;
                        if let Err(e) = self.transmit(&frame) {
                            debug!("Resend failed: {}", e);
                        }
                    }
                }
                Err(lost) => {
                    warn!(
                        "Peer {:?} lost: frame {} never acknowledged",
                        self.peer, lost.sequence
                    );
                    self.reset_link();
                    self.events.push_back(TransportEvent::Disconnected);
                }
            },
            LinkState::Idle | LinkState::Listening => {}
        }
    }
}

fn bind_nonblocking(addr: SocketAddr) -> Result<UdpSocket, TransportError> {
    let socket = UdpSocket::bind(addr).map_err(TransportError::Bind)?;
    socket.set_nonblocking(true).map_err(TransportError::Bind)?;
    Ok(socket)
}

impl Transport for UdpTransport {
    fn connect(&mut self, addr: SocketAddr) -> Result<(), TransportError> {
        if !matches!(self.state, LinkState::Idle | LinkState::Listening) {
            self.disconnect();
        }
        if !self.listening {
            let local: SocketAddr = if addr.is_ipv4() {
                (Ipv4Addr::UNSPECIFIED, 0).into()
            } else {
                (Ipv6Addr::UNSPECIFIED, 0).into()
            };
            self.socket = Some(bind_nonblocking(local)?);
        }
        self.peer = Some(addr);
        self.state = LinkState::Connecting {
            attempts: 1,
            last_sent: Instant::now(),
        };
        debug!("Connecting to {}", addr);
        self.transmit_control(FrameKind::Connect, 0);
        Ok(())
    }

    fn disconnect(&mut self) {
        let was_connected = self.is_connected();
        if was_connected {
            self.transmit_control(FrameKind::Disconnect, 0);
        }
        self.events.clear();
        self.reset_link();
        if was_connected {
            self.events.push_back(TransportEvent::Disconnected);
        }
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        if payload.len() > MAX_MESSAGE_SIZE {
            return Err(TransportError::PayloadTooLarge {
                len: payload.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }

        let chunks: Vec<&[u8]> = if payload.is_empty() {
            vec![payload]
        } else {
            payload.chunks(MAX_PAYLOAD_SIZE).collect()
        };
        let last_index = chunks.len() - 1;
        let mut failure = None;
        for (index, chunk) in chunks.into_iter().enumerate() {
            let kind = if index == last_index {
                FrameKind::Data
            } else {
                FrameKind::Fragment
            };
            let sequence = self.reliability.next_sequence();
            let frame = encode_frame(kind, sequence, chunk);
            let result = self.transmit(&frame);
            self.reliability.track(sequence, frame, Instant::now());
            // Still tracked; the resend timer retries it.
            if let Err(e) = result {
                if e.kind() != io::ErrorKind::WouldBlock {
                    failure.get_or_insert(e);
                }
            }
        }
        failure.map_or(Ok(()), |e| Err(TransportError::Send(e)))
    }

    fn service(&mut self) -> Option<TransportEvent> {
        if let Some(event) = self.events.pop_front() {
            return Some(event);
        }
        self.pump();
        self.tick(Instant::now());
        self.events.pop_front()
    }
}
