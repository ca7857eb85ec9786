//! # Host
//!
//! Turns transport events into [`Packet`]s and back.
//!
//! ```text
//! Transport::service() ──┬─ Connected ─────> connected = true
//!                        ├─ Received(bytes) ─> Packet::from_wire ─> queue
//!                        └─ Disconnected ──> connected = false
//!
//! get_packet() <── queue (FIFO, each packet returned once)
//! send_packet(Packet) ──> Transport::send(packet.as_bytes())
//! ```
//!
//! Nothing here raises to the caller. Resolution failures, refused
//! connections and lost peers all show up as `is_connected() == false`.

use std::collections::VecDeque;
use std::net::{SocketAddr, ToSocketAddrs};

use tracing::{debug, info, warn};

use crate::protocol::Packet;
use crate::transport::{Transport, TransportEvent};

/// A single-peer packet endpoint.
pub struct Host<T: Transport> {
    /// Underlying transport.
    transport: T,
    /// Address of the current or last connection attempt.
    peer: Option<SocketAddr>,
    /// Packets received but not yet taken.
    incoming: VecDeque<Packet>,
    /// Last-known connection state.
    connected: bool,
}

impl<T: Transport> Host<T> {
    /// Creates a disconnected host over `transport`.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            peer: None,
            incoming: VecDeque::new(),
            connected: false,
        }
    }

    /// Starts connecting to `hostname:port`.
    ///
    /// Closes any current connection first. A name that does not resolve is
    /// logged and the attempt simply never completes.
    pub fn connect(&mut self, hostname: &str, port: u16) {
        if self.connected {
            self.disconnect();
            self.process();
        }

        let addr = match resolve(hostname, port) {
            Some(addr) => addr,
            None => {
                warn!("Could not resolve {}:{}", hostname, port);
                return;
            }
        };

        info!("Connecting to {}:{} ({})", hostname, port, addr);
        self.peer = Some(addr);
        if let Err(e) = self.transport.connect(addr) {
            warn!("Connect to {} failed: {}", addr, e);
        }
    }

    /// Pumps the transport until it has nothing more to report.
    pub fn process(&mut self) {
        while let Some(event) = self.transport.service() {
            match event {
                TransportEvent::Connected => {
                    debug!("Transport connected to {:?}", self.peer);
                    self.connected = true;
                }
                TransportEvent::Received(bytes) => match Packet::from_wire(&bytes) {
                    Ok(packet) => self.incoming.push_back(packet),
                    Err(e) => warn!("Dropping datagram: {}", e),
                },
                TransportEvent::Disconnected => {
                    debug!("Transport disconnected from {:?}", self.peer);
                    self.connected = false;
                }
            }
        }
    }

    /// Takes the oldest received packet.
    pub fn get_packet(&mut self) -> Option<Packet> {
        self.incoming.pop_front()
    }

    /// Sends a packet as one reliable message. The packet is consumed
    /// whether or not sending succeeds.
    pub fn send_packet(&mut self, packet: Packet) {
        if let Err(e) = self.transport.send(packet.as_bytes()) {
            warn!("Failed to send opcode 0x{:04X}: {}", packet.opcode(), e);
        }
    }

    /// Returns the last-known connection state.
    #[inline]
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Starts closing the connection; the next [`Host::process`] observes
    /// it. Packets queued from the closed connection are discarded.
    pub fn disconnect(&mut self) {
        if !self.incoming.is_empty() {
            debug!("Discarding {} unread packets", self.incoming.len());
            self.incoming.clear();
        }
        self.transport.disconnect();
    }

    /// Returns the address of the current or last connection attempt.
    #[inline]
    #[must_use]
    pub const fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Returns the number of packets waiting in the queue.
    #[inline]
    #[must_use]
    pub fn queued(&self) -> usize {
        self.incoming.len()
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the transport mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

/// Resolves a host name, preferring IPv4.
fn resolve(hostname: &str, port: u16) -> Option<SocketAddr> {
    let addrs: Vec<SocketAddr> = (hostname, port).to_socket_addrs().ok()?.collect();
    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LoopbackTransport;

    #[test]
    fn test_connect_observed_after_process() {
        let (transport, server) = LoopbackTransport::pair();
        let mut host = Host::new(transport);
        host.connect("127.0.0.1", 9601);
        assert!(!host.is_connected());

        host.process();
        assert!(host.is_connected());
        assert_eq!(server.connect_requests(), vec!["127.0.0.1:9601".parse().unwrap()]);
        assert_eq!(host.peer(), Some("127.0.0.1:9601".parse().unwrap()));
    }

    #[test]
    fn test_unresolvable_host_absorbed() {
        let (transport, server) = LoopbackTransport::pair();
        let mut host = Host::new(transport);
        host.connect("host.invalid", 9601);
        host.process();
        assert!(!host.is_connected());
        assert!(server.connect_requests().is_empty());
    }

    #[test]
    fn test_short_datagram_dropped() {
        let (transport, server) = LoopbackTransport::pair();
        let mut host = Host::new(transport);
        host.connect("127.0.0.1", 9601);
        host.process();

        server.send(&[0, 1]);
        server.send(&[0, 0, 0, 9]);
        host.process();

        assert_eq!(host.queued(), 1);
        assert_eq!(host.get_packet().map(|p| p.opcode()), Some(9));
        assert!(host.get_packet().is_none());
    }

    #[test]
    fn test_send_while_disconnected_consumes_packet() {
        let (transport, server) = LoopbackTransport::pair();
        let mut host = Host::new(transport);
        host.send_packet(Packet::new(1_u32));
        assert!(server.received().is_empty());
    }

    #[test]
    fn test_disconnect_needs_process() {
        let (transport, server) = LoopbackTransport::pair();
        let mut host = Host::new(transport);
        host.connect("127.0.0.1", 9601);
        host.process();

        host.disconnect();
        assert!(host.is_connected());
        host.process();
        assert!(!host.is_connected());
        assert_eq!(server.disconnect_count(), 1);
    }

    #[test]
    fn test_disconnect_discards_unread_packets() {
        let (transport, server) = LoopbackTransport::pair();
        let mut host = Host::new(transport);
        host.connect("127.0.0.1", 9601);
        host.process();

        server.send(&[0, 0, 0, 1]);
        server.send(&[0, 0, 0, 2]);
        host.process();
        assert_eq!(host.queued(), 2);

        host.disconnect();
        assert_eq!(host.queued(), 0);
        host.connect("127.0.0.1", 9602);
        host.process();
        assert!(host.get_packet().is_none());
    }

    #[test]
    fn test_reconnect_reuses_host() {
        let (transport, server) = LoopbackTransport::pair();
        let mut host = Host::new(transport);
        host.connect("127.0.0.1", 9601);
        host.process();
        host.connect("127.0.0.1", 9602);
        host.process();

        assert!(host.is_connected());
        assert_eq!(server.disconnect_count(), 1);
        assert_eq!(server.connect_requests().len(), 2);
    }
}
