//! # Loopback Transport
//!
//! In-process transport for deterministic tests and tooling. The client end
//! implements [`Transport`]; the [`LoopbackServer`] handle plays the remote
//! peer: it decides whether connects succeed, injects inbound messages, and
//! collects everything the client sent.
//!
//! ```text
//! LoopbackTransport                     LoopbackServer
//!   send() ───── crossbeam channel ────> received()
//!   service() <── crossbeam channel ──── send() / close()
//!        └──── Arc<Mutex<LinkShared>> ────┘  (accepting, connects)
//! ```

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::debug;

use super::{Transport, TransportEvent};
use crate::error::TransportError;
use crate::protocol::{Message, Packet};

/// Frames travelling from the server handle to the client.
#[derive(Debug)]
enum ServerFrame {
    /// One message.
    Data(Vec<u8>),
    /// Server closed the connection.
    Close,
}

/// State visible to both ends.
#[derive(Debug)]
struct LinkShared {
    /// Whether connect attempts succeed.
    accepting: bool,
    /// Whether the client end is connected.
    connected: bool,
    /// Every address the client tried to connect to.
    connects: Vec<SocketAddr>,
    /// Number of client-initiated disconnects.
    disconnects: usize,
}

/// Client end of an in-memory link.
pub struct LoopbackTransport {
    shared: Arc<Mutex<LinkShared>>,
    to_server: Sender<Vec<u8>>,
    from_server: Receiver<ServerFrame>,
    events: VecDeque<TransportEvent>,
    connected: bool,
}

/// Server end of an in-memory link.
pub struct LoopbackServer {
    shared: Arc<Mutex<LinkShared>>,
    from_client: Receiver<Vec<u8>>,
    to_client: Sender<ServerFrame>,
}

impl LoopbackTransport {
    /// Creates a connected pair of ends. Connect attempts succeed until
    /// [`LoopbackServer::set_accepting`] says otherwise.
    #[must_use]
    pub fn pair() -> (Self, LoopbackServer) {
        let (to_server, from_client) = unbounded();
        let (to_client, from_server) = unbounded();
        let shared = Arc::new(Mutex::new(LinkShared {
            accepting: true,
            connected: false,
            connects: Vec::new(),
            disconnects: 0,
        }));
        let client = Self {
            shared: Arc::clone(&shared),
            to_server,
            from_server,
            events: VecDeque::new(),
            connected: false,
        };
        let server = LoopbackServer {
            shared,
            from_client,
            to_client,
        };
        (client, server)
    }

    fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
        self.shared.lock().connected = connected;
    }
}

impl Transport for LoopbackTransport {
    fn connect(&mut self, addr: SocketAddr) -> Result<(), TransportError> {
        let accepting = {
            let mut shared = self.shared.lock();
            shared.connects.push(addr);
            shared.accepting
        };
        if accepting {
            self.set_connected(true);
            self.events.push_back(TransportEvent::Connected);
        } else {
            debug!("Loopback refusing connect to {}", addr);
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.set_connected(false);
        self.shared.lock().disconnects += 1;
        self.events.clear();
        self.events.push_back(TransportEvent::Disconnected);
    }

    fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.to_server
            .send(payload.to_vec())
            .map_err(|_| TransportError::NotConnected)
    }

    fn service(&mut self) -> Option<TransportEvent> {
        if let Some(event) = self.events.pop_front() {
            return Some(event);
        }
        while let Ok(frame) = self.from_server.try_recv() {
            match frame {
                ServerFrame::Data(bytes) if self.connected => {
                    return Some(TransportEvent::Received(bytes));
                }
                ServerFrame::Data(bytes) => {
                    debug!("Loopback dropping {} bytes while disconnected", bytes.len());
                }
                ServerFrame::Close if self.connected => {
                    self.set_connected(false);
                    return Some(TransportEvent::Disconnected);
                }
                ServerFrame::Close => {}
            }
        }
        None
    }
}

impl LoopbackServer {
    /// Controls whether future connect attempts succeed.
    pub fn set_accepting(&self, accepting: bool) {
        self.shared.lock().accepting = accepting;
    }

    /// Returns true while the client end is connected.
    #[must_use]
    pub fn is_client_connected(&self) -> bool {
        self.shared.lock().connected
    }

    /// Returns every address the client tried to connect to, oldest first.
    #[must_use]
    pub fn connect_requests(&self) -> Vec<SocketAddr> {
        self.shared.lock().connects.clone()
    }

    /// Returns the number of client-initiated disconnects.
    #[must_use]
    pub fn disconnect_count(&self) -> usize {
        self.shared.lock().disconnects
    }

    /// Queues raw bytes for the client.
    pub fn send(&self, bytes: &[u8]) {
        // Client end dropped: nothing left to deliver to.
        let _ = self.to_client.send(ServerFrame::Data(bytes.to_vec()));
    }

    /// Encodes and queues a message for the client.
    pub fn send_message<M: Message>(&self, message: &M) {
        self.send(message.encode().as_bytes());
    }

    /// Closes the connection from the server side.
    pub fn close(&self) {
        let _ = self.to_client.send(ServerFrame::Close);
    }

    /// Drains the raw messages the client sent.
    #[must_use]
    pub fn received_bytes(&self) -> Vec<Vec<u8>> {
        self.from_client.try_iter().collect()
    }

    /// Drains the client's messages as packets, skipping unparsable ones.
    #[must_use]
    pub fn received(&self) -> Vec<Packet> {
        self.from_client
            .try_iter()
            .filter_map(|bytes| Packet::from_wire(&bytes).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:9601".parse().unwrap()
    }

    #[test]
    fn test_connect_and_exchange() {
        let (mut client, server) = LoopbackTransport::pair();
        client.connect(addr()).unwrap();
        assert_eq!(client.service(), Some(TransportEvent::Connected));
        assert!(server.is_client_connected());

        client.send(&[0, 0, 0, 1]).unwrap();
        assert_eq!(server.received_bytes(), vec![vec![0, 0, 0, 1]]);

        server.send(&[0, 0, 0, 2]);
        assert_eq!(
            client.service(),
            Some(TransportEvent::Received(vec![0, 0, 0, 2]))
        );
        assert_eq!(client.service(), None);
    }

    #[test]
    fn test_refused_connect_is_silent() {
        let (mut client, server) = LoopbackTransport::pair();
        server.set_accepting(false);
        client.connect(addr()).unwrap();
        assert_eq!(client.service(), None);
        assert_eq!(server.connect_requests(), vec![addr()]);
        assert!(matches!(
            client.send(&[1]),
            Err(TransportError::NotConnected)
        ));
    }

    #[test]
    fn test_disconnect_observed_on_next_service() {
        let (mut client, server) = LoopbackTransport::pair();
        client.connect(addr()).unwrap();
        client.service();

        client.disconnect();
        assert!(!server.is_client_connected());
        assert_eq!(server.disconnect_count(), 1);
        assert_eq!(client.service(), Some(TransportEvent::Disconnected));

        client.disconnect();
        assert_eq!(server.disconnect_count(), 1);
    }

    #[test]
    fn test_server_close() {
        let (mut client, server) = LoopbackTransport::pair();
        client.connect(addr()).unwrap();
        client.service();
        server.close();
        assert_eq!(client.service(), Some(TransportEvent::Disconnected));
        assert!(!server.is_client_connected());
    }
}
