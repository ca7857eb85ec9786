//! # TOWNS Networking
//!
//! Client side of the Small Towns account and game server protocol.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │ NetworkManager   opcode table ─> GameStates / UserInterface │
//! │                                  / BeingRegistry            │
//! ├────────────────────────────────────────────────────────────┤
//! │ Host             transport events <-> Packet FIFO           │
//! ├────────────────────────────────────────────────────────────┤
//! │ Transport        UdpTransport (reliable, ordered) │ Loopback│
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **Protocol**: 4-byte big-endian opcode, then fields in opcode order
//! - **Transport**: UDP with acknowledgements, resends and in-order release
//! - **Dispatch**: one handler per server opcode; unknown opcodes are logged
//!   and ignored, never fatal
//! - **Threading**: none. Everything runs from the game loop and nothing
//!   blocks
//!
//! ## Example
//!
//! ```rust,no_run
//! use towns_core::BeingManager;
//! use towns_networking::{
//!     ClientConfig, MockGameStates, MockUserInterface, NetworkManager, UdpTransport,
//! };
//!
//! let config = ClientConfig::default();
//! let mut network = NetworkManager::new(
//!     UdpTransport::new(config.transport.clone()),
//!     &config,
//!     MockGameStates::new(),
//!     MockUserInterface::new(),
//!     BeingManager::new(),
//! );
//!
//! network.connect_default();
//! loop {
//!     network.process();
//!     if network.is_connected() {
//!         network.send_version();
//!         break;
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod host;
pub mod integration;
pub mod protocol;
pub mod transport;

// Re-exports for convenience
pub use client::{
    ConnectWatchdog, GameServerAddress, NetworkManager, Phase, WatchdogStatus,
};
pub use config::{AccountServerConfig, ClientConfig, TransportConfig};
pub use error::{ConfigError, ProtocolError, TransportError};
pub use host::Host;
pub use integration::{
    BeingCall, BeingRegistry, ClientState, GameStates, MockBeingRegistry, MockGameStates,
    MockUserInterface, PasswordHasher, UserInterface,
};
pub use protocol::{ErrorCode, Message, Opcode, Origin, Packet, PacketError, CLIENT_VERSION};
pub use transport::{
    LoopbackServer, LoopbackTransport, Transport, TransportEvent, TransportStats, UdpTransport,
};
