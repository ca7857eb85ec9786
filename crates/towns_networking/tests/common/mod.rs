//! Shared fixtures for the protocol integration tests.

#![allow(dead_code)]

use towns_networking::protocol::{CharChooseResponse, GameServerInfo, Message};
use towns_networking::{
    ClientConfig, ErrorCode, LoopbackServer, LoopbackTransport, MockBeingRegistry,
    MockGameStates, MockUserInterface, NetworkManager, Opcode, Packet,
};

/// Manager wired to loopback and recording mocks.
pub type TestManager =
    NetworkManager<LoopbackTransport, MockGameStates, MockUserInterface, MockBeingRegistry>;

/// Player id handed out by [`select_character`].
pub const PLAYER_ID: u32 = 77;

/// Handoff tag handed out by [`hand_off`].
pub const TAG: u32 = 0x00C0_FFEE;

/// Game server port used by [`hand_off`].
pub const GAME_PORT: u16 = 9602;

/// Creates a manager connected to the account server.
pub fn connected(config: &ClientConfig) -> (TestManager, LoopbackServer) {
    let (transport, server) = LoopbackTransport::pair();
    let mut manager = NetworkManager::new(
        transport,
        config,
        MockGameStates::new(),
        MockUserInterface::new(),
        MockBeingRegistry::new(),
    );
    manager.connect("127.0.0.1", 9601);
    manager.process();
    assert!(manager.is_connected());
    (manager, server)
}

/// Creates a connected manager with the default configuration.
pub fn connected_default() -> (TestManager, LoopbackServer) {
    connected(&ClientConfig::default())
}

/// Delivers one server message and processes it.
pub fn deliver<M: Message>(manager: &mut TestManager, server: &LoopbackServer, message: &M) {
    server.send_message(message);
    manager.process();
}

/// Raw opcodes of the packets the client sent since the last drain.
pub fn sent_opcodes(server: &LoopbackServer) -> Vec<u32> {
    server.received().iter().map(Packet::opcode).collect()
}

/// Takes the first sent packet with `opcode`.
pub fn take_sent(server: &LoopbackServer, opcode: Opcode) -> Option<Packet> {
    server
        .received()
        .into_iter()
        .find(|p| p.opcode() == u32::from(opcode))
}

/// Runs the character choice so a player id is known.
pub fn select_character(manager: &mut TestManager, server: &LoopbackServer) {
    manager.choose_character(0);
    deliver(
        manager,
        server,
        &CharChooseResponse {
            error: ErrorCode::None,
            player_id: Some(PLAYER_ID),
        },
    );
    let _ = server.received();
}

/// Runs the handoff to the game server and the game connect.
pub fn hand_off(manager: &mut TestManager, server: &LoopbackServer) {
    select_character(manager, server);
    deliver(
        manager,
        server,
        &GameServerInfo {
            hostname: "127.0.0.1".into(),
            port: GAME_PORT,
            tag: TAG,
        },
    );
    manager.process();
    assert!(manager.is_connected());
}
