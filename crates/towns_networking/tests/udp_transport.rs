//! Reliable UDP transport over the local interface.

use std::thread;
use std::time::{Duration, Instant};

use towns_networking::protocol::{ChatMessage, ConnectRequest, ConnectResponse, Message, SayRequest};
use towns_networking::{
    ClientConfig, ErrorCode, Host, MockBeingRegistry, MockGameStates, MockUserInterface,
    NetworkManager, Opcode, Packet, Phase, Transport, TransportConfig, TransportEvent,
    UdpTransport, CLIENT_VERSION,
};

const DEADLINE: Duration = Duration::from_secs(5);

fn listener() -> (UdpTransport, u16) {
    let server = UdpTransport::listen("127.0.0.1:0".parse().unwrap(), TransportConfig::default())
        .unwrap();
    let port = server.local_addr().unwrap().port();
    (server, port)
}

/// Services the server and calls `poll` until it returns true.
fn pump_until(
    server: &mut UdpTransport,
    events: &mut Vec<TransportEvent>,
    mut poll: impl FnMut(&[TransportEvent]) -> bool,
) {
    let start = Instant::now();
    loop {
        while let Some(event) = server.service() {
            events.push(event);
        }
        if poll(events) {
            return;
        }
        assert!(start.elapsed() < DEADLINE, "timed out");
        thread::sleep(Duration::from_millis(1));
    }
}

fn payloads(events: &[TransportEvent]) -> Vec<Vec<u8>> {
    events
        .iter()
        .filter_map(|event| match event {
            TransportEvent::Received(bytes) => Some(bytes.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_handshake_and_ordered_delivery() {
    let (mut server, port) = listener();
    let mut host = Host::new(UdpTransport::new(TransportConfig::default()));
    host.connect("127.0.0.1", port);

    let mut events = Vec::new();
    pump_until(
        &mut server,
        &mut events,
        |_| {
            host.process();
            host.is_connected()
        },
    );
    assert_eq!(events.first(), Some(&TransportEvent::Connected));

    let expected: Vec<Vec<u8>> = (0..300_u32)
        .map(|i| {
            let mut packet = Packet::new(0x0500_u32);
            packet.set_integer(i32::try_from(i).unwrap());
            packet.as_bytes().to_vec()
        })
        .collect();
    for bytes in &expected {
        host.send_packet(Packet::from_wire(bytes).unwrap());
    }

    pump_until(
        &mut server,
        &mut events,
        |events| {
            host.process();
            payloads(events).len() >= expected.len()
        },
    );
    assert_eq!(payloads(&events), expected);
}

#[test]
fn test_server_messages_reach_host() {
    let (mut server, port) = listener();
    let mut host = Host::new(UdpTransport::new(TransportConfig::default()));
    host.connect("127.0.0.1", port);

    let mut events = Vec::new();
    pump_until(
        &mut server,
        &mut events,
        |_| {
            host.process();
            host.is_connected()
        },
    );

    for i in 0..50 {
        let mut packet = Packet::new(0x0600_u32);
        packet.set_byte(i);
        server.send(packet.as_bytes()).unwrap();
    }

    let mut received = Vec::new();
    pump_until(
        &mut server,
        &mut events,
        |_| {
            host.process();
            while let Some(packet) = host.get_packet() {
                received.push(packet);
            }
            received.len() >= 50
        },
    );

    for (i, mut packet) in received.into_iter().enumerate() {
        assert_eq!(packet.opcode(), 0x0600);
        assert_eq!(packet.get_byte(), Some(u8::try_from(i).unwrap()));
    }
}

#[test]
fn test_long_messages_cross_in_both_directions() {
    let (mut server, port) = listener();
    let mut host = Host::new(UdpTransport::new(TransportConfig::default()));
    host.connect("127.0.0.1", port);

    let mut events = Vec::new();
    pump_until(
        &mut server,
        &mut events,
        |_| {
            host.process();
            host.is_connected()
        },
    );

    let say = SayRequest {
        text: "a".repeat(2_000),
    };
    host.send_packet(say.encode());
    pump_until(
        &mut server,
        &mut events,
        |events| {
            host.process();
            !payloads(events).is_empty()
        },
    );
    let wire = payloads(&events).remove(0);
    assert_eq!(wire.len(), 2_004);
    let mut inbound = Packet::from_wire(&wire).unwrap();
    assert_eq!(SayRequest::decode(&mut inbound).unwrap(), say);

    let chat = ChatMessage {
        speaker: None,
        text: "b".repeat(5_000),
    };
    server.send(chat.encode().as_bytes()).unwrap();
    let mut received = None;
    pump_until(
        &mut server,
        &mut events,
        |_| {
            host.process();
            received = host.get_packet();
            received.is_some()
        },
    );
    let mut packet = received.unwrap();
    assert_eq!(ChatMessage::decode(&mut packet).unwrap(), chat);
}

#[test]
fn test_disconnect_reaches_peer() {
    let (mut server, port) = listener();
    let mut host = Host::new(UdpTransport::new(TransportConfig::default()));
    host.connect("127.0.0.1", port);

    let mut events = Vec::new();
    pump_until(
        &mut server,
        &mut events,
        |_| {
            host.process();
            host.is_connected()
        },
    );

    host.disconnect();
    host.process();
    assert!(!host.is_connected());

    pump_until(
        &mut server,
        &mut events,
        |events| events.contains(&TransportEvent::Disconnected),
    );
    assert!(!server.is_connected());
}

#[test]
fn test_unanswered_connect_stays_disconnected() {
    let (server, port) = listener();
    drop(server);

    let config = TransportConfig {
        resend_timeout_ms: 5,
        connect_attempts: 2,
        ..TransportConfig::default()
    };
    let mut host = Host::new(UdpTransport::new(config));
    host.connect("127.0.0.1", port);

    let start = Instant::now();
    while host.transport().is_connecting() {
        assert!(start.elapsed() < DEADLINE, "connect never gave up");
        host.process();
        thread::sleep(Duration::from_millis(2));
    }
    assert!(!host.is_connected());
}

#[test]
fn test_version_handshake_over_udp() {
    let (mut server, port) = listener();
    let config = ClientConfig::default();
    let mut network = NetworkManager::new(
        UdpTransport::new(config.transport.clone()),
        &config,
        MockGameStates::new(),
        MockUserInterface::new(),
        MockBeingRegistry::new(),
    );
    network.connect("127.0.0.1", port);

    let mut events = Vec::new();
    pump_until(
        &mut server,
        &mut events,
        |_| {
            network.process();
            network.is_connected()
        },
    );

    network.send_version();
    pump_until(
        &mut server,
        &mut events,
        |events| {
            network.process();
            !payloads(events).is_empty()
        },
    );
    let mut request = Packet::from_wire(&payloads(&events)[0]).unwrap();
    assert_eq!(request.opcode(), u32::from(Opcode::PAMSG_CONNECT));
    assert_eq!(
        ConnectRequest::decode(&mut request).unwrap().version,
        CLIENT_VERSION
    );

    let response = ConnectResponse {
        error: ErrorCode::None,
        update_host: Some("http://updates.example.org".into()),
    };
    server.send(response.encode().as_bytes()).unwrap();

    let start = Instant::now();
    while network.phase() != Phase::VersionChecked {
        assert!(start.elapsed() < DEADLINE, "no version answer");
        network.process();
        let _ = server.service();
        thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(network.update_host(), Some("http://updates.example.org"));
}
