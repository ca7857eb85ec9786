//! Integration tests for the handoff and the game server conversation.

mod common;

use common::{
    connected_default, deliver, hand_off, select_character, sent_opcodes, take_sent, TestManager,
    GAME_PORT, PLAYER_ID, TAG,
};
use towns_core::{BeingId, BeingInfo, BeingManager, CharacterInfo, Direction, Position};
use towns_networking::protocol::{
    CharListResponse, ChatMessage, GameConnectRequest, GameConnectResponse, GameServerInfo, LoadMap, Message,
    PlayerInfoRequest, PlayerInfoResponse, PlayerLeft, PlayerMove, WarpTo, MSG_INVALID_TAG,
};
use towns_networking::{
    BeingCall, ClientConfig, ClientState, ErrorCode, LoopbackServer, LoopbackTransport, MockGameStates,
    MockUserInterface, NetworkManager, Opcode, Phase,
};

fn accept_game_connect(manager: &mut TestManager, server: &LoopbackServer) {
    deliver(
        manager,
        server,
        &GameConnectResponse {
            error: ErrorCode::None,
        },
    );
}

#[test]
fn test_game_server_triggers_handoff() {
    let (mut manager, server) = connected_default();
    select_character(&mut manager, &server);

    deliver(
        &mut manager,
        &server,
        &GameServerInfo {
            hostname: "127.0.0.1".into(),
            port: GAME_PORT,
            tag: TAG,
        },
    );

    assert_eq!(manager.phase(), Phase::HandedOff);
    assert_eq!(manager.tag(), Some(TAG));
    assert_eq!(manager.game_states().last(), Some(ClientState::GameConnect));
    let game_server = manager.game_server().unwrap();
    assert_eq!(game_server.hostname, "127.0.0.1");
    assert_eq!(game_server.port, GAME_PORT);

    assert_eq!(server.disconnect_count(), 1);
    assert_eq!(
        server.connect_requests().last().copied(),
        Some(format!("127.0.0.1:{GAME_PORT}").parse().unwrap())
    );
}

#[test]
fn test_account_packets_behind_handoff_dropped() {
    let (mut manager, server) = connected_default();
    select_character(&mut manager, &server);

    server.send_message(&GameServerInfo {
        hostname: "127.0.0.1".into(),
        port: GAME_PORT,
        tag: TAG,
    });
    server.send_message(&CharListResponse {
        characters: vec![CharacterInfo {
            id: 11,
            name: "Ayla".into(),
            ..CharacterInfo::default()
        }],
    });
    manager.process();
    assert_eq!(manager.phase(), Phase::HandedOff);

    manager.process();
    manager.process();
    assert_eq!(manager.phase(), Phase::GameConnecting);
    assert!(manager.ui().characters.is_empty());
    assert_eq!(manager.game_states().last(), Some(ClientState::GameConnect));
}

#[test]
fn test_handoff_tag_is_second_field_of_game_connect() {
    let (mut manager, server) = connected_default();
    hand_off(&mut manager, &server);

    let mut packet = take_sent(&server, Opcode::PGMSG_CONNECT).unwrap();
    assert_eq!(&packet.as_bytes()[8..12], &TAG.to_be_bytes());
    let request = GameConnectRequest::decode(&mut packet).unwrap();
    assert_eq!(request.player_id, PLAYER_ID);
    assert_eq!(request.tag, TAG);
    assert_eq!(manager.phase(), Phase::GameConnecting);
}

#[test]
fn test_game_connect_accepted() {
    let (mut manager, server) = connected_default();
    hand_off(&mut manager, &server);
    accept_game_connect(&mut manager, &server);

    assert_eq!(manager.phase(), Phase::Registered);
    assert!(manager.ui().errors.is_empty());
}

#[test]
fn test_invalid_tag_returns_to_account_connect() {
    let (mut manager, server) = connected_default();
    hand_off(&mut manager, &server);
    deliver(
        &mut manager,
        &server,
        &GameConnectResponse {
            error: ErrorCode::InvalidTag,
        },
    );

    assert_eq!(manager.ui().errors, vec![MSG_INVALID_TAG]);
    assert_eq!(manager.tag(), None);
    assert!(!manager.is_connected());
    assert_eq!(manager.game_states().last(), Some(ClientState::AccountConnect));
}

#[test]
fn test_map_loaded_and_acknowledged() {
    let (mut manager, server) = connected_default();
    hand_off(&mut manager, &server);
    accept_game_connect(&mut manager, &server);
    let _ = server.received();

    deliver(
        &mut manager,
        &server,
        &LoadMap {
            map: "town.tmx".into(),
        },
    );

    assert_eq!(manager.game_states().loaded_maps, vec!["town.tmx"]);
    assert_eq!(sent_opcodes(&server), vec![u32::from(Opcode::PGMSG_MAP_LOADED)]);
    assert_eq!(manager.phase(), Phase::MapReady);
    assert_eq!(manager.game_states().last(), Some(ClientState::Game));
}

#[test]
fn test_map_load_failure_reported() {
    let (mut manager, server) = connected_default();
    manager
        .game_states_mut()
        .failing_maps
        .push("broken.tmx".into());
    let _ = server.received();

    deliver(
        &mut manager,
        &server,
        &LoadMap {
            map: "broken.tmx".into(),
        },
    );

    assert_eq!(manager.ui().errors, vec!["Could not load map broken.tmx."]);
    assert_eq!(manager.game_states().last(), Some(ClientState::Error));
    assert!(sent_opcodes(&server).is_empty());
}

#[test]
fn test_empty_map_name_reported() {
    let (mut manager, server) = connected_default();
    let _ = server.received();

    deliver(&mut manager, &server, &LoadMap { map: String::new() });

    assert_eq!(manager.game_states().loaded_maps, vec![String::new()]);
    assert_eq!(manager.ui().errors, vec!["Could not load map ."]);
    assert_eq!(manager.game_states().last(), Some(ClientState::Error));
    assert!(sent_opcodes(&server).is_empty());
}

#[test]
fn test_warp_synchronizes_local_player() {
    let (mut manager, server) = connected_default();
    deliver(
        &mut manager,
        &server,
        &WarpTo {
            position: Position::new(30, 40),
        },
    );

    assert_eq!(
        manager.beings().calls,
        vec![BeingCall::Warp(Position::new(30, 40))]
    );
    assert_eq!(manager.phase(), Phase::Synchronized);
}

#[test]
fn test_unknown_moving_being_is_buffered_then_materialized() {
    let (mut manager, server) = connected_default();
    let id = BeingId(42);

    deliver(
        &mut manager,
        &server,
        &PlayerMove {
            id,
            position: Position::new(7, 9),
            direction: Direction::Right,
        },
    );

    let mut sent = server.received();
    assert_eq!(sent.len(), 1);
    let mut request = sent.remove(0);
    assert_eq!(request.opcode(), u32::from(Opcode::PGMSG_PLAYER_INFO));
    assert_eq!(PlayerInfoRequest::decode(&mut request).unwrap().id, id);
    assert!(manager.beings().calls.is_empty());
    assert!(manager.is_pending(id));

    deliver(
        &mut manager,
        &server,
        &PlayerMove {
            id,
            position: Position::new(8, 9),
            direction: Direction::Right,
        },
    );
    assert!(server.received().is_empty());

    deliver(
        &mut manager,
        &server,
        &PlayerInfoResponse {
            id,
            info: BeingInfo::named("Ferris"),
        },
    );

    assert_eq!(
        manager.beings().calls,
        vec![
            BeingCall::Upsert(id, "Ferris".into(), Some(Position::new(7, 9))),
            BeingCall::Move(id, Position::new(7, 9), Direction::Right),
            BeingCall::Move(id, Position::new(8, 9), Direction::Right),
        ]
    );
    assert_eq!(manager.beings().position(id), Some(Position::new(8, 9)));
    assert!(!manager.is_pending(id));
}

#[test]
fn test_long_wait_replays_first_and_latest_move() {
    let (mut manager, server) = connected_default();
    let id = BeingId(42);

    for x in 0..50 {
        deliver(
            &mut manager,
            &server,
            &PlayerMove {
                id,
                position: Position::new(x, 9),
                direction: Direction::Right,
            },
        );
    }
    assert_eq!(sent_opcodes(&server), vec![u32::from(Opcode::PGMSG_PLAYER_INFO)]);

    deliver(
        &mut manager,
        &server,
        &PlayerInfoResponse {
            id,
            info: BeingInfo::named("Ferris"),
        },
    );

    assert_eq!(
        manager.beings().calls,
        vec![
            BeingCall::Upsert(id, "Ferris".into(), Some(Position::new(0, 9))),
            BeingCall::Move(id, Position::new(0, 9), Direction::Right),
            BeingCall::Move(id, Position::new(49, 9), Direction::Right),
        ]
    );
}

#[test]
fn test_materialized_being_not_at_origin() {
    let (transport, server) = LoopbackTransport::pair();
    let mut manager = NetworkManager::new(
        transport,
        &ClientConfig::default(),
        MockGameStates::new(),
        MockUserInterface::new(),
        BeingManager::new(),
    );
    manager.connect("127.0.0.1", 9601);
    manager.process();

    let id = BeingId(42);
    server.send_message(&PlayerMove {
        id,
        position: Position::new(12, 3),
        direction: Direction::Up,
    });
    manager.process();
    server.send_message(&PlayerInfoResponse {
        id,
        info: BeingInfo::named("Ferris"),
    });
    manager.process();

    let being = manager.beings().get(id).unwrap();
    assert_eq!(being.position, Position::new(12, 3));
    assert_ne!(being.position, Position::ORIGIN);
    assert_eq!(being.direction, Direction::Up);
    assert_eq!(being.info.name, "Ferris");
}

#[test]
fn test_player_left_cancels_pending_identity() {
    let (mut manager, server) = connected_default();
    let id = BeingId(5);
    deliver(
        &mut manager,
        &server,
        &PlayerMove {
            id,
            position: Position::new(1, 1),
            direction: Direction::Down,
        },
    );
    deliver(&mut manager, &server, &PlayerLeft { id });
    deliver(
        &mut manager,
        &server,
        &PlayerInfoResponse {
            id,
            info: BeingInfo::named("Ghost"),
        },
    );

    assert_eq!(
        manager.beings().calls,
        vec![
            BeingCall::Remove(id),
            BeingCall::Upsert(id, "Ghost".into(), None),
        ]
    );
}

#[test]
fn test_chat_forwarded() {
    let (mut manager, server) = connected_default();
    deliver(
        &mut manager,
        &server,
        &ChatMessage {
            speaker: Some(BeingId(3)),
            text: "hello town".into(),
        },
    );
    assert_eq!(
        manager.ui().chat,
        vec![(Some(BeingId(3)), "hello town".to_string())]
    );
}

#[test]
fn test_walk_say_ping_requests() {
    let (mut manager, server) = connected_default();
    manager.walk(Position::new(4, 5));
    manager.say("hi");
    manager.ping();

    assert_eq!(
        sent_opcodes(&server),
        vec![
            u32::from(Opcode::PGMSG_WALK),
            u32::from(Opcode::PGMSG_SAY),
            u32::from(Opcode::PGMSG_PING),
        ]
    );
}
