//! Benchmark for packet encoding, decoding and dispatch.
//!
//! TARGET: 1,000,000 movement updates per second through dispatch
//!
//! Run with: cargo bench --package towns_networking --bench packet_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use towns_core::{Appearance, BeingId, BeingInfo, BeingManager, CharacterInfo, Direction, Position};
use towns_networking::protocol::{CharListResponse, Message, PlayerMove};
use towns_networking::{
    BeingRegistry, ClientConfig, LoopbackTransport, MockGameStates, MockUserInterface,
    NetworkManager, Packet,
};

fn character_list() -> CharListResponse {
    CharListResponse {
        characters: (0..3)
            .map(|slot| CharacterInfo {
                id: 1000 + u32::from(slot),
                slot,
                name: format!("Villager{slot}"),
                appearance: Appearance::default(),
                level: 12,
                rights: 0,
            })
            .collect(),
    }
}

fn benchmark_raw_fields(c: &mut Criterion) {
    c.bench_function("packet_write_read_fields", |b| {
        b.iter(|| {
            let mut packet = Packet::new(black_box(0x0170_u32));
            packet.set_integer(black_box(42));
            packet.set_terminated_string(black_box("alice"));
            packet.set_byte(black_box(3));

            let mut inbound = Packet::from_wire(packet.as_bytes()).ok()?;
            let id = inbound.get_integer()?;
            let name = inbound.get_string()?;
            let byte = inbound.get_byte()?;
            black_box((id, name, byte));
            Some(())
        });
    });
}

fn benchmark_messages(c: &mut Criterion) {
    let movement = PlayerMove {
        id: BeingId(42),
        position: Position::new(120, 88),
        direction: Direction::Left,
    };
    let wire = movement.encode().as_bytes().to_vec();

    c.bench_function("player_move_encode", |b| {
        b.iter(|| black_box(black_box(&movement).encode()));
    });

    c.bench_function("player_move_decode", |b| {
        b.iter(|| {
            let mut packet = Packet::from_wire(black_box(&wire)).ok()?;
            black_box(PlayerMove::decode(&mut packet).ok())
        });
    });

    let list = character_list();
    let list_wire = list.encode().as_bytes().to_vec();
    c.bench_function("char_list_decode", |b| {
        b.iter(|| {
            let mut packet = Packet::from_wire(black_box(&list_wire)).ok()?;
            black_box(CharListResponse::decode(&mut packet).ok())
        });
    });
}

fn benchmark_dispatch(c: &mut Criterion) {
    let (transport, _server) = LoopbackTransport::pair();
    let mut beings = BeingManager::new();
    for id in 0..100 {
        beings.upsert_being(BeingId(id), &BeingInfo::named("Villager"), None);
    }
    let mut network = NetworkManager::new(
        transport,
        &ClientConfig::default(),
        MockGameStates::new(),
        MockUserInterface::new(),
        beings,
    );

    let wires: Vec<Vec<u8>> = (0..100)
        .map(|id| {
            PlayerMove {
                id: BeingId(id),
                position: Position::new(i32::try_from(id).unwrap_or(0), 7),
                direction: Direction::Down,
            }
            .encode()
            .as_bytes()
            .to_vec()
        })
        .collect();

    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(wires.len() as u64));
    group.bench_function("known_being_moves", |b| {
        b.iter(|| {
            for wire in &wires {
                if let Ok(packet) = Packet::from_wire(wire) {
                    network.dispatch(black_box(packet));
                }
            }
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_raw_fields,
    benchmark_messages,
    benchmark_dispatch
);
criterion_main!(benches);
