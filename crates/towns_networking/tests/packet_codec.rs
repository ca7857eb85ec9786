//! Packet codec properties over randomized field sequences.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use towns_networking::Packet;

/// One field of a generated packet.
#[derive(Debug, Clone, PartialEq)]
enum Field {
    Byte(u8),
    Integer(i32),
    Text(String),
}

fn random_text(rng: &mut StdRng) -> String {
    let len = rng.gen_range(1..40);
    (0..len)
        .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
        .collect()
}

fn random_fields(rng: &mut StdRng) -> Vec<Field> {
    let count = rng.gen_range(0..30);
    (0..count)
        .map(|_| match rng.gen_range(0..3) {
            0 => Field::Byte(rng.gen()),
            1 => Field::Integer(rng.gen()),
            _ => Field::Text(random_text(rng)),
        })
        .collect()
}

fn write(packet: &mut Packet, fields: &[Field]) {
    for field in fields {
        match field {
            Field::Byte(value) => packet.set_byte(*value),
            Field::Integer(value) => packet.set_integer(*value),
            Field::Text(value) => packet.set_terminated_string(value),
        }
    }
}

fn read(packet: &mut Packet, fields: &[Field]) -> Vec<Field> {
    fields
        .iter()
        .map(|field| match field {
            Field::Byte(_) => Field::Byte(packet.get_byte().unwrap()),
            Field::Integer(_) => Field::Integer(packet.get_integer().unwrap()),
            Field::Text(_) => Field::Text(packet.get_string().unwrap()),
        })
        .collect()
}

#[test]
fn test_fields_read_back_in_write_order() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..500 {
        let opcode: u32 = rng.gen();
        let fields = random_fields(&mut rng);

        let mut outbound = Packet::new(opcode);
        write(&mut outbound, &fields);

        let mut inbound = Packet::from_wire(outbound.as_bytes()).unwrap();
        assert_eq!(inbound.opcode(), opcode);
        assert_eq!(read(&mut inbound, &fields), fields);
        assert_eq!(inbound.remaining(), 0);
        assert_eq!(inbound.get_byte(), None);
    }
}

#[test]
fn test_trailing_string_after_fields() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..100 {
        let fields = random_fields(&mut rng);
        let tail = random_text(&mut rng);

        let mut outbound = Packet::new(0x0170_u32);
        write(&mut outbound, &fields);
        outbound.set_string(&tail);

        let mut inbound = Packet::from_wire(outbound.as_bytes()).unwrap();
        read(&mut inbound, &fields);
        assert_eq!(inbound.get_string(), Some(tail));
        assert_eq!(inbound.get_string(), None);
    }
}

#[test]
fn test_growth_keeps_written_bytes() {
    let mut rng = StdRng::seed_from_u64(0xC0DE);
    let mut packet = Packet::new(1_u32);
    let mut expected = 1_u32.to_be_bytes().to_vec();

    let mut capacity = packet.capacity();
    for _ in 0..4_000 {
        let value: i32 = rng.gen();
        packet.set_integer(value);
        expected.extend_from_slice(&value.to_be_bytes());

        assert!(packet.capacity() >= packet.len());
        if packet.capacity() != capacity {
            assert!(packet.capacity() >= capacity * 2);
            capacity = packet.capacity();
        }
    }

    assert_eq!(packet.as_bytes(), expected.as_slice());
}

#[test]
fn test_large_string_grows_in_one_step() {
    let mut packet = Packet::new(1_u32);
    let text = "x".repeat(5_000);
    packet.set_string(&text);

    assert!(packet.capacity() >= 4 + text.len());
    let mut inbound = Packet::from_wire(packet.as_bytes()).unwrap();
    assert_eq!(inbound.get_string(), Some(text));
}
