//! Codec Tests
//!
//! Tests for JSON encoding/decoding and length-prefixed framing.

use std::io::Cursor;

use bytes::BytesMut;
use lhc_server::protocol::codec::{
    decode, decode_reply, encode, encode_message, frame, read_frame, split_frame, write_frame,
    DecodeError, HEADER_SIZE, MAX_FRAME_SIZE,
};
use lhc_server::protocol::{Command, Message, Payload, Reply, PROTOCOL_VERSION};
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

// =============================================================================
// Reply Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_ack_reply() {
    let reply = Reply::ack(
        "stage",
        "client_1",
        Command::Get,
        payload(json!({"x": 1.5, "axes": [1, 2], "nested": {"ok": true}})),
    );

    let bytes = encode(&reply).unwrap();
    let decoded = decode_reply(&bytes).unwrap();

    assert_eq!(decoded, reply);
    assert_eq!(decoded.command(), Some(Command::Get));
    assert!(!decoded.is_error());
}

#[test]
fn test_encode_decode_error_reply() {
    let reply = Reply::error("stage", "client_1", "FOO", "Unknown command: 'FOO'.");

    let bytes = encode(&reply).unwrap();
    let decoded = decode_reply(&bytes).unwrap();

    assert_eq!(decoded, reply);
    assert!(decoded.is_error());
    assert_eq!(decoded.command(), None);
    assert_eq!(decoded.payload.get("cmd"), Some(&json!("FOO")));
}

/// Deterministic floats spread over [-1000, 1000)
fn float_sweep(count: usize) -> Vec<f64> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    (0..count)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 11) as f64 / (1u64 << 53) as f64 * 2000.0 - 1000.0
        })
        .collect()
}

#[test]
fn test_float_payload_round_trips_exactly() {
    let edge_cases = [
        180.17933438838418,
        -930.0397635799367,
        0.1,
        -0.0,
        1e-300,
        123_456_789.987_654_32,
        f64::MAX,
        f64::MIN_POSITIVE,
    ];
    let sweep = float_sweep(10_000);

    let reply = Reply::ack(
        "stage",
        "client_1",
        Command::Get,
        payload(json!({
            "positions": edge_cases,
            "nested": {"axes": {"x": sweep[0], "y": [sweep[1], sweep[2]]}},
            "sweep": sweep,
        })),
    );

    let decoded = decode_reply(&encode(&reply).unwrap()).unwrap();
    assert_eq!(decoded, reply);

    let values = decoded.payload["sweep"].as_array().unwrap();
    for (value, expected) in values.iter().zip(&sweep) {
        assert_eq!(value.as_f64().unwrap().to_bits(), expected.to_bits());
    }
}

#[test]
fn test_decode_preserves_float_bits() {
    for x in float_sweep(10_000) {
        let bytes = serde_json::to_vec(&json!({ "x": x })).unwrap();
        let value = decode(&bytes).unwrap();
        assert_eq!(value["x"].as_f64().unwrap().to_bits(), x.to_bits(), "{}", x);
    }
}

#[test]
fn test_encode_reply_wire_shape() {
    let reply = Reply::ack("stage", "client_1", Command::Ping, Payload::new());
    let value = decode(&encode(&reply).unwrap()).unwrap();

    assert_eq!(
        value,
        json!({
            "version": PROTOCOL_VERSION,
            "cmd": "PING",
            "from": "stage",
            "to": "client_1",
            "payload": {},
            "error_msg": null,
            "msg": "Still alive.",
        })
    );
}

#[test]
fn test_encode_is_deterministic() {
    // Same content inserted in different orders
    let mut a = Payload::new();
    a.insert("zeta".to_string(), json!(1));
    a.insert("alpha".to_string(), json!(2));
    let mut b = Payload::new();
    b.insert("alpha".to_string(), json!(2));
    b.insert("zeta".to_string(), json!(1));

    let first = encode(&Reply::ack("s", "c", Command::Get, a)).unwrap();
    let second = encode(&Reply::ack("s", "c", Command::Get, b)).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_encode_message_uses_wire_names() {
    let message = Message::new(Command::Set, "client_1", payload(json!({"positions": [1, 2]})));
    let value = decode(&encode_message(&message).unwrap()).unwrap();

    assert_eq!(value["cmd"], json!("SET"));
    assert_eq!(value["from"], json!("client_1"));
    assert_eq!(value["version"], json!(PROTOCOL_VERSION));
    assert_eq!(value["payload"]["positions"], json!([1, 2]));
    assert!(value.get("to").is_none());
}

#[test]
fn test_encode_message_with_target() {
    let message = Message::new(Command::Ping, "client_1", Payload::new()).with_target("stage");
    let value = decode(&encode_message(&message).unwrap()).unwrap();

    assert_eq!(value["to"], json!("stage"));
}

// =============================================================================
// Decode Error Tests
// =============================================================================

#[test]
fn test_decode_malformed_json() {
    let result = decode(b"{\"version\": \"0.1.6\", \"cmd\": ");
    assert!(matches!(result, Err(DecodeError::Malformed(_))));
}

#[test]
fn test_decode_non_utf8() {
    let result = decode(&[0xFF, 0xFE, 0x00]);
    assert!(matches!(result, Err(DecodeError::Malformed(_))));
}

#[test]
fn test_decode_empty_input() {
    assert!(matches!(decode(b""), Err(DecodeError::Malformed(_))));
}

#[test]
fn test_decode_accepts_any_json_value() {
    // Shape is checked by the validator, not the codec
    assert_eq!(decode(b"[1, 2, 3]").unwrap(), json!([1, 2, 3]));
    assert_eq!(decode(b"42").unwrap(), json!(42));
}

#[test]
fn test_decode_reply_wrong_shape() {
    assert!(decode_reply(b"{\"cmd\": \"PING\"}").is_err());
}

// =============================================================================
// Framing Tests
// =============================================================================

#[test]
fn test_frame_layout() {
    let framed = frame(b"hello").unwrap();

    assert_eq!(framed.len(), HEADER_SIZE + 5);
    assert_eq!(&framed[..HEADER_SIZE], &5u32.to_be_bytes());
    assert_eq!(&framed[HEADER_SIZE..], b"hello");
}

#[test]
fn test_split_frame_incomplete_header() {
    let mut buffer = BytesMut::from(&[0u8, 0][..]);

    assert_eq!(split_frame(&mut buffer, MAX_FRAME_SIZE).unwrap(), None);
    assert_eq!(buffer.len(), 2);
}

#[test]
fn test_split_frame_incomplete_body() {
    let framed = frame(b"hello world").unwrap();
    let mut buffer = BytesMut::from(&framed[..framed.len() - 3]);
    let before = buffer.len();

    assert_eq!(split_frame(&mut buffer, MAX_FRAME_SIZE).unwrap(), None);
    assert_eq!(buffer.len(), before);
}

#[test]
fn test_split_frame_multiple_frames() {
    let mut buffer = BytesMut::new();
    buffer.extend_from_slice(&frame(b"first").unwrap());
    buffer.extend_from_slice(&frame(b"").unwrap());
    buffer.extend_from_slice(&frame(b"third").unwrap());

    let first = split_frame(&mut buffer, MAX_FRAME_SIZE).unwrap().unwrap();
    let second = split_frame(&mut buffer, MAX_FRAME_SIZE).unwrap().unwrap();
    let third = split_frame(&mut buffer, MAX_FRAME_SIZE).unwrap().unwrap();

    assert_eq!(&first[..], b"first");
    assert!(second.is_empty());
    assert_eq!(&third[..], b"third");
    assert!(buffer.is_empty());
    assert_eq!(split_frame(&mut buffer, MAX_FRAME_SIZE).unwrap(), None);
}

#[test]
fn test_split_frame_too_large() {
    let mut buffer = BytesMut::new();
    buffer.extend_from_slice(&1024u32.to_be_bytes());

    let result = split_frame(&mut buffer, 100);
    assert_eq!(result, Err(DecodeError::FrameTooLarge { size: 1024, max: 100 }));
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_stream_write_read_frame() {
    let mut buffer = Vec::new();
    write_frame(&mut buffer, b"{\"a\":1}").unwrap();
    write_frame(&mut buffer, b"{\"b\":2}").unwrap();

    let mut cursor = Cursor::new(buffer);
    assert_eq!(read_frame(&mut cursor, MAX_FRAME_SIZE).unwrap(), b"{\"a\":1}");
    assert_eq!(read_frame(&mut cursor, MAX_FRAME_SIZE).unwrap(), b"{\"b\":2}");
}

#[test]
fn test_stream_read_truncated_frame() {
    let framed = frame(b"truncated body").unwrap();
    let mut cursor = Cursor::new(framed[..framed.len() - 4].to_vec());

    assert!(read_frame(&mut cursor, MAX_FRAME_SIZE).is_err());
}

#[test]
fn test_stream_read_oversized_frame() {
    let mut cursor = Cursor::new(frame(&[b'x'; 64]).unwrap());

    assert!(read_frame(&mut cursor, 16).is_err());
}
