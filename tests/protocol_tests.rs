//! Tests for the wire protocol
//!
//! These tests verify:
//! - Command and response framing
//! - Rejection of malformed, unknown, and oversized messages
//! - Stream helpers
//! - Error kind → status mapping

use std::io::Cursor;

use atlaslog::protocol::{
    decode_command, decode_response, encode_command, encode_response, read_command,
    read_response, write_command, write_response, Command, Response, Status, HEADER_SIZE,
    MAX_PAYLOAD_SIZE,
};
use atlaslog::{ErrorKind, LogError};

// =============================================================================
// Command Tests
// =============================================================================

#[test]
fn test_encode_append_layout() {
    let encoded = encode_command(&Command::Append {
        payload: b"hello".to_vec(),
    });

    assert_eq!(encoded[0], 0x01);
    assert_eq!(&encoded[1..5], &5u32.to_be_bytes());
    assert_eq!(&encoded[HEADER_SIZE..], b"hello");
}

#[test]
fn test_decode_commands() {
    let commands = [
        Command::Append {
            payload: b"{\"a\":1}".to_vec(),
        },
        Command::Append { payload: Vec::new() },
        Command::Read {
            offset: "42".to_string(),
        },
        Command::Ping,
    ];

    for command in commands {
        let decoded = decode_command(&encode_command(&command)).unwrap();
        assert_eq!(decoded, command);
    }
}

#[test]
fn test_decode_read_with_invalid_utf8() {
    let bytes = [0x02, 0, 0, 0, 2, 0xff, 0xfe];

    let decoded = decode_command(&bytes).unwrap();

    match decoded {
        Command::Read { offset } => assert!(offset.parse::<i64>().is_err()),
        other => panic!("expected Read, got {:?}", other),
    }
}

#[test]
fn test_decode_unknown_command() {
    let bytes = [0x7f, 0, 0, 0, 0];

    assert!(matches!(decode_command(&bytes), Err(LogError::Protocol(_))));
}

#[test]
fn test_decode_ping_with_payload() {
    let bytes = [0x03, 0, 0, 0, 1, 0xaa];

    assert!(matches!(decode_command(&bytes), Err(LogError::Protocol(_))));
}

#[test]
fn test_decode_incomplete_header() {
    assert!(matches!(decode_command(&[0x01, 0, 0]), Err(LogError::Protocol(_))));
}

#[test]
fn test_decode_incomplete_payload() {
    let bytes = [0x01, 0, 0, 0, 10, b'a', b'b'];

    assert!(matches!(decode_command(&bytes), Err(LogError::Protocol(_))));
}

#[test]
fn test_decode_oversized_payload() {
    let mut bytes = vec![0x01];
    bytes.extend_from_slice(&(MAX_PAYLOAD_SIZE + 1).to_be_bytes());

    assert!(matches!(decode_command(&bytes), Err(LogError::Protocol(_))));
}

// =============================================================================
// Response Tests
// =============================================================================

#[test]
fn test_offset_response() {
    let response = Response::offset(7);

    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.payload, Some(7u64.to_be_bytes().to_vec()));
}

#[test]
fn test_decode_responses() {
    let responses = [
        Response::ok(Some(b"record".to_vec())),
        Response::offset(3),
        Response::invalid("bad offset"),
        Response::error("disk on fire"),
    ];

    for response in responses {
        let decoded = decode_response(&encode_response(&response)).unwrap();
        assert_eq!(decoded, response);
    }
}

#[test]
fn test_empty_payload_decodes_as_none() {
    let decoded = decode_response(&encode_response(&Response::ok(None))).unwrap();

    assert_eq!(decoded.payload, None);
}

#[test]
fn test_decode_unknown_status() {
    let bytes = [0x09, 0, 0, 0, 0];

    assert!(matches!(decode_response(&bytes), Err(LogError::Protocol(_))));
}

#[test]
fn test_from_error_maps_kind() {
    let invalid = Response::from_error(&LogError::validation("empty record provided"));
    let internal = Response::from_error(&LogError::IndexCorruption("bad".to_string()));

    assert_eq!(invalid.status, Status::Invalid);
    assert!(invalid.message().contains("empty record provided"));
    assert_eq!(internal.status, Status::Error);
}

#[test]
fn test_into_result() {
    assert_eq!(
        Response::ok(Some(b"x".to_vec())).into_result().unwrap(),
        Some(b"x".to_vec())
    );
    assert!(matches!(
        Response::invalid("nope").into_result(),
        Err(LogError::Validation(_))
    ));
    assert!(matches!(
        Response::error("boom").into_result(),
        Err(LogError::Network(_))
    ));
}

// =============================================================================
// Stream Tests
// =============================================================================

#[test]
fn test_stream_commands_in_sequence() {
    let mut buf = Vec::new();
    write_command(&mut buf, &Command::Ping).unwrap();
    write_command(
        &mut buf,
        &Command::Read {
            offset: "0".to_string(),
        },
    )
    .unwrap();

    let mut cursor = Cursor::new(buf);
    assert_eq!(read_command(&mut cursor).unwrap(), Command::Ping);
    assert_eq!(
        read_command(&mut cursor).unwrap(),
        Command::Read {
            offset: "0".to_string()
        }
    );
    assert!(matches!(read_command(&mut cursor), Err(LogError::Io(_))));
}

#[test]
fn test_stream_response() {
    let mut buf = Vec::new();
    write_response(&mut buf, &Response::offset(12)).unwrap();

    let response = read_response(&mut Cursor::new(buf)).unwrap();

    assert_eq!(response, Response::offset(12));
}

#[test]
fn test_protocol_error_maps_to_invalid() {
    let err = LogError::Protocol("unknown command: 0x7f".to_string());

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(Response::from_error(&err).status, Status::Invalid);
}
