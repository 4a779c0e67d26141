// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format tests: length-prefix framing and JSON encoding.

use std::time::Duration;

use super::*;

#[test]
fn encode_returns_json_without_length_prefix() {
    let response = Response::Pong;
    let encoded = encode(&response).expect("encode failed");

    // encode() returns raw JSON, no length prefix
    let json_str = std::str::from_utf8(&encoded).expect("should be valid UTF-8");
    assert!(json_str.starts_with('{'), "should be JSON object: {}", json_str);
}

#[tokio::test]
async fn read_write_message_roundtrip() {
    let original = b"hello world";

    let mut buffer = Vec::new();
    write_message(&mut buffer, original).await.expect("write failed");

    // write_message adds 4-byte length prefix
    assert_eq!(buffer.len(), 4 + original.len());

    let mut cursor = std::io::Cursor::new(buffer);
    let read_back = read_message(&mut cursor).await.expect("read failed");

    assert_eq!(read_back, original);
}

#[tokio::test]
async fn write_message_adds_length_prefix() {
    let data = b"test data";

    let mut buffer = Vec::new();
    write_message(&mut buffer, data).await.expect("write failed");

    // First 4 bytes are the length prefix
    let len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;

    assert_eq!(len, data.len());
    assert_eq!(&buffer[4..], data);
}

#[tokio::test]
async fn read_message_on_empty_input_is_connection_closed() {
    let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
    let err = read_message(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

#[tokio::test]
async fn read_message_rejects_oversized_prefix() {
    // A corrupt prefix claiming a 1 GiB frame
    let mut buffer = Vec::new();
    buffer.extend_from_slice(&(1u32 << 30).to_be_bytes());
    let mut cursor = std::io::Cursor::new(buffer);

    let err = read_message(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::FrameTooLarge(_)));
}

#[tokio::test]
async fn frame_roundtrip_preserves_tagged_variants() {
    let frame = ServerFrame::Output(ExecuteChunk {
        stdout: b"out".to_vec(),
        stderr: b"err".to_vec(),
        done: true,
        exit_code: 3,
    });

    let mut buffer = Vec::new();
    write_frame(&mut buffer, &frame, Duration::from_secs(1)).await.unwrap();

    let mut cursor = std::io::Cursor::new(buffer);
    let decoded: ServerFrame = read_frame(&mut cursor, Duration::from_secs(1)).await.unwrap();
    assert_eq!(decoded, frame);
}

#[tokio::test]
async fn handshake_legacy_fields_default_when_absent() {
    let raw = serde_json::json!({
        "plugin_id": "mock",
        "capabilities": [{"name": "command", "version": "1.0.0"}],
    });
    let response: HandshakeResponse = serde_json::from_value(raw).unwrap();

    assert_eq!(response.plugin_id, "mock");
    assert!(response.legacy_capabilities.is_empty());
    assert!(response.legacy_plugin_version.is_empty());
}

#[test]
fn update_progress_is_fire_and_forget() {
    let call = UiCall::UpdateProgress { message: "half".to_string(), percentage: Some(50.0) };
    assert!(call.is_fire_and_forget());
    assert!(!UiCall::Confirm { label: "ok?".to_string() }.is_fire_and_forget());
}
