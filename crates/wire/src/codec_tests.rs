// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::request::Request;
use std::io::Cursor;

#[tokio::test]
async fn round_trips_a_request_through_the_wire_format() {
    let req = Request::StartApp { app_name: "hello".to_string() };
    let mut buf = Vec::new();
    write_message(&mut buf, &req).await.unwrap();

    let mut cursor = Cursor::new(buf);
    let decoded: Request = read_message(&mut cursor).await.unwrap();
    assert_eq!(decoded, req);
}

#[tokio::test]
async fn rejects_a_length_prefix_over_the_limit() {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(MAX_MESSAGE_LEN + 1).to_be_bytes());
    let mut cursor = Cursor::new(buf);
    let err = read_message::<Request, _>(&mut cursor).await.unwrap_err();
    assert!(matches!(err, WireError::TooLarge(_)));
}

#[tokio::test]
async fn reports_eof_on_a_truncated_header() {
    let mut cursor = Cursor::new(vec![0u8; 2]);
    let err = read_message::<Request, _>(&mut cursor).await.unwrap_err();
    assert!(matches!(err, WireError::Eof));
}

#[tokio::test]
async fn reports_json_error_on_malformed_payload() {
    let mut buf = Vec::new();
    let payload = b"not json";
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(payload);
    let mut cursor = Cursor::new(buf);
    let err = read_message::<Request, _>(&mut cursor).await.unwrap_err();
    assert!(matches!(err, WireError::Json(_)));
}
