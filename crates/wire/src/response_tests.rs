// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn serializes_with_a_result_tag() {
    let resp = Response::Error { error: WireError::NotFound };
    let json = serde_json::to_value(&resp).unwrap();
    assert_eq!(json["result"], "error");
    assert_eq!(json["error"], "not_found");
}

#[test]
fn round_trips_every_variant_through_json() {
    let responses = vec![
        Response::Hello { server_version: 1 },
        Response::Pong,
        Response::Ok,
        Response::Error { error: WireError::Duplicate },
        Response::State { state: WireAppState::Running },
        Response::ProcState { state: WireProcState::Stopped },
        Response::Name { app_name: "hello".to_string() },
        Response::Hash { hash: "deadbeef".to_string() },
        Response::WatchdogResult { action: WireWatchdogAction::RestartApp },
        Response::AppProcHandle { handle: "appproc-abc".to_string() },
    ];
    for resp in responses {
        let json = serde_json::to_string(&resp).unwrap();
        let decoded: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, resp);
    }
}
