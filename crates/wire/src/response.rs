// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-to-client response envelope (§6).

use crate::types::{WireAppState, WireError, WireProcState, WireWatchdogAction};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Response {
    Hello { server_version: u32 },
    Pong,

    Ok,
    Error { error: WireError },

    State { state: WireAppState },
    ProcState { state: WireProcState },
    Name { app_name: String },
    Hash { hash: String },
    WatchdogResult { action: WireWatchdogAction },

    AppProcHandle { handle: String },
    /// Returned from `appproc.add_stop_handler`: the same identifier as the
    /// handle that registered it (§4.8: "implementation reuses the handle
    /// identifier as the handler ref").
    AppProcHandlerRef { handler_ref: String },

    /// Unsolicited: an ad-hoc process that registered a stop handler has
    /// reached STOPPED. Not a reply to any request; the listener pushes it
    /// to the owning session's connection as soon as the fault/watchdog
    /// engine observes the reap (§4.8).
    ProcStopped { handler_ref: String },
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
