// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client-to-daemon request envelope (§6).

use crate::types::WireProcFaultAction;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    /// First message on a new connection; the daemon replies with `Hello`
    /// carrying its protocol version before accepting anything else.
    Hello { client_version: u32 },
    Ping,

    StartApp { app_name: String },
    StopApp { app_name: String },
    GetState { app_name: String },
    GetProcState { app_name: String, proc_name: String },
    GetNameByPid { pid: i32 },
    GetHash { app_name: String },
    WatchdogExpired { app_name: String, proc_id: u32 },

    AppProcCreate {
        app_name: String,
        proc_name: Option<String>,
        exec_path: Option<String>,
    },
    AppProcSetStdin { handle: String, fd: Option<i32> },
    AppProcSetStdout { handle: String, fd: Option<i32> },
    AppProcSetStderr { handle: String, fd: Option<i32> },
    AppProcAddArg { handle: String, arg: String },
    AppProcClearArgs { handle: String },
    AppProcSetPriority { handle: String, priority: String },
    AppProcClearPriority { handle: String },
    AppProcSetFaultAction { handle: String, action: WireProcFaultAction },
    AppProcClearFaultAction { handle: String },
    AppProcAddStopHandler { handle: String },
    AppProcRemoveStopHandler { handle: String },
    AppProcStart { handle: String },
    AppProcDelete { handle: String },
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
