// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment-variable configuration (§6). Every variable has a sensible
//! default so the daemon runs unconfigured in a dev checkout.

use std::path::PathBuf;
use std::time::Duration;

fn var(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Directory holding the daemon's runtime state (socket, pid files).
pub fn state_dir() -> PathBuf {
    PathBuf::from(var("ASC_STATE_DIR", "/var/run/asc"))
}

/// Path of the Unix domain socket the daemon listens on.
pub fn socket_path() -> PathBuf {
    match std::env::var("ASC_SOCKET_PATH") {
        Ok(p) => PathBuf::from(p),
        Err(_) => state_dir().join("supervisor.sock"),
    }
}

/// Root directory under which every installed application's tree lives.
pub fn apps_install_dir() -> PathBuf {
    PathBuf::from(var("ASC_APPS_INSTALL_DIR", "/opt/legato/apps"))
}

/// Path to the JSON configuration tree read at startup.
pub fn config_path() -> PathBuf {
    PathBuf::from(var("ASC_CONFIG_PATH", "/etc/asc/config.json"))
}

/// Per-request IPC timeout; a client that doesn't get a response in this
/// window is assumed gone and its connection is dropped.
pub fn ipc_timeout() -> Duration {
    let ms: u64 = var("ASC_IPC_TIMEOUT_MS", "5000").parse().unwrap_or(5000);
    Duration::from_millis(ms)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
