// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Application/process name validation and PID-to-application-name resolution.
//!
//! Name validation failures are client-protocol violations (the caller should
//! kill the offending session, never surface them as an IPC result code).
//! PID resolution is built over a small [`SecurityLabelSource`] trait so the
//! ordering constraint in the fault engine ("read the label before reaping
//! the child") can be tested without a real `/proc` filesystem.

use std::fmt;

/// Longest app/process name this crate will round-trip over the wire.
///
/// Mirrors the original's fixed-size name buffers; Rust `String`s never
/// truncate, but the protocol still reports `Overflow` past this length so
/// wire behavior matches the spec's documented response codes.
pub const MAX_NAME_LEN: usize = 48;

/// Pid type used throughout the core. Kept as a plain integer so this crate
/// never depends on `nix`/`libc` — the daemon crate is the only place that
/// talks to the OS.
pub type Pid = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("name cannot be empty")]
    Empty,
    #[error("name contains illegal character '/'")]
    ContainsSlash,
}

/// Validates an application or process name.
///
/// Non-empty, must not contain `/`. Both app names and process names share
/// this rule (§4.1).
pub fn validate_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.contains('/') {
        return Err(NameError::ContainsSlash);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ResolveNameError {
    #[error("pid is not an application process")]
    NotAppProcess,
    #[error("resolved name exceeds the maximum wire length")]
    Overflow,
    #[error("label lookup failed")]
    LookupFailed,
}

/// Source of the trusted per-process security label used to map a PID back
/// to the application that owns it. Implemented for real by reading
/// `/proc/<pid>/attr/current`-equivalent state in the daemon; implemented by
/// a fixed map in tests.
///
/// The label **must** be read before the process is reaped — reaping frees
/// the kernel's record of the process and the label becomes unreadable.
pub trait SecurityLabelSource {
    /// Returns the raw label for `pid`, or `None` if the process has no
    /// label (not sandboxed, or already gone).
    fn label_for_pid(&self, pid: Pid) -> Result<Option<String>, ResolveNameError>;
}

/// Prefix stripped from app-owned process labels, e.g. `"app."`.
pub const APP_LABEL_PREFIX: &str = "app.";

/// Resolves the application name that owns `pid` via its security label.
///
/// Returns `Ok(name)`, or an error distinguishing "not an app process" from
/// a hard lookup failure, matching `GetAppNameFromPid` in the original.
pub fn resolve_app_name(
    labels: &dyn SecurityLabelSource,
    pid: Pid,
) -> Result<String, ResolveNameError> {
    let label = match labels.label_for_pid(pid)? {
        Some(label) => label,
        None => return Err(ResolveNameError::NotAppProcess),
    };

    let Some(name) = label.strip_prefix(APP_LABEL_PREFIX) else {
        return Err(ResolveNameError::NotAppProcess);
    };

    if name.len() > MAX_NAME_LEN {
        return Err(ResolveNameError::Overflow);
    }

    Ok(name.to_string())
}

/// Newtype for an application name, used as the container registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AppName(String);

impl AppName {
    /// Validates and wraps `name`.
    pub fn parse(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::borrow::Borrow<str> for AppName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for AppName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
