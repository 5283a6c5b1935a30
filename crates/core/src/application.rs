// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The narrow interface the core uses to drive an out-of-scope `Application`
//! object: a process-group launcher, priority/env setup, and watchdog
//! registration (§1). A real implementation lives in the `asc-daemon` crate;
//! [`crate::test_support::FakeApplication`] stands in for tests.

use crate::identity::Pid;
use std::fmt;

/// Run state of an application as reported by its `Application` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Running,
    Stopped,
}

/// Run state of a single configured process within an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcState {
    Running,
    Stopped,
}

/// Policy decision computed by the `Application` from a child termination,
/// per its configured fault-action table (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultAction {
    Ignore,
    RestartApp,
    StopApp,
    Reboot,
}

/// Policy decision computed by the `Application` from a watchdog expiry
/// (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogAction {
    Ignore,
    Handled,
    RestartApp,
    StopApp,
    Reboot,
    NotFound,
    Error,
}

/// Exit status of a reaped child, independent of any OS crate so this crate
/// stays free of `nix`/`libc` dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChildExitStatus {
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
}

/// Scheduling priority for an ad-hoc process (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Idle,
    Low,
    Medium,
    High,
    Rt(u8),
}

impl Priority {
    /// Parses `idle|low|medium|high|rt1..rt32`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            other => {
                let n: u8 = other.strip_prefix("rt")?.parse().ok()?;
                if (1..=32).contains(&n) {
                    Some(Self::Rt(n))
                } else {
                    None
                }
            }
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Rt(n) => write!(f, "rt{n}"),
        }
    }
}

/// Per-process fault action override, set via the ad-hoc process facility's
/// `set_fault_action`. Distinct from [`FaultAction`]: it adds `RestartProc`
/// (restart just the process, not the whole app) which only makes sense as
/// a per-process override, never as the app-level action the fault engine
/// receives from `sigchild_notify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcFaultAction {
    Ignore,
    RestartProc,
    RestartApp,
    StopApp,
    Reboot,
}

/// Opaque reference to a process object inside an `Application`, returned by
/// [`Application::create_proc`]. Identity only — the `Application` owns the
/// real process state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcRef(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AppOpError {
    #[error("operation failed")]
    Fault,
    #[error("value too long")]
    Overflow,
    #[error("invalid value")]
    Invalid,
}

/// The narrow interface the core consumes from the (out-of-scope)
/// Application launcher.
///
/// Bounded by `Any` solely so tests can downcast a registry's trait objects
/// back to [`crate::test_support::FakeApplication`] to assert on its call
/// counters; production code never downcasts.
pub trait Application: fmt::Debug + std::any::Any {
    fn name(&self) -> &str;

    fn as_any(&self) -> &dyn std::any::Any;
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;

    /// Starts the application's configured processes. Asynchronous in the
    /// sense that the call returns before the OS has actually scheduled
    /// anything; failures are detected synchronously here (exec failure,
    /// missing binary, …).
    fn start(&mut self) -> Result<(), AppOpError>;

    /// Initiates an app stop. Asynchronous: returns immediately, actual
    /// termination is observed later via `sigchild_notify` driving `state()`
    /// to `Stopped`.
    fn stop(&mut self);

    fn state(&self) -> AppState;

    /// True if `pid` is one of this application's top-level (directly
    /// forked) processes.
    fn has_top_level_proc(&self, pid: Pid) -> bool;

    /// State of a *configured* process by name; `Stopped` for unknown names.
    fn proc_state(&self, proc_name: &str) -> ProcState;

    /// A child of this application changed state. Must be called with the
    /// already-reaped exit status (§5: reap before dispatch).
    fn sigchild_notify(&mut self, pid: Pid, status: ChildExitStatus) -> FaultAction;

    /// A watchdog registered to `proc_id` has expired. Returns `NotFound` if
    /// this application does not own `proc_id`.
    fn watchdog_notify(&mut self, proc_id: u32) -> WatchdogAction;

    /// Builds a new, not-yet-started process object for the ad-hoc process
    /// facility (§4.8). Exactly one of `proc_name`/`exec_path` may be
    /// omitted, never both (validated by the caller).
    fn create_proc(
        &mut self,
        proc_name: Option<&str>,
        exec_path: Option<&str>,
    ) -> Result<ProcRef, AppOpError>;

    fn set_proc_stdin(&mut self, proc: ProcRef, fd: Option<i32>);
    fn set_proc_stdout(&mut self, proc: ProcRef, fd: Option<i32>);
    fn set_proc_stderr(&mut self, proc: ProcRef, fd: Option<i32>);

    /// Appends an argument. The first call on a process built from a
    /// configured process discards the configured argv (§4.8).
    fn add_proc_arg(&mut self, proc: ProcRef, arg: &str) -> Result<(), AppOpError>;

    fn clear_proc_args(&mut self, proc: ProcRef);

    fn set_proc_priority(&mut self, proc: ProcRef, priority: Priority) -> Result<(), AppOpError>;
    fn clear_proc_priority(&mut self, proc: ProcRef);

    fn set_proc_fault_action(&mut self, proc: ProcRef, action: ProcFaultAction);
    fn clear_proc_fault_action(&mut self, proc: ProcRef);

    fn start_proc(&mut self, proc: ProcRef) -> Result<(), AppOpError>;
    fn delete_proc(&mut self, proc: ProcRef);

    /// The OS pid of a started ad-hoc process, or `None` if it hasn't been
    /// started (or has already exited). Used to let a stop-handler
    /// registration (§4.8) outlive the ad-hoc process facility's own handle,
    /// which is released as soon as `start_proc` succeeds.
    fn proc_pid(&self, proc: ProcRef) -> Option<Pid>;
}

#[cfg(test)]
#[path = "application_tests.rs"]
mod tests;
