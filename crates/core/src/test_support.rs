// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test doubles shared across this crate's tests and other crates' tests.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::application::{
    AppOpError, AppState, Application, ChildExitStatus, FaultAction, Priority, ProcFaultAction,
    ProcRef, ProcState, WatchdogAction,
};
use crate::identity::Pid;
use std::collections::HashMap;

/// In-memory stand-in for the external `Application` launcher, driven
/// entirely by test-set expectations rather than real processes.
#[derive(Debug)]
pub struct FakeApplication {
    name: String,
    state: AppState,
    start_result: Result<(), AppOpError>,
    top_level_pids: Vec<Pid>,
    configured_procs: HashMap<String, ProcState>,
    /// Fault action to return from the next `sigchild_notify` call.
    pub next_fault_action: FaultAction,
    /// Watchdog action to return from the next `watchdog_notify` call, and
    /// the proc_id it claims. `None` means "not mine" (returns NotFound).
    pub watchdog_claim: Option<(u32, WatchdogAction)>,
    next_proc_id: u64,
    procs: HashMap<ProcRef, FakeProc>,
    start_calls: u32,
    stop_calls: u32,
    next_proc_pid: Pid,
}

#[derive(Debug, Default, Clone)]
struct FakeProc {
    args: Vec<String>,
    priority: Option<Priority>,
    fault_action: Option<ProcFaultAction>,
    started: bool,
    pid: Option<Pid>,
}

impl FakeApplication {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: AppState::Stopped,
            start_result: Ok(()),
            top_level_pids: Vec::new(),
            configured_procs: HashMap::new(),
            next_fault_action: FaultAction::Ignore,
            watchdog_claim: None,
            next_proc_id: 1,
            procs: HashMap::new(),
            start_calls: 0,
            stop_calls: 0,
            next_proc_pid: 20_000,
        }
    }

    pub fn with_start_failure(mut self) -> Self {
        self.start_result = Err(AppOpError::Fault);
        self
    }

    pub fn with_top_level_pid(mut self, pid: Pid) -> Self {
        self.top_level_pids.push(pid);
        self
    }

    pub fn with_configured_proc(mut self, name: impl Into<String>) -> Self {
        self.configured_procs.insert(name.into(), ProcState::Stopped);
        self
    }

    pub fn with_fault_action(mut self, action: FaultAction) -> Self {
        self.next_fault_action = action;
        self
    }

    pub fn with_watchdog_claim(mut self, proc_id: u32, action: WatchdogAction) -> Self {
        self.watchdog_claim = Some((proc_id, action));
        self
    }

    /// Test helper: simulate the child reaper driving this app to STOPPED,
    /// as would happen after `stop()` and a later SIGCHLD for its last
    /// child.
    pub fn force_stopped(&mut self) {
        self.state = AppState::Stopped;
    }

    pub fn start_call_count(&self) -> u32 {
        self.start_calls
    }

    pub fn stop_call_count(&self) -> u32 {
        self.stop_calls
    }
}

impl Application for FakeApplication {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }

    fn start(&mut self) -> Result<(), AppOpError> {
        self.start_calls += 1;
        if self.start_result.is_ok() {
            self.state = AppState::Running;
        }
        self.start_result
    }

    fn stop(&mut self) {
        self.stop_calls += 1;
        // Real applications stop asynchronously; tests drive the eventual
        // STOPPED transition explicitly via `force_stopped`.
    }

    fn state(&self) -> AppState {
        self.state
    }

    fn has_top_level_proc(&self, pid: Pid) -> bool {
        self.top_level_pids.contains(&pid)
    }

    fn proc_state(&self, proc_name: &str) -> ProcState {
        self.configured_procs.get(proc_name).copied().unwrap_or(ProcState::Stopped)
    }

    fn sigchild_notify(&mut self, _pid: Pid, _status: ChildExitStatus) -> FaultAction {
        self.next_fault_action
    }

    fn watchdog_notify(&mut self, proc_id: u32) -> WatchdogAction {
        match self.watchdog_claim {
            Some((claimed_id, action)) if claimed_id == proc_id => action,
            _ => WatchdogAction::NotFound,
        }
    }

    fn create_proc(
        &mut self,
        proc_name: Option<&str>,
        exec_path: Option<&str>,
    ) -> Result<ProcRef, AppOpError> {
        if proc_name.is_none() && exec_path.is_none() {
            return Err(AppOpError::Invalid);
        }
        let proc_ref = ProcRef(self.next_proc_id);
        self.next_proc_id += 1;
        self.procs.insert(proc_ref, FakeProc::default());
        Ok(proc_ref)
    }

    fn set_proc_stdin(&mut self, _proc: ProcRef, _fd: Option<i32>) {}
    fn set_proc_stdout(&mut self, _proc: ProcRef, _fd: Option<i32>) {}
    fn set_proc_stderr(&mut self, _proc: ProcRef, _fd: Option<i32>) {}

    fn add_proc_arg(&mut self, proc: ProcRef, arg: &str) -> Result<(), AppOpError> {
        let p = self.procs.get_mut(&proc).ok_or(AppOpError::Invalid)?;
        p.args.push(arg.to_string());
        Ok(())
    }

    fn clear_proc_args(&mut self, proc: ProcRef) {
        if let Some(p) = self.procs.get_mut(&proc) {
            p.args.clear();
        }
    }

    fn set_proc_priority(&mut self, proc: ProcRef, priority: Priority) -> Result<(), AppOpError> {
        let p = self.procs.get_mut(&proc).ok_or(AppOpError::Invalid)?;
        p.priority = Some(priority);
        Ok(())
    }

    fn clear_proc_priority(&mut self, proc: ProcRef) {
        if let Some(p) = self.procs.get_mut(&proc) {
            p.priority = None;
        }
    }

    fn set_proc_fault_action(&mut self, proc: ProcRef, action: ProcFaultAction) {
        if let Some(p) = self.procs.get_mut(&proc) {
            p.fault_action = Some(action);
        }
    }

    fn clear_proc_fault_action(&mut self, proc: ProcRef) {
        if let Some(p) = self.procs.get_mut(&proc) {
            p.fault_action = None;
        }
    }

    fn start_proc(&mut self, proc: ProcRef) -> Result<(), AppOpError> {
        let pid = self.next_proc_pid;
        self.next_proc_pid += 1;
        let p = self.procs.get_mut(&proc).ok_or(AppOpError::Invalid)?;
        p.started = true;
        p.pid = Some(pid);
        Ok(())
    }

    fn delete_proc(&mut self, proc: ProcRef) {
        self.procs.remove(&proc);
    }

    fn proc_pid(&self, proc: ProcRef) -> Option<Pid> {
        self.procs.get(&proc)?.pid
    }
}
