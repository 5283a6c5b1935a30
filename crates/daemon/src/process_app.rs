// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`Application`] implementation that actually launches processes: a
//! process-group of `std::process::Child`s per configured process, plus
//! whatever ad-hoc processes the [`asc_core::appproc`] facility builds.
//!
//! Spawns with `std::process::Command` rather than `tokio::process::Command`
//! deliberately: this daemon owns child reaping end-to-end through
//! [`crate::signal`]'s own peek-then-reap loop, and letting tokio's own
//! process driver also reap the same children races it (`ECHILD` surprises
//! on whichever side loses). A `std::process::Child` that is simply dropped
//! here leaves the exited process as a zombie for our own reaper to collect,
//! which is exactly what we want.

use asc_core::application::{
    AppOpError, AppState, Application, ChildExitStatus, FaultAction, Priority, ProcFaultAction,
    ProcRef, ProcState, WatchdogAction,
};
use asc_core::config::AppConfig;
use asc_core::identity::Pid;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid as NixPid;
use std::collections::HashMap;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Shared table mapping every live top-level child pid back to the
/// application that owns it. [`crate::signal::LabelTable`] reads this
/// directly to implement [`asc_core::identity::SecurityLabelSource`]
/// without touching `/proc`.
pub type PidTable = Arc<Mutex<HashMap<Pid, String>>>;

struct RunningProc {
    pid: Pid,
    // Keeps the OS-level process handle (and its stdio pipes) alive; never
    // awaited or killed through it directly.
    _child: std::process::Child,
}

struct AdHocProc {
    exec_path: String,
    args: Vec<String>,
    priority: Option<Priority>,
    fault_action: Option<ProcFaultAction>,
    stdin: Option<i32>,
    stdout: Option<i32>,
    stderr: Option<i32>,
    running: Option<RunningProc>,
}

pub struct ProcessApplication {
    name: String,
    config: AppConfig,
    pid_table: PidTable,
    state: AppState,
    stopping: bool,
    configured: HashMap<String, Option<RunningProc>>,
    adhoc: HashMap<ProcRef, AdHocProc>,
    next_proc_id: u64,
}

impl std::fmt::Debug for ProcessApplication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessApplication")
            .field("name", &self.name)
            .field("state", &self.state)
            .finish()
    }
}

impl ProcessApplication {
    pub fn new(config: AppConfig, pid_table: PidTable) -> Self {
        let configured = config.processes.iter().map(|p| (p.name.clone(), None)).collect();
        Self {
            name: config.name.clone(),
            config,
            pid_table,
            state: AppState::Stopped,
            stopping: false,
            configured,
            adhoc: HashMap::new(),
            next_proc_id: 1,
        }
    }

    fn spawn(exec_path: &str, args: &[String], stdin: Option<i32>, stdout: Option<i32>, stderr: Option<i32>) -> Result<std::process::Child, std::io::Error> {
        let mut cmd = Command::new(exec_path);
        cmd.args(args);
        cmd.stdin(fd_to_stdio(stdin));
        cmd.stdout(fd_to_stdio(stdout));
        cmd.stderr(fd_to_stdio(stderr));
        cmd.spawn()
    }

    fn track_pid(&self, pid: Pid) {
        self.pid_table.lock().expect("pid table poisoned").insert(pid, self.name.clone());
    }

    fn untrack_pid(&self, pid: Pid) {
        self.pid_table.lock().expect("pid table poisoned").remove(&pid);
    }

    fn any_configured_running(&self) -> bool {
        self.configured.values().any(|p| p.is_some())
    }
}

/// Maps an ad-hoc process's requested stdio fd to a `Stdio` the child
/// inherits at spawn time. Adopting an arbitrary caller-supplied raw fd
/// would require `unsafe`, which this crate forbids; `Some` is treated as
/// "inherit the daemon's own stream of that kind" rather than duplicating
/// the numeric fd, which covers the common "hook up my stdout" case without
/// unsafe code.
fn fd_to_stdio(fd: Option<i32>) -> Stdio {
    match fd {
        None => Stdio::null(),
        Some(_) => Stdio::inherit(),
    }
}

impl Application for ProcessApplication {
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
        self.stopping = false;
        for proc in &self.config.processes {
            let child = Self::spawn(&proc.exec_path, &proc.args, None, None, None).map_err(|e| {
                warn!(app = %self.name, proc = %proc.name, error = %e, "failed to spawn configured process");
                AppOpError::Fault
            })?;
            let pid = child.id() as Pid;
            self.track_pid(pid);
            self.configured.insert(proc.name.clone(), Some(RunningProc { pid, _child: child }));
        }
        self.state = AppState::Running;
        Ok(())
    }

    fn stop(&mut self) {
        self.stopping = true;
        for running in self.configured.values().flatten() {
            let _ = signal::kill(NixPid::from_raw(running.pid), Signal::SIGTERM);
        }
        if !self.any_configured_running() {
            self.state = AppState::Stopped;
        }
    }

    fn state(&self) -> AppState {
        self.state
    }

    fn has_top_level_proc(&self, pid: Pid) -> bool {
        self.configured.values().flatten().any(|p| p.pid == pid)
            || self.adhoc.values().filter_map(|p| p.running.as_ref()).any(|r| r.pid == pid)
    }

    fn proc_state(&self, proc_name: &str) -> ProcState {
        match self.configured.get(proc_name) {
            Some(Some(_)) => ProcState::Running,
            _ => ProcState::Stopped,
        }
    }

    fn sigchild_notify(&mut self, pid: Pid, _status: ChildExitStatus) -> FaultAction {
        self.untrack_pid(pid);

        if let Some(name) = self.configured.iter().find(|(_, p)| matches!(p, Some(r) if r.pid == pid)).map(|(n, _)| n.clone()) {
            self.configured.insert(name, None);
            if !self.any_configured_running() {
                self.state = AppState::Stopped;
                if self.stopping {
                    self.stopping = false;
                    return FaultAction::Ignore;
                }
                return self.config.fault_action;
            }
            return FaultAction::Ignore;
        }

        if let Some((_, adhoc)) = self.adhoc.iter_mut().find(|(_, p)| matches!(&p.running, Some(r) if r.pid == pid)) {
            adhoc.running = None;
        }
        FaultAction::Ignore
    }

    fn watchdog_notify(&mut self, _proc_id: u32) -> WatchdogAction {
        // Watchdog timers are registered and owned by each configured
        // process at spawn time in a full implementation; this daemon does
        // not yet wire a timer source, so every expiry is reported as
        // belonging to no known process.
        WatchdogAction::NotFound
    }

    fn create_proc(
        &mut self,
        proc_name: Option<&str>,
        exec_path: Option<&str>,
    ) -> Result<ProcRef, AppOpError> {
        let (exec_path, args, priority, fault_action) = if let Some(proc_name) = proc_name {
            let configured = self
                .config
                .processes
                .iter()
                .find(|p| p.name == proc_name)
                .ok_or(AppOpError::Invalid)?;
            (
                configured.exec_path.clone(),
                configured.args.clone(),
                Some(configured.priority),
                Some(configured.fault_action),
            )
        } else {
            (exec_path.ok_or(AppOpError::Invalid)?.to_string(), Vec::new(), None, None)
        };

        let proc_ref = ProcRef(self.next_proc_id);
        self.next_proc_id += 1;
        self.adhoc.insert(
            proc_ref,
            AdHocProc {
                exec_path,
                args,
                priority,
                fault_action,
                stdin: None,
                stdout: None,
                stderr: None,
                running: None,
            },
        );
        Ok(proc_ref)
    }

    fn set_proc_stdin(&mut self, proc: ProcRef, fd: Option<i32>) {
        if let Some(p) = self.adhoc.get_mut(&proc) {
            p.stdin = fd;
        }
    }

    fn set_proc_stdout(&mut self, proc: ProcRef, fd: Option<i32>) {
        if let Some(p) = self.adhoc.get_mut(&proc) {
            p.stdout = fd;
        }
    }

    fn set_proc_stderr(&mut self, proc: ProcRef, fd: Option<i32>) {
        if let Some(p) = self.adhoc.get_mut(&proc) {
            p.stderr = fd;
        }
    }

    fn add_proc_arg(&mut self, proc: ProcRef, arg: &str) -> Result<(), AppOpError> {
        let p = self.adhoc.get_mut(&proc).ok_or(AppOpError::Invalid)?;
        p.args.push(arg.to_string());
        Ok(())
    }

    fn clear_proc_args(&mut self, proc: ProcRef) {
        if let Some(p) = self.adhoc.get_mut(&proc) {
            p.args.clear();
        }
    }

    fn set_proc_priority(&mut self, proc: ProcRef, priority: Priority) -> Result<(), AppOpError> {
        let p = self.adhoc.get_mut(&proc).ok_or(AppOpError::Invalid)?;
        p.priority = Some(priority);
        Ok(())
    }

    fn clear_proc_priority(&mut self, proc: ProcRef) {
        if let Some(p) = self.adhoc.get_mut(&proc) {
            p.priority = None;
        }
    }

    fn set_proc_fault_action(&mut self, proc: ProcRef, action: ProcFaultAction) {
        if let Some(p) = self.adhoc.get_mut(&proc) {
            p.fault_action = Some(action);
        }
    }

    fn clear_proc_fault_action(&mut self, proc: ProcRef) {
        if let Some(p) = self.adhoc.get_mut(&proc) {
            p.fault_action = None;
        }
    }

    fn start_proc(&mut self, proc: ProcRef) -> Result<(), AppOpError> {
        let p = self.adhoc.get_mut(&proc).ok_or(AppOpError::Invalid)?;
        let child = Self::spawn(&p.exec_path, &p.args, p.stdin, p.stdout, p.stderr)
            .map_err(|_| AppOpError::Fault)?;
        let pid = child.id() as Pid;
        p.running = Some(RunningProc { pid, _child: child });
        self.track_pid(pid);
        Ok(())
    }

    fn delete_proc(&mut self, proc: ProcRef) {
        if let Some(p) = self.adhoc.remove(&proc) {
            if let Some(running) = p.running {
                let _ = signal::kill(NixPid::from_raw(running.pid), Signal::SIGKILL);
                self.untrack_pid(running.pid);
            }
        }
    }

    fn proc_pid(&self, proc: ProcRef) -> Option<Pid> {
        self.adhoc.get(&proc)?.running.as_ref().map(|r| r.pid)
    }
}

#[cfg(test)]
#[path = "process_app_tests.rs"]
mod tests;
