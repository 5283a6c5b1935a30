// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The SIGCHLD reaper (§4.5, §5): wakes on every `SIGCHLD`, drains every
//! exited child with a non-blocking peek-then-reap loop, and forwards each
//! owned one to the engine task with its owning application name resolved.
//!
//! §5 requires the owning application to be resolved *before* the child is
//! reaped, and §4.5 steps 2-3 require an unowned pid to be left unreaped
//! entirely rather than silently consumed. `waitid` with `WNOWAIT` gives
//! this crate a real peek: it reports a pid's exit status without clearing
//! the zombie, so [`reap_all`] can resolve ownership first and only then
//! issue a second `waitid` (without `WNOWAIT`) to actually consume it. A
//! pid that resolves to no known owner is left exactly as `WNOWAIT` found
//! it — for the outer supervisor (out of scope here, §1) to reap.

use asc_core::identity::{resolve_app_name, Pid, ResolveNameError, SecurityLabelSource};
use nix::sys::wait::{waitid, Id, WaitPidFlag, WaitStatus};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::process_app::PidTable;

/// One reaped child, with its owning application already resolved.
#[derive(Debug, Clone)]
pub struct ReapedChild {
    pub app_name: String,
    pub pid: Pid,
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
}

pub struct PidTableLabels(pub PidTable);

impl SecurityLabelSource for PidTableLabels {
    fn label_for_pid(&self, pid: Pid) -> Result<Option<String>, ResolveNameError> {
        let table = self.0.lock().map_err(|_| ResolveNameError::LookupFailed)?;
        Ok(table.get(&pid).map(|name| format!("{}{}", asc_core::identity::APP_LABEL_PREFIX, name)))
    }
}

/// Spawns the SIGCHLD listener task. Reaped children are sent on `tx`;
/// the caller (the engine task) is the only consumer, preserving the
/// single-writer discipline the rest of the daemon relies on.
pub fn spawn_reaper(pid_table: PidTable, tx: mpsc::UnboundedSender<ReapedChild>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut sigchld = match signal(SignalKind::child()) {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "failed to install SIGCHLD handler");
                return;
            }
        };
        let labels = PidTableLabels(pid_table);

        loop {
            if sigchld.recv().await.is_none() {
                debug!("SIGCHLD stream closed, stopping reaper");
                return;
            }
            reap_all(&labels, &tx);
        }
    })
}

fn reap_all(labels: &PidTableLabels, tx: &mpsc::UnboundedSender<ReapedChild>) {
    loop {
        // Peek: report the next exited child's status without reaping it
        // (§5 — the label/owner lookup must happen before the zombie is
        // consumed).
        let status = match waitid(Id::All, WaitPidFlag::WEXITED | WaitPidFlag::WNOHANG | WaitPidFlag::WNOWAIT) {
            Ok(WaitStatus::StillAlive) => return,
            Ok(status) => status,
            Err(nix::errno::Errno::ECHILD) => return,
            Err(e) => {
                warn!(error = %e, "waitid peek failed");
                return;
            }
        };
        let Some(pid) = status.pid() else { return };
        let pid_raw: Pid = pid.as_raw();

        let app_name = match resolve_app_name(labels, pid_raw) {
            Ok(name) => name,
            Err(ResolveNameError::NotAppProcess) => {
                // Not ours: leave it exactly as `WNOWAIT` found it and stop
                // this pass rather than spinning on the same zombie forever
                // (§4.5 steps 2-3, §7, §8 scenario 7).
                warn!(pid = pid_raw, "sigchld for pid not owned by any known application; leaving it unreaped");
                return;
            }
            Err(e) => {
                warn!(pid = pid_raw, error = ?e, "failed to resolve owning application; leaving it unreaped");
                return;
            }
        };

        // Ownership confirmed: consume the zombie for real.
        if let Err(e) = waitid(Id::Pid(pid), WaitPidFlag::WEXITED) {
            warn!(pid = pid_raw, error = %e, "failed to reap confirmed-owned child");
            return;
        }

        let (exit_code, signal) = match status {
            WaitStatus::Exited(_, code) => (Some(code), None),
            WaitStatus::Signaled(_, sig, _) => (None, Some(sig as i32)),
            _ => (None, None),
        };

        if tx.send(ReapedChild { app_name, pid: pid_raw, exit_code, signal }).is_err() {
            warn!("engine channel closed, dropping reaped child notification");
            return;
        }
    }
}
