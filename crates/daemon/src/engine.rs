// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single task that owns every mutable piece of supervision state.
//!
//! `ContainerRegistry` and `AppProcRegistry` are plain, unsynchronized
//! structs; the only thing enforcing the "one mutator at a time" invariant
//! the core crate assumes (§5) is that exactly one Tokio task ever touches
//! them, reached only by sending it a command over an mpsc channel and
//! awaiting the reply on a bundled oneshot. No `Mutex`, no `RwLock`: the
//! channel itself is the lock.

use asc_core::application::{Priority, ProcFaultAction};
use asc_core::appproc::{AppProcHandleId, AppProcRegistry, SessionId};
use asc_core::container::StopContinuation;
use asc_core::error::CoreError;
use asc_core::fault::{self, RebootRequester};
use asc_core::identity::AppName;
use asc_core::registry::{ContainerRegistry, StopHandlerOutcome};
use asc_core::{shutdown, watchdog};
use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::process_app::{PidTable, ProcessApplication};
use crate::signal::ReapedChild;

pub type Reply<T> = oneshot::Sender<Result<T, CoreError>>;

/// Every operation the engine task understands. Each variant carries the
/// oneshot it must reply on; `AppName`/string validation already happened
/// in the listener before a command is constructed.
pub enum Command {
    StartApp { name: String, reply: Reply<()> },
    StopApp { name: String, stop_cmd: asc_core::container::StopCmdRef, reply: Reply<()> },
    GetState { name: String, reply: Reply<asc_core::application::AppState> },
    GetProcState { name: String, proc_name: String, reply: Reply<asc_core::application::ProcState> },
    GetNameByPid { pid: i32, reply: Reply<String> },
    GetHash { name: String, reply: Reply<String> },
    WatchdogExpired { name: String, proc_id: u32, reply: Reply<asc_core::application::WatchdogAction> },

    AppProcCreate {
        session: SessionId,
        app_name: String,
        proc_name: Option<String>,
        exec_path: Option<String>,
        reply: Reply<AppProcHandleId>,
    },
    AppProcSetStdin { handle: AppProcHandleId, fd: Option<i32>, reply: Reply<()> },
    AppProcSetStdout { handle: AppProcHandleId, fd: Option<i32>, reply: Reply<()> },
    AppProcSetStderr { handle: AppProcHandleId, fd: Option<i32>, reply: Reply<()> },
    AppProcAddArg { handle: AppProcHandleId, arg: String, reply: Reply<()> },
    AppProcClearArgs { handle: AppProcHandleId, reply: Reply<()> },
    AppProcSetPriority { handle: AppProcHandleId, priority: Priority, reply: Reply<()> },
    AppProcClearPriority { handle: AppProcHandleId, reply: Reply<()> },
    AppProcSetFaultAction { handle: AppProcHandleId, action: ProcFaultAction, reply: Reply<()> },
    AppProcClearFaultAction { handle: AppProcHandleId, reply: Reply<()> },
    AppProcAddStopHandler { handle: AppProcHandleId, reply: Reply<AppProcHandleId> },
    AppProcRemoveStopHandler { handle: AppProcHandleId, reply: Reply<()> },
    AppProcStart { handle: AppProcHandleId, reply: Reply<()> },
    AppProcDelete { handle: AppProcHandleId, reply: Reply<()> },

    /// Registers the push half of a connection so the engine can deliver
    /// unsolicited `ProcStopped` notifications (§4.8) to the session that
    /// registered a stop handler. Sent once, right after the `Hello`
    /// handshake, before any other command from that session.
    RegisterSession { session: SessionId, push: mpsc::UnboundedSender<asc_wire::response::Response> },
    SessionClosed { session: SessionId },
    /// Delivered by the (out-of-scope) install/uninstall notification
    /// source for either kind of event; both are handled identically
    /// (§4.8, §9 Design Notes open question): only the Inactive entry, if
    /// any, is destroyed. A running Active application is left untouched
    /// either way.
    AppInstallEvent { name: String },
    AppUninstallEvent { name: String },
    Shutdown { reply: oneshot::Sender<()> },
}

struct DaemonReboot;

impl RebootRequester for DaemonReboot {
    fn request_reboot(&self, reason: &str) {
        tracing::error!(reason, "reboot requested; exec'ing system reboot is left to the init system");
    }
}

pub struct Engine {
    registry: ContainerRegistry,
    appprocs: AppProcRegistry,
    configs: HashMap<String, asc_core::config::AppConfig>,
    /// Names in the order they appeared in the install configuration, since
    /// `configs` itself is a `HashMap` and cannot answer that question.
    install_order: Vec<String>,
    install_dir: std::path::PathBuf,
    pid_table: PidTable,
    pending_stop_cmds: HashMap<asc_core::container::StopCmdRef, oneshot::Sender<Result<(), CoreError>>>,
    shutdown_waiters: Vec<oneshot::Sender<()>>,
    /// Push half of every live connection, keyed by session, used to deliver
    /// unsolicited `ProcStopped` notifications (§4.8). A session without a
    /// registered push channel (or one that has since disconnected) simply
    /// never receives one; nothing in the ad-hoc process facility depends on
    /// delivery succeeding.
    push_channels: HashMap<SessionId, mpsc::UnboundedSender<asc_wire::response::Response>>,
}

impl Engine {
    pub fn new(
        configs: HashMap<String, asc_core::config::AppConfig>,
        install_order: Vec<String>,
        install_dir: std::path::PathBuf,
        pid_table: PidTable,
    ) -> Self {
        Self {
            registry: ContainerRegistry::new(),
            appprocs: AppProcRegistry::new(),
            configs,
            install_order,
            install_dir,
            pid_table,
            pending_stop_cmds: HashMap::new(),
            shutdown_waiters: Vec::new(),
            push_channels: HashMap::new(),
        }
    }

    fn ensure_container(&mut self, name: &str) -> Result<(), CoreError> {
        let config = self.configs.get(name).ok_or(CoreError::NotFound)?.clone();
        let pid_table = self.pid_table.clone();
        self.registry.create_or_get(
            AppName::parse(name).map_err(|_| CoreError::Invalid)?,
            move || Box::new(ProcessApplication::new(config, pid_table)),
        );
        Ok(())
    }

    /// Runs the auto-start pass: every configured app whose `startManual` is
    /// not set to `true`, in config-file order (§4.1, §6).
    pub fn auto_start(&mut self) {
        let names: Vec<String> = self
            .install_order
            .iter()
            .filter(|name| self.configs.get(*name).is_some_and(|c| c.auto_start))
            .cloned()
            .collect();
        for name in names {
            if let Err(e) = self.start_app(&name) {
                warn!(app = name, error = ?e, "auto-start failed");
            }
        }
    }

    fn start_app(&mut self, name: &str) -> Result<(), CoreError> {
        self.ensure_container(name)?;
        self.registry.activate(name)?;
        let container = self.registry.get_active_mut(name).ok_or(CoreError::NotFound)?;
        container.app_mut().start().map_err(|_| CoreError::Fault)
    }

    /// Destroys `name`'s Inactive container and its ad-hoc handles, if any
    /// (§4.8 automatic cleanup). A no-op if `name` is unknown or currently
    /// Active: Active applications are never touched by install/uninstall
    /// events (§9 Design Notes open question — preserved as observed in
    /// the original rather than restarted to pick up new bits).
    fn handle_install_or_uninstall_event(&mut self, name: &str) {
        if self.registry.destroy_inactive(name).is_ok() {
            self.appprocs.delete_app_handles(&mut self.registry, name);
        }
    }

    fn stop_app(&mut self, name: &str, stop_cmd: asc_core::container::StopCmdRef) -> Result<(), CoreError> {
        if self.registry.get_active(name).is_none() {
            return Err(CoreError::NotFound);
        }
        self.registry.set_pending_stop_cmd(name, stop_cmd)?;
        self.registry.set_stop_handler(name, StopContinuation::RespondToStopCmd)?;

        let already_stopped = self.registry.get_active(name).map(|c| c.app().state())
            == Some(asc_core::application::AppState::Stopped);
        if already_stopped {
            self.fire_and_drain(name);
        } else {
            self.registry.get_active_mut(name).ok_or(CoreError::NotFound)?.app_mut().stop();
        }
        Ok(())
    }

    /// Fires a container's stop handler and drains any cascade/response
    /// follow-up it reports.
    fn fire_and_drain(&mut self, name: &str) {
        let outcome = self.registry.fire_stop_handler(name);
        self.drain_outcome(outcome);
    }

    fn drain_outcome(&mut self, outcome: StopHandlerOutcome) {
        match outcome {
            StopHandlerOutcome::RespondToStopCmd(cmd) => {
                if let Some(reply) = self.pending_stop_cmds.remove(&cmd) {
                    let _ = reply.send(Ok(()));
                }
            }
            StopHandlerOutcome::ContinueShutdown => {
                let progress = shutdown::continue_shutdown(&mut self.registry);
                self.handle_shutdown_progress(progress);
            }
            StopHandlerOutcome::None => {}
        }
    }

    fn handle_shutdown_progress(&mut self, progress: shutdown::ShutdownProgress) {
        if let shutdown::ShutdownProgress::Complete = progress {
            info!("shutdown cascade finished");
            for waiter in self.shutdown_waiters.drain(..) {
                let _ = waiter.send(());
            }
        }
    }

    /// Handles one reaped child (§4.5, §5): runs the fault engine, then
    /// drains whatever stop-handler outcome falls out of it.
    pub fn handle_reaped_child(&mut self, child: ReapedChild) {
        let status = asc_core::application::ChildExitStatus {
            exit_code: child.exit_code,
            signal: child.signal,
        };
        let outcome = fault::handle_sigchild(&mut self.registry, &DaemonReboot, child.pid, status);
        if let fault::FaultOutcome::AppStopping { .. } = outcome {
            let stop_outcome = self.registry.fire_stop_handler(&child.app_name);
            self.drain_outcome(stop_outcome);
        }

        // An ad-hoc process is never a *configured* process, so the fault
        // engine above never recognizes its pid; check the stop-watch table
        // independently of whatever `outcome` came back (§4.8).
        if let Some((handler_ref, session)) = self.appprocs.take_stop_watch(child.pid) {
            self.push(session, asc_wire::response::Response::ProcStopped { handler_ref: handler_ref.to_string() });
        }
    }

    fn push(&mut self, session: SessionId, response: asc_wire::response::Response) {
        if let Some(tx) = self.push_channels.get(&session) {
            let _ = tx.send(response);
        }
    }

    pub fn start_shutdown(&mut self) {
        let progress = shutdown::start_shutdown(&mut self.registry);
        self.handle_shutdown_progress(progress);
    }

    pub fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::StartApp { name, reply } => {
                let _ = reply.send(self.start_app(&name));
            }
            Command::StopApp { name, stop_cmd, reply } => {
                match self.stop_app(&name, stop_cmd) {
                    Ok(()) => {
                        self.pending_stop_cmds.insert(stop_cmd, reply);
                    }
                    Err(e) => {
                        let _ = reply.send(Err(e));
                    }
                }
            }
            Command::GetState { name, reply } => {
                let result = self
                    .registry
                    .get(&name)
                    .map(|c| c.app().state())
                    .ok_or(CoreError::NotFound);
                let _ = reply.send(result);
            }
            Command::GetProcState { name, proc_name, reply } => {
                let result = self
                    .registry
                    .get(&name)
                    .map(|c| c.app().proc_state(&proc_name))
                    .ok_or(CoreError::NotFound);
                let _ = reply.send(result);
            }
            Command::GetNameByPid { pid, reply } => {
                let result = self
                    .registry
                    .get_active_by_pid(pid)
                    .map(|c| c.name().as_str().to_string())
                    .ok_or(CoreError::NotFound);
                let _ = reply.send(result);
            }
            Command::GetHash { name, reply } => {
                let result = if self.configs.contains_key(&name) {
                    crate::properties::read_properties(&self.install_dir, &name)
                        .ok()
                        .and_then(|p| p.md5().map(str::to_string))
                        .ok_or(CoreError::NotFound)
                } else {
                    Err(CoreError::NotFound)
                };
                let _ = reply.send(result);
            }
            Command::WatchdogExpired { name, proc_id, reply } => {
                let result = match AppName::parse(&name) {
                    Ok(app_name) => {
                        let outcome = watchdog::handle_watchdog_expiry(
                            &mut self.registry,
                            &DaemonReboot,
                            &app_name,
                            proc_id,
                        );
                        let action = match outcome {
                            watchdog::WatchdogOutcome::Handled => asc_core::application::WatchdogAction::Handled,
                            watchdog::WatchdogOutcome::NotFound => asc_core::application::WatchdogAction::NotFound,
                            watchdog::WatchdogOutcome::Error => asc_core::application::WatchdogAction::Error,
                            watchdog::WatchdogOutcome::AppStopping { .. } => {
                                let stop_outcome = self.registry.fire_stop_handler(&name);
                                self.drain_outcome(stop_outcome);
                                asc_core::application::WatchdogAction::Handled
                            }
                        };
                        Ok(action)
                    }
                    Err(_) => Err(CoreError::Invalid),
                };
                let _ = reply.send(result);
            }

            Command::AppProcCreate { session, app_name, proc_name, exec_path, reply } => {
                // Materializes a fresh Inactive container if `app_name` is
                // installed but has never been launched (§4.8:
                // `create_or_get`, not `get_active`).
                let result = self.ensure_container(&app_name).and_then(|()| {
                    self.appprocs.create(
                        &mut self.registry,
                        session,
                        &app_name,
                        proc_name.as_deref(),
                        exec_path.as_deref(),
                    )
                });
                let _ = reply.send(result);
            }
            Command::AppProcSetStdin { handle, fd, reply } => {
                let _ = reply.send(self.appprocs.set_stdin(&mut self.registry, &handle, fd));
            }
            Command::AppProcSetStdout { handle, fd, reply } => {
                let _ = reply.send(self.appprocs.set_stdout(&mut self.registry, &handle, fd));
            }
            Command::AppProcSetStderr { handle, fd, reply } => {
                let _ = reply.send(self.appprocs.set_stderr(&mut self.registry, &handle, fd));
            }
            Command::AppProcAddArg { handle, arg, reply } => {
                let _ = reply.send(self.appprocs.add_arg(&mut self.registry, &handle, &arg));
            }
            Command::AppProcClearArgs { handle, reply } => {
                let _ = reply.send(self.appprocs.clear_args(&mut self.registry, &handle));
            }
            Command::AppProcSetPriority { handle, priority, reply } => {
                let _ = reply.send(self.appprocs.set_priority(&mut self.registry, &handle, priority));
            }
            Command::AppProcClearPriority { handle, reply } => {
                let _ = reply.send(self.appprocs.clear_priority(&mut self.registry, &handle));
            }
            Command::AppProcSetFaultAction { handle, action, reply } => {
                let _ = reply.send(self.appprocs.set_fault_action(&mut self.registry, &handle, action));
            }
            Command::AppProcClearFaultAction { handle, reply } => {
                let _ = reply.send(self.appprocs.clear_fault_action(&mut self.registry, &handle));
            }
            Command::AppProcAddStopHandler { handle, reply } => {
                let _ = reply.send(self.appprocs.add_stop_handler(&handle));
            }
            Command::AppProcRemoveStopHandler { handle, reply } => {
                let _ = reply.send(self.appprocs.remove_stop_handler(&handle));
            }
            Command::AppProcStart { handle, reply } => {
                let _ = reply.send(self.appprocs.start(&mut self.registry, &handle));
            }
            Command::AppProcDelete { handle, reply } => {
                let _ = reply.send(self.appprocs.delete(&mut self.registry, &handle));
            }

            Command::RegisterSession { session, push } => {
                self.push_channels.insert(session, push);
            }
            Command::SessionClosed { session } => {
                self.push_channels.remove(&session);
                self.appprocs.delete_session_handles(&mut self.registry, session);
            }
            Command::AppInstallEvent { name } | Command::AppUninstallEvent { name } => {
                self.handle_install_or_uninstall_event(&name);
            }
            Command::Shutdown { reply } => {
                self.shutdown_waiters.push(reply);
                self.start_shutdown();
            }
        }
    }
}

/// Runs the engine's event loop until both channels are closed. `commands`
/// carries client-driven requests; `reaped` carries SIGCHLD-driven
/// notifications. A single `select!` over both is what makes "the channel
/// is the lock" true: only one branch body runs at a time.
pub async fn run(
    mut engine: Engine,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut reaped: mpsc::UnboundedReceiver<ReapedChild>,
) {
    loop {
        tokio::select! {
            cmd = commands.recv() => {
                match cmd {
                    Some(cmd) => engine.handle(cmd),
                    None => return,
                }
            }
            child = reaped.recv() => {
                match child {
                    Some(child) => engine.handle_reaped_child(child),
                    None => return,
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
