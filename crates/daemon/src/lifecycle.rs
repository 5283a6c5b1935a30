// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and shutdown sequencing (§4.1, §4.6): load the install
//! config, auto-start what's configured to start, bring up the reaper and
//! the Unix socket listener, then wait for a termination signal and drive
//! the shutdown cascade before exiting.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use crate::config_store::JsonConfigStore;
use crate::engine::{self, Command, Engine};
use crate::error::LifecycleError;
use crate::listener;
use crate::process_app::PidTable;
use crate::signal;
use asc_core::config::ConfigReader;

pub struct Daemon {
    commands: mpsc::UnboundedSender<Command>,
    engine_task: tokio::task::JoinHandle<()>,
    reaper_task: tokio::task::JoinHandle<()>,
    listener_task: tokio::task::JoinHandle<()>,
}

/// Brings up every long-running piece of the daemon and returns a handle
/// used to drive a graceful shutdown. The engine task is already running
/// auto-start by the time this returns.
pub async fn start(config_path: &Path, install_dir: PathBuf, socket_path: &Path) -> Result<Daemon, LifecycleError> {
    let store = match JsonConfigStore::load(config_path) {
        Ok(store) => store,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %config_path.display(), "no config file found, starting with no installed apps");
            JsonConfigStore::empty()
        }
        Err(source) => return Err(LifecycleError::Config { path: config_path.to_path_buf(), source }),
    };

    let install_order = store.installed_apps();
    let configs: HashMap<String, asc_core::config::AppConfig> = install_order
        .iter()
        .filter_map(|name| store.read_app_config(name).map(|c| (name.clone(), c)))
        .collect();

    let pid_table: PidTable = Arc::new(Mutex::new(HashMap::new()));
    let mut engine = Engine::new(configs, install_order, install_dir, pid_table.clone());
    engine.auto_start();

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (reap_tx, reap_rx) = mpsc::unbounded_channel();

    let reaper_task = signal::spawn_reaper(pid_table, reap_tx);
    let engine_task = tokio::spawn(engine::run(engine, cmd_rx, reap_rx));

    let bound = listener::bind(socket_path).await?;
    let listen_commands = cmd_tx.clone();
    let listener_task = tokio::spawn(listener::serve(bound, listen_commands));

    info!("supervisor ready");
    Ok(Daemon { commands: cmd_tx, engine_task, reaper_task, listener_task })
}

impl Daemon {
    /// Blocks until SIGTERM or SIGINT arrives.
    pub async fn wait_for_shutdown_signal(&self) {
        let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler, falling back to ctrl_c only");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = sigterm.recv() => info!("received SIGTERM"),
            _ = tokio::signal::ctrl_c() => info!("received SIGINT"),
        }
    }

    /// Drives the shutdown cascade to completion (§4.6) and tears down the
    /// background tasks. The listener and reaper are aborted once the
    /// cascade finishes; nothing past this point depends on either.
    pub async fn shutdown(self) {
        let (tx, rx) = oneshot::channel();
        if self.commands.send(Command::Shutdown { reply: tx }).is_ok() {
            let _ = rx.await;
        }
        self.listener_task.abort();
        self.reaper_task.abort();
        drop(self.commands);
        let _ = self.engine_task.await;
        info!("supervisor stopped");
    }
}
