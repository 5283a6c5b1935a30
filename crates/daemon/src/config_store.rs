// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk [`ConfigReader`] implementation: a single JSON document listing
//! every installed application, read once at startup (§4.1, §4.2).
//!
//! ```json
//! {
//!   "apps": [
//!     {
//!       "name": "helloWorld",
//!       "startManual": false,
//!       "faultAction": "restartApp",
//!       "processes": [
//!         { "name": "worker", "execPath": "/opt/legato/apps/helloWorld/bin/worker",
//!           "args": ["--flag"], "priority": "medium", "faultAction": "restartProc" }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! `startManual` defaults to `false` (§6): an app missing the key is
//! auto-started unless it opts out.

use asc_core::application::{FaultAction, Priority, ProcFaultAction};
use asc_core::config::{AppConfig, ConfigReader, ProcessConfig};
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Deserialize)]
struct ConfigFile {
    apps: Vec<RawApp>,
}

#[derive(Debug, Deserialize)]
struct RawApp {
    name: String,
    #[serde(rename = "startManual", default)]
    start_manual: bool,
    #[serde(rename = "faultAction", default = "default_fault_action")]
    fault_action: String,
    #[serde(default)]
    processes: Vec<RawProcess>,
}

#[derive(Debug, Deserialize)]
struct RawProcess {
    name: String,
    #[serde(rename = "execPath")]
    exec_path: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default = "default_priority")]
    priority: String,
    #[serde(rename = "faultAction", default = "default_proc_fault_action")]
    fault_action: String,
}

fn default_fault_action() -> String {
    "ignore".to_string()
}

fn default_priority() -> String {
    "medium".to_string()
}

fn default_proc_fault_action() -> String {
    "ignore".to_string()
}

fn parse_fault_action(s: &str) -> FaultAction {
    match s {
        "restartApp" => FaultAction::RestartApp,
        "stopApp" => FaultAction::StopApp,
        "reboot" => FaultAction::Reboot,
        _ => FaultAction::Ignore,
    }
}

fn parse_proc_fault_action(s: &str) -> ProcFaultAction {
    match s {
        "restartProc" => ProcFaultAction::RestartProc,
        "restartApp" => ProcFaultAction::RestartApp,
        "stopApp" => ProcFaultAction::StopApp,
        "reboot" => ProcFaultAction::Reboot,
        _ => ProcFaultAction::Ignore,
    }
}

/// In-memory config tree, loaded once from `ASC_CONFIG_PATH` at startup.
/// The original reads its config tree live on every query; this crate
/// reads it once because the supervisor is the only writer of its own
/// config file within a single run, and re-parsing JSON per query buys
/// nothing.
#[derive(Debug)]
pub struct JsonConfigStore {
    apps: Vec<AppConfig>,
}

impl JsonConfigStore {
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let file: ConfigFile = serde_json::from_str(&contents).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e)
        })?;
        Ok(Self::from_raw(file))
    }

    pub fn empty() -> Self {
        Self { apps: Vec::new() }
    }

    fn from_raw(file: ConfigFile) -> Self {
        let apps = file
            .apps
            .into_iter()
            .map(|raw| AppConfig {
                name: raw.name,
                // `startManual: true` suppresses auto-start; default `false`
                // means auto-started (§6).
                auto_start: !raw.start_manual,
                fault_action: parse_fault_action(&raw.fault_action),
                processes: raw
                    .processes
                    .into_iter()
                    .filter_map(|p| {
                        let priority = Priority::parse(&p.priority).unwrap_or_else(|| {
                            warn!(proc = %p.name, priority = %p.priority, "invalid priority, defaulting to medium");
                            Priority::Medium
                        });
                        Some(ProcessConfig {
                            name: p.name,
                            exec_path: p.exec_path,
                            args: p.args,
                            priority,
                            fault_action: parse_proc_fault_action(&p.fault_action),
                        })
                    })
                    .collect(),
            })
            .collect();
        Self { apps }
    }
}

impl ConfigReader for JsonConfigStore {
    fn read_app_config(&self, app_name: &str) -> Option<AppConfig> {
        self.apps.iter().find(|a| a.name == app_name).cloned()
    }

    fn installed_apps(&self) -> Vec<String> {
        self.apps.iter().map(|a| a.name.clone()).collect()
    }
}

#[cfg(test)]
#[path = "config_store_tests.rs"]
mod tests;
