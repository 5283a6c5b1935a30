// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The abstract interface this crate uses to read an application's
//! configuration (§4.1, §4.2). A concrete implementation (reading the
//! on-target JSON config tree) lives in `asc-daemon`; this crate only
//! consumes it.

use crate::application::{FaultAction, Priority, ProcFaultAction};

/// A single configured process entry under an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessConfig {
    pub name: String,
    pub exec_path: String,
    pub args: Vec<String>,
    pub priority: Priority,
    pub fault_action: ProcFaultAction,
}

/// An application's static configuration, as read from the config tree at
/// install time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub name: String,
    pub auto_start: bool,
    pub fault_action: FaultAction,
    pub processes: Vec<ProcessConfig>,
}

/// Abstracts over where configuration actually lives so this crate never
/// depends on a file format or IPC mechanism directly.
pub trait ConfigReader {
    /// Reads `app_name`'s configuration, or `None` if it is not installed.
    fn read_app_config(&self, app_name: &str) -> Option<AppConfig>;

    /// Lists every installed application name, in install order (auto-start
    /// iterates this list in order, §4.1).
    fn installed_apps(&self) -> Vec<String>;
}
