// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire-visible mirrors of the core's domain types. Kept separate from
//! `asc-core`'s own types so a protocol version bump never forces a core
//! API change, and vice versa.

use asc_core::application::{AppState, FaultAction, ProcFaultAction, ProcState, WatchdogAction};
use asc_core::error::CoreError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireAppState {
    Running,
    Stopped,
}

impl From<AppState> for WireAppState {
    fn from(s: AppState) -> Self {
        match s {
            AppState::Running => Self::Running,
            AppState::Stopped => Self::Stopped,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireProcState {
    Running,
    Stopped,
}

impl From<ProcState> for WireProcState {
    fn from(s: ProcState) -> Self {
        match s {
            ProcState::Running => Self::Running,
            ProcState::Stopped => Self::Stopped,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFaultAction {
    Ignore,
    RestartApp,
    StopApp,
    Reboot,
}

impl From<FaultAction> for WireFaultAction {
    fn from(a: FaultAction) -> Self {
        match a {
            FaultAction::Ignore => Self::Ignore,
            FaultAction::RestartApp => Self::RestartApp,
            FaultAction::StopApp => Self::StopApp,
            FaultAction::Reboot => Self::Reboot,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireProcFaultAction {
    Ignore,
    RestartProc,
    RestartApp,
    StopApp,
    Reboot,
}

impl From<ProcFaultAction> for WireProcFaultAction {
    fn from(a: ProcFaultAction) -> Self {
        match a {
            ProcFaultAction::Ignore => Self::Ignore,
            ProcFaultAction::RestartProc => Self::RestartProc,
            ProcFaultAction::RestartApp => Self::RestartApp,
            ProcFaultAction::StopApp => Self::StopApp,
            ProcFaultAction::Reboot => Self::Reboot,
        }
    }
}

impl From<WireProcFaultAction> for ProcFaultAction {
    fn from(a: WireProcFaultAction) -> Self {
        match a {
            WireProcFaultAction::Ignore => Self::Ignore,
            WireProcFaultAction::RestartProc => Self::RestartProc,
            WireProcFaultAction::RestartApp => Self::RestartApp,
            WireProcFaultAction::StopApp => Self::StopApp,
            WireProcFaultAction::Reboot => Self::Reboot,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireWatchdogAction {
    Ignore,
    Handled,
    RestartApp,
    StopApp,
    Reboot,
    NotFound,
    Error,
}

impl From<WatchdogAction> for WireWatchdogAction {
    fn from(a: WatchdogAction) -> Self {
        match a {
            WatchdogAction::Ignore => Self::Ignore,
            WatchdogAction::Handled => Self::Handled,
            WatchdogAction::RestartApp => Self::RestartApp,
            WatchdogAction::StopApp => Self::StopApp,
            WatchdogAction::Reboot => Self::Reboot,
            WatchdogAction::NotFound => Self::NotFound,
            WatchdogAction::Error => Self::Error,
        }
    }
}

/// Wire form of [`CoreError`], the result code every fallible `Response`
/// variant reports on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireError {
    NotFound,
    AlreadyRunning,
    NotPermitted,
    Invalid,
    Overflow,
    Duplicate,
    Fault,
    IoError,
}

impl From<CoreError> for WireError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::NotFound => Self::NotFound,
            CoreError::AlreadyRunning => Self::AlreadyRunning,
            CoreError::NotPermitted => Self::NotPermitted,
            CoreError::Invalid => Self::Invalid,
            CoreError::Overflow => Self::Overflow,
            CoreError::Duplicate => Self::Duplicate,
            CoreError::Fault => Self::Fault,
            CoreError::IoError => Self::IoError,
        }
    }
}
