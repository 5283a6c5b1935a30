// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watchdog expiry handling (§4.6).
//!
//! Preserves a quirk of the original implementation rather than "fixing"
//! it: a `Reboot` watchdog action both requests the reboot *and* falls
//! through into the same handling as `RestartApp`, instead of stopping at
//! the reboot request. The original's `switch` statement is missing a
//! `break` between the two cases. Multiple watchdog-driven deployments
//! depend on the app also being restarted (the reboot is asynchronous and
//! may not happen before the next watchdog interval), so this is kept
//! rather than corrected.

use crate::application::{AppState, WatchdogAction};
use crate::container::StopContinuation;
use crate::fault::RebootRequester;
use crate::identity::AppName;
use crate::registry::ContainerRegistry;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogOutcome {
    /// The application (or the process within it) handled the expiry
    /// itself; no app-level action taken.
    Handled,
    /// `proc_id` is not owned by this application.
    NotFound,
    /// The application reported an internal error processing the expiry.
    Error,
    AppStopping { continuation: StopContinuation },
}

/// Applies a watchdog expiry reported against `app_name`/`proc_id`.
pub fn handle_watchdog_expiry(
    registry: &mut ContainerRegistry,
    reboot: &dyn RebootRequester,
    app_name: &AppName,
    proc_id: u32,
) -> WatchdogOutcome {
    let Some(container) = registry.get_active_mut(app_name.as_str()) else {
        warn!(app = %app_name, "watchdog expiry for an application that is not active");
        return WatchdogOutcome::NotFound;
    };
    let action = container.app_mut().watchdog_notify(proc_id);

    match action {
        WatchdogAction::Ignore | WatchdogAction::Handled => WatchdogOutcome::Handled,
        WatchdogAction::NotFound => {
            warn!(app = %app_name, proc_id, "watchdog expiry for unknown process id");
            WatchdogOutcome::NotFound
        }
        WatchdogAction::Error => {
            error!(app = %app_name, proc_id, "application reported an error handling watchdog expiry");
            WatchdogOutcome::Error
        }
        WatchdogAction::StopApp => {
            info!(app = %app_name, "watchdog expiry: stopping application");
            stop_with_continuation(registry, app_name.as_str(), StopContinuation::Deactivate)
        }
        WatchdogAction::RestartApp => {
            info!(app = %app_name, "watchdog expiry: restarting application");
            stop_with_continuation(registry, app_name.as_str(), StopContinuation::Restart)
        }
        WatchdogAction::Reboot => {
            error!(app = %app_name, "watchdog expiry: rebooting device");
            reboot.request_reboot(app_name.as_str());
            // Falls through to the restart handling below rather than
            // returning here; see module docs.
            info!(app = %app_name, "watchdog expiry: also restarting application after reboot request");
            stop_with_continuation(registry, app_name.as_str(), StopContinuation::Restart)
        }
    }
}

fn stop_with_continuation(
    registry: &mut ContainerRegistry,
    app_name: &str,
    continuation: StopContinuation,
) -> WatchdogOutcome {
    let Some(container) = registry.get_active_mut(app_name) else {
        return WatchdogOutcome::NotFound;
    };
    if container.app().state() == AppState::Stopped {
        let _ = registry.set_stop_handler(app_name, continuation);
        registry.fire_stop_handler(app_name);
        return WatchdogOutcome::AppStopping { continuation };
    }
    let _ = registry.set_stop_handler(app_name, continuation);
    container.app_mut().stop();
    WatchdogOutcome::AppStopping { continuation }
}

#[cfg(test)]
#[path = "watchdog_tests.rs"]
mod tests;
