// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fault-action state machine (§4.5): turns a reaped child's
//! `FaultAction` into a stop-handler installation and (for `RestartApp`)
//! the app-level stop this crate always performs before restarting.

use crate::application::{AppState, ChildExitStatus, FaultAction};
use crate::container::StopContinuation;
use crate::identity::Pid;
use crate::registry::ContainerRegistry;
use tracing::{error, info, warn};

/// Collaborator that actually reboots the device. Kept out of this crate
/// the same way `Application` is: rebooting is a platform action this crate
/// has no business performing directly.
pub trait RebootRequester {
    fn request_reboot(&self, reason: &str);
}

/// Result of handling one reaped child. `None` when the child belonged to
/// no known application (already logged as an orphan) or the application's
/// own fault handling absorbed the event without needing app-level action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOutcome {
    Absorbed,
    AppStopping { continuation: StopContinuation },
    UnknownChild,
    /// `Reboot` fault action: the device is going down. Core state is left
    /// untouched (§4.5 step 5, §8 scenario 4) — the caller propagates a
    /// fatal result to the SIGCHLD dispatcher and leaves reboot policy to
    /// the outer supervisor.
    Fatal,
}

/// Dispatches a reaped child to its owning application and applies the
/// resulting fault action (§4.5, §5).
///
/// `pid` must already have been reaped by the caller; this only looks the
/// owner up and applies policy (§5: label lookup precedes reap, but reaping
/// itself is the daemon's job, not the core's).
pub fn handle_sigchild(
    registry: &mut ContainerRegistry,
    reboot: &dyn RebootRequester,
    pid: Pid,
    status: ChildExitStatus,
) -> FaultOutcome {
    let Some(container) = registry.get_active_by_pid(pid) else {
        warn!(pid, "sigchild for pid not owned by any active application");
        return FaultOutcome::UnknownChild;
    };
    let app_name = container.name().as_str().to_string();

    let action = registry
        .get_active_mut(&app_name)
        .expect("looked up above")
        .app_mut()
        .sigchild_notify(pid, status);

    apply_fault_action(registry, reboot, &app_name, action)
}

fn apply_fault_action(
    registry: &mut ContainerRegistry,
    reboot: &dyn RebootRequester,
    app_name: &str,
    action: FaultAction,
) -> FaultOutcome {
    match action {
        FaultAction::Ignore => {
            // The application already handled this internally (e.g. a
            // per-process restart); nothing to do at the app level.
            FaultOutcome::Absorbed
        }
        FaultAction::RestartApp => {
            info!(app = app_name, "fault action: restarting application");
            stop_with_continuation(registry, app_name, StopContinuation::Restart)
        }
        FaultAction::StopApp => {
            info!(app = app_name, "fault action: stopping application");
            // Handler is left unchanged: the default installed at
            // activation is already `Deactivate`, and overwriting it here
            // would clobber a stronger handler (e.g. `RespondToStopCmd`)
            // installed by an in-flight command (§4.5 step 5).
            stop_without_touching_handler(registry, app_name)
        }
        FaultAction::Reboot => {
            error!(app = app_name, "fault action: rebooting device");
            reboot.request_reboot(app_name);
            // Core state is left untouched; the caller is responsible for
            // propagating the fatal result (§4.5 step 5, §8 scenario 4).
            FaultOutcome::Fatal
        }
    }
}

fn stop_with_continuation(
    registry: &mut ContainerRegistry,
    app_name: &str,
    continuation: StopContinuation,
) -> FaultOutcome {
    let Some(container) = registry.get_active_mut(app_name) else {
        return FaultOutcome::UnknownChild;
    };
    if container.app().state() == AppState::Stopped {
        // Already down (e.g. every top-level process exited in the same
        // reap batch); fire immediately rather than waiting for a
        // notification that will never arrive.
        let _ = registry.set_stop_handler(app_name, continuation);
        registry.fire_stop_handler(app_name);
        return FaultOutcome::AppStopping { continuation };
    }
    let _ = registry.set_stop_handler(app_name, continuation);
    container.app_mut().stop();
    FaultOutcome::AppStopping { continuation }
}

fn stop_without_touching_handler(registry: &mut ContainerRegistry, app_name: &str) -> FaultOutcome {
    let Some(container) = registry.get_active_mut(app_name) else {
        return FaultOutcome::UnknownChild;
    };
    // "Left unchanged" means re-persisting whatever is already installed
    // (falling back to the `Deactivate` default) rather than actually
    // skipping the write: the handler still has to be in the slot for
    // `fire_stop_handler` to find it once the app reaches STOPPED.
    let continuation = container.stop_handler().unwrap_or(StopContinuation::Deactivate);
    let _ = registry.set_stop_handler(app_name, continuation);
    let container = registry.get_active_mut(app_name).expect("looked up above");
    if container.app().state() == AppState::Stopped {
        registry.fire_stop_handler(app_name);
        return FaultOutcome::AppStopping { continuation };
    }
    container.app_mut().stop();
    FaultOutcome::AppStopping { continuation }
}

#[cfg(test)]
#[path = "fault_tests.rs"]
mod tests;
