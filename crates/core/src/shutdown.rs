// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shutdown cascade (§4.7): stop every Active application one at a
//! time, in order, then hand control back to the daemon once none remain.

use crate::application::AppState;
use crate::container::StopContinuation;
use crate::registry::{ContainerRegistry, StopHandlerOutcome};
use tracing::{debug, info};

/// Drives one step of a shutdown in progress. `start_shutdown` begins it;
/// callers then feed every subsequent `fire_stop_handler` outcome that
/// reports `ContinueShutdown` back through [`continue_shutdown`] until
/// [`ShutdownProgress::Complete`] comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownProgress {
    /// An application stop was just issued; the cascade will continue once
    /// its `ShutdownNext` handler fires.
    Stopping,
    /// No Active applications remained; all Inactive ones have also been
    /// destroyed. Shutdown is complete.
    Complete,
}

/// Begins the cascade (§4.7 step 1): drains Inactive entirely up front,
/// once, before ever touching Active, then installs `ShutdownNext` on the
/// first Active container (whichever the registry iterates first) and
/// stops it, or reports immediate completion if none are Active.
///
/// The one-time drain happens only here, not on every `step`: a container
/// that becomes Inactive mid-cascade (e.g. an install/uninstall event
/// firing while other Active apps are still draining) is not swept up by
/// this pass — only what was already Inactive when `shutdown()` was first
/// called.
pub fn start_shutdown(registry: &mut ContainerRegistry) -> ShutdownProgress {
    info!("beginning application shutdown cascade");
    registry.destroy_all_inactive();
    step(registry)
}

/// Resumes the cascade after a container finished stopping and its
/// `ShutdownNext` handler reported [`StopHandlerOutcome::ContinueShutdown`].
pub fn continue_shutdown(registry: &mut ContainerRegistry) -> ShutdownProgress {
    step(registry)
}

fn step(registry: &mut ContainerRegistry) -> ShutdownProgress {
    let Some(name) = registry.active().next().map(|c| c.name().as_str().to_string()) else {
        debug!("no active applications remain");
        info!("shutdown cascade complete");
        return ShutdownProgress::Complete;
    };

    let Some(container) = registry.get_active_mut(&name) else {
        return step(registry);
    };

    if container.app().state() == AppState::Stopped {
        let _ = registry.set_stop_handler(&name, StopContinuation::ShutdownNext);
        if let StopHandlerOutcome::ContinueShutdown = registry.fire_stop_handler(&name) {
            return step(registry);
        }
        return ShutdownProgress::Stopping;
    }

    let _ = registry.set_stop_handler(&name, StopContinuation::ShutdownNext);
    container.app_mut().stop();
    ShutdownProgress::Stopping
}

/// Feeds a [`StopHandlerOutcome`] produced elsewhere (e.g. by the fault
/// engine firing a handler on an unrelated container) into the cascade,
/// advancing it if the outcome was `ContinueShutdown`. Returns `None` if
/// the outcome did not pertain to the shutdown cascade.
pub fn drive_from_outcome(
    registry: &mut ContainerRegistry,
    outcome: StopHandlerOutcome,
) -> Option<ShutdownProgress> {
    match outcome {
        StopHandlerOutcome::ContinueShutdown => Some(continue_shutdown(registry)),
        _ => None,
    }
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
