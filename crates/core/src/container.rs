// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The application container: one per known application, holding the
//! external `Application` object plus the one-shot stop-handler slot (§3).

use crate::application::Application;
use crate::identity::AppName;

/// Opaque reference to an in-flight `stop` IPC command, handed back to the
/// daemon when the handler it's attached to fires so the daemon can send the
/// response on the right connection. The core never interprets this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StopCmdRef(pub u64);

/// Which ordered set a container currently belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Active,
    Inactive,
}

/// One-shot continuation fired when a container's application reaches
/// STOPPED (§4.3, §9 Design Notes). Installed by whichever actor initiates
/// a transition that ends in STOPPED; last-writer-wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopContinuation {
    /// Move the container back to Inactive and log.
    Deactivate,
    /// Restart the application; fall back to `Deactivate` on start failure.
    Restart,
    /// Respond to the stop command stored in `pending_stop_cmd`, then
    /// deactivate.
    RespondToStopCmd,
    /// Continue the shutdown cascade: destroy this container, then move to
    /// the next active one.
    ShutdownNext,
}

/// Per-application bookkeeping record owned by the core (§3).
///
/// Invariant: `stop_handler` may only be non-empty while `membership =
/// Active` (enforced by [`crate::registry::ContainerRegistry`], never by
/// this type alone since moving membership is a registry-level operation).
#[derive(Debug)]
pub struct ApplicationContainer {
    pub(crate) name: AppName,
    pub(crate) app: Box<dyn Application>,
    pub(crate) membership: Membership,
    pub(crate) stop_handler: Option<StopContinuation>,
    pub(crate) pending_stop_cmd: Option<StopCmdRef>,
}

impl ApplicationContainer {
    pub(crate) fn new(name: AppName, app: Box<dyn Application>) -> Self {
        Self {
            name,
            app,
            membership: Membership::Inactive,
            stop_handler: None,
            pending_stop_cmd: None,
        }
    }

    pub fn name(&self) -> &AppName {
        &self.name
    }

    pub fn membership(&self) -> Membership {
        self.membership
    }

    pub fn stop_handler(&self) -> Option<StopContinuation> {
        self.stop_handler
    }

    pub fn app(&self) -> &dyn Application {
        self.app.as_ref()
    }

    pub fn app_mut(&mut self) -> &mut dyn Application {
        self.app.as_mut()
    }
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod tests;
