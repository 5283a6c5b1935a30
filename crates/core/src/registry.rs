// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The container registry: the two ordered sets of [`ApplicationContainer`]s
//! (Active / Inactive) and the operations that move containers between them
//! (§3, §9 Design Notes).
//!
//! Membership is tracked with two `Vec`s rather than a hash index. The
//! number of installed applications on a target system is small (tens, not
//! thousands) and insertion order matters for the shutdown cascade (§4.7),
//! so a linear scan keyed by name is simpler and no slower in practice than
//! a hash map plus a separate ordering structure.

use crate::application::{AppState, Application};
use crate::container::{ApplicationContainer, Membership, StopCmdRef, StopContinuation};
use crate::error::CoreError;
use crate::identity::{AppName, Pid};
use tracing::{debug, warn};

/// Owns every known application container and the Active/Inactive ordering.
#[derive(Debug, Default)]
pub struct ContainerRegistry {
    active: Vec<ApplicationContainer>,
    inactive: Vec<ApplicationContainer>,
}

impl ContainerRegistry {
    pub fn new() -> Self {
        Self { active: Vec::new(), inactive: Vec::new() }
    }

    /// Returns the container for `name` if it is Active.
    pub fn get_active(&self, name: &str) -> Option<&ApplicationContainer> {
        self.active.iter().find(|c| c.name().as_str() == name)
    }

    pub fn get_active_mut(&mut self, name: &str) -> Option<&mut ApplicationContainer> {
        self.active.iter_mut().find(|c| c.name().as_str() == name)
    }

    /// Returns the container for `name` if it is Inactive.
    pub fn get_inactive(&self, name: &str) -> Option<&ApplicationContainer> {
        self.inactive.iter().find(|c| c.name().as_str() == name)
    }

    pub fn get_inactive_mut(&mut self, name: &str) -> Option<&mut ApplicationContainer> {
        self.inactive.iter_mut().find(|c| c.name().as_str() == name)
    }

    /// Returns the container for `name` regardless of membership.
    pub fn get(&self, name: &str) -> Option<&ApplicationContainer> {
        self.get_active(name).or_else(|| self.get_inactive(name))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ApplicationContainer> {
        if self.active.iter().any(|c| c.name().as_str() == name) {
            self.get_active_mut(name)
        } else {
            self.get_inactive_mut(name)
        }
    }

    /// Finds the Active container owning `pid` as one of its top-level
    /// processes. Used by the SIGCHLD dispatcher before reaping has any
    /// chance to race a second installation of the same name (§5).
    pub fn get_active_by_pid(&self, pid: Pid) -> Option<&ApplicationContainer> {
        self.active.iter().find(|c| c.app().has_top_level_proc(pid))
    }

    pub fn get_active_by_pid_mut(&mut self, pid: Pid) -> Option<&mut ApplicationContainer> {
        self.active.iter_mut().find(|c| c.app().has_top_level_proc(pid))
    }

    pub fn active(&self) -> impl Iterator<Item = &ApplicationContainer> {
        self.active.iter()
    }

    pub fn inactive(&self) -> impl Iterator<Item = &ApplicationContainer> {
        self.inactive.iter()
    }

    /// Inserts a freshly-constructed container into Inactive, or returns the
    /// existing one if `name` is already known (either set). Mirrors
    /// `CreateApp`'s idempotence: re-installing an app that is already
    /// running must not disturb it.
    pub fn create_or_get(
        &mut self,
        name: AppName,
        build: impl FnOnce() -> Box<dyn Application>,
    ) -> &mut ApplicationContainer {
        if self.active.iter().any(|c| c.name() == &name) {
            return self.active.iter_mut().find(|c| c.name() == &name).expect("just checked");
        }
        if let Some(idx) = self.inactive.iter().position(|c| c.name() == &name) {
            return &mut self.inactive[idx];
        }
        self.inactive.push(ApplicationContainer::new(name, build()));
        self.inactive.last_mut().expect("just pushed")
    }

    /// Moves `name` from Inactive to Active, installing `Deactivate` as the
    /// default stop handler (§4.2). No-op (returns `Ok`) if it is already
    /// Active; fails with `NotFound` if unknown entirely.
    pub fn activate(&mut self, name: &str) -> Result<(), CoreError> {
        if self.active.iter().any(|c| c.name().as_str() == name) {
            return Ok(());
        }
        let idx = self.inactive.iter().position(|c| c.name().as_str() == name)
            .ok_or(CoreError::NotFound)?;
        let mut container = self.inactive.remove(idx);
        container.membership = Membership::Active;
        container.stop_handler = Some(StopContinuation::Deactivate);
        self.active.push(container);
        Ok(())
    }

    /// Moves `name` from Active to Inactive, clearing any stop handler and
    /// pending stop command. No-op if already Inactive.
    fn deactivate(&mut self, name: &str) -> Result<(), CoreError> {
        if self.inactive.iter().any(|c| c.name().as_str() == name) {
            return Ok(());
        }
        let idx = self.active.iter().position(|c| c.name().as_str() == name)
            .ok_or(CoreError::NotFound)?;
        let mut container = self.active.remove(idx);
        container.membership = Membership::Inactive;
        container.stop_handler = None;
        container.pending_stop_cmd = None;
        self.inactive.push(container);
        Ok(())
    }

    /// Removes `name` from Inactive entirely. Fails with `NotPermitted` if
    /// `name` is Active (an app must be stopped first).
    pub fn destroy_inactive(&mut self, name: &str) -> Result<(), CoreError> {
        if self.active.iter().any(|c| c.name().as_str() == name) {
            return Err(CoreError::NotPermitted);
        }
        let idx = self.inactive.iter().position(|c| c.name().as_str() == name)
            .ok_or(CoreError::NotFound)?;
        self.inactive.remove(idx);
        Ok(())
    }

    /// Removes every Inactive container, used on full shutdown once all
    /// Active apps have cascaded down (§4.7).
    pub fn destroy_all_inactive(&mut self) {
        self.inactive.clear();
    }

    /// Installs a stop continuation on `name`, overwriting any existing one
    /// (last-writer-wins, matching the original `stopHandler` field).
    pub fn set_stop_handler(&mut self, name: &str, handler: StopContinuation) -> Result<(), CoreError> {
        let c = self.get_active_mut(name).ok_or(CoreError::NotFound)?;
        c.stop_handler = Some(handler);
        Ok(())
    }

    pub fn set_pending_stop_cmd(&mut self, name: &str, cmd: StopCmdRef) -> Result<(), CoreError> {
        let c = self.get_active_mut(name).ok_or(CoreError::NotFound)?;
        c.pending_stop_cmd = Some(cmd);
        Ok(())
    }

    /// Called whenever a container's application transitions to `Stopped`.
    /// Fires and clears the installed continuation, if any, and returns the
    /// action the daemon must perform as a result (a response to send, a
    /// restart to issue, or nothing).
    ///
    /// This is the Rust analogue of the original's direct recursive call
    /// from the SIGCHLD handler into `DeactivateAppContainer`/`RestartApp`/
    /// `RespondToStopAppCmd`/`ShutdownNextApp` (§9 Design Notes): instead of
    /// each branch mutating shared state directly, the continuation is
    /// consumed here, and the registry reports back what follow-up (if any)
    /// the caller owns.
    pub fn fire_stop_handler(&mut self, name: &str) -> StopHandlerOutcome {
        let Some(container) = self.get_active(name) else {
            return StopHandlerOutcome::None;
        };
        if container.app().state() != AppState::Stopped {
            return StopHandlerOutcome::None;
        }
        let Some(handler) = container.stop_handler() else {
            return StopHandlerOutcome::None;
        };

        match handler {
            StopContinuation::Deactivate => {
                debug!(app = name, "deactivating stopped application");
                let _ = self.deactivate(name);
                StopHandlerOutcome::None
            }
            StopContinuation::Restart => {
                debug!(app = name, "restarting stopped application");
                let start_result =
                    self.get_active_mut(name).map(|c| c.app_mut().start()).transpose();
                match start_result {
                    Ok(Some(())) => {
                        if let Some(c) = self.get_active_mut(name) {
                            c.stop_handler = Some(StopContinuation::Deactivate);
                        }
                        StopHandlerOutcome::None
                    }
                    _ => {
                        warn!(app = name, "restart failed, deactivating instead");
                        let _ = self.deactivate(name);
                        StopHandlerOutcome::None
                    }
                }
            }
            StopContinuation::RespondToStopCmd => {
                let cmd = self.get_active(name).and_then(|c| c.pending_stop_cmd);
                debug!(app = name, "responding to pending stop command");
                let _ = self.deactivate(name);
                match cmd {
                    Some(cmd) => StopHandlerOutcome::RespondToStopCmd(cmd),
                    None => StopHandlerOutcome::None,
                }
            }
            StopContinuation::ShutdownNext => {
                debug!(app = name, "continuing shutdown cascade");
                let idx = self.active.iter().position(|c| c.name().as_str() == name);
                if let Some(idx) = idx {
                    self.active.remove(idx);
                }
                StopHandlerOutcome::ContinueShutdown
            }
        }
    }
}

/// What the caller of [`ContainerRegistry::fire_stop_handler`] must do next.
/// The registry never sends IPC responses or recurses into the shutdown
/// cascade itself; it reports the need back up so the daemon's single event
/// loop stays the only place that touches the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopHandlerOutcome {
    None,
    RespondToStopCmd(StopCmdRef),
    ContinueShutdown,
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
