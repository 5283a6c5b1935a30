// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The ad-hoc process facility (§4.8): lets a connected client build and
//! launch a one-off process inside an already-Active application, either
//! from a configured process entry or from a bare executable path.

use crate::application::{AppOpError, Priority, ProcFaultAction, ProcRef};
use crate::define_id;
use crate::error::CoreError;
use crate::identity::Pid;
use crate::registry::ContainerRegistry;
use std::collections::HashMap;
use tracing::debug;

define_id! {
    /// Opaque handle returned to a client for an ad-hoc process object.
    /// Distinct from the `Application`-scoped [`ProcRef`]: this is the
    /// identity the wire protocol carries, while `ProcRef` never leaves
    /// this crate.
    pub struct AppProcHandleId("appproc-");
}

/// One outstanding ad-hoc process object, owned by the registry until it is
/// started or explicitly deleted.
#[derive(Debug)]
struct AppProcHandle {
    app_name: String,
    proc_name: Option<String>,
    proc_ref: ProcRef,
    owning_session: SessionId,
    /// Set by `add_stop_handler`/cleared by `remove_stop_handler` (§4.8).
    /// Consulted at `start()` time to decide whether the process's pid
    /// graduates into `stop_watches`.
    wants_stop_handler: bool,
}

/// Opaque identity of the client connection that created a handle, used to
/// clean up on disconnect (§4.8 edge cases). The daemon hands this in; the
/// core never interprets it beyond equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

/// Tracks outstanding ad-hoc process handles across all applications.
#[derive(Debug, Default)]
pub struct AppProcRegistry {
    handles: Vec<(AppProcHandleId, AppProcHandle)>,
    /// Started ad-hoc processes whose handle registered a stop handler
    /// before `start()`, keyed by the handler ref (= the original handle
    /// identifier, §4.8). Consulted by the daemon's reap path; entries are
    /// removed the moment the stop notification fires, so "at most one
    /// handle references any given process" (§3) extends naturally to "the
    /// handler fires exactly once".
    stop_watches: HashMap<AppProcHandleId, (Pid, SessionId)>,
}

impl AppProcRegistry {
    pub fn new() -> Self {
        Self { handles: Vec::new(), stop_watches: HashMap::new() }
    }

    /// Creates a new ad-hoc process object under `app_name`, which must
    /// already be Active. Exactly one of `proc_name`/`exec_path` may be
    /// `None`. `proc_name` given alone identifies a configured process to
    /// clone (its configured stdio/priority/args); rejects if another
    /// outstanding handle already references the same app+proc pair
    /// (§4.8: uniqueness invariant).
    pub fn create(
        &mut self,
        registry: &mut ContainerRegistry,
        session: SessionId,
        app_name: &str,
        proc_name: Option<&str>,
        exec_path: Option<&str>,
    ) -> Result<AppProcHandleId, CoreError> {
        if proc_name.is_none() && exec_path.is_none() {
            return Err(CoreError::Invalid);
        }
        if let Some(proc_name) = proc_name {
            if self.handles.iter().any(|(_, h)| {
                h.app_name == app_name && h.proc_name.as_deref() == Some(proc_name)
            }) {
                return Err(CoreError::Duplicate);
            }
        }

        // The container may already be Active, or it may only exist as an
        // Inactive stub materialized by an earlier ad-hoc request or
        // install event; either is fine here (§4.8: `create_or_get`, not
        // `get_active`). The caller is responsible for having materialized
        // it already via `ContainerRegistry::create_or_get`.
        let container = registry.get_mut(app_name).ok_or(CoreError::NotFound)?;
        let proc_ref = container
            .app_mut()
            .create_proc(proc_name, exec_path)
            .map_err(map_app_op_error)?;

        let id = AppProcHandleId::new();
        self.handles.push((
            id.clone(),
            AppProcHandle {
                app_name: app_name.to_string(),
                proc_name: proc_name.map(str::to_string),
                proc_ref,
                owning_session: session,
                wants_stop_handler: false,
            },
        ));
        debug!(app = app_name, handle = %id, "created ad-hoc process handle");
        Ok(id)
    }

    /// Registers interest in a stop notification for `id`'s process, fired
    /// once it reaches STOPPED after `start()` (§4.8). At most one per
    /// process: a second call is a harmless no-op, matching the handle's own
    /// one-shot nature. Returns the handler ref a client later passes to
    /// `remove_stop_handler` — always the handle identifier itself.
    pub fn add_stop_handler(&mut self, id: &AppProcHandleId) -> Result<AppProcHandleId, CoreError> {
        let (_, handle) = self.handles.iter_mut().find(|(h, _)| h == id).ok_or(CoreError::NotFound)?;
        handle.wants_stop_handler = true;
        Ok(id.clone())
    }

    /// Clears a previously registered stop handler. Safe to call on a handle
    /// that never registered one, or that no longer exists (already started
    /// or deleted): both are no-ops (§4.8).
    pub fn remove_stop_handler(&mut self, handler_ref: &AppProcHandleId) -> Result<(), CoreError> {
        if let Some((_, handle)) = self.handles.iter_mut().find(|(h, _)| h == handler_ref) {
            handle.wants_stop_handler = false;
        }
        self.stop_watches.remove(handler_ref);
        Ok(())
    }

    pub fn set_stdin(&self, registry: &mut ContainerRegistry, id: &AppProcHandleId, fd: Option<i32>) -> Result<(), CoreError> {
        self.with_app(registry, id, |app, proc_ref| {
            app.set_proc_stdin(proc_ref, fd);
            Ok(())
        })
    }

    pub fn set_stdout(&self, registry: &mut ContainerRegistry, id: &AppProcHandleId, fd: Option<i32>) -> Result<(), CoreError> {
        self.with_app(registry, id, |app, proc_ref| {
            app.set_proc_stdout(proc_ref, fd);
            Ok(())
        })
    }

    pub fn set_stderr(&self, registry: &mut ContainerRegistry, id: &AppProcHandleId, fd: Option<i32>) -> Result<(), CoreError> {
        self.with_app(registry, id, |app, proc_ref| {
            app.set_proc_stderr(proc_ref, fd);
            Ok(())
        })
    }

    pub fn add_arg(&self, registry: &mut ContainerRegistry, id: &AppProcHandleId, arg: &str) -> Result<(), CoreError> {
        self.with_app(registry, id, |app, proc_ref| {
            app.add_proc_arg(proc_ref, arg).map_err(map_app_op_error)
        })
    }

    pub fn clear_args(&self, registry: &mut ContainerRegistry, id: &AppProcHandleId) -> Result<(), CoreError> {
        self.with_app(registry, id, |app, proc_ref| {
            app.clear_proc_args(proc_ref);
            Ok(())
        })
    }

    pub fn set_priority(&self, registry: &mut ContainerRegistry, id: &AppProcHandleId, priority: Priority) -> Result<(), CoreError> {
        self.with_app(registry, id, |app, proc_ref| {
            app.set_proc_priority(proc_ref, priority).map_err(map_app_op_error)
        })
    }

    pub fn clear_priority(&self, registry: &mut ContainerRegistry, id: &AppProcHandleId) -> Result<(), CoreError> {
        self.with_app(registry, id, |app, proc_ref| {
            app.clear_proc_priority(proc_ref);
            Ok(())
        })
    }

    pub fn set_fault_action(&self, registry: &mut ContainerRegistry, id: &AppProcHandleId, action: ProcFaultAction) -> Result<(), CoreError> {
        self.with_app(registry, id, |app, proc_ref| {
            app.set_proc_fault_action(proc_ref, action);
            Ok(())
        })
    }

    pub fn clear_fault_action(&self, registry: &mut ContainerRegistry, id: &AppProcHandleId) -> Result<(), CoreError> {
        self.with_app(registry, id, |app, proc_ref| {
            app.clear_proc_fault_action(proc_ref);
            Ok(())
        })
    }

    /// Starts the process and releases the handle: once started, the
    /// process lives on as an ordinary child of the application and is no
    /// longer tracked here. Ensures the containing application is Active
    /// first, activating it if the handle was created against a stub
    /// Inactive container (§4.8).
    pub fn start(&mut self, registry: &mut ContainerRegistry, id: &AppProcHandleId) -> Result<(), CoreError> {
        let idx = self.handles.iter().position(|(h, _)| h == id).ok_or(CoreError::NotFound)?;
        let (_, handle) = &self.handles[idx];
        let app_name = handle.app_name.clone();
        let proc_ref = handle.proc_ref;
        let session = handle.owning_session;
        let wants_stop_handler = handle.wants_stop_handler;

        if registry.get_active(&app_name).is_none() {
            registry.activate(&app_name).map_err(|_| CoreError::NotFound)?;
            registry
                .get_active_mut(&app_name)
                .ok_or(CoreError::NotFound)?
                .app_mut()
                .start()
                .map_err(|_| CoreError::Fault)?;
        }

        let container = registry.get_active_mut(&app_name).ok_or(CoreError::NotFound)?;
        let app = container.app_mut();
        app.start_proc(proc_ref).map_err(map_app_op_error)?;
        if wants_stop_handler {
            if let Some(pid) = app.proc_pid(proc_ref) {
                self.stop_watches.insert(id.clone(), (pid, session));
            }
        }
        self.handles.remove(idx);
        Ok(())
    }

    /// Consumes the stop watch for `pid`, if any, returning the handler ref
    /// and owning session to notify. Called by the daemon once it has
    /// reaped a pid and found no other owner for it (§4.8): an ad-hoc
    /// process is not a *configured* process, so the fault engine's normal
    /// per-app dispatch never looks at it.
    pub fn take_stop_watch(&mut self, pid: Pid) -> Option<(AppProcHandleId, SessionId)> {
        let id = self.stop_watches.iter().find(|(_, (p, _))| *p == pid).map(|(id, _)| id.clone())?;
        let (_, session) = self.stop_watches.remove(&id)?;
        Some((id, session))
    }

    /// Deletes an un-started handle without launching it.
    pub fn delete(&mut self, registry: &mut ContainerRegistry, id: &AppProcHandleId) -> Result<(), CoreError> {
        let idx = self.handles.iter().position(|(h, _)| h == id).ok_or(CoreError::NotFound)?;
        let (_, handle) = self.handles.remove(idx);
        if let Some(container) = registry.get_mut(&handle.app_name) {
            container.app_mut().delete_proc(handle.proc_ref);
        }
        Ok(())
    }

    /// Removes and deletes every handle owned by `session`, invoked when a
    /// client connection closes without starting or deleting its handles.
    pub fn delete_session_handles(&mut self, registry: &mut ContainerRegistry, session: SessionId) {
        let (mine, rest): (Vec<_>, Vec<_>) =
            self.handles.drain(..).partition(|(_, h)| h.owning_session == session);
        self.handles = rest;
        for (id, handle) in mine {
            debug!(handle = %id, app = handle.app_name, "deleting ad-hoc process handle on session close");
            if let Some(container) = registry.get_mut(&handle.app_name) {
                container.app_mut().delete_proc(handle.proc_ref);
            }
        }
    }

    /// Removes every handle referencing `app_name`, used when an Inactive
    /// application's container is destroyed (install/uninstall event,
    /// §4.8 automatic cleanup). Active containers are never destroyed this
    /// way, so this never touches a running application's handles.
    pub fn delete_app_handles(&mut self, registry: &mut ContainerRegistry, app_name: &str) {
        let (mine, rest): (Vec<_>, Vec<_>) =
            self.handles.drain(..).partition(|(_, h)| h.app_name == app_name);
        self.handles = rest;
        for (id, handle) in mine {
            debug!(handle = %id, app = handle.app_name, "deleting ad-hoc process handle: application destroyed");
            if let Some(container) = registry.get_mut(&handle.app_name) {
                container.app_mut().delete_proc(handle.proc_ref);
            }
        }
    }

    fn with_app<F>(&self, registry: &mut ContainerRegistry, id: &AppProcHandleId, f: F) -> Result<(), CoreError>
    where
        F: FnOnce(&mut dyn crate::application::Application, ProcRef) -> Result<(), CoreError>,
    {
        let (_, handle) = self.handles.iter().find(|(h, _)| h == id).ok_or(CoreError::NotFound)?;
        let container = registry.get_mut(&handle.app_name).ok_or(CoreError::NotFound)?;
        f(container.app_mut(), handle.proc_ref)
    }
}

fn map_app_op_error(err: AppOpError) -> CoreError {
    match err {
        AppOpError::Fault => CoreError::Fault,
        AppOpError::Overflow => CoreError::Overflow,
        AppOpError::Invalid => CoreError::Invalid,
    }
}

#[cfg(test)]
#[path = "appproc_tests.rs"]
mod tests;
