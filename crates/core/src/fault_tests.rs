// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::application::AppState;
use crate::identity::AppName;
use crate::test_support::FakeApplication;
use std::cell::RefCell;

#[derive(Default)]
struct FakeReboot {
    requested: RefCell<Vec<String>>,
}

impl RebootRequester for FakeReboot {
    fn request_reboot(&self, reason: &str) {
        self.requested.borrow_mut().push(reason.to_string());
    }
}

fn registry_with_running(app_name: &str, pid: Pid, fault_action: FaultAction) -> ContainerRegistry {
    let mut reg = ContainerRegistry::new();
    reg.create_or_get(AppName::parse(app_name).unwrap(), || {
        Box::new(
            FakeApplication::new(app_name)
                .with_top_level_pid(pid)
                .with_fault_action(fault_action),
        )
    });
    reg.activate(app_name).unwrap();
    reg.get_active_mut(app_name).unwrap().app_mut().start().unwrap();
    reg
}

#[test]
fn unknown_pid_is_reported_and_changes_nothing() {
    let mut reg = registry_with_running("hello", 10, FaultAction::Ignore);
    let reboot = FakeReboot::default();
    let outcome = handle_sigchild(&mut reg, &reboot, 999, ChildExitStatus::default());
    assert_eq!(outcome, FaultOutcome::UnknownChild);
}

#[test]
fn ignore_action_is_absorbed_without_stopping_the_app() {
    let mut reg = registry_with_running("hello", 10, FaultAction::Ignore);
    let reboot = FakeReboot::default();
    let outcome = handle_sigchild(&mut reg, &reboot, 10, ChildExitStatus::default());
    assert_eq!(outcome, FaultOutcome::Absorbed);
    assert_eq!(reg.get_active("hello").unwrap().app().state(), AppState::Running);
}

#[test]
fn restart_app_action_stops_and_installs_restart_continuation() {
    let mut reg = registry_with_running("hello", 10, FaultAction::RestartApp);
    let reboot = FakeReboot::default();
    let outcome = handle_sigchild(&mut reg, &reboot, 10, ChildExitStatus::default());
    assert_eq!(outcome, FaultOutcome::AppStopping { continuation: StopContinuation::Restart });
    assert_eq!(reg.get_active("hello").unwrap().stop_handler(), Some(StopContinuation::Restart));
}

#[test]
fn stop_app_action_installs_deactivate_continuation() {
    let mut reg = registry_with_running("hello", 10, FaultAction::StopApp);
    let reboot = FakeReboot::default();
    handle_sigchild(&mut reg, &reboot, 10, ChildExitStatus::default());
    assert_eq!(reg.get_active("hello").unwrap().stop_handler(), Some(StopContinuation::Deactivate));
}

#[test]
fn reboot_action_requests_reboot_and_leaves_core_state_untouched() {
    let mut reg = registry_with_running("hello", 10, FaultAction::Reboot);
    let reboot = FakeReboot::default();
    let outcome = handle_sigchild(&mut reg, &reboot, 10, ChildExitStatus::default());
    assert_eq!(outcome, FaultOutcome::Fatal);
    assert_eq!(reboot.requested.borrow().len(), 1);
    let c = reg.get_active("hello").unwrap();
    assert_eq!(c.app().state(), AppState::Running);
    // Untouched means still holding the default installed at activation,
    // not cleared.
    assert_eq!(c.stop_handler(), Some(StopContinuation::Deactivate));
}

#[test]
fn stop_app_action_does_not_clobber_an_existing_stop_cmd_handler() {
    let mut reg = registry_with_running("hello", 10, FaultAction::StopApp);
    reg.set_stop_handler("hello", StopContinuation::RespondToStopCmd).unwrap();
    let reboot = FakeReboot::default();
    handle_sigchild(&mut reg, &reboot, 10, ChildExitStatus::default());
    assert_eq!(
        reg.get_active("hello").unwrap().stop_handler(),
        Some(StopContinuation::RespondToStopCmd)
    );
}

#[test]
fn fault_against_already_stopped_app_fires_immediately() {
    let mut reg = ContainerRegistry::new();
    reg.create_or_get(AppName::parse("hello").unwrap(), || {
        Box::new(
            FakeApplication::new("hello")
                .with_top_level_pid(10)
                .with_fault_action(FaultAction::StopApp),
        )
    });
    reg.activate("hello").unwrap();
    // Deliberately not started: the container's application reports
    // `Stopped` already, as if every top-level process died in the same
    // reap batch.
    let reboot = FakeReboot::default();
    handle_sigchild(&mut reg, &reboot, 10, ChildExitStatus::default());
    assert!(reg.get_inactive("hello").is_some());
}
