// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::application::WatchdogAction;
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

fn registry_with(app_name: &str, proc_id: u32, action: WatchdogAction) -> ContainerRegistry {
    let mut reg = ContainerRegistry::new();
    reg.create_or_get(AppName::parse(app_name).unwrap(), || {
        Box::new(FakeApplication::new(app_name).with_watchdog_claim(proc_id, action))
    });
    reg.activate(app_name).unwrap();
    reg.get_active_mut(app_name).unwrap().app_mut().start().unwrap();
    reg
}

#[test]
fn expiry_against_inactive_app_is_not_found() {
    let mut reg = ContainerRegistry::new();
    let reboot = FakeReboot::default();
    let outcome = handle_watchdog_expiry(
        &mut reg,
        &reboot,
        &AppName::parse("hello").unwrap(),
        1,
    );
    assert_eq!(outcome, WatchdogOutcome::NotFound);
}

#[test]
fn unclaimed_proc_id_is_not_found() {
    let mut reg = registry_with("hello", 1, WatchdogAction::Handled);
    let reboot = FakeReboot::default();
    let outcome = handle_watchdog_expiry(&mut reg, &reboot, &AppName::parse("hello").unwrap(), 99);
    assert_eq!(outcome, WatchdogOutcome::NotFound);
}

#[test]
fn handled_action_takes_no_app_level_action() {
    let mut reg = registry_with("hello", 1, WatchdogAction::Handled);
    let reboot = FakeReboot::default();
    let outcome = handle_watchdog_expiry(&mut reg, &reboot, &AppName::parse("hello").unwrap(), 1);
    assert_eq!(outcome, WatchdogOutcome::Handled);
    // No app-level action means the default installed at activation is
    // left in place, not cleared.
    assert_eq!(
        reg.get_active("hello").unwrap().stop_handler(),
        Some(StopContinuation::Deactivate)
    );
}

#[test]
fn stop_app_installs_deactivate_continuation() {
    let mut reg = registry_with("hello", 1, WatchdogAction::StopApp);
    let reboot = FakeReboot::default();
    handle_watchdog_expiry(&mut reg, &reboot, &AppName::parse("hello").unwrap(), 1);
    assert_eq!(reg.get_active("hello").unwrap().stop_handler(), Some(StopContinuation::Deactivate));
}

#[test]
fn restart_app_installs_restart_continuation() {
    let mut reg = registry_with("hello", 1, WatchdogAction::RestartApp);
    let reboot = FakeReboot::default();
    handle_watchdog_expiry(&mut reg, &reboot, &AppName::parse("hello").unwrap(), 1);
    assert_eq!(reg.get_active("hello").unwrap().stop_handler(), Some(StopContinuation::Restart));
}

#[test]
fn reboot_requests_reboot_and_also_restarts_the_app() {
    let mut reg = registry_with("hello", 1, WatchdogAction::Reboot);
    let reboot = FakeReboot::default();
    let outcome = handle_watchdog_expiry(&mut reg, &reboot, &AppName::parse("hello").unwrap(), 1);
    assert_eq!(reboot.requested.borrow().len(), 1);
    assert_eq!(outcome, WatchdogOutcome::AppStopping { continuation: StopContinuation::Restart });
    assert_eq!(reg.get_active("hello").unwrap().stop_handler(), Some(StopContinuation::Restart));
}

#[test]
fn error_action_is_reported_without_touching_the_container() {
    let mut reg = registry_with("hello", 1, WatchdogAction::Error);
    let reboot = FakeReboot::default();
    let outcome = handle_watchdog_expiry(&mut reg, &reboot, &AppName::parse("hello").unwrap(), 1);
    assert_eq!(outcome, WatchdogOutcome::Error);
    // Not touched means still holding the default installed at activation.
    assert_eq!(
        reg.get_active("hello").unwrap().stop_handler(),
        Some(StopContinuation::Deactivate)
    );
}
