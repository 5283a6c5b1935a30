// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::application::Application;
use crate::identity::AppName;
use crate::test_support::FakeApplication;

fn insert_running(reg: &mut ContainerRegistry, name: &str) {
    reg.create_or_get(AppName::parse(name).unwrap(), || Box::new(FakeApplication::new(name)));
    reg.activate(name).unwrap();
    reg.get_active_mut(name).unwrap().app_mut().start().unwrap();
}

fn fake_mut<'a>(app: &'a mut dyn Application) -> &'a mut FakeApplication {
    app.as_any_mut().downcast_mut::<FakeApplication>().expect("test registry only holds fakes")
}

#[test]
fn shutdown_with_no_active_apps_completes_immediately() {
    let mut reg = ContainerRegistry::new();
    assert_eq!(start_shutdown(&mut reg), ShutdownProgress::Complete);
}

#[test]
fn shutdown_stops_the_first_active_app_and_reports_stopping() {
    let mut reg = ContainerRegistry::new();
    insert_running(&mut reg, "one");
    insert_running(&mut reg, "two");
    assert_eq!(start_shutdown(&mut reg), ShutdownProgress::Stopping);
    assert_eq!(reg.get_active("one").unwrap().stop_handler(), Some(StopContinuation::ShutdownNext));
    let count = fake_mut(reg.get_active_mut("one").unwrap().app_mut()).stop_call_count();
    assert_eq!(count, 1);
}

#[test]
fn full_cascade_removes_every_active_app_then_clears_inactive() {
    let mut reg = ContainerRegistry::new();
    insert_running(&mut reg, "one");
    insert_running(&mut reg, "two");
    reg.create_or_get(AppName::parse("idle").unwrap(), || Box::new(FakeApplication::new("idle")));

    start_shutdown(&mut reg);

    fake_mut(reg.get_active_mut("one").unwrap().app_mut()).force_stopped();
    let outcome = reg.fire_stop_handler("one");
    let progress = drive_from_outcome(&mut reg, outcome).expect("was a shutdown continuation");
    assert_eq!(progress, ShutdownProgress::Stopping);
    assert_eq!(reg.active().count(), 1);

    fake_mut(reg.get_active_mut("two").unwrap().app_mut()).force_stopped();
    let outcome = reg.fire_stop_handler("two");
    let progress = drive_from_outcome(&mut reg, outcome).expect("was a shutdown continuation");
    assert_eq!(progress, ShutdownProgress::Complete);
    assert_eq!(reg.active().count(), 0);
    assert_eq!(reg.inactive().count(), 0, "idle app should have been destroyed too");
}
