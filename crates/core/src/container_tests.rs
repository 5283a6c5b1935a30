// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::identity::AppName;
use crate::test_support::FakeApplication;

fn make(name: &str) -> ApplicationContainer {
    ApplicationContainer::new(
        AppName::parse(name).unwrap(),
        Box::new(FakeApplication::new(name)),
    )
}

#[test]
fn new_container_starts_inactive_with_no_handler() {
    let c = make("hello");
    assert_eq!(c.membership(), Membership::Inactive);
    assert_eq!(c.stop_handler(), None);
    assert_eq!(c.name().as_str(), "hello");
}

#[test]
fn stop_handler_is_settable_and_last_writer_wins() {
    let mut c = make("hello");
    c.stop_handler = Some(StopContinuation::Deactivate);
    c.stop_handler = Some(StopContinuation::Restart);
    assert_eq!(c.stop_handler(), Some(StopContinuation::Restart));
}

#[test]
fn pending_stop_cmd_is_independent_of_stop_handler() {
    let mut c = make("hello");
    c.stop_handler = Some(StopContinuation::RespondToStopCmd);
    c.pending_stop_cmd = Some(StopCmdRef(7));
    assert_eq!(c.stop_handler(), Some(StopContinuation::RespondToStopCmd));
    assert_eq!(c.pending_stop_cmd, Some(StopCmdRef(7)));
}

#[test]
fn app_accessors_reach_the_underlying_application() {
    let mut c = make("hello");
    assert_eq!(c.app().name(), "hello");
    c.app_mut().start().unwrap();
    assert_eq!(c.app().state(), crate::application::AppState::Running);
}
