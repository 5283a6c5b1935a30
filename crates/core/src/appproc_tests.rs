// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::identity::AppName;
use crate::test_support::FakeApplication;

const SESSION: SessionId = SessionId(1);

fn registry_with_active(app_name: &str) -> ContainerRegistry {
    let mut reg = ContainerRegistry::new();
    reg.create_or_get(AppName::parse(app_name).unwrap(), || {
        Box::new(FakeApplication::new(app_name).with_configured_proc("worker"))
    });
    reg.activate(app_name).unwrap();
    reg
}

#[test]
fn create_requires_a_known_app() {
    let mut reg = ContainerRegistry::new();
    let mut procs = AppProcRegistry::new();
    let err = procs.create(&mut reg, SESSION, "nope", Some("worker"), None).unwrap_err();
    assert_eq!(err, CoreError::NotFound);
}

#[test]
fn create_materializes_against_an_inactive_container() {
    let mut reg = ContainerRegistry::new();
    reg.create_or_get(AppName::parse("hello").unwrap(), || {
        Box::new(FakeApplication::new("hello").with_configured_proc("worker"))
    });
    let mut procs = AppProcRegistry::new();
    assert!(reg.get_active("hello").is_none());
    let id = procs.create(&mut reg, SESSION, "hello", Some("worker"), None).unwrap();
    assert!(reg.get_inactive("hello").is_some());
    assert!(reg.get_active("hello").is_none());

    procs.start(&mut reg, &id).unwrap();
    assert!(reg.get_active("hello").is_some());
}

#[test]
fn create_requires_a_name_or_path() {
    let mut reg = registry_with_active("hello");
    let mut procs = AppProcRegistry::new();
    let err = procs.create(&mut reg, SESSION, "hello", None, None).unwrap_err();
    assert_eq!(err, CoreError::Invalid);
}

#[test]
fn create_rejects_a_second_handle_for_the_same_configured_process() {
    let mut reg = registry_with_active("hello");
    let mut procs = AppProcRegistry::new();
    procs.create(&mut reg, SESSION, "hello", Some("worker"), None).unwrap();
    let err = procs.create(&mut reg, SESSION, "hello", Some("worker"), None).unwrap_err();
    assert_eq!(err, CoreError::Duplicate);
}

#[test]
fn create_from_exec_path_allows_multiple_handles() {
    let mut reg = registry_with_active("hello");
    let mut procs = AppProcRegistry::new();
    let a = procs.create(&mut reg, SESSION, "hello", None, Some("/bin/true")).unwrap();
    let b = procs.create(&mut reg, SESSION, "hello", None, Some("/bin/true")).unwrap();
    assert_ne!(a, b);
}

#[test]
fn start_releases_the_handle() {
    let mut reg = registry_with_active("hello");
    let mut procs = AppProcRegistry::new();
    let id = procs.create(&mut reg, SESSION, "hello", Some("worker"), None).unwrap();
    procs.start(&mut reg, &id).unwrap();
    assert_eq!(procs.start(&mut reg, &id).unwrap_err(), CoreError::NotFound);
}

#[test]
fn delete_removes_an_unstarted_handle() {
    let mut reg = registry_with_active("hello");
    let mut procs = AppProcRegistry::new();
    let id = procs.create(&mut reg, SESSION, "hello", Some("worker"), None).unwrap();
    procs.delete(&mut reg, &id).unwrap();
    assert_eq!(procs.delete(&mut reg, &id).unwrap_err(), CoreError::NotFound);
}

#[test]
fn session_close_deletes_only_that_sessions_handles() {
    let mut reg = registry_with_active("hello");
    let mut procs = AppProcRegistry::new();
    let mine = procs.create(&mut reg, SESSION, "hello", None, Some("/bin/true")).unwrap();
    let theirs = procs.create(&mut reg, SessionId(2), "hello", None, Some("/bin/false")).unwrap();

    procs.delete_session_handles(&mut reg, SESSION);

    assert_eq!(procs.delete(&mut reg, &mine).unwrap_err(), CoreError::NotFound);
    assert!(procs.delete(&mut reg, &theirs).is_ok());
}

#[test]
fn arg_and_priority_mutators_reach_the_application() {
    let mut reg = registry_with_active("hello");
    let mut procs = AppProcRegistry::new();
    let id = procs.create(&mut reg, SESSION, "hello", None, Some("/bin/true")).unwrap();
    procs.add_arg(&mut reg, &id, "--flag").unwrap();
    procs.set_priority(&mut reg, &id, crate::application::Priority::High).unwrap();
    procs.clear_priority(&mut reg, &id).unwrap();
    procs.set_fault_action(&mut reg, &id, crate::application::ProcFaultAction::RestartProc).unwrap();
    procs.clear_fault_action(&mut reg, &id).unwrap();
    procs.clear_args(&mut reg, &id).unwrap();
    procs.set_stdin(&mut reg, &id, Some(0)).unwrap();
    procs.set_stdout(&mut reg, &id, Some(1)).unwrap();
    procs.set_stderr(&mut reg, &id, Some(2)).unwrap();
}
