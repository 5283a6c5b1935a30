// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end specs for the supervisor daemon: spawns the real
//! `asc-supervisord` binary against a scratch state directory and drives it
//! over the actual Unix-socket protocol. Unit-level coverage for the fault
//! engine, watchdog, and shutdown cascade already lives beside
//! `asc-core`'s modules; these tests exercise the pieces only visible once
//! the daemon, the wire protocol, and real child processes are all in
//! play (spec §8 scenarios 1, 2, and 6).

use asc_wire::{read_message, write_message, Request, Response, PROTOCOL_VERSION};
use std::path::PathBuf;
use std::process::{Child, Command};
use std::time::Duration;
use tokio::net::UnixStream;

struct Supervisor {
    child: Child,
    socket_path: PathBuf,
}

impl Supervisor {
    fn spawn(config_json: &str) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, config_json).expect("write config");
        let socket_path = dir.path().join("supervisor.sock");
        let install_dir = dir.path().join("apps");
        std::fs::create_dir_all(&install_dir).expect("install dir");

        let bin = assert_cmd::cargo::cargo_bin("asc-supervisord");
        let child = Command::new(bin)
            .env("ASC_CONFIG_PATH", &config_path)
            .env("ASC_SOCKET_PATH", &socket_path)
            .env("ASC_APPS_INSTALL_DIR", &install_dir)
            .env("ASC_STATE_DIR", dir.path())
            .spawn()
            .expect("spawn supervisor");

        // tempdir must outlive the child; leak it onto the struct via a
        // canonicalized path rather than holding the TempDir, since the
        // child process (not this process) is the one touching the socket.
        std::mem::forget(dir);

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !socket_path.exists() {
            if std::time::Instant::now() > deadline {
                panic!("supervisor did not create its socket in time");
            }
            std::thread::sleep(Duration::from_millis(20));
        }

        Self { child, socket_path }
    }

    async fn connect(&self) -> UnixStream {
        let mut stream = UnixStream::connect(&self.socket_path).await.expect("connect");
        write_message(&mut stream, &Request::Hello { client_version: PROTOCOL_VERSION }).await.expect("hello");
        let _: Response = read_message(&mut stream).await.expect("hello reply");
        stream
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

async fn request(stream: &mut UnixStream, req: Request) -> Response {
    write_message(stream, &req).await.expect("send");
    read_message(stream).await.expect("recv")
}

fn auto_start_manual_config() -> &'static str {
    r#"{
        "apps": [
            { "name": "autoApp",
              "processes": [ { "name": "main", "execPath": "/bin/sleep", "args": ["30"] } ] },
            { "name": "manualApp", "startManual": true,
              "processes": [ { "name": "main", "execPath": "/bin/sleep", "args": ["30"] } ] }
        ]
    }"#
}

#[tokio::test(flavor = "multi_thread")]
async fn auto_start_activates_only_apps_configured_for_it() {
    let supervisor = Supervisor::spawn(auto_start_manual_config());
    let mut stream = supervisor.connect().await;

    let resp = request(&mut stream, Request::GetState { app_name: "autoApp".to_string() }).await;
    assert_eq!(resp, Response::State { state: asc_wire::types::WireAppState::Running });

    let resp = request(&mut stream, Request::GetState { app_name: "manualApp".to_string() }).await;
    assert_eq!(resp, Response::Error { error: asc_wire::types::WireError::NotFound });
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_app_responds_ok_once_the_app_has_stopped() {
    let supervisor = Supervisor::spawn(auto_start_manual_config());
    let mut stream = supervisor.connect().await;

    let resp = request(&mut stream, Request::StopApp { app_name: "autoApp".to_string() }).await;
    assert_eq!(resp, Response::Ok);

    let resp = request(&mut stream, Request::GetState { app_name: "autoApp".to_string() }).await;
    assert_eq!(resp, Response::State { state: asc_wire::types::WireAppState::Stopped });
}

#[tokio::test(flavor = "multi_thread")]
async fn starting_an_unconfigured_app_reports_not_found() {
    let supervisor = Supervisor::spawn(auto_start_manual_config());
    let mut stream = supervisor.connect().await;

    let resp = request(&mut stream, Request::StartApp { app_name: "doesNotExist".to_string() }).await;
    assert_eq!(resp, Response::Error { error: asc_wire::types::WireError::NotFound });
}

#[tokio::test(flavor = "multi_thread")]
async fn ad_hoc_session_cleanup_invalidates_its_handles_on_disconnect() {
    let supervisor = Supervisor::spawn(auto_start_manual_config());

    let handle = {
        let mut stream = supervisor.connect().await;
        let resp = request(
            &mut stream,
            Request::AppProcCreate {
                app_name: "autoApp".to_string(),
                proc_name: None,
                exec_path: Some("/bin/sleep".to_string()),
            },
        )
        .await;
        let handle = match resp {
            Response::AppProcHandle { handle } => handle,
            other => panic!("expected a handle, got {other:?}"),
        };
        // stream (and the session it represents) drops here
        handle
    };

    // give the listener a moment to notice the disconnect and clean up
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut stream = supervisor.connect().await;
    let resp = request(&mut stream, Request::AppProcStart { handle }).await;
    assert_eq!(resp, Response::Error { error: asc_wire::types::WireError::NotFound });
}

#[tokio::test(flavor = "multi_thread")]
async fn adhoc_stop_handler_pushes_proc_stopped_after_the_process_exits() {
    let supervisor = Supervisor::spawn(auto_start_manual_config());
    let mut stream = supervisor.connect().await;

    let resp = request(
        &mut stream,
        Request::AppProcCreate {
            app_name: "autoApp".to_string(),
            proc_name: None,
            exec_path: Some("/bin/true".to_string()),
        },
    )
    .await;
    let handle = match resp {
        Response::AppProcHandle { handle } => handle,
        other => panic!("expected a handle, got {other:?}"),
    };

    let resp = request(&mut stream, Request::AppProcAddStopHandler { handle: handle.clone() }).await;
    assert_eq!(resp, Response::AppProcHandlerRef { handler_ref: handle.clone() });

    let resp = request(&mut stream, Request::AppProcStart { handle: handle.clone() }).await;
    assert_eq!(resp, Response::Ok);

    // `/bin/true` exits immediately; the push should arrive on this same
    // connection without us sending anything else.
    let pushed: Response =
        tokio::time::timeout(Duration::from_secs(5), read_message(&mut stream)).await.expect("push in time").expect("push");
    assert_eq!(pushed, Response::ProcStopped { handler_ref: handle });
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_pid_reports_not_found_without_touching_zombies() {
    let supervisor = Supervisor::spawn(auto_start_manual_config());
    let mut stream = supervisor.connect().await;

    let resp = request(&mut stream, Request::GetNameByPid { pid: 999_999 }).await;
    assert_eq!(resp, Response::Error { error: asc_wire::types::WireError::NotFound });
}
