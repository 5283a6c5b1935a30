// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use asc_core::error::CoreError;
use tokio::net::UnixStream;

/// Drives a client half against `handle_connection` running on a spawned
/// task, with `responder` standing in for the engine: it receives each
/// `Command` and decides how to reply.
async fn with_client<F, Fut>(responder: F, exercise: impl FnOnce(UnixStream) -> Fut)
where
    F: Fn(Command) + Send + 'static,
    Fut: std::future::Future<Output = ()>,
{
    let (client, server) = UnixStream::pair().unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let _ = handle_connection(server, SessionId(1), tx).await;
    });
    tokio::spawn(async move {
        while let Some(cmd) = rx.recv().await {
            responder(cmd);
        }
    });

    exercise(client).await;
}

#[tokio::test]
async fn hello_handshake_echoes_protocol_version() {
    with_client(|_cmd| {}, |mut client| async move {
        write_message(&mut client, &Request::Hello { client_version: PROTOCOL_VERSION }).await.unwrap();
        let resp: Response = read_message(&mut client).await.unwrap();
        assert_eq!(resp, Response::Hello { server_version: PROTOCOL_VERSION });
    })
    .await;
}

#[tokio::test]
async fn ping_gets_pong_without_touching_the_engine() {
    with_client(
        |cmd| {
            if !matches!(cmd, Command::RegisterSession { .. }) {
                panic!("ping should not reach the engine");
            }
        },
        |mut client| async move {
            write_message(&mut client, &Request::Hello { client_version: PROTOCOL_VERSION }).await.unwrap();
            let _: Response = read_message(&mut client).await.unwrap();

            write_message(&mut client, &Request::Ping).await.unwrap();
            let resp: Response = read_message(&mut client).await.unwrap();
            assert_eq!(resp, Response::Pong);
        },
    )
    .await;
}

#[tokio::test]
async fn start_app_success_replies_ok() {
    with_client(
        |cmd| {
            if let Command::StartApp { reply, .. } = cmd {
                let _ = reply.send(Ok(()));
            }
        },
        |mut client| async move {
            write_message(&mut client, &Request::Hello { client_version: PROTOCOL_VERSION }).await.unwrap();
            let _: Response = read_message(&mut client).await.unwrap();

            write_message(&mut client, &Request::StartApp { app_name: "hello".to_string() }).await.unwrap();
            let resp: Response = read_message(&mut client).await.unwrap();
            assert_eq!(resp, Response::Ok);
        },
    )
    .await;
}

#[tokio::test]
async fn start_app_failure_maps_core_error_to_wire_error() {
    with_client(
        |cmd| {
            if let Command::StartApp { reply, .. } = cmd {
                let _ = reply.send(Err(CoreError::NotFound));
            }
        },
        |mut client| async move {
            write_message(&mut client, &Request::Hello { client_version: PROTOCOL_VERSION }).await.unwrap();
            let _: Response = read_message(&mut client).await.unwrap();

            write_message(&mut client, &Request::StartApp { app_name: "nope".to_string() }).await.unwrap();
            let resp: Response = read_message(&mut client).await.unwrap();
            assert_eq!(resp, Response::Error { error: asc_wire::types::WireError::NotFound });
        },
    )
    .await;
}

#[tokio::test]
async fn appproc_create_returns_the_handle_as_a_string() {
    with_client(
        |cmd| {
            if let Command::AppProcCreate { reply, .. } = cmd {
                let _ = reply.send(Ok(AppProcHandleId::from("appproc-xyz")));
            }
        },
        |mut client| async move {
            write_message(&mut client, &Request::Hello { client_version: PROTOCOL_VERSION }).await.unwrap();
            let _: Response = read_message(&mut client).await.unwrap();

            write_message(
                &mut client,
                &Request::AppProcCreate { app_name: "hello".to_string(), proc_name: None, exec_path: Some("/bin/true".to_string()) },
            )
            .await
            .unwrap();
            let resp: Response = read_message(&mut client).await.unwrap();
            assert_eq!(resp, Response::AppProcHandle { handle: "appproc-xyz".to_string() });
        },
    )
    .await;
}

#[tokio::test]
async fn malformed_priority_is_rejected_before_reaching_the_engine() {
    with_client(
        |cmd| {
            if !matches!(cmd, Command::RegisterSession { .. }) {
                panic!("an invalid priority must not reach the engine");
            }
        },
        |mut client| async move {
            write_message(&mut client, &Request::Hello { client_version: PROTOCOL_VERSION }).await.unwrap();
            let _: Response = read_message(&mut client).await.unwrap();

            write_message(
                &mut client,
                &Request::AppProcSetPriority { handle: "appproc-xyz".to_string(), priority: "ludicrous".to_string() },
            )
            .await
            .unwrap();
            let resp: Response = read_message(&mut client).await.unwrap();
            assert_eq!(resp, Response::Error { error: asc_wire::types::WireError::Invalid });
        },
    )
    .await;
}
