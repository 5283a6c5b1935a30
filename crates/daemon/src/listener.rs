// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Unix-socket front end: accepts connections, speaks the `Hello`
//! handshake, and translates each [`asc_wire::Request`] into an
//! [`crate::engine::Command`] sent to the single engine task (§6).

use asc_core::appproc::{AppProcHandleId, SessionId};
use asc_core::container::StopCmdRef;
use asc_core::error::CoreError;
use asc_wire::request::Request;
use asc_wire::response::Response;
use asc_wire::types::{WireAppState, WireError, WireProcState, WireWatchdogAction};
use asc_wire::{read_message, write_message, PROTOCOL_VERSION};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::engine::Command;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_STOP_CMD: AtomicU64 = AtomicU64::new(1);

/// Accepts connections on `listener` until the socket is closed, spawning
/// one task per connection. Each connection shares the same `commands`
/// sender into the engine task; the engine itself is what serializes
/// access, so fan-out here is unbounded.
pub async fn serve(listener: UnixListener, commands: mpsc::UnboundedSender<Command>) {
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let commands = commands.clone();
                tokio::spawn(async move {
                    let session = SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
                    if let Err(e) = handle_connection(stream, session, commands.clone()).await {
                        debug!(error = %e, "connection closed");
                    }
                    let _ = commands.send(Command::SessionClosed { session });
                });
            }
            Err(e) => {
                warn!(error = %e, "accept failed");
                return;
            }
        }
    }
}

async fn handle_connection(
    mut stream: UnixStream,
    session: SessionId,
    commands: mpsc::UnboundedSender<Command>,
) -> Result<(), asc_wire::WireError> {
    match read_message::<Request, _>(&mut stream).await? {
        Request::Hello { client_version } => {
            if client_version != PROTOCOL_VERSION {
                warn!(client_version, "protocol version mismatch");
            }
            write_message(&mut stream, &Response::Hello { server_version: PROTOCOL_VERSION }).await?;
        }
        other => {
            warn!(?other, "expected Hello as the first message");
            return Ok(());
        }
    }

    let (push_tx, mut push_rx) = mpsc::unbounded_channel();
    let _ = commands.send(Command::RegisterSession { session, push: push_tx });

    loop {
        tokio::select! {
            biased;

            push = push_rx.recv() => {
                // The sender side lives in the engine task and is only
                // dropped at process shutdown, so `None` here is not
                // expected in practice; treat it the same as a clean close.
                let Some(response) = push else { return Ok(()) };
                write_message(&mut stream, &response).await?;
            }
            request = read_message::<Request, _>(&mut stream) => {
                let request = match request {
                    Ok(r) => r,
                    Err(asc_wire::WireError::Eof) => return Ok(()),
                    Err(e) => return Err(e),
                };
                let response = dispatch(request, session, &commands).await;
                write_message(&mut stream, &response).await?;
            }
        }
    }
}

async fn dispatch(request: Request, session: SessionId, commands: &mpsc::UnboundedSender<Command>) -> Response {
    match request {
        Request::Hello { .. } => {
            warn!("unexpected repeated Hello on an established connection");
            Response::Error { error: WireError::Invalid }
        }
        Request::Ping => Response::Pong,

        Request::StartApp { app_name } => {
            reply_unit(commands, |reply| Command::StartApp { name: app_name, reply }).await
        }
        Request::StopApp { app_name } => {
            let stop_cmd = StopCmdRef(NEXT_STOP_CMD.fetch_add(1, Ordering::Relaxed));
            reply_unit(commands, |reply| Command::StopApp { name: app_name, stop_cmd, reply }).await
        }
        Request::GetState { app_name } => {
            let (tx, rx) = oneshot::channel();
            let _ = commands.send(Command::GetState { name: app_name, reply: tx });
            match rx.await {
                Ok(Ok(state)) => Response::State { state: WireAppState::from(state) },
                Ok(Err(e)) => Response::Error { error: e.into() },
                Err(_) => Response::Error { error: WireError::Fault },
            }
        }
        Request::GetProcState { app_name, proc_name } => {
            let (tx, rx) = oneshot::channel();
            let _ = commands.send(Command::GetProcState { name: app_name, proc_name, reply: tx });
            match rx.await {
                Ok(Ok(state)) => Response::ProcState { state: WireProcState::from(state) },
                Ok(Err(e)) => Response::Error { error: e.into() },
                Err(_) => Response::Error { error: WireError::Fault },
            }
        }
        Request::GetNameByPid { pid } => {
            let (tx, rx) = oneshot::channel();
            let _ = commands.send(Command::GetNameByPid { pid, reply: tx });
            match rx.await {
                Ok(Ok(app_name)) => Response::Name { app_name },
                Ok(Err(e)) => Response::Error { error: e.into() },
                Err(_) => Response::Error { error: WireError::Fault },
            }
        }
        Request::GetHash { app_name } => {
            let (tx, rx) = oneshot::channel();
            let _ = commands.send(Command::GetHash { name: app_name, reply: tx });
            match rx.await {
                Ok(Ok(hash)) => Response::Hash { hash },
                Ok(Err(e)) => Response::Error { error: e.into() },
                Err(_) => Response::Error { error: WireError::Fault },
            }
        }
        Request::WatchdogExpired { app_name, proc_id } => {
            let (tx, rx) = oneshot::channel();
            let _ = commands.send(Command::WatchdogExpired { name: app_name, proc_id, reply: tx });
            match rx.await {
                Ok(Ok(action)) => Response::WatchdogResult { action: WireWatchdogAction::from(action) },
                Ok(Err(e)) => Response::Error { error: e.into() },
                Err(_) => Response::Error { error: WireError::Fault },
            }
        }

        Request::AppProcCreate { app_name, proc_name, exec_path } => {
            let (tx, rx) = oneshot::channel();
            let _ = commands.send(Command::AppProcCreate { session, app_name, proc_name, exec_path, reply: tx });
            match rx.await {
                Ok(Ok(handle)) => Response::AppProcHandle { handle: handle.to_string() },
                Ok(Err(e)) => Response::Error { error: e.into() },
                Err(_) => Response::Error { error: WireError::Fault },
            }
        }
        Request::AppProcSetStdin { handle, fd } => {
            reply_unit(commands, |reply| Command::AppProcSetStdin { handle: handle_id(handle), fd, reply }).await
        }
        Request::AppProcSetStdout { handle, fd } => {
            reply_unit(commands, |reply| Command::AppProcSetStdout { handle: handle_id(handle), fd, reply }).await
        }
        Request::AppProcSetStderr { handle, fd } => {
            reply_unit(commands, |reply| Command::AppProcSetStderr { handle: handle_id(handle), fd, reply }).await
        }
        Request::AppProcAddArg { handle, arg } => {
            reply_unit(commands, |reply| Command::AppProcAddArg { handle: handle_id(handle), arg, reply }).await
        }
        Request::AppProcClearArgs { handle } => {
            reply_unit(commands, |reply| Command::AppProcClearArgs { handle: handle_id(handle), reply }).await
        }
        Request::AppProcSetPriority { handle, priority } => {
            match asc_core::application::Priority::parse(&priority) {
                Some(priority) => {
                    reply_unit(commands, |reply| Command::AppProcSetPriority { handle: handle_id(handle), priority, reply }).await
                }
                None => Response::Error { error: WireError::Invalid },
            }
        }
        Request::AppProcClearPriority { handle } => {
            reply_unit(commands, |reply| Command::AppProcClearPriority { handle: handle_id(handle), reply }).await
        }
        Request::AppProcSetFaultAction { handle, action } => {
            reply_unit(commands, |reply| Command::AppProcSetFaultAction { handle: handle_id(handle), action: action.into(), reply }).await
        }
        Request::AppProcClearFaultAction { handle } => {
            reply_unit(commands, |reply| Command::AppProcClearFaultAction { handle: handle_id(handle), reply }).await
        }
        Request::AppProcAddStopHandler { handle } => {
            let (tx, rx) = oneshot::channel();
            let _ = commands.send(Command::AppProcAddStopHandler { handle: handle_id(handle), reply: tx });
            match rx.await {
                Ok(Ok(handler_ref)) => Response::AppProcHandlerRef { handler_ref: handler_ref.to_string() },
                Ok(Err(e)) => Response::Error { error: e.into() },
                Err(_) => Response::Error { error: WireError::Fault },
            }
        }
        Request::AppProcRemoveStopHandler { handle } => {
            reply_unit(commands, |reply| Command::AppProcRemoveStopHandler { handle: handle_id(handle), reply }).await
        }
        Request::AppProcStart { handle } => {
            reply_unit(commands, |reply| Command::AppProcStart { handle: handle_id(handle), reply }).await
        }
        Request::AppProcDelete { handle } => {
            reply_unit(commands, |reply| Command::AppProcDelete { handle: handle_id(handle), reply }).await
        }
    }
}

fn handle_id(raw: String) -> AppProcHandleId {
    AppProcHandleId::from(raw)
}

async fn reply_unit(
    commands: &mpsc::UnboundedSender<Command>,
    build: impl FnOnce(oneshot::Sender<Result<(), CoreError>>) -> Command,
) -> Response {
    let (tx, rx) = oneshot::channel();
    let _ = commands.send(build(tx));
    match rx.await {
        Ok(Ok(())) => Response::Ok,
        Ok(Err(e)) => Response::Error { error: e.into() },
        Err(_) => Response::Error { error: WireError::Fault },
    }
}

pub async fn bind(path: &std::path::Path) -> std::io::Result<UnixListener> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let listener = UnixListener::bind(path)?;
    info!(path = %path.display(), "listening for supervisor connections");
    Ok(listener)
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
