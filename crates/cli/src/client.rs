// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin IPC client: connects to the supervisor's Unix socket, performs the
//! `Hello` handshake, and exchanges length-prefixed JSON requests (§6).

use asc_wire::{read_message, write_message, Request, Response, PROTOCOL_VERSION};
use std::path::Path;
use std::time::Duration;
use tokio::net::UnixStream;

use crate::error::ExitError;

pub struct DaemonClient {
    stream: UnixStream,
    timeout: Duration,
}

/// Resolves the same client-side IPC timeout the daemon documents
/// (`ASC_IPC_TIMEOUT_MS`, default 5000ms, §6), read independently here
/// rather than pulling in the whole daemon crate for one constant.
fn ipc_timeout() -> Duration {
    let ms: u64 = std::env::var("ASC_IPC_TIMEOUT_MS").ok().and_then(|s| s.parse().ok()).unwrap_or(5000);
    Duration::from_millis(ms)
}

impl DaemonClient {
    pub async fn connect(socket_path: &Path) -> Result<Self, ExitError> {
        let mut stream = UnixStream::connect(socket_path).await.map_err(|e| {
            ExitError::new(70, format!("failed to connect to supervisor at {}: {e}", socket_path.display()))
        })?;

        write_message(&mut stream, &Request::Hello { client_version: PROTOCOL_VERSION })
            .await
            .map_err(|e| ExitError::new(70, format!("handshake failed: {e}")))?;
        let response: Response = read_message(&mut stream)
            .await
            .map_err(|e| ExitError::new(70, format!("handshake failed: {e}")))?;
        match response {
            Response::Hello { server_version } if server_version == PROTOCOL_VERSION => {}
            Response::Hello { server_version } => {
                return Err(ExitError::new(
                    70,
                    format!("protocol mismatch: client is v{PROTOCOL_VERSION}, supervisor is v{server_version}"),
                ));
            }
            other => return Err(ExitError::new(70, format!("unexpected handshake reply: {other:?}"))),
        }

        Ok(Self { stream, timeout: ipc_timeout() })
    }

    pub async fn send(&mut self, request: &Request) -> Result<Response, ExitError> {
        write_message(&mut self.stream, request)
            .await
            .map_err(|e| ExitError::new(70, format!("failed to send request: {e}")))?;
        match tokio::time::timeout(self.timeout, read_message(&mut self.stream)).await {
            Ok(result) => result.map_err(|e| ExitError::new(70, format!("failed to read response: {e}"))),
            Err(_) => Err(ExitError::new(70, format!("timed out waiting for a response after {:?}", self.timeout))),
        }
    }

    /// Sends `request` and expects `Response::Ok`, mapping any `Error`
    /// response to an `ExitError` with the matching exit code.
    pub async fn send_expect_ok(&mut self, request: &Request) -> Result<(), ExitError> {
        match self.send(request).await? {
            Response::Ok => Ok(()),
            Response::Error { error } => Err(error.into()),
            other => Err(ExitError::new(70, format!("unexpected response: {other:?}"))),
        }
    }
}
