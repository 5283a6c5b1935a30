// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-level errors: everything that can go wrong before a client
//! connection even exists (config loading, socket binding, SIGCHLD setup).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config at {path}: {source}")]
    Config { path: std::path::PathBuf, source: std::io::Error },
}
