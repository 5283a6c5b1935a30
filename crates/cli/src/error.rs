// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use std::fmt;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

impl From<asc_wire::types::WireError> for ExitError {
    fn from(e: asc_wire::types::WireError) -> Self {
        let code = match e {
            asc_wire::types::WireError::NotFound => 2,
            asc_wire::types::WireError::AlreadyRunning => 3,
            asc_wire::types::WireError::NotPermitted => 4,
            asc_wire::types::WireError::Invalid => 5,
            asc_wire::types::WireError::Overflow => 6,
            asc_wire::types::WireError::Duplicate => 7,
            asc_wire::types::WireError::Fault => 8,
            asc_wire::types::WireError::IoError => 9,
        };
        Self::new(code, format!("{e:?}"))
    }
}
