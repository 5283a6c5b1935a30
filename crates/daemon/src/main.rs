// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `asc-supervisord`: the Application Supervisor daemon binary.

use asc_daemon::{env, lifecycle};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config_path = env::config_path();
    let install_dir = env::apps_install_dir();
    let socket_path = env::socket_path();

    let daemon = lifecycle::start(&config_path, install_dir, &socket_path).await?;
    daemon.wait_for_shutdown_signal().await;
    daemon.shutdown().await;

    Ok(())
}
