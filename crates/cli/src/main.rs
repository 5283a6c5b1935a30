// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `asc`: the command-line client for the Application Supervisor daemon.

mod client;
mod error;

use asc_wire::types::{WireAppState, WireProcFaultAction, WireProcState, WireWatchdogAction};
use asc_wire::Request;
use clap::{Parser, Subcommand};
use client::DaemonClient;
use error::ExitError;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "asc", about = "Control the Application Supervisor daemon")]
struct Cli {
    /// Path to the supervisor's Unix socket (defaults to $ASC_SOCKET_PATH or the standard location).
    #[arg(long, global = true)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start an installed application.
    Start { app_name: String },
    /// Stop a running application and wait for it to finish.
    Stop { app_name: String },
    /// Print an application's run state.
    State { app_name: String },
    /// Print one of an application's process's run state.
    ProcState { app_name: String, proc_name: String },
    /// Print the name of the application owning `pid`.
    NameByPid { pid: i32 },
    /// Print an application's installed MD5 hash.
    Hash { app_name: String },
    /// Report a watchdog expiry for one of an app's processes.
    WatchdogExpired { app_name: String, proc_id: u32 },
    /// Ad-hoc process management.
    #[command(subcommand)]
    Proc(ProcCommand),
}

#[derive(Subcommand)]
enum ProcCommand {
    /// Create an ad-hoc process handle.
    Create {
        app_name: String,
        /// Name of a process already configured for this app.
        #[arg(long)]
        proc_name: Option<String>,
        /// Executable path for a bare ad-hoc process (mutually exclusive with `--proc-name`).
        #[arg(long)]
        exec_path: Option<String>,
    },
    SetStdin { handle: String, #[arg(long)] fd: Option<i32> },
    SetStdout { handle: String, #[arg(long)] fd: Option<i32> },
    SetStderr { handle: String, #[arg(long)] fd: Option<i32> },
    AddArg { handle: String, arg: String },
    ClearArgs { handle: String },
    SetPriority { handle: String, priority: String },
    ClearPriority { handle: String },
    SetFaultAction { handle: String, action: String },
    ClearFaultAction { handle: String },
    /// Register interest in a stop notification, delivered later as an
    /// unsolicited push on this same connection once the process reaches
    /// STOPPED.
    AddStopHandler { handle: String },
    RemoveStopHandler { handle: String },
    Start { handle: String },
    Delete { handle: String },
}

fn fault_action_from_str(s: &str) -> Result<WireProcFaultAction, ExitError> {
    match s {
        "ignore" => Ok(WireProcFaultAction::Ignore),
        "restart_proc" => Ok(WireProcFaultAction::RestartProc),
        "restart_app" => Ok(WireProcFaultAction::RestartApp),
        "stop_app" => Ok(WireProcFaultAction::StopApp),
        "reboot" => Ok(WireProcFaultAction::Reboot),
        other => Err(ExitError::new(64, format!("unknown fault action: {other}"))),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let socket_path = cli.socket.unwrap_or_else(asc_daemon_env_socket_path);

    if let Err(e) = run(&socket_path, cli.command).await {
        eprintln!("asc: {e}");
        std::process::exit(e.code);
    }
}

/// Resolves the default socket path the same way the daemon does, without
/// pulling in the whole daemon crate just for this one function.
fn asc_daemon_env_socket_path() -> PathBuf {
    match std::env::var("ASC_SOCKET_PATH") {
        Ok(p) => PathBuf::from(p),
        Err(_) => {
            let state_dir = std::env::var("ASC_STATE_DIR").unwrap_or_else(|_| "/var/run/asc".to_string());
            PathBuf::from(state_dir).join("supervisor.sock")
        }
    }
}

async fn run(socket_path: &std::path::Path, command: Command) -> Result<(), ExitError> {
    let mut client = DaemonClient::connect(socket_path).await?;

    match command {
        Command::Start { app_name } => client.send_expect_ok(&Request::StartApp { app_name }).await,
        Command::Stop { app_name } => client.send_expect_ok(&Request::StopApp { app_name }).await,
        Command::State { app_name } => {
            match client.send(&Request::GetState { app_name }).await? {
                asc_wire::Response::State { state } => {
                    println!("{}", format_app_state(state));
                    Ok(())
                }
                asc_wire::Response::Error { error } => Err(error.into()),
                other => Err(ExitError::new(70, format!("unexpected response: {other:?}"))),
            }
        }
        Command::ProcState { app_name, proc_name } => {
            match client.send(&Request::GetProcState { app_name, proc_name }).await? {
                asc_wire::Response::ProcState { state } => {
                    println!("{}", format_proc_state(state));
                    Ok(())
                }
                asc_wire::Response::Error { error } => Err(error.into()),
                other => Err(ExitError::new(70, format!("unexpected response: {other:?}"))),
            }
        }
        Command::NameByPid { pid } => {
            match client.send(&Request::GetNameByPid { pid }).await? {
                asc_wire::Response::Name { app_name } => {
                    println!("{app_name}");
                    Ok(())
                }
                asc_wire::Response::Error { error } => Err(error.into()),
                other => Err(ExitError::new(70, format!("unexpected response: {other:?}"))),
            }
        }
        Command::Hash { app_name } => {
            match client.send(&Request::GetHash { app_name }).await? {
                asc_wire::Response::Hash { hash } => {
                    println!("{hash}");
                    Ok(())
                }
                asc_wire::Response::Error { error } => Err(error.into()),
                other => Err(ExitError::new(70, format!("unexpected response: {other:?}"))),
            }
        }
        Command::WatchdogExpired { app_name, proc_id } => {
            match client.send(&Request::WatchdogExpired { app_name, proc_id }).await? {
                asc_wire::Response::WatchdogResult { action } => {
                    println!("{}", format_watchdog_action(action));
                    Ok(())
                }
                asc_wire::Response::Error { error } => Err(error.into()),
                other => Err(ExitError::new(70, format!("unexpected response: {other:?}"))),
            }
        }
        Command::Proc(proc_command) => run_proc(&mut client, proc_command).await,
    }
}

async fn run_proc(client: &mut DaemonClient, command: ProcCommand) -> Result<(), ExitError> {
    match command {
        ProcCommand::Create { app_name, proc_name, exec_path } => {
            match client.send(&Request::AppProcCreate { app_name, proc_name, exec_path }).await? {
                asc_wire::Response::AppProcHandle { handle } => {
                    println!("{handle}");
                    Ok(())
                }
                asc_wire::Response::Error { error } => Err(error.into()),
                other => Err(ExitError::new(70, format!("unexpected response: {other:?}"))),
            }
        }
        ProcCommand::SetStdin { handle, fd } => client.send_expect_ok(&Request::AppProcSetStdin { handle, fd }).await,
        ProcCommand::SetStdout { handle, fd } => client.send_expect_ok(&Request::AppProcSetStdout { handle, fd }).await,
        ProcCommand::SetStderr { handle, fd } => client.send_expect_ok(&Request::AppProcSetStderr { handle, fd }).await,
        ProcCommand::AddArg { handle, arg } => client.send_expect_ok(&Request::AppProcAddArg { handle, arg }).await,
        ProcCommand::ClearArgs { handle } => client.send_expect_ok(&Request::AppProcClearArgs { handle }).await,
        ProcCommand::SetPriority { handle, priority } => {
            client.send_expect_ok(&Request::AppProcSetPriority { handle, priority }).await
        }
        ProcCommand::ClearPriority { handle } => client.send_expect_ok(&Request::AppProcClearPriority { handle }).await,
        ProcCommand::SetFaultAction { handle, action } => {
            let action = fault_action_from_str(&action)?;
            client.send_expect_ok(&Request::AppProcSetFaultAction { handle, action }).await
        }
        ProcCommand::ClearFaultAction { handle } => client.send_expect_ok(&Request::AppProcClearFaultAction { handle }).await,
        ProcCommand::AddStopHandler { handle } => {
            match client.send(&Request::AppProcAddStopHandler { handle }).await? {
                asc_wire::Response::AppProcHandlerRef { handler_ref } => {
                    println!("{handler_ref}");
                    Ok(())
                }
                asc_wire::Response::Error { error } => Err(error.into()),
                other => Err(ExitError::new(70, format!("unexpected response: {other:?}"))),
            }
        }
        ProcCommand::RemoveStopHandler { handle } => {
            client.send_expect_ok(&Request::AppProcRemoveStopHandler { handle }).await
        }
        ProcCommand::Start { handle } => client.send_expect_ok(&Request::AppProcStart { handle }).await,
        ProcCommand::Delete { handle } => client.send_expect_ok(&Request::AppProcDelete { handle }).await,
    }
}

fn format_app_state(state: WireAppState) -> &'static str {
    match state {
        WireAppState::Running => "running",
        WireAppState::Stopped => "stopped",
    }
}

fn format_proc_state(state: WireProcState) -> &'static str {
    match state {
        WireProcState::Running => "running",
        WireProcState::Stopped => "stopped",
    }
}

fn format_watchdog_action(action: WireWatchdogAction) -> &'static str {
    match action {
        WireWatchdogAction::Ignore => "ignore",
        WireWatchdogAction::Handled => "handled",
        WireWatchdogAction::RestartApp => "restart_app",
        WireWatchdogAction::StopApp => "stop_app",
        WireWatchdogAction::Reboot => "reboot",
        WireWatchdogAction::NotFound => "not_found",
        WireWatchdogAction::Error => "error",
    }
}
