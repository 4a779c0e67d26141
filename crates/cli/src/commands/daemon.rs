// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rig daemon` - Daemon management commands

use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use crate::client::DaemonClient;
use crate::daemon_process;

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon (background by default)
    Start {
        /// Run in foreground (useful for debugging)
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon
    Stop {
        /// Reserved: currently identical to a normal stop
        #[arg(long)]
        force: bool,
    },
    /// Check daemon status
    Status,
}

pub async fn daemon(args: DaemonArgs) -> Result<ExitCode> {
    match args.command {
        DaemonCommand::Start { foreground } => start(foreground).await,
        DaemonCommand::Stop { force } => stop(force).await,
        DaemonCommand::Status => status().await,
    }
}

async fn start(foreground: bool) -> Result<ExitCode> {
    if foreground {
        // Run the daemon binary directly and wait for it.
        let rigd = daemon_process::find_rigd_binary()?;
        let status = std::process::Command::new(&rigd).status()?;
        if !status.success() {
            return Err(anyhow!("daemon exited with status: {status}"));
        }
        return Ok(ExitCode::SUCCESS);
    }

    // Already running?
    let client = DaemonClient::new();
    if let Ok(info) = client.status().await {
        println!("Daemon already running (uptime: {}s)", info.uptime_secs);
        return Ok(ExitCode::SUCCESS);
    }

    daemon_process::ensure_running().await?;
    println!("Daemon started");
    Ok(ExitCode::SUCCESS)
}

async fn stop(force: bool) -> Result<ExitCode> {
    let client = DaemonClient::new();
    match client.shutdown(force).await {
        Ok(true) => {
            println!("Daemon stopped");
            Ok(ExitCode::SUCCESS)
        }
        Ok(false) => Err(anyhow!("daemon refused to stop")),
        Err(e) if e.is_not_running() => {
            println!("Daemon not running");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Err(anyhow!("failed to stop daemon: {e}")),
    }
}

async fn status() -> Result<ExitCode> {
    let client = DaemonClient::new();
    let info = match client.status().await {
        Ok(info) => info,
        Err(e) if e.is_not_running() => {
            println!("Daemon not running");
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => return Err(anyhow!("{e}")),
    };

    println!("Status: running");
    println!("Version: {}", info.daemon_version);
    println!("PID: {}", info.pid);
    println!("Uptime: {}", format_uptime(info.uptime_secs));
    println!("Sessions: {} active", info.active_sessions);
    if info.warm_plugins.is_empty() {
        println!("Warm plugins: none");
    } else {
        println!("Warm plugins: {}", info.warm_plugins.join(", "));
    }
    Ok(ExitCode::SUCCESS)
}

fn format_uptime(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::format_uptime;

    #[test]
    fn format_uptime_picks_the_largest_unit() {
        assert_eq!(format_uptime(5), "5s");
        assert_eq!(format_uptime(65), "1m 5s");
        assert_eq!(format_uptime(3665), "1h 1m 5s");
    }
}
