// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon auto-start: liveness probing, stale-PID recovery, detached
//! spawn, and socket-readiness polling.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use rig_daemon::RuntimePaths;

use crate::client::DaemonClient;

/// Total wait for an auto-started daemon to become reachable.
const AUTO_START_WAIT: Duration = Duration::from_secs(5);

/// Poll interval while waiting for the socket to appear.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Connect attempts once the socket file exists.
const CONNECT_RETRIES: u32 = 3;

/// Ensure a daemon is running, auto-starting one when needed, and return
/// a verified-working client.
pub async fn ensure_running() -> Result<DaemonClient> {
    let paths = RuntimePaths::resolve();
    let client = DaemonClient::new();

    if paths.is_running() {
        // The recorded PID is alive; confirm the socket answers too.
        if client.ping().await.is_ok() {
            return Ok(client);
        }
        // PID alive but unreachable (or recycled): treat as stale.
        paths.remove_pid_file();
    }

    start_background_daemon(&paths, &client).await?;
    Ok(client)
}

/// Spawn a detached `rigd` and wait for its socket to accept.
async fn start_background_daemon(paths: &RuntimePaths, client: &DaemonClient) -> Result<()> {
    let rigd = find_rigd_binary()?;
    let mut child = spawn_detached(&rigd)
        .with_context(|| format!("failed to spawn daemon binary {}", rigd.display()))?;

    let deadline = std::time::Instant::now() + AUTO_START_WAIT;
    let socket_path = paths.socket_path();

    loop {
        // A fast-failing child is reported immediately, with the reason
        // pulled from the daemon log.
        if let Ok(Some(status)) = child.try_wait() {
            return Err(startup_failure(paths, format!("daemon exited with {status}")));
        }

        if socket_path.exists() {
            for _ in 0..CONNECT_RETRIES {
                if client.ping().await.is_ok() {
                    return Ok(());
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        }

        if std::time::Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Err(startup_failure(paths, "timed out waiting for daemon".to_string()));
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

fn startup_failure(paths: &RuntimePaths, fallback: String) -> anyhow::Error {
    match std::fs::read_to_string(paths.log_path()).ok().and_then(|log| parse_startup_error(&log))
    {
        Some(reason) => anyhow!("failed to start daemon: {reason}"),
        None => anyhow!("failed to start daemon: {fallback}"),
    }
}

/// Extract the failure reason logged after the most recent startup marker.
fn parse_startup_error(log: &str) -> Option<String> {
    let section = log.rsplit("--- rigd: starting").next()?;
    if section.len() == log.len() {
        // No marker at all.
        return None;
    }
    for line in section.lines() {
        if let Some((_, reason)) = line.split_once("Failed to start daemon: ") {
            return Some(reason.trim().to_string());
        }
    }
    None
}

fn spawn_detached(rigd: &std::path::Path) -> std::io::Result<std::process::Child> {
    let mut command = std::process::Command::new(rigd);
    command.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

    // Detach from the CLI's process group so the daemon survives the
    // front-end's exit and its terminal signals.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    command.spawn()
}

/// Locate the `rigd` binary: a sibling of the current executable first,
/// then `PATH`.
pub fn find_rigd_binary() -> Result<PathBuf> {
    if let Ok(current_exe) = std::env::current_exe() {
        if let Some(dir) = current_exe.parent() {
            let sibling = dir.join("rigd");
            if sibling.exists() {
                return Ok(sibling);
            }
        }
    }

    Ok(PathBuf::from("rigd"))
}

#[cfg(test)]
#[path = "daemon_process_tests.rs"]
mod tests;
