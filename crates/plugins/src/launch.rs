// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin subprocess launching and teardown.
//!
//! The launcher mints a private socket path, spawns the plugin with both
//! endpoint paths in its environment, and polls until the socket accepts
//! a connection. Any start-time failure tears everything down so a retry
//! begins from scratch.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::net::UnixStream;
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Environment variable naming the private socket the plugin must serve.
pub const PLUGIN_ENDPOINT_ENV: &str = "RIG_PLUGIN_ENDPOINT";

/// Environment variable naming the host UI socket the plugin may dial.
pub const HOST_ENDPOINT_ENV: &str = "RIG_HOST_ENDPOINT";

/// Fixed cap on waiting for a plugin to bind its socket.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll interval while waiting for the socket.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Grace period between SIGTERM and SIGKILL on stop.
const STOP_GRACE: Duration = Duration::from_secs(2);

/// Subprocess start failures. All of them leave no partial state behind.
#[derive(Debug, Error)]
pub enum StartError {
    #[error("failed to spawn {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("plugin did not bind {socket} within {waited_ms} ms")]
    SocketWait { socket: PathBuf, waited_ms: u128 },
}

impl StartError {
    /// Start failures are fully cleaned up and safe to retry.
    pub fn is_retryable(&self) -> bool {
        true
    }
}

/// Mint a fresh private socket path in the system temp directory.
///
/// Kept deliberately short: Unix socket paths have a hard OS limit
/// (~104 bytes on the smallest common platforms), well below typical
/// nested temp-directory paths.
pub fn mint_socket_path() -> PathBuf {
    let id = uuid::Uuid::new_v4().simple().to_string();
    std::env::temp_dir().join(format!("rig-{}.sock", &id[..8]))
}

/// A running plugin instance, however it was started.
#[async_trait::async_trait]
pub trait RunningPlugin: Send + Sync {
    fn pid(&self) -> Option<u32>;

    /// Cancellation token observed by in-flight RPCs against this plugin.
    fn cancel_token(&self) -> CancellationToken;

    /// Terminate, reap, and remove the socket file. Idempotent.
    async fn stop(self: Box<Self>);
}

impl std::fmt::Debug for dyn RunningPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningPlugin").field("pid", &self.pid()).finish()
    }
}

/// Launcher seam; swapped for an in-process fake in tests.
#[async_trait::async_trait]
pub trait PluginLauncher: Send + Sync {
    /// Spawn the plugin and wait until its socket accepts a connection,
    /// bounded by the nearer of `deadline` and the fixed handshake cap.
    async fn start(
        &self,
        exe: &Path,
        socket_path: &Path,
        deadline: Option<Instant>,
    ) -> Result<Box<dyn RunningPlugin>, StartError>;
}

/// Spawns real subprocesses with the endpoint paths in their environment.
pub struct ProcessLauncher {
    host_endpoint: PathBuf,
}

impl ProcessLauncher {
    /// `host_endpoint` is the UI socket handed to every child via
    /// `RIG_HOST_ENDPOINT`.
    pub fn new(host_endpoint: PathBuf) -> Self {
        Self { host_endpoint }
    }
}

#[async_trait::async_trait]
impl PluginLauncher for ProcessLauncher {
    async fn start(
        &self,
        exe: &Path,
        socket_path: &Path,
        deadline: Option<Instant>,
    ) -> Result<Box<dyn RunningPlugin>, StartError> {
        // Remove a stale socket so readiness can't observe a previous
        // instance.
        let _ = std::fs::remove_file(socket_path);

        let mut child = Command::new(exe)
            .env(PLUGIN_ENDPOINT_ENV, socket_path)
            .env(HOST_ENDPOINT_ENV, &self.host_endpoint)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            // Child stderr passes through to the supervisor's stderr.
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| StartError::Spawn { path: exe.to_owned(), source })?;

        debug!(exe = %exe.display(), socket = %socket_path.display(), "plugin spawned");

        match wait_for_socket(socket_path, deadline).await {
            Ok(()) => Ok(Box::new(PluginProcess {
                socket_path: socket_path.to_owned(),
                child,
                cancel: CancellationToken::new(),
            })),
            Err(err) => {
                // Tear down atomically so a retry starts from scratch.
                terminate(&mut child).await;
                let _ = std::fs::remove_file(socket_path);
                Err(err)
            }
        }
    }
}

/// A plugin running as a real child process.
pub struct PluginProcess {
    socket_path: PathBuf,
    child: Child,
    cancel: CancellationToken,
}

#[async_trait::async_trait]
impl RunningPlugin for PluginProcess {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    async fn stop(mut self: Box<Self>) {
        // Cancel first so in-flight RPCs unblock with a clear error
        // before the process goes away.
        self.cancel.cancel();
        terminate(&mut self.child).await;
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Poll until the socket exists on disk and accepts a connection.
async fn wait_for_socket(socket_path: &Path, deadline: Option<Instant>) -> Result<(), StartError> {
    let started = Instant::now();
    let cap = started + HANDSHAKE_TIMEOUT;
    let deadline = deadline.map_or(cap, |d| d.min(cap));

    loop {
        if socket_path.exists() {
            if let Ok(stream) = UnixStream::connect(socket_path).await {
                drop(stream);
                return Ok(());
            }
        }
        if Instant::now() >= deadline {
            return Err(StartError::SocketWait {
                socket: socket_path.to_owned(),
                waited_ms: started.elapsed().as_millis(),
            });
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// SIGTERM, wait with a grace period, SIGKILL on overrun, reap.
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
        if tokio::time::timeout(STOP_GRACE, child.wait()).await.is_ok() {
            return;
        }
        warn!(pid, "plugin ignored SIGTERM, killing");
    }

    let _ = child.kill().await;
    let _ = child.wait().await;
}

#[cfg(test)]
#[path = "launch_tests.rs"]
mod tests;
