// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, cleanup.

mod startup;

pub use startup::startup;

use std::path::PathBuf;
use std::sync::Arc;

use rig_plugins::{PluginManager, SearchDir};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::reaper::ReaperConfig;
use crate::runtime::RuntimePaths;
use crate::state::LifecycleState;

/// Daemon configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Namespaced runtime directory paths (socket, PID file, log).
    pub runtime: RuntimePaths,
    /// Plugin search directories, lowest precedence first.
    pub plugin_dirs: Vec<SearchDir>,
    /// Host version advertised to plugins and compat-checked.
    pub host_version: String,
    pub reaper: ReaperConfig,
}

impl Config {
    /// Load configuration from the environment.
    pub fn load() -> Self {
        Self {
            runtime: RuntimePaths::resolve(),
            plugin_dirs: crate::env::plugin_search_dirs(),
            host_version: crate::env::HOST_VERSION.to_string(),
            reaper: ReaperConfig {
                tick: crate::env::reap_interval(),
                plugin_idle: crate::env::plugin_idle_timeout(),
                daemon_idle: crate::env::daemon_idle_timeout(),
            },
        }
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("daemon already running (pid {0})")]
    AlreadyRunning(u32),

    #[error("failed to prepare runtime directory {path}: {source}")]
    RuntimeDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A started daemon: background tasks running, sockets bound.
pub struct Daemon {
    pub config: Config,
    lifecycle: Arc<LifecycleState>,
    manager: Arc<PluginManager>,
    ui_socket_dir: PathBuf,
    cancel: CancellationToken,
}

impl std::fmt::Debug for Daemon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Daemon")
            .field("config", &self.config)
            .field("lifecycle", &self.lifecycle)
            .field("ui_socket_dir", &self.ui_socket_dir)
            .field("cancel", &self.cancel)
            .finish()
    }
}

impl Daemon {
    /// Shared lifecycle handle, for signal handlers and tests.
    pub fn handle(&self) -> Arc<LifecycleState> {
        Arc::clone(&self.lifecycle)
    }

    /// Block until a shutdown trigger fires (RPC, signal, or reaper).
    pub async fn run(&self) {
        self.lifecycle.shutdown_signalled().await;
    }

    /// Graceful stop: cancel background tasks, stop every plugin, then
    /// release the filesystem state through the deferred cleanup chain.
    pub async fn shutdown(&self) {
        info!("shutting down daemon...");

        // 1. Stop accepting work.
        self.cancel.cancel();

        // 2. Stop all plugins; their tokens cancel in-flight RPCs first.
        self.manager.stop_all().await;

        // 3. Remove socket and PID file.
        self.config.runtime.remove_pid_file();

        // 4. Remove the host-side UI socket directory.
        if let Err(e) = std::fs::remove_dir_all(&self.ui_socket_dir) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(error = %e, "failed to remove ui socket directory");
            }
        }

        info!("daemon shutdown complete");
    }

    pub(crate) fn new(
        config: Config,
        lifecycle: Arc<LifecycleState>,
        manager: Arc<PluginManager>,
        ui_socket_dir: PathBuf,
        cancel: CancellationToken,
    ) -> Self {
        Self { config, lifecycle, manager, ui_socket_dir, cancel }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
