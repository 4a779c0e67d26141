// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::path::PathBuf;
use std::sync::Arc;

use rig_plugins::{DirScanner, ManagerConfig, PluginManager, ProcessLauncher};
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{Config, Daemon, LifecycleError};
use crate::runtime::restrict_socket;
use crate::server::{Listener, ServerCtx};
use crate::state::LifecycleState;
use crate::ui::{spawn_ui_server, UiProxy};

/// Start the daemon: claim the PID file, bind both sockets, and spawn the
/// listener, UI server, and reaper tasks.
pub async fn startup(config: Config) -> Result<Daemon, LifecycleError> {
    match try_startup(&config).await {
        Ok(daemon) => Ok(daemon),
        Err(e) => {
            // Don't clean up when another daemon owns the files.
            if !matches!(e, LifecycleError::AlreadyRunning(_)) {
                cleanup_on_failure(&config);
            }
            Err(e)
        }
    }
}

async fn try_startup(config: &Config) -> Result<Daemon, LifecycleError> {
    // 1. Runtime directory, mode 0700.
    config.runtime.ensure_dir().map_err(|source| LifecycleError::RuntimeDir {
        path: config.runtime.dir.clone(),
        source,
    })?;

    // 2. PID collision check. A stale file (dead pid) is recovered; a
    // live one refuses startup.
    match config.runtime.read_pid_file() {
        Ok(pid) if crate::runtime::process_alive(pid) => {
            return Err(LifecycleError::AlreadyRunning(pid));
        }
        Ok(pid) => {
            warn!(pid, "removing stale PID file");
            config.runtime.remove_pid_file();
        }
        Err(_) => {}
    }
    config.runtime.write_pid_file()?;

    // 3. Host-side UI socket, in its own short-path directory.
    let (ui_socket_dir, ui_socket_path) = mint_ui_socket_path();
    std::fs::create_dir_all(&ui_socket_dir)?;
    restrict_dir(&ui_socket_dir)?;
    let ui_listener = UnixListener::bind(&ui_socket_path)
        .map_err(|e| LifecycleError::BindFailed(ui_socket_path.clone(), e))?;
    restrict_socket(&ui_socket_path)?;

    // 4. Plugin manager over the real scanner and launcher.
    let manager = Arc::new(PluginManager::new(
        Arc::new(DirScanner::new(config.plugin_dirs.clone())),
        Arc::new(ProcessLauncher::new(ui_socket_path.clone())),
        ManagerConfig {
            host_version: config.host_version.clone(),
            io_timeout: crate::env::ipc_timeout(),
            ..Default::default()
        },
    ));

    // 5. Remove a stale daemon socket and bind (last, after validation).
    let socket_path = config.runtime.socket_path();
    if socket_path.exists() {
        std::fs::remove_file(&socket_path)?;
    }
    let listener = UnixListener::bind(&socket_path)
        .map_err(|e| LifecycleError::BindFailed(socket_path.clone(), e))?;
    restrict_socket(&socket_path)?;

    // 6. Spawn the background tasks, all bounded by one token.
    let lifecycle = Arc::new(LifecycleState::new());
    let ui = Arc::new(UiProxy::new());
    let cancel = CancellationToken::new();

    spawn_ui_server(ui_listener, Arc::clone(&ui), cancel.clone());

    let ctx = Arc::new(ServerCtx {
        manager: Arc::clone(&manager),
        ui,
        lifecycle: Arc::clone(&lifecycle),
    });
    {
        let cancel = cancel.clone();
        let listener = Listener::new(listener, ctx);
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = listener.run() => {}
            }
        });
    }

    crate::reaper::spawn_reaper(
        config.reaper.clone(),
        Arc::clone(&lifecycle),
        Arc::clone(&manager),
        cancel.clone(),
    );

    info!(
        socket = %socket_path.display(),
        ui_socket = %ui_socket_path.display(),
        "daemon started"
    );

    Ok(Daemon::new(config.clone(), lifecycle, manager, ui_socket_dir, cancel))
}

/// `<tmp>/rig-h-XXXXXX/rig-h-<8hex>.sock`: short enough for the UDS
/// path limit, unique per daemon instance.
fn mint_ui_socket_path() -> (PathBuf, PathBuf) {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let dir = std::env::temp_dir().join(format!("rig-h-{}", &id[..6]));
    let socket = dir.join(format!("rig-h-{}.sock", &id[..8]));
    (dir, socket)
}

#[cfg(unix)]
fn restrict_dir(path: &std::path::Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
}

#[cfg(not(unix))]
fn restrict_dir(_path: &std::path::Path) -> std::io::Result<()> {
    Ok(())
}

/// Clean up resources on startup failure.
fn cleanup_on_failure(config: &Config) {
    config.runtime.remove_pid_file();
}
