// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use rig_core::PluginSource;
use rig_plugins::SearchDir;

/// Host version (from Cargo.toml plus the build's git hash)
pub const HOST_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH"));

/// Resolve the namespaced runtime directory:
/// `RIG_RUNTIME_DIR` > `XDG_RUNTIME_DIR` > system temp, plus `rig-daemon/`.
pub fn runtime_dir() -> PathBuf {
    let base = std::env::var("RIG_RUNTIME_DIR")
        .or_else(|_| std::env::var("XDG_RUNTIME_DIR"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir());
    base.join("rig-daemon")
}

/// Default IPC timeout for one-shot requests and frame writes.
pub fn ipc_timeout() -> Duration {
    std::env::var("RIG_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Idle timeout after which a warm plugin is stopped (default 5 min).
pub fn plugin_idle_timeout() -> Duration {
    std::env::var("RIG_PLUGIN_IDLE_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(5 * 60))
}

/// Idle timeout after which the daemon shuts itself down (default 15 min).
pub fn daemon_idle_timeout() -> Duration {
    std::env::var("RIG_DAEMON_IDLE_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(15 * 60))
}

/// Reaper tick override, for tests.
pub fn reap_interval() -> Duration {
    std::env::var("RIG_REAP_INTERVAL_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(60))
}

/// Plugin search directories, lowest precedence first: the system
/// directory (`RIG_PLUGIN_PATH`, else `~/.local/share/rig/plugins`), then
/// the project directory (`.rig/plugins` under the daemon's working
/// directory).
pub fn plugin_search_dirs() -> Vec<SearchDir> {
    let system = std::env::var("RIG_PLUGIN_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        let home = std::env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."));
        home.join(".local/share/rig/plugins")
    });

    let project = std::env::current_dir()
        .map(|cwd| cwd.join(".rig/plugins"))
        .unwrap_or_else(|_| PathBuf::from(".rig/plugins"));

    vec![
        SearchDir::new(system, PluginSource::System),
        SearchDir::new(project, PluginSource::Project),
    ]
}
