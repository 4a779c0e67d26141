// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory of live plugins with lazy start.
//!
//! `get_or_start` is the critical path: scan, gate on compatibility,
//! launch, handshake, re-gate, install. Starts are serialized per plugin
//! name so two simultaneous first uses coalesce onto one subprocess.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rig_core::{validate_plugin, CompatError, Plugin, PluginStatus, CAP_ASSISTANT, CAP_COMMAND};
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

use crate::client::{AssistantClient, CommandClient};
use crate::handshake::{run_handshake, HandshakeError};
use crate::launch::{mint_socket_path, PluginLauncher, RunningPlugin, StartError, HANDSHAKE_TIMEOUT};
use crate::scan::PluginScanner;
use crate::transport::{PluginConn, TransportError};

/// Manager configuration fixed at daemon startup.
pub struct ManagerConfig {
    /// Host semver (with optional build metadata), or `dev`.
    pub host_version: String,
    /// Per-plugin config blobs, passed one-shot at handshake.
    pub plugin_config: HashMap<String, serde_json::Value>,
    /// Timeout for one-shot plugin RPCs (not execute streams).
    pub io_timeout: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            host_version: "dev".to_string(),
            plugin_config: HashMap::new(),
            io_timeout: Duration::from_secs(5),
        }
    }
}

/// Errors from the manager's public surface.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("plugin not found: {name}")]
    NotFound { name: String },

    #[error("plugin {name} is not usable: {reason}")]
    Unusable { name: String, reason: String },

    #[error("plugin {name}: {source}")]
    Incompatible {
        name: String,
        #[source]
        source: CompatError,
    },

    #[error("failed to start plugin {name}: {source}")]
    Start {
        name: String,
        #[source]
        source: StartError,
    },

    #[error("handshake with plugin {name} failed: {source}")]
    Handshake {
        name: String,
        #[source]
        source: HandshakeError,
    },

    #[error("plugin {name} does not advertise the {capability} capability")]
    MissingCapability { name: String, capability: String },

    #[error("transport failure for plugin {name}: {source}")]
    Transport {
        name: String,
        #[source]
        source: TransportError,
    },
}

impl ManagerError {
    /// Retryability propagates up from the cause chain.
    pub fn is_retryable(&self) -> bool {
        match self {
            ManagerError::Start { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}

/// A live, handshake-complete plugin. Runtime fields are cleared
/// atomically on stop.
pub struct PluginHandle {
    record: Mutex<Plugin>,
    conn: PluginConn,
    process: Mutex<Option<Box<dyn RunningPlugin>>>,
    last_used: Mutex<Instant>,
}

impl PluginHandle {
    pub fn name(&self) -> String {
        self.record.lock().name.clone()
    }

    /// Snapshot of the refined record.
    pub fn record(&self) -> Plugin {
        self.record.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.process.lock().is_some()
    }

    pub fn last_used(&self) -> Instant {
        *self.last_used.lock()
    }

    /// Stamp the last-use time. Called on client retrieval and on stream
    /// completion.
    pub fn touch(&self) {
        *self.last_used.lock() = Instant::now();
    }

    pub(crate) fn conn(&self) -> &PluginConn {
        &self.conn
    }

    /// Cancel, signal, reap, and clear runtime fields. Idempotent.
    async fn shutdown(&self) {
        let process = self.process.lock().take();
        if let Some(process) = process {
            process.stop().await;
        }
    }
}

/// Immutable view of one managed plugin, for the reaper and `Status`.
#[derive(Debug, Clone)]
pub struct PluginSnapshot {
    pub name: String,
    pub running: bool,
    pub last_used: Instant,
}

/// The plugin directory. Owns every `PluginHandle` exclusively.
pub struct PluginManager {
    scanner: Arc<dyn PluginScanner>,
    launcher: Arc<dyn PluginLauncher>,
    config: ManagerConfig,
    plugins: Mutex<HashMap<String, Arc<PluginHandle>>>,
    start_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl PluginManager {
    pub fn new(
        scanner: Arc<dyn PluginScanner>,
        launcher: Arc<dyn PluginLauncher>,
        config: ManagerConfig,
    ) -> Self {
        Self {
            scanner,
            launcher,
            config,
            plugins: Mutex::new(HashMap::new()),
            start_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Client for the `command` capability, starting the plugin if needed.
    pub async fn command_client(&self, name: &str) -> Result<CommandClient, ManagerError> {
        let handle = self.get_or_start(name).await?;
        self.require_capability(&handle, name, CAP_COMMAND)?;
        Ok(CommandClient::new(handle))
    }

    /// Client for the `assistant` capability, starting the plugin if needed.
    pub async fn assistant_client(&self, name: &str) -> Result<AssistantClient, ManagerError> {
        let handle = self.get_or_start(name).await?;
        self.require_capability(&handle, name, CAP_ASSISTANT)?;
        Ok(AssistantClient::new(handle))
    }

    /// The refined record for a managed plugin, if any.
    pub fn record(&self, name: &str) -> Option<Plugin> {
        self.plugins.lock().get(name).map(|handle| handle.record())
    }

    /// Immutable snapshot for the lifecycle reaper.
    pub fn list_plugins(&self) -> Vec<PluginSnapshot> {
        self.plugins
            .lock()
            .values()
            .map(|handle| PluginSnapshot {
                name: handle.name(),
                running: handle.is_running(),
                last_used: handle.last_used(),
            })
            .collect()
    }

    /// Names of plugins currently running and handshake-complete.
    pub fn warm_plugins(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .plugins
            .lock()
            .values()
            .filter(|handle| handle.is_running())
            .map(|handle| handle.name())
            .collect();
        names.sort();
        names
    }

    /// Stop one plugin. Idempotent: unknown names are a no-op.
    pub async fn stop_plugin(&self, name: &str) {
        let handle = self.plugins.lock().remove(name);
        if let Some(handle) = handle {
            handle.shutdown().await;
            info!(plugin = name, "plugin stopped");
        }
    }

    /// Stop every live plugin. Each plugin's token is cancelled before
    /// signalling, so in-flight RPCs unblock with a clear error.
    pub async fn stop_all(&self) {
        let handles: Vec<(String, Arc<PluginHandle>)> =
            self.plugins.lock().drain().collect();
        for (name, handle) in handles {
            handle.shutdown().await;
            info!(plugin = %name, "plugin stopped");
        }
    }

    fn require_capability(
        &self,
        handle: &PluginHandle,
        name: &str,
        capability: &str,
    ) -> Result<(), ManagerError> {
        if handle.record().has_capability(capability) {
            Ok(())
        } else {
            Err(ManagerError::MissingCapability {
                name: name.to_string(),
                capability: capability.to_string(),
            })
        }
    }

    async fn get_or_start(&self, name: &str) -> Result<Arc<PluginHandle>, ManagerError> {
        if let Some(handle) = self.lookup_running(name) {
            handle.touch();
            return Ok(handle);
        }

        // Serialize starts per name: concurrent first uses coalesce onto
        // one subprocess.
        let start_lock = self.start_lock(name);
        let _guard = start_lock.lock().await;

        if let Some(handle) = self.lookup_running(name) {
            handle.touch();
            return Ok(handle);
        }

        self.start_plugin(name).await
    }

    fn lookup_running(&self, name: &str) -> Option<Arc<PluginHandle>> {
        self.plugins.lock().get(name).filter(|handle| handle.is_running()).cloned()
    }

    fn start_lock(&self, name: &str) -> Arc<AsyncMutex<()>> {
        Arc::clone(
            self.start_locks
                .lock()
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }

    async fn start_plugin(&self, name: &str) -> Result<Arc<PluginHandle>, ManagerError> {
        // Fresh scan: discovery state may have changed since last use.
        let records = self.scanner.scan();
        let mut record = records
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ManagerError::NotFound { name: name.to_string() })?;

        if record.status == PluginStatus::Error {
            return Err(ManagerError::Unusable {
                name: name.to_string(),
                reason: record.last_error.unwrap_or_else(|| "unknown scan error".to_string()),
            });
        }

        // Eager compatibility gate, before paying for a subprocess.
        validate_plugin(&mut record, &self.config.host_version)
            .map_err(|source| ManagerError::Incompatible { name: name.to_string(), source })?;

        let socket_path = mint_socket_path();
        let deadline = Instant::now() + HANDSHAKE_TIMEOUT;
        let process = self
            .launcher
            .start(&record.path, &socket_path, Some(deadline))
            .await
            .map_err(|source| ManagerError::Start { name: name.to_string(), source })?;

        let conn = PluginConn::new(socket_path, self.config.io_timeout);
        let config_json = self
            .config
            .plugin_config
            .get(name)
            .map(|value| value.to_string())
            .unwrap_or_else(|| "{}".to_string());

        if let Err(source) =
            run_handshake(&conn, &mut record, &self.config.host_version, config_json).await
        {
            warn!(plugin = name, error = %source, "handshake failed, stopping subprocess");
            process.stop().await;
            return Err(ManagerError::Handshake { name: name.to_string(), source });
        }

        // Re-validate with whatever the handshake refined.
        if let Err(source) = validate_plugin(&mut record, &self.config.host_version) {
            process.stop().await;
            return Err(ManagerError::Incompatible { name: name.to_string(), source });
        }

        info!(
            plugin = name,
            version = %record.version,
            capabilities = record.capabilities.len(),
            "plugin ready"
        );

        let handle = Arc::new(PluginHandle {
            record: Mutex::new(record),
            conn,
            process: Mutex::new(Some(process)),
            last_used: Mutex::new(Instant::now()),
        });
        self.plugins.lock().insert(name.to_string(), Arc::clone(&handle));
        Ok(handle)
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
