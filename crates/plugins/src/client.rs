// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed, capability-gated plugin clients.

use std::collections::BTreeMap;
use std::sync::Arc;

use rig_wire::{ExecuteChunk, ExecuteRequest};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::manager::{ManagerError, PluginHandle};
use crate::transport::TransportError;

/// Client for the `command` capability.
pub struct CommandClient {
    handle: Arc<PluginHandle>,
}

impl std::fmt::Debug for CommandClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandClient").field("plugin_name", &self.plugin_name()).finish()
    }
}

impl CommandClient {
    pub(crate) fn new(handle: Arc<PluginHandle>) -> Self {
        Self { handle }
    }

    pub fn plugin_name(&self) -> String {
        self.handle.name()
    }

    /// Run a command. Chunks arrive in plugin-emit order; the plugin's
    /// last-use time is stamped again when the stream finishes.
    pub async fn execute(
        &self,
        command: impl Into<String>,
        args: Vec<String>,
        flags: BTreeMap<String, String>,
        cancel: CancellationToken,
    ) -> Result<ExecuteStream, ManagerError> {
        let request = ExecuteRequest { command: command.into(), args, flags };
        let rx = self
            .handle
            .conn()
            .execute(request, cancel)
            .await
            .map_err(|source| ManagerError::Transport { name: self.handle.name(), source })?;
        Ok(ExecuteStream { rx, handle: Arc::clone(&self.handle), finished: false })
    }
}

/// Client for the `assistant` capability: the same streaming execute
/// surface, handed out only to plugins that advertise `assistant`.
pub struct AssistantClient {
    inner: CommandClient,
}

impl std::fmt::Debug for AssistantClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantClient").field("plugin_name", &self.plugin_name()).finish()
    }
}

impl AssistantClient {
    pub(crate) fn new(handle: Arc<PluginHandle>) -> Self {
        Self { inner: CommandClient::new(handle) }
    }

    pub fn plugin_name(&self) -> String {
        self.inner.plugin_name()
    }

    pub async fn execute(
        &self,
        command: impl Into<String>,
        args: Vec<String>,
        flags: BTreeMap<String, String>,
        cancel: CancellationToken,
    ) -> Result<ExecuteStream, ManagerError> {
        self.inner.execute(command, args, flags, cancel).await
    }
}

/// A live execute stream.
pub struct ExecuteStream {
    rx: mpsc::Receiver<Result<ExecuteChunk, TransportError>>,
    handle: Arc<PluginHandle>,
    finished: bool,
}

impl ExecuteStream {
    /// Next chunk, or `None` when the stream ends.
    pub async fn next(&mut self) -> Option<Result<ExecuteChunk, TransportError>> {
        let item = self.rx.recv().await;
        let ended = match &item {
            None | Some(Err(_)) => true,
            Some(Ok(chunk)) => chunk.done,
        };
        if ended && !self.finished {
            self.finished = true;
            self.handle.touch();
        }
        item
    }
}
