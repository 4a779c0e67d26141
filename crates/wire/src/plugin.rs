// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin-facing service: the plugin binds its private socket and serves,
//! the supervisor dials as a client.
//!
//! `Handshake` gets exactly one `HandshakeResponse` frame back. `Execute`
//! gets a stream of `ExecuteChunk` frames, terminated by `done = true`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// RPC contract version spoken by this host.
pub const API_VERSION: &str = "1";

/// Requests the supervisor sends to a plugin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum PluginRequest {
    Handshake(HandshakeRequest),
    Execute(ExecuteRequest),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HandshakeRequest {
    pub host_version: String,
    pub api_version: String,
    /// Opaque per-plugin configuration blob, keyed out of the host's
    /// configuration by plugin name. `{}` when the host has none.
    #[serde(default)]
    pub config_json: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HandshakeResponse {
    /// Authoritative plugin name; supersedes the discovery name.
    #[serde(default)]
    pub plugin_id: String,
    #[serde(default)]
    pub api_version: String,
    /// Structured plugin semver; supersedes `legacy_plugin_version`.
    #[serde(default)]
    pub plugin_semver: String,
    /// Structured capabilities; supersede `legacy_capabilities`.
    #[serde(default)]
    pub capabilities: Vec<CapabilityInfo>,
    /// Command descriptors, mirroring the manifest's `commands`.
    #[serde(default)]
    pub commands: Vec<CommandInfo>,
    /// Scalar version reported by older plugins.
    #[serde(default)]
    pub legacy_plugin_version: String,
    /// Bare capability names reported by older plugins.
    #[serde(default)]
    pub legacy_capabilities: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CapabilityInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CommandInfo {
    pub name: String,
    #[serde(default)]
    pub short: String,
    #[serde(default)]
    pub long: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecuteRequest {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub flags: BTreeMap<String, String>,
}

/// One streamed chunk of command output.
///
/// Stdout and stderr bytes are appended verbatim; a single chunk may carry
/// both, and their relative order within the chunk is preserved by keeping
/// them in separate fields of the same frame. `exit_code` is meaningful
/// only when `done` is true.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecuteChunk {
    #[serde(default)]
    pub stdout: Vec<u8>,
    #[serde(default)]
    pub stderr: Vec<u8>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub exit_code: i32,
}

impl ExecuteChunk {
    /// Final frame of a stream.
    pub fn finished(exit_code: i32) -> Self {
        Self { done: true, exit_code, ..Default::default() }
    }

    pub fn stdout(bytes: impl Into<Vec<u8>>) -> Self {
        Self { stdout: bytes.into(), ..Default::default() }
    }

    pub fn stderr(bytes: impl Into<Vec<u8>>) -> Self {
        Self { stderr: bytes.into(), ..Default::default() }
    }
}
