// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handshake execution and capability normalization.

use std::time::Duration;

use rig_core::{Capability, Plugin, LEGACY_CAPABILITY_VERSION};
use rig_wire::{CapabilityInfo, HandshakeRequest, HandshakeResponse, API_VERSION};
use thiserror::Error;

use crate::launch::HANDSHAKE_TIMEOUT;
use crate::transport::{PluginConn, TransportError};

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("handshake rpc failed: {0}")]
    Transport(#[from] TransportError),

    #[error("handshake timed out after {0:?}")]
    Timeout(Duration),
}

/// Perform the handshake RPC and fold the response into the record.
///
/// Configuration delivery is one-shot: `config_json` is the opaque blob
/// keyed out of the host's configuration by plugin name, `{}` by default.
pub async fn run_handshake(
    conn: &PluginConn,
    plugin: &mut Plugin,
    host_version: &str,
    config_json: String,
) -> Result<HandshakeResponse, HandshakeError> {
    let request = HandshakeRequest {
        host_version: host_version.to_string(),
        api_version: API_VERSION.to_string(),
        config_json,
    };

    let response = tokio::time::timeout(HANDSHAKE_TIMEOUT, conn.handshake(request))
        .await
        .map_err(|_| HandshakeError::Timeout(HANDSHAKE_TIMEOUT))??;

    apply_handshake(plugin, &response);
    Ok(response)
}

/// Fold handshake data into the plugin record.
///
/// Priority rules, applied in order: the structured `capabilities` field
/// when non-empty; otherwise the translated legacy list; otherwise the
/// set is cleared so stale entries from a prior handshake cannot survive.
/// `plugin_semver` supersedes the legacy scalar, and `plugin_id`
/// supersedes the discovery name.
pub fn apply_handshake(plugin: &mut Plugin, response: &HandshakeResponse) {
    if !response.plugin_id.is_empty() {
        plugin.name = response.plugin_id.clone();
    }
    plugin.api_version = response.api_version.clone();

    if !response.plugin_semver.is_empty() {
        plugin.version = response.plugin_semver.clone();
    } else if !response.legacy_plugin_version.is_empty() {
        plugin.version = response.legacy_plugin_version.clone();
    }

    if !response.capabilities.is_empty() {
        plugin.capabilities = response.capabilities.iter().map(structured_capability).collect();
    } else if !response.legacy_capabilities.is_empty() {
        plugin.capabilities =
            response.legacy_capabilities.iter().map(|name| Capability::legacy(name.as_str())).collect();
    } else {
        plugin.capabilities.clear();
    }
}

fn structured_capability(info: &CapabilityInfo) -> Capability {
    let version =
        semver::Version::parse(&info.version).unwrap_or(LEGACY_CAPABILITY_VERSION);
    Capability::new(info.name.as_str(), version)
}

#[cfg(test)]
#[path = "handshake_tests.rs"]
mod tests;
