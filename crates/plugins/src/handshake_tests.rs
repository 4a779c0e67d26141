// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use rig_core::{PluginSource, CAP_ASSISTANT, CAP_COMMAND};
use rig_wire::{CapabilityInfo, HandshakeResponse};

use super::*;

fn bare_plugin() -> Plugin {
    Plugin::discovered("disco-name", PathBuf::from("/p/disco-name"), PluginSource::System, None)
}

#[test]
fn structured_fields_take_priority() {
    let mut plugin = bare_plugin();
    let response = HandshakeResponse {
        plugin_id: "real-name".to_string(),
        api_version: "1".to_string(),
        plugin_semver: "2.3.4".to_string(),
        capabilities: vec![CapabilityInfo {
            name: CAP_COMMAND.to_string(),
            version: "1.1.0".to_string(),
        }],
        legacy_plugin_version: "9.9.9".to_string(),
        legacy_capabilities: vec![CAP_ASSISTANT.to_string()],
        ..Default::default()
    };

    apply_handshake(&mut plugin, &response);

    assert_eq!(plugin.name, "real-name");
    assert_eq!(plugin.version, "2.3.4");
    assert_eq!(plugin.api_version, "1");
    assert_eq!(plugin.capabilities.len(), 1);
    assert_eq!(plugin.capabilities[0].name, CAP_COMMAND);
    assert_eq!(plugin.capabilities[0].version, semver::Version::new(1, 1, 0));
}

#[test]
fn legacy_fields_are_translated_when_structured_are_empty() {
    let mut plugin = bare_plugin();
    let response = HandshakeResponse {
        legacy_plugin_version: "0.5.0".to_string(),
        legacy_capabilities: vec![CAP_COMMAND.to_string(), CAP_ASSISTANT.to_string()],
        ..Default::default()
    };

    apply_handshake(&mut plugin, &response);

    assert_eq!(plugin.version, "0.5.0");
    assert_eq!(plugin.capabilities.len(), 2);
    for capability in &plugin.capabilities {
        assert_eq!(capability.version, semver::Version::new(0, 0, 0));
    }
}

#[test]
fn empty_response_clears_stale_capabilities() {
    let mut plugin = bare_plugin();
    plugin.capabilities = vec![Capability::legacy(CAP_COMMAND)];

    apply_handshake(&mut plugin, &HandshakeResponse::default());

    assert!(plugin.capabilities.is_empty());
}

#[test]
fn discovery_name_survives_an_empty_plugin_id() {
    let mut plugin = bare_plugin();
    apply_handshake(&mut plugin, &HandshakeResponse::default());
    assert_eq!(plugin.name, "disco-name");
}

#[test]
fn unparseable_structured_capability_version_falls_back_to_sentinel() {
    let mut plugin = bare_plugin();
    let response = HandshakeResponse {
        capabilities: vec![CapabilityInfo {
            name: CAP_COMMAND.to_string(),
            version: "not-semver".to_string(),
        }],
        ..Default::default()
    };

    apply_handshake(&mut plugin, &response);
    assert_eq!(plugin.capabilities[0].version, LEGACY_CAPABILITY_VERSION);
}
