// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin records produced by discovery and refined by handshake.

use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::{Capability, Manifest};

/// Which search directory a plugin was discovered in.
///
/// Later directories take precedence during discovery, so a `Project`
/// plugin shadows a `System` plugin of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginSource {
    System,
    Project,
}

impl fmt::Display for PluginSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PluginSource::System => write!(f, "system"),
            PluginSource::Project => write!(f, "project"),
        }
    }
}

/// Compatibility status assigned by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginStatus {
    Compatible,
    Incompatible,
    Error,
}

/// A discovered plugin and everything learned about it since.
///
/// Runtime fields (process handle, transport connection, private socket)
/// live in the manager's handle type; this record carries only discovery
/// and handshake data and is cheap to clone for snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plugin {
    /// Logical name: the manifest's `name` field, or the executable's
    /// file name when no manifest exists.
    pub name: String,
    /// Path to the plugin executable.
    pub path: PathBuf,
    pub source: PluginSource,
    pub manifest: Option<Manifest>,
    /// RPC contract version reported at handshake (empty before handshake).
    #[serde(default)]
    pub api_version: String,
    /// Plugin semver; seeded from the manifest, refined by the handshake.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    pub status: PluginStatus,
    pub discovered_at: SystemTime,
    #[serde(default)]
    pub last_error: Option<String>,
}

impl Plugin {
    /// Build a freshly discovered record. Status starts `Compatible` until
    /// the validator says otherwise.
    pub fn discovered(
        name: impl Into<String>,
        path: PathBuf,
        source: PluginSource,
        manifest: Option<Manifest>,
    ) -> Self {
        let version = manifest.as_ref().map(|m| m.version.clone()).unwrap_or_default();
        Self {
            name: name.into(),
            path,
            source,
            manifest,
            api_version: String::new(),
            version,
            capabilities: Vec::new(),
            status: PluginStatus::Compatible,
            discovered_at: SystemTime::now(),
            last_error: None,
        }
    }

    /// The manifest's host constraint, or empty when unconstrained.
    pub fn host_constraint(&self) -> &str {
        self.manifest.as_ref().map(|m| m.requirements.host.as_str()).unwrap_or("")
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities.iter().any(|c| c.name == name)
    }

    /// Mark the record failed with a scan- or handshake-time error.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.status = PluginStatus::Error;
        self.last_error = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovered_seeds_version_from_manifest() {
        let manifest =
            Manifest { name: "x".to_string(), version: "0.3.0".to_string(), ..Default::default() };
        let plugin =
            Plugin::discovered("x", PathBuf::from("/p/x"), PluginSource::System, Some(manifest));
        assert_eq!(plugin.version, "0.3.0");
        assert_eq!(plugin.status, PluginStatus::Compatible);
    }

    #[test]
    fn missing_manifest_means_empty_version_and_constraint() {
        let plugin = Plugin::discovered("y", PathBuf::from("/p/y"), PluginSource::Project, None);
        assert!(plugin.version.is_empty());
        assert_eq!(plugin.host_constraint(), "");
    }

    #[test]
    fn set_error_records_status_and_message() {
        let mut plugin = Plugin::discovered("z", PathBuf::from("/p/z"), PluginSource::System, None);
        plugin.set_error("broken manifest");
        assert_eq!(plugin.status, PluginStatus::Error);
        assert_eq!(plugin.last_error.as_deref(), Some("broken manifest"));
    }
}
