// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin manifest parsing and validation.
//!
//! Manifests are YAML files (`manifest.yaml` inside a plugin directory, or
//! `<executable>.manifest.yaml` as a sidecar). Unknown keys are ignored.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Command names reserved by the host front-end. Aliases colliding with
/// these are dropped at validation time rather than failing the manifest.
const RESERVED_ALIASES: &[&str] = &["daemon", "run", "help", "version"];

/// A plugin's self-description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Logical plugin name (kebab-case by convention).
    pub name: String,
    /// Plugin semver, refined by the handshake later.
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub requirements: HostRequirements,
    /// Commands the plugin exposes, in declaration order.
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
}

/// Runtime requirements declared by a plugin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostRequirements {
    /// Semver constraint on the host version (empty = any host).
    #[serde(default)]
    pub host: String,
}

/// A single command descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub name: String,
    /// One-line help.
    #[serde(default)]
    pub short: String,
    /// Long-form help.
    #[serde(default)]
    pub long: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Manifest load/validation errors.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid plugin name {name:?}: only [a-zA-Z0-9_-] is allowed")]
    InvalidName { name: String },

    #[error("duplicate command {command:?} in manifest for {name:?}")]
    DuplicateCommand { name: String, command: String },
}

impl Manifest {
    /// Load and validate a manifest from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ManifestError::Read { path: path.to_path_buf(), source })?;
        let manifest: Manifest = serde_yaml::from_str(&raw)
            .map_err(|source| ManifestError::Parse { path: path.to_path_buf(), source })?;
        manifest.validated()
    }

    /// Validate field constraints and strip reserved aliases.
    pub fn validated(mut self) -> Result<Self, ManifestError> {
        if !is_valid_name(&self.name) {
            return Err(ManifestError::InvalidName { name: self.name });
        }

        let mut seen = HashSet::new();
        for command in &self.commands {
            if !seen.insert(command.name.clone()) {
                return Err(ManifestError::DuplicateCommand {
                    name: self.name,
                    command: command.name.clone(),
                });
            }
        }

        for command in &mut self.commands {
            command.aliases.retain(|alias| {
                let reserved = RESERVED_ALIASES.contains(&alias.as_str());
                if reserved {
                    warn!(
                        alias,
                        command = %command.name,
                        "dropping alias that collides with a host built-in"
                    );
                }
                !reserved
            });
        }

        Ok(self)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
