// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host-version compatibility validation.
//!
//! Runs twice per plugin: once after discovery to gate command
//! registration, and again after handshake, which may refine the plugin's
//! declared version.

use semver::{Version, VersionReq};
use thiserror::Error;

use crate::{Plugin, PluginStatus};

/// Why a plugin cannot run under this host.
#[derive(Debug, Error)]
pub enum CompatError {
    #[error("invalid host constraint {constraint:?}: {source}")]
    InvalidConstraint {
        constraint: String,
        #[source]
        source: semver::Error,
    },

    #[error("invalid host version {version:?}: {source}")]
    InvalidHostVersion {
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error(
        "incompatible: plugin requires host {required}, running {running} \
         (upgrade the host or pin an earlier plugin version)"
    )]
    Incompatible { required: String, running: Version },
}

impl CompatError {
    /// True for the plain constraint-not-satisfied case, as opposed to a
    /// malformed constraint or host version.
    pub fn is_incompatible(&self) -> bool {
        matches!(self, CompatError::Incompatible { .. })
    }
}

/// Evaluate a plugin's host constraint against the running host version.
///
/// Empty constraints always pass, and the literal host version `dev`
/// (or an empty one) bypasses the check entirely for development builds.
pub fn validate_host_constraint(constraint: &str, host_version: &str) -> Result<(), CompatError> {
    if constraint.is_empty() {
        return Ok(());
    }
    if host_version.is_empty() || host_version == "dev" {
        return Ok(());
    }

    let req = VersionReq::parse(constraint).map_err(|source| CompatError::InvalidConstraint {
        constraint: constraint.to_string(),
        source,
    })?;

    // Strip any build-metadata suffix (e.g. "+abc123") before parsing.
    let bare = host_version.split('+').next().unwrap_or(host_version);
    let running = Version::parse(bare).map_err(|source| CompatError::InvalidHostVersion {
        version: host_version.to_string(),
        source,
    })?;

    if req.matches(&running) {
        Ok(())
    } else {
        Err(CompatError::Incompatible { required: constraint.to_string(), running })
    }
}

/// Apply the validator to a plugin record, updating `status` and
/// `last_error` in place. Returns the error for the caller to surface.
pub fn validate_plugin(plugin: &mut Plugin, host_version: &str) -> Result<(), CompatError> {
    match validate_host_constraint(plugin.host_constraint(), host_version) {
        Ok(()) => {
            plugin.status = PluginStatus::Compatible;
            plugin.last_error = None;
            Ok(())
        }
        Err(err) => {
            plugin.status = if err.is_incompatible() {
                PluginStatus::Incompatible
            } else {
                PluginStatus::Error
            };
            plugin.last_error = Some(err.to_string());
            Err(err)
        }
    }
}

#[cfg(test)]
#[path = "compat_tests.rs"]
mod tests;
