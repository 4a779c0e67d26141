// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capability advertisements attached to a plugin at handshake.

use semver::Version;
use serde::{Deserialize, Serialize};

/// Capability name for plugins exposing invocable commands.
pub const CAP_COMMAND: &str = "command";

/// Capability name for plugins implementing the streaming assistant interface.
pub const CAP_ASSISTANT: &str = "assistant";

/// Sentinel version for capabilities translated from the legacy
/// string-list handshake field.
pub const LEGACY_CAPABILITY_VERSION: Version = Version::new(0, 0, 0);

/// A named feature contract advertised by a plugin at handshake.
///
/// Presence of a capability is necessary and sufficient for the manager to
/// hand out the corresponding typed client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    pub name: String,
    pub version: Version,
}

impl Capability {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self { name: name.into(), version }
    }

    /// Translate a legacy capability name into a structured capability.
    pub fn legacy(name: impl Into<String>) -> Self {
        Self { name: name.into(), version: LEGACY_CAPABILITY_VERSION }
    }
}
