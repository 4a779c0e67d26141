// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Core data model for the rig plugin host.
//!
//! Plugin records, manifest parsing, capability sets, and host-version
//! compatibility checks. No I/O beyond reading manifest files.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod capability;
mod compat;
mod manifest;
mod plugin;

pub use capability::{Capability, CAP_ASSISTANT, CAP_COMMAND, LEGACY_CAPABILITY_VERSION};
pub use compat::{validate_host_constraint, validate_plugin, CompatError};
pub use manifest::{CommandSpec, HostRequirements, Manifest, ManifestError};
pub use plugin::{Plugin, PluginSource, PluginStatus};
