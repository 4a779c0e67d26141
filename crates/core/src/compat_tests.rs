// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use super::*;
use crate::{Manifest, PluginSource};

fn plugin_requiring(constraint: &str) -> Plugin {
    let manifest = Manifest {
        name: "test-plugin".to_string(),
        requirements: crate::HostRequirements { host: constraint.to_string() },
        ..Default::default()
    };
    Plugin::discovered("test-plugin", PathBuf::from("/p/test-plugin"), PluginSource::System, Some(manifest))
}

#[test]
fn empty_constraint_is_compatible() {
    assert!(validate_host_constraint("", "1.5.0").is_ok());
}

#[test]
fn no_manifest_is_compatible() {
    let mut plugin =
        Plugin::discovered("bare", PathBuf::from("/p/bare"), PluginSource::System, None);
    validate_plugin(&mut plugin, "1.5.0").unwrap();
    assert_eq!(plugin.status, PluginStatus::Compatible);
}

#[test]
fn dev_host_version_bypasses_constraint() {
    assert!(validate_host_constraint(">= 99.0.0", "dev").is_ok());
    assert!(validate_host_constraint(">= 99.0.0", "").is_ok());
}

#[test]
fn satisfied_constraint_is_compatible() {
    let mut plugin = plugin_requiring(">= 2.0.0");
    validate_plugin(&mut plugin, "2.1.0").unwrap();
    assert_eq!(plugin.status, PluginStatus::Compatible);
    assert!(plugin.last_error.is_none());
}

#[test]
fn unsatisfied_constraint_is_incompatible_with_hint() {
    let mut plugin = plugin_requiring(">= 2.0.0");
    let err = validate_plugin(&mut plugin, "1.5.0").unwrap_err();

    assert!(err.is_incompatible());
    assert_eq!(plugin.status, PluginStatus::Incompatible);
    let message = plugin.last_error.unwrap();
    assert!(message.contains("incompatible"), "message: {message}");
    assert!(message.contains("upgrade the host"), "message: {message}");
}

#[test]
fn malformed_constraint_is_an_error_not_incompatible() {
    let mut plugin = plugin_requiring("not-a-constraint!!");
    let err = validate_plugin(&mut plugin, "1.5.0").unwrap_err();

    assert!(!err.is_incompatible());
    assert_eq!(plugin.status, PluginStatus::Error);
}

#[test]
fn malformed_host_version_is_an_error() {
    let err = validate_host_constraint(">= 1.0.0", "one-point-oh").unwrap_err();
    assert!(matches!(err, CompatError::InvalidHostVersion { .. }));
}

#[test]
fn build_metadata_suffix_on_host_version_is_ignored() {
    assert!(validate_host_constraint(">= 2.0.0", "2.1.0+abc1234").is_ok());
}

#[test]
fn revalidation_clears_a_previous_error() {
    let mut plugin = plugin_requiring(">= 2.0.0");
    let _ = validate_plugin(&mut plugin, "1.5.0");
    assert_eq!(plugin.status, PluginStatus::Incompatible);

    validate_plugin(&mut plugin, "2.0.1").unwrap();
    assert_eq!(plugin.status, PluginStatus::Compatible);
    assert!(plugin.last_error.is_none());
}
