// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn write_manifest(dir: &std::path::Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("manifest.yaml");
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn load_parses_full_manifest() {
    let temp = tempfile::tempdir().unwrap();
    let path = write_manifest(
        temp.path(),
        r#"
name: issue-tracker
version: 1.2.3
description: Issue tracker integration
author: Example Dev
requirements:
  host: ">= 2.0.0"
commands:
  - name: open
    short: Open an issue
    aliases: [o]
  - name: close
    short: Close an issue
"#,
    );

    let manifest = Manifest::load(&path).unwrap();
    assert_eq!(manifest.name, "issue-tracker");
    assert_eq!(manifest.version, "1.2.3");
    assert_eq!(manifest.requirements.host, ">= 2.0.0");
    assert_eq!(manifest.commands.len(), 2);
    assert_eq!(manifest.commands[0].aliases, vec!["o".to_string()]);
}

#[test]
fn load_ignores_unknown_keys() {
    let temp = tempfile::tempdir().unwrap();
    let path = write_manifest(
        temp.path(),
        r#"
name: minimal
unknown_top_level: true
commands: []
"#,
    );

    let manifest = Manifest::load(&path).unwrap();
    assert_eq!(manifest.name, "minimal");
    assert!(manifest.version.is_empty());
}

#[test]
fn invalid_name_is_rejected() {
    let manifest =
        Manifest { name: "bad name!".to_string(), ..Default::default() }.validated();
    assert!(matches!(manifest, Err(ManifestError::InvalidName { .. })));
}

#[test]
fn empty_name_is_rejected() {
    let manifest = Manifest::default().validated();
    assert!(matches!(manifest, Err(ManifestError::InvalidName { .. })));
}

#[test]
fn duplicate_command_names_are_rejected() {
    let manifest = Manifest {
        name: "dupes".to_string(),
        commands: vec![
            CommandSpec { name: "sync".to_string(), ..Default::default() },
            CommandSpec { name: "sync".to_string(), ..Default::default() },
        ],
        ..Default::default()
    }
    .validated();
    assert!(matches!(manifest, Err(ManifestError::DuplicateCommand { .. })));
}

#[test]
fn reserved_aliases_are_dropped_silently() {
    let manifest = Manifest {
        name: "aliased".to_string(),
        commands: vec![CommandSpec {
            name: "deploy".to_string(),
            aliases: vec!["daemon".to_string(), "d".to_string()],
            ..Default::default()
        }],
        ..Default::default()
    }
    .validated()
    .unwrap();

    assert_eq!(manifest.commands[0].aliases, vec!["d".to_string()]);
}

#[test]
fn parse_error_names_the_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = write_manifest(temp.path(), "name: [not a string");

    let err = Manifest::load(&path).unwrap_err();
    assert!(matches!(err, ManifestError::Parse { .. }));
    assert!(err.to_string().contains("manifest.yaml"));
}
