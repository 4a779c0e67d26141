// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin discovery across ordered search directories.
//!
//! An entry is a plugin iff it is an executable regular file, or a
//! directory containing `manifest.yaml`. Sidecar manifests for bare
//! executables live at `<path>.manifest.yaml` (or `.yml`), the exact
//! executable path with its extension preserved. A root-level
//! `manifest.yaml` is never inherited by sibling executables.

use std::fs::Metadata;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rig_core::{Manifest, Plugin, PluginSource};
use tracing::{debug, warn};

/// Manifest file name inside a directory-form plugin.
pub const MANIFEST_FILE: &str = "manifest.yaml";

/// Sidecar manifest extensions, tried in order.
const SIDECAR_EXTENSIONS: &[&str] = &["manifest.yaml", "manifest.yml"];

/// A search directory with its precedence label.
#[derive(Debug, Clone)]
pub struct SearchDir {
    pub path: PathBuf,
    pub source: PluginSource,
}

impl SearchDir {
    pub fn new(path: impl Into<PathBuf>, source: PluginSource) -> Self {
        Self { path: path.into(), source }
    }
}

/// Discovery seam; swapped for a fake in manager tests.
pub trait PluginScanner: Send + Sync {
    fn scan(&self) -> Vec<Plugin>;
}

/// Filesystem scanner over an ordered directory list (lowest precedence
/// first).
pub struct DirScanner {
    dirs: Vec<SearchDir>,
}

impl DirScanner {
    pub fn new(dirs: Vec<SearchDir>) -> Self {
        Self { dirs }
    }
}

impl PluginScanner for DirScanner {
    fn scan(&self) -> Vec<Plugin> {
        scan_dirs(&self.dirs)
    }
}

/// Scan directories in precedence order and deduplicate by logical name.
///
/// When two directories carry the same name, the later (higher-precedence)
/// directory wins; the surviving record keeps the encounter order of its
/// own directory.
pub fn scan_dirs(dirs: &[SearchDir]) -> Vec<Plugin> {
    let mut found: IndexMap<String, Plugin> = IndexMap::new();
    for dir in dirs {
        for plugin in scan_dir(dir) {
            if found.shift_remove(&plugin.name).is_some() {
                debug!(
                    name = %plugin.name,
                    source = %plugin.source,
                    "plugin shadowed by higher-precedence directory"
                );
            }
            found.insert(plugin.name.clone(), plugin);
        }
    }
    found.into_values().collect()
}

fn scan_dir(dir: &SearchDir) -> Vec<Plugin> {
    let entries = match std::fs::read_dir(&dir.path) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(path = %dir.path.display(), error = %e, "unreadable plugin directory");
            return Vec::new();
        }
    };

    // Sort for deterministic encounter order across platforms.
    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
    paths.sort();

    paths.iter().filter_map(|path| classify(path, dir.source)).collect()
}

fn classify(path: &Path, source: PluginSource) -> Option<Plugin> {
    let file_name = path.file_name()?.to_str()?.to_string();
    let meta = std::fs::metadata(path).ok()?;

    if meta.is_dir() {
        let manifest_path = path.join(MANIFEST_FILE);
        if !manifest_path.exists() {
            return None;
        }
        return Some(dir_plugin(path, &manifest_path, source));
    }

    // Manifests are never plugins themselves.
    if file_name.ends_with(".yaml") || file_name.ends_with(".yml") {
        return None;
    }
    if !is_executable(&meta) {
        return None;
    }

    Some(exec_plugin(path, &file_name, source))
}

/// A bare executable, optionally paired with a sidecar manifest.
fn exec_plugin(path: &Path, file_name: &str, source: PluginSource) -> Plugin {
    for ext in SIDECAR_EXTENSIONS {
        let sidecar = sidecar_path(path, ext);
        if !sidecar.exists() {
            continue;
        }
        return match Manifest::load(&sidecar) {
            Ok(manifest) => {
                Plugin::discovered(manifest.name.clone(), path.to_owned(), source, Some(manifest))
            }
            Err(e) => {
                warn!(path = %sidecar.display(), error = %e, "malformed sidecar manifest");
                let mut plugin = Plugin::discovered(file_name, path.to_owned(), source, None);
                plugin.set_error(e.to_string());
                plugin
            }
        };
    }

    // No sidecar: the logical name is the file name, version unknown.
    Plugin::discovered(file_name, path.to_owned(), source, None)
}

/// A directory-form plugin: `manifest.yaml` names the plugin, and the
/// executable is expected at `<dir>/<name>`.
fn dir_plugin(dir: &Path, manifest_path: &Path, source: PluginSource) -> Plugin {
    match Manifest::load(manifest_path) {
        Ok(manifest) => {
            let exe = dir.join(&manifest.name);
            let mut plugin =
                Plugin::discovered(manifest.name.clone(), exe.clone(), source, Some(manifest));
            if !exe.exists() {
                plugin.set_error(format!("plugin executable not found at {}", exe.display()));
            }
            plugin
        }
        Err(e) => {
            warn!(path = %manifest_path.display(), error = %e, "malformed plugin manifest");
            let name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let mut plugin = Plugin::discovered(name, dir.to_owned(), source, None);
            plugin.set_error(e.to_string());
            plugin
        }
    }
}

/// Sidecar path with the executable's extension preserved:
/// `tool.sh` pairs with `tool.sh.manifest.yaml`.
fn sidecar_path(path: &Path, ext: &str) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".");
    os.push(ext);
    PathBuf::from(os)
}

#[cfg(unix)]
fn is_executable(meta: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.is_file() && meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(meta: &Metadata) -> bool {
    meta.is_file()
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
