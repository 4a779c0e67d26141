// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime directory, PID file, and process liveness.
//!
//! The daemon owns two persisted artifacts: a PID file holding its
//! process id as ASCII, and the listening socket. Both live in the
//! namespaced runtime directory, mode 0700.

use std::io::Write;
use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

/// Well-known file names inside the runtime directory.
const SOCKET_FILE: &str = "rig-daemon.sock";
const PID_FILE: &str = "rig-daemon.pid";
const LOG_FILE: &str = "rigd.log";

/// PID file read errors; not-found and parse failures are distinct.
#[derive(Debug, Error)]
pub enum PidError {
    #[error("PID file not found")]
    NotFound,

    #[error("PID file is malformed: {0:?}")]
    Malformed(String),

    #[error("failed to read PID file: {0}")]
    Io(#[from] std::io::Error),
}

/// Well-known filesystem paths under the namespaced runtime directory.
#[derive(Debug, Clone)]
pub struct RuntimePaths {
    pub dir: PathBuf,
}

impl RuntimePaths {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Resolve from the environment.
    pub fn resolve() -> Self {
        Self::new(crate::env::runtime_dir())
    }

    pub fn socket_path(&self) -> PathBuf {
        self.dir.join(SOCKET_FILE)
    }

    pub fn pid_path(&self) -> PathBuf {
        self.dir.join(PID_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE)
    }

    /// Create the runtime directory mode 0700, re-chmodding when it
    /// pre-exists with looser permissions.
    pub fn ensure_dir(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        restrict_permissions(&self.dir, 0o700)
    }

    /// Write the current process id, mode 0600.
    pub fn write_pid_file(&self) -> std::io::Result<()> {
        let mut file = std::fs::File::create(self.pid_path())?;
        writeln!(file, "{}", std::process::id())?;
        restrict_permissions(&self.pid_path(), 0o600)
    }

    /// Parse the PID file.
    pub fn read_pid_file(&self) -> Result<u32, PidError> {
        let raw = match std::fs::read_to_string(self.pid_path()) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(PidError::NotFound),
            Err(e) => return Err(e.into()),
        };
        raw.trim().parse::<u32>().map_err(|_| PidError::Malformed(raw.trim().to_string()))
    }

    /// Remove the PID file, and the socket file best-effort.
    pub fn remove_pid_file(&self) {
        if let Err(e) = std::fs::remove_file(self.pid_path()) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(error = %e, "failed to remove PID file");
            }
        }
        let _ = std::fs::remove_file(self.socket_path());
    }

    /// Is a daemon recorded in the PID file still alive? Malformed or
    /// missing PID files read as not running.
    pub fn is_running(&self) -> bool {
        match self.read_pid_file() {
            Ok(pid) => process_alive(pid),
            Err(_) => false,
        }
    }
}

/// Platform-selected process liveness probe.
#[cfg(unix)]
pub fn process_alive(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    // Signal 0 delivers nothing but reports whether the pid exists.
    let Ok(pid) = i32::try_from(pid) else { return false };
    kill(Pid::from_raw(pid), None).is_ok()
}

/// Conservative fallback for platforms without a probe in the stack.
#[cfg(not(unix))]
pub fn process_alive(_pid: u32) -> bool {
    false
}

#[cfg(unix)]
fn restrict_permissions(path: &std::path::Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &std::path::Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

/// Restrict a freshly bound socket to the owning user. Applied after bind
/// because some platforms ignore the umask on socket creation.
pub(crate) fn restrict_socket(path: &std::path::Path) -> std::io::Result<()> {
    restrict_permissions(path, 0o600)
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
