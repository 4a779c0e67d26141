// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;
use std::time::Duration;

use rig_wire::{read_frame, write_frame, Request, Response};
use tokio::net::UnixStream;

use super::*;
use crate::runtime::RuntimePaths;

fn test_config(dir: &Path) -> Config {
    Config {
        runtime: RuntimePaths::new(dir.join("rig-daemon")),
        plugin_dirs: Vec::new(),
        host_version: "dev".to_string(),
        reaper: ReaperConfig {
            tick: Duration::from_secs(60),
            plugin_idle: Duration::from_secs(300),
            daemon_idle: Duration::from_secs(900),
        },
    }
}

#[tokio::test]
async fn startup_writes_pid_binds_socket_and_answers_ping() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(temp.path());

    let daemon = startup(config.clone()).await.unwrap();

    assert_eq!(config.runtime.read_pid_file().unwrap(), std::process::id());
    assert!(config.runtime.socket_path().exists());

    let mut stream = UnixStream::connect(config.runtime.socket_path()).await.unwrap();
    write_frame(&mut stream, &Request::Ping, Duration::from_secs(5)).await.unwrap();
    let response: Response = read_frame(&mut stream, Duration::from_secs(5)).await.unwrap();
    assert_eq!(response, Response::Pong);

    daemon.shutdown().await;

    assert!(!config.runtime.pid_path().exists(), "shutdown removes the PID file");
    assert!(!config.runtime.socket_path().exists(), "shutdown removes the socket");
}

#[tokio::test]
async fn second_startup_against_a_live_pid_is_refused() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(temp.path());

    let daemon = startup(config.clone()).await.unwrap();

    // The PID file holds this (live) process, so a second startup in the
    // same runtime directory must refuse.
    let err = startup(config.clone()).await.unwrap_err();
    assert!(matches!(err, LifecycleError::AlreadyRunning(_)));

    // And it must not have clobbered the running daemon's files.
    assert!(config.runtime.pid_path().exists());
    assert!(config.runtime.socket_path().exists());

    daemon.shutdown().await;
}

#[cfg(unix)]
#[tokio::test]
async fn stale_pid_file_is_recovered_on_startup() {
    let temp = tempfile::tempdir().unwrap();
    let config = test_config(temp.path());

    // Plant the pid of a dead process.
    config.runtime.ensure_dir().unwrap();
    let mut child = std::process::Command::new("true").spawn().unwrap();
    let dead_pid = child.id();
    child.wait().unwrap();
    std::fs::write(config.runtime.pid_path(), format!("{dead_pid}\n")).unwrap();

    let daemon = startup(config.clone()).await.unwrap();

    assert_eq!(config.runtime.read_pid_file().unwrap(), std::process::id());

    daemon.shutdown().await;
}

#[cfg(unix)]
#[tokio::test]
async fn daemon_socket_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let temp = tempfile::tempdir().unwrap();
    let config = test_config(temp.path());
    let daemon = startup(config.clone()).await.unwrap();

    let mode =
        std::fs::metadata(config.runtime.socket_path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);

    daemon.shutdown().await;
}

#[tokio::test]
async fn shutdown_trigger_ends_run() {
    let temp = tempfile::tempdir().unwrap();
    let daemon = startup(test_config(temp.path())).await.unwrap();

    let handle = daemon.handle();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.trigger_shutdown();
    });

    tokio::time::timeout(Duration::from_secs(1), daemon.run())
        .await
        .expect("run did not observe the shutdown trigger");
    daemon.shutdown().await;
}
