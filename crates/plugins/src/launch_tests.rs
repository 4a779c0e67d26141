// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg(unix)]

use std::time::{Duration, Instant};

use super::*;

/// An executable that never binds its socket.
fn sleeper_exe(dir: &std::path::Path) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("sleeper");
    std::fs::write(&path, "#!/bin/sh\nsleep 30\n").unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn short_deadline() -> Option<Instant> {
    Some(Instant::now() + Duration::from_millis(300))
}

#[tokio::test]
async fn start_times_out_when_plugin_never_binds() {
    let temp = tempfile::tempdir().unwrap();
    let exe = sleeper_exe(temp.path());
    let socket = temp.path().join("p.sock");

    let launcher = ProcessLauncher::new(temp.path().join("host.sock"));
    let err = launcher.start(&exe, &socket, short_deadline()).await.unwrap_err();

    assert!(matches!(err, StartError::SocketWait { .. }));
    assert!(err.is_retryable());
    // Cleanup is complete: no socket file survives the failure.
    assert!(!socket.exists());
}

#[tokio::test]
async fn start_failure_is_retryable_with_a_fresh_spawn() {
    let temp = tempfile::tempdir().unwrap();
    let exe = sleeper_exe(temp.path());
    let socket = temp.path().join("p.sock");
    let launcher = ProcessLauncher::new(temp.path().join("host.sock"));

    let first = launcher.start(&exe, &socket, short_deadline()).await;
    assert!(first.is_err());

    // A second start must attempt a fresh spawn, not report a lingering
    // "already running" state.
    let second = launcher.start(&exe, &socket, short_deadline()).await;
    assert!(matches!(second.unwrap_err(), StartError::SocketWait { .. }));
    assert!(!socket.exists());
}

/// Bind the socket from a background task shortly after start begins;
/// readiness only requires the socket to accept, and the launcher unlinks
/// any pre-existing path before spawning.
fn bind_after(socket: std::path::PathBuf, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let listener = tokio::net::UnixListener::bind(&socket).unwrap();
        // Hold the listener so connects keep succeeding.
        loop {
            let _ = listener.accept().await;
        }
    });
}

#[tokio::test]
async fn start_succeeds_once_the_socket_accepts() {
    let temp = tempfile::tempdir().unwrap();
    let socket = temp.path().join("p.sock");
    let exe = sleeper_exe(temp.path());

    bind_after(socket.clone(), Duration::from_millis(200));

    let launcher = ProcessLauncher::new(temp.path().join("host.sock"));
    let running = launcher
        .start(&exe, &socket, Some(Instant::now() + Duration::from_secs(3)))
        .await
        .unwrap();

    assert!(running.pid().is_some());
    running.stop().await;
}

#[tokio::test]
async fn stop_reaps_the_child_and_removes_the_socket() {
    let temp = tempfile::tempdir().unwrap();
    let socket = temp.path().join("p.sock");
    let exe = sleeper_exe(temp.path());

    bind_after(socket.clone(), Duration::from_millis(200));

    let launcher = ProcessLauncher::new(temp.path().join("host.sock"));
    let running = launcher
        .start(&exe, &socket, Some(Instant::now() + Duration::from_secs(3)))
        .await
        .unwrap();

    let cancel = running.cancel_token();
    running.stop().await;

    assert!(cancel.is_cancelled(), "stop cancels in-flight RPC tokens");
    assert!(!socket.exists(), "stop removes the socket file");
}

#[test]
fn minted_socket_paths_are_short_and_unique() {
    let a = mint_socket_path();
    let b = mint_socket_path();

    assert_ne!(a, b);
    // Below the smallest common UDS path limit.
    assert!(a.as_os_str().len() < 104, "path too long: {}", a.display());
    let name = a.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("rig-") && name.ends_with(".sock"));
}
