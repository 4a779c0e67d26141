// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rigd - the rig daemon supervisor.
//!
//! Exit codes: 0 on clean shutdown; non-zero on startup failure (unable
//! to listen, PID-file collision with a live daemon).

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use rig_daemon::{startup, Config, LifecycleState};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::load();

    // The marker line lets the CLI attribute startup failures when it
    // tails the log after a silent auto-start.
    let _ = std::fs::create_dir_all(&config.runtime.dir);
    write_startup_marker(&config.runtime.log_path());

    let file_appender =
        tracing_appender::rolling::never(config.runtime.dir.clone(), "rigd.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RIG_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();

    info!(version = rig_daemon::env::HOST_VERSION, "starting rig daemon");

    let daemon = match startup(config).await {
        Ok(daemon) => daemon,
        Err(e) => {
            error!("Failed to start daemon: {}", e);
            eprintln!("Failed to start daemon: {e}");
            return ExitCode::FAILURE;
        }
    };

    spawn_signal_handlers(daemon.handle());

    daemon.run().await;
    daemon.shutdown().await;

    info!("daemon exited cleanly");
    ExitCode::SUCCESS
}

fn write_startup_marker(log_path: &std::path::Path) {
    if let Ok(mut file) =
        std::fs::OpenOptions::new().create(true).append(true).open(log_path)
    {
        let _ = writeln!(file, "--- rigd: starting (pid: {}) ---\n", std::process::id());
    }
}

#[cfg(unix)]
fn spawn_signal_handlers(lifecycle: Arc<LifecycleState>) {
    tokio::spawn(async move {
        use tokio::signal::unix::{signal, SignalKind};

        let (Ok(mut term), Ok(mut int)) =
            (signal(SignalKind::terminate()), signal(SignalKind::interrupt()))
        else {
            error!("failed to install signal handlers");
            return;
        };

        tokio::select! {
            _ = term.recv() => info!("SIGTERM received"),
            _ = int.recv() => info!("SIGINT received"),
        }
        lifecycle.trigger_shutdown();
    });
}

#[cfg(not(unix))]
fn spawn_signal_handlers(lifecycle: Arc<LifecycleState>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received");
            lifecycle.trigger_shutdown();
        }
    });
}
