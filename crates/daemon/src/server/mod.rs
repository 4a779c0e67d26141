// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling daemon-socket I/O.
//!
//! Each connection carries one request. `Execute` upgrades the connection
//! to a bidirectional stream handled by the session state machine.

mod execute;

use std::sync::Arc;

use rig_plugins::PluginManager;
use rig_wire::{read_frame, write_frame, ProtocolError, Request, Response};
use thiserror::Error;
use tokio::net::{unix::OwnedWriteHalf, UnixListener};
use tracing::{debug, error, info};

use crate::env::{ipc_timeout, HOST_VERSION};
use crate::state::LifecycleState;
use crate::ui::UiProxy;

/// Shared daemon context for all request handlers.
pub(crate) struct ServerCtx {
    pub manager: Arc<PluginManager>,
    pub ui: Arc<UiProxy>,
    pub lifecycle: Arc<LifecycleState>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub(crate) enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Listener task for accepting daemon-socket connections.
pub(crate) struct Listener {
    unix: UnixListener,
    ctx: Arc<ServerCtx>,
}

impl Listener {
    pub fn new(unix: UnixListener, ctx: Arc<ServerCtx>) -> Self {
        Self { unix, ctx }
    }

    /// Run the accept loop, spawning a task per connection.
    pub async fn run(self) {
        loop {
            match self.unix.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            log_connection_error(e);
                        }
                    });
                }
                Err(e) => {
                    error!("accept error: {}", e);
                    break;
                }
            }
        }
    }
}

fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Protocol(ProtocolError::ConnectionClosed) => {
            debug!("client disconnected")
        }
        _ => error!("connection error: {}", e),
    }
}

async fn handle_connection(
    stream: tokio::net::UnixStream,
    ctx: &ServerCtx,
) -> Result<(), ConnectionError> {
    let (mut reader, mut writer) = stream.into_split();
    let request: Request = read_frame(&mut reader, ipc_timeout()).await?;

    match request {
        Request::Ping => {
            debug!("ping");
            write_response(&mut writer, &Response::Pong).await
        }

        Request::Status => {
            debug!("status query");
            let response = status_response(ctx);
            write_response(&mut writer, &response).await
        }

        Request::Shutdown { force } => {
            info!(force, "shutdown requested");
            write_response(&mut writer, &Response::ShuttingDown { accepted: true }).await?;
            // `force` is accepted but does not diverge behavior yet.
            ctx.lifecycle.trigger_shutdown();
            Ok(())
        }

        // Connection-upgrading request: the socket becomes a
        // bidirectional frame stream owned by the session.
        Request::Execute => execute::handle_execute(reader, writer, ctx).await,
    }
}

fn status_response(ctx: &ServerCtx) -> Response {
    Response::Status {
        daemon_version: HOST_VERSION.to_string(),
        uptime_secs: ctx.lifecycle.uptime().as_secs(),
        active_sessions: ctx.lifecycle.active_sessions(),
        pid: std::process::id(),
        warm_plugins: ctx.manager.warm_plugins(),
    }
}

async fn write_response(
    writer: &mut OwnedWriteHalf,
    response: &Response,
) -> Result<(), ConnectionError> {
    write_frame(writer, response, ipc_timeout()).await?;
    Ok(())
}

#[cfg(test)]
#[path = "../server_tests.rs"]
mod tests;
