// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Execute` session state machine.
//!
//! Acquire the session lock, read the command, install the UI bridge,
//! relay plugin output upstream, and tear everything down in order: clear
//! the bridge first, stamp activity last (by dropping the session guard).

use std::sync::Arc;

use rig_wire::{
    decode, read_frame, read_message, write_frame, ClientFrame, CommandRequest, Response,
    ServerFrame,
};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{ConnectionError, ServerCtx};
use crate::env::ipc_timeout;

/// Upstream channel depth. One writer drains it, so ordering between
/// plugin output and UI requests is exactly the order the daemon observed.
const FRAME_BUFFER: usize = 64;

pub(super) async fn handle_execute(
    reader: OwnedReadHalf,
    mut writer: OwnedWriteHalf,
    ctx: &ServerCtx,
) -> Result<(), ConnectionError> {
    let Some(session) = ctx.lifecycle.try_begin_session() else {
        debug!("execute refused: session busy");
        write_frame(
            &mut writer,
            &Response::Busy { message: "another session is active".to_string() },
            ipc_timeout(),
        )
        .await?;
        return Ok(());
    };

    // The guard stamps `last_activity` when dropped; keep it alive until
    // teardown below has fully completed.
    let result = run_session(reader, writer, ctx).await;
    drop(session);
    result
}

async fn run_session(
    mut reader: OwnedReadHalf,
    mut writer: OwnedWriteHalf,
    ctx: &ServerCtx,
) -> Result<(), ConnectionError> {
    write_frame(&mut writer, &Response::ExecuteReady, ipc_timeout()).await?;

    // The first frame MUST be the command.
    let first: ClientFrame = read_frame(&mut reader, ipc_timeout()).await?;
    let ClientFrame::Command(command) = first else {
        write_frame(
            &mut writer,
            &ServerFrame::Error { message: "first frame must be a command".to_string() },
            ipc_timeout(),
        )
        .await?;
        return Ok(());
    };

    info!(plugin = %command.plugin, command = %command.command, "session started");

    // All upstream frames funnel through one channel and one writer task.
    let (tx, mut rx) = mpsc::channel::<ServerFrame>(FRAME_BUFFER);
    let writer_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if write_frame(&mut writer, &frame, ipc_timeout()).await.is_err() {
                break;
            }
        }
    });

    let bridge = ctx.ui.set_active_session(tx.clone());

    // Receive loop: forwards UI responses to the bridge; stream end or a
    // read error cancels the session.
    let cancel = CancellationToken::new();
    let recv_task = {
        let cancel = cancel.clone();
        let bridge = Arc::clone(&bridge);
        tokio::spawn(async move {
            loop {
                match read_message(&mut reader).await.and_then(|b| decode::<ClientFrame>(&b)) {
                    Ok(ClientFrame::UiResponse(response)) => bridge.handle_response(response),
                    Ok(ClientFrame::Command(_)) => {
                        warn!("ignoring extra command frame mid-session")
                    }
                    Err(_) => {
                        cancel.cancel();
                        break;
                    }
                }
            }
        })
    };

    if let Err(message) = relay_command(ctx, &command, &tx, cancel.clone()).await {
        let _ = tx.send(ServerFrame::Error { message }).await;
    }

    // Teardown order matters: detach the bridge, stop the relay tasks,
    // flush the writer, then the caller drops the session guard. The
    // bridge holds a sender clone, so it must go before awaiting the
    // writer or the channel never drains to closure.
    ctx.ui.clear_active_session();
    cancel.cancel();
    recv_task.abort();
    let _ = recv_task.await;
    drop(bridge);
    drop(tx);
    let _ = writer_task.await;

    info!(plugin = %command.plugin, "session closed");
    Ok(())
}

/// Dispatch the command into the plugin and relay every output chunk
/// upstream in plugin-emit order.
async fn relay_command(
    ctx: &ServerCtx,
    command: &CommandRequest,
    tx: &mpsc::Sender<ServerFrame>,
    cancel: CancellationToken,
) -> Result<(), String> {
    let client = ctx
        .manager
        .command_client(&command.plugin)
        .await
        .map_err(|e| e.to_string())?;

    let mut stream = client
        .execute(
            command.command.clone(),
            command.args.clone(),
            command.flags.clone(),
            cancel.clone(),
        )
        .await
        .map_err(|e| e.to_string())?;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("session cancelled mid-command");
                return Ok(());
            }
            chunk = stream.next() => match chunk {
                Some(Ok(chunk)) => {
                    let done = chunk.done;
                    if tx.send(ServerFrame::Output(chunk)).await.is_err() {
                        return Ok(());
                    }
                    if done {
                        return Ok(());
                    }
                }
                // A non-zero exit code is NOT an error; it arrives as a
                // normal `done` chunk above. Only transport failures land
                // here.
                Some(Err(e)) => return Err(format!("plugin stream failed: {e}")),
                None => return Err("plugin stream ended unexpectedly".to_string()),
            }
        }
    }
}
