// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UI socket server: plugins dial in with one `UiCall` per connection and
//! read back one `UiReply`.

use std::sync::Arc;

use rig_wire::{read_frame, write_frame, UiCall, UiReply};
use tokio::net::{UnixListener, UnixStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use super::UiProxy;
use crate::env::ipc_timeout;

pub(crate) fn spawn_ui_server(
    listener: UnixListener,
    proxy: Arc<UiProxy>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, _)) => {
                            let proxy = Arc::clone(&proxy);
                            tokio::spawn(async move {
                                if let Err(e) = handle_call(stream, &proxy).await {
                                    debug!(error = %e, "ui connection ended");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "ui socket accept error");
                            break;
                        }
                    }
                }
            }
        }
    })
}

async fn handle_call(
    mut stream: UnixStream,
    proxy: &UiProxy,
) -> Result<(), rig_wire::ProtocolError> {
    let call: UiCall = read_frame(&mut stream, ipc_timeout()).await?;
    debug!(?call, "ui call received");

    // No timeout on the dispatch itself: the deadline is the plugin's,
    // and clearing the session unblocks any stranded waiter.
    let reply = match proxy.dispatch(call).await {
        Ok(reply) => reply,
        Err(e) => UiReply::Error { message: e.to_string() },
    };

    write_frame(&mut stream, &reply, ipc_timeout()).await
}
