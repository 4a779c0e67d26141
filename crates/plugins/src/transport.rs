// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Framed Unix-socket client for a plugin's private service.
//!
//! Connections are dialed lazily: the first RPC creates the connect.
//! Both ends are local and supervised by the same process tree, so no
//! heartbeat is kept.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rig_wire::{
    decode, read_frame, read_message, write_frame, ExecuteChunk, ExecuteRequest, HandshakeRequest,
    HandshakeResponse, PluginRequest, ProtocolError,
};
use thiserror::Error;
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Mid-RPC transport failures.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {socket}: {source}")]
    Connect {
        socket: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("plugin rpc failed: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("rpc cancelled: plugin is stopping")]
    Cancelled,
}

/// Client over a plugin's private socket.
pub struct PluginConn {
    socket_path: PathBuf,
    io_timeout: Duration,
}

impl PluginConn {
    pub fn new(socket_path: impl Into<PathBuf>, io_timeout: Duration) -> Self {
        Self { socket_path: socket_path.into(), io_timeout }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    async fn dial(&self) -> Result<UnixStream, TransportError> {
        UnixStream::connect(&self.socket_path).await.map_err(|source| TransportError::Connect {
            socket: self.socket_path.clone(),
            source,
        })
    }

    /// One-shot handshake RPC.
    pub async fn handshake(
        &self,
        request: HandshakeRequest,
    ) -> Result<HandshakeResponse, TransportError> {
        let mut stream = self.dial().await?;
        write_frame(&mut stream, &PluginRequest::Handshake(request), self.io_timeout).await?;
        Ok(read_frame(&mut stream, self.io_timeout).await?)
    }

    /// Start an execute stream.
    ///
    /// Chunks arrive on the returned receiver in plugin-emit order until a
    /// `done` frame, a transport error, or cancellation. No per-read
    /// timeout applies: commands may legitimately run for a long time, and
    /// the cancellation token bounds the stream instead.
    pub async fn execute(
        &self,
        request: ExecuteRequest,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<Result<ExecuteChunk, TransportError>>, TransportError> {
        let mut stream = self.dial().await?;
        write_frame(&mut stream, &PluginRequest::Execute(request), self.io_timeout).await?;

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        let _ = tx.send(Err(TransportError::Cancelled)).await;
                        break;
                    }
                    result = read_message(&mut stream) => {
                        match result.and_then(|payload| decode::<ExecuteChunk>(&payload)) {
                            Ok(chunk) => {
                                let done = chunk.done;
                                if tx.send(Ok(chunk)).await.is_err() {
                                    debug!("execute stream receiver dropped");
                                    break;
                                }
                                if done {
                                    break;
                                }
                            }
                            Err(e) => {
                                let _ = tx.send(Err(e.into())).await;
                                break;
                            }
                        }
                    }
                }
            }
        });

        Ok(rx)
    }
}
