// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-prefixed JSON framing.

use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Upper bound on a single frame; protects against corrupt length prefixes.
const MAX_FRAME_LEN: u32 = 16 * 1024 * 1024;

/// Errors from framing and encoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timeout")]
    Timeout,

    #[error("Frame too large: {0} bytes")]
    FrameTooLarge(u32),

    #[error("Encode error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Decode error: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialize a message to raw JSON (no length prefix).
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, ProtocolError> {
    serde_json::to_vec(message).map_err(ProtocolError::Encode)
}

/// Deserialize a message from raw JSON.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    serde_json::from_slice(bytes).map_err(ProtocolError::Decode)
}

/// Read one length-prefixed message payload.
pub async fn read_message<R>(reader: &mut R) -> Result<Vec<u8>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    read_exact_or_closed(reader, &mut len_buf).await?;

    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(len));
    }

    let mut payload = vec![0u8; len as usize];
    read_exact_or_closed(reader, &mut payload).await?;
    Ok(payload)
}

/// Write one length-prefixed message payload.
pub async fn write_message<W>(writer: &mut W, payload: &[u8]) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(payload.len()).unwrap_or(u32::MAX);
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(len));
    }

    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read and decode one frame, bounded by `timeout`.
pub async fn read_frame<R, T>(reader: &mut R, timeout: Duration) -> Result<T, ProtocolError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let payload = tokio::time::timeout(timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&payload)
}

/// Encode and write one frame, bounded by `timeout`.
pub async fn write_frame<W, T>(
    writer: &mut W,
    message: &T,
    timeout: Duration,
) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = encode(message)?;
    tokio::time::timeout(timeout, write_message(writer, &payload))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

async fn read_exact_or_closed<R>(reader: &mut R, buf: &mut [u8]) -> Result<(), ProtocolError>
where
    R: AsyncRead + Unpin,
{
    match reader.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(ProtocolError::ConnectionClosed)
        }
        Err(e) => Err(e.into()),
    }
}
