// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client for the daemon socket.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use rig_daemon::RuntimePaths;
use rig_wire::{
    decode, read_frame, read_message, write_frame, ClientFrame, CommandRequest, ProtocolError,
    Request, Response, ServerFrame, UiCall, UiReply, UiResponse,
};
use thiserror::Error;
use tokio::net::UnixStream;

const IPC_TIMEOUT: Duration = Duration::from_secs(5);

/// Client-side failures, distinguishing "no daemon" from daemon errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("daemon not running")]
    NotRunning,

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("daemon busy: {0}")]
    Busy(String),

    #[error("daemon error: {0}")]
    Daemon(String),

    #[error("unexpected response: {0:?}")]
    Unexpected(Response),
}

impl ClientError {
    pub fn is_not_running(&self) -> bool {
        matches!(self, ClientError::NotRunning)
    }
}

/// Daemon status snapshot as reported over the wire.
#[derive(Debug)]
pub struct StatusInfo {
    pub daemon_version: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
    pub pid: u32,
    pub warm_plugins: Vec<String>,
}

/// Answers interactive requests relayed from a running plugin.
pub trait UiHandler {
    fn prompt(&mut self, label: &str, default: &str) -> String;
    fn confirm(&mut self, label: &str) -> bool;
    fn select(&mut self, label: &str, options: &[String]) -> Vec<usize>;
    fn progress(&mut self, message: &str, percentage: Option<f32>);
}

pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Client against the environment-resolved daemon socket.
    pub fn new() -> Self {
        Self { socket_path: RuntimePaths::resolve().socket_path() }
    }

    async fn connect(&self) -> Result<UnixStream, ClientError> {
        UnixStream::connect(&self.socket_path).await.map_err(|_| ClientError::NotRunning)
    }

    async fn request(&self, request: &Request) -> Result<Response, ClientError> {
        let mut stream = self.connect().await?;
        write_frame(&mut stream, request, IPC_TIMEOUT).await?;
        Ok(read_frame(&mut stream, IPC_TIMEOUT).await?)
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        match self.request(&Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Err(ClientError::Unexpected(other)),
        }
    }

    pub async fn status(&self) -> Result<StatusInfo, ClientError> {
        match self.request(&Request::Status).await? {
            Response::Status { daemon_version, uptime_secs, active_sessions, pid, warm_plugins } => {
                Ok(StatusInfo { daemon_version, uptime_secs, active_sessions, pid, warm_plugins })
            }
            other => Err(ClientError::Unexpected(other)),
        }
    }

    /// Ask the daemon to shut down; returns its `accepted` flag.
    pub async fn shutdown(&self, force: bool) -> Result<bool, ClientError> {
        match self.request(&Request::Shutdown { force }).await? {
            Response::ShuttingDown { accepted } => Ok(accepted),
            other => Err(ClientError::Unexpected(other)),
        }
    }

    /// Drive one Execute session to completion.
    ///
    /// Output bytes are relayed verbatim to `stdout`/`stderr` in arrival
    /// order; interactive requests are answered through `ui`. Returns the
    /// plugin command's exit code. A non-zero exit is a normal outcome,
    /// not an error.
    pub async fn execute(
        &self,
        command: CommandRequest,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        ui: &mut dyn UiHandler,
    ) -> Result<i32, ClientError> {
        let mut stream = self.connect().await?;
        write_frame(&mut stream, &Request::Execute, IPC_TIMEOUT).await?;

        match read_frame::<_, Response>(&mut stream, IPC_TIMEOUT).await? {
            Response::ExecuteReady => {}
            Response::Busy { message } => return Err(ClientError::Busy(message)),
            Response::Error { message } => return Err(ClientError::Daemon(message)),
            other => return Err(ClientError::Unexpected(other)),
        }

        write_frame(&mut stream, &ClientFrame::Command(command), IPC_TIMEOUT).await?;

        loop {
            // No read timeout mid-session: commands may run indefinitely.
            let payload = read_message(&mut stream).await?;
            match decode::<ServerFrame>(&payload)? {
                ServerFrame::Output(chunk) => {
                    if !chunk.stdout.is_empty() {
                        let _ = stdout.write_all(&chunk.stdout);
                        let _ = stdout.flush();
                    }
                    if !chunk.stderr.is_empty() {
                        let _ = stderr.write_all(&chunk.stderr);
                        let _ = stderr.flush();
                    }
                    if chunk.done {
                        return Ok(chunk.exit_code);
                    }
                }
                ServerFrame::UiRequest(request) => {
                    if let Some(reply) = answer_ui(ui, request.call) {
                        let frame = ClientFrame::UiResponse(UiResponse {
                            response_to: request.id,
                            reply,
                        });
                        write_frame(&mut stream, &frame, IPC_TIMEOUT).await?;
                    }
                }
                ServerFrame::Error { message } => return Err(ClientError::Daemon(message)),
            }
        }
    }
}

impl Default for DaemonClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress updates are one-way; everything else produces a reply.
fn answer_ui(ui: &mut dyn UiHandler, call: UiCall) -> Option<UiReply> {
    match call {
        UiCall::Prompt { label, default } => {
            Some(UiReply::Value { value: ui.prompt(&label, &default) })
        }
        UiCall::Confirm { label } => Some(UiReply::Confirmed { confirmed: ui.confirm(&label) }),
        UiCall::Select { label, options } => {
            Some(UiReply::Selected { selected_indices: ui.select(&label, &options) })
        }
        UiCall::UpdateProgress { message, percentage } => {
            ui.progress(&message, percentage);
            None
        }
    }
}
