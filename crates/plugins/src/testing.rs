// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process fakes for exercising the manager and daemon without real
//! plugin binaries.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rig_core::Plugin;
use rig_wire::{
    read_frame, write_frame, CapabilityInfo, CommandInfo, ExecuteChunk, ExecuteRequest,
    HandshakeResponse, PluginRequest, ProtocolError, UiCall, UiReply, API_VERSION,
};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;

use crate::launch::{PluginLauncher, RunningPlugin, StartError};
use crate::scan::PluginScanner;

const IO_TIMEOUT: Duration = Duration::from_secs(5);

/// Serves the plugin protocol on a Unix socket from inside the test
/// process.
///
/// Commands: `echo` writes its arguments joined by spaces to stdout;
/// `fail` exits 2; `sleep` waits `args[0]` milliseconds (default 200)
/// before finishing; `ask` issues a `Prompt` to the host UI socket and
/// echoes the reply value; anything else reports
/// `Unknown command: <name>` on stderr with exit 1.
#[derive(Clone)]
pub struct MockPlugin {
    pub plugin_id: String,
    pub plugin_semver: String,
    pub capabilities: Vec<CapabilityInfo>,
    pub legacy_capabilities: Vec<String>,
    pub legacy_plugin_version: String,
    pub host_endpoint: Option<PathBuf>,
    /// Drop handshake connections without replying.
    pub refuse_handshake: bool,
}

impl MockPlugin {
    pub fn new(plugin_id: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            plugin_semver: "1.0.0".to_string(),
            capabilities: vec![CapabilityInfo {
                name: rig_core::CAP_COMMAND.to_string(),
                version: "1.0.0".to_string(),
            }],
            legacy_capabilities: Vec::new(),
            legacy_plugin_version: String::new(),
            host_endpoint: None,
            refuse_handshake: false,
        }
    }

    pub fn with_capabilities(mut self, capabilities: Vec<CapabilityInfo>) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_legacy_handshake(mut self, version: &str, capabilities: Vec<String>) -> Self {
        self.plugin_semver = String::new();
        self.capabilities = Vec::new();
        self.legacy_plugin_version = version.to_string();
        self.legacy_capabilities = capabilities;
        self
    }

    pub fn with_host_endpoint(mut self, endpoint: impl Into<PathBuf>) -> Self {
        self.host_endpoint = Some(endpoint.into());
        self
    }

    /// Bind `socket_path` and serve until the returned token is cancelled.
    /// Must be called from within a tokio runtime.
    pub fn serve(self, socket_path: &Path) -> std::io::Result<CancellationToken> {
        let listener = UnixListener::bind(socket_path)?;
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { break };
                        let plugin = self.clone();
                        tokio::spawn(async move {
                            let _ = plugin.handle_conn(stream).await;
                        });
                    }
                }
            }
        });

        Ok(cancel)
    }

    async fn handle_conn(self, mut stream: UnixStream) -> Result<(), ProtocolError> {
        let request: PluginRequest = read_frame(&mut stream, IO_TIMEOUT).await?;
        match request {
            PluginRequest::Handshake(_) => {
                if self.refuse_handshake {
                    return Ok(());
                }
                let response = HandshakeResponse {
                    plugin_id: self.plugin_id.clone(),
                    api_version: API_VERSION.to_string(),
                    plugin_semver: self.plugin_semver.clone(),
                    capabilities: self.capabilities.clone(),
                    commands: vec![CommandInfo {
                        name: "echo".to_string(),
                        short: "Echo arguments back".to_string(),
                        ..Default::default()
                    }],
                    legacy_plugin_version: self.legacy_plugin_version.clone(),
                    legacy_capabilities: self.legacy_capabilities.clone(),
                };
                write_frame(&mut stream, &response, IO_TIMEOUT).await
            }
            PluginRequest::Execute(request) => self.run_command(stream, request).await,
        }
    }

    async fn run_command(
        &self,
        mut stream: UnixStream,
        request: ExecuteRequest,
    ) -> Result<(), ProtocolError> {
        match request.command.as_str() {
            "echo" => {
                let out = request.args.join(" ");
                write_frame(&mut stream, &ExecuteChunk::stdout(out.into_bytes()), IO_TIMEOUT)
                    .await?;
                write_frame(&mut stream, &ExecuteChunk::finished(0), IO_TIMEOUT).await
            }
            "fail" => {
                write_frame(&mut stream, &ExecuteChunk::stderr(&b"boom\n"[..]), IO_TIMEOUT)
                    .await?;
                write_frame(&mut stream, &ExecuteChunk::finished(2), IO_TIMEOUT).await
            }
            "sleep" => {
                let ms = request
                    .args
                    .first()
                    .and_then(|raw| raw.parse::<u64>().ok())
                    .unwrap_or(200);
                tokio::time::sleep(Duration::from_millis(ms)).await;
                write_frame(&mut stream, &ExecuteChunk::finished(0), IO_TIMEOUT).await
            }
            "ask" => {
                let label = request.args.first().cloned().unwrap_or_default();
                let value = match &self.host_endpoint {
                    Some(endpoint) => prompt_host(endpoint, &label).await?,
                    None => String::new(),
                };
                write_frame(&mut stream, &ExecuteChunk::stdout(value.into_bytes()), IO_TIMEOUT)
                    .await?;
                write_frame(&mut stream, &ExecuteChunk::finished(0), IO_TIMEOUT).await
            }
            other => {
                let message = format!("Unknown command: {other}");
                write_frame(&mut stream, &ExecuteChunk::stderr(message.into_bytes()), IO_TIMEOUT)
                    .await?;
                write_frame(&mut stream, &ExecuteChunk::finished(1), IO_TIMEOUT).await
            }
        }
    }
}

/// Dial the host UI socket, send one Prompt, return the reply value.
async fn prompt_host(endpoint: &Path, label: &str) -> Result<String, ProtocolError> {
    let mut stream = UnixStream::connect(endpoint).await?;
    let call = UiCall::Prompt { label: label.to_string(), default: String::new() };
    write_frame(&mut stream, &call, IO_TIMEOUT).await?;
    let reply: UiReply = read_frame(&mut stream, IO_TIMEOUT).await?;
    Ok(match reply {
        UiReply::Value { value } => value,
        UiReply::Error { message } => format!("ui error: {message}"),
        _ => String::new(),
    })
}

/// Scanner returning a fixed record set.
pub struct FakeScanner {
    records: Vec<Plugin>,
}

impl FakeScanner {
    pub fn new(records: Vec<Plugin>) -> Self {
        Self { records }
    }
}

impl PluginScanner for FakeScanner {
    fn scan(&self) -> Vec<Plugin> {
        self.records.clone()
    }
}

/// Launcher that serves a `MockPlugin` on the requested socket instead of
/// spawning a subprocess.
pub struct FakeLauncher {
    plugin: MockPlugin,
    /// Number of start attempts observed, for coalescing assertions.
    pub starts: Arc<AtomicUsize>,
    never_bind: bool,
}

impl FakeLauncher {
    pub fn new(plugin: MockPlugin) -> Self {
        Self { plugin, starts: Arc::new(AtomicUsize::new(0)), never_bind: false }
    }

    /// Simulate a plugin that never binds its socket.
    pub fn never_bind(mut self) -> Self {
        self.never_bind = true;
        self
    }
}

#[async_trait::async_trait]
impl PluginLauncher for FakeLauncher {
    async fn start(
        &self,
        _exe: &Path,
        socket_path: &Path,
        _deadline: Option<Instant>,
    ) -> Result<Box<dyn RunningPlugin>, StartError> {
        self.starts.fetch_add(1, Ordering::SeqCst);

        if self.never_bind {
            return Err(StartError::SocketWait {
                socket: socket_path.to_owned(),
                waited_ms: 0,
            });
        }

        let cancel = self
            .plugin
            .clone()
            .serve(socket_path)
            .map_err(|source| StartError::Spawn { path: socket_path.to_owned(), source })?;

        Ok(Box::new(FakeRunning { socket_path: socket_path.to_owned(), cancel }))
    }
}

struct FakeRunning {
    socket_path: PathBuf,
    cancel: CancellationToken,
}

#[async_trait::async_trait]
impl RunningPlugin for FakeRunning {
    fn pid(&self) -> Option<u32> {
        None
    }

    fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    async fn stop(self: Box<Self>) {
        self.cancel.cancel();
        let _ = std::fs::remove_file(&self.socket_path);
    }
}
