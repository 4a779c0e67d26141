// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon service protocol: the supervisor is the server, front-ends are
//! clients.
//!
//! Each connection carries one `Request`. `Execute` upgrades the
//! connection: after the daemon answers `ExecuteReady`, the client sends
//! `ClientFrame`s (the first MUST be `Command`) and reads `ServerFrame`s
//! until an `Output` with `done = true` or an `Error` arrives.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::plugin::ExecuteChunk;
use crate::ui::{UiRequest, UiResponse};

/// Request from front-end to daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check.
    Ping,
    /// Daemon status snapshot.
    Status,
    /// Ask the daemon to shut down gracefully. `force` is accepted for
    /// forward compatibility and currently behaves like `false`.
    Shutdown {
        #[serde(default)]
        force: bool,
    },
    /// Upgrade this connection to a bidirectional execute stream.
    Execute,
}

/// Response from daemon to front-end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    Pong,

    Status {
        daemon_version: String,
        uptime_secs: u64,
        active_sessions: usize,
        pid: u32,
        /// Names of plugins currently running and handshake-complete.
        #[serde(default)]
        warm_plugins: Vec<String>,
    },

    ShuttingDown { accepted: bool },

    /// Execute upgrade accepted; stream frames follow.
    ExecuteReady,

    /// Another session holds the execute lock. Not retried, not queued.
    Busy { message: String },

    Error { message: String },
}

/// Frames from front-end to daemon on an upgraded connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ClientFrame {
    Command(CommandRequest),
    UiResponse(UiResponse),
}

/// The command to run, sent as the first frame of every session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CommandRequest {
    pub plugin: String,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub flags: BTreeMap<String, String>,
}

/// Frames from daemon to front-end on an upgraded connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ServerFrame {
    Output(ExecuteChunk),
    UiRequest(UiRequest),
    Error { message: String },
}
