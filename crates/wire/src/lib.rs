// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol for the rig plugin host.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload, spoken
//! on three Unix-socket surfaces:
//!
//! - the plugin-facing service (supervisor dials the plugin's private socket),
//! - the host-facing UI service (plugins dial the host's UI socket),
//! - the daemon service (front-ends dial the daemon socket).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod daemon;
mod frame;
mod plugin;
mod ui;

pub use daemon::{ClientFrame, CommandRequest, Request, Response, ServerFrame};
pub use frame::{
    decode, encode, read_frame, read_message, write_frame, write_message, ProtocolError,
};
pub use plugin::{
    CapabilityInfo, CommandInfo, ExecuteChunk, ExecuteRequest, HandshakeRequest,
    HandshakeResponse, PluginRequest, API_VERSION,
};
pub use ui::{UiCall, UiReply, UiRequest, UiResponse};

#[cfg(test)]
mod frame_tests;
