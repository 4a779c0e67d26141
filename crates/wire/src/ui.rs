// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Host-facing UI service and the correlated frames relayed to front-ends.
//!
//! A plugin dials the host UI socket and sends one `UiCall` per
//! connection; the host replies with one `UiReply`. When a front-end
//! session is attached, the call is relayed upstream as a `UiRequest`
//! carrying a fresh correlation `id`, and the front-end answers with a
//! `UiResponse` whose `response_to` echoes that id.

use serde::{Deserialize, Serialize};

/// An interactive call from a plugin to the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum UiCall {
    /// Free-form text input.
    Prompt {
        label: String,
        #[serde(default)]
        default: String,
    },
    /// Yes/no question.
    Confirm { label: String },
    /// Multi-select from a fixed option list.
    Select { label: String, options: Vec<String> },
    /// Fire-and-forget progress update. Never fails, even with no
    /// front-end attached.
    UpdateProgress {
        #[serde(default)]
        message: String,
        #[serde(default)]
        percentage: Option<f32>,
    },
}

impl UiCall {
    /// Progress updates are one-way; no front-end reply is expected.
    pub fn is_fire_and_forget(&self) -> bool {
        matches!(self, UiCall::UpdateProgress { .. })
    }
}

/// The host's answer to a `UiCall`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum UiReply {
    Value { value: String },
    Confirmed { confirmed: bool },
    Selected { selected_indices: Vec<usize> },
    /// Acknowledgement for `UpdateProgress`.
    Ack,
    Error { message: String },
}

/// A call relayed to the front-end, correlated by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiRequest {
    pub id: String,
    pub call: UiCall,
}

/// The front-end's reply to a relayed `UiRequest`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiResponse {
    pub response_to: String,
    pub reply: UiReply,
}
