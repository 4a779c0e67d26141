// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UI proxy and per-session bridge.
//!
//! Plugins make synchronous UI calls against the host; the proxy relays
//! each call to whichever front-end initiated the current session and
//! correlates the reply by request id. The correlation entry is always
//! registered *before* the request is dispatched; the inverse order
//! admits a lost-wakeup race when the front-end answers early.

mod server;

pub(crate) use server::spawn_ui_server;

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rig_wire::{ServerFrame, UiCall, UiReply, UiRequest, UiResponse};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// UI dispatch errors.
#[derive(Debug, Error)]
pub enum UiError {
    #[error("no interactive session is attached")]
    NoSession,

    #[error("session closed before the reply arrived")]
    SessionClosed,
}

/// Routes plugin UI calls to the active session's front-end.
///
/// At most one session is active at a time; transitions are serialized by
/// the write lock.
pub struct UiProxy {
    active: RwLock<Option<Arc<SessionBridge>>>,
}

impl UiProxy {
    pub fn new() -> Self {
        Self { active: RwLock::new(None) }
    }

    /// Install the per-session bridge, replacing any previous one. A
    /// replaced bridge is drained so its waiters observe `SessionClosed`
    /// instead of hanging.
    pub fn set_active_session(&self, tx: mpsc::Sender<ServerFrame>) -> Arc<SessionBridge> {
        let bridge = Arc::new(SessionBridge { tx, pending: Mutex::new(HashMap::new()) });
        if let Some(old) = self.active.write().replace(Arc::clone(&bridge)) {
            old.drain();
        }
        bridge
    }

    /// Detach the current session. Outstanding waiters observe
    /// `SessionClosed` because draining the table drops their senders.
    pub fn clear_active_session(&self) {
        if let Some(bridge) = self.active.write().take() {
            bridge.drain();
        }
    }

    /// Relay one UI call and wait for the correlated reply.
    ///
    /// `UpdateProgress` is fire-and-forget: it succeeds with `Ack` even
    /// when no front-end is attached, and never waits for a reply.
    pub async fn dispatch(&self, call: UiCall) -> Result<UiReply, UiError> {
        let bridge = self.active.read().clone();

        if call.is_fire_and_forget() {
            if let Some(bridge) = bridge {
                bridge.send_one_way(call).await;
            }
            return Ok(UiReply::Ack);
        }

        let Some(bridge) = bridge else {
            return Err(UiError::NoSession);
        };
        bridge.request(call).await
    }
}

impl Default for UiProxy {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-session correlation structure.
pub struct SessionBridge {
    tx: mpsc::Sender<ServerFrame>,
    pending: Mutex<HashMap<String, oneshot::Sender<UiReply>>>,
}

impl SessionBridge {
    async fn request(&self, call: UiCall) -> Result<UiReply, UiError> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let (reply_tx, reply_rx) = oneshot::channel();

        // Register before send: the table entry must exist before the
        // front-end can possibly answer.
        self.pending.lock().insert(id.clone(), reply_tx);

        let frame = ServerFrame::UiRequest(UiRequest { id: id.clone(), call });
        if self.tx.send(frame).await.is_err() {
            self.pending.lock().remove(&id);
            return Err(UiError::SessionClosed);
        }

        let result = reply_rx.await;
        // Delete the entry on every exit path, including cancellation.
        self.pending.lock().remove(&id);
        result.map_err(|_| UiError::SessionClosed)
    }

    async fn send_one_way(&self, call: UiCall) {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let _ = self.tx.send(ServerFrame::UiRequest(UiRequest { id, call })).await;
    }

    /// Deliver a front-end reply. Unknown or already-completed ids are
    /// dropped; delivery never blocks the caller's receive loop.
    pub fn handle_response(&self, response: UiResponse) {
        match self.pending.lock().remove(&response.response_to) {
            Some(reply_tx) => {
                let _ = reply_tx.send(response.reply);
            }
            None => debug!(id = %response.response_to, "reply for unknown ui request"),
        }
    }

    fn drain(&self) {
        self.pending.lock().clear();
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
