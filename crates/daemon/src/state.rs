// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Global daemon lifecycle state: the single-session lock, activity
//! stamping, and the once-guarded shutdown trigger.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::debug;

#[derive(Debug)]
struct Counters {
    busy: bool,
    active_sessions: usize,
    last_activity: Instant,
}

/// Shared lifecycle state. Counters are guarded by one mutex; no lock is
/// ever held across an await.
#[derive(Debug)]
pub struct LifecycleState {
    started_at: Instant,
    counters: Mutex<Counters>,
    shutdown: Notify,
    shutdown_triggered: AtomicBool,
}

impl LifecycleState {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            started_at: now,
            counters: Mutex::new(Counters { busy: false, active_sessions: 0, last_activity: now }),
            shutdown: Notify::new(),
            shutdown_triggered: AtomicBool::new(false),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn active_sessions(&self) -> usize {
        self.counters.lock().active_sessions
    }

    /// Stamped only after a session's teardown completes, so the reaper
    /// always observes a coherent quiescent state.
    pub fn last_activity(&self) -> Instant {
        self.counters.lock().last_activity
    }

    /// Take the single-session lock. Phase-1 policy: exactly one active
    /// session; callers that lose do not queue.
    pub fn try_begin_session(self: &Arc<Self>) -> Option<SessionGuard> {
        let mut counters = self.counters.lock();
        if counters.busy {
            return None;
        }
        counters.busy = true;
        counters.active_sessions += 1;
        Some(SessionGuard { state: Arc::clone(self) })
    }

    /// Fire the shutdown signal. Safe to call repeatedly; only the first
    /// call triggers, the rest are no-ops.
    pub fn trigger_shutdown(&self) -> bool {
        if self.shutdown_triggered.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.shutdown.notify_one();
        true
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_triggered.load(Ordering::SeqCst)
    }

    /// Resolves once shutdown has been triggered.
    pub async fn shutdown_signalled(&self) {
        while !self.is_shutting_down() {
            self.shutdown.notified().await;
        }
    }
}

impl Default for LifecycleState {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds the session lock. Dropping it releases the lock and stamps
/// `last_activity`, which is why teardown drops it last.
pub struct SessionGuard {
    state: Arc<LifecycleState>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let mut counters = self.state.counters.lock();
        counters.busy = false;
        counters.active_sessions = counters.active_sessions.saturating_sub(1);
        counters.last_activity = Instant::now();
        debug!("session released");
    }
}
