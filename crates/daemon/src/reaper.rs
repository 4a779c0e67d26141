// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle reaper: stops idle plugins and shuts the daemon down when
//! globally idle.
//!
//! Plugin reaping is suppressed while a session is active so a running
//! command never loses its plugin mid-flight.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rig_plugins::{PluginManager, PluginSnapshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::state::LifecycleState;

#[derive(Debug, Clone)]
pub struct ReaperConfig {
    /// Tick interval (1 minute in production).
    pub tick: Duration,
    pub plugin_idle: Duration,
    pub daemon_idle: Duration,
}

/// Inputs to one reap decision, captured without holding any lock.
pub struct ReapInput {
    pub active_sessions: usize,
    pub last_activity: Instant,
    pub plugins: Vec<PluginSnapshot>,
}

/// What one tick decided.
#[derive(Debug, Default, PartialEq)]
pub struct ReapOutcome {
    pub stop_plugins: Vec<String>,
    pub shutdown_daemon: bool,
}

/// Pure decision for a single tick.
pub fn reap_tick(now: Instant, config: &ReaperConfig, input: &ReapInput) -> ReapOutcome {
    let mut outcome = ReapOutcome::default();

    if input.active_sessions > 0 {
        return outcome;
    }

    for snapshot in &input.plugins {
        if snapshot.running
            && now.saturating_duration_since(snapshot.last_used) > config.plugin_idle
        {
            outcome.stop_plugins.push(snapshot.name.clone());
        }
    }

    if now.saturating_duration_since(input.last_activity) > config.daemon_idle {
        outcome.shutdown_daemon = true;
    }

    outcome
}

/// Run the periodic reaper until cancellation or self-triggered shutdown.
pub fn spawn_reaper(
    config: ReaperConfig,
    lifecycle: Arc<LifecycleState>,
    manager: Arc<PluginManager>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + config.tick;
        let mut ticker = tokio::time::interval_at(start, config.tick);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let input = ReapInput {
                        active_sessions: lifecycle.active_sessions(),
                        last_activity: lifecycle.last_activity(),
                        plugins: manager.list_plugins(),
                    };
                    let outcome = reap_tick(Instant::now(), &config, &input);

                    for name in &outcome.stop_plugins {
                        info!(plugin = %name, "stopping idle plugin");
                        manager.stop_plugin(name).await;
                    }

                    if outcome.shutdown_daemon {
                        // The once-guard makes a repeat trigger harmless.
                        if lifecycle.trigger_shutdown() {
                            info!("daemon idle, shutting down");
                        }
                        break;
                    }

                    debug!(stopped = outcome.stop_plugins.len(), "reap tick complete");
                }
            }
        }
    })
}

#[cfg(test)]
#[path = "reaper_tests.rs"]
mod tests;
