// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn config() -> ReaperConfig {
    ReaperConfig {
        tick: Duration::from_secs(60),
        plugin_idle: Duration::from_secs(300),
        daemon_idle: Duration::from_secs(900),
    }
}

fn snapshot(name: &str, running: bool, idle_for: Duration, now: Instant) -> PluginSnapshot {
    PluginSnapshot { name: name.to_string(), running, last_used: now - idle_for }
}

/// An instant far enough ahead that subtracting hour-scale idle spans
/// stays representable.
fn far_now() -> Instant {
    Instant::now() + Duration::from_secs(100_000)
}

#[test]
fn idle_plugin_is_stopped_when_no_session_is_active() {
    let now = far_now();
    let input = ReapInput {
        active_sessions: 0,
        last_activity: now,
        plugins: vec![
            snapshot("stale", true, Duration::from_secs(600), now),
            snapshot("fresh", true, Duration::from_secs(10), now),
        ],
    };

    let outcome = reap_tick(now, &config(), &input);
    assert_eq!(outcome.stop_plugins, vec!["stale".to_string()]);
    assert!(!outcome.shutdown_daemon);
}

#[test]
fn reaping_is_suppressed_during_an_active_session() {
    let now = far_now();
    let input = ReapInput {
        active_sessions: 1,
        // Even with everything idle past both thresholds...
        last_activity: now - Duration::from_secs(3600),
        plugins: vec![snapshot("stale", true, Duration::from_secs(3600), now)],
    };

    let outcome = reap_tick(now, &config(), &input);
    assert_eq!(outcome, ReapOutcome::default());
}

#[test]
fn stale_plugin_is_reaped_on_the_tick_after_the_session_closes() {
    let now = far_now();
    let stale = snapshot("stale", true, Duration::from_secs(3600), now);

    let during = ReapInput {
        active_sessions: 1,
        last_activity: now,
        plugins: vec![stale.clone()],
    };
    assert!(reap_tick(now, &config(), &during).stop_plugins.is_empty());

    let after = ReapInput { active_sessions: 0, last_activity: now, plugins: vec![stale] };
    assert_eq!(reap_tick(now, &config(), &after).stop_plugins, vec!["stale".to_string()]);
}

#[test]
fn stopped_plugins_are_not_reaped_again() {
    let now = far_now();
    let input = ReapInput {
        active_sessions: 0,
        last_activity: now,
        plugins: vec![snapshot("cold", false, Duration::from_secs(3600), now)],
    };

    assert!(reap_tick(now, &config(), &input).stop_plugins.is_empty());
}

#[test]
fn daemon_shuts_down_after_the_idle_timeout() {
    let now = far_now();
    let input = ReapInput {
        active_sessions: 0,
        last_activity: now - Duration::from_secs(1000),
        plugins: Vec::new(),
    };

    assert!(reap_tick(now, &config(), &input).shutdown_daemon);
}

#[test]
fn recent_activity_keeps_the_daemon_alive() {
    let now = far_now();
    let input = ReapInput {
        active_sessions: 0,
        last_activity: now - Duration::from_secs(60),
        plugins: Vec::new(),
    };

    assert!(!reap_tick(now, &config(), &input).shutdown_daemon);
}
