// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rig daemon library.
//!
//! The supervisor process: binds the daemon socket, arbitrates front-end
//! sessions, proxies command execution into plugins, bridges interactive
//! UI callbacks, and reaps idle plugins under the two-level idle policy.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod env;
pub mod lifecycle;
pub mod reaper;
pub mod runtime;
pub mod server;
pub mod state;
pub mod ui;

pub use lifecycle::{startup, Config, Daemon, LifecycleError};
pub use runtime::{process_alive, PidError, RuntimePaths};
pub use state::{LifecycleState, SessionGuard};
pub use ui::{SessionBridge, UiError, UiProxy};
