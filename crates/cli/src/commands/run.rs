// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rig run` - invoke a plugin command through the daemon.

use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::Args;
use rig_wire::CommandRequest;

use crate::client::{ClientError, UiHandler};
use crate::daemon_process;

#[derive(Args)]
pub struct RunArgs {
    /// Plugin name
    pub plugin: String,

    /// Command to invoke
    pub command: String,

    /// Positional arguments passed to the command
    #[arg(trailing_var_arg = true)]
    pub args: Vec<String>,

    /// key=value flags passed to the command (repeatable)
    #[arg(short = 'f', long = "flag", value_parser = parse_key_val)]
    pub flags: Vec<(String, String)>,
}

pub async fn run(args: RunArgs) -> Result<ExitCode> {
    let client = daemon_process::ensure_running().await?;

    let request = CommandRequest {
        plugin: args.plugin,
        command: args.command,
        args: args.args,
        flags: args.flags.into_iter().collect::<BTreeMap<_, _>>(),
    };

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let mut ui = TerminalUi;

    match client.execute(request, &mut stdout, &mut stderr, &mut ui).await {
        Ok(exit_code) => Ok(ExitCode::from(exit_code.clamp(0, 255) as u8)),
        Err(ClientError::Busy(message)) => Err(anyhow!("{message} (try again shortly)")),
        Err(e) => Err(anyhow!("{e}")),
    }
}

fn parse_key_val(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("invalid flag {raw:?}: expected key=value"))
}

/// Interactive handler on the controlling terminal. Prompts go to stderr
/// so command output on stdout stays clean for pipes.
struct TerminalUi;

impl UiHandler for TerminalUi {
    fn prompt(&mut self, label: &str, default: &str) -> String {
        if default.is_empty() {
            eprint!("{label}: ");
        } else {
            eprint!("{label} [{default}]: ");
        }
        let _ = std::io::stderr().flush();

        let answer = read_line();
        if answer.is_empty() {
            default.to_string()
        } else {
            answer
        }
    }

    fn confirm(&mut self, label: &str) -> bool {
        eprint!("{label} [y/N]: ");
        let _ = std::io::stderr().flush();
        matches!(read_line().to_lowercase().as_str(), "y" | "yes")
    }

    fn select(&mut self, label: &str, options: &[String]) -> Vec<usize> {
        eprintln!("{label}:");
        for (i, option) in options.iter().enumerate() {
            eprintln!("  {}) {}", i + 1, option);
        }
        eprint!("Selection (comma-separated numbers): ");
        let _ = std::io::stderr().flush();

        read_line()
            .split(',')
            .filter_map(|part| part.trim().parse::<usize>().ok())
            .filter(|n| (1..=options.len()).contains(n))
            .map(|n| n - 1)
            .collect()
    }

    fn progress(&mut self, message: &str, percentage: Option<f32>) {
        match percentage {
            Some(pct) => eprintln!("[{pct:>3.0}%] {message}"),
            None => eprintln!("... {message}"),
        }
    }
}

fn read_line() -> String {
    let mut line = String::new();
    let _ = std::io::stdin().lock().read_line(&mut line);
    line.trim().to_string()
}
