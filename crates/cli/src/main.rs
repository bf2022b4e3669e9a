// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! jelly-j - a terminal-workspace assistant.
//!
//! Process invocation: no subcommand runs the Startup
//! Supervisor then the UI Client Session; `daemon` runs the daemon
//! directly; `ui` runs only the UI client, assuming a daemon is already
//! present.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod color;
mod env;
mod help;
mod protocol;
mod supervisor;
mod ui;
mod ui_input;

use clap::{Parser, Subcommand};
use jj_daemon::Paths;

#[derive(Parser)]
#[command(name = "jelly-j", version, about = "A terminal-workspace assistant")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the daemon directly; does not exit until terminated.
    Daemon {
        /// Multiplexer session tag to record in the lock record (informational).
        #[arg(long = "session-tag")]
        session_tag: Option<String>,
    },
    /// Run only the UI client, assuming a daemon is already running.
    Ui {
        /// Multiplexer session tag to register with.
        #[arg(long = "session-tag")]
        session_tag: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    use clap::{CommandFactory, FromArgMatches};

    let matches = match cli_command().try_get_matches() {
        Ok(m) => m,
        Err(err) => {
            if err.kind() == clap::error::ErrorKind::DisplayHelp
                || err.kind() == clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            {
                help::print_help(cli_command());
                std::process::exit(0);
            }
            err.exit();
        }
    };
    let cli = match Cli::from_arg_matches(&matches) {
        Ok(cli) => cli,
        Err(err) => err.exit(),
    };

    std::process::exit(run(cli.command).await);
}

fn cli_command() -> clap::Command {
    use clap::CommandFactory;
    Cli::command()
        .help_template(help::template())
        .before_help(help::commands())
        .after_help(help::after_help())
        .styles(help::styles())
}

/// Find a subcommand by a path of names, descending one level per name.
/// Test-only: production help rendering builds each subcommand's `Command`
/// directly (see `help.rs`); this is for tests that want to assert on a
/// subcommand's shape without hand-rolling the descent.
#[cfg(test)]
fn find_subcommand(mut cmd: clap::Command, path: &[&str]) -> clap::Command {
    for name in path {
        cmd = cmd
            .find_subcommand(name)
            .cloned()
            .unwrap_or_else(|| panic!("no such subcommand: {name}"));
    }
    cmd
}

async fn run(command: Option<Command>) -> i32 {
    match command {
        None => run_default().await,
        Some(Command::Daemon { session_tag }) => run_daemon(session_tag).await,
        Some(Command::Ui { session_tag }) => run_ui_only(session_tag).await,
    }
}

/// No subcommand: Startup Supervisor then UI Client Session.
async fn run_default() -> i32 {
    let paths = match Paths::resolve() {
        Ok(paths) => paths,
        Err(err) => {
            eprintln!("jelly-j: {err}");
            return 1;
        }
    };

    let session_tag = session_tag_from_env();

    if let Err(err) = supervisor::ensure_daemon_running(&paths, session_tag.clone()).await {
        eprintln!("jelly-j: could not start the daemon: {err}");
        return 1;
    }

    match ui::run(&paths, session_tag).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("jelly-j: {err}");
            1
        }
    }
}

/// `jelly-j daemon`: run the daemon directly. A lock already
/// held by a live process is treated as success, matching the supervisor's
/// own handling of the same condition.
async fn run_daemon(session_tag: Option<String>) -> i32 {
    match jj_daemon::run(session_tag.or_else(session_tag_from_env)).await {
        Ok(()) => 0,
        Err(jj_daemon::LifecycleError::AlreadyRunning { pid }) => {
            eprintln!("jelly-j: a daemon is already running (pid {pid})");
            0
        }
        Err(err) => {
            eprintln!("jelly-j: daemon failed to start: {err}");
            1
        }
    }
}

/// `jelly-j ui`: run only the UI client; the caller is responsible for a
/// daemon already being present.
async fn run_ui_only(session_tag: Option<String>) -> i32 {
    let paths = match Paths::resolve() {
        Ok(paths) => paths,
        Err(err) => {
            eprintln!("jelly-j: {err}");
            return 1;
        }
    };
    let session_tag = session_tag.or_else(session_tag_from_env);
    match ui::run(&paths, session_tag).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("jelly-j: {err}");
            1
        }
    }
}

/// The multiplexer session name, when invoked from inside one.
fn session_tag_from_env() -> Option<String> {
    std::env::var("ZELLIJ_SESSION_NAME").ok()
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
