//! CLI argument parsing, logging setup and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::Level;
use std::env;
use std::io::Write;

use crate::commands;

/// Repo File Sync - Keep files in many repositories in sync with one source
#[derive(Parser, Debug)]
#[command(name = "repo-file-sync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace). RUST_LOG overrides it.
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sync files from this repository to every configured target
    Sync(Box<commands::sync::SyncArgs>),

    /// Resolve the sync configuration and list the targets without syncing
    Validate(commands::validate::ValidateArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);

        match self.command {
            Commands::Sync(args) => commands::sync::execute(*args, &self.color),
            Commands::Validate(args) => commands::validate::execute(args, &self.color),
        }
    }
}

/// Whether we are running inside a GitHub Actions job.
pub fn in_github_actions() -> bool {
    env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
}

/// Sets up `env_logger` from `--log-level`, with `RUST_LOG` taking precedence.
///
/// Inside GitHub Actions, warnings, errors and debug lines are written as
/// workflow commands so they show up as annotations.
fn init_logging(level: &str) {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(level).parse_default_env();

    if in_github_actions() {
        builder.format(|buf, record| match record.level() {
            Level::Error => writeln!(buf, "::error::{}", record.args()),
            Level::Warn => writeln!(buf, "::warning::{}", record.args()),
            Level::Info => writeln!(buf, "{}", record.args()),
            Level::Debug | Level::Trace => writeln!(buf, "::debug::{}", record.args()),
        });
    } else {
        builder.format_timestamp(None).format_target(false);
    }

    // a second init (e.g. in tests) keeps the first logger
    let _ = builder.try_init();
}
