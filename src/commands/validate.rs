//! # Validate Command Implementation
//!
//! Resolves the sync configuration exactly as `sync` would and prints the
//! resulting targets, without cloning or touching anything. Needs no token.
//!
//! Warnings about malformed entries are logged as usual, so running this
//! against a config change shows what `sync` would skip.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use repo_file_sync::config::{self, FileSpec, RepoTarget};
use repo_file_sync::output::{emoji, OutputConfig};
use repo_file_sync::settings;

/// Resolve the sync configuration and list the targets
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Path to the sync configuration.
    #[arg(short, long, value_name = "FILE", env = "INPUT_CONFIG_PATH", default_value = settings::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Base URL of the GitHub server.
    #[arg(long, env = "GITHUB_SERVER_URL", default_value = settings::DEFAULT_SERVER_URL)]
    pub server_url: String,

    /// Print the resolved targets as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);

    let targets = match config::from_file(&args.config, &args.server_url) {
        Ok(targets) => targets,
        Err(e) => {
            if !args.json {
                println!(
                    "{} Configuration parsing failed: {}",
                    emoji(&out, "❌", "[ERR]"),
                    e
                );
            }
            return Err(anyhow::anyhow!("Configuration parsing failed: {}", e));
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&targets)?);
        return Ok(());
    }

    println!(
        "{} Validating configuration: {}",
        emoji(&out, "🔍", "[SCAN]"),
        args.config.display()
    );
    println!("{}", render_targets(&targets));
    println!(
        "\n{} {} target(s), {} file entries",
        emoji(&out, "✅", "[OK]"),
        targets.len(),
        targets.iter().map(|t| t.files.len()).sum::<usize>()
    );
    Ok(())
}

fn render_targets(targets: &[RepoTarget]) -> String {
    targets
        .iter()
        .map(|target| {
            let files: Vec<String> = target
                .files
                .iter()
                .map(|file| format!("     - {}", describe_file(file)))
                .collect();
            if files.is_empty() {
                format!("   {} (no files)", target.repo.unique_name())
            } else {
                format!("   {}\n{}", target.repo.unique_name(), files.join("\n"))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn describe_file(file: &FileSpec) -> String {
    let mut text = if file.source == file.dest {
        file.source.clone()
    } else {
        format!("{} -> {}", file.source, file.dest)
    };

    let mut flags = Vec::new();
    if !file.replace {
        flags.push("no replace".to_string());
    }
    if file.delete_orphaned {
        flags.push("delete orphaned".to_string());
    }
    if file.template {
        flags.push("template".to_string());
    }
    if !file.exclude.is_empty() {
        flags.push(format!("{} exclude(s)", file.exclude.len()));
    }
    if !flags.is_empty() {
        text.push_str(&format!(" ({})", flags.join(", ")));
    }
    text
}
