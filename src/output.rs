//! # Output Configuration
//!
//! Controls how human-facing output looks: colors, emoji and the end-of-run
//! summary. Log lines are not affected; they go through `log`.
//!
//! The following flags and environment variables are respected:
//! - `--color=never|always|auto`
//! - `NO_COLOR` disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` disables colors
//! - `CLICOLOR_FORCE=1` forces colors even in non-TTY
//! - `TERM=dumb` disables colors

use crate::sync::{SyncOutcome, SyncReport};
use console::style;
use std::env;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Builds the configuration from the `--color` flag and the environment.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // presence alone disables, even when empty
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// The emoji when colors are on, the plain marker otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// One line per target plus totals.
pub fn render_summary(config: &OutputConfig, report: &SyncReport) -> String {
    let mut lines = vec![format!(
        "{} Sync summary ({} target(s))",
        emoji(config, "📊", "[INFO]"),
        report.targets.len()
    )];

    for target in &report.targets {
        let (marker, plain) = match &target.outcome {
            SyncOutcome::Done { .. } => ("✅", "[OK]"),
            SyncOutcome::Skipped => ("➖", "[SKIP]"),
            SyncOutcome::DryRun => ("🧪", "[DRY]"),
            SyncOutcome::Failed { .. } => ("❌", "[ERR]"),
        };
        let outcome = target.outcome.to_string();
        let outcome = if !config.use_color {
            outcome
        } else if matches!(target.outcome, SyncOutcome::Failed { .. }) {
            style(outcome).red().to_string()
        } else {
            style(outcome).dim().to_string()
        };
        lines.push(format!(
            "   {} {}: {}",
            emoji(config, marker, plain),
            target.repo.unique_name(),
            outcome
        ));
    }

    if !report.pr_urls.is_empty() {
        lines.push(format!("   Pull requests: {}", report.pr_urls.len()));
    }
    if report.failed() > 0 {
        lines.push(format!("   Failed: {}", report.failed()));
    }

    lines.join("\n")
}
