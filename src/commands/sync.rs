//! # Sync Command Implementation
//!
//! Resolves the sync configuration and runs every target through the
//! orchestrator against the real `git` executable and the GitHub API.
//!
//! Every option can be given as a flag or through the environment variable
//! GitHub Actions sets for the matching action input (`INPUT_<NAME>`), so
//! the binary can be used as the entry point of an action without a wrapper.

use anyhow::{Context, Result};
use clap::{ArgAction, Args};
use log::{debug, info, warn};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use repo_file_sync::config;
use repo_file_sync::event::PushEvent;
use repo_file_sync::git::GitRepository;
use repo_file_sync::github::GitHubClient;
use repo_file_sync::output::{render_summary, OutputConfig};
use repo_file_sync::settings::{self, Credentials, SyncSettings};
use repo_file_sync::sync::SyncOrchestrator;

use super::parse_bool;
use crate::cli::in_github_actions;

/// Sync files from this repository to every configured target
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Personal access token with access to the target repositories.
    #[arg(long, env = "INPUT_GH_PAT", hide_env_values = true)]
    pub gh_pat: Option<String>,

    /// GitHub App installation token, used when no personal token is given.
    #[arg(long, env = "INPUT_GH_INSTALLATION_TOKEN", hide_env_values = true)]
    pub gh_installation_token: Option<String>,

    /// Base URL of the GitHub server.
    #[arg(long, env = "GITHUB_SERVER_URL", default_value = settings::DEFAULT_SERVER_URL)]
    pub server_url: String,

    /// The source repository, as `owner/name`.
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: String,

    /// Path to the sync configuration.
    #[arg(short, long, value_name = "FILE", env = "INPUT_CONFIG_PATH", default_value = settings::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Directory that `source` paths are resolved against.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub source_root: PathBuf,

    /// Commit author email.
    #[arg(long, env = "INPUT_GIT_EMAIL")]
    pub git_email: Option<String>,

    /// Commit author name.
    #[arg(long, env = "INPUT_GIT_USERNAME")]
    pub git_username: Option<String>,

    /// Prefix of every generated commit message.
    #[arg(long, env = "INPUT_COMMIT_PREFIX", default_value = settings::DEFAULT_COMMIT_PREFIX)]
    pub commit_prefix: String,

    /// Text appended to every commit message after a blank line.
    #[arg(long, env = "INPUT_COMMIT_BODY", default_value = "")]
    pub commit_body: String,

    /// Commit each synced file separately.
    #[arg(long, env = "INPUT_COMMIT_EACH_FILE", value_name = "BOOL", value_parser = parse_bool, num_args = 0..=1, default_value = "true", default_missing_value = "true", action = ArgAction::Set)]
    pub commit_each_file: bool,

    /// Labels for the pull request, comma or newline separated. `false` disables.
    #[arg(long, env = "INPUT_PR_LABELS", default_value = settings::DEFAULT_PR_LABEL)]
    pub pr_labels: String,

    /// Extra text for the pull request body.
    #[arg(long, env = "INPUT_PR_BODY", default_value = "")]
    pub pr_body: String,

    /// Users to assign to the pull request.
    #[arg(long, env = "INPUT_ASSIGNEES", default_value = "")]
    pub assignees: String,

    /// Users to request a review from.
    #[arg(long, env = "INPUT_REVIEWERS", default_value = "")]
    pub reviewers: String,

    /// Teams to request a review from.
    #[arg(long, env = "INPUT_TEAM_REVIEWERS", default_value = "")]
    pub team_reviewers: String,

    /// Where target repositories are cloned. Defaults to `tmp-<millis>`.
    #[arg(long, value_name = "DIR", env = "INPUT_TMP_DIR")]
    pub tmp_dir: Option<PathBuf>,

    /// Copy files but do not commit, push or open pull requests.
    #[arg(long, env = "INPUT_DRY_RUN", value_name = "BOOL", value_parser = parse_bool, num_args = 0..=1, default_value = "false", default_missing_value = "true", action = ArgAction::Set)]
    pub dry_run: bool,

    /// Keep the clone directory after the run.
    #[arg(long, env = "INPUT_SKIP_CLEANUP", value_name = "BOOL", value_parser = parse_bool, num_args = 0..=1, default_value = "false", default_missing_value = "true", action = ArgAction::Set)]
    pub skip_cleanup: bool,

    /// Update an open sync pull request instead of opening a new one.
    #[arg(long, env = "INPUT_OVERWRITE_EXISTING_PR", value_name = "BOOL", value_parser = parse_bool, num_args = 0..=1, default_value = "true", default_missing_value = "true", action = ArgAction::Set)]
    pub overwrite_existing_pr: bool,

    /// Push straight to the target branch without a pull request.
    #[arg(long, env = "INPUT_SKIP_PR", value_name = "BOOL", value_parser = parse_bool, num_args = 0..=1, default_value = "false", default_missing_value = "true", action = ArgAction::Set)]
    pub skip_pr: bool,

    /// Reuse the triggering commit message when a single commit was pushed.
    #[arg(long, env = "INPUT_ORIGINAL_MESSAGE", value_name = "BOOL", value_parser = parse_bool, num_args = 0..=1, default_value = "false", default_missing_value = "true", action = ArgAction::Set)]
    pub original_message: bool,

    /// Use the first line of the original commit message as PR title.
    #[arg(long, env = "INPUT_COMMIT_AS_PR_TITLE", value_name = "BOOL", value_parser = parse_bool, num_args = 0..=1, default_value = "false", default_missing_value = "true", action = ArgAction::Set)]
    pub commit_as_pr_title: bool,

    /// Prefix of the sync branch. `SOURCE_REPO_NAME` is replaced.
    #[arg(long, env = "INPUT_BRANCH_PREFIX", default_value = settings::DEFAULT_BRANCH_PREFIX)]
    pub branch_prefix: String,

    /// Open pull requests from this account's fork. `false` disables.
    #[arg(long, env = "INPUT_FORK")]
    pub fork: Option<String>,

    /// Workflow run id, linked from the pull request body.
    #[arg(long, env = "GITHUB_RUN_ID")]
    pub run_id: Option<String>,
}

impl SyncArgs {
    /// Turns the parsed arguments into run settings.
    pub fn into_settings(self, credentials: Credentials) -> SyncSettings {
        let mut settings = SyncSettings::new(credentials, self.repository);
        settings.server_url = self.server_url;
        settings.config_path = self.config;
        settings.git_email = settings::parse_disableable(self.git_email);
        settings.git_username = settings::parse_disableable(self.git_username);
        settings.commit_prefix = self.commit_prefix;
        settings.commit_body = self.commit_body;
        settings.commit_each_file = self.commit_each_file;
        settings.pr_labels = settings::parse_list(&self.pr_labels);
        settings.pr_body = self.pr_body;
        settings.assignees = settings::parse_list(&self.assignees);
        settings.reviewers = settings::parse_list(&self.reviewers);
        settings.team_reviewers = settings::parse_list(&self.team_reviewers);
        settings.tmp_dir = settings::unique_tmp_dir(self.tmp_dir);
        settings.dry_run = self.dry_run;
        settings.skip_cleanup = self.skip_cleanup;
        settings.overwrite_existing_pr = self.overwrite_existing_pr;
        settings.skip_pr = self.skip_pr;
        settings.original_message = self.original_message;
        settings.commit_as_pr_title = self.commit_as_pr_title;
        settings.branch_prefix = self.branch_prefix;
        settings.fork = settings::parse_disableable(self.fork);
        settings.run_id = self.run_id.filter(|id| !id.is_empty());
        settings
    }
}

/// Execute the `sync` command.
pub fn execute(args: SyncArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let credentials =
        Credentials::from_inputs(args.gh_pat.clone(), args.gh_installation_token.clone())?;
    if in_github_actions() {
        println!("::add-mask::{}", credentials.token());
    }
    if credentials.is_installation_token() {
        debug!("Using the GitHub App installation token");
    } else {
        debug!("Using the personal access token");
    }

    let source_root = args.source_root.clone();
    let settings = args.into_settings(credentials);

    let targets = config::from_file(&settings.config_path, &settings.server_url)?;
    info!(
        "Found {} target(s) in {}",
        targets.len(),
        settings.config_path.display()
    );

    let event = PushEvent::from_env().unwrap_or_else(|e| {
        warn!("Could not read the triggering event: {}", e);
        PushEvent::default()
    });
    let git = GitRepository::new(&settings, event);
    let github = GitHubClient::new(settings.api_url(), settings.credentials.token());

    let report = SyncOrchestrator::new(&settings, Box::new(git), Box::new(github))
        .with_source_root(source_root)
        .run(&targets);

    if !report.pr_urls.is_empty() {
        if let Some(path) = std::env::var_os("GITHUB_OUTPUT") {
            write_output(Path::new(&path), &report.pr_urls)?;
        }
    }

    println!("{}", render_summary(&out, &report));
    Ok(())
}

/// Appends `pull_request_urls=<json array>` to the Actions output file.
fn write_output(path: &Path, pr_urls: &[String]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open GITHUB_OUTPUT file {}", path.display()))?;
    writeln!(file, "pull_request_urls={}", serde_json::to_string(pr_urls)?)?;
    Ok(())
}
