//! Run-wide settings.
//!
//! Everything that influences a sync run lives in [`SyncSettings`], built
//! once by the CLI and handed by reference to the collaborators and the
//! orchestrator.

use crate::error::{Error, Result};
use log::warn;
use std::fmt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

pub const DEFAULT_SERVER_URL: &str = "https://github.com";
pub const DEFAULT_CONFIG_PATH: &str = ".github/sync.yml";
pub const DEFAULT_COMMIT_PREFIX: &str = "🔄";
pub const DEFAULT_BRANCH_PREFIX: &str = "repo-sync/SOURCE_REPO_NAME";
pub const DEFAULT_PR_LABEL: &str = "sync";
pub const SOURCE_REPO_NAME_PLACEHOLDER: &str = "SOURCE_REPO_NAME";

/// The token used for git and API access.
#[derive(Clone)]
pub enum Credentials {
    /// A personal access token (`GH_PAT`).
    PersonalToken(String),
    /// A GitHub App installation token (`GH_INSTALLATION_TOKEN`).
    InstallationToken(String),
}

impl Credentials {
    /// Picks the personal token first, then the installation token.
    pub fn from_inputs(pat: Option<String>, installation: Option<String>) -> Result<Self> {
        let non_empty = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
        match (non_empty(pat), non_empty(installation)) {
            (Some(token), _) => Ok(Self::PersonalToken(token)),
            (None, Some(token)) => Ok(Self::InstallationToken(token)),
            (None, None) => Err(Error::MissingCredentials),
        }
    }

    pub fn token(&self) -> &str {
        match self {
            Self::PersonalToken(token) | Self::InstallationToken(token) => token,
        }
    }

    pub fn is_installation_token(&self) -> bool {
        matches!(self, Self::InstallationToken(_))
    }

    /// The userinfo part of an authenticated https remote.
    pub fn git_userinfo(&self) -> String {
        match self {
            Self::PersonalToken(token) => token.clone(),
            Self::InstallationToken(token) => format!("x-access-token:{}", token),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PersonalToken(_) => f.write_str("PersonalToken(***)"),
            Self::InstallationToken(_) => f.write_str("InstallationToken(***)"),
        }
    }
}

/// Settings for one sync run.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub credentials: Credentials,
    pub server_url: String,
    /// The hub repository, `owner/name`.
    pub source_repository: String,
    pub config_path: PathBuf,
    pub git_email: Option<String>,
    pub git_username: Option<String>,
    pub commit_prefix: String,
    pub commit_body: String,
    pub commit_each_file: bool,
    pub pr_labels: Vec<String>,
    pub pr_body: String,
    pub assignees: Vec<String>,
    pub reviewers: Vec<String>,
    pub team_reviewers: Vec<String>,
    pub tmp_dir: PathBuf,
    pub dry_run: bool,
    pub skip_cleanup: bool,
    pub overwrite_existing_pr: bool,
    pub skip_pr: bool,
    pub original_message: bool,
    pub commit_as_pr_title: bool,
    pub branch_prefix: String,
    /// Account owning the fork PRs are opened from.
    pub fork: Option<String>,
    /// Workflow run that triggered the sync, for the PR footer.
    pub run_id: Option<String>,
}

impl SyncSettings {
    /// Settings with every option at its default.
    pub fn new(credentials: Credentials, source_repository: impl Into<String>) -> Self {
        Self {
            credentials,
            server_url: DEFAULT_SERVER_URL.to_string(),
            source_repository: source_repository.into(),
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            git_email: None,
            git_username: None,
            commit_prefix: DEFAULT_COMMIT_PREFIX.to_string(),
            commit_body: String::new(),
            commit_each_file: true,
            pr_labels: vec![DEFAULT_PR_LABEL.to_string()],
            pr_body: String::new(),
            assignees: Vec::new(),
            reviewers: Vec::new(),
            team_reviewers: Vec::new(),
            tmp_dir: unique_tmp_dir(None),
            dry_run: false,
            skip_cleanup: false,
            overwrite_existing_pr: true,
            skip_pr: false,
            original_message: false,
            commit_as_pr_title: false,
            branch_prefix: DEFAULT_BRANCH_PREFIX.to_string(),
            fork: None,
            run_id: None,
        }
    }

    /// Name of the hub repository without its owner.
    pub fn source_repo_name(&self) -> &str {
        self.source_repository
            .split_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.source_repository)
    }

    /// The branch prefix with the source repository name filled in.
    pub fn resolved_branch_prefix(&self) -> String {
        self.branch_prefix
            .replace(SOURCE_REPO_NAME_PLACEHOLDER, self.source_repo_name())
    }

    /// Base URL of the REST API belonging to `server_url`.
    pub fn api_url(&self) -> String {
        let server = self.server_url.trim_end_matches('/');
        if server == DEFAULT_SERVER_URL {
            "https://api.github.com".to_string()
        } else {
            format!("{}/api/v3", server)
        }
    }

    /// Browser URL of the hub repository.
    pub fn source_repository_url(&self) -> String {
        format!(
            "{}/{}",
            self.server_url.trim_end_matches('/'),
            self.source_repository
        )
    }
}

/// Parses a list input, split on commas and newlines.
///
/// `"false"` disables a list that otherwise has a default.
pub fn parse_list(raw: &str) -> Vec<String> {
    if raw.trim().eq_ignore_ascii_case("false") {
        return Vec::new();
    }
    raw.split(['\n', ','])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses an optional input that `"false"` switches off.
pub fn parse_disableable(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("false"))
}

/// Picks a temporary directory that does not exist yet.
pub fn unique_tmp_dir(requested: Option<PathBuf>) -> PathBuf {
    let mut dir = requested.unwrap_or_else(timestamped_tmp_dir);
    while dir.exists() {
        let next = timestamped_tmp_dir();
        warn!(
            "TEMP_DIR {} already exists. Using \"{}\" now.",
            dir.display(),
            next.display()
        );
        if next == dir {
            // same millisecond, wait for the clock to move
            std::thread::sleep(std::time::Duration::from_millis(1));
            continue;
        }
        dir = next;
    }
    dir
}

fn timestamped_tmp_dir() -> PathBuf {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    PathBuf::from(format!("tmp-{}", millis))
}
