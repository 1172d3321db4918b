//! # Collaborator Interfaces
//!
//! The sync orchestrator never shells out or talks HTTP itself. Everything it
//! needs from the outside world goes through two traits:
//!
//! - **`GitOperations`**: one local working copy per target. Cloning,
//!   branching, staging, diff detection, committing and pushing.
//!
//! - **`PullRequestOperations`**: the code-hosting side. Finding, creating
//!   and updating pull requests, and attaching labels, assignees and
//!   reviewers.
//!
//! In the binary, `git::GitRepository` and `github::GitHubClient` implement
//! these traits. In tests they are replaced with fakes so the orchestrator can
//! be driven without a network or a `git` executable.

use crate::error::Result;
use crate::repo::RepoIdentity;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Trait for version-control operations on a target working copy.
///
/// An implementation holds the state of the *current* target: `init_repo`
/// replaces it, and every other method acts on the working copy it created.
pub trait GitOperations: Send + Sync {
    /// Clones `repo` into a fresh working directory and returns its path.
    fn init_repo(&mut self, repo: &RepoIdentity) -> Result<PathBuf>;

    /// The branch checked out by `init_repo`.
    fn base_branch(&self) -> &str;

    /// Creates and checks out the sync branch, returning its name.
    fn create_pr_branch(&mut self, prefix: &str) -> Result<String>;

    /// Stages a path relative to the working directory.
    fn add(&self, path: &str) -> Result<()>;

    /// Whether anything is staged or untracked.
    fn has_changes(&self) -> Result<bool>;

    /// Raw `git status` output, for logging.
    fn status(&self) -> Result<String>;

    /// Porcelain status code per changed path.
    fn file_statuses(&self) -> Result<HashMap<String, String>>;

    /// Commits everything staged with the given message.
    fn commit(&self, message: &str) -> Result<()>;

    /// Pushes the sync branch, or the base branch when no PR is used.
    fn push(&self) -> Result<()>;

    /// Whether the triggering event pushed exactly one commit.
    fn is_one_commit_push(&self) -> bool;

    /// Message of the triggering commit, when there is exactly one.
    fn original_commit_message(&self) -> Option<String>;
}

/// An open pull request on a target repository.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
    #[serde(default)]
    pub body: Option<String>,
}

/// What to create or update a pull request with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestDraft {
    pub title: String,
    pub body: String,
    /// `owner:branch`
    pub head: String,
    pub base: String,
}

/// Trait for pull-request operations on the code-hosting platform.
pub trait PullRequestOperations: Send + Sync {
    /// Finds an open pull request from `head` (`owner:branch`).
    fn find_existing_pr(&self, repo: &RepoIdentity, head: &str) -> Result<Option<PullRequest>>;

    /// Puts the resync banner on an existing pull request.
    fn set_pr_warning(&self, repo: &RepoIdentity, pr: &PullRequest) -> Result<()>;

    /// Takes the resync banner off again.
    fn remove_pr_warning(&self, repo: &RepoIdentity, pr: &PullRequest) -> Result<()>;

    /// Updates `existing` if given, otherwise opens a new pull request.
    fn create_or_update_pr(
        &self,
        repo: &RepoIdentity,
        draft: &PullRequestDraft,
        existing: Option<&PullRequest>,
    ) -> Result<PullRequest>;

    fn add_labels(&self, repo: &RepoIdentity, pr: &PullRequest, labels: &[String]) -> Result<()>;

    fn add_assignees(&self, repo: &RepoIdentity, pr: &PullRequest, assignees: &[String])
        -> Result<()>;

    fn add_reviewers(&self, repo: &RepoIdentity, pr: &PullRequest, reviewers: &[String])
        -> Result<()>;

    fn add_team_reviewers(&self, repo: &RepoIdentity, pr: &PullRequest, teams: &[String])
        -> Result<()>;
}
