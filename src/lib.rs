//! # Repo File Sync Library
//!
//! This library keeps files in many target repositories in sync with a single
//! source ("hub") repository. It is designed to be used by the
//! `repo-file-sync` command-line tool, typically from a GitHub Actions
//! workflow in the hub repository.
//!
//! ## Quick Example
//!
//! ```
//! use repo_file_sync::config;
//!
//! let yaml = r#"
//! repo_groups:
//!   services: [octo/api, octo/worker]
//!
//! octo/website:
//!   - LICENSE
//!
//! group:
//!   repos: services
//!   files:
//!     - source: ci/
//!       dest: .github/workflows/
//! "#;
//!
//! let targets = config::parse(yaml, "https://github.com").unwrap();
//! assert_eq!(targets.len(), 3);
//! assert_eq!(targets[0].repo.unique_name(), "github.com/octo/website@default");
//! assert_eq!(targets[1].files[0].dest, ".github/workflows/");
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`)**: Resolves the sync configuration, including
//!   named repository groups, into a list of `RepoTarget`s.
//! - **Repository identities (`repo`)**: Parses `[url|]user/name[@branch]`.
//! - **Settings (`settings`)**: Every run-wide option, built once by the CLI.
//! - **Orchestration (`sync`)**: The per-target state machine that copies
//!   files, commits, pushes and manages the pull request.
//! - **Messages (`message`)**: Commit messages and pull-request text.
//! - **Collaborators (`repository`, `git`, `github`, `event`)**: The traits the
//!   orchestrator talks through and their real implementations.
//! - **Filesystem (`filesystem`)**: Copying files and directories into a
//!   working copy, with excludes, orphan deletion and templates.

pub mod config;
pub mod error;
pub mod event;
pub mod filesystem;
pub mod git;
pub mod github;
pub mod message;
pub mod output;
pub mod repo;
pub mod repository;
pub mod settings;
pub mod sync;

#[cfg(test)]
mod config_proptest;
