//! The workflow event that triggered a sync.
//!
//! GitHub Actions exposes the event name in `GITHUB_EVENT_NAME` and the full
//! webhook payload as a JSON file at `GITHUB_EVENT_PATH`. Only push events
//! are interesting here: they carry the commits whose message may be reused.

use crate::error::Result;
use log::debug;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PushCommit {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Payload {
    #[serde(default)]
    commits: Vec<PushCommit>,
}

/// The triggering event, reduced to what the sync needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushEvent {
    pub name: String,
    pub commits: Vec<PushCommit>,
}

impl PushEvent {
    pub fn new(name: impl Into<String>, commits: Vec<PushCommit>) -> Self {
        Self {
            name: name.into(),
            commits,
        }
    }

    /// Reads the event from the Actions environment.
    ///
    /// Outside a workflow both variables are unset and an empty event is
    /// returned.
    pub fn from_env() -> Result<Self> {
        let name = std::env::var("GITHUB_EVENT_NAME").unwrap_or_default();
        match std::env::var("GITHUB_EVENT_PATH") {
            Ok(path) if !path.is_empty() => Self::from_file(name, Path::new(&path)),
            _ => Ok(Self::new(name, Vec::new())),
        }
    }

    /// Reads the payload at `path` for an event called `name`.
    pub fn from_file(name: impl Into<String>, path: &Path) -> Result<Self> {
        let name = name.into();
        let content = std::fs::read_to_string(path)?;
        let payload: Payload = serde_json::from_str(&content)?;
        debug!(
            "Loaded {} event with {} commit(s) from {}",
            name,
            payload.commits.len(),
            path.display()
        );
        Ok(Self::new(name, payload.commits))
    }

    pub fn is_push(&self) -> bool {
        self.name == "push"
    }

    pub fn is_one_commit_push(&self) -> bool {
        self.is_push() && self.commits.len() == 1
    }

    /// The message of the pushed commit, only for single-commit pushes.
    pub fn original_commit_message(&self) -> Option<String> {
        if !self.is_one_commit_push() {
            return None;
        }
        self.commits.first().map(|commit| commit.message.clone())
    }
}
