//! Commit messages and pull-request text.
//!
//! Two modes exist for commit messages. Normally a message is synthesized
//! from the file being synced. When original-message passthrough is active
//! (the option is on *and* the triggering push carried exactly one commit),
//! that commit's message is reused verbatim instead.

use crate::config::FileSpec;
use crate::settings::SyncSettings;
use std::fmt;

/// Banner put on an open PR while it is being resynced.
pub const RESYNC_WARNING: &str = "⚠️ This PR is being automatically resynced ⚠️";

/// How a synced path changed, derived from `git status --porcelain` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileChange {
    Created,
    Updated,
    Deleted,
    Unchanged,
}

impl FileChange {
    /// Classifies a two-letter porcelain status. Later rules win, so `AM`
    /// counts as updated.
    pub fn from_mode(mode: &str) -> Self {
        let mut change = FileChange::Unchanged;
        if mode.contains('A') || mode.contains('?') {
            change = FileChange::Created;
        }
        if mode.contains('M') {
            change = FileChange::Updated;
        }
        if mode.contains('D') {
            change = FileChange::Deleted;
        }
        change
    }
}

impl fmt::Display for FileChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileChange::Created => "created",
            FileChange::Updated => "updated",
            FileChange::Deleted => "deleted",
            FileChange::Unchanged => "unchanged",
        })
    }
}

/// Commit message plus PR fragment for one synced file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncMessage {
    pub commit: String,
    pub pr: String,
}

/// A change that made it into a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifiedFile {
    pub dest: String,
    pub source: Option<String>,
    /// PR fragment, only present for per-file commits.
    pub message: Option<String>,
    /// `None` when the default message was used.
    pub commit_message: Option<String>,
}

/// Builds every piece of text a sync run writes.
#[derive(Debug, Clone)]
pub struct MessageComposer<'a> {
    settings: &'a SyncSettings,
    original_message: Option<String>,
}

impl<'a> MessageComposer<'a> {
    /// `original_message` must only be set when passthrough is active.
    pub fn new(settings: &'a SyncSettings, original_message: Option<String>) -> Self {
        Self {
            settings,
            original_message,
        }
    }

    pub fn original_message(&self) -> Option<&str> {
        self.original_message.as_deref()
    }

    /// Commit message for one file.
    pub fn commit_message(&self, spec: &FileSpec, dest_existed: bool) -> String {
        if let Some(original) = &self.original_message {
            return original.clone();
        }
        let prefix = &self.settings.commit_prefix;
        if dest_existed {
            format!(
                "{} synced local '{}' with remote '{}'",
                prefix, spec.dest, spec.source
            )
        } else {
            format!(
                "{} created local '{}' from remote '{}'",
                prefix, spec.dest, spec.source
            )
        }
    }

    /// Commit message and PR fragment for one file.
    ///
    /// `details` pairs each synced path (already made relative for display)
    /// with how it changed.
    pub fn file_message(
        &self,
        spec: &FileSpec,
        dest_existed: bool,
        is_directory: bool,
        details: &[(String, FileChange)],
    ) -> SyncMessage {
        let kind = if is_directory { "directory" } else { "file" };
        let lines: Vec<String> = details
            .iter()
            .map(|(path, change)| format!("`{}` - {}", path, change))
            .collect();

        SyncMessage {
            commit: self.commit_message(spec, dest_existed),
            pr: format!(
                "From remote {} <code>{}</code>, synced the following files:\n\n{}",
                kind,
                spec.source,
                lines.join("\n")
            ),
        }
    }

    /// Message for a commit covering everything left in the working tree.
    pub fn default_commit_message(&self) -> String {
        format!(
            "{} synced file(s) with {}",
            self.settings.commit_prefix, self.settings.source_repository
        )
    }

    /// Applies the configured commit body to a message.
    pub fn finalize_commit_message(&self, message: Option<&str>) -> String {
        let message = message
            .map(str::to_string)
            .unwrap_or_else(|| self.default_commit_message());
        if self.settings.commit_body.is_empty() {
            message
        } else {
            format!("{}\n\n{}", message, self.settings.commit_body)
        }
    }

    /// Title for a new PR.
    pub fn pr_title(&self) -> String {
        if self.settings.commit_as_pr_title {
            if let Some(original) = &self.original_message {
                let first_line = original.lines().next().unwrap_or_default().trim();
                if !first_line.is_empty() {
                    return first_line.to_string();
                }
            }
        }
        self.default_commit_message()
    }

    /// Collapsible list of per-file PR fragments.
    pub fn changed_files_block(&self, modified: &[ModifiedFile]) -> String {
        let items: String = modified
            .iter()
            .filter_map(|file| file.message.as_ref())
            .map(|message| format!("<li>{}</li>", message))
            .collect();
        format!(
            "<details>\n<summary>Changed files</summary>\n<ul>\n{}\n</ul>\n</details>",
            items
        )
    }

    /// Full PR body around an optional changed-files block.
    pub fn pr_body(&self, changed_files: &str) -> String {
        let settings = self.settings;
        let mut sections = vec![format!(
            "synced local file(s) with [{}]({}).",
            settings.source_repository,
            settings.source_repository_url()
        )];
        if !settings.pr_body.is_empty() {
            sections.push(settings.pr_body.clone());
        }
        if !changed_files.is_empty() {
            sections.push(changed_files.to_string());
        }

        let footer = match &settings.run_id {
            Some(run_id) => format!(
                "This PR was created automatically by the repo-file-sync workflow run [#{}]({}/actions/runs/{})",
                run_id,
                settings.source_repository_url(),
                run_id
            ),
            None => "This PR was created automatically by repo-file-sync".to_string(),
        };
        sections.push(format!("---\n\n{}", footer));

        sections.join("\n\n")
    }
}

/// Prepends the resync banner unless it is already there.
pub fn with_resync_warning(body: &str) -> String {
    if body.contains(RESYNC_WARNING) {
        return body.to_string();
    }
    format!("{}\n\n{}", RESYNC_WARNING, body)
}

/// Strips the resync banner again.
pub fn without_resync_warning(body: &str) -> String {
    body.replace(&format!("{}\n\n", RESYNC_WARNING), "")
        .replace(RESYNC_WARNING, "")
}
