//! # Sync Orchestration
//!
//! [`SyncOrchestrator`] works through the resolved targets one at a time.
//! For each target it runs a small state machine:
//!
//! ```text
//! Init -> BranchReady -> FileLoop -> DryRunCheck -> FinalCommit -> Decision -> Push -> PrManage
//!                                        |                            |
//!                                      DryRun                      Skipped
//! ```
//!
//! Each state is advanced by its own method and returns either the next
//! state or a terminal [`SyncOutcome`]. An error in any state ends the
//! target as [`SyncOutcome::Failed`]; the batch always moves on to the next
//! target.
//!
//! All I/O goes through the [`GitOperations`] and [`PullRequestOperations`]
//! collaborators and the [`filesystem`](crate::filesystem) primitives.

use crate::config::{FileSpec, RepoTarget};
use crate::error::Result;
use crate::filesystem::{self, CopyReport};
use crate::message::{FileChange, MessageComposer, ModifiedFile};
use crate::repo::RepoIdentity;
use crate::repository::{GitOperations, PullRequest, PullRequestDraft, PullRequestOperations};
use crate::settings::SyncSettings;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Where a target currently is in its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Init,
    BranchReady,
    FileLoop,
    DryRunCheck,
    FinalCommit,
    Decision,
    Push,
    PrManage,
}

/// How a target ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Changes were pushed. `pr_url` is set unless PRs are skipped.
    Done { pr_url: Option<String> },
    /// Nothing differed from the target.
    Skipped,
    /// Files were copied but nothing was committed or pushed.
    DryRun,
    Failed { error: String },
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Done { pr_url: Some(url) } => write!(f, "synced ({})", url),
            SyncOutcome::Done { pr_url: None } => f.write_str("synced"),
            SyncOutcome::Skipped => f.write_str("up to date"),
            SyncOutcome::DryRun => f.write_str("dry run"),
            SyncOutcome::Failed { error } => write!(f, "failed: {}", error),
        }
    }
}

/// Result of a single state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Next(SyncState),
    Finish(SyncOutcome),
}

/// Transient state for one target.
#[derive(Debug)]
pub struct SyncSession<'t> {
    pub target: &'t RepoTarget,
    pub working_dir: PathBuf,
    pub pr_branch: Option<String>,
    pub existing_pr: Option<PullRequest>,
    /// Whether the resync banner was put on `existing_pr`.
    pub warning_set: bool,
    pub modified: Vec<ModifiedFile>,
    /// Set only when original-message passthrough is active.
    pub original_message: Option<String>,
}

impl<'t> SyncSession<'t> {
    pub fn new(target: &'t RepoTarget) -> Self {
        Self {
            target,
            working_dir: PathBuf::new(),
            pr_branch: None,
            existing_pr: None,
            warning_set: false,
            modified: Vec::new(),
            original_message: None,
        }
    }

    pub fn repo(&self) -> &'t RepoIdentity {
        &self.target.repo
    }
}

/// Outcome of one target in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    pub repo: RepoIdentity,
    pub outcome: SyncOutcome,
}

/// Everything a batch run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub targets: Vec<TargetReport>,
    pub pr_urls: Vec<String>,
}

impl SyncReport {
    pub fn failed(&self) -> usize {
        self.targets
            .iter()
            .filter(|t| matches!(t.outcome, SyncOutcome::Failed { .. }))
            .count()
    }
}

/// Drives every target through the sync pipeline.
pub struct SyncOrchestrator<'a> {
    settings: &'a SyncSettings,
    source_root: PathBuf,
    git: Box<dyn GitOperations>,
    pull_requests: Box<dyn PullRequestOperations>,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(
        settings: &'a SyncSettings,
        git: Box<dyn GitOperations>,
        pull_requests: Box<dyn PullRequestOperations>,
    ) -> Self {
        Self {
            settings,
            source_root: PathBuf::from("."),
            git,
            pull_requests,
        }
    }

    /// Directory that `source` paths are resolved against.
    pub fn with_source_root(mut self, source_root: impl Into<PathBuf>) -> Self {
        self.source_root = source_root.into();
        self
    }

    /// Syncs every target in order, then cleans up the temporary directory.
    pub fn run(&mut self, targets: &[RepoTarget]) -> SyncReport {
        let mut report = SyncReport::default();

        for target in targets {
            let outcome = self.process(target);
            if let SyncOutcome::Done {
                pr_url: Some(url),
            } = &outcome
            {
                report.pr_urls.push(url.clone());
            }
            report.targets.push(TargetReport {
                repo: target.repo.clone(),
                outcome,
            });
        }

        self.cleanup();
        report
    }

    /// Runs the pipeline for one target.
    pub fn process(&mut self, target: &RepoTarget) -> SyncOutcome {
        let mut session = SyncSession::new(target);
        let mut state = SyncState::Init;

        loop {
            match self.advance(state, &mut session) {
                Ok(Step::Next(next)) => {
                    debug!("{}: {:?} -> {:?}", target.repo, state, next);
                    state = next;
                }
                Ok(Step::Finish(outcome)) => {
                    debug!("{}: {:?} -> {:?}", target.repo, state, outcome);
                    return outcome;
                }
                Err(e) => {
                    error!("{}: {}", target.repo, e);
                    return SyncOutcome::Failed {
                        error: e.to_string(),
                    };
                }
            }
        }
    }

    /// Runs a single state.
    pub fn advance(&mut self, state: SyncState, session: &mut SyncSession<'_>) -> Result<Step> {
        match state {
            SyncState::Init => self.init(session),
            SyncState::BranchReady => self.branch_ready(session),
            SyncState::FileLoop => self.file_loop(session),
            SyncState::DryRunCheck => self.dry_run_check(),
            SyncState::FinalCommit => self.final_commit(session),
            SyncState::Decision => self.decision(session),
            SyncState::Push => self.push(),
            SyncState::PrManage => self.pr_manage(session),
        }
    }

    fn composer(&self, session: &SyncSession<'_>) -> MessageComposer<'a> {
        MessageComposer::new(self.settings, session.original_message.clone())
    }

    /// `owner:branch` of the sync branch, pointing at the fork when set.
    fn head(&self, session: &SyncSession<'_>) -> String {
        let owner = self
            .settings
            .fork
            .as_deref()
            .unwrap_or(&session.repo().user);
        format!(
            "{}:{}",
            owner,
            session.pr_branch.as_deref().unwrap_or_default()
        )
    }

    fn init(&mut self, session: &mut SyncSession<'_>) -> Result<Step> {
        let repo = session.repo();
        info!("Repository Info");
        info!("Slug\t\t: {}", repo.name);
        info!("Owner\t\t: {}", repo.user);
        info!("Https Url\t: https://{}", repo.full_name());
        info!("Branch\t\t: {}", repo.branch);

        session.working_dir = self.git.init_repo(repo)?;

        if self.settings.original_message && self.git.is_one_commit_push() {
            session.original_message = self.git.original_commit_message();
        }

        Ok(Step::Next(SyncState::BranchReady))
    }

    fn branch_ready(&mut self, session: &mut SyncSession<'_>) -> Result<Step> {
        if self.settings.skip_pr {
            return Ok(Step::Next(SyncState::FileLoop));
        }

        let prefix = self.settings.resolved_branch_prefix();
        session.pr_branch = Some(self.git.create_pr_branch(&prefix)?);

        if self.settings.overwrite_existing_pr {
            session.existing_pr = self
                .pull_requests
                .find_existing_pr(session.repo(), &self.head(session))?;

            if let Some(pr) = &session.existing_pr {
                info!("Found existing PR #{}: {}", pr.number, pr.html_url);
                if !self.settings.dry_run {
                    match self.pull_requests.set_pr_warning(session.repo(), pr) {
                        Ok(()) => session.warning_set = true,
                        Err(e) => warn!("Failed to set resync warning on PR #{}: {}", pr.number, e),
                    }
                }
            }
        }

        Ok(Step::Next(SyncState::FileLoop))
    }

    fn file_loop(&mut self, session: &mut SyncSession<'_>) -> Result<Step> {
        let target = session.target;
        for spec in &target.files {
            self.sync_file(session, spec)?;
        }
        Ok(Step::Next(SyncState::DryRunCheck))
    }

    fn sync_file(&mut self, session: &mut SyncSession<'_>, spec: &FileSpec) -> Result<()> {
        let source = self.source_root.join(&spec.source);
        let dest = session.working_dir.join(&spec.dest);

        if !filesystem::exists(&source) {
            warn!("Source {} not found", spec.source);
            return Ok(());
        }

        let dest_existed = filesystem::exists(&dest);
        if dest_existed && !spec.replace {
            warn!(
                "File(s) already exist(s) in destination and 'replace' option is set to false: {}",
                spec.dest
            );
            return Ok(());
        }

        // exclude entries are relative to the working directory, like source
        let rooted = FileSpec {
            exclude: spec
                .exclude
                .iter()
                .map(|path| self.source_root.join(path))
                .collect(),
            ..spec.clone()
        };
        let is_directory = filesystem::is_directory(&source)?;
        let report = filesystem::copy(&source, &dest, is_directory, &rooted)?;
        debug!(
            "Copied {} to {}: {} written, {} removed",
            spec.source,
            spec.dest,
            report.written.len(),
            report.removed.len()
        );

        self.git.add(&spec.dest)?;

        if !self.settings.commit_each_file || self.settings.dry_run {
            return Ok(());
        }

        if !self.git.has_changes()? {
            debug!("File(s) already up to date: {}", spec.dest);
            return Ok(());
        }

        let statuses = self.git.file_statuses()?;
        let details = change_details(&spec.dest, is_directory, &report, &statuses);
        let composer = self.composer(session);
        let message = composer.file_message(spec, dest_existed, is_directory, &details);

        self.git
            .commit(&composer.finalize_commit_message(Some(&message.commit)))?;
        session.modified.push(ModifiedFile {
            dest: spec.dest.clone(),
            source: Some(spec.source.clone()),
            message: Some(message.pr),
            commit_message: Some(message.commit),
        });
        Ok(())
    }

    fn dry_run_check(&mut self) -> Result<Step> {
        if !self.settings.dry_run {
            return Ok(Step::Next(SyncState::FinalCommit));
        }
        warn!("Dry run, no changes will be pushed");
        debug!("Git Status:\n{}", self.git.status()?);
        Ok(Step::Finish(SyncOutcome::DryRun))
    }

    fn final_commit(&mut self, session: &mut SyncSession<'_>) -> Result<Step> {
        if self.git.has_changes()? {
            let composer = self.composer(session);
            let message = composer.original_message().map(str::to_string);
            self.git
                .commit(&composer.finalize_commit_message(message.as_deref()))?;
            session.modified.push(ModifiedFile {
                dest: session.working_dir.display().to_string(),
                source: None,
                message: None,
                commit_message: message,
            });
        }
        Ok(Step::Next(SyncState::Decision))
    }

    fn decision(&mut self, session: &mut SyncSession<'_>) -> Result<Step> {
        if !session.modified.is_empty() {
            return Ok(Step::Next(SyncState::Push));
        }

        info!("File(s) already up to date");
        if session.warning_set {
            if let Some(pr) = &session.existing_pr {
                if let Err(e) = self.pull_requests.remove_pr_warning(session.repo(), pr) {
                    warn!("Failed to remove resync warning from PR #{}: {}", pr.number, e);
                }
            }
        }
        Ok(Step::Finish(SyncOutcome::Skipped))
    }

    fn push(&mut self) -> Result<Step> {
        self.git.push()?;
        if self.settings.skip_pr {
            info!("Skipping PR creation, changes pushed to {}", self.git.base_branch());
            return Ok(Step::Finish(SyncOutcome::Done { pr_url: None }));
        }
        Ok(Step::Next(SyncState::PrManage))
    }

    fn pr_manage(&mut self, session: &mut SyncSession<'_>) -> Result<Step> {
        let composer = self.composer(session);
        let changed_files = if self.settings.commit_each_file {
            composer.changed_files_block(&session.modified)
        } else {
            String::new()
        };

        let draft = PullRequestDraft {
            title: composer.pr_title(),
            body: composer.pr_body(&changed_files),
            head: self.head(session),
            base: self.git.base_branch().to_string(),
        };

        let repo = session.repo();
        let pr = self
            .pull_requests
            .create_or_update_pr(repo, &draft, session.existing_pr.as_ref())?;
        info!("Pull Request #{} created/updated: {}", pr.number, pr.html_url);

        if self.settings.fork.is_some() {
            debug!("Fork mode, not attaching labels, assignees or reviewers");
        } else {
            self.attach_metadata(repo, &pr);
        }

        Ok(Step::Finish(SyncOutcome::Done {
            pr_url: Some(pr.html_url),
        }))
    }

    /// Labels, assignees and reviewers. Each is independent and best-effort.
    fn attach_metadata(&self, repo: &RepoIdentity, pr: &PullRequest) {
        let settings = self.settings;
        let prs = &self.pull_requests;

        if !settings.pr_labels.is_empty() {
            debug!("Adding label(s) \"{}\" to PR", settings.pr_labels.join(", "));
            best_effort("add labels", prs.add_labels(repo, pr, &settings.pr_labels));
        }
        if !settings.assignees.is_empty() {
            debug!("Adding assignee(s) \"{}\" to PR", settings.assignees.join(", "));
            best_effort(
                "add assignees",
                prs.add_assignees(repo, pr, &settings.assignees),
            );
        }
        if !settings.reviewers.is_empty() {
            debug!("Adding reviewer(s) \"{}\" to PR", settings.reviewers.join(", "));
            best_effort(
                "add reviewers",
                prs.add_reviewers(repo, pr, &settings.reviewers),
            );
        }
        if !settings.team_reviewers.is_empty() {
            debug!(
                "Adding team reviewer(s) \"{}\" to PR",
                settings.team_reviewers.join(", ")
            );
            best_effort(
                "add team reviewers",
                prs.add_team_reviewers(repo, pr, &settings.team_reviewers),
            );
        }
    }

    fn cleanup(&self) {
        let tmp_dir = &self.settings.tmp_dir;
        if self.settings.skip_cleanup {
            info!("Skipping cleanup of {}", tmp_dir.display());
            return;
        }
        debug!("Cleaning up {}", tmp_dir.display());
        if let Err(e) = filesystem::remove(tmp_dir) {
            warn!("Failed to clean up {}: {}", tmp_dir.display(), e);
        }
    }
}

fn best_effort(action: &str, result: Result<()>) {
    if let Err(e) = result {
        warn!("Failed to {}: {}", action, e);
    }
}

/// Pairs every path a copy touched with how it changed in the working tree.
///
/// Written paths without a status entry are unchanged; removed paths without
/// one are deleted. Directory entries are shown relative to `dest`, a single
/// file by its basename.
fn change_details(
    dest: &str,
    is_directory: bool,
    report: &CopyReport,
    statuses: &HashMap<String, String>,
) -> Vec<(String, FileChange)> {
    let dest = dest.trim_start_matches("./").trim_end_matches('/');
    let root = if dest == "." { "" } else { dest };
    let repo_path = |relative: &str| {
        if !is_directory {
            root.to_string()
        } else if root.is_empty() {
            relative.to_string()
        } else {
            format!("{}/{}", root, relative)
        }
    };

    let written = report
        .written
        .iter()
        .map(|path| (path, FileChange::Unchanged));
    let removed = report
        .removed
        .iter()
        .map(|path| (path, FileChange::Deleted));

    let mut details: Vec<(String, FileChange)> = written
        .chain(removed)
        .map(|(path, fallback)| {
            let relative = path.to_string_lossy().replace('\\', "/");
            let change = statuses
                .get(&repo_path(&relative))
                .map(|mode| FileChange::from_mode(mode))
                .unwrap_or(fallback);
            (relative, change)
        })
        .collect();
    details.sort();
    details.dedup();
    details
}
