//! # Sync Configuration
//!
//! This module turns the sync configuration (by default `.github/sync.yml`)
//! into the list of [`RepoTarget`]s the orchestrator works through.
//!
//! ## Format
//!
//! The top level is a mapping. Three kinds of keys are understood:
//!
//! - **`repo_groups`**: named lists of repositories, referenced from group
//!   blocks. Never a sync target itself.
//! - **`group`**: one block or a list of blocks, each binding a `repos` value
//!   to a shared `files` list.
//! - **anything else**: the original flat syntax, where the key is a
//!   repository and the value its file list.
//!
//! ```yaml
//! repo_groups:
//!   services: [octo/api, octo/worker]
//!
//! octo/website:
//!   - LICENSE
//!
//! group:
//!   - repos: services
//!     files:
//!       - source: ci/
//!         dest: .github/workflows/
//! ```
//!
//! ## Merging
//!
//! Targets are keyed by [`RepoIdentity::unique_name`]. When the same target
//! shows up more than once, whether through both syntaxes, two groups, or a
//! repeated list entry, the later file lists are appended to the first one.
//! The resulting order is the order in which each target first appears.
//!
//! Malformed entries are reported with `log::warn!` and skipped so that one
//! bad block does not stop the rest of the fleet from syncing.

pub mod files;
pub mod groups;

pub use files::FileSpec;
pub use groups::RepoGroups;

use crate::error::{Error, Result};
use crate::repo::RepoIdentity;
use log::warn;
use serde::Serialize;
use serde_yaml::Value;
use std::collections::HashMap;
use std::path::Path;

const REPO_GROUPS_KEY: &str = "repo_groups";
const GROUP_KEY: &str = "group";

/// One repository (and branch) to sync, with everything it receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoTarget {
    pub repo: RepoIdentity,
    pub files: Vec<FileSpec>,
}

/// Reads and resolves a configuration file.
pub fn from_file(path: &Path, server_url: &str) -> Result<Vec<RepoTarget>> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::ConfigParse {
        message: format!("Cannot read configuration file {}: {}", path.display(), e),
        hint: Some("Set --config or INPUT_CONFIG_PATH to the sync configuration".to_string()),
    })?;
    parse(&content, server_url)
}

/// Parses and resolves a YAML configuration string.
pub fn parse(yaml_content: &str, server_url: &str) -> Result<Vec<RepoTarget>> {
    let document: Value = serde_yaml::from_str(yaml_content)?;
    resolve(&document, server_url)
}

/// Resolves an already-parsed configuration document.
pub fn resolve(config: &Value, server_url: &str) -> Result<Vec<RepoTarget>> {
    let root = match config {
        Value::Mapping(map) => map,
        Value::Null => {
            warn!("Configuration is empty, nothing to sync");
            return Ok(Vec::new());
        }
        other => {
            return Err(Error::ConfigParse {
                message: format!(
                    "Expected a mapping at the top level, got {}",
                    files::describe(other)
                ),
                hint: Some(
                    "Use 'user/repo: [files]' entries or a 'group:' block".to_string(),
                ),
            })
        }
    };

    let repo_groups = RepoGroups::from_value(root.get(REPO_GROUPS_KEY));
    let mut targets = TargetSet::new(server_url);

    for (key, value) in root {
        let Some(key) = key.as_str() else {
            warn!("Ignoring non-string configuration key {:?}", key);
            continue;
        };

        match key {
            REPO_GROUPS_KEY => {}
            GROUP_KEY => {
                let blocks: Vec<&Value> = match value {
                    Value::Sequence(blocks) => blocks.iter().collect(),
                    single => vec![single],
                };
                for block in blocks {
                    resolve_group_block(block, &repo_groups, &mut targets);
                }
            }
            repo => {
                let files = files::normalize_all(value);
                targets.add(repo, files);
            }
        }
    }

    Ok(targets.into_targets())
}

fn resolve_group_block(block: &Value, repo_groups: &RepoGroups, targets: &mut TargetSet) {
    let Value::Mapping(block) = block else {
        warn!("Ignoring group block of {}, expected a mapping", files::describe(block));
        return;
    };

    let repos = repo_groups.resolve(block.get("repos").unwrap_or(&Value::Null));
    let files = files::normalize_all(block.get("files").unwrap_or(&Value::Null));

    for repo in repos {
        targets.add(&repo, files.clone());
    }
}

/// Insertion-ordered set of targets keyed by unique name.
struct TargetSet<'a> {
    server_url: &'a str,
    targets: Vec<RepoTarget>,
    index: HashMap<String, usize>,
}

impl<'a> TargetSet<'a> {
    fn new(server_url: &'a str) -> Self {
        Self {
            server_url,
            targets: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn add(&mut self, raw_repo: &str, files: Vec<FileSpec>) {
        let repo = match RepoIdentity::parse(raw_repo, self.server_url) {
            Ok(repo) => repo,
            Err(e) => {
                warn!("Skipping repository '{}': {}", raw_repo, e);
                return;
            }
        };

        let key = repo.unique_name();
        match self.index.get(&key) {
            Some(&position) => self.targets[position].files.extend(files),
            None => {
                self.index.insert(key, self.targets.len());
                self.targets.push(RepoTarget { repo, files });
            }
        }
    }

    fn into_targets(self) -> Vec<RepoTarget> {
        self.targets
    }
}
