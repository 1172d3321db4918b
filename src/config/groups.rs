//! Named repository groups and expansion of `repos` fields.
//!
//! ```yaml
//! repo_groups:
//!   frontend:
//!     - octo/web
//!     - octo/mobile
//!
//! group:
//!   - repos: |
//!       frontend
//!       octo/docs
//!     files:
//!       - .editorconfig
//! ```

use super::files::{describe, scalar_to_string};
use log::{debug, warn};
use serde_yaml::{Mapping, Value};

/// The `repo_groups` table, kept in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RepoGroups {
    groups: Mapping,
}

impl RepoGroups {
    /// Builds the table from the raw `repo_groups` value.
    ///
    /// Groups whose value is not a list are kept but reported; they only
    /// match as a whole-string reference, where the fallback treats the
    /// reference itself as a literal list.
    pub fn from_value(value: Option<&Value>) -> Self {
        let groups = match value {
            Some(Value::Mapping(map)) => map.clone(),
            None | Some(Value::Null) => Mapping::new(),
            Some(other) => {
                warn!("'repo_groups' should be a mapping of group names, got {}", describe(other));
                Mapping::new()
            }
        };

        for (name, members) in &groups {
            if !members.is_sequence() {
                warn!(
                    "Repo group \"{}\" should be an array of repository strings",
                    scalar_to_string(name).unwrap_or_default()
                );
            }
        }

        let resolved = Self { groups };
        debug!(
            "Loaded {} repo group(s): {}",
            resolved.len(),
            resolved.names().join(", ")
        );
        resolved
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.groups.keys().filter_map(scalar_to_string).collect()
    }

    /// Raw value of a group. Null values count as undefined.
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.groups.get(name).filter(|value| !value.is_null())
    }

    /// Members of a group, if it exists and is a list.
    pub fn members(&self, name: &str) -> Option<Vec<String>> {
        match self.lookup(name)? {
            Value::Sequence(items) => Some(repo_strings(items)),
            _ => None,
        }
    }

    /// Expands a `repos` value into repository identifiers.
    ///
    /// Expansion is intentionally single-level: a member of a group that is
    /// itself a group name stays a literal identifier.
    pub fn resolve(&self, repos: &Value) -> Vec<String> {
        match repos {
            Value::Sequence(items) => repo_strings(items),
            Value::String(text) => self.resolve_text(text),
            other => {
                warn!("Unexpected repos value type: {}", describe(other));
                Vec::new()
            }
        }
    }

    fn resolve_text(&self, text: &str) -> Vec<String> {
        let trimmed = text.trim();

        if !trimmed.contains('\n') {
            if let Some(group) = self.lookup(trimmed) {
                debug!("Resolving repo group reference: {}", trimmed);
                return match group {
                    Value::Sequence(items) => repo_strings(items),
                    _ => {
                        warn!(
                            "Repo group \"{}\" is not an array, treating as inline list",
                            trimmed
                        );
                        split_lines(text)
                    }
                };
            }
        }

        split_lines(text)
            .into_iter()
            .flat_map(|entry| match self.members(&entry) {
                Some(members) => {
                    debug!("Resolving repo group reference: {}", entry);
                    members
                }
                None => vec![entry],
            })
            .collect()
    }
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn repo_strings(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(|item| {
            let repo = scalar_to_string(item);
            if repo.is_none() {
                warn!("Ignoring repository entry of {}", describe(item));
            }
            repo
        })
        .collect()
}
