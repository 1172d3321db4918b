//! Target repository identities.
//!
//! A repository is written in the config as `[url|]user/name[@branch]`. The
//! parsed form keeps the host so that targets on different servers never
//! collide, and exposes the two keys the rest of the crate relies on:
//! `full_name` (the repository) and `unique_name` (the sync target).

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use url::Url;

/// Branch sentinel meaning "whatever the remote HEAD points at".
pub const DEFAULT_BRANCH: &str = "default";

/// A parsed repository reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RepoIdentity {
    pub host: String,
    pub user: String,
    pub name: String,
    pub branch: String,
}

impl RepoIdentity {
    /// Parses a repo identifier relative to `server_url`.
    ///
    /// Identifiers starting with `http` carry their own host, e.g.
    /// `https://git.example.com/team/tools@v2`.
    pub fn parse(raw: &str, server_url: &str) -> Result<Self> {
        let raw = raw.trim();
        let (host, path) = if raw.starts_with("http") {
            let url = Url::parse(raw)?;
            (host_with_port(&url)?, url.path().trim_start_matches('/').to_string())
        } else {
            (host_with_port(&Url::parse(server_url)?)?, raw.to_string())
        };

        let (repo_part, branch) = match path.split_once('@') {
            Some((repo, branch)) if !branch.is_empty() => (repo, branch),
            Some((repo, _)) => (repo, DEFAULT_BRANCH),
            None => (path.as_str(), DEFAULT_BRANCH),
        };

        let mut segments = repo_part.split('/');
        let user = segments.next().unwrap_or_default();
        let name = segments.next().unwrap_or_default();
        if user.is_empty() || name.is_empty() {
            return Err(Error::ConfigParse {
                message: format!("Invalid repository '{}'", raw),
                hint: Some("Repositories are written as 'user/name' or 'user/name@branch'".to_string()),
            });
        }

        Ok(Self {
            host,
            user: user.to_string(),
            name: name.trim_end_matches(".git").to_string(),
            branch: branch.to_string(),
        })
    }

    /// `host/user/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}/{}", self.host, self.user, self.name)
    }

    /// `host/user/name@branch`, the key targets are merged on.
    pub fn unique_name(&self) -> String {
        format!("{}@{}", self.full_name(), self.branch)
    }

    /// `user/name`, as used in REST API paths.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.user, self.name)
    }

    /// Whether the target follows the remote's default branch.
    pub fn uses_default_branch(&self) -> bool {
        self.branch == DEFAULT_BRANCH
    }
}

impl fmt::Display for RepoIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.unique_name())
    }
}

fn host_with_port(url: &Url) -> Result<String> {
    let host = url.host_str().ok_or_else(|| Error::ConfigParse {
        message: format!("URL '{}' has no host", url),
        hint: None,
    })?;
    Ok(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}
