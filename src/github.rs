//! GitHub REST API client.
//!
//! A small blocking client covering the pull-request endpoints a sync run
//! needs. Works against github.com and GitHub Enterprise Server alike; the
//! API base URL is derived from the server URL by
//! [`SyncSettings::api_url`](crate::settings::SyncSettings::api_url).

use crate::error::{Error, Result};
use crate::message::{with_resync_warning, without_resync_warning};
use crate::repo::RepoIdentity;
use crate::repository::{PullRequest, PullRequestDraft, PullRequestOperations};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;

const USER_AGENT: &str = concat!("repo-file-sync/", env!("CARGO_PKG_VERSION"));

/// Blocking GitHub REST API client.
#[derive(Clone)]
pub struct GitHubClient {
    agent: ureq::Agent,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build();
        debug!("Created GitHub client for {}", api_url);
        Self {
            agent,
            api_url,
            token: token.into(),
        }
    }

    fn repo_url(&self, repo: &RepoIdentity, path: &str) -> String {
        format!("{}/repos/{}/{}", self.api_url, repo.slug(), path)
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        self.agent
            .request(method, url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("X-GitHub-Api-Version", "2022-11-28")
    }

    /// Sends a request and maps transport and status errors.
    fn send(&self, request: ureq::Request, body: Option<&Value>) -> Result<ureq::Response> {
        let url = request.url().to_string();
        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };

        match result {
            Ok(response) => Ok(response),
            Err(ureq::Error::Status(status, response)) => {
                let message = response
                    .into_string()
                    .ok()
                    .and_then(|text| api_message(&text))
                    .unwrap_or_else(|| "request failed".to_string());
                Err(Error::Api {
                    url,
                    status,
                    message,
                })
            }
            Err(ureq::Error::Transport(transport)) => Err(Error::Network {
                url,
                message: transport.to_string(),
            }),
        }
    }

    fn read_json<T: DeserializeOwned>(&self, response: ureq::Response) -> Result<T> {
        let text = response.into_string()?;
        Ok(serde_json::from_str(&text)?)
    }

    fn update_body(&self, repo: &RepoIdentity, pr: &PullRequest, body: String) -> Result<()> {
        let url = self.repo_url(repo, &format!("pulls/{}", pr.number));
        self.send(self.request("PATCH", &url), Some(&json!({ "body": body })))?;
        Ok(())
    }
}

/// The `message` field of a GitHub error response.
fn api_message(text: &str) -> Option<String> {
    let value: Value = serde_json::from_str(text).ok()?;
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

impl PullRequestOperations for GitHubClient {
    fn find_existing_pr(&self, repo: &RepoIdentity, head: &str) -> Result<Option<PullRequest>> {
        let url = self.repo_url(repo, "pulls");
        let request = self
            .request("GET", &url)
            .query("state", "open")
            .query("head", head);
        let pulls: Vec<PullRequest> = self.read_json(self.send(request, None)?)?;
        Ok(pulls.into_iter().next())
    }

    fn set_pr_warning(&self, repo: &RepoIdentity, pr: &PullRequest) -> Result<()> {
        let body = with_resync_warning(pr.body.as_deref().unwrap_or_default());
        self.update_body(repo, pr, body)
    }

    fn remove_pr_warning(&self, repo: &RepoIdentity, pr: &PullRequest) -> Result<()> {
        let body = without_resync_warning(pr.body.as_deref().unwrap_or_default());
        self.update_body(repo, pr, body)
    }

    fn create_or_update_pr(
        &self,
        repo: &RepoIdentity,
        draft: &PullRequestDraft,
        existing: Option<&PullRequest>,
    ) -> Result<PullRequest> {
        match existing {
            Some(pr) => {
                info!("Overwriting existing PR");
                let url = self.repo_url(repo, &format!("pulls/{}", pr.number));
                let body = json!({ "title": draft.title, "body": draft.body });
                self.read_json(self.send(self.request("PATCH", &url), Some(&body))?)
            }
            None => {
                info!("Creating new PR");
                let url = self.repo_url(repo, "pulls");
                let body = json!({
                    "title": draft.title,
                    "body": draft.body,
                    "head": draft.head,
                    "base": draft.base,
                });
                self.read_json(self.send(self.request("POST", &url), Some(&body))?)
            }
        }
    }

    fn add_labels(&self, repo: &RepoIdentity, pr: &PullRequest, labels: &[String]) -> Result<()> {
        let url = self.repo_url(repo, &format!("issues/{}/labels", pr.number));
        self.send(self.request("POST", &url), Some(&json!({ "labels": labels })))?;
        Ok(())
    }

    fn add_assignees(
        &self,
        repo: &RepoIdentity,
        pr: &PullRequest,
        assignees: &[String],
    ) -> Result<()> {
        let url = self.repo_url(repo, &format!("issues/{}/assignees", pr.number));
        self.send(
            self.request("POST", &url),
            Some(&json!({ "assignees": assignees })),
        )?;
        Ok(())
    }

    fn add_reviewers(
        &self,
        repo: &RepoIdentity,
        pr: &PullRequest,
        reviewers: &[String],
    ) -> Result<()> {
        let url = self.repo_url(repo, &format!("pulls/{}/requested_reviewers", pr.number));
        self.send(
            self.request("POST", &url),
            Some(&json!({ "reviewers": reviewers })),
        )?;
        Ok(())
    }

    fn add_team_reviewers(
        &self,
        repo: &RepoIdentity,
        pr: &PullRequest,
        teams: &[String],
    ) -> Result<()> {
        let url = self.repo_url(repo, &format!("pulls/{}/requested_reviewers", pr.number));
        self.send(
            self.request("POST", &url),
            Some(&json!({ "team_reviewers": teams })),
        )?;
        Ok(())
    }
}
