//! # Error Handling
//!
//! This module defines the centralized error type for `repo-file-sync`. It
//! uses `thiserror` to build an `Error` enum that covers every failure the
//! library can surface, each with enough context to tell the user which
//! repository, command or file was involved.
//!
//! Errors fall into three groups:
//!
//! - **Configuration errors** (`ConfigParse`, `MissingCredentials`, `Yaml`):
//!   most malformed entries are downgraded to warnings while resolving the
//!   config, so these only surface when nothing sensible can be done.
//! - **Per-target operational errors** (`GitClone`, `GitCommand`, `Api`,
//!   `Network`, `Filesystem`, `Io`): these are caught by the
//!   orchestrator at the target boundary and recorded as a failed outcome.
//! - **Wrapped library errors** (`Json`, `UrlParse`, `Glob`).
//!
//! The `Result` alias is used throughout the library.

use thiserror::Error;

/// Main error type for repo-file-sync operations
#[derive(Error, Debug)]
pub enum Error {
    /// The sync configuration could not be read or has an unusable shape.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// Neither a personal access token nor an installation token was given.
    #[error("You must provide either GH_PAT or GH_INSTALLATION_TOKEN")]
    MissingCredentials,

    /// Cloning a target repository failed.
    #[error("Git clone error for {repo}@{branch}: {message}")]
    GitClone {
        repo: String,
        branch: String,
        message: String,
    },

    /// A git command failed inside a working copy.
    #[error("Git command failed in {repo}: {command} - {stderr}")]
    GitCommand {
        command: String,
        repo: String,
        stderr: String,
    },

    /// A copy, delete or directory walk failed.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// The code-hosting API answered with a non-success status.
    #[error("API error (HTTP {status}) for {url}: {message}")]
    Api {
        url: String,
        status: u16,
        message: String,
    },

    /// The code-hosting API could not be reached.
    #[error("Network operation error: {url} - {message}")]
    Network { url: String, message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON (de)serialization error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// A glob pattern error, wrapped from `glob::PatternError`.
    #[error("Glob pattern error: {0}")]
    Glob(#[from] glob::PatternError),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config_parse() {
        let error = Error::ConfigParse {
            message: "Invalid YAML".to_string(),
            hint: None,
        };
        let display = format!("{}", error);
        assert!(display.contains("Configuration parsing error"));
        assert!(display.contains("Invalid YAML"));
        assert!(!display.contains("hint:"));
    }

    #[test]
    fn test_error_display_config_parse_with_hint() {
        let error = Error::ConfigParse {
            message: "Top-level value must be a mapping".to_string(),
            hint: Some("Use 'owner/repo: [files]' or a 'group:' block".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("must be a mapping"));
        assert!(display.contains("hint:"));
        assert!(display.contains("group:"));
    }

    #[test]
    fn test_error_display_missing_credentials() {
        let display = Error::MissingCredentials.to_string();
        assert!(display.contains("GH_PAT"));
        assert!(display.contains("GH_INSTALLATION_TOKEN"));
    }

    #[test]
    fn test_error_display_git_clone() {
        let error = Error::GitClone {
            repo: "github.com/octo/widgets".to_string(),
            branch: "main".to_string(),
            message: "Repository not found".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Git clone error"));
        assert!(display.contains("github.com/octo/widgets@main"));
        assert!(display.contains("Repository not found"));
    }

    #[test]
    fn test_error_display_git_command() {
        let error = Error::GitCommand {
            command: "git push".to_string(),
            repo: "github.com/octo/widgets".to_string(),
            stderr: "rejected".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Git command failed"));
        assert!(display.contains("git push"));
        assert!(display.contains("rejected"));
    }

    #[test]
    fn test_error_display_api() {
        let error = Error::Api {
            url: "https://api.github.com/repos/octo/widgets/pulls".to_string(),
            status: 422,
            message: "Validation Failed".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("HTTP 422"));
        assert!(display.contains("Validation Failed"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: [unclosed").unwrap_err();
        let error: Error = yaml_error.into();
        assert!(error.to_string().contains("YAML parsing error"));
    }

    #[test]
    fn test_error_from_url_error() {
        let url_error = url::Url::parse("not a url").unwrap_err();
        let error: Error = url_error.into();
        assert!(error.to_string().contains("URL parsing error"));
    }
}
