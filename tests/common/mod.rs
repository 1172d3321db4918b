//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_config(configs::LEGACY);
//!     fixture.command().arg("validate").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    pub use super::TestFixture;
}

/// Common sync configurations for testing.
#[allow(dead_code)]
pub mod configs {
    /// One repository in the flat syntax.
    pub const LEGACY: &str = r#"
user/repo:
  - file.txt
"#;

    /// Named groups fanned out through a group block.
    pub const WITH_GROUPS: &str = r#"
repo_groups:
  teamA:
    - x/y
    - x/z@dev

octo/website:
  - LICENSE

group:
  - repos: teamA
    files:
      - source: ci/
        dest: .github/workflows/
        deleteOrphaned: true
  - repos: |
      teamA
      octo/website
    files:
      - .editorconfig
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "user/repo: [unclosed";
}

/// A source-repository checkout in a temporary directory.
///
/// The sync configuration lives at the default `.github/sync.yml`, and
/// commands run with the fixture as working directory so `source` paths
/// resolve against it.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write the sync configuration.
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child(".github/sync.yml")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to the config file.
    #[allow(dead_code)]
    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join(".github/sync.yml")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command running in this fixture's directory.
    ///
    /// Variables a surrounding GitHub Actions job might set are cleared so
    /// tests behave the same everywhere.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("repo-file-sync");
        cmd.current_dir(self.path()).arg("--color").arg("never");
        for key in [
            "GITHUB_ACTIONS",
            "GITHUB_EVENT_NAME",
            "GITHUB_EVENT_PATH",
            "GITHUB_OUTPUT",
            "GITHUB_REPOSITORY",
            "GITHUB_RUN_ID",
            "GITHUB_SERVER_URL",
            "INPUT_CONFIG_PATH",
            "INPUT_GH_PAT",
            "INPUT_GH_INSTALLATION_TOKEN",
            "RUST_LOG",
        ] {
            cmd.env_remove(key);
        }
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_with_config() {
        let fixture = TestFixture::new().with_config("user/repo: [a]");
        assert!(fixture.config_path().exists());
    }

    #[test]
    fn test_configs_are_valid_yaml() {
        for config in [configs::LEGACY, configs::WITH_GROUPS] {
            let parsed: Result<serde_yaml::Value, _> = serde_yaml::from_str(config);
            assert!(parsed.is_ok(), "Config should be valid YAML: {}", config);
        }
    }
}
