//! # CLI Command Implementations
//!
//! Each subcommand of `repo-file-sync` lives in its own file and contains:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`. Options fall back to the `INPUT_*` environment
//!   variables GitHub Actions sets for action inputs.
//! - An `execute` function that takes the parsed `Args` and calls into the
//!   `repo_file_sync` library to do the work.

pub mod sync;
pub mod validate;

/// Parses the boolean spellings action inputs use.
pub fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => Err(format!(
            "invalid boolean '{}', expected true/false/yes/no/1/0",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Ok(true));
        assert_eq!(parse_bool(" yes "), Ok(true));
        assert_eq!(parse_bool("1"), Ok(true));
        assert_eq!(parse_bool("No"), Ok(false));
        assert_eq!(parse_bool("0"), Ok(false));
        assert!(parse_bool("maybe").is_err());
    }
}
