//! Property-based tests for configuration resolution.
//!
//! These tests use proptest to generate configuration documents and verify
//! that merging and group expansion behave the same for every input.

#[cfg(test)]
mod proptest_tests {
    use crate::config::{self, files, RepoGroups};
    use proptest::prelude::*;
    use serde_yaml::{Mapping, Value};

    const SERVER: &str = "https://github.com";

    fn file_list(sources: &[String]) -> Value {
        Value::Sequence(sources.iter().cloned().map(Value::String).collect())
    }

    fn repo_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9-]{0,8}/[a-z][a-z0-9_.-]{0,8}".prop_filter("no .git suffix", |s| !s.ends_with(".git"))
    }

    fn source_path() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_][a-zA-Z0-9_./-]{0,20}"
    }

    proptest! {
        /// Legacy and group entries for the same target concatenate in order.
        #[test]
        fn repeated_targets_concatenate_files(
            repo in repo_name(),
            legacy in prop::collection::vec(source_path(), 0..5),
            grouped in prop::collection::vec(source_path(), 0..5),
        ) {
            let mut group = Mapping::new();
            group.insert("repos".into(), Value::Sequence(vec![Value::String(repo.clone())]));
            group.insert("files".into(), file_list(&grouped));

            let mut root = Mapping::new();
            root.insert(Value::String(repo.clone()), file_list(&legacy));
            root.insert("group".into(), Value::Mapping(group));

            let targets = config::resolve(&Value::Mapping(root), SERVER).unwrap();
            prop_assert_eq!(targets.len(), 1);

            let sources: Vec<String> = targets[0].files.iter().map(|f| f.source.clone()).collect();
            let expected: Vec<String> = legacy.iter().chain(grouped.iter()).cloned().collect();
            prop_assert_eq!(sources, expected);
        }

        /// Every distinct repository becomes exactly one target, in first-seen order.
        #[test]
        fn targets_are_unique_and_ordered(repos in prop::collection::vec(repo_name(), 1..8)) {
            let mut group = Mapping::new();
            group.insert(
                "repos".into(),
                Value::Sequence(repos.iter().cloned().map(Value::String).collect()),
            );
            group.insert("files".into(), file_list(&["LICENSE".to_string()]));
            let mut root = Mapping::new();
            root.insert("group".into(), Value::Mapping(group));

            let targets = config::resolve(&Value::Mapping(root), SERVER).unwrap();

            let mut expected: Vec<String> = Vec::new();
            for repo in &repos {
                if !expected.contains(repo) {
                    expected.push(repo.clone());
                }
            }
            let slugs: Vec<String> = targets.iter().map(|t| t.repo.slug()).collect();
            prop_assert_eq!(slugs, expected);
        }

        /// Expanding the same `repos` value twice gives the same sequence.
        #[test]
        fn group_expansion_is_idempotent(
            members in prop::collection::vec(repo_name(), 0..5),
            extra in prop::collection::vec(repo_name(), 0..3),
        ) {
            let mut table = Mapping::new();
            table.insert(
                "team".into(),
                Value::Sequence(members.iter().cloned().map(Value::String).collect()),
            );
            let groups = RepoGroups::from_value(Some(&Value::Mapping(table)));

            let mut lines = vec!["team".to_string()];
            lines.extend(extra.iter().cloned());
            let repos = Value::String(lines.join("\n"));

            let first = groups.resolve(&repos);
            let second = groups.resolve(&repos);
            prop_assert_eq!(&first, &second);

            let expected: Vec<String> = members.iter().chain(extra.iter()).cloned().collect();
            prop_assert_eq!(first, expected);
        }

        /// A bare source normalizes to the defaults with `dest == source`.
        #[test]
        fn bare_source_gets_defaults(source in source_path()) {
            let spec = files::normalize(&Value::String(source.clone())).unwrap();

            prop_assert_eq!(&spec.dest, &source);
            prop_assert!(spec.replace);
            prop_assert!(!spec.template);
            prop_assert!(!spec.delete_orphaned);
            prop_assert!(spec.exclude.is_empty());
        }
    }
}
