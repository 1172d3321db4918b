//! Normalization of raw `files` entries into [`FileSpec`]s.
//!
//! An entry is either a bare string (the source path) or a mapping:
//!
//! ```yaml
//! files:
//!   - LICENSE
//!   - source: workflows/
//!     dest: .github/workflows/
//!     deleteOrphaned: true
//!     exclude: |
//!       node.yml
//!   - source: templates/README.md
//!     dest: README.md
//!     replace: false
//!     template:
//!       project: widgets
//! ```

use log::warn;
use serde::Serialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const REPLACE_DEFAULT: bool = true;
pub const TEMPLATE_DEFAULT: bool = false;
pub const DELETE_ORPHANED_DEFAULT: bool = false;

/// A single file or directory to sync, with its policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSpec {
    /// Path in the source repository.
    pub source: String,
    /// Path in the target repository, relative to its root.
    pub dest: String,
    /// Render `{{ var }}` placeholders before writing.
    pub template: bool,
    /// Variables available to the template.
    pub template_vars: BTreeMap<String, String>,
    /// Overwrite the destination when it already exists.
    pub replace: bool,
    /// Remove destination files that no longer exist in the source.
    pub delete_orphaned: bool,
    /// Paths under `source` that are neither copied nor deleted.
    pub exclude: Vec<PathBuf>,
}

impl FileSpec {
    /// A spec for `source` with every option at its default.
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            dest: source.clone(),
            source,
            template: TEMPLATE_DEFAULT,
            template_vars: BTreeMap::new(),
            replace: REPLACE_DEFAULT,
            delete_orphaned: DELETE_ORPHANED_DEFAULT,
            exclude: Vec::new(),
        }
    }
}

/// Normalizes a whole `files` value.
///
/// Entries without a source are dropped (with a warning) and the rest are
/// kept in declaration order.
pub fn normalize_all(entries: &Value) -> Vec<FileSpec> {
    match entries {
        Value::Sequence(items) => items.iter().filter_map(normalize).collect(),
        Value::Null => {
            warn!("No files specified");
            Vec::new()
        }
        other => {
            warn!("Expected a list of files, got {}", describe(other));
            Vec::new()
        }
    }
}

/// Normalizes one entry, or returns `None` when it has no source.
pub fn normalize(entry: &Value) -> Option<FileSpec> {
    let map = match entry {
        Value::String(source) => return Some(FileSpec::new(source.clone())),
        Value::Mapping(map) => map,
        other => {
            warn!("Warn: Unsupported file entry {}, skipping", describe(other));
            return None;
        }
    };

    let Some(source) = map.get("source").and_then(scalar_to_string) else {
        warn!("Warn: No source files specified");
        return None;
    };

    let mut spec = FileSpec::new(source);

    if let Some(dest) = map.get("dest").and_then(scalar_to_string) {
        if !dest.is_empty() {
            spec.dest = dest;
        }
    }
    if let Some(replace) = map.get("replace").and_then(Value::as_bool) {
        spec.replace = replace;
    }
    if let Some(delete_orphaned) = map.get("deleteOrphaned").and_then(Value::as_bool) {
        spec.delete_orphaned = delete_orphaned;
    }

    match map.get("template") {
        Some(Value::Bool(enabled)) => spec.template = *enabled,
        Some(Value::Mapping(vars)) => {
            spec.template = true;
            spec.template_vars = vars
                .iter()
                .filter_map(|(k, v)| Some((scalar_to_string(k)?, scalar_to_string(v)?)))
                .collect();
        }
        Some(Value::Null) | None => {}
        Some(other) => warn!(
            "Ignoring 'template' of {} for {}, expected a boolean or a mapping",
            describe(other),
            spec.source
        ),
    }

    spec.exclude = parse_exclude(map.get("exclude"), &spec.source);

    Some(spec)
}

/// Resolves exclude entries against the source path.
///
/// The canonical form is a newline-separated block string; a YAML list is
/// accepted as well.
fn parse_exclude(value: Option<&Value>, source: &str) -> Vec<PathBuf> {
    let lines: Vec<String> = match value {
        Some(Value::String(text)) => text.lines().map(str::to_string).collect(),
        Some(Value::Sequence(items)) => items.iter().filter_map(scalar_to_string).collect(),
        _ => return Vec::new(),
    };

    lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| Path::new(source).join(line))
        .collect()
}

pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
