//! Filesystem primitives used while syncing a target.
//!
//! [`copy`] moves a file or a directory tree from the hub checkout into a
//! target working copy. Directory copies merge into the destination: files
//! already there but absent from the source are left alone unless the
//! [`FileSpec`] asks for orphans to be deleted. Paths matched by its `exclude`
//! list are never written and never deleted.
//!
//! Templates are rendered on the way: `{{ name }}` placeholders are replaced
//! with the entry's template variables.

use crate::config::FileSpec;
use crate::error::{Error, Result};
use glob::Pattern;
use log::{debug, warn};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

/// What a copy touched, relative to the destination root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    pub written: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

pub fn exists(path: &Path) -> bool {
    path.exists()
}

pub fn is_directory(path: &Path) -> Result<bool> {
    Ok(fs::metadata(path)?.is_dir())
}

/// Removes a file or directory tree; missing paths are fine.
pub fn remove(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path)?,
        Ok(_) => fs::remove_file(path)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Copies `source` to `dest` according to `spec`.
pub fn copy(source: &Path, dest: &Path, is_directory: bool, spec: &FileSpec) -> Result<CopyReport> {
    let excludes = ExcludeSet::new(&spec.exclude)?;

    if !is_directory {
        write_file(source, dest, spec)?;
        return Ok(CopyReport {
            written: vec![PathBuf::from(dest.file_name().unwrap_or_default())],
            removed: Vec::new(),
        });
    }

    let mut report = CopyReport::default();
    fs::create_dir_all(dest)?;

    let walker = WalkDir::new(source)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let excluded = excludes.matches(entry.path());
            if excluded {
                debug!("Excluding {}", entry.path().display());
            }
            !excluded
        });

    for entry in walker {
        let entry = entry.map_err(walk_error)?;
        if entry.file_type().is_dir() {
            continue;
        }
        let relative = relative_to(entry.path(), source)?;
        write_file(entry.path(), &dest.join(&relative), spec)?;
        report.written.push(relative);
    }

    if spec.delete_orphaned {
        report.removed = delete_orphans(source, dest, &excludes)?;
    }

    Ok(report)
}

/// Removes files under `dest` that have no counterpart under `source`.
fn delete_orphans(source: &Path, dest: &Path, excludes: &ExcludeSet) -> Result<Vec<PathBuf>> {
    let mut orphans = Vec::new();

    let walker = WalkDir::new(dest)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.file_name() != ".git");

    for entry in walker {
        let entry = entry.map_err(walk_error)?;
        if entry.file_type().is_dir() {
            continue;
        }
        let relative = relative_to(entry.path(), dest)?;
        let counterpart = source.join(&relative);
        if counterpart.is_file() {
            continue;
        }
        if excludes.matches(&counterpart) {
            debug!("Keeping excluded orphan {}", entry.path().display());
            continue;
        }
        orphans.push(relative);
    }

    for orphan in &orphans {
        debug!("Removing orphaned file {}", dest.join(orphan).display());
        fs::remove_file(dest.join(orphan))?;
    }

    Ok(orphans)
}

fn write_file(source: &Path, dest: &Path, spec: &FileSpec) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    if !spec.template {
        fs::copy(source, dest)?;
        return Ok(());
    }

    let bytes = fs::read(source)?;
    match String::from_utf8(bytes) {
        Ok(text) => fs::write(dest, render_template(&text, &spec.template_vars, source))?,
        Err(e) => {
            debug!("{} is not UTF-8, copying without rendering", source.display());
            fs::write(dest, e.into_bytes())?;
        }
    }
    Ok(())
}

/// Replaces `{{ name }}` placeholders with their values.
///
/// Unknown names are left in place so the rendered file shows what is
/// missing.
pub fn render_template(text: &str, vars: &BTreeMap<String, String>, origin: &Path) -> String {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    let placeholder = PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_.]*)\s*\}\}").expect("placeholder regex is valid")
    });

    placeholder
        .replace_all(text, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => {
                warn!(
                    "Template variable '{}' is not defined for {}",
                    &caps[1],
                    origin.display()
                );
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Exclude entries, matched as path prefixes or glob patterns.
struct ExcludeSet {
    paths: Vec<PathBuf>,
    patterns: Vec<Pattern>,
}

impl ExcludeSet {
    fn new(entries: &[PathBuf]) -> Result<Self> {
        let mut patterns = Vec::new();
        for entry in entries {
            let text = entry.to_string_lossy();
            if text.contains(['*', '?', '[']) {
                patterns.push(Pattern::new(&text)?);
            }
        }
        Ok(Self {
            paths: entries.iter().map(|p| normalize(p)).collect(),
            patterns,
        })
    }

    fn matches(&self, path: &Path) -> bool {
        let path = normalize(path);
        self.paths.iter().any(|excluded| path.starts_with(excluded))
            || self
                .patterns
                .iter()
                .any(|pattern| pattern.matches_path(&path))
    }
}

/// Drops `.` components so `./src/a` and `src/a` compare equal.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .collect()
}

fn relative_to(path: &Path, base: &Path) -> Result<PathBuf> {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .map_err(|_| Error::Filesystem {
            message: format!("{} is not under {}", path.display(), base.display()),
        })
}

fn walk_error(e: walkdir::Error) -> Error {
    Error::Filesystem {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn dir_spec(source: &Path, delete_orphaned: bool, exclude: &[&str]) -> FileSpec {
        let mut spec = FileSpec::new(source.to_string_lossy().to_string());
        spec.delete_orphaned = delete_orphaned;
        spec.exclude = exclude.iter().map(|e| source.join(e)).collect();
        spec
    }

    #[test]
    fn test_copy_single_file_creates_parents() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/LICENSE", "MIT");
        let dest = temp.path().join("target/nested/LICENSE");

        let report = copy(
            &temp.path().join("src/LICENSE"),
            &dest,
            false,
            &FileSpec::new("LICENSE"),
        )
        .unwrap();

        assert_eq!(fs::read_to_string(dest).unwrap(), "MIT");
        assert_eq!(report.written, vec![PathBuf::from("LICENSE")]);
    }

    #[test]
    fn test_copy_directory_merges_contents() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        let dest = temp.path().join("dest");
        write(&source, "a.txt", "new a");
        write(&source, "sub/b.txt", "b");
        write(&dest, "a.txt", "old a");
        write(&dest, "local.txt", "keep me");

        let report = copy(&source, &dest, true, &dir_spec(&source, false, &[])).unwrap();

        assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "new a");
        assert_eq!(fs::read_to_string(dest.join("sub/b.txt")).unwrap(), "b");
        assert!(dest.join("local.txt").exists());
        assert_eq!(
            report.written,
            vec![PathBuf::from("a.txt"), PathBuf::from("sub/b.txt")]
        );
        assert!(report.removed.is_empty());
    }

    #[test]
    fn test_delete_orphaned_respects_exclude() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        let dest = temp.path().join("dest");
        write(&source, "keep.txt", "source keep");
        write(&source, "secret.txt", "never copied");
        write(&dest, "orphan.txt", "remove me");
        write(&dest, "secret.txt", "target secret");

        let spec = dir_spec(&source, true, &["secret.txt"]);
        let report = copy(&source, &dest, true, &spec).unwrap();

        assert!(!dest.join("orphan.txt").exists());
        assert_eq!(
            fs::read_to_string(dest.join("secret.txt")).unwrap(),
            "target secret"
        );
        assert_eq!(fs::read_to_string(dest.join("keep.txt")).unwrap(), "source keep");
        assert_eq!(report.written, vec![PathBuf::from("keep.txt")]);
        assert_eq!(report.removed, vec![PathBuf::from("orphan.txt")]);
    }

    #[test]
    fn test_excluded_directory_is_skipped_entirely() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        let dest = temp.path().join("dest");
        write(&source, "node_modules/pkg/index.js", "x");
        write(&source, "index.js", "y");

        let report = copy(&source, &dest, true, &dir_spec(&source, false, &["node_modules"])).unwrap();

        assert!(!dest.join("node_modules").exists());
        assert_eq!(report.written, vec![PathBuf::from("index.js")]);
    }

    #[test]
    fn test_exclude_glob_pattern() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        let dest = temp.path().join("dest");
        write(&source, "a.log", "x");
        write(&source, "a.txt", "y");

        copy(&source, &dest, true, &dir_spec(&source, false, &["*.log"])).unwrap();

        assert!(!dest.join("a.log").exists());
        assert!(dest.join("a.txt").exists());
    }

    #[test]
    fn test_delete_orphaned_skips_git_directory() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        let dest = temp.path().join("dest");
        write(&source, "a.txt", "a");
        write(&dest, ".git/HEAD", "ref: refs/heads/main");

        copy(&source, &dest, true, &dir_spec(&source, true, &[])).unwrap();

        assert!(dest.join(".git/HEAD").exists());
    }

    #[test]
    fn test_template_rendering_on_copy() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "README.md", "# {{ project }} by {{owner}} {{ missing }}");
        let mut spec = FileSpec::new("README.md");
        spec.template = true;
        spec.template_vars.insert("project".to_string(), "widgets".to_string());
        spec.template_vars.insert("owner".to_string(), "octo".to_string());

        let dest = temp.path().join("out/README.md");
        copy(&temp.path().join("README.md"), &dest, false, &spec).unwrap();

        assert_eq!(
            fs::read_to_string(dest).unwrap(),
            "# widgets by octo {{ missing }}"
        );
    }

    #[test]
    fn test_template_copies_non_utf8_verbatim() {
        let temp = TempDir::new().unwrap();
        let bytes = vec![0xff, 0xfe, b'{', b'{', b' ', b'x', b' ', b'}', b'}'];
        fs::write(temp.path().join("logo.bin"), &bytes).unwrap();
        let mut spec = FileSpec::new("logo.bin");
        spec.template = true;
        spec.template_vars.insert("x".to_string(), "rendered".to_string());

        let dest = temp.path().join("out/logo.bin");
        copy(&temp.path().join("logo.bin"), &dest, false, &spec).unwrap();

        assert_eq!(fs::read(dest).unwrap(), bytes);
    }

    #[test]
    fn test_remove_file_dir_and_missing() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "dir/a.txt", "a");
        write(temp.path(), "b.txt", "b");

        remove(&temp.path().join("dir")).unwrap();
        remove(&temp.path().join("b.txt")).unwrap();
        remove(&temp.path().join("missing")).unwrap();

        assert!(!temp.path().join("dir").exists());
        assert!(!temp.path().join("b.txt").exists());
    }
}
