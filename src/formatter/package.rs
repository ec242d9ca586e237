//! Formatting every YAML and JSON file of a package tree.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context as _, Result};
use semver::Version;
use walkdir::WalkDir;

use super::{FileKind, formatter_for};
use crate::config::manifest::PackageManifest;

/// How a package is formatted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageFormatOptions {
    /// Report files that need formatting without writing them.
    pub check: bool,
    /// Format files on the rayon thread pool.
    pub parallel: bool,
    /// Directory names that are never descended into.
    pub skip_dirs: Vec<String>,
}

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Already canonical.
    Unchanged,
    /// Not canonical; rewritten, or only reported in check mode.
    Reformatted,
    /// Could not be read, formatted or written.
    Failed(String),
}

/// Per-file result of [`format_package`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    /// Path relative to the package root.
    pub path: PathBuf,
    /// Outcome for this file.
    pub outcome: FileOutcome,
}

/// Format the package rooted at `root`.
///
/// The package format version comes from `manifest.yml` and selects the
/// YAML and JSON rules. Reports are returned sorted by path whatever the
/// processing order. A file that fails does not stop the others.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or the tree cannot be
/// walked.
pub fn format_package(root: &Path, opts: &PackageFormatOptions) -> Result<Vec<FileReport>> {
    let spec = PackageManifest::load(root)?.spec_version();
    let files = discover_files(root, &opts.skip_dirs)?;
    tracing::debug!(
        root = %root.display(),
        spec = %spec,
        files = files.len(),
        parallel = opts.parallel,
        "formatting package"
    );

    let mut reports = if opts.parallel {
        format_parallel(root, files, &spec, opts.check)?
    } else {
        files
            .into_iter()
            .map(|path| format_file(root, path, &spec, opts.check))
            .collect()
    };
    reports.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(reports)
}

fn format_parallel(
    root: &Path,
    files: Vec<PathBuf>,
    spec: &Version,
    check: bool,
) -> Result<Vec<FileReport>> {
    use rayon::prelude::*;
    let reports = Mutex::new(Vec::with_capacity(files.len()));
    files.into_par_iter().try_for_each(|path| -> Result<()> {
        let report = format_file(root, path, spec, check);
        reports
            .lock()
            .map_err(|e| anyhow::anyhow!("reports mutex poisoned: {e}"))?
            .push(report);
        Ok(())
    })?;
    Ok(reports
        .into_inner()
        .unwrap_or_else(std::sync::PoisonError::into_inner))
}

/// List the formattable files under `root`, relative to it.
///
/// Hidden entries and directories named in `skip_dirs` are not descended
/// into.
///
/// # Errors
///
/// Returns an error if a directory cannot be read.
pub fn discover_files(root: &Path, skip_dirs: &[String]) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped(e, skip_dirs));

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("walking {}", root.display()))?;
        if !entry.file_type().is_file() || FileKind::of(entry.path()).is_none() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(root) {
            files.push(relative.to_path_buf());
        }
    }
    Ok(files)
}

fn is_skipped(entry: &walkdir::DirEntry, skip_dirs: &[String]) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return true;
    }
    entry.file_type().is_dir() && skip_dirs.iter().any(|dir| dir.as_str() == name.as_ref())
}

fn format_file(root: &Path, path: PathBuf, spec: &Version, check: bool) -> FileReport {
    let outcome = match try_format_file(&root.join(&path), spec, check) {
        Ok(true) => FileOutcome::Unchanged,
        Ok(false) => FileOutcome::Reformatted,
        Err(e) => FileOutcome::Failed(format!("{e:#}")),
    };
    tracing::debug!(path = %path.display(), outcome = ?outcome, "file processed");
    FileReport { path, outcome }
}

/// Returns whether the file was already formatted.
fn try_format_file(path: &Path, spec: &Version, check: bool) -> Result<bool> {
    let Some(formatter) = formatter_for(path, spec) else {
        return Ok(true);
    };
    let content =
        std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let formatted = formatter.format(&content)?;
    if !formatted.already_formatted && !check {
        std::fs::write(path, &formatted.content)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(formatted.already_formatted)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::fs;

    fn package(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (path, content) in files {
            let full = dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        dir
    }

    fn opts(check: bool, parallel: bool) -> PackageFormatOptions {
        PackageFormatOptions {
            check,
            parallel,
            skip_dirs: vec!["ingest_pipeline".to_string()],
        }
    }

    #[test]
    fn discovery_skips_hidden_and_configured_dirs() {
        let dir = package(&[
            ("manifest.yml", "name: x\n"),
            ("data_stream/logs/fields/base.yml", "a: 1\n"),
            ("data_stream/logs/elasticsearch/ingest_pipeline/default.yml", "a: 1\n"),
            (".git/config.yml", "a: 1\n"),
            ("kibana/dashboard/d.json", "{}"),
            ("docs/README.md", "# x\n"),
        ]);
        let files = discover_files(dir.path(), &["ingest_pipeline".to_string()]).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("data_stream/logs/fields/base.yml"),
                PathBuf::from("kibana/dashboard/d.json"),
                PathBuf::from("manifest.yml"),
            ]
        );
    }

    #[test]
    fn reformats_and_writes_files() {
        let dir = package(&[
            ("manifest.yml", "format_version: 3.0.0\nname: x\n"),
            ("fields/base.yml", "es.a: 1\nes.b: 2\n"),
        ]);
        let reports = format_package(dir.path(), &opts(false, false)).unwrap();
        assert_eq!(
            reports,
            vec![
                FileReport {
                    path: PathBuf::from("fields/base.yml"),
                    outcome: FileOutcome::Reformatted,
                },
                FileReport {
                    path: PathBuf::from("manifest.yml"),
                    outcome: FileOutcome::Unchanged,
                },
            ]
        );
        let written = fs::read_to_string(dir.path().join("fields/base.yml")).unwrap();
        assert_eq!(written, "es:\n  a: 1\n  b: 2\n");
    }

    #[test]
    fn check_mode_does_not_write() {
        let dir = package(&[
            ("manifest.yml", "format_version: 3.0.0\n"),
            ("fields/base.yml", "es.a: 1\n"),
        ]);
        let reports = format_package(dir.path(), &opts(true, false)).unwrap();
        assert_eq!(reports[0].outcome, FileOutcome::Reformatted);
        let untouched = fs::read_to_string(dir.path().join("fields/base.yml")).unwrap();
        assert_eq!(untouched, "es.a: 1\n");
    }

    #[test]
    fn old_format_version_keeps_dotted_keys() {
        let dir = package(&[
            ("manifest.yml", "format_version: 2.3.0\n"),
            ("fields/base.yml", "es.a: 1\n"),
        ]);
        let reports = format_package(dir.path(), &opts(true, false)).unwrap();
        assert!(reports.iter().all(|r| r.outcome == FileOutcome::Unchanged));
    }

    #[test]
    fn failures_are_reported_per_file() {
        let dir = package(&[
            ("manifest.yml", "format_version: 3.0.0\n"),
            ("a.json", "{not json"),
            ("b.yml", "b: 1\n"),
        ]);
        let reports = format_package(dir.path(), &opts(false, true)).unwrap();
        assert!(matches!(reports[0].outcome, FileOutcome::Failed(_)));
        assert_eq!(reports[1].outcome, FileOutcome::Unchanged);
    }

    #[test]
    fn parallel_reports_are_sorted() {
        let files: Vec<(String, String)> = (0..20)
            .map(|i| (format!("fields/f{i:02}.yml"), format!("k{i}.x: {i}\n")))
            .collect();
        let mut layout: Vec<(&str, &str)> = files
            .iter()
            .map(|(p, c)| (p.as_str(), c.as_str()))
            .collect();
        layout.push(("manifest.yml", "format_version: 3.0.0\n"));
        let dir = package(&layout);
        let reports = format_package(dir.path(), &opts(false, true)).unwrap();
        let paths: Vec<_> = reports.iter().map(|r| r.path.clone()).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
        assert_eq!(
            reports
                .iter()
                .filter(|r| r.outcome == FileOutcome::Reformatted)
                .count(),
            20
        );
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let dir = package(&[("fields/base.yml", "a: 1\n")]);
        assert!(format_package(dir.path(), &opts(false, false)).is_err());
    }
}
