//! Structured logger with per-file result collection.
use std::path::Path;
use std::sync::Mutex;

use super::subscriber::STAGE_TARGET;
use super::types::{FileEntry, FileStatus};

/// Structured logger that forwards messages to [`tracing`] and collects
/// per-file results for the run summary.
///
/// Safe to share across the rayon workers that format package files.
#[derive(Debug, Default)]
pub struct Logger {
    files: Mutex<Vec<FileEntry>>,
}

impl Logger {
    /// Create a new logger with no recorded files.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Record a file result for the summary.
    pub fn record_file(&self, path: &Path, status: FileStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.files.lock() {
            guard.push(FileEntry {
                path: path.to_path_buf(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Return all recorded file entries, sorted by path.
    #[must_use]
    pub fn file_entries(&self) -> Vec<FileEntry> {
        let mut entries = self.files.lock().map_or_else(|_| vec![], |g| g.clone());
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        entries
    }

    /// Count the recorded files with the given status.
    #[must_use]
    pub fn count(&self, status: FileStatus) -> usize {
        self.files.lock().map_or(0, |guard| {
            guard.iter().filter(|f| f.status == status).count()
        })
    }

    /// Count the number of failed files.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.count(FileStatus::Failed)
    }

    /// Print the summary of all recorded files.
    ///
    /// Unchanged files are only counted; every other file is listed.
    pub fn print_summary(&self) {
        let files = self.file_entries();
        if files.is_empty() {
            return;
        }

        self.stage("Summary");

        for file in files.iter().filter(|f| f.status != FileStatus::Unchanged) {
            let (icon, color) = match file.status {
                FileStatus::Unchanged => ("·", "\x1b[2m"),
                FileStatus::Reformatted => ("~", "\x1b[33m"),
                FileStatus::Written => ("✓", "\x1b[32m"),
                FileStatus::Failed => ("✗", "\x1b[31m"),
            };
            let suffix = file
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(": {msg}"));
            self.info(&format!(
                "{color}{icon} {} ({}){suffix}\x1b[0m",
                file.path.display(),
                file.status.label()
            ));
        }

        let unchanged = self.count(FileStatus::Unchanged);
        let reformatted = self.count(FileStatus::Reformatted);
        let written = self.count(FileStatus::Written);
        let failed = self.count(FileStatus::Failed);
        self.info(&format!(
            "{} files: \x1b[2m{unchanged} unchanged\x1b[0m, \x1b[32m{written} formatted\x1b[0m, \x1b[33m{reformatted} need formatting\x1b[0m, \x1b[31m{failed} failed\x1b[0m",
            files.len()
        ));
    }
}
