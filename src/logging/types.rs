//! Core logging types: per-file entries and their status.
use std::path::PathBuf;

/// Result of processing one package file, kept for the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path of the file, relative to the package root when possible.
    pub path: PathBuf,
    /// Final status of the file.
    pub status: FileStatus,
    /// Optional detail message (e.g., the formatting error).
    pub message: Option<String>,
}

/// Status of a processed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    /// The file was already in canonical form.
    Unchanged,
    /// The file is not canonical; reported only, nothing written.
    Reformatted,
    /// The file was rewritten in canonical form.
    Written,
    /// The file could not be processed.
    Failed,
}

impl FileStatus {
    /// Short label used in the summary.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Reformatted => "needs formatting",
            Self::Written => "formatted",
            Self::Failed => "failed",
        }
    }
}
