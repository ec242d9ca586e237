//! Canonical formatting of package files.
//!
//! [`yaml`] and [`json`] format a single buffer; [`package`] walks a
//! package tree and applies the formatter matching each file's extension.
//! The formatting rules depend on the package format version declared in
//! the manifest, so formatters are built per version through
//! [`formatter_for`].

pub mod json;
pub mod package;
pub mod yaml;

use std::path::Path;

use semver::Version;

use crate::error::FormatError;

pub use json::JsonFormatter;
pub use package::{FileOutcome, FileReport, PackageFormatOptions, format_package};
pub use yaml::YamlFormatter;

/// Result of formatting one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    /// Canonical bytes.
    pub content: Vec<u8>,
    /// `true` when the input was byte-for-byte identical to `content`.
    pub already_formatted: bool,
}

impl Formatted {
    /// Pair `content` with the byte-equality check against `input`.
    #[must_use]
    pub fn compared_to(input: &[u8], content: Vec<u8>) -> Self {
        let already_formatted = content == input;
        Self {
            content,
            already_formatted,
        }
    }
}

/// A formatter for one file type.
///
/// Implementations are stateless apart from their version-dependent
/// switches, so one instance can be shared by every worker.
pub trait Formatter: Send + Sync + std::fmt::Debug {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Format `content`.
    ///
    /// # Errors
    ///
    /// Returns an error if `content` cannot be parsed or re-encoded.
    fn format(&self, content: &[u8]) -> Result<Formatted, FormatError>;
}

/// File types that have a formatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `.yml` or `.yaml`
    Yaml,
    /// `.json`
    Json,
}

impl FileKind {
    /// Classify `path` by its extension.
    #[must_use]
    pub fn of(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "yml" | "yaml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Pick the formatter for `path` by extension, configured for the package
/// format version `spec`. Returns `None` for files that are not formatted.
#[must_use]
pub fn formatter_for(path: &Path, spec: &Version) -> Option<Box<dyn Formatter>> {
    let formatter: Box<dyn Formatter> = match FileKind::of(path)? {
        FileKind::Yaml => Box::new(YamlFormatter::for_spec_version(spec)),
        FileKind::Json => Box::new(JsonFormatter::for_spec_version(spec)),
    };
    Some(formatter)
}
