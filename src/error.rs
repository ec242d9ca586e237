//! Domain-specific error types for the package tool.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! The document engine, formatters and changelog patcher return typed errors
//! (e.g., [`DocumentError`], [`ChangelogError`]) while command handlers at the
//! CLI boundary convert them to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! IntpkgError
//! ├── Document(DocumentError)   - parse, structural and encode failures
//! │   ├── Syntax(SyntaxError)
//! │   ├── Shape(ShapeError)
//! │   └── Encode(EncodeError)
//! ├── Format(FormatError)       - YAML / JSON formatting
//! ├── Changelog(ChangelogError) - revision history patching
//! │   └── Version(VersionError)
//! └── Package(PackageError)     - package root discovery and file I/O
//! ```

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for the package tool.
///
/// Aggregates domain-specific sub-errors and is convertible to
/// [`anyhow::Error`] for use at CLI command boundaries.
#[derive(Error, Debug)]
pub enum IntpkgError {
    /// Document engine error.
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// Formatting error.
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Changelog error.
    #[error("Changelog error: {0}")]
    Changelog(#[from] ChangelogError),

    /// Package layout or file access error.
    #[error("Package error: {0}")]
    Package(#[from] PackageError),
}

/// Errors raised by the document engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// The input is not a well-formed document.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// A structural precondition was violated.
    #[error(transparent)]
    Shape(#[from] ShapeError),

    /// The tree cannot be serialized.
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// The input bytes do not form a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// There is no content at all (empty, whitespace or comments only).
    #[error("document is empty")]
    Empty,

    /// The input has content but it is not well formed.
    #[error("line {line}: {message}")]
    Malformed {
        /// 1-based line number where the problem was detected.
        line: usize,
        /// Human-readable description of the problem.
        message: String,
    },
}

/// A structural precondition on the tree does not hold.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// Two values under the same key cannot be merged because one of them
    /// is not a mapping.
    #[error("cannot merge duplicate key '{key}': both values must be mappings")]
    IncompatibleMerge {
        /// The duplicated key.
        key: String,
    },

    /// A mapping node holds an odd number of children.
    #[error("mapping has an odd number of children ({len})")]
    OddMapping {
        /// Number of children found.
        len: usize,
    },

    /// The document root was expected to be a mapping.
    #[error("unexpected manifest content: not a map")]
    NotAMapping,

    /// The document root was expected to be a sequence.
    #[error("unexpected changelog content: not a list")]
    NotASequence,

    /// A field exists but has the wrong shape.
    #[error("invalid field '{field}': {reason}")]
    InvalidField {
        /// Name of the offending field.
        field: String,
        /// Why the field was rejected.
        reason: String,
    },
}

/// The tree handed to the serializer has an impossible shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A mapping node holds an odd number of children.
    #[error("cannot encode mapping with an odd number of children ({len})")]
    OddMapping {
        /// Number of children found.
        len: usize,
    },

    /// A mapping key is a collection instead of a scalar.
    #[error("cannot encode mapping key that is not a scalar")]
    NonScalarKey,

    /// A document node does not hold exactly one root.
    #[error("document node must have exactly one child, found {children}")]
    BadDocument {
        /// Number of children found.
        children: usize,
    },

    /// A document node was found below the root.
    #[error("document node cannot be nested")]
    NestedDocument,
}

/// Errors raised while formatting a single file.
#[derive(Error, Debug)]
pub enum FormatError {
    /// The YAML document engine rejected the input.
    #[error("formatting YAML document failed: {0}")]
    Document(#[from] DocumentError),

    /// The input is not valid JSON.
    #[error("formatting JSON document failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Semantic-version failures.
#[derive(Error, Debug)]
pub enum VersionError {
    /// A version string is not valid semver.
    #[error("invalid version '{version}': {source}")]
    Parse {
        /// The rejected text.
        version: String,
        /// Underlying parser error.
        source: semver::Error,
    },

    /// The newest entry in the history is newer than the patch.
    #[error("cannot add change to old version (found {found}, patch {patch})")]
    Regression {
        /// Newest version present in the history.
        found: String,
        /// Version carried by the patch.
        patch: String,
    },

    /// The history was scanned but no entry was merged or inserted.
    #[error("changelog entry was not added, this is probably a bug")]
    NotAdded,
}

/// Errors raised by changelog and manifest patching.
#[derive(Error, Debug)]
pub enum ChangelogError {
    /// The underlying document could not be parsed or serialized.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// A version could not be parsed or is out of order.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// The change type is not one of the accepted values.
    #[error("invalid change type '{kind}', expected one of: {allowed}")]
    InvalidChangeType {
        /// The rejected type.
        kind: String,
        /// Comma-separated accepted types.
        allowed: String,
    },
}

impl From<ShapeError> for ChangelogError {
    fn from(err: ShapeError) -> Self {
        Self::Document(DocumentError::Shape(err))
    }
}

impl From<SyntaxError> for ChangelogError {
    fn from(err: SyntaxError) -> Self {
        Self::Document(DocumentError::Syntax(err))
    }
}

/// Errors raised while locating or reading a package.
#[derive(Error, Debug)]
pub enum PackageError {
    /// No `manifest.yml` was found in the start directory or its ancestors.
    #[error(
        "package root not found (no manifest.yml in {} or any parent directory)",
        start.display()
    )]
    RootNotFound {
        /// Directory the search started from.
        start: PathBuf,
    },

    /// A package file could not be read or written.
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// Path of the file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use std::io;

    // -----------------------------------------------------------------------
    // DocumentError
    // -----------------------------------------------------------------------

    #[test]
    fn syntax_error_empty_display() {
        assert_eq!(SyntaxError::Empty.to_string(), "document is empty");
    }

    #[test]
    fn syntax_error_malformed_display() {
        let e = SyntaxError::Malformed {
            line: 3,
            message: "unterminated flow collection".to_string(),
        };
        assert_eq!(e.to_string(), "line 3: unterminated flow collection");
    }

    #[test]
    fn empty_and_malformed_are_distinct() {
        let malformed = SyntaxError::Malformed {
            line: 1,
            message: "x".to_string(),
        };
        assert_ne!(SyntaxError::Empty, malformed);
    }

    #[test]
    fn shape_error_displays() {
        let e = ShapeError::IncompatibleMerge {
            key: "es".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "cannot merge duplicate key 'es': both values must be mappings"
        );
        assert_eq!(
            ShapeError::NotAMapping.to_string(),
            "unexpected manifest content: not a map"
        );
    }

    #[test]
    fn encode_error_odd_mapping_display() {
        let e = EncodeError::OddMapping { len: 3 };
        assert_eq!(
            e.to_string(),
            "cannot encode mapping with an odd number of children (3)"
        );
    }

    #[test]
    fn document_error_is_transparent() {
        let e: DocumentError = SyntaxError::Empty.into();
        assert_eq!(e.to_string(), "document is empty");
    }

    // -----------------------------------------------------------------------
    // VersionError / ChangelogError
    // -----------------------------------------------------------------------

    #[test]
    fn version_error_regression_display() {
        let e = VersionError::Regression {
            found: "2.0.0".to_string(),
            patch: "1.9.0".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "cannot add change to old version (found 2.0.0, patch 1.9.0)"
        );
    }

    #[test]
    fn version_error_parse_has_source() {
        use std::error::Error as StdError;
        let source = semver::Version::parse("not-a-version").expect_err("must fail");
        let e = VersionError::Parse {
            version: "not-a-version".to_string(),
            source,
        };
        assert!(e.to_string().starts_with("invalid version 'not-a-version'"));
        assert!(e.source().is_some());
    }

    #[test]
    fn version_error_not_added_display() {
        assert_eq!(
            VersionError::NotAdded.to_string(),
            "changelog entry was not added, this is probably a bug"
        );
    }

    #[test]
    fn changelog_error_from_shape_error() {
        let e: ChangelogError = ShapeError::NotASequence.into();
        assert!(matches!(
            e,
            ChangelogError::Document(DocumentError::Shape(ShapeError::NotASequence))
        ));
    }

    // -----------------------------------------------------------------------
    // PackageError
    // -----------------------------------------------------------------------

    #[test]
    fn package_error_root_not_found_display() {
        let e = PackageError::RootNotFound {
            start: PathBuf::from("/tmp/work"),
        };
        assert!(e.to_string().contains("/tmp/work"));
        assert!(e.to_string().contains("manifest.yml"));
    }

    #[test]
    fn package_error_io_has_source() {
        use std::error::Error as StdError;
        let e = PackageError::Io {
            path: PathBuf::from("/pkg/changelog.yml"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert!(e.to_string().contains("/pkg/changelog.yml"));
        assert!(e.source().is_some());
    }

    // -----------------------------------------------------------------------
    // IntpkgError conversions
    // -----------------------------------------------------------------------

    #[test]
    fn intpkg_error_from_document_error() {
        let e: IntpkgError = DocumentError::from(SyntaxError::Empty).into();
        assert!(e.to_string().contains("Document error"));
    }

    #[test]
    fn intpkg_error_from_changelog_error() {
        let e: IntpkgError = ChangelogError::from(VersionError::NotAdded).into();
        assert!(e.to_string().contains("Changelog error"));
    }

    // -----------------------------------------------------------------------
    // Send + Sync bounds
    // -----------------------------------------------------------------------

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<IntpkgError>();
        assert_send_sync::<DocumentError>();
        assert_send_sync::<FormatError>();
        assert_send_sync::<ChangelogError>();
        assert_send_sync::<VersionError>();
        assert_send_sync::<PackageError>();
    }

    // -----------------------------------------------------------------------
    // anyhow conversion
    // -----------------------------------------------------------------------

    #[test]
    fn document_error_converts_to_anyhow() {
        let e = DocumentError::from(EncodeError::NonScalarKey);
        let _anyhow_err: anyhow::Error = e.into();
    }

    #[test]
    fn changelog_error_converts_to_anyhow() {
        let e = ChangelogError::from(VersionError::NotAdded);
        let _anyhow_err: anyhow::Error = e.into();
    }
}
