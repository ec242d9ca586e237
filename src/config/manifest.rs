//! Package manifest lookup: root discovery and the fields the tool reads.
use anyhow::{Context, Result};
use semver::Version;
use std::path::{Path, PathBuf};

use crate::document::{self, Node};
use crate::error::{DocumentError, PackageError, ShapeError, VersionError};

/// Name of the package manifest file.
pub const MANIFEST_FILE: &str = "manifest.yml";

/// Format version assumed when the manifest does not declare one.
pub const DEFAULT_FORMAT_VERSION: Version = Version::new(3, 0, 0);

/// The top-level manifest fields used by the tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageManifest {
    /// Package name.
    pub name: Option<String>,
    /// Package version, as written.
    pub version: Option<String>,
    /// Package format (spec) version that selects formatting rules.
    pub format_version: Option<Version>,
}

impl PackageManifest {
    /// Decode manifest bytes.
    ///
    /// Only top-level scalar values are read; other fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be parsed, its root is not a
    /// mapping, or `format_version` is not a valid semantic version.
    pub fn parse(content: &[u8]) -> Result<Self> {
        let doc = document::parse(content).map_err(DocumentError::from)?;
        let root = doc
            .root()
            .filter(|r| r.is_mapping())
            .ok_or(ShapeError::NotAMapping)?;

        let format_version = scalar_field(root, "format_version")
            .map(|text| {
                Version::parse(&text).map_err(|source| VersionError::Parse {
                    version: text.clone(),
                    source,
                })
            })
            .transpose()?;

        Ok(Self {
            name: scalar_field(root, "name"),
            version: scalar_field(root, "version"),
            format_version,
        })
    }

    /// Read `<root>/manifest.yml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(MANIFEST_FILE);
        let content = std::fs::read(&path).map_err(|source| PackageError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse(&content).with_context(|| format!("reading {}", path.display()))
    }

    /// The format version that selects formatting rules.
    #[must_use]
    pub fn spec_version(&self) -> Version {
        self.format_version.clone().unwrap_or(DEFAULT_FORMAT_VERSION)
    }
}

fn scalar_field(root: &Node, key: &str) -> Option<String> {
    root.get(key)
        .filter(|node| node.is_scalar() && !node.value.is_empty())
        .map(|node| node.value.clone())
}

/// Find the package root: `start` or the closest ancestor that holds a
/// `manifest.yml`.
///
/// # Errors
///
/// Returns [`PackageError::RootNotFound`] if no such directory exists.
pub fn find_package_root(start: &Path) -> Result<PathBuf, PackageError> {
    start
        .ancestors()
        .find(|dir| dir.join(MANIFEST_FILE).is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| PackageError::RootNotFound {
            start: start.to_path_buf(),
        })
}
