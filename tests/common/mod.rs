// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed package and a fluent builder so
// each integration test can set up an isolated package without repeating
// filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use intpkg::cli::GlobalOpts;

/// Manifest written by [`TestPackageBuilder::new`].
pub const DEFAULT_MANIFEST: &str = "\
format_version: 3.0.0
name: apache
title: Apache HTTP Server
version: \"1.0.0\"
";

/// Changelog written by [`TestPackageBuilder::new`].
pub const DEFAULT_CHANGELOG: &str = "\
# newer versions go on top
- version: \"1.0.0\"
  changes:
    - description: Initial release
      type: enhancement
      link: https://github.com/elastic/integrations/pull/1
";

/// An isolated package backed by a [`tempfile::TempDir`].
///
/// The directory is automatically deleted when dropped.
pub struct TestPackage {
    /// Temporary directory containing the package.
    pub root: tempfile::TempDir,
}

impl TestPackage {
    /// Path to the package root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Absolute path of a package file.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.path().join(relative)
    }

    /// Read a package file as text.
    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path(relative)).expect("read package file")
    }

    /// Global options pointing at this package.
    pub fn global(&self) -> GlobalOpts {
        GlobalOpts {
            root: Some(self.root.path().to_path_buf()),
            parallel: true,
        }
    }
}

/// Fluent builder for [`TestPackage`].
pub struct TestPackageBuilder {
    package: TestPackage,
}

impl TestPackageBuilder {
    /// Begin building a package with the default manifest and changelog.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        let builder = Self {
            package: TestPackage { root },
        };
        builder
            .with_file("manifest.yml", DEFAULT_MANIFEST)
            .with_file("changelog.yml", DEFAULT_CHANGELOG)
    }

    /// Write `content` to `relative`, creating parent directories and
    /// overwriting any existing file.
    pub fn with_file(self, relative: &str, content: &str) -> Self {
        let path = self.package.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, content).expect("write package file");
        self
    }

    /// Replace the manifest.
    pub fn with_manifest(self, content: &str) -> Self {
        self.with_file("manifest.yml", content)
    }

    /// Replace the changelog.
    pub fn with_changelog(self, content: &str) -> Self {
        self.with_file("changelog.yml", content)
    }

    /// Remove a file written earlier.
    pub fn without_file(self, relative: &str) -> Self {
        std::fs::remove_file(self.package.path(relative)).expect("remove package file");
        self
    }

    /// Finish building and return the package.
    pub fn build(self) -> TestPackage {
        self.package
    }
}
