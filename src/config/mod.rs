//! Tool settings and package manifest access.
pub mod manifest;
pub mod settings;
pub mod toml_loader;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// All loaded configuration for a package.
#[derive(Debug)]
pub struct Config {
    /// Package root directory.
    pub root: PathBuf,
    /// Tool settings from `.intpkg.toml`.
    pub settings: settings::Settings,
    /// Fields read from `manifest.yml`.
    pub manifest: manifest::PackageManifest,
}

impl Config {
    /// Load the settings file and manifest of the package at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if either file exists but cannot be read or parsed,
    /// or if the manifest is missing.
    pub fn load(root: &Path) -> Result<Self> {
        let settings = settings::Settings::load(root)
            .with_context(|| format!("loading {}", settings::SETTINGS_FILE))?;
        let manifest = manifest::PackageManifest::load(root)
            .with_context(|| format!("loading {}", manifest::MANIFEST_FILE))?;
        Ok(Self {
            root: root.to_path_buf(),
            settings,
            manifest,
        })
    }
}
