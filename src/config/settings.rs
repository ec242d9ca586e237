//! Tool settings read from `.intpkg.toml` in the package root.
use anyhow::Result;
use serde::Deserialize;
use std::path::Path;

use super::toml_loader::load_config;
use crate::changelog::{CHANGELOG_FILE, DEFAULT_CHANGE_TYPES};

/// Name of the optional settings file in the package root.
pub const SETTINGS_FILE: &str = ".intpkg.toml";

/// All tool settings. Every field has a default, so an absent file or an
/// empty section is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// `[format]` section.
    pub format: FormatSettings,
    /// `[changelog]` section.
    pub changelog: ChangelogSettings,
}

/// `[format]` settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FormatSettings {
    /// Directory names that are never descended into.
    pub skip_dirs: Vec<String>,
    /// Format files in parallel.
    pub parallel: bool,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            skip_dirs: vec!["ingest_pipeline".to_string()],
            parallel: true,
        }
    }
}

/// `[changelog]` settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChangelogSettings {
    /// Changelog file name, relative to the package root.
    pub file: String,
    /// Accepted values for a change's `type`.
    pub change_types: Vec<String>,
}

impl Default for ChangelogSettings {
    fn default() -> Self {
        Self {
            file: CHANGELOG_FILE.to_string(),
            change_types: DEFAULT_CHANGE_TYPES.iter().map(ToString::to_string).collect(),
        }
    }
}

impl Settings {
    /// Load settings from `<root>/.intpkg.toml`, falling back to defaults
    /// when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(root: &Path) -> Result<Self> {
        load_config(&root.join(SETTINGS_FILE))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.format.skip_dirs, vec!["ingest_pipeline"]);
        assert!(settings.format.parallel);
        assert_eq!(settings.changelog.file, "changelog.yml");
        assert_eq!(
            settings.changelog.change_types,
            vec!["breaking-change", "bugfix", "enhancement"]
        );
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Settings::load(dir.path()).unwrap(), Settings::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            "[format]\nparallel = false\n\n[changelog]\nchange_types = [\"bugfix\"]\n",
        )
        .unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert!(!settings.format.parallel);
        assert_eq!(settings.format.skip_dirs, vec!["ingest_pipeline"]);
        assert_eq!(settings.changelog.change_types, vec!["bugfix"]);
        assert_eq!(settings.changelog.file, "changelog.yml");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "[format]\nfoo = 1\n").unwrap();
        assert!(Settings::load(dir.path()).is_err());
    }
}
