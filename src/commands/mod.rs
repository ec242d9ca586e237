//! Top-level subcommand orchestration.
pub mod changelog;
pub mod format;
pub mod version;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::Config;
use crate::config::manifest::find_package_root;
use crate::logging::Logger;

/// Shared state produced by the common command setup sequence.
///
/// Encapsulates package root discovery and configuration loading so that
/// each command does not have to repeat the boilerplate.
#[derive(Debug)]
pub struct CommandSetup {
    /// Loaded package configuration.
    pub config: Config,
}

impl CommandSetup {
    /// Locate the package root and load its settings and manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if no package root is found or any configuration
    /// file fails to parse.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self> {
        let root = resolve_root(global)?;
        log.info(&format!("package: {}", root.display()));

        log.stage("Loading configuration");
        let config = Config::load(&root)?;
        log.debug(&format!(
            "name: {}",
            config.manifest.name.as_deref().unwrap_or("(unnamed)")
        ));
        log.debug(&format!(
            "version: {}",
            config.manifest.version.as_deref().unwrap_or("(none)")
        ));
        log.info(&format!(
            "format version {}",
            config.manifest.spec_version()
        ));

        Ok(Self { config })
    }

    /// Package root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.config.root
    }
}

/// Resolve the package root from `--root` or the current directory.
///
/// # Errors
///
/// Returns an error if the current directory cannot be read or no
/// directory on the way up holds a `manifest.yml`.
pub fn resolve_root(global: &GlobalOpts) -> Result<PathBuf> {
    let start = match global.root {
        Some(ref root) => root.clone(),
        None => std::env::current_dir().context("cannot determine current directory")?,
    };
    Ok(find_package_root(&start)?)
}
