//! Command: changelog maintenance.
use std::path::Path;

use anyhow::{Context as _, Result};

use crate::changelog::{
    Bump, Change, Revision, next_version, patch_yaml, read_changelog, set_manifest_version,
};
use crate::cli::{ChangelogAddOpts, ChangelogCommand, GlobalOpts};
use crate::config::manifest::MANIFEST_FILE;
use crate::error::{ChangelogError, PackageError};
use crate::logging::{FileStatus, Logger};

/// Run a changelog subcommand.
///
/// # Errors
///
/// Returns an error if the subcommand fails.
pub fn run(global: &GlobalOpts, command: &ChangelogCommand, log: &Logger) -> Result<()> {
    match command {
        ChangelogCommand::Add(opts) => add(global, opts, log),
    }
}

/// Add a change to the changelog and set the manifest version to match.
///
/// Both files are written only after both edits succeed.
///
/// # Errors
///
/// Returns an error if the change type is not accepted, the target version
/// cannot be computed, either file cannot be read, patched or written.
pub fn add(global: &GlobalOpts, opts: &ChangelogAddOpts, log: &Logger) -> Result<()> {
    let setup = super::CommandSetup::init(global, log)?;
    let settings = &setup.config.settings.changelog;
    validate_change_type(&opts.change_type, &settings.change_types)?;

    let changelog_path = setup.root().join(&settings.file);
    let manifest_path = setup.root().join(MANIFEST_FILE);
    let changelog = read_optional(&changelog_path)?;

    let version = match &opts.version {
        Some(version) => version.clone(),
        None => {
            let revisions = read_changelog(&changelog)
                .with_context(|| format!("failed to read {}", changelog_path.display()))?;
            next_version(&revisions, opts.next.map(Bump::from))?.to_string()
        }
    };
    let revision = Revision {
        version,
        changes: vec![Change {
            description: opts.description.clone(),
            kind: opts.change_type.clone(),
            link: opts.link.clone(),
        }],
    };

    log.stage(&format!("Adding {} change to {}", opts.change_type, revision.version));
    let patched_changelog = patch_yaml(&changelog, &revision)
        .with_context(|| format!("failed to patch {}", changelog_path.display()))?;
    let manifest = read(&manifest_path)?;
    let patched_manifest = set_manifest_version(&manifest, &revision.version)
        .with_context(|| format!("failed to update {}", manifest_path.display()))?;

    write(&changelog_path, &patched_changelog)?;
    log.record_file(Path::new(&settings.file), FileStatus::Written, None);
    write(&manifest_path, &patched_manifest)?;
    log.record_file(Path::new(MANIFEST_FILE), FileStatus::Written, None);
    log.print_summary();
    Ok(())
}

/// Check `kind` against the accepted change types.
///
/// # Errors
///
/// Returns [`ChangelogError::InvalidChangeType`] if it is not accepted.
pub fn validate_change_type(kind: &str, allowed: &[String]) -> Result<(), ChangelogError> {
    if allowed.iter().any(|a| a == kind) {
        return Ok(());
    }
    Err(ChangelogError::InvalidChangeType {
        kind: kind.to_string(),
        allowed: allowed.join(", "),
    })
}

fn read(path: &Path) -> Result<Vec<u8>, PackageError> {
    std::fs::read(path).map_err(|source| PackageError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// A missing changelog reads as empty so a first entry can be added.
fn read_optional(path: &Path) -> Result<Vec<u8>, PackageError> {
    match std::fs::read(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        other => other.map_err(|source| PackageError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn write(path: &Path, content: &[u8]) -> Result<(), PackageError> {
    std::fs::write(path, content).map_err(|source| PackageError::Io {
        path: path.to_path_buf(),
        source,
    })
}
