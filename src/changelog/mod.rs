//! Package changelog model.
//!
//! A changelog is a sequence of revisions, newest first, each holding the
//! changes released in that version:
//!
//! ```yaml
//! - version: "1.1.0"
//!   changes:
//!     - description: Add dashboards
//!       type: enhancement
//!       link: https://github.com/elastic/integrations/pull/2
//! ```
//!
//! [`Revision`] and [`Change`] are decoded from document nodes for version
//! decisions only; edits go through [`patch_yaml`], which keeps the source
//! nodes and their comments.

mod patch;

use std::cmp::Ordering;

use semver::{BuildMetadata, Prerelease, Version};

use crate::document::{self, Node, Style};
use crate::error::{ChangelogError, ShapeError, SyntaxError, VersionError};

pub use patch::{patch_yaml, set_manifest_version};

/// Name of the changelog file in the package root.
pub const CHANGELOG_FILE: &str = "changelog.yml";

/// Accepted change types unless overridden in the settings file.
pub const DEFAULT_CHANGE_TYPES: [&str; 3] = ["breaking-change", "bugfix", "enhancement"];

/// One change in a revision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Change {
    /// What changed.
    pub description: String,
    /// Change type, e.g. `bugfix`.
    pub kind: String,
    /// Link to the pull request or issue.
    pub link: String,
}

impl Change {
    /// Decode a change from a mapping node. Unknown keys are ignored and
    /// missing keys decode as empty text.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError::InvalidField`] if the node is not a mapping or
    /// a known field is not a scalar.
    pub fn from_node(node: &Node) -> Result<Self, ShapeError> {
        if !node.is_mapping() {
            return Err(invalid("changes", "entries must be mappings"));
        }
        Ok(Self {
            description: scalar_text(node, "description")?,
            kind: scalar_text(node, "type")?,
            link: scalar_text(node, "link")?,
        })
    }

    /// Encode as a mapping with keys `description`, `type`, `link`.
    #[must_use]
    pub fn to_node(&self) -> Node {
        Node::mapping(vec![
            Node::string("description"),
            Node::string(&self.description),
            Node::string("type"),
            Node::string(&self.kind),
            Node::string("link"),
            Node::string(&self.link),
        ])
    }
}

/// One version of the changelog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Revision {
    /// Semantic version, as written.
    pub version: String,
    /// Changes in display order, newest first.
    pub changes: Vec<Change>,
}

impl Revision {
    /// Decode a revision from a mapping node. Unknown keys are ignored; a
    /// missing `version` decodes as empty text and a missing or null
    /// `changes` as no changes.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError::InvalidField`] if the node is not a mapping,
    /// `version` is not a scalar, or `changes` is not a sequence of
    /// mappings.
    pub fn from_node(node: &Node) -> Result<Self, ShapeError> {
        if !node.is_mapping() {
            return Err(invalid("revision", "not a mapping"));
        }
        let changes = match node.get("changes") {
            None => Vec::new(),
            Some(value) if is_null(value) => Vec::new(),
            Some(value) if value.is_sequence() => value
                .children
                .iter()
                .map(Change::from_node)
                .collect::<Result<Vec<_>, ShapeError>>()?,
            Some(_) => return Err(invalid("changes", "not a sequence")),
        };
        Ok(Self {
            version: scalar_text(node, "version")?,
            changes,
        })
    }

    /// Encode as a mapping with keys `version`, `changes`. The version is
    /// always double-quoted.
    #[must_use]
    pub fn to_node(&self) -> Node {
        Node::mapping(vec![
            Node::string("version"),
            Node::scalar(&self.version, Style::DoubleQuoted),
            Node::string("changes"),
            Node::sequence(self.changes.iter().map(Change::to_node).collect()),
        ])
    }

    /// Parse [`Revision::version`].
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::Parse`] if it is not a semantic version.
    pub fn parsed_version(&self) -> Result<Version, VersionError> {
        parse_version(&self.version)
    }
}

/// Which version component to increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bump {
    /// `x.0.0`
    Major,
    /// `_.x.0`
    Minor,
    /// `_._.x`
    Patch,
}

impl Bump {
    /// The version after `version`.
    ///
    /// Lower components are reset and pre-release and build metadata are
    /// cleared. A patch bump of a pre-release only drops the pre-release,
    /// since `1.2.3-rc1` precedes `1.2.3`.
    #[must_use]
    pub fn apply(self, version: &Version) -> Version {
        let mut next = version.clone();
        match self {
            Self::Major => {
                next.major += 1;
                next.minor = 0;
                next.patch = 0;
            }
            Self::Minor => {
                next.minor += 1;
                next.patch = 0;
            }
            Self::Patch => {
                if next.pre.is_empty() && next.build.is_empty() {
                    next.patch += 1;
                }
            }
        }
        next.pre = Prerelease::EMPTY;
        next.build = BuildMetadata::EMPTY;
        next
    }
}

/// Parse a version as written in a changelog.
///
/// A leading `v` is accepted, and missing minor or patch components are
/// read as zero, so `1.2` is `1.2.0`.
///
/// # Errors
///
/// Returns [`VersionError::Parse`] if `text` is not a semantic version.
pub fn parse_version(text: &str) -> Result<Version, VersionError> {
    let trimmed = text.trim();
    let bare = trimmed.strip_prefix('v').unwrap_or(trimmed);
    let (core, suffix) = bare.split_at(bare.find(['-', '+']).unwrap_or(bare.len()));
    let padding = match core.matches('.').count() {
        0 => ".0.0",
        1 => ".0",
        _ => "",
    };
    Version::parse(&format!("{core}{padding}{suffix}")).map_err(|source| VersionError::Parse {
        version: text.to_string(),
        source,
    })
}

/// Compare two versions by precedence, ignoring build metadata.
#[must_use]
pub fn compare_versions(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch, &a.pre).cmp(&(b.major, b.minor, b.patch, &b.pre))
}

/// Decode a changelog.
///
/// An empty or comment-only document is an empty history.
///
/// # Errors
///
/// Returns an error if the document does not parse, its root is not a
/// sequence, or an entry cannot be decoded.
pub fn read_changelog(content: &[u8]) -> Result<Vec<Revision>, ChangelogError> {
    let doc = match document::parse(content) {
        Ok(doc) => doc,
        Err(SyntaxError::Empty) => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let root = doc
        .root()
        .filter(|r| r.is_sequence())
        .ok_or(ShapeError::NotASequence)?;
    let revisions = root
        .children
        .iter()
        .map(Revision::from_node)
        .collect::<Result<Vec<_>, ShapeError>>()?;
    tracing::debug!(revisions = revisions.len(), "read changelog");
    Ok(revisions)
}

/// Version for a new change: the newest revision's version, optionally
/// bumped. An empty history gives `0.0.0`.
///
/// # Errors
///
/// Returns [`VersionError::Parse`] if the newest version is not valid.
pub fn next_version(revisions: &[Revision], bump: Option<Bump>) -> Result<Version, VersionError> {
    let Some(newest) = revisions.first() else {
        return Ok(Version::new(0, 0, 0));
    };
    let current = newest.parsed_version()?;
    Ok(match bump {
        Some(bump) => bump.apply(&current),
        None => current,
    })
}

fn invalid(field: &str, reason: &str) -> ShapeError {
    ShapeError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

fn is_null(node: &Node) -> bool {
    node.is_scalar()
        && node.style == Style::Plain
        && matches!(node.value.as_str(), "" | "~" | "null" | "Null" | "NULL")
}

/// Text of scalar field `key`, empty when absent or null.
fn scalar_text(map: &Node, key: &str) -> Result<String, ShapeError> {
    match map.get(key) {
        None => Ok(String::new()),
        Some(value) if is_null(value) => Ok(String::new()),
        Some(value) if value.is_scalar() => Ok(value.value.clone()),
        Some(_) => Err(invalid(key, "not a scalar")),
    }
}
