//! Comment-preserving edits of `changelog.yml` and `manifest.yml`.

use std::cmp::Ordering;

use super::{Change, Revision, compare_versions, parse_version};
use crate::document::{self, Node, Style};
use crate::error::{ChangelogError, DocumentError, ShapeError, SyntaxError, VersionError};
use crate::formatter::yaml;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Scanning,
    Merged,
    Inserted,
}

/// Add the changes of `patch` to a changelog.
///
/// Entries are scanned newest first. An entry with the patch's version
/// gets the new changes in front of its existing ones; an older first
/// entry gets a new entry inserted above it, which takes over the comment
/// written above that entry. Entries that do not decode as revisions are
/// copied through unchanged. An empty or comment-only changelog becomes a
/// single-entry history that keeps the comment.
///
/// # Errors
///
/// - [`VersionError::Parse`] if the patch or a decoded entry has an invalid version.
/// - [`VersionError::Regression`] if the newest entry is newer than the patch.
/// - [`VersionError::NotAdded`] if no entry could be decoded at all.
/// - [`ShapeError::NotASequence`] if the changelog root is not a sequence.
///
/// No output is produced on error.
pub fn patch_yaml(content: &[u8], patch: &Revision) -> Result<Vec<u8>, ChangelogError> {
    let patch_version = parse_version(&patch.version)?;

    let mut doc = match document::parse(content) {
        Ok(doc) => doc,
        Err(SyntaxError::Empty) => {
            let mut entry = patch.to_node();
            entry.head_comment = document::comments(content);
            tracing::debug!(version = %patch.version, "creating changelog");
            return finish(&Node::document(Node::sequence(vec![entry])));
        }
        Err(e) => return Err(e.into()),
    };
    let root = doc
        .root_mut()
        .filter(|r| r.is_sequence())
        .ok_or(ShapeError::NotASequence)?;

    let entries = std::mem::take(&mut root.children);
    let mut result = Vec::with_capacity(entries.len() + 1);
    let mut state = State::Scanning;
    for mut node in entries {
        if state != State::Scanning {
            result.push(node);
            continue;
        }
        let Ok(entry) = Revision::from_node(&node) else {
            result.push(node);
            continue;
        };

        let found = entry.parsed_version()?;
        match compare_versions(&found, &patch_version) {
            Ordering::Greater => {
                return Err(VersionError::Regression {
                    found: entry.version,
                    patch: patch.version.clone(),
                }
                .into());
            }
            Ordering::Equal => {
                tracing::debug!(version = %entry.version, "adding changes to existing version");
                prepend_changes(&mut node, &patch.changes);
                result.push(node);
                state = State::Merged;
            }
            Ordering::Less => {
                tracing::debug!(before = %entry.version, version = %patch.version, "adding new version");
                let mut new_entry = patch.to_node();
                new_entry.head_comment = std::mem::take(&mut node.head_comment);
                result.push(new_entry);
                result.push(node);
                state = State::Inserted;
            }
        }
    }

    if state == State::Scanning {
        if !result.is_empty() {
            return Err(VersionError::NotAdded.into());
        }
        // `[]`: start the history as a block sequence.
        root.style = Style::Plain;
        result.push(patch.to_node());
    }
    root.children = result;
    finish(&doc)
}

/// Put `changes` in front of the existing changes of `entry` and
/// double-quote its version. Other keys and all comments are kept.
fn prepend_changes(entry: &mut Node, changes: &[Change]) {
    if let Some(version) = entry.get_mut("version") {
        version.style = Style::DoubleQuoted;
    }
    let new_nodes = changes.iter().map(Change::to_node);
    match entry.get_mut("changes") {
        Some(existing) if existing.is_sequence() => {
            let old = std::mem::take(&mut existing.children);
            existing.children = new_nodes.chain(old).collect();
            existing.style = Style::Plain;
        }
        Some(existing) => {
            let mut sequence = Node::sequence(new_nodes.collect());
            sequence.line_comment = std::mem::take(&mut existing.line_comment);
            *existing = sequence;
        }
        None => entry.push_pair(Node::string("changes"), Node::sequence(new_nodes.collect())),
    }
}

/// Overwrite the top-level `version` of a manifest.
///
/// The value's style is kept and the text is not validated. A manifest
/// without a `version` key is returned re-formatted but otherwise
/// unchanged.
///
/// # Errors
///
/// Returns an error if the document does not parse, its root is not a
/// mapping, or `version` holds a collection.
pub fn set_manifest_version(content: &[u8], version: &str) -> Result<Vec<u8>, ChangelogError> {
    let mut doc = document::parse(content)?;
    let root = doc
        .root_mut()
        .filter(|r| r.is_mapping())
        .ok_or(ShapeError::NotAMapping)?;

    match root.get_mut("version") {
        Some(value) if value.is_scalar() => {
            tracing::debug!(from = %value.value, to = version, "setting manifest version");
            value.value = version.to_string();
        }
        Some(_) => {
            return Err(ShapeError::InvalidField {
                field: "version".to_string(),
                reason: "not a scalar".to_string(),
            }
            .into());
        }
        None => {
            tracing::debug!("manifest has no version key");
        }
    }
    finish(&doc)
}

fn finish(doc: &Node) -> Result<Vec<u8>, ChangelogError> {
    let bytes = document::serialize(doc).map_err(DocumentError::from)?;
    Ok(yaml::format(&bytes, false)?.content)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn change(description: &str, kind: &str, link: &str) -> Change {
        Change {
            description: description.to_string(),
            kind: kind.to_string(),
            link: link.to_string(),
        }
    }

    fn revision(version: &str) -> Revision {
        Revision {
            version: version.to_string(),
            changes: vec![change(
                "Fix bug",
                "bugfix",
                "https://github.com/elastic/integrations/pull/2",
            )],
        }
    }

    fn patched(content: &str, patch: &Revision) -> String {
        String::from_utf8(patch_yaml(content.as_bytes(), patch).unwrap()).unwrap()
    }

    const ONE_RELEASE: &str = "\
# newer versions go on top
- version: \"1.0.0\"
  changes:
    - description: Initial release
      type: enhancement
      link: https://github.com/elastic/integrations/pull/1
";

    #[test]
    fn merges_into_matching_version_keeping_comment() {
        insta::assert_snapshot!(patched(ONE_RELEASE, &revision("1.0.0")), @r#"
        # newer versions go on top
        - version: "1.0.0"
          changes:
            - description: Fix bug
              type: bugfix
              link: https://github.com/elastic/integrations/pull/2
            - description: Initial release
              type: enhancement
              link: https://github.com/elastic/integrations/pull/1
        "#);
    }

    #[test]
    fn inserts_newer_version_on_top() {
        insta::assert_snapshot!(patched(ONE_RELEASE, &revision("2.0.0")), @r#"
        # newer versions go on top
        - version: "2.0.0"
          changes:
            - description: Fix bug
              type: bugfix
              link: https://github.com/elastic/integrations/pull/2
        - version: "1.0.0"
          changes:
            - description: Initial release
              type: enhancement
              link: https://github.com/elastic/integrations/pull/1
        "#);
    }

    #[test]
    fn inserted_version_leaves_older_entry_untouched() {
        let input = "- version: 1.0.0 # first\n  changes: []\n  extra: kept\n";
        let out = patched(input, &revision("1.1.0"));
        assert!(out.ends_with("- version: 1.0.0 # first\n  changes: []\n  extra: kept\n"));
    }

    #[test]
    fn merge_quotes_version_and_keeps_other_keys() {
        let input = "- version: 1.0.0 # current\n  changes: []\n  extra: kept\n";
        let out = patched(input, &revision("1.0.0"));
        assert_eq!(
            out,
            "- version: \"1.0.0\" # current\n  changes:\n    - description: Fix bug\n      type: bugfix\n      link: https://github.com/elastic/integrations/pull/2\n  extra: kept\n"
        );
    }

    #[test]
    fn older_patch_is_rejected() {
        let input = "- version: \"2.0.0\"\n  changes: []\n";
        let err = patch_yaml(input.as_bytes(), &revision("1.9.0")).unwrap_err();
        assert!(matches!(
            err,
            ChangelogError::Version(VersionError::Regression { .. })
        ));
        assert_eq!(
            err.to_string(),
            "cannot add change to old version (found 2.0.0, patch 1.9.0)"
        );
    }

    #[test]
    fn build_metadata_does_not_affect_matching() {
        let input = "- version: \"1.0.0+build.1\"\n  changes: []\n";
        let out = patched(input, &revision("1.0.0"));
        assert!(out.starts_with("- version: \"1.0.0+build.1\"\n  changes:\n    - description: Fix bug"));
    }

    #[test]
    fn empty_changelog_gets_single_entry() {
        insta::assert_snapshot!(patched("", &revision("0.1.0")), @r#"
        - version: "0.1.0"
          changes:
            - description: Fix bug
              type: bugfix
              link: https://github.com/elastic/integrations/pull/2
        "#);
    }

    #[test]
    fn comment_only_changelog_keeps_comment() {
        let out = patched("# newer versions go on top\n", &revision("0.1.0"));
        assert!(out.starts_with("# newer versions go on top\n- version: \"0.1.0\"\n"));
    }

    #[test]
    fn empty_flow_sequence_gets_single_entry() {
        let out = patched("[]\n", &revision("0.1.0"));
        assert!(out.starts_with("- version: \"0.1.0\"\n  changes:\n"));
    }

    #[test]
    fn undecodable_entries_are_copied_through() {
        let input = "- just a note\n- version: \"1.0.0\"\n  changes: []\n";
        let out = patched(input, &revision("1.1.0"));
        assert!(out.starts_with("- just a note\n- version: \"1.1.0\"\n"));
        assert!(out.ends_with("- version: \"1.0.0\"\n  changes: []\n"));
    }

    #[test]
    fn nothing_decodable_is_not_added() {
        let err = patch_yaml(b"- just a note\n- [1, 2]\n", &revision("1.0.0")).unwrap_err();
        assert!(matches!(err, ChangelogError::Version(VersionError::NotAdded)));
    }

    #[test]
    fn invalid_versions_are_errors() {
        let err = patch_yaml(b"- version: latest\n", &revision("1.0.0")).unwrap_err();
        assert!(matches!(err, ChangelogError::Version(VersionError::Parse { .. })));
        let err = patch_yaml(ONE_RELEASE.as_bytes(), &revision("next")).unwrap_err();
        assert!(matches!(err, ChangelogError::Version(VersionError::Parse { .. })));
    }

    #[test]
    fn mapping_changelog_is_rejected() {
        let err = patch_yaml(b"version: 1.0.0\n", &revision("1.0.0")).unwrap_err();
        assert!(matches!(
            err,
            ChangelogError::Document(DocumentError::Shape(ShapeError::NotASequence))
        ));
    }

    #[test]
    fn set_manifest_version_overwrites_in_place() {
        let input = b"format_version: 3.0.0\nname: apache\nversion: \"1.0.0\" # bumped by tooling\n";
        let out = set_manifest_version(input, "1.1.0").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "format_version: 3.0.0\nname: apache\nversion: \"1.1.0\" # bumped by tooling\n"
        );
    }

    #[test]
    fn set_manifest_version_without_key_is_a_no_op() {
        let input = b"# manifest\n\nname: apache\ntitle: Apache\n";
        let out = set_manifest_version(input, "9.9.9").unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn set_manifest_version_requires_mapping() {
        let err = set_manifest_version(b"- a\n", "1.0.0").unwrap_err();
        assert_eq!(err.to_string(), "unexpected manifest content: not a map");
    }

    #[test]
    fn set_manifest_version_rejects_collection_value() {
        let err = set_manifest_version(b"version:\n  major: 1\n", "1.0.0").unwrap_err();
        assert!(matches!(
            err,
            ChangelogError::Document(DocumentError::Shape(ShapeError::InvalidField { .. }))
        ));
    }

    #[test]
    fn patched_output_is_canonical() {
        let out = patch_yaml(ONE_RELEASE.as_bytes(), &revision("1.0.1")).unwrap();
        assert!(yaml::format(&out, false).unwrap().already_formatted);
    }
}
