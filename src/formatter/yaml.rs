//! YAML formatting through the document engine.

use semver::Version;

use super::{Formatted, Formatter};
use crate::document::{expand_dotted_keys, merge_duplicate_keys, parse, serialize};
use crate::error::{DocumentError, FormatError};

/// First package format version whose YAML files get dotted keys expanded.
pub const DOTTED_KEYS_SINCE: Version = Version::new(3, 0, 0);

/// Format a YAML document.
///
/// Parses `content`, optionally expands dotted keys and merges the
/// duplicate keys that expansion produces, then serializes canonically.
/// `already_formatted` is byte equality between input and output.
///
/// # Errors
///
/// Returns a [`DocumentError`] when the input does not parse, when
/// duplicate keys cannot be merged, or when the tree cannot be encoded.
pub fn format(content: &[u8], expand: bool) -> Result<Formatted, DocumentError> {
    let mut doc = parse(content)?;
    if expand {
        expand_dotted_keys(&mut doc);
        merge_duplicate_keys(&mut doc)?;
    }
    let formatted = Formatted::compared_to(content, serialize(&doc)?);
    tracing::debug!(
        expand,
        already_formatted = formatted.already_formatted,
        "formatted yaml"
    );
    Ok(formatted)
}

/// YAML [`Formatter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct YamlFormatter {
    /// Expand dotted keys into nested mappings.
    pub expand_dotted_keys: bool,
}

impl YamlFormatter {
    /// Formatter for packages of format version `spec`.
    #[must_use]
    pub fn for_spec_version(spec: &Version) -> Self {
        Self {
            expand_dotted_keys: *spec >= DOTTED_KEYS_SINCE,
        }
    }
}

impl Formatter for YamlFormatter {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn format(&self, content: &[u8]) -> Result<Formatted, FormatError> {
        Ok(format(content, self.expand_dotted_keys)?)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::{ShapeError, SyntaxError};

    fn formatted_text(input: &str, expand: bool) -> String {
        String::from_utf8(format(input.as_bytes(), expand).unwrap().content).unwrap()
    }

    #[test]
    fn dotted_keys_expand_into_nested_mappings() {
        insta::assert_snapshot!(formatted_text("foo.bar.baz: 3", true), @r"
        foo:
          bar:
            baz: 3
        ");
    }

    #[test]
    fn quoted_keys_are_not_expanded() {
        assert_eq!(formatted_text("\"foo.bar\": 3", true), "\"foo.bar\": 3\n");
    }

    #[test]
    fn expanded_duplicates_are_merged_in_order() {
        insta::assert_snapshot!(formatted_text("es.a: 1\nes.b: 2", true), @r"
        es:
          a: 1
          b: 2
        ");
    }

    #[test]
    fn expansion_is_skipped_when_disabled() {
        let out = format(b"foo.bar: 3\n", false).unwrap();
        assert!(out.already_formatted);
        assert_eq!(out.content, b"foo.bar: 3\n");
    }

    #[test]
    fn expands_inside_sequences_of_mappings() {
        insta::assert_snapshot!(
            formatted_text("- name: a\n  es.type: keyword\n- name: b\n  es.type: long\n", true),
            @r"
        - name: a
          es:
            type: keyword
        - name: b
          es:
            type: long
        "
        );
    }

    #[test]
    fn canonical_input_is_reported_as_formatted() {
        let input = "# Package manifest\n\nname: apache\ntitle: \"Apache HTTP Server\"\nconditions:\n  kibana:\n    version: ^8.0.0\n";
        let out = format(input.as_bytes(), true).unwrap();
        assert!(out.already_formatted);
    }

    #[test]
    fn reformatting_is_detected_on_raw_bytes() {
        let out = format(b"a:   1\n", true).unwrap();
        assert!(!out.already_formatted);
        assert_eq!(out.content, b"a: 1\n");
    }

    #[test]
    fn document_start_marker_is_kept() {
        let out = format(b"---\nfoo.bar: 1\n", true).unwrap();
        assert_eq!(out.content, b"---\nfoo:\n  bar: 1\n");
    }

    #[test]
    fn formatting_is_idempotent() {
        let corpus = [
            "foo.bar.baz: 3",
            "es.a: 1\nes.b: 2",
            "---\n# head\n\nkey: value # trailing\nlist:\n- a\n- b\n",
            "a.b: {c.d: 1}\n",
            "description: |\n  line one\n  line two\n",
            "- version: \"1.0.0\"\n  changes:\n    - description: Initial\n      type: enhancement\n      link: https://example.com/1\n",
            "'quoted.key': x\nplain.key: [1, 2]\n",
        ];
        for input in corpus {
            let first = format(input.as_bytes(), true).unwrap();
            let second = format(&first.content, true).unwrap();
            assert!(second.already_formatted, "not idempotent: {input:?}");
            assert_eq!(second.content, first.content);
        }
    }

    #[test]
    fn merge_conflict_is_an_error() {
        let err = format(b"es: 1\nes.a: 2\n", true).unwrap_err();
        assert_eq!(
            err,
            DocumentError::Shape(ShapeError::IncompatibleMerge {
                key: "es".to_string()
            })
        );
    }

    #[test]
    fn empty_input_is_a_syntax_error() {
        let err = format(b"", true).unwrap_err();
        assert_eq!(err, DocumentError::Syntax(SyntaxError::Empty));
    }

    #[test]
    fn spec_version_selects_expansion() {
        assert!(YamlFormatter::for_spec_version(&Version::new(3, 0, 0)).expand_dotted_keys);
        assert!(YamlFormatter::for_spec_version(&Version::new(3, 1, 2)).expand_dotted_keys);
        assert!(!YamlFormatter::for_spec_version(&Version::new(2, 12, 0)).expand_dotted_keys);
        let rc = Version::parse("3.0.0-rc1").unwrap();
        assert!(!YamlFormatter::for_spec_version(&rc).expand_dotted_keys);
    }
}
