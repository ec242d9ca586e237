//! Duplicate-key merging for mappings produced by dotted-key expansion.

use std::collections::HashMap;

use super::node::{Node, join_comments};
use crate::error::ShapeError;

/// Collapse sibling keys with the same name in every mapping of the tree.
///
/// The first occurrence of a key is kept in place. Each later duplicate's
/// value children are appended to the first value's children and the
/// duplicate pair is dropped. Mappings are visited top-down, so duplicates
/// created in a child mapping by a merge are resolved when it is visited.
///
/// # Errors
///
/// Returns [`ShapeError::IncompatibleMerge`] when either value of a
/// duplicated key is not a mapping, and [`ShapeError::OddMapping`] for a
/// mapping with an odd number of children. The tree is left partially
/// merged on error and should be discarded.
pub fn merge_duplicate_keys(node: &mut Node) -> Result<(), ShapeError> {
    if node.is_mapping() {
        merge_mapping(node)?;
    }
    for child in &mut node.children {
        merge_duplicate_keys(child)?;
    }
    Ok(())
}

fn merge_mapping(map: &mut Node) -> Result<(), ShapeError> {
    let len = map.children.len();
    if len % 2 != 0 {
        return Err(ShapeError::OddMapping { len });
    }

    let mut merged: Vec<Node> = Vec::with_capacity(len);
    // Key text -> index of its value in `merged`.
    let mut first_seen: HashMap<String, usize> = HashMap::new();
    let mut entries = std::mem::take(&mut map.children).into_iter();
    while let Some(key) = entries.next() {
        let Some(value) = entries.next() else {
            break;
        };
        let seen = if key.is_scalar() {
            first_seen.get(&key.value).copied()
        } else {
            None
        };
        let Some(anchor) = seen.and_then(|i| merged.get_mut(i)) else {
            if key.is_scalar() {
                first_seen.insert(key.value.clone(), merged.len() + 1);
            }
            merged.push(key);
            merged.push(value);
            continue;
        };

        if !anchor.is_mapping() || !value.is_mapping() {
            return Err(ShapeError::IncompatibleMerge { key: key.value });
        }
        tracing::debug!(key = %key.value, moved = value.children.len() / 2, "merging duplicate key");

        let mut moved = value.children;
        let dropped_comments = join_comments(
            &join_comments(&key.head_comment, &key.line_comment),
            &key.foot_comment,
        );
        if let Some(first_key) = moved.first_mut() {
            first_key.head_comment = join_comments(&dropped_comments, &first_key.head_comment);
        }
        anchor.children.append(&mut moved);
    }

    map.children = merged;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::document::{Style, expand_dotted_keys, parse, serialize};

    fn expanded_and_merged(input: &str) -> String {
        let mut doc = parse(input.as_bytes()).unwrap();
        expand_dotted_keys(&mut doc);
        merge_duplicate_keys(&mut doc).unwrap();
        String::from_utf8(serialize(&doc).unwrap()).unwrap()
    }

    #[test]
    fn merges_expanded_siblings_in_order() {
        assert_eq!(expanded_and_merged("es.a: 1\nes.b: 2\n"), "es:\n  a: 1\n  b: 2\n");
    }

    #[test]
    fn merges_into_existing_mapping() {
        assert_eq!(
            expanded_and_merged("es:\n  x: 0\nother: 1\nes.a: 1\n"),
            "es:\n  x: 0\n  a: 1\nother: 1\n"
        );
    }

    #[test]
    fn merges_recursively() {
        assert_eq!(
            expanded_and_merged("a.b.c: 1\na.b.d: 2\na.e: 3\n"),
            "a:\n  b:\n    c: 1\n    d: 2\n  e: 3\n"
        );
    }

    #[test]
    fn dropped_key_comments_move_to_first_moved_key() {
        let out = expanded_and_merged("es.a: 1\n# about b\nes.b: 2\n");
        assert_eq!(out, "es:\n  a: 1\n  # about b\n  b: 2\n");
    }

    #[test]
    fn scalar_and_mapping_do_not_merge() {
        let mut doc = parse(b"es: 1\nes.a: 2\n").unwrap();
        expand_dotted_keys(&mut doc);
        let err = merge_duplicate_keys(&mut doc).unwrap_err();
        assert_eq!(err, ShapeError::IncompatibleMerge { key: "es".to_string() });
    }

    #[test]
    fn sequences_do_not_merge() {
        let mut doc = parse(b"a: [1]\na: [2]\n").unwrap();
        assert!(matches!(
            merge_duplicate_keys(&mut doc),
            Err(ShapeError::IncompatibleMerge { .. })
        ));
    }

    #[test]
    fn odd_mapping_is_rejected() {
        let mut node = Node::mapping(vec![Node::scalar("a", Style::Plain)]);
        assert_eq!(
            merge_duplicate_keys(&mut node),
            Err(ShapeError::OddMapping { len: 1 })
        );
    }

    #[test]
    fn merges_inside_sequence_items() {
        assert_eq!(
            expanded_and_merged("- x.a: 1\n  x.b: 2\n"),
            "- x:\n    a: 1\n    b: 2\n"
        );
    }
}
