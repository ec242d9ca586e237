//! Canonical serializer for [`Node`] trees.
//!
//! Output uses two-space indentation, writes sequences under a mapping key
//! indented one level, keeps the first entry of a collection item on the
//! `- ` line, and resolves every scalar style to one that reads back as the
//! same text.

use super::node::{Node, NodeKind, Style};
use super::scalar::{self, Chomping};
use crate::error::EncodeError;

type Result<T> = std::result::Result<T, EncodeError>;

const INDENT: usize = 2;

/// Serialize `node` to its canonical text form.
///
/// A [`NodeKind::Document`] node writes its optional `---` marker and its
/// comments around the single root; any other node is written as a root.
///
/// # Errors
///
/// Returns an [`EncodeError`] if the tree has an impossible shape: a
/// mapping with an odd number of children, a collection used as a mapping
/// key, or a document node without exactly one child or below the root.
pub fn serialize(node: &Node) -> Result<Vec<u8>> {
    let mut emitter = Emitter::default();
    if node.kind == NodeKind::Document {
        emitter.document(node)?;
    } else {
        emitter.root(node)?;
    }
    Ok(emitter.out.into_bytes())
}

/// Where a scalar is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Block,
    Key,
    Flow,
}

#[derive(Debug, Default)]
struct Emitter {
    out: String,
}

impl Emitter {
    fn document(&mut self, doc: &Node) -> Result<()> {
        let [root] = doc.children.as_slice() else {
            return Err(EncodeError::BadDocument {
                children: doc.children.len(),
            });
        };
        if doc.explicit_start {
            self.out.push_str("---\n");
        }
        if !doc.head_comment.is_empty() {
            self.comment_lines(&doc.head_comment, 0);
            self.out.push('\n');
        }
        self.root(root)?;
        self.comment_lines(&doc.foot_comment, 0);
        Ok(())
    }

    fn root(&mut self, node: &Node) -> Result<()> {
        if node.kind == NodeKind::Document {
            return Err(EncodeError::NestedDocument);
        }
        self.comment_lines(&node.head_comment, 0);
        if node.is_block_collection() {
            let props = properties(node);
            let line = join_line_comments(&props, &node.line_comment);
            if !line.is_empty() {
                self.out.push_str(&line);
                self.out.push('\n');
            }
            self.collection(node, 0, false)?;
        } else {
            let style = resolve_style(node, Context::Block);
            if matches!(style, Style::Literal | Style::Folded) {
                let props = properties(node);
                if !props.is_empty() {
                    self.out.push_str(&props);
                    self.out.push(' ');
                }
                self.block_scalar(node, style, 0, "");
            } else {
                let text = inline(node, Context::Block)?;
                self.out.push_str(&text);
                self.line_comment(&node.line_comment);
                self.out.push('\n');
            }
        }
        self.comment_lines(&node.foot_comment, 0);
        Ok(())
    }

    fn collection(&mut self, node: &Node, indent: usize, first_inline: bool) -> Result<()> {
        match node.kind {
            NodeKind::Mapping => self.mapping_entries(node, indent, first_inline),
            NodeKind::Sequence => self.sequence_items(node, indent, first_inline),
            NodeKind::Document => Err(EncodeError::NestedDocument),
            NodeKind::Scalar => Ok(()),
        }
    }

    /// Write the entries of a block mapping at `indent`. With
    /// `first_inline`, the first key continues the current line.
    fn mapping_entries(&mut self, map: &Node, indent: usize, first_inline: bool) -> Result<()> {
        if map.children.len() % 2 != 0 {
            return Err(EncodeError::OddMapping {
                len: map.children.len(),
            });
        }
        for (i, (key, value)) in map.pairs().enumerate() {
            if key.kind != NodeKind::Scalar {
                return Err(EncodeError::NonScalarKey);
            }
            if !(first_inline && i == 0) {
                self.comment_lines(&key.head_comment, indent);
                self.comment_lines(&value.head_comment, indent);
                self.pad(indent);
            }
            let key_text = inline(key, Context::Key)?;
            self.out.push_str(&key_text);
            self.out.push(':');
            self.value_after(value, indent, &key.line_comment, false)?;
            self.comment_lines(&key.foot_comment, indent);
            self.comment_lines(&value.foot_comment, indent);
        }
        Ok(())
    }

    fn sequence_items(&mut self, seq: &Node, indent: usize, first_inline: bool) -> Result<()> {
        for (i, item) in seq.children.iter().enumerate() {
            if !(first_inline && i == 0) {
                self.leading_comments(item, indent);
                self.pad(indent);
            }
            self.out.push('-');
            self.value_after(item, indent, "", true)?;
            self.comment_lines(&item.foot_comment, indent);
        }
        Ok(())
    }

    /// Head comments written above a `- ` line: the item's own and, when
    /// the item's first entry shares that line, the entry's too.
    fn leading_comments(&mut self, item: &Node, indent: usize) {
        self.comment_lines(&item.head_comment, indent);
        if !inlines_in_sequence(item) {
            return;
        }
        match item.kind {
            NodeKind::Mapping => {
                if let Some((key, value)) = item.pairs().next() {
                    self.comment_lines(&key.head_comment, indent);
                    self.comment_lines(&value.head_comment, indent);
                }
            }
            NodeKind::Sequence => {
                if let Some(first) = item.children.first() {
                    self.leading_comments(first, indent);
                }
            }
            _ => {}
        }
    }

    /// Write `value` after a `key:` or `-` prefix already on the line at
    /// column `indent`, finishing every line it occupies.
    fn value_after(
        &mut self,
        value: &Node,
        indent: usize,
        owner_comment: &str,
        in_sequence: bool,
    ) -> Result<()> {
        if value.kind == NodeKind::Document {
            return Err(EncodeError::NestedDocument);
        }
        let props = properties(value);
        if value.is_block_collection() {
            if in_sequence && inlines_in_sequence(value) && owner_comment.is_empty() {
                self.out.push(' ');
                return self.collection(value, indent + INDENT, true);
            }
            if !props.is_empty() {
                self.out.push(' ');
                self.out.push_str(&props);
            }
            self.line_comment(&join_line_comments(owner_comment, &value.line_comment));
            self.out.push('\n');
            return self.collection(value, indent + INDENT, false);
        }

        let style = resolve_style(value, Context::Block);
        if matches!(style, Style::Literal | Style::Folded) {
            self.out.push(' ');
            if !props.is_empty() {
                self.out.push_str(&props);
                self.out.push(' ');
            }
            self.block_scalar(value, style, indent, owner_comment);
            return Ok(());
        }

        let text = inline(value, Context::Block)?;
        if !text.is_empty() {
            self.out.push(' ');
            self.out.push_str(&text);
        }
        self.line_comment(&join_line_comments(owner_comment, &value.line_comment));
        self.out.push('\n');
        Ok(())
    }

    /// Write a `|` or `>` header and the indented body lines.
    fn block_scalar(&mut self, node: &Node, style: Style, indent: usize, owner_comment: &str) {
        let chomping = Chomping::for_value(&node.value);
        let body = node.value.trim_end_matches('\n');
        let trailing = node.value.len() - body.len();
        let leading_space = body
            .split('\n')
            .find(|line| !line.is_empty())
            .is_some_and(|line| line.starts_with(' '));

        self.out.push(if style == Style::Folded { '>' } else { '|' });
        if leading_space {
            self.out.push_str(&INDENT.to_string());
        }
        self.out.push_str(chomping.indicator());
        self.line_comment(&join_line_comments(owner_comment, &node.line_comment));
        self.out.push('\n');

        let lines: Vec<String> = if style == Style::Folded {
            scalar::unfold(body).unwrap_or_default()
        } else {
            body.split('\n').map(str::to_string).collect()
        };
        for line in &lines {
            if !line.is_empty() {
                self.pad(indent + INDENT);
                self.out.push_str(line);
            }
            self.out.push('\n');
        }
        if chomping == Chomping::Keep {
            self.out.push_str(&"\n".repeat(trailing.saturating_sub(1)));
        }
    }

    fn line_comment(&mut self, comment: &str) {
        if comment.is_empty() {
            return;
        }
        self.out.push(' ');
        self.out.push_str(&normalize_comment(&comment.replace('\n', " ")));
    }

    fn comment_lines(&mut self, text: &str, indent: usize) {
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            self.pad(indent);
            self.out.push_str(&normalize_comment(line));
            self.out.push('\n');
        }
    }

    fn pad(&mut self, indent: usize) {
        self.out.extend(std::iter::repeat_n(' ', indent));
    }
}

/// A block collection item whose first entry can share the `- ` line.
fn inlines_in_sequence(node: &Node) -> bool {
    node.is_block_collection() && properties(node).is_empty() && node.line_comment.is_empty()
}

fn normalize_comment(line: &str) -> String {
    if line.starts_with('#') {
        line.to_string()
    } else {
        format!("# {line}")
    }
}

fn join_line_comments(first: &str, second: &str) -> String {
    match (first.is_empty(), second.is_empty()) {
        (true, _) => second.to_string(),
        (_, true) => first.to_string(),
        _ => format!("{first} {second}"),
    }
}

/// `&anchor !tag`, or empty.
fn properties(node: &Node) -> String {
    let mut parts = Vec::new();
    if let Some(anchor) = &node.anchor {
        parts.push(format!("&{anchor}"));
    }
    if let Some(tag) = &node.tag {
        parts.push(tag.clone());
    }
    parts.join(" ")
}

/// An alias such as `*base`, kept as a plain scalar by the parser.
fn is_alias(value: &str) -> bool {
    value.strip_prefix('*').is_some_and(|name| {
        !name.is_empty() && !name.chars().any(|c| c.is_whitespace() || scalar::is_flow_indicator(c))
    })
}

/// A block scalar body that reads back unchanged.
fn block_body_ok(value: &str) -> bool {
    let body = value.trim_end_matches('\n');
    !body.is_empty()
        && !scalar::needs_escaping(value)
        && body
            .split('\n')
            .all(|line| line.is_empty() || !line.trim().is_empty())
}

/// Pick the style actually written for a scalar in `context`.
fn resolve_style(node: &Node, context: Context) -> Style {
    let value = node.value.as_str();
    let flow = context == Context::Flow;
    let block_ok = context == Context::Block;
    match node.style {
        Style::Plain | Style::Flow => {
            if (value.is_empty() && context != Context::Key)
                || is_alias(value)
                || scalar::is_plain_safe(value, flow)
            {
                Style::Plain
            } else if value.contains('\n') && block_ok && block_body_ok(value) {
                Style::Literal
            } else if value.contains('\n') || scalar::needs_escaping(value) {
                Style::DoubleQuoted
            } else {
                Style::SingleQuoted
            }
        }
        Style::SingleQuoted => {
            if value.contains('\n') || scalar::needs_escaping(value) {
                Style::DoubleQuoted
            } else {
                Style::SingleQuoted
            }
        }
        Style::DoubleQuoted => Style::DoubleQuoted,
        Style::Literal | Style::Folded => {
            if !block_ok || !block_body_ok(value) {
                Style::DoubleQuoted
            } else if node.style == Style::Folded
                && scalar::unfold(value.trim_end_matches('\n')).is_none()
            {
                Style::Literal
            } else {
                node.style
            }
        }
    }
}

/// Render a node that fits on one line: a non-block scalar, a flow
/// collection or an empty collection, prefixed by its properties.
fn inline(node: &Node, context: Context) -> Result<String> {
    let text = match node.kind {
        NodeKind::Document => return Err(EncodeError::NestedDocument),
        NodeKind::Scalar => match resolve_style(node, context) {
            Style::Plain => node.value.clone(),
            Style::SingleQuoted => scalar::single_quoted(&node.value),
            _ => scalar::double_quoted(&node.value),
        },
        NodeKind::Mapping => {
            if node.children.len() % 2 != 0 {
                return Err(EncodeError::OddMapping {
                    len: node.children.len(),
                });
            }
            let entries = node
                .pairs()
                .map(|(key, value)| {
                    if key.kind != NodeKind::Scalar {
                        return Err(EncodeError::NonScalarKey);
                    }
                    let key_text = inline(key, Context::Key)?;
                    let value_text = inline(value, Context::Flow)?;
                    Ok(if value_text.is_empty() {
                        key_text
                    } else {
                        format!("{key_text}: {value_text}")
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            format!("{{{}}}", entries.join(", "))
        }
        NodeKind::Sequence => {
            let items = node
                .children
                .iter()
                .map(|item| inline(item, Context::Flow))
                .collect::<Result<Vec<_>>>()?;
            format!("[{}]", items.join(", "))
        }
    };
    let props = properties(node);
    Ok(match (props.is_empty(), text.is_empty()) {
        (true, _) => text,
        (false, true) => props,
        (false, false) => format!("{props} {text}"),
    })
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::document::parse;

    fn emit(node: &Node) -> String {
        String::from_utf8(serialize(node).unwrap()).unwrap()
    }

    fn reformat(input: &str) -> String {
        emit(&parse(input.as_bytes()).unwrap())
    }

    fn assert_canonical(input: &str) {
        assert_eq!(reformat(input), input);
    }

    // -----------------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------------

    #[test]
    fn canonical_layout_is_stable() {
        assert_canonical("name: apache\nowner:\n  github: elastic/integrations\ntags:\n  - web\n  - server\n");
    }

    #[test]
    fn sequences_under_keys_are_indented() {
        assert_eq!(reformat("tags:\n- a\n- b\n"), "tags:\n  - a\n  - b\n");
    }

    #[test]
    fn indentation_is_normalized() {
        assert_eq!(reformat("a:\n    b:\n        c: 1\n"), "a:\n  b:\n    c: 1\n");
    }

    #[test]
    fn compact_mapping_items() {
        assert_canonical(
            "- version: \"1.0.0\"\n  changes:\n    - description: first\n      type: enhancement\n      link: https://github.com/elastic/integrations/pull/1\n",
        );
    }

    #[test]
    fn nested_sequences_share_line() {
        assert_canonical("- - a\n  - b\n- c\n");
    }

    #[test]
    fn empty_values_and_items() {
        assert_canonical("a:\nb:\n  -\n  - x\n");
    }

    #[test]
    fn flow_collections_stay_inline() {
        assert_eq!(
            reformat("list: [a,   \"b c\" ,[1,2]]\nmap: {x: 1}\nempty: []\n"),
            "list: [a, \"b c\", [1, 2]]\nmap: {x: 1}\nempty: []\n"
        );
    }

    #[test]
    fn explicit_start_marker_is_kept() {
        assert_canonical("---\na: 1\n");
    }

    #[test]
    fn properties_are_written() {
        assert_canonical("base: &base\n  a: 1\ncopy: *base\ntyped: !!str 12\n");
    }

    // -----------------------------------------------------------------------
    // Scalars
    // -----------------------------------------------------------------------

    #[test]
    fn quoted_styles_are_kept() {
        assert_canonical("a: 'single'\nb: \"double\"\nc: plain\n");
    }

    #[test]
    fn literal_block_round_trips() {
        assert_canonical("script: |\n  line one\n    indented\n\n  line three\nnext: 1\n");
    }

    #[test]
    fn chomping_indicators_round_trip() {
        assert_canonical("strip: |-\n  text\nkeep: |+\n  text\n\nend: 1\n");
    }

    #[test]
    fn folded_block_round_trips() {
        assert_canonical("description: >\n  folded text\n\n  para\n");
    }

    #[test]
    fn leading_space_gets_indentation_indicator() {
        assert_canonical("a: |2\n    leading spaces\n");
    }

    #[test]
    fn multiline_plain_becomes_literal() {
        let node = Node::mapping(vec![
            Node::scalar("a", Style::Plain),
            Node::scalar("one\ntwo", Style::Plain),
        ]);
        assert_eq!(emit(&node), "a: |-\n  one\n  two\n");
    }

    #[test]
    fn unsafe_plain_is_quoted() {
        let node = Node::mapping(vec![
            Node::scalar("a", Style::Plain),
            Node::scalar("key: value", Style::Plain),
            Node::scalar("b", Style::Plain),
            Node::scalar("bell\u{7}", Style::Plain),
        ]);
        assert_eq!(emit(&node), "a: 'key: value'\nb: \"bell\\a\"\n");
    }

    #[test]
    fn block_styles_fall_back_in_keys() {
        let node = Node::mapping(vec![
            Node::scalar("multi\nline", Style::Literal),
            Node::scalar("v", Style::Plain),
        ]);
        assert_eq!(emit(&node), "\"multi\\nline\": v\n");
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    #[test]
    fn comments_round_trip() {
        assert_canonical(
            "# file comment\n\n# about a\na: 1 # one\nb: # nested\n  c: x\n  # end of b\n# about d\nd:\n  - x # item\n  # after x\n# end of file\n",
        );
    }

    #[test]
    fn item_head_comment_precedes_dash() {
        assert_canonical("# newest first\n- version: \"1.0.0\"\n  changes: []\n");
    }

    #[test]
    fn comments_without_hash_are_prefixed() {
        let mut key = Node::scalar("a", Style::Plain);
        key.head_comment = "note".to_string();
        let node = Node::mapping(vec![key, Node::scalar("1", Style::Plain)]);
        assert_eq!(emit(&node), "# note\na: 1\n");
    }

    // -----------------------------------------------------------------------
    // Shape errors
    // -----------------------------------------------------------------------

    #[test]
    fn odd_mapping_is_rejected() {
        let node = Node::mapping(vec![Node::scalar("a", Style::Plain)]);
        assert_eq!(serialize(&node), Err(EncodeError::OddMapping { len: 1 }));
    }

    #[test]
    fn collection_key_is_rejected() {
        let node = Node::mapping(vec![
            Node::sequence(vec![Node::scalar("a", Style::Plain)]),
            Node::scalar("v", Style::Plain),
        ]);
        assert_eq!(serialize(&node), Err(EncodeError::NonScalarKey));
    }

    #[test]
    fn document_shape_is_checked() {
        let empty = Node {
            kind: NodeKind::Document,
            ..Node::default()
        };
        assert_eq!(
            serialize(&empty),
            Err(EncodeError::BadDocument { children: 0 })
        );
        let nested = Node::mapping(vec![
            Node::scalar("a", Style::Plain),
            Node::document(Node::scalar("x", Style::Plain)),
        ]);
        assert_eq!(serialize(&nested), Err(EncodeError::NestedDocument));
    }
}
