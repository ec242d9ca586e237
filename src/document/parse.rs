//! Parser producing a comment-preserving [`Node`] tree.
//!
//! Tokenizing and block/flow structure come from the lossless `yaml_edit`
//! syntax tree. This module walks that tree into [`Node`]s, decodes scalar
//! text, rejects the YAML features the formatter does not support and
//! anchors every comment to the node it precedes, trails or closes.

use rowan::NodeOrToken;
use rowan::ast::AstNode;
use yaml_edit::{Lang, Parse, ScalarValue, SyntaxKind, YamlFile};

use super::node::{Node, NodeKind, Style, join_comments};
use super::scalar::{Chomping, fold_flow_lines, fold_lines, normalize_escapes};
use crate::error::SyntaxError;

type Result<T> = std::result::Result<T, SyntaxError>;
type SyntaxNode = rowan::SyntaxNode<Lang>;
type SyntaxToken = rowan::SyntaxToken<Lang>;

/// Parse `input` into a [`NodeKind::Document`] node.
///
/// # Errors
///
/// Returns [`SyntaxError::Empty`] when the input holds no content (only
/// whitespace or comments) and [`SyntaxError::Malformed`] when the content
/// is not well formed.
pub fn parse(input: &[u8]) -> Result<Node> {
    let text = std::str::from_utf8(input).map_err(|e| SyntaxError::Malformed {
        line: input
            .get(..e.valid_up_to())
            .map_or(1, |valid| valid.iter().filter(|&&b| b == b'\n').count() + 1),
        message: "invalid UTF-8".to_string(),
    })?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let normalized = text.replace("\r\n", "\n");

    let parsed = Parse::<YamlFile>::parse_yaml(&normalized);
    if let Some(err) = parsed.positioned_errors().first() {
        return Err(SyntaxError::Malformed {
            line: err.start_position(&normalized).line,
            message: err.message.clone(),
        });
    }
    let file = parsed.tree();
    let root = file.syntax();

    let mut walker = Walker::new(&normalized, root);
    walker.check(root)?;
    let doc = walker.document(root)?;
    tracing::debug!(
        root = ?doc.root().map(|r| r.kind),
        explicit_start = doc.explicit_start,
        comments = walker.comments.len(),
        "parsed document"
    );
    Ok(doc)
}

/// Collect every full-line comment of `input`, in order.
///
/// Used to keep the comments of a document that has no content nodes.
#[must_use]
pub fn comments(input: &[u8]) -> String {
    String::from_utf8_lossy(input)
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug)]
struct SourceComment {
    offset: usize,
    line: usize,
    col: usize,
    text: String,
    /// Content precedes the comment on its line.
    trailing: bool,
    /// The line after the comment is blank.
    blank_after: bool,
    taken: bool,
}

/// Anchor, tag and content node found in a value position.
#[derive(Debug, Default)]
struct Slot {
    anchor: Option<String>,
    tag: Option<String>,
    content: Option<SyntaxNode>,
}

impl Slot {
    fn of(node: &SyntaxNode) -> Self {
        let mut slot = Self::default();
        slot.collect(node);
        slot
    }

    fn of_child(entry: &SyntaxNode, kind: SyntaxKind) -> Self {
        entry
            .children()
            .find(|child| child.kind() == kind)
            .map_or_else(Self::default, |child| Self::of(&child))
    }

    fn collect(&mut self, node: &SyntaxNode) {
        for element in node.children_with_tokens() {
            match element {
                NodeOrToken::Token(token) if token.kind() == SyntaxKind::ANCHOR => {
                    self.anchor = Some(token.text().trim_start_matches('&').to_string());
                }
                NodeOrToken::Token(token) if token.kind() == SyntaxKind::TAG => {
                    self.tag = Some(token.text().to_string());
                }
                NodeOrToken::Node(child) if child.kind() == SyntaxKind::TAGGED_NODE => {
                    self.collect(&child);
                }
                NodeOrToken::Node(child) if is_content(child.kind()) => {
                    if self.content.as_ref().is_none_or(is_implicit_null) {
                        self.content = Some(child);
                    }
                }
                _ => {}
            }
        }
    }

    /// The content node, unless the source left the position empty.
    fn explicit_content(&self) -> Option<&SyntaxNode> {
        self.content.as_ref().filter(|node| !is_implicit_null(node))
    }
}

/// Walks the syntax tree in document order, handing out comments as the
/// nodes they belong to are built.
#[derive(Debug)]
struct Walker<'a> {
    src: &'a str,
    line_starts: Vec<usize>,
    comments: Vec<SourceComment>,
}

impl<'a> Walker<'a> {
    fn new(src: &'a str, root: &SyntaxNode) -> Self {
        let line_starts = std::iter::once(0)
            .chain(src.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        let mut walker = Self {
            src,
            line_starts,
            comments: Vec::new(),
        };
        let comments = root
            .descendants_with_tokens()
            .filter_map(NodeOrToken::into_token)
            .filter(|token| token.kind() == SyntaxKind::COMMENT)
            .map(|token| walker.source_comment(&token))
            .collect();
        walker.comments = comments;
        walker
    }

    fn source_comment(&self, token: &SyntaxToken) -> SourceComment {
        let offset = usize::from(token.text_range().start());
        let line = self.line_of(offset);
        let line_start = self.line_start(line);
        SourceComment {
            offset,
            line,
            col: offset - line_start,
            text: token.text().trim_end().to_string(),
            trailing: !self.src.get(line_start..offset).unwrap_or("").trim().is_empty(),
            blank_after: self.line_text(line + 1).is_some_and(|l| l.trim().is_empty()),
            taken: false,
        }
    }

    // -----------------------------------------------------------------------
    // Positions
    // -----------------------------------------------------------------------

    /// Zero-based line holding byte `offset`.
    fn line_of(&self, offset: usize) -> usize {
        self.line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
    }

    fn line_start(&self, line: usize) -> usize {
        self.line_starts.get(line).copied().unwrap_or(self.src.len())
    }

    fn line_text(&self, line: usize) -> Option<&'a str> {
        let start = *self.line_starts.get(line)?;
        if start >= self.src.len() {
            return None;
        }
        self.src.get(start..)?.split('\n').next()
    }

    fn col_of(&self, offset: usize) -> usize {
        offset - self.line_start(self.line_of(offset))
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> SyntaxError {
        SyntaxError::Malformed {
            line: self.line_of(offset) + 1,
            message: message.into(),
        }
    }

    // -----------------------------------------------------------------------
    // Supported subset
    // -----------------------------------------------------------------------

    fn check(&self, root: &SyntaxNode) -> Result<()> {
        for element in root.descendants_with_tokens() {
            let offset = usize::from(element.text_range().start());
            match element {
                NodeOrToken::Node(node) => match node.kind() {
                    SyntaxKind::ERROR => return Err(self.error_at(offset, "unexpected content")),
                    SyntaxKind::KEY if node.children().any(|child| is_collection(child.kind())) => {
                        return Err(self.error_at(offset, "complex mapping keys are not supported"));
                    }
                    SyntaxKind::SCALAR => {
                        if let Some((start, end)) = content_span(&node) {
                            let raw = self.src.get(start..end).unwrap_or("");
                            if !raw.starts_with(['"', '\'', '|', '>']) && has_value_indicator(raw) {
                                return Err(self.error_at(
                                    start,
                                    "mapping values are not allowed in this context",
                                ));
                            }
                        }
                    }
                    _ => {}
                },
                NodeOrToken::Token(token) => {
                    let in_scalar = token
                        .parent()
                        .is_some_and(|parent| parent.kind() == SyntaxKind::SCALAR);
                    if token.kind() == SyntaxKind::QUESTION && !in_scalar {
                        return Err(self.error_at(offset, "complex mapping keys are not supported"));
                    }
                    if token.kind() == SyntaxKind::INDENT
                        && token.text().contains('\t')
                        && !in_scalar
                        && token.next_token().is_some_and(|next| !is_trivia(next.kind()))
                    {
                        return Err(self.error_at(offset, "tabs are not allowed as indentation"));
                    }
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    fn take_where(&mut self, mut wanted: impl FnMut(&SourceComment) -> bool) -> String {
        let mut taken = Vec::new();
        for comment in &mut self.comments {
            if !comment.taken && wanted(comment) {
                comment.taken = true;
                taken.push(comment.text.clone());
            }
        }
        taken.join("\n")
    }

    /// Every comment not yet handed out that starts before `offset`.
    fn take_before(&mut self, offset: usize) -> String {
        self.take_where(|c| c.offset < offset)
    }

    /// The comment that ends `line` after some content.
    fn take_trailing(&mut self, line: usize) -> String {
        self.take_where(|c| c.trailing && c.line == line)
    }

    /// The run of comments before `next` indented at `col` or deeper.
    fn take_foot(&mut self, col: usize, next: Option<usize>) -> String {
        let mut foot = Vec::new();
        for comment in self
            .comments
            .iter_mut()
            .filter(|c| !c.taken && next.is_none_or(|offset| c.offset < offset))
        {
            if comment.col < col {
                break;
            }
            comment.taken = true;
            foot.push(comment.text.clone());
        }
        foot.join("\n")
    }

    /// Anchor the comments after a block collection to its last entry when
    /// the collection ends at a dedent, or at the end of the input for a
    /// nested one. Top-level trailing comments belong to the document.
    fn attach_foot(&mut self, collection: &mut Node, node: &SyntaxNode, col: usize) {
        let next = next_content(node);
        if next.map_or(col == 0, |offset| self.col_of(offset) >= col) {
            return;
        }
        let foot = self.take_foot(col, next);
        if foot.is_empty() {
            return;
        }
        let anchor_index = match collection.kind {
            NodeKind::Mapping => collection.children.len().checked_sub(2),
            _ => collection.children.len().checked_sub(1),
        };
        if let Some(entry) = anchor_index.and_then(|i| collection.children.get_mut(i)) {
            entry.foot_comment = join_comments(&entry.foot_comment, &foot);
        }
    }

    /// Line whose trailing comment describes `content`: the header line of a
    /// block scalar, the last line of other scalars and flow collections.
    /// Block collections leave it to their entries.
    fn trailing_line(&self, content: &SyntaxNode) -> Option<usize> {
        let (start, end) = content_span(content)?;
        match content.kind() {
            SyntaxKind::MAPPING | SyntaxKind::SEQUENCE if !is_flow(content) => None,
            SyntaxKind::SCALAR if self.src.get(start..)?.starts_with(['|', '>']) => {
                Some(self.line_of(start))
            }
            _ => Some(self.line_of(end.saturating_sub(1))),
        }
    }

    fn starts_on(&self, slot: &Slot, line: usize) -> bool {
        slot.explicit_content()
            .and_then(content_span)
            .is_some_and(|(start, _)| self.line_of(start) == line)
    }

    // -----------------------------------------------------------------------
    // Document
    // -----------------------------------------------------------------------

    fn document(&mut self, root: &SyntaxNode) -> Result<Node> {
        let mut documents = root
            .children()
            .filter(|node| node.kind() == SyntaxKind::DOCUMENT);
        let Some(document) = documents.next() else {
            return Err(SyntaxError::Empty);
        };
        if let Some(extra) = documents.next() {
            let offset = usize::from(extra.text_range().start());
            return Err(self.error_at(offset, "multiple documents are not supported"));
        }

        let slot = Slot::of(&document);
        let Some(content) = slot.explicit_content().cloned() else {
            return Err(SyntaxError::Empty);
        };
        let start = document
            .descendants_with_tokens()
            .filter_map(NodeOrToken::into_token)
            .find(|token| {
                !is_trivia(token.kind())
                    && !matches!(token.kind(), SyntaxKind::DOC_START | SyntaxKind::DOC_END)
                    && !token.text().is_empty()
            })
            .map_or_else(|| start_of(&content), |token| usize::from(token.text_range().start()));

        let mut doc = Node {
            kind: NodeKind::Document,
            explicit_start: document
                .children_with_tokens()
                .any(|element| element.kind() == SyntaxKind::DOC_START),
            ..Node::default()
        };

        // Comments separated from the content by a blank line describe the
        // whole document.
        let split = self
            .comments
            .iter()
            .rev()
            .find(|c| c.offset < start && c.blank_after)
            .map(|c| c.offset);
        if let Some(split) = split {
            doc.head_comment = self.take_where(|c| c.offset <= split);
        }

        let mut root_node = self.value(&slot, None, false)?;
        if let Some(line) = self.trailing_line(&content) {
            root_node.line_comment = self.take_trailing(line);
        }
        doc.children.push(root_node);
        doc.foot_comment = self.take_where(|_| true);
        Ok(doc)
    }

    // -----------------------------------------------------------------------
    // Nodes
    // -----------------------------------------------------------------------

    /// Build the node of a value position. `parent_col` is the column of the
    /// owning entry; `None` at document level.
    fn value(&mut self, slot: &Slot, parent_col: Option<usize>, flow: bool) -> Result<Node> {
        let mut node = match &slot.content {
            None => Node::scalar("", Style::Plain),
            Some(content) => match content.kind() {
                SyntaxKind::MAPPING | SyntaxKind::SEQUENCE if flow || is_flow(content) => {
                    self.flow_collection(content)?
                }
                SyntaxKind::MAPPING => self.block_mapping(content)?,
                SyntaxKind::SEQUENCE => self.block_sequence(content)?,
                SyntaxKind::ALIAS => Node::scalar(content.text().to_string().trim(), Style::Plain),
                _ => self.scalar(content, parent_col)?,
            },
        };
        if slot.anchor.is_some() {
            node.anchor.clone_from(&slot.anchor);
        }
        if slot.tag.is_some() {
            node.tag.clone_from(&slot.tag);
        }
        Ok(node)
    }

    fn block_mapping(&mut self, node: &SyntaxNode) -> Result<Node> {
        let mut map = Node::mapping(Vec::new());
        let mut col = None;
        for entry in children_of(node, SyntaxKind::MAPPING_ENTRY) {
            let start = start_of(&entry);
            let key_col = self.col_of(start);
            let key_line = self.line_of(start);
            col.get_or_insert(key_col);

            let head = self.take_before(start);
            let mut key = self.value(&Slot::of_child(&entry, SyntaxKind::KEY), Some(key_col), false)?;
            key.head_comment = join_comments(&head, &key.head_comment);

            let value_slot = Slot::of_child(&entry, SyntaxKind::VALUE);
            let inline = self.starts_on(&value_slot, key_line);
            if !inline {
                key.line_comment = self.take_trailing(key_line);
            }
            let mut value = self.value(&value_slot, Some(key_col), false)?;
            if inline && let Some(line) = value_slot.content.as_ref().and_then(|c| self.trailing_line(c)) {
                value.line_comment = self.take_trailing(line);
            }
            map.push_pair(key, value);
        }
        self.attach_foot(&mut map, node, col.unwrap_or(0));
        Ok(map)
    }

    fn block_sequence(&mut self, node: &SyntaxNode) -> Result<Node> {
        let mut seq = Node::sequence(Vec::new());
        let mut col = None;
        for entry in children_of(node, SyntaxKind::SEQUENCE_ENTRY) {
            let start = start_of(&entry);
            let dash_col = self.col_of(start);
            let dash_line = self.line_of(start);
            col.get_or_insert(dash_col);

            let head = self.take_before(start);
            let slot = Slot::of(&entry);
            let inline = self.starts_on(&slot, dash_line);
            let below = if inline {
                String::new()
            } else {
                self.take_trailing(dash_line)
            };
            let mut item = self.value(&slot, Some(dash_col), false)?;
            if inline && let Some(line) = slot.content.as_ref().and_then(|c| self.trailing_line(c)) {
                item.line_comment = self.take_trailing(line);
            }
            if item.line_comment.is_empty() {
                item.line_comment = below;
            } else {
                item.head_comment = join_comments(&below, &item.head_comment);
            }
            item.head_comment = join_comments(&head, &item.head_comment);
            seq.children.push(item);
        }
        self.attach_foot(&mut seq, node, col.unwrap_or(0));
        Ok(seq)
    }

    /// Comments anywhere inside a flow collection become its head comment.
    fn flow_collection(&mut self, node: &SyntaxNode) -> Result<Node> {
        let range = node.text_range();
        let (start, end) = (usize::from(range.start()), usize::from(range.end()));
        let head = self.take_where(|c| c.offset >= start && c.offset < end);

        let mut collection = Node {
            style: Style::Flow,
            head_comment: head,
            ..Node::default()
        };
        if node.kind() == SyntaxKind::MAPPING {
            collection.kind = NodeKind::Mapping;
            for entry in children_of(node, SyntaxKind::MAPPING_ENTRY) {
                let key = self.value(&Slot::of_child(&entry, SyntaxKind::KEY), None, true)?;
                let value = self.value(&Slot::of_child(&entry, SyntaxKind::VALUE), None, true)?;
                collection.push_pair(key, value);
            }
        } else {
            collection.kind = NodeKind::Sequence;
            for entry in children_of(node, SyntaxKind::SEQUENCE_ENTRY) {
                let item = self.value(&Slot::of(&entry), None, true)?;
                collection.children.push(item);
            }
        }
        Ok(collection)
    }

    fn scalar(&self, node: &SyntaxNode, parent_col: Option<usize>) -> Result<Node> {
        let Some((start, end)) = content_span(node) else {
            return Ok(Node::scalar("", Style::Plain));
        };
        let raw = self.src.get(start..end).unwrap_or("");
        let scalar = match raw.chars().next() {
            Some('|' | '>') => {
                let block_end = usize::from(node.text_range().end());
                block_scalar(self.src.get(start..block_end).unwrap_or(raw), parent_col)
            }
            Some('"') => {
                let folded = fold_flow_lines(quoted_body(raw, '"'), true);
                let text = normalize_escapes(&folded).map_err(|message| self.error_at(start, message))?;
                Node::scalar(ScalarValue::parse_escape_sequences(&text), Style::DoubleQuoted)
            }
            Some('\'') => Node::scalar(
                fold_flow_lines(quoted_body(raw, '\''), false).replace("''", "'"),
                Style::SingleQuoted,
            ),
            _ => Node::scalar(fold_flow_lines(raw, false), Style::Plain),
        };
        Ok(scalar)
    }
}

/// Decode a `|` or `>` scalar from its source text, header included.
fn block_scalar(raw: &str, parent_col: Option<usize>) -> Node {
    let style = if raw.starts_with('|') {
        Style::Literal
    } else {
        Style::Folded
    };
    let (header, body) = raw.split_once('\n').unwrap_or((raw, ""));
    let mut chomping = Chomping::Clip;
    let mut explicit = None;
    for c in header
        .chars()
        .skip(1)
        .take_while(|c| !c.is_whitespace() && *c != '#')
    {
        match c {
            '-' => chomping = Chomping::Strip,
            '+' => chomping = Chomping::Keep,
            '1'..='9' => explicit = c.to_digit(10).and_then(|d| usize::try_from(d).ok()),
            _ => {}
        }
    }

    let mut lines: Vec<&str> = body.split('\n').collect();
    if body.is_empty() || body.ends_with('\n') {
        lines.pop();
    }
    let min_indent = parent_col.map_or(0, |p| p + 1);
    let content_indent = explicit.map_or_else(
        || {
            lines
                .iter()
                .find(|line| !line.trim().is_empty())
                .map_or(min_indent, |line| indent_of(line))
        },
        |m| parent_col.unwrap_or(0) + m,
    );

    let mut content: Vec<&str> = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            content.push("");
            continue;
        }
        if indent_of(line) < content_indent || content_indent < min_indent {
            break;
        }
        content.push(line.get(content_indent..).unwrap_or(""));
    }

    let trailing = content.iter().rev().take_while(|l| l.is_empty()).count();
    let body_lines = content.get(..content.len() - trailing).unwrap_or(&[]);
    let text = if style == Style::Literal {
        body_lines.join("\n")
    } else {
        fold_lines(body_lines)
    };
    let value = match chomping {
        Chomping::Keep if body_lines.is_empty() => "\n".repeat(trailing),
        Chomping::Keep => text + "\n" + &"\n".repeat(trailing),
        Chomping::Clip if !body_lines.is_empty() => text + "\n",
        Chomping::Clip | Chomping::Strip => text,
    };
    Node::scalar(value, style)
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

fn quoted_body(raw: &str, quote: char) -> &str {
    raw.strip_prefix(quote)
        .and_then(|rest| rest.strip_suffix(quote))
        .unwrap_or(raw)
}

/// A `: ` inside plain text, or a line ending in `:`, would start a mapping.
fn has_value_indicator(raw: &str) -> bool {
    raw.lines().any(|line| {
        let line = line.trim_end();
        line.ends_with(':') || line.contains(": ") || line.contains(":\t")
    })
}

const fn is_trivia(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::WHITESPACE | SyntaxKind::NEWLINE | SyntaxKind::INDENT | SyntaxKind::COMMENT
    )
}

const fn is_collection(kind: SyntaxKind) -> bool {
    matches!(kind, SyntaxKind::MAPPING | SyntaxKind::SEQUENCE)
}

const fn is_content(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::MAPPING | SyntaxKind::SEQUENCE | SyntaxKind::SCALAR | SyntaxKind::ALIAS
    )
}

/// The zero-width scalar standing in for a value the source left out.
fn is_implicit_null(node: &SyntaxNode) -> bool {
    node.kind() == SyntaxKind::SCALAR && content_span(node).is_none()
}

fn is_flow(node: &SyntaxNode) -> bool {
    node.first_token().is_some_and(|token| {
        matches!(token.kind(), SyntaxKind::LEFT_BRACE | SyntaxKind::LEFT_BRACKET)
    })
}

fn children_of(node: &SyntaxNode, kind: SyntaxKind) -> impl Iterator<Item = SyntaxNode> {
    node.children().filter(move |child| child.kind() == kind)
}

/// Byte range from the first to the last non-trivia token of `node`.
fn content_span(node: &SyntaxNode) -> Option<(usize, usize)> {
    let mut tokens = node
        .descendants_with_tokens()
        .filter_map(NodeOrToken::into_token)
        .filter(|token| !is_trivia(token.kind()) && !token.text().is_empty());
    let first = tokens.next()?;
    let end = tokens.last().unwrap_or_else(|| first.clone()).text_range().end();
    Some((usize::from(first.text_range().start()), usize::from(end)))
}

fn start_of(node: &SyntaxNode) -> usize {
    content_span(node).map_or_else(|| usize::from(node.text_range().start()), |(start, _)| start)
}

/// Offset of the first content token after `node`, or `None` when only
/// comments, blank lines or a document marker follow.
fn next_content(node: &SyntaxNode) -> Option<usize> {
    std::iter::successors(node.last_token(), SyntaxToken::next_token)
        .skip(1)
        .find(|token| !is_trivia(token.kind()) && !token.text().is_empty())
        .filter(|token| !matches!(token.kind(), SyntaxKind::DOC_START | SyntaxKind::DOC_END))
        .map(|token| usize::from(token.text_range().start()))
}
