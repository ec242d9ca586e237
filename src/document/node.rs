//! Comment-preserving document tree.

/// Structural kind of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeKind {
    /// Top-level wrapper holding exactly one root node.
    Document,
    /// Key/value pairs stored as alternating children.
    Mapping,
    /// Ordered list of element nodes.
    Sequence,
    /// Leaf holding literal text in [`Node::value`].
    #[default]
    Scalar,
}

/// Quoting and layout hint attached to a node.
///
/// The style is carried from the source and only changed by an explicit edit.
/// Block collections use [`Style::Plain`]; inline collections use [`Style::Flow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    /// Unquoted scalar, or block collection.
    #[default]
    Plain,
    /// `'text'`
    SingleQuoted,
    /// `"text"`
    DoubleQuoted,
    /// `|` block scalar.
    Literal,
    /// `>` block scalar.
    Folded,
    /// `[a, b]` or `{a: 1}`.
    Flow,
}

/// One element of a parsed document.
///
/// Comments are stored verbatim including their leading `#`; multi-line
/// comments are joined with `\n`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Node {
    /// Structural kind.
    pub kind: NodeKind,
    /// Scalar text; empty for collections and documents.
    pub value: String,
    /// Child nodes. Mappings alternate key and value.
    pub children: Vec<Self>,
    /// Quoting or layout hint.
    pub style: Style,
    /// Explicit tag such as `!!str`, without surrounding whitespace.
    pub tag: Option<String>,
    /// Anchor name, without the leading `&`.
    pub anchor: Option<String>,
    /// Comment lines directly above the node.
    pub head_comment: String,
    /// Comment at the end of the node's line.
    pub line_comment: String,
    /// Comment lines directly after the node.
    pub foot_comment: String,
    /// The source started with an explicit `---` marker. Only meaningful on
    /// [`NodeKind::Document`].
    pub explicit_start: bool,
}

impl Node {
    /// Create a scalar node with the given text and style.
    #[must_use]
    pub fn scalar(value: impl Into<String>, style: Style) -> Self {
        Self {
            kind: NodeKind::Scalar,
            value: value.into(),
            style,
            ..Self::default()
        }
    }

    /// Create a scalar carrying a string value, picking a style that keeps
    /// the text a string when read back.
    ///
    /// Text that would otherwise resolve to a boolean, number or null is
    /// double-quoted, multi-line text becomes a literal block, and text that
    /// cannot be written plain is single-quoted.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        let value = value.into();
        let style = if super::scalar::resolves_to_non_string(&value) {
            Style::DoubleQuoted
        } else if value.contains('\n') {
            Style::Literal
        } else if super::scalar::is_plain_safe(&value, false) {
            Style::Plain
        } else {
            Style::SingleQuoted
        };
        Self::scalar(value, style)
    }

    /// Create a block mapping from alternating key/value children.
    #[must_use]
    pub fn mapping(children: Vec<Self>) -> Self {
        Self {
            kind: NodeKind::Mapping,
            children,
            ..Self::default()
        }
    }

    /// Create a block sequence.
    #[must_use]
    pub fn sequence(children: Vec<Self>) -> Self {
        Self {
            kind: NodeKind::Sequence,
            children,
            ..Self::default()
        }
    }

    /// Wrap `root` in a document node.
    #[must_use]
    pub fn document(root: Self) -> Self {
        Self {
            kind: NodeKind::Document,
            children: vec![root],
            ..Self::default()
        }
    }

    /// Return `true` for mapping nodes.
    #[must_use]
    pub fn is_mapping(&self) -> bool {
        self.kind == NodeKind::Mapping
    }

    /// Return `true` for sequence nodes.
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        self.kind == NodeKind::Sequence
    }

    /// Return `true` for scalar nodes.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.kind == NodeKind::Scalar
    }

    /// Return `true` if the node is written as an indented block: a
    /// non-empty mapping or sequence that is not flow-styled.
    #[must_use]
    pub fn is_block_collection(&self) -> bool {
        matches!(self.kind, NodeKind::Mapping | NodeKind::Sequence)
            && self.style != Style::Flow
            && !self.children.is_empty()
    }

    /// Root node of a document, or the node itself for any other kind.
    #[must_use]
    pub fn root(&self) -> Option<&Self> {
        match self.kind {
            NodeKind::Document => self.children.first(),
            _ => Some(self),
        }
    }

    /// Mutable variant of [`Node::root`].
    pub fn root_mut(&mut self) -> Option<&mut Self> {
        match self.kind {
            NodeKind::Document => self.children.first_mut(),
            _ => Some(self),
        }
    }

    /// Iterate over `(key, value)` pairs of a mapping.
    ///
    /// Yields nothing for other kinds. A trailing unpaired child is skipped.
    pub fn pairs(&self) -> impl Iterator<Item = (&Self, &Self)> {
        let children: &[Self] = if self.is_mapping() {
            &self.children
        } else {
            &[]
        };
        children.chunks_exact(2).filter_map(|pair| match pair {
            [key, value] => Some((key, value)),
            _ => None,
        })
    }

    /// Look up the value stored under scalar key `key` in a mapping.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        self.pairs()
            .find(|(k, _)| k.is_scalar() && k.value == key)
            .map(|(_, v)| v)
    }

    /// Mutable variant of [`Node::get`].
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Self> {
        if !self.is_mapping() {
            return None;
        }
        let index = self
            .children
            .iter()
            .step_by(2)
            .position(|k| k.is_scalar() && k.value == key)?;
        self.children.get_mut(index * 2 + 1)
    }

    /// Append a key/value pair to a mapping.
    pub fn push_pair(&mut self, key: Self, value: Self) {
        self.children.push(key);
        self.children.push(value);
    }

    /// Return `true` if any comment slot is non-empty.
    #[must_use]
    pub fn has_comments(&self) -> bool {
        !(self.head_comment.is_empty()
            && self.line_comment.is_empty()
            && self.foot_comment.is_empty())
    }
}

/// Join two comment blocks, skipping empty ones.
pub(crate) fn join_comments(first: &str, second: &str) -> String {
    match (first.is_empty(), second.is_empty()) {
        (true, _) => second.to_string(),
        (_, true) => first.to_string(),
        _ => format!("{first}\n{second}"),
    }
}
