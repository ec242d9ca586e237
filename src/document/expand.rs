//! Dotted-key expansion: `a.b.c: 1` becomes `a: {b: {c: 1}}`.

use super::node::{Node, NodeKind, Style};

/// Path separator inside plain mapping keys.
const SEPARATOR: char = '.';

/// Split every unquoted dotted mapping key in the tree rooted at `node`
/// into nested one-pair mappings.
///
/// Keys are split at the first separator; the remainder is expanded again
/// when the new inner mapping is visited. Either side may be empty, so
/// `.hidden` becomes `"": {hidden: ...}`. Quoted keys and keys that are
/// not scalars are left alone. Running this twice is a no-op.
pub fn expand_dotted_keys(node: &mut Node) {
    if node.is_mapping() {
        let style = node.style;
        for pair in node.children.chunks_exact_mut(2) {
            if let [key, value] = pair {
                expand_pair(key, value, style);
            }
        }
    }
    for child in &mut node.children {
        expand_dotted_keys(child);
    }
}

fn expand_pair(key: &mut Node, value: &mut Node, parent_style: Style) {
    if key.kind != NodeKind::Scalar || key.style != Style::Plain {
        return;
    }
    let Some((base, rest)) = key.value.split_once(SEPARATOR) else {
        return;
    };
    let mut inner_key = Node::scalar(rest, Style::Plain);
    inner_key.tag.clone_from(&key.tag);
    let base = base.to_string();
    tracing::debug!(key = %key.value, base = %base, "expanding dotted key");
    key.value = base;

    let original = std::mem::take(value);
    *value = Node {
        kind: NodeKind::Mapping,
        style: parent_style,
        children: vec![inner_key, original],
        ..Node::default()
    };
}
