//! Element classification and document-order walking.

use crate::document::Document;
use crate::types::{NodeId, NodeKind};

/// Elements without meaningful text that still occupy one caret position.
pub const STUB_ELEMENTS: &[&str] = &[
    "img", "hr", "iframe", "param", "link", "meta", "input", "frame", "col", "base", "area", "br",
];

pub const BLOCK_ELEMENTS: &[&str] = &[
    "p",
    "div",
    "pre",
    "ul",
    "ol",
    "li",
    "table",
    "tbody",
    "td",
    "th",
    "fieldset",
    "form",
    "blockquote",
    "dl",
    "dt",
    "dd",
    "dir",
    "center",
    "address",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
];

/// Blocks that may directly hold inline content.
pub const TEXT_CONTAINER_ELEMENTS: &[&str] = &[
    "p",
    "div",
    "pre",
    "li",
    "td",
    "th",
    "blockquote",
    "dt",
    "dd",
    "center",
    "address",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
];

fn listed(table: &[&str], name: &str) -> bool {
    table.iter().any(|t| t.eq_ignore_ascii_case(name))
}

pub fn is_block_name(name: &str) -> bool {
    listed(BLOCK_ELEMENTS, name)
}

pub fn is_stub_name(name: &str) -> bool {
    listed(STUB_ELEMENTS, name)
}

pub fn is_text_container_name(name: &str) -> bool {
    listed(TEXT_CONTAINER_ELEMENTS, name)
}

impl Document {
    pub fn is_block(&self, id: NodeId) -> bool {
        self.tag_name(id).is_some_and(is_block_name)
    }

    pub fn is_stub(&self, id: NodeId) -> bool {
        self.tag_name(id).is_some_and(is_stub_name)
    }

    pub fn can_contain_text(&self, id: NodeId) -> bool {
        self.tag_name(id).is_some_and(is_text_container_name)
    }

    /// A caret unit: a non-empty text node or a stub element.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        match self.kind(id) {
            NodeKind::Text { text } => !text.is_empty(),
            NodeKind::Element { name, .. } => is_stub_name(name),
            _ => false,
        }
    }

    /// Nearest block element containing `id` (inclusive), stopping below `scope`.
    pub fn block_parent(&self, id: NodeId, scope: NodeId) -> Option<NodeId> {
        if id == scope {
            return None;
        }
        std::iter::once(id)
            .chain(self.ancestors(id))
            .take_while(|n| *n != scope)
            .find(|n| self.is_block(*n))
    }

    /// Character count of the subtree, counting each stub as one.
    pub fn character_length(&self, id: NodeId) -> usize {
        match self.kind(id) {
            NodeKind::Text { text } => text.chars().count(),
            NodeKind::Element { name, .. } if is_stub_name(name) => 1,
            NodeKind::Comment { .. } => 0,
            _ => self
                .children(id)
                .iter()
                .map(|c| self.character_length(*c))
                .sum(),
        }
    }

    pub fn has_text_or_stub_content(&self, id: NodeId) -> bool {
        if self.is_leaf(id) {
            return true;
        }
        self.children(id)
            .iter()
            .any(|c| self.has_text_or_stub_content(*c))
    }
}

/// The position between two children of `parent`: before the child at `index`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Gap {
    pub parent: NodeId,
    pub index: usize,
}

impl Gap {
    pub fn new(parent: NodeId, index: usize) -> Self {
        Self { parent, index }
    }

    pub fn before(doc: &Document, node: NodeId) -> Option<Self> {
        Some(Self::new(doc.parent(node)?, doc.index_of(node)?))
    }

    pub fn after(doc: &Document, node: NodeId) -> Option<Self> {
        Some(Self::new(doc.parent(node)?, doc.index_of(node)? + 1))
    }
}

/// First leaf after `gap` in document order, not leaving `scope`.
///
/// Stubs are not descended into; empty text, comments and empty elements are skipped.
pub fn next_leaf(doc: &Document, scope: NodeId, gap: Gap) -> Option<NodeId> {
    let Gap {
        mut parent,
        mut index,
    } = gap;
    loop {
        match doc.child_at(parent, index) {
            Some(child) if doc.is_leaf(child) => return Some(child),
            Some(child) if doc.allows_children(child) && doc.child_count(child) > 0 => {
                parent = child;
                index = 0;
            }
            Some(_) => index += 1,
            None => {
                if parent == scope {
                    return None;
                }
                let up = Gap::after(doc, parent)?;
                parent = up.parent;
                index = up.index;
            }
        }
    }
}

/// Last leaf before `gap` in document order, not leaving `scope`.
pub fn previous_leaf(doc: &Document, scope: NodeId, gap: Gap) -> Option<NodeId> {
    let Gap {
        mut parent,
        mut index,
    } = gap;
    loop {
        let candidate = index.checked_sub(1).and_then(|i| doc.child_at(parent, i));
        match candidate {
            Some(child) if doc.is_leaf(child) => return Some(child),
            Some(child) if doc.allows_children(child) && doc.child_count(child) > 0 => {
                index = doc.child_count(child);
                parent = child;
            }
            Some(_) => index -= 1,
            None => {
                if parent == scope {
                    return None;
                }
                let up = Gap::before(doc, parent)?;
                parent = up.parent;
                index = up.index;
            }
        }
    }
}

/// Pre-order successor of `node` inside `scope`, descending into children first.
pub fn next_in_order(doc: &Document, scope: NodeId, node: NodeId) -> Option<NodeId> {
    if let Some(first) = doc.first_child(node) {
        return Some(first);
    }
    next_after_subtree(doc, scope, node)
}

/// Pre-order successor of `node` that is not one of its descendants.
pub fn next_after_subtree(doc: &Document, scope: NodeId, node: NodeId) -> Option<NodeId> {
    let mut current = node;
    loop {
        if current == scope {
            return None;
        }
        if let Some(next) = doc.next_sibling(current) {
            return Some(next);
        }
        current = doc.parent(current)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(doc: &Document) -> NodeId {
        doc.first_child(doc.root()).unwrap()
    }

    #[test]
    fn next_leaf_skips_empty_text_and_descends_inline() {
        let mut doc = Document::parse("<p>ab<span><b></b>cd</span><img>ef</p>");
        let p = first(&doc);
        let empty = doc.create_text("");
        doc.insert_child(p, 1, empty).unwrap();
        let span = doc.children(p)[2];
        let cd = doc.children(span)[1];
        let img = doc.children(p)[3];
        assert_eq!(next_leaf(&doc, doc.root(), Gap::new(p, 1)), Some(cd));
        assert_eq!(next_leaf(&doc, doc.root(), Gap::after(&doc, cd).unwrap()), Some(img));
    }

    #[test]
    fn previous_leaf_crosses_blocks_within_scope_only() {
        let doc = Document::parse("<p>one</p><p>two</p>");
        let root = doc.root();
        let p1 = doc.children(root)[0];
        let p2 = doc.children(root)[1];
        let one = doc.first_child(p1).unwrap();
        assert_eq!(previous_leaf(&doc, root, Gap::new(p2, 0)), Some(one));
        assert_eq!(previous_leaf(&doc, p2, Gap::new(p2, 0)), None);
    }

    #[test]
    fn block_parent_is_inclusive_and_scoped() {
        let doc = Document::parse("<div><p>a<em>b</em></p></div>");
        let root = doc.root();
        let div = first(&doc);
        let p = doc.first_child(div).unwrap();
        let em = doc.children(p)[1];
        assert_eq!(doc.block_parent(em, root), Some(p));
        assert_eq!(doc.block_parent(p, root), Some(p));
        assert_eq!(doc.block_parent(em, p), None);
    }

    #[test]
    fn character_length_counts_stubs_once() {
        let doc = Document::parse("<p>a€<img><br>b</p>");
        assert_eq!(doc.character_length(first(&doc)), 5);
    }

    #[test]
    fn has_text_or_stub_content_ignores_empty_wrappers() {
        let doc = Document::parse("<p><span><em></em></span></p><p><span><hr></span></p>");
        let root = doc.root();
        assert!(!doc.has_text_or_stub_content(doc.children(root)[0]));
        assert!(doc.has_text_or_stub_content(doc.children(root)[1]));
    }

    #[test]
    fn next_in_order_walks_preorder() {
        let doc = Document::parse("<p>a<b>c</b></p><p>d</p>");
        let root = doc.root();
        let mut seen = Vec::new();
        let mut current = doc.first_child(root);
        while let Some(node) = current {
            seen.push(doc.tag_name(node).map(str::to_string).unwrap_or_else(|| doc.text_content(node)));
            current = next_in_order(&doc, root, node);
        }
        assert_eq!(seen, ["p", "a", "b", "c", "p", "d"]);
    }
}
