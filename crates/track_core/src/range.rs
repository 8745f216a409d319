//! Boundary points, ranges and character-unit caret arithmetic.
//!
//! A boundary inside a text node carries a byte offset on a char boundary; any
//! other boundary carries a child index. Movement is counted in characters, with
//! every stub element worth exactly one.

use html::traverse::{next_leaf, previous_leaf};
use html::{Document, Gap, NodeId};
use std::cmp::Ordering;
use tools::text::{advance_chars, char_len, chars_before, retreat_chars};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    pub fn at_gap(gap: Gap) -> Self {
        Self::new(gap.parent, gap.index)
    }

    pub fn before(doc: &Document, node: NodeId) -> Option<Self> {
        Gap::before(doc, node).map(Self::at_gap)
    }

    pub fn after(doc: &Document, node: NodeId) -> Option<Self> {
        Gap::after(doc, node).map(Self::at_gap)
    }

    /// Whether the offset is addressable in the current tree.
    pub fn is_valid(&self, doc: &Document) -> bool {
        match doc.text(self.node) {
            Some(text) if doc.is_text(self.node) => {
                self.offset <= text.len() && text.is_char_boundary(self.offset)
            }
            _ => doc.allows_children(self.node) && self.offset <= doc.child_count(self.node),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Boundary,
    pub end: Boundary,
}

impl Range {
    pub fn new(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    pub fn collapsed(at: Boundary) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn collapse(&mut self, to_start: bool) {
        if to_start {
            self.end = self.start;
        } else {
            self.start = self.end;
        }
    }

    /// True when `node` lies entirely between the two boundaries.
    pub fn contains_node(&self, doc: &Document, node: NodeId) -> bool {
        let (Some(before), Some(after)) = (Boundary::before(doc, node), Boundary::after(doc, node))
        else {
            return false;
        };
        compare_boundaries(doc, self.start, before).is_some_and(|o| o != Ordering::Greater)
            && compare_boundaries(doc, after, self.end).is_some_and(|o| o != Ordering::Greater)
    }

    /// True when some part of `node` lies strictly between the two boundaries.
    pub fn intersects_node(&self, doc: &Document, node: NodeId) -> bool {
        let (Some(before), Some(after)) = (Boundary::before(doc, node), Boundary::after(doc, node))
        else {
            return false;
        };
        compare_boundaries(doc, before, self.end) == Some(Ordering::Less)
            && compare_boundaries(doc, self.start, after) == Some(Ordering::Less)
    }
}

fn index_path(doc: &Document, node: NodeId) -> (NodeId, Vec<usize>) {
    let mut path = Vec::new();
    let mut current = node;
    while let Some(parent) = doc.parent(current) {
        path.push(doc.index_of(current).unwrap_or(0));
        current = parent;
    }
    path.reverse();
    (current, path)
}

/// Orders two boundary points in document order.
///
/// Returns `None` when the points live in different trees.
pub fn compare_boundaries(doc: &Document, a: Boundary, b: Boundary) -> Option<Ordering> {
    let (top_a, mut key_a) = index_path(doc, a.node);
    let (top_b, mut key_b) = index_path(doc, b.node);
    if top_a != top_b {
        return None;
    }
    key_a.push(a.offset);
    key_b.push(b.offset);
    Some(key_a.cmp(&key_b))
}

/// Caret arithmetic bound to one editable root.
#[derive(Clone, Copy)]
pub struct RangeWalker<'a> {
    doc: &'a Document,
    root: NodeId,
}

impl<'a> RangeWalker<'a> {
    pub fn new(doc: &'a Document, root: NodeId) -> Self {
        Self { doc, root }
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.doc.contains(self.root, node)
    }

    pub fn is_inside(&self, boundary: Boundary) -> bool {
        self.is_attached(boundary.node) && boundary.is_valid(self.doc)
    }

    /// A non-empty text node.
    pub fn is_selectable(&self, node: NodeId) -> bool {
        self.doc.is_text(node) && self.doc.text_len(node) > 0
    }

    /// First non-empty text node inside `node` (or `node` itself).
    pub fn first_selectable_child(&self, node: NodeId) -> Option<NodeId> {
        if self.doc.is_text(node) {
            return Some(node);
        }
        let mut cursor = Gap::new(node, 0);
        loop {
            let leaf = next_leaf(self.doc, node, cursor)?;
            if self.is_selectable(leaf) {
                return Some(leaf);
            }
            cursor = Gap::after(self.doc, leaf)?;
        }
    }

    /// Last non-empty text node inside `node` (or `node` itself).
    pub fn last_selectable_child(&self, node: NodeId) -> Option<NodeId> {
        if self.doc.is_text(node) {
            return Some(node);
        }
        let mut cursor = Gap::new(node, self.doc.child_count(node));
        loop {
            let leaf = previous_leaf(self.doc, node, cursor)?;
            if self.is_selectable(leaf) {
                return Some(leaf);
            }
            cursor = Gap::before(self.doc, leaf)?;
        }
    }

    fn block_of(&self, node: NodeId) -> NodeId {
        self.doc.block_parent(node, self.root).unwrap_or(self.root)
    }

    /// Next leaf after `node`'s subtree, and whether reaching it left a block.
    pub fn next_container(&self, node: NodeId) -> Option<(NodeId, bool)> {
        if !self.is_attached(node) || node == self.root {
            return None;
        }
        let leaf = next_leaf(self.doc, self.root, Gap::after(self.doc, node)?)?;
        Some((leaf, self.block_of(leaf) != self.block_of(node)))
    }

    /// Previous leaf before `node`, and whether reaching it left a block.
    pub fn previous_container(&self, node: NodeId) -> Option<(NodeId, bool)> {
        if !self.is_attached(node) || node == self.root {
            return None;
        }
        let leaf = previous_leaf(self.doc, self.root, Gap::before(self.doc, node)?)?;
        Some((leaf, self.block_of(leaf) != self.block_of(node)))
    }

    pub fn next_text_node(&self, node: NodeId) -> Option<NodeId> {
        let mut current = node;
        loop {
            let (next, _) = self.next_container(current)?;
            if self.is_selectable(next) {
                return Some(next);
            }
            current = next;
        }
    }

    pub fn previous_text_node(&self, node: NodeId) -> Option<NodeId> {
        let mut current = node;
        loop {
            let (previous, _) = self.previous_container(current)?;
            if self.is_selectable(previous) {
                return Some(previous);
            }
            current = previous;
        }
    }

    /// Moves `boundary` by `units` characters; negative moves left.
    pub fn move_boundary(
        &self,
        boundary: Boundary,
        units: isize,
        treat_as_start: bool,
    ) -> Option<Boundary> {
        match units.cmp(&0) {
            Ordering::Greater => self.move_char_right(boundary, units.unsigned_abs(), treat_as_start),
            Ordering::Less => self.move_char_left(boundary, units.unsigned_abs()),
            Ordering::Equal => self.is_inside(boundary).then_some(boundary),
        }
    }

    /// Moves right by `units`. Landing exactly on the end of a text node while
    /// moving a start boundary prefers the start of the next text in the same block.
    pub fn move_char_right(
        &self,
        boundary: Boundary,
        units: usize,
        treat_as_start: bool,
    ) -> Option<Boundary> {
        if !self.is_inside(boundary) {
            return None;
        }
        if units == 0 {
            return Some(boundary);
        }
        let doc = self.doc;
        let mut remaining = units;
        let mut last = boundary;
        let mut cursor = if doc.is_text(boundary.node) {
            let text = doc.text(boundary.node).unwrap_or_default();
            if let Some(offset) = advance_chars(text, boundary.offset, remaining) {
                return Some(Boundary::new(boundary.node, offset));
            }
            remaining -= char_len(&text[boundary.offset..]);
            last = Boundary::new(boundary.node, text.len());
            match Gap::after(doc, boundary.node) {
                Some(gap) => gap,
                None => return Some(last),
            }
        } else {
            Gap::new(boundary.node, boundary.offset)
        };

        while let Some(leaf) = next_leaf(doc, self.root, cursor) {
            cursor = Gap::after(doc, leaf)?;
            if doc.is_text(leaf) {
                let text = doc.text(leaf).unwrap_or_default();
                if let Some(offset) = advance_chars(text, 0, remaining) {
                    if offset == text.len() && treat_as_start {
                        if let Some(next) = next_leaf(doc, self.root, cursor)
                            .filter(|n| doc.is_text(*n) && self.block_of(*n) == self.block_of(leaf))
                        {
                            return Some(Boundary::new(next, 0));
                        }
                    }
                    return Some(Boundary::new(leaf, offset));
                }
                remaining -= char_len(text);
                last = Boundary::new(leaf, text.len());
            } else {
                remaining -= 1;
                last = Boundary::at_gap(cursor);
                if remaining == 0 {
                    return Some(last);
                }
            }
        }
        Some(last)
    }

    pub fn move_char_left(&self, boundary: Boundary, units: usize) -> Option<Boundary> {
        if !self.is_inside(boundary) {
            return None;
        }
        if units == 0 {
            return Some(boundary);
        }
        let doc = self.doc;
        let mut remaining = units;
        let mut last = boundary;
        let mut cursor = if doc.is_text(boundary.node) {
            let text = doc.text(boundary.node).unwrap_or_default();
            if let Some(offset) = retreat_chars(text, boundary.offset, remaining) {
                return Some(Boundary::new(boundary.node, offset));
            }
            remaining -= chars_before(text, boundary.offset);
            last = Boundary::new(boundary.node, 0);
            match Gap::before(doc, boundary.node) {
                Some(gap) => gap,
                None => return Some(last),
            }
        } else {
            Gap::new(boundary.node, boundary.offset)
        };

        while let Some(leaf) = previous_leaf(doc, self.root, cursor) {
            cursor = Gap::before(doc, leaf)?;
            if doc.is_text(leaf) {
                let text = doc.text(leaf).unwrap_or_default();
                let len = char_len(text);
                if remaining <= len {
                    let offset = retreat_chars(text, text.len(), remaining)?;
                    return Some(Boundary::new(leaf, offset));
                }
                remaining -= len;
                last = Boundary::new(leaf, 0);
            } else {
                remaining -= 1;
                last = Boundary::at_gap(cursor);
                if remaining == 0 {
                    return Some(last);
                }
            }
        }
        Some(last)
    }

    /// Moves the start of `range`; the end follows when the start passes it.
    pub fn move_start(&self, range: Range, units: isize) -> Option<Range> {
        let start = self.move_boundary(range.start, units, true)?;
        let end = match compare_boundaries(self.doc, start, range.end) {
            Some(Ordering::Greater) => start,
            _ => range.end,
        };
        Some(Range::new(start, end))
    }

    /// Moves the end of `range`; the start follows when the end passes it.
    pub fn move_end(&self, range: Range, units: isize) -> Option<Range> {
        let end = self.move_boundary(range.end, units, false)?;
        let start = match compare_boundaries(self.doc, range.start, end) {
            Some(Ordering::Greater) => end,
            _ => range.start,
        };
        Some(Range::new(start, end))
    }

    /// Normal form of a caret position.
    ///
    /// Carets that render at the same spot inside one block (end of a text, the
    /// gap after it, the start of the following text) share one normal form: the
    /// end of the preceding leaf, or the start of the first leaf when nothing
    /// precedes it in the block.
    pub fn canonical(&self, boundary: Boundary) -> Option<Boundary> {
        if !self.is_inside(boundary) {
            return None;
        }
        let doc = self.doc;
        let gap = if doc.is_text(boundary.node) {
            if boundary.offset > 0 {
                return Some(boundary);
            }
            Gap::before(doc, boundary.node)?
        } else {
            Gap::new(boundary.node, boundary.offset)
        };
        let block = self.block_of(gap.parent);
        if let Some(leaf) = previous_leaf(doc, block, gap) {
            return Some(if doc.is_text(leaf) {
                Boundary::new(leaf, doc.text_len(leaf))
            } else {
                Boundary::after(doc, leaf)?
            });
        }
        match next_leaf(doc, block, gap) {
            Some(leaf) if doc.is_text(leaf) => Some(Boundary::new(leaf, 0)),
            Some(leaf) => Boundary::before(doc, leaf),
            None => Some(Boundary::at_gap(gap)),
        }
    }
}

/// Copies the part of the tree covered by `range` into a detached fragment.
pub fn clone_contents(doc: &mut Document, root: NodeId, range: Range) -> Option<NodeId> {
    let walker = RangeWalker::new(doc, root);
    if !walker.is_inside(range.start) || !walker.is_inside(range.end) {
        return None;
    }
    if compare_boundaries(doc, range.start, range.end)? == Ordering::Greater {
        return None;
    }
    let fragment = doc.create_fragment();
    if range.start.node == range.end.node && doc.is_text(range.start.node) {
        let slice = doc
            .text(range.start.node)
            .and_then(|t| t.get(range.start.offset..range.end.offset))
            .unwrap_or_default()
            .to_string();
        let text = doc.create_text(slice);
        doc.append_child(fragment, text).ok()?;
        return Some(fragment);
    }
    let common = common_container(doc, range.start.node, range.end.node)?;
    for child in doc.children(common).to_vec() {
        if range.intersects_node(doc, child) {
            let copy = clone_partial(doc, child, range);
            doc.append_child(fragment, copy).ok()?;
        }
    }
    Some(fragment)
}

fn common_container(doc: &Document, a: NodeId, b: NodeId) -> Option<NodeId> {
    let a = if doc.is_text(a) { doc.parent(a)? } else { a };
    std::iter::once(a)
        .chain(doc.ancestors(a))
        .find(|candidate| doc.contains(*candidate, b))
}

fn clone_partial(doc: &mut Document, node: NodeId, range: Range) -> NodeId {
    if doc.is_text(node) {
        let text = doc.text(node).unwrap_or_default();
        let from = if range.start.node == node { range.start.offset } else { 0 };
        let to = if range.end.node == node { range.end.offset } else { text.len() };
        let slice = text.get(from..to).unwrap_or_default().to_string();
        return doc.create_text(slice);
    }
    let copy = doc.shallow_clone(node);
    for child in doc.children(node).to_vec() {
        if range.intersects_node(doc, child) {
            let child_copy = clone_partial(doc, child, range);
            if let Err(err) = doc.append_child(copy, child_copy) {
                log::warn!(target: "track.range", "dropping cloned node: {err}");
            }
        }
    }
    copy
}

/// HTML of the content covered by `range`; empty when the range is unusable.
pub fn serialize_range_html(doc: &mut Document, root: NodeId, range: Range) -> String {
    clone_contents(doc, root, range)
        .map(|fragment| doc.inner_html(fragment))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(doc: &Document, b: Boundary) -> &str {
        doc.text(b.node).unwrap()
    }

    #[test]
    fn boundary_order_follows_document_order() {
        let doc = Document::parse("<p>ab<em>cd</em></p>");
        let p = doc.first_child(doc.root()).unwrap();
        let ab = doc.children(p)[0];
        let em = doc.children(p)[1];
        let cd = doc.first_child(em).unwrap();
        let pts = [
            Boundary::new(p, 0),
            Boundary::new(ab, 0),
            Boundary::new(ab, 2),
            Boundary::new(p, 1),
            Boundary::new(cd, 1),
            Boundary::new(p, 2),
        ];
        for pair in pts.windows(2) {
            assert_eq!(compare_boundaries(&doc, pair[0], pair[1]), Some(Ordering::Less));
        }
    }

    #[test]
    fn moves_across_inline_elements() {
        let doc = Document::parse("<p>test<span>a paragraph</span>test</p>");
        let root = doc.root();
        let p = doc.first_child(root).unwrap();
        let last = doc.children(p)[2];
        let walker = RangeWalker::new(&doc, root);
        let left = walker.move_boundary(Boundary::new(last, 2), -15, true).unwrap();
        assert_eq!((text_of(&doc, left), left.offset), ("test", 2));
        let left = walker.move_boundary(Boundary::new(last, 2), -6, true).unwrap();
        assert_eq!((text_of(&doc, left), left.offset), ("a paragraph", 7));
        let first = doc.children(p)[0];
        let right = walker.move_boundary(Boundary::new(first, 2), 15, true).unwrap();
        assert_eq!((right.node, right.offset), (last, 2));
    }

    #[test]
    fn stubs_count_as_one_character() {
        let doc = Document::parse("<p>a<img>b</p>");
        let root = doc.root();
        let p = doc.first_child(root).unwrap();
        let a = doc.children(p)[0];
        let walker = RangeWalker::new(&doc, root);
        assert_eq!(
            walker.move_char_right(Boundary::new(a, 1), 1, false),
            Some(Boundary::new(p, 2))
        );
        let b = doc.children(p)[2];
        assert_eq!(
            walker.move_char_right(Boundary::new(a, 1), 2, false),
            Some(Boundary::new(b, 1))
        );
        assert_eq!(
            walker.move_char_left(Boundary::new(b, 0), 1),
            Some(Boundary::new(p, 1))
        );
    }

    #[test]
    fn zero_units_next_to_a_stub_stays_put() {
        let doc = Document::parse("<p>a<img>b</p>");
        let root = doc.root();
        let p = doc.first_child(root).unwrap();
        let walker = RangeWalker::new(&doc, root);
        let at = Boundary::new(p, 1);
        assert_eq!(walker.move_char_right(at, 0, false), Some(at));
        assert_eq!(walker.move_char_left(Boundary::new(p, 2), 0), Some(Boundary::new(p, 2)));
    }

    #[test]
    fn move_start_crosses_nested_inline_elements() {
        let doc = Document::parse("<p>test<span><em>a paragraph</em></span>test</p>");
        let root = doc.root();
        let p = doc.first_child(root).unwrap();
        let last = doc.children(p)[2];
        let walker = RangeWalker::new(&doc, root);
        let range = Range::collapsed(Boundary::new(last, 2));
        let moved = walker.move_start(range, -6).unwrap();
        assert_eq!((text_of(&doc, moved.start), moved.start.offset), ("a paragraph", 7));
        assert_eq!(moved.end, range.end);

        let back = walker.move_start(moved, 6).unwrap();
        assert_eq!(back.start, Boundary::new(last, 2));
        assert_eq!(back.end, range.end);
    }

    #[test]
    fn moves_skip_empty_blocks() {
        let doc = Document::parse(
            "<p>test<span><em>a paragraph</em></span>test</p><p></p>\
             <p>test<span><em>a paragraph</em></span>test</p>",
        );
        let root = doc.root();
        let blocks = doc.children(root).to_vec();
        let em_text = |block: NodeId| {
            let em = doc.first_child(doc.children(block)[1]).unwrap();
            doc.first_child(em).unwrap()
        };
        let (first, second) = (em_text(blocks[0]), em_text(blocks[2]));
        let walker = RangeWalker::new(&doc, root);

        let right = walker.move_start(Range::collapsed(Boundary::new(first, 7)), 19).unwrap();
        assert_eq!(right.start, Boundary::new(second, 7));
        assert_eq!(right.end, right.start);

        let left = walker.move_start(Range::collapsed(Boundary::new(second, 7)), -19).unwrap();
        assert_eq!(left.start, Boundary::new(first, 7));
        assert_eq!(left.end, Boundary::new(second, 7));
    }

    #[test]
    fn move_end_pulls_the_start_along() {
        let doc = Document::parse("<p>test<span><em>a paragraph</em></span>test</p>");
        let root = doc.root();
        let p = doc.first_child(root).unwrap();
        let last = doc.children(p)[2];
        let walker = RangeWalker::new(&doc, root);
        let moved = walker.move_end(Range::collapsed(Boundary::new(last, 2)), -6).unwrap();
        assert_eq!((text_of(&doc, moved.end), moved.end.offset), ("a paragraph", 7));
        assert_eq!(moved.start, moved.end);

        let grown = walker.move_end(moved, 2).unwrap();
        assert_eq!(grown.start, moved.start);
        assert_eq!(grown.end.offset, 9);
    }

    #[test]
    fn single_steps_across_stub_only_blocks() {
        let doc = Document::parse("<p>a paragraph</p><ol><li><span><img></span></li></ol>");
        let root = doc.root();
        let text = doc.first_child(doc.children(root)[0]).unwrap();
        let li = doc.first_child(doc.children(root)[1]).unwrap();
        let walker = RangeWalker::new(&doc, root);
        let moved = walker.move_start(Range::collapsed(Boundary::new(li, 0)), -1).unwrap();
        assert_eq!(moved.start, Boundary::new(text, 10));

        let doc = Document::parse("<p><span>a paragraph</span></p>");
        let root = doc.root();
        let p = doc.first_child(root).unwrap();
        let text = doc.first_child(doc.first_child(p).unwrap()).unwrap();
        let walker = RangeWalker::new(&doc, root);
        let moved = walker.move_start(Range::collapsed(Boundary::new(p, 0)), 1).unwrap();
        assert_eq!(moved.start, Boundary::new(text, 1));
        assert_eq!(moved.end, moved.start);
    }

    #[test]
    fn movement_clamps_at_root_edges() {
        let doc = Document::parse("<p>ab</p>");
        let root = doc.root();
        let ab = doc.first_child(doc.first_child(root).unwrap()).unwrap();
        let walker = RangeWalker::new(&doc, root);
        assert_eq!(walker.move_char_right(Boundary::new(ab, 1), 10, false), Some(Boundary::new(ab, 2)));
        assert_eq!(walker.move_char_left(Boundary::new(ab, 1), 10), Some(Boundary::new(ab, 0)));
    }

    #[test]
    fn multibyte_text_moves_by_characters() {
        let doc = Document::parse("<p>é€x</p>");
        let root = doc.root();
        let t = doc.first_child(doc.first_child(root).unwrap()).unwrap();
        let walker = RangeWalker::new(&doc, root);
        assert_eq!(walker.move_char_right(Boundary::new(t, 0), 2, false), Some(Boundary::new(t, 5)));
        assert_eq!(walker.move_char_left(Boundary::new(t, 5), 1), Some(Boundary::new(t, 2)));
    }

    #[test]
    fn treat_as_start_prefers_following_text() {
        let doc = Document::parse("<p>ab<em>cd</em></p>");
        let root = doc.root();
        let p = doc.first_child(root).unwrap();
        let ab = doc.children(p)[0];
        let cd = doc.first_child(doc.children(p)[1]).unwrap();
        let walker = RangeWalker::new(&doc, root);
        assert_eq!(walker.move_char_right(Boundary::new(p, 0), 2, true), Some(Boundary::new(cd, 0)));
        assert_eq!(walker.move_char_right(Boundary::new(p, 0), 2, false), Some(Boundary::new(ab, 2)));
    }

    #[test]
    fn detached_boundaries_yield_none() {
        let mut doc = Document::parse("<p>ab</p>");
        let root = doc.root();
        let loose = doc.create_text("zz");
        let walker = RangeWalker::new(&doc, root);
        assert_eq!(walker.move_boundary(Boundary::new(loose, 1), 1, false), None);
        assert_eq!(walker.canonical(Boundary::new(loose, 0)), None);
    }

    #[test]
    fn canonical_joins_equivalent_carets() {
        let doc = Document::parse("<p>ab<span>cd</span></p>");
        let root = doc.root();
        let p = doc.first_child(root).unwrap();
        let ab = doc.children(p)[0];
        let span = doc.children(p)[1];
        let cd = doc.first_child(span).unwrap();
        let walker = RangeWalker::new(&doc, root);
        let end_of_ab = Some(Boundary::new(ab, 2));
        assert_eq!(walker.canonical(Boundary::new(p, 1)), end_of_ab);
        assert_eq!(walker.canonical(Boundary::new(span, 0)), end_of_ab);
        assert_eq!(walker.canonical(Boundary::new(cd, 0)), end_of_ab);
        assert_eq!(walker.canonical(Boundary::new(p, 0)), Some(Boundary::new(ab, 0)));
        assert_eq!(walker.canonical(Boundary::new(cd, 1)), Some(Boundary::new(cd, 1)));
    }

    #[test]
    fn containers_report_skipped_blocks() {
        let doc = Document::parse("<p>one</p><p></p><p>two</p>");
        let root = doc.root();
        let one = doc.first_child(doc.children(root)[0]).unwrap();
        let two = doc.first_child(doc.children(root)[2]).unwrap();
        let walker = RangeWalker::new(&doc, root);
        assert_eq!(walker.next_container(one), Some((two, true)));
        assert_eq!(walker.previous_text_node(two), Some(one));
        assert_eq!(walker.first_selectable_child(root), Some(one));
        assert_eq!(walker.last_selectable_child(root), Some(two));
    }

    #[test]
    fn serializes_partial_range() {
        let mut doc = Document::parse("<p>hello <b>bold</b> world</p><p>next</p>");
        let root = doc.root();
        let p = doc.children(root)[0];
        let hello = doc.children(p)[0];
        let bold = doc.first_child(doc.children(p)[1]).unwrap();
        let html = serialize_range_html(
            &mut doc,
            root,
            Range::new(Boundary::new(hello, 3), Boundary::new(bold, 2)),
        );
        assert_eq!(html, "lo <b>bo</b>");
        let next = doc.first_child(doc.children(root)[1]).unwrap();
        let across = serialize_range_html(
            &mut doc,
            root,
            Range::new(Boundary::new(bold, 2), Boundary::new(next, 2)),
        );
        assert_eq!(across, "<p><b>ld</b> world</p><p>ne</p>");
    }
}
