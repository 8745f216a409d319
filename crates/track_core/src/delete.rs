//! Tracked deletion.
//!
//! A collapsed delete removes one unit next to the caret: a character, a stub
//! element, or the boundary between two text blocks. Content the current user
//! inserted is removed outright; anything else is wrapped in a delete region,
//! grown from the caret side so repeated keys build a single region.

use crate::batch::ChangeId;
use crate::bookmark::Bookmark;
use crate::change::ChangeType;
use crate::edit::EditSession;
use crate::error::{TrackError, TrackResult};
use crate::range::{Boundary, Range};
use html::traverse::{next_after_subtree, next_in_order, next_leaf, previous_leaf};
use html::{Document, DomError, Gap, NodeId};
use tools::text::{next_cursor_boundary, prev_cursor_boundary};

/// The smallest piece one keystroke deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    /// Byte range of one character in a text node.
    Char { node: NodeId, start: usize, end: usize },
    Stub(NodeId),
    /// Joining two adjacent text blocks; `from` is emptied into `into`.
    BlockMerge { into: NodeId, from: NodeId },
}

impl Unit {
    fn node(self) -> NodeId {
        match self {
            Unit::Char { node, .. } | Unit::Stub(node) => node,
            Unit::BlockMerge { from, .. } => from,
        }
    }
}

impl EditSession<'_> {
    /// Deletes the selection, or one unit beside a collapsed caret.
    ///
    /// Returns the new caret, or `None` when there was nothing to delete.
    pub fn delete(&mut self, move_right: bool, range: Range) -> TrackResult<Option<Boundary>> {
        if !self.is_inside(range) {
            return Err(TrackError::OutsideRoot);
        }
        if !range.is_collapsed() {
            if !self.tracking() {
                let caret = self.delete_range_plain(range)?;
                self.tracker.close();
                return Ok(Some(caret));
            }
            let start = self.canonical(range.start);
            let change_id = self.tracker.begin_edit(start);
            let caret = self.delete_range_tracked(range, change_id)?;
            let canonical = self.canonical(caret);
            self.tracker.finish_edit(change_id, canonical);
            return Ok(Some(caret));
        }

        let caret = range.start;
        let Some(unit) = self.find_unit(caret, move_right) else {
            log::trace!(target: "track.delete", "nothing to delete at {caret:?}");
            return Ok(None);
        };
        if let Unit::BlockMerge { into, from } = unit {
            let caret = merge_blocks(self.doc, into, from)?;
            self.tracker.close();
            log::debug!(target: "track.delete", "merged block {from:?} into {into:?}");
            return Ok(Some(caret));
        }
        if !self.tracking() {
            let caret = self.remove_unit(unit)?;
            self.tracker.close();
            return Ok(Some(caret));
        }

        let start = self.canonical(caret);
        let change_id = self.tracker.begin_edit(start);
        let caret = if self.is_own_insert(unit.node()) {
            self.remove_unit(unit)?
        } else {
            self.mark_unit(unit, change_id, move_right)?
        };
        let canonical = self.canonical(caret);
        self.tracker.finish_edit(change_id, canonical);
        Ok(Some(caret))
    }

    /// Content the current user inserted, under any change id.
    fn is_own_insert(&self, node: NodeId) -> bool {
        let model = self.model();
        model
            .enclosing_change_node(self.doc, self.root, node, Some(ChangeType::Insert))
            .is_some_and(|region| model.is_current_user_insert(self.doc, region, self.user()))
    }

    fn find_unit(&self, caret: Boundary, forward: bool) -> Option<Unit> {
        let doc = &*self.doc;
        let model = self.model();
        let scope = doc.block_parent(caret.node, self.root).unwrap_or(self.root);
        let deleted = |node: NodeId| model.outermost_change_node(doc, scope, node, ChangeType::Delete);
        let past = |region: NodeId| {
            if forward {
                Gap::after(doc, region)
            } else {
                Gap::before(doc, region)
            }
        };

        let mut gap = if let Some(region) = deleted(caret.node) {
            past(region)?
        } else if doc.is_text(caret.node) {
            let text = doc.text(caret.node).unwrap_or_default();
            if forward && caret.offset < text.len() {
                return Some(Unit::Char {
                    node: caret.node,
                    start: caret.offset,
                    end: next_cursor_boundary(text, caret.offset),
                });
            }
            if !forward && caret.offset > 0 {
                return Some(Unit::Char {
                    node: caret.node,
                    start: prev_cursor_boundary(text, caret.offset),
                    end: caret.offset,
                });
            }
            if forward {
                Gap::after(doc, caret.node)?
            } else {
                Gap::before(doc, caret.node)?
            }
        } else {
            Gap::new(caret.node, caret.offset)
        };

        loop {
            let leaf = if forward {
                next_leaf(doc, scope, gap)
            } else {
                previous_leaf(doc, scope, gap)
            };
            let Some(leaf) = leaf else {
                return self.block_merge(caret.node, forward);
            };
            if let Some(region) = deleted(leaf) {
                gap = past(region)?;
                continue;
            }
            if !doc.is_text(leaf) {
                return Some(Unit::Stub(leaf));
            }
            let text = doc.text(leaf).unwrap_or_default();
            return Some(if forward {
                Unit::Char {
                    node: leaf,
                    start: 0,
                    end: next_cursor_boundary(text, 0),
                }
            } else {
                Unit::Char {
                    node: leaf,
                    start: prev_cursor_boundary(text, text.len()),
                    end: text.len(),
                }
            });
        }
    }

    /// The block join reached by running off the caret's block, if both sides hold text.
    fn block_merge(&self, node: NodeId, forward: bool) -> Option<Unit> {
        let doc = &*self.doc;
        let block = doc.block_parent(node, self.root)?;
        // Source formatting between blocks is not content.
        let mut sibling = self.sibling(block, forward)?;
        while doc
            .text(sibling)
            .is_some_and(|text| text.bytes().all(|b| b.is_ascii_whitespace()))
        {
            sibling = self.sibling(sibling, forward)?;
        }
        if !(doc.can_contain_text(block) && doc.can_contain_text(sibling)) {
            return None;
        }
        Some(if forward {
            Unit::BlockMerge {
                into: block,
                from: sibling,
            }
        } else {
            Unit::BlockMerge {
                into: sibling,
                from: block,
            }
        })
    }

    /// Physically removes `unit`, dropping a change region it leaves empty.
    fn remove_unit(&mut self, unit: Unit) -> TrackResult<Boundary> {
        let region = self
            .model()
            .enclosing_change_node(self.doc, self.root, unit.node(), None);
        let mut caret = match unit {
            Unit::Char { node, start, end } => {
                self.doc.delete_text(node, start, end)?;
                if self.doc.text_len(node) == 0 {
                    let at = Boundary::before(self.doc, node).ok_or(DomError::Detached(node))?;
                    self.doc.detach(node);
                    at
                } else {
                    Boundary::new(node, start)
                }
            }
            Unit::Stub(node) => {
                let at = Boundary::before(self.doc, node).ok_or(DomError::Detached(node))?;
                self.doc.detach(node);
                at
            }
            Unit::BlockMerge { into, from } => return Ok(merge_blocks(self.doc, into, from)?),
        };
        if let Some(at) = region.and_then(|region| self.remove_if_empty(region)) {
            caret = at;
        }
        Ok(caret)
    }

    /// Wraps `unit` in a delete region of `change_id` and parks the caret on the
    /// side the next keystroke continues from.
    fn mark_unit(&mut self, unit: Unit, change_id: ChangeId, forward: bool) -> TrackResult<Boundary> {
        let piece = match unit {
            Unit::Char { node, start, end } => isolate(self.doc, node, start, end)?,
            Unit::Stub(node) => node,
            Unit::BlockMerge { into, from } => return Ok(merge_blocks(self.doc, into, from)?),
        };
        let region = self.wrap_deleted(piece, change_id, forward)?;
        let caret = if forward {
            Boundary::before(self.doc, region)
        } else {
            Boundary::after(self.doc, region)
        };
        Ok(caret.ok_or(DomError::Detached(region))?)
    }

    /// Moves `piece` into a neighbouring delete region of this change, or a new one.
    fn wrap_deleted(&mut self, piece: NodeId, change_id: ChangeId, forward: bool) -> TrackResult<NodeId> {
        let model = self.model();
        let user = self.user();
        let before = self
            .sibling(piece, false)
            .filter(|n| model.is_extendable_delete(self.doc, *n, change_id, user));
        let after = self
            .sibling(piece, true)
            .filter(|n| model.is_extendable_delete(self.doc, *n, change_id, user));
        let region = match (forward, before, after) {
            (false, _, Some(region)) | (true, None, Some(region)) => {
                self.doc.insert_child(region, 0, piece)?;
                region
            }
            (_, Some(region), _) => {
                self.doc.append_child(region, piece)?;
                region
            }
            (_, None, None) => {
                let region = self.new_region(ChangeType::Delete, change_id);
                self.doc.insert_before(piece, region)?;
                self.doc.append_child(region, piece)?;
                self.announce_created(region, ChangeType::Delete);
                region
            }
        };
        let region = self.merge_neighbours(region)?;
        self.doc.normalize(region);
        Ok(region)
    }

    /// Marks every leaf inside `range` as deleted under `change_id`.
    ///
    /// Returns the caret at the end of the former selection.
    pub(crate) fn delete_range_tracked(&mut self, range: Range, change_id: ChangeId) -> TrackResult<Boundary> {
        let bookmark = Bookmark::create(self.doc, range, change_id)?;
        let (leaves, blocks) = covered(self.doc, self.root, bookmark);
        let model = self.model();
        let user = self.user();
        let mut emptied = Vec::new();
        for leaf in leaves {
            if model.is_deleted(self.doc, self.root, leaf) {
                continue;
            }
            if self.is_own_insert(leaf) {
                emptied.extend(model.enclosing_change_node(self.doc, self.root, leaf, None));
                self.doc.detach(leaf);
                continue;
            }
            let previous = self
                .sibling(leaf, false)
                .filter(|n| model.is_extendable_delete(self.doc, *n, change_id, user));
            let region = match previous {
                Some(region) => {
                    self.doc.append_child(region, leaf)?;
                    region
                }
                None => {
                    let region = self.new_region(ChangeType::Delete, change_id);
                    self.doc.insert_before(leaf, region)?;
                    self.doc.append_child(region, leaf)?;
                    self.announce_created(region, ChangeType::Delete);
                    region
                }
            };
            self.merge_neighbours(region)?;
        }
        for node in emptied.into_iter().chain(blocks) {
            self.discard_if_empty(node, bookmark)?;
        }
        let restored = bookmark.restore(self.doc).ok_or(TrackError::OutsideRoot)?;
        log::debug!(target: "track.delete", "marked selection deleted in change {change_id}");
        Ok(restored.end)
    }

    /// Removes every leaf inside `range` and whatever it leaves empty.
    pub(crate) fn delete_range_plain(&mut self, range: Range) -> TrackResult<Boundary> {
        let bookmark = Bookmark::create(self.doc, range, 0)?;
        let (leaves, blocks) = covered(self.doc, self.root, bookmark);
        let mut parents = Vec::new();
        for leaf in leaves {
            parents.extend(self.doc.parent(leaf));
            self.doc.detach(leaf);
        }
        for parent in parents {
            let mut current = parent;
            while current != self.root
                && !self.doc.is_block(current)
                && !self.doc.has_text_or_stub_content(current)
            {
                let Some(up) = self.doc.parent(current) else {
                    break;
                };
                self.discard_if_empty(current, bookmark)?;
                current = up;
            }
        }
        for block in blocks {
            self.discard_if_empty(block, bookmark)?;
        }
        let restored = bookmark.restore(self.doc).ok_or(TrackError::OutsideRoot)?;
        Ok(restored.start)
    }

    /// Detaches an attached `node` with no content, keeping the bookmark markers in the tree.
    fn discard_if_empty(&mut self, node: NodeId, bookmark: Bookmark) -> Result<(), DomError> {
        if node == self.root
            || self.doc.parent(node).is_none()
            || self.doc.has_text_or_stub_content(node)
        {
            return Ok(());
        }
        for marker in [bookmark.start, bookmark.end] {
            if self.doc.contains(node, marker) {
                self.doc.insert_before(node, marker)?;
            }
        }
        self.doc.detach(node);
        Ok(())
    }
}

/// Leaves strictly between the bookmark markers, and the blocks they fully cover.
fn covered(doc: &Document, root: NodeId, bookmark: Bookmark) -> (Vec<NodeId>, Vec<NodeId>) {
    let mut leaves = Vec::new();
    let mut blocks = Vec::new();
    let mut current = next_in_order(doc, root, bookmark.start);
    while let Some(node) = current {
        if node == bookmark.end {
            break;
        }
        if doc.contains(node, bookmark.end) {
            current = next_in_order(doc, root, node);
            continue;
        }
        if doc.is_leaf(node) {
            leaves.push(node);
            current = next_after_subtree(doc, root, node);
            continue;
        }
        if doc.is_block(node) {
            blocks.push(node);
        }
        current = next_in_order(doc, root, node);
    }
    (leaves, blocks)
}

/// Splits `node` so that bytes `start..end` form a text node of their own.
fn isolate(doc: &mut Document, node: NodeId, start: usize, end: usize) -> Result<NodeId, DomError> {
    let piece = if start > 0 {
        doc.split_text(node, start)?
    } else {
        node
    };
    if end - start < doc.text_len(piece) {
        doc.split_text(piece, end - start)?;
    }
    Ok(piece)
}

/// Appends `from`'s children to `into` and drops `from`. A trailing `<br>`
/// holding `into` open is removed first.
fn merge_blocks(doc: &mut Document, into: NodeId, from: NodeId) -> Result<Boundary, DomError> {
    if let Some(last) = doc.last_child(into).filter(|n| doc.is_tag(*n, "br")) {
        doc.detach(last);
    }
    let caret = Boundary::new(into, doc.child_count(into));
    doc.move_children(from, into)?;
    doc.detach(from);
    Ok(caret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolate_cuts_out_the_middle() {
        let mut doc = Document::parse("<p>abcd</p>");
        let p = doc.first_child(doc.root()).unwrap();
        let text = doc.first_child(p).unwrap();
        let piece = isolate(&mut doc, text, 1, 3).unwrap();
        assert_eq!(doc.text(piece), Some("bc"));
        assert_eq!(doc.child_count(p), 3);
    }

    #[test]
    fn merging_blocks_drops_placeholder_break() {
        let mut doc = Document::parse("<p>one<br></p><p>two</p>");
        let root = doc.root();
        let (first, second) = (doc.children(root)[0], doc.children(root)[1]);
        let caret = merge_blocks(&mut doc, first, second).unwrap();
        assert_eq!(doc.inner_html(root), "<p>onetwo</p>");
        assert_eq!(caret, Boundary::new(first, 1));
    }

    #[test]
    fn covered_skips_marker_ancestors() {
        let mut doc = Document::parse("<p>ab</p><p>cd</p><p>ef</p>");
        let root = doc.root();
        let blocks = doc.children(root).to_vec();
        let ab = doc.first_child(blocks[0]).unwrap();
        let ef = doc.first_child(blocks[2]).unwrap();
        let range = Range::new(Boundary::new(ab, 1), Boundary::new(ef, 1));
        let bookmark = Bookmark::create(&mut doc, range, 1).unwrap();
        let (leaves, covered_blocks) = covered(&doc, root, bookmark);
        let texts: Vec<_> = leaves.iter().map(|n| doc.text(*n).unwrap()).collect();
        assert_eq!(texts, ["b", "cd", "e"]);
        assert_eq!(covered_blocks, [blocks[1]]);
    }
}
