//! Tracked insertion.
//!
//! Inline content lands in one insert region: the still-open region of the
//! current change when the caret touches it, otherwise a fresh region. Inserts
//! never nest, so a caret inside another insert splits that insert first, and a
//! caret inside a delete is moved past the delete run. Content carrying block
//! elements splits the caret's block and lands between the halves.

use crate::batch::ChangeId;
use crate::change::ChangeType;
use crate::edit::{EditSession, caret_after, end_of_content, gap_at, split_at};
use crate::error::{TrackError, TrackResult};
use crate::range::{Boundary, Range};
use html::{Document, DomError, Gap, NodeId, NodeKind};

/// What an insert puts into the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    /// Markup parsed into detached nodes; may contain block elements.
    Html(String),
    /// A node of the document, moved into place. A fragment contributes its children.
    Node(NodeId),
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Content::Text(text.to_string())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Content::Text(text)
    }
}

impl From<NodeId> for Content {
    fn from(node: NodeId) -> Self {
        Content::Node(node)
    }
}

impl EditSession<'_> {
    /// Inserts `content` at `range`, replacing a non-collapsed range first.
    ///
    /// Returns the caret after the inserted content.
    pub fn insert(&mut self, content: Content, range: Range) -> TrackResult<Option<Boundary>> {
        if !self.is_inside(range) {
            return Err(TrackError::OutsideRoot);
        }
        if !self.tracking() {
            let caret = if range.is_collapsed() {
                range.start
            } else {
                self.delete_range_plain(range)?
            };
            let nodes = self.materialize(content, caret)?;
            let caret = if nodes.is_empty() {
                caret
            } else {
                self.place(caret, nodes, None)?
            };
            self.tracker.close();
            return Ok(Some(caret));
        }

        let start = self.canonical(range.start);
        let change_id = self.tracker.begin_edit(start);
        let caret = if range.is_collapsed() {
            range.start
        } else {
            self.delete_range_tracked(range, change_id)?
        };
        let nodes = self.materialize(content, caret)?;
        let caret = if nodes.is_empty() {
            caret
        } else {
            self.place(caret, nodes, Some(change_id))?
        };
        let canonical = self.canonical(caret);
        self.tracker.finish_edit(change_id, canonical);
        log::debug!(target: "track.insert", "inserted into change {change_id}");
        Ok(Some(caret))
    }

    /// Turns `content` into detached nodes ready to be placed at `caret`.
    fn materialize(&mut self, content: Content, caret: Boundary) -> TrackResult<Vec<NodeId>> {
        let nodes = match content {
            Content::Text(text) if text.is_empty() => Vec::new(),
            Content::Text(text) => vec![self.doc.create_text(text)],
            Content::Html(markup) => self.doc.parse_fragment(&markup),
            Content::Node(node) => {
                if self.doc.contains(node, self.root) || self.doc.contains(node, caret.node) {
                    return Err(DomError::CycleDetected {
                        parent: caret.node,
                        child: node,
                    }
                    .into());
                }
                if matches!(self.doc.kind(node), NodeKind::Fragment) {
                    let children = self.doc.children(node).to_vec();
                    for child in &children {
                        self.doc.detach(*child);
                    }
                    children
                } else {
                    self.doc.detach(node);
                    vec![node]
                }
            }
        };
        Ok(nodes)
    }

    fn place(
        &mut self,
        caret: Boundary,
        nodes: Vec<NodeId>,
        change_id: Option<ChangeId>,
    ) -> TrackResult<Boundary> {
        if nodes.iter().any(|n| self.doc.is_block(*n)) {
            return self.place_blocks(caret, nodes, change_id);
        }
        let caret = self.ensure_block(caret)?;
        self.place_inline(caret, nodes, change_id)
    }

    fn place_inline(
        &mut self,
        caret: Boundary,
        nodes: Vec<NodeId>,
        change_id: Option<ChangeId>,
    ) -> TrackResult<Boundary> {
        match change_id {
            Some(change_id) => self.insert_inline(caret, nodes, change_id),
            None => self.insert_plain(caret, &nodes),
        }
    }

    /// A caret sitting directly in the root between blocks (or in an empty root)
    /// gets a fresh block element to type into.
    fn ensure_block(&mut self, caret: Boundary) -> TrackResult<Boundary> {
        if caret.node != self.root {
            return Ok(caret);
        }
        let doc = &*self.doc;
        let before = caret
            .offset
            .checked_sub(1)
            .and_then(|i| doc.child_at(self.root, i));
        let after = doc.child_at(self.root, caret.offset);
        let block_or_edge = |n: Option<NodeId>| n.is_none_or(|n| doc.is_block(n));
        if !(block_or_edge(before) && block_or_edge(after)) {
            return Ok(caret);
        }
        let block = self.doc.create_element(&self.config.block_element);
        self.doc.insert_child(self.root, caret.offset, block)?;
        Ok(Boundary::new(block, 0))
    }

    fn insert_plain(&mut self, caret: Boundary, nodes: &[NodeId]) -> TrackResult<Boundary> {
        if let [single] = nodes {
            if self.doc.is_text(*single) && self.doc.is_text(caret.node) {
                let text = self.doc.text(*single).unwrap_or_default().to_string();
                self.doc.insert_text(caret.node, caret.offset, &text)?;
                return Ok(Boundary::new(caret.node, caret.offset + text.len()));
            }
        }
        let gap = gap_at(self.doc, caret)?;
        self.put(gap, nodes)
    }

    fn put(&mut self, gap: Gap, nodes: &[NodeId]) -> TrackResult<Boundary> {
        for (i, node) in nodes.iter().enumerate() {
            self.doc.insert_child(gap.parent, gap.index + i, *node)?;
        }
        match nodes.last() {
            Some(last) => Ok(caret_after(self.doc, *last)?),
            None => Ok(Boundary::at_gap(gap)),
        }
    }

    fn insert_inline(
        &mut self,
        caret: Boundary,
        nodes: Vec<NodeId>,
        change_id: ChangeId,
    ) -> TrackResult<Boundary> {
        let caret = self.escape_deletes(caret);
        if let Some(at) = self.open_insert_position(caret, change_id) {
            log::trace!(target: "track.insert", "extending open region of change {change_id}");
            return self.insert_plain(at, &nodes);
        }
        let model = self.model();
        let gap = match model.outermost_change_node(self.doc, self.root, caret.node, ChangeType::Insert) {
            Some(outer) => split_at(self.doc, caret, outer)?,
            None => gap_at(self.doc, caret)?,
        };
        let region = self.new_region(ChangeType::Insert, change_id);
        self.doc.insert_child(gap.parent, gap.index, region)?;
        let last = nodes.last().copied();
        for node in nodes {
            self.doc.append_child(region, node)?;
        }
        self.announce_created(region, ChangeType::Insert);
        let mut caret = end_of_content(self.doc, region);
        let survivor = self.merge_neighbours(region)?;
        if survivor != region && caret.node == region {
            // The region was folded into an earlier one of the same change.
            caret = match last {
                Some(last) => caret_after(self.doc, last)?,
                None => end_of_content(self.doc, survivor),
            };
        }
        self.announce_inserted(survivor, caret);
        Ok(caret)
    }

    /// Where typing continues the current user's open insert, if the caret (or
    /// its normal form) touches one of `change_id`.
    fn open_insert_position(&self, caret: Boundary, change_id: ChangeId) -> Option<Boundary> {
        let model = self.model();
        let user = self.user();
        let doc = &*self.doc;
        [self.canonical(caret), caret].into_iter().find(|at| {
            !model.is_deleted(doc, self.root, at.node)
                && model
                    .enclosing_change_node(doc, self.root, at.node, Some(ChangeType::Insert))
                    .is_some_and(|region| {
                        model.is_current_user_open_insert(doc, region, user, Some(change_id))
                    })
        })
    }

    /// Moves a caret that sits inside a delete region to just after the delete
    /// run that contains it.
    fn escape_deletes(&self, caret: Boundary) -> Boundary {
        let model = self.model();
        let doc = &*self.doc;
        let Some(outer) = model.outermost_change_node(doc, self.root, caret.node, ChangeType::Delete)
        else {
            return caret;
        };
        let mut last = outer;
        while let Some(next) = doc.next_sibling(last) {
            let skippable = model.is_change_node(doc, next, Some(ChangeType::Delete))
                || (doc.is_text(next) && doc.text_len(next) == 0);
            if !skippable {
                break;
            }
            last = next;
        }
        Boundary::after(doc, last).unwrap_or(caret)
    }

    /// Block-carrying content: leading inline nodes finish the left half of the
    /// caret's block, trailing inline nodes start the right half, and the blocks
    /// in between land between the halves.
    fn place_blocks(
        &mut self,
        caret: Boundary,
        nodes: Vec<NodeId>,
        change_id: Option<ChangeId>,
    ) -> TrackResult<Boundary> {
        let doc = &*self.doc;
        let (Some(first), Some(last)) = (
            nodes.iter().position(|n| doc.is_block(*n)),
            nodes.iter().rposition(|n| doc.is_block(*n)),
        ) else {
            return self.place_inline(caret, nodes, change_id);
        };
        let caret = self.escape_deletes(caret);
        let model = self.model();
        let at = match model.outermost_change_node(self.doc, self.root, caret.node, ChangeType::Insert) {
            Some(outer) => Boundary::at_gap(split_at(self.doc, caret, outer)?),
            None => caret,
        };

        let Some(block) = self.doc.block_parent(at.node, self.root) else {
            return self.place_in_root(at, nodes, change_id);
        };
        let leading = nodes[..first].to_vec();
        let middle = self.group_into_blocks(&nodes[first..=last])?;
        let trailing = nodes[last + 1..].to_vec();

        let (left, right) = split_block(self.doc, at, block)?;
        if !leading.is_empty() {
            let end = Boundary::new(left, self.doc.child_count(left));
            self.place_inline(end, leading, change_id)?;
        }
        let mut caret = Boundary::new(right, 0);
        let mut previous = left;
        for block in middle {
            let regions = self.prepare_block(block, change_id)?;
            self.doc.insert_after(previous, block)?;
            previous = block;
            caret = end_of_content(self.doc, block);
            self.announce_regions(&regions, caret);
        }
        if !trailing.is_empty() {
            caret = self.place_inline(Boundary::new(right, 0), trailing, change_id)?;
        }
        for half in [left, right] {
            if !self.doc.contains(half, caret.node) {
                self.remove_if_empty(half);
            }
        }
        Ok(caret)
    }

    /// Block content at a position with no enclosing block: every inline run
    /// becomes a block of its own.
    fn place_in_root(
        &mut self,
        at: Boundary,
        nodes: Vec<NodeId>,
        change_id: Option<ChangeId>,
    ) -> TrackResult<Boundary> {
        let gap = if at.node == self.root {
            Gap::new(self.root, at.offset)
        } else {
            let top = top_below(self.doc, self.root, at.node).ok_or(DomError::Detached(at.node))?;
            split_at(self.doc, at, top)?
        };
        let blocks = self.group_into_blocks(&nodes)?;
        let mut caret = Boundary::at_gap(gap);
        for (i, block) in blocks.into_iter().enumerate() {
            let regions = self.prepare_block(block, change_id)?;
            self.doc.insert_child(gap.parent, gap.index + i, block)?;
            caret = end_of_content(self.doc, block);
            self.announce_regions(&regions, caret);
        }
        Ok(caret)
    }

    /// Wraps each run of consecutive inline nodes in a new block element.
    fn group_into_blocks(&mut self, nodes: &[NodeId]) -> TrackResult<Vec<NodeId>> {
        let mut blocks = Vec::new();
        let mut pending: Option<NodeId> = None;
        for node in nodes {
            if self.doc.is_block(*node) {
                pending = None;
                blocks.push(*node);
                continue;
            }
            let holder = match pending {
                Some(holder) => holder,
                None => {
                    let holder = self.doc.create_element(&self.config.block_element);
                    blocks.push(holder);
                    pending = Some(holder);
                    holder
                }
            };
            self.doc.append_child(holder, *node)?;
        }
        Ok(blocks)
    }

    /// Wraps the inline runs of a detached block in insert regions when tracking.
    fn prepare_block(
        &mut self,
        block: NodeId,
        change_id: Option<ChangeId>,
    ) -> TrackResult<Vec<NodeId>> {
        let mut regions = Vec::new();
        if let Some(change_id) = change_id {
            self.wrap_inline_runs(block, change_id, &mut regions)?;
        }
        Ok(regions)
    }

    fn wrap_inline_runs(
        &mut self,
        node: NodeId,
        change_id: ChangeId,
        regions: &mut Vec<NodeId>,
    ) -> TrackResult<()> {
        let mut run = Vec::new();
        for child in self.doc.children(node).to_vec() {
            if self.doc.is_block(child) {
                self.wrap_run(&mut run, change_id, regions)?;
                self.wrap_inline_runs(child, change_id, regions)?;
            } else {
                run.push(child);
            }
        }
        self.wrap_run(&mut run, change_id, regions)
    }

    fn wrap_run(
        &mut self,
        run: &mut Vec<NodeId>,
        change_id: ChangeId,
        regions: &mut Vec<NodeId>,
    ) -> TrackResult<()> {
        let Some(first) = run.first().copied() else {
            return Ok(());
        };
        if !run.iter().any(|n| self.doc.has_text_or_stub_content(*n)) {
            run.clear();
            return Ok(());
        }
        let region = self.new_region(ChangeType::Insert, change_id);
        self.doc.insert_before(first, region)?;
        for node in run.drain(..) {
            self.doc.append_child(region, node)?;
        }
        regions.push(region);
        Ok(())
    }

    fn announce_regions(&mut self, regions: &[NodeId], caret: Boundary) {
        for region in regions {
            self.announce_created(*region, ChangeType::Insert);
            self.announce_inserted(*region, caret);
        }
    }
}

/// Ancestor of `node` (inclusive) whose parent is `root`.
fn top_below(doc: &Document, root: NodeId, node: NodeId) -> Option<NodeId> {
    std::iter::once(node)
        .chain(doc.ancestors(node))
        .find(|n| doc.parent(*n) == Some(root))
}

/// Splits `block` at `at` into itself and a shallow clone holding the content after `at`.
fn split_block(doc: &mut Document, at: Boundary, block: NodeId) -> Result<(NodeId, NodeId), DomError> {
    let gap = if at.node == block {
        Gap::new(block, at.offset)
    } else {
        let top = top_below(doc, block, at.node).ok_or(DomError::Detached(at.node))?;
        split_at(doc, at, top)?
    };
    let right = doc.shallow_clone(block);
    for child in doc.children(block)[gap.index..].to_vec() {
        doc.append_child(right, child)?;
    }
    doc.insert_after(block, right)?;
    Ok((block, right))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_block_moves_the_tail_into_a_clone() {
        let mut doc = Document::parse(r#"<div><p class="x">ab<em>cd</em></p></div>"#);
        let div = doc.first_child(doc.root()).unwrap();
        let p = doc.first_child(div).unwrap();
        let cd = doc.first_child(doc.children(p)[1]).unwrap();
        let (left, right) = split_block(&mut doc, Boundary::new(cd, 1), p).unwrap();
        assert_eq!(left, p);
        assert_eq!(
            doc.inner_html(div),
            r#"<p class="x">ab<em>c</em></p><p class="x"><em>d</em></p>"#
        );
        assert_eq!(doc.next_sibling(left), Some(right));
    }

    #[test]
    fn content_conversions() {
        assert_eq!(Content::from("a"), Content::Text("a".into()));
        assert_eq!(Content::from(String::from("b")), Content::Text("b".into()));
        assert_eq!(Content::from(NodeId(3)), Content::Node(NodeId(3)));
    }
}
