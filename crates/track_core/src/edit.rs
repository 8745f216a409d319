//! State borrowed by one tracked edit, and the tree surgery shared by insert and delete.

use crate::batch::{ChangeId, ChangeTracker};
use crate::change::{ChangeModel, ChangeType};
use crate::config::{TrackerConfig, User};
use crate::error::TrackResult;
use crate::plugin::{PluginContext, PluginHost};
use crate::range::{Boundary, Range, RangeWalker};
use html::{Document, DomError, Gap, NodeId};

pub(crate) use crate::bookmark::gap_at;

/// Split borrow of the engine for the duration of one operation.
pub(crate) struct EditSession<'a> {
    pub doc: &'a mut Document,
    pub root: NodeId,
    pub config: &'a TrackerConfig,
    pub tracker: &'a mut ChangeTracker,
    pub plugins: &'a mut PluginHost,
    /// Timestamp written onto regions created by this operation.
    pub time: i64,
}

impl<'a> EditSession<'a> {
    pub fn model(&self) -> ChangeModel<'a> {
        ChangeModel::new(self.config)
    }

    pub fn user(&self) -> &'a User {
        &self.config.current_user
    }

    pub fn tracking(&self) -> bool {
        self.config.is_tracking
    }

    pub fn walker(&self) -> RangeWalker<'_> {
        RangeWalker::new(self.doc, self.root)
    }

    /// The caret's normal form, falling back to the caret itself.
    pub fn canonical(&self, caret: Boundary) -> Boundary {
        self.walker().canonical(caret).unwrap_or(caret)
    }

    pub fn is_inside(&self, range: Range) -> bool {
        let walker = self.walker();
        walker.is_inside(range.start) && walker.is_inside(range.end)
    }

    /// Creates a detached region for `change_id` authored by the current user.
    pub fn new_region(&mut self, change_type: ChangeType, change_id: ChangeId) -> NodeId {
        let model = self.model();
        let user = self.user();
        model.create_region(self.doc, change_type, change_id, user, self.time)
    }

    /// Runs `nodeCreated` for a region that is now attached.
    pub fn announce_created(&mut self, region: NodeId, change_type: ChangeType) {
        let config = self.config;
        let action = &config.change_types.get(change_type).action;
        let mut ctx = PluginContext {
            doc: &mut *self.doc,
            root: self.root,
            config,
        };
        self.plugins.node_created(&mut ctx, region, action);
    }

    pub fn announce_inserted(&mut self, node: NodeId, caret: Boundary) {
        let mut ctx = PluginContext {
            doc: &mut *self.doc,
            root: self.root,
            config: self.config,
        };
        self.plugins.node_inserted(&mut ctx, node, Range::collapsed(caret));
    }

    /// Sibling of `node` in the given direction, ignoring empty text nodes.
    pub fn sibling(&self, node: NodeId, forward: bool) -> Option<NodeId> {
        let mut current = node;
        loop {
            current = if forward {
                self.doc.next_sibling(current)?
            } else {
                self.doc.previous_sibling(current)?
            };
            if !(self.doc.is_text(current) && self.doc.text_len(current) == 0) {
                return Some(current);
            }
        }
    }

    /// Folds same-change, same-author sibling regions into one; returns the survivor.
    pub fn merge_neighbours(&mut self, region: NodeId) -> TrackResult<NodeId> {
        let model = self.model();
        if let Some(next) = self
            .sibling(region, true)
            .filter(|n| model.is_mergeable(self.doc, region, *n))
        {
            self.doc.move_children(next, region)?;
            self.doc.detach(next);
        }
        if let Some(previous) = self
            .sibling(region, false)
            .filter(|n| model.is_mergeable(self.doc, *n, region))
        {
            self.doc.move_children(region, previous)?;
            self.doc.detach(region);
            return Ok(previous);
        }
        Ok(region)
    }

    /// Detaches `node` when it holds no text or stubs; returns where it was.
    pub fn remove_if_empty(&mut self, node: NodeId) -> Option<Boundary> {
        if node == self.root || self.doc.has_text_or_stub_content(node) {
            return None;
        }
        let at = Boundary::before(self.doc, node)?;
        self.doc.detach(node);
        Some(at)
    }
}

/// Splits the ancestors of `at` up to and including `top`, returning the gap
/// in `top`'s parent where the split happened.
///
/// Elements are split by a shallow clone that receives the trailing children,
/// so attributes (including change attribution) are kept on both halves. Cuts at
/// an element's edge do not clone it.
pub(crate) fn split_at(doc: &mut Document, at: Boundary, top: NodeId) -> Result<Gap, DomError> {
    let stop = doc.parent(top).ok_or(DomError::Detached(top))?;
    if !doc.contains(top, at.node) {
        return Err(DomError::InvalidSibling {
            parent: top,
            before: at.node,
        });
    }
    let mut gap = gap_at(doc, at)?;
    while gap.parent != stop {
        let element = gap.parent;
        let count = doc.child_count(element);
        gap = if gap.index == 0 {
            Gap::before(doc, element).ok_or(DomError::Detached(element))?
        } else if gap.index >= count {
            Gap::after(doc, element).ok_or(DomError::Detached(element))?
        } else {
            let tail = doc.shallow_clone(element);
            for child in doc.children(element)[gap.index..].to_vec() {
                doc.append_child(tail, child)?;
            }
            doc.insert_after(element, tail)?;
            Gap::after(doc, element).ok_or(DomError::Detached(element))?
        };
    }
    Ok(gap)
}

/// End of the last text inside `node`, or the end of its child list when its
/// content does not end in text.
pub(crate) fn end_of_content(doc: &Document, node: NodeId) -> Boundary {
    let mut current = node;
    loop {
        match doc.last_child(current) {
            Some(last) if doc.is_text(last) => return Boundary::new(last, doc.text_len(last)),
            Some(last) if !doc.is_stub(last) && doc.child_count(last) > 0 => current = last,
            _ => return Boundary::new(current, doc.child_count(current)),
        }
    }
}

/// Caret just past `node`: the end of a text node, otherwise the gap after it.
pub(crate) fn caret_after(doc: &Document, node: NodeId) -> Result<Boundary, DomError> {
    if doc.is_text(node) {
        return Ok(Boundary::new(node, doc.text_len(node)));
    }
    Boundary::after(doc, node).ok_or(DomError::Detached(node))
}
