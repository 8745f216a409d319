//! Recognizing change regions and reading their attribution.
//!
//! Every query here walks at most the ancestor chain of the node it is given.

use crate::batch::ChangeId;
use crate::config::{TrackerConfig, User};
use html::{Document, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    Insert,
    Delete,
}

impl ChangeType {
    pub const ALL: [ChangeType; 2] = [ChangeType::Insert, ChangeType::Delete];
}

/// Attribution stored on a region's marker element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionAuthor {
    pub change_id: Option<ChangeId>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub time: Option<i64>,
}

/// Predicates over change markup, parameterized by the configured tags and attributes.
#[derive(Clone, Copy)]
pub struct ChangeModel<'a> {
    config: &'a TrackerConfig,
}

impl<'a> ChangeModel<'a> {
    pub fn new(config: &'a TrackerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'a TrackerConfig {
        self.config
    }

    pub fn change_type_of(&self, doc: &Document, node: NodeId) -> Option<ChangeType> {
        let tag = doc.tag_name(node)?;
        ChangeType::ALL.into_iter().find(|ty| {
            let cfg = self.config.change_types.get(*ty);
            tag.eq_ignore_ascii_case(&cfg.tag) && doc.has_class(node, &cfg.alias)
        })
    }

    /// True when `node` is a region marker, of `change_type` when one is given.
    pub fn is_change_node(
        &self,
        doc: &Document,
        node: NodeId,
        change_type: Option<ChangeType>,
    ) -> bool {
        match (self.change_type_of(doc, node), change_type) {
            (Some(found), Some(wanted)) => found == wanted,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    /// Nearest region marker at or above `node`, not leaving `root`.
    pub fn enclosing_change_node(
        &self,
        doc: &Document,
        root: NodeId,
        node: NodeId,
        change_type: Option<ChangeType>,
    ) -> Option<NodeId> {
        std::iter::once(node)
            .chain(doc.ancestors(node))
            .take_while(|n| *n != root)
            .find(|n| self.is_change_node(doc, *n, change_type))
    }

    /// Outermost region marker of `change_type` at or above `node`, not leaving `root`.
    pub fn outermost_change_node(
        &self,
        doc: &Document,
        root: NodeId,
        node: NodeId,
        change_type: ChangeType,
    ) -> Option<NodeId> {
        std::iter::once(node)
            .chain(doc.ancestors(node))
            .take_while(|n| *n != root)
            .filter(|n| self.is_change_node(doc, *n, Some(change_type)))
            .last()
    }

    pub fn change_id(&self, doc: &Document, node: NodeId) -> Option<ChangeId> {
        doc.attr(node, &self.config.change_id_attribute)?
            .trim()
            .parse()
            .ok()
    }

    pub fn user_id<'d>(&self, doc: &'d Document, node: NodeId) -> Option<&'d str> {
        doc.attr(node, &self.config.user_id_attribute)
    }

    pub fn region_author(&self, doc: &Document, node: NodeId) -> RegionAuthor {
        RegionAuthor {
            change_id: self.change_id(doc, node),
            user_id: self.user_id(doc, node).map(str::to_string),
            user_name: doc
                .attr(node, &self.config.user_name_attribute)
                .map(str::to_string),
            time: doc
                .attr(node, &self.config.time_attribute)
                .and_then(|t| t.trim().parse().ok()),
        }
    }

    /// Same change id and same change type. Regions without an id never match.
    pub fn is_same_change(&self, doc: &Document, a: NodeId, b: NodeId) -> bool {
        let (Some(type_a), Some(type_b)) = (self.change_type_of(doc, a), self.change_type_of(doc, b))
        else {
            return false;
        };
        let id_a = self.change_id(doc, a);
        type_a == type_b && id_a.is_some() && id_a == self.change_id(doc, b)
    }

    /// Same change and same author; the condition for merging adjacent regions.
    pub fn is_mergeable(&self, doc: &Document, a: NodeId, b: NodeId) -> bool {
        self.is_same_change(doc, a, b) && self.user_id(doc, a) == self.user_id(doc, b)
    }

    /// An insert region authored by `user`, whatever its change id.
    pub fn is_current_user_insert(&self, doc: &Document, node: NodeId, user: &User) -> bool {
        self.is_change_node(doc, node, Some(ChangeType::Insert))
            && self.user_id(doc, node) == Some(user.id.as_str())
    }

    /// An insert region authored by `user` that belongs to the change still being typed.
    pub fn is_current_user_open_insert(
        &self,
        doc: &Document,
        node: NodeId,
        user: &User,
        active: Option<ChangeId>,
    ) -> bool {
        active.is_some()
            && self.is_current_user_insert(doc, node, user)
            && self.change_id(doc, node) == active
    }

    /// A detached, empty region marker attributed to `user`.
    pub fn create_region(
        &self,
        doc: &mut Document,
        change_type: ChangeType,
        change_id: ChangeId,
        user: &User,
        time: i64,
    ) -> NodeId {
        let ty = self.config.change_types.get(change_type);
        doc.create_element_with(
            &ty.tag,
            vec![
                ("class".to_string(), Some(ty.alias.clone())),
                (self.config.change_id_attribute.clone(), Some(change_id.to_string())),
                (self.config.user_id_attribute.clone(), Some(user.id.clone())),
                (self.config.user_name_attribute.clone(), Some(user.name.clone())),
                (self.config.time_attribute.clone(), Some(time.to_string())),
            ],
        )
    }

    /// A delete region the given change may keep growing.
    pub fn is_extendable_delete(
        &self,
        doc: &Document,
        node: NodeId,
        change_id: ChangeId,
        user: &User,
    ) -> bool {
        self.is_change_node(doc, node, Some(ChangeType::Delete))
            && self.change_id(doc, node) == Some(change_id)
            && self.user_id(doc, node) == Some(user.id.as_str())
    }

    /// True when `node` sits inside a delete region below `root`.
    pub fn is_deleted(&self, doc: &Document, root: NodeId, node: NodeId) -> bool {
        self.enclosing_change_node(doc, root, node, Some(ChangeType::Delete))
            .is_some()
    }

    /// Every region marker under `root`, in document order.
    pub fn change_nodes(
        &self,
        doc: &Document,
        root: NodeId,
        change_type: Option<ChangeType>,
    ) -> Vec<NodeId> {
        doc.descendants(root)
            .into_iter()
            .filter(|n| self.is_change_node(doc, *n, change_type))
            .collect()
    }

    /// Largest change id present in the markup under `root`.
    pub fn max_change_id(&self, doc: &Document, root: NodeId) -> Option<ChangeId> {
        self.change_nodes(doc, root, None)
            .into_iter()
            .filter_map(|n| self.change_id(doc, n))
            .max()
    }
}
