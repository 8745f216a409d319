//! Inert stand-ins for delete regions.
//!
//! While placeheld, each outermost delete region is detached and a
//! `<tempdel data-allocation="N">` element sits in its place. The detached region
//! is kept as-is, so reverting restores the markup exactly.

use crate::change::{ChangeModel, ChangeType};
use html::{Document, NodeId};

pub const ALLOCATION_ATTRIBUTE: &str = "data-allocation";

#[derive(Debug, Default)]
pub struct PlaceholderStash {
    entries: Vec<(NodeId, NodeId)>,
}

impl PlaceholderStash {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Swaps every outermost delete region under `root` for a `tag` placeholder.
    pub fn placehold(doc: &mut Document, root: NodeId, model: ChangeModel<'_>, tag: &str) -> Self {
        let regions: Vec<NodeId> = model
            .change_nodes(doc, root, Some(ChangeType::Delete))
            .into_iter()
            .filter(|n| model.outermost_change_node(doc, root, *n, ChangeType::Delete) == Some(*n))
            .collect();
        let mut entries = Vec::with_capacity(regions.len());
        for (allocation, region) in regions.into_iter().enumerate() {
            let placeholder = doc.create_element_with(
                tag,
                vec![(ALLOCATION_ATTRIBUTE.to_string(), Some(allocation.to_string()))],
            );
            if let Err(err) = doc.insert_before(region, placeholder) {
                log::warn!(target: "track.placeholder", "cannot placehold {region:?}: {err}");
                continue;
            }
            doc.detach(region);
            entries.push((placeholder, region));
        }
        log::debug!(target: "track.placeholder", "placeheld {} delete regions", entries.len());
        Self { entries }
    }

    /// Puts every stashed region back where its placeholder is. Placeholders
    /// that were removed in the meantime lose their region.
    pub fn revert(self, doc: &mut Document) -> usize {
        let mut restored = 0;
        for (placeholder, region) in self.entries {
            match doc.insert_before(placeholder, region) {
                Ok(()) => {
                    doc.detach(placeholder);
                    restored += 1;
                }
                Err(err) => {
                    log::warn!(target: "track.placeholder", "placeholder {placeholder:?} is gone: {err}");
                }
            }
        }
        restored
    }
}
