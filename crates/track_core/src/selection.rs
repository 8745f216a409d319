use crate::range::{Boundary, Range, RangeWalker, compare_boundaries};
use html::{Document, NodeId};
use std::cmp::Ordering;

/// The editor's selection: at most one range, always inside the root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    range: Option<Range>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(&self) -> Option<Range> {
        self.range
    }

    pub fn is_collapsed(&self) -> bool {
        self.range.is_some_and(|r| r.is_collapsed())
    }

    /// Replaces the selection. Ranges that are not usable under `root` are
    /// dropped with a warning and leave the selection empty.
    pub fn add_range(&mut self, doc: &Document, root: NodeId, range: Range) -> bool {
        let walker = RangeWalker::new(doc, root);
        if !walker.is_inside(range.start) || !walker.is_inside(range.end) {
            log::warn!(target: "track.selection", "ignoring range outside the editable root: {range:?}");
            self.range = None;
            return false;
        }
        let range = match compare_boundaries(doc, range.start, range.end) {
            Some(Ordering::Greater) => Range::new(range.end, range.start),
            _ => range,
        };
        self.range = Some(range);
        true
    }

    pub fn collapse(&mut self, doc: &Document, root: NodeId, at: Boundary) -> bool {
        self.add_range(doc, root, Range::collapsed(at))
    }

    pub fn remove_all_ranges(&mut self) {
        self.range = None;
    }

    /// Drops the range when a mutation left it pointing at detached or shrunk nodes.
    pub fn revalidate(&mut self, doc: &Document, root: NodeId) {
        if let Some(range) = self.range {
            let walker = RangeWalker::new(doc, root);
            if !walker.is_inside(range.start) || !walker.is_inside(range.end) {
                log::debug!(target: "track.selection", "selection invalidated by mutation");
                self.range = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ranges_outside_root() {
        let mut doc = Document::parse("<p>ab</p>");
        let root = doc.root();
        let loose = doc.create_text("x");
        let mut selection = Selection::new();
        assert!(!selection.collapse(&doc, root, Boundary::new(loose, 0)));
        assert_eq!(selection.range(), None);
        let ab = doc.first_child(doc.first_child(root).unwrap()).unwrap();
        assert!(!selection.collapse(&doc, root, Boundary::new(ab, 3)));
        assert!(selection.collapse(&doc, root, Boundary::new(ab, 2)));
        assert!(selection.is_collapsed());
    }

    #[test]
    fn reversed_ranges_are_normalized() {
        let doc = Document::parse("<p>abcd</p>");
        let root = doc.root();
        let t = doc.first_child(doc.first_child(root).unwrap()).unwrap();
        let mut selection = Selection::new();
        selection.add_range(&doc, root, Range::new(Boundary::new(t, 3), Boundary::new(t, 1)));
        assert_eq!(
            selection.range(),
            Some(Range::new(Boundary::new(t, 1), Boundary::new(t, 3)))
        );
    }

    #[test]
    fn revalidate_drops_stale_range() {
        let mut doc = Document::parse("<p>abcd</p>");
        let root = doc.root();
        let p = doc.first_child(root).unwrap();
        let t = doc.first_child(p).unwrap();
        let mut selection = Selection::new();
        selection.collapse(&doc, root, Boundary::new(t, 4));
        doc.detach(p);
        selection.revalidate(&doc, root);
        assert_eq!(selection.range(), None);
    }
}
