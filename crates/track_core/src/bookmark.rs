//! Hidden marker elements that pin a range while the tree around it is rewritten.

use crate::range::{Boundary, Range};
use html::{Document, DomError, Gap, NodeId};

pub const BOOKMARK_CLASS: &str = "iceBookmark";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bookmark {
    pub start: NodeId,
    pub end: NodeId,
}

/// Turns a boundary into a child gap, splitting a text node when the offset
/// falls inside it.
pub(crate) fn gap_at(doc: &mut Document, at: Boundary) -> Result<Gap, DomError> {
    if !doc.is_text(at.node) {
        return Ok(Gap::new(at.node, at.offset));
    }
    let len = doc.text_len(at.node);
    if at.offset == 0 {
        return Gap::before(doc, at.node).ok_or(DomError::Detached(at.node));
    }
    if at.offset < len {
        doc.split_text(at.node, at.offset)?;
    }
    Gap::after(doc, at.node).ok_or(DomError::Detached(at.node))
}

impl Bookmark {
    /// Inserts the markers, end first so splitting at the end cannot move the start.
    pub fn create(doc: &mut Document, range: Range, seq: u64) -> Result<Self, DomError> {
        let end = Self::marker(doc, "end", seq);
        let end_gap = gap_at(doc, range.end)?;
        doc.insert_child(end_gap.parent, end_gap.index, end)?;
        let start = Self::marker(doc, "start", seq);
        let start_gap = gap_at(doc, range.start)?;
        doc.insert_child(start_gap.parent, start_gap.index, start)?;
        Ok(Self { start, end })
    }

    fn marker(doc: &mut Document, which: &str, seq: u64) -> NodeId {
        doc.create_element_with(
            "span",
            vec![
                ("class".to_string(), Some(BOOKMARK_CLASS.to_string())),
                ("id".to_string(), Some(format!("{BOOKMARK_CLASS}_{which}_{seq}"))),
                ("style".to_string(), Some("display:none".to_string())),
            ],
        )
    }

    /// Removes the markers and returns the range between where they were.
    pub fn restore(self, doc: &mut Document) -> Option<Range> {
        let start = Gap::before(doc, self.start);
        doc.detach(self.start);
        let end = Gap::before(doc, self.end);
        doc.detach(self.end);
        match (start, end) {
            (Some(start), Some(end)) => Some(Range::new(Boundary::at_gap(start), Boundary::at_gap(end))),
            (Some(start), None) => Some(Range::collapsed(Boundary::at_gap(start))),
            (None, Some(end)) => Some(Range::collapsed(Boundary::at_gap(end))),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_bracket_the_range_and_vanish_on_restore() {
        let mut doc = Document::parse("<p>abcdef</p>");
        let root = doc.root();
        let p = doc.first_child(root).unwrap();
        let t = doc.first_child(p).unwrap();
        let bookmark =
            Bookmark::create(&mut doc, Range::new(Boundary::new(t, 1), Boundary::new(t, 4)), 7)
                .unwrap();
        assert_eq!(
            doc.inner_html(p),
            r#"a<span class="iceBookmark" id="iceBookmark_start_7" style="display:none"></span>bcd<span class="iceBookmark" id="iceBookmark_end_7" style="display:none"></span>ef"#
        );
        let range = bookmark.restore(&mut doc).unwrap();
        assert_eq!(doc.inner_html(p), "abcdef");
        assert_eq!(range, Range::new(Boundary::new(p, 1), Boundary::new(p, 2)));
        assert_eq!(doc.text(doc.children(p)[1]), Some("bcd"));
    }

    #[test]
    fn collapsed_range_keeps_start_before_end() {
        let mut doc = Document::parse("<p>ab</p>");
        let p = doc.first_child(doc.root()).unwrap();
        let bookmark = Bookmark::create(&mut doc, Range::collapsed(Boundary::new(p, 1)), 1).unwrap();
        assert_eq!(doc.index_of(bookmark.start), Some(1));
        assert_eq!(doc.index_of(bookmark.end), Some(2));
        let range = bookmark.restore(&mut doc).unwrap();
        assert!(range.is_collapsed());
    }
}
