//! Accepting, rejecting and summarizing tracked changes.

use crate::batch::ChangeId;
use crate::change::{ChangeModel, ChangeType, RegionAuthor};
use crate::error::TrackResult;
use html::{Document, NodeId};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Accept,
    Reject,
}

/// Applies `resolution` to one region: its content either stays (marker unwrapped)
/// or goes with it.
pub fn resolve_region(
    doc: &mut Document,
    model: ChangeModel<'_>,
    region: NodeId,
    resolution: Resolution,
) -> TrackResult<()> {
    let Some(change_type) = model.change_type_of(doc, region) else {
        return Ok(());
    };
    let keep = matches!(
        (change_type, resolution),
        (ChangeType::Insert, Resolution::Accept) | (ChangeType::Delete, Resolution::Reject)
    );
    if keep {
        doc.unwrap(region)?;
    } else {
        doc.detach(region);
    }
    Ok(())
}

/// Resolves the logical change containing `node`: every region sharing its change
/// id, or only the enclosing region when it carries no id. Returns how many
/// regions were resolved.
pub fn resolve_change(
    doc: &mut Document,
    root: NodeId,
    model: ChangeModel<'_>,
    node: NodeId,
    resolution: Resolution,
) -> TrackResult<usize> {
    let Some(region) = model.enclosing_change_node(doc, root, node, None) else {
        return Ok(0);
    };
    let regions = match model.change_id(doc, region) {
        Some(change_id) => model
            .change_nodes(doc, root, None)
            .into_iter()
            .filter(|n| model.change_id(doc, *n) == Some(change_id))
            .collect(),
        None => vec![region],
    };
    let resolved = resolve_attached(doc, root, model, regions, resolution)?;
    doc.normalize(root);
    Ok(resolved)
}

/// Resolves every region under `root` and merges the text it leaves fragmented.
pub fn resolve_all(
    doc: &mut Document,
    root: NodeId,
    model: ChangeModel<'_>,
    resolution: Resolution,
) -> TrackResult<usize> {
    let regions = model.change_nodes(doc, root, None);
    let resolved = resolve_attached(doc, root, model, regions, resolution)?;
    doc.normalize(root);
    log::debug!(target: "track.review", "{resolution:?}ed {resolved} regions");
    Ok(resolved)
}

/// Resolves `regions` in document order, skipping those an earlier
/// resolution already removed from the tree.
fn resolve_attached(
    doc: &mut Document,
    root: NodeId,
    model: ChangeModel<'_>,
    regions: Vec<NodeId>,
    resolution: Resolution,
) -> TrackResult<usize> {
    let mut resolved = 0;
    for region in regions {
        if region == root || !doc.contains(root, region) {
            continue;
        }
        resolve_region(doc, model, region, resolution)?;
        resolved += 1;
    }
    Ok(resolved)
}

/// Markup of `root` with every change accepted, computed on a copy.
///
/// `before` and `after` run on the copy around the cleanup.
pub fn clean_content<B, A>(
    doc: &Document,
    root: NodeId,
    model: ChangeModel<'_>,
    before: B,
    after: A,
) -> TrackResult<String>
where
    B: FnOnce(&mut Document, NodeId),
    A: FnOnce(&mut Document, NodeId),
{
    let mut scratch = doc.clone();
    before(&mut scratch, root);
    resolve_all(&mut scratch, root, model, Resolution::Accept)?;
    after(&mut scratch, root);
    Ok(scratch.inner_html(root))
}

/// Markup with every change accepted, parsed from `html` instead of a live tree.
pub fn clean_html(html: &str, model: ChangeModel<'_>) -> TrackResult<String> {
    let doc = Document::parse(html);
    let root = doc.root();
    clean_content(&doc, root, model, |_, _| {}, |_, _| {})
}

/// One logical change as seen by a reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSummary {
    pub change_id: Option<ChangeId>,
    pub change_type: &'static str,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub time: Option<i64>,
    pub text: String,
    pub regions: usize,
}

impl ChangeSummary {
    fn new(change_type: ChangeType, author: RegionAuthor) -> Self {
        Self {
            change_id: author.change_id,
            change_type: match change_type {
                ChangeType::Insert => "insert",
                ChangeType::Delete => "delete",
            },
            user_id: author.user_id,
            user_name: author.user_name,
            time: author.time,
            text: String::new(),
            regions: 0,
        }
    }
}

/// Logical changes under `root` in order of first appearance, one entry per
/// change id and type. Regions without an id are listed individually.
pub fn list_changes(doc: &Document, root: NodeId, model: ChangeModel<'_>) -> Vec<ChangeSummary> {
    let mut out: Vec<ChangeSummary> = Vec::new();
    let mut keys: Vec<Option<(ChangeId, ChangeType)>> = Vec::new();
    for region in model.change_nodes(doc, root, None) {
        let Some(change_type) = model.change_type_of(doc, region) else {
            continue;
        };
        let author = model.region_author(doc, region);
        let key = author.change_id.map(|id| (id, change_type));
        let index = match key.and_then(|key| keys.iter().position(|k| *k == Some(key))) {
            Some(index) => index,
            None => {
                keys.push(key);
                out.push(ChangeSummary::new(change_type, author));
                out.len() - 1
            }
        };
        let summary = &mut out[index];
        summary.text.push_str(&doc.text_content(region));
        summary.regions += 1;
    }
    out
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeCounts {
    pub inserts: usize,
    pub deletes: usize,
}

pub fn count_changes(doc: &Document, root: NodeId, model: ChangeModel<'_>) -> ChangeCounts {
    let mut counts = ChangeCounts::default();
    for region in model.change_nodes(doc, root, None) {
        match model.change_type_of(doc, region) {
            Some(ChangeType::Insert) => counts.inserts += 1,
            Some(ChangeType::Delete) => counts.deletes += 1,
            None => {}
        }
    }
    counts
}
