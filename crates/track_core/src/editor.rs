//! The engine facade a host drives: one editable root, its selection, the open
//! change and the active plugins.

use crate::batch::{ChangeId, ChangeTracker};
use crate::change::ChangeModel;
use crate::config::{TrackerConfig, User};
use crate::edit::{EditSession, end_of_content};
use crate::error::{TrackError, TrackResult};
use crate::events::{
    EditorEvent, EventKind, InputEvent, KEY_BACKSPACE, KEY_DELETE, KeyEvent, key_combo,
};
use crate::insert::Content;
use crate::placeholder::PlaceholderStash;
use crate::plugin::{PluginContext, PluginHost, PluginRegistry};
use crate::range::{Boundary, Range, RangeWalker, compare_boundaries};
use crate::review::{
    self, ChangeCounts, ChangeSummary, Resolution, resolve_all, resolve_change, resolve_region,
};
use crate::selection::Selection;
use html::{Document, NodeId};
use std::cmp::Ordering;

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub struct ChangeEditor {
    doc: Document,
    root: NodeId,
    config: TrackerConfig,
    tracker: ChangeTracker,
    selection: Selection,
    plugins: PluginHost,
    placeholders: Option<PlaceholderStash>,
    composing: bool,
    clock: fn() -> i64,
}

impl ChangeEditor {
    /// Attaches an engine to `root` inside `doc`.
    ///
    /// Fails on an invalid configuration, an unknown plugin or plugin settings
    /// the plugin rejects. An empty root receives a `blockElement` with the
    /// caret inside it.
    pub fn new(
        mut doc: Document,
        root: NodeId,
        config: TrackerConfig,
        registry: &PluginRegistry,
    ) -> TrackResult<Self> {
        config.validate()?;
        if !doc.allows_children(root) || doc.is_stub(root) {
            return Err(TrackError::OutsideRoot);
        }
        let plugins = PluginHost::from_specs(registry, &config.plugins)?;
        let mut selection = Selection::new();
        if doc.child_count(root) == 0 {
            let block = doc.create_element(&config.block_element);
            doc.append_child(root, block)?;
            selection.collapse(&doc, root, Boundary::new(block, 0));
        }
        let first_id = ChangeModel::new(&config)
            .max_change_id(&doc, root)
            .map_or(1, |id| id + 1);
        let mut editor = Self {
            doc,
            root,
            config,
            tracker: ChangeTracker::new(first_id),
            selection,
            plugins,
            placeholders: None,
            composing: false,
            clock: now_millis,
        };
        editor.notify(|plugins, ctx| plugins.start(ctx));
        log::debug!(
            target: "track.editor",
            "editor ready: tracking={} plugins={:?} first change id {first_id}",
            editor.config.is_tracking,
            editor.plugins.names()
        );
        Ok(editor)
    }

    /// Parses `html` and attaches to the fragment holding it.
    pub fn from_html(
        html: &str,
        config: TrackerConfig,
        registry: &PluginRegistry,
    ) -> TrackResult<Self> {
        let doc = Document::parse(html);
        let root = doc.root();
        Self::new(doc, root, config, registry)
    }

    /// Replaces the timestamp source written onto new regions.
    pub fn set_clock(&mut self, clock: fn() -> i64) {
        self.clock = clock;
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Direct access to the tree. Mutations made here are untracked, so the
    /// open change is closed.
    pub fn document_mut(&mut self) -> &mut Document {
        self.tracker.close();
        &mut self.doc
    }

    pub fn into_document(self) -> Document {
        self.doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn html(&self) -> String {
        self.doc.inner_html(self.root)
    }

    pub fn walker(&self) -> RangeWalker<'_> {
        RangeWalker::new(&self.doc, self.root)
    }

    pub fn selection(&self) -> Option<Range> {
        self.selection.range()
    }

    pub fn set_selection(&mut self, range: Range) -> bool {
        let accepted = self.selection.add_range(&self.doc, self.root, range);
        let current = self.selection.range();
        self.notify(|plugins, ctx| plugins.selection_changed(ctx, current));
        accepted
    }

    pub fn collapse_selection(&mut self, at: Boundary) -> bool {
        self.set_selection(Range::collapsed(at))
    }

    /// Collapses the selection at the end of the root's content.
    pub fn select_end(&mut self) -> bool {
        let end = end_of_content(&self.doc, self.root);
        self.collapse_selection(end)
    }

    /// Shifts both ends of the selection by `units` characters and collapses it there.
    pub fn move_caret(&mut self, units: isize) -> bool {
        let Some(range) = self.selection.range() else {
            return false;
        };
        let at = if units < 0 { range.start } else { range.end };
        match self.walker().move_boundary(at, units, false) {
            Some(moved) => self.collapse_selection(moved),
            None => false,
        }
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.names()
    }

    fn notify<R>(&mut self, hook: impl FnOnce(&mut PluginHost, &mut PluginContext<'_>) -> R) -> R {
        let mut ctx = PluginContext {
            doc: &mut self.doc,
            root: self.root,
            config: &self.config,
        };
        hook(&mut self.plugins, &mut ctx)
    }

    fn session(&mut self) -> EditSession<'_> {
        let time = (self.clock)();
        EditSession {
            doc: &mut self.doc,
            root: self.root,
            config: &self.config,
            tracker: &mut self.tracker,
            plugins: &mut self.plugins,
            time,
        }
    }

    /// The range an edit applies to: the given one in document order, or the selection.
    fn target(&self, range: Option<Range>) -> Option<Range> {
        let Some(range) = range else {
            return self.selection.range();
        };
        match compare_boundaries(&self.doc, range.start, range.end) {
            Some(Ordering::Greater) => Some(Range::new(range.end, range.start)),
            _ => Some(range),
        }
    }

    fn finish(&mut self, op: &str, result: TrackResult<Option<Boundary>>) -> bool {
        match result {
            Ok(Some(caret)) => {
                self.selection.collapse(&self.doc, self.root, caret);
                self.notify(|plugins, ctx| plugins.caret_positioned(ctx));
                true
            }
            Ok(None) => false,
            Err(err) => {
                log::warn!(target: "track.editor", "{op} failed: {err}");
                self.selection.revalidate(&self.doc, self.root);
                false
            }
        }
    }

    /// Inserts `content` at `range` (the selection when `None`), replacing a
    /// non-collapsed range. Returns false when nothing was inserted.
    pub fn insert(&mut self, content: impl Into<Content>, range: Option<Range>) -> bool {
        let Some(range) = self.target(range) else {
            log::debug!(target: "track.editor", "insert without a selection");
            return false;
        };
        let result = self.session().insert(content.into(), range);
        self.finish("insert", result)
    }

    /// Deletes `range` (the selection when `None`); a caret deletes one unit
    /// to the right when `move_right`, otherwise to the left.
    pub fn delete_contents(&mut self, move_right: bool, range: Option<Range>) -> bool {
        let Some(range) = self.target(range) else {
            log::debug!(target: "track.editor", "delete without a selection");
            return false;
        };
        let result = self.session().delete(move_right, range);
        self.finish("delete", result)
    }

    pub fn accept_change(&mut self, node: Option<NodeId>) -> bool {
        self.resolve(node, Resolution::Accept)
    }

    pub fn reject_change(&mut self, node: Option<NodeId>) -> bool {
        self.resolve(node, Resolution::Reject)
    }

    /// With a node, resolves its whole logical change; without one, the single
    /// region enclosing the selection start.
    fn resolve(&mut self, node: Option<NodeId>, resolution: Resolution) -> bool {
        self.tracker.close();
        let model = ChangeModel::new(&self.config);
        let result = match node {
            Some(node) if !self.doc.contains(self.root, node) => Err(TrackError::OutsideRoot),
            Some(node) => resolve_change(&mut self.doc, self.root, model, node, resolution),
            None => {
                let region = self.selection.range().and_then(|range| {
                    model.enclosing_change_node(&self.doc, self.root, range.start.node, None)
                });
                match region {
                    Some(region) => resolve_region(&mut self.doc, model, region, resolution)
                        .map(|()| {
                            self.doc.normalize(self.root);
                            1
                        }),
                    None => Ok(0),
                }
            }
        };
        self.selection.revalidate(&self.doc, self.root);
        match result {
            Ok(resolved) => {
                log::debug!(target: "track.editor", "{resolution:?}ed {resolved} regions");
                resolved > 0
            }
            Err(err) => {
                log::warn!(target: "track.editor", "{resolution:?} failed: {err}");
                false
            }
        }
    }

    pub fn accept_all(&mut self) -> bool {
        self.resolve_everything(Resolution::Accept)
    }

    pub fn reject_all(&mut self) -> bool {
        self.resolve_everything(Resolution::Reject)
    }

    fn resolve_everything(&mut self, resolution: Resolution) -> bool {
        self.tracker.close();
        let result = resolve_all(&mut self.doc, self.root, ChangeModel::new(&self.config), resolution);
        self.selection.revalidate(&self.doc, self.root);
        match result {
            Ok(_) => true,
            Err(err) => {
                log::warn!(target: "track.editor", "{resolution:?} all failed: {err}");
                false
            }
        }
    }

    /// Markup with every change accepted. `html` is cleaned instead of the live
    /// tree when given; the live tree is never modified.
    pub fn get_clean_content(&self, html: Option<&str>) -> TrackResult<String> {
        self.get_clean_content_with(html, |_, _| {}, |_, _| {})
    }

    /// Like [`get_clean_content`](Self::get_clean_content), running `before`
    /// and `after` on the detached copy around the cleanup.
    pub fn get_clean_content_with<B, A>(
        &self,
        html: Option<&str>,
        before: B,
        after: A,
    ) -> TrackResult<String>
    where
        B: FnOnce(&mut Document, NodeId),
        A: FnOnce(&mut Document, NodeId),
    {
        let model = ChangeModel::new(&self.config);
        match html {
            Some(html) => {
                let doc = Document::parse(html);
                let root = doc.root();
                review::clean_content(&doc, root, model, before, after)
            }
            None => review::clean_content(&self.doc, self.root, model, before, after),
        }
    }

    pub fn list_changes(&self) -> Vec<ChangeSummary> {
        review::list_changes(&self.doc, self.root, ChangeModel::new(&self.config))
    }

    pub fn count_changes(&self) -> ChangeCounts {
        review::count_changes(&self.doc, self.root, ChangeModel::new(&self.config))
    }

    /// Swaps delete regions for inert placeholders. Placeholding again first
    /// restores the previous set. Returns the number of placeholders.
    pub fn placehold_deletes(&mut self) -> usize {
        if self.placeholders.is_some() {
            self.revert_delete_placeholders();
        }
        self.tracker.close();
        let stash = PlaceholderStash::placehold(
            &mut self.doc,
            self.root,
            ChangeModel::new(&self.config),
            &self.config.placeholder_tag,
        );
        let count = stash.len();
        self.placeholders = Some(stash);
        self.selection.revalidate(&self.doc, self.root);
        count
    }

    /// Restores the regions taken by `placehold_deletes`. False when nothing was placeheld.
    pub fn revert_delete_placeholders(&mut self) -> bool {
        let Some(stash) = self.placeholders.take() else {
            return false;
        };
        let expected = stash.len();
        let restored = stash.revert(&mut self.doc);
        if restored != expected {
            log::warn!(target: "track.editor", "restored {restored} of {expected} delete regions");
        }
        self.selection.revalidate(&self.doc, self.root);
        true
    }

    /// Starts (or nests into) a batch; every edit until the matching
    /// `end_batch_change` shares the returned id.
    pub fn start_batch_change(&mut self) -> ChangeId {
        self.tracker.start_batch()
    }

    pub fn end_batch_change(&mut self, id: ChangeId) -> bool {
        self.tracker.end_batch(id)
    }

    pub fn current_user(&self) -> &User {
        &self.config.current_user
    }

    pub fn set_current_user(&mut self, user: User) {
        log::debug!(target: "track.editor", "current user is now {} ({})", user.name, user.id);
        self.config.current_user = user;
        self.tracker.close();
    }

    pub fn is_tracking(&self) -> bool {
        self.config.is_tracking
    }

    pub fn start_tracking(&mut self) {
        self.set_tracking(true);
    }

    pub fn stop_tracking(&mut self) {
        self.set_tracking(false);
    }

    fn set_tracking(&mut self, enabled: bool) {
        self.config.is_tracking = enabled;
        self.tracker.close();
        self.plugins.set_enabled(enabled);
        log::debug!(target: "track.editor", "tracking {}", if enabled { "on" } else { "off" });
    }

    /// Runs `Plugin::remove` on every active plugin and drops them.
    pub fn unload_plugins(&mut self) {
        self.notify(|plugins, ctx| plugins.remove_all(ctx));
    }

    /// Routes a host event. Returns true when the engine handled it, in which
    /// case the event's default is prevented.
    pub fn handle_event(&mut self, event: &mut EditorEvent) -> bool {
        match event.kind {
            EventKind::CompositionStart => {
                self.composing = true;
                return false;
            }
            EventKind::CompositionEnd => {
                self.composing = false;
                return false;
            }
            _ => {}
        }
        if self.composing || event.is_composing() {
            log::trace!(target: "track.editor", "composing; passing {:?} through", event.kind);
            return false;
        }
        if !self.config.is_tracking {
            return false;
        }
        let handled = match &event.kind {
            EventKind::KeyDown(key) => self.key_down(key),
            EventKind::KeyPress(key) => self.key_press(key),
            EventKind::BeforeInput(input) => self.before_input(input),
            EventKind::MouseDown => {
                self.tracker.close();
                self.notify(|plugins, ctx| plugins.mouse_down(ctx));
                false
            }
            EventKind::Click => {
                self.notify(|plugins, ctx| plugins.clicked(ctx));
                false
            }
            EventKind::SelectionChange => {
                let range = self.selection.range();
                self.notify(|plugins, ctx| plugins.selection_changed(ctx, range));
                false
            }
            EventKind::KeyUp(_) | EventKind::CompositionStart | EventKind::CompositionEnd => false,
        };
        if handled {
            event.prevent_default();
        }
        handled
    }

    fn key_down(&mut self, key: &KeyEvent) -> bool {
        if !self.notify(|plugins, ctx| plugins.key_down(ctx, key)) {
            return false;
        }
        if key.ctrl || key.meta || key.alt {
            let combo = key_combo(key);
            return self.notify(|plugins, ctx| plugins.key_combo(ctx, &combo));
        }
        match key.key_code {
            KEY_BACKSPACE => {
                self.delete_contents(false, None);
                true
            }
            KEY_DELETE => {
                self.delete_contents(true, None);
                true
            }
            _ if key.is_navigation() => {
                self.tracker.close();
                self.notify(|plugins, ctx| plugins.caret_updated(ctx));
                false
            }
            _ => false,
        }
    }

    fn key_press(&mut self, key: &KeyEvent) -> bool {
        if !self.notify(|plugins, ctx| plugins.key_press(ctx, key)) {
            return false;
        }
        match key.printable() {
            Some(text) => self.insert(text, None),
            None => false,
        }
    }

    fn before_input(&mut self, input: &InputEvent) -> bool {
        match input.input_type.as_str() {
            "insertText" => match input.data.as_deref() {
                Some(data) if !data.is_empty() => self.insert(data, None),
                _ => false,
            },
            "deleteContentBackward" => {
                self.delete_contents(false, None);
                true
            }
            "deleteContentForward" => {
                self.delete_contents(true, None);
                true
            }
            _ => false,
        }
    }
}
