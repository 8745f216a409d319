//! Change tracking for rich-text editing on an in-memory DOM.
//!
//! Edits made through [`ChangeEditor`] are recorded in the markup itself: inserted
//! content is wrapped in insert regions and deleted content is kept inside delete
//! regions, each carrying its author, time and change id. Reviewers later accept
//! or reject the changes.

pub mod batch;
pub mod bookmark;
pub mod change;
pub mod config;
mod delete;
mod edit;
pub mod editor;
pub mod error;
pub mod events;
pub mod insert;
pub mod placeholder;
pub mod plugin;
pub mod plugins;
pub mod range;
pub mod review;
pub mod selection;

pub use crate::batch::{ChangeId, ChangeState, ChangeTracker};
pub use crate::change::{ChangeModel, ChangeType, RegionAuthor};
pub use crate::config::{ChangeTypeConfig, ChangeTypes, PluginSpec, TrackerConfig, User};
pub use crate::editor::ChangeEditor;
pub use crate::error::{TrackError, TrackResult};
pub use crate::events::{EditorEvent, EventKind, InputEvent, KeyEvent, key_combo};
pub use crate::insert::Content;
pub use crate::placeholder::PlaceholderStash;
pub use crate::plugin::{Plugin, PluginContext, PluginRegistry};
pub use crate::plugins::AddTitlePlugin;
pub use crate::range::{Boundary, Range, RangeWalker};
pub use crate::review::{ChangeCounts, ChangeSummary, Resolution};
pub use crate::selection::Selection;
