//! Change id allocation and the open-change state machine.
//!
//! Consecutive edits at the same caret share one change id. A batch pins the id
//! for every edit until the outermost `end_batch`.

use crate::range::Boundary;

pub type ChangeId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeState {
    Idle,
    /// The last edit left the caret at `caret`; an edit starting there continues `change_id`.
    Open { change_id: ChangeId, caret: Boundary },
    Batch { change_id: ChangeId, depth: usize },
}

#[derive(Debug, Clone)]
pub struct ChangeTracker {
    state: ChangeState,
    next_id: ChangeId,
}

impl ChangeTracker {
    /// `first_id` is the first id handed out; ids below it are considered taken.
    pub fn new(first_id: ChangeId) -> Self {
        Self {
            state: ChangeState::Idle,
            next_id: first_id.max(1),
        }
    }

    pub fn state(&self) -> ChangeState {
        self.state
    }

    /// The id an edit would extend right now, if any.
    pub fn active(&self) -> Option<ChangeId> {
        match self.state {
            ChangeState::Idle => None,
            ChangeState::Open { change_id, .. } | ChangeState::Batch { change_id, .. } => {
                Some(change_id)
            }
        }
    }

    pub fn in_batch(&self) -> bool {
        matches!(self.state, ChangeState::Batch { .. })
    }

    fn allocate(&mut self) -> ChangeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Picks the change id for an edit starting at `caret`.
    pub fn begin_edit(&mut self, caret: Boundary) -> ChangeId {
        match self.state {
            ChangeState::Batch { change_id, .. } => change_id,
            ChangeState::Open {
                change_id,
                caret: open,
            } if open == caret => change_id,
            _ => {
                let id = self.allocate();
                log::trace!(target: "track.batch", "opened change {id}");
                self.state = ChangeState::Open { change_id: id, caret };
                id
            }
        }
    }

    /// Records where the edit left the caret so the next edit there can continue it.
    pub fn finish_edit(&mut self, change_id: ChangeId, caret: Boundary) {
        if self.in_batch() {
            return;
        }
        self.state = ChangeState::Open { change_id, caret };
    }

    /// Opens (or re-enters) a batch and returns its id.
    pub fn start_batch(&mut self) -> ChangeId {
        match self.state {
            ChangeState::Batch { change_id, depth } => {
                self.state = ChangeState::Batch {
                    change_id,
                    depth: depth + 1,
                };
                change_id
            }
            _ => {
                let change_id = self.allocate();
                log::debug!(target: "track.batch", "started batch {change_id}");
                self.state = ChangeState::Batch {
                    change_id,
                    depth: 1,
                };
                change_id
            }
        }
    }

    /// Leaves one batch level. Returns true when the batch actually closed.
    pub fn end_batch(&mut self, id: ChangeId) -> bool {
        match self.state {
            ChangeState::Batch { change_id, depth } if change_id == id => {
                if depth > 1 {
                    self.state = ChangeState::Batch {
                        change_id,
                        depth: depth - 1,
                    };
                    false
                } else {
                    log::debug!(target: "track.batch", "ended batch {change_id}");
                    self.state = ChangeState::Idle;
                    true
                }
            }
            ChangeState::Batch { change_id, .. } => {
                log::warn!(
                    target: "track.batch",
                    "end_batch({id}) does not match open batch {change_id}; ignored"
                );
                false
            }
            _ => {
                log::warn!(target: "track.batch", "end_batch({id}) without an open batch");
                false
            }
        }
    }

    /// Drops an open change; batches are left alone.
    pub fn close(&mut self) {
        if let ChangeState::Open { change_id, .. } = self.state {
            log::trace!(target: "track.batch", "closed change {change_id}");
            self.state = ChangeState::Idle;
        }
    }
}
