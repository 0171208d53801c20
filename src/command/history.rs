// History - Bounded undo/redo stacks of project snapshots

use crate::constants::DEFAULT_HISTORY_DEPTH;
use crate::project::types::ProjectData;
use std::collections::VecDeque;

/// Full copy of the project taken before an action
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub state: ProjectData,
    /// Action the snapshot was taken for, e.g. "Add note"
    pub description: String,
}

impl Snapshot {
    pub fn new(state: ProjectData, description: impl Into<String>) -> Self {
        Self {
            state,
            description: description.into(),
        }
    }
}

/// Undo and redo stacks
///
/// The most recent snapshot is at the back of each stack. When the undo
/// stack grows past `max_history` the oldest snapshot is dropped. Taking a
/// new snapshot clears the redo stack.
#[derive(Debug)]
pub struct History {
    undo_stack: VecDeque<Snapshot>,
    redo_stack: VecDeque<Snapshot>,
    max_history: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_DEPTH)
    }

    /// History keeping at most `max_history` snapshots per stack (at least 1)
    pub fn with_capacity(max_history: usize) -> Self {
        let max_history = max_history.max(1);
        Self {
            undo_stack: VecDeque::with_capacity(max_history),
            redo_stack: VecDeque::with_capacity(max_history),
            max_history,
        }
    }

    /// Record a snapshot for a new action; the redo stack is cleared
    pub fn push(&mut self, snapshot: Snapshot) {
        self.redo_stack.clear();
        push_bounded(&mut self.undo_stack, snapshot, self.max_history);
    }

    pub fn pop_undo(&mut self) -> Option<Snapshot> {
        self.undo_stack.pop_back()
    }

    pub fn pop_redo(&mut self) -> Option<Snapshot> {
        self.redo_stack.pop_back()
    }

    /// Push onto the undo stack without touching redo (used by redo)
    pub fn push_undo(&mut self, snapshot: Snapshot) {
        push_bounded(&mut self.undo_stack, snapshot, self.max_history);
    }

    /// Push onto the redo stack (used by undo)
    pub fn push_redo(&mut self, snapshot: Snapshot) {
        push_bounded(&mut self.redo_stack, snapshot, self.max_history);
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|s| s.description.as_str())
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|s| s.description.as_str())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

fn push_bounded(stack: &mut VecDeque<Snapshot>, snapshot: Snapshot, max: usize) {
    stack.push_back(snapshot);
    while stack.len() > max {
        stack.pop_front();
    }
}
