//! Snapshot-based undo/redo history.

use std::collections::VecDeque;
use std::rc::Rc;

/// Default number of undo states to keep.
pub const DEFAULT_MAX_UNDO_HISTORY: usize = 50;

/// Undo/redo stacks of whole-value snapshots.
///
/// Snapshots are shared, so cloning a history copies pointers, not values.
#[derive(Debug, Clone, PartialEq)]
pub struct History<T> {
    undo_stack: VecDeque<Rc<T>>,
    redo_stack: Vec<Rc<T>>,
    max_depth: usize,
}

impl<T: Clone> Default for History<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO_HISTORY)
    }
}

impl<T: Clone> History<T> {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_depth,
        }
    }

    /// Record the state as it was before a change. Clears the redo stack.
    pub fn record(&mut self, before: T) {
        if self.max_depth == 0 {
            return;
        }
        self.undo_stack.push_back(Rc::new(before));
        self.redo_stack.clear();
        while self.undo_stack.len() > self.max_depth {
            self.undo_stack.pop_front();
        }
    }

    /// Step back. `current` is moved to the redo stack and the previous
    /// snapshot is returned, or `None` when there is nothing to undo.
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.undo_stack.pop_back()?;
        self.redo_stack.push(Rc::new(current));
        Some(Rc::unwrap_or_clone(previous))
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.redo_stack.pop()?;
        self.undo_stack.push_back(Rc::new(current));
        Some(Rc::unwrap_or_clone(next))
    }

    /// Whether there is a snapshot to step back to.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Whether an undone step can be replayed.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}
