//! Bounded undo/redo history of whole-state values.

use std::collections::VecDeque;

/// Undo/redo history holding prior states rather than inverse commands.
///
/// The caller pushes the state it is about to replace. `undo` and `redo`
/// take the current state and hand back the one to switch to, so the two
/// stacks always mirror each other.
#[derive(Debug, Clone)]
pub struct UndoStack<T> {
    /// Earlier states (most recent last).
    undo: VecDeque<T>,
    /// States undone from (most recent last).
    redo: Vec<T>,
    max_depth: usize,
}

impl<T> UndoStack<T> {
    /// Create a history keeping at most `max_depth` undo steps.
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record the state that a successful action replaced.
    /// Clears the redo stack.
    pub fn push(&mut self, previous: T) {
        self.redo.clear();
        self.undo.push_back(previous);
        while self.undo.len() > self.max_depth {
            self.undo.pop_front();
        }
    }

    /// Step back. `current` moves onto the redo stack.
    pub fn undo(&mut self, current: T) -> Option<T> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current);
        Some(previous)
    }

    /// Step forward again. `current` moves back onto the undo stack.
    pub fn redo(&mut self, current: T) -> Option<T> {
        let next = self.redo.pop()?;
        self.undo.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Clear all history.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn undo_count(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo.len()
    }
}

impl<T> Default for UndoStack<T> {
    fn default() -> Self {
        Self::new(100)
    }
}
