//! Bounded snapshot history.
//!
//! Every significant mutation appends a full copy of the document. A
//! cursor marks the snapshot currently shown; undo/redo only move the
//! cursor. Appending after an undo discards everything past the cursor.
//! When the list outgrows its limit the oldest snapshot is evicted.

use chrono::{DateTime, Utc};

/// One entry in the history list.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub state: T,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct History<T> {
    entries: Vec<Snapshot<T>>,
    /// Index of the current snapshot; meaningless while `entries` is empty.
    cursor: usize,
    limit: usize,
}

impl<T: Clone> History<T> {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::with_capacity(limit.min(64)),
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Append a snapshot after the cursor and make it current.
    pub fn push(&mut self, state: T, description: impl Into<String>, timestamp: DateTime<Utc>) {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        let description = description.into();
        log::debug!("history push: {description}");
        self.entries.push(Snapshot {
            state,
            description,
            timestamp,
        });
        if self.entries.len() > self.limit {
            self.entries.remove(0);
        }
        self.cursor = self.entries.len() - 1;
    }

    /// Step back one snapshot. `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<&Snapshot<T>> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Step forward one snapshot. `None` at the newest entry.
    pub fn redo(&mut self) -> Option<&Snapshot<T>> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    pub fn current(&self) -> Option<&Snapshot<T>> {
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.cursor
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn entries(&self) -> &[Snapshot<T>] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn pushed(n: usize, limit: usize) -> History<usize> {
        let mut h = History::new(limit);
        for i in 0..n {
            h.push(i, format!("step {i}"), DateTime::default());
        }
        h
    }

    #[test]
    fn overflow_evicts_oldest() {
        let h = pushed(60, 50);
        assert_eq!(h.len(), 50);
        assert_eq!(h.index(), 49);
        assert_eq!(h.entries()[0].state, 10);
        assert_eq!(h.current().map(|s| s.state), Some(59));
    }

    #[test]
    fn undo_redo_move_cursor_only() {
        let mut h = pushed(3, 50);
        assert_eq!(h.undo().map(|s| s.state), Some(1));
        assert_eq!(h.undo().map(|s| s.state), Some(0));
        assert!(h.undo().is_none());
        assert_eq!(h.index(), 0);
        assert_eq!(h.len(), 3);
        assert_eq!(h.redo().map(|s| s.state), Some(1));
        assert_eq!(h.redo().map(|s| s.state), Some(2));
        assert!(h.redo().is_none());
        assert_eq!(h.index(), 2);
    }

    #[test]
    fn push_after_undo_truncates_future() {
        let mut h = pushed(4, 50);
        h.undo();
        h.undo();
        h.push(99, "branch", DateTime::default());
        let states: Vec<usize> = h.entries().iter().map(|s| s.state).collect();
        assert_eq!(states, vec![0, 1, 99]);
        assert!(!h.can_redo());
        assert_eq!(h.current().map(|s| s.description.as_str()), Some("branch"));
    }

    #[test]
    fn empty_history_cannot_move() {
        let mut h: History<u8> = History::new(5);
        assert!(h.is_empty());
        assert!(!h.can_undo());
        assert!(!h.can_redo());
        assert!(h.undo().is_none());
        assert!(h.redo().is_none());
        assert!(h.current().is_none());
    }

    #[test]
    fn zero_limit_keeps_one_entry() {
        let h = pushed(3, 0);
        assert_eq!(h.len(), 1);
        assert_eq!(h.current().map(|s| s.state), Some(2));
    }
}
