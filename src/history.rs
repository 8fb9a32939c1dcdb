// Bounded undo/redo stacks of full-buffer snapshots.
// Newest entries live at the back; once a stack is over its depth the front
// (oldest) entry is dropped, which frees its pixels right away.

use crate::types::Snapshot;
use std::collections::VecDeque;
use tracing::trace;

/// Depth used when no config says otherwise.
pub const MAX_STATES: usize = 10;

#[derive(Debug)]
pub struct History {
    undo: VecDeque<Snapshot>,
    redo: VecDeque<Snapshot>,
    max_states: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(MAX_STATES)
    }
}

impl History {
    /// `max_states` is clamped to at least 1.
    pub fn new(max_states: usize) -> Self {
        let max_states = max_states.max(1);
        Self {
            undo: VecDeque::with_capacity(max_states + 1),
            redo: VecDeque::with_capacity(max_states + 1),
            max_states,
        }
    }

    pub fn max_states(&self) -> usize {
        self.max_states
    }

    /// Push onto undo, evicting the oldest entry if the stack is full.
    /// Returns the evicted snapshot, if any.
    pub fn push_undo(&mut self, snapshot: Snapshot) -> Option<Snapshot> {
        push_bounded(&mut self.undo, snapshot, self.max_states)
    }

    /// Same as `push_undo`, for the redo stack.
    pub fn push_redo(&mut self, snapshot: Snapshot) -> Option<Snapshot> {
        push_bounded(&mut self.redo, snapshot, self.max_states)
    }

    /// Record a new forward action: push onto undo and forget every redo state.
    pub fn record(&mut self, snapshot: Snapshot) {
        self.push_undo(snapshot);
        self.clear_redo();
    }

    pub fn pop_undo(&mut self) -> Option<Snapshot> {
        self.undo.pop_back()
    }

    pub fn pop_redo(&mut self) -> Option<Snapshot> {
        self.redo.pop_back()
    }

    /// The snapshot the next `pop_undo` would return.
    pub fn peek_undo(&self) -> Option<&Snapshot> {
        self.undo.back()
    }

    pub fn peek_redo(&self) -> Option<&Snapshot> {
        self.redo.back()
    }

    pub fn clear_redo(&mut self) {
        if !self.redo.is_empty() {
            trace!(dropped = self.redo.len(), "redo stack cleared");
        }
        self.redo.clear();
    }

    /// Drop every snapshot on both stacks.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        // give the deque storage back too, not just the snapshots
        self.undo.shrink_to_fit();
        self.redo.shrink_to_fit();
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Undo entries from oldest to newest.
    pub fn undo_iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.undo.iter()
    }

    /// Redo entries from oldest to newest.
    pub fn redo_iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.redo.iter()
    }

    /// Pixel bytes held across both stacks.
    pub fn memory_bytes(&self) -> usize {
        self.undo.iter().chain(self.redo.iter()).map(Snapshot::byte_size).sum()
    }
}

fn push_bounded(
    stack: &mut VecDeque<Snapshot>,
    snapshot: Snapshot,
    max: usize,
) -> Option<Snapshot> {
    stack.push_back(snapshot);
    if stack.len() > max {
        let evicted = stack.pop_front();
        trace!(max, "history full, oldest snapshot evicted");
        return evicted;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PixelBuffer;

    fn snap(tag: u32) -> Snapshot {
        Snapshot::capture(&PixelBuffer::filled(2, 2, tag))
    }

    fn tag(s: &Snapshot) -> u32 {
        s.buffer().get(0, 0).unwrap()
    }

    #[test]
    fn eleventh_push_evicts_exactly_the_oldest() {
        let mut h = History::default();
        for i in 0..10 {
            assert!(h.push_undo(snap(i)).is_none());
        }
        let evicted = h.push_undo(snap(10)).expect("oldest evicted");
        assert_eq!(tag(&evicted), 0);
        assert_eq!(h.undo_len(), MAX_STATES);
        let tags: Vec<u32> = h.undo_iter().map(tag).collect();
        assert_eq!(tags, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn pops_are_newest_first() {
        let mut h = History::new(3);
        h.push_undo(snap(1));
        h.push_undo(snap(2));
        assert_eq!(h.pop_undo().map(|s| tag(&s)), Some(2));
        assert_eq!(h.pop_undo().map(|s| tag(&s)), Some(1));
        assert!(h.pop_undo().is_none());
    }

    #[test]
    fn peek_sees_what_pop_would_return() {
        let mut h = History::new(3);
        for i in 1..=3 {
            h.push_redo(snap(i));
        }
        assert_eq!(h.redo_iter().map(tag).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(h.peek_redo().map(tag), Some(3));
        assert_eq!(h.redo_len(), 3);
        assert_eq!(h.peek_undo(), None);

        h.push_undo(snap(9));
        assert_eq!(h.peek_undo().map(tag), Some(9));
        assert_eq!(h.pop_undo().map(|s| tag(&s)), Some(9));
    }

    #[test]
    fn record_clears_redo() {
        let mut h = History::new(3);
        h.push_redo(snap(1));
        h.push_redo(snap(2));
        assert!(h.can_redo());
        h.record(snap(3));
        assert!(!h.can_redo());
        assert_eq!(h.undo_len(), 1);
    }

    #[test]
    fn redo_stack_is_bounded_too() {
        let mut h = History::new(2);
        h.push_redo(snap(1));
        h.push_redo(snap(2));
        assert_eq!(h.push_redo(snap(3)).map(|s| tag(&s)), Some(1));
        assert_eq!(h.redo_len(), 2);
    }

    #[test]
    fn clear_and_memory_accounting() {
        let mut h = History::new(4);
        h.push_undo(snap(1));
        h.push_redo(snap(2));
        // two 2x2 buffers of u32
        assert_eq!(h.memory_bytes(), 32);
        h.clear();
        assert_eq!((h.undo_len(), h.redo_len(), h.memory_bytes()), (0, 0, 0));
    }

    #[test]
    fn zero_depth_is_clamped() {
        let mut h = History::new(0);
        h.push_undo(snap(1));
        assert_eq!(h.push_undo(snap(2)).map(|s| tag(&s)), Some(1));
        assert_eq!(h.max_states(), 1);
    }
}
