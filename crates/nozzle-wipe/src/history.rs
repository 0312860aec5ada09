//! Bounded trail of recent positions with one level of undo.

use std::collections::VecDeque;

use crate::position::WipePosition;

/// Ordered window of wipeable positions, oldest first.
///
/// Holds at most one saved snapshot; saving again replaces it.
#[derive(Debug, Clone, Default)]
pub struct PositionHistory {
    entries: VecDeque<WipePosition>,
    snapshot: Option<VecDeque<WipePosition>>,
}

impl PositionHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a position at the newest end.
    pub fn push_back(&mut self, position: WipePosition) {
        self.entries.push_back(position);
    }

    /// Oldest entry, if any.
    pub fn peek(&self) -> Option<&WipePosition> {
        self.entries.front()
    }

    /// Newest entry, if any.
    pub fn newest(&self) -> Option<&WipePosition> {
        self.entries.back()
    }

    /// Remove and return the oldest entry.
    pub fn remove_oldest(&mut self) -> Option<WipePosition> {
        self.entries.pop_front()
    }

    /// Drop every entry. The saved snapshot is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the window is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &WipePosition> {
        self.entries.iter()
    }

    /// All entries oldest first, together with the index of the entry the
    /// wipe turns around at (the one adjacent to the anchor).
    ///
    /// Pruning only ever removes from the front, so that entry is always
    /// the oldest and the index is always 0.
    pub fn all_with_anchor_index(&self) -> (Vec<WipePosition>, usize) {
        let (front, back) = self.entries.as_slices();
        let mut all = Vec::with_capacity(self.entries.len());
        all.extend_from_slice(front);
        all.extend_from_slice(back);
        (all, 0)
    }

    /// Remember the current entries so [`restore_snapshot`](Self::restore_snapshot)
    /// can bring them back.
    pub fn save_snapshot(&mut self) {
        self.snapshot = Some(self.entries.clone());
    }

    /// Restore the saved entries. Returns `false` if there was nothing saved.
    pub fn restore_snapshot(&mut self) -> bool {
        match self.snapshot.take() {
            Some(entries) => {
                self.entries = entries;
                true
            }
            None => false,
        }
    }

    /// Whether a snapshot is waiting to be restored.
    pub fn has_snapshot(&self) -> bool {
        self.snapshot.is_some()
    }
}
