//! Ordered pool of free IDs

use std::collections::HashMap;

use super::range_spec::RangeSpec;

/// Which end of the pool IDs are drawn from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Lowest free ID first
    #[default]
    Ascending,
    /// Highest free ID first
    Descending,
}

impl Direction {
    pub fn from_start_high(start_high: bool) -> Self {
        if start_high {
            Direction::Descending
        } else {
            Direction::Ascending
        }
    }
}

/// Ascending set of IDs with removal from either end and by value
///
/// Backed by a sorted vector, a presence flag per slot and a value index.
/// Removed slots are skipped lazily by the end cursors, so every operation is
/// O(1) amortized.
#[derive(Debug, Clone, Default)]
pub struct IdPool {
    /// Sorted, duplicate-free IDs
    ids: Vec<u32>,
    /// Whether `ids[i]` is still available
    present: Vec<bool>,
    /// ID -> slot in `ids`
    index: HashMap<u32, usize>,
    /// First slot that may still be present
    head: usize,
    /// One past the last slot that may still be present
    tail: usize,
    remaining: usize,
}

impl IdPool {
    /// Build a pool holding every ID of `spec`
    pub fn from_spec(spec: &RangeSpec) -> Self {
        Self::from_sorted(spec.ids())
    }

    /// Build a pool from arbitrary IDs (sorted and deduplicated here)
    pub fn from_ids(ids: impl IntoIterator<Item = u32>) -> Self {
        let mut ids: Vec<u32> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self::from_sorted(ids)
    }

    fn from_sorted(ids: Vec<u32>) -> Self {
        let index = ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
        let len = ids.len();
        Self {
            present: vec![true; len],
            ids,
            index,
            head: 0,
            tail: len,
            remaining: len,
        }
    }

    /// Remove and return the lowest remaining ID
    pub fn pop_front(&mut self) -> Option<u32> {
        while self.head < self.tail && !self.present[self.head] {
            self.head += 1;
        }
        if self.head == self.tail {
            return None;
        }
        let slot = self.head;
        self.head += 1;
        self.take(slot)
    }

    /// Remove and return the highest remaining ID
    pub fn pop_back(&mut self) -> Option<u32> {
        while self.tail > self.head && !self.present[self.tail - 1] {
            self.tail -= 1;
        }
        if self.tail == self.head {
            return None;
        }
        self.tail -= 1;
        self.take(self.tail)
    }

    /// Remove and return the next ID in `direction`
    pub fn pop(&mut self, direction: Direction) -> Option<u32> {
        match direction {
            Direction::Ascending => self.pop_front(),
            Direction::Descending => self.pop_back(),
        }
    }

    /// Remove `id` if it is still in the pool
    ///
    /// Returns whether anything was removed.
    pub fn discard(&mut self, id: u32) -> bool {
        match self.index.get(&id) {
            Some(&slot) if self.present[slot] => self.take(slot).is_some(),
            _ => false,
        }
    }

    pub fn contains(&self, id: u32) -> bool {
        self.index.get(&id).is_some_and(|&slot| self.present[slot])
    }

    /// Number of IDs still available
    pub fn len(&self) -> usize {
        self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    fn take(&mut self, slot: usize) -> Option<u32> {
        if !self.present[slot] {
            return None;
        }
        self.present[slot] = false;
        self.remaining -= 1;
        Some(self.ids[slot])
    }
}
