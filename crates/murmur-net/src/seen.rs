//! Duplicate suppression for flooded actions.

use std::collections::{HashSet, VecDeque};
use std::num::NonZeroUsize;

use murmur_core::ActionHash;

/// Set of action hashes a node has already processed.
///
/// With no capacity the set grows without bound, matching the base
/// design; with a capacity, the oldest entries are evicted FIFO once the
/// bound is reached. Evicting a hash means a late re-delivery of that
/// action would be treated as novel again, so the capacity should exceed
/// the number of actions plausibly still in flight.
pub struct SeenSet {
    capacity: Option<NonZeroUsize>,
    hashes: HashSet<ActionHash>,
    order: VecDeque<ActionHash>,
}

impl SeenSet {
    /// Create a seen-set with the given retention bound (None = unbounded).
    pub fn new(capacity: Option<NonZeroUsize>) -> Self {
        Self {
            capacity,
            hashes: HashSet::new(),
            order: VecDeque::new(),
        }
    }

    /// Record a hash. Returns false if it was already present.
    pub fn insert(&mut self, hash: ActionHash) -> bool {
        if !self.hashes.insert(hash) {
            return false;
        }
        self.order.push_back(hash);
        if let Some(cap) = self.capacity {
            while self.order.len() > cap.get() {
                if let Some(oldest) = self.order.pop_front() {
                    self.hashes.remove(&oldest);
                }
            }
        }
        true
    }

    /// Check whether a hash has been recorded.
    pub fn contains(&self, hash: &ActionHash) -> bool {
        self.hashes.contains(hash)
    }

    /// Number of hashes currently retained.
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// True if no hashes are retained.
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}
