use std::collections::VecDeque;

use super::pointer::{PointerId, PointsToSet};

/// Order in which pending entries are processed. The fixpoint does not
/// depend on it, only the intermediate states do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkListOrder {
    Fifo,
    Lifo,
}

impl Default for WorkListOrder {
    fn default() -> Self {
        WorkListOrder::Fifo
    }
}

/// A pending propagation: `pts` is about to flow into `pointer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub pointer: PointerId,
    pub pts: PointsToSet,
}

#[derive(Debug, Default)]
pub struct WorkList {
    entries: VecDeque<Entry>,
    order: WorkListOrder,
}

impl WorkList {
    pub fn new(order: WorkListOrder) -> Self {
        Self {
            entries: VecDeque::new(),
            order,
        }
    }

    /// Empty sets carry no work and are dropped.
    pub fn add_entry(&mut self, pointer: PointerId, pts: PointsToSet) {
        if !pts.is_empty() {
            self.entries.push_back(Entry { pointer, pts });
        }
    }

    pub fn poll_entry(&mut self) -> Option<Entry> {
        match self.order {
            WorkListOrder::Fifo => self.entries.pop_front(),
            WorkListOrder::Lifo => self.entries.pop_back(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
