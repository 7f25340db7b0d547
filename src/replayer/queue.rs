//! Pending timestamped register writes

use std::collections::VecDeque;

use super::log::RegisterWrite;

/// Entries preallocated before the queue has to grow
pub const QUEUE_CAPACITY: usize = 4096;

/// FIFO of register writes waiting for their CPU cycle
#[derive(Debug, Clone)]
pub struct WriteQueue {
    pending: VecDeque<RegisterWrite>,
    overflowed: bool,
}

impl WriteQueue {
    /// Create an empty queue with the default capacity reserved
    pub fn new() -> Self {
        Self {
            pending: VecDeque::with_capacity(QUEUE_CAPACITY),
            overflowed: false,
        }
    }

    /// Append a write. Past [`QUEUE_CAPACITY`] the queue grows and warns once.
    pub fn push(&mut self, write: RegisterWrite) {
        if self.pending.len() >= QUEUE_CAPACITY && !self.overflowed {
            self.overflowed = true;
            tracing::warn!(
                pending = self.pending.len(),
                timestamp = write.timestamp,
                "register write queue over capacity; is the host calling process()?"
            );
        }
        self.pending.push_back(write);
    }

    /// Pop the oldest write if it is due at `cycles`
    #[inline]
    pub fn pop_due(&mut self, cycles: u64) -> Option<RegisterWrite> {
        match self.pending.front() {
            Some(write) if write.timestamp <= cycles => {
                let write = self.pending.pop_front();
                if self.overflowed && self.pending.len() < QUEUE_CAPACITY {
                    self.overflowed = false;
                }
                write
            }
            _ => None,
        }
    }

    /// Drop everything pending
    pub fn clear(&mut self) {
        self.pending.clear();
        self.overflowed = false;
    }

    /// Number of pending writes
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True if nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for WriteQueue {
    fn default() -> Self {
        Self::new()
    }
}
