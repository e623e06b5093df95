//! One channel's ordered, windowed buffer.
//!
//! Append at the tail, evict from the head, nothing else. Timestamps are
//! strictly increasing, so the buffer is sorted by construction and trimming
//! never has to look past the first in-window entry.

use std::collections::VecDeque;

use crate::reading::{Reading, Timestamp};

/// A rejected append: the reading does not extend the timestamp order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderViolation {
    /// Timestamp of the rejected reading.
    pub attempted: Timestamp,
    /// Timestamp of the newest accepted reading.
    pub last: Timestamp,
}

/// Reading buffer for a single channel.
#[derive(Debug, Default)]
pub struct ChannelHistory {
    entries: VecDeque<Reading>,
}

impl ChannelHistory {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The newest reading, if any.
    pub fn latest(&self) -> Option<Reading> {
        self.entries.back().copied()
    }

    /// The oldest retained reading, if any.
    pub fn oldest(&self) -> Option<Reading> {
        self.entries.front().copied()
    }

    /// Append a reading, enforcing strictly increasing timestamps. A reading
    /// at or before the newest accepted timestamp is rejected and the buffer
    /// is left exactly as it was.
    pub fn append(&mut self, reading: Reading) -> Result<(), OrderViolation> {
        if let Some(last) = self.entries.back()
            && reading.timestamp <= last.timestamp
        {
            return Err(OrderViolation {
                attempted: reading.timestamp,
                last: last.timestamp,
            });
        }
        self.entries.push_back(reading);
        Ok(())
    }

    /// Evict readings older than `cutoff` from the head. A reading exactly
    /// at the cutoff stays. Returns how many were evicted.
    pub fn trim_before(&mut self, cutoff: Timestamp) -> usize {
        let mut evicted = 0;
        while let Some(front) = self.entries.front() {
            if front.timestamp >= cutoff {
                break;
            }
            self.entries.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Full copy of the buffer, oldest first.
    pub fn to_vec(&self) -> Vec<Reading> {
        self.entries.iter().copied().collect()
    }

    /// Copy of the newest `n` readings, oldest first.
    pub fn tail(&self, n: usize) -> Vec<Reading> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).copied().collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
