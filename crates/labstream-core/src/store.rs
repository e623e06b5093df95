//! Per-channel-locked telemetry store.
//!
//! One slot per channel, each with its own mutex. Appends and snapshots on
//! different channels never contend, and a stalled channel cannot hold up
//! the rest; there is no store-global lock. Every read that leaves the store
//! is a copy taken under the channel lock, so callers can never observe a
//! half-applied append or alias internal storage.

use std::sync::Mutex;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::channel::ChannelSpec;
use crate::error::StoreError;
use crate::history::ChannelHistory;
use crate::reading::{Reading, Timestamp};

struct ChannelSlot {
    spec: ChannelSpec,
    history: Mutex<ChannelHistory>,
}

/// Windowed in-memory store for every registered channel.
pub struct TelemetryStore {
    channels: Vec<ChannelSlot>,
}

/// Point-in-time copy of one channel's state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    pub channel: String,
    /// The newest reading, if the channel has any.
    pub latest: Option<Reading>,
    /// In-window history, oldest first.
    pub history: Vec<Reading>,
}

impl TelemetryStore {
    /// Create a store with one empty slot per channel. Ids must be unique;
    /// every lookup resolves by id.
    pub fn new(specs: Vec<ChannelSpec>) -> Self {
        for (i, spec) in specs.iter().enumerate() {
            assert!(
                !specs[..i].iter().any(|earlier| earlier.id == spec.id),
                "channel '{}': id registered twice",
                spec.id
            );
        }
        let channels = specs
            .into_iter()
            .map(|spec| ChannelSlot {
                spec,
                history: Mutex::new(ChannelHistory::new()),
            })
            .collect();
        Self { channels }
    }

    /// Number of registered channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Ids of every registered channel, in registration order.
    pub fn channel_ids(&self) -> Vec<String> {
        self.channels.iter().map(|s| s.spec.id.clone()).collect()
    }

    /// Spec of a channel, if registered.
    pub fn spec(&self, channel: &str) -> Option<&ChannelSpec> {
        self.channels
            .iter()
            .find(|s| s.spec.id == channel)
            .map(|s| &s.spec)
    }

    fn slot(&self, channel: &str) -> Result<&ChannelSlot, StoreError> {
        self.channels
            .iter()
            .find(|s| s.spec.id == channel)
            .ok_or_else(|| StoreError::UnknownChannel(channel.to_string()))
    }

    /// Append one reading and trim the retention window, in the same lock
    /// acquisition. Readings must arrive in strictly increasing timestamp
    /// order; a violation rejects the reading and changes nothing.
    ///
    /// `now` anchors the window: after this call every retained reading is
    /// at or after `now - retention_window`.
    pub fn append(
        &self,
        channel: &str,
        reading: Reading,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let slot = self.slot(channel)?;
        let cutoff = now.saturating_sub(slot.spec.retention_window.as_millis() as u64);

        let mut history = slot.history.lock().unwrap();
        history
            .append(reading)
            .map_err(|v| StoreError::OutOfOrder {
                channel: channel.to_string(),
                attempted: v.attempted,
                last: v.last,
            })?;
        let evicted = history.trim_before(cutoff);
        if evicted > 0 {
            debug!("{channel}: evicted {evicted} reading(s) past the retention window");
        }
        Ok(())
    }

    /// Copy of a channel's full in-window history.
    pub fn snapshot(&self, channel: &str) -> Result<ChannelSnapshot, StoreError> {
        let slot = self.slot(channel)?;
        let history = slot.history.lock().unwrap();
        Ok(ChannelSnapshot {
            channel: slot.spec.id.clone(),
            latest: history.latest(),
            history: history.to_vec(),
        })
    }

    /// Like [`TelemetryStore::snapshot`], keeping only the newest `n`
    /// readings. `latest` is unaffected by `n`.
    pub fn snapshot_tail(&self, channel: &str, n: usize) -> Result<ChannelSnapshot, StoreError> {
        let slot = self.slot(channel)?;
        let history = slot.history.lock().unwrap();
        Ok(ChannelSnapshot {
            channel: slot.spec.id.clone(),
            latest: history.latest(),
            history: history.tail(n),
        })
    }

    /// Number of readings currently held for a channel.
    pub fn len(&self, channel: &str) -> Result<usize, StoreError> {
        let slot = self.slot(channel)?;
        let history = slot.history.lock().unwrap();
        Ok(history.len())
    }

    /// Replace a channel's history with `readings`, validating order and
    /// trimming to the window anchored at `now`. Used by backfill and log
    /// replay. On any violation the previous history is kept.
    ///
    /// Returns how many readings were retained after trimming.
    pub fn load(
        &self,
        channel: &str,
        readings: Vec<Reading>,
        now: Timestamp,
    ) -> Result<usize, StoreError> {
        let slot = self.slot(channel)?;
        let cutoff = now.saturating_sub(slot.spec.retention_window.as_millis() as u64);

        // Validate into a fresh buffer first so a bad batch cannot leave a
        // half-loaded channel behind.
        let mut fresh = ChannelHistory::new();
        for reading in readings {
            fresh.append(reading).map_err(|v| StoreError::OutOfOrder {
                channel: channel.to_string(),
                attempted: v.attempted,
                last: v.last,
            })?;
        }
        fresh.trim_before(cutoff);
        let kept = fresh.len();

        *slot.history.lock().unwrap() = fresh;
        Ok(kept)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
