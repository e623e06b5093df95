//! # labstream-core
//!
//! **A windowed telemetry store for lab sensor channels.**
//!
//! `labstream-core` keeps a sliding window of readings per sensor channel in
//! memory, mirrors every accepted reading into an append-only CSV log, and
//! warms each channel on startup so consumers see a fully populated window
//! from the first request. On restart the durable log is replayed; synthetic
//! history is generated only when there is nothing to replay.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use labstream_core::{
//!     LogSink, TelemetryStore, WarmStart, default_channels, synthetic_generator,
//!     unix_ms_now, warm,
//! };
//!
//! let channels = default_channels();
//! let store = Arc::new(TelemetryStore::new(channels.clone()));
//! let sink = Arc::new(LogSink::new("data", &channels).unwrap());
//!
//! // Replay existing logs, or synthesize a full window per channel.
//! let generators: Vec<_> = channels
//!     .iter()
//!     .filter_map(|c| synthetic_generator(&c.id, 42).map(|g| (c.id.clone(), g)))
//!     .collect();
//! warm(&store, &sink, &generators, WarmStart::Replay, unix_ms_now());
//!
//! let snapshot = store.snapshot("temperature").unwrap();
//! println!("{} readings in the window", snapshot.history.len());
//! ```
//!
//! ## Architecture
//!
//! Generators → Store (windowed, per-channel lock) → Sink (append-only CSV)
//!
//! - Every channel owns its own lock; channels never contend with each other,
//!   and a failure in one never touches another.
//! - Readings within a channel are strictly ordered by timestamp; a stale
//!   append is rejected rather than reordered.
//! - The in-memory window trims from the head only. The durable log is never
//!   trimmed: it keeps the full record and is what exports serve.
//! - A persistence failure is reported but never rolls an accepted reading
//!   back out of memory.
//!
//! Synthetic values come from per-channel generators behind the
//! [`ReadingGenerator`] trait, so tests and embedders can substitute their
//! own signals.

pub mod backfill;
pub mod channel;
pub mod error;
pub mod generator;
pub mod history;
pub mod producer;
pub mod reading;
pub mod sink;
pub mod store;

pub use backfill::{WarmReport, WarmStart, backfill_history, truncate_to_minute, warm};
pub use channel::{ChannelSpec, default_channels, format_duration_short};
pub use error::StoreError;
pub use generator::{ReadingGenerator, synthetic_generator};
pub use history::ChannelHistory;
pub use producer::spawn_producers;
pub use reading::{Reading, Timestamp, format_iso8601_ms, unix_ms_now};
pub use sink::{ChannelLog, LogSink};
pub use store::{ChannelSnapshot, TelemetryStore};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
