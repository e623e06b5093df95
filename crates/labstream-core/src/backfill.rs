//! Synthetic warm start and durable-log replay.
//!
//! A fresh deployment needs a full retention window of plausible history so
//! consumers see a populated window from the first request. On restart an
//! existing log is replayed instead of being regenerated, so recorded data
//! survives the process; regeneration happens only when there is nothing to
//! replay, when the log is unreadable, or when the caller forces it.

use log::{info, warn};

use crate::channel::ChannelSpec;
use crate::error::StoreError;
use crate::generator::ReadingGenerator;
use crate::reading::{Reading, Timestamp};
use crate::sink::LogSink;
use crate::store::TelemetryStore;

/// How to warm a channel that already has a durable log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmStart {
    /// Replay the existing log; synthesize only when there is none.
    Replay,
    /// Always synthesize a fresh window, overwriting any existing log.
    Fresh,
}

/// Outcome of warming one channel.
#[derive(Debug, Clone)]
pub struct WarmReport {
    pub channel: String,
    /// Readings held in memory after warming (post window trim).
    pub readings: usize,
    /// True when the history came from the durable log rather than the
    /// generator.
    pub replayed: bool,
}

/// Generate a full retention window of readings ending at `now`.
///
/// `now` is first truncated to the whole minute so synthetic points sit on
/// round wall times. Timestamps start at `now - retention_window` and step
/// by the production period; the walk stops at the last step that lands at
/// or before `now`. For a 24 h window on a 2 h period that is exactly 13
/// readings spanning the whole window.
pub fn backfill_history(
    spec: &ChannelSpec,
    generator: &dyn ReadingGenerator,
    now: Timestamp,
) -> Vec<Reading> {
    let now = truncate_to_minute(now);
    let window = spec.retention_window.as_millis() as u64;
    let step = spec.production_period.as_millis() as u64;
    let start = now.saturating_sub(window);

    let mut readings = Vec::with_capacity((window / step) as usize + 1);
    let mut ts = start;
    while ts <= now {
        readings.push(Reading::new(ts, generator.value_at(ts)));
        ts += step;
    }
    readings
}

/// Warm every channel with a generator: memory first, then the durable log.
///
/// Channels are independent here as everywhere else: one channel failing to
/// warm is logged and left empty, and the rest proceed.
pub fn warm(
    store: &TelemetryStore,
    sink: &LogSink,
    generators: &[(String, Box<dyn ReadingGenerator>)],
    mode: WarmStart,
    now: Timestamp,
) -> Vec<WarmReport> {
    let mut reports = Vec::with_capacity(generators.len());
    for (channel, generator) in generators {
        let Some(spec) = store.spec(channel).cloned() else {
            warn!("{channel}: not registered in the store, skipping warm-up");
            continue;
        };
        match warm_channel(store, sink, &spec, generator.as_ref(), mode, now) {
            Ok(report) => {
                let how = if report.replayed { "replayed" } else { "synthesized" };
                info!("{channel}: {how} {} readings", report.readings);
                reports.push(report);
            }
            Err(e) => {
                warn!("{channel}: warm-up failed, channel starts empty: {e}");
                reports.push(WarmReport {
                    channel: channel.clone(),
                    readings: 0,
                    replayed: false,
                });
            }
        }
    }
    reports
}

fn warm_channel(
    store: &TelemetryStore,
    sink: &LogSink,
    spec: &ChannelSpec,
    generator: &dyn ReadingGenerator,
    mode: WarmStart,
    now: Timestamp,
) -> Result<WarmReport, StoreError> {
    if mode == WarmStart::Replay {
        match replay_channel(store, sink, spec, now) {
            Ok(Some(kept)) => {
                return Ok(WarmReport {
                    channel: spec.id.clone(),
                    readings: kept,
                    replayed: true,
                });
            }
            Ok(None) => {} // nothing on disk, fall through to synthesis
            Err(e) => {
                warn!("{}: replay failed ({e}); regenerating history", spec.id);
            }
        }
    }

    // The synthetic walk and the window trim share the minute-aligned anchor.
    let now = truncate_to_minute(now);
    let readings = backfill_history(spec, generator, now);
    let kept = store.load(&spec.id, readings.clone(), now)?;
    sink.initialize_with(&spec.id, &readings)?;
    Ok(WarmReport {
        channel: spec.id.clone(),
        readings: kept,
        replayed: false,
    })
}

/// Load a channel's history from its durable log. `Ok(None)` means there is
/// nothing usable on disk (no file, or an empty one); the log file itself is
/// never modified.
fn replay_channel(
    store: &TelemetryStore,
    sink: &LogSink,
    spec: &ChannelSpec,
    now: Timestamp,
) -> Result<Option<usize>, StoreError> {
    if !sink.has_log(&spec.id)? {
        return Ok(None);
    }
    let readings = sink.replay(&spec.id)?;
    if readings.is_empty() {
        return Ok(None);
    }
    let kept = store.load(&spec.id, readings, now)?;
    Ok(Some(kept))
}

/// Truncate a timestamp to the start of its minute.
///
/// Synthetic history is anchored here; callers that load a generated window
/// themselves must trim against the truncated time, not the raw clock.
pub fn truncate_to_minute(ts: Timestamp) -> Timestamp {
    ts - ts % 60_000
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Generator that reports the timestamp in seconds, for exact checks.
    struct RampSignal;

    impl ReadingGenerator for RampSignal {
        fn value_at(&self, timestamp: Timestamp) -> f64 {
            timestamp as f64 / 1000.0
        }
    }

    /// Generator that always reports the same value.
    struct FlatSignal(f64);

    impl ReadingGenerator for FlatSignal {
        fn value_at(&self, _timestamp: Timestamp) -> f64 {
            self.0
        }
    }

    const HOUR_MS: u64 = 3_600_000;

    fn day_spec(id: &str, period: Duration) -> ChannelSpec {
        ChannelSpec::new(id, "v", Duration::from_secs(24 * 3600), period)
    }

    fn generators_for(
        specs: &[ChannelSpec],
        value: f64,
    ) -> Vec<(String, Box<dyn ReadingGenerator>)> {
        specs
            .iter()
            .map(|s| {
                (
                    s.id.clone(),
                    Box::new(FlatSignal(value)) as Box<dyn ReadingGenerator>,
                )
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // backfill_history tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_backfill_count_24h_2h_is_13() {
        let spec = day_spec("humidity", Duration::from_secs(2 * 3600));
        let now = 100 * 24 * HOUR_MS; // minute-aligned already
        let readings = backfill_history(&spec, &RampSignal, now);

        assert_eq!(readings.len(), 13);
        assert_eq!(readings.first().unwrap().timestamp, now - 24 * HOUR_MS);
        assert_eq!(readings.last().unwrap().timestamp, now);
    }

    #[test]
    fn test_backfill_count_72h_6h_is_13() {
        let spec = ChannelSpec::new(
            "ph",
            "ph",
            Duration::from_secs(72 * 3600),
            Duration::from_secs(6 * 3600),
        );
        let readings = backfill_history(&spec, &RampSignal, 200 * 24 * HOUR_MS);
        assert_eq!(readings.len(), 13);
    }

    #[test]
    fn test_backfill_is_strictly_increasing() {
        let spec = day_spec("temperature", Duration::from_secs(5));
        let readings = backfill_history(&spec, &RampSignal, 30 * 24 * HOUR_MS);
        assert_eq!(readings.len(), 17_281);
        for pair in readings.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
    }

    #[test]
    fn test_backfill_endpoint_only_when_it_lands_on_now() {
        // Window 10s, period 3s: steps at -10, -7, -4, -1 relative seconds.
        // The next step would land after now and must not be produced.
        let spec = ChannelSpec::new(
            "x",
            "v",
            Duration::from_secs(10),
            Duration::from_secs(3),
        );
        let now = 10 * 60_000u64; // minute-aligned
        let readings = backfill_history(&spec, &RampSignal, now);
        assert_eq!(readings.len(), 4);
        assert_eq!(readings.last().unwrap().timestamp, now - 1000);
    }

    #[test]
    fn test_backfill_truncates_now_to_minute() {
        let spec = day_spec("humidity", Duration::from_secs(2 * 3600));
        let ragged_now = 100 * 24 * HOUR_MS + 37_500; // 37.5s past the minute
        let readings = backfill_history(&spec, &RampSignal, ragged_now);
        assert_eq!(readings.last().unwrap().timestamp, 100 * 24 * HOUR_MS);
        for r in &readings {
            assert_eq!(r.timestamp % 60_000, 0, "points sit on whole minutes");
        }
    }

    #[test]
    fn test_backfill_values_come_from_the_generator() {
        let spec = day_spec("x", Duration::from_secs(2 * 3600));
        let readings = backfill_history(&spec, &FlatSignal(42.5), 50 * 24 * HOUR_MS);
        assert!(readings.iter().all(|r| r.value == 42.5));
    }

    // -----------------------------------------------------------------------
    // warm tests
    // -----------------------------------------------------------------------

    #[test]
    fn test_warm_fresh_fills_store_and_log() {
        let tmp = tempfile::tempdir().unwrap();
        let specs = vec![day_spec("humidity", Duration::from_secs(2 * 3600))];
        let store = TelemetryStore::new(specs.clone());
        let sink = LogSink::new(tmp.path(), &specs).unwrap();
        let generators = generators_for(&specs, 70.0);

        let now = 300 * 24 * HOUR_MS;
        let reports = warm(&store, &sink, &generators, WarmStart::Fresh, now);

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].readings, 13);
        assert!(!reports[0].replayed);

        // Memory and log agree.
        let snap = store.snapshot("humidity").unwrap();
        let logged = sink.replay("humidity").unwrap();
        assert_eq!(snap.history, logged);
    }

    #[test]
    fn test_warm_fresh_keeps_the_full_window_off_the_minute() {
        let tmp = tempfile::tempdir().unwrap();
        let specs = vec![day_spec("humidity", Duration::from_secs(2 * 3600))];
        let store = TelemetryStore::new(specs.clone());
        let sink = LogSink::new(tmp.path(), &specs).unwrap();
        let generators = generators_for(&specs, 70.0);

        // One millisecond past the minute, as any real wall clock will be.
        let now = 300 * 24 * HOUR_MS + 1;
        let reports = warm(&store, &sink, &generators, WarmStart::Fresh, now);

        assert_eq!(reports[0].readings, 13);
        let snap = store.snapshot("humidity").unwrap();
        assert_eq!(snap.history.len(), 13, "the boundary reading must survive");
        assert_eq!(snap.history, sink.replay("humidity").unwrap());
    }

    #[test]
    fn test_warm_fresh_dense_channel_keeps_every_point_off_the_minute() {
        let tmp = tempfile::tempdir().unwrap();
        let specs = vec![day_spec("temperature", Duration::from_secs(5))];
        let store = TelemetryStore::new(specs.clone());
        let sink = LogSink::new(tmp.path(), &specs).unwrap();
        let generators = generators_for(&specs, 21.0);

        let now = 300 * 24 * HOUR_MS + 37_500;
        let reports = warm(&store, &sink, &generators, WarmStart::Fresh, now);
        assert_eq!(reports[0].readings, 17_281);
        assert_eq!(store.len("temperature").unwrap(), 17_281);
    }

    #[test]
    fn test_warm_replay_keeps_recorded_data() {
        let tmp = tempfile::tempdir().unwrap();
        let specs = vec![day_spec("humidity", Duration::from_secs(2 * 3600))];
        let store = TelemetryStore::new(specs.clone());
        let sink = LogSink::new(tmp.path(), &specs).unwrap();
        let generators = generators_for(&specs, 70.0);

        let now = 300 * 24 * HOUR_MS;
        let recorded = vec![
            Reading::new(now - HOUR_MS, 61.0),
            Reading::new(now - HOUR_MS / 2, 62.0),
        ];
        sink.initialize_with("humidity", &recorded).unwrap();
        let log_before = sink.export("humidity").unwrap();

        let reports = warm(&store, &sink, &generators, WarmStart::Replay, now);

        assert!(reports[0].replayed);
        assert_eq!(reports[0].readings, 2);
        let snap = store.snapshot("humidity").unwrap();
        assert_eq!(snap.history, recorded, "replay must restore recorded data");
        assert_eq!(
            sink.export("humidity").unwrap(),
            log_before,
            "replay must not rewrite the log"
        );
    }

    #[test]
    fn test_warm_replay_trims_stale_rows_in_memory_only() {
        let tmp = tempfile::tempdir().unwrap();
        let specs = vec![day_spec("humidity", Duration::from_secs(2 * 3600))];
        let store = TelemetryStore::new(specs.clone());
        let sink = LogSink::new(tmp.path(), &specs).unwrap();
        let generators = generators_for(&specs, 70.0);

        let now = 300 * 24 * HOUR_MS;
        let recorded = vec![
            Reading::new(now - 48 * HOUR_MS, 60.0), // outside the 24h window
            Reading::new(now - HOUR_MS, 61.0),
        ];
        sink.initialize_with("humidity", &recorded).unwrap();

        let reports = warm(&store, &sink, &generators, WarmStart::Replay, now);
        assert_eq!(reports[0].readings, 1, "stale rows drop from memory");
        assert_eq!(
            sink.replay("humidity").unwrap().len(),
            2,
            "the durable log keeps its full record"
        );
    }

    #[test]
    fn test_warm_fresh_overwrites_existing_log() {
        let tmp = tempfile::tempdir().unwrap();
        let specs = vec![day_spec("humidity", Duration::from_secs(2 * 3600))];
        let store = TelemetryStore::new(specs.clone());
        let sink = LogSink::new(tmp.path(), &specs).unwrap();
        let generators = generators_for(&specs, 70.0);

        let now = 300 * 24 * HOUR_MS;
        sink.initialize_with("humidity", &[Reading::new(now - HOUR_MS, 61.0)])
            .unwrap();

        let reports = warm(&store, &sink, &generators, WarmStart::Fresh, now);
        assert!(!reports[0].replayed);
        assert_eq!(
            sink.replay("humidity").unwrap().len(),
            13,
            "fresh mode regenerates the log"
        );
    }

    #[test]
    fn test_warm_replay_falls_back_on_corrupt_log() {
        let tmp = tempfile::tempdir().unwrap();
        let specs = vec![day_spec("humidity", Duration::from_secs(2 * 3600))];
        let store = TelemetryStore::new(specs.clone());
        let sink = LogSink::new(tmp.path(), &specs).unwrap();
        let generators = generators_for(&specs, 70.0);

        std::fs::write(
            sink.log_path("humidity").unwrap(),
            "timestamp,v\ngarbage-row\n",
        )
        .unwrap();

        let now = 300 * 24 * HOUR_MS;
        let reports = warm(&store, &sink, &generators, WarmStart::Replay, now);

        assert!(!reports[0].replayed, "corrupt log falls back to synthesis");
        assert_eq!(reports[0].readings, 13);
        assert_eq!(
            sink.replay("humidity").unwrap().len(),
            13,
            "fallback rewrites a clean log"
        );
    }

    #[test]
    fn test_warm_skips_generator_for_unregistered_channel() {
        let tmp = tempfile::tempdir().unwrap();
        let specs = vec![day_spec("humidity", Duration::from_secs(2 * 3600))];
        let store = TelemetryStore::new(specs.clone());
        let sink = LogSink::new(tmp.path(), &specs).unwrap();

        let generators: Vec<(String, Box<dyn ReadingGenerator>)> = vec![(
            "co2".to_string(),
            Box::new(FlatSignal(1.0)) as Box<dyn ReadingGenerator>,
        )];
        let reports = warm(&store, &sink, &generators, WarmStart::Fresh, 1_000_000);
        assert!(reports.is_empty());
    }

    #[test]
    fn test_truncate_to_minute() {
        assert_eq!(truncate_to_minute(0), 0);
        assert_eq!(truncate_to_minute(60_000), 60_000);
        assert_eq!(truncate_to_minute(61_234), 60_000);
        assert_eq!(truncate_to_minute(119_999), 60_000);
    }
}
