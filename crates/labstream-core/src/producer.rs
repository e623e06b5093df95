//! Periodic reading production, one task per channel.
//!
//! Each channel gets its own tokio task ticking at the channel's production
//! period. A tick reads the wall clock, asks the generator for a value,
//! appends to the store and then to the durable log. Failures stay inside
//! the tick: a rejected or unpersisted reading is logged and the task keeps
//! its cadence, so one misbehaving channel never stalls the others.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::generator::ReadingGenerator;
use crate::reading::{Reading, unix_ms_now};
use crate::sink::LogSink;
use crate::store::TelemetryStore;

/// Spawn one producer task per `(channel, generator)` pair.
///
/// The first tick lands one full period after spawn, on the assumption that
/// warm-up already covered `now`. Flip the watch channel to `true` (or drop
/// its sender) to stop every task; the returned handles let the caller wait
/// for them to wind down.
pub fn spawn_producers(
    store: &Arc<TelemetryStore>,
    sink: &Arc<LogSink>,
    generators: Vec<(String, Box<dyn ReadingGenerator>)>,
    shutdown: &watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::with_capacity(generators.len());
    for (channel, generator) in generators {
        let Some(spec) = store.spec(&channel) else {
            error!("{channel}: not registered in the store, producer not started");
            continue;
        };
        let period = spec.production_period;
        let store = Arc::clone(store);
        let sink = Arc::clone(sink);
        let shutdown = shutdown.clone();
        handles.push(tokio::spawn(async move {
            produce_loop(store, sink, channel, generator, period, shutdown).await;
        }));
    }
    handles
}

async fn produce_loop(
    store: Arc<TelemetryStore>,
    sink: Arc<LogSink>,
    channel: String,
    generator: Box<dyn ReadingGenerator>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = time::interval_at(Instant::now() + period, period);
    // A stalled tick should not be made up with a burst of back-dated ones.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    debug!("{channel}: producing every {period:?}");

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                produce_one(&store, &sink, &channel, generator.as_ref());
            }
        }
    }
    debug!("{channel}: producer stopped");
}

/// One production tick: generate, store, persist.
fn produce_one(
    store: &TelemetryStore,
    sink: &LogSink,
    channel: &str,
    generator: &dyn ReadingGenerator,
) {
    let now = unix_ms_now();
    let reading = Reading::new(now, generator.value_at(now));
    if let Err(e) = store.append(channel, reading, now) {
        error!("{channel}: dropping reading: {e}");
        return;
    }
    if let Err(e) = sink.append(channel, &reading) {
        warn!("{channel}: reading kept in memory but not persisted: {e}");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
