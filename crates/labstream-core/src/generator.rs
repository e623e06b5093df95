//! Synthetic signal generators for the built-in channels.
//!
//! Each generator is a pure function of `(seed, timestamp)`: the same inputs
//! always give the same value. Noise comes from an RNG re-seeded per call
//! from the generator seed and the timestamp, so backfill is reproducible
//! and tests can pin exact outputs. Curves follow a daily cycle with values
//! clamped to the range the instrument could plausibly report, rounded to
//! two decimals the way the readings are displayed.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::reading::Timestamp;

/// A source of synthetic channel values.
pub trait ReadingGenerator: Send + Sync {
    /// Value of the signal at the given wall-clock time.
    fn value_at(&self, timestamp: Timestamp) -> f64;
}

/// Slow pH drift around neutral, bounded to what a nutrient reservoir
/// plausibly reaches.
pub struct PhCurve {
    seed: u64,
}

impl PhCurve {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl ReadingGenerator for PhCurve {
    fn value_at(&self, timestamp: Timestamp) -> f64 {
        let h = hour_of_day(timestamp);
        let base = 6.5 + 0.8 * (h * 0.2).sin() + 0.5 * (h * 0.3).cos();
        let value = base + noise(self.seed, timestamp, -0.3, 0.3);
        round2(value.clamp(5.5, 7.5))
    }
}

/// Relative humidity with a daily swing peaking in the late afternoon.
pub struct HumidityCurve {
    seed: u64,
}

impl HumidityCurve {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl ReadingGenerator for HumidityCurve {
    fn value_at(&self, timestamp: Timestamp) -> f64 {
        let h = hour_of_day(timestamp);
        let base = 75.0 + 15.0 * ((h - 10.0) * 2.0 * PI / 24.0).sin();
        let value = base + noise(self.seed, timestamp, -4.0, 8.0);
        round2(value.clamp(60.0, 90.0))
    }
}

/// Air temperature with a daily cycle, coldest before dawn.
pub struct TemperatureCurve {
    seed: u64,
}

impl TemperatureCurve {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl ReadingGenerator for TemperatureCurve {
    fn value_at(&self, timestamp: Timestamp) -> f64 {
        let h = hour_of_day(timestamp);
        let base = 22.5 + 7.5 * ((h - 6.0) * 2.0 * PI / 24.0).sin();
        let value = base + noise(self.seed, timestamp, -2.0, 2.0);
        round2(value.clamp(15.0, 30.0))
    }
}

/// Generator for a built-in channel id, or `None` for unknown ids.
pub fn synthetic_generator(channel_id: &str, seed: u64) -> Option<Box<dyn ReadingGenerator>> {
    match channel_id {
        "ph" => Some(Box::new(PhCurve::new(seed))),
        "humidity" => Some(Box::new(HumidityCurve::new(seed))),
        "temperature" => Some(Box::new(TemperatureCurve::new(seed))),
        _ => None,
    }
}

/// Hour of day in UTC as a fraction: 14:30 becomes 14.5.
fn hour_of_day(timestamp: Timestamp) -> f64 {
    let secs_into_day = (timestamp / 1000) % 86_400;
    secs_into_day as f64 / 3600.0
}

/// Uniform noise in `[lo, hi)`, derived deterministically from the seed and
/// the timestamp.
fn noise(seed: u64, timestamp: Timestamp, lo: f64, hi: f64) -> f64 {
    let mut rng = StdRng::seed_from_u64(seed ^ timestamp.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    rng.random_range(lo..hi)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
