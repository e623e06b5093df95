//! Channel identity and retention parameters.
//!
//! A channel is one measured quantity with its own retention window and
//! production period. The built-in table matches a small hydroponics rig:
//! slow-moving pH kept for three days, humidity and temperature kept for one
//! day, temperature sampled every few seconds.

use std::time::Duration;

/// Static description of one telemetry channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    /// Stable identifier: lookups, log file names, URL segments.
    pub id: String,
    /// Key the value is serialized under in JSON payloads and CSV headers.
    /// Labelling only; nothing in the store behaves differently because of it.
    pub value_field: String,
    /// How much history the store keeps, measured back from the newest append.
    pub retention_window: Duration,
    /// Interval between produced readings.
    pub production_period: Duration,
}

impl ChannelSpec {
    /// Build a spec. The period must be non-zero and no longer than the
    /// window, otherwise the channel could never hold more than one reading.
    pub fn new(
        id: &str,
        value_field: &str,
        retention_window: Duration,
        production_period: Duration,
    ) -> Self {
        assert!(
            !production_period.is_zero(),
            "channel '{id}': production period must be non-zero"
        );
        assert!(
            retention_window >= production_period,
            "channel '{id}': retention window shorter than the production period"
        );
        Self {
            id: id.to_string(),
            value_field: value_field.to_string(),
            retention_window,
            production_period,
        }
    }

    /// Number of readings a full synthetic backfill produces: one per period
    /// across the window, endpoints included.
    pub fn backfill_len(&self) -> usize {
        (self.retention_window.as_millis() / self.production_period.as_millis()) as usize + 1
    }
}

/// The built-in channel table.
pub fn default_channels() -> Vec<ChannelSpec> {
    vec![
        ChannelSpec::new(
            "ph",
            "ph",
            Duration::from_secs(72 * 3600),
            Duration::from_secs(6 * 3600),
        ),
        ChannelSpec::new(
            "humidity",
            "humidity_pct",
            Duration::from_secs(24 * 3600),
            Duration::from_secs(2 * 3600),
        ),
        ChannelSpec::new(
            "temperature",
            "temp_c",
            Duration::from_secs(24 * 3600),
            Duration::from_secs(5),
        ),
    ]
}

/// Compact duration label for tables: `72h`, `30m`, `5s`, `250ms`.
pub fn format_duration_short(d: Duration) -> String {
    let ms = d.as_millis();
    if ms == 0 {
        return "0s".to_string();
    }
    if ms % 3_600_000 == 0 {
        return format!("{}h", ms / 3_600_000);
    }
    if ms % 60_000 == 0 {
        return format!("{}m", ms / 60_000);
    }
    if ms % 1000 == 0 {
        return format!("{}s", ms / 1000);
    }
    format!("{ms}ms")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
