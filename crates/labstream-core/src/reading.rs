//! The stored sample type and the small amount of civil time the crate needs.
//!
//! Timestamps are `u64` milliseconds since the Unix epoch everywhere in the
//! store; ISO-8601 rendering exists only for human-facing output (CLI tables,
//! API payloads, the data-directory manifest).

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

/// One telemetry sample: when it was taken and what was measured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Wall-clock time of the measurement, in Unix milliseconds.
    pub timestamp: Timestamp,
    /// Measured value. The channel's `value_field` says what it means.
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp: Timestamp, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Current wall-clock time in Unix milliseconds.
pub fn unix_ms_now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Format a Unix-millisecond timestamp as ISO-8601 UTC, seconds resolution.
/// Example: `2026-02-15T01:30:00Z`
pub fn format_iso8601_ms(timestamp: Timestamp) -> String {
    let (year, month, day, hour, min, sec) = secs_to_utc(timestamp / 1000);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
        year, month, day, hour, min, sec
    )
}

/// Convert seconds since Unix epoch to (year, month, day, hour, minute, second) UTC.
/// Simple implementation, no leap second handling.
fn secs_to_utc(secs: u64) -> (u64, u64, u64, u64, u64, u64) {
    let sec = secs % 60;
    let min = (secs / 60) % 60;
    let hour = (secs / 3600) % 24;

    let mut days = secs / 86400;
    let mut year = 1970u64;

    loop {
        let days_in_year = if is_leap(year) { 366 } else { 365 };
        if days < days_in_year {
            break;
        }
        days -= days_in_year;
        year += 1;
    }

    let months_days: [u64; 12] = if is_leap(year) {
        [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    } else {
        [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    };

    let mut month = 0u64;
    for (i, &md) in months_days.iter().enumerate() {
        if days < md {
            month = i as u64 + 1;
            break;
        }
        days -= md;
    }
    let day = days + 1;

    (year, month, day, hour, min, sec)
}

fn is_leap(year: u64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_construction() {
        let r = Reading::new(1_000, 6.5);
        assert_eq!(r.timestamp, 1_000);
        assert!((r.value - 6.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reading_serde_roundtrip() {
        let r = Reading::new(1_700_000_000_000, 22.75);
        let json = serde_json::to_string(&r).unwrap();
        let parsed: Reading = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, r);
    }

    #[test]
    fn test_unix_ms_now_is_recent() {
        // Anything after 2020-01-01 counts as a sane clock.
        assert!(unix_ms_now() > 1_577_836_800_000);
    }

    #[test]
    fn test_format_iso8601_epoch() {
        assert_eq!(format_iso8601_ms(0), "1970-01-01T00:00:00Z");
    }

    #[test]
    fn test_format_iso8601_drops_millis() {
        assert_eq!(format_iso8601_ms(1_500), "1970-01-01T00:00:01Z");
    }

    #[test]
    fn test_format_iso8601_known_date() {
        // 2000-01-01 00:00:00 UTC = 946684800 seconds since epoch
        assert_eq!(format_iso8601_ms(946_684_800_000), "2000-01-01T00:00:00Z");
    }

    #[test]
    fn test_secs_to_utc_epoch() {
        let (y, m, d, h, mi, s) = secs_to_utc(0);
        assert_eq!((y, m, d, h, mi, s), (1970, 1, 1, 0, 0, 0));
    }

    #[test]
    fn test_secs_to_utc_leap_day() {
        // 2024-02-29 12:00:00 UTC = 1709208000
        let (y, m, d, h, _, _) = secs_to_utc(1_709_208_000);
        assert_eq!((y, m, d, h), (2024, 2, 29, 12));
    }

    #[test]
    fn test_is_leap() {
        assert!(is_leap(2000));
        assert!(is_leap(2024));
        assert!(!is_leap(1900));
        assert!(!is_leap(2023));
    }
}
