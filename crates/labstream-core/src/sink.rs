//! Append-only CSV persistence for channel readings.
//!
//! One log file per channel under a data directory, named `<id>.csv`: a
//! header line, then one `timestamp,<value_field>` row per reading with the
//! timestamp in Unix milliseconds. Files are opened per write; an append
//! creates the file (with its header) when it is missing, so a deleted log
//! heals on the next reading. The directory also carries a `channels.json`
//! manifest describing the channel table for external tooling.
//!
//! Logs are never trimmed: the in-memory window is bounded, the durable log
//! is the full record.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::channel::ChannelSpec;
use crate::error::StoreError;
use crate::reading::{Reading, format_iso8601_ms, unix_ms_now};

// ---------------------------------------------------------------------------
// Single channel log
// ---------------------------------------------------------------------------

/// One channel's durable log file.
pub struct ChannelLog {
    channel: String,
    value_field: String,
    path: PathBuf,
}

impl ChannelLog {
    pub fn new(dir: &Path, spec: &ChannelSpec) -> Self {
        Self {
            channel: spec.id.clone(),
            value_field: spec.value_field.clone(),
            path: dir.join(format!("{}.csv", spec.id)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn header(&self) -> String {
        format!("timestamp,{}", self.value_field)
    }

    /// Overwrite the log with a header and the given readings.
    pub fn initialize_with(&self, readings: &[Reading]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", self.header())?;
        for reading in readings {
            writeln!(writer, "{},{}", reading.timestamp, reading.value)?;
        }
        writer.flush()
    }

    /// Append one reading, creating the file with its header if absent.
    pub fn append(&self, reading: &Reading) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let existed = self.path.exists();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        if !existed {
            writeln!(writer, "{}", self.header())?;
        }
        writeln!(writer, "{},{}", reading.timestamp, reading.value)?;
        writer.flush()
    }

    /// Raw bytes of the whole log. A log that was never written exports as
    /// just its header line.
    pub fn read_raw(&self) -> io::Result<Vec<u8>> {
        if !self.path.exists() {
            return Ok(format!("{}\n", self.header()).into_bytes());
        }
        fs::read(&self.path)
    }

    /// Parse the log back into readings. A missing file parses as empty;
    /// a malformed row fails with the offending line number.
    pub fn read_readings(&self) -> Result<Vec<Reading>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path).map_err(|e| StoreError::Persistence {
            channel: self.channel.clone(),
            source: e,
        })?;

        let mut readings = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if idx == 0 || line.trim().is_empty() {
                continue;
            }
            let Some((ts, value)) = line.split_once(',') else {
                return Err(self.corrupt(idx, "expected two comma-separated fields"));
            };
            let timestamp = ts
                .trim()
                .parse::<u64>()
                .map_err(|e| self.corrupt(idx, &format!("bad timestamp: {e}")))?;
            let value = value
                .trim()
                .parse::<f64>()
                .map_err(|e| self.corrupt(idx, &format!("bad value: {e}")))?;
            readings.push(Reading::new(timestamp, value));
        }
        Ok(readings)
    }

    fn corrupt(&self, line_idx: usize, reason: &str) -> StoreError {
        StoreError::CorruptLog {
            channel: self.channel.clone(),
            line: line_idx + 1,
            reason: reason.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-channel log registry
// ---------------------------------------------------------------------------

struct LogSlot {
    id: String,
    log: Mutex<ChannelLog>,
}

/// Per-channel durable logs under one data directory.
///
/// Each log sits behind its own mutex, mirroring the store's locking: writes
/// and exports contend only within their channel.
pub struct LogSink {
    dir: PathBuf,
    slots: Vec<LogSlot>,
}

impl LogSink {
    /// Create the data directory (if needed), write the channel manifest and
    /// bind one log per channel.
    pub fn new(dir: impl Into<PathBuf>, specs: &[ChannelSpec]) -> io::Result<Self> {
        let sink = Self::open(dir, specs);
        fs::create_dir_all(&sink.dir)?;
        sink.write_manifest(specs)?;
        Ok(sink)
    }

    /// Bind logs without touching the filesystem. For read-only access to a
    /// directory some other process writes.
    pub fn open(dir: impl Into<PathBuf>, specs: &[ChannelSpec]) -> Self {
        let dir = dir.into();
        let slots = specs
            .iter()
            .map(|spec| LogSlot {
                id: spec.id.clone(),
                log: Mutex::new(ChannelLog::new(&dir, spec)),
            })
            .collect();
        Self { dir, slots }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_manifest(&self, specs: &[ChannelSpec]) -> io::Result<()> {
        let manifest = serde_json::json!({
            "version": 1,
            "written_at": format_iso8601_ms(unix_ms_now()),
            "channels": specs.iter().map(|s| serde_json::json!({
                "id": s.id,
                "value_field": s.value_field,
                "retention_window_secs": s.retention_window.as_secs(),
                "production_period_secs": s.production_period.as_secs(),
                "log": format!("{}.csv", s.id),
            })).collect::<Vec<_>>(),
        });
        let json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        fs::write(self.dir.join("channels.json"), json)
    }

    fn slot(&self, channel: &str) -> Result<&LogSlot, StoreError> {
        self.slots
            .iter()
            .find(|s| s.id == channel)
            .ok_or_else(|| StoreError::UnknownChannel(channel.to_string()))
    }

    fn persistence(&self, channel: &str, e: io::Error) -> StoreError {
        StoreError::Persistence {
            channel: channel.to_string(),
            source: e,
        }
    }

    /// Overwrite a channel's log with a header and the given readings.
    pub fn initialize_with(&self, channel: &str, readings: &[Reading]) -> Result<(), StoreError> {
        let slot = self.slot(channel)?;
        let log = slot.log.lock().unwrap();
        log.initialize_with(readings)
            .map_err(|e| self.persistence(channel, e))
    }

    /// Append one reading to a channel's log.
    pub fn append(&self, channel: &str, reading: &Reading) -> Result<(), StoreError> {
        let slot = self.slot(channel)?;
        let log = slot.log.lock().unwrap();
        log.append(reading).map_err(|e| self.persistence(channel, e))
    }

    /// Full raw bytes of a channel's log.
    pub fn export(&self, channel: &str) -> Result<Vec<u8>, StoreError> {
        let slot = self.slot(channel)?;
        let log = slot.log.lock().unwrap();
        log.read_raw().map_err(|e| self.persistence(channel, e))
    }

    /// Parse a channel's log back into readings.
    pub fn replay(&self, channel: &str) -> Result<Vec<Reading>, StoreError> {
        let slot = self.slot(channel)?;
        let log = slot.log.lock().unwrap();
        log.read_readings()
    }

    /// Whether a channel's log file exists on disk.
    pub fn has_log(&self, channel: &str) -> Result<bool, StoreError> {
        let slot = self.slot(channel)?;
        let log = slot.log.lock().unwrap();
        Ok(log.path().exists())
    }

    /// Path of a channel's log file.
    pub fn log_path(&self, channel: &str) -> Result<PathBuf, StoreError> {
        let slot = self.slot(channel)?;
        let log = slot.log.lock().unwrap();
        Ok(log.path().to_path_buf())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
