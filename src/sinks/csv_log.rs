//! Append-only per-session CSV log.
//!
//! One file per session, header written once, one row appended and flushed
//! per record. The flush after every append is deliberate: losing
//! buffered-but-unflushed rows on a crash is worse than the per-record
//! flush cost at these data rates.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, info};

use crate::broadcast::RecordSink;
use crate::types::SensorRecord;
use crate::{Result, TelemetryError};

/// Column header matching the device field names used by downstream tooling.
const HEADER: [&str; 7] =
    ["sLed", "rSensor1", "rSensor2", "rSensor3", "rSensor4", "timeStamp", "interval_ms"];

/// Durable append-only log of every record in one session.
#[derive(Debug)]
pub struct CsvLogSink {
    writer: csv::Writer<File>,
    path: PathBuf,
    records_written: u64,
}

impl CsvLogSink {
    /// Open a fresh session log under `dir`, named after the session start
    /// time. Creates the directory if needed and writes the header row.
    ///
    /// # Errors
    ///
    /// Returns a sink error if the directory or file cannot be created.
    pub fn create(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| TelemetryError::sink(dir, e))?;

        let name = format!("session-{}.csv", Local::now().format("%Y%m%d-%H%M%S%.3f"));
        Self::at_path(dir.join(name))
    }

    /// Open a session log at an explicit path.
    pub fn at_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut writer =
            csv::Writer::from_path(&path).map_err(|e| TelemetryError::sink(&path, e))?;

        writer.write_record(HEADER).map_err(|e| TelemetryError::sink(&path, e))?;
        writer.flush().map_err(|e| TelemetryError::sink(&path, e))?;

        info!(path = %path.display(), "session log opened");
        Ok(CsvLogSink { writer, path, records_written: 0 })
    }

    /// Path of the log file for this session.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records appended so far.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }
}

impl RecordSink for CsvLogSink {
    fn name(&self) -> &str {
        "csv-log"
    }

    fn on_record(&mut self, record: &SensorRecord) -> Result<()> {
        self.writer
            .write_record([
                record.led_index.to_string(),
                record.sensors[0].to_string(),
                record.sensors[1].to_string(),
                record.sensors[2].to_string(),
                record.sensors[3].to_string(),
                record.timestamp.to_string(),
                record.interval_ms.to_string(),
            ])
            .map_err(|e| TelemetryError::sink(&self.path, e))?;

        self.writer.flush().map_err(|e| TelemetryError::sink(&self.path, e))?;
        self.records_written += 1;
        Ok(())
    }

    fn on_session_end(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| TelemetryError::sink(&self.path, e))?;
        debug!(
            path = %self.path.display(),
            records = self.records_written,
            "session log finalized"
        );
        Ok(())
    }
}
