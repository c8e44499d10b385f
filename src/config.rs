//! Pipeline configuration.
//!
//! Protocol constants (frame size, tick duration, zone threshold, zone
//! history depth) are fixed by the device firmware and live as constants
//! next to the code that uses them. Everything an operator may reasonably
//! tune is collected here and can be loaded from a YAML file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Tunable pipeline settings.
///
/// Every field has a sensible default, so a partial YAML file (or none at
/// all) is fine:
///
/// ```rust
/// use lumitel::PipelineConfig;
///
/// let config = PipelineConfig::default();
/// assert_eq!(config.window_capacity, 100);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Advertised name to match when connecting without an explicit address.
    pub device_name: String,

    /// Upper bound on bytes buffered awaiting a complete frame. A transport
    /// that keeps delivering partial frames without ever completing one
    /// would otherwise grow the reassembly buffer without limit; crossing
    /// this cap is reported as a framing error and ends the session.
    pub max_buffered_bytes: usize,

    /// Capacity of the rolling window kept for near-real-time inspection.
    pub window_capacity: usize,

    /// Directory that receives one CSV log file per session.
    pub log_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            device_name: "ESP32-SENSOR-SERVER".to_string(),
            max_buffered_bytes: 4096,
            window_capacity: 100,
            log_dir: PathBuf::from("data"),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns a config error if the file cannot be read or parsed.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            crate::TelemetryError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&raw)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml_ng::from_str(yaml)?)
    }
}
