//! Bounded rolling window of recent records plus summary statistics.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Result;
use crate::broadcast::RecordSink;
use crate::types::SensorRecord;

/// Bounded FIFO buffer of the most recent records.
///
/// Written by the single ingestion path, read by polling callers; share it
/// behind [`SharedWindow`] so readers never observe a half-updated record.
/// Unlike session-scoped state, the window persists across sessions until
/// explicitly cleared.
#[derive(Debug)]
pub struct RollingWindowStore {
    records: VecDeque<SensorRecord>,
    capacity: usize,
    new_data: bool,
}

/// Thread-safe handle to a [`RollingWindowStore`].
pub type SharedWindow = Arc<Mutex<RollingWindowStore>>;

/// Per-channel statistics over the current window contents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    /// Smallest value seen in the window.
    pub min: i32,
    /// Largest value seen in the window.
    pub max: i32,
    /// Arithmetic mean over the window.
    pub mean: f64,
}

/// Summary of the current window contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSummary {
    /// Number of records currently held.
    pub total_points: usize,
    /// Smallest and largest device timestamp in the window, if non-empty.
    pub timestamp_range: Option<(u32, u32)>,
    /// Per-sensor-channel statistics, if non-empty.
    pub channels: Option<[ChannelStats; 4]>,
}

impl RollingWindowStore {
    /// Create a window holding at most `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        RollingWindowStore {
            records: VecDeque::with_capacity(capacity),
            capacity,
            new_data: false,
        }
    }

    /// Create a shared window handle.
    pub fn shared(capacity: usize) -> SharedWindow {
        Arc::new(Mutex::new(Self::with_capacity(capacity)))
    }

    /// Append a record, evicting the oldest when full.
    pub fn push(&mut self, record: SensorRecord) {
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
        self.new_data = true;
    }

    /// Copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<SensorRecord> {
        self.records.iter().copied().collect()
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the window holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Read and clear the "new data since last check" flag.
    pub fn take_new_data(&mut self) -> bool {
        std::mem::take(&mut self.new_data)
    }

    /// Drop all records. The new-data flag is left untouched.
    pub fn clear(&mut self) {
        debug!(dropped = self.records.len(), "rolling window cleared");
        self.records.clear();
    }

    /// Summary statistics over the current contents.
    pub fn summary(&self) -> WindowSummary {
        if self.records.is_empty() {
            return WindowSummary { total_points: 0, timestamp_range: None, channels: None };
        }

        let mut ts_min = u32::MAX;
        let mut ts_max = u32::MIN;
        let mut mins = [i32::MAX; 4];
        let mut maxs = [i32::MIN; 4];
        let mut sums = [0i64; 4];

        for record in &self.records {
            ts_min = ts_min.min(record.timestamp);
            ts_max = ts_max.max(record.timestamp);
            for (i, value) in record.sensors.iter().enumerate() {
                mins[i] = mins[i].min(*value);
                maxs[i] = maxs[i].max(*value);
                sums[i] += i64::from(*value);
            }
        }

        let count = self.records.len();
        let channels = std::array::from_fn(|i| ChannelStats {
            min: mins[i],
            max: maxs[i],
            mean: sums[i] as f64 / count as f64,
        });

        WindowSummary {
            total_points: count,
            timestamp_range: Some((ts_min, ts_max)),
            channels: Some(channels),
        }
    }
}

/// Broadcaster sink feeding a shared rolling window.
pub struct WindowSink {
    window: SharedWindow,
}

impl WindowSink {
    /// Create a sink writing into the given shared window.
    pub fn new(window: SharedWindow) -> Self {
        WindowSink { window }
    }
}

impl RecordSink for WindowSink {
    fn name(&self) -> &str {
        "rolling-window"
    }

    fn on_record(&mut self, record: &SensorRecord) -> Result<()> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner).push(*record);
        Ok(())
    }
}
