//! Replay transport for captured byte streams.
//!
//! Plays a raw capture file back through the pipeline in fixed-size chunks
//! with interval pacing. The chunk size is deliberately unrelated to the
//! frame size so replays exercise the same reassembly paths as a real
//! radio. Doubles as the hardware-free integration path.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior, interval};
use tracing::{debug, info, trace};

use crate::transport::{Transport, TransportLink};
use crate::types::DeviceInfo;
use crate::{Result, TelemetryError};

/// Transport that serves one capture file as a single discoverable device.
pub struct ReplayTransport {
    path: PathBuf,
    data: Arc<[u8]>,
    chunk_size: usize,
    pacing: Duration,
}

impl ReplayTransport {
    /// Default bytes per simulated notification.
    pub const DEFAULT_CHUNK_SIZE: usize = 17;

    /// Default delay between simulated notifications.
    pub const DEFAULT_PACING: Duration = Duration::from_millis(10);

    /// Load a capture file.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the file cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data = std::fs::read(&path).map_err(|e| {
            TelemetryError::transport_with_source(
                format!("cannot read capture {}", path.display()),
                Box::new(e),
            )
        })?;

        info!(path = %path.display(), bytes = data.len(), "capture loaded");
        Ok(ReplayTransport {
            path,
            data: data.into(),
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
            pacing: Self::DEFAULT_PACING,
        })
    }

    /// Build a replay transport straight from bytes (tests, in-memory captures).
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        ReplayTransport {
            path: PathBuf::from("<memory>"),
            data: data.into().into(),
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
            pacing: Self::DEFAULT_PACING,
        }
    }

    /// Override the bytes delivered per simulated notification.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Override the delay between simulated notifications.
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    fn device_name(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "capture".to_string())
    }
}

#[async_trait::async_trait]
impl Transport for ReplayTransport {
    type Link = ReplayLink;

    async fn discover(&self) -> Result<Vec<DeviceInfo>> {
        Ok(vec![DeviceInfo::new(self.device_name(), self.path.to_string_lossy())])
    }

    async fn connect(&self, address: &str) -> Result<Self::Link> {
        if address != self.path.to_string_lossy() {
            return Err(TelemetryError::transport(format!(
                "unknown device address '{address}'"
            )));
        }

        debug!(
            bytes = self.data.len(),
            chunk_size = self.chunk_size,
            "replay link established"
        );

        let mut pacer = interval(self.pacing);
        pacer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Ok(ReplayLink {
            data: Arc::clone(&self.data),
            position: 0,
            chunk_size: self.chunk_size,
            pacer,
        })
    }
}

/// A connected replay session serving chunks from the capture.
#[derive(Debug)]
pub struct ReplayLink {
    data: Arc<[u8]>,
    position: usize,
    chunk_size: usize,
    pacer: Interval,
}

#[async_trait::async_trait]
impl TransportLink for ReplayLink {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if self.position >= self.data.len() {
            debug!("capture exhausted");
            return Ok(None);
        }

        self.pacer.tick().await;

        let end = (self.position + self.chunk_size).min(self.data.len());
        let chunk = self.data[self.position..end].to_vec();
        trace!(offset = self.position, len = chunk.len(), "replay chunk");
        self.position = end;
        Ok(Some(chunk))
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.position = self.data.len();
        Ok(())
    }
}
