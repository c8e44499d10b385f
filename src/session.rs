//! Per-connection pipeline state.
//!
//! A [`ConnectionSession`] bounds the lifetime of all reassembly and
//! inference state: it is constructed when a connection becomes active and
//! discarded when the connection ends, so no byte or record from a prior
//! session can leak into a new one.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::Result;
use crate::broadcast::RecordBroadcaster;
use crate::config::PipelineConfig;
use crate::interval::{IntervalDetector, IntervalSnapshot};
use crate::reassembler::FrameReassembler;
use crate::types::SensorRecord;

/// Connection lifecycle status surfaced to polling callers.
///
/// `Display` renders the human-readable status string shown by front ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// No session; the pipeline accepts scan and connect requests.
    Idle,
    /// A discovery pass is running.
    Scanning,
    /// A connect request is being established.
    Connecting {
        /// Address being connected to, or the target name during auto-connect.
        target: String,
    },
    /// A session is streaming; only a disconnect request is accepted.
    Active {
        /// Address of the connected device.
        address: String,
    },
    /// The session is tearing down (flushing sinks, dropping the link).
    Disconnecting,
    /// The last session or request ended with an error. Terminal like
    /// `Idle`: new requests are accepted.
    Failed {
        /// Human-readable failure reason.
        reason: String,
    },
}

impl SessionStatus {
    /// Whether a session currently owns the transport (connecting, active,
    /// or tearing down).
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SessionStatus::Connecting { .. }
                | SessionStatus::Active { .. }
                | SessionStatus::Disconnecting
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Idle => write!(f, "disconnected"),
            SessionStatus::Scanning => write!(f, "scanning for devices"),
            SessionStatus::Connecting { target } => write!(f, "connecting to {target}"),
            SessionStatus::Active { address } => write!(f, "connected to {address}"),
            SessionStatus::Disconnecting => write!(f, "disconnecting"),
            SessionStatus::Failed { reason } => write!(f, "connection failed: {reason}"),
        }
    }
}

/// What one ingested chunk produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Records decoded and broadcast by this chunk.
    pub records: usize,
    /// Whether any of those records crossed an interval zone boundary.
    pub zone_changed: bool,
}

/// One connection's reassembler, detector, and fan-out, wired together.
///
/// The contained state is owned exclusively by the ingestion path; polling
/// callers observe it through snapshots taken by the owner.
pub struct ConnectionSession {
    reassembler: FrameReassembler,
    detector: IntervalDetector,
    broadcaster: RecordBroadcaster,
    records_total: u64,
}

impl ConnectionSession {
    /// Assemble a fresh session around an already-populated broadcaster.
    ///
    /// Reassembler and detector start from their initial state, satisfying
    /// the session-start reset invariant by construction.
    pub fn new(config: &PipelineConfig, broadcaster: RecordBroadcaster) -> Self {
        ConnectionSession {
            reassembler: FrameReassembler::new(config.max_buffered_bytes),
            detector: IntervalDetector::new(),
            broadcaster,
            records_total: 0,
        }
    }

    /// Push one transport chunk through the pipeline.
    ///
    /// Every frame the chunk completes is decoded, observed by the interval
    /// detector, annotated with the inferred interval, and broadcast, in
    /// strict arrival order.
    ///
    /// # Errors
    ///
    /// Returns a framing error if the reassembly backlog cap is exceeded or
    /// an impossible buffer state is detected. Sink failures do not surface
    /// here; the broadcaster isolates them.
    pub fn ingest(&mut self, chunk: &[u8]) -> Result<IngestReport> {
        let ConnectionSession { reassembler, detector, broadcaster, records_total } = self;

        let mut report = IngestReport::default();
        for frame in reassembler.feed(chunk)? {
            let frame = frame?;
            if detector.observe(&frame).is_some() {
                report.zone_changed = true;
            }
            let record = SensorRecord::annotated(frame, detector.current_interval_ms());
            broadcaster.publish(&record);
            report.records += 1;
            *records_total += 1;
        }
        Ok(report)
    }

    /// Snapshot of the interval detector for polling callers.
    pub fn interval_snapshot(&self) -> IntervalSnapshot {
        self.detector.snapshot()
    }

    /// Records broadcast over the whole session so far.
    pub fn records_total(&self) -> u64 {
        self.records_total
    }

    /// Finalize every sink. Called exactly once at session end.
    pub fn finish(&mut self) {
        info!(records = self.records_total, "session finished");
        self.broadcaster.finish();
    }
}
