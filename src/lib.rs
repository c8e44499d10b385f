//! Async pipeline for fixed-frame sensor telemetry over unreliable chunked
//! transports.
//!
//! Lumitel reconstructs discrete sensor readings from a byte stream whose
//! delivery boundaries bear no relation to frame boundaries (a BLE-style
//! notification channel), infers the sampling interval actually in effect
//! from a control field embedded in the readings, and fans each record out
//! to independently-paced consumers: a durable per-session CSV log, a
//! rolling window for visualization, and a latest-record snapshot.
//!
//! # Features
//!
//! - **Chunk-boundary independence**: any split of the byte stream decodes
//!   to the same record sequence
//! - **Interval inference**: discrete zone-change events derived from LED
//!   transitions, with a bounded history
//! - **Isolated fan-out**: a broken consumer never stalls ingestion or
//!   starves the durable log
//! - **Transport seam**: the same pipeline runs against a real radio, a
//!   capture replay, or a scripted test transport
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use lumitel::{ConnectTarget, PipelineConfig, TelemetryService};
//! use lumitel::transports::ReplayTransport;
//!
//! #[tokio::main]
//! async fn main() -> lumitel::Result<()> {
//!     let transport = ReplayTransport::open("capture.bin")?;
//!     let service = TelemetryService::new(transport, PipelineConfig::default());
//!
//!     service.connect(ConnectTarget::Auto)?;
//!
//!     // Poll snapshots at the caller's own pace.
//!     loop {
//!         tokio::time::sleep(std::time::Duration::from_secs(1)).await;
//!         if service.take_new_data() {
//!             println!("status: {}", service.status());
//!             println!("window: {} records", service.window_snapshot().len());
//!             println!("interval: {} ms", service.interval_info().current_interval_ms);
//!         }
//!     }
//! }
//! ```

// Core types and error handling
mod config;
mod error;
pub mod types;

// Pipeline stages
pub mod broadcast;
pub mod interval;
pub mod reassembler;
pub mod session;
pub mod sinks;

// Orchestration and transport seam
mod driver;
pub mod service;
pub mod transport;
pub mod transports;

// Core exports
pub use config::PipelineConfig;
pub use error::{Result, TelemetryError};
pub use types::{DeviceInfo, FRAME_SIZE, IntervalZoneEvent, RawFrame, SensorRecord, TICK_MS};

// Pipeline exports
pub use broadcast::{RecordBroadcaster, RecordSink};
pub use interval::{IntervalDetector, IntervalSnapshot, ZONE_CAPACITY, ZONE_THRESHOLD_MS};
pub use reassembler::{FrameDrain, FrameReassembler};
pub use session::{ConnectionSession, IngestReport, SessionStatus};
pub use sinks::{
    ChannelStats, CsvLogSink, RollingWindowStore, SharedWindow, WindowSink, WindowSummary,
};

// Orchestration exports
pub use service::{ConnectTarget, TelemetryService};
pub use transport::{Transport, TransportLink};
