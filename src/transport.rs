//! Transport seam for byte-chunk delivery.
//!
//! The physical wireless stack stays outside this crate. The pipeline only
//! needs three things from it: device discovery, a connect operation, and a
//! stream of raw byte chunks with an orderly end. Chunks carry no alignment
//! guarantee relative to frame boundaries and no maximum size.
//!
//! The same ingestion logic therefore runs unchanged against a real radio,
//! a capture replay ([`crate::transports::ReplayTransport`]), or a scripted
//! transport in tests.

use crate::Result;
use crate::types::DeviceInfo;

/// A source of connectable telemetry devices.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// The connected-link type this transport produces.
    type Link: TransportLink;

    /// Discover advertising devices.
    ///
    /// Pure with respect to the pipeline: scanning has no effect on any
    /// active session.
    async fn discover(&self) -> Result<Vec<DeviceInfo>>;

    /// Connect to a device by address and subscribe to its notification
    /// stream.
    async fn connect(&self, address: &str) -> Result<Self::Link>;
}

/// One established connection delivering raw byte chunks.
#[async_trait::async_trait]
pub trait TransportLink: Send + 'static {
    /// Wait for the next chunk.
    ///
    /// Returns:
    /// - `Ok(Some(chunk))` - bytes arrived (any length, any alignment)
    /// - `Ok(None)` - the remote side closed the stream (normal termination)
    /// - `Err(e)` - transport failure; the session terminates
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>>;

    /// Tear the connection down. Idempotent; called once at session end.
    async fn disconnect(&mut self) -> Result<()>;
}
