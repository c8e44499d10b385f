//! Core types for telemetry data representation.
//!
//! - [`RawFrame`] is the decoded 21-byte wire frame
//! - [`SensorRecord`] is a frame annotated with the inferred sampling interval
//! - [`IntervalZoneEvent`] records a significant interval shift
//! - [`DeviceInfo`] describes a discoverable device

mod device;
mod frame;
mod zone;

pub use device::DeviceInfo;
pub use frame::{FRAME_SIZE, RawFrame, SensorRecord, TICK_MS};
pub use zone::IntervalZoneEvent;
