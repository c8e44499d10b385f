//! Wire frame and decoded record types.
//!
//! The sensor device emits fixed-size 21-byte frames, little-endian:
//!
//! | offset | size | field      |
//! |--------|------|------------|
//! | 0      | 1    | led_index  |
//! | 1      | 4    | sensors[0] |
//! | 5      | 4    | sensors[1] |
//! | 9      | 4    | sensors[2] |
//! | 13     | 4    | sensors[3] |
//! | 17     | 4    | timestamp  |
//!
//! One timestamp tick equals [`TICK_MS`] milliseconds.

use serde::{Deserialize, Serialize};

use crate::{Result, TelemetryError};

/// Size of one wire frame in bytes.
pub const FRAME_SIZE: usize = 21;

/// Duration of one device timestamp tick in milliseconds.
///
/// Protocol constant, fixed by the device firmware.
pub const TICK_MS: u32 = 50;

/// One decoded wire frame, exactly as transmitted by the device.
///
/// Immutable once decoded. The interval annotation lives on
/// [`SensorRecord`], not here, because it is derived downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFrame {
    /// Control field: index of the LED currently lit on the device.
    pub led_index: u8,
    /// The four raw sensor channels.
    pub sensors: [i32; 4],
    /// Device timestamp in ticks, monotonically non-decreasing per session.
    pub timestamp: u32,
}

impl RawFrame {
    /// Decode one frame from exactly [`FRAME_SIZE`] little-endian bytes.
    ///
    /// # Errors
    ///
    /// Returns a framing error if the slice is not exactly one frame long.
    /// With a correctly framed reassembler upstream this cannot happen; the
    /// check guards against impossible buffer states rather than bad input.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != FRAME_SIZE {
            return Err(TelemetryError::framing(format!(
                "frame must be {FRAME_SIZE} bytes, got {}",
                bytes.len()
            )));
        }

        let led_index = bytes[0];
        let mut sensors = [0i32; 4];
        for (i, sensor) in sensors.iter_mut().enumerate() {
            let offset = 1 + i * 4;
            *sensor = i32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ]);
        }
        let timestamp = u32::from_le_bytes([bytes[17], bytes[18], bytes[19], bytes[20]]);

        Ok(RawFrame { led_index, sensors, timestamp })
    }

    /// Encode this frame back to its 21-byte wire representation.
    pub fn encode(&self) -> [u8; FRAME_SIZE] {
        let mut out = [0u8; FRAME_SIZE];
        out[0] = self.led_index;
        for (i, sensor) in self.sensors.iter().enumerate() {
            let offset = 1 + i * 4;
            out[offset..offset + 4].copy_from_slice(&sensor.to_le_bytes());
        }
        out[17..21].copy_from_slice(&self.timestamp.to_le_bytes());
        out
    }
}

/// One decoded frame annotated with the sampling interval inferred at the
/// time it was broadcast.
///
/// Created exactly once per wire frame, in strict arrival order, and never
/// mutated afterwards. Ownership passes to whichever sink stores it; the
/// broadcaster does not retain records after delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorRecord {
    /// Control field: index of the LED currently lit on the device.
    pub led_index: u8,
    /// The four raw sensor channels.
    pub sensors: [i32; 4],
    /// Device timestamp in ticks.
    pub timestamp: u32,
    /// Sampling interval in effect when this record was broadcast, in
    /// milliseconds. Zero until the detector has inferred a value.
    pub interval_ms: u32,
}

impl SensorRecord {
    /// Annotate a raw frame with the currently inferred interval.
    pub fn annotated(frame: RawFrame, interval_ms: u32) -> Self {
        SensorRecord {
            led_index: frame.led_index,
            sensors: frame.sensors,
            timestamp: frame.timestamp,
            interval_ms,
        }
    }
}
