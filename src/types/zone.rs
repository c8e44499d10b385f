//! Interval zone-change events.

use serde::{Deserialize, Serialize};

/// A significant, sustained shift in the inferred sampling interval.
///
/// Produced by the interval detector when a control-field transition implies
/// an interval that differs from the current one by more than the
/// significance threshold. Stored in a bounded FIFO history, oldest evicted
/// first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalZoneEvent {
    /// Device timestamp (ticks) at which the transition was observed.
    pub timestamp: u32,
    /// Interval in effect before the change, in milliseconds.
    pub old_interval_ms: u32,
    /// Interval inferred by the change, in milliseconds.
    pub new_interval_ms: u32,
    /// Tick delta between the two control-field transitions.
    pub timestamp_delta: u32,
}
