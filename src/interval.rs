//! Sampling-interval inference from control-field transitions.
//!
//! The device does not report its sampling interval directly. It does,
//! however, advance an LED index every time it moves to the next sampling
//! slot, so the interval actually in effect can be inferred from the tick
//! distance between consecutive LED transitions. A shift larger than
//! [`ZONE_THRESHOLD_MS`] is recorded as a discrete zone change.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{IntervalZoneEvent, RawFrame, TICK_MS};

/// Minimum interval shift, in milliseconds, that counts as a zone change.
///
/// Protocol constant, fixed alongside [`TICK_MS`].
pub const ZONE_THRESHOLD_MS: u32 = 100;

/// Number of zone-change events retained, oldest evicted first.
pub const ZONE_CAPACITY: usize = 20;

/// Stateful detector inferring the current sampling interval.
///
/// Observes decoded frames in strict arrival order; given the same frame
/// sequence it always produces the same interval and the same zone history.
/// Owned exclusively by one ingestion path.
#[derive(Debug, Default)]
pub struct IntervalDetector {
    last_led_index: Option<u8>,
    last_change_timestamp: Option<u32>,
    current_interval_ms: u32,
    zones: VecDeque<IntervalZoneEvent>,
}

/// Read-only copy of the detector state for polling callers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntervalSnapshot {
    /// Most recently inferred sampling interval in milliseconds.
    pub current_interval_ms: u32,
    /// Recent zone changes, oldest first.
    pub zones: Vec<IntervalZoneEvent>,
}

impl IntervalDetector {
    /// Create a detector in its initial state (interval 0, empty history).
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe the next frame in arrival order.
    ///
    /// Returns the zone event if this frame's control-field transition
    /// crossed the significance threshold. The caller is expected to
    /// annotate the frame with [`current_interval_ms`](Self::current_interval_ms)
    /// *after* this call, so a record that triggers a change carries the new
    /// interval.
    pub fn observe(&mut self, frame: &RawFrame) -> Option<IntervalZoneEvent> {
        let (Some(last_led), Some(last_change)) =
            (self.last_led_index, self.last_change_timestamp)
        else {
            // First reading of the session: arm the references only.
            self.last_led_index = Some(frame.led_index);
            self.last_change_timestamp = Some(frame.timestamp);
            return None;
        };

        if frame.led_index == last_led {
            return None;
        }

        // A timestamp behind the last transition means the device restarted
        // mid-session. Re-arm on the new timeline instead of computing a
        // bogus delta.
        if frame.timestamp < last_change {
            warn!(
                timestamp = frame.timestamp,
                last_change, "timestamp regression, re-arming interval detection"
            );
            self.last_led_index = Some(frame.led_index);
            self.last_change_timestamp = Some(frame.timestamp);
            return None;
        }

        let delta = frame.timestamp - last_change;
        // A delta near u32::MAX would overflow the millisecond conversion;
        // saturate rather than panic on a corrupt timeline.
        let candidate_ms = delta.saturating_mul(TICK_MS);

        let event = if candidate_ms.abs_diff(self.current_interval_ms) > ZONE_THRESHOLD_MS {
            let event = IntervalZoneEvent {
                timestamp: frame.timestamp,
                old_interval_ms: self.current_interval_ms,
                new_interval_ms: candidate_ms,
                timestamp_delta: delta,
            };

            debug!(
                timestamp = event.timestamp,
                old_ms = event.old_interval_ms,
                new_ms = event.new_interval_ms,
                delta = event.timestamp_delta,
                "interval zone change"
            );

            if self.zones.len() == ZONE_CAPACITY {
                self.zones.pop_front();
            }
            self.zones.push_back(event);
            self.current_interval_ms = candidate_ms;
            Some(event)
        } else {
            None
        };

        self.last_led_index = Some(frame.led_index);
        self.last_change_timestamp = Some(frame.timestamp);
        event
    }

    /// Most recently inferred sampling interval in milliseconds.
    ///
    /// Zero until the first significant transition has been observed.
    pub fn current_interval_ms(&self) -> u32 {
        self.current_interval_ms
    }

    /// Copy of the current state for the polling surface.
    pub fn snapshot(&self) -> IntervalSnapshot {
        IntervalSnapshot {
            current_interval_ms: self.current_interval_ms,
            zones: self.zones.iter().copied().collect(),
        }
    }

    /// Restore the initial state. Invoked at session start.
    pub fn reset(&mut self) {
        self.last_led_index = None;
        self.last_change_timestamp = None;
        self.current_interval_ms = 0;
        self.zones.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn frame(led_index: u8, timestamp: u32) -> RawFrame {
        RawFrame { led_index, sensors: [0; 4], timestamp }
    }

    #[test]
    fn first_reading_only_arms_references() {
        let mut detector = IntervalDetector::new();
        assert!(detector.observe(&frame(0, 100)).is_none());
        assert_eq!(detector.current_interval_ms(), 0);
        assert!(detector.snapshot().zones.is_empty());
    }

    #[test]
    fn unchanged_led_index_is_not_a_transition() {
        let mut detector = IntervalDetector::new();
        detector.observe(&frame(0, 100));
        assert!(detector.observe(&frame(0, 150)).is_none());
        assert!(detector.observe(&frame(0, 5000)).is_none());
        assert_eq!(detector.current_interval_ms(), 0);
    }

    #[test]
    fn significant_transition_records_zone_event() {
        let mut detector = IntervalDetector::new();
        detector.observe(&frame(0, 100));
        detector.observe(&frame(0, 150));

        let event = detector.observe(&frame(1, 400)).expect("significant change");
        assert_eq!(event.timestamp, 400);
        assert_eq!(event.old_interval_ms, 0);
        assert_eq!(event.new_interval_ms, 15_000);
        assert_eq!(event.timestamp_delta, 300);
        assert_eq!(detector.current_interval_ms(), 15_000);
    }

    #[test]
    fn sub_threshold_shift_updates_nothing() {
        let mut detector = IntervalDetector::new();
        detector.observe(&frame(0, 0));
        detector.observe(&frame(1, 100)); // 100 ticks -> 5000 ms, recorded

        // Next transition implies 5100 ms: |5100 - 5000| = 100, not > 100.
        detector.observe(&frame(2, 202));
        assert_eq!(detector.current_interval_ms(), 5_000);
        assert_eq!(detector.snapshot().zones.len(), 1);
    }

    #[test]
    fn references_update_even_without_zone_change() {
        let mut detector = IntervalDetector::new();
        detector.observe(&frame(0, 0));
        detector.observe(&frame(1, 100)); // 5000 ms
        detector.observe(&frame(2, 201)); // 5050 ms, below threshold

        // Delta must be measured from timestamp 201, not 100.
        let event = detector.observe(&frame(3, 901)).expect("700 ticks -> 35000 ms");
        assert_eq!(event.timestamp_delta, 700);
        assert_eq!(event.old_interval_ms, 5_000);
    }

    #[test]
    fn zone_history_is_fifo_bounded() {
        let mut detector = IntervalDetector::new();
        detector.observe(&frame(0, 0));

        // Alternate LED index with growing deltas so every transition is
        // significant; insert ZONE_CAPACITY + 1 events.
        let mut ts = 0u32;
        for i in 0..(ZONE_CAPACITY as u32 + 1) {
            ts += 100 + i * 10;
            detector.observe(&frame((i % 2 + 1) as u8, ts));
        }

        let zones = detector.snapshot().zones;
        assert_eq!(zones.len(), ZONE_CAPACITY);
        // Entry #1 is gone; the second insertion is now the oldest.
        assert_eq!(zones[0].timestamp_delta, 110);
        assert_eq!(zones.last().unwrap().timestamp_delta, 100 + ZONE_CAPACITY as u32 * 10);
    }

    #[test]
    fn reset_matches_fresh_instance() {
        let mut detector = IntervalDetector::new();
        detector.observe(&frame(0, 100));
        detector.observe(&frame(1, 400));
        assert_ne!(detector.current_interval_ms(), 0);

        detector.reset();

        // Indistinguishable from fresh by subsequent observation: the next
        // reading arms references instead of computing a delta.
        let mut fresh = IntervalDetector::new();
        for f in [frame(2, 1000), frame(3, 1300)] {
            assert_eq!(detector.observe(&f), fresh.observe(&f));
        }
        assert_eq!(detector.current_interval_ms(), fresh.current_interval_ms());
        assert_eq!(detector.snapshot().zones, fresh.snapshot().zones);
    }

    #[test]
    fn timestamp_regression_rearms_without_event() {
        let mut detector = IntervalDetector::new();
        detector.observe(&frame(0, 1000));
        detector.observe(&frame(1, 1300)); // 15000 ms

        // Device restart: timestamp goes backwards on a transition.
        assert!(detector.observe(&frame(2, 40)).is_none());
        assert_eq!(detector.current_interval_ms(), 15_000);

        // Detection resumes on the new timeline.
        let event = detector.observe(&frame(3, 140)).expect("100 ticks -> 5000 ms");
        assert_eq!(event.timestamp_delta, 100);
    }

    proptest! {
        /// Determinism: identical input sequences produce identical interval
        /// values and zone histories.
        #[test]
        fn observation_is_deterministic(
            readings in prop::collection::vec((any::<u8>(), 0u32..1_000_000), 0..64)
        ) {
            let mut a = IntervalDetector::new();
            let mut b = IntervalDetector::new();

            for (led, ts) in &readings {
                let fa = frame(*led, *ts);
                prop_assert_eq!(a.observe(&fa), b.observe(&fa));
            }

            prop_assert_eq!(a.current_interval_ms(), b.current_interval_ms());
            prop_assert_eq!(a.snapshot().zones, b.snapshot().zones);
            prop_assert!(a.snapshot().zones.len() <= ZONE_CAPACITY);
        }
    }
}
