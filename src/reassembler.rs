//! Byte-stream reassembly into fixed-size frames.
//!
//! The transport delivers chunks whose boundaries bear no relation to frame
//! boundaries: a single notification may carry half a frame, three frames,
//! or one byte. [`FrameReassembler`] accumulates chunks and yields a decoded
//! [`RawFrame`] for every complete 21-byte run, keeping the remainder
//! buffered for the next call.
//!
//! Reassembly is chunk-boundary independent: feeding a byte sequence in any
//! partition of non-empty chunks produces the same frame sequence as feeding
//! it whole.

use tracing::trace;

use crate::types::{FRAME_SIZE, RawFrame};
use crate::{Result, TelemetryError};

/// Stateful accumulator turning arbitrary byte chunks into decoded frames.
///
/// Owned exclusively by one ingestion path; never shared across writers.
///
/// ```rust
/// use lumitel::{FrameReassembler, RawFrame};
///
/// let mut reassembler = FrameReassembler::new(4096);
/// let frame = RawFrame { led_index: 0, sensors: [1, 2, 3, 4], timestamp: 100 };
/// let bytes = frame.encode();
///
/// // Feed the first half, then the rest; one frame comes out.
/// assert_eq!(reassembler.feed(&bytes[..10]).unwrap().count(), 0);
/// let frames: Vec<_> = reassembler.feed(&bytes[10..]).unwrap().collect();
/// assert_eq!(frames.len(), 1);
/// ```
#[derive(Debug)]
pub struct FrameReassembler {
    buf: Vec<u8>,
    max_buffered: usize,
}

impl FrameReassembler {
    /// Create a reassembler that tolerates at most `max_buffered` bytes of
    /// backlog (buffered residue plus the incoming chunk).
    pub fn new(max_buffered: usize) -> Self {
        FrameReassembler { buf: Vec::with_capacity(FRAME_SIZE * 4), max_buffered }
    }

    /// Append a chunk and drain every frame it completes.
    ///
    /// The returned iterator yields one [`RawFrame`] per complete frame in
    /// buffer order; bytes beyond the last complete frame stay buffered.
    /// Dropping the iterator early leaves the undrained frames buffered for
    /// the next call; no byte is ever lost or duplicated.
    ///
    /// # Errors
    ///
    /// Returns a framing error if accepting the chunk would push the backlog
    /// past the configured cap. The buffer is left untouched in that case;
    /// the session owning this reassembler is expected to terminate.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<FrameDrain<'_>> {
        if self.buf.len() + chunk.len() > self.max_buffered {
            return Err(TelemetryError::framing(format!(
                "reassembly backlog would exceed {} bytes ({} buffered + {} incoming)",
                self.max_buffered,
                self.buf.len(),
                chunk.len()
            )));
        }

        self.buf.extend_from_slice(chunk);
        trace!(chunk_len = chunk.len(), buffered = self.buf.len(), "chunk accepted");

        Ok(FrameDrain { reassembler: self, head: 0 })
    }

    /// Number of bytes currently awaiting a complete frame.
    ///
    /// Always less than [`FRAME_SIZE`] immediately after a full drain.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Discard any buffered residue. Invoked at session start so no byte
    /// from a prior session leaks into a new one.
    pub fn reset(&mut self) {
        self.buf.clear();
    }
}

/// Draining iterator over the frames completed by one [`FrameReassembler::feed`] call.
///
/// Consumed bytes are removed from the buffer in a single compaction when
/// the iterator drops, so a feed call costs O(buffered + chunk) regardless
/// of how many frames it completes.
#[derive(Debug)]
pub struct FrameDrain<'a> {
    reassembler: &'a mut FrameReassembler,
    head: usize,
}

impl Iterator for FrameDrain<'_> {
    type Item = Result<RawFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        let buf = &self.reassembler.buf;
        if buf.len() - self.head < FRAME_SIZE {
            return None;
        }

        let frame = RawFrame::decode(&buf[self.head..self.head + FRAME_SIZE]);
        self.head += FRAME_SIZE;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.reassembler.buf.len() - self.head) / FRAME_SIZE;
        (remaining, Some(remaining))
    }
}

impl Drop for FrameDrain<'_> {
    fn drop(&mut self) {
        if self.head > 0 {
            self.reassembler.buf.drain(..self.head);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn frame_bytes(led_index: u8, timestamp: u32) -> [u8; FRAME_SIZE] {
        RawFrame { led_index, sensors: [1, 2, 3, 4], timestamp }.encode()
    }

    #[test]
    fn whole_frame_in_one_chunk() {
        let mut reassembler = FrameReassembler::new(4096);
        let frames: Vec<_> = reassembler
            .feed(&frame_bytes(2, 77))
            .expect("under cap")
            .collect::<Result<_>>()
            .expect("decodes");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].led_index, 2);
        assert_eq!(frames[0].timestamp, 77);
        assert_eq!(reassembler.buffered(), 0);
    }

    #[test]
    fn partial_frames_stay_buffered() {
        let mut reassembler = FrameReassembler::new(4096);
        let bytes = frame_bytes(0, 5);

        assert_eq!(reassembler.feed(&bytes[..FRAME_SIZE - 1]).unwrap().count(), 0);
        assert_eq!(reassembler.buffered(), FRAME_SIZE - 1);

        let frames: Vec<_> = reassembler.feed(&bytes[FRAME_SIZE - 1..]).unwrap().collect();
        assert_eq!(frames.len(), 1);
        assert_eq!(reassembler.buffered(), 0);
    }

    #[test]
    fn multiple_frames_per_chunk_in_order() {
        let mut reassembler = FrameReassembler::new(4096);
        let mut stream = Vec::new();
        for ts in [10u32, 20, 30] {
            stream.extend_from_slice(&frame_bytes(1, ts));
        }
        // Trailing partial frame.
        stream.extend_from_slice(&frame_bytes(9, 40)[..7]);

        let frames: Vec<_> = reassembler
            .feed(&stream)
            .unwrap()
            .collect::<Result<_>>()
            .expect("all decode");

        let timestamps: Vec<u32> = frames.iter().map(|f| f.timestamp).collect();
        assert_eq!(timestamps, vec![10, 20, 30]);
        assert_eq!(reassembler.buffered(), 7);
    }

    #[test]
    fn dropped_drain_keeps_undrained_frames() {
        let mut reassembler = FrameReassembler::new(4096);
        let mut stream = Vec::new();
        stream.extend_from_slice(&frame_bytes(0, 1));
        stream.extend_from_slice(&frame_bytes(0, 2));

        {
            let mut drain = reassembler.feed(&stream).unwrap();
            let first = drain.next().unwrap().unwrap();
            assert_eq!(first.timestamp, 1);
            // Second frame deliberately not consumed.
        }

        let frames: Vec<_> = reassembler.feed(&[]).unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].timestamp, 2);
    }

    #[test]
    fn backlog_cap_is_enforced() {
        let mut reassembler = FrameReassembler::new(FRAME_SIZE);
        // One partial frame fits under the cap.
        assert!(reassembler.feed(&[0u8; FRAME_SIZE - 1]).is_ok());

        // Two more bytes would cross it.
        let err = reassembler.feed(&[0u8; 2]).unwrap_err();
        assert!(matches!(err, TelemetryError::Framing { .. }));

        // Rejected chunk must not have been absorbed.
        assert_eq!(reassembler.buffered(), FRAME_SIZE - 1);
    }

    #[test]
    fn reset_discards_residue() {
        let mut reassembler = FrameReassembler::new(4096);
        reassembler.feed(&[1, 2, 3]).unwrap().count();
        assert_eq!(reassembler.buffered(), 3);

        reassembler.reset();
        assert_eq!(reassembler.buffered(), 0);
    }

    proptest! {
        /// Chunk-boundary independence: any partition of a frame stream into
        /// non-empty chunks decodes to the same record sequence as the
        /// unsplit stream.
        #[test]
        fn chunking_does_not_change_decoded_sequence(
            timestamps in prop::collection::vec(any::<u32>(), 1..20),
            split_points in prop::collection::vec(any::<proptest::sample::Index>(), 0..8),
        ) {
            let mut stream = Vec::new();
            for (i, ts) in timestamps.iter().enumerate() {
                stream.extend_from_slice(&frame_bytes((i % 4) as u8, *ts));
            }

            // Reference: feed everything at once.
            let mut whole = FrameReassembler::new(1 << 20);
            let expected: Vec<RawFrame> =
                whole.feed(&stream).unwrap().collect::<Result<_>>().unwrap();

            // Candidate: feed in arbitrary pieces.
            let mut cuts: Vec<usize> =
                split_points.iter().map(|ix| ix.index(stream.len())).collect();
            cuts.push(0);
            cuts.push(stream.len());
            cuts.sort_unstable();
            cuts.dedup();

            let mut chunked = FrameReassembler::new(1 << 20);
            let mut got = Vec::new();
            for pair in cuts.windows(2) {
                let chunk = &stream[pair[0]..pair[1]];
                for frame in chunked.feed(chunk).unwrap() {
                    got.push(frame.unwrap());
                }
            }

            prop_assert_eq!(got, expected);
            prop_assert_eq!(chunked.buffered(), 0);
        }

        /// No byte is dropped or duplicated: total bytes in equals frames
        /// out times frame size plus the buffered remainder.
        #[test]
        fn byte_accounting_is_exact(chunks in prop::collection::vec(
            prop::collection::vec(any::<u8>(), 1..64), 1..16)
        ) {
            let mut reassembler = FrameReassembler::new(1 << 20);
            let mut fed = 0usize;
            let mut decoded = 0usize;
            for chunk in &chunks {
                fed += chunk.len();
                decoded += reassembler.feed(chunk).unwrap().count();
            }

            prop_assert_eq!(decoded * FRAME_SIZE + reassembler.buffered(), fed);
            prop_assert!(reassembler.buffered() < FRAME_SIZE);
        }
    }
}
