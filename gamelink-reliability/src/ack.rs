//! Run-length-encoded acknowledgment ranges
//!
//! Consecutive acknowledged sequence numbers are merged into one
//! `[start, start + count)` range. On the wire a range costs 17 bits when
//! it covers a single number (16-bit start plus a cleared has-count flag)
//! and 33 bits otherwise (the count is transmitted minus one).

use crate::sequence::SeqNumber;
use gamelink_core::{BitDecode, BitEncode, BitReader, BitWriter};

/// Maximal contiguous run of acknowledged sequence numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AckRange {
    start: SeqNumber,
    count: u16,
}

impl AckRange {
    /// Start a new single-element range
    pub fn new(start: SeqNumber) -> Self {
        AckRange { start, count: 1 }
    }

    /// Extend the range if `seq` is exactly the next number in sequence
    ///
    /// Returns false when `seq` is not contiguous or the count is already
    /// at its transmissible maximum; the caller then starts a new range.
    pub fn maybe_push_back(&mut self, seq: SeqNumber) -> bool {
        if self.count == u16::MAX {
            return false;
        }

        if seq == self.start + self.count {
            self.count += 1;
            true
        } else {
            false
        }
    }

    /// First sequence number in the range
    #[inline]
    pub fn start(&self) -> SeqNumber {
        self.start
    }

    /// Number of sequence numbers covered
    #[inline]
    pub fn count(&self) -> u16 {
        self.count
    }

    /// Whether the range covers a single sequence number
    #[inline]
    pub fn is_single(&self) -> bool {
        self.count == 1
    }

    /// Wraparound-aware membership test
    ///
    /// Offset is computed modulo 2^16 rather than via half-range signed
    /// distance: a range may legitimately cover more than half the
    /// sequence space, so members far past `start` must still count.
    pub fn contains(&self, seq: SeqNumber) -> bool {
        let offset = seq.as_raw().wrapping_sub(self.start.as_raw()) as u32;
        offset < self.count as u32
    }
}

impl BitEncode for AckRange {
    fn encode(&self, writer: &mut BitWriter) {
        writer.write(&self.start);
        let has_count = self.count > 1;
        writer.write_bool(has_count);
        if has_count {
            writer.write_u16(self.count - 1, 16);
        }
    }
}

impl BitDecode for AckRange {
    fn decode(reader: &mut BitReader) -> Self {
        let start = reader.read();
        let count = if reader.read_bool() {
            // Transmitted minus one.
            reader.read_u16(16).saturating_add(1)
        } else {
            1
        };

        AckRange { start, count }
    }
}
