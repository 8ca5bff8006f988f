//! Sequence number handling
//!
//! Each dispatched physical packet carries a 16-bit sequence number that
//! wraps around. Ordering across the wrap boundary uses the half-range
//! rule: `a` is older than `b` iff the signed 16-bit difference
//! `(b - a) mod 2^16` is positive. This rule is part of the wire contract;
//! both peers must apply it identically.

use gamelink_core::{BitDecode, BitEncode, BitReader, BitWriter};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Bits a sequence number occupies on the wire
pub const SEQ_NUMBER_BITS: u32 = 16;

/// Sequence number with 16-bit wraparound semantics
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct SeqNumber(u16);

impl SeqNumber {
    /// Create a new sequence number
    #[inline]
    pub fn new(value: u16) -> Self {
        SeqNumber(value)
    }

    /// Get the raw sequence number value
    #[inline]
    pub fn as_raw(self) -> u16 {
        self.0
    }

    /// Increment the sequence number by 1
    #[inline]
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(1);
    }

    /// Get the next sequence number
    #[inline]
    pub fn next(self) -> Self {
        SeqNumber(self.0.wrapping_add(1))
    }

    /// Calculate the signed distance from this sequence number to another
    ///
    /// Positive values mean `other` is ahead of `self`, negative means
    /// `other` is behind, computed mod 2^16 (half-range comparison).
    #[inline]
    pub fn distance_to(self, other: SeqNumber) -> i32 {
        other.0.wrapping_sub(self.0) as i16 as i32
    }

    /// Check if this sequence number is older than another
    #[inline]
    pub fn lt(self, other: SeqNumber) -> bool {
        self.distance_to(other) > 0
    }

    /// Check if this sequence number is older than or equal to another
    #[inline]
    pub fn le(self, other: SeqNumber) -> bool {
        self == other || self.lt(other)
    }

    /// Check if this sequence number is newer than another
    #[inline]
    pub fn gt(self, other: SeqNumber) -> bool {
        self.distance_to(other) < 0
    }

    /// Check if this sequence number is newer than or equal to another
    #[inline]
    pub fn ge(self, other: SeqNumber) -> bool {
        self == other || self.gt(other)
    }
}

impl fmt::Debug for SeqNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeqNumber({})", self.0)
    }
}

impl fmt::Display for SeqNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for SeqNumber {
    fn from(value: u16) -> Self {
        SeqNumber(value)
    }
}

impl From<SeqNumber> for u16 {
    fn from(seq: SeqNumber) -> u16 {
        seq.0
    }
}

impl Add<u16> for SeqNumber {
    type Output = SeqNumber;

    fn add(self, rhs: u16) -> SeqNumber {
        SeqNumber(self.0.wrapping_add(rhs))
    }
}

impl AddAssign<u16> for SeqNumber {
    fn add_assign(&mut self, rhs: u16) {
        self.0 = self.0.wrapping_add(rhs);
    }
}

impl Sub<u16> for SeqNumber {
    type Output = SeqNumber;

    fn sub(self, rhs: u16) -> SeqNumber {
        SeqNumber(self.0.wrapping_sub(rhs))
    }
}

impl SubAssign<u16> for SeqNumber {
    fn sub_assign(&mut self, rhs: u16) {
        self.0 = self.0.wrapping_sub(rhs);
    }
}

impl Sub for SeqNumber {
    type Output = i32;

    /// Calculate the signed distance between two sequence numbers
    fn sub(self, rhs: SeqNumber) -> i32 {
        rhs.distance_to(self)
    }
}

impl BitEncode for SeqNumber {
    fn encode(&self, writer: &mut BitWriter) {
        writer.write_u16(self.0, SEQ_NUMBER_BITS);
    }
}

impl BitDecode for SeqNumber {
    fn decode(reader: &mut BitReader) -> Self {
        SeqNumber(reader.read_u16(SEQ_NUMBER_BITS))
    }
}
