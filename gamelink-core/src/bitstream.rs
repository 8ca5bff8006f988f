//! Bit-level serialization streams
//!
//! `BitWriter` and `BitReader` pack values of arbitrary bit widths into
//! byte buffers, least-significant-bit first within each byte. The packing
//! order is part of the wire contract: any two conforming implementations
//! must agree bit-for-bit.
//!
//! The writer grows by doubling its capacity; the reader is constructed
//! once over a fixed buffer (typically a received datagram) and never
//! grows. A read past the end of the buffer yields zero and clamps the
//! cursor to capacity, so a truncated or corrupt datagram degrades into
//! bounded garbage instead of out-of-bounds access.

use bytes::Bytes;

/// Default stream capacity in bytes, sized to one full datagram
pub const DEFAULT_STREAM_BYTES: u32 = 1200;

/// Types that serialize themselves into a bit stream
///
/// This is the composition seam for structured packets: an `encode` impl
/// recursively calls back into the writer with the core primitives.
/// Third-party types are covered by implementing the trait for them
/// directly from the consuming crate.
pub trait BitEncode {
    fn encode(&self, writer: &mut BitWriter);
}

/// Mirror of [`BitEncode`] for deserialization
///
/// Decoding cannot fail at this layer; truncated input produces zero
/// values (see module docs) and semantic validation belongs to the caller.
pub trait BitDecode: Sized {
    fn decode(reader: &mut BitReader) -> Self;
}

/// Bit-packing output stream
pub struct BitWriter {
    buf: Vec<u8>,
    bit_head: u32,
    bit_capacity: u32,
}

impl BitWriter {
    /// Create a writer with the default datagram-sized capacity
    pub fn new() -> Self {
        Self::with_bit_capacity(DEFAULT_STREAM_BYTES << 3)
    }

    /// Create a writer with an explicit initial bit capacity
    pub fn with_bit_capacity(bit_capacity: u32) -> Self {
        BitWriter {
            buf: vec![0u8; ((bit_capacity + 7) >> 3) as usize],
            bit_head: 0,
            bit_capacity,
        }
    }

    /// Write the low `bit_count` bits of `data`, 1 to 8 bits
    fn write_partial(&mut self, data: u8, bit_count: u32) {
        debug_assert!((1..=8).contains(&bit_count));

        let next_bit_head = self.bit_head + bit_count;
        if next_bit_head > self.bit_capacity {
            self.grow(next_bit_head.max(self.bit_capacity << 1));
        }

        let byte_offset = (self.bit_head >> 3) as usize;
        let bit_offset = self.bit_head & 0x7;

        // Trim input to exactly bit_count bits.
        let data = data & (((1u16 << bit_count) - 1) as u8);

        let bits_free_this_byte = 8 - bit_offset;
        let bits_this_byte = bit_count.min(bits_free_this_byte);

        let mask = (((1u16 << bits_this_byte) - 1) as u8) << bit_offset;
        self.buf[byte_offset] =
            (self.buf[byte_offset] & !mask) | ((data << bit_offset) & mask);

        // A write that straddles the byte boundary spills into the next byte.
        if bit_count > bits_free_this_byte {
            let remaining = bit_count - bits_free_this_byte;
            let mask_next = ((1u16 << remaining) - 1) as u8;
            self.buf[byte_offset + 1] = (self.buf[byte_offset + 1] & !mask_next)
                | ((data >> bits_free_this_byte) & mask_next);
        }

        self.bit_head = next_bit_head;
    }

    /// Write `bit_count` bits from `data`, low bytes first
    pub fn write_bits(&mut self, data: &[u8], mut bit_count: u32) {
        debug_assert!((data.len() as u32) << 3 >= bit_count);

        let mut index = 0;
        while bit_count > 8 {
            self.write_partial(data[index], 8);
            index += 1;
            bit_count -= 8;
        }
        if bit_count > 0 {
            self.write_partial(data[index], bit_count);
        }
    }

    /// Write whole bytes
    pub fn write_bytes(&mut self, data: &[u8]) {
        self.write_bits(data, (data.len() as u32) << 3);
    }

    /// Write a boolean as exactly one bit
    pub fn write_bool(&mut self, data: bool) {
        self.write_partial(data as u8, 1);
    }

    /// Write the low `bit_count` bits of a u8
    pub fn write_u8(&mut self, data: u8, bit_count: u32) {
        debug_assert!((1..=8).contains(&bit_count));
        self.write_partial(data, bit_count);
    }

    /// Write the low `bit_count` bits of a u16, low byte first
    pub fn write_u16(&mut self, data: u16, bit_count: u32) {
        debug_assert!((1..=16).contains(&bit_count));
        self.write_bits(&data.to_le_bytes(), bit_count);
    }

    /// Write the low `bit_count` bits of a u32, low byte first
    pub fn write_u32(&mut self, data: u32, bit_count: u32) {
        debug_assert!((1..=32).contains(&bit_count));
        self.write_bits(&data.to_le_bytes(), bit_count);
    }

    /// Write the low `bit_count` bits of a u64, low byte first
    pub fn write_u64(&mut self, data: u64, bit_count: u32) {
        debug_assert!((1..=64).contains(&bit_count));
        self.write_bits(&data.to_le_bytes(), bit_count);
    }

    /// Write a float as its raw 32-bit pattern (no range compression)
    pub fn write_f32(&mut self, data: f32) {
        self.write_u32(data.to_bits(), 32);
    }

    /// Write a double as its raw 64-bit pattern
    pub fn write_f64(&mut self, data: f64) {
        self.write_u64(data.to_bits(), 64);
    }

    /// Write a composite value through its [`BitEncode`] impl
    pub fn write<T: BitEncode>(&mut self, data: &T) {
        data.encode(self);
    }

    /// Bits written so far
    #[inline]
    pub fn bit_len(&self) -> u32 {
        self.bit_head
    }

    /// Bytes needed to hold the bits written so far
    #[inline]
    pub fn byte_len(&self) -> u32 {
        (self.bit_head + 7) >> 3
    }

    /// Current bit capacity
    #[inline]
    pub fn bit_capacity(&self) -> u32 {
        self.bit_capacity
    }

    /// The written prefix of the backing buffer
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.byte_len() as usize]
    }

    /// Snapshot the written prefix as an owned payload
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }

    fn grow(&mut self, new_bit_capacity: u32) {
        self.buf.resize(((new_bit_capacity + 7) >> 3) as usize, 0u8);
        self.bit_capacity = new_bit_capacity;
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Bit-unpacking input stream over a fixed buffer
pub struct BitReader {
    buf: Bytes,
    bit_head: u32,
    bit_capacity: u32,
}

impl BitReader {
    /// Create a reader over a received payload
    pub fn new(buf: Bytes) -> Self {
        let bit_capacity = (buf.len() as u32) << 3;
        BitReader {
            buf,
            bit_head: 0,
            bit_capacity,
        }
    }

    /// Create a reader over a copied slice
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    /// Read 1 to 8 bits into the low bits of the returned byte
    ///
    /// Reads past capacity yield zero and clamp the cursor; they never
    /// touch memory beyond the buffer.
    fn read_partial(&mut self, bit_count: u32) -> u8 {
        debug_assert!((1..=8).contains(&bit_count));

        let next_bit_head = self.bit_head + bit_count;
        if next_bit_head > self.bit_capacity {
            self.bit_head = self.bit_capacity;
            return 0;
        }

        let byte_offset = (self.bit_head >> 3) as usize;
        let bit_offset = self.bit_head & 0x7;

        let mut value = (self.buf[byte_offset] as u32) >> bit_offset;

        let bits_free_this_byte = 8 - bit_offset;
        if bit_count > bits_free_this_byte {
            value |= (self.buf[byte_offset + 1] as u32) << bits_free_this_byte;
        }

        let mask = if bit_count == 8 {
            0xFF
        } else {
            (1u32 << bit_count) - 1
        };

        self.bit_head = next_bit_head;
        (value & mask) as u8
    }

    /// Read `bit_count` bits into `out`, low bytes first
    pub fn read_bits(&mut self, out: &mut [u8], mut bit_count: u32) {
        debug_assert!((out.len() as u32) << 3 >= bit_count);

        let mut index = 0;
        while bit_count > 8 {
            out[index] = self.read_partial(8);
            index += 1;
            bit_count -= 8;
        }
        if bit_count > 0 {
            out[index] = self.read_partial(bit_count);
        }
    }

    /// Read whole bytes
    pub fn read_bytes(&mut self, out: &mut [u8]) {
        let bit_count = (out.len() as u32) << 3;
        self.read_bits(out, bit_count);
    }

    /// Read one bit as a boolean
    pub fn read_bool(&mut self) -> bool {
        self.read_partial(1) != 0
    }

    /// Read `bit_count` bits as a u8
    pub fn read_u8(&mut self, bit_count: u32) -> u8 {
        debug_assert!((1..=8).contains(&bit_count));
        self.read_partial(bit_count)
    }

    /// Read `bit_count` bits as a u16, low byte first
    pub fn read_u16(&mut self, bit_count: u32) -> u16 {
        debug_assert!((1..=16).contains(&bit_count));
        let mut bytes = [0u8; 2];
        self.read_bits(&mut bytes, bit_count);
        u16::from_le_bytes(bytes)
    }

    /// Read `bit_count` bits as a u32, low byte first
    pub fn read_u32(&mut self, bit_count: u32) -> u32 {
        debug_assert!((1..=32).contains(&bit_count));
        let mut bytes = [0u8; 4];
        self.read_bits(&mut bytes, bit_count);
        u32::from_le_bytes(bytes)
    }

    /// Read `bit_count` bits as a u64, low byte first
    pub fn read_u64(&mut self, bit_count: u32) -> u64 {
        debug_assert!((1..=64).contains(&bit_count));
        let mut bytes = [0u8; 8];
        self.read_bits(&mut bytes, bit_count);
        u64::from_le_bytes(bytes)
    }

    /// Read a float from its raw 32-bit pattern
    pub fn read_f32(&mut self) -> f32 {
        f32::from_bits(self.read_u32(32))
    }

    /// Read a double from its raw 64-bit pattern
    pub fn read_f64(&mut self) -> f64 {
        f64::from_bits(self.read_u64(64))
    }

    /// Read a composite value through its [`BitDecode`] impl
    pub fn read<T: BitDecode>(&mut self) -> T {
        T::decode(self)
    }

    /// Bits consumed so far
    #[inline]
    pub fn bit_len(&self) -> u32 {
        self.bit_head
    }

    /// Total bit capacity of the underlying buffer
    #[inline]
    pub fn bit_capacity(&self) -> u32 {
        self.bit_capacity
    }

    /// Bits left before the cursor saturates
    #[inline]
    pub fn remaining_bits(&self) -> u32 {
        self.bit_capacity - self.bit_head
    }
}

// Primitive impls so composites can be built from trait calls alone.

impl BitEncode for bool {
    fn encode(&self, writer: &mut BitWriter) {
        writer.write_bool(*self);
    }
}

impl BitDecode for bool {
    fn decode(reader: &mut BitReader) -> Self {
        reader.read_bool()
    }
}

macro_rules! impl_bit_codec_int {
    ($ty:ty, $write:ident, $read:ident, $bits:expr) => {
        impl BitEncode for $ty {
            fn encode(&self, writer: &mut BitWriter) {
                writer.$write(*self, $bits);
            }
        }

        impl BitDecode for $ty {
            fn decode(reader: &mut BitReader) -> Self {
                reader.$read($bits)
            }
        }
    };
}

impl_bit_codec_int!(u8, write_u8, read_u8, 8);
impl_bit_codec_int!(u16, write_u16, read_u16, 16);
impl_bit_codec_int!(u32, write_u32, read_u32, 32);
impl_bit_codec_int!(u64, write_u64, read_u64, 64);

impl BitEncode for f32 {
    fn encode(&self, writer: &mut BitWriter) {
        writer.write_f32(*self);
    }
}

impl BitDecode for f32 {
    fn decode(reader: &mut BitReader) -> Self {
        reader.read_f32()
    }
}

impl BitEncode for f64 {
    fn encode(&self, writer: &mut BitWriter) {
        writer.write_f64(*self);
    }
}

impl BitDecode for f64 {
    fn decode(reader: &mut BitReader) -> Self {
        reader.read_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lsb_first_packing() {
        let mut writer = BitWriter::new();
        writer.write_u8(0b101, 3);
        writer.write_u8(0b11, 2);

        // 3 low bits 101, then 2 bits 11 at positions 3..5.
        assert_eq!(writer.as_bytes(), &[0b0001_1101]);
        assert_eq!(writer.bit_len(), 5);
    }

    #[test]
    fn test_byte_straddling_write() {
        let mut writer = BitWriter::new();
        writer.write_u8(0b1_1111, 5);
        writer.write_u8(0b110_101, 6); // straddles the first byte boundary

        assert_eq!(writer.bit_len(), 11);
        assert_eq!(writer.as_bytes(), &[0b1011_1111, 0b0000_0110]);

        let mut reader = BitReader::from_slice(writer.as_bytes());
        assert_eq!(reader.read_u8(5), 0b1_1111);
        assert_eq!(reader.read_u8(6), 0b11_0101);
    }

    #[test]
    fn test_roundtrip_all_widths() {
        for bits in 1..=64u32 {
            let value = 0xDEAD_BEEF_CAFE_F00Du64 & mask64(bits);

            let mut writer = BitWriter::new();
            writer.write_bool(true); // misalign so every width straddles
            writer.write_u64(value, bits);

            let mut reader = BitReader::from_slice(writer.as_bytes());
            assert!(reader.read_bool());
            assert_eq!(reader.read_u64(bits), value, "width {}", bits);
        }
    }

    fn mask64(bits: u32) -> u64 {
        if bits == 64 {
            u64::MAX
        } else {
            (1u64 << bits) - 1
        }
    }

    #[test]
    fn test_bool_is_one_bit() {
        let mut writer = BitWriter::new();
        writer.write_bool(true);
        writer.write_bool(false);
        writer.write_bool(true);
        assert_eq!(writer.bit_len(), 3);
        assert_eq!(writer.as_bytes(), &[0b101]);
    }

    #[test]
    fn test_float_bit_patterns() {
        let mut writer = BitWriter::new();
        writer.write_f32(std::f32::consts::PI);
        writer.write_f64(-0.0);

        let mut reader = BitReader::from_slice(writer.as_bytes());
        assert_eq!(reader.read_f32(), std::f32::consts::PI);
        assert!(reader.read_f64().is_sign_negative());
    }

    #[test]
    fn test_writer_growth() {
        let mut writer = BitWriter::with_bit_capacity(8);
        for i in 0..100u8 {
            writer.write_u8(i, 8);
        }
        assert_eq!(writer.byte_len(), 100);
        assert!(writer.bit_capacity() >= 800);

        let mut reader = BitReader::from_slice(writer.as_bytes());
        for i in 0..100u8 {
            assert_eq!(reader.read_u8(8), i);
        }
    }

    #[test]
    fn test_oversized_single_write_grows_to_fit() {
        let mut writer = BitWriter::with_bit_capacity(8);
        let big = vec![0xAB; 1000];
        writer.write_bytes(&big);
        assert_eq!(writer.as_bytes(), &big[..]);
    }

    #[test]
    fn test_truncated_read_saturates() {
        let mut reader = BitReader::from_slice(&[0xFF]);
        assert_eq!(reader.read_u8(6), 0b11_1111);

        // 4 more bits would overrun the 8-bit buffer.
        assert_eq!(reader.read_u8(4), 0);
        assert_eq!(reader.remaining_bits(), 0);

        // Cursor stays clamped; further reads keep yielding zero.
        assert_eq!(reader.read_u32(32), 0);
        assert!(!reader.read_bool());
    }

    #[test]
    fn test_composite_roundtrip() {
        struct Probe {
            id: u16,
            active: bool,
            heading: f32,
        }

        impl BitEncode for Probe {
            fn encode(&self, writer: &mut BitWriter) {
                writer.write_u16(self.id, 10);
                writer.write_bool(self.active);
                writer.write_f32(self.heading);
            }
        }

        impl BitDecode for Probe {
            fn decode(reader: &mut BitReader) -> Self {
                Probe {
                    id: reader.read_u16(10),
                    active: reader.read_bool(),
                    heading: reader.read_f32(),
                }
            }
        }

        let probe = Probe {
            id: 0x2A7,
            active: true,
            heading: 271.5,
        };

        let mut writer = BitWriter::new();
        writer.write(&probe);
        assert_eq!(writer.bit_len(), 10 + 1 + 32);

        let mut reader = BitReader::new(writer.to_bytes());
        let decoded: Probe = reader.read();
        assert_eq!(decoded.id, 0x2A7);
        assert!(decoded.active);
        assert_eq!(decoded.heading, 271.5);
    }
}
