//! Gamelink Core Primitives
//!
//! This crate implements the serialization and storage primitives the rest
//! of the transport stack is built on: the LSB-first bit streams used for
//! wire encoding, the growable circular byte buffer used as backing
//! storage, and the frame/fixed-step clocks consumed by tick loops.

pub mod bitstream;
pub mod clock;
pub mod ring;

pub use bitstream::{BitDecode, BitEncode, BitReader, BitWriter};
pub use clock::{FixedStepper, FrameClock};
pub use ring::{CircularBuffer, RingError};
