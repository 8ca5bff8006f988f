//! Gamelink - game networking transport
//!
//! Bit-level serialization, buffering, and transport primitives for
//! realtime multiplayer games, with a selective-ack delivery
//! notification layer on top.

pub use gamelink_core as stream;
pub use gamelink_io as io;
pub use gamelink_reliability as reliability;

// Re-export commonly used types
pub use gamelink_core::{BitDecode, BitEncode, BitReader, BitWriter, CircularBuffer};
pub use gamelink_io::{LoopbackEndpoint, ReceivedPacket, TransportEndpoint, UdpEndpoint};
pub use gamelink_reliability::{AckRange, DeliveryNotificationManager, SeqNumber};
