//! Gamelink Reliability Layer
//!
//! Turns best-effort datagrams into a delivery-notification contract:
//! wrapping 16-bit sequence numbers, run-length-encoded acknowledgment
//! ranges, in-flight packet tracking, and the manager that resolves each
//! dispatched packet as delivered or presumed lost.

pub mod ack;
pub mod delivery;
pub mod sequence;
pub mod transmission;

pub use ack::AckRange;
pub use delivery::{DeliveryConfig, DeliveryNotificationManager};
pub use sequence::SeqNumber;
pub use transmission::{InFlightPacket, TransmissionData, TransmissionDataHandle};
