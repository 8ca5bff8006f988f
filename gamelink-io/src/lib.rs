//! Gamelink Transport I/O
//!
//! Transport endpoints move opaque datagram payloads between peers. Three
//! interchangeable variants implement the same seam: an in-process
//! loopback pair, a non-blocking UDP adapter, and a proxy that injects
//! latency, jitter, and loss on top of any other endpoint.

pub mod endpoint;
pub mod loopback;
pub mod simulator;
pub mod socket;
pub mod udp;

pub use endpoint::{ReceivedPacket, TransportEndpoint};
pub use loopback::LoopbackEndpoint;
pub use simulator::{SimulationProxy, SimulationSettings};
pub use socket::{SocketError, UdpSocket};
pub use udp::{UdpEndpoint, DEFAULT_MAX_PACKET_SIZE};
