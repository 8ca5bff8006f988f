//! Transport endpoint abstraction
//!
//! An endpoint models a datagram socket: best-effort sends, non-blocking
//! polls, and a bound local address. Higher layers pump it once per frame,
//! draining all available inbound packets before stepping simulation;
//! framing, reliability, and ordering are their concern, not the
//! endpoint's.

use bytes::Bytes;
use std::net::SocketAddr;

/// One received transport-level datagram
#[derive(Debug, Clone)]
pub struct ReceivedPacket {
    /// Address the datagram came from
    pub source: SocketAddr,
    /// Opaque payload bytes
    pub payload: Bytes,
}

/// Polymorphic datagram endpoint
pub trait TransportEndpoint {
    /// Send a datagram to the destination address
    ///
    /// Returns whether the endpoint accepted the send request; acceptance
    /// is not a delivery guarantee.
    fn send_packet(&mut self, dest: SocketAddr, payload: &[u8]) -> bool;

    /// Poll a single received datagram
    ///
    /// `None` means nothing is available right now, never an error; the
    /// caller retries next tick.
    fn poll_packet(&mut self) -> Option<ReceivedPacket>;

    /// The endpoint's bound local address
    fn local_addr(&self) -> SocketAddr;
}

impl<T: TransportEndpoint + ?Sized> TransportEndpoint for Box<T> {
    fn send_packet(&mut self, dest: SocketAddr, payload: &[u8]) -> bool {
        (**self).send_packet(dest, payload)
    }

    fn poll_packet(&mut self) -> Option<ReceivedPacket> {
        (**self).poll_packet()
    }

    fn local_addr(&self) -> SocketAddr {
        (**self).local_addr()
    }
}
