//! UDP-backed transport endpoint
//!
//! Sends and receives raw datagrams, nothing more. Framing, reliability,
//! and datagram semantics belong to higher layers.

use crate::endpoint::{ReceivedPacket, TransportEndpoint};
use crate::socket::{is_would_block, SocketError, UdpSocket};
use bytes::Bytes;
use std::net::SocketAddr;
use tracing::{error, warn};

/// Default maximum packet size in bytes
pub const DEFAULT_MAX_PACKET_SIZE: usize = 1200;

/// Transport endpoint over a non-blocking UDP socket
pub struct UdpEndpoint {
    socket: UdpSocket,
    local_addr: SocketAddr,
    /// Scratch receive buffer sized to the maximum packet size
    recv_buf: Vec<u8>,
}

impl UdpEndpoint {
    /// Bind a UDP endpoint with the default maximum packet size
    ///
    /// Socket creation, bind, or non-blocking setup failures are fatal to
    /// construction; the caller decides whether to retry or abort.
    pub fn bind(addr: SocketAddr) -> Result<Self, SocketError> {
        Self::bind_with_max_packet_size(addr, DEFAULT_MAX_PACKET_SIZE)
    }

    /// Bind a UDP endpoint with an explicit maximum packet size
    pub fn bind_with_max_packet_size(
        addr: SocketAddr,
        max_packet_size: usize,
    ) -> Result<Self, SocketError> {
        let socket = UdpSocket::bind(addr)?;
        // Resolve port 0 to the actual bound port.
        let local_addr = socket.local_addr()?;

        Ok(UdpEndpoint {
            socket,
            local_addr,
            recv_buf: vec![0u8; max_packet_size.max(1)],
        })
    }

    /// Maximum packet size this endpoint can receive
    pub fn max_packet_size(&self) -> usize {
        self.recv_buf.len()
    }
}

impl TransportEndpoint for UdpEndpoint {
    fn send_packet(&mut self, dest: SocketAddr, payload: &[u8]) -> bool {
        if payload.is_empty() {
            // Nothing to send; accepted as a no-op.
            return true;
        }

        match self.socket.send_to(payload, dest) {
            Ok(sent) if sent == payload.len() => true,
            Ok(sent) => {
                // UDP is all-or-nothing at the OS level; a partial send is
                // an anomaly worth surfacing, not a failure to retry.
                warn!(sent, expected = payload.len(), %dest, "partial UDP send");
                true
            }
            Err(err) => {
                error!(%dest, %err, "UDP send failed");
                false
            }
        }
    }

    fn poll_packet(&mut self) -> Option<ReceivedPacket> {
        match self.socket.recv_from(&mut self.recv_buf) {
            Ok((0, _)) => None,
            Ok((n, source)) => Some(ReceivedPacket {
                source,
                payload: Bytes::copy_from_slice(&self.recv_buf[..n]),
            }),
            Err(err) => {
                if !is_would_block(&err) {
                    error!(%err, "UDP receive failed");
                }
                None
            }
        }
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
