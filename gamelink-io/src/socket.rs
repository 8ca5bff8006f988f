//! UDP socket wrapper
//!
//! Thin cross-platform abstraction over a non-blocking UDP socket. All
//! sockets are created non-blocking; would-block conditions surface as
//! `ErrorKind::WouldBlock` errors for the endpoint layer to translate
//! into "nothing available".

use socket2::{Domain, Protocol, Socket, Type};
use std::io::{self, ErrorKind};
use std::mem::MaybeUninit;
use std::net::SocketAddr;
use thiserror::Error;

/// Socket configuration errors
///
/// Fatal to endpoint construction; per-call I/O conditions are handled at
/// the endpoint layer instead.
#[derive(Error, Debug)]
pub enum SocketError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid socket address")]
    InvalidAddress,
}

/// Non-blocking UDP socket
pub struct UdpSocket {
    inner: Socket,
}

impl UdpSocket {
    /// Create a UDP socket bound to the given address, non-blocking
    pub fn bind(addr: SocketAddr) -> Result<Self, SocketError> {
        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;

        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        socket.set_nonblocking(true)?;

        Ok(UdpSocket { inner: socket })
    }

    /// Get the local address this socket is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, SocketError> {
        self.inner
            .local_addr()?
            .as_socket()
            .ok_or(SocketError::InvalidAddress)
    }

    /// Send a datagram to the given address
    ///
    /// Returns the number of bytes sent; WouldBlock propagates as an
    /// `Io` error for the caller to classify.
    pub fn send_to(&self, buf: &[u8], target: SocketAddr) -> Result<usize, SocketError> {
        Ok(self.inner.send_to(buf, &target.into())?)
    }

    /// Receive a datagram into `buf`
    ///
    /// Returns the byte count and source address, or WouldBlock when no
    /// datagram is queued.
    pub fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), SocketError> {
        // socket2 takes MaybeUninit; reuse the caller's buffer in place.
        let uninit_buf = unsafe {
            std::slice::from_raw_parts_mut(buf.as_mut_ptr() as *mut MaybeUninit<u8>, buf.len())
        };

        match self.inner.recv_from(uninit_buf) {
            Ok((n, addr)) => Ok((n, addr.as_socket().ok_or(SocketError::InvalidAddress)?)),
            Err(e) => Err(SocketError::Io(e)),
        }
    }

}

/// Whether an error is the non-blocking "nothing to do" condition
pub(crate) fn is_would_block(err: &SocketError) -> bool {
    matches!(err, SocketError::Io(e) if e.kind() == ErrorKind::WouldBlock)
}
