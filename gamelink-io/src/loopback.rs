//! In-process loopback endpoint pair
//!
//! Two endpoints wired together over one mutex-guarded pair of FIFO
//! queues, one per direction. Useful for listen-server mode,
//! play-in-editor, and deterministic tests; the mutex exists because a
//! listen server may pump the client and server halves from different
//! threads of the same process.

use crate::endpoint::{ReceivedPacket, TransportEndpoint};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Client,
    Server,
}

#[derive(Default)]
struct Queues {
    packets_for_client: VecDeque<ReceivedPacket>,
    packets_for_server: VecDeque<ReceivedPacket>,
}

/// One half of a connected in-process endpoint pair
pub struct LoopbackEndpoint {
    shared: Arc<Mutex<Queues>>,
    side: Side,
    local_addr: SocketAddr,
    peer_addr: SocketAddr,
}

impl LoopbackEndpoint {
    /// Create a connected (client, server) endpoint pair
    ///
    /// The pairing is fixed for the lifetime of both halves; send
    /// destinations are ignored.
    pub fn pair(
        client_addr: SocketAddr,
        server_addr: SocketAddr,
    ) -> (LoopbackEndpoint, LoopbackEndpoint) {
        let shared = Arc::new(Mutex::new(Queues::default()));

        let client = LoopbackEndpoint {
            shared: shared.clone(),
            side: Side::Client,
            local_addr: client_addr,
            peer_addr: server_addr,
        };
        let server = LoopbackEndpoint {
            shared,
            side: Side::Server,
            local_addr: server_addr,
            peer_addr: client_addr,
        };

        (client, server)
    }

    /// The fixed peer this endpoint delivers to
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }
}

impl TransportEndpoint for LoopbackEndpoint {
    fn send_packet(&mut self, _dest: SocketAddr, payload: &[u8]) -> bool {
        let packet = ReceivedPacket {
            source: self.local_addr,
            payload: Bytes::copy_from_slice(payload),
        };

        let mut queues = self.shared.lock();
        match self.side {
            Side::Client => queues.packets_for_server.push_back(packet),
            Side::Server => queues.packets_for_client.push_back(packet),
        }
        true
    }

    fn poll_packet(&mut self) -> Option<ReceivedPacket> {
        let mut queues = self.shared.lock();
        match self.side {
            Side::Client => queues.packets_for_client.pop_front(),
            Side::Server => queues.packets_for_server.pop_front(),
        }
    }

    fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}
