//! End-to-end reliability tests
//!
//! Runs the full stack: two delivery notification managers exchanging
//! bit-packed packets over transport endpoints, with acknowledgment state
//! piggybacked on return traffic.

use gamelink::io::{SimulationProxy, SimulationSettings};
use gamelink::reliability::{DeliveryConfig, TransmissionData};
use gamelink::{
    BitReader, BitWriter, DeliveryNotificationManager, LoopbackEndpoint, TransportEndpoint,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Install a subscriber so `RUST_LOG=debug` surfaces presumed-loss
/// diagnostics during test runs.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Default)]
struct Outcome {
    successes: AtomicU32,
    failures: AtomicU32,
}

impl TransmissionData for Outcome {
    fn handle_delivery_success(&self, _manager: &mut DeliveryNotificationManager) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    fn handle_delivery_failure(&self, _manager: &mut DeliveryNotificationManager) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}

struct Peer<E> {
    endpoint: E,
    manager: DeliveryNotificationManager,
}

impl<E: TransportEndpoint> Peer<E> {
    fn new(endpoint: E) -> Self {
        Peer {
            endpoint,
            manager: DeliveryNotificationManager::default(),
        }
    }

    /// Build and send one packet: sequence number, piggybacked ack state,
    /// then the payload byte.
    fn send(&mut self, dest: std::net::SocketAddr, payload: u8, outcome: &Arc<Outcome>) {
        let mut writer = BitWriter::new();
        self.manager
            .write_state(&mut writer)
            .set_transmission_data(0, outcome.clone());
        self.manager.write_ack_data(&mut writer);
        writer.write_u8(payload, 8);

        self.endpoint.send_packet(dest, writer.as_bytes());
    }

    /// Drain the endpoint, returning accepted payload bytes in arrival
    /// order. Stale packets are dropped before their ack data is read.
    fn pump(&mut self) -> Vec<u8> {
        let mut accepted = Vec::new();
        while let Some(packet) = self.endpoint.poll_packet() {
            let mut reader = BitReader::new(packet.payload);
            if !self.manager.process_sequence_number(&mut reader) {
                continue;
            }
            self.manager.process_ack_data(&mut reader);
            accepted.push(reader.read_u8(8));
        }
        accepted
    }
}

fn loopback_peers() -> (Peer<LoopbackEndpoint>, Peer<LoopbackEndpoint>) {
    let (client, server) = LoopbackEndpoint::pair(
        "127.0.0.1:4000".parse().unwrap(),
        "127.0.0.1:5000".parse().unwrap(),
    );
    (Peer::new(client), Peer::new(server))
}

#[test]
fn test_clean_exchange_resolves_all_success() {
    init_tracing();
    let (mut client, mut server) = loopback_peers();
    let server_addr = server.endpoint.local_addr();
    let client_addr = client.endpoint.local_addr();
    let sent = Arc::new(Outcome::default());
    let echoed = Arc::new(Outcome::default());

    for i in 0..10u8 {
        client.send(server_addr, i, &sent);
    }
    assert_eq!(server.pump(), (0..10).collect::<Vec<u8>>());

    // The server's reply traffic carries the acks back.
    for i in 0..10u8 {
        server.send(client_addr, i, &echoed);
    }
    client.pump();

    assert_eq!(sent.successes.load(Ordering::Relaxed), 10);
    assert_eq!(sent.failures.load(Ordering::Relaxed), 0);
    assert_eq!(client.manager.delivered_count(), 10);
    assert_eq!(client.manager.delivery_rate(), 1.0);
    assert_eq!(client.manager.in_flight_count(), 0);
}

#[test]
fn test_lost_packets_resolve_as_failures() {
    init_tracing();
    let (mut client, mut server) = loopback_peers();
    let server_addr = server.endpoint.local_addr();
    let client_addr = client.endpoint.local_addr();
    let outcome = Arc::new(Outcome::default());
    let reply_outcome = Arc::new(Outcome::default());

    client.manager = DeliveryNotificationManager::new(DeliveryConfig {
        loss_window: 2,
        ..Default::default()
    });

    // Packets 0..5 are dispatched but never handed to the transport,
    // so the server never sees them.
    let mut scratch = BitWriter::new();
    for _ in 0..5 {
        client
            .manager
            .write_state(&mut scratch)
            .set_transmission_data(0, outcome.clone());
    }

    // Packets 5..10 arrive normally.
    for i in 5..10u8 {
        client.send(server_addr, i, &outcome);
    }
    assert_eq!(server.pump(), vec![5, 6, 7, 8, 9]);

    server.send(client_addr, 0, &reply_outcome);
    client.pump();

    // Acks cover 5..10; 0..2 lag the range start by more than 2.
    assert_eq!(outcome.successes.load(Ordering::Relaxed), 5);
    assert_eq!(outcome.failures.load(Ordering::Relaxed), 3);
    assert_eq!(client.manager.in_flight_count(), 2);
}

#[test]
fn test_duplicate_delivery_is_filtered() {
    let (mut client, mut server) = loopback_peers();
    let server_addr = server.endpoint.local_addr();
    let outcome = Arc::new(Outcome::default());

    let mut writer = BitWriter::new();
    client
        .manager
        .write_state(&mut writer)
        .set_transmission_data(0, outcome.clone());
    client.manager.write_ack_data(&mut writer);
    writer.write_u8(42, 8);

    // The same physical packet arrives twice.
    client.endpoint.send_packet(server_addr, writer.as_bytes());
    client.endpoint.send_packet(server_addr, writer.as_bytes());

    assert_eq!(server.pump(), vec![42]);
    // Only one ack range accumulates for the duplicate pair.
    assert_eq!(server.manager.pending_ack_count(), 1);
}

#[test]
fn test_timeout_fails_unacked_packets() {
    init_tracing();
    let (mut client, server) = loopback_peers();
    let server_addr = server.endpoint.local_addr();
    let outcome = Arc::new(Outcome::default());

    client.manager = DeliveryNotificationManager::new(DeliveryConfig {
        dispatch_timeout: Duration::from_millis(10),
        ..Default::default()
    });

    for i in 0..3u8 {
        client.send(server_addr, i, &outcome);
    }
    std::thread::sleep(Duration::from_millis(25));
    client.manager.process_timed_out_packets();

    assert_eq!(outcome.failures.load(Ordering::Relaxed), 3);
    assert_eq!(client.manager.dropped_count(), 3);
    assert_eq!(client.manager.in_flight_count(), 0);
}

#[test]
fn test_exchange_survives_simulated_network() {
    init_tracing();
    let (client_end, server_end) = LoopbackEndpoint::pair(
        "127.0.0.1:4000".parse().unwrap(),
        "127.0.0.1:5000".parse().unwrap(),
    );

    // Mild latency, no loss: everything arrives, just later.
    let settings = SimulationSettings::new(10.0, 2.0, 0.0);
    let mut client = Peer::new(SimulationProxy::with_seed(client_end, settings, 11));
    let mut server = Peer::new(server_end);
    let server_addr = server.endpoint.local_addr();
    let client_addr = client.endpoint.local_addr();
    let outcome = Arc::new(Outcome::default());
    let reply_outcome = Arc::new(Outcome::default());

    for i in 0..20u8 {
        client.send(server_addr, i, &outcome);
    }

    let mut received = Vec::new();
    for _ in 0..100 {
        received.extend(server.pump());
        client.pump(); // keeps the proxy flushing outgoing packets
        if received.len() == 20 {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(received.len(), 20);

    server.send(client_addr, 0, &reply_outcome);
    for _ in 0..100 {
        client.pump();
        if client.manager.delivered_count() > 0 {
            break;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(outcome.successes.load(Ordering::Relaxed) > 0);
}
