//! Network condition simulation proxy
//!
//! Wraps any endpoint and degrades it: fixed base latency, uniform
//! random jitter, and random packet loss, applied independently to each
//! direction. Intended for testing gameplay feel and reliability logic
//! under adverse conditions without leaving the machine.

use crate::endpoint::{ReceivedPacket, TransportEndpoint};
use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tracing::trace;

/// Simulated network conditions
///
/// Values are clamped at construction: latency and jitter are
/// non-negative, loss is a probability in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSettings {
    /// Fixed one-way delay added to every surviving packet, milliseconds
    pub base_latency_ms: f64,
    /// Uniform jitter amplitude, milliseconds; each packet's delay is
    /// perturbed by a sample from `[-jitter, +jitter]`
    pub jitter_ms: f64,
    /// Probability that any given packet is silently dropped
    pub packet_loss: f64,
}

impl SimulationSettings {
    pub fn new(base_latency_ms: f64, jitter_ms: f64, packet_loss: f64) -> Self {
        SimulationSettings {
            base_latency_ms: base_latency_ms.max(0.0),
            jitter_ms: jitter_ms.max(0.0),
            packet_loss: packet_loss.clamp(0.0, 1.0),
        }
    }

    /// A perfect network: no delay, no jitter, no loss
    pub fn ideal() -> Self {
        SimulationSettings::new(0.0, 0.0, 0.0)
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettings::ideal()
    }
}

struct ScheduledOutgoing {
    due: Instant,
    dest: SocketAddr,
    payload: Bytes,
}

struct ScheduledIncoming {
    due: Instant,
    packet: ReceivedPacket,
}

/// Endpoint decorator that simulates latency, jitter, and loss
///
/// Both directions pass through the schedule: sends are held until their
/// due time before reaching the inner endpoint, and received packets are
/// held before becoming visible to `poll_packet`. Jitter may reorder
/// packets relative to their send order.
pub struct SimulationProxy<E> {
    inner: E,
    settings: SimulationSettings,
    rng: StdRng,
    outgoing: VecDeque<ScheduledOutgoing>,
    incoming: VecDeque<ScheduledIncoming>,
}

impl<E: TransportEndpoint> SimulationProxy<E> {
    pub fn new(inner: E, settings: SimulationSettings) -> Self {
        Self::with_seed(inner, settings, rand::random())
    }

    /// Create a proxy with a fixed RNG seed, for reproducible tests
    pub fn with_seed(inner: E, settings: SimulationSettings, seed: u64) -> Self {
        SimulationProxy {
            inner,
            settings,
            rng: StdRng::seed_from_u64(seed),
            outgoing: VecDeque::new(),
            incoming: VecDeque::new(),
        }
    }

    pub fn settings(&self) -> SimulationSettings {
        self.settings
    }

    /// Replace the simulated conditions; queued packets keep the delays
    /// they were stamped with
    pub fn set_settings(&mut self, settings: SimulationSettings) {
        self.settings = settings;
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// Unwrap the proxy, discarding any packets still in flight
    pub fn into_inner(self) -> E {
        self.inner
    }

    fn should_drop(&mut self) -> bool {
        self.settings.packet_loss > 0.0 && self.rng.gen::<f64>() < self.settings.packet_loss
    }

    fn sample_delay(&mut self) -> Duration {
        let jitter = if self.settings.jitter_ms > 0.0 {
            self.rng
                .gen_range(-self.settings.jitter_ms..=self.settings.jitter_ms)
        } else {
            0.0
        };
        Duration::from_secs_f64(((self.settings.base_latency_ms + jitter) / 1000.0).max(0.0))
    }

    fn sort_by_due<T>(queue: &mut VecDeque<T>, due: impl Fn(&T) -> Instant) {
        let mut items: Vec<T> = queue.drain(..).collect();
        items.sort_by_key(|item| due(item));
        queue.extend(items);
    }

    /// Push every outgoing packet whose delay has elapsed down to the
    /// inner endpoint
    fn flush_outgoing(&mut self, now: Instant) {
        Self::sort_by_due(&mut self.outgoing, |p| p.due);
        while let Some(front) = self.outgoing.front() {
            if front.due > now {
                break;
            }
            let packet = self.outgoing.pop_front().expect("front exists");
            self.inner.send_packet(packet.dest, &packet.payload);
        }
    }

    /// Drain the inner endpoint, applying loss and stamping each
    /// survivor with its own delay
    fn pump_incoming(&mut self, now: Instant) {
        while let Some(packet) = self.inner.poll_packet() {
            if self.should_drop() {
                trace!(source = %packet.source, "simulated inbound drop");
                continue;
            }
            let due = now + self.sample_delay();
            self.incoming.push_back(ScheduledIncoming { due, packet });
        }
        Self::sort_by_due(&mut self.incoming, |p| p.due);
    }
}

impl<E: TransportEndpoint> TransportEndpoint for SimulationProxy<E> {
    fn send_packet(&mut self, dest: SocketAddr, payload: &[u8]) -> bool {
        let now = Instant::now();
        self.flush_outgoing(now);

        if self.should_drop() {
            trace!(%dest, "simulated outbound drop");
            // The packet was accepted, then lost in transit.
            return true;
        }

        let due = now + self.sample_delay();
        self.outgoing.push_back(ScheduledOutgoing {
            due,
            dest,
            payload: Bytes::copy_from_slice(payload),
        });
        // Even a zero-delay packet waits for the next pump; the flush at
        // the top of each call is the only path to the inner endpoint.
        true
    }

    fn poll_packet(&mut self) -> Option<ReceivedPacket> {
        let now = Instant::now();
        self.flush_outgoing(now);
        self.pump_incoming(now);

        match self.incoming.front() {
            Some(front) if front.due <= now => {
                self.incoming.pop_front().map(|scheduled| scheduled.packet)
            }
            _ => None,
        }
    }

    fn local_addr(&self) -> SocketAddr {
        self.inner.local_addr()
    }
}
