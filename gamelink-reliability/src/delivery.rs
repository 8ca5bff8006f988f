//! Delivery notification manager
//!
//! The orchestrator of the reliability layer. On the send side it assigns
//! wrapping sequence numbers and records one [`InFlightPacket`] per
//! dispatched physical packet; on the receive side it filters stale
//! sequence numbers and accumulates pending acknowledgment ranges. Acks
//! coming back resolve the in-flight window two-sided: covered numbers
//! resolve Success, numbers older than the range start by more than the
//! configured window resolve Failure (presumed lost). The two-sided walk
//! bounds the window under sustained loss.

use crate::ack::AckRange;
use crate::sequence::SeqNumber;
use crate::transmission::InFlightPacket;
use gamelink_core::{BitReader, BitWriter};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

/// Resolution policy knobs
///
/// Both values are policy, not protocol: peers may differ without
/// breaking the wire format.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryConfig {
    /// How many sequence numbers behind an incoming ack range's start a
    /// packet may lag before it is presumed lost
    pub loss_window: u16,
    /// Packets unresolved for this long fail via
    /// [`DeliveryNotificationManager::process_timed_out_packets`]
    pub dispatch_timeout: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        DeliveryConfig {
            loss_window: 64,
            dispatch_timeout: Duration::from_millis(500),
        }
    }
}

/// Sequence assignment, in-flight tracking, and ack resolution
#[derive(Default)]
pub struct DeliveryNotificationManager {
    config: DeliveryConfig,
    next_outgoing_seq: SeqNumber,
    next_expected_seq: SeqNumber,
    /// Unresolved dispatched packets, in dispatch (sequence) order
    in_flight: VecDeque<InFlightPacket>,
    /// Ranges acknowledged locally but not yet sent to the peer
    pending_acks: VecDeque<AckRange>,
    dispatched_count: u32,
    delivered_count: u32,
    dropped_count: u32,
}

impl DeliveryNotificationManager {
    pub fn new(config: DeliveryConfig) -> Self {
        DeliveryNotificationManager {
            config,
            ..Default::default()
        }
    }

    /// Assign and serialize the next outgoing sequence number
    ///
    /// Records the packet as in flight and returns it so the caller can
    /// attach per-channel transmission data before dispatch.
    pub fn write_state(&mut self, writer: &mut BitWriter) -> &mut InFlightPacket {
        let seq = self.next_outgoing_seq;
        self.next_outgoing_seq.increment();

        writer.write(&seq);

        self.dispatched_count += 1;
        self.in_flight.push_back(InFlightPacket::new(seq));
        self.in_flight.back_mut().expect("packet just pushed")
    }

    /// Read an incoming packet's sequence number and decide whether to
    /// process the rest of it
    ///
    /// Numbers at or ahead of the next expected one are acknowledged and
    /// accepted; stale or duplicate numbers are dropped.
    pub fn process_sequence_number(&mut self, reader: &mut BitReader) -> bool {
        let seq: SeqNumber = reader.read();

        if seq.ge(self.next_expected_seq) {
            self.next_expected_seq = seq.next();
            self.add_pending_ack(seq);
            true
        } else {
            false
        }
    }

    /// Serialize pending acknowledgment state into an outgoing packet
    ///
    /// Emits a 1-bit has-acks flag and, when set, the oldest pending
    /// range; remaining ranges ride later packets.
    pub fn write_ack_data(&mut self, writer: &mut BitWriter) {
        match self.pending_acks.pop_front() {
            Some(range) => {
                writer.write_bool(true);
                writer.write(&range);
            }
            None => writer.write_bool(false),
        }
    }

    /// Read the peer's acknowledgment state and resolve the window
    pub fn process_ack_data(&mut self, reader: &mut BitReader) {
        if !reader.read_bool() {
            return;
        }
        let range: AckRange = reader.read();
        self.process_ack_range(range);
    }

    /// Resolve the in-flight window against one incoming ack range
    ///
    /// Callbacks run only after the window has been restored, so
    /// `TransmissionData` impls may re-enter the manager (e.g. to write
    /// retransmission state).
    pub fn process_ack_range(&mut self, range: AckRange) {
        let mut successes = Vec::new();
        let mut failures = Vec::new();
        let mut remaining = VecDeque::with_capacity(self.in_flight.len());

        let loss_window = self.config.loss_window as i32;
        for packet in std::mem::take(&mut self.in_flight) {
            let seq = packet.sequence_number();
            if range.contains(seq) {
                successes.push(packet);
            } else if range.start() - seq > loss_window {
                failures.push(packet);
            } else {
                remaining.push_back(packet);
            }
        }
        self.in_flight = remaining;

        self.delivered_count += successes.len() as u32;
        self.dropped_count += failures.len() as u32;
        if !failures.is_empty() {
            debug!(
                lost = failures.len(),
                ack_start = %range.start(),
                "in-flight packets presumed lost"
            );
        }

        for packet in &failures {
            packet.handle_delivery_failure(self);
        }
        for packet in &successes {
            packet.handle_delivery_success(self);
        }
    }

    /// Fail packets unresolved for longer than the dispatch timeout
    pub fn process_timed_out_packets(&mut self) {
        let timeout = self.config.dispatch_timeout;

        let mut expired = Vec::new();
        loop {
            match self.in_flight.front() {
                // Dispatch order means everything behind the first
                // unexpired packet is younger still.
                Some(front) if front.time_dispatched().elapsed() >= timeout => {
                    if let Some(packet) = self.in_flight.pop_front() {
                        expired.push(packet);
                    }
                }
                _ => break,
            }
        }

        self.dropped_count += expired.len() as u32;
        if !expired.is_empty() {
            debug!(lost = expired.len(), "in-flight packets timed out");
        }
        for packet in &expired {
            packet.handle_delivery_failure(self);
        }
    }

    /// Packets dispatched but not yet resolved
    #[inline]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Next sequence number that will be assigned
    #[inline]
    pub fn next_outgoing_seq(&self) -> SeqNumber {
        self.next_outgoing_seq
    }

    /// Next incoming sequence number that will be accepted as new
    #[inline]
    pub fn next_expected_seq(&self) -> SeqNumber {
        self.next_expected_seq
    }

    /// Acknowledgment ranges waiting to be sent
    #[inline]
    pub fn pending_ack_count(&self) -> usize {
        self.pending_acks.len()
    }

    #[inline]
    pub fn dispatched_count(&self) -> u32 {
        self.dispatched_count
    }

    #[inline]
    pub fn delivered_count(&self) -> u32 {
        self.delivered_count
    }

    #[inline]
    pub fn dropped_count(&self) -> u32 {
        self.dropped_count
    }

    /// Fraction of dispatched packets resolved as delivered
    pub fn delivery_rate(&self) -> f32 {
        if self.dispatched_count == 0 {
            0.0
        } else {
            self.delivered_count as f32 / self.dispatched_count as f32
        }
    }

    fn add_pending_ack(&mut self, seq: SeqNumber) {
        let extended = self
            .pending_acks
            .back_mut()
            .map_or(false, |range| range.maybe_push_back(seq));
        if !extended {
            self.pending_acks.push_back(AckRange::new(seq));
        }
    }
}
