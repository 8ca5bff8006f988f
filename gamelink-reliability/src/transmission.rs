//! Per-packet delivery-outcome tracking
//!
//! Every logical payload type that contributes to a physical packet
//! registers its own [`TransmissionData`] under an integer channel key.
//! When the packet resolves, the outcome fans out to every registered
//! handle so each layer can requeue for retransmission or confirm state.

use crate::delivery::DeliveryNotificationManager;
use crate::sequence::SeqNumber;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Delivery-outcome strategy attached to a dispatched packet
///
/// Implementations receive the manager so they can re-enter it, e.g. to
/// write retransmission state for a freshly assigned sequence number.
/// Ownership is shared: the in-flight record holds one handle and the
/// creating layer may keep another.
pub trait TransmissionData {
    fn handle_delivery_success(&self, manager: &mut DeliveryNotificationManager);
    fn handle_delivery_failure(&self, manager: &mut DeliveryNotificationManager);
}

/// Shared handle to a [`TransmissionData`]
pub type TransmissionDataHandle = Arc<dyn TransmissionData>;

/// One sent, unresolved physical packet
pub struct InFlightPacket {
    sequence_number: SeqNumber,
    time_dispatched: Instant,
    transmission_data: HashMap<u32, TransmissionDataHandle>,
}

impl InFlightPacket {
    pub fn new(sequence_number: SeqNumber) -> Self {
        InFlightPacket {
            sequence_number,
            time_dispatched: Instant::now(),
            transmission_data: HashMap::new(),
        }
    }

    #[inline]
    pub fn sequence_number(&self) -> SeqNumber {
        self.sequence_number
    }

    /// When the packet was handed to the transport
    #[inline]
    pub fn time_dispatched(&self) -> Instant {
        self.time_dispatched
    }

    /// Register outcome tracking for one logical channel
    pub fn set_transmission_data(&mut self, key: u32, data: TransmissionDataHandle) {
        self.transmission_data.insert(key, data);
    }

    pub fn transmission_data(&self, key: u32) -> Option<&TransmissionDataHandle> {
        self.transmission_data.get(&key)
    }

    /// Fan the Success outcome out to every registered channel
    pub fn handle_delivery_success(&self, manager: &mut DeliveryNotificationManager) {
        for data in self.transmission_data.values() {
            data.handle_delivery_success(manager);
        }
    }

    /// Fan the Failure outcome out to every registered channel
    pub fn handle_delivery_failure(&self, manager: &mut DeliveryNotificationManager) {
        for data in self.transmission_data.values() {
            data.handle_delivery_failure(manager);
        }
    }
}
