use crate::domain::payment::PaymentReference;
use serde::Deserialize;
use std::collections::{HashSet, VecDeque};
use std::sync::{PoisonError, RwLock};
use tracing::{debug, info};

pub const CHARGE_SUCCESS: &str = "charge.success";

/// Confirmations kept before the oldest are forgotten.
pub const DEFAULT_LEDGER_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    pub reference: PaymentReference,
    #[serde(default)]
    pub status: Option<String>,
}

/// A gateway-to-server event, already signature-checked.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    pub data: WebhookData,
}

#[derive(Debug, Default)]
struct Confirmed {
    references: HashSet<PaymentReference>,
    arrival: VecDeque<PaymentReference>,
}

/// References the gateway has confirmed server-to-server.
///
/// A browser reporting success is provisional until its reference shows up
/// here. Holds at most `capacity` references, oldest evicted first.
#[derive(Debug)]
pub struct WebhookLedger {
    confirmed: RwLock<Confirmed>,
    capacity: usize,
}

impl Default for WebhookLedger {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LEDGER_CAPACITY)
    }
}

impl WebhookLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            confirmed: RwLock::new(Confirmed::default()),
            capacity: capacity.max(1),
        }
    }

    /// Records `charge.success` events. Returns whether the event was one.
    pub fn record(&self, event: &WebhookEvent) -> bool {
        if event.event != CHARGE_SUCCESS {
            debug!(event = %event.event, reference = %event.data.reference, "ignoring webhook event");
            return false;
        }
        let mut confirmed = self.confirmed.write().unwrap_or_else(PoisonError::into_inner);
        if confirmed.references.insert(event.data.reference.clone()) {
            confirmed.arrival.push_back(event.data.reference.clone());
            info!(reference = %event.data.reference, "payment confirmed by webhook");
        }
        while confirmed.arrival.len() > self.capacity {
            if let Some(oldest) = confirmed.arrival.pop_front() {
                confirmed.references.remove(&oldest);
                debug!(reference = %oldest, "confirmation evicted");
            }
        }
        true
    }

    pub fn is_confirmed(&self, reference: &PaymentReference) -> bool {
        self.confirmed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .references
            .contains(reference)
    }

    pub fn len(&self) -> usize {
        self.confirmed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .references
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
