use super::cache::ClientQuoteCache;
use crate::domain::booking::{BookingDraft, SessionDraft};
use crate::domain::order::{MakeOrderRequest, Order};
use crate::domain::payment::{PaymentReference, PaymentTransaction};
use crate::domain::ports::{OrderServiceRef, PaymentGatewayRef};
use crate::error::{Result, ShippingError};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Where one payment reference is in the verify-then-create flow.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileState {
    Unverified,
    Verifying,
    Verified,
    OrderCreated(Order),
    Failed { creation_attempted: bool },
}

/// How long a finished reference is remembered.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 60 * 60);

impl ReconcileState {
    fn is_terminal(&self) -> bool {
        matches!(self, Self::OrderCreated(_) | Self::Failed { .. })
    }
}

#[derive(Debug)]
struct Entry {
    state: ReconcileState,
    since: Instant,
}

type Table = HashMap<PaymentReference, Entry>;
type StateTable = Mutex<Table>;

fn lock(states: &StateTable) -> MutexGuard<'_, Table> {
    states.lock().unwrap_or_else(PoisonError::into_inner)
}

fn set(states: &StateTable, reference: &PaymentReference, state: ReconcileState) {
    lock(states).insert(
        reference.clone(),
        Entry {
            state,
            since: Instant::now(),
        },
    );
}

/// Marks the reference failed unless `complete` ran. Covers early returns
/// and a caller that drops the future mid-flight.
struct InFlight<'a> {
    states: &'a StateTable,
    reference: &'a PaymentReference,
    creation_attempted: bool,
    done: bool,
}

impl<'a> InFlight<'a> {
    fn advance(&self, state: ReconcileState) {
        set(self.states, self.reference, state);
    }

    fn complete(mut self, order: Order) {
        self.advance(ReconcileState::OrderCreated(order));
        self.done = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.done {
            set(
                self.states,
                self.reference,
                ReconcileState::Failed {
                    creation_attempted: self.creation_attempted,
                },
            );
        }
    }
}

/// Verifies a payment and creates exactly one order for it.
///
/// The order endpoint is not idempotent, so every reference passes through
/// a guard table: a second caller for the same reference never reaches the
/// backend while the first is in flight, gets the recorded order once the
/// first has succeeded, and is refused if a creation attempt already failed.
/// Finished references are forgotten after `retention`; in-flight ones never.
pub struct OrderReconciler {
    gateway: PaymentGatewayRef,
    orders: OrderServiceRef,
    cache: ClientQuoteCache,
    states: StateTable,
    retention: Duration,
}

enum Claim {
    Proceed,
    Done(Order),
}

impl OrderReconciler {
    pub fn new(gateway: PaymentGatewayRef, orders: OrderServiceRef, cache: ClientQuoteCache) -> Self {
        Self {
            gateway,
            orders,
            cache,
            states: Mutex::new(HashMap::new()),
            retention: DEFAULT_RETENTION,
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn state(&self, reference: &PaymentReference) -> ReconcileState {
        lock(&self.states)
            .get(reference)
            .map(|entry| entry.state.clone())
            .unwrap_or(ReconcileState::Unverified)
    }

    /// Number of references currently remembered.
    pub fn tracked(&self) -> usize {
        lock(&self.states).len()
    }

    fn evict_expired(&self, states: &mut Table) {
        let before = states.len();
        states.retain(|_, entry| !entry.state.is_terminal() || entry.since.elapsed() < self.retention);
        let evicted = before - states.len();
        if evicted > 0 {
            debug!(evicted, "forgot finished payment references");
        }
    }

    fn claim(&self, reference: &PaymentReference) -> Result<Claim> {
        let mut states = lock(&self.states);
        self.evict_expired(&mut states);
        match states.get(reference).map(|entry| &entry.state) {
            Some(ReconcileState::OrderCreated(order)) => Ok(Claim::Done(order.clone())),
            Some(ReconcileState::Verifying | ReconcileState::Verified)
            | Some(ReconcileState::Failed {
                creation_attempted: true,
            }) => Err(ShippingError::DuplicateOrderAttempt(reference.to_string())),
            _ => {
                states.insert(
                    reference.clone(),
                    Entry {
                        state: ReconcileState::Verifying,
                        since: Instant::now(),
                    },
                );
                Ok(Claim::Proceed)
            }
        }
    }

    pub async fn reconcile(
        &self,
        session: &str,
        reference: &PaymentReference,
        auth_token: &str,
    ) -> Result<Order> {
        if auth_token.trim().is_empty() {
            return Err(ShippingError::NotAuthenticated);
        }
        ClientQuoteCache::key(session)?;

        match self.claim(reference)? {
            Claim::Done(order) => {
                info!(%reference, order_no = %order.order_no, "order already created for reference");
                return Ok(order);
            }
            Claim::Proceed => {}
        }

        let mut flight = InFlight {
            states: &self.states,
            reference,
            creation_attempted: false,
            done: false,
        };

        let transaction = self.gateway.verify(reference).await?;
        check_ownership(&transaction, reference, session)?;
        flight.advance(ReconcileState::Verified);

        let draft = self.cache.load(session).await?;
        let request = build_order_request(&transaction, draft.as_ref())?;

        flight.creation_attempted = true;
        let order = self
            .orders
            .create_order(auth_token, &request)
            .await
            .inspect_err(|e| error!(%reference, error = %e, "order creation failed after payment"))?;

        info!(%reference, order_no = %order.order_no, zone = %request.zone_picked, "order created from payment");
        flight.complete(order.clone());

        if let Err(e) = self.cache.clear(session).await {
            warn!(%reference, error = %e, "order created but draft could not be cleared");
        }
        Ok(order)
    }
}

/// The verified payment must be the one asked for, and a payment started
/// for one session cannot be settled against another session's draft.
fn check_ownership(
    transaction: &PaymentTransaction,
    reference: &PaymentReference,
    session: &str,
) -> Result<()> {
    if transaction.reference != *reference {
        warn!(%reference, verified = %transaction.reference, "gateway verified a different reference");
        return Err(ShippingError::PaymentVerificationFailed(format!(
            "gateway verified {} when {reference} was requested",
            transaction.reference
        )));
    }
    if let Some(owner) = transaction.metadata.session.as_deref()
        && owner != session
    {
        warn!(%reference, owner, session, "payment reconciled from a different session");
        return Err(ShippingError::PaymentVerificationFailed(format!(
            "payment {reference} was started in a different session"
        )));
    }
    Ok(())
}

/// A draft booking only fills gaps when it describes the shipment that was
/// actually paid for.
fn check_draft_matches(transaction: &PaymentTransaction, booking: &BookingDraft) -> Result<()> {
    let metadata = &transaction.metadata;
    let mismatch = |what: String| {
        ShippingError::PaymentVerificationFailed(format!(
            "payment {} does not match the session draft: {what}",
            transaction.reference
        ))
    };
    if let Some(zone) = &metadata.zone
        && *zone != booking.zone_picked
    {
        return Err(mismatch(format!("paid for {zone}, draft is for {}", booking.zone_picked)));
    }
    if let Some(weight) = &metadata.weight {
        let paid = weight.rounded()?;
        let drafted = booking.shipment.weight.rounded()?;
        if paid != drafted {
            return Err(mismatch(format!("paid for {paid}kg, draft is for {drafted}kg")));
        }
    }
    Ok(())
}

/// Builds the order from what the gateway verified, filling gaps from the
/// session draft.
fn build_order_request(
    transaction: &PaymentTransaction,
    draft: Option<&SessionDraft>,
) -> Result<MakeOrderRequest> {
    let metadata = &transaction.metadata;
    let booking = match (&metadata.booking, draft.and_then(|d| d.booking.as_ref())) {
        (Some(paid), _) => Some(paid),
        (None, Some(drafted)) => {
            check_draft_matches(transaction, drafted)?;
            Some(drafted)
        }
        (None, None) => None,
    };

    let unlinked = |what: &str| {
        ShippingError::PaymentVerificationFailed(format!(
            "payment {} carries no {what}; it cannot be tied to a shipment",
            transaction.reference
        ))
    };

    let zone = metadata
        .zone
        .clone()
        .or_else(|| booking.map(|b| b.zone_picked.clone()))
        .ok_or_else(|| unlinked("zone"))?;
    let weight = metadata
        .weight
        .or_else(|| booking.map(|b| b.shipment.weight))
        .ok_or_else(|| unlinked("weight"))?;
    let email = metadata
        .email
        .clone()
        .or_else(|| booking.map(|b| b.sender.email.clone()))
        .or_else(|| transaction.customer_email.clone())
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| unlinked("email"))?;

    let request = MakeOrderRequest::new(
        zone,
        weight,
        email,
        transaction.amount,
        metadata.delivery_speed,
    )?;
    Ok(match booking {
        Some(booking) => request.with_booking(booking.to_fields()),
        None => request,
    })
}
