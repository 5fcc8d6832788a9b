use crate::application::cache::ClientQuoteCache;
use crate::application::quote::QuoteCalculator;
use crate::application::reconciler::{DEFAULT_RETENTION, OrderReconciler};
use crate::application::webhook::{DEFAULT_LEDGER_CAPACITY, WebhookLedger};
use crate::domain::ports::{DraftStoreRef, OrderServiceRef, PaymentGatewayRef, RateServiceRef};
use crate::domain::zone::ZoneTable;
use std::sync::Arc;
use std::time::Duration;

/// Bounds on what the service remembers between requests.
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub order_retention: Duration,
    pub webhook_capacity: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            order_retention: DEFAULT_RETENTION,
            webhook_capacity: DEFAULT_LEDGER_CAPACITY,
        }
    }
}

/// Shared handler state. Everything inside is cheap to share across tasks.
pub struct AppState {
    pub quotes: QuoteCalculator,
    pub rates: RateServiceRef,
    pub gateway: PaymentGatewayRef,
    pub orders: OrderServiceRef,
    pub cache: ClientQuoteCache,
    pub reconciler: OrderReconciler,
    pub ledger: WebhookLedger,
    pub webhook_secret: Option<String>,
}

impl AppState {
    pub fn new(
        zones: Arc<ZoneTable>,
        rates: RateServiceRef,
        gateway: PaymentGatewayRef,
        orders: OrderServiceRef,
        drafts: DraftStoreRef,
        webhook_secret: Option<String>,
    ) -> Arc<Self> {
        Self::with_limits(zones, rates, gateway, orders, drafts, webhook_secret, Limits::default())
    }

    pub fn with_limits(
        zones: Arc<ZoneTable>,
        rates: RateServiceRef,
        gateway: PaymentGatewayRef,
        orders: OrderServiceRef,
        drafts: DraftStoreRef,
        webhook_secret: Option<String>,
        limits: Limits,
    ) -> Arc<Self> {
        let cache = ClientQuoteCache::new(drafts);
        Arc::new(Self {
            quotes: QuoteCalculator::new(zones, rates.clone()),
            rates,
            reconciler: OrderReconciler::new(gateway.clone(), orders.clone(), cache.clone())
                .with_retention(limits.order_retention),
            gateway,
            orders,
            cache,
            ledger: WebhookLedger::with_capacity(limits.webhook_capacity),
            webhook_secret,
        })
    }
}
