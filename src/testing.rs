//! Port fakes with call counters, shared by unit tests.

use crate::domain::order::{MakeOrderRequest, Order, OrderStatus};
use crate::domain::payment::{
    InitializePayment, PaymentAuthorization, PaymentMetadata, PaymentReference, PaymentStatus,
    PaymentTransaction, to_minor_units,
};
use crate::domain::ports::{OrderService, PaymentGateway, RateService};
use crate::domain::quote::BasePrice;
use crate::domain::zone::ZoneId;
use crate::error::{Result, ShippingError};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub struct FakeRates {
    price: Option<Decimal>,
    calls: Mutex<Vec<(ZoneId, u32)>>,
}

impl FakeRates {
    pub fn new(price: Decimal) -> Self {
        Self {
            price: Some(price),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            price: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(ZoneId, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RateService for FakeRates {
    async fn base_price(&self, zone: &ZoneId, weight_rounded: u32) -> Result<BasePrice> {
        self.calls.lock().unwrap().push((zone.clone(), weight_rounded));
        match self.price {
            Some(price) => Ok(BasePrice {
                price,
                currency: "NGN".to_string(),
            }),
            None => Err(ShippingError::UpstreamUnavailable(
                "rate service unreachable".to_string(),
            )),
        }
    }
}

pub struct FakeGateway {
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub metadata: PaymentMetadata,
    pub delay: Duration,
    pub verified_reference: Option<PaymentReference>,
    verify_calls: AtomicUsize,
    initialized: Mutex<Vec<InitializePayment>>,
}

impl FakeGateway {
    pub fn new(status: PaymentStatus, amount: Decimal, metadata: PaymentMetadata) -> Self {
        Self {
            status,
            amount,
            metadata,
            delay: Duration::ZERO,
            verified_reference: None,
            verify_calls: AtomicUsize::new(0),
            initialized: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Answers every verification with this reference instead of the one asked for.
    pub fn with_verified_reference(mut self, reference: PaymentReference) -> Self {
        self.verified_reference = Some(reference);
        self
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn initialized(&self) -> Vec<InitializePayment> {
        self.initialized.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn initialize(&self, request: InitializePayment) -> Result<PaymentAuthorization> {
        to_minor_units(request.amount)?;
        let reference = request
            .reference
            .clone()
            .unwrap_or_else(|| PaymentReference::generate("TDL", chrono::Utc::now()));
        self.initialized.lock().unwrap().push(request);
        Ok(PaymentAuthorization {
            authorization_url: format!("https://checkout.example/{reference}"),
            access_code: "ac_test".to_string(),
            reference,
        })
    }

    async fn verify(&self, reference: &PaymentReference) -> Result<PaymentTransaction> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.status != PaymentStatus::Success {
            return Err(ShippingError::PaymentNotSuccessful {
                reference: reference.to_string(),
                status: self.status.to_string(),
            });
        }
        Ok(PaymentTransaction {
            reference: self
                .verified_reference
                .clone()
                .unwrap_or_else(|| reference.clone()),
            amount: self.amount,
            amount_minor: to_minor_units(self.amount)?,
            currency: "NGN".to_string(),
            status: self.status.clone(),
            paid_at: Some("2026-01-01T10:00:00Z".to_string()),
            channel: Some("card".to_string()),
            customer_email: None,
            metadata: self.metadata.clone(),
        })
    }
}

pub struct FakeOrders {
    pub reject_with: Option<u16>,
    pub delay: Duration,
    requests: Mutex<Vec<MakeOrderRequest>>,
    created: Mutex<Vec<Order>>,
}

impl FakeOrders {
    pub fn new() -> Self {
        Self {
            reject_with: None,
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(status: u16) -> Self {
        Self {
            reject_with: Some(status),
            ..Self::new()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<MakeOrderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderService for FakeOrders {
    async fn create_order(&self, auth_token: &str, request: &MakeOrderRequest) -> Result<Order> {
        if auth_token.trim().is_empty() {
            return Err(ShippingError::NotAuthenticated);
        }
        let order_no = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            format!("TDL-{:04}", requests.len())
        };
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(status) = self.reject_with {
            return Err(ShippingError::UpstreamRejected {
                status,
                detail: "Order creation failed".to_string(),
            });
        }
        let order = Order {
            id: Some("65f0".to_string()),
            order_no,
            zone_picked: request.zone_picked.to_string(),
            weight: Decimal::from(request.weight),
            email: Some(request.email.clone()),
            amount_paid: request.amount_paid,
            delivery_speed: Some(request.delivery_speed),
            status: OrderStatus::Pending,
            date_created: Some("2026-01-01T10:00:01".to_string()),
            extra: BTreeMap::new(),
        };
        self.created.lock().unwrap().push(order.clone());
        Ok(order)
    }

    async fn list_orders(&self, auth_token: &str) -> Result<Vec<Order>> {
        if auth_token.trim().is_empty() {
            return Err(ShippingError::NotAuthenticated);
        }
        if let Some(status) = self.reject_with {
            return Err(ShippingError::UpstreamRejected {
                status,
                detail: "Failed to fetch shipments".to_string(),
            });
        }
        Ok(self.created.lock().unwrap().clone())
    }
}
