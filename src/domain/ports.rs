use super::booking::SessionDraft;
use super::order::{MakeOrderRequest, Order};
use super::payment::{InitializePayment, PaymentAuthorization, PaymentReference, PaymentTransaction};
use super::quote::BasePrice;
use super::zone::ZoneId;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Upstream rate table, priced per zone and whole-kilogram bracket.
#[async_trait]
pub trait RateService: Send + Sync {
    async fn base_price(&self, zone: &ZoneId, weight_rounded: u32) -> Result<BasePrice>;
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn initialize(&self, request: InitializePayment) -> Result<PaymentAuthorization>;
    async fn verify(&self, reference: &PaymentReference) -> Result<PaymentTransaction>;
}

/// The backend's order endpoints. Creation is not idempotent.
#[async_trait]
pub trait OrderService: Send + Sync {
    async fn create_order(&self, auth_token: &str, request: &MakeOrderRequest) -> Result<Order>;
    /// Orders belonging to the token's user.
    async fn list_orders(&self, auth_token: &str) -> Result<Vec<Order>>;
}

/// Key/value persistence for per-session drafts.
#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn put(&self, key: &str, draft: &SessionDraft) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<SessionDraft>>;
    async fn remove(&self, key: &str) -> Result<()>;
}

pub type RateServiceRef = Arc<dyn RateService>;
pub type PaymentGatewayRef = Arc<dyn PaymentGateway>;
pub type OrderServiceRef = Arc<dyn OrderService>;
pub type DraftStoreRef = Arc<dyn DraftStore>;
