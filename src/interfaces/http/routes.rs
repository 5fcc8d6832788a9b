use super::auth::bearer_token;
use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::application::quote::BookingSummary;
use crate::application::webhook::WebhookEvent;
use crate::domain::booking::{BookingDraft, BookingRequest, SessionDraft};
use crate::domain::insurance::{InsuranceQuote, quote_insurance};
use crate::domain::order::{MakeOrderRequest, Order};
use crate::domain::payment::{
    InitializePayment, PaymentAuthorization, PaymentMetadata, PaymentReference,
    PaymentTransaction,
};
use crate::domain::quote::{DeliverySpeed, Quote, Weight};
use crate::domain::zone::ZoneId;
use crate::error::ShippingError;
use crate::infrastructure::http::paystack::{SIGNATURE_HEADER, verify_webhook_signature};
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{info, warn};

type AppStateRef = State<Arc<AppState>>;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Serialize)]
pub struct ZoneSummary {
    pub zone: ZoneId,
    pub display_name: String,
    pub countries: Vec<String>,
}

pub async fn list_zones(State(state): AppStateRef) -> Json<Vec<ZoneSummary>> {
    let table = state.quotes.zones();
    let zones = table
        .zones()
        .iter()
        .map(|entry| ZoneSummary {
            zone: entry.zone.clone(),
            display_name: entry.display_name.clone(),
            countries: table.countries_in(&entry.zone).map(str::to_string).collect(),
        })
        .collect();
    Json(zones)
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    pub session: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    #[serde(rename = "pickupCountry")]
    pub pickup_country: String,
    #[serde(rename = "destinationCountry")]
    pub destination_country: String,
    pub weight: Weight,
}

/// `POST /api/quotations`. With `?session=` the quote becomes the session's
/// active quote.
pub async fn create_quote(
    State(state): AppStateRef,
    query: Result<Query<SessionQuery>, QueryRejection>,
    payload: Result<Json<QuoteRequest>, JsonRejection>,
) -> ApiResult<Json<Quote>> {
    let Query(query) = query?;
    let Json(request) = payload?;

    let quote = state
        .quotes
        .build_quote(&request.pickup_country, &request.destination_country, request.weight)
        .await?;

    if let Some(session) = query.session.as_deref() {
        state.cache.save_quote(session, quote.clone()).await?;
    }
    Ok(Json(quote))
}

/// `PUT /api/quotations`: prices the booking form for review.
pub async fn review_booking(
    State(state): AppStateRef,
    query: Result<Query<SessionQuery>, QueryRejection>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> ApiResult<Json<BookingSummary>> {
    let Query(query) = query?;
    let Json(request) = payload?;

    let summary = state.quotes.price_booking(request).await?;
    if let Some(session) = query.session.as_deref() {
        state.cache.save_booking(session, summary.booking.clone()).await?;
    }
    Ok(Json(summary))
}

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub weight: Weight,
}

#[derive(Debug, Serialize)]
pub struct PriceResponse {
    pub zone: ZoneId,
    pub weight: u32,
    pub price: Decimal,
    pub currency: String,
}

pub async fn rate_price(
    State(state): AppStateRef,
    Path(zone): Path<String>,
    query: Result<Query<PriceQuery>, QueryRejection>,
) -> ApiResult<Json<PriceResponse>> {
    let Query(query) = query?;
    let zone = ZoneId::new(&zone)?;
    if !state.quotes.zones().contains_zone(&zone) {
        return Err(ShippingError::UnsupportedDestination(zone.to_string()).into());
    }
    let weight = query.weight.rounded()?;
    let base = state.rates.base_price(&zone, weight).await?;
    Ok(Json(PriceResponse {
        zone,
        weight,
        price: base.price,
        currency: base.currency,
    }))
}

#[derive(Debug, Deserialize)]
pub struct InsuranceRequest {
    pub shipment_value: Decimal,
}

pub async fn calculate_insurance(
    payload: Result<Json<InsuranceRequest>, JsonRejection>,
) -> ApiResult<Json<InsuranceQuote>> {
    let Json(request) = payload?;
    Ok(Json(quote_insurance(request.shipment_value)?))
}

#[derive(Debug, Deserialize)]
pub struct InitializeRequest {
    pub amount: Decimal,
    pub email: String,
    pub zone: String,
    pub weight: Weight,
    #[serde(default)]
    pub delivery_speed: DeliverySpeed,
    #[serde(default)]
    pub reference: Option<PaymentReference>,
    #[serde(default)]
    pub booking: Option<BookingDraft>,
    #[serde(default)]
    pub session: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InitializeResponse {
    pub status: bool,
    pub message: String,
    pub data: PaymentAuthorization,
}

pub async fn initialize_payment(
    State(state): AppStateRef,
    payload: Result<Json<InitializeRequest>, JsonRejection>,
) -> ApiResult<Json<InitializeResponse>> {
    let Json(request) = payload?;
    if request.email.trim().is_empty() {
        return Err(ShippingError::ValidationError("Missing required field: email".to_string()).into());
    }
    let zone = ZoneId::new(&request.zone)?;
    if !state.quotes.zones().contains_zone(&zone) {
        return Err(ShippingError::UnsupportedDestination(zone.to_string()).into());
    }

    let booking = match (request.booking, request.session.as_deref()) {
        (Some(booking), _) => Some(booking),
        (None, Some(session)) => state.cache.load(session).await?.and_then(|d| d.booking),
        (None, None) => None,
    };

    let mut metadata =
        PaymentMetadata::new(zone, request.weight, request.email.clone(), request.delivery_speed);
    if let Some(session) = request.session {
        metadata = metadata.with_session(session);
    }
    if let Some(booking) = booking {
        metadata = metadata.with_booking(booking);
    }

    let authorization = state
        .gateway
        .initialize(InitializePayment {
            amount: request.amount,
            email: request.email,
            reference: request.reference,
            metadata,
        })
        .await?;

    Ok(Json(InitializeResponse {
        status: true,
        message: "Authorization URL created".to_string(),
        data: authorization,
    }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    pub reference: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub status: bool,
    pub message: String,
    pub data: PaymentTransaction,
    /// Whether the gateway has confirmed this payment server-to-server.
    pub confirmed_by_webhook: bool,
}

pub async fn verify_payment(
    State(state): AppStateRef,
    query: Result<Query<VerifyQuery>, QueryRejection>,
) -> ApiResult<Json<VerifyResponse>> {
    let Query(query) = query?;
    let reference = PaymentReference::new(query.reference)?;
    let transaction = state.gateway.verify(&reference).await?;
    Ok(Json(VerifyResponse {
        status: true,
        message: "Payment verified".to_string(),
        confirmed_by_webhook: state.ledger.is_confirmed(&reference),
        data: transaction,
    }))
}

pub async fn payment_webhook(
    State(state): AppStateRef,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let Some(secret) = state.webhook_secret.as_deref() else {
        warn!("webhook received but no gateway secret is configured");
        return Err(ShippingError::NotAuthenticated.into());
    };
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !verify_webhook_signature(secret, &body, signature) {
        warn!("webhook signature rejected");
        return Err(ShippingError::NotAuthenticated.into());
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ShippingError::ValidationError(format!("Malformed webhook payload: {e}")))?;
    let recorded = state.ledger.record(&event);
    Ok(Json(json!({ "received": true, "recorded": recorded })))
}

pub async fn create_order(
    State(state): AppStateRef,
    headers: HeaderMap,
    payload: Result<Json<MakeOrderRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let token = bearer_token(&headers)?;
    let Json(request) = payload?;
    request.validate()?;
    let order = state.orders.create_order(&token, &request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[derive(Debug, Serialize)]
pub struct ShipmentList {
    pub shipments: Vec<Order>,
    pub total: usize,
}

/// `GET /api/shipments`: the caller's orders, for tracking.
pub async fn list_shipments(
    State(state): AppStateRef,
    headers: HeaderMap,
) -> ApiResult<Json<ShipmentList>> {
    let token = bearer_token(&headers)?;
    let shipments = state.orders.list_orders(&token).await?;
    Ok(Json(ShipmentList {
        total: shipments.len(),
        shipments,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ReconcileRequest {
    pub reference: String,
    pub session: String,
}

pub async fn reconcile_order(
    State(state): AppStateRef,
    headers: HeaderMap,
    payload: Result<Json<ReconcileRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let token = bearer_token(&headers)?;
    let Json(request) = payload?;
    let reference = PaymentReference::new(request.reference)?;

    if !state.ledger.is_confirmed(&reference) {
        info!(%reference, "reconciling before webhook confirmation");
    }
    let order = state
        .reconciler
        .reconcile(&request.session, &reference, &token)
        .await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_draft(
    State(state): AppStateRef,
    Path(session): Path<String>,
) -> ApiResult<Json<SessionDraft>> {
    state
        .cache
        .load(&session)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError(ShippingError::DraftNotFound(session)))
}

#[derive(Debug, Deserialize)]
pub struct DraftPayload {
    #[serde(default)]
    pub quote: Option<Quote>,
    #[serde(default)]
    pub booking: Option<BookingDraft>,
}

pub async fn put_draft(
    State(state): AppStateRef,
    Path(session): Path<String>,
    payload: Result<Json<DraftPayload>, JsonRejection>,
) -> ApiResult<Json<SessionDraft>> {
    let Json(payload) = payload?;
    let draft = SessionDraft {
        quote: payload.quote,
        booking: payload.booking,
        updated_at: Utc::now(),
    };
    if draft.is_empty() {
        return Err(ShippingError::ValidationError("Draft has neither quote nor booking".to_string()).into());
    }
    state.cache.save(&session, &draft).await?;
    Ok(Json(draft))
}

pub async fn delete_draft(
    State(state): AppStateRef,
    Path(session): Path<String>,
) -> ApiResult<StatusCode> {
    state.cache.clear(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}
