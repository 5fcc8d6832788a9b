//! The service's own JSON API.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use axum::Router;
use axum::http::Method;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::routing::{get, post};
use state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/zones", get(routes::list_zones))
        .route(
            "/api/quotations",
            post(routes::create_quote).put(routes::review_booking),
        )
        .route("/api/rates/{zone}/price", get(routes::rate_price))
        .route("/api/calculate-insurance", post(routes::calculate_insurance))
        .route("/api/payments/initialize", post(routes::initialize_payment))
        .route("/api/payments/verify", get(routes::verify_payment))
        .route("/api/payments/webhook", post(routes::payment_webhook))
        .route("/api/orders/create", post(routes::create_order))
        .route("/api/orders/reconcile", post(routes::reconcile_order))
        .route("/api/shipments", get(routes::list_shipments))
        .route(
            "/api/drafts/{session}",
            get(routes::get_draft)
                .put(routes::put_draft)
                .delete(routes::delete_draft),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
