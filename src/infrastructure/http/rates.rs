use super::{error_detail, transport_error, trim_base};
use crate::domain::ports::RateService;
use crate::domain::quote::BasePrice;
use crate::domain::zone::ZoneId;
use crate::error::{Result, ShippingError};
use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, error, warn};

const DEFAULT_CURRENCY: &str = "NGN";

/// Response of `GET /api/rates/{zone}/price`.
#[derive(Debug, Deserialize)]
struct PriceResponse {
    price: Value,
    currency: Option<String>,
}

/// Normalizes an upstream price that may be numeric or a string with
/// thousands separators, e.g. `"1,234.56"`.
pub fn parse_price(raw: &Value) -> Result<Decimal> {
    let parsed = match raw {
        Value::String(s) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
            Decimal::from_str(&cleaned).ok()
        }
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        _ => None,
    };

    match parsed {
        Some(price) if price >= Decimal::ZERO => Ok(price),
        _ => Err(ShippingError::InvalidPriceFormat(raw.to_string())),
    }
}

/// Client for the backend's rate table.
pub struct RateLookupClient {
    client: Client,
    base_url: String,
}

impl RateLookupClient {
    /// # Arguments
    /// * `base_url` - Base URL of the backend (e.g., "http://localhost:8000")
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }
}

#[async_trait]
impl RateService for RateLookupClient {
    async fn base_price(&self, zone: &ZoneId, weight_rounded: u32) -> Result<BasePrice> {
        if weight_rounded == 0 {
            return Err(ShippingError::ValidationError(
                "Weight must be greater than 0".to_string(),
            ));
        }

        let url = format!("{}/api/rates/{}/price", self.base_url, zone);
        debug!(%url, weight = weight_rounded, "looking up base price");

        let response = self
            .client
            .get(&url)
            .query(&[("weight", weight_rounded)])
            .send()
            .await
            .map_err(|e| transport_error("rate service", e))?;

        if !response.status().is_success() {
            let (status, detail) = error_detail(response, "Failed to fetch price").await;
            warn!(%zone, weight = weight_rounded, %status, %detail, "rate lookup rejected");
            return Err(ShippingError::UpstreamUnavailable(format!(
                "rate service returned {status}: {detail}"
            )));
        }

        let body: PriceResponse = response.json().await.map_err(|e| {
            ShippingError::UpstreamUnavailable(format!("rate service sent an unreadable body: {e}"))
        })?;

        let price = parse_price(&body.price).inspect_err(|_| {
            error!(%zone, weight = weight_rounded, raw = %body.price, "rate service returned an invalid price");
        })?;

        Ok(BasePrice {
            price,
            currency: body
                .currency
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http::build_client;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use rust_decimal_macros::dec;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;

    #[test]
    fn test_parse_comma_formatted_price() {
        assert_eq!(parse_price(&json!("1,234.56")).unwrap(), dec!(1234.56));
        assert_eq!(parse_price(&json!("12,345,678")).unwrap(), dec!(12345678));
        assert_eq!(parse_price(&json!(" 50 ")).unwrap(), dec!(50));
    }

    #[test]
    fn test_parse_numeric_price() {
        assert_eq!(parse_price(&json!(50)).unwrap(), dec!(50));
        assert_eq!(parse_price(&json!(99.95)).unwrap(), dec!(99.95));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for raw in [json!("NaN"), json!("abc"), json!(""), json!(null), json!(-5), json!({})] {
            assert!(
                matches!(parse_price(&raw), Err(ShippingError::InvalidPriceFormat(_))),
                "{raw} should be rejected"
            );
        }
    }

    async fn spawn(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client() -> Client {
        build_client(Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_lookup_sends_zone_and_weight() {
        let app = Router::new().route(
            "/api/rates/{zone}/price",
            get(
                |Path(zone): Path<String>, Query(q): Query<HashMap<String, String>>| async move {
                    Json(json!({
                        "zone": zone,
                        "weight": q["weight"].parse::<u32>().unwrap(),
                        "price": "1,234.56",
                        "currency": "NGN"
                    }))
                },
            ),
        );
        let base = spawn(app).await;
        let rates = RateLookupClient::new(client(), &base);

        let price = rates
            .base_price(&ZoneId::new("ASIA").unwrap(), 3)
            .await
            .unwrap();
        assert_eq!(price.price, dec!(1234.56));
        assert_eq!(price.currency, "NGN");
    }

    #[tokio::test]
    async fn test_non_success_is_upstream_unavailable() {
        let app = Router::new().route(
            "/api/rates/{zone}/price",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"detail": "No rate for zone"})),
                )
            }),
        );
        let base = spawn(app).await;
        let rates = RateLookupClient::new(client(), &base);

        let err = rates
            .base_price(&ZoneId::new("ASIA").unwrap(), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, ShippingError::UpstreamUnavailable(ref m) if m.contains("No rate for zone")));
    }

    #[tokio::test]
    async fn test_invalid_price_is_typed_error() {
        let app = Router::new().route(
            "/api/rates/{zone}/price",
            get(|| async { Json(json!({"zone": "ASIA", "weight": 3, "price": "n/a", "currency": "NGN"})) }),
        );
        let base = spawn(app).await;
        let rates = RateLookupClient::new(client(), &base);

        let err = rates
            .base_price(&ZoneId::new("ASIA").unwrap(), 3)
            .await
            .unwrap_err();
        assert!(matches!(err, ShippingError::InvalidPriceFormat(_)));
    }

    #[tokio::test]
    async fn test_echoed_fields_do_not_affect_parsing() {
        for echoed in [json!(3.0), json!("3"), json!(null)] {
            let app = Router::new().route(
                "/api/rates/{zone}/price",
                get(move || {
                    let echoed = echoed.clone();
                    async move { Json(json!({"zone": "Asia", "weight": echoed, "price": 50})) }
                }),
            );
            let base = spawn(app).await;
            let rates = RateLookupClient::new(client(), &base);

            let price = rates
                .base_price(&ZoneId::new("ASIA").unwrap(), 3)
                .await
                .unwrap();
            assert_eq!(price.price, dec!(50));
        }
    }

    #[tokio::test]
    async fn test_unreachable_upstream() {
        let rates = RateLookupClient::new(client(), "http://127.0.0.1:9");
        let err = rates
            .base_price(&ZoneId::new("ASIA").unwrap(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ShippingError::UpstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let app = Router::new().route(
            "/api/rates/{zone}/price",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"price": 1}))
            }),
        );
        let base = spawn(app).await;
        let rates = RateLookupClient::new(build_client(Duration::from_millis(200)).unwrap(), &base);

        let err = rates
            .base_price(&ZoneId::new("ASIA").unwrap(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ShippingError::UpstreamUnavailable(ref m) if m.contains("timed out")));
    }
}
