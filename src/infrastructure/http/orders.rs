use super::{error_detail, transport_error, trim_base};
use crate::domain::order::{MakeOrderRequest, Order};
use crate::domain::ports::OrderService;
use crate::error::{Result, ShippingError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, info, warn};

/// Client for the backend's `POST /api/make-order` and `GET /api/shipments`.
pub struct HttpOrderService {
    client: Client,
    base_url: String,
}

impl HttpOrderService {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }
}

#[async_trait]
impl OrderService for HttpOrderService {
    async fn create_order(&self, auth_token: &str, request: &MakeOrderRequest) -> Result<Order> {
        if auth_token.trim().is_empty() {
            return Err(ShippingError::NotAuthenticated);
        }
        request.validate()?;

        let response = self
            .client
            .post(format!("{}/api/make-order", self.base_url))
            .bearer_auth(auth_token)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error("order service", e))?;

        if !response.status().is_success() {
            let (status, detail) = error_detail(response, "Order creation failed").await;
            error!(zone = %request.zone_picked, %status, %detail, "order creation rejected");
            return Err(ShippingError::UpstreamRejected {
                status: status.as_u16(),
                detail,
            });
        }

        let order: Order = response.json().await.map_err(|e| {
            ShippingError::UpstreamUnavailable(format!("order service sent an unreadable body: {e}"))
        })?;
        info!(order_no = %order.order_no, zone = %order.zone_picked, "order created");
        Ok(order)
    }

    async fn list_orders(&self, auth_token: &str) -> Result<Vec<Order>> {
        if auth_token.trim().is_empty() {
            return Err(ShippingError::NotAuthenticated);
        }

        let response = self
            .client
            .get(format!("{}/api/shipments", self.base_url))
            .bearer_auth(auth_token)
            .send()
            .await
            .map_err(|e| transport_error("order service", e))?;

        if !response.status().is_success() {
            let (status, detail) = error_detail(response, "Failed to fetch shipments").await;
            warn!(%status, %detail, "shipment listing rejected");
            return Err(ShippingError::UpstreamRejected {
                status: status.as_u16(),
                detail,
            });
        }

        let body: Value = response.json().await.map_err(|e| {
            ShippingError::UpstreamUnavailable(format!("order service sent an unreadable body: {e}"))
        })?;
        let Value::Array(items) = body else {
            warn!("shipment listing was not a list; treating as empty");
            return Ok(Vec::new());
        };
        let orders = items
            .into_iter()
            .map(serde_json::from_value::<Order>)
            .collect::<std::result::Result<Vec<Order>, _>>()
            .map_err(|e| {
                ShippingError::UpstreamUnavailable(format!("order service sent an unreadable shipment: {e}"))
            })?;
        debug!(count = orders.len(), "shipments listed");
        Ok(orders)
    }
}
