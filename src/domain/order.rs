use super::booking::BookingFields;
use super::quote::{DeliverySpeed, Weight};
use super::zone::ZoneId;
use crate::error::{Result, ShippingError};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Approved,
    Rejected,
    Delivered,
    #[serde(other)]
    Other,
}

/// Order record owned by the backend. Fields this crate does not model are
/// kept in `extra` so forwarding never drops data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub order_no: String,
    pub zone_picked: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub weight: Decimal,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount_paid: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_speed: Option<DeliverySpeed>,
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Payload for the backend's order-creation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MakeOrderRequest {
    #[serde(alias = "zone")]
    pub zone_picked: ZoneId,
    /// Billed whole kilograms. Fractional input rounds up.
    #[serde(deserialize_with = "billed_weight")]
    pub weight: u32,
    pub email: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount_paid: Decimal,
    #[serde(default)]
    pub delivery_speed: DeliverySpeed,
    #[serde(flatten)]
    pub booking: Option<BookingFields>,
}

fn billed_weight<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Weight::deserialize(deserializer)?
        .rounded()
        .map_err(serde::de::Error::custom)
}

impl MakeOrderRequest {
    pub fn new(
        zone_picked: ZoneId,
        weight: Weight,
        email: String,
        amount_paid: Decimal,
        delivery_speed: DeliverySpeed,
    ) -> Result<Self> {
        let request = Self {
            zone_picked,
            weight: weight.rounded()?,
            email,
            amount_paid,
            delivery_speed,
            booking: None,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn with_booking(mut self, booking: BookingFields) -> Self {
        self.booking = Some(booking);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.email.trim().is_empty() {
            return Err(ShippingError::ValidationError(
                "Missing required field: email".to_string(),
            ));
        }
        if self.weight == 0 {
            return Err(ShippingError::ValidationError(
                "Weight must be a positive number".to_string(),
            ));
        }
        if self.amount_paid <= Decimal::ZERO {
            return Err(ShippingError::ValidationError(
                "Amount paid must be a positive number".to_string(),
            ));
        }
        if let Some(booking) = &self.booking {
            booking.validate()?;
        }
        Ok(())
    }
}
