use super::booking::BookingDraft;
use super::quote::{DeliverySpeed, Weight};
use super::zone::ZoneId;
use crate::error::{Result, ShippingError};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distributions::Alphanumeric;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gateway-issued identifier of one payment attempt.
///
/// Doubles as the idempotency key for order creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PaymentReference(String);

impl PaymentReference {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            return Err(ShippingError::ValidationError(
                "Payment reference is required".to_string(),
            ));
        }
        if value.len() > 100
            || !value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '='))
        {
            return Err(ShippingError::ValidationError(format!(
                "Invalid payment reference: {value}"
            )));
        }
        Ok(Self(value))
    }

    /// `{prefix}_{unix millis}_{9 random lowercase alphanumerics}`.
    pub fn generate(prefix: &str, now: DateTime<Utc>) -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(9)
            .map(|b| char::from(b).to_ascii_lowercase())
            .collect();
        Self(format!("{prefix}_{}_{suffix}", now.timestamp_millis()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PaymentReference {
    type Error = ShippingError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<PaymentReference> for String {
    fn from(reference: PaymentReference) -> Self {
        reference.0
    }
}

impl fmt::Display for PaymentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Converts a major-unit amount (naira, dollars) to the integer minor units
/// the gateway accepts, rounding half away from zero.
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    if amount <= Decimal::ZERO {
        return Err(ShippingError::ValidationError(
            "Amount must be a positive number".to_string(),
        ));
    }
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| ShippingError::ValidationError(format!("Amount {amount} is out of range")))
}

pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Abandoned,
    Reversed,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Abandoned => "abandoned",
            PaymentStatus::Reversed => "reversed",
            PaymentStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomField {
    pub display_name: String,
    pub variable_name: String,
    pub value: String,
}

/// What travels with the payment through the gateway and comes back on
/// verification: enough to build the order without trusting the browser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentMetadata {
    #[serde(default)]
    pub zone: Option<ZoneId>,
    #[serde(default)]
    pub weight: Option<Weight>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub delivery_speed: DeliverySpeed,
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking: Option<BookingDraft>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_fields: Vec<CustomField>,
}

impl PaymentMetadata {
    pub fn new(zone: ZoneId, weight: Weight, email: String, delivery_speed: DeliverySpeed) -> Self {
        let custom_fields = vec![
            CustomField {
                display_name: "Destination Zone".to_string(),
                variable_name: "zone".to_string(),
                value: zone.to_string(),
            },
            CustomField {
                display_name: "Weight (kg)".to_string(),
                variable_name: "weight".to_string(),
                value: weight.value().normalize().to_string(),
            },
            CustomField {
                display_name: "Delivery Speed".to_string(),
                variable_name: "delivery_speed".to_string(),
                value: delivery_speed.to_string(),
            },
        ];
        Self {
            zone: Some(zone),
            weight: Some(weight),
            email: Some(email),
            delivery_speed,
            session: None,
            booking: None,
            custom_fields,
        }
    }

    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    pub fn with_booking(mut self, booking: BookingDraft) -> Self {
        self.booking = Some(booking);
        self
    }
}

#[derive(Debug, Clone)]
pub struct InitializePayment {
    pub amount: Decimal,
    pub email: String,
    pub reference: Option<PaymentReference>,
    pub metadata: PaymentMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAuthorization {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: PaymentReference,
}

/// A payment as confirmed by the gateway. Amounts are in major units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub reference: PaymentReference,
    pub amount: Decimal,
    pub amount_minor: i64,
    pub currency: String,
    pub status: PaymentStatus,
    #[serde(default)]
    pub paid_at: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    pub metadata: PaymentMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_minor_unit_conversion() {
        assert_eq!(to_minor_units(dec!(100.50)).unwrap(), 10050);
        assert_eq!(to_minor_units(dec!(0.015)).unwrap(), 2);
        assert_eq!(to_minor_units(dec!(1234.567)).unwrap(), 123457);
        assert!(to_minor_units(Decimal::ZERO).is_err());
        assert_eq!(from_minor_units(10050), dec!(100.50));
    }

    #[test]
    fn test_generated_reference_shape() {
        let now = DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        let reference = PaymentReference::generate("TDL", now);
        let parts: Vec<&str> = reference.as_str().split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "TDL");
        assert_eq!(parts[1], now.timestamp_millis().to_string());
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert!(PaymentReference::new(reference.as_str()).is_ok());
    }

    #[test]
    fn test_generated_references_differ() {
        let now = Utc::now();
        let a = PaymentReference::generate("TDL", now);
        let b = PaymentReference::generate("TDL", now);
        assert_ne!(a, b);
    }

    #[test]
    fn test_reference_rejects_path_characters() {
        assert!(PaymentReference::new("abc/../def").is_err());
        assert!(PaymentReference::new("   ").is_err());
    }

    #[test]
    fn test_unknown_status_tolerated() {
        let status: PaymentStatus = serde_json::from_str("\"ongoing\"").unwrap();
        assert_eq!(status, PaymentStatus::Unknown);
        let status: PaymentStatus = serde_json::from_str("\"success\"").unwrap();
        assert_eq!(status, PaymentStatus::Success);
    }

    #[test]
    fn test_metadata_tolerates_sparse_gateway_echo() {
        let metadata: PaymentMetadata =
            serde_json::from_value(serde_json::json!({"zone": "ASIA", "weight": 5})).unwrap();
        assert_eq!(metadata.zone.unwrap().as_str(), "ASIA");
        assert_eq!(metadata.weight.unwrap().value(), dec!(5));
        assert_eq!(metadata.delivery_speed, DeliverySpeed::Standard);
        assert!(metadata.email.is_none());
    }
}
