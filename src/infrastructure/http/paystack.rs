use super::{error_detail, transport_error, trim_base};
use crate::domain::payment::{
    InitializePayment, PaymentAuthorization, PaymentMetadata, PaymentReference, PaymentStatus,
    PaymentTransaction, from_minor_units, to_minor_units,
};
use crate::domain::ports::PaymentGateway;
use crate::error::{Result, ShippingError};
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::Sha512;
use tracing::{info, warn};

type HmacSha512 = Hmac<Sha512>;

/// Header carrying the hex HMAC-SHA512 of a webhook body.
pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

/// Checks a webhook signature against the raw request body.
pub fn verify_webhook_signature(secret: &str, body: &[u8], signature_hex: &str) -> bool {
    let Ok(provided) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&provided).is_ok()
}

/// Signs a body the way the gateway does. Used by fakes and tooling.
pub fn sign_webhook_body(secret: &str, body: &[u8]) -> Result<String> {
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
        .map_err(|e| ShippingError::InternalError(Box::new(std::io::Error::other(e.to_string()))))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub base_url: String,
    pub secret_key: String,
    pub callback_url: String,
    pub reference_prefix: String,
}

#[derive(Serialize)]
struct InitializeBody<'a> {
    email: &'a str,
    amount: i64,
    reference: &'a str,
    callback_url: &'a str,
    metadata: &'a PaymentMetadata,
}

#[derive(Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Deserialize)]
struct InitializeData {
    authorization_url: String,
    access_code: String,
    reference: PaymentReference,
}

#[derive(Deserialize)]
struct Customer {
    email: Option<String>,
}

#[derive(Deserialize)]
struct VerifyData {
    reference: PaymentReference,
    amount: i64,
    #[serde(default)]
    currency: Option<String>,
    status: PaymentStatus,
    #[serde(default)]
    paid_at: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    customer: Option<Customer>,
    #[serde(default)]
    metadata: Value,
}

/// The gateway echoes metadata as an object, a JSON string, or `""`/`null`
/// when the payment was started without any. Anything else is an error:
/// an order must never be built from metadata that was quietly dropped.
fn decode_metadata(reference: &PaymentReference, raw: Value) -> Result<PaymentMetadata> {
    let decoded: serde_json::Result<PaymentMetadata> = match &raw {
        Value::Null => return Ok(PaymentMetadata::default()),
        Value::String(s) if s.trim().is_empty() => return Ok(PaymentMetadata::default()),
        Value::String(s) => serde_json::from_str(s),
        _ => serde_json::from_value(raw.clone()),
    };
    decoded.map_err(|e| {
        warn!(%reference, metadata = %raw, error = %e, "gateway returned unreadable metadata");
        ShippingError::PaymentVerificationFailed(format!(
            "payment {reference} carries unreadable metadata: {e}"
        ))
    })
}

/// Paystack transaction API adapter.
pub struct PaystackGateway {
    client: Client,
    config: PaystackConfig,
}

impl PaystackGateway {
    pub fn new(client: Client, config: PaystackConfig) -> Self {
        Self {
            client,
            config: PaystackConfig {
                base_url: trim_base(&config.base_url),
                ..config
            },
        }
    }

    pub fn secret_key(&self) -> &str {
        &self.config.secret_key
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn initialize(&self, request: InitializePayment) -> Result<PaymentAuthorization> {
        let amount_minor = to_minor_units(request.amount)?;
        if request.email.trim().is_empty() {
            return Err(ShippingError::ValidationError(
                "Missing required field: email".to_string(),
            ));
        }
        let reference = request
            .reference
            .unwrap_or_else(|| PaymentReference::generate(&self.config.reference_prefix, Utc::now()));

        let body = InitializeBody {
            email: &request.email,
            amount: amount_minor,
            reference: reference.as_str(),
            callback_url: &self.config.callback_url,
            metadata: &request.metadata,
        };

        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.config.base_url))
            .bearer_auth(&self.config.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("payment gateway", e))?;

        if !response.status().is_success() {
            let (status, detail) = error_detail(response, "Failed to initialize payment").await;
            warn!(%reference, %status, %detail, "payment initialization rejected");
            return Err(ShippingError::PaymentNotInitialized(detail));
        }

        let envelope: Envelope<InitializeData> = response
            .json()
            .await
            .map_err(|e| ShippingError::PaymentNotInitialized(format!("unreadable gateway response: {e}")))?;

        match envelope.data {
            Some(data) if envelope.status => {
                info!(reference = %data.reference, amount_minor, "payment initialized");
                Ok(PaymentAuthorization {
                    authorization_url: data.authorization_url,
                    access_code: data.access_code,
                    reference: data.reference,
                })
            }
            _ => Err(ShippingError::PaymentNotInitialized(envelope.message)),
        }
    }

    async fn verify(&self, reference: &PaymentReference) -> Result<PaymentTransaction> {
        let response = self
            .client
            .get(format!(
                "{}/transaction/verify/{}",
                self.config.base_url, reference
            ))
            .bearer_auth(&self.config.secret_key)
            .send()
            .await
            .map_err(|e| transport_error("payment gateway", e))?;

        if !response.status().is_success() {
            let (status, detail) = error_detail(response, "Payment verification failed").await;
            warn!(%reference, %status, %detail, "payment verification rejected");
            return Err(ShippingError::PaymentVerificationFailed(detail));
        }

        let envelope: Envelope<VerifyData> = response.json().await.map_err(|e| {
            ShippingError::PaymentVerificationFailed(format!("unreadable gateway response: {e}"))
        })?;

        let data = match envelope.data {
            Some(data) if envelope.status => data,
            _ => return Err(ShippingError::PaymentVerificationFailed(envelope.message)),
        };

        if data.status != PaymentStatus::Success {
            warn!(%reference, status = %data.status, "payment not successful");
            return Err(ShippingError::PaymentNotSuccessful {
                reference: reference.to_string(),
                status: data.status.to_string(),
            });
        }

        let metadata = decode_metadata(reference, data.metadata)?;
        info!(%reference, amount_minor = data.amount, "payment verified");
        Ok(PaymentTransaction {
            reference: data.reference,
            amount: from_minor_units(data.amount),
            amount_minor: data.amount,
            currency: data.currency.unwrap_or_else(|| "NGN".to_string()),
            status: data.status,
            paid_at: data.paid_at,
            channel: data.channel,
            customer_email: data.customer.and_then(|c| c.email),
            metadata,
        })
    }
}
