use super::quote::to_cents_precision;
use crate::error::{Result, ShippingError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

pub const INSURANCE_RATE: Decimal = dec!(0.02);
pub const MINIMUM_FEE: Decimal = dec!(500);
pub const INSURANCE_CURRENCY: &str = "NGN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceQuote {
    #[serde(with = "rust_decimal::serde::float")]
    pub shipment_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub insurance_fee: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub insurance_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub minimum_fee: Decimal,
    pub currency: String,
}

/// Insurance is 2% of the declared value with a floor of 500.
pub fn quote_insurance(shipment_value: Decimal) -> Result<InsuranceQuote> {
    if shipment_value <= Decimal::ZERO {
        return Err(ShippingError::ValidationError(
            "Shipment value must be greater than 0".to_string(),
        ));
    }
    let fee = (shipment_value * INSURANCE_RATE).max(MINIMUM_FEE);
    Ok(InsuranceQuote {
        shipment_value,
        insurance_fee: to_cents_precision(fee),
        insurance_rate: INSURANCE_RATE,
        minimum_fee: MINIMUM_FEE,
        currency: INSURANCE_CURRENCY.to_string(),
    })
}
