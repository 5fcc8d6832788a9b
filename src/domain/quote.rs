use super::zone::ZoneId;
use crate::error::{Result, ShippingError};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Shipment weight in kilograms. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Weight(Decimal);

impl Weight {
    pub fn new(kg: Decimal) -> Result<Self> {
        if kg > Decimal::ZERO {
            Ok(Self(kg))
        } else {
            Err(ShippingError::ValidationError(
                "Weight must be greater than 0".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// The billed weight bracket: rates are priced per whole kilogram, so
    /// any fraction rounds up.
    pub fn rounded(&self) -> Result<u32> {
        self.0.ceil().to_u32().ok_or_else(|| {
            ShippingError::ValidationError(format!("Weight {} is out of range", self.0))
        })
    }
}

impl TryFrom<Decimal> for Weight {
    type Error = ShippingError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl Serialize for Weight {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Weight {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Weight::new(value).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}kg", self.0.normalize())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliverySpeed {
    Economy,
    #[default]
    Standard,
    Express,
}

impl DeliverySpeed {
    /// Tiers in presentation order.
    pub const ALL: [DeliverySpeed; 3] = [
        DeliverySpeed::Economy,
        DeliverySpeed::Standard,
        DeliverySpeed::Express,
    ];

    /// Fixed multiplier applied to the standard base price.
    pub fn multiplier(&self) -> Decimal {
        match self {
            DeliverySpeed::Economy => dec!(0.5),
            DeliverySpeed::Standard => Decimal::ONE,
            DeliverySpeed::Express => dec!(2),
        }
    }

    pub fn estimated_delivery(&self) -> &'static str {
        match self {
            DeliverySpeed::Economy => "14-21 business days",
            DeliverySpeed::Standard => "7-10 business days",
            DeliverySpeed::Express => "3-5 business days",
        }
    }
}

impl fmt::Display for DeliverySpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliverySpeed::Economy => write!(f, "economy"),
            DeliverySpeed::Standard => write!(f, "standard"),
            DeliverySpeed::Express => write!(f, "express"),
        }
    }
}

/// Standard-tier price for a zone and billed weight, as returned by the rate
/// service after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasePrice {
    pub price: Decimal,
    pub currency: String,
}

/// Rounds a monetary value to two places and pins the scale so it renders
/// as `25.00`, not `25` or `25.000`.
pub fn to_cents_precision(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryOption {
    pub speed: DeliverySpeed,
    pub price: Decimal,
    pub estimated_delivery: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub multiplier: Decimal,
}

impl DeliveryOption {
    pub fn from_base(speed: DeliverySpeed, base: Decimal) -> Self {
        Self {
            speed,
            price: to_cents_precision(base * speed.multiplier()),
            estimated_delivery: speed.estimated_delivery().to_string(),
            multiplier: speed.multiplier(),
        }
    }
}

/// Derives the economy/standard/express tiers from a single base price.
pub fn derive_delivery_options(base: Decimal) -> Vec<DeliveryOption> {
    DeliverySpeed::ALL
        .iter()
        .map(|speed| DeliveryOption::from_base(*speed, base))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub pickup_country: String,
    pub destination_country: String,
    pub destination_zone: ZoneId,
    pub zone_display: String,
    pub weight: Weight,
    pub weight_rounded: u32,
    pub currency: String,
    pub base_price: Decimal,
    pub delivery_options: Vec<DeliveryOption>,
}

impl Quote {
    pub fn option(&self, speed: DeliverySpeed) -> Option<&DeliveryOption> {
        self.delivery_options.iter().find(|o| o.speed == speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_rounds_up_to_whole_kilogram() {
        assert_eq!(Weight::new(dec!(2.3)).unwrap().rounded().unwrap(), 3);
        assert_eq!(Weight::new(dec!(2.0)).unwrap().rounded().unwrap(), 2);
        assert_eq!(Weight::new(dec!(0.01)).unwrap().rounded().unwrap(), 1);
    }

    #[test]
    fn test_weight_must_be_positive() {
        assert!(matches!(
            Weight::new(Decimal::ZERO),
            Err(ShippingError::ValidationError(_))
        ));
        assert!(matches!(
            Weight::new(dec!(-1.5)),
            Err(ShippingError::ValidationError(_))
        ));
    }

    #[test]
    fn test_weight_json_accepts_numbers_and_rejects_zero() {
        let weight: Weight = serde_json::from_str("2.3").unwrap();
        assert_eq!(weight.value(), dec!(2.3));
        assert!(serde_json::from_str::<Weight>("0").is_err());
        assert_eq!(serde_json::to_string(&weight).unwrap(), "2.3");
    }

    #[test]
    fn test_tiers_derived_from_base() {
        let options = derive_delivery_options(dec!(50));
        let prices: Vec<String> = options.iter().map(|o| o.price.to_string()).collect();
        assert_eq!(prices, vec!["25.00", "50.00", "100.00"]);
        assert_eq!(options[0].speed, DeliverySpeed::Economy);
        assert_eq!(options[0].estimated_delivery, "14-21 business days");
        assert_eq!(options[2].estimated_delivery, "3-5 business days");
    }

    #[test]
    fn test_odd_cent_base_halves_to_two_places() {
        let options = derive_delivery_options(dec!(1234.57));
        assert_eq!(options[0].price, dec!(617.29));
        assert_eq!(options[1].price, dec!(1234.57));
        assert_eq!(options[2].price, dec!(2469.14));
    }

    #[test]
    fn test_delivery_option_wire_format() {
        let option = DeliveryOption::from_base(DeliverySpeed::Express, dec!(50));
        let json = serde_json::to_value(&option).unwrap();
        assert_eq!(json["speed"], "express");
        assert_eq!(json["price"], "100.00");
        assert_eq!(json["multiplier"], 2.0);
    }
}
