use crate::domain::booking::{BookingDraft, BookingRequest};
use crate::domain::ports::RateServiceRef;
use crate::domain::quote::{DeliverySpeed, Quote, Weight, derive_delivery_options};
use crate::domain::zone::{ZoneId, ZoneTable};
use crate::error::{Result, ShippingError};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// The review screen shown before payment. Creates nothing upstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingSummary {
    pub zone_picked: ZoneId,
    pub zone_display: String,
    pub weight: Weight,
    pub weight_rounded: u32,
    pub delivery_speed: DeliverySpeed,
    pub estimated_delivery: String,
    pub amount: Decimal,
    pub currency: String,
    pub booking: BookingDraft,
}

/// Turns a destination and weight into a priced quote.
///
/// Holds the zone table and a rate service; one upstream call per quote.
#[derive(Clone)]
pub struct QuoteCalculator {
    zones: Arc<ZoneTable>,
    rates: RateServiceRef,
}

impl QuoteCalculator {
    pub fn new(zones: Arc<ZoneTable>, rates: RateServiceRef) -> Self {
        Self { zones, rates }
    }

    pub fn zones(&self) -> &ZoneTable {
        &self.zones
    }

    pub async fn build_quote(
        &self,
        pickup_country: &str,
        destination_country: &str,
        weight: Weight,
    ) -> Result<Quote> {
        if pickup_country.trim().is_empty() {
            return Err(ShippingError::ValidationError(
                "Missing required field: pickupCountry".to_string(),
            ));
        }

        let zone = self
            .zones
            .resolve_zone(destination_country)
            .ok_or_else(|| ShippingError::UnsupportedDestination(destination_country.trim().to_string()))?
            .clone();
        let zone_display = self
            .zones
            .display_name(&zone)
            .unwrap_or(zone.as_str())
            .to_string();

        let weight_rounded = weight.rounded()?;
        let base = self.rates.base_price(&zone, weight_rounded).await?;

        info!(
            %zone,
            weight = %weight,
            weight_rounded,
            base_price = %base.price,
            "quote built"
        );

        Ok(Quote {
            pickup_country: pickup_country.trim().to_string(),
            destination_country: destination_country.trim().to_string(),
            destination_zone: zone,
            zone_display,
            weight,
            weight_rounded,
            currency: base.currency,
            base_price: base.price,
            delivery_options: derive_delivery_options(base.price),
        })
    }

    /// Prices a filled-in booking form at the chosen speed.
    pub async fn price_booking(&self, request: BookingRequest) -> Result<BookingSummary> {
        request.fields.validate()?;
        let quote = self
            .build_quote(
                &request.pickup_country,
                &request.destination_country,
                request.fields.shipment_weight,
            )
            .await?;

        let option = quote.option(request.delivery_speed).ok_or_else(|| {
            ShippingError::ValidationError(format!(
                "Unsupported delivery speed: {}",
                request.delivery_speed
            ))
        })?;
        let amount = option.price;
        let estimated_delivery = option.estimated_delivery.clone();

        let (sender, receiver, shipment) = request.fields.into_parts();
        let booking = BookingDraft {
            zone_picked: quote.destination_zone.clone(),
            zone_display: quote.zone_display.clone(),
            delivery_speed: request.delivery_speed,
            amount,
            currency: quote.currency.clone(),
            sender,
            receiver,
            shipment,
        };

        Ok(BookingSummary {
            zone_picked: quote.destination_zone,
            zone_display: quote.zone_display,
            weight: quote.weight,
            weight_rounded: quote.weight_rounded,
            delivery_speed: request.delivery_speed,
            estimated_delivery,
            amount,
            currency: quote.currency,
            booking,
        })
    }
}
