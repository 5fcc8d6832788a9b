use super::quote::{DeliverySpeed, Quote, Weight};
use super::zone::ZoneId;
use crate::error::{Result, ShippingError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sender {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub state: String,
    pub city: String,
    pub country: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receiver {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub state: String,
    pub city: String,
    pub post_code: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shipment {
    pub description: String,
    pub quantity: u32,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub value: Option<Decimal>,
    pub weight: Weight,
}

/// The flat field layout used on the wire by the booking form and by the
/// backend's order endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingFields {
    pub sender_name: String,
    pub sender_phone: String,
    pub sender_address: String,
    pub sender_state: String,
    pub sender_city: String,
    pub sender_country: String,
    pub sender_email: String,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub receiver_address: String,
    pub receiver_state: String,
    pub receiver_city: String,
    pub receiver_post_code: String,
    pub receiver_country: String,
    pub shipment_description: String,
    pub shipment_quantity: u32,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub shipment_value: Option<Decimal>,
    pub shipment_weight: Weight,
}

impl BookingFields {
    /// Rejects blank required fields and a zero quantity.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("sender_name", &self.sender_name),
            ("sender_phone", &self.sender_phone),
            ("sender_address", &self.sender_address),
            ("sender_city", &self.sender_city),
            ("sender_country", &self.sender_country),
            ("sender_email", &self.sender_email),
            ("receiver_name", &self.receiver_name),
            ("receiver_phone", &self.receiver_phone),
            ("receiver_address", &self.receiver_address),
            ("receiver_city", &self.receiver_city),
            ("receiver_country", &self.receiver_country),
            ("shipment_description", &self.shipment_description),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ShippingError::ValidationError(format!(
                "Missing required field: {field}"
            )));
        }
        if self.shipment_quantity == 0 {
            return Err(ShippingError::ValidationError(
                "Shipment quantity must be a positive number".to_string(),
            ));
        }
        if let Some(value) = self.shipment_value
            && value < Decimal::ZERO
        {
            return Err(ShippingError::ValidationError(
                "Shipment value must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_parts(self) -> (Sender, Receiver, Shipment) {
        (
            Sender {
                name: self.sender_name,
                phone: self.sender_phone,
                address: self.sender_address,
                state: self.sender_state,
                city: self.sender_city,
                country: self.sender_country,
                email: self.sender_email,
            },
            Receiver {
                name: self.receiver_name,
                phone: self.receiver_phone,
                address: self.receiver_address,
                state: self.receiver_state,
                city: self.receiver_city,
                post_code: self.receiver_post_code,
                country: self.receiver_country,
            },
            Shipment {
                description: self.shipment_description,
                quantity: self.shipment_quantity,
                value: self.shipment_value,
                weight: self.shipment_weight,
            },
        )
    }
}

/// The complete order payload waiting on payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingDraft {
    pub zone_picked: ZoneId,
    pub zone_display: String,
    pub delivery_speed: DeliverySpeed,
    pub amount: Decimal,
    pub currency: String,
    pub sender: Sender,
    pub receiver: Receiver,
    pub shipment: Shipment,
}

impl BookingDraft {
    pub fn to_fields(&self) -> BookingFields {
        BookingFields {
            sender_name: self.sender.name.clone(),
            sender_phone: self.sender.phone.clone(),
            sender_address: self.sender.address.clone(),
            sender_state: self.sender.state.clone(),
            sender_city: self.sender.city.clone(),
            sender_country: self.sender.country.clone(),
            sender_email: self.sender.email.clone(),
            receiver_name: self.receiver.name.clone(),
            receiver_phone: self.receiver.phone.clone(),
            receiver_address: self.receiver.address.clone(),
            receiver_state: self.receiver.state.clone(),
            receiver_city: self.receiver.city.clone(),
            receiver_post_code: self.receiver.post_code.clone(),
            receiver_country: self.receiver.country.clone(),
            shipment_description: self.shipment.description.clone(),
            shipment_quantity: self.shipment.quantity,
            shipment_value: self.shipment.value,
            shipment_weight: self.shipment.weight,
        }
    }
}

/// What the booking form submits for review before payment.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    #[serde(rename = "pickupCountry")]
    pub pickup_country: String,
    #[serde(rename = "destinationCountry")]
    pub destination_country: String,
    pub delivery_speed: DeliverySpeed,
    #[serde(flatten)]
    pub fields: BookingFields,
}

/// Everything cached for one session between quoting and order creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDraft {
    #[serde(default)]
    pub quote: Option<Quote>,
    #[serde(default)]
    pub booking: Option<BookingDraft>,
    pub updated_at: DateTime<Utc>,
}

impl SessionDraft {
    pub fn is_empty(&self) -> bool {
        self.quote.is_none() && self.booking.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_fields() -> BookingFields {
        BookingFields {
            sender_name: "Ada Obi".to_string(),
            sender_phone: "+2348000000000".to_string(),
            sender_address: "1 Marina".to_string(),
            sender_state: "Lagos".to_string(),
            sender_city: "Lagos".to_string(),
            sender_country: "Nigeria".to_string(),
            sender_email: "ada@example.com".to_string(),
            receiver_name: "John Smith".to_string(),
            receiver_phone: "+447000000000".to_string(),
            receiver_address: "10 Downing St".to_string(),
            receiver_state: "London".to_string(),
            receiver_city: "London".to_string(),
            receiver_post_code: "SW1A 2AA".to_string(),
            receiver_country: "United Kingdom".to_string(),
            shipment_description: "Books".to_string(),
            shipment_quantity: 2,
            shipment_value: Some(dec!(30000)),
            shipment_weight: Weight::new(dec!(2.3)).unwrap(),
        }
    }

    #[test]
    fn test_valid_fields_pass() {
        assert!(sample_fields().validate().is_ok());
    }

    #[test]
    fn test_blank_receiver_name_rejected() {
        let mut fields = sample_fields();
        fields.receiver_name = "  ".to_string();
        let err = fields.validate().unwrap_err();
        assert!(err.to_string().contains("receiver_name"));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut fields = sample_fields();
        fields.shipment_quantity = 0;
        assert!(matches!(
            fields.validate(),
            Err(ShippingError::ValidationError(_))
        ));
    }

    #[test]
    fn test_parts_round_back_to_fields() {
        let fields = sample_fields();
        let (sender, receiver, shipment) = fields.clone().into_parts();
        let draft = BookingDraft {
            zone_picked: ZoneId::new("UK_IRELAND").unwrap(),
            zone_display: "UK/Ireland".to_string(),
            delivery_speed: DeliverySpeed::Express,
            amount: dec!(100.00),
            currency: "NGN".to_string(),
            sender,
            receiver,
            shipment,
        };
        assert_eq!(draft.to_fields(), fields);
    }

    #[test]
    fn test_booking_request_reads_flat_form() {
        let json = serde_json::json!({
            "pickupCountry": "Nigeria",
            "destinationCountry": "United Kingdom",
            "delivery_speed": "economy",
            "sender_name": "Ada Obi",
            "sender_phone": "1",
            "sender_address": "a",
            "sender_state": "Lagos",
            "sender_city": "Lagos",
            "sender_country": "Nigeria",
            "sender_email": "ada@example.com",
            "receiver_name": "John",
            "receiver_phone": "2",
            "receiver_address": "b",
            "receiver_state": "London",
            "receiver_city": "London",
            "receiver_post_code": "SW1A",
            "receiver_country": "United Kingdom",
            "shipment_description": "Books",
            "shipment_quantity": 1,
            "shipment_weight": 1.5
        });
        let request: BookingRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.delivery_speed, DeliverySpeed::Economy);
        assert_eq!(request.fields.shipment_value, None);
        assert_eq!(request.fields.shipment_weight.value(), dec!(1.5));
    }
}
