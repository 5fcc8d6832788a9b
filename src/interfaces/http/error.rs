use crate::error::ShippingError;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

/// `ShippingError` rendered as `{detail}` with a matching status.
#[derive(Debug)]
pub struct ApiError(pub ShippingError);

impl From<ShippingError> for ApiError {
    fn from(err: ShippingError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(ShippingError::ValidationError(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(ShippingError::ValidationError(rejection.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ShippingError::UnsupportedDestination(_) => StatusCode::BAD_REQUEST,
            ShippingError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ShippingError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ShippingError::UpstreamRejected { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ShippingError::UpstreamUnavailable(_)
            | ShippingError::InvalidPriceFormat(_)
            | ShippingError::PaymentNotInitialized(_)
            | ShippingError::PaymentVerificationFailed(_) => StatusCode::BAD_GATEWAY,
            ShippingError::PaymentNotSuccessful { .. } => StatusCode::PAYMENT_REQUIRED,
            ShippingError::DuplicateOrderAttempt(_) => StatusCode::CONFLICT,
            ShippingError::DraftNotFound(_) => StatusCode::NOT_FOUND,
            ShippingError::ZoneTableError(_)
            | ShippingError::CsvError(_)
            | ShippingError::IoError(_)
            | ShippingError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn detail(&self) -> String {
        match &self.0 {
            ShippingError::ValidationError(msg) => msg.clone(),
            ShippingError::UpstreamRejected { detail, .. } => detail.clone(),
            ShippingError::InvalidPriceFormat(_) => {
                "The rate service returned a price that could not be read".to_string()
            }
            ShippingError::PaymentVerificationFailed(msg) => format!(
                "Payment verification failed: {msg}. If you were charged, please check the payment status again later"
            ),
            ShippingError::ZoneTableError(_)
            | ShippingError::CsvError(_)
            | ShippingError::IoError(_)
            | ShippingError::InternalError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, %status, "request failed");
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ShippingError::UnsupportedDestination("Atlantis".into()), 400),
            (ShippingError::ValidationError("x".into()), 422),
            (ShippingError::NotAuthenticated, 401),
            (ShippingError::UpstreamUnavailable("x".into()), 502),
            (ShippingError::UpstreamRejected { status: 403, detail: "no".into() }, 403),
            (ShippingError::InvalidPriceFormat("x".into()), 502),
            (ShippingError::PaymentNotSuccessful { reference: "r".into(), status: "failed".into() }, 402),
            (ShippingError::DuplicateOrderAttempt("r".into()), 409),
            (ShippingError::DraftNotFound("s".into()), 404),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status().as_u16(), status);
        }
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = ApiError(ShippingError::InternalError(Box::new(std::io::Error::other(
            "db password wrong",
        ))));
        assert_eq!(err.detail(), "Internal server error");
    }

    #[test]
    fn test_unsupported_destination_names_country() {
        let err = ApiError(ShippingError::UnsupportedDestination("Atlantis".into()));
        assert!(err.detail().contains("Atlantis"));
    }
}
