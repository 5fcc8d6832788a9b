use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShippingError {
    #[error("Unsupported destination: {0}. Please check the destination country")]
    UnsupportedDestination(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("Upstream rejected the request ({status}): {detail}")]
    UpstreamRejected { status: u16, detail: String },
    #[error("Invalid price format: {0}")]
    InvalidPriceFormat(String),
    #[error("Payment could not be initialized: {0}")]
    PaymentNotInitialized(String),
    #[error("Payment verification failed: {0}")]
    PaymentVerificationFailed(String),
    #[error("Payment {reference} was not successful (status: {status})")]
    PaymentNotSuccessful { reference: String, status: String },
    #[error("An order has already been requested for payment {0}")]
    DuplicateOrderAttempt(String),
    #[error("No booking draft found for session {0}")]
    DraftNotFound(String),
    #[error("Zone table error: {0}")]
    ZoneTableError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for ShippingError {
    fn from(err: rocksdb::Error) -> Self {
        ShippingError::InternalError(Box::new(err))
    }
}

impl From<serde_json::Error> for ShippingError {
    fn from(err: serde_json::Error) -> Self {
        ShippingError::InternalError(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, ShippingError>;
