use crate::domain::booking::{BookingDraft, SessionDraft};
use crate::domain::ports::DraftStoreRef;
use crate::domain::quote::Quote;
use crate::error::{Result, ShippingError};
use chrono::Utc;
use tracing::debug;

const KEY_PREFIX: &str = "transdom_booking_details";

/// Per-session cache of the active quote and booking draft.
///
/// A session holds at most one draft; every save replaces it. Only
/// shipment and contact data is kept here, never payment credentials.
#[derive(Clone)]
pub struct ClientQuoteCache {
    store: DraftStoreRef,
}

impl ClientQuoteCache {
    pub fn new(store: DraftStoreRef) -> Self {
        Self { store }
    }

    /// Storage key for a session, e.g. `transdom_booking_details:abc123`.
    pub fn key(session: &str) -> Result<String> {
        let session = session.trim();
        if session.is_empty()
            || session.len() > 128
            || !session
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ShippingError::ValidationError(format!(
                "Invalid session id: {session:?}"
            )));
        }
        Ok(format!("{KEY_PREFIX}:{session}"))
    }

    pub async fn save(&self, session: &str, draft: &SessionDraft) -> Result<()> {
        let key = Self::key(session)?;
        debug!(%key, "saving draft");
        self.store.put(&key, draft).await
    }

    pub async fn load(&self, session: &str) -> Result<Option<SessionDraft>> {
        let key = Self::key(session)?;
        self.store.get(&key).await
    }

    pub async fn clear(&self, session: &str) -> Result<()> {
        let key = Self::key(session)?;
        debug!(%key, "clearing draft");
        self.store.remove(&key).await
    }

    /// Stores a fresh quote. Any booking built on an earlier quote is dropped.
    pub async fn save_quote(&self, session: &str, quote: Quote) -> Result<SessionDraft> {
        let draft = SessionDraft {
            quote: Some(quote),
            booking: None,
            updated_at: Utc::now(),
        };
        self.save(session, &draft).await?;
        Ok(draft)
    }

    /// Attaches a reviewed booking, keeping the quote it was priced from.
    pub async fn save_booking(&self, session: &str, booking: BookingDraft) -> Result<SessionDraft> {
        let quote = self.load(session).await?.and_then(|d| d.quote);
        let draft = SessionDraft {
            quote,
            booking: Some(booking),
            updated_at: Utc::now(),
        };
        self.save(session, &draft).await?;
        Ok(draft)
    }
}
