use crate::domain::booking::SessionDraft;
use crate::domain::ports::DraftStore;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Drafts untouched for longer than this are dropped.
pub const DEFAULT_DRAFT_TTL_HOURS: i64 = 72;

/// A thread-safe in-memory draft store.
///
/// Drafts are lost on restart and expire `ttl` after their last update.
/// Expired drafts read as absent and are swept on the next write.
#[derive(Clone)]
pub struct InMemoryDraftStore {
    drafts: Arc<RwLock<HashMap<String, SessionDraft>>>,
    ttl: Duration,
}

impl Default for InMemoryDraftStore {
    fn default() -> Self {
        Self::with_ttl(Duration::hours(DEFAULT_DRAFT_TTL_HOURS))
    }
}

impl InMemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            drafts: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    fn is_expired(&self, draft: &SessionDraft, now: DateTime<Utc>) -> bool {
        now - draft.updated_at > self.ttl
    }

    /// Number of drafts held, expired ones included until swept.
    pub async fn len(&self) -> usize {
        self.drafts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl DraftStore for InMemoryDraftStore {
    async fn put(&self, key: &str, draft: &SessionDraft) -> Result<()> {
        let now = Utc::now();
        let mut drafts = self.drafts.write().await;
        let before = drafts.len();
        drafts.retain(|_, held| !self.is_expired(held, now));
        if drafts.len() < before {
            debug!(swept = before - drafts.len(), "expired drafts removed");
        }
        drafts.insert(key.to_string(), draft.clone());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<SessionDraft>> {
        let drafts = self.drafts.read().await;
        Ok(drafts
            .get(key)
            .filter(|draft| !self.is_expired(draft, Utc::now()))
            .cloned())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut drafts = self.drafts.write().await;
        drafts.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn empty_draft() -> SessionDraft {
        SessionDraft {
            quote: None,
            booking: None,
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_in_memory_draft_store() {
        let store = InMemoryDraftStore::new();
        let draft = empty_draft();

        store.put("k1", &draft).await.unwrap();
        assert_eq!(store.get("k1").await.unwrap(), Some(draft));
        assert!(store.get("k2").await.unwrap().is_none());

        store.remove("k1").await.unwrap();
        assert!(store.get("k1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_previous_value() {
        let store = InMemoryDraftStore::new();
        let first = empty_draft();
        let mut second = empty_draft();
        second.updated_at = first.updated_at + chrono::Duration::seconds(5);

        store.put("k", &first).await.unwrap();
        store.put("k", &second).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_stale_draft_reads_as_absent_and_is_swept() {
        let store = InMemoryDraftStore::with_ttl(chrono::Duration::hours(1));
        let mut stale = empty_draft();
        stale.updated_at = Utc::now() - chrono::Duration::hours(2);

        store.put("old", &stale).await.unwrap();
        assert!(store.get("old").await.unwrap().is_none());
        assert_eq!(store.len().await, 1);

        let fresh = empty_draft();
        store.put("new", &fresh).await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("new").await.unwrap(), Some(fresh));
    }

    #[tokio::test]
    async fn test_remove_missing_key_is_ok() {
        let store = InMemoryDraftStore::new();
        assert!(store.remove("nothing").await.is_ok());
    }
}
