use crate::domain::booking::SessionDraft;
use crate::domain::ports::DraftStore;
use crate::error::{Result, ShippingError};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family for storing session drafts.
pub const CF_DRAFTS: &str = "drafts";

/// A persistent draft store backed by RocksDB.
///
/// Drafts survive restarts, so a booking started before a deploy can still
/// be turned into an order after the payment redirect comes back.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBDraftStore {
    db: Arc<DB>,
}

impl RocksDBDraftStore {
    /// Opens or creates a RocksDB instance at the specified path, ensuring
    /// the drafts column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_drafts = ColumnFamilyDescriptor::new(CF_DRAFTS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_drafts])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn missing_cf() -> ShippingError {
        ShippingError::InternalError(Box::new(std::io::Error::other(
            "Drafts column family not found",
        )))
    }
}

#[async_trait]
impl DraftStore for RocksDBDraftStore {
    async fn put(&self, key: &str, draft: &SessionDraft) -> Result<()> {
        let cf = self.db.cf_handle(CF_DRAFTS).ok_or_else(Self::missing_cf)?;
        let value = serde_json::to_vec(draft)?;
        self.db.put_cf(&cf, key.as_bytes(), value)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<SessionDraft>> {
        let cf = self.db.cf_handle(CF_DRAFTS).ok_or_else(Self::missing_cf)?;
        match self.db.get_cf(&cf, key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let cf = self.db.cf_handle(CF_DRAFTS).ok_or_else(Self::missing_cf)?;
        self.db.delete_cf(&cf, key.as_bytes())?;
        Ok(())
    }
}
