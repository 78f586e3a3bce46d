//! MongoDB-backed [`ChallengeCache`].

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use bson::{DateTime, Document, doc};
use mongodb::{Collection, Database, IndexModel, options::IndexOptions};
use vey_storage::{
    ChallengeCache, PendingRecord, StorageError, StorageResult, cache::pending_not_found,
};

use crate::{
    documents::{self, EXPIRES_AT},
    error::Result,
};

/// Name of the TTL index that lets the server purge lapsed entries.
pub const EXPIRY_INDEX: &str = "expires_at_ttl";

/// [`ChallengeCache`] stored in a MongoDB collection.
///
/// Each entry carries an `expires_at` date. A TTL index on that field lets
/// the server purge lapsed entries, but the purge runs only about once a
/// minute, so every read also compares `expires_at` with the clock.
/// `take` uses `findOneAndDelete`, which the server executes atomically per
/// document.
#[derive(Clone, Debug)]
pub struct MongoChallengeCache {
    database: Database,
    collection: Collection<Document>,
}

impl MongoChallengeCache {
    /// Creates a cache over `collection` in `database`.
    ///
    /// Call [`ensure_indexes`](Self::ensure_indexes) once before use so that
    /// lapsed entries are purged server-side.
    #[must_use]
    pub fn new(database: &Database, collection: &str) -> Self {
        Self { database: database.clone(), collection: database.collection(collection) }
    }

    /// Creates the TTL index on `expires_at` if it does not already exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the index.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { EXPIRES_AT: 1 })
            .options(
                IndexOptions::builder()
                    .expire_after(Duration::from_secs(0))
                    .name(EXPIRY_INDEX.to_string())
                    .build(),
            )
            .build();

        self.collection.create_index(index).await?;
        Ok(())
    }

    async fn find_live(&self, key: &[u8]) -> Result<Option<PendingRecord>> {
        let found = self.collection.find_one(documents::by_id(key)).await?;
        live_record(found.as_ref())
    }

    async fn remove_live(&self, key: &[u8]) -> Result<Option<PendingRecord>> {
        let removed = self.collection.find_one_and_delete(documents::by_id(key)).await?;
        live_record(removed.as_ref())
    }

    async fn upsert(&self, key: &[u8], record: &PendingRecord, expires_at: DateTime) -> Result<()> {
        let document = documents::pending_to_document(key, record, expires_at);
        self.collection.replace_one(documents::by_id(key), document).upsert(true).await?;
        Ok(())
    }

    async fn remove(&self, key: &[u8]) -> Result<()> {
        self.collection.delete_one(documents::by_id(key)).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

/// Decodes `document` and drops it if its expiry has passed.
fn live_record(document: Option<&Document>) -> Result<Option<PendingRecord>> {
    let Some(document) = document else {
        return Ok(None);
    };
    let (record, expires_at) = documents::pending_from_document(document)?;
    Ok((expires_at > DateTime::now()).then_some(record))
}

#[async_trait]
impl ChallengeCache for MongoChallengeCache {
    #[tracing::instrument(skip(self, key, record))]
    async fn set(&self, key: &[u8], record: PendingRecord, ttl: Duration) -> StorageResult<()> {
        let expires_at = SystemTime::now()
            .checked_add(ttl)
            .map(DateTime::from_system_time)
            .ok_or_else(|| StorageError::internal("ttl is too large to represent an expiry"))?;

        Ok(self.upsert(key, &record, expires_at).await?)
    }

    #[tracing::instrument(skip(self, key))]
    async fn get(&self, key: &[u8]) -> StorageResult<PendingRecord> {
        self.find_live(key).await?.ok_or_else(pending_not_found)
    }

    #[tracing::instrument(skip(self, key))]
    async fn take(&self, key: &[u8]) -> StorageResult<PendingRecord> {
        self.remove_live(key).await?.ok_or_else(pending_not_found)
    }

    #[tracing::instrument(skip(self, key))]
    async fn del(&self, key: &[u8]) -> StorageResult<()> {
        Ok(self.remove(key).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<()> {
        Ok(self.ping().await?)
    }
}
