//! MongoDB-backed [`KeyStore`].

use async_trait::async_trait;
use bson::{Document, doc};
use mongodb::{Collection, Database};
use vey_storage::{EmailDigest, KeyStore, PublicKey, StorageError, StorageResult};

use crate::{
    documents::{self, KEYS},
    error::Result,
};

/// [`KeyStore`] holding one document per identity digest.
///
/// Set mutations are single-document `$addToSet` and `$pull` updates, which
/// the server applies atomically, so concurrent writers from any number of
/// processes neither lose updates nor create duplicates.
#[derive(Clone, Debug)]
pub struct MongoKeyStore {
    database: Database,
    collection: Collection<Document>,
}

impl MongoKeyStore {
    /// Creates a key store over `collection` in `database`.
    #[must_use]
    pub fn new(database: &Database, collection: &str) -> Self {
        Self { database: database.clone(), collection: database.collection(collection) }
    }

    async fn load(&self, digest: &EmailDigest) -> Result<Vec<PublicKey>> {
        match self.collection.find_one(documents::by_id(digest.as_bytes())).await? {
            Some(document) => documents::key_set_from_document(&document),
            None => Ok(Vec::new()),
        }
    }

    async fn add(&self, digest: &EmailDigest, key: &PublicKey) -> Result<()> {
        let update = doc! { "$addToSet": { KEYS: documents::public_key_to_document(key) } };
        self.collection
            .update_one(documents::by_id(digest.as_bytes()), update)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn remove(&self, digest: &EmailDigest, key: &PublicKey) -> Result<()> {
        let update = doc! { "$pull": { KEYS: documents::public_key_to_document(key) } };
        self.collection.update_one(documents::by_id(digest.as_bytes()), update).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyStore for MongoKeyStore {
    #[tracing::instrument(skip(self, digest))]
    async fn get(&self, digest: &EmailDigest) -> StorageResult<Vec<PublicKey>> {
        Ok(self.load(digest).await?)
    }

    #[tracing::instrument(skip(self, digest, key), fields(key_type = %key.key_type))]
    async fn put(&self, digest: &EmailDigest, key: &PublicKey) -> StorageResult<()> {
        match self.add(digest, key).await.map_err(StorageError::from) {
            // Two first-time upserts for one digest raced on `_id`; the
            // document exists now, so the retry is a plain update.
            Err(StorageError::Conflict) => Ok(self.add(digest, key).await?),
            result => result,
        }
    }

    #[tracing::instrument(skip(self, digest, key), fields(key_type = %key.key_type))]
    async fn delete(&self, digest: &EmailDigest, key: &PublicKey) -> StorageResult<()> {
        Ok(self.remove(digest, key).await?)
    }

    #[tracing::instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<()> {
        Ok(self.ping().await?)
    }
}
