//! Key store contract.
//!
//! A [`KeyStore`] durably maps an [`EmailDigest`] to its registration set: a
//! deduplicated, unordered set of [`PublicKey`]s. An identity with no keys is
//! not an error condition, it is the empty set.
//!
//! Concurrent [`put`](KeyStore::put) and [`delete`](KeyStore::delete) calls
//! against the same digest, possibly from different processes, must neither
//! lose updates nor produce duplicates. In-process backends serialize behind
//! a lock; durable backends must use the engine's native atomic set-add and
//! set-remove operations rather than read-modify-write.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::StorageResult,
    types::{EmailDigest, PublicKey},
};

/// Durable per-identity set of registered public keys.
///
/// # Example
///
/// ```
/// use vey_storage::{EmailDigest, KeyStore, MemoryKeyStore, PublicKey};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let store = MemoryKeyStore::new();
/// let digest = EmailDigest::new(vec![7; 32]);
/// let key = PublicKey::ssh_ed25519(b"ssh-ed25519 AAAA".to_vec());
///
/// store.put(&digest, &key).await.unwrap();
/// store.put(&digest, &key).await.unwrap();
/// assert_eq!(store.get(&digest).await.unwrap(), vec![key.clone()]);
///
/// store.delete(&digest, &key).await.unwrap();
/// assert!(store.get(&digest).await.unwrap().is_empty());
/// # });
/// ```
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Returns the registration set for `digest`, in no particular order.
    ///
    /// An unknown digest yields an empty set.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend is unavailable or a stored
    /// entry cannot be decoded.
    async fn get(&self, digest: &EmailDigest) -> StorageResult<Vec<PublicKey>>;

    /// Adds `key` to the set for `digest`. Adding a key that is already
    /// present is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend is unavailable.
    async fn put(&self, digest: &EmailDigest, key: &PublicKey) -> StorageResult<()>;

    /// Removes `key` from the set for `digest`. Removing an absent key is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend is unavailable.
    async fn delete(&self, digest: &EmailDigest, key: &PublicKey) -> StorageResult<()>;

    /// Checks that the backend can serve requests.
    ///
    /// # Errors
    ///
    /// Returns an error describing why the backend is unavailable.
    async fn health_check(&self) -> StorageResult<()>;
}

#[async_trait]
impl<S: KeyStore + ?Sized> KeyStore for Arc<S> {
    async fn get(&self, digest: &EmailDigest) -> StorageResult<Vec<PublicKey>> {
        (**self).get(digest).await
    }

    async fn put(&self, digest: &EmailDigest, key: &PublicKey) -> StorageResult<()> {
        (**self).put(digest, key).await
    }

    async fn delete(&self, digest: &EmailDigest, key: &PublicKey) -> StorageResult<()> {
        (**self).delete(digest, key).await
    }

    async fn health_check(&self) -> StorageResult<()> {
        (**self).health_check().await
    }
}
