//! Challenge cache contract.
//!
//! A [`ChallengeCache`] maps a random challenge or token to the
//! [`PendingRecord`] it was issued for. Entries always carry a TTL, and the
//! expiry is part of the contract rather than a backend detail: an entry
//! whose TTL has elapsed must read as [`StorageError::NotFound`] even if the
//! backend has not physically purged it yet. Implementations therefore
//! compare the current time against a stored expiry instead of trusting
//! backend-side absence.
//!
//! # Implementing a Backend
//!
//! 1. Implement [`ChallengeCache`]
//! 2. Map backend-specific errors to [`StorageError`]
//! 3. Run the [`conformance`](crate::conformance) suite against it
//!
//! See [`MemoryChallengeCache`](crate::MemoryChallengeCache) for a reference
//! implementation.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{
    error::{StorageError, StorageResult},
    types::PendingRecord,
};

/// Ephemeral, TTL-bounded store of pending operations keyed by a secret
/// challenge or token.
///
/// Keys are the raw secret bytes. Implementations must never log them or
/// embed them in error messages.
///
/// | Method | Description |
/// |--------|-------------|
/// | [`set`](ChallengeCache::set) | Store a record, overwriting any prior entry |
/// | [`get`](ChallengeCache::get) | Read a live record |
/// | [`take`](ChallengeCache::take) | Atomically read and remove a live record |
/// | [`del`](ChallengeCache::del) | Remove an entry, idempotently |
/// | [`health_check`](ChallengeCache::health_check) | Verify backend availability |
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use vey_storage::{ChallengeCache, EmailDigest, MemoryChallengeCache, PendingRecord};
///
/// # tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(async {
/// let cache = MemoryChallengeCache::new();
/// let record = PendingRecord::put(EmailDigest::new(vec![1, 2, 3]));
///
/// cache.set(b"challenge", record.clone(), Duration::from_secs(60)).await.unwrap();
/// assert_eq!(cache.take(b"challenge").await.unwrap(), record);
/// assert!(cache.get(b"challenge").await.unwrap_err().is_not_found());
/// # });
/// ```
#[async_trait]
pub trait ChallengeCache: Send + Sync {
    /// Stores `record` under `key` for `ttl`, replacing any existing entry
    /// and its expiry.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend is unavailable or `ttl` cannot
    /// be represented as an absolute expiry.
    async fn set(&self, key: &[u8], record: PendingRecord, ttl: Duration) -> StorageResult<()>;

    /// Returns the live record stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the key was never set, has been
    /// removed, or its TTL has elapsed.
    async fn get(&self, key: &[u8]) -> StorageResult<PendingRecord>;

    /// Removes the entry under `key` and returns it, in one atomic step.
    ///
    /// Of any number of concurrent `take` calls for the same key, at most
    /// one observes the record. An expired entry is removed and reported
    /// as absent.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] under the same conditions as
    /// [`get`](ChallengeCache::get).
    async fn take(&self, key: &[u8]) -> StorageResult<PendingRecord>;

    /// Removes the entry under `key`. Removing an absent entry is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend is unavailable.
    async fn del(&self, key: &[u8]) -> StorageResult<()>;

    /// Checks that the backend can serve requests.
    ///
    /// # Errors
    ///
    /// Returns an error describing why the backend is unavailable.
    async fn health_check(&self) -> StorageResult<()>;
}

#[async_trait]
impl<C: ChallengeCache + ?Sized> ChallengeCache for Arc<C> {
    async fn set(&self, key: &[u8], record: PendingRecord, ttl: Duration) -> StorageResult<()> {
        (**self).set(key, record, ttl).await
    }

    async fn get(&self, key: &[u8]) -> StorageResult<PendingRecord> {
        (**self).get(key).await
    }

    async fn take(&self, key: &[u8]) -> StorageResult<PendingRecord> {
        (**self).take(key).await
    }

    async fn del(&self, key: &[u8]) -> StorageResult<()> {
        (**self).del(key).await
    }

    async fn health_check(&self) -> StorageResult<()> {
        (**self).health_check().await
    }
}

/// The `NotFound` error every cache reports for an absent, consumed or
/// expired entry. The label never contains the secret key.
#[must_use]
pub fn pending_not_found() -> StorageError {
    StorageError::not_found("pending record")
}
