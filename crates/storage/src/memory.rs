//! In-memory cache and key store backends.
//!
//! This module provides [`MemoryChallengeCache`] and [`MemoryKeyStore`],
//! in-process implementations of [`ChallengeCache`] and [`KeyStore`] suitable
//! for tests, development and single-process deployments.
//!
//! # Features
//!
//! - **Thread-safe**: [`parking_lot::Mutex`] guards the cache, so `take` is a single critical
//!   section; [`parking_lot::RwLock`] guards the key store
//! - **Expiry on read**: every read compares the stored expiry with the clock, so a lapsed entry is
//!   absent even before it is purged
//! - **Background purge**: a task removes lapsed cache entries once per second
//!
//! # Limitations
//!
//! - Data is not persisted; all data is lost when the process exits
//! - Key material is shared only within one process

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use fail::fail_point;
use parking_lot::{Mutex, RwLock};
use tokio::{select, sync::watch, time::sleep};

use crate::{
    cache::{ChallengeCache, pending_not_found},
    error::{StorageError, StorageResult},
    keystore::KeyStore,
    types::{EmailDigest, PendingRecord, PublicKey},
};

/// Holds the shutdown signal sender. When dropped, the watch channel
/// closes and the purge task exits.
struct ShutdownGuard {
    shutdown_tx: watch::Sender<()>,
}

impl Drop for ShutdownGuard {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}

struct Entry {
    record: PendingRecord,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

type Entries = Arc<Mutex<HashMap<Vec<u8>, Entry>>>;

/// In-memory [`ChallengeCache`] backed by a mutex-guarded [`HashMap`].
///
/// # Cloning
///
/// Cheaply cloneable via [`Arc`]. All clones share the same entries.
///
/// # Shutdown
///
/// When created inside a Tokio runtime, a background task purges lapsed
/// entries every second. The task stops when the last clone is dropped, or
/// earlier via [`shutdown`](Self::shutdown). Purging only reclaims memory;
/// reads never depend on it.
#[derive(Clone)]
pub struct MemoryChallengeCache {
    entries: Entries,
    shutdown_guard: Arc<ShutdownGuard>,
}

impl MemoryChallengeCache {
    /// Creates an empty cache.
    ///
    /// The purge task is spawned only when a Tokio runtime is current;
    /// outside one, lapsed entries are dropped lazily on access.
    #[must_use]
    pub fn new() -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let entries: Entries = Arc::new(Mutex::new(HashMap::new()));

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let purge_entries = Arc::clone(&entries);
            handle.spawn(purge_expired(purge_entries, shutdown_rx));
        }

        Self { entries, shutdown_guard: Arc::new(ShutdownGuard { shutdown_tx }) }
    }

    /// Signals the background purge task to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_guard.shutdown_tx.send(());
    }

    /// Number of entries physically held, live or lapsed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if no entries are physically held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for MemoryChallengeCache {
    fn default() -> Self {
        Self::new()
    }
}

async fn purge_expired(entries: Entries, mut shutdown_rx: watch::Receiver<()>) {
    loop {
        select! {
            _ = sleep(Duration::from_secs(1)) => {}
            _ = shutdown_rx.changed() => {
                return;
            }
        }

        let now = Instant::now();
        let mut guard = entries.lock();
        let before = guard.len();
        guard.retain(|_, entry| entry.is_live(now));
        let purged = before - guard.len();
        drop(guard);

        if purged > 0 {
            tracing::trace!(purged, "purged lapsed challenge cache entries");
        }
    }
}

#[async_trait]
impl ChallengeCache for MemoryChallengeCache {
    #[tracing::instrument(skip(self, key, record))]
    async fn set(&self, key: &[u8], record: PendingRecord, ttl: Duration) -> StorageResult<()> {
        fail_point!("cache-set", |_| Err(StorageError::connection("injected cache-set failure")));

        let expires_at = Instant::now()
            .checked_add(ttl)
            .ok_or_else(|| StorageError::internal("ttl is too large to represent an expiry"))?;

        self.entries.lock().insert(key.to_vec(), Entry { record, expires_at });
        Ok(())
    }

    #[tracing::instrument(skip(self, key))]
    async fn get(&self, key: &[u8]) -> StorageResult<PendingRecord> {
        fail_point!("cache-get", |_| Err(StorageError::connection("injected cache-get failure")));

        let now = Instant::now();
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(entry.record.clone()),
            Some(_) => {
                entries.remove(key);
                Err(pending_not_found())
            },
            None => Err(pending_not_found()),
        }
    }

    #[tracing::instrument(skip(self, key))]
    async fn take(&self, key: &[u8]) -> StorageResult<PendingRecord> {
        fail_point!("cache-take", |_| Err(StorageError::connection("injected cache-take failure")));

        let now = Instant::now();
        match self.entries.lock().remove(key) {
            Some(entry) if entry.is_live(now) => Ok(entry.record),
            _ => Err(pending_not_found()),
        }
    }

    #[tracing::instrument(skip(self, key))]
    async fn del(&self, key: &[u8]) -> StorageResult<()> {
        fail_point!("cache-del", |_| Err(StorageError::connection("injected cache-del failure")));

        self.entries.lock().remove(key);
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<()> {
        fail_point!("cache-health-check", |_| Err(StorageError::connection(
            "injected cache health check failure"
        )));

        drop(self.entries.lock());
        Ok(())
    }
}

/// In-memory [`KeyStore`] backed by a [`RwLock`]-guarded map of sets.
///
/// Cheaply cloneable via [`Arc`]; all clones share the same data. A digest
/// gets an entry on its first `put`; deleting from a digest that was never
/// written creates nothing.
#[derive(Clone, Default)]
pub struct MemoryKeyStore {
    sets: Arc<RwLock<HashMap<EmailDigest, Vec<PublicKey>>>>,
}

impl MemoryKeyStore {
    /// Creates an empty key store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyStore for MemoryKeyStore {
    #[tracing::instrument(skip(self, digest))]
    async fn get(&self, digest: &EmailDigest) -> StorageResult<Vec<PublicKey>> {
        fail_point!("store-get", |_| Err(StorageError::connection("injected store-get failure")));

        Ok(self.sets.read().get(digest).cloned().unwrap_or_default())
    }

    #[tracing::instrument(skip(self, digest, key), fields(key_type = %key.key_type))]
    async fn put(&self, digest: &EmailDigest, key: &PublicKey) -> StorageResult<()> {
        fail_point!("store-put", |_| Err(StorageError::connection("injected store-put failure")));

        let mut sets = self.sets.write();
        let set = sets.entry(digest.clone()).or_default();
        if !set.contains(key) {
            set.push(key.clone());
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, digest, key), fields(key_type = %key.key_type))]
    async fn delete(&self, digest: &EmailDigest, key: &PublicKey) -> StorageResult<()> {
        fail_point!("store-delete", |_| Err(StorageError::connection(
            "injected store-delete failure"
        )));

        if let Some(set) = self.sets.write().get_mut(digest) {
            set.retain(|existing| existing != key);
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn health_check(&self) -> StorageResult<()> {
        fail_point!("store-health-check", |_| Err(StorageError::connection(
            "injected store health check failure"
        )));

        drop(self.sets.read());
        Ok(())
    }
}
