//! Storage contracts for the vey key server.
//!
//! This crate provides the two storage abstractions the verification
//! protocol is built on, together with the data types they carry:
//!
//! - [`ChallengeCache`]: ephemeral map from a secret challenge or token to the [`PendingRecord`]
//!   it was issued for, with mandatory expiry
//! - [`KeyStore`]: durable map from an [`EmailDigest`] to a deduplicated set of [`PublicKey`]s
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Orchestrator (vey crate)                    │
//! │   get_keys │ begin_put │ commit_put │ begin/commit_delete   │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │        ChallengeCache        │           KeyStore           │
//! │  (set, get, take, del)       │   (get, put, delete)         │
//! ├──────────────┬───────────────┼──────────────┬───────────────┤
//! │ Memory       │ Mongo         │ Memory       │ Mongo         │
//! │ (testing)    │ (production)  │ (testing)    │ (production)  │
//! └──────────────┴───────────────┴──────────────┴───────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//!
//! use vey_storage::{
//!     ChallengeCache, EmailDigest, KeyStore, MemoryChallengeCache, MemoryKeyStore,
//!     PendingRecord, PublicKey,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cache = MemoryChallengeCache::new();
//!     let store = MemoryKeyStore::new();
//!     let digest = EmailDigest::new(vec![0xAB; 32]);
//!
//!     cache.set(b"challenge", PendingRecord::put(digest.clone()), Duration::from_secs(900)).await?;
//!     let pending = cache.take(b"challenge").await?;
//!
//!     store.put(&pending.email_digest, &PublicKey::ssh_ed25519(b"ssh-ed25519 AAAA".to_vec())).await?;
//!     assert_eq!(store.get(&digest).await?.len(), 1);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Available Backends
//!
//! | Backend | Use Case | Persistence |
//! |---------|----------|-------------|
//! | [`MemoryChallengeCache`], [`MemoryKeyStore`] | Testing, development | No |
//! | `MongoChallengeCache`, `MongoKeyStore` (in `vey-storage-mongo`) | Production | Yes |
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` and `conformance` modules with shared test helpers
//!   and the contract suite every backend must pass. Enable this in `[dev-dependencies]`.
//! - **`failpoints`**: Compiles the `fail` injection points in the in-memory backends.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used, clippy::panic)]
pub mod conformance;
pub mod error;
pub mod keystore;
pub mod memory;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;
pub mod types;

pub use cache::ChallengeCache;
pub use error::{BoxError, ConfigError, StorageError, StorageResult};
pub use keystore::KeyStore;
pub use memory::{MemoryChallengeCache, MemoryKeyStore};
pub use types::{EmailDigest, PendingRecord, PublicKey, PublicKeyType};
