//! MongoDB-backed implementations of [`ChallengeCache`](vey_storage::ChallengeCache)
//! and [`KeyStore`](vey_storage::KeyStore).
//!
//! # Features
//!
//! - **Durable**: both collections survive process restarts and are shared by every replica of the
//!   service
//! - **Expiry contract**: a TTL index purges lapsed cache entries server-side, and every read also
//!   checks the stored expiry because the server's purge lags
//! - **Atomic consume**: `take` is a single `findOneAndDelete`
//! - **Atomic set mutation**: `$addToSet` / `$pull` on one document per identity, never
//!   read-modify-write
//!
//! # Operation Mapping
//!
//! | Contract | MongoDB |
//! | -------- | ------- |
//! | `ChallengeCache::set` | `replaceOne(_id, doc, upsert)` |
//! | `ChallengeCache::get` | `findOne(_id)` + expiry check |
//! | `ChallengeCache::take` | `findOneAndDelete(_id)` + expiry check |
//! | `ChallengeCache::del` | `deleteOne(_id)` |
//! | `KeyStore::get` | `findOne(_id)` |
//! | `KeyStore::put` | `updateOne(_id, $addToSet, upsert)` |
//! | `KeyStore::delete` | `updateOne(_id, $pull)` |
//! | `health_check` | `ping` |
//!
//! # Error Mapping
//!
//! Driver errors are mapped onto [`StorageError`](vey_storage::StorageError): reachability
//! failures become `Connection`, BSON and document-shape failures become `Serialization`, a
//! duplicate-key race becomes `Conflict`, and everything else is `Internal`.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
pub mod cache;
pub mod config;
mod documents;
pub mod error;
pub mod keys;

pub use backend::MongoBackend;
pub use cache::MongoChallengeCache;
pub use config::MongoBackendConfig;
pub use error::{MongoStorageError, Result};
pub use keys::MongoKeyStore;
