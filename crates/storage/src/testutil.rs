//! Shared test utilities for cache and key store testing.
//!
//! This module provides builders for digests, keys and pending records, plus
//! assertion helpers for [`StorageResult`] values. It is feature-gated behind
//! `testutil` to prevent leaking into production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! vey-storage = { path = "../storage", features = ["testutil"] }
//! ```
//!
//! Then import helpers:
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use vey_storage::testutil::{make_digest, make_public_key, make_record};
//! ```

use crate::{
    error::{StorageError, StorageResult},
    types::{EmailDigest, PendingRecord, PublicKey, PublicKeyType},
};

/// Create a deterministic digest from a label.
///
/// Distinct labels always give distinct digests, so tests sharing one
/// backend can isolate their data by label.
#[must_use]
pub fn make_digest(label: &str) -> EmailDigest {
    EmailDigest::new(format!("digest:{label}").into_bytes())
}

/// Create a deterministic `ssh-ed25519` key tagged with `seed`.
///
/// The key bytes are not a parseable `authorized_keys` line; storage never
/// looks inside them.
#[must_use]
pub fn make_public_key(seed: usize) -> PublicKey {
    PublicKey::new(PublicKeyType::SshEd25519, format!("ssh-ed25519 test-key-{seed:06}"))
}

/// Create a pending registration record for `label`'s digest.
#[must_use]
pub fn make_record(label: &str) -> PendingRecord {
    PendingRecord::put(make_digest(label))
}

/// Create a pending deletion record for `label`'s digest and key `seed`.
#[must_use]
pub fn make_delete_record(label: &str, seed: usize) -> PendingRecord {
    PendingRecord::delete(make_digest(label), make_public_key(seed))
}

/// Create a cache key from a prefix and index, like `"prefix:000042"`.
#[must_use]
pub fn make_key(prefix: &str, idx: usize) -> Vec<u8> {
    format!("{prefix}:{idx:06}").into_bytes()
}

/// Assert that a [`StorageResult`] is a [`StorageError::NotFound`].
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use vey_storage::assert_not_found;
/// use vey_storage::error::{StorageError, StorageResult};
///
/// let result: StorageResult<()> = Err(StorageError::NotFound { key: "missing".into() });
/// assert_not_found!(result);
/// ```
#[macro_export]
macro_rules! assert_not_found {
    ($result:expr) => {
        assert!(
            matches!($result, Err($crate::error::StorageError::NotFound { .. })),
            "expected StorageError::NotFound, got: {:?}",
            $result,
        );
    };
    ($result:expr, $msg:expr) => {
        assert!(
            matches!($result, Err($crate::error::StorageError::NotFound { .. })),
            "{}: expected StorageError::NotFound, got: {:?}",
            $msg,
            $result,
        );
    };
}

/// Assert that a [`StorageResult`] is `Ok`.
///
/// Returns the inner value on success, panics with a descriptive message
/// on failure.
///
/// # Examples
///
/// ```no_run
/// // Requires the `testutil` feature to be enabled.
/// use vey_storage::assert_storage_ok;
/// use vey_storage::error::StorageResult;
///
/// let result: StorageResult<i32> = Ok(42);
/// let value = assert_storage_ok!(result);
/// assert_eq!(value, 42);
/// ```
#[macro_export]
macro_rules! assert_storage_ok {
    ($result:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("expected Ok, got StorageError: {e:?}"),
        }
    };
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(val) => val,
            Err(e) => panic!("{}: expected Ok, got StorageError: {e:?}", $msg),
        }
    };
}

/// Helper to verify that a result is a `NotFound` error.
pub fn is_not_found<T>(result: &StorageResult<T>) -> bool {
    matches!(result, Err(StorageError::NotFound { .. }))
}

/// Helper to verify that a result is a backend-unavailability error.
pub fn is_unavailable<T>(result: &StorageResult<T>) -> bool {
    matches!(result, Err(e) if e.is_transient())
}

/// Sorts a key set into a canonical order so sets can be compared with
/// `assert_eq!`.
#[must_use]
pub fn sorted(mut keys: Vec<PublicKey>) -> Vec<PublicKey> {
    keys.sort_by(|a, b| (a.key_type.tag(), &a.key).cmp(&(b.key_type.tag(), &b.key)));
    keys
}
