//! TTL boundary condition tests for `MemoryChallengeCache`.
//!
//! Covers edge cases in expiry behavior: zero TTL, very large TTL, the
//! boundary between live and lapsed, and expiry replacement via `set`.

#![allow(clippy::expect_used, clippy::panic)]

use std::time::Duration;

use vey_storage::{
    ChallengeCache, MemoryChallengeCache, StorageError, assert_not_found,
    testutil::{make_delete_record, make_record},
};

// ============================================================================
// Zero TTL
// ============================================================================

/// `MemoryChallengeCache` stores `Instant::now() + ttl` and treats an entry as
/// live only while its expiry is strictly in the future, so a zero TTL is
/// lapsed on the very next read.
#[tokio::test]
async fn test_zero_ttl_is_immediately_expired() {
    let cache = MemoryChallengeCache::new();

    cache
        .set(b"zero", make_record("zero"), Duration::ZERO)
        .await
        .expect("set with zero ttl should succeed");

    assert_not_found!(cache.get(b"zero").await);
    assert_not_found!(cache.take(b"zero").await);
}

/// A zero-TTL overwrite kills a previously live entry.
#[tokio::test]
async fn test_zero_ttl_overwrite_expires_live_entry() {
    let cache = MemoryChallengeCache::new();

    cache.set(b"k", make_record("k"), Duration::from_secs(60)).await.expect("set");
    cache.set(b"k", make_record("k"), Duration::ZERO).await.expect("overwrite");

    assert_not_found!(cache.get(b"k").await);
}

// ============================================================================
// Large TTL
// ============================================================================

/// A large-but-representable TTL should not overflow.
#[tokio::test]
async fn test_large_ttl_no_overflow() {
    let cache = MemoryChallengeCache::new();
    let hundred_years = Duration::from_secs(100 * 365 * 24 * 3600);

    cache.set(b"long", make_record("long"), hundred_years).await.expect("set with large ttl");

    assert_eq!(cache.get(b"long").await.expect("get"), make_record("long"));
}

/// A TTL past the clock's range is reported, never a panic.
#[tokio::test]
async fn test_unrepresentable_ttl_is_internal_error() {
    let cache = MemoryChallengeCache::new();

    let result = cache.set(b"max", make_record("max"), Duration::MAX).await;

    assert!(matches!(result, Err(StorageError::Internal { .. })), "got {result:?}");
    assert_not_found!(cache.get(b"max").await, "a rejected set must not store anything");
}

// ============================================================================
// Expiration boundary
// ============================================================================

/// An entry is live just before its TTL and absent just after.
#[tokio::test]
async fn test_expiry_boundary() {
    let cache = MemoryChallengeCache::new();

    cache
        .set(b"edge", make_delete_record("edge", 1), Duration::from_millis(300))
        .await
        .expect("set");

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(cache.get(b"edge").await.is_ok(), "entry should be live well before expiry");

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_not_found!(cache.get(b"edge").await, "entry should be gone after expiry");
}

/// Entries expire independently of one another.
#[tokio::test]
async fn test_mixed_ttls_expire_independently() {
    let cache = MemoryChallengeCache::new();

    cache.set(b"short", make_record("short"), Duration::from_millis(50)).await.expect("set");
    cache.set(b"long", make_record("long"), Duration::from_secs(60)).await.expect("set");

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_not_found!(cache.get(b"short").await);
    assert_eq!(cache.get(b"long").await.expect("long-lived entry"), make_record("long"));
}

/// A lapsed entry can be set again under the same key.
#[tokio::test]
async fn test_reset_after_expiry() {
    let cache = MemoryChallengeCache::new();

    cache.set(b"again", make_record("first"), Duration::ZERO).await.expect("set");
    assert_not_found!(cache.get(b"again").await);

    cache.set(b"again", make_record("second"), Duration::from_secs(60)).await.expect("reset");
    assert_eq!(cache.take(b"again").await.expect("take"), make_record("second"));
}
