//! Conformance test suite for [`ChallengeCache`] and [`KeyStore`]
//! implementations.
//!
//! Every backend, whether in-memory or durable, runs the same suite so that
//! callers see identical semantics regardless of the engine underneath.
//! Each function uses its own keys and digests, so the whole suite can run
//! in sequence against one shared backend instance.
//!
//! # Usage
//!
//! Enable the `testutil` feature and call each conformance function with a
//! backend instance:
//!
//! ```no_run
//! use vey_storage::{MemoryChallengeCache, conformance};
//!
//! #[tokio::test]
//! async fn cache_get_missing_is_not_found() {
//!     conformance::cache_get_missing_is_not_found(&MemoryChallengeCache::new()).await;
//! }
//! ```
//!
//! # Test Categories
//!
//! | Category | Contract aspect |
//! |----------|-----------------|
//! | Cache CRUD | set/get/del semantics, overwrite, idempotent delete |
//! | Cache TTL | expiry is enforced on read, zero TTL, overwrite refreshes expiry |
//! | Cache consume | `take` is single-use |
//! | Store CRUD | empty set for unknown digests, dedup, idempotent delete, isolation |
//! | Concurrent | one `take` winner, no lost or duplicate set updates |

use std::{collections::HashSet, sync::Arc, time::Duration};

use crate::{
    assert_not_found,
    cache::ChallengeCache,
    keystore::KeyStore,
    testutil::{make_delete_record, make_digest, make_public_key, make_record, sorted},
};

const LONG_TTL: Duration = Duration::from_secs(300);

// ============================================================================
// Cache CRUD
// ============================================================================

/// `get` on a key that was never set fails `NotFound`.
pub async fn cache_get_missing_is_not_found<C: ChallengeCache + ?Sized>(cache: &C) {
    assert_not_found!(cache.get(b"cc:missing").await);
}

/// `set` then `get` returns the record, including an optional key.
pub async fn cache_set_then_get_returns_record<C: ChallengeCache + ?Sized>(cache: &C) {
    let put = make_record("cc-put");
    let delete = make_delete_record("cc-delete", 1);

    cache.set(b"cc:put", put.clone(), LONG_TTL).await.expect("set put record");
    cache.set(b"cc:delete", delete.clone(), LONG_TTL).await.expect("set delete record");

    assert_eq!(cache.get(b"cc:put").await.expect("get put record"), put);
    assert_eq!(cache.get(b"cc:delete").await.expect("get delete record"), delete);
}

/// `get` does not consume the entry.
pub async fn cache_get_is_repeatable<C: ChallengeCache + ?Sized>(cache: &C) {
    let record = make_record("cc-repeat");
    cache.set(b"cc:repeat", record.clone(), LONG_TTL).await.expect("set");

    for _ in 0..3 {
        assert_eq!(cache.get(b"cc:repeat").await.expect("get"), record);
    }
}

/// `set` on an existing key replaces the record.
pub async fn cache_set_overwrites_existing<C: ChallengeCache + ?Sized>(cache: &C) {
    cache.set(b"cc:over", make_record("cc-first"), LONG_TTL).await.expect("set");
    cache.set(b"cc:over", make_record("cc-second"), LONG_TTL).await.expect("overwrite");

    assert_eq!(cache.get(b"cc:over").await.expect("get"), make_record("cc-second"));
}

/// `del` removes the entry, and deleting it again is a no-op.
pub async fn cache_del_is_idempotent<C: ChallengeCache + ?Sized>(cache: &C) {
    cache.set(b"cc:del", make_record("cc-del"), LONG_TTL).await.expect("set");

    cache.del(b"cc:del").await.expect("first del");
    assert_not_found!(cache.get(b"cc:del").await, "entry should be gone after del");
    cache.del(b"cc:del").await.expect("second del should be a no-op");
    cache.del(b"cc:never-set").await.expect("del of absent key should be a no-op");
}

/// Keys are byte-level distinct: `"k"` and `"k\x00"` are different entries.
pub async fn cache_keys_are_byte_distinct<C: ChallengeCache + ?Sized>(cache: &C) {
    cache.set(b"cc:k", make_record("cc-a"), LONG_TTL).await.expect("set k");
    cache.set(b"cc:k\x00", make_record("cc-b"), LONG_TTL).await.expect("set k+null");

    assert_eq!(cache.get(b"cc:k").await.expect("get k"), make_record("cc-a"));
    assert_eq!(cache.get(b"cc:k\x00").await.expect("get k+null"), make_record("cc-b"));
}

// ============================================================================
// Cache TTL
// ============================================================================

/// An entry becomes absent once its TTL elapses.
pub async fn cache_entry_expires<C: ChallengeCache + ?Sized>(cache: &C) {
    cache
        .set(b"ct:short", make_record("ct-short"), Duration::from_millis(200))
        .await
        .expect("set");
    assert!(cache.get(b"ct:short").await.is_ok(), "entry should be live before its TTL");

    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_not_found!(cache.get(b"ct:short").await, "get after expiry");
    assert_not_found!(cache.take(b"ct:short").await, "take after expiry");
}

/// A zero TTL means the entry is immediately absent.
pub async fn cache_zero_ttl_is_immediately_expired<C: ChallengeCache + ?Sized>(cache: &C) {
    cache.set(b"ct:zero", make_record("ct-zero"), Duration::ZERO).await.expect("set zero ttl");
    assert_not_found!(cache.get(b"ct:zero").await);
}

/// Overwriting an entry replaces its expiry along with its record.
pub async fn cache_overwrite_refreshes_ttl<C: ChallengeCache + ?Sized>(cache: &C) {
    cache
        .set(b"ct:refresh", make_record("ct-refresh"), Duration::from_millis(200))
        .await
        .expect("set short");
    cache.set(b"ct:refresh", make_record("ct-refresh"), LONG_TTL).await.expect("set long");

    tokio::time::sleep(Duration::from_millis(400)).await;

    assert!(cache.get(b"ct:refresh").await.is_ok(), "refreshed entry should still be live");
}

// ============================================================================
// Cache consume
// ============================================================================

/// `take` returns the record once, then the entry is gone.
pub async fn cache_take_is_single_use<C: ChallengeCache + ?Sized>(cache: &C) {
    let record = make_delete_record("cc-take", 2);
    cache.set(b"cc:take", record.clone(), LONG_TTL).await.expect("set");

    assert_eq!(cache.take(b"cc:take").await.expect("first take"), record);
    assert_not_found!(cache.take(b"cc:take").await, "second take");
    assert_not_found!(cache.get(b"cc:take").await, "get after take");
}

/// `take` on a key that was never set fails `NotFound`.
pub async fn cache_take_missing_is_not_found<C: ChallengeCache + ?Sized>(cache: &C) {
    assert_not_found!(cache.take(b"cc:take-missing").await);
}

/// `health_check` succeeds on a reachable backend.
pub async fn cache_health_check_succeeds<C: ChallengeCache + ?Sized>(cache: &C) {
    cache.health_check().await.expect("health_check");
}

// ============================================================================
// Store CRUD
// ============================================================================

/// An unknown digest has an empty set, not an error.
pub async fn store_get_unknown_is_empty<S: KeyStore + ?Sized>(store: &S) {
    let keys = store.get(&make_digest("ks-unknown")).await.expect("get unknown digest");
    assert!(keys.is_empty(), "unknown digest should have no keys, got {keys:?}");
}

/// `put` makes the key visible.
pub async fn store_put_then_get<S: KeyStore + ?Sized>(store: &S) {
    let digest = make_digest("ks-put");
    store.put(&digest, &make_public_key(1)).await.expect("put");

    assert_eq!(store.get(&digest).await.expect("get"), vec![make_public_key(1)]);
}

/// Putting the same key twice stores it once.
pub async fn store_put_is_idempotent<S: KeyStore + ?Sized>(store: &S) {
    let digest = make_digest("ks-dedup");
    for _ in 0..3 {
        store.put(&digest, &make_public_key(7)).await.expect("put");
    }

    assert_eq!(store.get(&digest).await.expect("get"), vec![make_public_key(7)]);
}

/// `delete` removes exactly the targeted key.
pub async fn store_delete_removes_only_target<S: KeyStore + ?Sized>(store: &S) {
    let digest = make_digest("ks-delete");
    for seed in 1..=3 {
        store.put(&digest, &make_public_key(seed)).await.expect("put");
    }

    store.delete(&digest, &make_public_key(2)).await.expect("delete");

    assert_eq!(
        sorted(store.get(&digest).await.expect("get")),
        vec![make_public_key(1), make_public_key(3)]
    );
}

/// Deleting an absent key, from a known or unknown digest, is a no-op.
pub async fn store_delete_absent_is_noop<S: KeyStore + ?Sized>(store: &S) {
    let digest = make_digest("ks-absent");
    store.put(&digest, &make_public_key(1)).await.expect("put");

    store.delete(&digest, &make_public_key(99)).await.expect("delete absent key");
    store.delete(&make_digest("ks-absent-unknown"), &make_public_key(1)).await.expect(
        "delete from unknown digest",
    );

    assert_eq!(store.get(&digest).await.expect("get"), vec![make_public_key(1)]);
}

/// Removing the last key leaves an empty set, and the digest can be reused.
pub async fn store_empty_set_is_reusable<S: KeyStore + ?Sized>(store: &S) {
    let digest = make_digest("ks-reuse");
    store.put(&digest, &make_public_key(1)).await.expect("put");
    store.delete(&digest, &make_public_key(1)).await.expect("delete");
    assert!(store.get(&digest).await.expect("get empty").is_empty());

    store.put(&digest, &make_public_key(2)).await.expect("put again");
    assert_eq!(store.get(&digest).await.expect("get"), vec![make_public_key(2)]);
}

/// Sets for different digests are independent.
pub async fn store_digests_are_isolated<S: KeyStore + ?Sized>(store: &S) {
    let alice = make_digest("ks-alice");
    let bob = make_digest("ks-bob");
    store.put(&alice, &make_public_key(1)).await.expect("put alice");
    store.put(&bob, &make_public_key(2)).await.expect("put bob");

    store.delete(&alice, &make_public_key(2)).await.expect("delete bob's key from alice");

    assert_eq!(store.get(&alice).await.expect("get alice"), vec![make_public_key(1)]);
    assert_eq!(store.get(&bob).await.expect("get bob"), vec![make_public_key(2)]);
}

/// `health_check` succeeds on a reachable backend.
pub async fn store_health_check_succeeds<S: KeyStore + ?Sized>(store: &S) {
    store.health_check().await.expect("health_check");
}

// ============================================================================
// Concurrent
// ============================================================================

/// Concurrent `take` of one entry: exactly one caller observes the record.
pub async fn concurrent_take_exactly_one_winner<C: ChallengeCache + ?Sized + 'static>(
    cache: Arc<C>,
) {
    let record = make_record("cc-race");
    cache.set(b"cc:race", record.clone(), LONG_TTL).await.expect("set");

    let mut handles = Vec::new();
    for _ in 0..10 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move { cache.take(b"cc:race").await }));
    }

    let mut winners = 0u32;
    let mut absent = 0u32;
    for handle in handles {
        match handle.await.expect("task join") {
            Ok(taken) => {
                assert_eq!(taken, record);
                winners += 1;
            },
            Err(e) if e.is_not_found() => absent += 1,
            Err(e) => panic!("unexpected error: {e:?}"),
        }
    }

    assert_eq!(winners, 1, "exactly one take should observe the record");
    assert_eq!(absent, 9, "remaining takes should see NotFound");
}

/// Concurrent `put` of distinct keys to one digest loses none of them.
pub async fn concurrent_puts_lose_no_updates<S: KeyStore + ?Sized + 'static>(store: Arc<S>) {
    let digest = make_digest("ks-concurrent");

    let mut handles = Vec::new();
    for seed in 0..20 {
        let store = Arc::clone(&store);
        let digest = digest.clone();
        handles.push(tokio::spawn(async move { store.put(&digest, &make_public_key(seed)).await }));
    }
    for handle in handles {
        handle.await.expect("task join").expect("put");
    }

    let keys = store.get(&digest).await.expect("get");
    let expected: Vec<_> = (0..20).map(make_public_key).collect();
    assert_eq!(sorted(keys), expected);
}

/// Concurrent `put` of the same key produces a single entry.
pub async fn concurrent_same_key_puts_do_not_duplicate<S: KeyStore + ?Sized + 'static>(
    store: Arc<S>,
) {
    let digest = make_digest("ks-same");

    let mut handles = Vec::new();
    for _ in 0..20 {
        let store = Arc::clone(&store);
        let digest = digest.clone();
        handles.push(tokio::spawn(async move { store.put(&digest, &make_public_key(5)).await }));
    }
    for handle in handles {
        handle.await.expect("task join").expect("put");
    }

    assert_eq!(store.get(&digest).await.expect("get"), vec![make_public_key(5)]);
}

/// Interleaved `put` and `delete` of disjoint keys leaves exactly the kept
/// keys.
pub async fn concurrent_put_delete_interleave<S: KeyStore + ?Sized + 'static>(store: Arc<S>) {
    let digest = make_digest("ks-interleave");
    for seed in 100..110 {
        store.put(&digest, &make_public_key(seed)).await.expect("seed put");
    }

    let mut handles = Vec::new();
    for seed in 0..10 {
        let store = Arc::clone(&store);
        let digest = digest.clone();
        handles.push(tokio::spawn(async move {
            store.put(&digest, &make_public_key(seed)).await?;
            store.delete(&digest, &make_public_key(100 + seed)).await
        }));
    }
    for handle in handles {
        handle.await.expect("task join").expect("put/delete");
    }

    let keys: HashSet<_> = store.get(&digest).await.expect("get").into_iter().collect();
    let expected: HashSet<_> = (0..10).map(make_public_key).collect();
    assert_eq!(keys, expected);
}

// ============================================================================
// Convenience runners
// ============================================================================

/// Run the full cache conformance suite against one cache.
///
/// ```no_run
/// use std::sync::Arc;
/// use vey_storage::{MemoryChallengeCache, conformance};
///
/// #[tokio::test]
/// async fn memory_cache_conformance() {
///     conformance::run_all_cache(Arc::new(MemoryChallengeCache::new())).await;
/// }
/// ```
pub async fn run_all_cache<C: ChallengeCache + ?Sized + 'static>(cache: Arc<C>) {
    // CRUD
    cache_get_missing_is_not_found(cache.as_ref()).await;
    cache_set_then_get_returns_record(cache.as_ref()).await;
    cache_get_is_repeatable(cache.as_ref()).await;
    cache_set_overwrites_existing(cache.as_ref()).await;
    cache_del_is_idempotent(cache.as_ref()).await;
    cache_keys_are_byte_distinct(cache.as_ref()).await;

    // TTL
    cache_entry_expires(cache.as_ref()).await;
    cache_zero_ttl_is_immediately_expired(cache.as_ref()).await;
    cache_overwrite_refreshes_ttl(cache.as_ref()).await;

    // Consume
    cache_take_is_single_use(cache.as_ref()).await;
    cache_take_missing_is_not_found(cache.as_ref()).await;
    cache_health_check_succeeds(cache.as_ref()).await;

    // Concurrent
    concurrent_take_exactly_one_winner(Arc::clone(&cache)).await;
}

/// Run the full key store conformance suite against one store.
pub async fn run_all_store<S: KeyStore + ?Sized + 'static>(store: Arc<S>) {
    // CRUD
    store_get_unknown_is_empty(store.as_ref()).await;
    store_put_then_get(store.as_ref()).await;
    store_put_is_idempotent(store.as_ref()).await;
    store_delete_removes_only_target(store.as_ref()).await;
    store_delete_absent_is_noop(store.as_ref()).await;
    store_empty_set_is_reusable(store.as_ref()).await;
    store_digests_are_isolated(store.as_ref()).await;
    store_health_check_succeeds(store.as_ref()).await;

    // Concurrent
    concurrent_puts_lose_no_updates(Arc::clone(&store)).await;
    concurrent_same_key_puts_do_not_duplicate(Arc::clone(&store)).await;
    concurrent_put_delete_interleave(Arc::clone(&store)).await;
}
