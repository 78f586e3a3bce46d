#![allow(clippy::expect_used)]

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use tokio::runtime::Runtime;
use vey_storage::{
    ChallengeCache, KeyStore, MemoryChallengeCache, MemoryKeyStore,
    testutil::{make_digest, make_key, make_public_key, make_record},
};

const TTL: Duration = Duration::from_secs(900);

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn rt() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to create tokio runtime")
}

/// Creates a cache pre-populated with `count` pending records.
fn populated_cache(rt: &Runtime, count: usize) -> MemoryChallengeCache {
    let cache = rt.block_on(async { MemoryChallengeCache::new() });
    rt.block_on(async {
        for i in 0..count {
            cache.set(&make_key("c:", i), make_record("bench"), TTL).await.expect("populate set");
        }
    });
    cache
}

/// Creates a key store whose one identity holds `count` keys.
fn populated_store(rt: &Runtime, count: usize) -> MemoryKeyStore {
    let store = MemoryKeyStore::new();
    let digest = make_digest("bench");
    rt.block_on(async {
        for i in 0..count {
            store.put(&digest, &make_public_key(i)).await.expect("populate put");
        }
    });
    store
}

// ---------------------------------------------------------------------------
// 1. cache_operations
// ---------------------------------------------------------------------------

fn cache_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_operations");
    let rt = rt();

    for &count in &[1, 1_000, 100_000] {
        let cache = populated_cache(&rt, count);
        let key = make_key("c:", 0);
        group.bench_with_input(BenchmarkId::new("get_live", count), &count, |b, _| {
            b.to_async(&rt).iter(|| {
                let cache = cache.clone();
                let key = key.clone();
                async move {
                    cache.get(&key).await.expect("get failed");
                }
            });
        });
    }

    {
        let cache = populated_cache(&rt, 1);
        group.bench_function("get_missing", |b| {
            b.to_async(&rt).iter(|| {
                let cache = cache.clone();
                async move {
                    assert!(cache.get(b"never-issued").await.is_err());
                }
            });
        });
    }

    {
        let cache = populated_cache(&rt, 0);
        let next = AtomicUsize::new(0);
        group.bench_function("set_then_take", |b| {
            b.to_async(&rt).iter(|| {
                let cache = cache.clone();
                let key = make_key("st:", next.fetch_add(1, Ordering::Relaxed));
                async move {
                    cache.set(&key, make_record("bench"), TTL).await.expect("set failed");
                    cache.take(&key).await.expect("take failed");
                }
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// 2. keystore_operations
// ---------------------------------------------------------------------------

fn keystore_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("keystore_operations");
    let rt = rt();
    let digest = make_digest("bench");

    for &count in &[1, 16, 256] {
        let store = populated_store(&rt, count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("get", count), &count, |b, _| {
            b.to_async(&rt).iter(|| {
                let store = store.clone();
                let digest = digest.clone();
                async move {
                    store.get(&digest).await.expect("get failed");
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("put_existing", count), &count, |b, _| {
            b.to_async(&rt).iter(|| {
                let store = store.clone();
                let digest = digest.clone();
                async move {
                    store.put(&digest, &make_public_key(0)).await.expect("put failed");
                }
            });
        });
    }

    {
        let store = populated_store(&rt, 16);
        let key = make_public_key(usize::MAX);
        group.bench_function("put_delete_cycle", |b| {
            b.to_async(&rt).iter(|| {
                let store = store.clone();
                let digest = digest.clone();
                let key = key.clone();
                async move {
                    store.put(&digest, &key).await.expect("put failed");
                    store.delete(&digest, &key).await.expect("delete failed");
                }
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// 3. concurrent_operations
// ---------------------------------------------------------------------------

fn concurrent_operations(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_operations");
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    for &tasks in &[2, 8, 32] {
        let cache = rt.block_on(async { MemoryChallengeCache::new() });
        group.throughput(Throughput::Elements(tasks as u64));
        group.bench_with_input(BenchmarkId::new("contended_take", tasks), &tasks, |b, &tasks| {
            b.to_async(&rt).iter(|| {
                let cache = cache.clone();
                async move {
                    cache.set(b"contended", make_record("bench"), TTL).await.expect("set failed");
                    let mut handles = Vec::with_capacity(tasks);
                    for _ in 0..tasks {
                        let cache = cache.clone();
                        handles.push(tokio::spawn(async move { cache.take(b"contended").await }));
                    }
                    let mut winners = 0;
                    for handle in handles {
                        if handle.await.expect("task panicked").is_ok() {
                            winners += 1;
                        }
                    }
                    assert_eq!(winners, 1);
                }
            });
        });
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// 4. health_check
// ---------------------------------------------------------------------------

fn health_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("health_check");
    let rt = rt();
    let cache = populated_cache(&rt, 1_000);
    let store = populated_store(&rt, 16);

    group.bench_function("cache", |b| {
        b.to_async(&rt).iter(|| {
            let cache = cache.clone();
            async move { cache.health_check().await.expect("health_check failed") }
        });
    });
    group.bench_function("store", |b| {
        b.to_async(&rt).iter(|| {
            let store = store.clone();
            async move { store.health_check().await.expect("health_check failed") }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    cache_operations,
    keystore_operations,
    concurrent_operations,
    health_check
);
criterion_main!(benches);
