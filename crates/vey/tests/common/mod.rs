//! Shared setup for the protocol integration tests.

#![allow(dead_code, clippy::expect_used)]

use std::{sync::Arc, time::Duration};

use vey::Vey;
use vey_authn::HmacDigester;
use vey_storage::{MemoryChallengeCache, MemoryKeyStore};

pub const EMAIL: &str = "test@example.com";

/// An orchestrator over in-memory backends, with handles on both backends.
pub struct Harness {
    pub vey: Vey,
    pub cache: Arc<MemoryChallengeCache>,
    pub store: Arc<MemoryKeyStore>,
}

pub fn harness() -> Harness {
    harness_with_ttl(vey::DEFAULT_CHALLENGE_TTL)
}

pub fn harness_with_ttl(ttl: Duration) -> Harness {
    let cache = Arc::new(MemoryChallengeCache::new());
    let store = Arc::new(MemoryKeyStore::new());
    let vey = Vey::builder()
        .digester(Arc::new(HmacDigester::new("salt").expect("salt")))
        .cache(cache.clone())
        .store(store.clone())
        .challenge_ttl(ttl)
        .build()
        .expect("valid orchestrator");
    Harness { vey, cache, store }
}
