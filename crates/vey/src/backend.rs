//! Composition of the service from its configuration.

use std::sync::Arc;

use vey_authn::{AuthError, HmacDigester};
use vey_storage::{
    ChallengeCache, ConfigError, KeyStore, MemoryChallengeCache, MemoryKeyStore, StorageError,
};
use vey_storage_mongo::MongoBackend;

use crate::{
    config::{BackendConfig, VeyConfig},
    error::Result,
    service::Vey,
};

/// The challenge cache and key store selected by a [`BackendConfig`].
pub type Backends = (Arc<dyn ChallengeCache>, Arc<dyn KeyStore>);

/// Builds the challenge cache and key store named by `config`.
///
/// For MongoDB this connects, pings the server and creates the cache's TTL
/// index before returning.
///
/// # Errors
///
/// Returns a [`StorageError`] if the MongoDB backend cannot be reached or
/// prepared.
pub async fn build_backends(config: &BackendConfig) -> std::result::Result<Backends, StorageError> {
    match config {
        BackendConfig::Memory => {
            tracing::info!(backend = "memory", "using in-memory backends");
            let cache: Arc<dyn ChallengeCache> = Arc::new(MemoryChallengeCache::new());
            let store: Arc<dyn KeyStore> = Arc::new(MemoryKeyStore::new());
            Ok((cache, store))
        },
        BackendConfig::Mongodb(mongo) => {
            let (cache, store) = MongoBackend::connect(mongo).await?.into_parts();
            tracing::info!(backend = "mongodb", "using MongoDB backends");
            let cache: Arc<dyn ChallengeCache> = Arc::new(cache);
            let store: Arc<dyn KeyStore> = Arc::new(store);
            Ok((cache, store))
        },
    }
}

impl Vey {
    /// Builds an orchestrator with the default verifiers from `config`.
    ///
    /// # Errors
    ///
    /// - [`VeyError::Config`](crate::VeyError::Config) if the configuration is invalid
    /// - [`VeyError::Internal`](crate::VeyError::Internal) if the backends cannot be built
    pub async fn from_config(config: &VeyConfig) -> Result<Self> {
        config.validate()?;

        let digester = HmacDigester::new(config.salt()).map_err(|e: AuthError| {
            ConfigError::invalid("salt", e.to_string())
        })?;
        let (cache, store) = build_backends(config.backend()).await?;

        Ok(Self::builder()
            .digester(Arc::new(digester))
            .cache(cache)
            .store(store)
            .challenge_ttl(config.challenge_ttl())
            .build()?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::VeyError;

    #[tokio::test]
    async fn test_memory_backends_are_usable() {
        let (cache, store) = build_backends(&BackendConfig::Memory).await.unwrap();
        cache.health_check().await.unwrap();
        store.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_from_config_with_memory_backend() {
        let config = VeyConfig::builder()
            .salt("salt")
            .challenge_ttl(std::time::Duration::from_secs(60))
            .build()
            .unwrap();
        let vey = Vey::from_config(&config).await.unwrap();
        assert_eq!(vey.challenge_ttl(), std::time::Duration::from_secs(60));
        vey.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_from_config_rejects_invalid_config() {
        let config: VeyConfig = serde_json::from_str(r#"{"salt": ""}"#).unwrap();
        let err = Vey::from_config(&config).await.unwrap_err();
        assert!(matches!(err, VeyError::Config(ConfigError::MissingField { field: "salt" })));
    }
}
