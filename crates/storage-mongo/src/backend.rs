//! Connection setup shared by both MongoDB backends.

use bson::doc;
use mongodb::{Client, options::ClientOptions};

use crate::{
    cache::MongoChallengeCache,
    config::MongoBackendConfig,
    error::Result,
    keys::MongoKeyStore,
};

/// Application name reported to the server.
const APP_NAME: &str = "vey";

/// A connected pair of MongoDB backends sharing one client.
///
/// # Example
///
/// ```no_run
/// // Requires a running MongoDB server.
/// use vey_storage::{ChallengeCache, KeyStore};
/// use vey_storage_mongo::{MongoBackend, MongoBackendConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = MongoBackendConfig::builder()
///         .uri("mongodb://localhost:27017")
///         .database("vey")
///         .build()?;
///
///     let backend = MongoBackend::connect(&config).await?;
///     backend.cache().health_check().await?;
///     backend.key_store().health_check().await?;
///     Ok(())
/// }
/// ```
#[derive(Clone, Debug)]
pub struct MongoBackend {
    cache: MongoChallengeCache,
    key_store: MongoKeyStore,
}

impl MongoBackend {
    /// Connects to the cluster, verifies it answers, and prepares both
    /// collections.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the configuration is invalid
    /// - the connection string cannot be parsed
    /// - no server answers `ping` within the server selection timeout
    /// - the TTL index on the cache collection cannot be created
    #[tracing::instrument(skip(config), fields(database = %config.database()))]
    pub async fn connect(config: &MongoBackendConfig) -> Result<Self> {
        config.validate()?;

        let mut options = ClientOptions::parse(config.uri()).await?;
        options.server_selection_timeout = Some(config.server_selection_timeout());
        options.connect_timeout = Some(config.connect_timeout());
        options.app_name.get_or_insert_with(|| APP_NAME.to_owned());

        let client = Client::with_options(options)?;
        let database = client.database(config.database());
        database.run_command(doc! { "ping": 1 }).await?;

        let cache = MongoChallengeCache::new(&database, config.cache_collection());
        cache.ensure_indexes().await?;
        let key_store = MongoKeyStore::new(&database, config.keys_collection());

        tracing::info!(
            cache_collection = config.cache_collection(),
            keys_collection = config.keys_collection(),
            "connected to MongoDB"
        );

        Ok(Self { cache, key_store })
    }

    /// Returns the challenge cache.
    #[must_use]
    pub fn cache(&self) -> MongoChallengeCache {
        self.cache.clone()
    }

    /// Returns the key store.
    #[must_use]
    pub fn key_store(&self) -> MongoKeyStore {
        self.key_store.clone()
    }

    /// Splits the backend into its cache and key store.
    #[must_use]
    pub fn into_parts(self) -> (MongoChallengeCache, MongoKeyStore) {
        (self.cache, self.key_store)
    }
}
