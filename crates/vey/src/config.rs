//! Service configuration.
//!
//! [`VeyConfig`] carries the digest salt, the challenge lifetime and the
//! backend selection. It deserializes from any serde format:
//!
//! ```
//! use std::time::Duration;
//!
//! use vey::{BackendConfig, VeyConfig};
//!
//! let config: VeyConfig = serde_json::from_str(
//!     r#"{
//!         "salt": "s3cret",
//!         "challenge_ttl": "10m",
//!         "backend": { "type": "mongodb", "uri": "mongodb://db:27017", "database": "vey" }
//!     }"#,
//! )?;
//! config.validate()?;
//!
//! assert_eq!(config.challenge_ttl(), Duration::from_secs(600));
//! assert!(matches!(config.backend(), BackendConfig::Mongodb(_)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{fmt, time::Duration};

use serde::Deserialize;
use vey_storage::ConfigError;
use vey_storage_mongo::MongoBackendConfig;
use zeroize::Zeroizing;

use crate::service::DEFAULT_CHALLENGE_TTL;

fn default_challenge_ttl() -> Duration {
    DEFAULT_CHALLENGE_TTL
}

/// Which challenge cache and key store implementations to run.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Process-local maps. State is lost on restart and not shared between
    /// replicas.
    #[default]
    Memory,

    /// MongoDB collections for both the cache and the key store.
    Mongodb(MongoBackendConfig),
}

impl BackendConfig {
    /// Checks the selected backend's settings.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Memory => Ok(()),
            Self::Mongodb(config) => config.validate(),
        }
    }
}

/// Top-level service configuration.
#[derive(Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VeyConfig {
    salt: Zeroizing<String>,

    #[serde(with = "humantime_serde", default = "default_challenge_ttl")]
    challenge_ttl: Duration,

    #[serde(default)]
    backend: BackendConfig,
}

#[bon::bon]
impl VeyConfig {
    /// Creates a new configuration, validating all fields.
    ///
    /// # Optional Fields
    ///
    /// * `challenge_ttl` - default 15 minutes
    /// * `backend` - default [`BackendConfig::Memory`]
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `salt` is empty
    /// - `challenge_ttl` is zero
    /// - the backend settings are invalid
    #[builder]
    pub fn new(
        #[builder(into)] salt: String,
        #[builder(default = DEFAULT_CHALLENGE_TTL)] challenge_ttl: Duration,
        #[builder(default)] backend: BackendConfig,
    ) -> Result<Self, ConfigError> {
        let config = Self { salt: Zeroizing::new(salt), challenge_ttl, backend };
        config.validate()?;
        Ok(config)
    }

    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.salt.is_empty() {
            return Err(ConfigError::missing("salt"));
        }
        if self.challenge_ttl.is_zero() {
            return Err(ConfigError::invalid("challenge_ttl", "must be greater than zero"));
        }
        self.backend.validate()
    }

    /// Returns the digest salt.
    #[must_use]
    pub fn salt(&self) -> &str {
        &self.salt
    }

    /// Returns how long issued challenges and tokens stay valid.
    #[must_use]
    pub fn challenge_ttl(&self) -> Duration {
        self.challenge_ttl
    }

    /// Returns the backend selection.
    #[must_use]
    pub fn backend(&self) -> &BackendConfig {
        &self.backend
    }
}

impl fmt::Debug for VeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VeyConfig")
            .field("salt", &"[REDACTED]")
            .field("challenge_ttl", &self.challenge_ttl)
            .field("backend", &self.backend)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = VeyConfig::builder().salt("salt").build().unwrap();
        assert_eq!(config.salt(), "salt");
        assert_eq!(config.challenge_ttl(), DEFAULT_CHALLENGE_TTL);
        assert!(matches!(config.backend(), BackendConfig::Memory));
    }

    #[test]
    fn test_builder_rejects_empty_salt() {
        let err = VeyConfig::builder().salt("").build().unwrap_err();
        assert_eq!(err, ConfigError::missing("salt"));
    }

    #[test]
    fn test_builder_rejects_zero_ttl() {
        let err = VeyConfig::builder().salt("s").challenge_ttl(Duration::ZERO).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "challenge_ttl", .. }));
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: VeyConfig = serde_json::from_str(r#"{"salt": "s"}"#).unwrap();
        assert_eq!(config.challenge_ttl(), DEFAULT_CHALLENGE_TTL);
        assert!(matches!(config.backend(), BackendConfig::Memory));
        config.validate().unwrap();
    }

    #[test]
    fn test_deserialize_memory_backend() {
        let config: VeyConfig =
            serde_json::from_str(r#"{"salt": "s", "challenge_ttl": "30s", "backend": {"type": "memory"}}"#)
                .unwrap();
        assert_eq!(config.challenge_ttl(), Duration::from_secs(30));
        assert!(matches!(config.backend(), BackendConfig::Memory));
    }

    #[test]
    fn test_deserialize_mongodb_backend() {
        let config: VeyConfig = serde_json::from_str(
            r#"{
                "salt": "s",
                "backend": {
                    "type": "mongodb",
                    "uri": "mongodb://localhost:27017",
                    "database": "vey",
                    "keys_collection": "registrations",
                    "connect_timeout": "500ms"
                }
            }"#,
        )
        .unwrap();
        let BackendConfig::Mongodb(mongo) = config.backend() else {
            panic!("expected mongodb backend, got {:?}", config.backend());
        };
        assert_eq!(mongo.database(), "vey");
        assert_eq!(mongo.keys_collection(), "registrations");
        assert_eq!(mongo.cache_collection(), "vey_cache");
        assert_eq!(mongo.connect_timeout(), Duration::from_millis(500));
    }

    #[test]
    fn test_deserialize_rejects_unknown_fields() {
        assert!(serde_json::from_str::<VeyConfig>(r#"{"salt": "s", "sallt": "t"}"#).is_err());
        assert!(
            serde_json::from_str::<VeyConfig>(r#"{"salt": "s", "backend": {"type": "dynamodb"}}"#)
                .is_err()
        );
    }

    #[test]
    fn test_deserialized_empty_salt_fails_validation() {
        let config: VeyConfig = serde_json::from_str(r#"{"salt": ""}"#).unwrap();
        assert_eq!(config.validate().unwrap_err(), ConfigError::missing("salt"));
    }

    #[test]
    fn test_invalid_mongodb_settings_fail_validation() {
        let config: VeyConfig = serde_json::from_str(
            r#"{"salt": "s", "backend": {"type": "mongodb", "uri": "", "database": "vey"}}"#,
        )
        .unwrap();
        assert_eq!(config.validate().unwrap_err(), ConfigError::missing("uri"));
    }

    #[test]
    fn test_debug_redacts_salt() {
        let config = VeyConfig::builder().salt("pepper-and-salt").build().unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("pepper-and-salt"));
        assert!(debug.contains("REDACTED"));
    }
}
