//! Storage error types and result alias.
//!
//! Every [`ChallengeCache`](crate::ChallengeCache) and [`KeyStore`](crate::KeyStore)
//! implementation maps its backend-specific failures onto [`StorageError`], so
//! the protocol layer can tell "absent or expired" apart from "backend
//! unavailable" without knowing which engine is underneath.
//!
//! # Error Types
//!
//! - [`StorageError::NotFound`] - Pending record absent, consumed, or expired
//! - [`StorageError::Conflict`] - Lost race on a conditional write
//! - [`StorageError::Connection`] - Network or connection-related failures
//! - [`StorageError::Serialization`] - Data encoding/decoding failures
//! - [`StorageError::Internal`] - Backend-specific internal errors
//! - [`StorageError::Timeout`] - Backend deadline exceeded
//!
//! # Example
//!
//! ```
//! use vey_storage::{StorageError, StorageResult};
//!
//! fn lookup() -> StorageResult<Vec<u8>> {
//!     Err(StorageError::not_found("pending record"))
//! }
//!
//! assert!(lookup().unwrap_err().is_not_found());
//! ```

use std::sync::Arc;

use thiserror::Error;

/// A boxed error type for source chain tracking.
pub type BoxError = Arc<dyn std::error::Error + Send + Sync>;

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during cache and key store operations.
///
/// Errors preserve their source chain via the `#[source]` attribute, enabling
/// debugging tools to display the full error context.
///
/// # Non-exhaustive
///
/// New variants may be added in future minor releases. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The requested entry does not exist.
    ///
    /// For a [`ChallengeCache`](crate::ChallengeCache) this covers "never set",
    /// "already consumed" and "expired" uniformly. A
    /// [`KeyStore`](crate::KeyStore) never returns this variant.
    #[error("Not found: {key}")]
    NotFound {
        /// Description of what was looked up. Never the secret key value itself.
        key: String,
    },

    /// A conditional write lost a race with a concurrent writer.
    #[error("Conflict: concurrent modification detected")]
    Conflict,

    /// Connection or network error.
    #[error("Connection error: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
        /// The underlying error that caused this connection failure.
        #[source]
        source: Option<BoxError>,
    },

    /// Serialization or deserialization error.
    ///
    /// Indicates a stored document that cannot be decoded, usually data
    /// corruption or a schema mismatch.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization error.
        message: String,
        /// The underlying error that caused serialization to fail.
        #[source]
        source: Option<BoxError>,
    },

    /// Internal storage backend error.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
        /// The underlying error that caused this internal failure.
        #[source]
        source: Option<BoxError>,
    },

    /// The backend did not answer within its configured deadline.
    #[error("Timeout")]
    Timeout,
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Creates a new `Connection` error with the given message.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection { message: message.into(), source: None }
    }

    /// Creates a new `Connection` error with a message and source error.
    #[must_use]
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `Serialization` error with the given message.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization { message: message.into(), source: None }
    }

    /// Creates a new `Serialization` error with a message and source error.
    #[must_use]
    pub fn serialization_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Serialization { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `Internal` error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into(), source: None }
    }

    /// Creates a new `Internal` error with a message and source error.
    #[must_use]
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Internal { message: message.into(), source: Some(Arc::new(source)) }
    }

    /// Creates a new `Timeout` error.
    #[must_use]
    pub fn timeout() -> Self {
        Self::Timeout
    }

    /// Returns `true` for the "absent or expired" condition.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if the failure is likely transient (the backend may
    /// recover on its own). The core never retries; callers may.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Timeout)
    }
}

/// Errors produced while validating backend configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    /// A required field was not provided or was empty.
    #[error("missing required field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// A field was provided with an unusable value.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Creates a new `MissingField` error.
    #[must_use]
    pub fn missing(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Creates a new `InvalidValue` error.
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue { field, reason: reason.into() }
    }
}
