//! Error types for the MongoDB storage backends.
//!
//! This module provides [`MongoStorageError`] and its mapping onto the generic
//! [`StorageError`] the protocol layer understands.

use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;
use vey_storage::{ConfigError, StorageError};

/// Result type alias for MongoDB storage operations.
pub type Result<T> = std::result::Result<T, MongoStorageError>;

/// Server error code for a unique index violation.
const DUPLICATE_KEY: i32 = 11000;

/// Errors specific to the MongoDB storage backends.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MongoStorageError {
    /// Error from the MongoDB driver.
    #[error("MongoDB driver error: {0}")]
    Driver(#[from] mongodb::error::Error),

    /// A stored document is missing a field or holds the wrong BSON type.
    #[error("malformed document: {0}")]
    Document(#[from] bson::document::ValueAccessError),

    /// A stored field has the right BSON type but an unusable value.
    #[error("malformed field {field}: {reason}")]
    MalformedField {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl MongoStorageError {
    pub(crate) fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedField { field, reason: reason.into() }
    }
}

impl From<MongoStorageError> for StorageError {
    fn from(err: MongoStorageError) -> Self {
        match err {
            MongoStorageError::Driver(source) => driver_error_to_storage_error(source),
            err @ (MongoStorageError::Document(_) | MongoStorageError::MalformedField { .. }) => {
                tracing::debug!(error = %err, "undecodable document in MongoDB");
                StorageError::serialization_with_source("undecodable stored document", err)
            },
            MongoStorageError::Config(source) => {
                StorageError::internal_with_source("invalid MongoDB configuration", source)
            },
        }
    }
}

/// Converts a driver error to a storage error.
///
/// Socket deadlines become [`StorageError::Timeout`] and other reachability
/// failures become [`StorageError::Connection`], so callers can tell a down
/// cluster from a broken request.
fn driver_error_to_storage_error(err: mongodb::error::Error) -> StorageError {
    let kind = err.kind.as_ref();
    let timed_out =
        matches!(kind, ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::TimedOut);
    let unreachable = matches!(
        kind,
        ErrorKind::Io(_)
            | ErrorKind::ServerSelection { .. }
            | ErrorKind::ConnectionPoolCleared { .. }
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::Shutdown
    );
    let encoding = matches!(kind, ErrorKind::BsonSerialization(_) | ErrorKind::BsonDeserialization(_));
    let duplicate = matches!(
        kind,
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY
    );

    if timed_out {
        tracing::debug!(error = %err, "MongoDB operation timed out");
        StorageError::timeout()
    } else if unreachable {
        StorageError::connection_with_source("MongoDB unreachable", err)
    } else if encoding {
        StorageError::serialization_with_source("BSON encoding failed", err)
    } else if duplicate {
        tracing::debug!("concurrent upsert collided on a unique index");
        StorageError::Conflict
    } else {
        StorageError::internal_with_source("MongoDB operation failed", err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_field_maps_to_serialization() {
        let storage_err: StorageError = MongoStorageError::malformed("type", "negative tag").into();
        assert!(matches!(storage_err, StorageError::Serialization { .. }));
    }

    #[test]
    fn test_value_access_maps_to_serialization() {
        let doc = bson::doc! { "expires_at": "not a date" };
        let access = doc.get_datetime("expires_at").unwrap_err();

        let storage_err: StorageError = MongoStorageError::from(access).into();
        assert!(matches!(storage_err, StorageError::Serialization { .. }));
    }

    #[test]
    fn test_socket_timeout_maps_to_timeout() {
        let io = std::io::Error::from(std::io::ErrorKind::TimedOut);
        let driver = mongodb::error::Error::from(io);
        let storage_err: StorageError = MongoStorageError::from(driver).into();

        assert!(matches!(storage_err, StorageError::Timeout), "got {storage_err:?}");
        assert!(storage_err.is_transient());
    }

    #[test]
    fn test_other_io_failure_maps_to_connection() {
        let io = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
        let driver = mongodb::error::Error::from(io);
        let storage_err: StorageError = MongoStorageError::from(driver).into();

        assert!(matches!(storage_err, StorageError::Connection { .. }), "got {storage_err:?}");
    }

    #[test]
    fn test_config_error_maps_to_internal() {
        let err = MongoStorageError::Config(ConfigError::missing("uri"));
        let storage_err: StorageError = err.into();

        assert!(matches!(storage_err, StorageError::Internal { .. }));
    }

    #[test]
    fn test_display_does_not_hide_field_name() {
        let err = MongoStorageError::malformed("keys", "expected an array");
        assert_eq!(err.to_string(), "malformed field keys: expected an array");
    }
}
