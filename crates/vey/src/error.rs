//! Protocol error taxonomy.
//!
//! Validation and protocol failures reach the caller as typed variants.
//! Backend and randomness failures are logged once where they are detected
//! and surface as an opaque [`VeyError::Internal`].

use std::sync::Arc;

use thiserror::Error;
use vey_authn::AuthError;
use vey_storage::{BoxError, ConfigError, StorageError};

use crate::notify::NotifyError;

/// Result type alias for protocol operations.
pub type Result<T> = std::result::Result<T, VeyError>;

/// Errors returned by [`Vey`](crate::Vey) and [`KeyServer`](crate::KeyServer).
///
/// # Non-exhaustive
///
/// New variants may be added in future minor releases. Downstream match
/// expressions must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VeyError {
    /// The email address is malformed. Nothing was read or written.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// The challenge or token was never issued, was already used, or
    /// expired.
    #[error("Challenge or token not found")]
    NotFound,

    /// The signature does not match the public key over the challenge.
    #[error("Verify failed")]
    VerifyFailed,

    /// A backend or the random source failed.
    ///
    /// `message` names the failed step; backend details stay in `source`.
    #[error("Internal error: {message}")]
    Internal {
        /// The step that failed.
        message: String,
        /// The underlying failure.
        #[source]
        source: Option<BoxError>,
    },

    /// The challenge or token was issued but could not be delivered.
    #[error("Notification failed: {message}")]
    Notify {
        /// Description of the delivery failure.
        message: String,
        /// The underlying failure.
        #[source]
        source: Option<BoxError>,
    },

    /// The service configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl VeyError {
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

    /// Wraps a failed backend health check, naming which backend failed.
    pub(crate) fn unhealthy(backend: &'static str, err: StorageError) -> Self {
        tracing::error!(
            backend,
            error = %err,
            transient = err.is_transient(),
            "storage backend unhealthy"
        );
        Self::internal_with_source(format!("{backend} unavailable"), err)
    }

    /// Returns `true` for conditions caused by the caller's input, which
    /// the caller can fix by restarting the begin step or correcting the
    /// request.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidEmail(_) | Self::NotFound | Self::VerifyFailed)
    }
}

impl From<StorageError> for VeyError {
    fn from(err: StorageError) -> Self {
        if err.is_not_found() {
            return Self::NotFound;
        }
        tracing::error!(error = %err, transient = err.is_transient(), "storage backend failure");
        Self::internal_with_source("storage backend failure", err)
    }
}

impl From<AuthError> for VeyError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidEmail(reason) => Self::InvalidEmail(reason),
            other => {
                tracing::error!(error = %other, "authentication primitive failure");
                Self::internal_with_source("authentication primitive failure", other)
            },
        }
    }
}

impl From<NotifyError> for VeyError {
    fn from(err: NotifyError) -> Self {
        tracing::warn!(error = %err, "challenge delivery failed");
        Self::Notify { message: err.to_string(), source: Some(Arc::new(err)) }
    }
}
