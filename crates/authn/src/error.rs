//! Authentication error types.
//!
//! Errors raised while validating identities, deriving digests, generating
//! challenges and parsing public keys. Signature verification itself never
//! errors; it answers `false`.

use thiserror::Error;

/// Authentication errors.
///
/// # Non-exhaustive
///
/// This enum is marked `#[non_exhaustive]`. Downstream match expressions
/// must include a wildcard arm (`_ =>`).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AuthError {
    /// The email address is not syntactically valid.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// The digest salt is unusable.
    #[error("Invalid salt: {0}")]
    InvalidSalt(String),

    /// The operating system's secure random source failed.
    #[error("Random source failure: {0}")]
    RandomSource(String),

    /// Public key bytes could not be parsed for their declared type.
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// Result type alias for authentication operations.
pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_reason() {
        let err = AuthError::InvalidEmail("missing '@'".to_string());
        assert_eq!(err.to_string(), "Invalid email: missing '@'");

        let err = AuthError::RandomSource("getrandom failed".to_string());
        assert_eq!(err.to_string(), "Random source failure: getrandom failed");
    }
}
