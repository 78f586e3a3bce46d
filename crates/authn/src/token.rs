//! Challenge and confirmation token generation.

use std::fmt;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand_core::{OsRng, RngCore};
use zeroize::Zeroizing;

use crate::error::{AuthError, Result};

/// Number of random bytes behind each token.
pub const TOKEN_ENTROPY_BYTES: usize = 32;

/// A single-use challenge or confirmation token.
///
/// The value is the URL-safe, unpadded base64 encoding of
/// [`TOKEN_ENTROPY_BYTES`] random bytes. Its encoded bytes are both the
/// cache key and the message a registrant signs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Token(String);

impl Token {
    /// Wraps an already-encoded token, e.g. one received from a client.
    #[must_use]
    pub fn from_encoded(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Returns the encoded token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the encoded token as bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Consumes the token, returning the encoded string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<[u8]> for Token {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Token").field(&"[REDACTED]").finish()
    }
}

/// Generates a fresh token from the operating system's secure random source.
///
/// # Errors
///
/// Returns [`AuthError::RandomSource`] if the random source fails. There is
/// no fallback to a weaker generator.
pub fn generate_token() -> Result<Token> {
    fail::fail_point!("token-random-source", |_| {
        Err(AuthError::RandomSource("injected random source failure".to_string()))
    });

    let mut bytes = Zeroizing::new([0u8; TOKEN_ENTROPY_BYTES]);
    OsRng
        .try_fill_bytes(&mut bytes[..])
        .map_err(|e| AuthError::RandomSource(e.to_string()))?;

    Ok(Token(URL_SAFE_NO_PAD.encode(&bytes[..])))
}
