//! Salted email digests.
//!
//! An identity is never stored or looked up by its raw address. The
//! [`Digester`] maps it to an opaque [`EmailDigest`] with a keyed hash, so
//! the stored data cannot be joined back to addresses without the salt.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use vey_storage::EmailDigest;

use crate::error::{AuthError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Length in bytes of an [`HmacDigester`] digest.
pub const DIGEST_LEN: usize = 32;

/// Deterministic one-way mapping from an email address to an identity key.
///
/// Implementations must be pure: the same address always yields the same
/// digest, and no input may cause a panic.
pub trait Digester: Send + Sync {
    /// Returns the digest of `email`.
    fn of(&self, email: &str) -> EmailDigest;
}

impl<D: Digester + ?Sized> Digester for std::sync::Arc<D> {
    fn of(&self, email: &str) -> EmailDigest {
        (**self).of(email)
    }
}

/// HMAC-SHA256 keyed with a secret salt over the exact address bytes.
///
/// No case folding is applied: `A@example.com` and `a@example.com` are
/// distinct identities.
///
/// ```
/// use vey_authn::{Digester, HmacDigester};
///
/// let digester = HmacDigester::new(b"salt").unwrap();
/// let first = digester.of("test@example.com");
/// assert_eq!(first, digester.of("test@example.com"));
/// assert_ne!(first, digester.of("other@example.com"));
/// ```
#[derive(Clone)]
pub struct HmacDigester {
    mac: HmacSha256,
}

impl HmacDigester {
    /// Creates a digester keyed with `salt`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidSalt`] if `salt` is empty.
    pub fn new(salt: impl AsRef<[u8]>) -> Result<Self> {
        let salt = salt.as_ref();
        if salt.is_empty() {
            return Err(AuthError::InvalidSalt("salt must not be empty".to_string()));
        }
        let mac = HmacSha256::new_from_slice(salt)
            .map_err(|e| AuthError::InvalidSalt(e.to_string()))?;
        Ok(Self { mac })
    }
}

impl Digester for HmacDigester {
    fn of(&self, email: &str) -> EmailDigest {
        let mut mac = self.mac.clone();
        mac.update(email.as_bytes());
        EmailDigest::new(mac.finalize().into_bytes().to_vec())
    }
}

impl fmt::Debug for HmacDigester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacDigester").field("salt", &"[REDACTED]").finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_deterministic() {
        let a = HmacDigester::new("salt").unwrap();
        let b = HmacDigester::new("salt").unwrap();
        assert_eq!(a.of("test@example.com"), b.of("test@example.com"));
    }

    #[test]
    fn test_digest_length() {
        let digester = HmacDigester::new("salt").unwrap();
        assert_eq!(digester.of("test@example.com").as_bytes().len(), DIGEST_LEN);
        assert_eq!(digester.of("").as_bytes().len(), DIGEST_LEN);
    }

    #[test]
    fn test_salt_changes_digest() {
        let a = HmacDigester::new("salt").unwrap();
        let b = HmacDigester::new("pepper").unwrap();
        assert_ne!(a.of("test@example.com"), b.of("test@example.com"));
    }

    #[test]
    fn test_case_is_significant() {
        let digester = HmacDigester::new("salt").unwrap();
        assert_ne!(digester.of("Test@example.com"), digester.of("test@example.com"));
    }

    #[test]
    fn test_salt_and_email_are_not_concatenated() {
        // A plain hash of salt || email would collide on these two.
        let a = HmacDigester::new("salt1").unwrap();
        let b = HmacDigester::new("salt").unwrap();
        assert_ne!(a.of("@x"), b.of("1@x"));
    }

    #[test]
    fn test_matches_known_hmac_vector() {
        // RFC 4231 test case 2.
        let digester = HmacDigester::new("Jefe").unwrap();
        let digest = digester.of("what do ya want for nothing?");
        let hex: String = digest.as_bytes().iter().map(|b| format!("{b:02x}")).collect();
        assert_eq!(hex, "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843");
    }

    #[test]
    fn test_empty_salt_rejected() {
        assert!(matches!(HmacDigester::new(""), Err(AuthError::InvalidSalt(_))));
    }

    #[test]
    fn test_arbitrary_input_does_not_panic() {
        let digester = HmacDigester::new("salt").unwrap();
        digester.of("\u{0}\u{ffff}🙂 not an email at all");
    }

    #[test]
    fn test_debug_redacts_salt() {
        let digester = HmacDigester::new("super-secret").unwrap();
        let debug = format!("{digester:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
