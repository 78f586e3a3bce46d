//! Signature verification over typed public keys.
//!
//! Verification never errors: every malformed input answers `false`, and the
//! reason is logged at `debug` without key material or signatures.

use std::{collections::HashMap, fmt, sync::Arc};

use ed25519_dalek::Signature;
use vey_storage::{PublicKey, PublicKeyType};

use crate::ssh::parse_authorized_key;

/// Checks a signature over a message with a typed public key.
pub trait SignatureVerifier: Send + Sync {
    /// Returns `true` iff `signature` is a valid signature of `message` by
    /// `key`.
    fn verify(&self, key: &PublicKey, signature: &[u8], message: &[u8]) -> bool;
}

impl<V: SignatureVerifier + ?Sized> SignatureVerifier for Arc<V> {
    fn verify(&self, key: &PublicKey, signature: &[u8], message: &[u8]) -> bool {
        (**self).verify(key, signature, message)
    }
}

/// Ed25519 keys in OpenSSH `authorized_keys` format.
///
/// The signature is the raw 64-byte Ed25519 signature of the message bytes.
/// Verification uses the strict variant, which also rejects small-order
/// keys and non-canonical signatures.
#[derive(Clone, Copy, Debug, Default)]
pub struct SshEd25519Verifier;

impl SignatureVerifier for SshEd25519Verifier {
    fn verify(&self, key: &PublicKey, signature: &[u8], message: &[u8]) -> bool {
        if key.key_type != PublicKeyType::SshEd25519 {
            tracing::debug!(key_type = %key.key_type, "key type is not ssh-ed25519");
            return false;
        }

        let verifying_key = match parse_authorized_key(&key.key) {
            Ok(verifying_key) => verifying_key,
            Err(e) => {
                tracing::debug!(error = %e, "rejecting unparseable public key");
                return false;
            },
        };

        let signature = match Signature::from_slice(signature) {
            Ok(signature) => signature,
            Err(_) => {
                tracing::debug!(len = signature.len(), "rejecting malformed signature");
                return false;
            },
        };

        match verifying_key.verify_strict(message, &signature) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!("signature does not match key");
                false
            },
        }
    }
}

/// Dispatches verification by [`PublicKeyType`].
///
/// Types with no registered verifier, including every
/// [`PublicKeyType::Unknown`] tag, verify as `false`.
///
/// ```
/// use vey_authn::{SignatureVerifier, VerifierRegistry};
/// use vey_storage::{PublicKey, PublicKeyType};
///
/// let registry = VerifierRegistry::default();
/// let key = PublicKey::new(PublicKeyType::from(9), b"anything".to_vec());
/// assert!(!registry.verify(&key, b"sig", b"message"));
/// ```
#[derive(Clone)]
pub struct VerifierRegistry {
    verifiers: HashMap<PublicKeyType, Arc<dyn SignatureVerifier>>,
}

impl VerifierRegistry {
    /// Creates a registry with no verifiers; every key verifies as `false`.
    #[must_use]
    pub fn empty() -> Self {
        Self { verifiers: HashMap::new() }
    }

    /// Registers `verifier` for `key_type`, replacing any previous one.
    #[must_use]
    pub fn with(mut self, key_type: PublicKeyType, verifier: impl SignatureVerifier + 'static) -> Self {
        self.register(key_type, verifier);
        self
    }

    /// Registers `verifier` for `key_type`, replacing any previous one.
    pub fn register(&mut self, key_type: PublicKeyType, verifier: impl SignatureVerifier + 'static) {
        self.verifiers.insert(key_type, Arc::new(verifier));
    }

    /// Returns whether a verifier is registered for `key_type`.
    #[must_use]
    pub fn supports(&self, key_type: PublicKeyType) -> bool {
        self.verifiers.contains_key(&key_type)
    }
}

impl Default for VerifierRegistry {
    /// A registry with [`SshEd25519Verifier`] for [`PublicKeyType::SshEd25519`].
    fn default() -> Self {
        Self::empty().with(PublicKeyType::SshEd25519, SshEd25519Verifier)
    }
}

impl SignatureVerifier for VerifierRegistry {
    fn verify(&self, key: &PublicKey, signature: &[u8], message: &[u8]) -> bool {
        match self.verifiers.get(&key.key_type) {
            Some(verifier) => verifier.verify(key, signature, message),
            None => {
                tracing::debug!(key_type = %key.key_type, "no verifier registered for key type");
                false
            },
        }
    }
}

impl fmt::Debug for VerifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.verifiers.keys().map(|t| t.tag()).collect();
        types.sort_unstable();
        f.debug_struct("VerifierRegistry").field("types", &types).finish()
    }
}
