//! Shared test utilities for key-registration testing.
//!
//! Helpers for generating Ed25519 key pairs, encoding them as OpenSSH
//! `authorized_keys` lines and signing challenges. Feature-gated behind
//! `testutil` to prevent leaking into production builds.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! vey-authn = { path = "../authn", features = ["testutil"] }
//! ```
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use vey_authn::testutil::{generate_keypair, sign};
//!
//! let (signing_key, public_key) = generate_keypair();
//! let signature = sign(&signing_key, b"challenge");
//! ```

use ed25519_dalek::{Signer, SigningKey};
use rand_core::OsRng;
use vey_storage::PublicKey;

use crate::ssh::encode_authorized_key;

/// Generates a fresh Ed25519 key pair.
///
/// Returns the signing key and the matching `ssh-ed25519` [`PublicKey`] in
/// `authorized_keys` format, with a trailing newline as `ssh-keygen` writes
/// it.
pub fn generate_keypair() -> (SigningKey, PublicKey) {
    let signing_key = SigningKey::generate(&mut OsRng);
    let public_key = ssh_public_key(&signing_key);
    (signing_key, public_key)
}

/// Returns the `ssh-ed25519` [`PublicKey`] of `signing_key`.
pub fn ssh_public_key(signing_key: &SigningKey) -> PublicKey {
    PublicKey::ssh_ed25519(authorized_key_line(signing_key))
}

/// Encodes the public half of `signing_key` as an `authorized_keys` line.
pub fn authorized_key_line(signing_key: &SigningKey) -> String {
    format!("{}\n", encode_authorized_key(&signing_key.verifying_key(), None))
}

/// Signs `message`, returning the raw 64-byte signature.
pub fn sign(signing_key: &SigningKey, message: &[u8]) -> Vec<u8> {
    signing_key.sign(message).to_bytes().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SignatureVerifier, SshEd25519Verifier};

    #[test]
    fn test_generated_keypair_verifies() {
        let (signing_key, public_key) = generate_keypair();
        let signature = sign(&signing_key, b"challenge");
        assert!(SshEd25519Verifier.verify(&public_key, &signature, b"challenge"));
    }

    #[test]
    fn test_each_keypair_is_fresh() {
        let (_, a) = generate_keypair();
        let (_, b) = generate_keypair();
        assert_ne!(a, b);
    }

    #[test]
    fn test_line_format() {
        let (signing_key, _) = generate_keypair();
        let line = authorized_key_line(&signing_key);
        assert!(line.starts_with("ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAI"));
        assert!(line.ends_with('\n'));
    }
}
