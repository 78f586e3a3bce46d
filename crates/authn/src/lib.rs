//! # Vey Authentication
//!
//! Identity and proof-of-possession primitives for the vey key server.
//!
//! This crate provides:
//! - **Email validation**: syntactic `local@domain` checks run before any state is touched
//! - **Digests**: a salted keyed hash mapping an address to an opaque identity key
//! - **Tokens**: single-use challenges and confirmation tokens from the OS random source
//! - **Signature verification**: a registry dispatching on the key type tag, with an Ed25519
//!   verifier for OpenSSH `authorized_keys` keys
//!
//! ## Example
//!
//! ```
//! use ed25519_dalek::{Signer, SigningKey};
//! use vey_authn::{
//!     Digester, HmacDigester, SignatureVerifier, VerifierRegistry, generate_token,
//!     ssh::encode_authorized_key, validate_email,
//! };
//! use vey_storage::PublicKey;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! validate_email("test@example.com")?;
//! let digest = HmacDigester::new("salt")?.of("test@example.com");
//! assert_eq!(digest.as_bytes().len(), 32);
//!
//! let challenge = generate_token()?;
//! let signing_key = SigningKey::from_bytes(&[1; 32]);
//! let key = PublicKey::ssh_ed25519(encode_authorized_key(&signing_key.verifying_key(), None));
//! let signature = signing_key.sign(challenge.as_bytes()).to_bytes();
//!
//! assert!(VerifierRegistry::default().verify(&key, &signature, challenge.as_bytes()));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Salted email digests.
pub mod digest;
/// Email address validation.
pub mod email;
/// Authentication error types.
pub mod error;
/// OpenSSH public key parsing.
pub mod ssh;
/// Challenge and token generation.
pub mod token;
/// Signature verification and dispatch.
pub mod verify;

/// Test utilities (requires `testutil` feature).
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use digest::{DIGEST_LEN, Digester, HmacDigester};
pub use email::validate_email;
pub use error::{AuthError, Result};
pub use token::{TOKEN_ENTROPY_BYTES, Token, generate_token};
pub use verify::{SignatureVerifier, SshEd25519Verifier, VerifierRegistry};
