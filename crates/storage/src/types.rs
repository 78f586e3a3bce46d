//! Data types shared by the cache, the key store and their consumers.
//!
//! None of these types carry a raw email address: identities are only ever
//! represented by their [`EmailDigest`].

use std::{fmt, num::NonZeroU32};

use serde::{Deserialize, Serialize};

/// Opaque identity key derived from an email address by a salted digest.
///
/// Used only as a lookup key and never reversed. The bytes are not secret
/// but also not meaningful, so `Debug` prints them as lowercase hex.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailDigest(Vec<u8>);

impl EmailDigest {
    /// Wraps raw digest bytes.
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Returns the digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consumes the digest, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for EmailDigest {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for EmailDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for EmailDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EmailDigest(")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        f.write_str(")")
    }
}

/// Key type tag selecting the signature verifier and the encoding of
/// [`PublicKey::key`].
///
/// The tag travels as a plain integer on the wire. Tags this build does not
/// know survive deserialization as [`PublicKeyType::Unknown`] so that the
/// verifier registry, not the decoder, rejects them. Tag 0 always means
/// [`PublicKeyType::SshEd25519`], so `Unknown` holds only non-zero tags and
/// every value has exactly one wire form.
///
/// ```
/// use vey_storage::PublicKeyType;
///
/// assert_eq!(PublicKeyType::from(0), PublicKeyType::SshEd25519);
/// assert_eq!(PublicKeyType::from(7).tag(), 7);
/// assert_eq!(PublicKeyType::SshEd25519.tag(), 0);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum PublicKeyType {
    /// Ed25519 key in OpenSSH `authorized_keys` line format.
    SshEd25519,
    /// A tag with no verifier in this build.
    Unknown(NonZeroU32),
}

impl PublicKeyType {
    /// Returns the numeric wire tag.
    #[must_use]
    pub const fn tag(self) -> u32 {
        match self {
            Self::SshEd25519 => 0,
            Self::Unknown(tag) => tag.get(),
        }
    }
}

impl From<u32> for PublicKeyType {
    fn from(tag: u32) -> Self {
        match NonZeroU32::new(tag) {
            None => Self::SshEd25519,
            Some(other) => Self::Unknown(other),
        }
    }
}

impl From<PublicKeyType> for u32 {
    fn from(key_type: PublicKeyType) -> Self {
        key_type.tag()
    }
}

impl fmt::Display for PublicKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SshEd25519 => f.write_str("ssh-ed25519"),
            Self::Unknown(tag) => write!(f, "unknown({tag})"),
        }
    }
}

/// A typed public key as registered against an identity.
///
/// Two keys are equal iff both the type tag and the key bytes are equal,
/// which is what the key store deduplicates on.
///
/// Serialized as `{"key": "<base64>", "type": <tag>}`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey {
    /// Encoded key material; interpretation depends on `key_type`.
    #[serde(with = "base64_bytes")]
    pub key: Vec<u8>,

    /// Which verifier understands `key`.
    #[serde(rename = "type")]
    pub key_type: PublicKeyType,
}

impl PublicKey {
    /// Creates a key of the given type.
    #[must_use]
    pub fn new(key_type: PublicKeyType, key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into(), key_type }
    }

    /// Creates an `ssh-ed25519` key from an `authorized_keys` line.
    #[must_use]
    pub fn ssh_ed25519(authorized_key: impl Into<Vec<u8>>) -> Self {
        Self::new(PublicKeyType::SshEd25519, authorized_key)
    }
}

/// Value stored in the challenge cache for a pending operation.
///
/// A pending registration carries only the identity; a pending deletion also
/// names the key to remove.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRecord {
    /// Identity the challenge or token was issued for.
    pub email_digest: EmailDigest,

    /// Key targeted by a pending deletion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<PublicKey>,
}

impl PendingRecord {
    /// Record for a pending registration.
    #[must_use]
    pub fn put(email_digest: EmailDigest) -> Self {
        Self { email_digest, public_key: None }
    }

    /// Record for a pending deletion of `public_key`.
    #[must_use]
    pub fn delete(email_digest: EmailDigest, public_key: PublicKey) -> Self {
        Self { email_digest, public_key: Some(public_key) }
    }
}

mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(D::Error::custom)
    }
}
