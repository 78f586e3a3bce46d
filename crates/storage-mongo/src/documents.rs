//! BSON document shapes for both collections.
//!
//! Cache collection:
//!
//! ```text
//! { _id: Binary(challenge), digest: Binary, public_key?: { type: Int64, key: Binary },
//!   expires_at: Date }
//! ```
//!
//! Keys collection:
//!
//! ```text
//! { _id: Binary(digest), keys: [ { type: Int64, key: Binary }, ... ] }
//! ```
//!
//! Key entries are always written with `type` before `key` so that
//! `$addToSet` and `$pull` compare them consistently.

use bson::{Binary, Bson, DateTime, Document, doc, spec::BinarySubtype};
use vey_storage::{EmailDigest, PendingRecord, PublicKey, PublicKeyType};

use crate::error::{MongoStorageError, Result};

pub(crate) const ID: &str = "_id";
pub(crate) const DIGEST: &str = "digest";
pub(crate) const PUBLIC_KEY: &str = "public_key";
pub(crate) const EXPIRES_AT: &str = "expires_at";
pub(crate) const KEYS: &str = "keys";
const KEY_TYPE: &str = "type";
const KEY_BYTES: &str = "key";

/// Wraps raw bytes as generic BSON binary.
pub(crate) fn binary(bytes: &[u8]) -> Bson {
    Bson::Binary(Binary { subtype: BinarySubtype::Generic, bytes: bytes.to_vec() })
}

/// Filter matching one document by its binary `_id`.
pub(crate) fn by_id(id: &[u8]) -> Document {
    doc! { ID: binary(id) }
}

pub(crate) fn public_key_to_document(key: &PublicKey) -> Document {
    doc! {
        KEY_TYPE: i64::from(key.key_type.tag()),
        KEY_BYTES: binary(&key.key),
    }
}

pub(crate) fn public_key_from_document(document: &Document) -> Result<PublicKey> {
    let tag = document.get_i64(KEY_TYPE)?;
    let tag = u32::try_from(tag)
        .map_err(|_| MongoStorageError::malformed(KEY_TYPE, format!("tag {tag} out of range")))?;
    let key = document.get_binary_generic(KEY_BYTES)?;
    Ok(PublicKey::new(PublicKeyType::from(tag), key.clone()))
}

pub(crate) fn pending_to_document(
    challenge: &[u8],
    record: &PendingRecord,
    expires_at: DateTime,
) -> Document {
    let mut document = doc! {
        ID: binary(challenge),
        DIGEST: binary(record.email_digest.as_bytes()),
        EXPIRES_AT: expires_at,
    };
    if let Some(key) = &record.public_key {
        document.insert(PUBLIC_KEY, public_key_to_document(key));
    }
    document
}

/// Decodes a cache document into its record and expiry.
pub(crate) fn pending_from_document(document: &Document) -> Result<(PendingRecord, DateTime)> {
    let digest = EmailDigest::new(document.get_binary_generic(DIGEST)?.clone());
    let expires_at = *document.get_datetime(EXPIRES_AT)?;
    let public_key = match document.get(PUBLIC_KEY) {
        None | Some(Bson::Null) => None,
        Some(Bson::Document(key)) => Some(public_key_from_document(key)?),
        Some(_) => return Err(MongoStorageError::malformed(PUBLIC_KEY, "expected a document")),
    };
    Ok((PendingRecord { email_digest: digest, public_key }, expires_at))
}

/// Decodes the `keys` array of a key store document.
pub(crate) fn key_set_from_document(document: &Document) -> Result<Vec<PublicKey>> {
    let Some(entries) = document.get(KEYS) else {
        return Ok(Vec::new());
    };
    let Bson::Array(entries) = entries else {
        return Err(MongoStorageError::malformed(KEYS, "expected an array"));
    };

    entries
        .iter()
        .map(|entry| match entry {
            Bson::Document(key) => public_key_from_document(key),
            _ => Err(MongoStorageError::malformed(KEYS, "expected key documents")),
        })
        .collect()
}
