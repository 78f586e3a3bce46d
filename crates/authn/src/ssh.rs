//! OpenSSH `authorized_keys` parsing for Ed25519 keys.
//!
//! A line has the shape `[options] ssh-ed25519 <base64 blob> [comment]`. The
//! blob is the SSH wire encoding: two length-prefixed strings, the algorithm
//! name and the 32-byte public key.

use base64::{Engine, engine::general_purpose::STANDARD};
use ed25519_dalek::{PUBLIC_KEY_LENGTH, VerifyingKey};

use crate::error::{AuthError, Result};

/// Algorithm name of an Ed25519 SSH key.
pub const SSH_ED25519: &str = "ssh-ed25519";

/// Parses the first key line of `data` as an Ed25519 public key.
///
/// Blank lines and `#` comment lines are skipped.
///
/// # Errors
///
/// Returns [`AuthError::InvalidPublicKey`] if no line holds a well-formed
/// `ssh-ed25519` key or the key is not a valid curve point.
pub fn parse_authorized_key(data: &[u8]) -> Result<VerifyingKey> {
    let text = std::str::from_utf8(data).map_err(|_| invalid("key is not valid UTF-8"))?;

    let line = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .ok_or_else(|| invalid("no key line found"))?;

    parse_line(line)
}

fn parse_line(line: &str) -> Result<VerifyingKey> {
    let starts_with_type = line
        .strip_prefix(SSH_ED25519)
        .is_some_and(|rest| rest.starts_with(char::is_whitespace));
    if starts_with_type {
        parse_key_fields(line)
    } else {
        parse_key_fields(skip_options(line))
    }
}

/// Parses `ssh-ed25519 <blob> [comment]`.
fn parse_key_fields(fields: &str) -> Result<VerifyingKey> {
    let mut parts = fields.split_whitespace();
    let algorithm = parts.next().ok_or_else(|| invalid("missing key type"))?;
    if algorithm != SSH_ED25519 {
        return Err(invalid(format!("unsupported key type {algorithm:?}")));
    }
    let encoded = parts.next().ok_or_else(|| invalid("missing key data"))?;
    let blob = STANDARD.decode(encoded).map_err(|e| invalid(format!("key data: {e}")))?;

    decode_wire_key(&blob)
}

/// Returns the remainder of `line` after its leading options field.
///
/// Options are comma-separated and may contain double-quoted values with
/// spaces, so the field ends at the first whitespace outside quotes.
fn skip_options(line: &str) -> &str {
    let mut in_quotes = false;
    let mut escaped = false;
    for (idx, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            c if c.is_whitespace() && !in_quotes => return line[idx..].trim_start(),
            _ => {},
        }
    }
    ""
}

fn decode_wire_key(blob: &[u8]) -> Result<VerifyingKey> {
    let mut reader = WireReader { remaining: blob };

    let algorithm = reader.read_string()?;
    if algorithm != SSH_ED25519.as_bytes() {
        return Err(invalid(format!(
            "key data declares type {:?}",
            String::from_utf8_lossy(algorithm)
        )));
    }

    let key: [u8; PUBLIC_KEY_LENGTH] = reader
        .read_string()?
        .try_into()
        .map_err(|_| invalid(format!("ed25519 key must be {PUBLIC_KEY_LENGTH} bytes")))?;

    if !reader.remaining.is_empty() {
        return Err(invalid("trailing bytes after key data"));
    }

    VerifyingKey::from_bytes(&key).map_err(|e| invalid(e.to_string()))
}

/// Reader for SSH wire strings (`u32` big-endian length, then bytes).
struct WireReader<'a> {
    remaining: &'a [u8],
}

impl<'a> WireReader<'a> {
    fn read_string(&mut self) -> Result<&'a [u8]> {
        let (len, rest) = self
            .remaining
            .split_first_chunk::<4>()
            .ok_or_else(|| invalid("truncated length prefix"))?;
        let len = usize::try_from(u32::from_be_bytes(*len))
            .map_err(|_| invalid("length prefix overflows"))?;
        if rest.len() < len {
            return Err(invalid("truncated string"));
        }
        let (value, rest) = rest.split_at(len);
        self.remaining = rest;
        Ok(value)
    }
}

fn invalid(reason: impl Into<String>) -> AuthError {
    AuthError::InvalidPublicKey(reason.into())
}

/// Encodes `key` as an `authorized_keys` line without a trailing newline.
#[must_use]
pub fn encode_authorized_key(key: &VerifyingKey, comment: Option<&str>) -> String {
    let mut blob = Vec::with_capacity(4 + SSH_ED25519.len() + 4 + PUBLIC_KEY_LENGTH);
    for field in [SSH_ED25519.as_bytes(), key.as_bytes().as_slice()] {
        blob.extend_from_slice(&(field.len() as u32).to_be_bytes());
        blob.extend_from_slice(field);
    }
    let encoded = STANDARD.encode(blob);
    match comment {
        Some(comment) => format!("{SSH_ED25519} {encoded} {comment}"),
        None => format!("{SSH_ED25519} {encoded}"),
    }
}
