//! Value codec for the opaque `value` column.
//!
//! # Responsibility
//! - Turn structured application values into self-contained byte blobs.
//! - Turn stored blobs back into values, rejecting anything malformed.
//!
//! # Invariants
//! - `decode(encode(v)) == v` for every value the codec accepts.
//! - Every blob starts with [`FORMAT_VERSION`]; the rest is a bincode payload.
//! - A blob is consumed completely; trailing bytes are a decode error.
//!
//! Blobs are bound as SQLite `BLOB` parameters, which carry arbitrary bytes,
//! so no escaping pass is applied.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Leading byte of every encoded blob.
pub const FORMAT_VERSION: u8 = 1;

pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised while encoding or decoding stored values.
#[derive(Debug)]
pub enum CodecError {
    /// Value could not be serialized.
    Encode(bincode::error::EncodeError),
    /// Payload bytes are not a valid encoding of the requested type.
    Decode(bincode::error::DecodeError),
    /// Blob has no bytes at all.
    Empty,
    /// Blob was written by an unknown codec version.
    UnsupportedVersion(u8),
    /// Payload decoded but left unread bytes behind.
    TrailingBytes { consumed: usize, total: usize },
}

impl CodecError {
    /// Returns whether the error came from reading stored bytes.
    pub fn is_decode(&self) -> bool {
        !matches!(self, Self::Encode(_))
    }
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode value: {err}"),
            Self::Decode(err) => write!(f, "failed to decode value: {err}"),
            Self::Empty => write!(f, "failed to decode value: blob is empty"),
            Self::UnsupportedVersion(version) => write!(
                f,
                "failed to decode value: unsupported format version {version} (expected {FORMAT_VERSION})"
            ),
            Self::TrailingBytes { consumed, total } => write!(
                f,
                "failed to decode value: {} trailing bytes after {consumed} of {total}",
                total - consumed
            ),
        }
    }
}

impl Error for CodecError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::Empty => None,
            Self::UnsupportedVersion(_) => None,
            Self::TrailingBytes { .. } => None,
        }
    }
}

/// Encodes one value into a versioned blob.
pub fn encode<V: Serialize + ?Sized>(value: &V) -> CodecResult<Vec<u8>> {
    let payload = bincode::serde::encode_to_vec(value, bincode::config::standard())
        .map_err(CodecError::Encode)?;
    let mut blob = Vec::with_capacity(payload.len() + 1);
    blob.push(FORMAT_VERSION);
    blob.extend_from_slice(&payload);
    Ok(blob)
}

/// Decodes one versioned blob produced by [`encode`].
pub fn decode<V: DeserializeOwned>(bytes: &[u8]) -> CodecResult<V> {
    let (version, payload) = bytes.split_first().ok_or(CodecError::Empty)?;
    if *version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(*version));
    }

    let (value, consumed) =
        bincode::serde::decode_from_slice::<V, _>(payload, bincode::config::standard())
            .map_err(CodecError::Decode)?;
    if consumed != payload.len() {
        return Err(CodecError::TrailingBytes {
            consumed,
            total: payload.len(),
        });
    }
    Ok(value)
}
