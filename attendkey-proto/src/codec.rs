//! Transport encoding for binary credential material.
//!
//! Every byte buffer exchanged with the relying party travels as a base64
//! string. Historically the attendance clients disagreed about which
//! alphabet to use, so decoding is forgiving: base64url and standard
//! base64, padded or unpadded, are all accepted. Encoding is canonical
//! base64url without padding, the WebAuthn convention.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::engine::GeneralPurpose;
use base64::Engine;
use serde::de::{Error, SeqAccess, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Decoding is attempted against each engine in order. The canonical
/// form comes first so well-behaved peers never fall through.
static ALLOWED_DECODING_ENGINES: &[GeneralPurpose] =
    &[URL_SAFE_NO_PAD, URL_SAFE, STANDARD, STANDARD_NO_PAD];

/// The input string was not valid in any accepted base64 alphabet, or
/// carried malformed padding. Nothing is ever truncated or substituted;
/// a bad string fails as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("input is not valid base64 or base64url data")]
pub struct DecodeError;

/// A container for binary data that serialises as unpadded base64url and
/// deserialises from any common base64 flavour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportBytes(pub Vec<u8>);

impl TransportBytes {
    /// Decode a transport string into bytes.
    pub fn decode(v: &str) -> Result<Self, DecodeError> {
        for engine in ALLOWED_DECODING_ENGINES {
            if let Ok(data) = engine.decode(v) {
                return Ok(TransportBytes(data));
            }
        }
        Err(DecodeError)
    }

    /// True when the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of bytes in the buffer.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for TransportBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", URL_SAFE_NO_PAD.encode(&self.0))
    }
}

impl From<Vec<u8>> for TransportBytes {
    fn from(v: Vec<u8>) -> TransportBytes {
        TransportBytes(v)
    }
}

impl From<&[u8]> for TransportBytes {
    fn from(v: &[u8]) -> TransportBytes {
        TransportBytes(v.to_vec())
    }
}

impl From<TransportBytes> for Vec<u8> {
    fn from(v: TransportBytes) -> Vec<u8> {
        v.0
    }
}

impl AsRef<[u8]> for TransportBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl FromStr for TransportBytes {
    type Err = DecodeError;

    fn from_str(v: &str) -> Result<Self, Self::Err> {
        TransportBytes::decode(v)
    }
}

impl TryFrom<&str> for TransportBytes {
    type Error = DecodeError;

    fn try_from(v: &str) -> Result<Self, Self::Error> {
        TransportBytes::decode(v)
    }
}

struct TransportBytesVisitor;

impl<'de> Visitor<'de> for TransportBytesVisitor {
    type Value = TransportBytes;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a base64 url encoded string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: Error,
    {
        TransportBytes::decode(v)
            .map_err(|_| Error::invalid_value(Unexpected::Str(v), &self))
    }

    fn visit_seq<A>(self, mut v: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        // Some peers ship raw byte arrays instead of strings.
        let mut data = if let Some(sz) = v.size_hint() {
            Vec::with_capacity(sz)
        } else {
            Vec::new()
        };

        while let Some(i) = v.next_element()? {
            data.push(i)
        }
        Ok(TransportBytes(data))
    }
}

impl<'de> Deserialize<'de> for TransportBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, <D as Deserializer<'de>>::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(TransportBytesVisitor)
    }
}

impl Serialize for TransportBytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
