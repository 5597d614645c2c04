//! Keccak-256 with the original Keccak padding (as used throughout Ethereum),
//! plus the 32-byte [`Hash32`] value it produces.

use super::error::EncodingError;
use super::hex as hexcodec;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

pub const HASH_SIZE: usize = 32;

/// A 32-byte Keccak-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash32([u8; HASH_SIZE]);

impl Hash32 {
    pub const ZERO: Self = Self([0u8; HASH_SIZE]);

    pub const fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Builds a hash from a slice that must be exactly 32 bytes long.
    pub fn from_slice(slice: &[u8]) -> Result<Self, EncodingError> {
        if slice.len() != HASH_SIZE {
            return Err(EncodingError::WrongLength {
                expected: HASH_SIZE,
                actual: slice.len(),
            });
        }
        let mut bytes = [0u8; HASH_SIZE];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Parses 64 hex digits with an optional `0x` prefix.
    pub fn from_hex(text: &str) -> Result<Self, EncodingError> {
        let digits = hexcodec::strip_prefix(text);
        if digits.len() != HASH_SIZE * 2 {
            return Err(EncodingError::WrongLength {
                expected: HASH_SIZE * 2,
                actual: digits.len(),
            });
        }
        Self::from_slice(&hexcodec::decode_digits(digits)?)
    }

    pub fn to_hex(&self) -> String {
        hexcodec::encode_prefixed(self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub const fn as_fixed_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }
}

/// Hashes `data` with Keccak-256.
///
/// This is the pre-standard Keccak padding, so the output differs from
/// SHA3-256 for every input.
pub fn keccak256(data: impl AsRef<[u8]>) -> Hash32 {
    let digest = Keccak256::digest(data.as_ref());
    let mut bytes = [0u8; HASH_SIZE];
    bytes.copy_from_slice(&digest);
    Hash32(bytes)
}

/// Hashes the concatenation of `parts` without allocating the joined buffer.
pub fn keccak256_concat(parts: &[&[u8]]) -> Hash32 {
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut bytes = [0u8; HASH_SIZE];
    bytes.copy_from_slice(&hasher.finalize());
    Hash32(bytes)
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32({})", self.to_hex())
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Hash32 {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; HASH_SIZE]> for Hash32 {
    fn from(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }
}

impl From<Hash32> for [u8; HASH_SIZE] {
    fn from(hash: Hash32) -> Self {
        hash.0
    }
}

impl AsRef<[u8]> for Hash32 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Hash32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}
