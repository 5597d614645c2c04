//! The 20-byte Ethereum account address and its EIP-55 checksum encoding.
//!
//! Addresses compare and hash over their raw bytes only, so two parses of the
//! same address with different casing are equal.

use super::error::EncodingError;
use super::hex as hexcodec;
use super::keccak::keccak256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const ADDRESS_SIZE: usize = 20;
const ADDRESS_HEX_CHARS: usize = ADDRESS_SIZE * 2;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EthereumAddress([u8; ADDRESS_SIZE]);

impl EthereumAddress {
    pub const ZERO: Self = Self([0u8; ADDRESS_SIZE]);

    pub const fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    /// Builds an address from a slice that must be exactly 20 bytes long.
    pub fn from_slice(slice: &[u8]) -> Result<Self, EncodingError> {
        if slice.len() != ADDRESS_SIZE {
            return Err(EncodingError::WrongLength {
                expected: ADDRESS_SIZE,
                actual: slice.len(),
            });
        }
        let mut bytes = [0u8; ADDRESS_SIZE];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Parses a hex address with an optional `0x` prefix.
    ///
    /// With `checksummed == false` any casing is accepted. With
    /// `checksummed == true` the casing of every letter must equal the EIP-55
    /// casing recomputed from the parsed bytes, otherwise
    /// [`EncodingError::ChecksumMismatch`] is returned.
    pub fn from_hex(text: &str, checksummed: bool) -> Result<Self, EncodingError> {
        let digits = hexcodec::strip_prefix(text);
        if digits.len() != ADDRESS_HEX_CHARS {
            return Err(EncodingError::WrongLength {
                expected: ADDRESS_HEX_CHARS,
                actual: digits.len(),
            });
        }

        let address = Self::from_slice(&hexcodec::decode_digits(digits)?)?;

        if checksummed && address.checksum_digits() != digits {
            return Err(EncodingError::ChecksumMismatch);
        }

        Ok(address)
    }

    /// Canonical EIP-55 mixed-case rendering with a `0x` prefix.
    pub fn to_checksum_hex(&self) -> String {
        format!("0x{}", self.checksum_digits())
    }

    /// All lower-case rendering with a `0x` prefix.
    pub fn to_lower_hex(&self) -> String {
        hexcodec::encode_prefixed(self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub const fn as_fixed_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// EIP-55: hash the lower-case hex digits as ASCII and upper-case each
    /// letter whose corresponding hash nibble is >= 8.
    fn checksum_digits(&self) -> String {
        let lower = hexcodec::encode(self.0);
        let hash = keccak256(lower.as_bytes());
        let hash = hash.as_bytes();

        lower
            .chars()
            .enumerate()
            .map(|(idx, digit)| {
                let byte = hash[idx / 2];
                let nibble = if idx % 2 == 0 { byte >> 4 } else { byte & 0x0f };
                if nibble >= 8 {
                    digit.to_ascii_uppercase()
                } else {
                    digit
                }
            })
            .collect()
    }
}

impl fmt::Debug for EthereumAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EthereumAddress({})", self.to_checksum_hex())
    }
}

impl fmt::Display for EthereumAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum_hex())
    }
}

/// Parses without checksum enforcement; use [`EthereumAddress::from_hex`] to
/// require a valid EIP-55 casing.
impl FromStr for EthereumAddress {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s, false)
    }
}

impl From<[u8; ADDRESS_SIZE]> for EthereumAddress {
    fn from(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }
}

impl From<EthereumAddress> for [u8; ADDRESS_SIZE] {
    fn from(address: EthereumAddress) -> Self {
        address.0
    }
}

impl AsRef<[u8]> for EthereumAddress {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for EthereumAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum_hex())
    }
}

impl<'de> Deserialize<'de> for EthereumAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text, false).map_err(serde::de::Error::custom)
    }
}
