//! Arbitrary-precision non-negative integers in their canonical JSON-RPC form:
//! `0x` followed by the minimal lower-case hex digits, with `0x0` for zero.

use super::error::EncodingError;
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Quantity(BigUint);

impl Quantity {
    pub fn new(value: BigUint) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn value(&self) -> &BigUint {
        &self.0
    }

    pub fn into_inner(self) -> BigUint {
        self.0
    }

    /// Narrows to `u64`, returning `None` when the value does not fit.
    pub fn to_u64(&self) -> Option<u64> {
        self.0.to_u64()
    }

    pub fn to_u128(&self) -> Option<u128> {
        self.0.to_u128()
    }

    pub fn encode(&self) -> String {
        format!("0x{}", self.0.to_str_radix(16))
    }

    /// Strict decoder: requires the `0x` prefix, at least one digit, and no
    /// leading zero unless the whole value is exactly `0x0`.
    pub fn decode(text: &str) -> Result<Self, EncodingError> {
        let digits = text
            .strip_prefix("0x")
            .ok_or(EncodingError::MissingPrefix)?;

        if digits.is_empty() || (digits.starts_with('0') && digits != "0") {
            return Err(EncodingError::LeadingZero);
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(EncodingError::MalformedHex);
        }

        BigUint::parse_bytes(digits.as_bytes(), 16)
            .map(Self)
            .ok_or(EncodingError::MalformedHex)
    }
}

impl fmt::Debug for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Quantity({})", self.encode())
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Quantity {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl From<u64> for Quantity {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u128> for Quantity {
    fn from(value: u128) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<BigUint> for Quantity {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl From<Quantity> for BigUint {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::decode(&text).map_err(serde::de::Error::custom)
    }
}
