//! A point in chain history: a symbolic tag or a concrete block number.

use super::error::EncodingError;
use super::quantity::Quantity;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum BlockParameter {
    Earliest,
    #[default]
    Latest,
    Pending,
    Number(Quantity),
}

impl BlockParameter {
    pub fn encode(&self) -> String {
        match self {
            BlockParameter::Earliest => "earliest".to_string(),
            BlockParameter::Latest => "latest".to_string(),
            BlockParameter::Pending => "pending".to_string(),
            BlockParameter::Number(number) => number.encode(),
        }
    }

    /// Accepts the three tag names or a strict [`Quantity`].
    pub fn decode(text: &str) -> Result<Self, EncodingError> {
        match text {
            "earliest" => Ok(BlockParameter::Earliest),
            "latest" => Ok(BlockParameter::Latest),
            "pending" => Ok(BlockParameter::Pending),
            other if other.starts_with("0x") => Quantity::decode(other).map(BlockParameter::Number),
            other => Err(EncodingError::UnknownBlockTag(other.to_string())),
        }
    }
}

impl fmt::Display for BlockParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for BlockParameter {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl From<u64> for BlockParameter {
    fn from(number: u64) -> Self {
        BlockParameter::Number(Quantity::from(number))
    }
}

impl From<Quantity> for BlockParameter {
    fn from(number: Quantity) -> Self {
        BlockParameter::Number(number)
    }
}

impl Serialize for BlockParameter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for BlockParameter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::decode(&text).map_err(serde::de::Error::custom)
    }
}
