use thiserror::Error;

/// Validation failures raised while constructing or decoding Ethereum values.
///
/// Every variant is reported synchronously by the constructor or decoder that
/// detected it; nothing is coerced into a default value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("malformed hex string")]
    MalformedHex,

    #[error("wrong length: expected {expected}, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("address casing does not match its EIP-55 checksum")]
    ChecksumMismatch,

    #[error("CREATE2 salt must be 32 bytes, got {0}")]
    InvalidSaltLength(usize),

    #[error("CREATE2 init code hash must be 32 bytes, got {0}")]
    InvalidInitCodeHashLength(usize),

    #[error("quantity has a leading zero digit or no digits")]
    LeadingZero,

    #[error("data has an odd number of hex digits")]
    OddLength,

    #[error("missing 0x prefix")]
    MissingPrefix,

    #[error("unknown block tag {0:?}")]
    UnknownBlockTag(String),
}
