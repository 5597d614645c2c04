//! Plain hex encoding of byte sequences. Prefix handling is left to callers,
//! except that [`decode`] tolerates a leading `0x`/`0X`.

use super::error::EncodingError;

/// Renders each byte as two lower-case hex digits, with no prefix.
pub fn encode(bytes: impl AsRef<[u8]>) -> String {
    ::hex::encode(bytes)
}

/// Same as [`encode`] with a `0x` prefix prepended.
pub fn encode_prefixed(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", ::hex::encode(bytes))
}

/// Decodes a hex string, optionally prefixed with `0x` or `0X`.
///
/// Odd lengths and characters outside `[0-9a-fA-F]` both fail with
/// [`EncodingError::MalformedHex`].
pub fn decode(text: &str) -> Result<Vec<u8>, EncodingError> {
    decode_digits(strip_prefix(text))
}

/// Decodes bare hex digits. A `0x` here is just two more malformed digits.
pub(crate) fn decode_digits(digits: &str) -> Result<Vec<u8>, EncodingError> {
    ::hex::decode(digits).map_err(|_| EncodingError::MalformedHex)
}

pub(crate) fn strip_prefix(text: &str) -> &str {
    text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text)
}
