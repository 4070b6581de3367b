//! Base64 codec for the `X-Payment` and `X-Payment-Response` header values.
//!
//! Both headers carry standard (padded) base64 of a JSON document.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Encodes raw bytes into a standard base64 string.
pub fn encode<T: AsRef<[u8]>>(input: T) -> String {
    STANDARD.encode(input)
}

/// Decodes base64 header bytes into the raw JSON they carry.
pub fn decode<T: AsRef<[u8]>>(input: T) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(input.as_ref())
}
