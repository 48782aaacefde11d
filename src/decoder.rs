//! Decoding of the base64 payloads the calling shell passes on the command line.

use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DecodeError {
    #[error("malformed base64: {0}")]
    Base64(String),
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(String),
}

/// Decodes a standard, padded base64 payload into text.
///
/// Empty (or whitespace-only) input decodes to an empty string. Malformed
/// input is an error and is never replaced with empty text.
pub fn decode(encoded: &str) -> Result<String, DecodeError> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Ok(String::new());
    }

    let bytes = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| DecodeError::Base64(e.to_string()))?;

    String::from_utf8(bytes).map_err(|e| DecodeError::Utf8(e.to_string()))
}
