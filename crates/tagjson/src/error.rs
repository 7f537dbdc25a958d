//! Error types for tagged-JSON encoding and decoding.
//!
//! All errors are local to the call that produced them and are returned
//! synchronously; the codec never logs, retries or partially recovers.

use thiserror::Error;

/// Errors that can occur while encoding a [`crate::Value`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    /// No dispatch rule applies to the value. With a closed value union
    /// this is reachable only for numbers JSON cannot represent (non-finite
    /// floats); producer types without a conversion are rejected at compile
    /// time instead.
    #[error("value of type `{0}` is not JSON serializable")]
    TypeNotSerializable(&'static str),
    /// Byte-to-text conversion failed during encoding.
    #[error("byte string is not valid UTF-8")]
    Encoding(#[from] std::str::Utf8Error),
}

/// Errors that can occur while decoding tagged-JSON text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// The underlying JSON text is not well-formed.
    #[error("invalid JSON at position {0}")]
    Parse(usize),
    /// Byte input is not valid UTF-8.
    #[error("input is not valid UTF-8")]
    InvalidUtf8,
    /// A supported tag name carried a payload that does not match the tag
    /// grammar. Never downgraded to a plain string.
    #[error("malformed `{tag}` payload: {payload:?}")]
    TagPayloadMalformed {
        tag: &'static str,
        payload: String,
    },
}
