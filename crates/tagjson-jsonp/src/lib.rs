//! JSONP delivery envelopes for tagged JSON.
//!
//! The consumer's parser capability is unknown at encode time: a tag-aware
//! client can reconstruct `@datetime:`/`@date:` payloads, a plain client
//! only has `JSON.parse`. Handing both kinds of client the same callback
//! text requires removing the ambiguity between "a string that happens to
//! start with `@`" and "a tag requiring interpretation".
//!
//! Every top-level value is classified once:
//!
//! - **Simple** values (integers, decimals, strings not starting with `@`)
//!   cannot need tag interpretation, so they are delivered directly as
//!   `callback(<compact encoding>)`.
//! - **Compound** values (everything else) are encoded once into a document
//!   and then that document is re-encoded as a JSON string literal, so all
//!   structural characters, quotes and tag markers reach the client fully
//!   escaped. The envelope becomes `callback(<selector>(<string literal>))`
//!   where the selector picks the client's tag-aware parser when present
//!   and falls back to `JSON.parse`. The double encoding is applied to
//!   every compound value, even ones that provably contain no tags.

use tagjson::{encode_compact, EncodeError, Value};

/// Inline parser selector embedded verbatim in every compound envelope.
/// Side-effect free: uses the client's tag-aware parser when loaded, plain
/// `JSON.parse` otherwise. Either way the payload string parses to the
/// original document text, which the same parser is applied to once more.
pub const CLIENT_PARSE_FN: &str =
    "function(val){return(window.tagjson&&window.tagjson.parse)?window.tagjson.parse(val):JSON.parse(val)}";

/// How a top-level value must be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Safe to emit directly inside the callback call.
    Simple,
    /// Requires the double-encode disambiguation protocol.
    Compound,
}

/// Classify a top-level value. Only the top level is inspected: a simple
/// value never needs tag interpretation, and everything else goes through
/// the double-encode path regardless of its contents.
pub fn classify(value: &Value) -> Delivery {
    match value {
        Value::Int(_) | Value::Decimal(_) => Delivery::Simple,
        Value::Str(s) if !s.starts_with('@') => Delivery::Simple,
        _ => Delivery::Compound,
    }
}

/// Build the callback-invocation text delivered to the consumer.
pub fn envelope(callback: &str, value: &Value) -> Result<String, EncodeError> {
    match classify(value) {
        Delivery::Simple => Ok(format!("{}({})", callback, encode_compact(value)?)),
        Delivery::Compound => {
            let document = encode_compact(value)?;
            // Second encoding pass: the whole document becomes one JSON
            // string literal, inert until the selector re-parses it.
            let literal = encode_compact(&Value::Str(document))?;
            Ok(format!("{}({}({}))", callback, CLIENT_PARSE_FN, literal))
        }
    }
}
