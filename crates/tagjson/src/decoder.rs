//! Tag-aware decoder — parses JSON text into a [`Value`].
//!
//! The parser is a plain byte-cursor JSON reader. Whenever an object value
//! is materialized it is run through tag recognition: strings of the form
//! `@datetime:...` and `@date:...` are reconstructed as `DateTime`/`Date`
//! values, any other `@`-prefixed string passes through unchanged, and a
//! recognized tag with a malformed payload is a fatal decode error.
//!
//! Recognition applies only to object values, never to array elements or
//! the top-level scalar, and only to the two tags above. `@duration:` and
//! the other encoder-side renderings are never reconstructed.

use crate::error::DecodeError;
use crate::tags;
use crate::value::Value;

/// Options controlling decoding behaviour.
#[derive(Debug, Clone)]
pub struct DecoderOptions {
    /// When `false`, perform plain JSON parsing with no tag recognition.
    pub tag_aware: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self { tag_aware: true }
    }
}

/// Tagged-JSON decoder — reads JSON text and produces a [`Value`].
pub struct Decoder {
    data: Vec<u8>,
    x: usize,
    options: DecoderOptions,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// Tag-aware decoder (the default).
    pub fn new() -> Self {
        Self::with_options(DecoderOptions::default())
    }

    /// Plain JSON decoder with no tag recognition.
    pub fn plain() -> Self {
        Self::with_options(DecoderOptions { tag_aware: false })
    }

    pub fn with_options(options: DecoderOptions) -> Self {
        Self {
            data: Vec::new(),
            x: 0,
            options,
        }
    }

    /// Decode a complete JSON document. Trailing non-whitespace is an
    /// error.
    pub fn decode(&mut self, text: &str) -> Result<Value, DecodeError> {
        self.data = text.as_bytes().to_vec();
        self.x = 0;
        let value = self.read_any()?;
        self.skip_ws();
        if self.x < self.data.len() {
            return Err(DecodeError::Parse(self.x));
        }
        Ok(value)
    }

    /// Convenience: decode from bytes, requiring valid UTF-8.
    pub fn decode_bytes(&mut self, input: &[u8]) -> Result<Value, DecodeError> {
        let text = std::str::from_utf8(input).map_err(|_| DecodeError::InvalidUtf8)?;
        self.decode(text)
    }

    // ----------------------------------------------------------------
    // Core read dispatch

    fn read_any(&mut self) -> Result<Value, DecodeError> {
        self.skip_ws();
        let x = self.x;
        if x >= self.data.len() {
            return Err(DecodeError::Parse(x));
        }
        match self.data[x] {
            b'"' => Ok(Value::Str(self.read_string()?)),
            b'[' => self.read_array(),
            b'f' => self.read_false(),
            b'n' => self.read_null(),
            b't' => self.read_true(),
            b'{' => self.read_obj(),
            c if c.is_ascii_digit() || c == b'-' => self.read_num(),
            _ => Err(DecodeError::Parse(x)),
        }
    }

    // ----------------------------------------------------------------
    // Primitives

    fn skip_ws(&mut self) {
        while self.x < self.data.len() {
            match self.data[self.x] {
                b' ' | b'\t' | b'\n' | b'\r' => self.x += 1,
                _ => break,
            }
        }
    }

    fn read_null(&mut self) -> Result<Value, DecodeError> {
        if self.x + 4 > self.data.len() || &self.data[self.x..self.x + 4] != b"null" {
            return Err(DecodeError::Parse(self.x));
        }
        self.x += 4;
        Ok(Value::Null)
    }

    fn read_true(&mut self) -> Result<Value, DecodeError> {
        if self.x + 4 > self.data.len() || &self.data[self.x..self.x + 4] != b"true" {
            return Err(DecodeError::Parse(self.x));
        }
        self.x += 4;
        Ok(Value::Bool(true))
    }

    fn read_false(&mut self) -> Result<Value, DecodeError> {
        if self.x + 5 > self.data.len() || &self.data[self.x..self.x + 5] != b"false" {
            return Err(DecodeError::Parse(self.x));
        }
        self.x += 5;
        Ok(Value::Bool(false))
    }

    fn read_num(&mut self) -> Result<Value, DecodeError> {
        let start = self.x;
        let len = self.data.len();
        let mut x = self.x;
        if x < len && self.data[x] == b'-' {
            x += 1;
        }
        // Integer part: a lone `0`, or a nonzero digit followed by more
        // digits; `01` is not a JSON number.
        let int_start = x;
        while x < len && self.data[x].is_ascii_digit() {
            x += 1;
        }
        if x == int_start || (self.data[int_start] == b'0' && x - int_start > 1) {
            return Err(DecodeError::Parse(start));
        }
        let mut is_float = false;
        if x < len && self.data[x] == b'.' {
            is_float = true;
            x += 1;
            let frac_start = x;
            while x < len && self.data[x].is_ascii_digit() {
                x += 1;
            }
            // At least one digit after the point
            if x == frac_start {
                return Err(DecodeError::Parse(start));
            }
        }
        if x < len && (self.data[x] == b'e' || self.data[x] == b'E') {
            is_float = true;
            x += 1;
            if x < len && (self.data[x] == b'+' || self.data[x] == b'-') {
                x += 1;
            }
            let exp_start = x;
            while x < len && self.data[x].is_ascii_digit() {
                x += 1;
            }
            if x == exp_start {
                return Err(DecodeError::Parse(start));
            }
        }
        self.x = x;
        let s = std::str::from_utf8(&self.data[start..x]).map_err(|_| DecodeError::InvalidUtf8)?;
        if is_float {
            let f: f64 = s.parse().map_err(|_| DecodeError::Parse(start))?;
            Ok(Value::Float(f))
        } else if let Ok(i) = s.parse::<i64>() {
            Ok(Value::Int(i))
        } else if let Ok(f) = s.parse::<f64>() {
            // Integer too large for i64
            Ok(Value::Float(f))
        } else {
            Err(DecodeError::Parse(start))
        }
    }

    fn read_string(&mut self) -> Result<String, DecodeError> {
        if self.x >= self.data.len() || self.data[self.x] != b'"' {
            return Err(DecodeError::Parse(self.x));
        }
        self.x += 1;
        let start = self.x;
        let end = self.find_end_quote(start)?;
        let s = decode_json_string(&self.data[start..end])?;
        self.x = end + 1; // skip closing quote
        Ok(s)
    }

    fn find_end_quote(&self, start: usize) -> Result<usize, DecodeError> {
        let data = &self.data;
        let mut i = start;
        while i < data.len() {
            match data[i] {
                b'\\' => i += 2, // skip escaped char
                b'"' => return Ok(i),
                _ => i += 1,
            }
        }
        Err(DecodeError::Parse(start))
    }

    fn read_array(&mut self) -> Result<Value, DecodeError> {
        let x = self.x;
        if x >= self.data.len() || self.data[x] != b'[' {
            return Err(DecodeError::Parse(x));
        }
        self.x += 1;
        let mut arr = Vec::new();
        let mut first = true;
        loop {
            self.skip_ws();
            if self.x >= self.data.len() {
                return Err(DecodeError::Parse(self.x));
            }
            let ch = self.data[self.x];
            if ch == b']' {
                self.x += 1;
                return Ok(Value::Array(arr));
            }
            if ch == b',' {
                // A separator is only valid between elements
                if first {
                    return Err(DecodeError::Parse(self.x));
                }
                self.x += 1;
            } else if !first {
                return Err(DecodeError::Parse(self.x));
            }
            self.skip_ws();
            arr.push(self.read_any()?);
            first = false;
        }
    }

    // ----------------------------------------------------------------
    // Objects and tag recognition

    fn read_obj(&mut self) -> Result<Value, DecodeError> {
        let x = self.x;
        if x >= self.data.len() || self.data[x] != b'{' {
            return Err(DecodeError::Parse(x));
        }
        self.x += 1;

        let mut pairs: Vec<(String, Value)> = Vec::new();
        let mut first = true;
        loop {
            self.skip_ws();
            if self.x >= self.data.len() {
                return Err(DecodeError::Parse(self.x));
            }
            let ch = self.data[self.x];
            if ch == b'}' {
                self.x += 1;
                return Ok(Value::Object(pairs));
            }
            if ch == b',' {
                // A separator is only valid between members
                if first {
                    return Err(DecodeError::Parse(self.x));
                }
                self.x += 1;
            } else if !first {
                return Err(DecodeError::Parse(self.x));
            }
            self.skip_ws();
            if self.x >= self.data.len() || self.data[self.x] != b'"' {
                return Err(DecodeError::Parse(self.x));
            }
            let key = self.read_string()?;
            self.skip_ws();
            if self.x >= self.data.len() || self.data[self.x] != b':' {
                return Err(DecodeError::Parse(self.x));
            }
            self.x += 1;
            self.skip_ws();
            let mut val = self.read_any()?;
            if self.options.tag_aware {
                val = revive_tag(val)?;
            }
            // A repeated key keeps its first position, last value.
            match pairs.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = val,
                None => pairs.push((key, val)),
            }
            first = false;
        }
    }
}

/// Apply tag recognition to a freshly materialized object value. Only the
/// `@datetime:` and `@date:` tags are acted on; strings with no colon,
/// unsupported tag names and non-string values are returned unchanged. A
/// supported tag with a payload that fails the tag grammar is a
/// [`DecodeError::TagPayloadMalformed`].
fn revive_tag(val: Value) -> Result<Value, DecodeError> {
    let Value::Str(s) = &val else {
        return Ok(val);
    };
    let Some(tag) = tags::tag_of(s) else {
        return Ok(val);
    };
    match tag {
        tags::DATETIME => {
            let payload = &s[tags::DATETIME.len()..];
            let dt = tags::parse_datetime(payload).ok_or_else(|| {
                DecodeError::TagPayloadMalformed {
                    tag: tags::DATETIME,
                    payload: payload.to_string(),
                }
            })?;
            Ok(Value::DateTime(dt))
        }
        tags::DATE => {
            let payload = &s[tags::DATE.len()..];
            let d = tags::parse_date(payload).ok_or_else(|| {
                DecodeError::TagPayloadMalformed {
                    tag: tags::DATE,
                    payload: payload.to_string(),
                }
            })?;
            Ok(Value::Date(d))
        }
        _ => Ok(val),
    }
}

/// Decode a JSON string body (content between quotes), handling escapes.
fn decode_json_string(bytes: &[u8]) -> Result<String, DecodeError> {
    if !bytes.contains(&b'\\') {
        return std::str::from_utf8(bytes)
            .map(|s| s.to_string())
            .map_err(|_| DecodeError::InvalidUtf8);
    }
    // Wrap in quotes and let serde_json handle the escape sequences.
    let mut quoted = Vec::with_capacity(bytes.len() + 2);
    quoted.push(b'"');
    quoted.extend_from_slice(bytes);
    quoted.push(b'"');
    let s: String = serde_json::from_slice(&quoted).map_err(|_| DecodeError::Parse(0))?;
    Ok(s)
}
