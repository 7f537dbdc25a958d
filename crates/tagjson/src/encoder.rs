//! Type-dispatch encoder — writes a [`Value`] as JSON text.
//!
//! Extended types are rendered as `@name:` tagged strings (`DateTime`,
//! `Date`, `Duration`) or kind-discriminated objects (`Time`, `Year`); see
//! [`crate::tags`] for the exact grammar. Two renderings exist: "pretty"
//! (4-space indentation, keys sorted lexicographically) and "compact"
//! (minimal separators, insertion order). Both decode to the same value.

use chrono::Timelike;
use rust_decimal::prelude::ToPrimitive;

use crate::error::EncodeError;
use crate::tags;
use crate::value::Value;

const INDENT: &str = "    ";

/// Options controlling the output rendering.
#[derive(Debug, Clone)]
pub struct EncoderOptions {
    /// Indent nested structures and put a space after each key.
    pub pretty: bool,
    /// Emit object keys in lexicographic order instead of insertion order.
    pub sort_keys: bool,
}

impl EncoderOptions {
    /// Indented output with sorted keys. The default.
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            sort_keys: true,
        }
    }

    /// Minimal separators, insertion order.
    pub fn compact() -> Self {
        Self {
            pretty: false,
            sort_keys: false,
        }
    }
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self::pretty()
    }
}

/// Tagged-JSON encoder — writes JSON text to an internal string buffer.
pub struct Encoder {
    out: String,
    options: EncoderOptions,
    depth: usize,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    pub fn new() -> Self {
        Self::with_options(EncoderOptions::default())
    }

    pub fn compact() -> Self {
        Self::with_options(EncoderOptions::compact())
    }

    pub fn with_options(options: EncoderOptions) -> Self {
        Self {
            out: String::new(),
            options,
            depth: 0,
        }
    }

    /// Encode a value to JSON text. Encoding the same value twice with the
    /// same options yields byte-identical output.
    pub fn encode(&mut self, value: &Value) -> Result<String, EncodeError> {
        self.out.clear();
        self.depth = 0;
        self.write_any(value)?;
        Ok(std::mem::take(&mut self.out))
    }

    // ----------------------------------------------------------------
    // Dispatch

    /// First matching rule wins. The match arms for the extended types are
    /// kept in dispatch-precedence order: decimal, custom hook, set, year,
    /// duration, datetime, date, time, object, bytes, array.
    fn write_any(&mut self, value: &Value) -> Result<(), EncodeError> {
        match value {
            Value::Null => {
                self.out.push_str("null");
                Ok(())
            }
            Value::Bool(b) => {
                self.out.push_str(if *b { "true" } else { "false" });
                Ok(())
            }
            Value::Int(i) => {
                self.out.push_str(&i.to_string());
                Ok(())
            }
            Value::Float(f) => self.write_float(*f, value.type_name()),
            Value::Str(s) => {
                self.write_str(s);
                Ok(())
            }
            // Exact decimal input; the wire value is the nearest binary
            // float (documented precision loss).
            Value::Decimal(d) => {
                self.write_float(d.to_f64().unwrap_or_default(), value.type_name())
            }
            Value::Custom(hook) => {
                let produced = hook.to_json();
                self.write_any(&produced)
            }
            Value::Set(items) => self.write_arr(items),
            Value::Year(y) => {
                let pairs = vec![
                    ("year".to_string(), Value::Int(*y as i64)),
                    ("kind".to_string(), Value::Str("YEAR".to_string())),
                ];
                self.write_obj(&pairs)
            }
            Value::Duration(d) => {
                self.write_str(&tags::duration_tag(d));
                Ok(())
            }
            Value::DateTime(dt) => {
                self.write_str(&tags::datetime_tag(dt));
                Ok(())
            }
            Value::Date(d) => {
                self.write_str(&tags::date_tag(d));
                Ok(())
            }
            Value::Time(t) => {
                let pairs = vec![
                    ("hour".to_string(), Value::Int(t.hour() as i64)),
                    ("minute".to_string(), Value::Int(t.minute() as i64)),
                    ("second".to_string(), Value::Int(t.second() as i64)),
                    (
                        "microsecond".to_string(),
                        Value::Int((t.nanosecond() / 1_000) as i64),
                    ),
                    ("kind".to_string(), Value::Str("TIME".to_string())),
                ];
                self.write_obj(&pairs)
            }
            Value::Object(pairs) => self.write_obj(pairs),
            Value::Bytes(b) => {
                let s = std::str::from_utf8(b)?;
                self.write_str(s);
                Ok(())
            }
            Value::Array(items) => self.write_arr(items),
        }
    }

    // ----------------------------------------------------------------
    // Primitives

    /// `name` is the offending value's type name, reported when the number
    /// has no JSON representation.
    fn write_float(&mut self, f: f64, name: &'static str) -> Result<(), EncodeError> {
        if !f.is_finite() {
            return Err(EncodeError::TypeNotSerializable(name));
        }
        if f.fract() == 0.0 {
            // Keep a trailing ".0" so the integer/float distinction
            // survives a decode.
            self.out.push_str(&format!("{f:.1}"));
        } else {
            self.out.push_str(&format!("{f}"));
        }
        Ok(())
    }

    /// Write a JSON-encoded string with proper escaping.
    fn write_str(&mut self, s: &str) {
        let json = serde_json::to_string(s).unwrap_or_else(|_| String::from("\"\""));
        self.out.push_str(&json);
    }

    fn write_arr(&mut self, items: &[Value]) -> Result<(), EncodeError> {
        if items.is_empty() {
            self.out.push_str("[]");
            return Ok(());
        }
        self.out.push('[');
        self.depth += 1;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            self.newline_indent();
            self.write_any(item)?;
        }
        self.depth -= 1;
        self.newline_indent();
        self.out.push(']');
        Ok(())
    }

    fn write_obj(&mut self, pairs: &[(String, Value)]) -> Result<(), EncodeError> {
        if pairs.is_empty() {
            self.out.push_str("{}");
            return Ok(());
        }
        let mut order: Vec<usize> = (0..pairs.len()).collect();
        if self.options.sort_keys {
            order.sort_by(|&a, &b| pairs[a].0.cmp(&pairs[b].0));
        }
        self.out.push('{');
        self.depth += 1;
        for (i, &idx) in order.iter().enumerate() {
            if i > 0 {
                self.out.push(',');
            }
            self.newline_indent();
            let (key, val) = &pairs[idx];
            self.write_str(key);
            self.out.push(':');
            if self.options.pretty {
                self.out.push(' ');
            }
            self.write_any(val)?;
        }
        self.depth -= 1;
        self.newline_indent();
        self.out.push('}');
        Ok(())
    }

    fn newline_indent(&mut self) {
        if self.options.pretty {
            self.out.push('\n');
            for _ in 0..self.depth {
                self.out.push_str(INDENT);
            }
        }
    }
}
