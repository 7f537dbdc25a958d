//! Tagged JSON codec.
//!
//! Extends plain JSON with a small `@name:` tagging convention so that
//! producers can ship values JSON has no native representation for —
//! timestamps, calendar dates, durations, decimals — and consumers can
//! recover them losslessly when they understand the tags, or fall back to
//! plain strings when they do not.
//!
//! - [`Encoder`] dispatches a [`Value`] to JSON text, inserting tag markers
//!   for the extended types.
//! - [`Decoder`] parses JSON text and reconstructs `@datetime:` and
//!   `@date:` payloads found in object values. The other renderings
//!   (`@duration:`, the `YEAR`/`TIME` objects) are one-way: they pass
//!   through the decoder as ordinary values.
//!
//! ```
//! use tagjson::{decode, encode_compact, Value};
//!
//! let date = chrono::NaiveDate::from_ymd_opt(2019, 3, 15).unwrap();
//! let doc = Value::object([("due", Value::Date(date))]);
//! let text = encode_compact(&doc).unwrap();
//! assert_eq!(text, r#"{"due":"@date:2019-03-15"}"#);
//! assert_eq!(decode(&text).unwrap(), doc);
//! ```

mod decoder;
mod encoder;
mod error;
pub mod tags;
mod value;

pub use decoder::{Decoder, DecoderOptions};
pub use encoder::{Encoder, EncoderOptions};
pub use error::{DecodeError, EncodeError};
pub use value::{ToJson, Value};

/// Encode with the pretty rendering: 4-space indentation, sorted keys.
pub fn encode(value: &Value) -> Result<String, EncodeError> {
    Encoder::new().encode(value)
}

/// Encode with the compact rendering: minimal separators, insertion order.
pub fn encode_compact(value: &Value) -> Result<String, EncodeError> {
    Encoder::compact().encode(value)
}

/// Decode with tag recognition.
pub fn decode(text: &str) -> Result<Value, DecodeError> {
    Decoder::new().decode(text)
}

/// Decode as plain JSON, leaving tagged strings untouched.
pub fn decode_plain(text: &str) -> Result<Value, DecodeError> {
    Decoder::plain().decode(text)
}

/// Convert a dotted name to a valid JSON field name.
pub fn json_name(name: &str) -> String {
    name.replace('.', "_")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use chrono::{NaiveDate, NaiveTime, TimeDelta};
    use rust_decimal::Decimal;

    use super::*;

    fn roundtrip(v: &Value) -> bool {
        decode(&encode(v).unwrap()).unwrap() == *v
    }

    fn dt(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    #[test]
    fn plain_roundtrip() {
        assert!(roundtrip(&Value::Array(vec![])));
        assert!(roundtrip(&Value::from(vec!["hello world"])));
        assert!(roundtrip(&Value::from(vec![vec!["hello", "world"]])));
        assert!(roundtrip(&Value::Object(vec![])));
        assert!(roundtrip(&Value::from(1i64)));
        assert!(roundtrip(&Value::object([
            ("a", Value::from(42i64)),
            ("b", Value::from(vec![1i64, 2, 3])),
            ("c", Value::Null),
        ])));
    }

    #[test]
    fn tagged_roundtrip() {
        let instant = Value::object([("t", Value::DateTime(dt(2012, 4, 2, 6, 12, 0)))]);
        assert!(roundtrip(&instant));
        let date = Value::object([(
            "d",
            Value::Date(NaiveDate::from_ymd_opt(2019, 3, 15).unwrap()),
        )]);
        assert!(roundtrip(&date));
    }

    #[test]
    fn encode_datetime_compact() {
        let v = Value::DateTime(dt(2012, 4, 2, 6, 12, 0));
        assert_eq!(
            encode_compact(&v).unwrap(),
            "\"@datetime:2012-04-02T06:12:00\""
        );
    }

    #[test]
    fn encode_decimal_is_lossy_float() {
        let v = Value::Decimal("3.14159263".parse::<Decimal>().unwrap());
        assert_eq!(encode_compact(&v).unwrap(), "3.14159263");
        let v = Value::Decimal("3".parse::<Decimal>().unwrap());
        assert_eq!(encode_compact(&v).unwrap(), "3.0");
    }

    #[test]
    fn encode_duration_is_one_way() {
        let v = Value::Duration(TimeDelta::seconds(4201));
        assert_eq!(encode_compact(&v).unwrap(), "\"@duration:4201\"");
        // Sub-second components are truncated
        let v = Value::Duration(TimeDelta::milliseconds(4201_900));
        assert_eq!(encode_compact(&v).unwrap(), "\"@duration:4201\"");
        // The decoder never reconstructs a duration
        let back = decode("{\"d\":\"@duration:4201\"}").unwrap();
        assert_eq!(
            back,
            Value::object([("d", Value::from("@duration:4201"))])
        );
    }

    #[test]
    fn encode_date() {
        let v = Value::Date(NaiveDate::from_ymd_opt(2019, 3, 15).unwrap());
        assert_eq!(encode_compact(&v).unwrap(), "\"@date:2019-03-15\"");
    }

    #[test]
    fn encode_year_object() {
        let back = decode(&encode(&Value::Year(2017)).unwrap()).unwrap();
        assert_eq!(
            back,
            Value::object([
                ("year", Value::from(2017i64)),
                ("kind", Value::from("YEAR")),
            ])
        );
    }

    #[test]
    fn encode_time_object() {
        let t = NaiveTime::from_hms_opt(1, 10, 1).unwrap();
        let back = decode(&encode(&Value::Time(t)).unwrap()).unwrap();
        assert_eq!(
            back,
            Value::object([
                ("hour", Value::from(1i64)),
                ("minute", Value::from(10i64)),
                ("second", Value::from(1i64)),
                ("microsecond", Value::from(0i64)),
                ("kind", Value::from("TIME")),
            ])
        );
    }

    #[test]
    fn encode_set_as_array() {
        let v = Value::from(BTreeSet::from([1i64, 2]));
        assert_eq!(encode_compact(&v).unwrap(), "[1,2]");
        assert_eq!(encode_compact(&Value::Set(vec![])).unwrap(), "[]");
    }

    #[test]
    fn encode_custom_hook_redispatches() {
        #[derive(Debug)]
        struct Answer;
        impl ToJson for Answer {
            fn to_json(&self) -> Value {
                Value::Int(42)
            }
        }
        assert_eq!(encode_compact(&Value::custom(Answer)).unwrap(), "42");

        #[derive(Debug)]
        struct Point;
        impl ToJson for Point {
            fn to_json(&self) -> Value {
                Value::from_attrs([("a", 42i64), ("_cached", 7i64)])
            }
        }
        assert_eq!(
            decode(&encode(&Value::custom(Point)).unwrap()).unwrap(),
            Value::object([("a", Value::from(42i64))])
        );
    }

    #[test]
    fn encode_bytes_as_utf8_text() {
        assert_eq!(
            encode_compact(&Value::bytes("hello")).unwrap(),
            "\"hello\""
        );
        let err = encode_compact(&Value::bytes(vec![0xff, 0xfe])).unwrap_err();
        assert!(matches!(err, EncodeError::Encoding(_)));
    }

    #[test]
    fn encode_materialized_iterators() {
        let v: Value = (0..0i64).collect();
        assert_eq!(encode_compact(&v).unwrap(), "[]");
        let v: Value = (1..4i64).collect();
        assert_eq!(encode_compact(&v).unwrap(), "[1,2,3]");
    }

    #[test]
    fn encode_rejects_non_finite_floats() {
        // The error names the offending value's type
        let err = encode_compact(&Value::Float(f64::NAN)).unwrap_err();
        assert_eq!(err, EncodeError::TypeNotSerializable("float"));
        assert!(encode_compact(&Value::Float(f64::INFINITY)).is_err());
    }

    #[test]
    fn encode_is_idempotent() {
        let v = Value::object([
            ("b", Value::from(vec![1i64, 2])),
            ("a", Value::from("x")),
        ]);
        assert_eq!(encode(&v).unwrap(), encode(&v).unwrap());
        assert_eq!(encode_compact(&v).unwrap(), encode_compact(&v).unwrap());
    }

    #[test]
    fn pretty_rendering_sorts_and_indents() {
        let v = Value::object([("b", Value::from(1i64)), ("a", Value::from(2i64))]);
        assert_eq!(encode(&v).unwrap(), "{\n    \"a\": 2,\n    \"b\": 1\n}");
        // Compact keeps insertion order unless sorting is requested
        assert_eq!(encode_compact(&v).unwrap(), "{\"b\":1,\"a\":2}");
        let mut sorted_compact = Encoder::with_options(EncoderOptions {
            pretty: false,
            sort_keys: true,
        });
        assert_eq!(sorted_compact.encode(&v).unwrap(), "{\"a\":2,\"b\":1}");
    }

    #[test]
    fn decode_datetime_value() {
        let v = decode("{\"k\":\"@datetime:1970-05-02T06:10:00\"}").unwrap();
        assert_eq!(
            v,
            Value::object([("k", Value::DateTime(dt(1970, 5, 2, 6, 10, 0)))])
        );
        // 1-digit fields and a fractional microsecond count
        let v = decode("{\"k\":\"@datetime:1970-5-2T6:10:00.5Z\"}").unwrap();
        let Value::Object(pairs) = v else { panic!() };
        let Value::DateTime(got) = &pairs[0].1 else { panic!() };
        assert_eq!(got.and_utc().timestamp_subsec_micros(), 5);
    }

    #[test]
    fn decode_date_value() {
        let v = decode("{\"k\":\"@date:1970-05-02\"}").unwrap();
        assert_eq!(
            v,
            Value::object([(
                "k",
                Value::Date(NaiveDate::from_ymd_opt(1970, 5, 2).unwrap()),
            )])
        );
    }

    #[test]
    fn decode_unsupported_tag_passes_through() {
        let v = decode("{\"k\":\"@d\u{f8}te:1970-05-02\"}").unwrap();
        assert_eq!(
            v,
            Value::object([("k", Value::from("@døte:1970-05-02"))])
        );
    }

    #[test]
    fn decode_no_colon_is_not_a_tag() {
        let v = decode("{\"k\":\"@date1970-05-02\"}").unwrap();
        assert_eq!(
            v,
            Value::object([("k", Value::from("@date1970-05-02"))])
        );
    }

    #[test]
    fn decode_malformed_payload_is_fatal() {
        let err = decode("{\"k\":\"@date:1970-05\"}").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TagPayloadMalformed { tag: tags::DATE, .. }
        ));
        let err = decode("{\"k\":\"@datetime:1970-05-02\"}").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TagPayloadMalformed { tag: tags::DATETIME, .. }
        ));
        let err = decode("{\"k\":\"@date:1970-13-02\"}").unwrap_err();
        assert!(matches!(err, DecodeError::TagPayloadMalformed { .. }));
    }

    #[test]
    fn decode_only_object_values_are_revived() {
        // Array elements stay plain strings
        let v = decode("{\"k\":[\"@date:2019-03-15\"]}").unwrap();
        assert_eq!(
            v,
            Value::object([("k", Value::from(vec!["@date:2019-03-15"]))])
        );
        // So does a top-level scalar
        let v = decode("\"@date:2019-03-15\"").unwrap();
        assert_eq!(v, Value::from("@date:2019-03-15"));
        // But nested object values are revived
        let v = decode("{\"a\":{\"b\":\"@date:2019-03-15\"}}").unwrap();
        let expected = Value::object([(
            "a",
            Value::object([(
                "b",
                Value::Date(NaiveDate::from_ymd_opt(2019, 3, 15).unwrap()),
            )]),
        )]);
        assert_eq!(v, expected);
    }

    #[test]
    fn decode_plain_mode_skips_recognition() {
        let v = decode_plain("{\"k\":\"@date:1970-05-02\"}").unwrap();
        assert_eq!(
            v,
            Value::object([("k", Value::from("@date:1970-05-02"))])
        );
        // Malformed payloads are not an error either; there is no tag pass
        let v = decode_plain("{\"k\":\"@date:1970-05\"}").unwrap();
        assert_eq!(v, Value::object([("k", Value::from("@date:1970-05"))]));
    }

    #[test]
    fn decode_preserves_key_order() {
        let Value::Object(pairs) = decode("{\"b\":1,\"zz\":2,\"a\":3}").unwrap() else {
            panic!("expected object");
        };
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["b", "zz", "a"]);
    }

    #[test]
    fn decode_scalars_and_numbers() {
        assert_eq!(decode("42").unwrap(), Value::Int(42));
        assert_eq!(decode("-7").unwrap(), Value::Int(-7));
        assert_eq!(decode("3.5").unwrap(), Value::Float(3.5));
        assert_eq!(decode("1e3").unwrap(), Value::Float(1000.0));
        assert_eq!(decode("true").unwrap(), Value::Bool(true));
        assert_eq!(decode("null").unwrap(), Value::Null);
        assert_eq!(decode("\"hi\"").unwrap(), Value::from("hi"));
        // An integer too large for i64 falls back to float
        assert!(matches!(
            decode("99999999999999999999").unwrap(),
            Value::Float(_)
        ));
    }

    #[test]
    fn decode_rejects_bad_json() {
        assert!(matches!(decode("").unwrap_err(), DecodeError::Parse(_)));
        assert!(matches!(decode("{\"a\":}").unwrap_err(), DecodeError::Parse(_)));
        assert!(matches!(decode("[1,]").unwrap_err(), DecodeError::Parse(_)));
        assert!(matches!(decode("42 x").unwrap_err(), DecodeError::Parse(_)));
    }

    #[test]
    fn decode_rejects_leading_separators() {
        assert!(matches!(decode("[,1]").unwrap_err(), DecodeError::Parse(_)));
        assert!(matches!(
            decode("{,\"a\":1}").unwrap_err(),
            DecodeError::Parse(_)
        ));
        assert!(matches!(decode("[,]").unwrap_err(), DecodeError::Parse(_)));
    }

    #[test]
    fn decode_rejects_non_json_numerals() {
        assert!(matches!(decode("01").unwrap_err(), DecodeError::Parse(_)));
        assert!(matches!(decode("-01").unwrap_err(), DecodeError::Parse(_)));
        assert!(matches!(decode("1.").unwrap_err(), DecodeError::Parse(_)));
        assert!(matches!(decode("1.e3").unwrap_err(), DecodeError::Parse(_)));
        assert!(matches!(decode("1e").unwrap_err(), DecodeError::Parse(_)));
        assert!(matches!(decode("1e+").unwrap_err(), DecodeError::Parse(_)));
        assert!(matches!(decode("-").unwrap_err(), DecodeError::Parse(_)));
        // Still-valid shapes
        assert_eq!(decode("0").unwrap(), Value::Int(0));
        assert_eq!(decode("-0").unwrap(), Value::Int(0));
        assert_eq!(decode("0.5").unwrap(), Value::Float(0.5));
        assert_eq!(decode("10").unwrap(), Value::Int(10));
    }

    #[test]
    fn decode_bytes_requires_utf8() {
        assert_eq!(
            Decoder::new().decode_bytes(b"{\"k\":42}").unwrap(),
            Value::object([("k", Value::from(42i64))])
        );
        assert_eq!(
            Decoder::new().decode_bytes(&[0xff, 0xfe]).unwrap_err(),
            DecodeError::InvalidUtf8
        );
    }

    #[test]
    fn json_name_replaces_dots() {
        assert_eq!(json_name("hello.world"), "hello_world");
    }
}
