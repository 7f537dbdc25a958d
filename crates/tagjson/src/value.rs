//! The `Value` union handled by the tagged-JSON codec.
//!
//! `Value` covers plain JSON (null, bool, number, string, array, object)
//! plus the extended types the encoder renders as tagged strings or
//! kind-discriminated objects: naive date/time values, durations, calendar
//! years, decimals, byte strings and sets.
//!
//! Objects are stored as `Vec<(String, Value)>` so that decoded documents
//! keep the key order of the input text.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use rust_decimal::Decimal;

/// Custom serialization hook.
///
/// A producer type that has no natural `Value` variant can implement this
/// trait and be wrapped with [`Value::custom`]; the encoder calls
/// [`ToJson::to_json`] and re-dispatches on the returned value. This is also
/// the materialization point for lazy sources such as query cursors: the
/// hook must realize the full collection before returning it.
pub trait ToJson: fmt::Debug + Send + Sync {
    fn to_json(&self) -> Value;
}

/// A value the codec can encode, and (for the non-extended variants plus
/// `DateTime`/`Date`) decode back.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    /// Exact integer. Magnitude is limited to the `i64` range; larger
    /// numbers in decoded input fall back to `Float`.
    Int(i64),
    Float(f64),
    /// Exact decimal input. Encoding converts to the nearest `f64`, which
    /// is intentionally lossy; callers needing exact decimal semantics must
    /// not rely on round-trip.
    Decimal(Decimal),
    Str(String),
    /// Byte string; encoded as UTF-8 text, failing if the bytes are not
    /// valid UTF-8.
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    /// A set of values. Encoded as a JSON array in whatever order the
    /// entries were collected in; the order is not meaningful.
    Set(Vec<Value>),
    /// Mapping with insertion order preserved.
    Object(Vec<(String, Value)>),
    /// Timezone-naive date and time; encodes as `@datetime:...`.
    DateTime(NaiveDateTime),
    /// Calendar date; encodes as `@date:YYYY-MM-DD`.
    Date(NaiveDate),
    /// Clock time; encodes as a `{"kind":"TIME"}` object, never a tag.
    Time(NaiveTime),
    /// Duration; encodes as `@duration:<whole seconds>`. One-way: the
    /// decoder leaves `@duration:` strings untouched.
    Duration(TimeDelta),
    /// Calendar year; encodes as a `{"kind":"YEAR"}` object.
    Year(i32),
    /// Opaque producer object carrying its own serialization hook.
    Custom(Arc<dyn ToJson>),
}

impl Value {
    /// Wrap a producer type that implements [`ToJson`].
    pub fn custom<T: ToJson + 'static>(hook: T) -> Value {
        Value::Custom(Arc::new(hook))
    }

    /// Byte-string constructor (kept separate from the `From` impls so that
    /// `Vec<u8>` is not claimed by the generic sequence conversion).
    pub fn bytes(data: impl Into<Vec<u8>>) -> Value {
        Value::Bytes(data.into())
    }

    /// Build an object from key/value pairs, preserving pair order.
    pub fn object<K, V, I>(pairs: I) -> Value
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Object(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build an object from an attribute listing, skipping every name that
    /// starts with an underscore. This is the "expose public attributes"
    /// capability for opaque producer objects.
    pub fn from_attrs<K, V, I>(attrs: I) -> Value
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Object(
            attrs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .filter(|(k, _)| !k.starts_with('_'))
                .collect(),
        )
    }

    /// Name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Set(_) => "set",
            Value::Object(_) => "object",
            Value::DateTime(_) => "datetime",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Duration(_) => "duration",
            Value::Year(_) => "year",
            Value::Custom(_) => "custom",
        }
    }
}

/// Objects compare by key set (every key of one side must be present on the
/// other with an equal value), not by entry order, so a document whose keys
/// were re-ordered by the sorting encoder still equals its source value.
/// `Custom` values are equal only when they are the same allocation.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, va)| {
                        b.iter().any(|(bk, vb)| bk == k && vb == va)
                    })
            }
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::Duration(a), Value::Duration(b)) => a == b,
            (Value::Year(a), Value::Year(b)) => a == b,
            (Value::Custom(a), Value::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

// ----------------------------------------------------------------
// Conversions from host types

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Value {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Value {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Value {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::Str(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Value {
        Value::Decimal(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Value {
        Value::DateTime(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Value {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Value {
        Value::Time(v)
    }
}

impl From<TimeDelta> for Value {
    fn from(v: TimeDelta) -> Value {
        Value::Duration(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Value {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Value {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

/// Sequences and lazy iterators are materialized eagerly into an array.
/// Memory use is bounded by the fully realized size of the source, so
/// unbounded sources must be capped by the caller.
impl<T: Into<Value>> FromIterator<T> for Value {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Value {
        Value::Array(iter.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Value {
        Value::Object(map.into_iter().collect())
    }
}

impl From<HashMap<String, Value>> for Value {
    fn from(map: HashMap<String, Value>) -> Value {
        Value::Object(map.into_iter().collect())
    }
}

impl<T: Into<Value> + Ord> From<BTreeSet<T>> for Value {
    fn from(set: BTreeSet<T>) -> Value {
        Value::Set(set.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Eq + std::hash::Hash> From<HashSet<T>> for Value {
    fn from(set: HashSet<T>) -> Value {
        Value::Set(set.into_iter().map(Into::into).collect())
    }
}
