//! Tag grammar: formatting and parsing of `@name:` string payloads.
//!
//! The wire grammar is bit-exact across implementations:
//!
//! - `@datetime:YYYY-MM-DDThh:mm:ss[.ffffff][Z]`
//! - `@date:YYYY-MM-DD`
//! - `@duration:<integer seconds>` (encoder-only)
//!
//! The year is always 4 digits; every other field is zero-padded to 2
//! digits on encode, and may be 1 or 2 digits on decode input.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};

/// The two tags the decoder reconstructs.
pub const DATETIME: &str = "@datetime:";
pub const DATE: &str = "@date:";
/// Encoder-only; `@duration:` strings pass through the decoder unchanged.
pub const DURATION: &str = "@duration:";

// ----------------------------------------------------------------
// Formatting (encoder side)

pub fn datetime_tag(dt: &NaiveDateTime) -> String {
    let mut s = format!(
        "{}{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
        DATETIME,
        dt.year(),
        dt.month(),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second()
    );
    let micro = dt.nanosecond() / 1_000;
    if micro != 0 {
        s.push_str(&format!(".{micro:06}"));
    }
    s
}

pub fn date_tag(d: &NaiveDate) -> String {
    format!("{}{:04}-{:02}-{:02}", DATE, d.year(), d.month(), d.day())
}

/// Whole seconds; any sub-second component is truncated.
pub fn duration_tag(d: &TimeDelta) -> String {
    format!("{}{}", DURATION, d.num_seconds())
}

// ----------------------------------------------------------------
// Recognition (decoder side)

/// Extract the tag prefix (including the colon) from a candidate string.
/// Returns `None` unless the string starts with `@` and contains a `:`.
pub(crate) fn tag_of(s: &str) -> Option<&str> {
    if !s.starts_with('@') {
        return None;
    }
    s.find(':').map(|i| &s[..=i])
}

/// Parse a `@datetime:` payload: 4-digit year, then 1-2 digit month, day,
/// hour, minute and second, an optional `.`-prefixed microsecond count and
/// an optional trailing `Z` after the fraction. Text beyond the matched
/// prefix is ignored.
pub(crate) fn parse_datetime(payload: &str) -> Option<NaiveDateTime> {
    let b = payload.as_bytes();
    let mut i = 0;
    let year = take_digits(b, &mut i, 4, 4)?;
    eat(b, &mut i, b'-')?;
    let month = take_digits(b, &mut i, 1, 2)?;
    eat(b, &mut i, b'-')?;
    let day = take_digits(b, &mut i, 1, 2)?;
    eat(b, &mut i, b'T')?;
    let hour = take_digits(b, &mut i, 1, 2)?;
    eat(b, &mut i, b':')?;
    let minute = take_digits(b, &mut i, 1, 2)?;
    eat(b, &mut i, b':')?;
    let second = take_digits(b, &mut i, 1, 2)?;

    let mut micro: u32 = 0;
    if i < b.len() && b[i] == b'.' {
        i += 1;
        let start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return None;
        }
        // The digit run is an integer count of microseconds, not a
        // normalized fraction: ".5" means 5 microseconds.
        micro = payload[start..i].parse().ok()?;
        if micro > 999_999 {
            return None;
        }
    }

    let date = NaiveDate::from_ymd_opt(year as i32, month, day)?;
    let time = NaiveTime::from_hms_micro_opt(hour, minute, second, micro)?;
    Some(NaiveDateTime::new(date, time))
}

/// Parse a `@date:` payload: exactly three `-`-separated integers.
pub(crate) fn parse_date(payload: &str) -> Option<NaiveDate> {
    let mut parts = payload.split('-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

fn eat(b: &[u8], i: &mut usize, expected: u8) -> Option<()> {
    if *i < b.len() && b[*i] == expected {
        *i += 1;
        Some(())
    } else {
        None
    }
}

/// Consume between `min` and `max` ASCII digits and return their value.
fn take_digits(b: &[u8], i: &mut usize, min: usize, max: usize) -> Option<u32> {
    let start = *i;
    while *i < b.len() && *i - start < max && b[*i].is_ascii_digit() {
        *i += 1;
    }
    if *i - start < min {
        return None;
    }
    let mut value: u32 = 0;
    for &d in &b[start..*i] {
        value = value * 10 + (d - b'0') as u32;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_payloads() {
        let dt = parse_datetime("2012-04-02T06:12:00").unwrap();
        assert_eq!(datetime_tag(&dt), "@datetime:2012-04-02T06:12:00");

        // 1-digit fields are accepted on input, padded on output
        let dt = parse_datetime("2012-4-2T6:1:0").unwrap();
        assert_eq!(datetime_tag(&dt), "@datetime:2012-04-02T06:01:00");

        // Fraction digits are a microsecond count
        let dt = parse_datetime("1970-05-02T06:10:00.5Z").unwrap();
        assert_eq!(dt.and_utc().timestamp_subsec_micros(), 5);

        let dt = parse_datetime("1970-05-02T06:10:00.123456").unwrap();
        assert_eq!(datetime_tag(&dt), "@datetime:1970-05-02T06:10:00.123456");
    }

    #[test]
    fn datetime_rejects() {
        assert!(parse_datetime("1970-05-02").is_none());
        assert!(parse_datetime("1970-13-02T00:00:00").is_none());
        assert!(parse_datetime("70-05-02T00:00:00").is_none());
        assert!(parse_datetime("1970-05-02T00:00:00.").is_none());
        assert!(parse_datetime("1970-05-02T00:00:00.1234567").is_none());
    }

    #[test]
    fn date_payloads() {
        let d = parse_date("2019-3-15").unwrap();
        assert_eq!(date_tag(&d), "@date:2019-03-15");
        assert!(parse_date("2019-03").is_none());
        assert!(parse_date("2019-03-15-01").is_none());
        assert!(parse_date("2019-03-32").is_none());
        assert!(parse_date("197O-05-02").is_none());
    }

    #[test]
    fn tag_extraction() {
        assert_eq!(tag_of("@date:2019-03-15"), Some("@date:"));
        assert_eq!(tag_of("@date1970-05-02"), None);
        assert_eq!(tag_of("plain"), None);
        assert_eq!(tag_of("@døte:1970-05-02"), Some("@døte:"));
    }
}
