//! Raw timestamp interpretation
//!
//! Sources deliver instants as epoch seconds, epoch milliseconds, fractional
//! seconds or ISO-8601 text. Integers above [`MILLISECONDS_THRESHOLD`] are
//! read as milliseconds (10^10 s is the year 2286, so no real seconds value
//! gets there). Text without an offset is taken as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::types::RawTimestamp;

/// Epoch values strictly above this are milliseconds.
pub const MILLISECONDS_THRESHOLD: i64 = 10_000_000_000;

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Convert a raw timestamp to a UTC instant; `None` if it cannot be read.
pub fn to_instant(raw: &RawTimestamp) -> Option<DateTime<Utc>> {
    match raw {
        RawTimestamp::Integer(value) => from_epoch_integer(*value),
        RawTimestamp::Float(value) => from_epoch_float(*value),
        RawTimestamp::Text(text) => from_text(text),
    }
}

fn from_epoch_integer(value: i64) -> Option<DateTime<Utc>> {
    if value > MILLISECONDS_THRESHOLD {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn from_epoch_float(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let seconds = if value > MILLISECONDS_THRESHOLD as f64 {
        value / 1000.0
    } else {
        value
    };
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}

fn from_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    // Numeric strings show up in some JSON feeds
    if let Ok(value) = text.parse::<i64>() {
        return from_epoch_integer(value);
    }
    if let Ok(value) = text.parse::<f64>() {
        return from_epoch_float(value);
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}
