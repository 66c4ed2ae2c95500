//! # Codec
//!
//! Encoder and decoder for compiled schemas.
//!
//! ## Wire layout
//!
//! ```text
//! [typeId:u8]? [field_1] [field_2] ... [field_n]
//!
//! int / float      1, 2, 4 or 8 bytes, big endian
//! bit group        1 byte, first field in the high bit
//! enum             1 byte index
//! date             8 bytes, f64 milliseconds
//! string           [len:u8|u16] bytes        or a zero-padded fixed slot
//! array            [count:u8|u16] elements   or a zero-padded fixed slot
//! object           [null:u8]? fields         or a zero-padded fixed slot
//! ```
//!
//! Both directions work on prefixes: the encoder stops at the first field
//! that does not fit its budget, the decoder at the first field it cannot
//! read in full.

pub mod buffer;
pub mod decoder;
pub mod encoder;
pub mod text;

pub use buffer::{ByteReader, ByteWriter};
pub use decoder::{decode, decode_prefix};
pub use encoder::encode;
pub use text::TextEncoding;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Milliseconds since the Unix epoch for a date field value.
///
/// Accepts a JSON number, or a string in RFC 3339, RFC 2822,
/// `YYYY-MM-DDTHH:MM:SS[.fff]` (UTC) or `YYYY-MM-DD` (UTC midnight) form.
#[must_use]
pub fn date_millis(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_date(s.trim()).map(|dt| dt.timestamp_millis() as f64),
        _ => None,
    }
}

fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// RFC 3339 UTC string for a stored timestamp; `null` unless positive.
#[must_use]
pub fn millis_to_date(millis: f64) -> Value {
    if millis.is_nan() || millis <= 0.0 {
        return Value::Null;
    }
    DateTime::<Utc>::from_timestamp_millis(millis.round() as i64)
        .map_or(Value::Null, |dt| {
            Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        })
}
