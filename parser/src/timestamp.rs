//! Fixed `YYYY.MM.DD HH:MM:SS` timestamps shared by the session header and
//! every log line. The client writes no zone marker; values are UTC.

use crate::ParseError;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Regex fragment matching the timestamp shape, without anchors or groups.
pub const TIMESTAMP_PATTERN: &str = r"\d{4}\.\d{2}\.\d{2} \d{2}:\d{2}:\d{2}";

const TIMESTAMP_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

/// Parse a timestamp such as `2010.01.01 00:00:01` as UTC.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, ParseError> {
    if !has_timestamp_shape(text) {
        return Err(ParseError::Format(text.to_string()));
    }

    let naive = NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .map_err(|_| ParseError::Format(text.to_string()))?;

    Ok(Utc.from_utc_datetime(&naive))
}

/// chrono accepts unpadded and signed fields; the log format does not.
fn has_timestamp_shape(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 19
        && bytes.iter().enumerate().all(|(i, &b)| match i {
            4 | 7 => b == b'.',
            10 => b == b' ',
            13 | 16 => b == b':',
            _ => b.is_ascii_digit(),
        })
}
