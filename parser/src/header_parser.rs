use crate::timestamp::{parse_timestamp, TIMESTAMP_PATTERN};
use crate::{LogHeader, ParseError, SeparatorPosition};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// Listener used when the header carries no `Listener:` line (empty logs).
pub const UNKNOWN_LISTENER: &str = "Unknown";

fn listener_regex() -> &'static Regex {
    static LISTENER_RE: OnceLock<Regex> = OnceLock::new();
    LISTENER_RE.get_or_init(|| Regex::new(r"Listener: (.*)").expect("listener pattern is valid"))
}

fn session_regex() -> &'static Regex {
    static SESSION_RE: OnceLock<Regex> = OnceLock::new();
    SESSION_RE.get_or_init(|| {
        Regex::new(&format!(r"Session started: (?P<ts>{})", TIMESTAMP_PATTERN))
            .expect("session pattern is valid")
    })
}

/// Consume the fixed header at the top of a game log:
///
/// ```text
/// ------------------------------------------------------------
///   Gamelog
///   Listener: Some Pilot
///   Session started: 2010.01.01 00:00:00
/// ------------------------------------------------------------
/// ```
///
/// The listener line is optional. When it is absent the line in its place is
/// read as the session line and the listener is [`UNKNOWN_LISTENER`].
pub fn read_header<I>(lines: &mut I) -> Result<LogHeader, ParseError>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    let first = next_line(lines, "--- line at start of file")?;
    if !is_separator(&first) {
        return Err(ParseError::MissingSeparator(SeparatorPosition::Start));
    }

    let marker = next_line(lines, "\"Gamelog\" line")?;
    if !marker.contains("Gamelog") {
        return Err(ParseError::MissingGamelogMarker(marker));
    }

    let maybe_listener = next_line(lines, "\"Listener\" or \"Session started\" line")?;
    let (listener, session_line) = match listener_regex().captures(&maybe_listener) {
        Some(caps) => {
            let listener = caps[1].to_string();
            (listener, next_line(lines, "\"Session started\" line")?)
        }
        None => {
            debug!("Header has no listener line, using {:?}", UNKNOWN_LISTENER);
            (UNKNOWN_LISTENER.to_string(), maybe_listener)
        }
    };

    let session_start = match session_regex().captures(&session_line) {
        Some(caps) => parse_timestamp(&caps["ts"])?,
        None => return Err(ParseError::MissingSessionLine(session_line)),
    };

    let last = next_line(lines, "--- line at end of header")?;
    if !is_separator(&last) {
        return Err(ParseError::MissingSeparator(SeparatorPosition::End));
    }

    debug!("Read header: listener={}, session_start={}", listener, session_start);
    Ok(LogHeader {
        listener,
        session_start,
    })
}

fn next_line<I>(lines: &mut I, expected: &'static str) -> Result<String, ParseError>
where
    I: Iterator<Item = std::io::Result<String>>,
{
    match lines.next() {
        Some(line) => Ok(line?.trim_end().to_string()),
        None => Err(ParseError::TruncatedHeader { expected }),
    }
}

fn is_separator(line: &str) -> bool {
    !line.is_empty() && line.bytes().all(|b| b == b'-')
}
