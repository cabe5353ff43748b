use crate::combat_parser::{CombatGrammar, GrammarStats};
use crate::timestamp::{parse_timestamp, TIMESTAMP_PATTERN};
use crate::{EntryKind, LogEntry, ParseError};
use regex::Regex;
use std::io::{BufRead, Lines};
use std::iter::FusedIterator;
use std::sync::OnceLock;
use tracing::{debug, error};

fn line_regex() -> &'static Regex {
    static LINE_RE: OnceLock<Regex> = OnceLock::new();
    LINE_RE.get_or_init(|| {
        Regex::new(&format!(
            r"^\[ (?P<ts>{}) \] \((?P<type>[^)]+)\) (?P<data>.+)$",
            TIMESTAMP_PATTERN
        ))
        .expect("log line pattern is valid")
    })
}

/// Classify one raw line.
///
/// Returns `Ok(None)` for a continuation line, i.e. one without the
/// `[ timestamp ] (type)` prefix. Its text is dropped, not joined to the
/// previous entry. Combat payloads are run through the combat grammar
/// immediately; a payload it does not accept is an error.
pub fn classify_line(
    line: &str,
    grammar: &CombatGrammar,
    stats: &mut GrammarStats,
) -> Result<Option<LogEntry>, ParseError> {
    let line = line.trim_end();
    let Some(caps) = line_regex().captures(line) else {
        return Ok(None);
    };

    let timestamp = parse_timestamp(&caps["ts"])?;
    let token = &caps["type"];
    let data = caps["data"].to_string();

    let kind = EntryKind::from_token(token)
        .ok_or_else(|| ParseError::UnknownEntryType(token.to_string()))?;

    if kind == EntryKind::Combat {
        let details = grammar.parse_with_stats(&data, stats)?;
        Ok(Some(LogEntry::combat(timestamp, data, details)))
    } else {
        Ok(Some(LogEntry::new(timestamp, kind, data)))
    }
}

/// Lines of a reader, counted as they are taken.
pub struct LineSource<R> {
    lines: Lines<R>,
    line_number: usize,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_number: 0,
        }
    }

    /// 1-based number of the line most recently taken, 0 before the first.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead> Iterator for LineSource<R> {
    type Item = std::io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        self.line_number += 1;
        Some(line)
    }
}

/// The entries following a log header, classified on demand.
///
/// Reading advances the underlying reader, so the sequence can be walked
/// once only. After yielding an error it yields nothing further; collect
/// into a [`crate::Log`] when several passes are needed.
pub struct Entries<R> {
    lines: LineSource<R>,
    grammar: &'static CombatGrammar,
    stats: GrammarStats,
    continuation_lines: usize,
    finished: bool,
}

impl<R: BufRead> Entries<R> {
    pub fn new(lines: LineSource<R>) -> Self {
        Self {
            lines,
            grammar: CombatGrammar::global(),
            stats: GrammarStats::new(),
            continuation_lines: 0,
            finished: false,
        }
    }

    /// Combat pattern counts for the entries produced so far.
    pub fn stats(&self) -> &GrammarStats {
        &self.stats
    }

    pub fn into_stats(self) -> GrammarStats {
        self.stats
    }

    /// Lines dropped so far for lacking the timestamp and type prefix.
    pub fn continuation_lines(&self) -> usize {
        self.continuation_lines
    }
}

impl<R: BufRead> Iterator for Entries<R> {
    type Item = Result<LogEntry, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    error!("Read error after line {}: {}", self.lines.line_number(), e);
                    self.finished = true;
                    return Some(Err(e.into()));
                }
                None => {
                    self.finished = true;
                    return None;
                }
            };

            match classify_line(&line, self.grammar, &mut self.stats) {
                Ok(Some(entry)) => return Some(Ok(entry)),
                Ok(None) => {
                    debug!("Dropping continuation line {}", self.lines.line_number());
                    self.continuation_lines += 1;
                }
                Err(e) => {
                    error!("Line {}: {}", self.lines.line_number(), e);
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<R: BufRead> FusedIterator for Entries<R> {}
