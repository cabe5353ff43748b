use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a classified log line, selected by the `(type)` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    Combat,
    Info,
    Notify,
    Warning,
    Question,
    Hint,
    None,
    Unknown,
}

impl EntryKind {
    /// Looks up the kind for a `(type)` token. Tokens are case sensitive:
    /// the client writes `None` capitalised and every other type in lower case.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "combat" => Some(EntryKind::Combat),
            "info" => Some(EntryKind::Info),
            "notify" => Some(EntryKind::Notify),
            "warning" => Some(EntryKind::Warning),
            "question" => Some(EntryKind::Question),
            "hint" => Some(EntryKind::Hint),
            "None" => Some(EntryKind::None),
            _ => None,
        }
    }
}

/// Fields extracted from the payload of a combat line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatDetails {
    pub attacker: String,
    pub target: String,
    /// Empty when a ship fires directly with no intermediary weapon.
    pub weapon: String,
    /// `0.0` for miss-style messages.
    pub damage: f64,
}

/// One classified line of a game log.
///
/// `combat` is populated exactly when `kind` is [`EntryKind::Combat`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub kind: EntryKind,
    pub raw_text: String,
    pub combat: Option<CombatDetails>,
}

impl LogEntry {
    pub fn new(timestamp: DateTime<Utc>, kind: EntryKind, raw_text: String) -> Self {
        Self {
            timestamp,
            kind,
            raw_text,
            combat: None,
        }
    }

    pub fn combat(timestamp: DateTime<Utc>, raw_text: String, details: CombatDetails) -> Self {
        Self {
            timestamp,
            kind: EntryKind::Combat,
            raw_text,
            combat: Some(details),
        }
    }
}

/// Listener identity and session start recovered from the log header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogHeader {
    pub listener: String,
    pub session_start: DateTime<Utc>,
}

/// A fully materialised game log. Entries keep file order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    pub listener: String,
    pub session_start: DateTime<Utc>,
    pub entries: Vec<LogEntry>,
}

impl Log {
    pub fn new(header: LogHeader, entries: Vec<LogEntry>) -> Self {
        Self {
            listener: header.listener,
            session_start: header.session_start,
            entries,
        }
    }

    /// Entries of kind combat, paired with their extracted details.
    pub fn combat_entries(&self) -> impl Iterator<Item = (&LogEntry, &CombatDetails)> {
        self.entries
            .iter()
            .filter(|e| e.kind == EntryKind::Combat)
            .filter_map(|e| e.combat.as_ref().map(|c| (e, c)))
    }
}

/// Which of the two dashed header lines was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeparatorPosition {
    Start,
    End,
}

impl fmt::Display for SeparatorPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeparatorPosition::Start => write!(f, "start of file"),
            SeparatorPosition::End => write!(f, "end of header"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Header truncated: expected {expected}")]
    TruncatedHeader { expected: &'static str },
    #[error("Missing --- line at {0}")]
    MissingSeparator(SeparatorPosition),
    #[error("Missing \"Gamelog\" line in header, found {0:?}")]
    MissingGamelogMarker(String),
    #[error("Missing \"Session started\" line in header, found {0:?}")]
    MissingSessionLine(String),
    #[error("Unknown log entry type \"{0}\"")]
    UnknownEntryType(String),
    #[error("Could not parse combat line \"{0}\"")]
    UnparseableCombatLine(String),
    #[error("Invalid timestamp: {0:?}")]
    Format(String),
}
