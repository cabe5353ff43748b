// Parser crate for game client combat logs
// Header and line classification, combat grammar, damage stream extraction

pub mod types;
pub mod timestamp;
pub mod header_parser;
pub mod line_parser;
pub mod combat_parser;
pub mod enemy_resolver;
pub mod streams;

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

// Re-export main types
pub use types::*;
pub use combat_parser::{AttackerShape, CombatGrammar, GrammarStats, HitQuality};
pub use enemy_resolver::{resolve_enemy, EnemyIdentity};
pub use header_parser::read_header;
pub use line_parser::{classify_line, Entries, LineSource};
pub use streams::{extract_streams, DamagePoint, DamageStream};

/// Read the header and return it with the not yet classified entries.
pub fn open_log<R: BufRead>(reader: R) -> Result<(LogHeader, Entries<R>), ParseError> {
    let mut lines = LineSource::new(reader);
    let header = read_header(&mut lines)?;
    info!(
        "Opened game log: listener={}, session_start={}",
        header.listener, header.session_start
    );
    Ok((header, Entries::new(lines)))
}

/// Parse a whole game log. The first malformed line aborts the parse.
pub fn parse_log<R: BufRead>(reader: R) -> Result<Log, ParseError> {
    parse_log_with_stats(reader).map(|(log, _)| log)
}

/// Like [`parse_log`], also returning how often each combat pattern matched.
pub fn parse_log_with_stats<R: BufRead>(reader: R) -> Result<(Log, GrammarStats), ParseError> {
    let (header, mut entries) = open_log(reader)?;
    let collected = entries.by_ref().collect::<Result<Vec<_>, _>>()?;

    info!(
        "Parsed {} entries ({} continuation lines dropped, {} combat)",
        collected.len(),
        entries.continuation_lines(),
        entries.stats().total()
    );
    Ok((Log::new(header, collected), entries.into_stats()))
}

pub fn parse_log_file(path: impl AsRef<Path>) -> Result<Log, ParseError> {
    let file = File::open(path.as_ref())?;
    info!("Parsing game log file {}", path.as_ref().display());
    parse_log(BufReader::new(file))
}

impl FromStr for Log {
    type Err = ParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        parse_log(Cursor::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const SAMPLE: &str = "------------------------------------------------------------
  Gamelog
  Listener: Foo
  Session started: 2010.01.01 00:00:00
------------------------------------------------------------
[ 2010.01.01 00:00:01 ] (combat) Your Heavy Missile hits Rival [XYZ](Rifter), wrecking for 12.5 damage.
[ 2010.01.01 00:00:01 ] (combat) Your Heavy Missile hits Rival [XYZ](Rifter), wrecking for 3.0 damage.
";

    #[test]
    fn test_end_to_end_single_stream() {
        let log = parse_log(Cursor::new(SAMPLE)).unwrap();
        assert_eq!(log.listener, "Foo");
        assert_eq!(log.session_start, Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(log.entries.len(), 2);

        let streams = extract_streams(&log);
        assert_eq!(streams.len(), 1);
        let s = &streams[0];
        assert_eq!(s.total_damage(), 15.5);
        assert_eq!(
            s.points(),
            &[DamagePoint {
                timestamp: Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 1).unwrap(),
                amount: 15.5,
            }]
        );
        assert_eq!(s.ticker(), "XYZ");
        assert_eq!(s.enemy_ships(), "Rifter");
        assert_eq!(s.attacker(), "You");
        assert_eq!(s.target(), "Rival");
        assert_eq!(s.weapon(), "Heavy Missile");

        assert_eq!(extract_streams(&log), streams);
    }

    #[test]
    fn test_parse_mixed_log() {
        let text = "---\n\
                    Gamelog\n\
                    Session started: 2010.01.01 00:00:00\n\
                    ---\n\
                    [ 2010.01.01 00:00:01 ] (notify) Attempting to join a channel\n\
                    that wraps onto a second line\n\
                    [ 2010.01.01 00:00:02 ] (combat) Rival [XYZ](Rifter) hits you, doing 7.0 damage.\n\
                    [ 2010.01.01 00:00:03 ] (combat) Your Warrior II barely misses Rival [XYZ](Rifter).\n\
                    [ 2010.01.01 00:00:04 ] (combat) Hobgoblin I belonging to Rival [XYZ](Rifter) hits you, doing 2.0 damage.\n";

        let (log, stats) = parse_log_with_stats(Cursor::new(text)).unwrap();
        assert_eq!(log.listener, "Unknown");
        assert_eq!(log.entries.len(), 4);
        assert_eq!(log.entries[0].kind, EntryKind::Notify);
        assert_eq!(log.entries[0].raw_text, "Attempting to join a channel");
        assert_eq!(log.combat_entries().count(), 3);
        assert_eq!(stats.total(), 3);
        assert_eq!(stats.count(HitQuality::Hits, AttackerShape::Belonging), 1);

        let streams = extract_streams(&log);
        let summary: Vec<(&str, &str, &str, f64)> = streams
            .iter()
            .map(|s| (s.attacker(), s.target(), s.weapon(), s.total_damage()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("You", "Rival", "Warrior II", 0.0),
                ("Rival", "You", "Unknown", 7.0),
                ("Rival", "You", "Hobgoblin I", 2.0),
            ]
        );
    }

    #[test]
    fn test_header_only_log() {
        let log: Log = "---\nGamelog\nListener: Foo\nSession started: 2010.01.01 00:00:00\n---\n"
            .parse()
            .unwrap();
        assert!(log.entries.is_empty());
        assert!(extract_streams(&log).is_empty());
    }

    #[test]
    fn test_errors_abort_the_parse() {
        let bad_type = format!("{}[ 2010.01.01 00:00:02 ] (chat) hi\n", SAMPLE);
        assert!(matches!(
            parse_log(Cursor::new(bad_type)),
            Err(ParseError::UnknownEntryType(ref t)) if t == "chat"
        ));

        let bad_combat = format!("{}[ 2010.01.01 00:00:02 ] (combat) Rival waves.\n", SAMPLE);
        assert!(matches!(
            parse_log(Cursor::new(bad_combat)),
            Err(ParseError::UnparseableCombatLine(_))
        ));

        assert!(matches!(
            "Gamelog\n".parse::<Log>(),
            Err(ParseError::MissingSeparator(SeparatorPosition::Start))
        ));
    }

    #[test]
    fn test_open_log_is_lazy() {
        let text = format!("{}[ 2010.01.01 00:00:02 ] (chat) hi\n", SAMPLE);
        let (header, mut entries) = open_log(Cursor::new(text)).unwrap();
        assert_eq!(header.listener, "Foo");
        assert!(entries.next().unwrap().is_ok());
        assert!(entries.next().unwrap().is_ok());
        assert!(entries.next().unwrap().is_err());
        assert!(entries.next().is_none());
    }

    #[test]
    fn test_parse_log_file_missing() {
        assert!(matches!(
            parse_log_file("/nonexistent/gamelog.txt"),
            Err(ParseError::Io(_))
        ));
    }
}
