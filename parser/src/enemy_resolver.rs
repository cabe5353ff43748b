//! Splits an opponent label such as
//! `Char'acter Name [CORP]<ALLY>'Ship Name'(Ship Type)` into its parts.

use regex::Regex;
use std::sync::OnceLock;

/// Name, ship type and corp/alliance ticker of a non-player participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnemyIdentity {
    pub name: String,
    pub ship: Option<String>,
    /// `CORP`, `CORP (ALLY)`, or empty for a pilot in no player corp.
    pub ticker: Option<String>,
}

impl EnemyIdentity {
    fn unresolved(label: &str) -> Self {
        Self {
            name: label.to_string(),
            ship: None,
            ticker: None,
        }
    }
}

fn enemy_regex() -> &'static Regex {
    static ENEMY_RE: OnceLock<Regex> = OnceLock::new();
    ENEMY_RE.get_or_init(|| {
        const EDGE: &str = "[A-Za-z0-9]";
        const MIDDLE: &str = "['A-Za-z0-9]";
        const TICKER: &str = "[-'. A-Za-z0-9]";
        let pattern = format!(
            concat!(
                r"^\s*(?P<name>{edge}{middle}*(?: {middle}*)??{edge})",
                r"\s*(?:\[(?P<corp>{ticker}+)\])?",
                r"\s*(?:(?:<|&lt;)(?P<alliance>{ticker}+)(?:>|&gt;))?",
                r"\s*(?:'.*')?",
                r"\s*(?:\((?P<ship>[A-Za-z ]+)\))?\s*$",
            ),
            edge = EDGE,
            middle = MIDDLE,
            ticker = TICKER,
        );
        Regex::new(&pattern).expect("enemy pattern is valid")
    })
}

/// Resolve an opponent label. Never fails: a label that does not fit the
/// expected shape comes back verbatim as the name with no ship or ticker.
pub fn resolve_enemy(label: &str) -> EnemyIdentity {
    let Some(caps) = enemy_regex().captures(label) else {
        return EnemyIdentity::unresolved(label);
    };

    let mut name = caps["name"].to_string();
    let ship = caps.name("ship").map(|m| m.as_str().to_string());
    let alliance = caps.name("alliance").map(|m| m.as_str());

    let corp = match caps.name("corp") {
        Some(corp) => corp.as_str().to_string(),
        None => {
            // A pilot "Name" flying a ship called "Name's ..." can be read as
            // name "Name 'Name" with the ship name starting at the "s".
            if ship.is_some() {
                if let Some(collapsed) = collapse_duplicated_name(&name) {
                    name = collapsed.to_string();
                }
            }
            String::new()
        }
    };

    let ticker = match alliance {
        Some(alliance) => format!("{} ({})", corp, alliance),
        None => corp,
    };

    EnemyIdentity {
        name,
        ship,
        ticker: Some(ticker),
    }
}

/// `"X 'X..."` becomes `"X"`, where `X` is the first space-delimited token.
fn collapse_duplicated_name(name: &str) -> Option<&str> {
    let (head, rest) = name.split_once(' ')?;
    if head.is_empty() {
        return None;
    }
    rest.strip_prefix('\'')
        .filter(|r| r.starts_with(head))
        .map(|_| head)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: &str, ship: Option<&str>, ticker: Option<&str>) -> EnemyIdentity {
        EnemyIdentity {
            name: name.to_string(),
            ship: ship.map(str::to_string),
            ticker: ticker.map(str::to_string),
        }
    }

    #[test]
    fn test_full_label() {
        assert_eq!(
            resolve_enemy("Char'acter Name [CORP]<.ALL.>'My Ship'(Drake Navy Issue)"),
            identity("Char'acter Name", Some("Drake Navy Issue"), Some("CORP (.ALL.)"))
        );
    }

    #[test]
    fn test_escaped_alliance_brackets() {
        assert_eq!(
            resolve_enemy("Rival [XYZ]&lt;ALLY&gt;(Rifter)"),
            identity("Rival", Some("Rifter"), Some("XYZ (ALLY)"))
        );
    }

    #[test]
    fn test_corp_and_ship_only() {
        assert_eq!(
            resolve_enemy("Rival [XYZ](Rifter)"),
            identity("Rival", Some("Rifter"), Some("XYZ"))
        );
    }

    #[test]
    fn test_no_corp_gives_empty_ticker() {
        assert_eq!(
            resolve_enemy("Some Pilot(Heron)"),
            identity("Some Pilot", Some("Heron"), Some(""))
        );
    }

    #[test]
    fn test_alliance_without_corp() {
        assert_eq!(
            resolve_enemy("Rival <ALLY>(Rifter)"),
            identity("Rival", Some("Rifter"), Some(" (ALLY)"))
        );
    }

    #[test]
    fn test_unstructured_label_falls_back() {
        let label = "Some Weird @#$ Label";
        assert_eq!(resolve_enemy(label), identity(label, None, None));
    }

    #[test]
    fn test_possessive_ship_name() {
        let resolved = resolve_enemy("Mara 'Mara's Purifier'(Heron)");
        assert_eq!(resolved.name, "Mara");
        assert_eq!(resolved.ship.as_deref(), Some("Heron"));
        assert_eq!(resolved.ticker.as_deref(), Some(""));
    }

    #[test]
    fn test_collapse_duplicated_name() {
        assert_eq!(collapse_duplicated_name("Mara 'Mara"), Some("Mara"));
        assert_eq!(collapse_duplicated_name("Mara 'Marathon"), Some("Mara"));
        assert_eq!(collapse_duplicated_name("Mara Jade"), None);
        assert_eq!(collapse_duplicated_name("Mara 'Other"), None);
        assert_eq!(collapse_duplicated_name("Mara"), None);
    }
}
