//! Combat message grammar.
//!
//! A combat payload is one hit-quality sentence ("hits", "barely misses", ...)
//! wrapped around one attacker description ("Your <weapon>", "<weapon>
//! belonging to <attacker>", or a bare attacker). Every combination is
//! compiled into one anchored pattern. Patterns are tried in rank order and
//! the first match wins.

use crate::{CombatDetails, ParseError};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

/// Hit-quality sentences in priority order. A template that contains another
/// (`barely misses` contains `misses`) must come first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitQuality {
    BarelyMisses,
    MissesCompletely,
    Hits,
    AimsWell,
    BarelyScratches,
    ExcellentHit,
    LandsGlancingHit,
    WellAimed,
    GlancesOff,
    StrikesPerfectly,
    PerfectlyStrikes,
}

impl HitQuality {
    pub const CATALOGUE: [HitQuality; 11] = [
        HitQuality::BarelyMisses,
        HitQuality::MissesCompletely,
        HitQuality::Hits,
        HitQuality::AimsWell,
        HitQuality::BarelyScratches,
        HitQuality::ExcellentHit,
        HitQuality::LandsGlancingHit,
        HitQuality::WellAimed,
        HitQuality::GlancesOff,
        HitQuality::StrikesPerfectly,
        HitQuality::PerfectlyStrikes,
    ];

    /// Position in [`HitQuality::CATALOGUE`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_miss(self) -> bool {
        matches!(self, HitQuality::BarelyMisses | HitQuality::MissesCompletely)
    }

    /// Sentence template with `{attacker}`, `{target}` and `{damage}` holes.
    fn template(self) -> &'static str {
        match self {
            HitQuality::BarelyMisses => r"{attacker} barely misses {target}\.",
            HitQuality::MissesCompletely => r"{attacker} misses {target} completely\.",
            HitQuality::Hits => r"{attacker} (?:lightly |heavily )?hits {target}, {damage}\.",
            HitQuality::AimsWell => r"{attacker} aims well at {target}, {damage}\.",
            HitQuality::BarelyScratches => r"{attacker} barely scratches {target}, {damage}\.",
            HitQuality::ExcellentHit => {
                r"{attacker} places an excellent hit on {target}, {damage}\."
            }
            HitQuality::LandsGlancingHit => {
                r"{attacker} lands a hit on {target} which glances off, {damage}\."
            }
            HitQuality::WellAimed => r"{attacker} is well aimed at {target}, {damage}\.",
            HitQuality::GlancesOff => r"{attacker} glances off {target}, {damage}\.",
            HitQuality::StrikesPerfectly => r"{attacker} strikes {target} perfectly, {damage}\.",
            HitQuality::PerfectlyStrikes => r"{attacker} perfectly strikes {target}, {damage}\.",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HitQuality::BarelyMisses => "barely misses",
            HitQuality::MissesCompletely => "misses completely",
            HitQuality::Hits => "hits",
            HitQuality::AimsWell => "aims well at",
            HitQuality::BarelyScratches => "barely scratches",
            HitQuality::ExcellentHit => "places an excellent hit on",
            HitQuality::LandsGlancingHit => "lands a hit which glances off",
            HitQuality::WellAimed => "is well aimed at",
            HitQuality::GlancesOff => "glances off",
            HitQuality::StrikesPerfectly => "strikes perfectly",
            HitQuality::PerfectlyStrikes => "perfectly strikes",
        }
    }
}

/// How the attacking side is described.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttackerShape {
    /// `Your [group of] <weapon>`
    OwnWeapon,
    /// `<weapon> belonging to <attacker>`, drones and fighters.
    Belonging,
    /// `<attacker>` firing directly, no weapon named.
    Direct,
}

impl AttackerShape {
    pub const CATALOGUE: [AttackerShape; 3] = [
        AttackerShape::OwnWeapon,
        AttackerShape::Belonging,
        AttackerShape::Direct,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Lazy so that `lightly`/`heavily` stay with the verb.
    fn pattern(self) -> &'static str {
        match self {
            AttackerShape::OwnWeapon => r"(?P<attacker>Your) (?:group of )?(?P<weapon>.*?)",
            AttackerShape::Belonging => r"(?P<weapon>.*) belonging to (?P<attacker>.*?)",
            AttackerShape::Direct => r"(?P<attacker>.*?)",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AttackerShape::OwnWeapon => "Your <weapon>",
            AttackerShape::Belonging => "<weapon> belonging to <attacker>",
            AttackerShape::Direct => "<attacker>",
        }
    }
}

/// Number of compiled patterns: every hit quality with every attacker shape.
pub const PATTERN_COUNT: usize = HitQuality::CATALOGUE.len() * AttackerShape::CATALOGUE.len();

const COLOR_PREFIX: &str = r"(?:<color[^>]*>)?";
const TARGET: &str = r"(?P<target>.*)";
const DAMAGE: &str = r"[^,]*?(?:(?P<damage>\d+(?:\.\d+)?) )?damage";

/// Priority rank of a (quality, shape) pair. Lower ranks are tried first.
pub fn rank_of(quality: HitQuality, shape: AttackerShape) -> usize {
    quality.index() * AttackerShape::CATALOGUE.len() + shape.index()
}

/// One compiled entry of the grammar table.
#[derive(Debug)]
pub struct CombatPattern {
    pub rank: usize,
    pub quality: HitQuality,
    pub shape: AttackerShape,
    regex: Regex,
}

impl CombatPattern {
    fn compile(quality: HitQuality, shape: AttackerShape) -> Result<Self, regex::Error> {
        let attacker = format!("{}{}", COLOR_PREFIX, shape.pattern());
        let sentence = quality
            .template()
            .replace("{attacker}", &attacker)
            .replace("{target}", TARGET)
            .replace("{damage}", DAMAGE);
        let regex = Regex::new(&format!("^{}$", sentence))?;

        Ok(Self {
            rank: rank_of(quality, shape),
            quality,
            shape,
            regex,
        })
    }

    /// Try this pattern alone against a payload.
    pub fn extract(&self, data: &str) -> Option<CombatDetails> {
        let caps = self.regex.captures(data)?;
        let field = |name: &str| caps.name(name).map_or("", |m| m.as_str()).to_string();

        // The number grammar is \d+(\.\d+)?, which always parses.
        let damage = caps
            .name("damage")
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .unwrap_or(0.0);

        Some(CombatDetails {
            attacker: field("attacker"),
            target: field("target"),
            weapon: field("weapon"),
            damage,
        })
    }
}

/// Which pattern accepted a payload, with the extracted fields.
#[derive(Debug, Clone, PartialEq)]
pub struct CombatMatch {
    pub rank: usize,
    pub quality: HitQuality,
    pub shape: AttackerShape,
    pub details: CombatDetails,
}

/// The ordered table of all hit-quality and attacker-shape combinations.
#[derive(Debug)]
pub struct CombatGrammar {
    patterns: Vec<CombatPattern>,
}

impl CombatGrammar {
    pub fn new() -> Self {
        let patterns = HitQuality::CATALOGUE
            .iter()
            .flat_map(|&q| AttackerShape::CATALOGUE.iter().map(move |&s| (q, s)))
            .map(|(q, s)| CombatPattern::compile(q, s).expect("combat templates are valid regexes"))
            .collect::<Vec<_>>();

        debug!("Compiled {} combat patterns", patterns.len());
        Self { patterns }
    }

    /// Process-wide compiled grammar. Holds no mutable state.
    pub fn global() -> &'static CombatGrammar {
        static GRAMMAR: OnceLock<CombatGrammar> = OnceLock::new();
        GRAMMAR.get_or_init(CombatGrammar::new)
    }

    /// Patterns in rank order.
    pub fn patterns(&self) -> &[CombatPattern] {
        &self.patterns
    }

    /// First pattern, in rank order, that accepts the payload.
    pub fn match_payload(&self, data: &str) -> Option<CombatMatch> {
        self.patterns.iter().find_map(|p| {
            p.extract(data).map(|details| CombatMatch {
                rank: p.rank,
                quality: p.quality,
                shape: p.shape,
                details,
            })
        })
    }

    pub fn parse(&self, data: &str) -> Result<CombatDetails, ParseError> {
        self.match_payload(data)
            .map(|m| m.details)
            .ok_or_else(|| ParseError::UnparseableCombatLine(data.to_string()))
    }

    /// Like [`CombatGrammar::parse`], counting the winning pattern in `stats`.
    pub fn parse_with_stats(
        &self,
        data: &str,
        stats: &mut GrammarStats,
    ) -> Result<CombatDetails, ParseError> {
        match self.match_payload(data) {
            Some(m) => {
                stats.record(m.rank);
                Ok(m.details)
            }
            None => Err(ParseError::UnparseableCombatLine(data.to_string())),
        }
    }
}

impl Default for CombatGrammar {
    fn default() -> Self {
        Self::new()
    }
}

/// How many combat payloads each pattern accepted. Owned by whoever parses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarStats {
    counts: [u64; PATTERN_COUNT],
}

impl GrammarStats {
    pub fn new() -> Self {
        Self {
            counts: [0; PATTERN_COUNT],
        }
    }

    pub fn record(&mut self, rank: usize) {
        if let Some(slot) = self.counts.get_mut(rank) {
            *slot += 1;
        }
    }

    pub fn count(&self, quality: HitQuality, shape: AttackerShape) -> u64 {
        self.counts[rank_of(quality, shape)]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Every pattern with its count, in rank order.
    pub fn iter(&self) -> impl Iterator<Item = (HitQuality, AttackerShape, u64)> + '_ {
        HitQuality::CATALOGUE
            .iter()
            .flat_map(|&q| AttackerShape::CATALOGUE.iter().map(move |&s| (q, s)))
            .map(|(q, s)| (q, s, self.count(q, s)))
    }
}

impl Default for GrammarStats {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GrammarStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Count\tHit quality\tAttacker")?;
        for (quality, shape, count) in self.iter() {
            writeln!(f, "{}\t{}\t{}", count, quality.label(), shape.label())?;
        }
        Ok(())
    }
}
