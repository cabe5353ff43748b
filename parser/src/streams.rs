//! Per-opponent, per-weapon damage timelines built from a parsed log.

use crate::enemy_resolver::resolve_enemy;
use crate::Log;
use chrono::{DateTime, Utc};
use serde::ser::SerializeTuple;
use serde::{Serialize, Serializer};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Placeholder for a missing weapon, ticker or ship list.
pub const UNKNOWN: &str = "Unknown";

/// Name used for the listener's side of a stream.
pub const PLAYER: &str = "You";

/// Damage landed in one log tick (one second).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamagePoint {
    pub timestamp: DateTime<Utc>,
    pub amount: f64,
}

/// Serialized as `[timestamp_millis, amount]`.
impl Serialize for DamagePoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&self.timestamp.timestamp_millis())?;
        pair.serialize_element(&self.amount)?;
        pair.end()
    }
}

/// Damage dealt between the listener and one opponent with one weapon.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DamageStream {
    attacker: String,
    target: String,
    weapon: String,
    ticker: String,
    #[serde(rename = "damage")]
    points: Vec<DamagePoint>,
    enemy_ships: String,
    #[serde(serialize_with = "chrono::serde::ts_milliseconds_option::serialize")]
    start_time: Option<DateTime<Utc>>,
    #[serde(serialize_with = "chrono::serde::ts_milliseconds_option::serialize")]
    end_time: Option<DateTime<Utc>>,
    total_damage: f64,
}

impl DamageStream {
    /// Build a stream from points in non-decreasing timestamp order.
    ///
    /// An empty `weapon` and a missing `ticker` become [`UNKNOWN`], as does
    /// an empty ship list; otherwise ships are joined with `", "`.
    pub fn new(
        attacker: impl Into<String>,
        target: impl Into<String>,
        points: Vec<DamagePoint>,
        ticker: Option<String>,
        weapon: &str,
        enemy_ships: &[String],
    ) -> Self {
        let weapon = if weapon.is_empty() { UNKNOWN } else { weapon };
        let enemy_ships = if enemy_ships.is_empty() {
            UNKNOWN.to_string()
        } else {
            enemy_ships.join(", ")
        };

        Self {
            attacker: attacker.into(),
            target: target.into(),
            weapon: weapon.to_string(),
            ticker: ticker.unwrap_or_else(|| UNKNOWN.to_string()),
            total_damage: points.iter().map(|p| p.amount).sum(),
            start_time: points.first().map(|p| p.timestamp),
            end_time: points.last().map(|p| p.timestamp),
            points,
            enemy_ships,
        }
    }

    pub fn attacker(&self) -> &str {
        &self.attacker
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn weapon(&self) -> &str {
        &self.weapon
    }

    /// Corp/alliance ticker of the opponent, if known.
    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn enemy_ships(&self) -> &str {
        &self.enemy_ships
    }

    pub fn points(&self) -> &[DamagePoint] {
        &self.points
    }

    pub fn total_damage(&self) -> f64 {
        self.total_damage
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }
}

/// True for the listener's own side of a combat line.
pub fn is_player(name: &str) -> bool {
    let name = name.trim();
    name.eq_ignore_ascii_case("you") || name.eq_ignore_ascii_case("your")
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StreamKey {
    weapon: String,
    enemy: String,
}

/// Streams of one direction, in order of first appearance.
#[derive(Default)]
struct Grouping {
    index: HashMap<StreamKey, usize>,
    streams: Vec<(StreamKey, Vec<DamagePoint>)>,
}

impl Grouping {
    fn add(&mut self, key: StreamKey, timestamp: DateTime<Utc>, amount: f64) {
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                self.index.insert(key.clone(), self.streams.len());
                self.streams.push((key, Vec::new()));
                self.streams.len() - 1
            }
        };

        let points = &mut self.streams[slot].1;
        match points.last_mut() {
            Some(last) if last.timestamp == timestamp => last.amount += amount,
            _ => points.push(DamagePoint { timestamp, amount }),
        }
    }
}

#[derive(Default)]
struct EnemyInfo {
    ticker: Option<String>,
    ships: BTreeSet<String>,
}

/// Group the combat entries of `log` into damage streams.
///
/// Streams dealt by the listener come first, then streams dealt to the
/// listener, each in order of first appearance. Hits in the same tick of the
/// same stream are summed into one point.
pub fn extract_streams(log: &Log) -> Vec<DamageStream> {
    let mut dealt = Grouping::default();
    let mut received = Grouping::default();
    let mut enemies: HashMap<String, EnemyInfo> = HashMap::new();

    for (entry, combat) in log.combat_entries() {
        let (grouping, enemy_label) = if is_player(&combat.attacker) {
            (&mut dealt, &combat.target)
        } else {
            (&mut received, &combat.attacker)
        };

        let identity = resolve_enemy(enemy_label);
        grouping.add(
            StreamKey {
                weapon: combat.weapon.clone(),
                enemy: identity.name.clone(),
            },
            entry.timestamp,
            combat.damage,
        );

        if let Some(ship) = identity.ship {
            let info = enemies.entry(identity.name).or_default();
            info.ticker = identity.ticker;
            info.ships.insert(ship);
        }
    }

    let mut streams = Vec::with_capacity(dealt.streams.len() + received.streams.len());
    for (grouping, enemy_attacks) in [(dealt, false), (received, true)] {
        for (key, points) in grouping.streams {
            let (ticker, ships): (Option<String>, Vec<String>) = match enemies.get(&key.enemy) {
                Some(info) => (info.ticker.clone(), info.ships.iter().cloned().collect()),
                None => (None, Vec::new()),
            };
            let (attacker, target) = if enemy_attacks {
                (key.enemy.clone(), PLAYER.to_string())
            } else {
                (PLAYER.to_string(), key.enemy.clone())
            };

            debug!(
                "Stream {} -> {} with {:?}: {} points",
                attacker,
                target,
                key.weapon,
                points.len()
            );
            streams.push(DamageStream::new(
                attacker,
                target,
                points,
                ticker,
                &key.weapon,
                &ships,
            ));
        }
    }

    info!(
        "Extracted {} damage streams for listener {}",
        streams.len(),
        log.listener
    );
    streams
}
