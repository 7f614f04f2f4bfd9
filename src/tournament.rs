// Tournament setup: the static roster and time slots, round-robin fixture
// generation for the group stage, and construction of the initial snapshot.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::model::{
    BracketSlot, Champions, Entrant, EntrantStats, Group, Match, MatchPhase, Stage,
    TournamentInfo, TournamentState,
};

/// An entrant as listed in the setup data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrantSeed {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    pub group: Group,
}

/// A scheduled group match as listed in the setup data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureSeed {
    pub id: String,
    pub time: String,
    pub home: String,
    pub away: String,
    pub group: Group,
}

/// Static data a tournament is initialized from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentSetup {
    pub info: TournamentInfo,
    pub entrants: Vec<EntrantSeed>,
    /// Explicit group-stage schedule. A group with no listed fixtures gets a
    /// generated round robin instead.
    #[serde(default)]
    pub fixtures: Vec<FixtureSeed>,
    /// Time slot labels per group for generated fixtures, consumed in order.
    #[serde(default)]
    pub group_times: BTreeMap<Group, Vec<String>>,
    #[serde(default)]
    pub bracket_times: BTreeMap<BracketSlot, String>,
}

fn seed(key: &str, name: &str, icon: &str, group: Group) -> EntrantSeed {
    EntrantSeed {
        key: key.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
        group,
    }
}

fn fixture(id: &str, time: &str, home: &str, away: &str, group: Group) -> FixtureSeed {
    FixtureSeed {
        id: id.to_string(),
        time: time.to_string(),
        home: home.to_string(),
        away: away.to_string(),
        group,
    }
}

impl TournamentSetup {
    /// The built-in Season 1 roster and schedule.
    pub fn season_one() -> Self {
        let entrants = vec![
            seed("Amlan", "Amlan Dipra Das", "🎯", Group::A),
            seed("Pritul", "Shaiuf Sadique Pritul", "⚡", Group::A),
            seed("Jacob", "Jacob", "🚀", Group::A),
            seed("Asifur", "Asifur Rahman", "💥", Group::A),
            seed("Wasif", "Wasif Azmaeen", "🎮", Group::B),
            seed("Swapnil", "Swapnil Sharma Sarker", "🏹", Group::B),
            seed("Showrin", "Showrin Barua", "⭐", Group::B),
            seed("Qazi", "Qazi Taskin", "🔥", Group::B),
        ];

        let fixtures = vec![
            fixture("ga1", "2:00 PM", "Amlan", "Jacob", Group::A),
            fixture("ga2", "2:30 PM", "Pritul", "Asifur", Group::A),
            fixture("ga3", "3:00 PM", "Amlan", "Pritul", Group::A),
            fixture("ga4", "3:30 PM", "Jacob", "Asifur", Group::A),
            fixture("ga5", "4:00 PM", "Amlan", "Asifur", Group::A),
            fixture("ga6", "4:30 PM", "Jacob", "Pritul", Group::A),
            fixture("gb1", "2:15 PM", "Wasif", "Swapnil", Group::B),
            fixture("gb2", "2:45 PM", "Showrin", "Qazi", Group::B),
            fixture("gb3", "3:15 PM", "Wasif", "Showrin", Group::B),
            fixture("gb4", "3:45 PM", "Swapnil", "Qazi", Group::B),
            fixture("gb5", "4:15 PM", "Wasif", "Qazi", Group::B),
            fixture("gb6", "4:45 PM", "Swapnil", "Showrin", Group::B),
        ];

        let bracket_times = BracketSlot::ALL
            .iter()
            .zip(["5:00 PM", "5:15 PM", "5:30 PM", "5:45 PM", "6:00 PM", "6:15 PM"])
            .map(|(slot, time)| (*slot, time.to_string()))
            .collect();

        Self {
            info: TournamentInfo {
                name: "eFIFA BattleZone Season 1".to_string(),
                format: "Group Stage + Double Elimination".to_string(),
                venue: "Main Arena".to_string(),
            },
            entrants,
            fixtures,
            group_times: BTreeMap::new(),
            bracket_times,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Check that the roster can feed the bracket: unique keys and at least two
    /// entrants in each group.
    pub fn validate(&self) -> Result<(), EngineError> {
        let mut seen = HashSet::new();
        for e in &self.entrants {
            if e.key.trim().is_empty() {
                return Err(EngineError::invalid("entrant key must not be empty"));
            }
            if !seen.insert(e.key.as_str()) {
                return Err(EngineError::invalid(format!(
                    "duplicate entrant key {}",
                    e.key
                )));
            }
        }
        for group in Group::ALL {
            let count = self.entrants.iter().filter(|e| e.group == group).count();
            if count < 2 {
                return Err(EngineError::invalid(format!(
                    "group {group} needs at least 2 entrants, has {count}"
                )));
            }
        }

        let mut ids = HashSet::new();
        for f in &self.fixtures {
            if !ids.insert(f.id.as_str()) {
                return Err(EngineError::invalid(format!("duplicate fixture id {}", f.id)));
            }
            if f.home == f.away {
                return Err(EngineError::invalid(format!("fixture {} pairs {} with itself", f.id, f.home)));
            }
            for key in [&f.home, &f.away] {
                let in_group = self
                    .entrants
                    .iter()
                    .any(|e| &e.key == key && e.group == f.group);
                if !in_group {
                    return Err(EngineError::invalid(format!(
                        "fixture {} names {key}, who is not in group {}",
                        f.id, f.group
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Default for TournamentSetup {
    fn default() -> Self {
        Self::season_one()
    }
}

/// Generate round-robin rounds with the circle method.
///
/// Every participant meets every other exactly once, and no participant plays
/// twice in the same round. With an odd count one participant sits out each round.
pub fn generate_round_robin_rounds<T: Clone>(participants: &[T]) -> Vec<Vec<(T, T)>> {
    let n = participants.len();
    if n < 2 {
        return Vec::new();
    }

    // Pad to an even count with a bye slot (None).
    let mut ring: Vec<Option<usize>> = (0..n).map(Some).collect();
    if n % 2 == 1 {
        ring.push(None);
    }
    let size = ring.len();

    let mut rounds = Vec::with_capacity(size - 1);
    for _ in 0..size - 1 {
        let mut pairs = Vec::with_capacity(size / 2);
        for i in 0..size / 2 {
            if let (Some(a), Some(b)) = (ring[i], ring[size - 1 - i]) {
                pairs.push((participants[a].clone(), participants[b].clone()));
            }
        }
        rounds.push(pairs);
        // Keep the first position fixed and rotate the rest by one.
        let last = ring.remove(size - 1);
        ring.insert(1, last);
    }
    rounds
}

/// Build the group-stage fixtures of one group: the listed schedule if the
/// setup has one, otherwise a generated round robin with ids `g<letter><n>`.
pub fn group_fixtures(setup: &TournamentSetup, group: Group) -> Vec<Match> {
    let listed: Vec<Match> = setup
        .fixtures
        .iter()
        .filter(|f| f.group == group)
        .map(|f| {
            Match::pending(
                f.id.clone(),
                f.time.clone(),
                f.home.clone(),
                f.away.clone(),
                MatchPhase::Group { group },
            )
        })
        .collect();
    if !listed.is_empty() {
        return listed;
    }

    let keys: Vec<String> = setup
        .entrants
        .iter()
        .filter(|e| e.group == group)
        .map(|e| e.key.clone())
        .collect();
    let slot_times = setup.group_times.get(&group);
    let prefix = format!("g{}", group.letter().to_ascii_lowercase());

    generate_round_robin_rounds(&keys)
        .into_iter()
        .flatten()
        .enumerate()
        .map(|(i, (home, away))| {
            let time = slot_times
                .and_then(|t| t.get(i))
                .cloned()
                .unwrap_or_else(|| "TBD".to_string());
            Match::pending(
                format!("{prefix}{}", i + 1),
                time,
                home,
                away,
                MatchPhase::Group { group },
            )
        })
        .collect()
}

/// Create the initial snapshot: zeroed entrants, pending group fixtures, no bracket.
pub fn initial_state(
    setup: &TournamentSetup,
    now: DateTime<Utc>,
) -> Result<TournamentState, EngineError> {
    setup.validate()?;

    let entrants = setup
        .entrants
        .iter()
        .map(|e| Entrant {
            key: e.key.clone(),
            name: e.name.clone(),
            icon: e.icon.clone(),
            group: e.group,
            stats: EntrantStats::default(),
        })
        .collect();

    let matches = Group::ALL
        .iter()
        .flat_map(|g| group_fixtures(setup, *g))
        .collect();

    Ok(TournamentState {
        info: setup.info.clone(),
        stage: Stage::Group,
        entrants,
        matches,
        bracket_times: setup.bracket_times.clone(),
        champions: Champions::default(),
        results: Vec::new(),
        last_update: now.timestamp_millis(),
    })
}
