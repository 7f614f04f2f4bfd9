// Tournament data model: entrants, matches, bracket slots, and the full snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the two round-robin groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Group {
    A,
    B,
}

impl Group {
    pub const ALL: [Group; 2] = [Group::A, Group::B];

    pub fn letter(self) -> char {
        match self {
            Group::A => 'A',
            Group::B => 'B',
        }
    }

    /// Parse "A"/"B" (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.trim() {
            "A" | "a" => Some(Group::A),
            "B" | "b" => Some(Group::B),
            _ => None,
        }
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Tournament stage. Only ever moves from `Group` to `Playoffs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Group,
    Playoffs,
}

/// A display-only margin record, e.g. `3-0 vs Jacob`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarginRecord {
    pub margin: u32,
    pub score: String,
}

/// Cumulative statistics of one entrant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrantStats {
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub points: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
    pub fair_play_points: u32,
    pub biggest_win: Option<MarginRecord>,
    pub biggest_loss: Option<MarginRecord>,
}

impl EntrantStats {
    pub fn goal_difference(&self) -> i64 {
        self.goals_for as i64 - self.goals_against as i64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entrant {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    pub group: Group,
    #[serde(default)]
    pub stats: EntrantStats,
}

impl Entrant {
    /// First word of the display name.
    pub fn short_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }
}

/// Which side of the double-elimination bracket a playoff match belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketSide {
    Upper,
    Lower,
    Final,
}

/// Every playoff match the 4-entrant double-elimination bracket can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketSlot {
    UpperSemi1,
    UpperSemi2,
    LowerSemi,
    UpperFinal,
    LowerFinal,
    GrandFinal,
}

impl BracketSlot {
    pub const ALL: [BracketSlot; 6] = [
        BracketSlot::UpperSemi1,
        BracketSlot::UpperSemi2,
        BracketSlot::LowerSemi,
        BracketSlot::UpperFinal,
        BracketSlot::LowerFinal,
        BracketSlot::GrandFinal,
    ];

    /// Match id used for the generated match.
    pub fn match_id(self) -> &'static str {
        match self {
            BracketSlot::UpperSemi1 => "us1",
            BracketSlot::UpperSemi2 => "us2",
            BracketSlot::LowerSemi => "ls1",
            BracketSlot::UpperFinal => "uf1",
            BracketSlot::LowerFinal => "lf1",
            BracketSlot::GrandFinal => "gf1",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BracketSlot::UpperSemi1 => "Upper Semi 1",
            BracketSlot::UpperSemi2 => "Upper Semi 2",
            BracketSlot::LowerSemi => "Lower Semi",
            BracketSlot::UpperFinal => "Upper Final",
            BracketSlot::LowerFinal => "Lower Final",
            BracketSlot::GrandFinal => "Grand Final",
        }
    }

    pub fn round(self) -> u8 {
        match self {
            BracketSlot::UpperSemi1 | BracketSlot::UpperSemi2 | BracketSlot::LowerSemi => 1,
            BracketSlot::UpperFinal | BracketSlot::LowerFinal => 2,
            BracketSlot::GrandFinal => 3,
        }
    }

    pub fn side(self) -> BracketSide {
        match self {
            BracketSlot::UpperSemi1 | BracketSlot::UpperSemi2 | BracketSlot::UpperFinal => {
                BracketSide::Upper
            }
            BracketSlot::LowerSemi | BracketSlot::LowerFinal => BracketSide::Lower,
            BracketSlot::GrandFinal => BracketSide::Final,
        }
    }

    pub fn is_upper_semi(self) -> bool {
        matches!(self, BracketSlot::UpperSemi1 | BracketSlot::UpperSemi2)
    }

    /// Slots whose participants are taken from this slot's result.
    pub fn feeds(self) -> &'static [BracketSlot] {
        match self {
            BracketSlot::UpperSemi1 | BracketSlot::UpperSemi2 => {
                &[BracketSlot::UpperFinal, BracketSlot::LowerSemi]
            }
            BracketSlot::UpperFinal => &[BracketSlot::LowerFinal, BracketSlot::GrandFinal],
            BracketSlot::LowerSemi => &[BracketSlot::LowerFinal],
            BracketSlot::LowerFinal => &[BracketSlot::GrandFinal],
            BracketSlot::GrandFinal => &[],
        }
    }
}

/// Stage membership of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum MatchPhase {
    Group { group: Group },
    Playoff { slot: BracketSlot },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Completed,
}

/// One side's view of a completed match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideResult {
    pub goals_for: u32,
    pub goals_against: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    /// Scheduled time slot label, e.g. "2:00 PM".
    pub time: String,
    /// Entrant key of the home side.
    pub home: String,
    /// Entrant key of the away side.
    pub away: String,
    #[serde(flatten)]
    pub phase: MatchPhase,
    pub status: MatchStatus,
    pub home_goals: Option<u32>,
    pub away_goals: Option<u32>,
    #[serde(default)]
    pub home_yellow: u32,
    #[serde(default)]
    pub home_red: u32,
    #[serde(default)]
    pub away_yellow: u32,
    #[serde(default)]
    pub away_red: u32,
    /// When the result was first recorded. Corrections keep this value.
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub corrected_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn pending(
        id: impl Into<String>,
        time: impl Into<String>,
        home: impl Into<String>,
        away: impl Into<String>,
        phase: MatchPhase,
    ) -> Self {
        Self {
            id: id.into(),
            time: time.into(),
            home: home.into(),
            away: away.into(),
            phase,
            status: MatchStatus::Pending,
            home_goals: None,
            away_goals: None,
            home_yellow: 0,
            home_red: 0,
            away_yellow: 0,
            away_red: 0,
            completed_at: None,
            corrected_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    pub fn group(&self) -> Option<Group> {
        match self.phase {
            MatchPhase::Group { group } => Some(group),
            MatchPhase::Playoff { .. } => None,
        }
    }

    pub fn bracket_slot(&self) -> Option<BracketSlot> {
        match self.phase {
            MatchPhase::Playoff { slot } => Some(slot),
            MatchPhase::Group { .. } => None,
        }
    }

    /// `(home, away)` goals of a completed match.
    pub fn score(&self) -> Option<(u32, u32)> {
        if !self.is_completed() {
            return None;
        }
        Some((self.home_goals?, self.away_goals?))
    }

    /// Winner key; `None` when pending or drawn.
    pub fn winner(&self) -> Option<&str> {
        let (h, a) = self.score()?;
        match h.cmp(&a) {
            std::cmp::Ordering::Greater => Some(&self.home),
            std::cmp::Ordering::Less => Some(&self.away),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Loser key; `None` when pending or drawn.
    pub fn loser(&self) -> Option<&str> {
        let (h, a) = self.score()?;
        match h.cmp(&a) {
            std::cmp::Ordering::Greater => Some(&self.away),
            std::cmp::Ordering::Less => Some(&self.home),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Whether this match is between exactly these two entrants, in either orientation.
    pub fn is_between(&self, a: &str, b: &str) -> bool {
        (self.home == a && self.away == b) || (self.home == b && self.away == a)
    }

    pub fn home_result(&self) -> Option<SideResult> {
        let (h, a) = self.score()?;
        Some(SideResult {
            goals_for: h,
            goals_against: a,
            yellow_cards: self.home_yellow,
            red_cards: self.home_red,
        })
    }

    pub fn away_result(&self) -> Option<SideResult> {
        let (h, a) = self.score()?;
        Some(SideResult {
            goals_for: a,
            goals_against: h,
            yellow_cards: self.away_yellow,
            red_cards: self.away_red,
        })
    }

    /// Result from the perspective of `key`, if it took part.
    pub fn result_for(&self, key: &str) -> Option<SideResult> {
        if self.home == key {
            self.home_result()
        } else if self.away == key {
            self.away_result()
        } else {
            None
        }
    }
}

/// Final placings, filled once the grand final is completed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Champions {
    pub champion: Option<String>,
    pub runner_up: Option<String>,
    pub third_place: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentInfo {
    pub name: String,
    pub format: String,
    pub venue: String,
}

/// An accepted result submission, kept in submission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub match_id: String,
    pub home_goals: u32,
    pub away_goals: u32,
    pub home_yellow: u32,
    pub home_red: u32,
    pub away_yellow: u32,
    pub away_red: u32,
    pub correction: bool,
    pub submitted_at: DateTime<Utc>,
}

/// The full tournament snapshot exchanged with the store on every operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentState {
    pub info: TournamentInfo,
    pub stage: Stage,
    pub entrants: Vec<Entrant>,
    /// Every match of the tournament, group and playoff, in creation order.
    pub matches: Vec<Match>,
    /// Time slot labels for playoff matches, applied when they are generated.
    pub bracket_times: BTreeMap<BracketSlot, String>,
    pub champions: Champions,
    #[serde(default)]
    pub results: Vec<ResultRecord>,
    /// Milliseconds since the epoch; strictly increases with every mutation.
    pub last_update: i64,
}

impl TournamentState {
    pub fn entrant(&self, key: &str) -> Option<&Entrant> {
        self.entrants.iter().find(|e| e.key == key)
    }

    pub fn entrant_mut(&mut self, key: &str) -> Option<&mut Entrant> {
        self.entrants.iter_mut().find(|e| e.key == key)
    }

    pub fn entrants_in(&self, group: Group) -> impl Iterator<Item = &Entrant> {
        self.entrants.iter().filter(move |e| e.group == group)
    }

    pub fn find_match(&self, id: &str) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == id)
    }

    pub fn match_index(&self, id: &str) -> Option<usize> {
        self.matches.iter().position(|m| m.id == id)
    }

    pub fn slot_match(&self, slot: BracketSlot) -> Option<&Match> {
        self.matches.iter().find(|m| m.bracket_slot() == Some(slot))
    }

    pub fn group_matches(&self, group: Group) -> impl Iterator<Item = &Match> {
        self.matches.iter().filter(move |m| m.group() == Some(group))
    }

    pub fn bracket_time(&self, slot: BracketSlot) -> String {
        self.bracket_times
            .get(&slot)
            .cloned()
            .unwrap_or_else(|| "TBD".to_string())
    }

    /// Advance `last_update` to `now`, or by one millisecond if the clock has not moved.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_update = now.timestamp_millis().max(self.last_update + 1);
    }
}
