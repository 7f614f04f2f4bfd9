// Tie-break comparator for entrants of the same group.
//
// Criteria are applied in order, each only when every earlier one is level:
// points, goal difference, goals for, then head-to-head points, goal difference
// and goals for between the two entrants, then fair-play points (fewer is
// better), then display name. Head-to-head is only replayed when the first three
// criteria are exactly tied.

use std::cmp::Ordering;

use serde::Serialize;

use crate::model::{EntrantStats, Match};

/// A single ranking criterion, in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Points,
    GoalDifference,
    GoalsFor,
    HeadToHeadPoints,
    HeadToHeadGoalDifference,
    HeadToHeadGoalsFor,
    FairPlay,
    Name,
}

impl Criterion {
    pub fn is_head_to_head(self) -> bool {
        matches!(
            self,
            Criterion::HeadToHeadPoints
                | Criterion::HeadToHeadGoalDifference
                | Criterion::HeadToHeadGoalsFor
        )
    }
}

/// The ranking inputs of one entrant.
#[derive(Debug, Clone, Copy)]
pub struct Contender<'a> {
    pub key: &'a str,
    pub name: &'a str,
    pub stats: &'a EntrantStats,
}

/// Record of the completed matches between two entrants, seen from `a` and `b`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadToHead {
    pub points_a: u32,
    pub points_b: u32,
    pub goals_for_a: u32,
    pub goals_for_b: u32,
}

impl HeadToHead {
    pub fn goal_difference_a(&self) -> i64 {
        self.goals_for_a as i64 - self.goals_for_b as i64
    }

    pub fn goal_difference_b(&self) -> i64 {
        -self.goal_difference_a()
    }
}

/// Replay the completed matches between `a` and `b`, whichever side was at home.
pub fn head_to_head<'m>(a: &str, b: &str, matches: impl IntoIterator<Item = &'m Match>) -> HeadToHead {
    let mut h2h = HeadToHead::default();
    for m in matches {
        if !m.is_between(a, b) {
            continue;
        }
        let Some(res) = m.result_for(a) else {
            continue;
        };
        h2h.goals_for_a += res.goals_for;
        h2h.goals_for_b += res.goals_against;
        match res.goals_for.cmp(&res.goals_against) {
            Ordering::Greater => h2h.points_a += 3,
            Ordering::Less => h2h.points_b += 3,
            Ordering::Equal => {
                h2h.points_a += 1;
                h2h.points_b += 1;
            }
        }
    }
    h2h
}

/// The outcome of a comparison and the criterion that settled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub ordering: Ordering,
    pub decided_by: Criterion,
}

fn first_decisive(steps: &[(Criterion, Ordering)]) -> Option<Decision> {
    steps
        .iter()
        .find(|(_, ord)| *ord != Ordering::Equal)
        .map(|(c, ord)| Decision {
            ordering: *ord,
            decided_by: *c,
        })
}

/// Compare two entrants. `Ordering::Less` means `a` ranks above `b`.
///
/// The final name comparison is by bytes, so upper-case names sort before lower-case ones.
pub fn decide(a: &Contender<'_>, b: &Contender<'_>, matches: &[&Match]) -> Decision {
    let primary = [
        (Criterion::Points, b.stats.points.cmp(&a.stats.points)),
        (
            Criterion::GoalDifference,
            b.stats.goal_difference().cmp(&a.stats.goal_difference()),
        ),
        (Criterion::GoalsFor, b.stats.goals_for.cmp(&a.stats.goals_for)),
    ];
    if let Some(d) = first_decisive(&primary) {
        return d;
    }

    let h2h = head_to_head(a.key, b.key, matches.iter().copied());
    let secondary = [
        (Criterion::HeadToHeadPoints, h2h.points_b.cmp(&h2h.points_a)),
        (
            Criterion::HeadToHeadGoalDifference,
            h2h.goal_difference_b().cmp(&h2h.goal_difference_a()),
        ),
        (
            Criterion::HeadToHeadGoalsFor,
            h2h.goals_for_b.cmp(&h2h.goals_for_a),
        ),
        (
            Criterion::FairPlay,
            a.stats.fair_play_points.cmp(&b.stats.fair_play_points),
        ),
    ];
    if let Some(d) = first_decisive(&secondary) {
        return d;
    }

    Decision {
        ordering: a.name.cmp(b.name),
        decided_by: Criterion::Name,
    }
}

pub fn compare(a: &Contender<'_>, b: &Contender<'_>, matches: &[&Match]) -> Ordering {
    decide(a, b, matches).ordering
}
