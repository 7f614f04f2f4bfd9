// Group standings: entrants of one group ordered by the tie-break cascade.

use serde::Serialize;

use crate::model::{EntrantStats, Group, Match, TournamentState};
use crate::stats::group_stats;
use crate::tiebreak::{compare, Contender};

/// Number of entrants per group that advance to the bracket.
pub const QUALIFIERS_PER_GROUP: usize = 2;

/// One row of a group table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingRow {
    pub position: usize,
    pub key: String,
    pub name: String,
    pub icon: String,
    pub stats: EntrantStats,
    pub goal_difference: i64,
    pub qualifies: bool,
}

/// Rank every entrant of `group` on its group-match record.
///
/// Pure function of the snapshot. Entrants equal under every criterion keep
/// their roster order.
pub fn rank(state: &TournamentState, group: Group) -> Vec<StandingRow> {
    let mut stats = group_stats(state, group);
    let matches: Vec<&Match> = state.group_matches(group).collect();

    let mut entrants: Vec<_> = state
        .entrants_in(group)
        .map(|e| {
            let s = stats.remove(&e.key).unwrap_or_default();
            (e, s)
        })
        .collect();

    entrants.sort_by(|(ea, sa), (eb, sb)| {
        let a = Contender {
            key: &ea.key,
            name: &ea.name,
            stats: sa,
        };
        let b = Contender {
            key: &eb.key,
            name: &eb.name,
            stats: sb,
        };
        compare(&a, &b, &matches)
    });

    entrants
        .into_iter()
        .enumerate()
        .map(|(i, (e, s))| StandingRow {
            position: i + 1,
            key: e.key.clone(),
            name: e.name.clone(),
            icon: e.icon.clone(),
            goal_difference: s.goal_difference(),
            stats: s,
            qualifies: i < QUALIFIERS_PER_GROUP,
        })
        .collect()
}

/// Keys of the top `QUALIFIERS_PER_GROUP` entrants of `group`.
pub fn qualifiers(state: &TournamentState, group: Group) -> Vec<String> {
    rank(state, group)
        .into_iter()
        .take(QUALIFIERS_PER_GROUP)
        .map(|row| row.key)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entrant, MatchPhase, MatchStatus, Stage, TournamentInfo};
    use crate::stats::recompute_all;
    use crate::tournament::{initial_state, TournamentSetup};
    use chrono::Utc;

    fn season() -> TournamentState {
        initial_state(&TournamentSetup::season_one(), Utc::now()).unwrap()
    }

    /// Record a result for the group fixture between `home` and `away`, whichever
    /// way round it was scheduled.
    fn play(state: &mut TournamentState, home: &str, away: &str, h: u32, a: u32) {
        let m = state
            .matches
            .iter_mut()
            .find(|m| m.is_between(home, away))
            .unwrap();
        let (hg, ag) = if m.home == home { (h, a) } else { (a, h) };
        m.home_goals = Some(hg);
        m.away_goals = Some(ag);
        m.status = MatchStatus::Completed;
        m.completed_at = Some(Utc::now());
    }

    fn entrant(key: &str) -> Entrant {
        Entrant {
            key: key.to_string(),
            name: key.to_string(),
            icon: String::new(),
            group: Group::A,
            stats: EntrantStats::default(),
        }
    }

    fn custom_state(keys: &[&str], fixtures: &[(&str, &str)]) -> TournamentState {
        TournamentState {
            info: TournamentInfo {
                name: "Test".into(),
                format: "test".into(),
                venue: "test".into(),
            },
            stage: Stage::Group,
            entrants: keys.iter().map(|k| entrant(k)).collect(),
            matches: fixtures
                .iter()
                .enumerate()
                .map(|(i, (h, a))| {
                    Match::pending(format!("t{i}"), "", *h, *a, MatchPhase::Group { group: Group::A })
                })
                .collect(),
            bracket_times: Default::default(),
            champions: Default::default(),
            results: Vec::new(),
            last_update: 0,
        }
    }

    #[test]
    fn test_group_a_winner_with_nine_points() {
        let mut state = season();
        play(&mut state, "Amlan", "Pritul", 3, 1);
        play(&mut state, "Amlan", "Jacob", 2, 0);
        play(&mut state, "Amlan", "Asifur", 4, 2);
        play(&mut state, "Pritul", "Jacob", 1, 1);
        play(&mut state, "Pritul", "Asifur", 2, 0);
        play(&mut state, "Jacob", "Asifur", 0, 1);
        recompute_all(&mut state);

        let table = rank(&state, Group::A);
        assert_eq!(table.len(), 4);
        assert_eq!(table[0].key, "Amlan");
        assert_eq!(table[0].position, 1);
        assert_eq!(table[0].stats.points, 9);
        assert_eq!(table[0].stats.goals_for, 9);
        assert_eq!(table[0].stats.goals_against, 3);
        assert_eq!(table[0].goal_difference, 6);
        assert!(table[0].qualifies);
        assert!(!table[2].qualifies);
        // Pritul 4 pts, Asifur 3 pts, Jacob 1 pt
        let order: Vec<&str> = table.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(order, vec!["Amlan", "Pritul", "Asifur", "Jacob"]);
    }

    #[test]
    fn test_head_to_head_winner_ranks_higher() {
        // X and Y both finish on 6 points, +1, 3 scored; X won their meeting 2-1.
        let mut state = custom_state(
            &["Y", "X", "Z", "W"],
            &[("X", "Y"), ("X", "Z"), ("Y", "Z"), ("X", "W"), ("Y", "W"), ("Z", "W")],
        );
        play(&mut state, "X", "Y", 2, 1);
        play(&mut state, "X", "Z", 0, 1);
        play(&mut state, "Y", "Z", 1, 0);
        play(&mut state, "X", "W", 1, 0);
        play(&mut state, "Y", "W", 1, 0);
        play(&mut state, "Z", "W", 0, 0);

        let table = rank(&state, Group::A);
        let x = table.iter().find(|r| r.key == "X").unwrap();
        let y = table.iter().find(|r| r.key == "Y").unwrap();
        assert_eq!(x.stats.points, y.stats.points);
        assert_eq!(x.goal_difference, y.goal_difference);
        assert_eq!(x.stats.goals_for, y.stats.goals_for);
        assert!(x.position < y.position);
    }

    #[test]
    fn test_fair_play_orders_tied_entrants() {
        let mut state = custom_state(&["W", "Z"], &[("W", "Z")]);
        play(&mut state, "W", "Z", 1, 1);
        state.matches[0].home_red = 1;
        state.matches[0].away_yellow = 2;

        let table = rank(&state, Group::A);
        assert_eq!(table[0].key, "Z");
        assert_eq!(table[0].stats.fair_play_points, 2);
        assert_eq!(table[1].key, "W");
        assert_eq!(table[1].stats.fair_play_points, 4);
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let mut state = season();
        play(&mut state, "Wasif", "Qazi", 1, 1);
        play(&mut state, "Showrin", "Swapnil", 2, 2);
        let first = rank(&state, Group::B);
        let second = rank(&state, Group::B);
        assert_eq!(first, second);
    }

    #[test]
    fn test_untouched_group_sorts_by_name() {
        let state = season();
        let names: Vec<String> = rank(&state, Group::B).into_iter().map(|r| r.name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_qualifiers() {
        let mut state = season();
        play(&mut state, "Wasif", "Qazi", 3, 0);
        play(&mut state, "Showrin", "Swapnil", 2, 0);
        let q = qualifiers(&state, Group::B);
        assert_eq!(q.len(), 2);
        // Wasif: 3 pts, GD +3 ranks above Showrin: 3 pts, GD +2
        assert_eq!(q, vec!["Wasif".to_string(), "Showrin".to_string()]);
    }
}
