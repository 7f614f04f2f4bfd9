// Stats aggregation: folds completed matches into per-entrant cumulative stats.
//
// Two paths exist. `apply_completed` adds one new result to the two entrants that
// played it; `recompute_all` rebuilds every entrant from the match history and is
// used whenever an already-completed result is corrected.

use std::collections::HashMap;

use crate::model::{
    Entrant, EntrantStats, Group, Match, MarginRecord, ResultRecord, SideResult, TournamentState,
};

pub const POINTS_WIN: u32 = 3;
pub const POINTS_DRAW: u32 = 1;
pub const FAIR_PLAY_YELLOW: u32 = 1;
pub const FAIR_PLAY_RED: u32 = 4;

/// Disciplinary points for a card count. Lower is better.
pub fn fair_play_points(yellow: u32, red: u32) -> u32 {
    yellow
        .saturating_mul(FAIR_PLAY_YELLOW)
        .saturating_add(red.saturating_mul(FAIR_PLAY_RED))
}

/// Fold one match outcome into one entrant's stats.
pub fn apply_match(stats: &mut EntrantStats, result: SideResult, opponent: &str) {
    let SideResult {
        goals_for,
        goals_against,
        yellow_cards,
        red_cards,
    } = result;

    stats.played = stats.played.saturating_add(1);
    stats.goals_for = stats.goals_for.saturating_add(goals_for);
    stats.goals_against = stats.goals_against.saturating_add(goals_against);

    match goals_for.cmp(&goals_against) {
        std::cmp::Ordering::Greater => {
            stats.won = stats.won.saturating_add(1);
            stats.points = stats.points.saturating_add(POINTS_WIN);
        }
        std::cmp::Ordering::Equal => {
            stats.drawn = stats.drawn.saturating_add(1);
            stats.points = stats.points.saturating_add(POINTS_DRAW);
        }
        std::cmp::Ordering::Less => {
            stats.lost = stats.lost.saturating_add(1);
        }
    }

    stats.yellow_cards = stats.yellow_cards.saturating_add(yellow_cards);
    stats.red_cards = stats.red_cards.saturating_add(red_cards);
    stats.fair_play_points = fair_play_points(stats.yellow_cards, stats.red_cards);

    // Display records; an equal margin keeps the earlier record.
    let score = format!("{goals_for}-{goals_against} vs {opponent}");
    if goals_for > goals_against {
        let margin = goals_for - goals_against;
        if stats.biggest_win.as_ref().map_or(true, |r| margin > r.margin) {
            stats.biggest_win = Some(MarginRecord { margin, score });
        }
    } else if goals_against > goals_for {
        let margin = goals_against - goals_for;
        if stats.biggest_loss.as_ref().map_or(true, |r| margin > r.margin) {
            stats.biggest_loss = Some(MarginRecord { margin, score });
        }
    }
}

fn short_name_of(entrants: &[Entrant], key: &str) -> Option<String> {
    entrants
        .iter()
        .find(|e| e.key == key)
        .map(|e| e.short_name().to_string())
}

/// Apply a completed match to both participants. Matches with an unknown
/// participant are skipped.
pub fn apply_completed(entrants: &mut [Entrant], m: &Match) {
    let (Some(home_result), Some(away_result)) = (m.home_result(), m.away_result()) else {
        return;
    };
    let (Some(home_name), Some(away_name)) = (
        short_name_of(entrants, &m.home),
        short_name_of(entrants, &m.away),
    ) else {
        tracing::warn!(match_id = %m.id, home = %m.home, away = %m.away, "Skipping stats for match with unknown entrant");
        return;
    };

    for e in entrants.iter_mut() {
        if e.key == m.home {
            apply_match(&mut e.stats, home_result, &away_name);
        } else if e.key == m.away {
            apply_match(&mut e.stats, away_result, &home_name);
        }
    }
}

/// Completed matches in the order their first result was submitted.
///
/// The position of each match's first non-correction entry in the result ledger
/// decides. Matches absent from the ledger follow, by `completed_at` and then
/// list position.
fn completion_order<'a>(
    matches: impl Iterator<Item = &'a Match>,
    results: &[ResultRecord],
) -> Vec<&'a Match> {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for (i, r) in results.iter().enumerate().filter(|(_, r)| !r.correction) {
        first_seen.entry(r.match_id.as_str()).or_insert(i);
    }

    let mut done: Vec<&Match> = matches.filter(|m| m.is_completed()).collect();
    done.sort_by_key(|m| {
        (
            first_seen.get(m.id.as_str()).copied().unwrap_or(usize::MAX),
            m.completed_at,
        )
    });
    done
}

/// Reset every entrant and rebuild its stats from all completed matches.
pub fn recompute_all(state: &mut TournamentState) {
    for e in state.entrants.iter_mut() {
        e.stats = EntrantStats::default();
    }
    for m in completion_order(state.matches.iter(), &state.results) {
        apply_completed(&mut state.entrants, m);
    }
}

/// Stats of every entrant in `group`, folded from that group's completed matches only.
pub fn group_stats(state: &TournamentState, group: Group) -> HashMap<String, EntrantStats> {
    let mut entrants: Vec<Entrant> = state
        .entrants_in(group)
        .map(|e| Entrant {
            stats: EntrantStats::default(),
            ..e.clone()
        })
        .collect();
    for m in completion_order(state.group_matches(group), &state.results) {
        apply_completed(&mut entrants, m);
    }
    entrants.into_iter().map(|e| (e.key, e.stats)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchStatus, Stage};
    use crate::tournament::{initial_state, TournamentSetup};
    use chrono::{Duration, TimeZone, Utc};

    fn side(gf: u32, ga: u32, y: u32, r: u32) -> SideResult {
        SideResult {
            goals_for: gf,
            goals_against: ga,
            yellow_cards: y,
            red_cards: r,
        }
    }

    fn complete(state: &mut TournamentState, id: &str, h: u32, a: u32, minute: i64) {
        let base = Utc.with_ymd_and_hms(2025, 1, 1, 14, 0, 0).unwrap();
        let m = state.matches.iter_mut().find(|m| m.id == id).unwrap();
        m.home_goals = Some(h);
        m.away_goals = Some(a);
        m.status = MatchStatus::Completed;
        m.completed_at = Some(base + Duration::minutes(minute));
    }

    #[test]
    fn test_apply_win_draw_loss() {
        let mut s = EntrantStats::default();
        apply_match(&mut s, side(3, 1, 0, 0), "Jacob");
        apply_match(&mut s, side(2, 2, 1, 0), "Pritul");
        apply_match(&mut s, side(0, 1, 0, 1), "Asifur");

        assert_eq!(s.played, 3);
        assert_eq!((s.won, s.drawn, s.lost), (1, 1, 1));
        assert_eq!(s.points, 4);
        assert_eq!((s.goals_for, s.goals_against), (5, 4));
        assert_eq!(s.goal_difference(), 1);
        assert_eq!((s.yellow_cards, s.red_cards), (1, 1));
        assert_eq!(s.fair_play_points, 5);
    }

    #[test]
    fn test_biggest_margin_first_stands() {
        let mut s = EntrantStats::default();
        apply_match(&mut s, side(2, 0, 0, 0), "Jacob");
        apply_match(&mut s, side(3, 1, 0, 0), "Pritul");
        assert_eq!(s.biggest_win.as_ref().unwrap().score, "2-0 vs Jacob");

        apply_match(&mut s, side(4, 1, 0, 0), "Asifur");
        let win = s.biggest_win.as_ref().unwrap();
        assert_eq!(win.margin, 3);
        assert_eq!(win.score, "4-1 vs Asifur");

        apply_match(&mut s, side(0, 2, 0, 0), "Wasif");
        apply_match(&mut s, side(1, 3, 0, 0), "Qazi");
        assert_eq!(s.biggest_loss.as_ref().unwrap().score, "0-2 vs Wasif");
        assert_eq!(s.biggest_loss.as_ref().unwrap().margin, 2);
    }

    #[test]
    fn test_fair_play_points() {
        assert_eq!(fair_play_points(0, 0), 0);
        assert_eq!(fair_play_points(2, 0), 2);
        assert_eq!(fair_play_points(0, 1), 4);
        assert_eq!(fair_play_points(3, 2), 11);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut state = initial_state(&TournamentSetup::season_one(), Utc::now()).unwrap();
        complete(&mut state, "ga1", 3, 1, 0);
        complete(&mut state, "ga2", 2, 2, 30);
        complete(&mut state, "gb1", 0, 4, 15);
        state.matches[0].home_yellow = 2;

        recompute_all(&mut state);
        let once: Vec<EntrantStats> = state.entrants.iter().map(|e| e.stats.clone()).collect();
        recompute_all(&mut state);
        let twice: Vec<EntrantStats> = state.entrants.iter().map(|e| e.stats.clone()).collect();
        assert_eq!(once, twice);
        assert_eq!(state.stage, Stage::Group);
    }

    #[test]
    fn test_incremental_matches_full_recompute() {
        let mut state = initial_state(&TournamentSetup::season_one(), Utc::now()).unwrap();
        let results = [
            ("ga1", 3, 1),
            ("gb1", 1, 1),
            ("ga2", 0, 2),
            ("ga3", 2, 0),
            ("gb2", 5, 0),
            ("ga4", 1, 4),
        ];

        let mut incremental = state.clone();
        for (minute, (id, h, a)) in results.iter().enumerate() {
            complete(&mut incremental, id, *h, *a, minute as i64);
            let m = incremental.find_match(id).unwrap().clone();
            apply_completed(&mut incremental.entrants, &m);
            complete(&mut state, id, *h, *a, minute as i64);
        }

        recompute_all(&mut state);
        assert_eq!(state.entrants, incremental.entrants);
    }

    #[test]
    fn test_recompute_follows_completion_order() {
        let mut state = initial_state(&TournamentSetup::season_one(), Utc::now()).unwrap();
        // ga5 (Amlan v Asifur) is completed before ga1 (Amlan v Jacob), both 2-0.
        complete(&mut state, "ga5", 2, 0, 10);
        complete(&mut state, "ga1", 2, 0, 20);
        recompute_all(&mut state);

        let amlan = state.entrant("Amlan").unwrap();
        assert_eq!(amlan.stats.played, 2);
        assert_eq!(amlan.stats.biggest_win.as_ref().unwrap().score, "2-0 vs Asifur");
    }

    fn ledger(id: &str, correction: bool) -> ResultRecord {
        ResultRecord {
            match_id: id.to_string(),
            home_goals: 2,
            away_goals: 0,
            home_yellow: 0,
            home_red: 0,
            away_yellow: 0,
            away_red: 0,
            correction,
            submitted_at: Utc::now(),
        }
    }

    #[test]
    fn test_recompute_follows_ledger_over_clock() {
        let mut state = initial_state(&TournamentSetup::season_one(), Utc::now()).unwrap();
        // The clock stepped back between the two submissions: ga1 carries the
        // earlier timestamp but was submitted second.
        complete(&mut state, "ga5", 2, 0, 20);
        complete(&mut state, "ga1", 2, 0, 10);
        state.results = vec![ledger("ga5", false), ledger("ga1", false), ledger("ga5", true)];
        recompute_all(&mut state);

        let amlan = state.entrant("Amlan").unwrap();
        assert_eq!(amlan.stats.biggest_win.as_ref().unwrap().score, "2-0 vs Asifur");
        let group = group_stats(&state, Group::A);
        assert_eq!(group["Amlan"].biggest_win, amlan.stats.biggest_win);
    }

    #[test]
    fn test_huge_counts_saturate() {
        let mut s = EntrantStats::default();
        apply_match(&mut s, side(u32::MAX, 0, 0, u32::MAX), "Jacob");
        apply_match(&mut s, side(u32::MAX, 0, u32::MAX, 1), "Pritul");
        assert_eq!(s.goals_for, u32::MAX);
        assert_eq!(s.red_cards, u32::MAX);
        assert_eq!(s.fair_play_points, u32::MAX);
        assert_eq!(s.points, 6);
        assert_eq!(fair_play_points(u32::MAX, 0), u32::MAX);
    }

    #[test]
    fn test_unknown_entrant_is_skipped() {
        let mut state = initial_state(&TournamentSetup::season_one(), Utc::now()).unwrap();
        state.matches[0].away = "Nobody".to_string();
        complete(&mut state, "ga1", 1, 0, 0);
        recompute_all(&mut state);
        assert!(state.entrants.iter().all(|e| e.stats.played == 0));
    }

    #[test]
    fn test_group_stats_ignore_other_groups() {
        let mut state = initial_state(&TournamentSetup::season_one(), Utc::now()).unwrap();
        complete(&mut state, "ga1", 3, 0, 0);
        complete(&mut state, "gb1", 1, 0, 1);
        let stats = group_stats(&state, Group::A);
        assert_eq!(stats.len(), 4);
        let played: u32 = stats.values().map(|s| s.played).sum();
        assert_eq!(played, 2);
    }
}
