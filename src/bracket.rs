// Double-elimination bracket progression.
//
// Progression is re-evaluated after every recorded result. Each trigger checks
// that its prerequisite matches are completed and that the match it would create
// does not exist yet, so running it again is a no-op.

use serde::Serialize;

use crate::model::{
    BracketSide, BracketSlot, Champions, Group, Match, MatchPhase, Stage, TournamentState,
};
use crate::standings::{qualifiers, QUALIFIERS_PER_GROUP};

/// Read view of the bracket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bracket {
    pub upper: Vec<Match>,
    pub lower: Vec<Match>,
    pub grand_final: Option<Match>,
    /// Entrants knocked out, in elimination order.
    pub eliminated: Vec<String>,
    pub champions: Champions,
}

/// Collect the playoff matches of `state` into upper/lower/final views.
pub fn bracket_view(state: &TournamentState) -> Bracket {
    let on_side = |side: BracketSide| -> Vec<Match> {
        let mut ms: Vec<Match> = state
            .matches
            .iter()
            .filter(|m| m.bracket_slot().map(|s| s.side()) == Some(side))
            .cloned()
            .collect();
        ms.sort_by_key(|m| m.bracket_slot());
        ms
    };

    let eliminated = [
        BracketSlot::LowerSemi,
        BracketSlot::LowerFinal,
        BracketSlot::GrandFinal,
    ]
    .iter()
    .filter_map(|slot| state.slot_match(*slot).and_then(|m| m.loser()))
    .map(str::to_string)
    .collect();

    Bracket {
        upper: on_side(BracketSide::Upper),
        lower: on_side(BracketSide::Lower),
        grand_final: state.slot_match(BracketSlot::GrandFinal).cloned(),
        eliminated,
        champions: state.champions.clone(),
    }
}

/// Whether every group-stage match has a result.
pub fn group_stage_complete(state: &TournamentState) -> bool {
    let mut group_matches = state.matches.iter().filter(|m| m.group().is_some()).peekable();
    group_matches.peek().is_some() && group_matches.all(|m| m.is_completed())
}

fn exists(state: &TournamentState, slot: BracketSlot) -> bool {
    state.slot_match(slot).is_some()
}

fn completed(state: &TournamentState, slot: BracketSlot) -> Option<&Match> {
    state.slot_match(slot).filter(|m| m.is_completed())
}

/// Whether a result change for `slot` could no longer be reflected downstream.
pub fn has_advanced(state: &TournamentState, slot: BracketSlot) -> bool {
    slot.feeds().iter().any(|s| exists(state, *s))
}

fn create(state: &mut TournamentState, slot: BracketSlot, home: &str, away: &str) {
    let m = Match::pending(
        slot.match_id(),
        state.bracket_time(slot),
        home,
        away,
        MatchPhase::Playoff { slot },
    );
    tracing::info!(
        match_id = %m.id,
        home = %m.home,
        away = %m.away,
        "Generated {}",
        slot.label()
    );
    state.matches.push(m);
}

/// Seed the upper semifinals from the group tables once every group match is done.
fn seed_playoffs(state: &mut TournamentState, created: &mut Vec<BracketSlot>) {
    if state.stage != Stage::Group || !group_stage_complete(state) {
        return;
    }

    let a = qualifiers(state, Group::A);
    let b = qualifiers(state, Group::B);
    if a.len() < QUALIFIERS_PER_GROUP || b.len() < QUALIFIERS_PER_GROUP {
        tracing::warn!("Group stage complete but a group has fewer than two qualifiers");
        return;
    }

    if !exists(state, BracketSlot::UpperSemi1) {
        create(state, BracketSlot::UpperSemi1, &a[0], &b[1]);
        created.push(BracketSlot::UpperSemi1);
    }
    if !exists(state, BracketSlot::UpperSemi2) {
        create(state, BracketSlot::UpperSemi2, &b[0], &a[1]);
        created.push(BracketSlot::UpperSemi2);
    }
    state.stage = Stage::Playoffs;
    tracing::info!(a1 = %a[0], a2 = %a[1], b1 = %b[0], b2 = %b[1], "Group stage complete, playoffs seeded");
}

/// Both upper semis done: winners meet in the upper final, losers in the lower semi.
fn advance_upper_semis(state: &mut TournamentState, created: &mut Vec<BracketSlot>) {
    let (Some(s1), Some(s2)) = (
        completed(state, BracketSlot::UpperSemi1),
        completed(state, BracketSlot::UpperSemi2),
    ) else {
        return;
    };
    let (Some(w1), Some(l1), Some(w2), Some(l2)) = (s1.winner(), s1.loser(), s2.winner(), s2.loser())
    else {
        return;
    };
    let (w1, l1, w2, l2) = (w1.to_string(), l1.to_string(), w2.to_string(), l2.to_string());

    if !exists(state, BracketSlot::LowerSemi) {
        create(state, BracketSlot::LowerSemi, &l1, &l2);
        created.push(BracketSlot::LowerSemi);
    }
    if !exists(state, BracketSlot::UpperFinal) {
        create(state, BracketSlot::UpperFinal, &w1, &w2);
        created.push(BracketSlot::UpperFinal);
    }
}

/// Upper final and lower semi done: the upper-final loser drops to the lower final.
fn advance_to_lower_final(state: &mut TournamentState, created: &mut Vec<BracketSlot>) {
    if exists(state, BracketSlot::LowerFinal) {
        return;
    }
    let (Some(uf), Some(ls)) = (
        completed(state, BracketSlot::UpperFinal),
        completed(state, BracketSlot::LowerSemi),
    ) else {
        return;
    };
    let (Some(upper_loser), Some(lower_winner)) = (uf.loser(), ls.winner()) else {
        return;
    };
    let (home, away) = (upper_loser.to_string(), lower_winner.to_string());
    create(state, BracketSlot::LowerFinal, &home, &away);
    created.push(BracketSlot::LowerFinal);
}

/// Lower final done: its winner meets the upper-final winner.
fn advance_to_grand_final(state: &mut TournamentState, created: &mut Vec<BracketSlot>) {
    if exists(state, BracketSlot::GrandFinal) {
        return;
    }
    let (Some(uf), Some(lf)) = (
        completed(state, BracketSlot::UpperFinal),
        completed(state, BracketSlot::LowerFinal),
    ) else {
        return;
    };
    let (Some(upper_winner), Some(lower_winner)) = (uf.winner(), lf.winner()) else {
        return;
    };
    let (home, away) = (upper_winner.to_string(), lower_winner.to_string());
    create(state, BracketSlot::GrandFinal, &home, &away);
    created.push(BracketSlot::GrandFinal);
}

/// Derive the final placings from the grand final and lower final.
fn settle_champions(state: &mut TournamentState) {
    let Some(gf) = completed(state, BracketSlot::GrandFinal) else {
        return;
    };
    let champions = Champions {
        champion: gf.winner().map(str::to_string),
        runner_up: gf.loser().map(str::to_string),
        third_place: completed(state, BracketSlot::LowerFinal)
            .and_then(|lf| lf.loser())
            .map(str::to_string),
    };
    if champions != state.champions {
        tracing::info!(
            champion = ?champions.champion,
            runner_up = ?champions.runner_up,
            third_place = ?champions.third_place,
            "Champions decided"
        );
        state.champions = champions;
    }
}

/// Run every trigger whose preconditions hold. Returns the slots created by this
/// call; an empty list means nothing was ready or everything already existed.
pub fn progress(state: &mut TournamentState) -> Vec<BracketSlot> {
    let mut created = Vec::new();
    seed_playoffs(state, &mut created);
    if state.stage == Stage::Playoffs {
        advance_upper_semis(state, &mut created);
        advance_to_lower_final(state, &mut created);
        advance_to_grand_final(state, &mut created);
        settle_champions(state);
    }
    created
}
