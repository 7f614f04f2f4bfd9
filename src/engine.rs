// Engine entry points: result submission and the read accessors.
//
// Every call operates on a whole in-memory snapshot. The caller is responsible for
// loading it, serializing mutating calls, and writing it back.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::bracket::{bracket_view, has_advanced, progress, Bracket};
use crate::error::EngineError;
use crate::metrics;
use crate::model::{BracketSlot, Group, MatchStatus, ResultRecord, Stage, TournamentState};
use crate::standings::{rank, StandingRow};
use crate::stats::{apply_completed, recompute_all};

/// A result as submitted by an operator. Goals are required; cards default to 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSubmission {
    pub match_id: String,
    pub home_goals: Option<i64>,
    pub away_goals: Option<i64>,
    #[serde(default)]
    pub home_yellow: Option<i64>,
    #[serde(default)]
    pub home_red: Option<i64>,
    #[serde(default)]
    pub away_yellow: Option<i64>,
    #[serde(default)]
    pub away_red: Option<i64>,
}

impl ResultSubmission {
    pub fn new(match_id: impl Into<String>, home_goals: i64, away_goals: i64) -> Self {
        Self {
            match_id: match_id.into(),
            home_goals: Some(home_goals),
            away_goals: Some(away_goals),
            ..Default::default()
        }
    }

    pub fn with_cards(mut self, home_yellow: i64, home_red: i64, away_yellow: i64, away_red: i64) -> Self {
        self.home_yellow = Some(home_yellow);
        self.home_red = Some(home_red);
        self.away_yellow = Some(away_yellow);
        self.away_red = Some(away_red);
        self
    }
}

/// Checked score and card counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Score {
    home_goals: u32,
    away_goals: u32,
    home_yellow: u32,
    home_red: u32,
    away_yellow: u32,
    away_red: u32,
}

/// Largest goal or card count accepted for one side of one match.
pub const MAX_COUNT: i64 = u16::MAX as i64;

fn count(field: &str, value: Option<i64>, required: bool) -> Result<u32, EngineError> {
    match value {
        None if required => Err(EngineError::invalid(format!("missing {field}"))),
        None => Ok(0),
        Some(v) if v < 0 => Err(EngineError::invalid(format!(
            "{field} must be a non-negative integer, got {v}"
        ))),
        Some(v) if v > MAX_COUNT => Err(EngineError::invalid(format!(
            "{field} must be at most {MAX_COUNT}, got {v}"
        ))),
        Some(v) => u32::try_from(v)
            .map_err(|_| EngineError::invalid(format!("{field} is out of range: {v}"))),
    }
}

/// Parse a raw text field such as a command-line argument.
pub fn parse_count(field: &str, raw: &str) -> Result<i64, EngineError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| EngineError::invalid(format!("{field} must be an integer, got {raw:?}")))
}

fn validate(sub: &ResultSubmission) -> Result<Score, EngineError> {
    if sub.match_id.trim().is_empty() {
        return Err(EngineError::invalid("missing match id"));
    }
    Ok(Score {
        home_goals: count("home goals", sub.home_goals, true)?,
        away_goals: count("away goals", sub.away_goals, true)?,
        home_yellow: count("home yellow cards", sub.home_yellow, false)?,
        home_red: count("home red cards", sub.home_red, false)?,
        away_yellow: count("away yellow cards", sub.away_yellow, false)?,
        away_red: count("away red cards", sub.away_red, false)?,
    })
}

/// What a successful submission changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitOutcome {
    pub match_id: String,
    pub correction: bool,
    pub created: Vec<BracketSlot>,
    pub stage: Stage,
    pub last_update: i64,
}

/// Playoff results must be decisive, and a finished playoff result whose winner
/// already advanced cannot change winner.
fn check_playoff(state: &TournamentState, idx: usize, score: &Score) -> Result<(), EngineError> {
    let m = &state.matches[idx];
    let Some(slot) = m.bracket_slot() else {
        return Ok(());
    };
    if score.home_goals == score.away_goals {
        return Err(EngineError::invalid(format!(
            "{} ({}) cannot end in a draw",
            slot.label(),
            m.id
        )));
    }
    if m.is_completed() && has_advanced(state, slot) {
        let new_winner = if score.home_goals > score.away_goals {
            &m.home
        } else {
            &m.away
        };
        if m.winner() != Some(new_winner.as_str()) {
            return Err(EngineError::invalid(format!(
                "winner of {} ({}) has already advanced",
                slot.label(),
                m.id
            )));
        }
    }
    Ok(())
}

/// Apply a submission without recording metrics. On error the snapshot is left
/// untouched.
pub fn apply_submission(
    state: &mut TournamentState,
    sub: &ResultSubmission,
    now: DateTime<Utc>,
) -> Result<SubmitOutcome, EngineError> {
    let score = validate(sub)?;
    let idx = state
        .match_index(&sub.match_id)
        .ok_or_else(|| EngineError::NotFound(sub.match_id.clone()))?;
    check_playoff(state, idx, &score)?;

    let correction = state.matches[idx].is_completed();
    if correction && state.matches[idx].group().is_some() && state.stage == Stage::Playoffs {
        tracing::warn!(match_id = %sub.match_id, "Group result corrected after playoffs were seeded; seeds are unchanged");
    }

    let m = &mut state.matches[idx];
    m.home_goals = Some(score.home_goals);
    m.away_goals = Some(score.away_goals);
    m.home_yellow = score.home_yellow;
    m.home_red = score.home_red;
    m.away_yellow = score.away_yellow;
    m.away_red = score.away_red;
    m.status = MatchStatus::Completed;
    if correction {
        m.corrected_at = Some(now);
    } else {
        m.completed_at = Some(now);
    }

    state.results.push(ResultRecord {
        match_id: sub.match_id.clone(),
        home_goals: score.home_goals,
        away_goals: score.away_goals,
        home_yellow: score.home_yellow,
        home_red: score.home_red,
        away_yellow: score.away_yellow,
        away_red: score.away_red,
        correction,
        submitted_at: now,
    });

    if correction {
        tracing::debug!(match_id = %sub.match_id, "Correction, recomputing all entrant stats");
        recompute_all(state);
    } else {
        apply_completed(&mut state.entrants, &state.matches[idx]);
    }

    let created = progress(state);
    state.touch(now);

    tracing::info!(
        match_id = %sub.match_id,
        home_goals = score.home_goals,
        away_goals = score.away_goals,
        correction,
        "Result recorded"
    );

    Ok(SubmitOutcome {
        match_id: sub.match_id.clone(),
        correction,
        created,
        stage: state.stage,
        last_update: state.last_update,
    })
}

/// Record a result, update entrant stats, and advance the bracket.
///
/// A first result is folded into the two participants' stats; a correction of
/// an already-completed match rebuilds every entrant from the match history.
/// On error the snapshot is left untouched.
pub fn submit_result(
    state: &mut TournamentState,
    sub: &ResultSubmission,
    now: DateTime<Utc>,
) -> Result<SubmitOutcome, EngineError> {
    let started = Instant::now();
    let result = apply_submission(state, sub, now);
    record_submission(sub, result.as_ref(), started);
    result
}

/// Count one finished submission. Called once per submission, after the
/// result is known to stick.
pub fn record_submission(
    sub: &ResultSubmission,
    result: Result<&SubmitOutcome, &EngineError>,
    started: Instant,
) {
    metrics::SUBMIT_DURATION_MS.observe(started.elapsed().as_secs_f64() * 1000.0);

    match result {
        Ok(outcome) => {
            let kind = if outcome.correction { "correction" } else { "new" };
            metrics::RESULTS_SUBMITTED_TOTAL.with_label_values(&[kind]).inc();
            for slot in &outcome.created {
                metrics::BRACKET_MATCHES_GENERATED_TOTAL
                    .with_label_values(&[metrics::bracket_label(*slot)])
                    .inc();
            }
            metrics::set_stage(outcome.stage);
        }
        Err(e) => {
            tracing::warn!(match_id = %sub.match_id, "Result rejected: {e}");
            metrics::RESULTS_REJECTED_TOTAL
                .with_label_values(&[e.reason()])
                .inc();
        }
    }
}

pub fn get_standings(state: &TournamentState, group: Group) -> Vec<StandingRow> {
    rank(state, group)
}

pub fn get_bracket(state: &TournamentState) -> Bracket {
    bracket_view(state)
}
