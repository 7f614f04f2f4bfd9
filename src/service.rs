// Tournament service: ties the engine to the snapshot store.
//
// Mutations are serialized in-process by a write lock. Writers in other
// processes are caught by the snapshot version check, in which case the
// submission is replayed against the fresh snapshot.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::bracket::Bracket;
use crate::db::{Database, Snapshot};
use crate::engine::{self, ResultSubmission, SubmitOutcome};
use crate::error::{ServiceError, StoreError};
use crate::metrics;
use crate::model::{Group, TournamentState};
use crate::standings::StandingRow;
use crate::tournament::{initial_state, TournamentSetup};

/// Attempts made when a concurrent writer bumps the snapshot version.
const MAX_SAVE_ATTEMPTS: usize = 3;

pub struct TournamentService {
    db: Arc<Database>,
    setup: TournamentSetup,
    write_lock: Mutex<()>,
}

impl TournamentService {
    pub fn new(db: Arc<Database>, setup: TournamentSetup) -> Self {
        Self {
            db,
            setup,
            write_lock: Mutex::new(()),
        }
    }

    /// Create the tournament snapshot from the setup unless one exists.
    pub async fn init(&self) -> Result<Snapshot, ServiceError> {
        let _guard = self.write_lock.lock().await;
        let state = initial_state(&self.setup, Utc::now())?;
        let snapshot = self.db.create_snapshot(&state).await?;
        metrics::set_stage(snapshot.state.stage);
        Ok(snapshot)
    }

    /// Discard every result and start over from the setup.
    pub async fn reset(&self) -> Result<Snapshot, ServiceError> {
        let _guard = self.write_lock.lock().await;
        let mut state = initial_state(&self.setup, Utc::now())?;
        if let Some(current) = self.db.load_snapshot().await? {
            // Keep polling clients moving forward across a reset.
            state.last_update = state.last_update.max(current.state.last_update + 1);
        }
        let snapshot = self.db.reset_snapshot(&state).await?;
        metrics::set_stage(snapshot.state.stage);
        tracing::warn!(version = snapshot.version, "Tournament reset");
        Ok(snapshot)
    }

    pub async fn submit_result(&self, sub: &ResultSubmission) -> Result<SubmitOutcome, ServiceError> {
        let _guard = self.write_lock.lock().await;

        let mut attempt = 1;
        loop {
            let Snapshot {
                version, mut state, ..
            } = self.current().await?;
            // Metrics are recorded once per submission, not once per attempt.
            let started = Instant::now();
            let outcome = match engine::apply_submission(&mut state, sub, Utc::now()) {
                Ok(outcome) => outcome,
                Err(e) => {
                    engine::record_submission(sub, Err(&e), started);
                    return Err(e.into());
                }
            };

            match self.db.save_snapshot(&state, version).await {
                Ok(_) => {
                    engine::record_submission(sub, Ok(&outcome), started);
                    return Ok(outcome);
                }
                Err(StoreError::VersionConflict { expected }) if attempt < MAX_SAVE_ATTEMPTS => {
                    metrics::SNAPSHOT_CONFLICTS_TOTAL
                        .with_label_values(&["submit"])
                        .inc();
                    tracing::warn!(expected, attempt, "Snapshot changed underneath submission, retrying");
                    attempt += 1;
                }
                Err(e) => {
                    if matches!(e, StoreError::VersionConflict { .. }) {
                        metrics::SNAPSHOT_CONFLICTS_TOTAL
                            .with_label_values(&["submit"])
                            .inc();
                    }
                    return Err(e.into());
                }
            }
        }
    }

    pub async fn standings(&self, group: Group) -> Result<Vec<StandingRow>, ServiceError> {
        let snapshot = self.current().await?;
        Ok(engine::get_standings(&snapshot.state, group))
    }

    pub async fn bracket(&self) -> Result<Bracket, ServiceError> {
        let snapshot = self.current().await?;
        Ok(engine::get_bracket(&snapshot.state))
    }

    /// The full tournament state, for clients that poll `last_update`.
    pub async fn snapshot(&self) -> Result<TournamentState, ServiceError> {
        Ok(self.current().await?.state)
    }

    async fn current(&self) -> Result<Snapshot, ServiceError> {
        Ok(self.db.load_snapshot().await?.ok_or(StoreError::Missing)?)
    }
}
