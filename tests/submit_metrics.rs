// Metrics accounting when two writers share one snapshot store and their saves
// race on the version counter. Kept in its own test binary so the global
// counters are not touched by other tests.

use std::sync::Arc;

use battlezone_engine::db::Database;
use battlezone_engine::engine::ResultSubmission;
use battlezone_engine::metrics::{RESULTS_SUBMITTED_TOTAL, SNAPSHOT_CONFLICTS_TOTAL};
use battlezone_engine::service::TournamentService;
use battlezone_engine::tournament::TournamentSetup;

#[tokio::test]
async fn test_each_submission_counted_once_across_conflicts() {
    let db = Arc::new(Database::new("sqlite::memory:").await.unwrap());
    // Separate write locks: only the snapshot version keeps these two apart.
    let left = TournamentService::new(db.clone(), TournamentSetup::season_one());
    let right = TournamentService::new(db.clone(), TournamentSetup::season_one());
    left.init().await.unwrap();

    let submitted_before = RESULTS_SUBMITTED_TOTAL.with_label_values(&["new"]).get();
    let conflicts_before = SNAPSHOT_CONFLICTS_TOTAL.with_label_values(&["submit"]).get();

    let pairs = [("ga1", "gb1"), ("ga2", "gb2"), ("ga3", "gb3"), ("ga4", "gb4")];
    let mut landed = 0;
    for (a, b) in pairs {
        let sa = ResultSubmission::new(a, 1, 0);
        let sb = ResultSubmission::new(b, 2, 1);
        let (ra, rb) = tokio::join!(left.submit_result(&sa), right.submit_result(&sb));
        landed += usize::from(ra.is_ok()) + usize::from(rb.is_ok());
    }

    let state = left.snapshot().await.unwrap();
    assert_eq!(state.results.len(), landed);
    assert_eq!(
        RESULTS_SUBMITTED_TOTAL.with_label_values(&["new"]).get() - submitted_before,
        landed as u64
    );
    // A retry re-reads after the other writer's save, so nothing is lost.
    assert_eq!(landed, 2 * pairs.len());
    let conflicts = SNAPSHOT_CONFLICTS_TOTAL.with_label_values(&["submit"]).get() - conflicts_before;
    // At most the loser of each race has to retry.
    assert!(conflicts <= pairs.len() as u64);
}
