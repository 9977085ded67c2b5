//! Scenario projection
//!
//! This module enumerates outcomes of pending fixtures, ranks the resulting
//! snapshots and aggregates the focal entity's rank distribution.

pub mod aggregate;
pub mod probability;
pub mod rank;
pub mod scenario;

// Re-export commonly used types
pub use aggregate::{Movement, RankAggregate, RankProbability, ScenarioMark};
pub use probability::{DrawProbabilityRule, OutcomeProbabilities};
pub use rank::{PoolFilter, RankProjector, Reach, Standing};
pub use scenario::{
    scenario_count, EntityReach, EnumerationMode, EvaluationMode, FixtureOutcome, OutcomeSpace,
    PendingFixture, Projection, ProjectionRequest, ScenarioEnumerator, ScenarioOutcome,
    ScenarioReport,
};

use crate::rating::calculator::MatchModel;
use crate::rating::store::RatingSnapshot;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::warn;

/// Run a projection on the blocking pool, cancelling it once `deadline` passes.
///
/// A cancelled projection still resolves to a valid partial aggregate with
/// `cancelled` set.
pub async fn run_with_timeout<M>(
    enumerator: Arc<ScenarioEnumerator<M>>,
    snapshot: RatingSnapshot,
    pending: Vec<PendingFixture>,
    request: ProjectionRequest,
    deadline: Duration,
) -> anyhow::Result<Projection>
where
    M: MatchModel + 'static,
{
    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);

    let mut task = tokio::task::spawn_blocking(move || {
        enumerator.project_with_cancel(&snapshot, &pending, &request, &flag)
    });

    tokio::select! {
        joined = &mut task => Ok(joined??),
        _ = sleep(deadline) => {
            warn!("Projection deadline of {:?} reached, cancelling", deadline);
            cancel.store(true, Ordering::Relaxed);
            Ok(task.await??)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::types::{CompetitionClass, Entity, Fixture};
    use chrono::NaiveDate;

    fn inputs() -> (RatingSnapshot, Vec<PendingFixture>) {
        let snapshot = RatingSnapshot::from_entities(vec![
            Entity::new("SCO", "Scotland", 1500.0),
            Entity::new("DEN", "Denmark", 1620.0),
            Entity::new("GRE", "Greece", 1480.0),
            Entity::new("BLR", "Belarus", 1300.0),
        ])
        .unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 11, 15).unwrap();
        let pending = vec![
            PendingFixture::new(Fixture::scheduled(
                "f1",
                date,
                "GRE",
                "SCO",
                CompetitionClass::WorldCupQualifier,
            )),
            PendingFixture::new(Fixture::scheduled(
                "f2",
                date,
                "DEN",
                "BLR",
                CompetitionClass::WorldCupQualifier,
            )),
        ];

        (snapshot, pending)
    }

    #[tokio::test]
    async fn test_run_with_timeout_completes() {
        let (snapshot, pending) = inputs();
        let enumerator = Arc::new(ScenarioEnumerator::from_config(&EngineConfig::default()).unwrap());

        let projection = run_with_timeout(
            enumerator,
            snapshot,
            pending,
            ProjectionRequest::new("SCO"),
            Duration::from_secs(30),
        )
        .await
        .unwrap();

        assert!(!projection.cancelled);
        assert_eq!(projection.scenarios_evaluated, 9);
    }

    #[tokio::test]
    async fn test_run_with_timeout_cancels() {
        let (snapshot, pending) = inputs();
        let enumerator = Arc::new(ScenarioEnumerator::from_config(&EngineConfig::default()).unwrap());
        let request = ProjectionRequest::new("SCO").sampled(5_000_000).with_seed(1);

        let projection = run_with_timeout(
            enumerator,
            snapshot,
            pending,
            request,
            Duration::from_millis(1),
        )
        .await
        .unwrap();

        assert!(projection.cancelled);
        assert!(projection.scenarios_evaluated >= 1);
        assert!(projection.scenarios_evaluated < 5_000_000);
    }

    #[tokio::test]
    async fn test_run_with_timeout_surfaces_errors() {
        let (snapshot, pending) = inputs();
        let enumerator = Arc::new(ScenarioEnumerator::from_config(&EngineConfig::default()).unwrap());

        let err = run_with_timeout(
            enumerator,
            snapshot,
            pending,
            ProjectionRequest::new("SCO").sampled(10),
            Duration::from_secs(30),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("seed"));
    }
}
