//! Integration tests for the scenario-ranker engine
//!
//! These tests drive the public API end to end:
//! - Loading a dataset and applying completed fixtures in order
//! - Projecting a focal team over pending fixtures
//! - Pool filtering, goal-margin outcome spaces and sampling
//! - Error classification at the engine boundary

mod fixtures;

use scenario_ranker::config::{AppConfig, EngineConfig};
use scenario_ranker::projection::{
    EvaluationMode, PendingFixture, PoolFilter, ProjectionRequest, RankProjector,
    ScenarioEnumerator,
};
use scenario_ranker::rating::SequentialUpdater;
use scenario_ranker::{Dataset, ErrorKind, RankingError};

use fixtures::{
    group_snapshot, played, remaining_group_fixtures, scheduled, seeded_config, DATASET_JSON,
};

#[test]
fn test_dataset_apply_then_project() {
    let dataset = Dataset::from_json_str(DATASET_JSON).unwrap();
    let updater = SequentialUpdater::from_config(&EngineConfig::default()).unwrap();

    let outcome = updater
        .apply(&dataset.baseline().unwrap(), &dataset.completed())
        .unwrap();

    let applied: Vec<&str> = outcome.deltas.iter().map(|d| d.fixture_id.as_str()).collect();
    assert_eq!(applied, vec!["wcq-1", "wcq-2", "fr-1"]);
    assert_eq!(outcome.snapshot.version(), 3);

    // Scotland beat Belarus at home, then carried the new rating to Copenhagen
    assert_eq!(outcome.deltas[0].home_delta, 0.69);
    assert!((outcome.deltas[0].home_after - 1504.89).abs() < 1e-9);
    assert_eq!(outcome.deltas[1].away_before, outcome.deltas[0].home_after);

    // Neutral friendly: no home bonus
    let friendly = &outcome.deltas[2];
    let reference = 1.0 / (1.0 + 10f64.powf(-(1641.4 - 1495.6) / 400.0));
    assert!((friendly.expected_home - reference).abs() < 1e-12);
    assert!(friendly.away_delta > 0.0);

    let enumerator = ScenarioEnumerator::from_config(&seeded_config()).unwrap();
    let pending: Vec<PendingFixture> = dataset.pending().into_iter().map(PendingFixture::new).collect();
    let projection = enumerator
        .project(&outcome.snapshot, &pending, &ProjectionRequest::new("SCO"))
        .unwrap();

    assert_eq!(projection.mode, EvaluationMode::Exhaustive { scenarios: 9 });
    assert!((projection.total_weight - 1.0).abs() < 1e-9);
    assert!(projection.min_rank as f64 <= projection.expected_rank);
    assert!(projection.expected_rank <= projection.max_rank as f64);
    assert_eq!(projection.expected_ratings.len(), 5);
}

#[test]
fn test_confederation_pool_projection() {
    let snapshot = group_snapshot();
    let uefa = PoolFilter::Confederation("UEFA".to_string());

    assert_eq!(RankProjector::default().rank_of(&snapshot, "SCO").unwrap(), 5);
    assert_eq!(RankProjector::new(uefa.clone()).rank_of(&snapshot, "SCO").unwrap(), 3);

    let enumerator = ScenarioEnumerator::from_config(&seeded_config()).unwrap();
    let projection = enumerator
        .project(
            &snapshot,
            &remaining_group_fixtures(),
            &ProjectionRequest::new("SCO").with_pool(uefa),
        )
        .unwrap();

    assert_eq!(projection.baseline_rank, 3);
    assert_eq!(projection.scenarios_evaluated, 81);
    assert_eq!(projection.rivals.len(), 4);
    assert!(!projection.expected_ratings.contains_key("JPN"));
    assert!(!projection.expected_ratings.contains_key("MAR"));

    // Two results cannot lift Scotland past Denmark or Austria, but Greece
    // overtakes with a home win
    assert!(projection.catchable.is_empty());
    assert_eq!(projection.threats, vec!["GRE".to_string()]);

    let total: f64 = projection.rank_distribution.iter().map(|r| r.probability).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn test_margin_buckets_refine_without_shifting_ranks() {
    let snapshot = group_snapshot();
    let enumerator = ScenarioEnumerator::from_config(&seeded_config()).unwrap();
    let request = ProjectionRequest::new("SCO");

    let plain = enumerator
        .project(&snapshot, &remaining_group_fixtures(), &request)
        .unwrap();

    let margins: Vec<PendingFixture> = remaining_group_fixtures()
        .into_iter()
        .map(|p| p.with_margins(2))
        .collect();
    let refined = enumerator.project(&snapshot, &margins, &request).unwrap();

    assert_eq!(refined.mode, EvaluationMode::Exhaustive { scenarios: 625 });
    assert!((refined.total_weight - 1.0).abs() < 1e-9);
    assert_eq!(refined.min_rank, plain.min_rank);
    assert_eq!(refined.max_rank, plain.max_rank);
    assert!((refined.expected_rank - plain.expected_rank).abs() < 1e-9);
    assert!((refined.expected_rating - plain.expected_rating).abs() < 1e-6);
}

#[test]
fn test_sampling_tracks_exhaustive_expectation() {
    let snapshot = group_snapshot();
    let enumerator = ScenarioEnumerator::from_config(&seeded_config()).unwrap();

    let exhaustive = enumerator
        .project(&snapshot, &remaining_group_fixtures(), &ProjectionRequest::new("SCO"))
        .unwrap();
    let sampled = enumerator
        .project(
            &snapshot,
            &remaining_group_fixtures(),
            &ProjectionRequest::new("SCO").sampled(20_000).with_seed(99),
        )
        .unwrap();

    assert_eq!(
        sampled.mode,
        EvaluationMode::Sampled {
            samples: 20_000,
            seed: 99,
            space: Some(81),
            fallback: false,
        }
    );
    assert!(sampled.min_rank >= exhaustive.min_rank);
    assert!(sampled.max_rank <= exhaustive.max_rank);
    assert!((sampled.expected_rank - exhaustive.expected_rank).abs() < 0.2);

    // Same seed, same answer
    let again = enumerator
        .project(
            &snapshot,
            &remaining_group_fixtures(),
            &ProjectionRequest::new("SCO").sampled(20_000).with_seed(99),
        )
        .unwrap();
    assert_eq!(again.expected_rank, sampled.expected_rank);
    assert_eq!(again.best_scenario, sampled.best_scenario);
}

#[test]
fn test_capacity_fallback_reports_effective_sample_size() {
    let mut config = seeded_config();
    config.exhaustive_scenario_ceiling = 50;
    config.sample_count = 500;
    let enumerator = ScenarioEnumerator::from_config(&config).unwrap();

    let projection = enumerator
        .project(&group_snapshot(), &remaining_group_fixtures(), &ProjectionRequest::new("SCO"))
        .unwrap();

    assert!(projection.mode.is_fallback());
    assert!(!projection.mode.is_exhaustive());
    assert_eq!(projection.scenarios_evaluated, 500);
}

#[test]
fn test_invalid_batch_produces_no_snapshot() {
    let snapshot = group_snapshot();
    let updater = SequentialUpdater::from_config(&EngineConfig::default()).unwrap();

    let batch = vec![
        played("wcq-5", 11, 15, "GRE", "SCO", (1, 2)),
        played("wcq-6", 11, 15, "DEN", "ENG", (3, 0)),
    ];
    let err = updater.apply(&snapshot, &batch).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataIntegrity);

    let pending = vec![scheduled("wcq-7", 11, 18, "SCO", "DEN")];
    let err = updater.apply(&snapshot, &pending).unwrap_err();
    assert_eq!(
        err,
        RankingError::MissingResult {
            fixture_id: "wcq-7".to_string()
        }
    );
}

#[test]
fn test_configuration_errors_precede_evaluation() {
    let mut config = EngineConfig::default();
    config.draw_probability_rule =
        scenario_ranker::projection::DrawProbabilityRule::FixedFraction { draw: 1.5 };
    let err = ScenarioEnumerator::from_config(&config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let enumerator = ScenarioEnumerator::from_config(&EngineConfig::default()).unwrap();
    let err = enumerator
        .project(
            &group_snapshot(),
            &remaining_group_fixtures(),
            &ProjectionRequest::new("SCO").sampled(100),
        )
        .unwrap_err();
    assert_eq!(err, RankingError::MissingSeed);
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_projection_serializes_for_report_consumers() {
    let enumerator = ScenarioEnumerator::from_config(&seeded_config()).unwrap();
    let projection = enumerator
        .project(&group_snapshot(), &remaining_group_fixtures(), &ProjectionRequest::new("SCO"))
        .unwrap();

    let json = serde_json::to_value(&projection).unwrap();
    assert_eq!(json["mode"]["mode"], "exhaustive");
    assert_eq!(json["mode"]["scenarios"], 81);
    assert_eq!(json["focal_id"], "SCO");
    assert!(json["run_id"].is_string());
    assert!(json["best_scenario"]["outcomes"].is_array());
}

#[test]
fn test_app_config_from_toml_file() {
    let path = std::env::temp_dir().join(format!("scenario-ranker-{}.toml", uuid::Uuid::new_v4()));
    std::fs::write(
        &path,
        r#"
[service]
log_level = "debug"

[engine]
home_advantage_bonus = 80.0
exhaustive_scenario_ceiling = 500
sampling_seed = 11

[engine.importance]
world_cup_qualifier = 30.0
nations_league = 15.0
friendly = 10.0
regional_championship = 20.0
friendly_outside_window = 5.0
nations_league_finals = 25.0
world_cup_finals = 50.0
"#,
    )
    .unwrap();

    let config = AppConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.service.log_level, "debug");
    assert_eq!(config.engine.home_advantage_bonus, 80.0);
    assert_eq!(config.engine.exhaustive_scenario_ceiling, 500);
    assert_eq!(config.engine.sampling_seed, Some(11));
    assert!(ScenarioEnumerator::from_config(&config.engine).is_ok());
}
