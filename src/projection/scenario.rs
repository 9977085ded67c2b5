//! Scenario enumeration over pending fixtures
//!
//! Every pending fixture has a discrete outcome space. A scenario assigns one
//! outcome to each fixture; the enumerator runs each scenario through the
//! sequential update engine on a private working copy of the snapshot, ranks
//! the result and folds it into a [`RankAggregate`].
//!
//! Scenario `i` is either decoded from `i` as a mixed-radix number (exhaustive
//! mode, first fixture most significant) or drawn uniformly from an RNG
//! seeded by `(seed, i)` (sampled mode). Either way a scenario depends only
//! on its index, so the worker count never changes the outcome.

use crate::config::EngineConfig;
use crate::error::{RankingError, Result};
use crate::projection::aggregate::{Movement, RankAggregate, RankProbability, ScenarioMark};
use crate::projection::probability::{DrawProbabilityRule, OutcomeProbabilities};
use crate::projection::rank::{PoolFilter, RankProjector};
use crate::rating::calculator::MatchModel;
use crate::rating::elo::EloMatchModel;
use crate::rating::sequential::SequentialUpdater;
use crate::rating::store::RatingSnapshot;
use crate::types::{EntityId, Fixture, FixtureId, MatchResult};
use crate::utils::{current_timestamp, generate_run_id};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Spreads per-scenario seeds across the RNG seed space
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Scenarios per evaluation chunk
const SCENARIO_CHUNK: u64 = 256;

/// Discrete outcomes considered for one pending fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeSpace {
    /// Home win, draw, away win
    #[default]
    WinDrawLoss,
    /// Wins split into goal-margin buckets `1..=max_margin` per side
    Margins { max_margin: u32 },
}

impl OutcomeSpace {
    /// Number of win buckets per side
    pub fn margin_buckets(&self) -> u32 {
        match self {
            OutcomeSpace::WinDrawLoss => 1,
            OutcomeSpace::Margins { max_margin } => *max_margin,
        }
    }

    pub fn outcome_count(&self) -> usize {
        2 * self.margin_buckets() as usize + 1
    }

    /// Outcomes in enumeration order: home wins by rising margin, the draw,
    /// then away wins by rising margin
    pub fn outcomes(&self) -> Vec<ScenarioOutcome> {
        let buckets = self.margin_buckets();
        (1..=buckets)
            .map(|margin| ScenarioOutcome::HomeWin { margin })
            .chain(std::iter::once(ScenarioOutcome::Draw))
            .chain((1..=buckets).map(|margin| ScenarioOutcome::AwayWin { margin }))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.margin_buckets() == 0 {
            return Err(RankingError::ConfigurationError {
                message: "Goal-margin outcome space needs at least one bucket".to_string(),
            });
        }
        Ok(())
    }
}

/// One outcome of a pending fixture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScenarioOutcome {
    HomeWin { margin: u32 },
    Draw,
    AwayWin { margin: u32 },
}

impl ScenarioOutcome {
    /// Scoreline standing in for this outcome: the winner scores the margin,
    /// a draw is 0-0
    pub fn representative_result(&self) -> MatchResult {
        match self {
            ScenarioOutcome::HomeWin { margin } => MatchResult::new(*margin, 0),
            ScenarioOutcome::Draw => MatchResult::new(0, 0),
            ScenarioOutcome::AwayWin { margin } => MatchResult::new(0, *margin),
        }
    }

    /// Probability of this outcome; a side's win probability is shared
    /// equally between its margin buckets
    pub fn probability(&self, split: &OutcomeProbabilities, buckets: u32) -> f64 {
        match self {
            ScenarioOutcome::HomeWin { .. } => split.home_win / buckets as f64,
            ScenarioOutcome::Draw => split.draw,
            ScenarioOutcome::AwayWin { .. } => split.away_win / buckets as f64,
        }
    }
}

/// A scheduled fixture together with the outcomes to consider for it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingFixture {
    pub fixture: Fixture,
    #[serde(default)]
    pub space: OutcomeSpace,
}

impl PendingFixture {
    pub fn new(fixture: Fixture) -> Self {
        Self {
            fixture,
            space: OutcomeSpace::WinDrawLoss,
        }
    }

    pub fn with_margins(mut self, max_margin: u32) -> Self {
        self.space = OutcomeSpace::Margins { max_margin };
        self
    }
}

/// Requested enumeration strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum EnumerationMode {
    #[default]
    Exhaustive,
    Sampled { samples: u64 },
}

/// Strategy actually used for a projection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EvaluationMode {
    Exhaustive {
        scenarios: u64,
    },
    Sampled {
        samples: u64,
        seed: u64,
        /// Size of the full scenario space, if it fits in a u64
        space: Option<u64>,
        /// Exhaustive evaluation was requested but exceeded the ceiling
        fallback: bool,
    },
}

impl EvaluationMode {
    /// Number of scenarios to evaluate
    pub fn scenario_total(&self) -> u64 {
        match self {
            EvaluationMode::Exhaustive { scenarios } => *scenarios,
            EvaluationMode::Sampled { samples, .. } => *samples,
        }
    }

    pub fn is_exhaustive(&self) -> bool {
        matches!(self, EvaluationMode::Exhaustive { .. })
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, EvaluationMode::Sampled { fallback: true, .. })
    }
}

/// What to project and how
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRequest {
    pub focal_id: EntityId,
    #[serde(default)]
    pub pool: PoolFilter,
    #[serde(default)]
    pub mode: EnumerationMode,
    /// Overrides the configured sampling seed
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ProjectionRequest {
    pub fn new(focal_id: impl Into<EntityId>) -> Self {
        Self {
            focal_id: focal_id.into(),
            pool: PoolFilter::All,
            mode: EnumerationMode::Exhaustive,
            seed: None,
        }
    }

    pub fn with_pool(mut self, pool: PoolFilter) -> Self {
        self.pool = pool;
        self
    }

    pub fn sampled(mut self, samples: u64) -> Self {
        self.mode = EnumerationMode::Sampled { samples };
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Outcome assigned to one fixture within a reported scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureOutcome {
    pub fixture_id: FixtureId,
    pub home_id: EntityId,
    pub away_id: EntityId,
    pub outcome: ScenarioOutcome,
    pub result: MatchResult,
}

/// A single retained scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub index: u64,
    pub weight: f64,
    pub focal_rank: usize,
    pub focal_rating: f64,
    pub outcomes: Vec<FixtureOutcome>,
}

/// How another pool member relates to the focal entity across scenarios
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityReach {
    pub entity_id: EntityId,
    pub display_name: String,
    pub baseline_rank: usize,
    pub baseline_rating: f64,
    pub expected_rating: f64,
    /// Ranked above the focal entity in at least one scenario
    pub can_finish_above: bool,
    /// Ranked below the focal entity in at least one scenario
    pub can_finish_below: bool,
}

/// Aggregated result of projecting a focal entity over pending fixtures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projection {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub focal_id: EntityId,
    pub pool: PoolFilter,
    pub mode: EvaluationMode,
    pub scenarios_evaluated: u64,
    /// Evaluation stopped early; statistics cover the evaluated scenarios only
    pub cancelled: bool,
    pub total_weight: f64,
    pub baseline_rank: usize,
    pub baseline_rating: f64,
    pub min_rank: usize,
    pub max_rank: usize,
    pub expected_rank: f64,
    pub min_rating: f64,
    pub max_rating: f64,
    pub expected_rating: f64,
    pub rank_distribution: Vec<RankProbability>,
    pub movement: Movement,
    pub best_scenario: Option<ScenarioReport>,
    pub worst_scenario: Option<ScenarioReport>,
    /// Every other pool member, in baseline rank order
    pub rivals: Vec<EntityReach>,
    /// Ranked above at baseline, finished below in some scenario
    pub catchable: Vec<EntityId>,
    /// Ranked below at baseline, finished above in some scenario
    pub threats: Vec<EntityId>,
    /// Probability-weighted expected rating of every pool member
    pub expected_ratings: BTreeMap<EntityId, f64>,
}

/// Pending fixtures in application order with their outcome lists
struct ScenarioSpace {
    fixtures: Vec<PendingFixture>,
    outcomes: Vec<Vec<ScenarioOutcome>>,
}

impl ScenarioSpace {
    fn new(fixtures: Vec<PendingFixture>) -> Self {
        let outcomes = fixtures.iter().map(|p| p.space.outcomes()).collect();
        Self { fixtures, outcomes }
    }

    /// Fill `digits` with the outcome index of every fixture for scenario `index`
    fn select(&self, mode: &EvaluationMode, index: u64, digits: &mut [usize]) {
        match mode {
            EvaluationMode::Exhaustive { .. } => {
                let mut rest = index;
                for (digit, choices) in digits.iter_mut().zip(&self.outcomes).rev() {
                    let radix = choices.len() as u64;
                    *digit = (rest % radix) as usize;
                    rest /= radix;
                }
            }
            EvaluationMode::Sampled { seed, .. } => {
                let mut rng =
                    StdRng::seed_from_u64(seed.wrapping_add(index.wrapping_mul(SEED_STRIDE)));
                for (digit, choices) in digits.iter_mut().zip(&self.outcomes) {
                    *digit = rng.random_range(0..choices.len());
                }
            }
        }
    }

    fn describe(&self, digits: &[usize]) -> Vec<FixtureOutcome> {
        self.fixtures
            .iter()
            .zip(&self.outcomes)
            .zip(digits)
            .map(|((pending, choices), digit)| {
                let outcome = choices[*digit];
                FixtureOutcome {
                    fixture_id: pending.fixture.id.clone(),
                    home_id: pending.fixture.home_id.clone(),
                    away_id: pending.fixture.away_id.clone(),
                    outcome,
                    result: outcome.representative_result(),
                }
            })
            .collect()
    }
}

/// Size of the full scenario space, or `None` if it overflows a u64
pub fn scenario_count(pending: &[PendingFixture]) -> Option<u64> {
    pending.iter().try_fold(1u64, |total, p| {
        total.checked_mul(p.space.outcome_count() as u64)
    })
}

/// Split `0..total` into contiguous chunks of at most [`SCENARIO_CHUNK`]
fn scenario_chunks(total: u64) -> Vec<Range<u64>> {
    (0..total.div_ceil(SCENARIO_CHUNK))
        .map(|c| c * SCENARIO_CHUNK..((c + 1) * SCENARIO_CHUNK).min(total))
        .collect()
}

/// Enumerates or samples scenarios and aggregates the focal entity's rank
#[derive(Debug, Clone)]
pub struct ScenarioEnumerator<M: MatchModel> {
    updater: SequentialUpdater<M>,
    draw_rule: DrawProbabilityRule,
    exhaustive_ceiling: u64,
    sample_count: u64,
    default_seed: Option<u64>,
    workers: usize,
}

impl ScenarioEnumerator<EloMatchModel> {
    /// Build an Elo-backed enumerator from engine configuration
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Self::new(SequentialUpdater::from_config(config)?, config)
    }
}

impl<M: MatchModel> ScenarioEnumerator<M> {
    pub fn new(updater: SequentialUpdater<M>, config: &EngineConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            updater,
            draw_rule: config.draw_probability_rule,
            exhaustive_ceiling: config.exhaustive_scenario_ceiling,
            sample_count: config.sample_count,
            default_seed: config.sampling_seed,
            workers: config.workers,
        })
    }

    pub fn updater(&self) -> &SequentialUpdater<M> {
        &self.updater
    }

    /// Decide how a request over `pending` will be evaluated.
    ///
    /// Exhaustive requests beyond the ceiling fall back to sampling with the
    /// configured sample count. Sampling of either kind needs a seed.
    pub fn plan(
        &self,
        pending: &[PendingFixture],
        mode: EnumerationMode,
        seed: Option<u64>,
    ) -> Result<EvaluationMode> {
        let space = scenario_count(pending);
        let seed = seed.or(self.default_seed);

        match mode {
            EnumerationMode::Exhaustive => match space {
                Some(scenarios) if scenarios <= self.exhaustive_ceiling => {
                    Ok(EvaluationMode::Exhaustive { scenarios })
                }
                _ => {
                    let seed = seed.ok_or(RankingError::MissingSeed)?;
                    warn!(
                        "Scenario space {} exceeds exhaustive ceiling {}, sampling {} scenarios instead",
                        space.map_or_else(|| "overflow".to_string(), |s| s.to_string()),
                        self.exhaustive_ceiling,
                        self.sample_count
                    );
                    Ok(EvaluationMode::Sampled {
                        samples: self.sample_count,
                        seed,
                        space,
                        fallback: true,
                    })
                }
            },
            EnumerationMode::Sampled { samples } => {
                if samples == 0 {
                    return Err(RankingError::ConfigurationError {
                        message: "Sample count must be greater than 0".to_string(),
                    });
                }
                let seed = seed.ok_or(RankingError::MissingSeed)?;
                Ok(EvaluationMode::Sampled {
                    samples,
                    seed,
                    space,
                    fallback: false,
                })
            }
        }
    }

    /// Project the focal entity's rank over every scenario of `pending`
    pub fn project(
        &self,
        snapshot: &RatingSnapshot,
        pending: &[PendingFixture],
        request: &ProjectionRequest,
    ) -> Result<Projection> {
        self.project_with_cancel(snapshot, pending, request, &AtomicBool::new(false))
    }

    /// Like [`project`](Self::project), but stops once `cancel` is raised.
    ///
    /// The flag is read after each completed scenario, so every worker
    /// evaluates at least one scenario and the partial aggregate is valid.
    pub fn project_with_cancel(
        &self,
        snapshot: &RatingSnapshot,
        pending: &[PendingFixture],
        request: &ProjectionRequest,
        cancel: &AtomicBool,
    ) -> Result<Projection> {
        for p in pending {
            self.check_pending(snapshot, p)?;
        }

        let projector = RankProjector::new(request.pool.clone());
        let pool = projector.pool_members(snapshot);
        let focal = pool
            .iter()
            .position(|id| *id == request.focal_id)
            .ok_or_else(|| RankingError::EntityNotInPool {
                entity_id: request.focal_id.clone(),
            })?;
        let baseline = projector.standings(snapshot);
        let baseline_rank = projector.rank_of(snapshot, &request.focal_id)?;
        let baseline_rating = snapshot.rating(&request.focal_id).unwrap_or_default();

        // Chronological order; the sort is stable so same-day fixtures keep
        // the order they were given in
        let mut ordered = pending.to_vec();
        ordered.sort_by_key(|p| p.fixture.date);

        let mode = self.plan(&ordered, request.mode, request.seed)?;
        info!(
            "Projecting {} over {} pending fixtures: {:?}",
            request.focal_id,
            ordered.len(),
            mode
        );

        let space = ScenarioSpace::new(ordered);
        let (aggregate, cancelled) =
            self.evaluate_all(&space, snapshot, &pool, focal, &mode, cancel)?;

        if cancelled {
            warn!(
                "Projection cancelled after {} of {} scenarios",
                aggregate.scenarios(),
                mode.scenario_total()
            );
        }

        let mut rivals = Vec::with_capacity(pool.len().saturating_sub(1));
        let mut expected_ratings = BTreeMap::new();
        for standing in &baseline {
            let Some(index) = pool.iter().position(|id| *id == standing.entity_id) else {
                continue;
            };
            let expected = aggregate
                .expected_rating_of(index)
                .unwrap_or(standing.rating);
            expected_ratings.insert(standing.entity_id.clone(), expected);

            if index == focal {
                continue;
            }
            rivals.push(EntityReach {
                entity_id: standing.entity_id.clone(),
                display_name: standing.display_name.clone(),
                baseline_rank: standing.rank,
                baseline_rating: standing.rating,
                expected_rating: expected,
                can_finish_above: aggregate.finished_above(index),
                can_finish_below: aggregate.finished_below(index),
            });
        }

        let catchable = rivals
            .iter()
            .filter(|r| r.baseline_rank < baseline_rank && r.can_finish_below)
            .map(|r| r.entity_id.clone())
            .collect();
        let threats = rivals
            .iter()
            .filter(|r| r.baseline_rank > baseline_rank && r.can_finish_above)
            .map(|r| r.entity_id.clone())
            .collect();

        Ok(Projection {
            run_id: generate_run_id(),
            generated_at: current_timestamp(),
            focal_id: request.focal_id.clone(),
            pool: request.pool.clone(),
            mode,
            scenarios_evaluated: aggregate.scenarios(),
            cancelled,
            total_weight: aggregate.total_weight(),
            baseline_rank,
            baseline_rating,
            min_rank: aggregate.min_rank().unwrap_or(baseline_rank),
            max_rank: aggregate.max_rank().unwrap_or(baseline_rank),
            expected_rank: aggregate.expected_rank().unwrap_or(baseline_rank as f64),
            min_rating: aggregate.min_rating().unwrap_or(baseline_rating),
            max_rating: aggregate.max_rating().unwrap_or(baseline_rating),
            expected_rating: aggregate.expected_rating().unwrap_or(baseline_rating),
            rank_distribution: aggregate.rank_distribution(),
            movement: aggregate.movement(baseline_rank),
            best_scenario: aggregate.best().map(|mark| self.report(&space, &mode, mark)),
            worst_scenario: aggregate.worst().map(|mark| self.report(&space, &mode, mark)),
            rivals,
            catchable,
            threats,
            expected_ratings,
        })
    }

    fn check_pending(&self, snapshot: &RatingSnapshot, pending: &PendingFixture) -> Result<()> {
        let fixture = &pending.fixture;
        if fixture.is_completed() {
            return Err(RankingError::ResultAlreadyRecorded {
                fixture_id: fixture.id.clone(),
            });
        }

        pending.space.validate()?;
        fixture.validate_shape()?;
        self.updater.check_participants(snapshot, fixture)?;
        self.updater.importance(fixture.competition_class)?;
        Ok(())
    }

    /// Evaluate every scenario in fixed-size chunks.
    ///
    /// Chunk boundaries and merge order never depend on the worker count, so
    /// the floating-point reduction is the same for one worker or many.
    fn evaluate_all(
        &self,
        space: &ScenarioSpace,
        snapshot: &RatingSnapshot,
        pool: &[EntityId],
        focal: usize,
        mode: &EvaluationMode,
        cancel: &AtomicBool,
    ) -> Result<(RankAggregate, bool)> {
        let total = mode.scenario_total();
        let ranges = scenario_chunks(total);
        let workers = self.workers.clamp(1, ranges.len().max(1));

        let run = |range: Range<u64>| self.evaluate_range(space, snapshot, pool, focal, mode, range, cancel);

        let partials: Vec<Result<(RankAggregate, bool)>> = if workers == 1 {
            ranges.into_iter().map(run).collect()
        } else {
            debug!(
                "Evaluating {} scenarios in {} chunks on {} workers",
                total,
                ranges.len(),
                workers
            );

            let threads = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .build()
                .map_err(|e| RankingError::ConfigurationError {
                    message: format!("Failed to start scenario workers: {}", e),
                })?;

            threads.install(|| ranges.into_par_iter().map(run).collect())
        };

        let mut merged = RankAggregate::new(pool.len(), focal);
        let mut cancelled = false;
        for partial in partials {
            let (aggregate, stopped) = partial?;
            merged = merged.merge(aggregate);
            cancelled |= stopped;
        }

        Ok((merged, cancelled))
    }

    /// Evaluate one chunk of scenario indices.
    ///
    /// The cancel flag is checked between scenarios. Scenario 0 always runs,
    /// so a cancelled projection still carries at least one scenario.
    #[allow(clippy::too_many_arguments)]
    fn evaluate_range(
        &self,
        space: &ScenarioSpace,
        snapshot: &RatingSnapshot,
        pool: &[EntityId],
        focal: usize,
        mode: &EvaluationMode,
        range: Range<u64>,
        cancel: &AtomicBool,
    ) -> Result<(RankAggregate, bool)> {
        let mut aggregate = RankAggregate::new(pool.len(), focal);
        let mut digits = vec![0usize; space.fixtures.len()];
        let mut ratings = vec![0.0; pool.len()];

        for index in range {
            if index > 0 && cancel.load(Ordering::Relaxed) {
                return Ok((aggregate, true));
            }

            space.select(mode, index, &mut digits);
            let weight = self.evaluate(space, snapshot, pool, &digits, &mut ratings)?;
            aggregate.record(index, weight, &ratings);
        }

        Ok((aggregate, false))
    }

    /// Run one scenario on a private working copy; fills `ratings` with the
    /// final pool ratings and returns the scenario's probability weight
    fn evaluate(
        &self,
        space: &ScenarioSpace,
        snapshot: &RatingSnapshot,
        pool: &[EntityId],
        digits: &[usize],
        ratings: &mut [f64],
    ) -> Result<f64> {
        let mut working = snapshot.to_builder();
        let mut weight = 1.0;

        for ((pending, choices), digit) in space.fixtures.iter().zip(&space.outcomes).zip(digits) {
            let outcome = choices[*digit];
            let update = self.updater.apply_result(
                &mut working,
                &pending.fixture,
                &outcome.representative_result(),
            )?;

            let split = self.draw_rule.split(update.delta.expected_home);
            weight *= outcome.probability(&split, pending.space.margin_buckets());
        }

        for (slot, id) in ratings.iter_mut().zip(pool) {
            *slot = working
                .rating(id)
                .ok_or_else(|| RankingError::EntityNotInPool {
                    entity_id: id.clone(),
                })?;
        }

        Ok(weight)
    }

    fn report(&self, space: &ScenarioSpace, mode: &EvaluationMode, mark: ScenarioMark) -> ScenarioReport {
        let mut digits = vec![0usize; space.fixtures.len()];
        space.select(mode, mark.index, &mut digits);

        ScenarioReport {
            index: mark.index,
            weight: mark.weight,
            focal_rank: mark.rank,
            focal_rating: mark.rating,
            outcomes: space.describe(&digits),
        }
    }
}
