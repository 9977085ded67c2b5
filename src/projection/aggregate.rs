//! Scenario aggregation
//!
//! A [`RankAggregate`] folds evaluated scenarios into the focal entity's rank
//! and rating statistics. Every reduction is associative, so partial
//! aggregates from independent workers merge into the same result regardless
//! of how the scenario range was split, and an aggregate can be finalized
//! after any number of scenarios.

use crate::projection::rank::{compare_standing, rank_in_pool};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A retained scenario together with the focal entity's result in it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMark {
    pub index: u64,
    pub rank: usize,
    pub rating: f64,
    pub weight: f64,
}

/// Scenario count and probability mass landing on one rank
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RankBucket {
    pub scenarios: u64,
    pub weight: f64,
}

/// Probability of the focal entity finishing at a given rank
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankProbability {
    pub rank: usize,
    pub scenarios: u64,
    pub probability: f64,
}

/// Probability of moving relative to the baseline rank
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Movement {
    pub improve: f64,
    pub hold: f64,
    pub decline: f64,
}

/// Running statistics over evaluated scenarios
#[derive(Debug, Clone, PartialEq)]
pub struct RankAggregate {
    focal: usize,
    scenarios: u64,
    total_weight: f64,
    weighted_rank: f64,
    weighted_rating: f64,
    rank_sum: f64,
    rating_sum: f64,
    min_rating: f64,
    max_rating: f64,
    best: Option<ScenarioMark>,
    worst: Option<ScenarioMark>,
    histogram: BTreeMap<usize, RankBucket>,
    finished_above: Vec<bool>,
    finished_below: Vec<bool>,
    weighted_ratings: Vec<f64>,
    rating_sums: Vec<f64>,
}

impl RankAggregate {
    /// Empty aggregate for a pool of `pool_size` members with the focal
    /// entity at pool index `focal`
    pub fn new(pool_size: usize, focal: usize) -> Self {
        Self {
            focal,
            scenarios: 0,
            total_weight: 0.0,
            weighted_rank: 0.0,
            weighted_rating: 0.0,
            rank_sum: 0.0,
            rating_sum: 0.0,
            min_rating: f64::INFINITY,
            max_rating: f64::NEG_INFINITY,
            best: None,
            worst: None,
            histogram: BTreeMap::new(),
            finished_above: vec![false; pool_size],
            finished_below: vec![false; pool_size],
            weighted_ratings: vec![0.0; pool_size],
            rating_sums: vec![0.0; pool_size],
        }
    }

    /// Fold one scenario in. `ratings` holds every pool member's final
    /// rating, in pool order.
    pub fn record(&mut self, index: u64, weight: f64, ratings: &[f64]) {
        let focal = self.focal;
        let rank = rank_in_pool(ratings, focal);
        let rating = ratings[focal];

        self.scenarios += 1;
        self.total_weight += weight;
        self.weighted_rank += weight * rank as f64;
        self.weighted_rating += weight * rating;
        self.rank_sum += rank as f64;
        self.rating_sum += rating;
        self.min_rating = self.min_rating.min(rating);
        self.max_rating = self.max_rating.max(rating);

        let bucket = self.histogram.entry(rank).or_default();
        bucket.scenarios += 1;
        bucket.weight += weight;

        let mark = ScenarioMark {
            index,
            rank,
            rating,
            weight,
        };
        self.best = Some(pick(self.best, mark, |a, b| a.rank.cmp(&b.rank)));
        self.worst = Some(pick(self.worst, mark, |a, b| b.rank.cmp(&a.rank)));

        for (other, other_rating) in ratings.iter().enumerate() {
            self.weighted_ratings[other] += weight * other_rating;
            self.rating_sums[other] += other_rating;

            if other == focal {
                continue;
            }
            match compare_standing((&other, *other_rating), (&focal, rating)) {
                Ordering::Less => self.finished_above[other] = true,
                _ => self.finished_below[other] = true,
            }
        }
    }

    /// Combine with the aggregate of a disjoint scenario range
    pub fn merge(mut self, other: RankAggregate) -> RankAggregate {
        self.scenarios += other.scenarios;
        self.total_weight += other.total_weight;
        self.weighted_rank += other.weighted_rank;
        self.weighted_rating += other.weighted_rating;
        self.rank_sum += other.rank_sum;
        self.rating_sum += other.rating_sum;
        self.min_rating = self.min_rating.min(other.min_rating);
        self.max_rating = self.max_rating.max(other.max_rating);

        if let Some(mark) = other.best {
            self.best = Some(pick(self.best, mark, |a, b| a.rank.cmp(&b.rank)));
        }
        if let Some(mark) = other.worst {
            self.worst = Some(pick(self.worst, mark, |a, b| b.rank.cmp(&a.rank)));
        }

        for (rank, bucket) in other.histogram {
            let entry = self.histogram.entry(rank).or_default();
            entry.scenarios += bucket.scenarios;
            entry.weight += bucket.weight;
        }

        for i in 0..self.finished_above.len() {
            self.finished_above[i] |= other.finished_above[i];
            self.finished_below[i] |= other.finished_below[i];
            self.weighted_ratings[i] += other.weighted_ratings[i];
            self.rating_sums[i] += other.rating_sums[i];
        }

        self
    }

    pub fn scenarios(&self) -> u64 {
        self.scenarios
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios == 0
    }

    /// Sum of all recorded scenario weights
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn min_rank(&self) -> Option<usize> {
        self.best.map(|mark| mark.rank)
    }

    pub fn max_rank(&self) -> Option<usize> {
        self.worst.map(|mark| mark.rank)
    }

    pub fn min_rating(&self) -> Option<f64> {
        (!self.is_empty()).then_some(self.min_rating)
    }

    pub fn max_rating(&self) -> Option<f64> {
        (!self.is_empty()).then_some(self.max_rating)
    }

    /// Probability-weighted mean rank
    pub fn expected_rank(&self) -> Option<f64> {
        self.mean(self.weighted_rank, self.rank_sum)
    }

    /// Probability-weighted mean rating of the focal entity
    pub fn expected_rating(&self) -> Option<f64> {
        self.mean(self.weighted_rating, self.rating_sum)
    }

    /// Probability-weighted mean rating of pool member `index`
    pub fn expected_rating_of(&self, index: usize) -> Option<f64> {
        self.mean(self.weighted_ratings[index], self.rating_sums[index])
    }

    /// Scenario with the best focal rank; lowest index wins ties
    pub fn best(&self) -> Option<ScenarioMark> {
        self.best
    }

    /// Scenario with the worst focal rank; lowest index wins ties
    pub fn worst(&self) -> Option<ScenarioMark> {
        self.worst
    }

    /// Whether pool member `index` finished above the focal entity in any scenario
    pub fn finished_above(&self, index: usize) -> bool {
        self.finished_above[index]
    }

    /// Whether pool member `index` finished below the focal entity in any scenario
    pub fn finished_below(&self, index: usize) -> bool {
        self.finished_below[index]
    }

    /// Rank histogram, best rank first
    pub fn rank_distribution(&self) -> Vec<RankProbability> {
        self.histogram
            .iter()
            .map(|(rank, bucket)| RankProbability {
                rank: *rank,
                scenarios: bucket.scenarios,
                probability: self.probability(bucket),
            })
            .collect()
    }

    /// Weighted probability of finishing above, at, or below `baseline_rank`
    pub fn movement(&self, baseline_rank: usize) -> Movement {
        let mut movement = Movement::default();
        for (rank, bucket) in &self.histogram {
            let probability = self.probability(bucket);
            match rank.cmp(&baseline_rank) {
                Ordering::Less => movement.improve += probability,
                Ordering::Equal => movement.hold += probability,
                Ordering::Greater => movement.decline += probability,
            }
        }
        movement
    }

    fn uses_weights(&self) -> bool {
        self.total_weight > 0.0 && self.total_weight.is_finite()
    }

    // Falls back to the plain mean when every recorded scenario had zero weight
    fn mean(&self, weighted: f64, plain: f64) -> Option<f64> {
        if self.is_empty() {
            None
        } else if self.uses_weights() {
            Some(weighted / self.total_weight)
        } else {
            Some(plain / self.scenarios as f64)
        }
    }

    fn probability(&self, bucket: &RankBucket) -> f64 {
        if self.uses_weights() {
            bucket.weight / self.total_weight
        } else {
            bucket.scenarios as f64 / self.scenarios as f64
        }
    }
}

/// Keep whichever mark orders first; equal marks resolve to the lower index
fn pick<F>(current: Option<ScenarioMark>, candidate: ScenarioMark, order: F) -> ScenarioMark
where
    F: Fn(&ScenarioMark, &ScenarioMark) -> Ordering,
{
    match current {
        None => candidate,
        Some(current) => match order(&candidate, &current) {
            Ordering::Less => candidate,
            Ordering::Greater => current,
            Ordering::Equal if candidate.index < current.index => candidate,
            Ordering::Equal => current,
        },
    }
}
