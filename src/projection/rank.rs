//! Rank projection over rating snapshots
//!
//! Ranks are 1-based positions within a filtered pool, sorted by rating
//! descending with ties broken by entity id ascending.

use crate::error::{RankingError, Result};
use crate::rating::store::{EntityInfo, RatingSnapshot};
use crate::types::EntityId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Which entities take part in a ranking
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolFilter {
    #[default]
    All,
    /// Only entities registered in this confederation
    Confederation(String),
    /// An explicit set of entity ids
    Members(BTreeSet<EntityId>),
}

impl PoolFilter {
    pub fn admits(&self, entity_id: &str, info: Option<&EntityInfo>) -> bool {
        match self {
            PoolFilter::All => true,
            PoolFilter::Confederation(name) => info
                .and_then(|info| info.confederation.as_deref())
                .is_some_and(|confederation| confederation.eq_ignore_ascii_case(name)),
            PoolFilter::Members(members) => members.contains(entity_id),
        }
    }
}

/// Ordering of two `(key, rating)` standings: higher rating first, then key
pub fn compare_standing<K: Ord + ?Sized>(a: (&K, f64), b: (&K, f64)) -> Ordering {
    b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

/// 1-based rank of pool member `index` given every member's rating.
///
/// Pool members are id-ordered, so comparing indices breaks rating ties the
/// same way comparing ids does.
pub fn rank_in_pool(ratings: &[f64], index: usize) -> usize {
    let focal = (&index, ratings[index]);
    1 + ratings
        .iter()
        .enumerate()
        .filter(|(other, rating)| compare_standing((other, **rating), focal) == Ordering::Less)
        .count()
}

/// One row of a ranking table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub rank: usize,
    pub entity_id: EntityId,
    pub display_name: String,
    pub rating: f64,
}

/// Entities the focal entity can catch, and entities that can overtake it
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reach {
    pub catchable: Vec<Standing>,
    pub threats: Vec<Standing>,
}

/// Computes rankings within a pool of entities
#[derive(Debug, Clone, Default)]
pub struct RankProjector {
    pool: PoolFilter,
}

impl RankProjector {
    pub fn new(pool: PoolFilter) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PoolFilter {
        &self.pool
    }

    /// Ids admitted by the pool filter, in id order
    pub fn pool_members(&self, snapshot: &RatingSnapshot) -> Vec<EntityId> {
        snapshot
            .ratings()
            .keys()
            .filter(|id| self.pool.admits(id, snapshot.info(id)))
            .cloned()
            .collect()
    }

    /// Full ranking table of the pool
    pub fn standings(&self, snapshot: &RatingSnapshot) -> Vec<Standing> {
        let mut rows: Vec<(&EntityId, f64)> = snapshot
            .ratings()
            .iter()
            .filter(|(id, _)| self.pool.admits(id, snapshot.info(id)))
            .map(|(id, rating)| (id, *rating))
            .collect();
        rows.sort_by(|a, b| compare_standing((a.0.as_str(), a.1), (b.0.as_str(), b.1)));

        rows.into_iter()
            .enumerate()
            .map(|(position, (id, rating))| Standing {
                rank: position + 1,
                entity_id: id.clone(),
                display_name: snapshot.display_name(id).to_string(),
                rating,
            })
            .collect()
    }

    /// 1-based position of an entity within the pool
    pub fn rank_of(&self, snapshot: &RatingSnapshot, entity_id: &str) -> Result<usize> {
        let rating = self.member_rating(snapshot, entity_id)?;

        let ahead = snapshot
            .ratings()
            .iter()
            .filter(|(id, _)| self.pool.admits(id, snapshot.info(id)))
            .filter(|(id, other)| {
                compare_standing((id.as_str(), **other), (entity_id, rating)) == Ordering::Less
            })
            .count();

        Ok(ahead + 1)
    }

    /// Static range query around the focal entity.
    ///
    /// Entities ranked above the focal entity that it would pass at
    /// `best_rating` are catchable; entities ranked below it that would pass
    /// it at `worst_rating` are threats.
    pub fn reach(
        &self,
        snapshot: &RatingSnapshot,
        focal_id: &str,
        best_rating: f64,
        worst_rating: f64,
    ) -> Result<Reach> {
        let current = self.member_rating(snapshot, focal_id)?;
        let mut reach = Reach::default();

        for standing in self.standings(snapshot) {
            if standing.entity_id == focal_id {
                continue;
            }

            let other = (standing.entity_id.as_str(), standing.rating);
            let ahead_now = compare_standing(other, (focal_id, current)) == Ordering::Less;

            if ahead_now {
                if compare_standing((focal_id, best_rating), other) == Ordering::Less {
                    reach.catchable.push(standing);
                }
            } else if compare_standing(other, (focal_id, worst_rating)) == Ordering::Less {
                reach.threats.push(standing);
            }
        }

        Ok(reach)
    }

    fn member_rating(&self, snapshot: &RatingSnapshot, entity_id: &str) -> Result<f64> {
        snapshot
            .rating(entity_id)
            .filter(|_| self.pool.admits(entity_id, snapshot.info(entity_id)))
            .ok_or_else(|| RankingError::EntityNotInPool {
                entity_id: entity_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Entity;

    fn snapshot() -> RatingSnapshot {
        RatingSnapshot::from_entities(vec![
            Entity::new("SCO", "Scotland", 1500.0).with_confederation("UEFA"),
            Entity::new("AUT", "Austria", 1500.0).with_confederation("UEFA"),
            Entity::new("JPN", "Japan", 1640.0).with_confederation("AFC"),
            Entity::new("WAL", "Wales", 1490.0).with_confederation("UEFA"),
            Entity::new("IRN", "Iran", 1620.0).with_confederation("AFC"),
        ])
        .unwrap()
    }

    #[test]
    fn test_standings_order_and_ties() {
        let standings = RankProjector::default().standings(&snapshot());
        let order: Vec<&str> = standings.iter().map(|s| s.entity_id.as_str()).collect();

        // AUT and SCO tie on rating; id order decides
        assert_eq!(order, vec!["JPN", "IRN", "AUT", "SCO", "WAL"]);
        assert_eq!(standings[3].rank, 4);
        assert_eq!(standings[0].display_name, "Japan");
    }

    #[test]
    fn test_rank_of_matches_standings() {
        let snapshot = snapshot();
        let projector = RankProjector::default();
        for standing in projector.standings(&snapshot) {
            assert_eq!(
                projector.rank_of(&snapshot, &standing.entity_id).unwrap(),
                standing.rank
            );
        }
    }

    #[test]
    fn test_confederation_pool() {
        let snapshot = snapshot();
        let projector = RankProjector::new(PoolFilter::Confederation("UEFA".to_string()));

        assert_eq!(projector.pool_members(&snapshot), vec!["AUT", "SCO", "WAL"]);
        assert_eq!(projector.rank_of(&snapshot, "SCO").unwrap(), 2);
        assert_eq!(
            projector.rank_of(&snapshot, "JPN").unwrap_err(),
            RankingError::EntityNotInPool {
                entity_id: "JPN".to_string()
            }
        );
    }

    #[test]
    fn test_member_pool_and_unknown_entity() {
        let snapshot = snapshot();
        let members: BTreeSet<EntityId> = ["SCO", "WAL"].iter().map(|s| s.to_string()).collect();
        let projector = RankProjector::new(PoolFilter::Members(members));

        assert_eq!(projector.rank_of(&snapshot, "WAL").unwrap(), 2);
        assert!(projector.rank_of(&snapshot, "XXX").is_err());
    }

    #[test]
    fn test_rank_in_pool_uses_index_tiebreak() {
        // Members in id order: AUT, SCO, WAL
        let ratings = [1500.0, 1500.0, 1510.0];
        assert_eq!(rank_in_pool(&ratings, 2), 1);
        assert_eq!(rank_in_pool(&ratings, 0), 2);
        assert_eq!(rank_in_pool(&ratings, 1), 3);
    }

    #[test]
    fn test_compare_standing() {
        assert_eq!(compare_standing(("SCO", 1510.0), ("AUT", 1500.0)), Ordering::Less);
        assert_eq!(compare_standing(("SCO", 1500.0), ("AUT", 1500.0)), Ordering::Greater);
        assert_eq!(compare_standing(("SCO", 1500.0), ("SCO", 1500.0)), Ordering::Equal);
        assert_eq!(compare_standing(("WAL", 1489.99), ("SCO", 1490.0)), Ordering::Greater);
    }

    #[test]
    fn test_reach() {
        let snapshot = snapshot();
        let projector = RankProjector::default();

        // SCO at 1500: best case 1625 passes IRN, worst case 1480 falls behind WAL
        let reach = projector.reach(&snapshot, "SCO", 1625.0, 1480.0).unwrap();
        let catchable: Vec<&str> = reach.catchable.iter().map(|s| s.entity_id.as_str()).collect();
        let threats: Vec<&str> = reach.threats.iter().map(|s| s.entity_id.as_str()).collect();

        assert_eq!(catchable, vec!["IRN", "AUT"]);
        assert_eq!(threats, vec!["WAL"]);

        // Standing still changes nothing
        let still = projector.reach(&snapshot, "SCO", 1500.0, 1500.0).unwrap();
        assert!(still.catchable.is_empty());
        assert!(still.threats.is_empty());
    }
}
