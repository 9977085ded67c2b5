//! Shared builders for integration and property tests

#![allow(dead_code)]

use chrono::NaiveDate;
use scenario_ranker::config::EngineConfig;
use scenario_ranker::projection::PendingFixture;
use scenario_ranker::rating::RatingSnapshot;
use scenario_ranker::types::{CompetitionClass, Entity, Fixture, MatchResult};

pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, month, day).unwrap()
}

/// UEFA qualifying group plus two sides from other confederations
pub fn group_entities() -> Vec<Entity> {
    vec![
        Entity::new("SCO", "Scotland", 1504.2).with_confederation("UEFA"),
        Entity::new("DEN", "Denmark", 1621.0).with_confederation("UEFA"),
        Entity::new("GRE", "Greece", 1495.6).with_confederation("UEFA"),
        Entity::new("BLR", "Belarus", 986.5).with_confederation("UEFA"),
        Entity::new("AUT", "Austria", 1578.3).with_confederation("UEFA"),
        Entity::new("JPN", "Japan", 1641.4).with_confederation("AFC"),
        Entity::new("MAR", "Morocco", 1694.2).with_confederation("CAF"),
    ]
}

pub fn group_snapshot() -> RatingSnapshot {
    RatingSnapshot::from_entities(group_entities()).unwrap()
}

pub fn scheduled(id: &str, month: u32, day: u32, home: &str, away: &str) -> Fixture {
    Fixture::scheduled(
        id,
        date(month, day),
        home,
        away,
        CompetitionClass::WorldCupQualifier,
    )
}

pub fn played(id: &str, month: u32, day: u32, home: &str, away: &str, goals: (u32, u32)) -> Fixture {
    scheduled(id, month, day, home, away)
        .with_result(MatchResult::new(goals.0, goals.1))
        .unwrap()
}

/// Remaining qualifiers of the group, in date order
pub fn remaining_group_fixtures() -> Vec<PendingFixture> {
    vec![
        PendingFixture::new(scheduled("wcq-5", 11, 15, "GRE", "SCO")),
        PendingFixture::new(scheduled("wcq-6", 11, 15, "DEN", "BLR")),
        PendingFixture::new(scheduled("wcq-7", 11, 18, "SCO", "DEN")),
        PendingFixture::new(scheduled("wcq-8", 11, 18, "BLR", "GRE")),
    ]
}

pub fn seeded_config() -> EngineConfig {
    EngineConfig {
        sampling_seed: Some(2025),
        ..EngineConfig::default()
    }
}

pub const DATASET_JSON: &str = r#"{
    "entities": [
        {"id": "SCO", "display_name": "Scotland", "rating": 1504.2, "confederation": "UEFA"},
        {"id": "DEN", "display_name": "Denmark", "rating": 1621.0, "confederation": "UEFA"},
        {"id": "GRE", "display_name": "Greece", "rating": 1495.6, "confederation": "UEFA"},
        {"id": "BLR", "display_name": "Belarus", "rating": 986.5, "confederation": "UEFA"},
        {"id": "JPN", "display_name": "Japan", "rating": 1641.4, "confederation": "AFC"}
    ],
    "fixtures": [
        {"id": "wcq-7", "date": "2025-11-18", "home_id": "SCO", "away_id": "DEN",
         "competition_class": "world_cup_qualifier"},
        {"id": "wcq-1", "date": "2025-09-05", "home_id": "SCO", "away_id": "BLR",
         "competition_class": "world_cup_qualifier",
         "result": {"home_goals": 2, "away_goals": 1}},
        {"id": "wcq-2", "date": "2025-09-08", "home_id": "DEN", "away_id": "SCO",
         "competition_class": "world_cup_qualifier",
         "result": {"home_goals": 0, "away_goals": 0}},
        {"id": "fr-1", "date": "2025-10-14", "home_id": "JPN", "away_id": "GRE",
         "competition_class": "friendly", "neutral_venue": true,
         "result": {"home_goals": 1, "away_goals": 2}},
        {"id": "wcq-5", "date": "2025-11-15", "home_id": "GRE", "away_id": "SCO",
         "competition_class": "world_cup_qualifier"}
    ]
}"#;
