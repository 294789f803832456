//! Catalog configuration — badge definitions loaded from the data
//! directory. Decoded and validated once at the boundary.

use crate::badge::{Badge, BadgeKind, Rarity};
use crate::error::GameResult;
use anyhow::Context;

#[derive(Debug, Clone, serde::Deserialize)]
struct BadgeCatalogFile {
    badges: Vec<Badge>,
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub badges: Vec<Badge>,
}

impl GameConfig {
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/badges.json");
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read badge catalog: {path}"))?;
        let file: BadgeCatalogFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse badge catalog: {path}"))?;

        let config = Self {
            badges: file.badges,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> GameResult<()> {
        for badge in &self.badges {
            badge.validate()?;
        }
        Ok(())
    }

    /// Built-in catalog used by tests and the demo runner.
    pub fn default_test() -> Self {
        fn badge(
            badge_id: &str,
            name: &str,
            icon: &str,
            kind: BadgeKind,
            requirement: i64,
            rarity: Rarity,
        ) -> Badge {
            Badge {
                badge_id: badge_id.to_string(),
                name: name.to_string(),
                description: String::new(),
                icon: icon.to_string(),
                kind,
                requirement,
                rarity,
                is_active: true,
            }
        }

        Self {
            badges: vec![
                badge("first-chore", "First Chore", "checkmark.seal", BadgeKind::TaskCompletion, 1, Rarity::Common),
                badge("busy-bee", "Busy Bee", "bolt.fill", BadgeKind::TaskCompletion, 10, Rarity::Uncommon),
                badge("chore-machine", "Chore Machine", "gearshape.2", BadgeKind::TaskCompletion, 100, Rarity::Epic),
                badge("point-collector", "Point Collector", "star.circle", BadgeKind::PointsEarned, 500, Rarity::Uncommon),
                badge("point-hoarder", "Point Hoarder", "star.square.on.square", BadgeKind::PointsEarned, 2000, Rarity::Rare),
                badge("home-sweet-home", "Home Sweet Home", "house.fill", BadgeKind::HouseholdJoin, 1, Rarity::Common),
                badge("week-warrior", "Week Warrior", "flame.fill", BadgeKind::Streak, 7, Rarity::Rare),
                badge("habit-master", "Habit Master", "calendar.badge.clock", BadgeKind::Streak, 30, Rarity::Epic),
                badge("treat-yourself", "Treat Yourself", "gift.fill", BadgeKind::RewardRedemption, 1, Rarity::Uncommon),
                badge("founding-member", "Founding Member", "crown.fill", BadgeKind::Special, 1, Rarity::Legendary),
            ],
        }
    }
}
