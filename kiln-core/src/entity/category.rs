//! Creature categories and their population caps.

use serde::{Deserialize, Serialize};

/// The population a creature counts against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MobCategory {
    /// Hostile creatures.
    Monster,
    /// Passive land animals.
    Creature,
    /// Decorative creatures such as bats.
    Ambient,
    /// Creatures living in water.
    WaterCreature,
}

impl MobCategory {
    /// Every category, in spawn order.
    pub const ALL: [MobCategory; 4] = [
        MobCategory::Monster,
        MobCategory::Creature,
        MobCategory::Ambient,
        MobCategory::WaterCreature,
    ];

    /// Population cap for a loaded area of 17 by 17 chunks.
    #[must_use]
    pub const fn max_count(self) -> u32 {
        match self {
            Self::Monster => 70,
            Self::Creature => 10,
            Self::Ambient => 15,
            Self::WaterCreature => 5,
        }
    }

    /// Whether the category is allowed on peaceful difficulty.
    #[must_use]
    pub const fn is_peaceful(self) -> bool {
        !matches!(self, Self::Monster)
    }

    /// Whether the category only spawns on the slow animal interval.
    #[must_use]
    pub const fn is_animal(self) -> bool {
        matches!(self, Self::Creature)
    }

    /// Lowercase name for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Monster => "monster",
            Self::Creature => "creature",
            Self::Ambient => "ambient",
            Self::WaterCreature => "water_creature",
        }
    }
}
