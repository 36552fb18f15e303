//! Per-dimension rules injected into a world.

use super::clock;
use crate::entity::MobCategory;
use crate::entity::types::vanilla;
use crate::spawner::SpawnEntry;

/// Sky presence, sea level and spawn lists of a dimension.
pub trait DimensionBehaviour: Send + Sync {
    /// Registry name, for logs.
    fn name(&self) -> &'static str;

    /// Whether the dimension has a sky. Without one there is no weather and
    /// no sky light.
    fn has_sky(&self) -> bool;

    /// Height of the sea surface.
    fn sea_level(&self) -> i32 {
        63
    }

    /// Chance per roll that world generation places another creature group.
    fn spawn_chance(&self) -> f32 {
        0.1
    }

    /// Creatures of `category` that may spawn naturally.
    fn spawn_entries(&self, category: MobCategory) -> &[SpawnEntry];

    /// The sun's position for a time of day.
    fn celestial_angle(&self, day_time: i64, partial: f32) -> f32 {
        clock::celestial_angle(day_time, partial)
    }
}

static OVERWORLD_MONSTERS: [SpawnEntry; 4] = [
    SpawnEntry::new(vanilla::SPIDER, 100, 4, 4),
    SpawnEntry::new(vanilla::ZOMBIE, 100, 4, 4),
    SpawnEntry::new(vanilla::SKELETON, 100, 4, 4),
    SpawnEntry::new(vanilla::CREEPER, 100, 4, 4),
];

static OVERWORLD_CREATURES: [SpawnEntry; 4] = [
    SpawnEntry::new(vanilla::SHEEP, 12, 4, 4),
    SpawnEntry::new(vanilla::PIG, 10, 4, 4),
    SpawnEntry::new(vanilla::CHICKEN, 10, 4, 4),
    SpawnEntry::new(vanilla::COW, 8, 4, 4),
];

static OVERWORLD_AMBIENT: [SpawnEntry; 1] = [SpawnEntry::new(vanilla::BAT, 10, 8, 8)];

static OVERWORLD_WATER: [SpawnEntry; 1] = [SpawnEntry::new(vanilla::SQUID, 10, 4, 4)];

/// The surface dimension.
#[derive(Debug, Default, Clone, Copy)]
pub struct Overworld;

impl DimensionBehaviour for Overworld {
    fn name(&self) -> &'static str {
        "overworld"
    }

    fn has_sky(&self) -> bool {
        true
    }

    fn spawn_entries(&self, category: MobCategory) -> &[SpawnEntry] {
        match category {
            MobCategory::Monster => &OVERWORLD_MONSTERS,
            MobCategory::Creature => &OVERWORLD_CREATURES,
            MobCategory::Ambient => &OVERWORLD_AMBIENT,
            MobCategory::WaterCreature => &OVERWORLD_WATER,
        }
    }
}

static NETHER_MONSTERS: [SpawnEntry; 1] = [SpawnEntry::new(vanilla::ZOMBIE, 100, 4, 4)];

/// A dimension without sky, stuck at midnight.
#[derive(Debug, Default, Clone, Copy)]
pub struct Nether;

impl DimensionBehaviour for Nether {
    fn name(&self) -> &'static str {
        "the_nether"
    }

    fn has_sky(&self) -> bool {
        false
    }

    fn sea_level(&self) -> i32 {
        32
    }

    fn spawn_entries(&self, category: MobCategory) -> &[SpawnEntry] {
        match category {
            MobCategory::Monster => &NETHER_MONSTERS,
            _ => &[],
        }
    }

    fn celestial_angle(&self, _day_time: i64, _partial: f32) -> f32 {
        0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists() {
        assert_eq!(Overworld.spawn_entries(MobCategory::Creature).len(), 4);
        assert!(Nether.spawn_entries(MobCategory::Creature).is_empty());
        assert!(!Nether.has_sky());
        assert!((Nether.celestial_angle(6_000, 0.0) - 0.5).abs() < f32::EPSILON);
        assert!(Overworld.celestial_angle(6_000, 0.0).abs() < 1.0e-6);
    }
}
