//! Natural creature spawning.
//!
//! The [`NaturalSpawner`] runs once per tick and places creatures around
//! viewers under per category density caps. It reads the world through
//! [`SpawnWorld`] and returns the creatures it planned; the caller adds them
//! to the entity registry.

mod natural_spawner;

pub use natural_spawner::{MOB_COUNT_DIV, NaturalSpawner, can_spawn_at, top_solid_or_liquid};

use kiln_utils::{BlockPos, random::{LegacyRandom, Random}};
use serde::{Deserialize, Serialize};

use crate::behavior::{BlockKind, BlockProperties};
use crate::chunk::LightChannel;
use crate::difficulty::Difficulty;
use crate::entity::{EntityKind, MobCategory};
use crate::world::{SpatialIndex, WorldBorder};

/// One weighted candidate of a spawn list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnEntry {
    /// The type to spawn.
    pub kind: EntityKind,
    /// Relative weight against the other entries of the list.
    pub weight: u32,
    /// Smallest group placed at world generation.
    pub min_group: u32,
    /// Largest group placed at world generation.
    pub max_group: u32,
}

impl SpawnEntry {
    /// Creates a spawn entry.
    #[must_use]
    pub const fn new(kind: EntityKind, weight: u32, min_group: u32, max_group: u32) -> Self {
        Self {
            kind,
            weight,
            min_group,
            max_group,
        }
    }
}

/// Picks an entry with probability proportional to its weight.
///
/// Returns `None` if the list is empty or every weight is zero.
pub fn pick_weighted(entries: &[SpawnEntry], random: &mut LegacyRandom) -> Option<SpawnEntry> {
    let total: u32 = entries.iter().map(|entry| entry.weight).sum();
    let total = i32::try_from(total).ok().filter(|total| *total > 0)?;
    let mut roll = random.next_i32_bounded(total);
    for entry in entries {
        roll -= entry.weight as i32;
        if roll < 0 {
            return Some(*entry);
        }
    }
    None
}

/// Which populations one spawner pass may grow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpawnFlags {
    /// Monsters.
    pub hostile: bool,
    /// Every category other than monsters.
    pub peaceful: bool,
    /// Creatures, only on the ticks where animals are considered.
    pub animals: bool,
}

impl SpawnFlags {
    /// Whether `category` takes part in a pass with these flags.
    #[must_use]
    pub const fn allows(self, category: MobCategory) -> bool {
        if category.is_peaceful() && !self.peaceful {
            return false;
        }
        if !category.is_peaceful() && !self.hostile {
            return false;
        }
        !category.is_animal() || self.animals
    }
}

/// The view of the world the spawner and spawn rules work against.
pub trait SpawnWorld: SpatialIndex {
    /// The block kind at `pos`, air if unloaded.
    fn kind(&self, pos: BlockPos) -> BlockKind;

    /// The static properties of the block at `pos`.
    fn properties(&self, pos: BlockPos) -> &'static BlockProperties;

    /// Stored light of `channel` at `pos`.
    fn light(&self, channel: LightChannel, pos: BlockPos) -> u8;

    /// Light at `pos` with the sky channel reduced by `darken`.
    fn combined_light(&self, pos: BlockPos, darken: u8) -> u8 {
        let sky = self.light(LightChannel::Sky, pos).saturating_sub(darken);
        sky.max(self.light(LightChannel::Block, pos))
    }

    /// How much the sky channel is currently dimmed by night and weather.
    fn sky_darken(&self) -> u8;

    /// Whether a thunderstorm is active.
    fn is_thundering(&self) -> bool;

    /// The world difficulty.
    fn difficulty(&self) -> Difficulty;

    /// Height of the sea surface.
    fn sea_level(&self) -> i32;

    /// The first y above the highest light blocking cell of a column.
    fn height(&self, x: i32, z: i32) -> i32;

    /// The world border.
    fn border(&self) -> &WorldBorder;

    /// The world spawn point.
    fn spawn_point(&self) -> BlockPos;

    /// Candidates for `category` in this world.
    fn spawn_entries(&self, category: MobCategory) -> &[SpawnEntry];

    /// Chance per group roll that world generation places another group.
    fn spawn_chance(&self) -> f32;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::types::vanilla;

    #[test]
    fn test_weighted_pick_respects_weights() {
        let entries = [
            SpawnEntry::new(vanilla::PIG, 0, 1, 1),
            SpawnEntry::new(vanilla::COW, 3, 1, 1),
        ];
        let mut random = LegacyRandom::from_seed(42);
        for _ in 0..50 {
            assert_eq!(pick_weighted(&entries, &mut random).map(|e| e.kind), Some(vanilla::COW));
        }
        assert!(pick_weighted(&[], &mut random).is_none());
        assert!(pick_weighted(&entries[..1], &mut random).is_none());
    }

    #[test]
    fn test_flags_gate_categories() {
        let night = SpawnFlags {
            hostile: true,
            peaceful: true,
            animals: false,
        };
        assert!(night.allows(MobCategory::Monster));
        assert!(night.allows(MobCategory::Ambient));
        assert!(!night.allows(MobCategory::Creature));

        let peaceful = SpawnFlags {
            hostile: false,
            peaceful: true,
            animals: true,
        };
        assert!(!peaceful.allows(MobCategory::Monster));
        assert!(peaceful.allows(MobCategory::Creature));
    }
}
