//! Entity types and the behaviour attached to each.

use std::fmt::{self, Display};

use kiln_utils::{BlockPos, math::Vector3, random::{LegacyRandom, Random}};
use serde::{Deserialize, Serialize};

use super::{Entity, MobCategory};
use crate::behavior::vanilla as blocks;
use crate::chunk::LightChannel;
use crate::error::BehaviourError;
use crate::spawner::SpawnWorld;
use crate::world::SpatialIndex;

/// Identifies an entity type. The numeric value indexes the [`EntityTypeRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityKind(pub u16);

impl EntityKind {
    /// The player type, always registered first.
    pub const PLAYER: Self = Self(0);
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

/// How a creature type is placed by the spawner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnPlacement {
    /// Standing on a solid top face in two free cells.
    OnGround,
    /// Inside water with water below.
    InWater,
}

/// What an entity update may read and use.
pub struct EntityContext<'a> {
    /// Loaded chunks.
    pub spatial: &'a dyn SpatialIndex,
    /// The world's random source.
    pub random: &'a mut LegacyRandom,
    /// The current total tick count.
    pub total_ticks: u64,
}

/// Behaviour shared by every entity of one type.
pub trait EntityBehaviour: Send + Sync {
    /// Registry name, for logs.
    fn name(&self) -> &'static str;

    /// The population the type counts against, `None` if it is never spawned naturally.
    fn category(&self) -> Option<MobCategory> {
        None
    }

    /// How the spawner places this type.
    fn placement(&self) -> SpawnPlacement {
        SpawnPlacement::OnGround
    }

    /// Width and height of the bounding box.
    fn size(&self) -> (f64, f64);

    /// How many of this type one spawner pass may place in a single chunk.
    fn max_per_chunk(&self) -> u32 {
        4
    }

    /// Type specific spawn rules, checked after the placement rules passed.
    fn can_spawn_here(
        &self,
        _world: &dyn SpawnWorld,
        _pos: BlockPos,
        _random: &mut LegacyRandom,
    ) -> bool {
        true
    }

    /// Runs one update. Errors abort the tick.
    fn tick(&self, _entity: &mut Entity, _ctx: &mut EntityContext<'_>) -> Result<(), BehaviourError> {
        Ok(())
    }
}

/// Maps entity kinds to their behaviour.
pub struct EntityTypeRegistry {
    behaviours: Vec<&'static dyn EntityBehaviour>,
}

impl EntityTypeRegistry {
    /// A registry holding only the player type.
    #[must_use]
    pub fn new() -> Self {
        let player: &'static dyn EntityBehaviour = &PLAYER_TYPE;
        Self {
            behaviours: vec![player],
        }
    }

    /// The built in types, see [`vanilla`].
    #[must_use]
    pub fn vanilla() -> Self {
        let mut registry = Self::new();
        vanilla::register(&mut registry);
        registry
    }

    /// Adds a type and returns its kind.
    pub fn register(&mut self, behaviour: &'static dyn EntityBehaviour) -> EntityKind {
        let kind = EntityKind(self.behaviours.len() as u16);
        self.behaviours.push(behaviour);
        kind
    }

    /// The behaviour of `kind`.
    #[must_use]
    pub fn get(&self, kind: EntityKind) -> Option<&'static dyn EntityBehaviour> {
        self.behaviours.get(usize::from(kind.0)).copied()
    }

    /// The category `kind` counts against.
    #[must_use]
    pub fn category(&self, kind: EntityKind) -> Option<MobCategory> {
        self.get(kind).and_then(|behaviour| behaviour.category())
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.behaviours.len()
    }

    /// Always false, the player type is registered on creation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.behaviours.is_empty()
    }
}

impl Default for EntityTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

struct PlayerType;

static PLAYER_TYPE: PlayerType = PlayerType;

impl EntityBehaviour for PlayerType {
    fn name(&self) -> &'static str {
        "player"
    }

    fn size(&self) -> (f64, f64) {
        (0.6, 1.8)
    }
}

/// A naturally spawning creature without AI. It drifts along its velocity.
pub struct MobType {
    name: &'static str,
    category: MobCategory,
    width: f64,
    height: f64,
}

impl MobType {
    /// Creates a mob type.
    #[must_use]
    pub const fn new(name: &'static str, category: MobCategory, width: f64, height: f64) -> Self {
        Self {
            name,
            category,
            width,
            height,
        }
    }
}

const DRAG: f64 = 0.91;

impl EntityBehaviour for MobType {
    fn name(&self) -> &'static str {
        self.name
    }

    fn category(&self) -> Option<MobCategory> {
        Some(self.category)
    }

    fn placement(&self) -> SpawnPlacement {
        match self.category {
            MobCategory::WaterCreature => SpawnPlacement::InWater,
            _ => SpawnPlacement::OnGround,
        }
    }

    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn can_spawn_here(&self, world: &dyn SpawnWorld, pos: BlockPos, random: &mut LegacyRandom) -> bool {
        match self.category {
            MobCategory::Monster => {
                if !world.difficulty().allows_hostiles() {
                    return false;
                }
                if i32::from(world.light(LightChannel::Sky, pos)) > random.next_i32_bounded(32) {
                    return false;
                }
                let darken = if world.is_thundering() { 10 } else { world.sky_darken() };
                i32::from(world.combined_light(pos, darken)) <= random.next_i32_bounded(8)
            }
            MobCategory::Creature => {
                world.kind(pos.below()) == blocks::GRASS && world.combined_light(pos, 0) > 8
            }
            MobCategory::Ambient => {
                pos.y() < world.sea_level()
                    && i32::from(world.combined_light(pos, world.sky_darken()))
                        <= random.next_i32_bounded(4)
            }
            MobCategory::WaterCreature => pos.y() > 45 && pos.y() < world.sea_level(),
        }
    }

    fn tick(&self, entity: &mut Entity, _ctx: &mut EntityContext<'_>) -> Result<(), BehaviourError> {
        if entity.velocity == Vector3::default() {
            return Ok(());
        }
        entity.position = entity.position + entity.velocity;
        let v = entity.velocity;
        entity.velocity = Vector3::new(v.x * DRAG, v.y * DRAG, v.z * DRAG);
        if entity.velocity.length_squared() < 1.0e-6 {
            entity.velocity = Vector3::default();
        }
        Ok(())
    }
}

/// The built in entity types.
#[allow(missing_docs)]
pub mod vanilla {
    use super::{EntityKind, EntityTypeRegistry, MobCategory, MobType};

    pub const PLAYER: EntityKind = EntityKind::PLAYER;
    pub const ZOMBIE: EntityKind = EntityKind(1);
    pub const SKELETON: EntityKind = EntityKind(2);
    pub const CREEPER: EntityKind = EntityKind(3);
    pub const SPIDER: EntityKind = EntityKind(4);
    pub const PIG: EntityKind = EntityKind(5);
    pub const SHEEP: EntityKind = EntityKind(6);
    pub const COW: EntityKind = EntityKind(7);
    pub const CHICKEN: EntityKind = EntityKind(8);
    pub const BAT: EntityKind = EntityKind(9);
    pub const SQUID: EntityKind = EntityKind(10);

    static ZOMBIE_TYPE: MobType = MobType::new("zombie", MobCategory::Monster, 0.6, 1.95);
    static SKELETON_TYPE: MobType = MobType::new("skeleton", MobCategory::Monster, 0.6, 1.99);
    static CREEPER_TYPE: MobType = MobType::new("creeper", MobCategory::Monster, 0.6, 1.7);
    static SPIDER_TYPE: MobType = MobType::new("spider", MobCategory::Monster, 1.4, 0.9);
    static PIG_TYPE: MobType = MobType::new("pig", MobCategory::Creature, 0.9, 0.9);
    static SHEEP_TYPE: MobType = MobType::new("sheep", MobCategory::Creature, 0.9, 1.3);
    static COW_TYPE: MobType = MobType::new("cow", MobCategory::Creature, 0.9, 1.4);
    static CHICKEN_TYPE: MobType = MobType::new("chicken", MobCategory::Creature, 0.4, 0.7);
    static BAT_TYPE: MobType = MobType::new("bat", MobCategory::Ambient, 0.5, 0.9);
    static SQUID_TYPE: MobType = MobType::new("squid", MobCategory::WaterCreature, 0.8, 0.8);

    pub(super) fn register(registry: &mut EntityTypeRegistry) {
        for mob in [
            &ZOMBIE_TYPE,
            &SKELETON_TYPE,
            &CREEPER_TYPE,
            &SPIDER_TYPE,
            &PIG_TYPE,
            &SHEEP_TYPE,
            &COW_TYPE,
            &CHICKEN_TYPE,
            &BAT_TYPE,
            &SQUID_TYPE,
        ] {
            registry.register(mob);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vanilla_kinds_match_registration_order() {
        let registry = EntityTypeRegistry::vanilla();
        assert_eq!(registry.len(), 11);
        assert_eq!(registry.get(vanilla::ZOMBIE).map(|b| b.name()), Some("zombie"));
        assert_eq!(registry.get(vanilla::SQUID).map(|b| b.name()), Some("squid"));
        assert_eq!(registry.category(vanilla::PIG), Some(MobCategory::Creature));
        assert_eq!(registry.category(vanilla::PLAYER), None);
        assert!(registry.get(EntityKind(99)).is_none());
    }

    #[test]
    fn test_squid_is_placed_in_water() {
        let registry = EntityTypeRegistry::vanilla();
        let squid = registry.get(vanilla::SQUID).expect("registered");
        assert_eq!(squid.placement(), SpawnPlacement::InWater);
    }
}
