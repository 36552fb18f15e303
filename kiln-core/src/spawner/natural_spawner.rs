use kiln_utils::{
    BlockPos, ChunkPos,
    math::Vector3,
    random::{LegacyRandom, Random},
    types::WORLD_HEIGHT,
};
use rustc_hash::FxHashSet;
use uuid::Uuid;

use super::{SpawnFlags, SpawnWorld, pick_weighted};
use crate::behavior::BlockProperties;
use crate::config::SpawnConfig;
use crate::entity::{Entity, EntityBehaviour, EntityKind, EntityRegistry, MobCategory, SpawnPlacement};

/// Area, in chunks, one viewer's spawn cap is scaled against (17 x 17).
pub const MOB_COUNT_DIV: u64 = 289;

/// Tries per group member when placing creatures in a freshly generated chunk.
const INITIAL_PLACEMENT_TRIES: u32 = 4;

/// Places creatures around viewers under per category density caps.
pub struct NaturalSpawner {
    config: SpawnConfig,
    eligible: Vec<ChunkPos>,
}

impl NaturalSpawner {
    /// Creates a spawner with the given tuning.
    #[must_use]
    pub fn new(config: SpawnConfig) -> Self {
        Self {
            config,
            eligible: Vec::new(),
        }
    }

    /// Chunks found by the last [`Self::collect_eligible`] call, in discovery order.
    #[must_use]
    pub fn eligible_chunks(&self) -> &[ChunkPos] {
        &self.eligible
    }

    /// Rebuilds the eligible chunk list and returns the number of chunks in
    /// the union of every viewer's square, the outer ring included.
    ///
    /// A chunk is eligible if it is not on the outer ring of some viewer's
    /// square, lies inside the border and is ticking.
    pub fn collect_eligible(&mut self, world: &dyn SpawnWorld, entities: &EntityRegistry) -> usize {
        self.eligible.clear();
        let mut seen = FxHashSet::default();
        let mut eligible = FxHashSet::default();
        let radius = self.config.chunk_radius;

        for viewer in entities.players().filter(|player| !player.spectator) {
            let center = viewer.block_pos().chunk_pos();
            for dx in -radius..=radius {
                for dz in -radius..=radius {
                    let pos = ChunkPos::new(center.x() + dx, center.z() + dz);
                    seen.insert(pos);
                    let edge = dx.abs() == radius || dz.abs() == radius;
                    if !edge
                        && !eligible.contains(&pos)
                        && world.border().contains_chunk(pos)
                        && world.is_chunk_ticking(pos)
                    {
                        eligible.insert(pos);
                        self.eligible.push(pos);
                    }
                }
            }
        }
        seen.len()
    }

    /// Runs one spawner pass and returns the creatures it placed, ready to be
    /// added to the registry.
    pub fn plan(
        &mut self,
        world: &dyn SpawnWorld,
        entities: &EntityRegistry,
        flags: SpawnFlags,
        random: &mut LegacyRandom,
    ) -> Vec<Entity> {
        let mut planned = Vec::new();
        if !flags.hostile && !flags.peaceful {
            return planned;
        }

        let chunk_count = self.collect_eligible(world, entities) as u64;
        for category in MobCategory::ALL {
            if !flags.allows(category) {
                continue;
            }
            let population = entities.count_by_category(category) as u64;
            let cap = u64::from(category.max_count()) * chunk_count / MOB_COUNT_DIV;
            if population >= cap {
                log::trace!("Skipping {} spawning, {population}/{cap}", category.name());
                continue;
            }

            let before = planned.len();
            for &chunk in &self.eligible {
                self.spawn_in_chunk(world, entities, category, chunk, random, &mut planned);
            }
            log::trace!(
                "Planned {} {} in {} chunks",
                planned.len() - before,
                category.name(),
                self.eligible.len()
            );
        }
        planned
    }

    fn spawn_in_chunk(
        &self,
        world: &dyn SpawnWorld,
        entities: &EntityRegistry,
        category: MobCategory,
        chunk: ChunkPos,
        random: &mut LegacyRandom,
        planned: &mut Vec<Entity>,
    ) {
        let start = random_position(world, chunk, random);
        if world.properties(start).full_cube {
            return;
        }

        let step = self.config.step_bound;
        let min_spawn_distance_sq = self.config.min_spawn_distance * self.config.min_spawn_distance;
        let spawn = world.spawn_point();
        let mut placed = 0;

        for _ in 0..self.config.group_attempts {
            let (mut x, y, mut z) = (start.x(), start.y(), start.z());
            let mut chosen: Option<(EntityKind, &'static dyn EntityBehaviour)> = None;
            let cluster = (random.next_f64() * f64::from(self.config.max_cluster_size)).ceil() as u32;

            for _ in 0..cluster {
                x += random.next_i32_bounded(step) - random.next_i32_bounded(step);
                z += random.next_i32_bounded(step) - random.next_i32_bounded(step);
                let pos = BlockPos::new(x, y, z);
                let (fx, fz) = (f64::from(x) + 0.5, f64::from(z) + 0.5);

                if self.is_near_player(entities, fx, fz) {
                    continue;
                }
                let (dx, dy, dz) = (
                    f64::from(spawn.x()) - fx,
                    f64::from(spawn.y() - y),
                    f64::from(spawn.z()) - fz,
                );
                if dx * dx + dy * dy + dz * dz < min_spawn_distance_sq {
                    continue;
                }

                let (kind, behaviour) = if let Some(chosen) = chosen {
                    chosen
                } else {
                    let Some(entry) = pick_weighted(world.spawn_entries(category), random) else {
                        break;
                    };
                    let Some(behaviour) = entities.types().get(entry.kind) else {
                        break;
                    };
                    chosen = Some((entry.kind, behaviour));
                    (entry.kind, behaviour)
                };

                if !can_spawn_at(behaviour.placement(), world, pos) {
                    continue;
                }

                let mut entity = Entity::new(random_uuid(random), kind, Vector3::new(fx, f64::from(y), fz));
                entity.yaw = random.next_f32() * 360.0;

                if behaviour.can_spawn_here(world, pos, random)
                    && is_not_colliding(world, entities, planned, behaviour, entity.position)
                {
                    planned.push(entity);
                    placed += 1;
                    if placed >= behaviour.max_per_chunk() {
                        return;
                    }
                }
            }
        }
    }

    fn is_near_player(&self, entities: &EntityRegistry, x: f64, z: f64) -> bool {
        let range_sq = self.config.min_player_distance * self.config.min_player_distance;
        entities
            .players()
            .any(|player| !player.spectator && player.horizontal_distance_sq(x, z) < range_sq)
    }

    /// Places groups of passive creatures on the ground of a freshly generated chunk.
    ///
    /// Groups keep coming while a roll stays below the world's spawn chance.
    /// Every member gets a few tries, wandering inside the chunk between them.
    pub fn spawn_initial_creatures(
        world: &dyn SpawnWorld,
        chunk: ChunkPos,
        random: &mut LegacyRandom,
    ) -> Vec<Entity> {
        let mut placed = Vec::new();
        let entries = world.spawn_entries(MobCategory::Creature);
        if entries.is_empty() {
            return placed;
        }

        let (min_x, min_z) = (chunk.min_block_x(), chunk.min_block_z());
        let inside = |x: i32, z: i32| (min_x..min_x + 16).contains(&x) && (min_z..min_z + 16).contains(&z);

        while random.next_f32() < world.spawn_chance() {
            let Some(entry) = pick_weighted(entries, random) else {
                break;
            };
            let spread = entry.max_group.saturating_sub(entry.min_group) as i32;
            let count = entry.min_group + random.next_i32_bounded(spread + 1) as u32;
            let start_x = min_x + random.next_i32_bounded(16);
            let start_z = min_z + random.next_i32_bounded(16);
            let (mut x, mut z) = (start_x, start_z);

            for _ in 0..count {
                for _ in 0..INITIAL_PLACEMENT_TRIES {
                    let ground = top_solid_or_liquid(world, x, z);
                    let spawned = can_spawn_at(SpawnPlacement::OnGround, world, ground);
                    if spawned {
                        let position = Vector3::new(f64::from(x) + 0.5, f64::from(ground.y()), f64::from(z) + 0.5);
                        let mut entity = Entity::new(random_uuid(random), entry.kind, position);
                        entity.yaw = random.next_f32() * 360.0;
                        placed.push(entity);
                    }

                    x += random.next_i32_bounded(5) - random.next_i32_bounded(5);
                    z += random.next_i32_bounded(5) - random.next_i32_bounded(5);
                    while !inside(x, z) {
                        x = start_x + random.next_i32_bounded(5) - random.next_i32_bounded(5);
                        z = start_z + random.next_i32_bounded(5) - random.next_i32_bounded(5);
                    }

                    if spawned {
                        break;
                    }
                }
            }
        }
        placed
    }
}

/// A random cell of `chunk`, below the rounded up surface height of its column.
fn random_position(world: &dyn SpawnWorld, chunk: ChunkPos, random: &mut LegacyRandom) -> BlockPos {
    let x = chunk.min_block_x() + random.next_i32_bounded(16);
    let z = chunk.min_block_z() + random.next_i32_bounded(16);
    let bound = round_up_to_section(world.height(x, z) + 1);
    BlockPos::new(x, random.next_i32_bounded(bound), z)
}

fn round_up_to_section(value: i32) -> i32 {
    if value <= 0 {
        return 16;
    }
    (value + 15) / 16 * 16
}

fn random_uuid(random: &mut LegacyRandom) -> Uuid {
    let mut bytes = [0u8; 16];
    bytes[..8].copy_from_slice(&random.next_i64().to_be_bytes());
    bytes[8..].copy_from_slice(&random.next_i64().to_be_bytes());
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

/// The first cell of the column at `(x, z)` standing on a solid top face,
/// scanning down from the highest filled section.
pub fn top_solid_or_liquid(world: &dyn SpawnWorld, x: i32, z: i32) -> BlockPos {
    let top = world
        .chunk_at(ChunkPos::from_block(x, z))
        .map_or(WORLD_HEIGHT, |chunk| chunk.top_filled_section_y() + 16);
    for y in (1..=top.min(WORLD_HEIGHT)).rev() {
        if world.properties(BlockPos::new(x, y - 1, z)).solid_top {
            return BlockPos::new(x, y, z);
        }
    }
    BlockPos::new(x, 0, z)
}

/// Whether a creature may stand inside this block.
fn is_free_for_spawning(properties: &BlockProperties) -> bool {
    !properties.full_cube && !properties.blocks_spawning && !properties.liquid
}

/// Whether the blocks around `pos` allow a creature placed by `placement`.
pub fn can_spawn_at(placement: SpawnPlacement, world: &dyn SpawnWorld, pos: BlockPos) -> bool {
    if !world.border().contains_block(pos) {
        return false;
    }
    match placement {
        SpawnPlacement::InWater => {
            world.properties(pos).liquid
                && world.properties(pos.below()).liquid
                && !world.properties(pos.above()).full_cube
        }
        SpawnPlacement::OnGround => {
            let ground = world.properties(pos.below());
            ground.solid_top
                && ground.spawnable_surface
                && is_free_for_spawning(world.properties(pos))
                && is_free_for_spawning(world.properties(pos.above()))
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Aabb {
    min: Vector3<f64>,
    max: Vector3<f64>,
}

impl Aabb {
    fn at(position: Vector3<f64>, (width, height): (f64, f64)) -> Self {
        let half = width / 2.0;
        Self {
            min: Vector3::new(position.x - half, position.y, position.z - half),
            max: Vector3::new(position.x + half, position.y + height, position.z + half),
        }
    }

    fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }
}

/// Whether a new creature at `position` overlaps nothing it may not overlap.
///
/// Ground creatures avoid full cubes, liquids and other entities. Water
/// creatures only avoid other entities.
fn is_not_colliding(
    world: &dyn SpawnWorld,
    entities: &EntityRegistry,
    planned: &[Entity],
    behaviour: &dyn EntityBehaviour,
    position: Vector3<f64>,
) -> bool {
    let bounds = Aabb::at(position, behaviour.size());

    if behaviour.placement() == SpawnPlacement::OnGround {
        let (min_x, max_x) = (bounds.min.x.floor() as i32, bounds.max.x.ceil() as i32);
        let (min_y, max_y) = (bounds.min.y.floor() as i32, bounds.max.y.ceil() as i32);
        let (min_z, max_z) = (bounds.min.z.floor() as i32, bounds.max.z.ceil() as i32);
        for x in min_x..max_x {
            for y in min_y..max_y {
                for z in min_z..max_z {
                    let properties = world.properties(BlockPos::new(x, y, z));
                    if properties.full_cube || properties.liquid {
                        return false;
                    }
                }
            }
        }
    }

    !entities.iter().chain(planned).any(|other| {
        !other.is_dead()
            && entities
                .types()
                .get(other.kind)
                .is_some_and(|other_type| bounds.intersects(&Aabb::at(other.position, other_type.size())))
    })
}
