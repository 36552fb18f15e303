use kiln_utils::{ChunkPos, types::{SECTION_COUNT, WORLD_HEIGHT}};
use rustc_hash::FxHashSet;

use crate::behavior::{BlockKind, BlockRegistry};
use crate::chunk::{LightChannel, LightStorage};
use crate::entity::EntityId;

const COLUMN_COUNT: usize = 16 * 16;
const BLOCK_COUNT: usize = COLUMN_COUNT * WORLD_HEIGHT as usize;

#[inline]
const fn block_index(x: usize, y: usize, z: usize) -> usize {
    y << 8 | z << 4 | x
}

/// A loaded chunk: blocks, light, height map and the ids of the entities filed under it.
///
/// All coordinates taken by the methods are chunk-relative: `x` and `z` in `0..16`,
/// `y` in `0..256`.
#[derive(Debug, Clone)]
pub struct LevelChunk {
    /// The position of the chunk.
    pub pos: ChunkPos,
    blocks: Box<[BlockKind]>,
    sky_light: [LightStorage; SECTION_COUNT],
    block_light: [LightStorage; SECTION_COUNT],
    /// Per column, one above the highest block with non-zero opacity.
    height_map: [i32; COLUMN_COUNT],
    entities: [FxHashSet<EntityId>; SECTION_COUNT],
    /// Whether world generation spawning ran for this chunk.
    pub populated: bool,
    /// Whether the chunk has been modified since last save.
    pub dirty: bool,
}

impl LevelChunk {
    /// Creates an empty chunk, fully sky lit.
    #[must_use]
    pub fn new(pos: ChunkPos) -> Self {
        Self {
            pos,
            blocks: vec![BlockKind::AIR; BLOCK_COUNT].into_boxed_slice(),
            sky_light: std::array::from_fn(|_| LightStorage::new_filled(15)),
            block_light: std::array::from_fn(|_| LightStorage::new_empty()),
            height_map: [0; COLUMN_COUNT],
            entities: std::array::from_fn(|_| FxHashSet::default()),
            populated: false,
            dirty: false,
        }
    }

    /// Gets the block at a relative position.
    #[must_use]
    pub fn block(&self, x: usize, y: usize, z: usize) -> BlockKind {
        self.blocks[block_index(x, y, z)]
    }

    /// Writes a block without touching height map or light. Used by generators.
    pub fn fill_block(&mut self, x: usize, y: usize, z: usize, kind: BlockKind) {
        self.blocks[block_index(x, y, z)] = kind;
    }

    /// Sets a block and keeps the height map current.
    ///
    /// Returns the previous kind and the column height before the change.
    pub fn set_block(
        &mut self,
        x: usize,
        y: usize,
        z: usize,
        kind: BlockKind,
        registry: &BlockRegistry,
    ) -> (BlockKind, i32) {
        let index = block_index(x, y, z);
        let old = self.blocks[index];
        let old_height = self.height_map[z << 4 | x];
        if old == kind {
            return (old, old_height);
        }
        self.blocks[index] = kind;
        self.dirty = true;

        let y = y as i32;
        if registry.properties(kind).opacity > 0 {
            if y >= old_height {
                self.height_map[z << 4 | x] = y + 1;
            }
        } else if y == old_height - 1 {
            self.height_map[z << 4 | x] = self.scan_height(x, y, z, registry);
        }
        (old, old_height)
    }

    fn scan_height(&self, x: usize, from_y: i32, z: usize, registry: &BlockRegistry) -> i32 {
        (0..from_y)
            .rev()
            .find(|y| registry.properties(self.block(x, *y as usize, z)).opacity > 0)
            .map_or(0, |y| y + 1)
    }

    /// Rebuilds the height map and the initial sky light from the blocks.
    ///
    /// Sky light falls straight down from the top, losing each block's opacity
    /// and at least one level per block once it has been dimmed.
    pub fn generate_sky_light(&mut self, registry: &BlockRegistry, has_sky: bool) {
        for storage in &mut self.sky_light {
            *storage = LightStorage::new_empty();
        }

        for z in 0..16 {
            for x in 0..16 {
                let height = self.scan_height(x, WORLD_HEIGHT, z, registry);
                self.height_map[z << 4 | x] = height;
                if !has_sky {
                    continue;
                }

                let mut level: i32 = 15;
                for y in (0..WORLD_HEIGHT as usize).rev() {
                    let mut opacity = i32::from(registry.properties(self.block(x, y, z)).opacity);
                    if opacity == 0 && level != 15 {
                        opacity = 1;
                    }
                    level -= opacity;
                    if level <= 0 {
                        break;
                    }
                    self.set_light(LightChannel::Sky, x, y, z, level as u8);
                }
            }
        }
        for storage in &mut self.sky_light {
            storage.compact();
        }
    }

    /// Gets a stored light value.
    #[must_use]
    pub fn light(&self, channel: LightChannel, x: usize, y: usize, z: usize) -> u8 {
        let storage = match channel {
            LightChannel::Sky => &self.sky_light[y >> 4],
            LightChannel::Block => &self.block_light[y >> 4],
        };
        storage.get(x, y & 15, z)
    }

    /// Stores a light value, saturating at 15.
    pub fn set_light(&mut self, channel: LightChannel, x: usize, y: usize, z: usize, level: u8) {
        let storage = match channel {
            LightChannel::Sky => &mut self.sky_light[y >> 4],
            LightChannel::Block => &mut self.block_light[y >> 4],
        };
        storage.set(x, y & 15, z, level);
        self.dirty = true;
    }

    /// One above the highest light-blocking block in the column.
    #[must_use]
    pub fn height(&self, x: usize, z: usize) -> i32 {
        self.height_map[z << 4 | x]
    }

    /// Whether the cell has no light-blocking block above it.
    #[must_use]
    pub fn can_see_sky(&self, x: usize, y: i32, z: usize) -> bool {
        y >= self.height(x, z)
    }

    /// Base y of the highest section containing a non-air block, or `0` when empty.
    #[must_use]
    pub fn top_filled_section_y(&self) -> i32 {
        (0..SECTION_COUNT)
            .rev()
            .find(|section| {
                let start = section * 16 * COLUMN_COUNT;
                self.blocks[start..start + 16 * COLUMN_COUNT]
                    .iter()
                    .any(|kind| !kind.is_air())
            })
            .map_or(0, |section| section as i32 * 16)
    }

    /// Files an entity under a section.
    pub fn add_entity(&mut self, section_y: i32, id: EntityId) {
        self.entities[section_index(section_y)].insert(id);
    }

    /// Removes an entity from a section. Returns whether it was present.
    pub fn remove_entity(&mut self, section_y: i32, id: EntityId) -> bool {
        self.entities[section_index(section_y)].remove(&id)
    }

    /// The ids filed under a section.
    #[must_use]
    pub fn entities_in_section(&self, section_y: i32) -> &FxHashSet<EntityId> {
        &self.entities[section_index(section_y)]
    }

    /// Every entity id filed under this chunk.
    pub fn entity_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().flat_map(|section| section.iter().copied())
    }

    /// Empties every section and returns the ids that were filed.
    pub fn take_entity_ids(&mut self) -> Vec<EntityId> {
        self.entities
            .iter_mut()
            .flat_map(|section| section.drain())
            .collect()
    }
}

fn section_index(section_y: i32) -> usize {
    section_y.clamp(0, SECTION_COUNT as i32 - 1) as usize
}
