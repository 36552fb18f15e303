//! Borrowed views of a world handed to the light engine and the spawner.
//!
//! Both are built from disjoint field borrows of [`super::WorldCore`], so the
//! component running against the view can be borrowed mutably at the same time.

use kiln_utils::{BlockPos, ChunkPos};

use super::{ChunkMap, DimensionBehaviour, SpatialIndex, WorldBorder};
use crate::behavior::{BlockKind, BlockProperties, BlockRegistry};
use crate::chunk::LevelChunk;
use crate::chunk::light_engine::{LightAccess, LightChannel};
use crate::difficulty::Difficulty;
use crate::entity::MobCategory;
use crate::spawner::{SpawnEntry, SpawnWorld};

/// Light storage of the loaded chunks, with block properties resolved through the registry.
pub(crate) struct LightView<'a> {
    pub(crate) chunks: &'a mut ChunkMap,
    pub(crate) blocks: &'a BlockRegistry,
}

impl LightAccess for LightView<'_> {
    fn is_area_loaded(&self, center: BlockPos, radius: i32) -> bool {
        SpatialIndex::is_area_loaded(&*self.chunks, center, radius)
    }

    fn light(&self, channel: LightChannel, pos: BlockPos) -> u8 {
        self.chunks.light(channel, pos)
    }

    fn set_light(&mut self, channel: LightChannel, pos: BlockPos, level: u8) {
        self.chunks.set_light(channel, pos, level);
    }

    fn opacity(&self, pos: BlockPos) -> u8 {
        self.blocks.properties(self.chunks.block(pos)).opacity
    }

    fn emission(&self, pos: BlockPos) -> u8 {
        self.blocks.properties(self.chunks.block(pos)).emission
    }

    fn can_see_sky(&self, pos: BlockPos) -> bool {
        self.chunks.can_see_sky(pos)
    }
}

/// Everything the spawner reads, frozen for one pass.
pub(crate) struct SpawnView<'a> {
    pub(crate) chunks: &'a ChunkMap,
    pub(crate) blocks: &'a BlockRegistry,
    pub(crate) dimension: &'a dyn DimensionBehaviour,
    pub(crate) border: &'a WorldBorder,
    pub(crate) spawn_point: BlockPos,
    pub(crate) difficulty: Difficulty,
    pub(crate) sky_darken: u8,
    pub(crate) thundering: bool,
}

impl SpatialIndex for SpawnView<'_> {
    fn is_chunk_loaded(&self, pos: ChunkPos) -> bool {
        self.chunks.is_chunk_loaded(pos)
    }

    fn chunk_at(&self, pos: ChunkPos) -> Option<&LevelChunk> {
        self.chunks.chunk_at(pos)
    }
}

impl SpawnWorld for SpawnView<'_> {
    fn kind(&self, pos: BlockPos) -> BlockKind {
        self.chunks.block(pos)
    }

    fn properties(&self, pos: BlockPos) -> &'static BlockProperties {
        self.blocks.properties(self.chunks.block(pos))
    }

    fn light(&self, channel: LightChannel, pos: BlockPos) -> u8 {
        self.chunks.light(channel, pos)
    }

    fn sky_darken(&self) -> u8 {
        self.sky_darken
    }

    fn is_thundering(&self) -> bool {
        self.thundering
    }

    fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    fn sea_level(&self) -> i32 {
        self.dimension.sea_level()
    }

    fn height(&self, x: i32, z: i32) -> i32 {
        self.chunks.height(x, z)
    }

    fn border(&self) -> &WorldBorder {
        self.border
    }

    fn spawn_point(&self) -> BlockPos {
        self.spawn_point
    }

    fn spawn_entries(&self, category: MobCategory) -> &[SpawnEntry] {
        self.dimension.spawn_entries(category)
    }

    fn spawn_chance(&self) -> f32 {
        self.dimension.spawn_chance()
    }
}
