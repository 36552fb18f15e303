//! The loaded chunks of a world.

use kiln_utils::{BlockPos, ChunkPos, SectionPos};
use rustc_hash::{FxHashMap, FxHashSet};

use super::chunk_source::{ChunkSource, SavedState, StoredChunk};
use super::spatial_index::SpatialIndex;
use crate::behavior::{BlockKind, BlockRegistry};
use crate::chunk::{LevelChunk, LightChannel};
use crate::entity::{EntityId, EntitySections};

/// Chunks unloaded per tick at most.
pub const UNLOADS_PER_TICK: usize = 100;

/// Owns every loaded chunk and the queue of chunks waiting to be unloaded.
pub struct ChunkMap {
    chunks: FxHashMap<ChunkPos, LevelChunk>,
    source: Box<dyn ChunkSource>,
    unload_queue: Vec<ChunkPos>,
    queued: FxHashSet<ChunkPos>,
}

impl ChunkMap {
    /// Creates an empty map backed by `source`.
    #[must_use]
    pub fn new(source: Box<dyn ChunkSource>) -> Self {
        Self {
            chunks: FxHashMap::default(),
            source,
            unload_queue: Vec::new(),
            queued: FxHashSet::default(),
        }
    }

    /// Whether the chunk is loaded or known to the source.
    #[must_use]
    pub fn chunk_exists(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos) || self.source.chunk_exists(pos)
    }

    /// Loads the chunk at `pos` if needed and cancels a queued unload.
    ///
    /// Returns what was pending in the chunk when it was saved, or `None` if
    /// the chunk was already loaded.
    pub fn load(
        &mut self,
        pos: ChunkPos,
        registry: &BlockRegistry,
        has_sky: bool,
    ) -> Option<SavedState> {
        if self.queued.remove(&pos) {
            self.unload_queue.retain(|queued| *queued != pos);
        }
        if self.chunks.contains_key(&pos) {
            return None;
        }

        let StoredChunk { chunk, state } = self.source.provide_chunk(pos, registry, has_sky);
        log::trace!("Loaded chunk {pos}");
        self.chunks.insert(pos, chunk);
        Some(state)
    }

    /// Marks a loaded chunk for unloading on a later tick.
    pub fn queue_unload(&mut self, pos: ChunkPos) {
        if self.chunks.contains_key(&pos) && self.queued.insert(pos) {
            self.unload_queue.push(pos);
        }
    }

    /// Whether an unload of `pos` is pending.
    #[must_use]
    pub fn is_unload_queued(&self, pos: ChunkPos) -> bool {
        self.queued.contains(&pos)
    }

    /// Removes up to [`UNLOADS_PER_TICK`] queued chunks from the map, oldest first.
    ///
    /// The caller hands each one back through [`ChunkMap::save`] once it has
    /// collected the chunk's pending state.
    pub fn take_unload_queued(&mut self) -> Vec<LevelChunk> {
        let count = self.unload_queue.len().min(UNLOADS_PER_TICK);
        let mut unloaded = Vec::with_capacity(count);
        for pos in self.unload_queue.drain(..count) {
            self.queued.remove(&pos);
            if let Some(chunk) = self.chunks.remove(&pos) {
                unloaded.push(chunk);
            }
        }
        unloaded
    }

    /// Hands an unloaded chunk to the source.
    pub fn save(&mut self, stored: StoredChunk) {
        log::trace!("Unloaded chunk {}", stored.chunk.pos);
        self.source.save_chunk(stored);
    }

    /// Pending state of every unloaded chunk the source keeps.
    #[must_use]
    pub fn saved_states(&self) -> Vec<(ChunkPos, &SavedState)> {
        self.source.saved_states()
    }

    /// Hands a state read from a snapshot to the source. The chunk must not be loaded.
    pub fn restore_saved_state(&mut self, pos: ChunkPos, state: SavedState) {
        self.source.restore_state(pos, state);
    }

    /// The loaded chunk at `pos`, mutably.
    pub fn chunk_mut(&mut self, pos: ChunkPos) -> Option<&mut LevelChunk> {
        self.chunks.get_mut(&pos)
    }

    /// Number of loaded chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether no chunk is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Positions of every loaded chunk, in no particular order.
    pub fn positions(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        self.chunks.keys().copied()
    }

    /// The block at `pos`, air for unloaded or out-of-height cells.
    #[must_use]
    pub fn block(&self, pos: BlockPos) -> BlockKind {
        if !pos.is_valid_height() {
            return BlockKind::AIR;
        }
        let (x, y, z) = relative(pos);
        self.chunks
            .get(&pos.chunk_pos())
            .map_or(BlockKind::AIR, |chunk| chunk.block(x, y, z))
    }

    /// Replaces the block at `pos`. Returns the previous kind, or `None` if
    /// the cell is unloaded or out of height.
    pub fn set_block(&mut self, pos: BlockPos, kind: BlockKind, registry: &BlockRegistry) -> Option<BlockKind> {
        if !pos.is_valid_height() {
            return None;
        }
        let (x, y, z) = relative(pos);
        let chunk = self.chunks.get_mut(&pos.chunk_pos())?;
        let (old, _) = chunk.set_block(x, y, z, kind, registry);
        Some(old)
    }

    /// Stored light of a cell. Cells below the world read like `y = 0`; cells
    /// above it or in unloaded chunks report the channel default.
    #[must_use]
    pub fn light(&self, channel: LightChannel, pos: BlockPos) -> u8 {
        let pos = if pos.y() < 0 {
            BlockPos::new(pos.x(), 0, pos.z())
        } else {
            pos
        };
        if !pos.is_valid_height() {
            return channel.default_level();
        }
        let (x, y, z) = relative(pos);
        self.chunks
            .get(&pos.chunk_pos())
            .map_or(channel.default_level(), |chunk| chunk.light(channel, x, y, z))
    }

    /// Writes a light value. Unloaded or out-of-height cells are ignored.
    pub fn set_light(&mut self, channel: LightChannel, pos: BlockPos, level: u8) {
        if !pos.is_valid_height() {
            return;
        }
        let (x, y, z) = relative(pos);
        if let Some(chunk) = self.chunks.get_mut(&pos.chunk_pos()) {
            chunk.set_light(channel, x, y, z, level);
        }
    }

    /// Whether nothing light-blocking sits above the cell. Unloaded cells see the sky.
    #[must_use]
    pub fn can_see_sky(&self, pos: BlockPos) -> bool {
        let (x, _, z) = relative(pos);
        self.chunks
            .get(&pos.chunk_pos())
            .is_none_or(|chunk| chunk.can_see_sky(x, pos.y(), z))
    }

    /// One above the highest light-blocking block of the column, `0` when unloaded.
    #[must_use]
    pub fn height(&self, x: i32, z: i32) -> i32 {
        self.chunks
            .get(&ChunkPos::from_block(x, z))
            .map_or(0, |chunk| chunk.height((x & 15) as usize, (z & 15) as usize))
    }
}

impl SpatialIndex for ChunkMap {
    fn is_chunk_loaded(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    fn chunk_at(&self, pos: ChunkPos) -> Option<&LevelChunk> {
        self.chunks.get(&pos)
    }
}

impl EntitySections for ChunkMap {
    fn attach(&mut self, section: SectionPos, id: EntityId) -> bool {
        let Some(chunk) = self.chunks.get_mut(&section.chunk()) else {
            return false;
        };
        chunk.add_entity(section.y(), id);
        true
    }

    fn detach(&mut self, section: SectionPos, id: EntityId) {
        if let Some(chunk) = self.chunks.get_mut(&section.chunk()) {
            chunk.remove_entity(section.y(), id);
        }
    }
}

/// Chunk-relative coordinates of `pos`. `y` must be a valid height.
fn relative(pos: BlockPos) -> (usize, usize, usize) {
    (
        (pos.x() & 15) as usize,
        pos.y().clamp(0, 255) as usize,
        (pos.z() & 15) as usize,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::vanilla;
    use crate::world::chunk_source::FlatChunkSource;

    fn map() -> (ChunkMap, BlockRegistry) {
        (
            ChunkMap::new(Box::new(FlatChunkSource::classic())),
            BlockRegistry::vanilla(),
        )
    }

    #[test]
    fn test_load_and_query() {
        let (mut chunks, registry) = map();
        let pos = ChunkPos::new(-1, 2);
        assert!(chunks.load(pos, &registry, true).is_some());
        assert!(chunks.load(pos, &registry, true).is_none());

        assert!(chunks.is_chunk_loaded(pos));
        assert_eq!(chunks.block(BlockPos::new(-1, 3, 40)), vanilla::GRASS);
        assert_eq!(chunks.block(BlockPos::new(5, 3, 40)), BlockKind::AIR);
        assert_eq!(chunks.height(-16, 32), 4);
        assert_eq!(chunks.light(LightChannel::Sky, BlockPos::new(-1, 10, 40)), 15);
        assert_eq!(chunks.light(LightChannel::Sky, BlockPos::new(-1, 2, 40)), 0);
        assert_eq!(chunks.light(LightChannel::Block, BlockPos::new(100, 10, 0)), 0);
        assert_eq!(chunks.light(LightChannel::Sky, BlockPos::new(100, 10, 0)), 15);
    }

    #[test]
    fn test_unload_queue() {
        let (mut chunks, registry) = map();
        let a = ChunkPos::new(0, 0);
        let b = ChunkPos::new(1, 0);
        chunks.load(a, &registry, true);
        chunks.load(b, &registry, true);

        chunks.queue_unload(a);
        chunks.queue_unload(b);
        chunks.queue_unload(a);
        assert!(chunks.is_unload_queued(a));

        // Loading again cancels the unload.
        chunks.load(b, &registry, true);
        assert!(!chunks.is_unload_queued(b));

        let unloaded = chunks.take_unload_queued();
        assert_eq!(unloaded.len(), 1);
        assert_eq!(unloaded[0].pos, a);
        assert!(!chunks.is_chunk_loaded(a));
        assert!(chunks.is_chunk_loaded(b));
    }

    #[test]
    fn test_saved_chunk_exists() {
        let (mut chunks, registry) = map();
        let pos = ChunkPos::new(4, 4);
        chunks.load(pos, &registry, true);
        chunks.queue_unload(pos);
        for chunk in chunks.take_unload_queued() {
            chunks.save(StoredChunk {
                chunk,
                state: SavedState::default(),
            });
        }
        assert!(!chunks.is_chunk_loaded(pos));
        assert!(chunks.chunk_exists(pos));
    }

    #[test]
    fn test_entities_filed_in_loaded_chunks_only() {
        let (mut chunks, registry) = map();
        chunks.load(ChunkPos::new(0, 0), &registry, true);
        let id = EntityId(3);

        assert!(chunks.attach(SectionPos::new(0, 4, 0), id));
        assert!(!chunks.attach(SectionPos::new(1, 4, 0), id));
        let chunk = chunks.chunk_at(ChunkPos::new(0, 0)).expect("loaded");
        assert!(chunk.entities_in_section(4).contains(&id));

        chunks.detach(SectionPos::new(0, 4, 0), id);
        let chunk = chunks.chunk_at(ChunkPos::new(0, 0)).expect("loaded");
        assert_eq!(chunk.entity_ids().count(), 0);
    }

    #[test]
    fn test_set_block_updates_height() {
        let (mut chunks, registry) = map();
        chunks.load(ChunkPos::new(0, 0), &registry, true);

        let old = chunks.set_block(BlockPos::new(2, 20, 2), vanilla::STONE, &registry);
        assert_eq!(old, Some(BlockKind::AIR));
        assert_eq!(chunks.height(2, 2), 21);
        assert_eq!(chunks.set_block(BlockPos::new(40, 20, 2), vanilla::STONE, &registry), None);
        assert_eq!(chunks.set_block(BlockPos::new(2, 300, 2), vanilla::STONE, &registry), None);
    }
}
