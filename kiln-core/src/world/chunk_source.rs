//! The collaborator that produces and stores chunks.

use kiln_utils::ChunkPos;
use rustc_hash::FxHashMap;

use crate::behavior::{BlockKind, BlockRegistry, vanilla};
use crate::chunk::LevelChunk;
use crate::entity::EntityRecord;
use crate::ticks::ScheduledTick;

/// World state stored alongside a chunk's blocks.
#[derive(Debug, Clone, Default)]
pub struct SavedState {
    /// Scheduled updates that belonged to the chunk.
    pub pending_ticks: Vec<ScheduledTick<BlockKind>>,
    /// World time of the save, used to keep the remaining delays.
    pub saved_at: u64,
    /// Entities that were filed under the chunk.
    pub entities: Vec<EntityRecord>,
}

/// A chunk handed back by a [`ChunkSource`].
#[derive(Debug)]
pub struct StoredChunk {
    /// The chunk itself.
    pub chunk: LevelChunk,
    /// What was pending in it when it was saved.
    pub state: SavedState,
}

/// Generates new chunks and keeps the ones that were unloaded.
pub trait ChunkSource: Send {
    /// Whether the chunk was generated before.
    fn chunk_exists(&self, pos: ChunkPos) -> bool;

    /// Loads or generates the chunk at `pos`.
    fn provide_chunk(&mut self, pos: ChunkPos, registry: &BlockRegistry, has_sky: bool)
    -> StoredChunk;

    /// Keeps an unloaded chunk.
    fn save_chunk(&mut self, stored: StoredChunk);

    /// The pending state of every chunk kept while unloaded.
    fn saved_states(&self) -> Vec<(ChunkPos, &SavedState)>;

    /// Attaches a state read back from a snapshot to the chunk at `pos`, to be
    /// handed out with it on its next load.
    fn restore_state(&mut self, pos: ChunkPos, state: SavedState);
}

/// Generates a flat world and keeps unloaded chunks in memory.
pub struct FlatChunkSource {
    /// Block kinds from `y = 0` upwards.
    layers: Vec<BlockKind>,
    saved: FxHashMap<ChunkPos, StoredChunk>,
    /// States of chunks that were unloaded when the snapshot was taken.
    restored: FxHashMap<ChunkPos, SavedState>,
}

impl FlatChunkSource {
    /// Creates a source stacking `layers` from the bottom of the world.
    #[must_use]
    pub fn new(layers: Vec<BlockKind>) -> Self {
        Self {
            layers,
            saved: FxHashMap::default(),
            restored: FxHashMap::default(),
        }
    }

    /// Bedrock, two layers of dirt and grass.
    #[must_use]
    pub fn classic() -> Self {
        Self::new(vec![
            vanilla::BEDROCK,
            vanilla::DIRT,
            vanilla::DIRT,
            vanilla::GRASS,
        ])
    }

    fn generate(&self, pos: ChunkPos, registry: &BlockRegistry, has_sky: bool) -> LevelChunk {
        let mut chunk = LevelChunk::new(pos);
        for (y, kind) in self.layers.iter().enumerate() {
            for z in 0..16 {
                for x in 0..16 {
                    chunk.fill_block(x, y, z, *kind);
                }
            }
        }
        chunk.generate_sky_light(registry, has_sky);
        chunk
    }
}

impl ChunkSource for FlatChunkSource {
    fn chunk_exists(&self, pos: ChunkPos) -> bool {
        self.saved.contains_key(&pos) || self.restored.contains_key(&pos)
    }

    fn provide_chunk(
        &mut self,
        pos: ChunkPos,
        registry: &BlockRegistry,
        has_sky: bool,
    ) -> StoredChunk {
        if let Some(stored) = self.saved.remove(&pos) {
            return stored;
        }
        if let Some(state) = self.restored.remove(&pos) {
            // Blocks are not part of a snapshot; the chunk comes back as generated.
            let mut chunk = self.generate(pos, registry, has_sky);
            chunk.populated = true;
            return StoredChunk { chunk, state };
        }
        StoredChunk {
            chunk: self.generate(pos, registry, has_sky),
            state: SavedState::default(),
        }
    }

    fn save_chunk(&mut self, stored: StoredChunk) {
        self.restored.remove(&stored.chunk.pos);
        self.saved.insert(stored.chunk.pos, stored);
    }

    fn saved_states(&self) -> Vec<(ChunkPos, &SavedState)> {
        self.saved
            .iter()
            .map(|(pos, stored)| (*pos, &stored.state))
            .chain(self.restored.iter().map(|(pos, state)| (*pos, state)))
            .collect()
    }

    fn restore_state(&mut self, pos: ChunkPos, state: SavedState) {
        if let Some(stored) = self.saved.get_mut(&pos) {
            stored.state = state;
        } else {
            self.restored.insert(pos, state);
        }
    }
}
