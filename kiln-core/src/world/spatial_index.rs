//! The loaded-region predicate every component checks before touching blocks.

use kiln_utils::{BlockPos, ChunkPos, types::WORLD_HEIGHT};

use crate::chunk::LevelChunk;

/// Read-only view of which chunks are loaded.
pub trait SpatialIndex {
    /// Whether the chunk at `pos` is loaded.
    fn is_chunk_loaded(&self, pos: ChunkPos) -> bool;

    /// The loaded chunk at `pos`.
    fn chunk_at(&self, pos: ChunkPos) -> Option<&LevelChunk>;

    /// Whether every chunk touched by the box `min..=max` is loaded.
    ///
    /// A box entirely below or above the world is never loaded.
    fn is_region_loaded(&self, min: BlockPos, max: BlockPos) -> bool {
        if max.y() < 0 || min.y() >= WORLD_HEIGHT {
            return false;
        }
        let from = min.chunk_pos();
        let to = max.chunk_pos();
        (from.x()..=to.x())
            .all(|cx| (from.z()..=to.z()).all(|cz| self.is_chunk_loaded(ChunkPos::new(cx, cz))))
    }

    /// Whether every chunk touched by the cube of `radius` around `center` is loaded.
    fn is_area_loaded(&self, center: BlockPos, radius: i32) -> bool {
        self.is_region_loaded(
            center.offset(-radius, -radius, -radius),
            center.offset(radius, radius, radius),
        )
    }

    /// Whether the chunk and all eight chunks around it are loaded.
    fn is_chunk_ticking(&self, pos: ChunkPos) -> bool {
        (-1..=1).all(|dx| {
            (-1..=1).all(|dz| self.is_chunk_loaded(ChunkPos::new(pos.x() + dx, pos.z() + dz)))
        })
    }
}

#[cfg(test)]
mod tests {
    use rustc_hash::FxHashSet;

    use super::*;

    struct Loaded(FxHashSet<ChunkPos>);

    impl SpatialIndex for Loaded {
        fn is_chunk_loaded(&self, pos: ChunkPos) -> bool {
            self.0.contains(&pos)
        }

        fn chunk_at(&self, _pos: ChunkPos) -> Option<&LevelChunk> {
            None
        }
    }

    fn square(radius: i32) -> Loaded {
        let mut loaded = FxHashSet::default();
        for x in -radius..=radius {
            for z in -radius..=radius {
                loaded.insert(ChunkPos::new(x, z));
            }
        }
        Loaded(loaded)
    }

    #[test]
    fn test_area_crossing_unloaded_chunk() {
        let index = square(1);
        assert!(index.is_area_loaded(BlockPos::new(8, 64, 8), 17));
        assert!(!index.is_area_loaded(BlockPos::new(8, 64, 8), 25));
        assert!(index.is_area_loaded(BlockPos::new(-16, 64, 31), 0));
        assert!(!index.is_area_loaded(BlockPos::new(-17, 64, 31), 0));
    }

    #[test]
    fn test_region_outside_height_is_unloaded() {
        let index = square(1);
        assert!(!index.is_region_loaded(BlockPos::new(0, -5, 0), BlockPos::new(1, -1, 1)));
        assert!(!index.is_region_loaded(BlockPos::new(0, 256, 0), BlockPos::new(1, 300, 1)));
        assert!(index.is_region_loaded(BlockPos::new(0, -5, 0), BlockPos::new(1, 0, 1)));
    }

    #[test]
    fn test_chunk_ticking_needs_neighbors() {
        let index = square(1);
        assert!(index.is_chunk_ticking(ChunkPos::new(0, 0)));
        assert!(!index.is_chunk_ticking(ChunkPos::new(1, 0)));
    }
}
