//! The square limit of the world.

use kiln_utils::{BlockPos, ChunkPos};
use serde::{Deserialize, Serialize};

/// Default border diameter in blocks.
pub const DEFAULT_BORDER_SIZE: f64 = 60_000_000.0;

/// A square centered on `(center_x, center_z)` with side `size`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldBorder {
    /// Center x.
    pub center_x: f64,
    /// Center z.
    pub center_z: f64,
    /// Side length.
    pub size: f64,
}

impl WorldBorder {
    /// Creates a border.
    #[must_use]
    pub const fn new(center_x: f64, center_z: f64, size: f64) -> Self {
        Self {
            center_x,
            center_z,
            size,
        }
    }

    fn min_x(&self) -> f64 {
        self.center_x - self.size / 2.0
    }

    fn max_x(&self) -> f64 {
        self.center_x + self.size / 2.0
    }

    fn min_z(&self) -> f64 {
        self.center_z - self.size / 2.0
    }

    fn max_z(&self) -> f64 {
        self.center_z + self.size / 2.0
    }

    /// Whether any part of the block lies inside.
    #[must_use]
    pub fn contains_block(&self, pos: BlockPos) -> bool {
        let (x, z) = (f64::from(pos.x()), f64::from(pos.z()));
        x + 1.0 > self.min_x() && x < self.max_x() && z + 1.0 > self.min_z() && z < self.max_z()
    }

    /// Whether any part of the chunk lies inside.
    #[must_use]
    pub fn contains_chunk(&self, pos: ChunkPos) -> bool {
        let (x, z) = (f64::from(pos.min_block_x()), f64::from(pos.min_block_z()));
        x + 15.0 > self.min_x() && x < self.max_x() && z + 15.0 > self.min_z() && z < self.max_z()
    }
}

impl Default for WorldBorder {
    fn default() -> Self {
        Self::new(0.0, 0.0, DEFAULT_BORDER_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_border() {
        let border = WorldBorder::new(0.0, 0.0, 32.0);
        assert!(border.contains_block(BlockPos::new(-16, 0, 15)));
        assert!(!border.contains_block(BlockPos::new(16, 0, 0)));
        assert!(!border.contains_block(BlockPos::new(0, 0, -17)));
        assert!(border.contains_chunk(ChunkPos::new(-1, 0)));
        assert!(!border.contains_chunk(ChunkPos::new(1, 0)));
        assert!(!border.contains_chunk(ChunkPos::new(0, -2)));
    }
}
