//! Bit-packed light queue entries.
//!
//! An entry stores a cell relative to the origin of the recompute together with
//! a light level, in a single `u32`:
//!
//! ```text
//! bits  0..6   x offset + 32
//! bits  6..12  y offset + 32
//! bits 12..18  z offset + 32
//! bits 18..22  light level
//! ```
//!
//! Six bits per axis bound a recompute to offsets in `-32..32`.

use kiln_utils::BlockPos;

/// A queued cell, relative to the origin of the current recompute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry(u32);

impl QueueEntry {
    const AXIS_BIAS: i32 = 32;
    const AXIS_MASK: u32 = 0x3F;
    const LEVEL_SHIFT: u32 = 18;

    /// The origin itself at level 0.
    pub const ORIGIN: Self = Self(32 | 32 << 6 | 32 << 12);

    /// Packs `cell` relative to `origin`.
    #[must_use]
    #[inline]
    pub fn new(cell: BlockPos, origin: BlockPos, level: u8) -> Self {
        let pack = |delta: i32| {
            debug_assert!((-32..32).contains(&delta), "offset out of range");
            (delta + Self::AXIS_BIAS) as u32 & Self::AXIS_MASK
        };
        Self(
            pack(cell.x() - origin.x())
                | pack(cell.y() - origin.y()) << 6
                | pack(cell.z() - origin.z()) << 12
                | u32::from(level.min(15)) << Self::LEVEL_SHIFT,
        )
    }

    /// The origin at the given level.
    #[must_use]
    #[inline]
    pub const fn origin_with_level(level: u8) -> Self {
        Self(Self::ORIGIN.0 | (level as u32 & 0x0F) << Self::LEVEL_SHIFT)
    }

    /// The stored light level.
    #[must_use]
    #[inline]
    pub const fn level(self) -> u8 {
        (self.0 >> Self::LEVEL_SHIFT & 0x0F) as u8
    }

    /// Resolves the absolute position of the entry.
    #[must_use]
    #[inline]
    pub const fn resolve(self, origin: BlockPos) -> BlockPos {
        origin.offset(self.axis(0), self.axis(6), self.axis(12))
    }

    #[inline]
    const fn axis(self, shift: u32) -> i32 {
        ((self.0 >> shift) & Self::AXIS_MASK) as i32 - Self::AXIS_BIAS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_extremes() {
        let origin = BlockPos::new(100, 64, -40);
        for (dx, dy, dz) in [(-32, 0, 31), (17, -17, 0), (0, 0, 0)] {
            let cell = origin.offset(dx, dy, dz);
            let entry = QueueEntry::new(cell, origin, 9);
            assert_eq!(entry.resolve(origin), cell);
            assert_eq!(entry.level(), 9);
        }
    }

    #[test]
    fn test_origin() {
        let origin = BlockPos::new(-5, 3, 7);
        assert_eq!(QueueEntry::ORIGIN.resolve(origin), origin);
        assert_eq!(QueueEntry::ORIGIN.level(), 0);
        assert_eq!(QueueEntry::origin_with_level(12).level(), 12);
        assert_eq!(QueueEntry::origin_with_level(12).resolve(origin), origin);
    }
}
