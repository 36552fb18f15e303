// Wrapper types making it harder to accidentaly use the wrong underlying type.

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::math::{vector2::Vector2, vector3::Vector3};

/// Height of the world in blocks. Valid `y` values are `0..WORLD_HEIGHT`.
pub const WORLD_HEIGHT: i32 = 256;
/// Number of 16 block tall sections stacked in one chunk.
pub const SECTION_COUNT: usize = (WORLD_HEIGHT / 16) as usize;

/// A chunk position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPos(pub Vector2<i32>);

/// An immutable block position. This is the only position type that may be used as a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos(pub Vector3<i32>);

/// A section position, the 16x16x16 cell an entity is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionPos(pub Vector3<i32>);

impl ChunkPos {
    /// Creates a new `ChunkPos`.
    #[must_use]
    pub const fn new(x: i32, z: i32) -> Self {
        Self(Vector2::new(x, z))
    }

    /// The chunk x coordinate.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.0.x
    }

    /// The chunk z coordinate.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.0.z
    }

    /// The chunk containing the given block coordinates.
    #[must_use]
    pub const fn from_block(x: i32, z: i32) -> Self {
        Self::new(x >> 4, z >> 4)
    }

    /// The lowest block x inside this chunk.
    #[must_use]
    pub const fn min_block_x(&self) -> i32 {
        self.0.x << 4
    }

    /// The lowest block z inside this chunk.
    #[must_use]
    pub const fn min_block_z(&self) -> i32 {
        self.0.z << 4
    }
}

impl Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.0.x, self.0.z)
    }
}

impl BlockPos {
    /// Creates a new `BlockPos`.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// The x coordinate.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.0.x
    }

    /// The y coordinate.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.0.y
    }

    /// The z coordinate.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.0.z
    }

    /// Returns a position shifted by the given amounts.
    #[must_use]
    pub const fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.0.x + dx, self.0.y + dy, self.0.z + dz)
    }

    /// Shorthand for `offset(0, 1, 0)`.
    #[must_use]
    pub const fn above(&self) -> Self {
        self.offset(0, 1, 0)
    }

    /// Shorthand for `offset(0, -1, 0)`.
    #[must_use]
    pub const fn below(&self) -> Self {
        self.offset(0, -1, 0)
    }

    /// The chunk this position lies in.
    #[must_use]
    pub const fn chunk_pos(&self) -> ChunkPos {
        ChunkPos::from_block(self.0.x, self.0.z)
    }

    /// Whether `y` lies inside `0..WORLD_HEIGHT`.
    #[must_use]
    pub const fn is_valid_height(&self) -> bool {
        self.0.y >= 0 && self.0.y < WORLD_HEIGHT
    }

    /// Sum of the absolute per-axis differences.
    #[must_use]
    pub const fn manhattan_distance(&self, other: &BlockPos) -> i32 {
        (self.0.x - other.0.x).abs() + (self.0.y - other.0.y).abs() + (self.0.z - other.0.z).abs()
    }
}

impl Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.0.x, self.0.y, self.0.z)
    }
}

impl SectionPos {
    /// Creates a new `SectionPos`.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self(Vector3::new(x, y, z))
    }

    /// The section an entity at the given coordinates belongs to.
    ///
    /// The section y is clamped into the chunk's section range.
    #[must_use]
    pub fn of_entity(x: f64, y: f64, z: f64) -> Self {
        let cx = (x / 16.0).floor() as i32;
        let cz = (z / 16.0).floor() as i32;
        let cy = ((y / 16.0).floor() as i32).clamp(0, SECTION_COUNT as i32 - 1);
        Self::new(cx, cy, cz)
    }

    /// The chunk column of this section.
    #[must_use]
    pub const fn chunk(&self) -> ChunkPos {
        ChunkPos::new(self.0.x, self.0.z)
    }

    /// The section index inside its chunk.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.0.y
    }
}

/// A reusable, mutable position used while walking through space.
///
/// Implements neither `Hash` nor `Eq`.
/// Call [`BlockCursor::to_block_pos`] to obtain a storable position.
#[derive(Debug, Clone, Default)]
pub struct BlockCursor {
    x: i32,
    y: i32,
    z: i32,
}

impl BlockCursor {
    /// Creates a cursor at the given coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Moves the cursor to absolute coordinates.
    pub fn set(&mut self, x: i32, y: i32, z: i32) -> &mut Self {
        self.x = x;
        self.y = y;
        self.z = z;
        self
    }

    /// Moves the cursor by the given amounts.
    pub fn move_by(&mut self, dx: i32, dy: i32, dz: i32) -> &mut Self {
        self.x += dx;
        self.y += dy;
        self.z += dz;
        self
    }

    /// The x coordinate.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// The y coordinate.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// The z coordinate.
    #[must_use]
    pub const fn z(&self) -> i32 {
        self.z
    }

    /// Copies the current coordinates into an immutable position.
    #[must_use]
    pub const fn to_block_pos(&self) -> BlockPos {
        BlockPos::new(self.x, self.y, self.z)
    }
}

/// Anything that can be turned into a storable [`BlockPos`].
///
/// APIs that retain positions take this trait so callers may hand in a cursor;
/// the implementation copies it and can tell that a copy was needed.
pub trait IntoBlockPos {
    /// True for mutable position handles that must not be retained.
    const IS_CURSOR: bool = false;

    /// Returns an owned copy of the position.
    fn to_block_pos(&self) -> BlockPos;
}

impl IntoBlockPos for BlockPos {
    fn to_block_pos(&self) -> BlockPos {
        *self
    }
}

impl IntoBlockPos for BlockCursor {
    const IS_CURSOR: bool = true;

    fn to_block_pos(&self) -> BlockPos {
        BlockCursor::to_block_pos(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_of_negative_block() {
        let pos = BlockPos::new(-1, 64, -17);
        assert_eq!(pos.chunk_pos(), ChunkPos::new(-1, -2));
        assert_eq!(BlockPos::new(15, 0, 16).chunk_pos(), ChunkPos::new(0, 1));
    }

    #[test]
    fn test_section_of_entity_clamps() {
        assert_eq!(SectionPos::of_entity(-0.5, -20.0, 31.9), SectionPos::new(-1, 0, 1));
        assert_eq!(SectionPos::of_entity(0.0, 300.0, 0.0).y(), 15);
    }

    #[test]
    fn test_cursor_copy_is_detached() {
        let mut cursor = BlockCursor::new(1, 2, 3);
        let stored = IntoBlockPos::to_block_pos(&cursor);
        cursor.move_by(5, 0, 0);
        assert_eq!(stored, BlockPos::new(1, 2, 3));
        assert_eq!(cursor.x(), 6);
        assert!(<BlockCursor as IntoBlockPos>::IS_CURSOR);
        assert!(!<BlockPos as IntoBlockPos>::IS_CURSOR);
    }
}
