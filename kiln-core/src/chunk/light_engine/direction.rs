//! Block faces and the orders neighbors are walked in.

use kiln_utils::BlockPos;

/// A face of a block.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// -Y
    Down,
    /// +Y
    Up,
    /// -Z
    North,
    /// +Z
    South,
    /// -X
    West,
    /// +X
    East,
}

/// Unit steps, indexed by ordinal.
const STEPS: [(i32, i32, i32); 6] = [
    (0, -1, 0),
    (0, 1, 0),
    (0, 0, -1),
    (0, 0, 1),
    (-1, 0, 0),
    (1, 0, 0),
];

impl Direction {
    /// Order the light flood visits neighbors in.
    pub const ALL: [Direction; 6] = [
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Order a block change notifies its neighbors in: the x axis, then y, then z.
    pub const UPDATE_ORDER: [Direction; 6] = [
        Direction::West,
        Direction::East,
        Direction::Down,
        Direction::Up,
        Direction::North,
        Direction::South,
    ];

    /// The block touching `pos` through this face.
    #[must_use]
    pub const fn relative(self, pos: BlockPos) -> BlockPos {
        let (dx, dy, dz) = STEPS[self as usize];
        pos.offset(dx, dy, dz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_touch_one_face_each() {
        let pos = BlockPos::new(-3, 70, 12);
        let mut seen = Vec::new();
        for dir in Direction::ALL {
            let neighbor = dir.relative(pos);
            assert_eq!(neighbor.manhattan_distance(&pos), 1, "{dir:?}");
            assert!(!seen.contains(&neighbor));
            seen.push(neighbor);
        }
    }

    #[test]
    fn test_update_order_walks_axes_in_turn() {
        let pos = BlockPos::new(0, 5, 0);
        let visited: Vec<_> = Direction::UPDATE_ORDER
            .iter()
            .map(|dir| dir.relative(pos))
            .collect();
        assert_eq!(
            visited,
            vec![
                BlockPos::new(-1, 5, 0),
                BlockPos::new(1, 5, 0),
                BlockPos::new(0, 4, 0),
                BlockPos::new(0, 6, 0),
                BlockPos::new(0, 5, -1),
                BlockPos::new(0, 5, 1),
            ]
        );
    }

    #[test]
    fn test_light_order_starts_below() {
        let pos = BlockPos::new(8, 64, 8);
        assert_eq!(Direction::ALL[0].relative(pos), pos.below());
        assert_eq!(Direction::ALL[1].relative(pos), pos.above());
    }
}
