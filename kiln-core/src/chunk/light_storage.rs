//! Light storage for chunk sections.
//!
//! Light values are stored as 4-bit values (0-15), packed as two values per byte.
//! For a 16x16x16 section, this requires 2048 bytes (4096 blocks / 2).

/// The number of bytes needed to store light data for a 16x16x16 section.
pub const LIGHT_ARRAY_SIZE: usize = 2048;

/// Storage for light data in a chunk section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LightStorage {
    /// All cells in the section have the same light level.
    Homogeneous(u8),
    /// Cells differ, stored as packed nibbles.
    Heterogeneous(Box<[u8; LIGHT_ARRAY_SIZE]>),
}

#[inline]
const fn nibble_index(x: usize, y: usize, z: usize) -> (usize, bool) {
    let block_index = y * 256 + z * 16 + x;
    (block_index >> 1, (block_index & 1) == 1)
}

impl LightStorage {
    /// Creates a storage with every cell at `light_level`.
    #[must_use]
    pub fn new_filled(light_level: u8) -> Self {
        Self::Homogeneous(light_level.min(15))
    }

    /// Creates a dark storage.
    #[must_use]
    pub fn new_empty() -> Self {
        Self::Homogeneous(0)
    }

    /// Gets the light level at the given section-relative position.
    #[must_use]
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> u8 {
        debug_assert!(x < 16 && y < 16 && z < 16, "Coordinates must be 0-15");

        match self {
            Self::Homogeneous(level) => *level,
            Self::Heterogeneous(data) => {
                let (byte_index, upper) = nibble_index(x, y, z);
                if upper {
                    (data[byte_index] >> 4) & 0x0F
                } else {
                    data[byte_index] & 0x0F
                }
            }
        }
    }

    /// Sets the light level at the given position, saturating at 15.
    ///
    /// A homogeneous storage is upgraded when a differing value is written.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, z: usize, light_level: u8) {
        debug_assert!(x < 16 && y < 16 && z < 16, "Coordinates must be 0-15");
        let light_level = light_level.min(15);

        if let Self::Homogeneous(current) = self {
            if *current == light_level {
                return;
            }
            let packed = *current | (*current << 4);
            *self = Self::Heterogeneous(Box::new([packed; LIGHT_ARRAY_SIZE]));
        }

        if let Self::Heterogeneous(data) = self {
            let (byte_index, upper) = nibble_index(x, y, z);
            data[byte_index] = if upper {
                (data[byte_index] & 0x0F) | (light_level << 4)
            } else {
                (data[byte_index] & 0xF0) | light_level
            };
        }
    }

    /// Collapses back to a homogeneous storage when every cell is equal.
    pub fn compact(&mut self) {
        if let Self::Heterogeneous(data) = self {
            let first = data[0];
            if (first & 0x0F) == (first >> 4) && data.iter().all(|byte| *byte == first) {
                *self = Self::Homogeneous(first & 0x0F);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_homogeneous_get() {
        let storage = LightStorage::new_filled(15);
        assert_eq!(storage.get(0, 0, 0), 15);
        assert_eq!(storage.get(15, 15, 15), 15);
    }

    #[test]
    fn test_set_upgrades_to_heterogeneous() {
        let mut storage = LightStorage::new_filled(3);
        storage.set(5, 5, 5, 14);

        assert_eq!(storage.get(5, 5, 5), 14);
        assert_eq!(storage.get(0, 0, 0), 3);
        assert!(matches!(storage, LightStorage::Heterogeneous(_)));
    }

    #[test]
    fn test_packed_nibbles() {
        let mut storage = LightStorage::new_empty();

        // Two adjacent cells share a byte.
        storage.set(0, 0, 0, 5);
        storage.set(1, 0, 0, 10);

        assert_eq!(storage.get(0, 0, 0), 5);
        assert_eq!(storage.get(1, 0, 0), 10);
    }

    #[test]
    fn test_writes_saturate() {
        let mut storage = LightStorage::new_empty();
        storage.set(2, 3, 4, 200);
        assert_eq!(storage.get(2, 3, 4), 15);
        assert_eq!(LightStorage::new_filled(99).get(0, 0, 0), 15);
    }

    #[test]
    fn test_compact() {
        let mut storage = LightStorage::new_empty();
        storage.set(7, 7, 7, 9);
        storage.set(7, 7, 7, 0);
        storage.compact();
        assert_eq!(storage, LightStorage::Homogeneous(0));
    }
}
