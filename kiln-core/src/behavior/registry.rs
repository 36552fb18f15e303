//! Registry resolving block kinds to their behaviour.

use super::block::{BlockBehaviour, BlockKind, BlockProperties};
use super::blocks::{AIR_BLOCK, LiquidBlock, NoteBlock, SimpleBlock};

/// Maps every [`BlockKind`] to its behaviour. Built once per world.
pub struct BlockRegistry {
    behaviours: Vec<&'static dyn BlockBehaviour>,
}

impl BlockRegistry {
    /// Creates a registry containing the built-in [`vanilla`] blocks.
    #[must_use]
    pub fn vanilla() -> Self {
        BlockRegistryBuilder::with_vanilla().build()
    }

    /// Gets the behaviour for a kind.
    ///
    /// Unknown kinds resolve to air so a stray id never reaches content code.
    #[must_use]
    pub fn get(&self, kind: BlockKind) -> &'static dyn BlockBehaviour {
        self.behaviours
            .get(usize::from(kind.0))
            .copied()
            .unwrap_or(&AIR_BLOCK)
    }

    /// Shorthand for `get(kind).properties()`.
    #[must_use]
    pub fn properties(&self, kind: BlockKind) -> &'static BlockProperties {
        self.get(kind).properties()
    }

    /// Number of registered kinds, air included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.behaviours.len()
    }

    /// Always false, air is registered by the builder.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.behaviours.is_empty()
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::vanilla()
    }
}

/// Assembles a [`BlockRegistry`]. Kind `0` is always air.
pub struct BlockRegistryBuilder {
    behaviours: Vec<&'static dyn BlockBehaviour>,
}

impl BlockRegistryBuilder {
    /// Creates a builder holding only air.
    #[must_use]
    pub fn new() -> Self {
        let air: &'static dyn BlockBehaviour = &AIR_BLOCK;
        Self {
            behaviours: vec![air],
        }
    }

    /// Creates a builder holding air and the built-in [`vanilla`] blocks.
    #[must_use]
    pub fn with_vanilla() -> Self {
        let mut builder = Self::new();
        vanilla::register(&mut builder);
        builder
    }

    /// Appends a behaviour and returns the kind assigned to it.
    pub fn register(&mut self, behaviour: &'static dyn BlockBehaviour) -> BlockKind {
        let kind = BlockKind(self.behaviours.len() as u16);
        self.behaviours.push(behaviour);
        kind
    }

    /// Assigns a behaviour to a fixed kind, filling any gap with air.
    pub fn assign(&mut self, kind: BlockKind, behaviour: &'static dyn BlockBehaviour) {
        let index = usize::from(kind.0);
        if index >= self.behaviours.len() {
            let air: &'static dyn BlockBehaviour = &AIR_BLOCK;
            self.behaviours.resize(index + 1, air);
        }
        self.behaviours[index] = behaviour;
    }

    /// Finishes the registry.
    #[must_use]
    pub fn build(self) -> BlockRegistry {
        BlockRegistry {
            behaviours: self.behaviours,
        }
    }
}

impl Default for BlockRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The built-in block kinds.
pub mod vanilla {
    use super::{BlockKind, BlockProperties, BlockRegistryBuilder, LiquidBlock, NoteBlock, SimpleBlock};

    /// Air.
    pub const AIR: BlockKind = BlockKind::AIR;
    /// Stone.
    pub const STONE: BlockKind = BlockKind(1);
    /// Grass block.
    pub const GRASS: BlockKind = BlockKind(2);
    /// Dirt.
    pub const DIRT: BlockKind = BlockKind(3);
    /// Bedrock.
    pub const BEDROCK: BlockKind = BlockKind(4);
    /// Water.
    pub const WATER: BlockKind = BlockKind(5);
    /// Glass.
    pub const GLASS: BlockKind = BlockKind(6);
    /// Glowstone.
    pub const GLOWSTONE: BlockKind = BlockKind(7);
    /// Torch.
    pub const TORCH: BlockKind = BlockKind(8);
    /// Leaves.
    pub const LEAVES: BlockKind = BlockKind(9);
    /// Note block.
    pub const NOTE_BLOCK: BlockKind = BlockKind(10);
    /// Barrier.
    pub const BARRIER: BlockKind = BlockKind(11);
    /// Rail.
    pub const RAIL: BlockKind = BlockKind(12);

    static STONE_BLOCK: SimpleBlock = SimpleBlock::new(BlockProperties::solid("stone"));
    static GRASS_BLOCK: SimpleBlock = SimpleBlock::new(BlockProperties::solid("grass"));
    static DIRT_BLOCK: SimpleBlock = SimpleBlock::new(BlockProperties::solid("dirt"));
    static BEDROCK_BLOCK: SimpleBlock =
        SimpleBlock::new(BlockProperties::solid("bedrock").not_spawnable());
    static WATER_BLOCK: LiquidBlock = LiquidBlock::new(
        BlockProperties {
            name: "water",
            opacity: 3,
            emission: 0,
            full_cube: false,
            solid_top: false,
            liquid: true,
            blocks_spawning: false,
            spawnable_surface: false,
        },
        5,
    );
    static GLASS_BLOCK: SimpleBlock = SimpleBlock::new(
        BlockProperties::solid("glass")
            .with_opacity(0)
            .not_full_cube(),
    );
    static GLOWSTONE_BLOCK: SimpleBlock =
        SimpleBlock::new(BlockProperties::solid("glowstone").with_emission(15));
    static TORCH_BLOCK: SimpleBlock = SimpleBlock::new(BlockProperties {
        name: "torch",
        opacity: 0,
        emission: 14,
        full_cube: false,
        solid_top: false,
        liquid: false,
        blocks_spawning: false,
        spawnable_surface: false,
    });
    static LEAVES_BLOCK: SimpleBlock = SimpleBlock::new(
        BlockProperties::solid("leaves")
            .with_opacity(1)
            .not_full_cube(),
    );
    static NOTE_BLOCK_BLOCK: NoteBlock = NoteBlock::new(BlockProperties::solid("note_block"));
    static BARRIER_BLOCK: SimpleBlock = SimpleBlock::new(
        BlockProperties::solid("barrier")
            .with_opacity(0)
            .not_spawnable(),
    );
    static RAIL_BLOCK: SimpleBlock = SimpleBlock::new(BlockProperties {
        name: "rail",
        opacity: 0,
        emission: 0,
        full_cube: false,
        solid_top: false,
        liquid: false,
        blocks_spawning: true,
        spawnable_surface: false,
    });

    pub(super) fn register(builder: &mut BlockRegistryBuilder) {
        builder.assign(STONE, &STONE_BLOCK);
        builder.assign(GRASS, &GRASS_BLOCK);
        builder.assign(DIRT, &DIRT_BLOCK);
        builder.assign(BEDROCK, &BEDROCK_BLOCK);
        builder.assign(WATER, &WATER_BLOCK);
        builder.assign(GLASS, &GLASS_BLOCK);
        builder.assign(GLOWSTONE, &GLOWSTONE_BLOCK);
        builder.assign(TORCH, &TORCH_BLOCK);
        builder.assign(LEAVES, &LEAVES_BLOCK);
        builder.assign(NOTE_BLOCK, &NOTE_BLOCK_BLOCK);
        builder.assign(BARRIER, &BARRIER_BLOCK);
        builder.assign(RAIL, &RAIL_BLOCK);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vanilla_lookup() {
        let registry = BlockRegistry::vanilla();
        assert_eq!(registry.len(), 13);
        assert_eq!(registry.properties(vanilla::STONE).name, "stone");
        assert_eq!(registry.properties(vanilla::GLOWSTONE).emission, 15);
        assert!(registry.properties(vanilla::WATER).liquid);
        assert!(!registry.get(vanilla::WATER).allows_immediate_tick());
    }

    #[test]
    fn test_unknown_kind_is_air() {
        let registry = BlockRegistry::vanilla();
        assert_eq!(registry.properties(BlockKind(999)).name, "air");
    }

    #[test]
    fn test_register_appends() {
        static CUSTOM: SimpleBlock = SimpleBlock::new(BlockProperties::solid("custom"));
        let mut builder = BlockRegistryBuilder::with_vanilla();
        let kind = builder.register(&CUSTOM);
        let registry = builder.build();
        assert_eq!(kind, BlockKind(13));
        assert_eq!(registry.properties(kind).name, "custom");
    }
}
