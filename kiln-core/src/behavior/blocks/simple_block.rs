use crate::behavior::block::{BlockBehaviour, BlockProperties};

/// A block without any dynamic behaviour.
pub struct SimpleBlock {
    properties: BlockProperties,
}

impl SimpleBlock {
    /// Creates a new simple block.
    #[must_use]
    pub const fn new(properties: BlockProperties) -> Self {
        Self { properties }
    }
}

impl BlockBehaviour for SimpleBlock {
    fn properties(&self) -> &BlockProperties {
        &self.properties
    }
}

/// Behaviour of [`crate::behavior::BlockKind::AIR`].
pub static AIR_BLOCK: SimpleBlock = SimpleBlock::new(BlockProperties::AIR);
