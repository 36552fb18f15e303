//! Note block behaviour.

use kiln_utils::BlockPos;

use crate::behavior::block::{BlockBehaviour, BlockKind, BlockProperties};
use crate::error::TickError;
use crate::world::WorldCore;

/// A block that plays a note through a block event.
///
/// The note is only audible while the block above is air.
pub struct NoteBlock {
    properties: BlockProperties,
}

impl NoteBlock {
    /// Event id used to play a note.
    pub const PLAY_EVENT: i32 = 0;

    /// Creates a new note block behaviour.
    #[must_use]
    pub const fn new(properties: BlockProperties) -> Self {
        Self { properties }
    }
}

impl BlockBehaviour for NoteBlock {
    fn properties(&self) -> &BlockProperties {
        &self.properties
    }

    fn on_block_event(
        &self,
        world: &mut WorldCore,
        pos: BlockPos,
        _kind: BlockKind,
        event_id: i32,
        param: i32,
    ) -> Result<bool, TickError> {
        if event_id != Self::PLAY_EVENT || !(0..=24).contains(&param) {
            return Ok(false);
        }
        Ok(world.kind_at(pos.above()).is_air())
    }
}
