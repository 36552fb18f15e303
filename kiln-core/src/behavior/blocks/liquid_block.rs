//! Liquid block behaviour.

use kiln_utils::BlockPos;

use crate::behavior::block::{BlockBehaviour, BlockKind, BlockProperties};
use crate::error::TickError;
use crate::ticks::TickPriority;
use crate::world::WorldCore;

/// Behaviour for liquids.
///
/// A neighbor change schedules a tick after the liquid's delay; the tick lets
/// the liquid fall into an empty cell below it, which in turn notifies that
/// cell's neighbors.
pub struct LiquidBlock {
    properties: BlockProperties,
    tick_delay: u32,
}

impl LiquidBlock {
    /// Creates a new liquid behaviour.
    #[must_use]
    pub const fn new(properties: BlockProperties, tick_delay: u32) -> Self {
        Self {
            properties,
            tick_delay,
        }
    }

    /// Ticks between a change and the liquid reacting to it.
    #[must_use]
    pub const fn tick_delay(&self) -> u32 {
        self.tick_delay
    }
}

impl BlockBehaviour for LiquidBlock {
    fn properties(&self) -> &BlockProperties {
        &self.properties
    }

    fn allows_immediate_tick(&self) -> bool {
        false
    }

    fn on_scheduled_tick(
        &self,
        world: &mut WorldCore,
        pos: BlockPos,
        kind: BlockKind,
    ) -> Result<(), TickError> {
        let below = pos.below();
        if below.is_valid_height() && world.kind_at(below).is_air() {
            world.set_block(below, kind)?;
        }
        Ok(())
    }

    fn on_neighbor_changed(
        &self,
        world: &mut WorldCore,
        pos: BlockPos,
        kind: BlockKind,
        _source_kind: BlockKind,
        _source_pos: BlockPos,
    ) -> Result<(), TickError> {
        world.schedule_block_update(&pos, kind, self.tick_delay, TickPriority::Normal)
    }
}
