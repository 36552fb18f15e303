//! Incremental light propagation.
//!
//! Each block cell carries two light channels. The [`LightEngine`] repairs the
//! light around a single changed cell with a bounded two-phase flood fill:
//! a darkening pass that clears cells lit by the old value, followed by a
//! brightening pass that re-derives every cleared cell from its neighbors.
//!
//! The engine works against the [`LightAccess`] trait so it can run over the
//! real chunk map as well as over small grids in tests and benches.

mod direction;
mod engine;
mod light_queue;
mod queue_entry;

use kiln_utils::BlockPos;
use serde::{Deserialize, Serialize};

pub use direction::Direction;
pub use engine::{LightEngine, MAX_PROPAGATION_DISTANCE};
pub use light_queue::{LIGHT_QUEUE_CAPACITY, LightQueue};
pub use queue_entry::QueueEntry;

/// Maximum light level.
pub const MAX_LIGHT: u8 = 15;

/// One of the two light channels of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightChannel {
    /// Light from the sky. Reads as 15 where nothing is stored.
    Sky,
    /// Light emitted by blocks.
    Block,
}

impl LightChannel {
    /// The value reported for cells that hold no data.
    #[must_use]
    pub const fn default_level(self) -> u8 {
        match self {
            Self::Sky => MAX_LIGHT,
            Self::Block => 0,
        }
    }
}

/// The view of the world the light engine reads and writes.
pub trait LightAccess {
    /// Whether every chunk touched by a cube of `radius` around `center` is loaded.
    fn is_area_loaded(&self, center: BlockPos, radius: i32) -> bool;

    /// Stored light of a cell. Cells that hold no data report
    /// [`LightChannel::default_level`].
    fn light(&self, channel: LightChannel, pos: BlockPos) -> u8;

    /// Overwrites the stored light of a cell. Writes to cells that hold no data are ignored.
    fn set_light(&mut self, channel: LightChannel, pos: BlockPos, level: u8);

    /// Opacity of the block in a cell.
    fn opacity(&self, pos: BlockPos) -> u8;

    /// Light emitted by the block in a cell.
    fn emission(&self, pos: BlockPos) -> u8;

    /// Whether the cell is at or above the height map of its column.
    fn can_see_sky(&self, pos: BlockPos) -> bool;
}
