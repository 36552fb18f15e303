//! The block behaviour trait and the static properties every block carries.

use std::fmt::{self, Display};

use kiln_utils::BlockPos;
use serde::{Deserialize, Serialize};

use crate::error::TickError;
use crate::world::WorldCore;

/// Identifies a kind of block. The numeric value indexes the [`super::BlockRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct BlockKind(pub u16);

impl BlockKind {
    /// The empty block.
    pub const AIR: Self = Self(0);

    /// Returns true for [`BlockKind::AIR`].
    #[must_use]
    pub const fn is_air(self) -> bool {
        self.0 == 0
    }
}

impl Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Static data used by lighting and spawn placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockProperties {
    /// Registry name, for logs.
    pub name: &'static str,
    /// How much light is absorbed passing through, `0..=15`.
    pub opacity: u8,
    /// Light emitted by the block, `0..=15`.
    pub emission: u8,
    /// A full, obstructing cube.
    pub full_cube: bool,
    /// The top face can carry a standing creature.
    pub solid_top: bool,
    /// A liquid.
    pub liquid: bool,
    /// Creatures may never stand inside this block (rails, power components).
    pub blocks_spawning: bool,
    /// Creatures may spawn on top of this block.
    pub spawnable_surface: bool,
}

impl BlockProperties {
    /// Properties of air.
    pub const AIR: Self = Self {
        name: "air",
        opacity: 0,
        emission: 0,
        full_cube: false,
        solid_top: false,
        liquid: false,
        blocks_spawning: false,
        spawnable_surface: false,
    };

    /// Properties of an ordinary opaque cube such as stone.
    #[must_use]
    pub const fn solid(name: &'static str) -> Self {
        Self {
            name,
            opacity: 15,
            emission: 0,
            full_cube: true,
            solid_top: true,
            liquid: false,
            blocks_spawning: false,
            spawnable_surface: true,
        }
    }

    /// Returns a copy with a different opacity.
    #[must_use]
    pub const fn with_opacity(mut self, opacity: u8) -> Self {
        self.opacity = if opacity > 15 { 15 } else { opacity };
        self
    }

    /// Returns a copy with a different light emission.
    #[must_use]
    pub const fn with_emission(mut self, emission: u8) -> Self {
        self.emission = if emission > 15 { 15 } else { emission };
        self
    }

    /// Returns a copy that creatures can not spawn on.
    #[must_use]
    pub const fn not_spawnable(mut self) -> Self {
        self.spawnable_surface = false;
        self
    }

    /// Returns a copy that is not a full cube.
    #[must_use]
    pub const fn not_full_cube(mut self) -> Self {
        self.full_cube = false;
        self
    }
}

/// Behaviour attached to a block kind.
///
/// All hooks run on the simulation thread with exclusive access to the world.
/// Errors are fatal for the current tick; the caller wraps them with position context.
pub trait BlockBehaviour: Send + Sync {
    /// Static properties of the block.
    fn properties(&self) -> &BlockProperties;

    /// Whether an update may run synchronously when scheduled updates are immediate.
    ///
    /// Blocks that must observe a delay, such as liquids, return `false`.
    fn allows_immediate_tick(&self) -> bool {
        true
    }

    /// Runs a scheduled tick. `kind` is the live kind at `pos`, equal to the scheduled kind.
    ///
    /// Randomness comes from [`WorldCore::random`].
    fn on_scheduled_tick(
        &self,
        _world: &mut WorldCore,
        _pos: BlockPos,
        _kind: BlockKind,
    ) -> Result<(), TickError> {
        Ok(())
    }

    /// Called when the block at `source_pos` next to `pos` changed.
    fn on_neighbor_changed(
        &self,
        _world: &mut WorldCore,
        _pos: BlockPos,
        _kind: BlockKind,
        _source_kind: BlockKind,
        _source_pos: BlockPos,
    ) -> Result<(), TickError> {
        Ok(())
    }

    /// Fires a queued block event. Returning `true` makes the event visible to listeners.
    fn on_block_event(
        &self,
        _world: &mut WorldCore,
        _pos: BlockPos,
        _kind: BlockKind,
        _event_id: i32,
        _param: i32,
    ) -> Result<bool, TickError> {
        Ok(false)
    }
}
