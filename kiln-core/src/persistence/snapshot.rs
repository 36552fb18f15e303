//! The serialized state of a world, written between ticks.

use kiln_utils::{BlockPos, ChunkPos};
use serde::{Deserialize, Serialize};

use crate::behavior::BlockKind;
use crate::entity::EntityRecord;
use crate::ticks::{ScheduledTick, TickPriority};
use crate::world::{SavedState, WeatherModel, WorldBorder, WorldClock};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A pending block update as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRecord {
    /// Position of the block.
    pub pos: BlockPos,
    /// Kind the block must still have when the update fires.
    pub kind: BlockKind,
    /// Absolute due tick, relative to the snapshot's clock.
    pub due: u64,
    /// Ordering within the due tick.
    #[serde(default)]
    pub priority: TickPriority,
}

impl From<&ScheduledTick<BlockKind>> for TickRecord {
    fn from(tick: &ScheduledTick<BlockKind>) -> Self {
        Self {
            pos: tick.pos,
            kind: tick.tick_type,
            due: tick.trigger_tick,
            priority: tick.priority,
        }
    }
}

impl From<TickRecord> for ScheduledTick<BlockKind> {
    fn from(record: TickRecord) -> Self {
        // The insertion counter is reassigned when the entry is restored.
        ScheduledTick::new(record.kind, record.pos, record.due, record.priority, 0)
    }
}

/// What an unloaded chunk was holding when the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// The chunk.
    pub pos: ChunkPos,
    /// World time the chunk was unloaded at. Due ticks are relative to it.
    pub saved_at: u64,
    /// Pending block updates of the chunk.
    #[serde(default)]
    pub scheduled_ticks: Vec<TickRecord>,
    /// Entities filed under the chunk.
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
}

impl ChunkRecord {
    /// Captures the saved state of the chunk at `pos`.
    #[must_use]
    pub fn new(pos: ChunkPos, state: &SavedState) -> Self {
        Self {
            pos,
            saved_at: state.saved_at,
            scheduled_ticks: state.pending_ticks.iter().map(TickRecord::from).collect(),
            entities: state.entities.clone(),
        }
    }

    /// Whether the chunk had nothing pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scheduled_ticks.is_empty() && self.entities.is_empty()
    }
}

impl From<ChunkRecord> for SavedState {
    fn from(record: ChunkRecord) -> Self {
        Self {
            pending_ticks: record
                .scheduled_ticks
                .into_iter()
                .map(ScheduledTick::from)
                .collect(),
            saved_at: record.saved_at,
            entities: record.entities,
        }
    }
}

/// Everything needed to resume a world, apart from the blocks themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Format version.
    pub version: u32,
    /// World seed.
    pub seed: i64,
    /// Tick counters.
    pub clock: WorldClock,
    /// Weather timers and levels.
    pub weather: WeatherModel,
    /// World spawn point.
    pub spawn_point: BlockPos,
    /// World border.
    #[serde(default)]
    pub border: WorldBorder,
    /// Pending block updates in firing order.
    #[serde(default)]
    pub scheduled_ticks: Vec<TickRecord>,
    /// Every loaded non-player entity.
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
    /// Pending work of chunks that were unloaded at the time.
    #[serde(default)]
    pub unloaded_chunks: Vec<ChunkRecord>,
}
