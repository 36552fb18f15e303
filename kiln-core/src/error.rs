//! Error types for the simulation core.
//!
//! [`TickError`] is the fatal, in-tick channel. It collects positional and
//! identity context as it unwinds and is only turned into an abort by the
//! caller of [`crate::world::WorldCore::tick`]. [`PersistError`] is the separate
//! checked channel for saving and loading, which never aborts a tick.

use std::io;

use kiln_utils::{BlockPos, ChunkPos};
use thiserror::Error;
use uuid::Uuid;

use crate::behavior::BlockKind;
use crate::entity::EntityId;

/// A failure reported by content code (block or entity behaviour).
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct BehaviourError(pub String);

impl BehaviourError {
    /// Creates a new behaviour error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A fatal error raised while running a tick.
#[derive(Debug, Error)]
pub enum TickError {
    /// The membership set and the ordered sequence of the scheduler diverged.
    #[error(
        "scheduled tick list out of sync: membership set holds {membership}, ordered sequence holds {ordered}"
    )]
    SchedulerDesync {
        /// Entries in the membership set.
        membership: usize,
        /// Entries in the ordered sequence.
        ordered: usize,
    },
    /// A scheduled block tick failed.
    #[error("exception while ticking block {kind} at {pos}")]
    BlockTick {
        /// Position of the ticked block.
        pos: BlockPos,
        /// Kind recorded in the scheduled entry.
        kind: BlockKind,
        /// What went wrong.
        #[source]
        source: Box<TickError>,
    },
    /// A neighbor notification failed.
    #[error("exception while updating neighbors of {source_pos} at {pos} ({kind})")]
    NeighborUpdate {
        /// Position of the notified block.
        pos: BlockPos,
        /// Kind of the notified block.
        kind: BlockKind,
        /// Position of the block that changed.
        source_pos: BlockPos,
        /// What went wrong.
        #[source]
        source: Box<TickError>,
    },
    /// A block event failed.
    #[error("exception while firing block event {event_id} of {kind} at {pos}")]
    BlockEvent {
        /// Position of the block.
        pos: BlockPos,
        /// Kind of the block.
        kind: BlockKind,
        /// Content defined event id.
        event_id: i32,
        /// What went wrong.
        #[source]
        source: Box<TickError>,
    },
    /// An entity update failed.
    #[error("exception while ticking entity {id} ({uuid}) at ({x:.2}, {y:.2}, {z:.2})")]
    EntityTick {
        /// Session id of the entity.
        id: EntityId,
        /// Persistent id of the entity.
        uuid: Uuid,
        /// Last known x.
        x: f64,
        /// Last known y.
        y: f64,
        /// Last known z.
        z: f64,
        /// What went wrong.
        #[source]
        source: Box<TickError>,
    },
    /// Content code reported a failure.
    #[error(transparent)]
    Behaviour(#[from] BehaviourError),
    /// A queued task panicked.
    #[error("queued task panicked: {0}")]
    Task(String),
}

/// Adds context to a failing tick step.
pub trait TickResultExt<T> {
    /// Wraps the error as a failure of the scheduled tick at `pos`.
    fn in_block_tick(self, pos: BlockPos, kind: BlockKind) -> Result<T, TickError>;

    /// Wraps the error as a failure while notifying `pos` about `source_pos`.
    fn in_neighbor_update(
        self,
        pos: BlockPos,
        kind: BlockKind,
        source_pos: BlockPos,
    ) -> Result<T, TickError>;

    /// Wraps the error as a failure of a block event.
    fn in_block_event(self, pos: BlockPos, kind: BlockKind, event_id: i32)
    -> Result<T, TickError>;

    /// Wraps the error as a failure of an entity update.
    fn in_entity_tick(self, id: EntityId, uuid: Uuid, pos: [f64; 3]) -> Result<T, TickError>;
}

impl<T, E: Into<TickError>> TickResultExt<T> for Result<T, E> {
    fn in_block_tick(self, pos: BlockPos, kind: BlockKind) -> Result<T, TickError> {
        self.map_err(|e| TickError::BlockTick {
            pos,
            kind,
            source: Box::new(e.into()),
        })
    }

    fn in_neighbor_update(
        self,
        pos: BlockPos,
        kind: BlockKind,
        source_pos: BlockPos,
    ) -> Result<T, TickError> {
        self.map_err(|e| TickError::NeighborUpdate {
            pos,
            kind,
            source_pos,
            source: Box::new(e.into()),
        })
    }

    fn in_block_event(
        self,
        pos: BlockPos,
        kind: BlockKind,
        event_id: i32,
    ) -> Result<T, TickError> {
        self.map_err(|e| TickError::BlockEvent {
            pos,
            kind,
            event_id,
            source: Box::new(e.into()),
        })
    }

    fn in_entity_tick(self, id: EntityId, uuid: Uuid, pos: [f64; 3]) -> Result<T, TickError> {
        self.map_err(|e| TickError::EntityTick {
            id,
            uuid,
            x: pos[0],
            y: pos[1],
            z: pos[2],
            source: Box::new(e.into()),
        })
    }
}

/// Why an entity was not added to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejected {
    /// The entity was already marked dead.
    #[error("entity was marked as removed already")]
    Dead,
    /// A live, non-player entity already owns this UUID.
    #[error("an entity with UUID {0} already exists")]
    DuplicateUuid(Uuid),
    /// The chunk the entity would be filed under is not loaded.
    #[error("chunk {0} is not loaded")]
    ChunkNotLoaded(ChunkPos),
}

/// A failure while saving or loading world state.
#[derive(Debug, Error)]
pub enum PersistError {
    /// Reading or writing failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The snapshot could not be encoded or decoded.
    #[error("malformed snapshot: {0}")]
    Serde(#[from] serde_json::Error),
    /// No snapshot has been stored yet.
    #[error("no snapshot stored")]
    Missing,
}

/// A failure while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the file failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The file is not valid JSON5.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json5::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_context_chain() {
        let inner: Result<(), BehaviourError> = Err(BehaviourError::new("boom"));
        let err = inner
            .in_block_tick(BlockPos::new(1, 2, 3), BlockKind(7))
            .expect_err("should fail");

        assert_eq!(
            err.to_string(),
            "exception while ticking block #7 at (1, 2, 3)"
        );
        let source = err.source().expect("has a source");
        assert_eq!(source.to_string(), "boom");
    }

    #[test]
    fn test_nested_context() {
        let inner: Result<(), BehaviourError> = Err(BehaviourError::new("bad state"));
        let err = inner
            .in_neighbor_update(BlockPos::new(0, 64, 1), BlockKind(3), BlockPos::new(0, 64, 0))
            .in_block_tick(BlockPos::new(0, 64, 0), BlockKind(4))
            .expect_err("should fail");

        let TickError::BlockTick { source, .. } = err else {
            panic!("expected a block tick error");
        };
        assert!(matches!(*source, TickError::NeighborUpdate { .. }));
    }
}
