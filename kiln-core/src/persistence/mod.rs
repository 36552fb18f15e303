//! Saving and loading world state between ticks.
//!
//! Failures here travel through [`crate::error::PersistError`] and never abort
//! a tick.

mod snapshot;
mod store;

pub use snapshot::{ChunkRecord, SNAPSHOT_VERSION, TickRecord, WorldSnapshot};
pub use store::{JsonFileStore, RamOnlyStore, SnapshotStore};
