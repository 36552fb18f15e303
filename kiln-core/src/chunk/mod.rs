//! Chunk storage and light propagation.

/// The 16x256x16 column of blocks, light and entity membership.
pub mod level_chunk;
/// Incremental light propagation.
pub mod light_engine;
/// Nibble arrays for light values.
pub mod light_storage;

pub use level_chunk::LevelChunk;
pub use light_engine::{LightChannel, LightEngine};
pub use light_storage::LightStorage;
