//! # Kiln Core
//!
//! The simulation core of a kiln world: blocks, light, scheduled updates,
//! entities, natural spawning, weather and time, advanced one tick at a time
//! by [`WorldCore::tick`].

pub mod behavior;
pub mod chunk;
pub mod config;
pub mod difficulty;
pub mod entity;
pub mod error;
pub mod persistence;
pub mod spawner;
pub mod task_queue;
pub mod ticks;
pub mod world;

pub use config::WorldConfig;
pub use error::{PersistError, TickError};
pub use world::WorldCore;
