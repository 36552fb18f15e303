//! # Kiln Utils
//!
//! Value types and helpers shared by every kiln crate.

/// Small generic vector types.
pub mod math;
/// Deterministic random number generation.
pub mod random;
/// Position and coordinate wrapper types.
pub mod types;

pub use types::{BlockCursor, BlockPos, ChunkPos, IntoBlockPos, SectionPos};
