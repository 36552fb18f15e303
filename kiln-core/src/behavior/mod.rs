//! Block kinds and the behaviour attached to each of them.
//!
//! Block content is resolved once: a [`BlockRegistry`] maps every [`BlockKind`]
//! to a `&'static dyn BlockBehaviour` when the world is constructed, and the
//! scheduler and light engine only ever look kinds up through it.

mod block;
/// Built-in block behaviours.
pub mod blocks;
mod registry;

pub use block::{BlockBehaviour, BlockKind, BlockProperties};
pub use registry::{BlockRegistry, BlockRegistryBuilder, vanilla};
