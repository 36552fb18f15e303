//! Behaviour implementations for the built-in blocks.

mod liquid_block;
mod note_block;
mod simple_block;

pub use liquid_block::LiquidBlock;
pub use note_block::NoteBlock;
pub use simple_block::{AIR_BLOCK, SimpleBlock};
