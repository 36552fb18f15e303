//! Scheduled tick system for blocks.
//!
//! Blocks schedule deferred updates that fire once their due tick is reached.
//!
//! # Architecture
//!
//! - [`ScheduledTick`] - A single scheduled tick entry
//! - [`TickPriority`] - Priority for ordering ticks within the same game tick
//! - [`TickScheduler`] - The pending set, kept as a membership set and an ordered sequence
//! - [`TickHost`] - The world a drain runs against

mod scheduled_tick;
mod tick_scheduler;

pub use scheduled_tick::{ScheduledTick, TickKey, TickPriority};
pub use tick_scheduler::{MAX_TICKS_PER_DRAIN, TickHost, TickScheduler};
