//! Scheduled tick types.

use std::cmp::Ordering;

use kiln_utils::BlockPos;
use serde::{Deserialize, Serialize};

/// Order of updates that fall due on the same tick. Lower runs first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i8", from = "i8")]
#[repr(i8)]
#[allow(missing_docs)]
pub enum TickPriority {
    ExtremelyHigh = -3,
    VeryHigh = -2,
    High = -1,
    /// Used by every vanilla block.
    #[default]
    Normal = 0,
    Low = 1,
    VeryLow = 2,
    ExtremelyLow = 3,
}

impl TickPriority {
    /// The raw value, `-3..=3`.
    #[must_use]
    pub const fn value(self) -> i8 {
        self as i8
    }

    /// Converts a raw value, clamping it into `-3..=3`.
    #[must_use]
    pub const fn from_value(value: i8) -> Self {
        match value {
            i8::MIN..=-3 => Self::ExtremelyHigh,
            -2 => Self::VeryHigh,
            -1 => Self::High,
            0 => Self::Normal,
            1 => Self::Low,
            2 => Self::VeryLow,
            3..=i8::MAX => Self::ExtremelyLow,
        }
    }
}

impl From<i8> for TickPriority {
    fn from(value: i8) -> Self {
        Self::from_value(value)
    }
}

impl From<TickPriority> for i8 {
    fn from(priority: TickPriority) -> Self {
        priority.value()
    }
}

/// A pending update of one block.
///
/// Equality and ordering only look at timing; the identity of an entry is its [`TickKey`].
#[derive(Debug, Clone, Copy)]
pub struct ScheduledTick<T> {
    /// The kind of block expected at `pos` when the tick fires.
    pub tick_type: T,
    /// Where the block is.
    pub pos: BlockPos,
    /// World tick the update falls due on.
    pub trigger_tick: u64,
    /// Tie-break among updates due on the same tick.
    pub priority: TickPriority,
    /// Insertion counter, the final tie-break. Lower values run first.
    pub sub_tick_order: u64,
}

impl<T> ScheduledTick<T> {
    /// Creates an entry; `trigger_tick` is absolute.
    pub fn new(
        tick_type: T,
        pos: BlockPos,
        trigger_tick: u64,
        priority: TickPriority,
        sub_tick_order: u64,
    ) -> Self {
        Self {
            tick_type,
            pos,
            trigger_tick,
            priority,
            sub_tick_order,
        }
    }
}

impl<T> PartialEq for ScheduledTick<T> {
    fn eq(&self, other: &Self) -> bool {
        self.trigger_tick == other.trigger_tick
            && self.priority == other.priority
            && self.sub_tick_order == other.sub_tick_order
    }
}

impl<T> Eq for ScheduledTick<T> {}

impl<T> PartialOrd for ScheduledTick<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for ScheduledTick<T> {
    /// Ascending by due tick, then priority, then insertion order.
    fn cmp(&self, other: &Self) -> Ordering {
        self.trigger_tick
            .cmp(&other.trigger_tick)
            .then_with(|| self.priority.cmp(&other.priority))
            .then_with(|| self.sub_tick_order.cmp(&other.sub_tick_order))
    }
}

/// Identity of a pending update: at most one per position and kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct TickKey<T> {
    pub pos: BlockPos,
    pub tick_type: T,
}

impl<T: Copy> From<&ScheduledTick<T>> for TickKey<T> {
    fn from(tick: &ScheduledTick<T>) -> Self {
        Self {
            pos: tick.pos,
            tick_type: tick.tick_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_tick_then_priority_then_insertion() {
        let at = |due, priority, order| {
            ScheduledTick::new(1u32, BlockPos::new(3, 70, -3), due, priority, order)
        };

        assert!(at(100, TickPriority::Normal, 7) < at(200, TickPriority::Normal, 0));
        assert!(at(100, TickPriority::High, 9) < at(100, TickPriority::Normal, 0));
        assert!(at(100, TickPriority::Normal, 5) < at(100, TickPriority::Normal, 10));
        assert_eq!(at(100, TickPriority::Low, 1), at(100, TickPriority::Low, 1));
    }

    #[test]
    fn test_priority_from_value_clamps() {
        assert_eq!(TickPriority::from_value(-100), TickPriority::ExtremelyHigh);
        assert_eq!(TickPriority::from_value(1), TickPriority::Low);
        assert_eq!(TickPriority::from_value(42), TickPriority::ExtremelyLow);
        assert!(TickPriority::High < TickPriority::Normal);
    }
}
