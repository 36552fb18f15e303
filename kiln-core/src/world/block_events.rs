//! Queued block events.

use kiln_utils::BlockPos;

use crate::behavior::BlockKind;

/// A block event waiting to be fired at the end of the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockEvent {
    /// Position of the block.
    pub pos: BlockPos,
    /// Kind the block had when the event was queued.
    pub kind: BlockKind,
    /// Content defined event id.
    pub event_id: i32,
    /// Content defined parameter.
    pub param: i32,
}

/// Two buffers of block events. Events queued while one buffer is being
/// fired land in the other.
#[derive(Debug, Default)]
pub struct BlockEventQueue {
    buffers: [Vec<BlockEvent>; 2],
    active: usize,
}

impl BlockEventQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an event unless an equal one is already waiting in the active buffer.
    ///
    /// Returns whether it was queued.
    pub fn push(&mut self, event: BlockEvent) -> bool {
        let buffer = &mut self.buffers[self.active];
        if buffer.contains(&event) {
            return false;
        }
        buffer.push(event);
        true
    }

    /// Takes every event of the active buffer and makes the other one active.
    pub fn take_active(&mut self) -> Vec<BlockEvent> {
        let taken = std::mem::take(&mut self.buffers[self.active]);
        self.active ^= 1;
        taken
    }

    /// Whether the active buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffers[self.active].is_empty()
    }

    /// Number of events in the active buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffers[self.active].len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(x: i32, param: i32) -> BlockEvent {
        BlockEvent {
            pos: BlockPos::new(x, 64, 0),
            kind: BlockKind(10),
            event_id: 0,
            param,
        }
    }

    #[test]
    fn test_dedup_in_active_buffer() {
        let mut queue = BlockEventQueue::new();
        assert!(queue.push(event(0, 1)));
        assert!(!queue.push(event(0, 1)));
        assert!(queue.push(event(0, 2)));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_events_queued_while_firing_go_to_other_buffer() {
        let mut queue = BlockEventQueue::new();
        queue.push(event(0, 1));

        let firing = queue.take_active();
        assert_eq!(firing, vec![event(0, 1)]);
        assert!(queue.is_empty());

        // The same event may be queued again while the first copy fires.
        assert!(queue.push(event(0, 1)));
        assert_eq!(queue.take_active(), vec![event(0, 1)]);
        assert!(queue.is_empty());
    }
}
