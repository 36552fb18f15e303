//! Bounded FIFO buffer for light propagation entries.

use super::queue_entry::QueueEntry;

/// Number of entries a single recompute may enqueue.
pub const LIGHT_QUEUE_CAPACITY: usize = 32_768;

/// A fixed-capacity FIFO of [`QueueEntry`] values.
///
/// Entries are never dropped from the front, so the darkening pass can
/// [`rewind`](Self::rewind) and replay every cell it zeroed for the brightening
/// pass. Pushes past the capacity are refused.
#[derive(Debug)]
pub struct LightQueue {
    buffer: Box<[QueueEntry]>,
    head: usize,
    tail: usize,
}

impl LightQueue {
    /// Creates an empty queue with [`LIGHT_QUEUE_CAPACITY`] slots.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(LIGHT_QUEUE_CAPACITY)
    }

    /// Creates an empty queue with the given number of slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: vec![QueueEntry::ORIGIN; capacity].into_boxed_slice(),
            head: 0,
            tail: 0,
        }
    }

    /// Appends an entry. Returns `false` when the queue is full.
    #[inline]
    pub fn push(&mut self, entry: QueueEntry) -> bool {
        let Some(slot) = self.buffer.get_mut(self.tail) else {
            return false;
        };
        *slot = entry;
        self.tail += 1;
        true
    }

    /// Takes the next unread entry.
    #[inline]
    pub fn pop(&mut self) -> Option<QueueEntry> {
        if self.head == self.tail {
            return None;
        }
        let entry = self.buffer[self.head];
        self.head += 1;
        Some(entry)
    }

    /// Whether at least `count` more pushes will succeed.
    #[inline]
    #[must_use]
    pub fn has_room_for(&self, count: usize) -> bool {
        self.buffer.len() - self.tail > count
    }

    /// Moves the read cursor back to the first entry.
    #[inline]
    pub fn rewind(&mut self) {
        self.head = 0;
    }

    /// Drops every entry.
    #[inline]
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    /// Number of entries pushed since the last clear.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tail
    }

    /// Whether nothing has been pushed since the last clear.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tail == 0
    }
}

impl Default for LightQueue {
    fn default() -> Self {
        Self::new()
    }
}
