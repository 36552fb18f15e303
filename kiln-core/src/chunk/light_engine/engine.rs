use kiln_utils::BlockPos;

use super::{Direction, LightAccess, LightChannel, LightQueue, MAX_LIGHT, QueueEntry};

/// Cells at this Manhattan distance from the origin or further do not enqueue neighbors.
pub const MAX_PROPAGATION_DISTANCE: i32 = 17;

/// Repairs light after single-cell changes.
///
/// The engine owns its queue so that repeated recomputes reuse one allocation.
#[derive(Debug, Default)]
pub struct LightEngine {
    queue: LightQueue,
}

impl LightEngine {
    /// Creates an engine with a full-sized queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes both channels around `pos`. The sky channel is skipped when
    /// `has_sky` is false.
    pub fn recompute<A: LightAccess + ?Sized>(
        &mut self,
        access: &mut A,
        pos: BlockPos,
        has_sky: bool,
    ) -> bool {
        let mut changed = false;
        if has_sky {
            changed |= self.recompute_light(access, LightChannel::Sky, pos);
        }
        changed | self.recompute_light(access, LightChannel::Block, pos)
    }

    /// Recomputes one channel around `pos` and reports whether any stored value changed.
    ///
    /// Nothing is done when the area within [`MAX_PROPAGATION_DISTANCE`] of `pos`
    /// is not fully loaded. The flood never leaves that distance and stops
    /// enqueuing once the queue is full, so a single call is bounded.
    pub fn recompute_light<A: LightAccess + ?Sized>(
        &mut self,
        access: &mut A,
        channel: LightChannel,
        pos: BlockPos,
    ) -> bool {
        if !access.is_area_loaded(pos, MAX_PROPAGATION_DISTANCE) {
            return false;
        }

        let queue = &mut self.queue;
        queue.clear();

        let stored = access.light(channel, pos);
        let raw = raw_light(access, channel, pos);
        let mut changed = false;

        if raw > stored {
            queue.push(QueueEntry::ORIGIN);
        } else if raw < stored {
            queue.push(QueueEntry::origin_with_level(stored));

            while let Some(entry) = queue.pop() {
                let cell = entry.resolve(pos);
                let level = entry.level();
                if access.light(channel, cell) != level {
                    continue;
                }
                access.set_light(channel, cell, 0);
                if level == 0 {
                    continue;
                }
                changed = true;
                if cell.manhattan_distance(&pos) >= MAX_PROPAGATION_DISTANCE {
                    continue;
                }

                for dir in Direction::ALL {
                    let neighbor = dir.relative(cell);
                    let attenuation = access.opacity(neighbor).max(1);
                    let Some(expected) = level.checked_sub(attenuation) else {
                        continue;
                    };
                    if access.light(channel, neighbor) == expected {
                        queue.push(QueueEntry::new(neighbor, pos, expected));
                    }
                }
            }

            queue.rewind();
        }

        while let Some(entry) = queue.pop() {
            let cell = entry.resolve(pos);
            let current = access.light(channel, cell);
            let computed = raw_light(access, channel, cell);
            if computed == current {
                continue;
            }
            access.set_light(channel, cell, computed);
            changed = true;

            if computed > current
                && cell.manhattan_distance(&pos) < MAX_PROPAGATION_DISTANCE
                && queue.has_room_for(6)
            {
                for dir in Direction::ALL {
                    let neighbor = dir.relative(cell);
                    let attenuation = access.opacity(neighbor).max(1);
                    if i32::from(access.light(channel, neighbor))
                        < i32::from(computed) - i32::from(attenuation)
                    {
                        queue.push(QueueEntry::new(neighbor, pos, 0));
                    }
                }
            }
        }

        changed
    }
}

/// The light a cell should hold given its block and the stored light of its neighbors.
fn raw_light<A: LightAccess + ?Sized>(access: &A, channel: LightChannel, pos: BlockPos) -> u8 {
    if channel == LightChannel::Sky && access.can_see_sky(pos) {
        return MAX_LIGHT;
    }

    let block_emission = access.emission(pos);
    let emission = match channel {
        LightChannel::Sky => 0,
        LightChannel::Block => block_emission,
    };

    let mut opacity = access.opacity(pos);
    // Emitters light themselves even when they are opaque.
    if opacity >= MAX_LIGHT && block_emission > 0 {
        opacity = 1;
    }
    let opacity = opacity.max(1);

    if opacity >= MAX_LIGHT {
        return 0;
    }
    if emission >= MAX_LIGHT - 1 {
        return emission;
    }

    let mut level = emission;
    for dir in Direction::ALL {
        let from_neighbor = access.light(channel, dir.relative(pos)).saturating_sub(opacity);
        if from_neighbor > level {
            level = from_neighbor;
        }
        if level >= MAX_LIGHT - 1 {
            return level;
        }
    }
    level
}
