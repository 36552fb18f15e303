//! The world's pending block update list.

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::hash::Hash;

use kiln_utils::{BlockPos, ChunkPos, IntoBlockPos};
use rustc_hash::FxHashSet;

use super::{ScheduledTick, TickKey, TickPriority};
use crate::error::TickError;
use crate::world::SpatialIndex;

/// Upper bound of entries fired by one drain.
pub const MAX_TICKS_PER_DRAIN: usize = 1000;

/// Radius that must be loaded around a block before it may tick synchronously.
const IMMEDIATE_TICK_RADIUS: i32 = 8;

/// The world a drain runs against.
///
/// The host owns the scheduler, so content code running inside
/// [`TickHost::run_tick`] can schedule new updates through [`TickHost::scheduler`].
pub trait TickHost<T> {
    /// The scheduler being drained.
    fn scheduler(&mut self) -> &mut TickScheduler<T>;

    /// Loaded-region queries.
    fn spatial(&self) -> &dyn SpatialIndex;

    /// The current total tick count.
    fn total_ticks(&self) -> u64;

    /// The kind currently at `pos`, `None` for air or unloaded cells.
    fn live_kind(&self, pos: BlockPos) -> Option<T>;

    /// Runs the tick behaviour. Implementations attach positional context to errors.
    fn run_tick(&mut self, tick: &ScheduledTick<T>) -> Result<(), TickError>;

    /// Whether scheduled updates may run synchronously.
    fn immediate_updates(&self) -> bool {
        false
    }

    /// Whether `kind` may be ticked synchronously in immediate mode.
    fn allows_immediate_tick(&self, _kind: T) -> bool {
        false
    }
}

/// Deferred, priority ordered block updates with at most one pending entry per key.
///
/// Two structures describe the same set: `pending` answers membership in O(1) and
/// `ordered` defines firing order. Their sizes match outside of a single call.
pub struct TickScheduler<T> {
    pending: FxHashSet<TickKey<T>>,
    ordered: BTreeSet<ScheduledTick<T>>,
    /// Entries pulled by the drain in progress.
    firing: Vec<ScheduledTick<T>>,
    /// Counter for generating unique sub-tick order values.
    sub_tick_counter: u64,
    max_per_drain: usize,
}

impl<T: Copy + Eq + Hash + Debug> TickScheduler<T> {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_per_drain(MAX_TICKS_PER_DRAIN)
    }

    /// Creates an empty scheduler firing at most `max_per_drain` entries per drain.
    #[must_use]
    pub fn with_max_per_drain(max_per_drain: usize) -> Self {
        Self {
            pending: FxHashSet::default(),
            ordered: BTreeSet::new(),
            firing: Vec::new(),
            sub_tick_counter: 0,
            max_per_drain: max_per_drain.max(1),
        }
    }

    /// Number of pending entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Whether an entry for `(pos, kind)` is waiting to fire.
    #[must_use]
    pub fn is_pending(&self, pos: BlockPos, kind: T) -> bool {
        self.pending.contains(&TickKey {
            pos,
            tick_type: kind,
        })
    }

    /// Whether `(pos, kind)` was pulled by the drain currently in progress.
    #[must_use]
    pub fn is_firing(&self, pos: BlockPos, kind: T) -> bool {
        self.firing
            .iter()
            .any(|tick| tick.pos == pos && tick.tick_type == kind)
    }

    /// Schedules an update if the block's chunk is loaded.
    ///
    /// Returns `true` if a new entry was added, `false` if the chunk is not
    /// loaded or the same key is already pending.
    pub fn schedule<P: IntoBlockPos + ?Sized>(
        &mut self,
        spatial: &dyn SpatialIndex,
        pos: &P,
        kind: T,
        now: u64,
        delay: u32,
        priority: TickPriority,
    ) -> bool {
        let pos = storable(pos);
        if !spatial.is_area_loaded(pos, 0) {
            return false;
        }
        self.insert(pos, kind, now + u64::from(delay), priority)
    }

    /// Schedules an update without checking whether its chunk is loaded.
    pub fn schedule_forced<P: IntoBlockPos + ?Sized>(
        &mut self,
        pos: &P,
        kind: T,
        now: u64,
        delay: u32,
        priority: TickPriority,
    ) -> bool {
        let pos = storable(pos);
        self.insert(pos, kind, now + u64::from(delay), priority)
    }

    /// Schedules an update on `host`, honouring immediate mode.
    ///
    /// In immediate mode a block that allows it is ticked right away, provided
    /// the area around it is loaded and the live block still matches; if the
    /// area is not loaded nothing happens. Returns whether an entry was queued.
    pub fn schedule_on<H, P>(
        host: &mut H,
        pos: &P,
        kind: T,
        delay: u32,
        priority: TickPriority,
    ) -> Result<bool, TickError>
    where
        H: TickHost<T> + ?Sized,
        P: IntoBlockPos + ?Sized,
    {
        let pos = storable(pos);
        let now = host.total_ticks();
        let mut delay = delay;

        if host.immediate_updates() {
            if host.allows_immediate_tick(kind) {
                if host.spatial().is_area_loaded(pos, IMMEDIATE_TICK_RADIUS)
                    && host.live_kind(pos) == Some(kind)
                {
                    let tick = ScheduledTick::new(kind, pos, now, priority, 0);
                    host.run_tick(&tick)?;
                }
                return Ok(false);
            }
            delay = 1;
        }

        let spatial_loaded = host.spatial().is_area_loaded(pos, 0);
        if !spatial_loaded {
            return Ok(false);
        }
        Ok(host
            .scheduler()
            .insert(pos, kind, now + u64::from(delay), priority))
    }

    /// Fires due entries against `host`.
    ///
    /// Up to the per-drain cap of entries whose due tick has been reached (any
    /// due tick if `force_all`) are moved into the firing buffer first. Each is
    /// then run if its chunk is loaded and the live block still matches; entries
    /// in unloaded chunks are queued again with delay 0. Entries scheduled while
    /// firing wait for the next drain.
    ///
    /// Returns whether entries remain pending.
    pub fn drain<H>(host: &mut H, force_all: bool) -> Result<bool, TickError>
    where
        H: TickHost<T> + ?Sized,
    {
        let now = host.total_ticks();
        let count = host.scheduler().take_due(now, force_all)?;
        let result = Self::fire_taken(host, count, now);
        let remaining = host.scheduler().finish_drain();
        result.map(|()| remaining)
    }

    fn fire_taken<H>(host: &mut H, count: usize, now: u64) -> Result<(), TickError>
    where
        H: TickHost<T> + ?Sized,
    {
        for index in 0..count {
            let Some(tick) = host.scheduler().firing.get(index).copied() else {
                break;
            };
            if host.spatial().is_area_loaded(tick.pos, 0) {
                if host.live_kind(tick.pos) == Some(tick.tick_type) {
                    host.run_tick(&tick)?;
                }
            } else {
                host.scheduler()
                    .insert(tick.pos, tick.tick_type, now, tick.priority);
            }
        }
        Ok(())
    }

    /// Moves due entries from both structures into the firing buffer.
    fn take_due(&mut self, now: u64, force_all: bool) -> Result<usize, TickError> {
        self.check_consistency()?;
        debug_assert!(self.firing.is_empty(), "drain is not reentrant");

        let limit = self.ordered.len().min(self.max_per_drain);
        while self.firing.len() < limit {
            let Some(first) = self.ordered.first() else {
                break;
            };
            if !force_all && first.trigger_tick > now {
                break;
            }
            let Some(tick) = self.ordered.pop_first() else {
                break;
            };
            self.pending.remove(&TickKey::from(&tick));
            self.firing.push(tick);
        }
        Ok(self.firing.len())
    }

    fn finish_drain(&mut self) -> bool {
        self.firing.clear();
        !self.ordered.is_empty()
    }

    /// Fails if the two structures disagree on the number of entries.
    pub fn check_consistency(&self) -> Result<(), TickError> {
        if self.pending.len() == self.ordered.len() {
            Ok(())
        } else {
            Err(TickError::SchedulerDesync {
                membership: self.pending.len(),
                ordered: self.ordered.len(),
            })
        }
    }

    /// Returns the entries inside `chunk`, optionally removing them.
    ///
    /// The x/z range starts two blocks before the chunk's first column. Entries
    /// of a drain in progress are included.
    pub fn take_pending_in_chunk(&mut self, chunk: ChunkPos, remove: bool) -> Vec<ScheduledTick<T>> {
        let min_x = chunk.min_block_x() - 2;
        let max_x = min_x + 16 + 2;
        let min_z = chunk.min_block_z() - 2;
        let max_z = min_z + 16 + 2;
        let inside = |tick: &ScheduledTick<T>| {
            (min_x..max_x).contains(&tick.pos.x()) && (min_z..max_z).contains(&tick.pos.z())
        };

        let mut found: Vec<ScheduledTick<T>> =
            self.ordered.iter().filter(|tick| inside(*tick)).copied().collect();
        if remove {
            for tick in &found {
                self.ordered.remove(tick);
                self.pending.remove(&TickKey::from(tick));
            }
        }

        let firing_start = found.len();
        found.extend(self.firing.iter().filter(|tick| inside(*tick)).copied());
        if remove && found.len() > firing_start {
            self.firing.retain(|tick| !inside(tick));
        }
        found
    }

    /// Queues entries saved at tick `saved_at`, keeping their remaining delay
    /// relative to `now`. The loaded state is not checked. Returns the number
    /// of entries added.
    pub fn restore<I>(&mut self, entries: I, saved_at: u64, now: u64) -> usize
    where
        I: IntoIterator<Item = ScheduledTick<T>>,
    {
        entries
            .into_iter()
            .filter(|tick| {
                let remaining = tick.trigger_tick.saturating_sub(saved_at);
                self.insert(tick.pos, tick.tick_type, now + remaining, tick.priority)
            })
            .count()
    }

    /// All pending entries in firing order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ScheduledTick<T>> {
        self.ordered.iter().copied().collect()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.pending.clear();
        self.ordered.clear();
        self.firing.clear();
    }

    fn insert(&mut self, pos: BlockPos, kind: T, trigger_tick: u64, priority: TickPriority) -> bool {
        let key = TickKey {
            pos,
            tick_type: kind,
        };
        if !self.pending.insert(key) {
            return false;
        }

        let sub_tick_order = self.sub_tick_counter;
        self.sub_tick_counter += 1;
        self.ordered.insert(ScheduledTick::new(
            kind,
            pos,
            trigger_tick,
            priority,
            sub_tick_order,
        ));
        debug_assert_eq!(self.pending.len(), self.ordered.len());
        true
    }
}

impl<T: Copy + Eq + Hash + Debug> Default for TickScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Copies a position so it can be retained, warning if a cursor was handed in.
fn storable<P: IntoBlockPos + ?Sized>(pos: &P) -> BlockPos {
    let copy = pos.to_block_pos();
    if P::IS_CURSOR {
        log::warn!("Tried to assign a mutable position {copy} to a block update, storing a copy");
    }
    copy
}

#[cfg(test)]
mod tests {
    use kiln_utils::BlockCursor;
    use rustc_hash::FxHashMap;

    use super::*;
    use crate::chunk::LevelChunk;

    const LIQUID_FLOW: u16 = 5;
    const STONE: u16 = 1;

    struct Loaded(FxHashSet<ChunkPos>);

    impl SpatialIndex for Loaded {
        fn is_chunk_loaded(&self, pos: ChunkPos) -> bool {
            self.0.contains(&pos)
        }

        fn chunk_at(&self, _pos: ChunkPos) -> Option<&LevelChunk> {
            None
        }
    }

    struct MockWorld {
        scheduler: TickScheduler<u16>,
        loaded: Loaded,
        blocks: FxHashMap<BlockPos, u16>,
        now: u64,
        fired: Vec<(BlockPos, u16)>,
        firing_seen: Vec<bool>,
        reschedule_on_fire: bool,
        fail_at: Option<BlockPos>,
        immediate: bool,
    }

    impl MockWorld {
        fn new() -> Self {
            let mut loaded = FxHashSet::default();
            for x in -2..=2 {
                for z in -2..=2 {
                    loaded.insert(ChunkPos::new(x, z));
                }
            }
            Self {
                scheduler: TickScheduler::new(),
                loaded: Loaded(loaded),
                blocks: FxHashMap::default(),
                now: 100,
                fired: Vec::new(),
                firing_seen: Vec::new(),
                reschedule_on_fire: false,
                fail_at: None,
                immediate: false,
            }
        }

        fn place(&mut self, pos: BlockPos, kind: u16) {
            self.blocks.insert(pos, kind);
        }

        fn schedule(&mut self, pos: BlockPos, kind: u16, delay: u32, priority: TickPriority) -> bool {
            TickScheduler::<u16>::schedule_on(self, &pos, kind, delay, priority).expect("schedule")
        }
    }

    impl TickHost<u16> for MockWorld {
        fn scheduler(&mut self) -> &mut TickScheduler<u16> {
            &mut self.scheduler
        }

        fn spatial(&self) -> &dyn SpatialIndex {
            &self.loaded
        }

        fn total_ticks(&self) -> u64 {
            self.now
        }

        fn live_kind(&self, pos: BlockPos) -> Option<u16> {
            self.blocks.get(&pos).copied()
        }

        fn run_tick(&mut self, tick: &ScheduledTick<u16>) -> Result<(), TickError> {
            if self.fail_at == Some(tick.pos) {
                return Err(crate::error::BehaviourError::new("broken block").into());
            }
            self.fired.push((tick.pos, tick.tick_type));
            let firing = self.scheduler.is_firing(tick.pos, tick.tick_type);
            self.firing_seen.push(firing);
            if self.reschedule_on_fire {
                self.schedule(tick.pos, tick.tick_type, 0, TickPriority::Normal);
            }
            Ok(())
        }

        fn immediate_updates(&self) -> bool {
            self.immediate
        }

        fn allows_immediate_tick(&self, kind: u16) -> bool {
            kind != LIQUID_FLOW
        }
    }

    #[test]
    fn test_scheduled_tick_fires_once() {
        let mut world = MockWorld::new();
        let pos = BlockPos::new(10, 64, 10);
        world.place(pos, LIQUID_FLOW);

        assert!(world.schedule(pos, LIQUID_FLOW, 0, TickPriority::Normal));
        assert!(world.scheduler.is_pending(pos, LIQUID_FLOW));

        let remaining = TickScheduler::<u16>::drain(&mut world, false).expect("drain");
        assert!(!remaining);
        assert_eq!(world.fired, vec![(pos, LIQUID_FLOW)]);
        assert!(!world.scheduler.is_pending(pos, LIQUID_FLOW));
        assert!(world.scheduler.is_empty());

        TickScheduler::<u16>::drain(&mut world, false).expect("drain");
        assert_eq!(world.fired.len(), 1);
    }

    #[test]
    fn test_ties_fire_in_insertion_order() {
        let mut world = MockWorld::new();
        let positions: Vec<BlockPos> = (0..20).map(|i| BlockPos::new(i, 64, (i * 7) % 5)).collect();
        for pos in &positions {
            world.place(*pos, STONE);
            world.schedule(*pos, STONE, 3, TickPriority::Normal);
        }

        world.now += 3;
        TickScheduler::<u16>::drain(&mut world, false).expect("drain");
        let fired: Vec<BlockPos> = world.fired.iter().map(|(pos, _)| *pos).collect();
        assert_eq!(fired, positions);
    }

    #[test]
    fn test_order_by_time_then_priority() {
        let mut world = MockWorld::new();
        let late = BlockPos::new(0, 64, 0);
        let low = BlockPos::new(1, 64, 0);
        let high = BlockPos::new(2, 64, 0);
        for pos in [late, low, high] {
            world.place(pos, STONE);
        }
        world.schedule(late, STONE, 2, TickPriority::ExtremelyHigh);
        world.schedule(low, STONE, 1, TickPriority::Low);
        world.schedule(high, STONE, 1, TickPriority::High);

        world.now += 2;
        TickScheduler::<u16>::drain(&mut world, false).expect("drain");
        let fired: Vec<BlockPos> = world.fired.iter().map(|(pos, _)| *pos).collect();
        assert_eq!(fired, vec![high, low, late]);
    }

    #[test]
    fn test_drain_cap() {
        let mut world = MockWorld::new();
        for i in 0..1500 {
            let pos = BlockPos::new(i % 30, 10 + i / 900, (i / 30) % 30);
            world.place(pos, STONE);
            assert!(world.schedule(pos, STONE, 0, TickPriority::Normal));
        }
        assert_eq!(world.scheduler.len(), 1500);

        let remaining = TickScheduler::<u16>::drain(&mut world, false).expect("drain");
        assert!(remaining);
        assert_eq!(world.fired.len(), 1000);
        assert_eq!(world.scheduler.len(), 500);

        let remaining = TickScheduler::<u16>::drain(&mut world, false).expect("drain");
        assert!(!remaining);
        assert_eq!(world.fired.len(), 1500);
    }

    #[test]
    fn test_not_due_entries_wait() {
        let mut world = MockWorld::new();
        let pos = BlockPos::new(3, 64, 3);
        world.place(pos, STONE);
        world.schedule(pos, STONE, 5, TickPriority::Normal);

        assert!(TickScheduler::<u16>::drain(&mut world, false).expect("drain"));
        assert!(world.fired.is_empty());

        assert!(!TickScheduler::<u16>::drain(&mut world, true).expect("drain"));
        assert_eq!(world.fired.len(), 1);
    }

    #[test]
    fn test_dedup() {
        let mut world = MockWorld::new();
        let pos = BlockPos::new(4, 70, 4);
        assert!(world.schedule(pos, STONE, 2, TickPriority::Normal));
        assert!(!world.schedule(pos, STONE, 8, TickPriority::High));
        assert_eq!(world.scheduler.len(), 1);

        assert!(world.schedule(pos, LIQUID_FLOW, 2, TickPriority::Normal));
        assert_eq!(world.scheduler.len(), 2);
    }

    #[test]
    fn test_unloaded_entry_is_kept() {
        let mut world = MockWorld::new();
        let pos = BlockPos::new(5, 64, 5);
        world.place(pos, STONE);
        world.schedule(pos, STONE, 0, TickPriority::Normal);
        world.loaded.0.remove(&ChunkPos::new(0, 0));

        let remaining = TickScheduler::<u16>::drain(&mut world, false).expect("drain");
        assert!(remaining);
        assert!(world.fired.is_empty());
        assert!(world.scheduler.is_pending(pos, STONE));

        world.loaded.0.insert(ChunkPos::new(0, 0));
        world.now += 1;
        TickScheduler::<u16>::drain(&mut world, false).expect("drain");
        assert_eq!(world.fired, vec![(pos, STONE)]);
    }

    #[test]
    fn test_schedule_in_unloaded_chunk_is_ignored() {
        let mut world = MockWorld::new();
        assert!(!world.schedule(BlockPos::new(500, 64, 500), STONE, 0, TickPriority::Normal));
        assert!(world.scheduler.is_empty());

        let forced = world.scheduler.schedule_forced(
            &BlockPos::new(500, 64, 500),
            STONE,
            world.now,
            0,
            TickPriority::Normal,
        );
        assert!(forced);
        assert_eq!(world.scheduler.len(), 1);
    }

    #[test]
    fn test_changed_block_is_skipped() {
        let mut world = MockWorld::new();
        let pos = BlockPos::new(6, 64, 6);
        world.place(pos, STONE);
        world.schedule(pos, LIQUID_FLOW, 0, TickPriority::Normal);

        assert!(!TickScheduler::<u16>::drain(&mut world, false).expect("drain"));
        assert!(world.fired.is_empty());
        assert!(world.scheduler.is_empty());
    }

    #[test]
    fn test_reschedule_during_firing_waits_for_next_drain() {
        let mut world = MockWorld::new();
        let pos = BlockPos::new(7, 64, 7);
        world.place(pos, STONE);
        world.reschedule_on_fire = true;
        world.schedule(pos, STONE, 0, TickPriority::Normal);

        let remaining = TickScheduler::<u16>::drain(&mut world, false).expect("drain");
        assert!(remaining);
        assert_eq!(world.fired.len(), 1);
        assert_eq!(world.firing_seen, vec![true]);
        assert!(world.scheduler.is_pending(pos, STONE));
        assert!(!world.scheduler.is_firing(pos, STONE));

        TickScheduler::<u16>::drain(&mut world, false).expect("drain");
        assert_eq!(world.fired.len(), 2);
    }

    #[test]
    fn test_cursor_is_copied() {
        let mut world = MockWorld::new();
        let mut cursor = BlockCursor::new(8, 64, 8);
        world.place(cursor.to_block_pos(), STONE);

        let spatial = Loaded(world.loaded.0.clone());
        world
            .scheduler
            .schedule(&spatial, &cursor, STONE, world.now, 0, TickPriority::Normal);
        cursor.move_by(1, 0, 0);

        assert!(world.scheduler.is_pending(BlockPos::new(8, 64, 8), STONE));
        TickScheduler::<u16>::drain(&mut world, false).expect("drain");
        assert_eq!(world.fired, vec![(BlockPos::new(8, 64, 8), STONE)]);
    }

    #[test]
    fn test_immediate_mode() {
        let mut world = MockWorld::new();
        world.immediate = true;
        let pos = BlockPos::new(9, 64, 9);
        world.place(pos, STONE);

        assert!(!world.schedule(pos, STONE, 10, TickPriority::Normal));
        assert_eq!(world.fired, vec![(pos, STONE)]);
        assert!(world.scheduler.is_empty());

        // Liquids keep a one tick delay even in immediate mode.
        world.place(pos.above(), LIQUID_FLOW);
        assert!(world.schedule(pos.above(), LIQUID_FLOW, 10, TickPriority::Normal));
        assert_eq!(world.scheduler.snapshot()[0].trigger_tick, world.now + 1);

        // Area not loaded: nothing happens.
        let edge = BlockPos::new(40, 64, 40);
        world.place(edge, STONE);
        assert!(!world.schedule(edge, STONE, 0, TickPriority::Normal));
        assert_eq!(world.fired.len(), 1);
    }

    #[test]
    fn test_desync_is_fatal() {
        let mut world = MockWorld::new();
        world.schedule(BlockPos::new(1, 64, 1), STONE, 0, TickPriority::Normal);
        world.scheduler.pending.insert(TickKey {
            pos: BlockPos::new(2, 64, 2),
            tick_type: STONE,
        });

        let err = TickScheduler::<u16>::drain(&mut world, false).expect_err("desync");
        assert!(matches!(
            err,
            TickError::SchedulerDesync {
                membership: 2,
                ordered: 1
            }
        ));
    }

    #[test]
    fn test_error_clears_firing_buffer() {
        let mut world = MockWorld::new();
        let pos = BlockPos::new(3, 64, 9);
        world.place(pos, STONE);
        world.fail_at = Some(pos);
        world.schedule(pos, STONE, 0, TickPriority::Normal);

        assert!(TickScheduler::<u16>::drain(&mut world, false).is_err());
        assert!(!world.scheduler.is_firing(pos, STONE));
        assert!(world.scheduler.check_consistency().is_ok());
    }

    #[test]
    fn test_take_pending_in_chunk() {
        let mut scheduler: TickScheduler<u16> = TickScheduler::new();
        let inside = BlockPos::new(17, 64, 20);
        let margin = BlockPos::new(14, 64, 16);
        let outside = BlockPos::new(32, 64, 20);
        for pos in [inside, margin, outside] {
            scheduler.schedule_forced(&pos, STONE, 0, 4, TickPriority::Normal);
        }

        let chunk = ChunkPos::new(1, 1);
        let peeked = scheduler.take_pending_in_chunk(chunk, false);
        assert_eq!(peeked.len(), 2);
        assert_eq!(scheduler.len(), 3);

        let taken = scheduler.take_pending_in_chunk(chunk, true);
        assert_eq!(taken.len(), 2);
        assert_eq!(scheduler.len(), 1);
        assert!(scheduler.is_pending(outside, STONE));
        assert!(scheduler.check_consistency().is_ok());
    }

    #[test]
    fn test_restore_keeps_remaining_delay() {
        let mut saved: TickScheduler<u16> = TickScheduler::new();
        let early = BlockPos::new(1, 64, 1);
        let late = BlockPos::new(2, 64, 1);
        saved.schedule_forced(&early, STONE, 500, 0, TickPriority::High);
        saved.schedule_forced(&late, STONE, 500, 40, TickPriority::Normal);

        let mut restored: TickScheduler<u16> = TickScheduler::new();
        assert_eq!(restored.restore(saved.snapshot(), 500, 20), 2);
        let entries = restored.snapshot();
        assert_eq!(entries[0].pos, early);
        assert_eq!(entries[0].trigger_tick, 20);
        assert_eq!(entries[0].priority, TickPriority::High);
        assert_eq!(entries[1].trigger_tick, 60);

        assert_eq!(restored.restore(saved.snapshot(), 500, 20), 0);
        assert!(restored.check_consistency().is_ok());
    }
}
