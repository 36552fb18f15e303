//! This module contains the [`WorldCore`] struct, which owns every piece of
//! mutable world state and runs the tick.
//!
//! Dimension specific rules are injected through [`DimensionBehaviour`]
//! instead of being inherited, and the random source and tick counters are
//! plain fields handed to the components that need them.

use std::sync::Arc;

use kiln_utils::math::Vector3;
use kiln_utils::random::LegacyRandom;
use kiln_utils::{BlockPos, ChunkPos, IntoBlockPos};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::behavior::{BlockKind, BlockRegistry};
use crate::chunk::light_engine::Direction;
use crate::chunk::{LightChannel, LightEngine};
use crate::config::WorldConfig;
use crate::entity::{Entity, EntityId, EntityRegistry, EntityTracker, EntityTypeRegistry};
use crate::error::{Rejected, TickError, TickResultExt};
use crate::persistence::{ChunkRecord, SNAPSHOT_VERSION, TickRecord, WorldSnapshot};
use crate::spawner::NaturalSpawner;
use crate::task_queue::{TaskHandle, TaskQueue};
use crate::ticks::{ScheduledTick, TickPriority, TickScheduler};

/// Borrows the fields the spawner reads, leaving the rest of the world free.
macro_rules! spawn_view {
    ($world:ident) => {
        $crate::world::views::SpawnView {
            chunks: &$world.chunks,
            blocks: &$world.blocks,
            dimension: &*$world.dimension,
            border: &$world.border,
            spawn_point: $world.spawn_point,
            difficulty: $world.config.difficulty,
            sky_darken: $world.sky_darken,
            thundering: $world.weather.is_thundering(),
        }
    };
}

mod block_events;
mod border;
mod chunk_map;
/// Where chunks come from and go to.
pub mod chunk_source;
mod clock;
mod dimension;
mod listener;
mod spatial_index;
mod views;
mod weather;
mod world_tick;

pub use block_events::{BlockEvent, BlockEventQueue};
pub use border::{DEFAULT_BORDER_SIZE, WorldBorder};
pub use chunk_map::{ChunkMap, UNLOADS_PER_TICK};
pub use chunk_source::{ChunkSource, FlatChunkSource, SavedState, StoredChunk};
pub use clock::{TICKS_PER_DAY, WorldClock, celestial_angle, sky_darken};
pub use dimension::{DimensionBehaviour, Nether, Overworld};
pub use listener::WorldListener;
pub use spatial_index::SpatialIndex;
pub use weather::{WeatherChange, WeatherModel};

use views::LightView;

/// The simulation state of one dimension.
pub struct WorldCore {
    config: WorldConfig,
    seed: i64,
    dimension: Box<dyn DimensionBehaviour>,
    blocks: BlockRegistry,
    chunks: ChunkMap,
    scheduler: TickScheduler<BlockKind>,
    light: LightEngine,
    entities: EntityRegistry,
    tracker: Arc<Mutex<EntityTracker>>,
    spawner: NaturalSpawner,
    clock: WorldClock,
    weather: WeatherModel,
    sky_darken: u8,
    border: WorldBorder,
    spawn_point: BlockPos,
    block_events: BlockEventQueue,
    listeners: Vec<Box<dyn WorldListener>>,
    tasks: TaskQueue,
    random: LegacyRandom,
}

impl WorldCore {
    /// Creates a world with the built-in block and entity types.
    #[must_use]
    pub fn new(
        config: WorldConfig,
        dimension: Box<dyn DimensionBehaviour>,
        source: Box<dyn ChunkSource>,
    ) -> Self {
        Self::with_registries(
            config,
            dimension,
            source,
            BlockRegistry::vanilla(),
            EntityTypeRegistry::vanilla(),
        )
    }

    /// Creates a world with custom content registries.
    #[must_use]
    pub fn with_registries(
        config: WorldConfig,
        dimension: Box<dyn DimensionBehaviour>,
        source: Box<dyn ChunkSource>,
        blocks: BlockRegistry,
        types: EntityTypeRegistry,
    ) -> Self {
        let tracker = Arc::new(Mutex::new(EntityTracker::new()));
        let mut entities = EntityRegistry::new(types, config.idle_entity_ticks);
        entities.add_listener(Box::new(Arc::clone(&tracker)));

        log::info!(
            "Creating {} world with seed {}",
            dimension.name(),
            config.seed
        );
        Self {
            seed: config.seed,
            scheduler: TickScheduler::with_max_per_drain(config.max_ticks_per_drain),
            spawner: NaturalSpawner::new(config.spawn.clone()),
            random: LegacyRandom::from_seed(config.seed as u64),
            spawn_point: BlockPos::new(0, dimension.sea_level() + 1, 0),
            config,
            dimension,
            blocks,
            chunks: ChunkMap::new(source),
            light: LightEngine::new(),
            entities,
            tracker,
            clock: WorldClock::default(),
            weather: WeatherModel::default(),
            sky_darken: 0,
            border: WorldBorder::default(),
            block_events: BlockEventQueue::new(),
            listeners: Vec::new(),
            tasks: TaskQueue::new(),
        }
    }

    /// The configuration the world runs with.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// The world seed.
    #[must_use]
    pub fn seed(&self) -> i64 {
        self.seed
    }

    /// The dimension rules.
    #[must_use]
    pub fn dimension(&self) -> &dyn DimensionBehaviour {
        &*self.dimension
    }

    /// The block registry.
    #[must_use]
    pub fn blocks(&self) -> &BlockRegistry {
        &self.blocks
    }

    /// The world's random source. Content callbacks draw from it.
    pub fn random(&mut self) -> &mut LegacyRandom {
        &mut self.random
    }

    /// Registers an observer of block changes, block events, weather and tracking.
    pub fn add_listener(&mut self, listener: Box<dyn WorldListener>) {
        self.listeners.push(listener);
    }

    // Chunks

    /// The loaded chunks.
    #[must_use]
    pub fn chunks(&self) -> &ChunkMap {
        &self.chunks
    }

    /// Loads a chunk and brings back what was pending in it.
    ///
    /// Saved updates keep their remaining delay and saved entities are added
    /// again. A chunk seen for the first time is populated with passive
    /// creatures. Returns false if the chunk was already loaded.
    pub fn load_chunk(&mut self, pos: ChunkPos) -> bool {
        let Some(state) = self
            .chunks
            .load(pos, &self.blocks, self.dimension.has_sky())
        else {
            return false;
        };

        self.apply_saved_state(pos, state);

        let first_load = self.chunks.chunk_mut(pos).is_some_and(|chunk| {
            let first = !chunk.populated;
            chunk.populated = true;
            first
        });
        if first_load {
            self.populate(pos);
        }
        true
    }

    /// Puts back what a chunk held when it was unloaded. The chunk must be loaded.
    fn apply_saved_state(&mut self, pos: ChunkPos, state: SavedState) {
        let now = self.clock.total_ticks;
        let restored = self.scheduler.restore(state.pending_ticks, state.saved_at, now);
        if restored > 0 {
            log::trace!("Restored {restored} pending updates in chunk {pos}");
        }
        for record in state.entities {
            let uuid = record.uuid;
            if let Err(err) = self.entities.add(&mut self.chunks, Entity::from(record)) {
                log::warn!("Dropped saved entity {uuid} of chunk {pos}: {err}");
            }
        }
    }

    fn populate(&mut self, pos: ChunkPos) {
        let view = spawn_view!(self);
        let placed = NaturalSpawner::spawn_initial_creatures(&view, pos, &mut self.random);
        for entity in placed {
            if let Err(err) = self.entities.add(&mut self.chunks, entity) {
                log::debug!("Initial creature in chunk {pos} was not added: {err}");
            }
        }
    }

    /// Queues a loaded chunk for unloading during a later tick.
    pub fn queue_chunk_unload(&mut self, pos: ChunkPos) {
        self.chunks.queue_unload(pos);
    }

    // Blocks

    /// The block at `pos`, air if unloaded.
    #[must_use]
    pub fn kind_at(&self, pos: BlockPos) -> BlockKind {
        self.chunks.block(pos)
    }

    /// Stored light of a cell.
    #[must_use]
    pub fn light(&self, channel: LightChannel, pos: BlockPos) -> u8 {
        self.chunks.light(channel, pos)
    }

    /// Replaces a block, repairs the light around it and notifies its neighbors.
    ///
    /// Returns false, doing nothing, if the cell is unloaded, out of height or
    /// already holds `kind`.
    pub fn set_block(&mut self, pos: BlockPos, kind: BlockKind) -> Result<bool, TickError> {
        debug_assert!(
            self.tasks.is_on_simulation_thread(),
            "set_block called off the simulation thread"
        );
        let Some(old) = self.chunks.set_block(pos, kind, &self.blocks) else {
            return Ok(false);
        };
        if old == kind {
            return Ok(false);
        }

        let mut view = LightView {
            chunks: &mut self.chunks,
            blocks: &self.blocks,
        };
        self.light.recompute(&mut view, pos, self.dimension.has_sky());

        for listener in &mut self.listeners {
            listener.on_block_changed(pos, old, kind);
        }
        self.notify_neighbors(pos, kind)?;
        Ok(true)
    }

    /// Tells the six loaded neighbors of `pos` that the block there changed.
    pub fn notify_neighbors(&mut self, pos: BlockPos, source_kind: BlockKind) -> Result<(), TickError> {
        for direction in Direction::UPDATE_ORDER {
            let neighbor = direction.relative(pos);
            if !neighbor.is_valid_height() || !self.chunks.is_chunk_loaded(neighbor.chunk_pos()) {
                continue;
            }
            let kind = self.chunks.block(neighbor);
            self.blocks
                .get(kind)
                .on_neighbor_changed(self, neighbor, kind, source_kind, pos)
                .in_neighbor_update(neighbor, kind, pos)?;
        }
        Ok(())
    }

    /// Schedules an update of the block at `pos`, expected to still be `kind`
    /// after `delay` ticks.
    pub fn schedule_block_update<P: IntoBlockPos + ?Sized>(
        &mut self,
        pos: &P,
        kind: BlockKind,
        delay: u32,
        priority: TickPriority,
    ) -> Result<(), TickError> {
        TickScheduler::schedule_on(self, pos, kind, delay, priority).map(|_| ())
    }

    /// Whether an update of `kind` at `pos` is waiting to fire.
    #[must_use]
    pub fn is_update_pending(&self, pos: BlockPos, kind: BlockKind) -> bool {
        self.scheduler.is_pending(pos, kind)
    }

    /// Number of pending block updates.
    #[must_use]
    pub fn pending_updates(&self) -> usize {
        self.scheduler.len()
    }

    /// Fires due block updates outside of [`WorldCore::tick`], every pending
    /// one if `force_all`. Returns whether updates remain.
    pub fn run_scheduled_ticks(&mut self, force_all: bool) -> Result<bool, TickError> {
        TickScheduler::drain(self, force_all)
    }

    /// Queues a block event, fired at the end of the tick if the block is still `kind`.
    pub fn add_block_event(&mut self, pos: BlockPos, kind: BlockKind, event_id: i32, param: i32) {
        self.block_events.push(BlockEvent {
            pos,
            kind,
            event_id,
            param,
        });
    }

    // Time and weather

    /// Ticks simulated since the world was created.
    #[must_use]
    pub fn total_ticks(&self) -> u64 {
        self.clock.total_ticks
    }

    /// Current time of day.
    #[must_use]
    pub fn day_time(&self) -> i64 {
        self.clock.day_time
    }

    /// Both counters.
    #[must_use]
    pub fn clock(&self) -> WorldClock {
        self.clock
    }

    /// The sun's position, `partial` ticks after the current one.
    #[must_use]
    pub fn celestial_angle(&self, partial: f32) -> f32 {
        self.dimension.celestial_angle(self.clock.day_time, partial)
    }

    /// The moon phase, `0..8`.
    #[must_use]
    pub fn moon_phase(&self) -> u8 {
        self.clock.moon_phase()
    }

    /// How much sky light is currently subtracted, `0..=11`.
    #[must_use]
    pub fn sky_darken(&self) -> u8 {
        self.sky_darken
    }

    /// The weather state.
    #[must_use]
    pub fn weather(&self) -> &WeatherModel {
        &self.weather
    }

    /// Overrides the weather timers and states.
    pub fn set_weather(
        &mut self,
        clear_time: i32,
        rain_time: i32,
        thunder_time: i32,
        raining: bool,
        thundering: bool,
    ) {
        self.weather
            .set_weather(clear_time, rain_time, thunder_time, raining, thundering);
    }

    // Spawn area

    /// The world spawn point.
    #[must_use]
    pub fn spawn_point(&self) -> BlockPos {
        self.spawn_point
    }

    /// Moves the world spawn point.
    pub fn set_spawn_point(&mut self, pos: BlockPos) {
        self.spawn_point = pos;
    }

    /// The world border.
    #[must_use]
    pub fn border(&self) -> &WorldBorder {
        &self.border
    }

    /// Replaces the world border.
    pub fn set_border(&mut self, border: WorldBorder) {
        self.border = border;
    }

    // Entities

    /// The entity registry.
    #[must_use]
    pub fn entities(&self) -> &EntityRegistry {
        &self.entities
    }

    /// The entity registry, mutably, for mounting and direct edits.
    pub fn entities_mut(&mut self) -> &mut EntityRegistry {
        &mut self.entities
    }

    /// The tracker of who sees which entity.
    #[must_use]
    pub fn tracker(&self) -> &Arc<Mutex<EntityTracker>> {
        &self.tracker
    }

    /// Adds an entity. Ordinary entities need their chunk to be loaded.
    pub fn add_entity(&mut self, entity: Entity) -> Result<EntityId, Rejected> {
        debug_assert!(
            self.tasks.is_on_simulation_thread(),
            "add_entity called off the simulation thread"
        );
        self.entities.add(&mut self.chunks, entity)
    }

    /// Adds an entity regardless of its chunk being loaded.
    pub fn add_entity_forced(&mut self, entity: Entity) -> Result<EntityId, Rejected> {
        self.entities.add_forced(&mut self.chunks, entity)
    }

    /// Adds a player at `position`.
    pub fn add_player(&mut self, uuid: Uuid, position: Vector3<f64>) -> Result<EntityId, Rejected> {
        self.add_entity(Entity::player(uuid, position))
    }

    /// Removes an entity right away.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        debug_assert!(
            self.tasks.is_on_simulation_thread(),
            "remove_entity called off the simulation thread"
        );
        self.entities.remove(&mut self.chunks, id)
    }

    // Tasks

    /// A handle other threads submit work through.
    #[must_use]
    pub fn task_handle(&self) -> TaskHandle {
        self.tasks.handle()
    }

    /// Makes the calling thread the simulation thread.
    pub fn bind_current_thread(&self) {
        self.tasks.bind_current_thread();
    }

    /// Whether the caller runs on the simulation thread.
    #[must_use]
    pub fn is_on_simulation_thread(&self) -> bool {
        self.tasks.is_on_simulation_thread()
    }

    // Persistence

    /// Captures the world state for saving. Call between ticks.
    #[must_use]
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            version: SNAPSHOT_VERSION,
            seed: self.seed,
            clock: self.clock,
            weather: self.weather.clone(),
            spawn_point: self.spawn_point,
            border: self.border,
            scheduled_ticks: self
                .scheduler
                .snapshot()
                .iter()
                .map(TickRecord::from)
                .collect(),
            entities: self
                .entities
                .iter()
                .filter(|entity| !entity.is_player() && !entity.is_dead())
                .map(Into::into)
                .collect(),
            unloaded_chunks: self.unloaded_chunk_records(),
        }
    }

    fn unloaded_chunk_records(&self) -> Vec<ChunkRecord> {
        let mut records: Vec<_> = self
            .chunks
            .saved_states()
            .into_iter()
            .map(|(pos, state)| ChunkRecord::new(pos, state))
            .filter(|record| !record.is_empty())
            .collect();
        records.sort_unstable_by_key(|record| (record.pos.x(), record.pos.z()));
        records
    }

    /// Resumes from a snapshot. Pending updates keep their remaining delay;
    /// entities are added even if their chunk is not loaded yet. The state of
    /// chunks that were unloaded at save time comes back when they load.
    pub fn restore(&mut self, snapshot: WorldSnapshot) {
        if snapshot.version != SNAPSHOT_VERSION {
            log::warn!(
                "Snapshot version {} differs from {SNAPSHOT_VERSION}, loading anyway",
                snapshot.version
            );
        }
        self.clock = snapshot.clock;
        self.weather = snapshot.weather;
        self.weather.settle();
        self.spawn_point = snapshot.spawn_point;
        self.border = snapshot.border;

        let now = self.clock.total_ticks;
        let ticks = snapshot
            .scheduled_ticks
            .into_iter()
            .map(ScheduledTick::from);
        let restored = self.scheduler.restore(ticks, now, now);

        let mut added = 0;
        for record in snapshot.entities {
            let uuid = record.uuid;
            match self.entities.add_forced(&mut self.chunks, Entity::from(record)) {
                Ok(_) => added += 1,
                Err(err) => log::warn!("Skipped entity {uuid} from snapshot: {err}"),
            }
        }

        let mut parked = 0;
        for record in snapshot.unloaded_chunks {
            let pos = record.pos;
            let state = SavedState::from(record);
            if self.chunks.is_chunk_loaded(pos) {
                self.apply_saved_state(pos, state);
            } else {
                self.chunks.restore_saved_state(pos, state);
                parked += 1;
            }
        }
        log::info!(
            "Restored {restored} pending updates and {added} entities at tick {now}, {parked} unloaded chunks keep theirs"
        );
    }
}
