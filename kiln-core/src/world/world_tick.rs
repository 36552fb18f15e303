//! The fixed per-tick sequence of a [`WorldCore`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use kiln_utils::BlockPos;

use super::{SavedState, SpatialIndex, StoredChunk, WeatherChange, WorldCore, clock};
use crate::behavior::BlockKind;
use crate::entity::{EntityId, EntityRecord};
use crate::error::{TickError, TickResultExt};
use crate::spawner::SpawnFlags;
use crate::ticks::{ScheduledTick, TickHost, TickScheduler};

impl WorldCore {
    /// Runs one tick.
    ///
    /// Order: queued tasks, weather, mob spawning, chunk unloading, sky
    /// darkness, clock, scheduled block updates, entities, block events.
    /// Any error aborts the tick and leaves the world mid-step; the caller is
    /// expected to stop the simulation.
    pub fn tick(&mut self) -> Result<(), TickError> {
        debug_assert!(
            self.tasks.is_on_simulation_thread(),
            "tick called off the simulation thread"
        );
        let span = tracing::info_span!("tick", tick = self.clock.total_ticks);
        let _entered = span.enter();

        self.run_tasks()?;
        self.tick_weather();
        self.spawn_creatures();
        self.unload_chunks();
        self.update_sky_darken();
        self.clock.advance(self.config.do_daylight_cycle);
        TickScheduler::drain(self, false)?;
        self.tick_entities()?;
        self.flush_block_events()
    }

    /// Runs the tasks queued before this call, in submission order.
    ///
    /// Tasks queued by a running task wait for the next call. A panicking task
    /// becomes a [`TickError::Task`].
    pub fn run_tasks(&mut self) -> Result<usize, TickError> {
        let queued = self.tasks.len();
        let mut ran = 0;
        while ran < queued {
            let Some(task) = self.tasks.pop() else {
                break;
            };
            panic::catch_unwind(AssertUnwindSafe(|| task(self)))
                .map_err(|payload| TickError::Task(panic_message(payload.as_ref())))?;
            ran += 1;
        }
        Ok(ran)
    }

    /// Advances the weather if the dimension has a sky and the cycle is on.
    pub fn tick_weather(&mut self) -> WeatherChange {
        if !self.dimension.has_sky() || !self.config.do_weather_cycle {
            return WeatherChange::default();
        }
        let change = self.weather.tick(&self.config.weather, &mut self.random);
        if !change.is_empty() {
            for listener in &mut self.listeners {
                listener.on_weather_changed(&change);
            }
        }
        change
    }

    /// Runs the natural spawner once and returns how many creatures were added.
    ///
    /// Hostiles follow the difficulty; passive creatures are only considered
    /// every `animal_spawn_interval` ticks.
    pub fn spawn_creatures(&mut self) -> usize {
        if !self.config.do_mob_spawning {
            return 0;
        }
        let flags = SpawnFlags {
            hostile: self.config.difficulty.allows_hostiles(),
            peaceful: true,
            animals: self
                .clock
                .total_ticks
                .checked_rem(self.config.spawn.animal_spawn_interval)
                == Some(0),
        };

        let view = spawn_view!(self);
        let planned = self
            .spawner
            .plan(&view, &self.entities, flags, &mut self.random);

        let mut added = 0;
        for entity in planned {
            match self.entities.add(&mut self.chunks, entity) {
                Ok(_) => added += 1,
                Err(err) => log::debug!("Planned creature was not added: {err}"),
            }
        }
        if added > 0 {
            log::trace!("Spawned {added} creatures");
        }
        added
    }

    /// Unloads queued chunks, saving their pending updates and entities with them.
    ///
    /// Entities of an unloaded chunk leave the registry at the start of this
    /// tick's entity pass. Players are never saved with a chunk; they stay and
    /// are filed again once their chunk comes back.
    fn unload_chunks(&mut self) {
        let now = self.clock.total_ticks;
        for mut chunk in self.chunks.take_unload_queued() {
            let pos = chunk.pos;
            let mut leaving: Vec<EntityId> = Vec::new();
            let mut entities: Vec<EntityRecord> = Vec::new();
            for id in chunk.take_entity_ids() {
                let Some(entity) = self.entities.get_mut(id) else {
                    continue;
                };
                entity.added_to_chunk = false;
                if entity.is_player() {
                    continue;
                }
                if !entity.is_dead() {
                    entities.push(EntityRecord::from(&*entity));
                }
                leaving.push(id);
            }
            self.entities.queue_unload(leaving);

            let pending_ticks = self.scheduler.take_pending_in_chunk(pos, true);
            log::trace!(
                "Saving chunk {pos} with {} pending updates and {} entities",
                pending_ticks.len(),
                entities.len()
            );
            self.chunks.save(StoredChunk {
                chunk,
                state: SavedState {
                    pending_ticks,
                    saved_at: now,
                    entities,
                },
            });
        }
    }

    fn update_sky_darken(&mut self) {
        self.sky_darken = clock::sky_darken(
            self.celestial_angle(1.0),
            self.weather.rain_level(1.0),
            self.weather.thunder_level(1.0),
        );
    }

    /// The entity pass, followed by the tracker update.
    fn tick_entities(&mut self) -> Result<(), TickError> {
        let total_ticks = self.clock.total_ticks;
        self.entities
            .tick_entities(&mut self.chunks, &mut self.random, total_ticks)?;

        let changes = self.tracker.lock().update(&self.entities);
        if !changes.is_empty() {
            for listener in &mut self.listeners {
                listener.on_tracking_changed(&changes);
            }
        }
        Ok(())
    }

    /// Fires queued block events until none are left, including those queued
    /// while firing.
    fn flush_block_events(&mut self) -> Result<(), TickError> {
        while !self.block_events.is_empty() {
            for event in self.block_events.take_active() {
                if !self.chunks.is_chunk_loaded(event.pos.chunk_pos())
                    || self.chunks.block(event.pos) != event.kind
                {
                    continue;
                }
                let visible = self
                    .blocks
                    .get(event.kind)
                    .on_block_event(self, event.pos, event.kind, event.event_id, event.param)
                    .in_block_event(event.pos, event.kind, event.event_id)?;
                if visible {
                    for listener in &mut self.listeners {
                        listener.on_block_event(&event);
                    }
                }
            }
        }
        Ok(())
    }
}

impl TickHost<BlockKind> for WorldCore {
    fn scheduler(&mut self) -> &mut TickScheduler<BlockKind> {
        &mut self.scheduler
    }

    fn spatial(&self) -> &dyn SpatialIndex {
        &self.chunks
    }

    fn total_ticks(&self) -> u64 {
        self.clock.total_ticks
    }

    fn live_kind(&self, pos: BlockPos) -> Option<BlockKind> {
        self.chunks
            .is_chunk_loaded(pos.chunk_pos())
            .then(|| self.chunks.block(pos))
    }

    fn run_tick(&mut self, tick: &ScheduledTick<BlockKind>) -> Result<(), TickError> {
        self.blocks
            .get(tick.tick_type)
            .on_scheduled_tick(self, tick.pos, tick.tick_type)
            .in_block_tick(tick.pos, tick.tick_type)
    }

    fn immediate_updates(&self) -> bool {
        self.config.scheduled_updates_are_immediate
    }

    fn allows_immediate_tick(&self, kind: BlockKind) -> bool {
        self.blocks.get(kind).allows_immediate_tick()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use kiln_utils::math::Vector3;
    use kiln_utils::{BlockCursor, ChunkPos};
    use parking_lot::Mutex;
    use uuid::Uuid;

    use super::*;
    use crate::behavior::{BlockBehaviour, BlockProperties, BlockRegistryBuilder, vanilla};
    use crate::behavior::blocks::NoteBlock;
    use crate::config::WorldConfig;
    use crate::difficulty::Difficulty;
    use crate::entity::types::vanilla as mobs;
    use crate::entity::{Entity, EntityTypeRegistry, MobCategory, TrackingChange};
    use crate::error::BehaviourError;
    use crate::ticks::TickPriority;
    use crate::world::tests::{Populated, flat_world, quiet_config};
    use crate::world::{BlockEvent, FlatChunkSource, Nether, Overworld, TICKS_PER_DAY, WorldBorder};

    static FIRED: Mutex<Vec<(BlockPos, BlockKind)>> = Mutex::new(Vec::new());

    /// Records every scheduled tick it receives.
    struct Recording {
        properties: BlockProperties,
    }

    impl BlockBehaviour for Recording {
        fn properties(&self) -> &BlockProperties {
            &self.properties
        }

        fn on_scheduled_tick(
            &self,
            _world: &mut WorldCore,
            pos: BlockPos,
            kind: BlockKind,
        ) -> Result<(), TickError> {
            FIRED.lock().push((pos, kind));
            Ok(())
        }
    }

    /// Fails every scheduled tick.
    struct Faulty {
        properties: BlockProperties,
    }

    impl BlockBehaviour for Faulty {
        fn properties(&self) -> &BlockProperties {
            &self.properties
        }

        fn on_scheduled_tick(
            &self,
            _world: &mut WorldCore,
            _pos: BlockPos,
            _kind: BlockKind,
        ) -> Result<(), TickError> {
            Err(BehaviourError::new("faulty block").into())
        }
    }

    static RECORDING: Recording = Recording {
        properties: BlockProperties::solid("recording"),
    };
    static FAULTY: Faulty = Faulty {
        properties: BlockProperties::solid("faulty"),
    };

    fn world_with_custom_blocks() -> (WorldCore, BlockKind, BlockKind) {
        let mut builder = BlockRegistryBuilder::with_vanilla();
        let recording = builder.register(&RECORDING);
        let faulty = builder.register(&FAULTY);
        let mut world = WorldCore::with_registries(
            quiet_config(),
            Box::new(Overworld),
            Box::new(Populated(FlatChunkSource::classic())),
            builder.build(),
            EntityTypeRegistry::vanilla(),
        );
        for x in -2..=2 {
            for z in -2..=2 {
                world.load_chunk(ChunkPos::new(x, z));
            }
        }
        (world, recording, faulty)
    }

    #[test]
    fn test_due_update_fires_once_and_leaves() {
        let (mut world, recording, _) = world_with_custom_blocks();
        for _ in 0..3 {
            world.tick().expect("tick");
        }
        let pos = BlockPos::new(10, 64, 10);
        world.set_block(pos, recording).expect("placed");
        world
            .schedule_block_update(&pos, recording, 0, TickPriority::Normal)
            .expect("scheduled");
        assert!(world.is_update_pending(pos, recording));

        let remaining = world.run_scheduled_ticks(false).expect("drain");
        assert!(!remaining);
        assert_eq!(*FIRED.lock(), vec![(pos, recording)]);
        assert!(!world.is_update_pending(pos, recording));

        world.run_scheduled_ticks(false).expect("drain");
        assert_eq!(FIRED.lock().len(), 1);
    }

    #[test]
    fn test_block_error_carries_position() {
        let (mut world, _, faulty) = world_with_custom_blocks();
        let pos = BlockPos::new(-7, 20, 12);
        world.set_block(pos, faulty).expect("placed");
        world
            .schedule_block_update(&pos, faulty, 1, TickPriority::Normal)
            .expect("scheduled");

        let err = world.tick().expect_err("the block fails");
        let TickError::BlockTick { pos: at, kind, .. } = &err else {
            panic!("expected a block tick error, got {err}");
        };
        assert_eq!(*at, pos);
        assert_eq!(*kind, faulty);
    }

    #[test]
    fn test_replaced_block_skips_its_update() {
        let (mut world, _) = flat_world(quiet_config(), 2);
        let pos = BlockPos::new(4, 30, 4);
        world.set_block(pos, vanilla::WATER).expect("placed");
        let mut cursor = BlockCursor::new(4, 30, 4);
        world
            .schedule_block_update(&cursor, vanilla::WATER, 2, TickPriority::Normal)
            .expect("scheduled");
        cursor.move_by(0, 5, 0);
        assert!(world.is_update_pending(pos, vanilla::WATER));
        world.set_block(pos, vanilla::STONE).expect("replaced");

        world.tick().expect("tick");
        world.tick().expect("tick");
        assert_eq!(world.kind_at(pos.below()), vanilla::AIR);
        assert_eq!(world.pending_updates(), 0);
    }

    #[test]
    fn test_clock_advances_and_can_freeze() {
        let (mut world, _) = flat_world(quiet_config(), 1);
        for _ in 0..10 {
            world.tick().expect("tick");
        }
        assert_eq!(world.total_ticks(), 10);
        assert_eq!(world.day_time(), 10);

        let frozen = WorldConfig {
            do_daylight_cycle: false,
            ..quiet_config()
        };
        let (mut world, _) = flat_world(frozen, 1);
        for _ in 0..10 {
            world.tick().expect("tick");
        }
        assert_eq!(world.total_ticks(), 10);
        assert_eq!(world.day_time(), 0);
    }

    #[test]
    fn test_sky_darkens_at_night() {
        let (mut world, _) = flat_world(quiet_config(), 1);
        world.tick().expect("tick");
        assert_eq!(world.sky_darken(), 0);

        for _ in 0..TICKS_PER_DAY * 3 / 4 {
            world.tick().expect("tick");
        }
        assert_eq!(world.sky_darken(), 11);
        assert_eq!(world.moon_phase(), 0);
    }

    #[test]
    fn test_note_block_event_is_reported() {
        let (mut world, recorder) = flat_world(quiet_config(), 1);
        let open = BlockPos::new(2, 4, 2);
        let covered = BlockPos::new(6, 4, 6);
        world.set_block(open, vanilla::NOTE_BLOCK).expect("placed");
        world.set_block(covered, vanilla::NOTE_BLOCK).expect("placed");
        world.set_block(covered.above(), vanilla::GLASS).expect("placed");

        world.add_block_event(open, vanilla::NOTE_BLOCK, NoteBlock::PLAY_EVENT, 5);
        world.add_block_event(open, vanilla::NOTE_BLOCK, NoteBlock::PLAY_EVENT, 5);
        world.add_block_event(covered, vanilla::NOTE_BLOCK, NoteBlock::PLAY_EVENT, 5);
        world.add_block_event(open, vanilla::STONE, NoteBlock::PLAY_EVENT, 7);
        world.tick().expect("tick");

        let events = recorder.lock().block_events.clone();
        assert_eq!(
            events,
            vec![BlockEvent {
                pos: open,
                kind: vanilla::NOTE_BLOCK,
                event_id: NoteBlock::PLAY_EVENT,
                param: 5,
            }]
        );
    }

    #[test]
    fn test_unloaded_chunk_keeps_its_updates_and_entities() {
        let (mut world, _) = flat_world(quiet_config(), 3);
        let chunk = ChunkPos::new(1, 1);
        let water = BlockPos::new(20, 10, 20);
        world.set_block(water, vanilla::WATER).expect("placed");
        world
            .schedule_block_update(&water, vanilla::WATER, 40, TickPriority::Normal)
            .expect("scheduled");
        let pig = Uuid::from_u128(77);
        world
            .add_entity(Entity::new(pig, mobs::PIG, Vector3::new(20.5, 4.0, 20.5)))
            .expect("pig added");
        let player = world
            .add_player(Uuid::from_u128(1), Vector3::new(24.5, 4.0, 24.5))
            .expect("player added");

        world.queue_chunk_unload(chunk);
        world.tick().expect("tick");
        assert!(!world.chunks().is_chunk_loaded(chunk));
        assert!(!world.is_update_pending(water, vanilla::WATER));
        assert!(world.entities().get_by_uuid(pig).is_none());
        let player_entity = world.entities().get(player).expect("players stay");
        assert!(!player_entity.is_added_to_chunk());

        for _ in 0..10 {
            world.tick().expect("tick");
        }
        assert!(world.load_chunk(chunk));
        assert!(world.is_update_pending(water, vanilla::WATER));
        assert_eq!(world.kind_at(water), vanilla::WATER);
        assert!(world.entities().get_by_uuid(pig).is_some());

        world.tick().expect("tick");
        let player_entity = world.entities().get(player).expect("players stay");
        assert!(player_entity.is_added_to_chunk());

        // Time spent unloaded does not count toward the delay.
        for _ in 0..38 {
            world.tick().expect("tick");
        }
        assert!(world.is_update_pending(water, vanilla::WATER));
        world.tick().expect("tick");
        assert_eq!(world.kind_at(water.below()), vanilla::WATER);
    }

    #[test]
    fn test_unloaded_chunk_state_survives_save() {
        let (mut world, _) = flat_world(quiet_config(), 3);
        let chunk = ChunkPos::new(1, 1);
        let water = BlockPos::new(20, 10, 20);
        world.set_block(water, vanilla::WATER).expect("placed");
        world
            .schedule_block_update(&water, vanilla::WATER, 40, TickPriority::Normal)
            .expect("scheduled");
        let pig = Uuid::from_u128(77);
        world
            .add_entity(Entity::new(pig, mobs::PIG, Vector3::new(20.5, 4.0, 20.5)))
            .expect("pig added");
        world.queue_chunk_unload(chunk);
        world.tick().expect("tick");

        let snapshot = world.snapshot();
        assert_eq!(snapshot.unloaded_chunks.len(), 1);
        assert_eq!(snapshot.unloaded_chunks[0].pos, chunk);
        let json = serde_json::to_string(&snapshot).expect("serialize");

        let (mut resumed, _) = flat_world(quiet_config(), 0);
        resumed.restore(serde_json::from_str(&json).expect("deserialize"));
        assert!(!resumed.is_update_pending(water, vanilla::WATER));
        assert_eq!(resumed.snapshot().unloaded_chunks, snapshot.unloaded_chunks);

        assert!(resumed.load_chunk(chunk));
        assert!(resumed.is_update_pending(water, vanilla::WATER));
        assert!(resumed.entities().get_by_uuid(pig).is_some());
        assert!(resumed.snapshot().unloaded_chunks.is_empty());
    }

    #[test]
    fn test_restored_state_of_loaded_chunk_applies_at_once() {
        let (mut world, _) = flat_world(quiet_config(), 3);
        let chunk = ChunkPos::new(-2, 0);
        let pig = Uuid::from_u128(78);
        world
            .add_entity(Entity::new(pig, mobs::PIG, Vector3::new(-27.5, 4.0, 3.5)))
            .expect("pig added");
        world.queue_chunk_unload(chunk);
        world.tick().expect("tick");
        let snapshot = world.snapshot();

        let (mut resumed, _) = flat_world(quiet_config(), 3);
        resumed.restore(snapshot);
        assert!(resumed.entities().get_by_uuid(pig).is_some());
        assert!(resumed.snapshot().unloaded_chunks.is_empty());
    }

    #[test]
    fn test_tasks_run_at_tick_start() {
        let (mut world, _) = flat_world(quiet_config(), 1);
        let handle = world.task_handle();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");

        for _ in 0..3 {
            world.tick().expect("tick");
        }

        let future = handle.submit(|world: &mut WorldCore| world.total_ticks());
        let nested = handle.clone();
        handle.execute(move |_| {
            nested.execute(|world| world.set_spawn_point(BlockPos::new(9, 9, 9)));
        });
        world.tick().expect("tick");
        assert_eq!(runtime.block_on(future), Ok(3));
        assert_ne!(world.spawn_point(), BlockPos::new(9, 9, 9));

        world.tick().expect("tick");
        assert_eq!(world.spawn_point(), BlockPos::new(9, 9, 9));
    }

    #[test]
    fn test_panicking_task_aborts_tick() {
        let (mut world, _) = flat_world(quiet_config(), 1);
        world.task_handle().execute(|_| panic!("task exploded"));

        let err = world.tick().expect_err("the task panics");
        assert!(matches!(&err, TickError::Task(message) if message == "task exploded"));
        assert_eq!(world.total_ticks(), 0);
    }

    #[test]
    fn test_spawner_fills_creature_cap() {
        let config = WorldConfig {
            do_mob_spawning: true,
            difficulty: Difficulty::Peaceful,
            ..quiet_config()
        };
        let (mut world, recorder) = flat_world(config, 9);
        world
            .add_player(Uuid::from_u128(1), Vector3::new(8.5, 4.0, 8.5))
            .expect("player added");

        let spawned = world.spawn_creatures();
        assert!(spawned > 0);
        let creatures = world.entities().count_by_category(MobCategory::Creature);
        assert_eq!(creatures, spawned);
        assert_eq!(world.entities().count_by_category(MobCategory::Monster), 0);

        world
            .add_entity(Entity::new(Uuid::from_u128(2), mobs::PIG, Vector3::new(30.5, 4.0, 8.5)))
            .expect("pig added");
        world.tick().expect("tick");
        assert!(
            recorder
                .lock()
                .tracking
                .iter()
                .any(|change| matches!(change, TrackingChange::StartSeen { .. }))
        );

        // Passive creatures wait for the next interval.
        let before = world.entities().len();
        assert_eq!(world.spawn_creatures(), 0);
        assert_eq!(world.entities().len(), before);
    }

    #[test]
    fn test_border_keeps_spawner_out() {
        let config = WorldConfig {
            do_mob_spawning: true,
            difficulty: Difficulty::Peaceful,
            ..quiet_config()
        };
        let (mut world, _) = flat_world(config, 9);
        world.set_border(WorldBorder::new(5_000.0, 5_000.0, 64.0));
        world
            .add_player(Uuid::from_u128(1), Vector3::new(8.5, 4.0, 8.5))
            .expect("player added");

        assert_eq!(world.spawn_creatures(), 0);
        assert_eq!(world.entities().len(), 1);
    }

    #[test]
    fn test_moved_entity_is_refiled() {
        let (mut world, _) = flat_world(quiet_config(), 3);
        let pig = world
            .add_entity(Entity::new(Uuid::from_u128(5), mobs::PIG, Vector3::new(20.5, 4.0, 20.5)))
            .expect("pig added");
        let old_chunk = ChunkPos::new(1, 1);
        let new_chunk = ChunkPos::new(-1, 0);

        world
            .entities_mut()
            .get_mut(pig)
            .expect("pig exists")
            .move_to(Vector3::new(-10.5, 4.0, 5.5), 90.0, 0.0);
        world.tick().expect("tick");

        let entity = world.entities().get(pig).expect("pig exists");
        assert_eq!(entity.section().chunk(), new_chunk);
        assert!(entity.is_added_to_chunk());
        let filed = |pos| {
            world
                .chunks()
                .chunk_at(pos)
                .is_some_and(|chunk| chunk.entity_ids().any(|id| id == pig))
        };
        assert!(filed(new_chunk));
        assert!(!filed(old_chunk));
    }

    #[test]
    fn test_weather_changes_are_reported() {
        let config = WorldConfig {
            do_weather_cycle: true,
            ..quiet_config()
        };
        let (mut world, recorder) = flat_world(config, 1);
        world.set_weather(0, 1, 1_000_000, false, false);

        for _ in 0..25 {
            world.tick().expect("tick");
        }
        assert!(world.weather().raining);
        assert!(world.weather().is_raining());
        let recorded = recorder.lock();
        assert_eq!(recorded.weather.iter().filter(|c| c.started_raining).count(), 1);
        assert!(recorded.weather.iter().all(|c| c.thunder_level.is_none()));
    }

    #[test]
    fn test_skyless_dimension_has_no_weather() {
        let config = WorldConfig {
            do_weather_cycle: true,
            ..quiet_config()
        };
        let mut world = WorldCore::new(config, Box::new(Nether), Box::new(FlatChunkSource::classic()));
        world.load_chunk(ChunkPos::new(0, 0));
        world.set_weather(0, 1, 1, false, false);
        for _ in 0..50 {
            world.tick().expect("tick");
        }
        assert!(!world.weather().raining);
        assert!(!world.weather().is_raining());
    }
}
