//! The owner of every live entity.

use kiln_utils::{BlockPos, SectionPos, random::LegacyRandom};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use uuid::Uuid;

use super::{Entity, EntityContext, EntityId, EntityListener, EntityTypeRegistry, MobCategory};
use crate::error::{Rejected, TickError, TickResultExt};
use crate::world::SpatialIndex;

/// Horizontal radius that must be loaded around a non-player entity for it to update.
const UPDATE_RADIUS: i32 = 32;

/// Chunk membership of entities.
pub trait EntitySections: SpatialIndex {
    /// Files `id` under `section`. Returns `false` if the chunk is not loaded.
    fn attach(&mut self, section: SectionPos, id: EntityId) -> bool;

    /// Removes `id` from `section`. Unloaded chunks are ignored.
    fn detach(&mut self, section: SectionPos, id: EntityId);
}

/// Owns the live entities, their ids and their chunk membership.
///
/// Entities are updated once per tick in insertion order. Entities that die
/// during the pass stay in place until the pass completes and are purged
/// afterwards.
pub struct EntityRegistry {
    types: EntityTypeRegistry,
    entities: FxHashMap<EntityId, Entity>,
    order: Vec<EntityId>,
    by_uuid: FxHashMap<Uuid, EntityId>,
    unload_queue: Vec<EntityId>,
    queued_unload: FxHashSet<EntityId>,
    listeners: Vec<Box<dyn EntityListener>>,
    next_id: i32,
    player_count: usize,
    idle_ticks: u32,
    idle_limit: u32,
}

impl EntityRegistry {
    /// Creates an empty registry. Without players the per-entity pass stops
    /// after `idle_limit` ticks.
    #[must_use]
    pub fn new(types: EntityTypeRegistry, idle_limit: u32) -> Self {
        Self {
            types,
            entities: FxHashMap::default(),
            order: Vec::new(),
            by_uuid: FxHashMap::default(),
            unload_queue: Vec::new(),
            queued_unload: FxHashSet::default(),
            listeners: Vec::new(),
            next_id: 1,
            player_count: 0,
            idle_ticks: 0,
            idle_limit,
        }
    }

    /// The entity types known to this registry.
    #[must_use]
    pub fn types(&self) -> &EntityTypeRegistry {
        &self.types
    }

    /// Registers an observer. Observers are called in registration order.
    pub fn add_listener(&mut self, listener: Box<dyn EntityListener>) {
        self.listeners.push(listener);
    }

    /// Adds an entity, filing it under its chunk.
    ///
    /// Rejected if the entity is dead, if a live non-player entity already owns
    /// its UUID, or if its chunk is not loaded. A player displaces a live
    /// entity with the same UUID, and an entity waiting to be unloaded is
    /// always displaced.
    pub fn add<S: EntitySections + ?Sized>(
        &mut self,
        sections: &mut S,
        entity: Entity,
    ) -> Result<EntityId, Rejected> {
        self.add_inner(sections, entity, false)
    }

    /// Like [`EntityRegistry::add`] but without the loaded-chunk requirement.
    pub fn add_forced<S: EntitySections + ?Sized>(
        &mut self,
        sections: &mut S,
        entity: Entity,
    ) -> Result<EntityId, Rejected> {
        self.add_inner(sections, entity, true)
    }

    fn add_inner<S: EntitySections + ?Sized>(
        &mut self,
        sections: &mut S,
        mut entity: Entity,
        forced: bool,
    ) -> Result<EntityId, Rejected> {
        if entity.is_dead() {
            log::warn!(
                "Tried to add entity {} but it was marked as removed already",
                self.type_name(&entity)
            );
            return Err(Rejected::Dead);
        }

        if let Some(&existing) = self.by_uuid.get(&entity.uuid) {
            if self.queued_unload.remove(&existing) {
                self.unload_queue.retain(|id| *id != existing);
            } else if entity.is_player() {
                log::warn!("Force-added player with duplicate UUID {}", entity.uuid);
            } else {
                let kept = self
                    .entities
                    .get(&existing)
                    .map_or("unknown", |e| self.type_name(e));
                log::warn!(
                    "Keeping entity {kept} that already exists with UUID {}",
                    entity.uuid
                );
                return Err(Rejected::DuplicateUuid(entity.uuid));
            }
            self.remove(sections, existing);
        }

        let section = SectionPos::of_entity(entity.position.x, entity.position.y, entity.position.z);
        if !forced && !entity.is_player() && !sections.is_chunk_loaded(section.chunk()) {
            return Err(Rejected::ChunkNotLoaded(section.chunk()));
        }

        let id = EntityId(self.next_id);
        self.next_id += 1;
        entity.id = id;
        entity.section = section;
        entity.added_to_chunk = sections.attach(section, id);
        entity.remember_position();

        if entity.is_player() {
            self.player_count += 1;
        }
        self.idle_ticks = 0;
        self.by_uuid.insert(entity.uuid, id);
        self.order.push(id);
        for listener in &mut self.listeners {
            listener.on_entity_added(&entity);
        }
        self.entities.insert(id, entity);
        Ok(id)
    }

    /// Kills and removes an entity right away, outside of the entity pass.
    pub fn remove<S: EntitySections + ?Sized>(
        &mut self,
        sections: &mut S,
        id: EntityId,
    ) -> Option<Entity> {
        if let Some(entity) = self.entities.get_mut(&id) {
            entity.kill();
        }
        self.purge(sections, id)
    }

    /// Queues entities to be dropped at the start of the next pass, as their chunk unloaded.
    pub fn queue_unload<I: IntoIterator<Item = EntityId>>(&mut self, ids: I) {
        for id in ids {
            if self.entities.contains_key(&id) && self.queued_unload.insert(id) {
                self.unload_queue.push(id);
            }
        }
    }

    /// Whether `id` waits to be unloaded.
    #[must_use]
    pub fn is_unload_queued(&self, id: EntityId) -> bool {
        self.queued_unload.contains(&id)
    }

    /// Puts `rider` on `vehicle`. Fails if either is missing or dead, if the
    /// rider already rides, or if the vehicle rides the rider.
    pub fn mount(&mut self, rider: EntityId, vehicle: EntityId) -> bool {
        if rider == vehicle {
            return false;
        }
        let rider_free = self
            .entities
            .get(&rider)
            .is_some_and(|e| !e.is_dead() && e.vehicle.is_none());
        let vehicle_alive = self.entities.get(&vehicle).is_some_and(|e| !e.is_dead());
        if !rider_free || !vehicle_alive || self.rides(vehicle, rider) {
            return false;
        }

        if let Some(entity) = self.entities.get_mut(&rider) {
            entity.vehicle = Some(vehicle);
        }
        if let Some(entity) = self.entities.get_mut(&vehicle) {
            entity.passengers.push(rider);
        }
        true
    }

    /// Takes `id` off its vehicle.
    pub fn dismount(&mut self, id: EntityId) {
        let Some(vehicle) = self.entities.get_mut(&id).and_then(|e| e.vehicle.take()) else {
            return;
        };
        if let Some(entity) = self.entities.get_mut(&vehicle) {
            entity.passengers.retain(|passenger| *passenger != id);
        }
    }

    /// Whether `id` rides `vehicle`, directly or through other entities.
    fn rides(&self, id: EntityId, vehicle: EntityId) -> bool {
        let mut current = self.entities.get(&id).and_then(|e| e.vehicle);
        while let Some(next) = current {
            if next == vehicle {
                return true;
            }
            current = self.entities.get(&next).and_then(|e| e.vehicle);
        }
        false
    }

    /// Runs the per-entity pass.
    ///
    /// Queued unloads are processed first. Without players the pass is skipped
    /// once the idle limit is reached. Riders are updated right after their
    /// vehicle; a rider whose vehicle is dead or no longer carries it is
    /// dismounted and updated on its own. Entities that died are purged once
    /// every entity has been visited.
    pub fn tick_entities<S: EntitySections>(
        &mut self,
        sections: &mut S,
        random: &mut LegacyRandom,
        total_ticks: u64,
    ) -> Result<(), TickError> {
        self.process_unloads(sections);

        if self.player_count == 0 {
            if self.idle_ticks >= self.idle_limit {
                return Ok(());
            }
            self.idle_ticks += 1;
        } else {
            self.idle_ticks = 0;
        }

        let result = self.visit_all(sections, random, total_ticks);
        self.purge_dead(sections);
        result
    }

    fn visit_all<S: EntitySections>(
        &mut self,
        sections: &mut S,
        random: &mut LegacyRandom,
        total_ticks: u64,
    ) -> Result<(), TickError> {
        let order = self.order.clone();
        for id in order {
            let Some(entity) = self.entities.get(&id) else {
                continue;
            };
            if let Some(vehicle) = entity.vehicle {
                let carried = self
                    .entities
                    .get(&vehicle)
                    .is_some_and(|v| !v.is_dead() && v.passengers.contains(&id));
                if carried {
                    continue;
                }
                self.dismount(id);
            }
            self.update_entity(sections, id, random, total_ticks)?;
        }
        Ok(())
    }

    fn update_entity<S: EntitySections>(
        &mut self,
        sections: &mut S,
        id: EntityId,
        random: &mut LegacyRandom,
        total_ticks: u64,
    ) -> Result<(), TickError> {
        let Some(mut entity) = self.entities.remove(&id) else {
            return Ok(());
        };
        let result = update_one(&self.types, sections, &mut entity, random, total_ticks);
        let passengers = if entity.added_to_chunk && !entity.is_dead() {
            entity.passengers.clone()
        } else {
            SmallVec::new()
        };
        self.entities.insert(id, entity);
        result?;

        for passenger in passengers {
            let carried = self
                .entities
                .get(&passenger)
                .is_some_and(|p| !p.is_dead() && p.vehicle == Some(id));
            if carried {
                self.update_entity(sections, passenger, random, total_ticks)?;
            } else {
                self.dismount(passenger);
            }
        }
        Ok(())
    }

    fn process_unloads<S: EntitySections + ?Sized>(&mut self, sections: &mut S) {
        let queued = std::mem::take(&mut self.unload_queue);
        self.queued_unload.clear();
        for id in queued {
            self.purge(sections, id);
        }
    }

    fn purge_dead<S: EntitySections + ?Sized>(&mut self, sections: &mut S) {
        let dead: Vec<EntityId> = self
            .order
            .iter()
            .copied()
            .filter(|id| self.entities.get(id).is_some_and(Entity::is_dead))
            .collect();
        for id in dead {
            self.purge(sections, id);
        }
    }

    /// Drops an entity from every structure and tells the listeners.
    fn purge<S: EntitySections + ?Sized>(
        &mut self,
        sections: &mut S,
        id: EntityId,
    ) -> Option<Entity> {
        let entity = self.entities.remove(&id)?;
        if entity.added_to_chunk {
            sections.detach(entity.section, id);
        }
        self.order.retain(|other| *other != id);
        if self.by_uuid.get(&entity.uuid) == Some(&id) {
            self.by_uuid.remove(&entity.uuid);
        }
        if self.queued_unload.remove(&id) {
            self.unload_queue.retain(|other| *other != id);
        }
        if entity.is_player() {
            self.player_count -= 1;
        }

        if let Some(vehicle) = entity.vehicle
            && let Some(vehicle) = self.entities.get_mut(&vehicle)
        {
            vehicle.passengers.retain(|passenger| *passenger != id);
        }
        for passenger in &entity.passengers {
            if let Some(passenger) = self.entities.get_mut(passenger) {
                passenger.vehicle = None;
            }
        }

        for listener in &mut self.listeners {
            listener.on_entity_removed(&entity);
        }
        Some(entity)
    }

    /// The entity with session id `id`.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// The entity with session id `id`, mutably.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// The entity with persistent id `uuid`.
    #[must_use]
    pub fn get_by_uuid(&self, uuid: Uuid) -> Option<&Entity> {
        self.by_uuid.get(&uuid).and_then(|id| self.entities.get(id))
    }

    /// Every entity in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().filter_map(|id| self.entities.get(id))
    }

    /// Every player in insertion order.
    pub fn players(&self) -> impl Iterator<Item = &Entity> {
        self.iter().filter(|entity| entity.is_player())
    }

    /// Number of players.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    /// Number of live entities counting against `category`.
    #[must_use]
    pub fn count_by_category(&self, category: MobCategory) -> usize {
        self.entities
            .values()
            .filter(|entity| !entity.is_dead() && self.types.category(entity.kind) == Some(category))
            .count()
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether there are no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn type_name(&self, entity: &Entity) -> &'static str {
        self.types.get(entity.kind).map_or("unknown", |b| b.name())
    }
}

/// Updates a single entity that has been taken out of the registry.
fn update_one<S: EntitySections>(
    types: &EntityTypeRegistry,
    sections: &mut S,
    entity: &mut Entity,
    random: &mut LegacyRandom,
    total_ticks: u64,
) -> Result<(), TickError> {
    if entity.is_dead() {
        return Ok(());
    }

    let player = entity.is_player();
    if !player {
        let block = entity.block_pos();
        let loaded = sections.is_region_loaded(
            BlockPos::new(block.x() - UPDATE_RADIUS, 0, block.z() - UPDATE_RADIUS),
            BlockPos::new(block.x() + UPDATE_RADIUS, 0, block.z() + UPDATE_RADIUS),
        );
        if !loaded {
            return Ok(());
        }
    }

    entity.remember_position();
    if !player {
        entity.ticks_existed += 1;
        if let Some(behaviour) = types.get(entity.kind) {
            let position = entity.position;
            let mut ctx = EntityContext {
                spatial: &*sections,
                random,
                total_ticks,
            };
            behaviour.tick(entity, &mut ctx).in_entity_tick(
                entity.id,
                entity.uuid,
                [position.x, position.y, position.z],
            )?;
        }
    }

    if entity.revert_non_finite() {
        log::debug!("Entity {} moved to a non-finite position, reverted", entity.id);
    }
    update_section(sections, entity);
    Ok(())
}

/// Moves the entity to the section it now occupies.
fn update_section<S: EntitySections + ?Sized>(sections: &mut S, entity: &mut Entity) {
    let section = SectionPos::of_entity(entity.position.x, entity.position.y, entity.position.z);
    if entity.added_to_chunk && entity.section == section {
        return;
    }
    if entity.added_to_chunk {
        sections.detach(entity.section, entity.id);
    }
    entity.section = section;
    entity.added_to_chunk = sections.attach(section, entity.id);
}
