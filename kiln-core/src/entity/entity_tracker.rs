//! Entity tracking system
//!
//! Keeps track of which entities each player can see, based on distance.

use rustc_hash::{FxHashMap, FxHashSet};

use super::{Entity, EntityId, EntityListener, EntityRegistry};

/// Default entity tracking range in blocks
pub const DEFAULT_ENTITY_TRACKING_RANGE: f64 = 64.0;

/// A change in what a viewer sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingChange {
    /// `entity` became visible to `viewer`.
    StartSeen {
        /// The player.
        viewer: EntityId,
        /// The tracked entity.
        entity: EntityId,
    },
    /// `entity` is no longer visible to `viewer`.
    StopSeen {
        /// The player.
        viewer: EntityId,
        /// The tracked entity.
        entity: EntityId,
    },
}

/// Entity tracker that manages visibility between entities and players
pub struct EntityTracker {
    /// Tracking range per tracked entity
    tracked: FxHashMap<EntityId, f64>,
    /// Visible entities per player
    viewers: FxHashMap<EntityId, FxHashSet<EntityId>>,
    /// Changes not yet collected
    pending: Vec<TrackingChange>,
    range: f64,
}

impl EntityTracker {
    /// Creates a new entity tracker
    #[must_use]
    pub fn new() -> Self {
        Self::with_range(DEFAULT_ENTITY_TRACKING_RANGE)
    }

    /// Creates a tracker using `range` for every entity.
    #[must_use]
    pub fn with_range(range: f64) -> Self {
        Self {
            tracked: FxHashMap::default(),
            viewers: FxHashMap::default(),
            pending: Vec::new(),
            range,
        }
    }

    /// Updates entity visibility for all players and returns every change
    /// since the previous call, removals included.
    ///
    /// This should be called every tick after the entity pass.
    pub fn update(&mut self, registry: &EntityRegistry) -> Vec<TrackingChange> {
        for player in registry.players() {
            if player.is_dead() {
                continue;
            }
            let viewer = player.id;
            let visible = self.viewers.entry(viewer).or_default();

            for (&entity_id, &range) in &self.tracked {
                // Don't track self
                if entity_id == viewer {
                    continue;
                }
                let Some(entity) = registry.get(entity_id) else {
                    continue;
                };

                let should_track = player.distance_sq(entity.position) <= range * range;
                let currently_tracked = visible.contains(&entity_id);

                if should_track && !currently_tracked {
                    visible.insert(entity_id);
                    self.pending.push(TrackingChange::StartSeen {
                        viewer,
                        entity: entity_id,
                    });
                } else if !should_track && currently_tracked {
                    visible.remove(&entity_id);
                    self.pending.push(TrackingChange::StopSeen {
                        viewer,
                        entity: entity_id,
                    });
                }
            }
        }
        std::mem::take(&mut self.pending)
    }

    /// Whether `viewer` currently sees `entity`.
    #[must_use]
    pub fn is_seen_by(&self, viewer: EntityId, entity: EntityId) -> bool {
        self.viewers
            .get(&viewer)
            .is_some_and(|visible| visible.contains(&entity))
    }

    /// Gets the number of tracked entities
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.tracked.len()
    }
}

impl Default for EntityTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityListener for EntityTracker {
    fn on_entity_added(&mut self, entity: &Entity) {
        self.tracked.insert(entity.id, self.range);
        if entity.is_player() {
            self.viewers.entry(entity.id).or_default();
        }
    }

    fn on_entity_removed(&mut self, entity: &Entity) {
        let id = entity.id;
        if self.tracked.remove(&id).is_none() {
            return;
        }
        for (&viewer, visible) in &mut self.viewers {
            if visible.remove(&id) {
                self.pending.push(TrackingChange::StopSeen { viewer, entity: id });
            }
        }
        if self.viewers.remove(&id).is_some() {
            log::debug!("Stopped tracking for player {id}");
        }
    }
}
