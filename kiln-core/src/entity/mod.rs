//! Entities and their lifecycle.
//!
//! The [`EntityRegistry`] owns every live [`Entity`]. Chunks only keep the ids
//! of the entities filed under them, and observers such as the
//! [`EntityTracker`] are told about additions and removals through
//! [`EntityListener`].

pub mod category;
pub mod entity_tracker;
pub mod listener;
pub mod registry;
pub mod types;

use std::fmt::{self, Display};

use kiln_utils::{BlockPos, SectionPos, math::Vector3};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use uuid::Uuid;

pub use category::MobCategory;
pub use entity_tracker::{EntityTracker, TrackingChange};
pub use listener::EntityListener;
pub use registry::{EntityRegistry, EntitySections};
pub use types::{EntityBehaviour, EntityContext, EntityKind, EntityTypeRegistry, SpawnPlacement};

/// Session id of an entity, assigned when it is added to a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct EntityId(pub i32);

impl Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A live entity.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Session id. Zero until the entity is added to a registry.
    pub id: EntityId,
    /// Persistent id.
    pub uuid: Uuid,
    /// The type of the entity.
    pub kind: EntityKind,
    /// Current position.
    pub position: Vector3<f64>,
    /// Current velocity, applied by the entity's own update.
    pub velocity: Vector3<f64>,
    /// Yaw in degrees.
    pub yaw: f32,
    /// Pitch in degrees.
    pub pitch: f32,
    /// Whether the entity is in spectator mode. Only meaningful for players.
    pub spectator: bool,
    /// Number of updates run.
    pub ticks_existed: u64,
    /// Opaque per-type state, persisted as is.
    pub payload: serde_json::Value,
    last_position: Vector3<f64>,
    last_yaw: f32,
    last_pitch: f32,
    dead: bool,
    pub(crate) section: SectionPos,
    pub(crate) added_to_chunk: bool,
    pub(crate) vehicle: Option<EntityId>,
    pub(crate) passengers: SmallVec<[EntityId; 2]>,
}

impl Entity {
    /// Creates a living entity of `kind` at `position`.
    #[must_use]
    pub fn new(uuid: Uuid, kind: EntityKind, position: Vector3<f64>) -> Self {
        Self {
            id: EntityId::default(),
            uuid,
            kind,
            position,
            velocity: Vector3::default(),
            yaw: 0.0,
            pitch: 0.0,
            spectator: false,
            ticks_existed: 0,
            payload: serde_json::Value::Null,
            last_position: position,
            last_yaw: 0.0,
            last_pitch: 0.0,
            dead: false,
            section: SectionPos::of_entity(position.x, position.y, position.z),
            added_to_chunk: false,
            vehicle: None,
            passengers: SmallVec::new(),
        }
    }

    /// Creates a player at `position`.
    #[must_use]
    pub fn player(uuid: Uuid, position: Vector3<f64>) -> Self {
        Self::new(uuid, EntityKind::PLAYER, position)
    }

    /// Whether this entity is a player.
    #[must_use]
    pub fn is_player(&self) -> bool {
        self.kind == EntityKind::PLAYER
    }

    /// Whether the entity was marked dead. Dead entities are purged after the current pass.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Marks the entity dead.
    pub fn kill(&mut self) {
        self.dead = true;
    }

    /// Sets position and rotation.
    pub fn move_to(&mut self, position: Vector3<f64>, yaw: f32, pitch: f32) {
        self.position = position;
        self.yaw = yaw;
        self.pitch = pitch;
    }

    /// The block the entity's feet are in.
    #[must_use]
    pub fn block_pos(&self) -> BlockPos {
        BlockPos::new(
            self.position.x.floor() as i32,
            self.position.y.floor() as i32,
            self.position.z.floor() as i32,
        )
    }

    /// The section the entity is filed under, or was last filed under.
    #[must_use]
    pub fn section(&self) -> SectionPos {
        self.section
    }

    /// Whether the entity is filed under a loaded chunk.
    #[must_use]
    pub fn is_added_to_chunk(&self) -> bool {
        self.added_to_chunk
    }

    /// The entity this one rides.
    #[must_use]
    pub fn vehicle(&self) -> Option<EntityId> {
        self.vehicle
    }

    /// The entities riding this one.
    #[must_use]
    pub fn passengers(&self) -> &[EntityId] {
        &self.passengers
    }

    /// Squared horizontal distance to a point.
    #[must_use]
    pub fn horizontal_distance_sq(&self, x: f64, z: f64) -> f64 {
        Vector3::new(self.position.x - x, 0.0, self.position.z - z).horizontal_length_squared()
    }

    /// Squared distance to a point.
    #[must_use]
    pub fn distance_sq(&self, point: Vector3<f64>) -> f64 {
        (self.position - point).length_squared()
    }

    /// Remembers the current position and rotation as the fallback for
    /// [`Entity::revert_non_finite`]. Non-finite values are never remembered.
    pub(crate) fn remember_position(&mut self) {
        if self.position.is_finite() {
            self.last_position = self.position;
        }
        if self.yaw.is_finite() && self.pitch.is_finite() {
            self.last_yaw = self.yaw;
            self.last_pitch = self.pitch;
        }
    }

    /// Restores the last remembered position or rotation if the current one
    /// is NaN or infinite. Returns whether anything was restored.
    pub(crate) fn revert_non_finite(&mut self) -> bool {
        let mut reverted = false;
        if !self.position.is_finite() {
            self.position = self.last_position;
            self.velocity = Vector3::default();
            reverted = true;
        }
        if !self.yaw.is_finite() || !self.pitch.is_finite() {
            self.yaw = self.last_yaw;
            self.pitch = self.last_pitch;
            reverted = true;
        }
        reverted
    }
}

/// The persistent form of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Persistent id.
    pub uuid: Uuid,
    /// Type of the entity.
    pub kind: EntityKind,
    /// Position.
    pub position: Vector3<f64>,
    /// Yaw and pitch.
    pub rotation: (f32, f32),
    /// Opaque per-type state.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl From<&Entity> for EntityRecord {
    fn from(entity: &Entity) -> Self {
        Self {
            uuid: entity.uuid,
            kind: entity.kind,
            position: entity.position,
            rotation: (entity.yaw, entity.pitch),
            payload: entity.payload.clone(),
        }
    }
}

impl From<EntityRecord> for Entity {
    fn from(record: EntityRecord) -> Self {
        let mut entity = Entity::new(record.uuid, record.kind, record.position);
        entity.yaw = record.rotation.0;
        entity.pitch = record.rotation.1;
        entity.remember_position();
        entity.payload = record.payload;
        entity
    }
}
