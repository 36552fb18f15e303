//! Observers of entity additions and removals.

use std::sync::Arc;

use parking_lot::Mutex;

use super::Entity;

/// Receives entity additions and removals, in registration order.
pub trait EntityListener: Send {
    /// The entity was added and filed under its chunk.
    fn on_entity_added(&mut self, entity: &Entity);

    /// The entity left the registry, either dead or unloaded.
    fn on_entity_removed(&mut self, entity: &Entity);
}

/// A listener shared with code outside the registry.
impl<L: EntityListener> EntityListener for Arc<Mutex<L>> {
    fn on_entity_added(&mut self, entity: &Entity) {
        self.lock().on_entity_added(entity);
    }

    fn on_entity_removed(&mut self, entity: &Entity) {
        self.lock().on_entity_removed(entity);
    }
}
