use std::sync::Arc;

use kiln_utils::BlockPos;
use parking_lot::Mutex;

use super::block_events::BlockEvent;
use super::weather::WeatherChange;
use crate::behavior::BlockKind;
use crate::entity::TrackingChange;

/// Observes what a world tick produced. Listeners run synchronously on the
/// simulation thread, in registration order.
pub trait WorldListener: Send {
    /// A block changed kind.
    fn on_block_changed(&mut self, _pos: BlockPos, _old: BlockKind, _new: BlockKind) {}

    /// A block event fired and asked to be shown.
    fn on_block_event(&mut self, _event: &BlockEvent) {}

    /// The weather visibly changed.
    fn on_weather_changed(&mut self, _change: &WeatherChange) {}

    /// Viewers started or stopped seeing entities.
    fn on_tracking_changed(&mut self, _changes: &[TrackingChange]) {}
}

impl<L: WorldListener> WorldListener for Arc<Mutex<L>> {
    fn on_block_changed(&mut self, pos: BlockPos, old: BlockKind, new: BlockKind) {
        self.lock().on_block_changed(pos, old, new);
    }

    fn on_block_event(&mut self, event: &BlockEvent) {
        self.lock().on_block_event(event);
    }

    fn on_weather_changed(&mut self, change: &WeatherChange) {
        self.lock().on_weather_changed(change);
    }

    fn on_tracking_changed(&mut self, changes: &[TrackingChange]) {
        self.lock().on_tracking_changed(changes);
    }
}
