//! World difficulty settings.

use serde::{Deserialize, Serialize};

/// The world difficulty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// No hostile creatures spawn.
    Peaceful = 0,
    /// Easy.
    Easy = 1,
    /// Normal, the default.
    #[default]
    Normal = 2,
    /// Hard.
    Hard = 3,
}

impl Difficulty {
    /// Returns true if this is peaceful difficulty.
    #[inline]
    #[must_use]
    pub const fn is_peaceful(self) -> bool {
        matches!(self, Self::Peaceful)
    }

    /// Whether hostile creatures may be placed by the spawner.
    #[inline]
    #[must_use]
    pub const fn allows_hostiles(self) -> bool {
        !self.is_peaceful()
    }
}
