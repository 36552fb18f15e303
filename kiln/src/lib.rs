//! # Kiln
//!
//! Runs a single kiln world at a fixed tick rate until interrupted.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Context;
use kiln_core::error::PersistError;
use kiln_core::persistence::{JsonFileStore, SnapshotStore};
use kiln_core::world::{FlatChunkSource, Overworld};
use kiln_core::{WorldConfig, WorldCore};
use kiln_utils::ChunkPos;
use rand::Rng;
use tokio::select;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Log setup.
pub mod logger;

/// Chunks kept loaded around the spawn point, in every direction.
pub const SPAWN_CHUNK_RADIUS: i32 = 2;

/// Ticks between automatic saves.
pub const AUTOSAVE_INTERVAL: u64 = 6000;

/// Overruns shorter than this many ticks are not reported.
const OVERLOAD_WARNING_TICKS: u32 = 2;

/// The runner: one world, its snapshot file and the tick loop driving it.
pub struct KilnServer {
    /// The cancellation token for graceful shutdown.
    pub cancel_token: CancellationToken,
    /// The simulated world.
    pub world: WorldCore,
    store: JsonFileStore,
}

impl KilnServer {
    /// Loads the config at `config_path`, then resumes the world from the
    /// snapshot at `snapshot_path` if there is one.
    pub fn new(config_path: &Path, snapshot_path: &Path) -> anyhow::Result<Self> {
        log::info!("Starting Kiln");

        let mut config = WorldConfig::load_or_create(config_path)
            .with_context(|| format!("failed to load config {}", config_path.display()))?;
        let store = JsonFileStore::new(snapshot_path);
        let snapshot = match store.load() {
            Ok(snapshot) => Some(snapshot),
            Err(PersistError::Missing) => None,
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read snapshot {}", snapshot_path.display()));
            }
        };

        if let Some(snapshot) = &snapshot {
            config.seed = snapshot.seed;
        } else if config.seed == 0 {
            config.seed = rand::rng().random_range(1..i64::MAX);
            log::info!("No seed configured, using {}", config.seed);
        }

        let mut world = WorldCore::new(
            config,
            Box::new(Overworld),
            Box::new(FlatChunkSource::classic()),
        );
        if let Some(snapshot) = snapshot {
            world.restore(snapshot);
        }

        let spawn = world.spawn_point().chunk_pos();
        let mut loaded = 0;
        for dx in -SPAWN_CHUNK_RADIUS..=SPAWN_CHUNK_RADIUS {
            for dz in -SPAWN_CHUNK_RADIUS..=SPAWN_CHUNK_RADIUS {
                if world.load_chunk(ChunkPos::new(spawn.x() + dx, spawn.z() + dz)) {
                    loaded += 1;
                }
            }
        }
        log::info!("Prepared {loaded} spawn chunks around {spawn}");

        Ok(Self {
            cancel_token: CancellationToken::new(),
            world,
            store,
        })
    }

    /// Ticks the world until the token is cancelled, then saves once more.
    ///
    /// Returns the first tick error. The world is not saved in that case.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.world.bind_current_thread();

        let tick_rate = self.world.config().tick_rate;
        let period = Duration::from_secs(1) / tick_rate;
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        log::info!("Running at {tick_rate} ticks per second");
        loop {
            select! {
                () = self.cancel_token.cancelled() => {
                    break;
                }
                _ = interval.tick() => {
                    let started = Instant::now();
                    self.world
                        .tick()
                        .with_context(|| format!("tick {} failed", self.world.total_ticks()))?;

                    let elapsed = started.elapsed();
                    if elapsed > period * OVERLOAD_WARNING_TICKS {
                        let behind = elapsed.as_millis() / period.as_millis().max(1);
                        log::warn!(
                            "Can't keep up! Is the world overloaded? Running {}ms or {behind} ticks behind",
                            elapsed.as_millis()
                        );
                    }
                    if self.world.total_ticks() % AUTOSAVE_INTERVAL == 0 {
                        self.save();
                    }
                }
            }
        }

        log::info!("Stopping at tick {}", self.world.total_ticks());
        self.save();
        Ok(())
    }

    /// Writes a snapshot. Failures are logged and never stop the world.
    pub fn save(&mut self) {
        let snapshot = self.world.snapshot();
        match self.store.save(&snapshot) {
            Ok(()) => log::info!(
                "Saved world at tick {} to {}",
                snapshot.clock.total_ticks,
                self.store.path().display()
            ),
            Err(err) => log::warn!("Failed to save world: {err}"),
        }
    }

    /// Stops the tick loop after the current tick.
    pub fn stop(&self) {
        self.cancel_token.cancel();
    }
}
