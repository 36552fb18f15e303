//! World configuration, loaded from a JSON5 file.

use std::{fs, ops::RangeInclusive, path::Path};

use serde::{Deserialize, Serialize};

use crate::{difficulty::Difficulty, error::ConfigError};

const DEFAULT_CONFIG: &str = r#"// Kiln world configuration.
{
    seed: 0,
    difficulty: "normal",
    do_daylight_cycle: true,
    do_mob_spawning: true,
    do_weather_cycle: true,
    scheduled_updates_are_immediate: false,
    tick_rate: 20,
    max_ticks_per_drain: 1000,
    idle_entity_ticks: 300,
    spawn: {
        chunk_radius: 8,
        group_attempts: 3,
        max_cluster_size: 4,
        step_bound: 6,
        min_player_distance: 24.0,
        min_spawn_distance: 24.0,
        animal_spawn_interval: 400,
    },
}
"#;

/// Settings for the whole world.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World seed. `0` lets the runner pick one.
    pub seed: i64,
    /// Difficulty, gating hostile spawning.
    pub difficulty: Difficulty,
    /// Whether time of day advances.
    pub do_daylight_cycle: bool,
    /// Whether the mob spawner runs.
    pub do_mob_spawning: bool,
    /// Whether weather timers run.
    pub do_weather_cycle: bool,
    /// Run block updates synchronously where the block allows it.
    pub scheduled_updates_are_immediate: bool,
    /// Target ticks per second.
    pub tick_rate: u32,
    /// Upper bound of scheduled ticks fired per drain.
    pub max_ticks_per_drain: usize,
    /// Ticks without players after which entity updates are skipped.
    pub idle_entity_ticks: u32,
    /// Mob spawning tuning.
    pub spawn: SpawnConfig,
    /// Weather duration tuning.
    pub weather: WeatherConfig,
}

/// Tunable constants of the natural spawner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Chunk radius around each viewer, the outer ring included.
    pub chunk_radius: i32,
    /// Cluster groups attempted per chunk.
    pub group_attempts: u32,
    /// Upper bound of the random walk length of one group.
    pub max_cluster_size: u32,
    /// Bound of each random step along x and z.
    pub step_bound: i32,
    /// Minimum distance to any player.
    pub min_player_distance: f64,
    /// Minimum distance to the world spawn point.
    pub min_spawn_distance: f64,
    /// Passive creatures are only considered every this many ticks.
    pub animal_spawn_interval: u64,
}

/// Random duration ranges used by the weather cycle, in ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Clear spell length.
    pub clear: RangeInclusive<i32>,
    /// Rain spell length.
    pub rain: RangeInclusive<i32>,
    /// Thunder spell length.
    pub thunder: RangeInclusive<i32>,
    /// Gap between thunder spells.
    pub no_thunder: RangeInclusive<i32>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            difficulty: Difficulty::Normal,
            do_daylight_cycle: true,
            do_mob_spawning: true,
            do_weather_cycle: true,
            scheduled_updates_are_immediate: false,
            tick_rate: 20,
            max_ticks_per_drain: 1000,
            idle_entity_ticks: 300,
            spawn: SpawnConfig::default(),
            weather: WeatherConfig::default(),
        }
    }
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            chunk_radius: 8,
            group_attempts: 3,
            max_cluster_size: 4,
            step_bound: 6,
            min_player_distance: 24.0,
            min_spawn_distance: 24.0,
            animal_spawn_interval: 400,
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            clear: 12_000..=180_000,
            rain: 12_000..=24_000,
            thunder: 3_600..=15_600,
            no_thunder: 12_000..=180_000,
        }
    }
}

impl WorldConfig {
    /// Loads the config at `path`, writing the default file if it does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::warn!(
                "No config found at {}, writing the default one",
                path.display()
            );
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, DEFAULT_CONFIG)?;
            return Ok(Self::default());
        }

        let config_str = fs::read_to_string(path)?;
        Self::parse(&config_str)
    }

    /// Parses and validates a JSON5 document.
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let config: WorldConfig = serde_json5::from_str(source)?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }

    /// Checks every value for its allowed range.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(1..=1000).contains(&self.tick_rate) {
            return Err("Tick rate must be in range 1..1000");
        }
        if self.max_ticks_per_drain == 0 {
            return Err("Max ticks per drain must be positive");
        }
        if !(1..=32).contains(&self.spawn.chunk_radius) {
            return Err("Spawn chunk radius must be in range 1..32");
        }
        if self.spawn.max_cluster_size == 0 {
            return Err("Max cluster size must be positive");
        }
        if self.spawn.step_bound <= 0 {
            return Err("Spawn step bound must be positive");
        }
        if self.spawn.animal_spawn_interval == 0 {
            return Err("Animal spawn interval must be positive");
        }
        for range in [
            &self.weather.clear,
            &self.weather.rain,
            &self.weather.thunder,
            &self.weather.no_thunder,
        ] {
            if *range.start() <= 0 || range.start() > range.end() {
                return Err("Weather durations must be positive, non-empty ranges");
            }
        }
        Ok(())
    }
}
