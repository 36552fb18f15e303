//! Rain and thunder.

use std::ops::RangeInclusive;

use kiln_utils::random::{LegacyRandom, Random};
use serde::{Deserialize, Serialize};

use crate::config::WeatherConfig;

/// Change of a weather level per tick.
const LEVEL_STEP: f32 = 0.01;

/// Rain level above which it counts as raining.
const RAINING_THRESHOLD: f32 = 0.2;

/// Thunder level above which it counts as a thunderstorm.
const THUNDERING_THRESHOLD: f32 = 0.9;

/// What one weather tick changed, as seen by observers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WeatherChange {
    /// Rain became visible.
    pub started_raining: bool,
    /// Rain stopped being visible.
    pub stopped_raining: bool,
    /// The new rain level, if it changed.
    pub rain_level: Option<f32>,
    /// The new thunder level, if it changed.
    pub thunder_level: Option<f32>,
}

impl WeatherChange {
    /// Whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.started_raining
            && !self.stopped_raining
            && self.rain_level.is_none()
            && self.thunder_level.is_none()
    }
}

/// Weather timers and the levels chasing them.
///
/// Each timer counts down and flips its state when it reaches zero, then a
/// new duration is drawn. While the clear timer runs both other timers are
/// held, keeping the sky clear. Levels move by a fixed step toward their
/// state every tick.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherModel {
    /// Ticks of forced clear weather left.
    pub clear_time: i32,
    /// Ticks until the rain state flips.
    pub rain_time: i32,
    /// Ticks until the thunder state flips.
    pub thunder_time: i32,
    /// Whether rain is the target state.
    pub raining: bool,
    /// Whether thunder is the target state.
    pub thundering: bool,
    rain_level: f32,
    previous_rain_level: f32,
    thunder_level: f32,
    previous_thunder_level: f32,
}

impl WeatherModel {
    /// Sets the levels to match the stored states, as after loading a world.
    pub fn settle(&mut self) {
        if self.raining {
            self.set_rain_level(1.0);
            if self.thundering {
                self.set_thunder_level(1.0);
            }
        }
    }

    /// Runs one weather tick.
    pub fn tick(&mut self, config: &WeatherConfig, random: &mut LegacyRandom) -> WeatherChange {
        let was_raining = self.is_raining();
        let (old_rain, old_thunder) = (self.rain_level, self.thunder_level);

        if self.clear_time > 0 {
            self.clear_time -= 1;
            self.thunder_time = if self.thundering { 1 } else { 2 };
            self.rain_time = if self.raining { 1 } else { 2 };
        }

        let thunder_range = if self.thundering {
            &config.thunder
        } else {
            &config.no_thunder
        };
        if step_timer(&mut self.thunder_time, thunder_range, random) {
            self.thundering = !self.thundering;
            log::debug!("Thunder {}", if self.thundering { "started" } else { "stopped" });
        }
        self.previous_thunder_level = self.thunder_level;
        self.thunder_level = approach(self.thunder_level, self.thundering);

        let rain_range = if self.raining {
            &config.rain
        } else {
            &config.clear
        };
        if step_timer(&mut self.rain_time, rain_range, random) {
            self.raining = !self.raining;
            log::debug!("Rain {}", if self.raining { "started" } else { "stopped" });
        }
        self.previous_rain_level = self.rain_level;
        self.rain_level = approach(self.rain_level, self.raining);

        let is_raining = self.is_raining();
        WeatherChange {
            started_raining: !was_raining && is_raining,
            stopped_raining: was_raining && !is_raining,
            rain_level: (self.rain_level != old_rain).then_some(self.rain_level),
            thunder_level: (self.thunder_level != old_thunder).then_some(self.thunder_level),
        }
    }

    /// Overrides the timers and states, as a weather command does.
    pub fn set_weather(
        &mut self,
        clear_time: i32,
        rain_time: i32,
        thunder_time: i32,
        raining: bool,
        thundering: bool,
    ) {
        self.clear_time = clear_time;
        self.rain_time = rain_time;
        self.thunder_time = thunder_time;
        self.raining = raining;
        self.thundering = thundering;
    }

    /// Rain level interpolated between the last two ticks.
    #[must_use]
    pub fn rain_level(&self, partial: f32) -> f32 {
        self.previous_rain_level + (self.rain_level - self.previous_rain_level) * partial
    }

    /// Thunder level interpolated between the last two ticks, scaled by rain.
    #[must_use]
    pub fn thunder_level(&self, partial: f32) -> f32 {
        let thunder = self.previous_thunder_level
            + (self.thunder_level - self.previous_thunder_level) * partial;
        thunder * self.rain_level(partial)
    }

    /// Overwrites the rain level.
    pub fn set_rain_level(&mut self, level: f32) {
        let level = level.clamp(0.0, 1.0);
        self.rain_level = level;
        self.previous_rain_level = level;
    }

    /// Overwrites the thunder level.
    pub fn set_thunder_level(&mut self, level: f32) {
        let level = level.clamp(0.0, 1.0);
        self.thunder_level = level;
        self.previous_thunder_level = level;
    }

    /// Whether it visibly rains.
    #[must_use]
    pub fn is_raining(&self) -> bool {
        self.rain_level(1.0) > RAINING_THRESHOLD
    }

    /// Whether a thunderstorm is visible.
    #[must_use]
    pub fn is_thundering(&self) -> bool {
        self.thunder_level(1.0) > THUNDERING_THRESHOLD
    }
}

/// Counts `timer` down. A timer already at zero draws a new duration from
/// `range`. Returns `true` when the timer just ran out.
fn step_timer(timer: &mut i32, range: &RangeInclusive<i32>, random: &mut LegacyRandom) -> bool {
    if *timer <= 0 {
        *timer = random.next_i32_between(*range.start(), *range.end());
        return false;
    }
    *timer -= 1;
    *timer <= 0
}

fn approach(level: f32, active: bool) -> f32 {
    let target = if active {
        level + LEVEL_STEP
    } else {
        level - LEVEL_STEP
    };
    target.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WeatherConfig {
        WeatherConfig::default()
    }

    #[test]
    fn test_timers_draw_from_ranges() {
        let mut weather = WeatherModel::default();
        let mut random = LegacyRandom::from_seed(3);
        weather.tick(&config(), &mut random);

        assert!(config().no_thunder.contains(&weather.thunder_time));
        assert!(config().clear.contains(&weather.rain_time));
        assert!(!weather.raining);
    }

    #[test]
    fn test_rain_flips_and_levels_step() {
        let mut weather = WeatherModel::default();
        weather.rain_time = 1;
        weather.thunder_time = 1_000;
        let mut random = LegacyRandom::from_seed(3);

        let change = weather.tick(&config(), &mut random);
        assert!(weather.raining);
        assert_eq!(change.rain_level, Some(0.01));
        assert!(!change.started_raining);

        for _ in 0..20 {
            weather.tick(&config(), &mut random);
        }
        assert!(weather.is_raining());
        assert!((weather.rain_level(1.0) - 0.21).abs() < 1.0e-4);
        // The timer ran out on the first tick and was redrawn on the second.
        assert!(config().rain.contains(&(weather.rain_time + 19)));
    }

    #[test]
    fn test_rain_start_is_reported_once() {
        let mut weather = WeatherModel::default();
        weather.set_weather(0, 1_000, 1_000, true, false);
        let mut random = LegacyRandom::from_seed(1);

        let started: usize = (0..120)
            .map(|_| weather.tick(&config(), &mut random))
            .filter(|change| change.started_raining)
            .count();
        assert_eq!(started, 1);
        assert!((weather.rain_level(1.0) - 1.0).abs() < f32::EPSILON);

        let change = weather.tick(&config(), &mut random);
        assert!(change.is_empty());
    }

    #[test]
    fn test_clear_timer_holds_weather() {
        let mut weather = WeatherModel::default();
        weather.set_weather(50, 1, 1, false, false);
        let mut random = LegacyRandom::from_seed(9);

        for _ in 0..50 {
            weather.tick(&config(), &mut random);
            assert!(!weather.raining);
            assert!(!weather.thundering);
        }
        assert_eq!(weather.clear_time, 0);
        assert_eq!(weather.rain_level(1.0), 0.0);
    }

    #[test]
    fn test_thunder_scaled_by_rain() {
        let mut weather = WeatherModel {
            raining: false,
            thundering: true,
            ..WeatherModel::default()
        };
        weather.settle();
        assert_eq!(weather.thunder_level(1.0), 0.0);

        weather.raining = true;
        weather.settle();
        assert!(weather.is_raining());
        assert!(weather.is_thundering());
    }
}
