//! Time of day.

use std::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// Ticks in one day.
pub const TICKS_PER_DAY: i64 = 24_000;

/// The two tick counters of a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorldClock {
    /// Ticks simulated since the world was created. Never frozen.
    pub total_ticks: u64,
    /// Time of day, frozen while the daylight cycle is off.
    pub day_time: i64,
}

impl WorldClock {
    /// Creates a clock at the given counters.
    #[must_use]
    pub const fn new(total_ticks: u64, day_time: i64) -> Self {
        Self {
            total_ticks,
            day_time,
        }
    }

    /// Advances both counters, or only the total when the daylight cycle is off.
    pub fn advance(&mut self, daylight_cycle: bool) {
        self.total_ticks += 1;
        if daylight_cycle {
            self.day_time += 1;
        }
    }

    /// The moon phase, `0..8`, full moon first.
    #[must_use]
    pub const fn moon_phase(&self) -> u8 {
        (self.day_time / TICKS_PER_DAY % 8 + 8) as u8 % 8
    }
}

/// The sun's position in the sky, `0.0..1.0` with noon at `0.0`.
///
/// The angle moves slightly faster around sunrise and sunset than a linear
/// sweep would.
#[must_use]
pub fn celestial_angle(day_time: i64, partial: f32) -> f32 {
    let time = day_time.rem_euclid(TICKS_PER_DAY) as f32;
    let mut angle = (time + partial) / TICKS_PER_DAY as f32 - 0.25;
    if angle < 0.0 {
        angle += 1.0;
    }
    if angle > 1.0 {
        angle -= 1.0;
    }
    let linear = angle;
    let eased = 1.0 - ((f64::from(angle) * std::f64::consts::PI).cos() as f32 + 1.0) / 2.0;
    linear + (eased - linear) / 3.0
}

/// Sky light subtracted for the given sun angle and weather, `0..=11`.
#[must_use]
pub fn sky_darken(angle: f32, rain_level: f32, thunder_level: f32) -> u8 {
    let daylight = 1.0 - ((angle * PI * 2.0).cos() * 2.0 + 0.5).clamp(0.0, 1.0);
    let mut brightness = 1.0 - daylight;
    brightness *= 1.0 - rain_level * 5.0 / 16.0;
    brightness *= 1.0 - thunder_level * 5.0 / 16.0;
    ((1.0 - brightness) * 11.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance() {
        let mut clock = WorldClock::default();
        clock.advance(true);
        clock.advance(false);
        assert_eq!(clock.total_ticks, 2);
        assert_eq!(clock.day_time, 1);
    }

    #[test]
    fn test_angle_at_noon_and_midnight() {
        assert!(celestial_angle(6_000, 0.0).abs() < 1.0e-6);
        assert!((celestial_angle(18_000, 0.0) - 0.5).abs() < 1.0e-6);
        assert!((celestial_angle(6_000 + TICKS_PER_DAY * 3, 0.0)).abs() < 1.0e-6);
    }

    #[test]
    fn test_darken_follows_day_and_weather() {
        assert_eq!(sky_darken(celestial_angle(6_000, 0.0), 0.0, 0.0), 0);
        assert_eq!(sky_darken(celestial_angle(18_000, 0.0), 0.0, 0.0), 11);
        let noon = celestial_angle(6_000, 0.0);
        assert_eq!(sky_darken(noon, 1.0, 0.0), 3);
        assert_eq!(sky_darken(noon, 1.0, 1.0), 5);
    }

    #[test]
    fn test_moon_phase() {
        assert_eq!(WorldClock::new(0, 0).moon_phase(), 0);
        assert_eq!(WorldClock::new(0, TICKS_PER_DAY * 3 + 10).moon_phase(), 3);
        assert_eq!(WorldClock::new(0, TICKS_PER_DAY * 9).moon_phase(), 1);
        assert_eq!(WorldClock::new(0, -TICKS_PER_DAY).moon_phase(), 7);
    }
}
