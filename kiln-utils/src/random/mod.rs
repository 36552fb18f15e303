//! Random number generation with reproducible sequences.

/// The 48 bit linear congruential generator.
pub mod legacy_random;

pub use legacy_random::LegacyRandom;

/// A source of pseudo random numbers.
pub trait Random {
    /// Returns a uniformly distributed `i32`.
    fn next_i32(&mut self) -> i32;

    /// Returns a value in `0..bound`. `bound` must be positive.
    fn next_i32_bounded(&mut self, bound: i32) -> i32;

    /// Returns a uniformly distributed `i64`.
    fn next_i64(&mut self) -> i64;

    /// Returns a value in `0.0..1.0`.
    fn next_f32(&mut self) -> f32;

    /// Returns a value in `0.0..1.0`.
    fn next_f64(&mut self) -> f64;

    /// Returns a value in `min..=max`.
    fn next_i32_between(&mut self, min: i32, max: i32) -> i32 {
        self.next_i32_bounded(max - min + 1) + min
    }
}
