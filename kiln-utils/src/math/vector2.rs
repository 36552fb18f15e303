use std::ops::{Add, Sub};

use num_traits::Num;
use serde::{Deserialize, Serialize};

/// A vector with an `x` and a `z` component.
///
/// Used for horizontal coordinates, so the second axis is named `z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vector2<T> {
    /// The x component.
    pub x: T,
    /// The z component.
    pub z: T,
}

impl<T> Vector2<T> {
    /// Creates a new vector.
    pub const fn new(x: T, z: T) -> Self {
        Self { x, z }
    }
}

impl<T: Num + Copy> Vector2<T> {
    /// Returns the squared length of the vector.
    pub fn length_squared(&self) -> T {
        self.x * self.x + self.z * self.z
    }
}

impl<T: Num> Add for Vector2<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.z + rhs.z)
    }
}

impl<T: Num> Sub for Vector2<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.z - rhs.z)
    }
}
