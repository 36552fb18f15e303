/// A two component vector.
pub mod vector2;
/// A three component vector.
pub mod vector3;

pub use vector2::Vector2;
pub use vector3::Vector3;
