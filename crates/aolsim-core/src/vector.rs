//! Small 3-vector helpers shared across the engine.

use nalgebra::Vector3;

pub type Vec3 = Vector3<f64>;

/// Tolerance on |v·v − 1| for a vector to count as unit length.
pub const UNIT_TOLERANCE: f64 = 1e-14;

/// Whether `v` is unit length within [`UNIT_TOLERANCE`].
pub fn is_unit(v: &Vec3) -> bool {
    (v.dot(v) - 1.0).abs() <= UNIT_TOLERANCE
}

/// Normalise `v`; the zero vector maps to itself rather than NaN.
pub fn normalise_or_zero(v: Vec3) -> Vec3 {
    let mag = v.norm();
    if mag == 0.0 {
        v
    } else {
        v / mag
    }
}

/// The component of `v` perpendicular to a unit normal.
pub fn perpendicular_component(v: &Vec3, unit_normal: &Vec3) -> Vec3 {
    v - unit_normal * v.dot(unit_normal)
}

/// Angle between two unit vectors, with the dot product clamped so floating
/// point noise never leaves the domain of acos.
pub fn angle_between_units(a: &Vec3, b: &Vec3) -> f64 {
    a.dot(b).clamp(-1.0, 1.0).acos()
}
