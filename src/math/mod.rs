//! Vector helpers for working in a body-local frame.
//!
//! Every helper here treats a zero-length direction as "no direction" and
//! returns a zero vector (or a neutral value) instead of producing NaN. Callers
//! in the motion code rely on that so a body with no input, no velocity or no
//! gravity source never poisons its target velocity.

use bevy::math::{Mat3, Quat, Vec3};

/// Below this squared length a vector is treated as having no direction.
pub const DIRECTION_EPSILON_SQ: f32 = 1.0e-12;

/// Component of `v` along `direction` (the vector projection).
///
/// The sign of `direction` does not matter, projecting onto `-up` and `up`
/// gives the same vector.
#[must_use]
pub fn isolate_direction(v: Vec3, direction: Vec3) -> Vec3 {
    let d = direction.normalize_or_zero();
    d * v.dot(d)
}

/// `v` with its component along `direction` removed (the rejection).
#[must_use]
pub fn negate_direction(v: Vec3, direction: Vec3) -> Vec3 {
    v - isolate_direction(v, direction)
}

/// Unsigned angle between two vectors in degrees, `0.0` if either is zero.
#[must_use]
pub fn angle_deg(a: Vec3, b: Vec3) -> f32 {
    if a.length_squared() < DIRECTION_EPSILON_SQ || b.length_squared() < DIRECTION_EPSILON_SQ {
        return 0.0;
    }
    let cos = a.normalize().dot(b.normalize()).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Rotation whose forward (`-Z`) faces `forward` and whose up (`+Y`) is as
/// close to `up` as the forward allows.
///
/// # Returns
/// `None` when `forward` is zero or parallel to `up`, the caller keeps its
/// current rotation in that case.
#[must_use]
pub fn look_rotation(forward: Vec3, up: Vec3) -> Option<Quat> {
    let back = -forward.normalize_or_zero();
    let right = up.cross(back);
    if back == Vec3::ZERO || right.length_squared() < DIRECTION_EPSILON_SQ {
        return None;
    }
    let right = right.normalize();
    let up = back.cross(right);
    Some(Quat::from_mat3(&Mat3::from_cols(right, up, back)))
}

/// Linear interpolation between two scalars, `t` is not clamped.
#[inline]
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
