//! Orientation helpers and the auto-orient system.
//!
//! Auto-orient turns a body so its up matches the resolved local up, a bit
//! every frame. Turns of more than 90° go over the body's own right axis
//! first so a body dropped upside down rolls forward instead of twisting
//! along an arbitrary axis.

use std::f32::consts::PI;

use bevy::prelude::*;

use crate::body::DgsBody;
use crate::gravity::LocalGravity;
use crate::math::{angle_deg, look_rotation, negate_direction};

/// Slerp fraction per second at full strength.
pub const ORIENT_RATE: f32 = 30.0;

/// Frame a rotation is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Space {
    #[default]
    World,
    Local,
}

/// World-space rotation taking `current_up` onto `target_up`.
///
/// # Arguments
/// * `current_up` - the body's up now
/// * `target_up` - where it should point
/// * `right` - the body's right axis, pivot for turns beyond 90°
#[must_use]
pub fn alignment_rotation(current_up: Vec3, target_up: Vec3, right: Vec3) -> Quat {
    let (Some(current), Some(target)) = (current_up.try_normalize(), target_up.try_normalize()) else {
        return Quat::IDENTITY;
    };
    if angle_deg(current, target) <= 90.0 {
        return Quat::from_rotation_arc(current, target);
    }
    let pivot = negate_direction(right, current)
        .try_normalize()
        .unwrap_or_else(|| current.any_orthonormal_vector());
    let flip = Quat::from_axis_angle(pivot, PI);
    Quat::from_rotation_arc(-current, target) * flip
}

/// Turn `rotation` towards having `target_up` as its up.
///
/// The slerp fraction is `ORIENT_RATE * strength * dt` clamped to `[0, 1]`,
/// so a full strength body at 30 Hz or slower snaps in one frame and
/// anything else converges over several.
#[must_use]
pub fn realign(rotation: Quat, target_up: Vec3, strength: f32, dt: f32) -> Quat {
    let t = (ORIENT_RATE * strength * dt).clamp(0.0, 1.0);
    if t <= 0.0 {
        return rotation;
    }
    let correction = alignment_rotation(rotation * Vec3::Y, target_up, rotation * Vec3::X);
    rotation.slerp(correction * rotation, t).normalize()
}

/// Face `forward` with `up` as up. Degenerate input keeps `rotation`.
#[must_use]
pub fn orient(rotation: Quat, forward: Vec3, up: Vec3) -> Quat {
    look_rotation(forward, up).unwrap_or(rotation)
}

/// Rotate by `angle` radians about `axis`, in world or body space.
#[must_use]
pub fn rotate(rotation: Quat, axis: Vec3, angle: f32, space: Space) -> Quat {
    let Some(axis) = axis.try_normalize() else {
        return rotation;
    };
    let turn = Quat::from_axis_angle(axis, angle);
    match space {
        Space::World => (turn * rotation).normalize(),
        Space::Local => (rotation * turn).normalize(),
    }
}

/// Realign every auto-orienting body towards its local up.
#[allow(clippy::needless_pass_by_value)]
pub fn realign_orientations(time: Res<Time>, mut bodies: Query<(&DgsBody, &LocalGravity, &mut Transform)>) {
    let dt = time.delta_seconds();
    bodies.par_iter_mut().for_each(|(body, gravity, mut transform)| {
        if body.policy().auto_orients() && body.auto_orient_strength > 0.0 {
            transform.rotation = realign(transform.rotation, gravity.0.up, body.auto_orient_strength, dt);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn up_of(q: Quat) -> Vec3 {
        q * Vec3::Y
    }

    #[test]
    fn full_strength_step_reaches_target() {
        let target = Vec3::new(1.0, 1.0, 0.0).normalize();
        let q = realign(Quat::IDENTITY, target, 1.0, 1.0 / 30.0);
        assert_relative_eq!(up_of(q).distance(target), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn partial_step_moves_without_snapping() {
        let target = Vec3::new(1.0, 0.2, 0.0).normalize();
        let q = realign(Quat::IDENTITY, target, 0.2, 0.02);
        let remaining = angle_deg(up_of(q), target);
        assert!(remaining > 0.0 && remaining < 90.0, "remaining {remaining}");
    }

    #[test]
    fn upside_down_rolls_over_the_right_axis() {
        let q = realign(Quat::IDENTITY, Vec3::NEG_Y, 1.0, 1.0);
        assert_relative_eq!(up_of(q).distance(Vec3::NEG_Y), 0.0, epsilon = 1e-5);
        // The right axis was the pivot, so it is unchanged.
        assert_relative_eq!((q * Vec3::X).distance(Vec3::X), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn obtuse_turn_converges() {
        let target = Vec3::new(0.3, -1.0, 0.2).normalize();
        let mut q = Quat::IDENTITY;
        for _ in 0..200 {
            q = realign(q, target, 0.2, 0.02);
        }
        assert_relative_eq!(up_of(q).distance(target), 0.0, epsilon = 1e-3);
    }

    #[test]
    fn zero_strength_is_a_no_op() {
        let q = Quat::from_rotation_z(0.4);
        assert_eq!(realign(q, Vec3::Y, 0.0, 0.02), q);
    }

    #[test]
    fn rotate_in_world_and_local_space() {
        let tilted = Quat::from_rotation_z(PI / 2.0);
        let world = rotate(tilted, Vec3::Y, PI / 2.0, Space::World);
        let local = rotate(tilted, Vec3::Y, PI / 2.0, Space::Local);
        assert_relative_eq!((world * Vec3::Y).distance(Vec3::Z), 0.0, epsilon = 1e-5);
        assert_relative_eq!((local * Vec3::Y).distance(Vec3::NEG_X), 0.0, epsilon = 1e-5);
        assert_eq!(rotate(tilted, Vec3::ZERO, 1.0, Space::World), tilted);
    }

    #[test]
    fn orient_faces_forward() {
        let q = orient(Quat::IDENTITY, Vec3::X, Vec3::Y);
        assert_relative_eq!((q * Vec3::NEG_Z).distance(Vec3::X), 0.0, epsilon = 1e-5);
        assert_eq!(orient(Quat::IDENTITY, Vec3::Y, Vec3::Y), Quat::IDENTITY);
    }
}
