//! Target-velocity bookkeeping for one body.
//!
//! `MotionState` owns the velocity a body *wants* to have. Policies and the
//! movement controller edit it during the tick and the motor hands it to the
//! integrator at the end. The integrator's own result comes back next tick as
//! the "true" velocity, which is what acceleration and friction read.
//!
//! The target persists between ticks. Collisions only reach it through the
//! landing correction and through the true velocity that acceleration reads.
//!
//! Every velocity here is split relative to the body's local up:
//! - flat: the part perpendicular to up
//! - vertical: the part along up (the down speed is its downward half)
//!
//! # Example
//! ```ignore
//! motion.begin_step(StepFrame { local_up: Vec3::Y, gravity_magnitude: 9.8, ..frame });
//! motion.accelerate(Vec3::new(5.0, 0.0, 0.0), dt, 14.0, AccelerationMode::Basic);
//! kinematics.velocity = motion.target_velocity();
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::body::ForceMode;
use crate::math::{isolate_direction, lerp, negate_direction};

/// Acceleration models for `MotionState::accelerate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccelerationMode {
    /// Exponential approach to the wish velocity.
    #[default]
    Basic,
    /// Adds speed along the wish direction until its projection reaches the
    /// wish speed, pulling back an overshoot.
    Source,
    /// Like `Source` but never removes speed.
    Quake,
}

/// Everything a body knows about the world for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepFrame {
    pub local_up: Vec3,
    pub gravity_magnitude: f32,
    /// Velocity the integrator produced last tick.
    pub true_velocity: Vec3,
    pub grounded: bool,
    /// Friction of the surface stood on, scales grounded acceleration.
    pub ground_friction: f32,
}

/// Per-body motion state.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    target_velocity: Vec3,
    stored_velocity: Vec3,
    true_velocity: Vec3,
    local_up: Vec3,
    gravity_magnitude: f32,
    grounded: bool,
    ground_friction: f32,
    mass: f32,
}

impl MotionState {
    /// `mass` must be positive, `DgsBody::new` is where that is checked.
    #[must_use]
    pub fn new(mass: f32) -> Self {
        debug_assert!(mass > 0.0, "motion state needs a positive mass");
        Self {
            target_velocity: Vec3::ZERO,
            stored_velocity: Vec3::ZERO,
            true_velocity: Vec3::ZERO,
            local_up: Vec3::Y,
            gravity_magnitude: 0.0,
            grounded: false,
            ground_friction: 1.0,
            mass,
        }
    }

    /// Load this tick's frame. The target velocity carries over from the
    /// last tick untouched, the integrator's result only feeds the `true_*`
    /// readings.
    pub fn begin_step(&mut self, frame: StepFrame) {
        self.local_up = frame.local_up.try_normalize().unwrap_or(self.local_up);
        self.gravity_magnitude = frame.gravity_magnitude;
        self.true_velocity = frame.true_velocity;
        self.grounded = frame.grounded;
        self.ground_friction = frame.ground_friction;
    }

    /// Remember what was handed to the integrator, read back as the previous
    /// velocity when friction is evaluated next tick.
    pub fn store_velocity(&mut self, velocity: Vec3) {
        self.stored_velocity = velocity;
    }

    pub fn set_target_velocity(&mut self, velocity: Vec3) {
        self.target_velocity = velocity;
    }

    pub fn set_mass(&mut self, mass: f32) {
        if mass > 0.0 {
            self.mass = mass;
        }
    }

    #[must_use]
    pub fn target_velocity(&self) -> Vec3 {
        self.target_velocity
    }

    #[must_use]
    pub fn stored_velocity(&self) -> Vec3 {
        self.stored_velocity
    }

    #[must_use]
    pub fn true_velocity(&self) -> Vec3 {
        self.true_velocity
    }

    #[must_use]
    pub fn local_up(&self) -> Vec3 {
        self.local_up
    }

    #[must_use]
    pub fn gravity_magnitude(&self) -> f32 {
        self.gravity_magnitude
    }

    #[must_use]
    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    #[must_use]
    pub fn ground_friction(&self) -> f32 {
        self.ground_friction
    }

    #[must_use]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    /// How the velocity changed between the last hand-off and this tick's
    /// integrator result. Only its direction is meaningful.
    #[must_use]
    pub fn acceleration(&self) -> Vec3 {
        self.true_velocity - self.stored_velocity
    }

    /// `v` with its component along local up removed.
    #[must_use]
    pub fn flat_of(&self, v: Vec3) -> Vec3 {
        negate_direction(v, self.local_up)
    }

    #[must_use]
    pub fn flat_velocity(&self) -> Vec3 {
        self.flat_of(self.target_velocity)
    }

    #[must_use]
    pub fn flat_speed(&self) -> f32 {
        self.flat_velocity().length()
    }

    #[must_use]
    pub fn vertical_velocity(&self) -> Vec3 {
        isolate_direction(self.target_velocity, self.local_up)
    }

    /// Signed speed along local up.
    #[must_use]
    pub fn up_speed(&self) -> f32 {
        self.target_velocity.dot(self.local_up)
    }

    /// Speed towards local down, zero while moving up.
    #[must_use]
    pub fn down_speed(&self) -> f32 {
        (-self.up_speed()).max(0.0)
    }

    #[must_use]
    pub fn true_flat_velocity(&self) -> Vec3 {
        self.flat_of(self.true_velocity)
    }

    #[must_use]
    pub fn true_flat_speed(&self) -> f32 {
        self.true_flat_velocity().length()
    }

    #[must_use]
    pub fn true_vertical_velocity(&self) -> Vec3 {
        isolate_direction(self.true_velocity, self.local_up)
    }

    /// Move the flat velocity towards `wish_velocity`.
    ///
    /// Grounded bodies scale `acceleration` by the friction of the surface
    /// they stand on.
    ///
    /// # Arguments
    /// * `wish_velocity` - desired flat velocity, its length is the wish speed
    /// * `dt` - fixed timestep in seconds
    /// * `acceleration` - rate, `Basic` reads it per second as a blend factor
    /// * `mode` - acceleration model
    ///
    /// # Returns
    /// The new target velocity.
    pub fn accelerate(&mut self, wish_velocity: Vec3, dt: f32, acceleration: f32, mode: AccelerationMode) -> Vec3 {
        let current = self.true_flat_velocity();
        let wish_dir = wish_velocity.normalize_or_zero();
        let wish_speed = wish_velocity.length();
        let rate = if self.grounded { acceleration * self.ground_friction } else { acceleration };

        let delta = match mode {
            AccelerationMode::Basic => (wish_velocity - current) * (rate * dt),
            AccelerationMode::Source => {
                let projected = current.dot(wish_dir);
                let mut add = rate * dt;
                if projected + add > wish_speed {
                    add = wish_speed - projected;
                }
                wish_dir * add
            }
            AccelerationMode::Quake => {
                let room = wish_speed - current.dot(wish_dir);
                if room <= 0.0 { Vec3::ZERO } else { wish_dir * (rate * wish_speed * dt).min(room) }
            }
        };

        self.target_velocity += delta;
        self.target_velocity
    }

    /// Add a force to the target velocity.
    pub fn apply_force(&mut self, force: Vec3, dt: f32, mode: ForceMode) {
        self.target_velocity += mode.velocity_delta(force, dt, self.mass);
    }

    /// Pull towards local down at the resolved magnitude.
    pub fn apply_gravity(&mut self, dt: f32) {
        let g = -self.local_up * self.gravity_magnitude;
        self.apply_force(g, dt, ForceMode::Acceleration);
    }

    /// Slow the flat velocity by `friction * dt`, never past zero.
    ///
    /// Skipped while the velocity and the last acceleration point the same
    /// way, so friction does not fight a body that is speeding up.
    pub fn apply_friction(&mut self, friction: f32, dt: f32) {
        if self.target_velocity.dot(self.acceleration()) >= 0.0 {
            return;
        }
        let flat = self.flat_velocity();
        let amount = (friction * dt).min(flat.length());
        self.target_velocity -= flat.normalize_or_zero() * amount;
    }

    /// Drop the whole component along local up.
    ///
    /// # Returns
    /// The speed removed.
    pub fn negate_down_velocity(&mut self) -> f32 {
        let vertical = self.vertical_velocity();
        self.target_velocity -= vertical;
        vertical.length()
    }

    /// Keep only the component along local up.
    ///
    /// # Returns
    /// The remaining speed.
    pub fn isolate_down_velocity(&mut self) -> f32 {
        self.target_velocity = self.vertical_velocity();
        self.target_velocity.length()
    }

    /// Keep the flat speed inside `[min, max]`.
    ///
    /// With `smooth`, the speed moves towards the nearer bound by fraction
    /// `t` instead of jumping onto it. The vertical component is untouched.
    pub fn clamp_flat_speed(&mut self, min: f32, max: f32, smooth: bool, t: f32) {
        let flat = self.flat_velocity();
        let speed = flat.length();
        if speed >= min && speed <= max {
            return;
        }
        let bound = if (min - speed).abs() < (max - speed).abs() { min } else { max };
        let new_speed = if smooth { lerp(speed, bound, t) } else { speed.max(min).min(max) };
        self.target_velocity = flat.normalize_or_zero() * new_speed + self.vertical_velocity();
    }

    /// Move the flat velocity towards `target` by fraction `t`, without
    /// passing it.
    pub fn lerp_flat_velocity(&mut self, target: Vec3, t: f32) {
        let flat = self.flat_velocity();
        let target = self.flat_of(target);
        let step = (target - flat) * t.max(0.0);
        self.target_velocity += step.clamp_length_max(flat.distance(target));
    }
}

impl Default for MotionState {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: f32 = 0.02;

    fn grounded_frame(true_velocity: Vec3, friction: f32) -> StepFrame {
        StepFrame { local_up: Vec3::Y, gravity_magnitude: 9.8, true_velocity, grounded: true, ground_friction: friction }
    }

    fn airborne_frame(true_velocity: Vec3) -> StepFrame {
        StepFrame { local_up: Vec3::Y, gravity_magnitude: 9.8, true_velocity, grounded: false, ground_friction: 1.0 }
    }

    fn moving(v: Vec3, frame: StepFrame) -> MotionState {
        let mut motion = MotionState::new(1.0);
        motion.begin_step(StepFrame { true_velocity: v, ..frame });
        motion.set_target_velocity(v);
        motion
    }

    /// Feed the target back as if the integrator moved freely.
    fn echo(motion: &mut MotionState, frame: StepFrame) {
        let v = motion.target_velocity();
        motion.store_velocity(v);
        motion.begin_step(StepFrame { true_velocity: v, ..frame });
    }

    #[test]
    fn basic_acceleration_scales_with_ground_friction() {
        let mut motion = MotionState::new(1.0);
        motion.begin_step(grounded_frame(Vec3::ZERO, 0.5));
        let v = motion.accelerate(Vec3::new(5.0, 0.0, 0.0), DT, 14.0, AccelerationMode::Basic);
        assert_relative_eq!(v.x, 0.7, epsilon = 1e-6);
        assert_eq!(v.y, 0.0);
        assert_eq!(v.z, 0.0);
    }

    #[test]
    fn basic_acceleration_converges_without_overshoot() {
        let wish = Vec3::new(5.0, 0.0, 0.0);
        let mut motion = MotionState::new(1.0);
        motion.begin_step(grounded_frame(Vec3::ZERO, 0.5));
        let mut last = 0.0;
        for _ in 0..500 {
            let v = motion.accelerate(wish, DT, 14.0, AccelerationMode::Basic);
            assert!(v.x >= last && v.x <= 5.0);
            last = v.x;
            echo(&mut motion, grounded_frame(Vec3::ZERO, 0.5));
        }
        assert_relative_eq!(last, 5.0, epsilon = 1e-3);
    }

    #[test]
    fn source_and_quake_never_exceed_wish_speed() {
        let wish = Vec3::new(0.0, 0.0, -7.0);
        for mode in [AccelerationMode::Source, AccelerationMode::Quake] {
            let mut motion = MotionState::new(1.0);
            motion.begin_step(airborne_frame(Vec3::ZERO));
            for _ in 0..200 {
                let v = motion.accelerate(wish, DT, 50.0, mode);
                assert!(v.dot(wish.normalize()) <= 7.0 + 1e-4, "{mode:?} overshot: {v}");
                echo(&mut motion, airborne_frame(Vec3::ZERO));
            }
        }
    }

    #[test]
    fn source_pulls_back_an_overshoot_and_quake_keeps_it() {
        let fast = Vec3::new(10.0, 0.0, 0.0);
        let wish = Vec3::new(4.0, 0.0, 0.0);

        let mut source = moving(fast, airborne_frame(fast));
        assert_relative_eq!(source.accelerate(wish, DT, 2.0, AccelerationMode::Source).x, 4.0, epsilon = 1e-5);

        let mut quake = moving(fast, airborne_frame(fast));
        assert_eq!(quake.accelerate(wish, DT, 2.0, AccelerationMode::Quake), fast);
    }

    #[test]
    fn zero_wish_is_a_no_op_for_projecting_modes() {
        let v = Vec3::new(1.0, 0.0, 2.0);
        for mode in [AccelerationMode::Source, AccelerationMode::Quake] {
            let mut motion = moving(v, airborne_frame(v));
            assert_eq!(motion.accelerate(Vec3::ZERO, DT, 10.0, mode), v);
        }
    }

    #[test]
    fn gravity_follows_local_up() {
        let mut motion = MotionState::new(3.0);
        motion.begin_step(StepFrame { local_up: Vec3::X, ..airborne_frame(Vec3::ZERO) });
        motion.apply_gravity(0.5);
        assert_relative_eq!(motion.target_velocity().x, -4.9, epsilon = 1e-6);
        assert_relative_eq!(motion.down_speed(), 4.9, epsilon = 1e-6);
    }

    #[test]
    fn negate_down_clears_vertical_and_keeps_flat() {
        let mut motion = moving(Vec3::new(3.0, -4.0, 2.0), airborne_frame(Vec3::ZERO));
        assert_relative_eq!(motion.negate_down_velocity(), 4.0, epsilon = 1e-6);
        assert_eq!(motion.target_velocity(), Vec3::new(3.0, 0.0, 2.0));
        assert_eq!(motion.down_speed(), 0.0);
        assert_eq!(motion.vertical_velocity(), Vec3::ZERO);
    }

    #[test]
    fn isolate_down_clears_flat() {
        let mut motion = moving(Vec3::new(3.0, -4.0, 2.0), airborne_frame(Vec3::ZERO));
        assert_relative_eq!(motion.isolate_down_velocity(), 4.0, epsilon = 1e-6);
        assert_eq!(motion.flat_velocity(), Vec3::ZERO);
    }

    #[test]
    fn friction_only_opposes_decelerating_motion() {
        let v = Vec3::new(3.0, 0.0, 0.0);
        // Last hand-off was faster than what came back: slowing down.
        let mut motion = moving(v, grounded_frame(Vec3::ZERO, 1.0));
        motion.store_velocity(Vec3::new(4.0, 0.0, 0.0));
        motion.apply_friction(10.0, DT);
        assert_relative_eq!(motion.target_velocity().x, 2.8, epsilon = 1e-6);

        // Speeding up: untouched.
        let mut motion = moving(v, grounded_frame(Vec3::ZERO, 1.0));
        motion.store_velocity(Vec3::new(2.0, 0.0, 0.0));
        motion.apply_friction(10.0, DT);
        assert_eq!(motion.target_velocity().x, 3.0);
    }

    #[test]
    fn friction_never_reverses_direction() {
        let mut motion = moving(Vec3::new(0.1, 0.0, 0.0), grounded_frame(Vec3::ZERO, 1.0));
        motion.store_velocity(Vec3::new(0.5, 0.0, 0.0));
        motion.apply_friction(100.0, 1.0);
        assert_eq!(motion.target_velocity(), Vec3::ZERO);
    }

    #[test]
    fn clamp_flat_speed_keeps_vertical() {
        let mut motion = moving(Vec3::new(10.0, -3.0, 0.0), airborne_frame(Vec3::ZERO));
        motion.clamp_flat_speed(0.0, 4.0, false, 0.0);
        assert_relative_eq!(motion.target_velocity().x, 4.0, epsilon = 1e-6);
        assert_eq!(motion.target_velocity().y, -3.0);

        motion.set_target_velocity(Vec3::new(10.0, 0.0, 0.0));
        motion.clamp_flat_speed(0.0, 4.0, true, 0.5);
        assert_relative_eq!(motion.flat_speed(), 7.0, epsilon = 1e-5);

        motion.set_target_velocity(Vec3::new(1.0, 0.0, 0.0));
        motion.clamp_flat_speed(2.0, 8.0, false, 0.0);
        assert_relative_eq!(motion.flat_speed(), 2.0, epsilon = 1e-6);
    }

    #[test]
    fn lerp_flat_velocity_stops_at_target() {
        let mut motion = moving(Vec3::new(0.0, -2.0, 0.0), airborne_frame(Vec3::ZERO));
        motion.lerp_flat_velocity(Vec3::new(4.0, 0.0, 0.0), 0.25);
        assert_relative_eq!(motion.target_velocity().x, 1.0, epsilon = 1e-6);
        motion.lerp_flat_velocity(Vec3::new(4.0, 0.0, 0.0), 3.0);
        assert_relative_eq!(motion.target_velocity().x, 4.0, epsilon = 1e-5);
        assert_eq!(motion.target_velocity().y, -2.0);
    }

    #[test]
    fn force_modes_respect_mass() {
        let mut motion = MotionState::new(2.0);
        motion.begin_step(airborne_frame(Vec3::ZERO));
        motion.apply_force(Vec3::new(4.0, 0.0, 0.0), 0.5, ForceMode::Force);
        assert_eq!(motion.target_velocity(), Vec3::new(1.0, 0.0, 0.0));
        motion.apply_force(Vec3::new(4.0, 0.0, 0.0), 0.5, ForceMode::Impulse);
        assert_eq!(motion.target_velocity(), Vec3::new(3.0, 0.0, 0.0));
    }
}
