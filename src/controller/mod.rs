//! First-person character controller.
//!
//! Translates `MoveInput` into calls on a body's `MotionState` once per fixed
//! tick, after gravity and friction and before the motor drives the body:
//!
//! - grounded: accelerate with the ground settings and `ground_mode`
//! - airborne and strafe-eligible: strafe cap and rate with `air_mode`, then
//!   Quake-style air control
//! - airborne otherwise: air settings only
//! - jump and crouch on top of either
//!
//! The controller is one policy among several. Bodies without a
//! `PlayerController` still get gravity, friction and orientation.
//!
//! # Example
//! ```ignore
//! commands.spawn((
//!     DgsBodyBundle::from_settings(&settings.body)?,
//!     PlayerController::from_settings(&settings),
//!     MoveInput::default(),
//!     Transform::from_xyz(0.0, 20.0, 0.0),
//! ));
//! ```

pub mod crouch;
pub mod input;
pub mod jump;

pub use crouch::*;
pub use input::*;
pub use jump::*;

use bevy::prelude::*;

use crate::body::{rotate, AccelerationMode, ForceMode, MotionState, Space};
use crate::ground::GroundContact;
use crate::math::{angle_deg, negate_direction, DIRECTION_EPSILON_SQ};
use crate::settings::{MovementSettings, Settings};

/// What happened during one controller tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub jumped: bool,
    pub strafing: bool,
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct PlayerController {
    pub ground: MovementSettings,
    pub air: MovementSettings,
    pub strafe: MovementSettings,
    /// 0 no steering in the air, 1 full.
    pub air_control: f32,
    pub strafe_band_deg: f32,
    pub ground_mode: AccelerationMode,
    pub air_mode: AccelerationMode,
    pub jump: JumpAbility,
    pub crouch: CrouchState,
}

impl PlayerController {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        let c = &settings.controller;
        Self {
            ground: c.ground,
            air: c.air,
            strafe: c.strafe,
            air_control: c.air_control,
            strafe_band_deg: c.strafe_band_deg,
            ground_mode: c.ground_mode,
            air_mode: c.air_mode,
            jump: JumpAbility::from_settings(&settings.jump),
            crouch: CrouchState::from_settings(&settings.crouch),
        }
    }

    /// Take new tuning without resetting jump or crouch progress.
    pub fn apply_settings(&mut self, settings: &Settings) {
        let c = &settings.controller;
        self.ground = c.ground;
        self.air = c.air;
        self.strafe = c.strafe;
        self.air_control = c.air_control;
        self.strafe_band_deg = c.strafe_band_deg;
        self.ground_mode = c.ground_mode;
        self.air_mode = c.air_mode;
        self.jump.apply_settings(&settings.jump);
        self.crouch.apply_settings(&settings.crouch);
    }

    /// Desired flat direction scaled by input strength (at most 1).
    ///
    /// Body right is `+X`, forward is `-Z`. The result is flattened onto the
    /// plane of `up` so a body still turning towards a new up does not push
    /// into or away from the ground.
    #[must_use]
    pub fn wish_direction(axis: Vec2, rotation: Quat, up: Vec3) -> Vec3 {
        let raw = rotation * Vec3::X * axis.x + rotation * Vec3::NEG_Z * axis.y;
        negate_direction(raw, up).normalize_or_zero() * axis.length().min(1.0)
    }

    /// Turn about the body's own up. Aligning that up with gravity is left to
    /// auto-orient so it stays smooth.
    #[must_use]
    pub fn apply_look(rotation: Quat, yaw: f32) -> Quat {
        if yaw == 0.0 {
            return rotation;
        }
        rotate(rotation, rotation * Vec3::Y, yaw, Space::World)
    }

    /// Run one tick of movement for a body.
    ///
    /// # Arguments
    /// * `input` - this tick's intent, edges included
    /// * `motion` - the body's motion state, already past gravity and friction
    /// * `contact` - ground state for this tick
    /// * `rotation` - body rotation, after look
    /// * `dt` - fixed timestep in seconds
    pub fn update(
        &mut self,
        input: &MoveInput,
        motion: &mut MotionState,
        contact: &GroundContact,
        rotation: Quat,
        dt: f32,
    ) -> TickOutcome {
        let axis = input.clamped_axis();
        let wish = Self::wish_direction(axis, rotation, motion.local_up());
        let grounded = contact.is_grounded();

        if contact.just_landed() {
            self.jump.restore();
        }
        self.jump.tick(dt);
        self.crouch.request(input.crouch_held || input.crouch_pressed);

        let strafing = if grounded {
            self.ground_move(wish, motion, dt);
            false
        } else {
            self.air_move(wish, axis, motion, dt)
        };

        let requested = input.jump_pressed || (self.jump.auto_bunny_hop && input.jump_held);
        let mut jumped = false;
        if requested || (self.jump.is_queued() && grounded) {
            if self.jump.is_ready() {
                self.launch(motion);
                jumped = true;
            } else if requested && !grounded && self.jump.queue_while_airborne {
                self.jump.queue();
            }
        }

        self.crouch.update(grounded, dt);
        TickOutcome { jumped, strafing }
    }

    pub fn ground_move(&self, wish: Vec3, motion: &mut MotionState, dt: f32) {
        let max_speed = self.ground.max_speed * self.crouch.speed_factor();
        let rate = if motion.target_velocity().dot(wish) < 0.0 {
            self.ground.deceleration
        } else {
            self.ground.acceleration
        };
        motion.accelerate(wish * max_speed, dt, rate, self.ground_mode);
    }

    /// Airborne movement. Strafe ticks accelerate with the strafe settings and
    /// then apply air control, every other air tick uses the air settings alone.
    ///
    /// # Returns
    /// Whether the strafe settings were used.
    pub fn air_move(&self, wish: Vec3, axis: Vec2, motion: &mut MotionState, dt: f32) -> bool {
        let strafing = self.can_strafe(wish, axis, motion);
        let dir = wish.normalize_or_zero();
        let mut wish_speed = wish.length() * self.air.max_speed;
        let rate = if strafing {
            wish_speed = wish_speed.min(self.strafe.max_speed);
            self.strafe.acceleration
        } else if motion.true_flat_velocity().dot(dir) < 0.0 {
            self.air.deceleration
        } else {
            self.air.acceleration
        };

        motion.accelerate(dir * wish_speed, dt, rate, self.air_mode);
        if strafing {
            self.apply_air_control(wish, motion, dt);
        }
        strafing
    }

    /// Strafe-jump window: one input axis only, and the flat velocity within
    /// half a band of perpendicular to the wish direction.
    #[must_use]
    pub fn can_strafe(&self, wish: Vec3, axis: Vec2, motion: &MotionState) -> bool {
        if wish.length_squared() < DIRECTION_EPSILON_SQ || (axis.x != 0.0) == (axis.y != 0.0) {
            return false;
        }
        let flat = motion.flat_velocity();
        if flat.length_squared() < DIRECTION_EPSILON_SQ {
            return false;
        }
        let half_band = self.strafe_band_deg * (1.0 - self.air_control) * 0.5;
        let angle = angle_deg(flat, wish);
        angle > 90.0 - half_band && angle < 90.0 + half_band
    }

    /// Bend the flat velocity towards the wish direction while airborne.
    pub fn apply_air_control(&self, wish: Vec3, motion: &mut MotionState, dt: f32) {
        let control = self.air_control;
        if control <= 0.0 || wish.length_squared() < DIRECTION_EPSILON_SQ {
            return;
        }
        let flat = motion.true_flat_velocity();
        let dir = wish.normalize();
        let congruent = flat.normalize_or_zero().dot(dir);
        let wish_speed = wish.length() * motion.flat_speed().min(self.air.max_speed);
        let rate = if congruent < 0.0 { self.air.deceleration } else { self.air.acceleration };
        let k = 64.0 * control * congruent * congruent * dt + 1.0;

        let delta = if control >= 1.0 {
            (dir * wish_speed - flat) * rate
        } else if congruent < -0.975 {
            (dir * wish_speed - flat) * (rate * k)
        } else if congruent < 0.0 {
            // 1 head-on, up to 5 when turning all the way round.
            let error = 1.0 + angle_deg(flat, dir) / 45.0;
            let steer = (dir * (Vec3::splat(wish_speed) + wish * k)).normalize_or_zero();
            steer * (error * wish.length() * wish_speed * k)
        } else {
            Vec3::ZERO
        };

        motion.apply_force(delta * control * dt, dt, ForceMode::VelocityChange);
    }

    fn launch(&mut self, motion: &mut MotionState) {
        motion.negate_down_velocity();
        let speed = self.jump.launch_speed(motion.gravity_magnitude(), self.crouch.current_height());
        motion.apply_force(motion.local_up() * speed, 0.0, ForceMode::VelocityChange);
        self.jump.consume();
    }
}

impl Default for PlayerController {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Apply look and movement for every controlled body, then clear the input
/// edges this tick consumed.
#[allow(clippy::needless_pass_by_value, clippy::type_complexity)]
pub fn drive_player_controllers(
    time: Res<Time>,
    mut players: Query<(Entity, &mut PlayerController, &mut MoveInput, &mut MotionState, &GroundContact, &mut Transform)>,
) {
    let dt = time.delta_seconds();
    for (entity, mut controller, mut input, mut motion, contact, mut transform) in &mut players {
        transform.rotation = PlayerController::apply_look(transform.rotation, input.yaw_delta);
        let outcome = controller.update(&input, &mut motion, contact, transform.rotation, dt);
        if outcome.jumped {
            debug!("{entity:?} jumped, {} charges left", controller.jump.charges());
        }
        input.consume_edges();
    }
}
