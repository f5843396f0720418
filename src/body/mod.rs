//! Body components: configuration, surface material and the integrator-facing
//! kinematics, plus the motion state that owns each body's target velocity.
//!
//! A body entity carries:
//! - `Transform` (host engine)
//! - `DgsBody` (motor mode, mass, coyote time, orientation strength)
//! - `SurfaceMaterial` (friction others feel when standing on it)
//! - `Kinematics` (true velocity, owned by the integrator)
//! - `MotionState` (target velocity, owned by this crate)
//! - `GroundContact` / `ContactReport` / `LocalGravity`
//!
//! `DgsBodyBundle` spawns all of them at once.
//!
//! # Example
//! ```ignore
//! let body = DgsBody::new(MotorMode::AdvancedCharacter, 80.0)?;
//! commands.spawn((
//!     DgsBodyBundle::new(body, SurfaceMaterial::new(0.6, 0.0), Constraints::FREEZE_ROTATION),
//!     Transform::from_xyz(0.0, 20.0, 0.0),
//! ));
//! ```

pub mod motion;
pub mod orient;
pub mod step;

pub use motion::*;
pub use orient::*;
pub use step::*;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::gravity::LocalGravity;
use crate::ground::{ContactReport, GroundContact};
use crate::motor::{MotorMode, MotorPolicy};
use crate::settings::{BodySettings, SettingsError};

/// Friction used when the surface stood on has no material or no longer exists.
pub const DEFAULT_SURFACE_FRICTION: f32 = 1.0;

/// How `apply_force` / `apply_torque` interpret their vector argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ForceMode {
    /// Continuous force, `Δv = F·dt/m`.
    #[default]
    Force,
    /// Continuous acceleration, `Δv = a·dt`.
    Acceleration,
    /// Instant momentum change, `Δv = p/m`.
    Impulse,
    /// Instant velocity change, `Δv = v`.
    VelocityChange,
}

impl ForceMode {
    /// Velocity change `force` causes on a body of `mass` over `dt`.
    #[must_use]
    pub fn velocity_delta(self, force: Vec3, dt: f32, mass: f32) -> Vec3 {
        match self {
            ForceMode::Force => force * dt / mass,
            ForceMode::Acceleration => force * dt,
            ForceMode::Impulse => force / mass,
            ForceMode::VelocityChange => force,
        }
    }
}

/// Material of a body's surface.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMaterial {
    /// 0 is frictionless, 1 grips fully.
    pub friction: f32,
    pub bounciness: f32,
}

impl SurfaceMaterial {
    /// Friction is clamped into `[0, 1]` here so the tick never has to.
    #[must_use]
    pub fn new(friction: f32, bounciness: f32) -> Self {
        Self { friction: friction.clamp(0.0, 1.0), bounciness }
    }
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self::new(DEFAULT_SURFACE_FRICTION, 0.0)
    }
}

/// Per-axis freezes handed to the integrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Constraints {
    #[serde(default = "Constraints::free")]
    pub freeze_position: BVec3,
    #[serde(default = "Constraints::free")]
    pub freeze_rotation: BVec3,
}

impl Constraints {
    pub const NONE: Self = Self { freeze_position: BVec3::FALSE, freeze_rotation: BVec3::FALSE };
    pub const FREEZE_ROTATION: Self = Self { freeze_position: BVec3::FALSE, freeze_rotation: BVec3::TRUE };
    pub const FREEZE_ALL: Self = Self { freeze_position: BVec3::TRUE, freeze_rotation: BVec3::TRUE };

    fn free() -> BVec3 { BVec3::FALSE }

    /// `velocity` with frozen position axes zeroed.
    #[must_use]
    pub fn apply_linear(&self, velocity: Vec3) -> Vec3 {
        Vec3::select(self.freeze_position, Vec3::ZERO, velocity)
    }

    /// `angular_velocity` with frozen rotation axes zeroed.
    #[must_use]
    pub fn apply_angular(&self, angular_velocity: Vec3) -> Vec3 {
        Vec3::select(self.freeze_rotation, Vec3::ZERO, angular_velocity)
    }
}

/// The integrator's view of a body: what it actually moves with.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Kinematics {
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub constraints: Constraints,
}

impl Kinematics {
    #[must_use]
    pub fn with_constraints(constraints: Constraints) -> Self {
        Self { constraints, ..Default::default() }
    }

    /// Add torque straight to the angular velocity. Target velocity is not
    /// involved, rotation is owned by the integrator.
    pub fn apply_torque(&mut self, torque: Vec3, dt: f32, mode: ForceMode, mass: f32) {
        self.angular_velocity += mode.velocity_delta(torque, dt, mass);
    }
}

/// Static configuration of a movable body.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct DgsBody {
    motor_mode: MotorMode,
    mass: f32,
    /// Seconds airborne before gravity kicks in, `[0, 1]`.
    pub coyote_time: f32,
    /// How quickly the body turns to match its local up, `[0, 1]`.
    pub auto_orient_strength: f32,
}

impl DgsBody {
    /// # Errors
    /// `SettingsError::NonPositiveMass` when `mass` is not a positive finite number.
    pub fn new(motor_mode: MotorMode, mass: f32) -> Result<Self, SettingsError> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(SettingsError::NonPositiveMass(mass));
        }
        Ok(Self { motor_mode, mass, coyote_time: 0.1, auto_orient_strength: 0.2 })
    }

    /// # Errors
    /// Same as `DgsBody::new`.
    pub fn from_settings(settings: &BodySettings) -> Result<Self, SettingsError> {
        Ok(Self::new(settings.motor_mode, settings.mass)?
            .with_coyote_time(settings.coyote_time)
            .with_auto_orient_strength(settings.auto_orient_strength))
    }

    #[must_use]
    pub fn with_coyote_time(mut self, seconds: f32) -> Self {
        self.coyote_time = seconds.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn with_auto_orient_strength(mut self, strength: f32) -> Self {
        self.auto_orient_strength = strength.clamp(0.0, 1.0);
        self
    }

    #[must_use]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[must_use]
    pub fn motor_mode(&self) -> MotorMode {
        self.motor_mode
    }

    #[must_use]
    pub fn policy(&self) -> &'static dyn MotorPolicy {
        self.motor_mode.policy()
    }
}

/// Everything the core needs on a body entity, minus the host's `Transform`.
#[derive(Bundle)]
pub struct DgsBodyBundle {
    pub body: DgsBody,
    pub material: SurfaceMaterial,
    pub kinematics: Kinematics,
    pub motion: MotionState,
    pub contact: GroundContact,
    pub report: ContactReport,
    pub gravity: LocalGravity,
}

impl DgsBodyBundle {
    #[must_use]
    pub fn new(body: DgsBody, material: SurfaceMaterial, constraints: Constraints) -> Self {
        Self {
            motion: MotionState::new(body.mass()),
            body,
            material,
            kinematics: Kinematics::with_constraints(constraints),
            contact: GroundContact::default(),
            report: ContactReport::default(),
            gravity: LocalGravity::default(),
        }
    }

    /// # Errors
    /// Rejects a non-positive mass, see `DgsBody::new`.
    pub fn from_settings(settings: &BodySettings) -> Result<Self, SettingsError> {
        Ok(Self::new(
            DgsBody::from_settings(settings)?,
            SurfaceMaterial::new(settings.friction, settings.bounciness),
            settings.constraints,
        ))
    }
}
