//! Settings, types and defaults.
//!
//! Settings are stored as a RON file under `data/settings/` and are
//! hot-reloadable through the RON watcher (see `loader::setup_settings_watcher`).
//! Every field has its own default so a settings file only needs the values
//! it changes.
//!
//! Loaded settings go through `sanitize` (out-of-range values are clamped
//! with a warning) and `validate` (values that cannot be clamped into
//! anything meaningful are rejected).

pub mod loader;
pub mod sync;

use std::collections::HashMap;

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::body::{AccelerationMode, Constraints};
use crate::gravity::UNIVERSAL_GRAVITATIONAL_CONSTANT;
use crate::motor::MotorMode;

/// A settings value that cannot be used.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SettingsError {
    #[error("body mass must be a positive number, got {0}")]
    NonPositiveMass(f32),
    #[error("fixed timestep rate must be positive, got {0} Hz")]
    NonPositiveTickRate(f64),
    #[error("standing height must be positive, got {0}")]
    NonPositiveHeight(f32),
}

/// World-wide gravity and scheduling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSettings {
    #[serde(default = "WorldSettings::default_gravitational_constant")]
    pub gravitational_constant: f32, // G used by simplified universal gravity
    #[serde(default)]
    pub simplified_universal_force: bool, // Radial sources pull with G / distance instead of their fixed magnitude
    #[serde(default)]
    pub limit_to_range_of_influence: bool, // Out-of-range sources pull with zero magnitude
    #[serde(default = "WorldSettings::default_fixed_timestep_hz")]
    pub fixed_timestep_hz: f64, // Physics ticks per second
}

impl WorldSettings {
    fn default_gravitational_constant() -> f32 { UNIVERSAL_GRAVITATIONAL_CONSTANT }
    fn default_fixed_timestep_hz() -> f64 { 50.0 }

    /// The tick rate, if `Time<Fixed>` can run at it.
    ///
    /// # Errors
    /// `SettingsError::NonPositiveTickRate` for zero, negative or non-finite rates.
    pub fn checked_timestep_hz(&self) -> Result<f64, SettingsError> {
        if self.fixed_timestep_hz.is_finite() && self.fixed_timestep_hz > 0.0 {
            Ok(self.fixed_timestep_hz)
        } else {
            Err(SettingsError::NonPositiveTickRate(self.fixed_timestep_hz))
        }
    }
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            gravitational_constant: Self::default_gravitational_constant(),
            simplified_universal_force: false,
            limit_to_range_of_influence: false,
            fixed_timestep_hz: Self::default_fixed_timestep_hz(),
        }
    }
}

/// Defaults for bodies spawned from settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodySettings {
    #[serde(default = "BodySettings::default_motor_mode")]
    pub motor_mode: MotorMode,
    #[serde(default = "BodySettings::default_mass")]
    pub mass: f32,
    #[serde(default = "BodySettings::default_friction")]
    pub friction: f32, // Surface friction, [0, 1]
    #[serde(default)]
    pub bounciness: f32,
    #[serde(default = "BodySettings::default_coyote_time")]
    pub coyote_time: f32, // Seconds airborne before gravity applies, [0, 1]
    #[serde(default = "BodySettings::default_auto_orient_strength")]
    pub auto_orient_strength: f32, // [0, 1]
    #[serde(default = "BodySettings::default_constraints")]
    pub constraints: Constraints,
}

impl BodySettings {
    fn default_motor_mode() -> MotorMode { MotorMode::AdvancedCharacter }
    fn default_mass() -> f32 { 1.0 }
    fn default_friction() -> f32 { 1.0 }
    fn default_coyote_time() -> f32 { 0.1 }
    fn default_auto_orient_strength() -> f32 { 0.2 }
    fn default_constraints() -> Constraints { Constraints::FREEZE_ROTATION }
}

impl Default for BodySettings {
    fn default() -> Self {
        Self {
            motor_mode: Self::default_motor_mode(),
            mass: Self::default_mass(),
            friction: Self::default_friction(),
            bounciness: 0.0,
            coyote_time: Self::default_coyote_time(),
            auto_orient_strength: Self::default_auto_orient_strength(),
            constraints: Self::default_constraints(),
        }
    }
}

/// Speed cap and rates for one movement context.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementSettings {
    pub max_speed: f32,
    pub acceleration: f32,
    pub deceleration: f32,
}

impl MovementSettings {
    #[must_use]
    pub const fn new(max_speed: f32, acceleration: f32, deceleration: f32) -> Self {
        Self { max_speed, acceleration, deceleration }
    }

    fn sanitized(self) -> Self {
        Self {
            max_speed: self.max_speed.max(0.0),
            acceleration: self.acceleration.max(0.0),
            deceleration: self.deceleration.max(0.0),
        }
    }
}

/// Character controller tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerSettings {
    #[serde(default = "ControllerSettings::default_air_control")]
    pub air_control: f32, // 0 = no steering in the air, 1 = full
    #[serde(default)]
    pub ground_mode: AccelerationMode,
    #[serde(default = "ControllerSettings::default_air_mode")]
    pub air_mode: AccelerationMode,
    #[serde(default = "ControllerSettings::default_ground")]
    pub ground: MovementSettings,
    #[serde(default = "ControllerSettings::default_air")]
    pub air: MovementSettings,
    #[serde(default = "ControllerSettings::default_strafe")]
    pub strafe: MovementSettings,
    #[serde(default = "ControllerSettings::default_strafe_band_deg")]
    pub strafe_band_deg: f32, // Width of the strafe window around 90°
}

impl ControllerSettings {
    fn default_air_control() -> f32 { 0.3 }
    fn default_air_mode() -> AccelerationMode { AccelerationMode::Source }
    fn default_ground() -> MovementSettings { MovementSettings::new(7.0, 14.0, 10.0) }
    fn default_air() -> MovementSettings { MovementSettings::new(7.0, 2.0, 2.0) }
    fn default_strafe() -> MovementSettings { MovementSettings::new(1.0, 50.0, 50.0) }
    fn default_strafe_band_deg() -> f32 { 5.0 }
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            air_control: Self::default_air_control(),
            ground_mode: AccelerationMode::Basic,
            air_mode: Self::default_air_mode(),
            ground: Self::default_ground(),
            air: Self::default_air(),
            strafe: Self::default_strafe(),
            strafe_band_deg: Self::default_strafe_band_deg(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JumpSettings {
    #[serde(default = "JumpSettings::default_strength")]
    pub strength: f32, // Jump height in body heights
    #[serde(default = "JumpSettings::default_charges")]
    pub charges: u32, // Jumps available before landing again
    #[serde(default)]
    pub queue_while_airborne: bool,
    #[serde(default = "JumpSettings::default_cooldown")]
    pub cooldown: f32,
    #[serde(default)]
    pub auto_bunny_hop: bool, // Holding jump keeps jumping on every landing
}

impl JumpSettings {
    fn default_strength() -> f32 { 0.5 }
    fn default_charges() -> u32 { 1 }
    fn default_cooldown() -> f32 { 0.1 }
}

impl Default for JumpSettings {
    fn default() -> Self {
        Self {
            strength: Self::default_strength(),
            charges: Self::default_charges(),
            queue_while_airborne: false,
            cooldown: Self::default_cooldown(),
            auto_bunny_hop: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrouchSettings {
    #[serde(default = "CrouchSettings::default_standing_height")]
    pub standing_height: f32,
    #[serde(default = "CrouchSettings::default_crouched_height")]
    pub crouched_height: f32,
    #[serde(default = "CrouchSettings::default_rate")]
    pub rate: f32, // Fraction of the crouch completed per second
    #[serde(default = "CrouchSettings::default_speed_multiplier")]
    pub speed_multiplier: f32, // Ground speed scale when fully crouched
}

impl CrouchSettings {
    fn default_standing_height() -> f32 { 1.8 }
    fn default_crouched_height() -> f32 { 1.0 }
    fn default_rate() -> f32 { 8.0 }
    fn default_speed_multiplier() -> f32 { 0.5 }
}

impl Default for CrouchSettings {
    fn default() -> Self {
        Self {
            standing_height: Self::default_standing_height(),
            crouched_height: Self::default_crouched_height(),
            rate: Self::default_rate(),
            speed_multiplier: Self::default_speed_multiplier(),
        }
    }
}

/// Top-level Settings
#[derive(Resource, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub world: WorldSettings,
    #[serde(default)]
    pub body: BodySettings,
    #[serde(default)]
    pub controller: ControllerSettings,
    #[serde(default)]
    pub jump: JumpSettings,
    #[serde(default)]
    pub crouch: CrouchSettings,
}

fn clamp_unit(name: &str, value: &mut f32, warnings: &mut Vec<String>) {
    let clamped = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    if clamped != *value {
        warnings.push(format!("{name} = {value} is outside [0, 1], using {clamped}"));
        *value = clamped;
    }
}

fn clamp_non_negative(name: &str, value: &mut f32, warnings: &mut Vec<String>) {
    let clamped = if value.is_nan() { 0.0 } else { value.max(0.0) };
    if clamped != *value {
        warnings.push(format!("{name} = {value} is negative, using {clamped}"));
        *value = clamped;
    }
}

impl Settings {
    #[must_use]
    pub fn defaults() -> Self { Settings::default() }

    /// Clamp every ranged value into its range.
    ///
    /// # Returns
    /// One human-readable line per value that had to change, for logging.
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();
        clamp_unit("body.friction", &mut self.body.friction, &mut warnings);
        clamp_unit("body.coyote_time", &mut self.body.coyote_time, &mut warnings);
        clamp_unit("body.auto_orient_strength", &mut self.body.auto_orient_strength, &mut warnings);
        clamp_unit("controller.air_control", &mut self.controller.air_control, &mut warnings);
        clamp_unit("crouch.speed_multiplier", &mut self.crouch.speed_multiplier, &mut warnings);
        clamp_non_negative("controller.strafe_band_deg", &mut self.controller.strafe_band_deg, &mut warnings);
        clamp_non_negative("jump.strength", &mut self.jump.strength, &mut warnings);
        clamp_non_negative("jump.cooldown", &mut self.jump.cooldown, &mut warnings);
        clamp_non_negative("crouch.rate", &mut self.crouch.rate, &mut warnings);

        for (name, movement) in [
            ("controller.ground", &mut self.controller.ground),
            ("controller.air", &mut self.controller.air),
            ("controller.strafe", &mut self.controller.strafe),
        ] {
            let fixed = movement.sanitized();
            if fixed != *movement {
                warnings.push(format!("{name} has negative values, clamped to {fixed:?}"));
                *movement = fixed;
            }
        }

        if self.crouch.crouched_height > self.crouch.standing_height {
            warnings.push(format!(
                "crouch.crouched_height {} exceeds standing height {}, using the standing height",
                self.crouch.crouched_height, self.crouch.standing_height
            ));
            self.crouch.crouched_height = self.crouch.standing_height;
        }
        warnings
    }

    /// Reject values `sanitize` cannot repair.
    ///
    /// # Errors
    /// The first invalid value found.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.body.mass.is_finite() && self.body.mass > 0.0) {
            return Err(SettingsError::NonPositiveMass(self.body.mass));
        }
        self.world.checked_timestep_hz()?;
        if !(self.crouch.standing_height.is_finite() && self.crouch.standing_height > 0.0) {
            return Err(SettingsError::NonPositiveHeight(self.crouch.standing_height));
        }
        Ok(())
    }

    /// Add descriptions to each setting field so users understand what each
    /// setting does when editing the RON file.
    ///
    /// # Return
    /// A nested `HashMap`: section name (e.g. "world") to field name to description.
    #[must_use]
    pub fn field_descriptions() -> HashMap<&'static str, HashMap<&'static str, &'static str>> {
        let mut out: HashMap<&'static str, HashMap<&'static str, &'static str>> = HashMap::new();

        out.insert("world", HashMap::from([
            ("gravitational_constant", "G used when simplified universal gravity is on."),
            ("simplified_universal_force", "Radial sources pull with G / distance instead of their fixed magnitude."),
            ("limit_to_range_of_influence", "Sources pull with zero magnitude outside their range of influence."),
            ("fixed_timestep_hz", "Physics ticks per second. Must be positive."),
        ]));

        out.insert("body", HashMap::from([
            ("motor_mode", "Static, Pid, SimpleCharacter or AdvancedCharacter."),
            ("mass", "Body mass. Must be positive."),
            ("friction", "Surface friction from 0 (ice) to 1 (full grip)."),
            ("bounciness", "Surface bounciness, passed to the integrator."),
            ("coyote_time", "Seconds a body may be airborne before gravity applies (0 to 1)."),
            ("auto_orient_strength", "How quickly the body turns to match local up (0 to 1)."),
            ("constraints", "Per-axis position and rotation freezes."),
        ]));

        out.insert("controller", HashMap::from([
            ("air_control", "Steering in the air from 0 (none) to 1 (full)."),
            ("ground_mode", "Acceleration model on the ground: Basic, Source or Quake."),
            ("air_mode", "Acceleration model in the air: Basic, Source or Quake."),
            ("ground", "Max speed, acceleration and deceleration on the ground."),
            ("air", "Max speed, acceleration and deceleration in the air."),
            ("strafe", "Max speed and rates while air strafing."),
            ("strafe_band_deg", "Width in degrees of the strafe window around 90°."),
        ]));

        out.insert("jump", HashMap::from([
            ("strength", "Jump height in body heights."),
            ("charges", "Jumps available before landing again."),
            ("queue_while_airborne", "Remember a jump pressed in the air and fire it on landing."),
            ("cooldown", "Seconds between jumps."),
            ("auto_bunny_hop", "Holding jump jumps again on every landing."),
        ]));

        out.insert("crouch", HashMap::from([
            ("standing_height", "Body height when standing."),
            ("crouched_height", "Body height when fully crouched."),
            ("rate", "Fraction of the crouch completed per second."),
            ("speed_multiplier", "Ground speed scale when fully crouched (0 to 1)."),
        ]));

        out
    }
}
