//! Motor modes: how a body's motion state reaches the integrator.
//!
//! Each `MotorMode` maps to a stateless `MotorPolicy`. The fixed step asks
//! the policy whether to consume the ground probe, and at the end hands it the
//! motion state to drive.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::body::{DgsBody, Kinematics, MotionState, STOP_SPEED};
use crate::ground::GroundContact;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MotorMode {
    /// Never moved by the core, only kept upright.
    #[default]
    Static,
    Pid,
    SimpleCharacter,
    AdvancedCharacter,
}

impl MotorMode {
    #[must_use]
    pub fn policy(self) -> &'static dyn MotorPolicy {
        match self {
            MotorMode::Static => &StaticMotor,
            MotorMode::Pid => &PID_MOTOR,
            MotorMode::SimpleCharacter => &SIMPLE_CHARACTER_MOTOR,
            MotorMode::AdvancedCharacter => &AdvancedCharacterMotor,
        }
    }
}

/// Behaviour of one motor mode.
pub trait MotorPolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the mode has defined behaviour at all.
    fn is_specified(&self) -> bool {
        true
    }

    /// Consume the host's `ContactReport` each tick.
    fn probes_ground(&self) -> bool;

    /// The target velocity is handed to the integrator.
    fn owns_velocity(&self) -> bool;

    /// Turn the body towards its local up every frame.
    fn auto_orients(&self) -> bool;

    /// Final step of the tick, after the controller has run.
    fn drive(&self, motion: &mut MotionState, contact: &GroundContact, kinematics: &mut Kinematics);
}

pub struct StaticMotor;

impl MotorPolicy for StaticMotor {
    fn name(&self) -> &'static str {
        "Static"
    }

    fn probes_ground(&self) -> bool {
        false
    }

    fn owns_velocity(&self) -> bool {
        false
    }

    fn auto_orients(&self) -> bool {
        true
    }

    fn drive(&self, _motion: &mut MotionState, _contact: &GroundContact, _kinematics: &mut Kinematics) {}
}

/// Placeholder for modes without defined behaviour. Inert.
pub struct UnspecifiedMotor {
    name: &'static str,
}

static PID_MOTOR: UnspecifiedMotor = UnspecifiedMotor { name: "Pid" };
static SIMPLE_CHARACTER_MOTOR: UnspecifiedMotor = UnspecifiedMotor { name: "SimpleCharacter" };

impl MotorPolicy for UnspecifiedMotor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn is_specified(&self) -> bool {
        false
    }

    fn probes_ground(&self) -> bool {
        false
    }

    fn owns_velocity(&self) -> bool {
        false
    }

    fn auto_orients(&self) -> bool {
        false
    }

    fn drive(&self, _motion: &mut MotionState, _contact: &GroundContact, _kinematics: &mut Kinematics) {}
}

/// Full character motor: feeds the target velocity and holds slow grounded
/// bodies in place.
pub struct AdvancedCharacterMotor;

impl MotorPolicy for AdvancedCharacterMotor {
    fn name(&self) -> &'static str {
        "AdvancedCharacter"
    }

    fn probes_ground(&self) -> bool {
        true
    }

    fn owns_velocity(&self) -> bool {
        true
    }

    fn auto_orients(&self) -> bool {
        true
    }

    fn drive(&self, motion: &mut MotionState, contact: &GroundContact, kinematics: &mut Kinematics) {
        kinematics.velocity = kinematics.constraints.apply_linear(motion.target_velocity());
        if contact.is_grounded() && motion.flat_of(kinematics.velocity).length() <= STOP_SPEED {
            motion.isolate_down_velocity();
        }
    }
}

/// Warn once for every body spawned with a mode that does nothing.
pub fn warn_unspecified_motors(bodies: Query<(Entity, &DgsBody), Added<DgsBody>>) {
    for (entity, body) in &bodies {
        let policy = body.policy();
        if !policy.is_specified() {
            warn!("{entity:?} uses motor mode {} which has no behaviour yet, it will not be moved", policy.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{Constraints, StepFrame};
    use crate::ground::ContactReport;

    #[test]
    fn policy_flags_per_mode() {
        let advanced = MotorMode::AdvancedCharacter.policy();
        assert!(advanced.probes_ground() && advanced.owns_velocity() && advanced.auto_orients());

        let fixed = MotorMode::Static.policy();
        assert!(!fixed.probes_ground() && !fixed.owns_velocity() && fixed.auto_orients());

        for mode in [MotorMode::Pid, MotorMode::SimpleCharacter] {
            let policy = mode.policy();
            assert!(!policy.is_specified());
            assert!(!policy.owns_velocity());
        }
    }

    #[test]
    fn advanced_motor_honours_constraints() {
        let mut motion = MotionState::new(1.0);
        motion.set_target_velocity(Vec3::new(1.0, 2.0, 3.0));
        let mut kinematics = Kinematics::with_constraints(Constraints {
            freeze_position: BVec3::new(false, true, false),
            ..Constraints::FREEZE_ROTATION
        });
        MotorMode::AdvancedCharacter.policy().drive(&mut motion, &GroundContact::default(), &mut kinematics);
        assert_eq!(kinematics.velocity, Vec3::new(1.0, 0.0, 3.0));
    }

    #[test]
    fn unspecified_modes_leave_velocity_alone() {
        let mut motion = MotionState::new(1.0);
        motion.begin_step(StepFrame {
            local_up: Vec3::Y,
            gravity_magnitude: 9.8,
            true_velocity: Vec3::ZERO,
            grounded: false,
            ground_friction: 1.0,
        });
        motion.set_target_velocity(Vec3::X);
        let mut contact = GroundContact::default();
        contact.update(ContactReport::airborne(), 0.02);
        let mut kinematics = Kinematics { velocity: Vec3::Z, ..Default::default() };
        MotorMode::Pid.policy().drive(&mut motion, &contact, &mut kinematics);
        assert_eq!(kinematics.velocity, Vec3::Z);
    }
}
