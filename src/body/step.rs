//! The per-body fixed step.
//!
//! One tick runs in this order:
//! 1. ground probe result folded into `GroundContact`
//! 2. motion state loaded with up, gravity and the integrator's velocity
//! 3. landing clears down velocity, grounded bodies get friction, airborne
//!    bodies past their coyote time get gravity if their motor drives them
//! 4. the controller (if any) edits the target velocity
//! 5. the motor hands the target velocity to the integrator
//! 6. the hand-off is stored for next tick's friction check
//!
//! `begin_fixed_step` covers 1-3 and `finish_fixed_step` covers 5-6. Both
//! are plain functions so the systems and the benchmarks run the same code.

use bevy::prelude::*;

use crate::body::{DgsBody, Kinematics, MotionState, StepFrame, SurfaceMaterial, DEFAULT_SURFACE_FRICTION};
use crate::gravity::{GravitySample, LocalGravity};
use crate::ground::{ContactReport, GroundContact, GroundEvent, GroundTransition};
use crate::motor::MotorPolicy;

/// Below this flat speed a grounded body is held still.
pub const STOP_SPEED: f32 = 0.01;

/// Inputs of the first half of a tick.
#[derive(Debug, Clone, Copy)]
pub struct StepInput {
    pub report: ContactReport,
    pub gravity: GravitySample,
    pub true_velocity: Vec3,
    pub coyote_time: f32,
    pub dt: f32,
}

/// Run steps 1-3 for one body.
///
/// # Arguments
/// * `policy` - decides whether the probe result is consumed at all
/// * `motion` / `contact` - the body's state, updated in place
/// * `input` - this tick's probe, gravity and integrator velocity
/// * `friction_of` - friction of a surface entity
///
/// # Returns
/// The contact transition, for event emission.
pub fn begin_fixed_step(
    policy: &dyn MotorPolicy,
    motion: &mut MotionState,
    contact: &mut GroundContact,
    input: StepInput,
    friction_of: impl Fn(Option<Entity>) -> f32,
) -> GroundTransition {
    let transition = if policy.probes_ground() {
        contact.update(input.report, input.dt)
    } else if contact.is_grounded() {
        GroundTransition::StillGrounded
    } else {
        GroundTransition::Airborne
    };

    let friction = friction_of(contact.surface());
    motion.begin_step(StepFrame {
        local_up: input.gravity.up,
        gravity_magnitude: input.gravity.magnitude,
        true_velocity: input.true_velocity,
        grounded: contact.is_grounded(),
        ground_friction: friction,
    });

    match transition {
        GroundTransition::Landed => {
            motion.negate_down_velocity();
        }
        GroundTransition::StillGrounded => motion.apply_friction(friction, input.dt),
        GroundTransition::LeftGround | GroundTransition::Airborne => {
            if policy.owns_velocity() && contact.coyote_time_elapsed(input.coyote_time) {
                motion.apply_gravity(input.dt);
            }
        }
    }
    transition
}

/// Run steps 5-6 for one body.
pub fn finish_fixed_step(policy: &dyn MotorPolicy, motion: &mut MotionState, contact: &GroundContact, kinematics: &mut Kinematics) {
    policy.drive(motion, contact, kinematics);
    if policy.owns_velocity() {
        motion.store_velocity(kinematics.velocity);
    }
}

/// Start the tick for every body and report landings and take-offs.
#[allow(clippy::needless_pass_by_value, clippy::type_complexity)]
pub fn begin_body_steps(
    time: Res<Time>,
    surfaces: Query<&SurfaceMaterial>,
    mut bodies: Query<(Entity, &DgsBody, &Kinematics, &ContactReport, &LocalGravity, &mut MotionState, &mut GroundContact)>,
    mut events: EventWriter<GroundEvent>,
) {
    let dt = time.delta_seconds();
    let friction_of = |surface: Option<Entity>| {
        surface
            .and_then(|e| surfaces.get(e).ok())
            .map_or(DEFAULT_SURFACE_FRICTION, |m| m.friction)
    };

    for (entity, body, kinematics, report, gravity, mut motion, mut contact) in &mut bodies {
        let input = StepInput {
            report: *report,
            gravity: gravity.0,
            true_velocity: kinematics.velocity,
            coyote_time: body.coyote_time,
            dt,
        };
        let transition = begin_fixed_step(body.policy(), &mut motion, &mut contact, input, friction_of);
        if matches!(transition, GroundTransition::Landed | GroundTransition::LeftGround) {
            debug!("{entity:?} {transition:?} (surface {:?})", contact.surface());
            events.send(GroundEvent { body: entity, transition, surface: contact.surface() });
        }
    }
}

/// Hand every body's target velocity to the integrator.
pub fn drive_bodies(mut bodies: Query<(&DgsBody, &GroundContact, &mut MotionState, &mut Kinematics)>) {
    bodies.par_iter_mut().for_each(|(body, contact, mut motion, mut kinematics)| {
        finish_fixed_step(body.policy(), &mut motion, contact, &mut kinematics);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::AccelerationMode;
    use crate::motor::MotorMode;
    use approx::assert_relative_eq;

    const DT: f32 = 0.02;

    fn gravity(up: Vec3) -> GravitySample {
        GravitySample { source: Some(Entity::from_raw(100)), up, magnitude: 9.8, in_range: true }
    }

    fn input(report: ContactReport, true_velocity: Vec3, coyote_time: f32) -> StepInput {
        StepInput { report, gravity: gravity(Vec3::Y), true_velocity, coyote_time, dt: DT }
    }

    #[test]
    fn grounded_acceleration_reaches_the_integrator() {
        let policy = MotorMode::AdvancedCharacter.policy();
        let floor = Entity::from_raw(1);
        let mut motion = MotionState::new(1.0);
        let mut contact = GroundContact::default();
        let mut kinematics = Kinematics::default();

        begin_fixed_step(policy, &mut motion, &mut contact, input(ContactReport::on(floor), Vec3::ZERO, 0.1), |_| 0.5);
        motion.accelerate(Vec3::new(5.0, 0.0, 0.0), DT, 14.0, AccelerationMode::Basic);
        finish_fixed_step(policy, &mut motion, &contact, &mut kinematics);

        assert_relative_eq!(kinematics.velocity.x, 0.7, epsilon = 1e-6);
        assert_eq!(kinematics.velocity.y, 0.0);
        assert_eq!(motion.stored_velocity(), kinematics.velocity);
    }

    #[test]
    fn landing_clears_down_velocity() {
        let policy = MotorMode::AdvancedCharacter.policy();
        let mut motion = MotionState::new(1.0);
        let mut contact = GroundContact::default();
        motion.set_target_velocity(Vec3::new(2.0, -6.0, 0.0));
        let t = begin_fixed_step(
            policy,
            &mut motion,
            &mut contact,
            input(ContactReport::on(Entity::from_raw(1)), Vec3::new(2.0, -6.0, 0.0), 0.1),
            |_| 1.0,
        );
        assert_eq!(t, GroundTransition::Landed);
        assert_eq!(motion.target_velocity(), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn gravity_waits_for_coyote_time() {
        let policy = MotorMode::AdvancedCharacter.policy();
        let mut motion = MotionState::new(1.0);
        let mut contact = GroundContact::default();
        begin_fixed_step(policy, &mut motion, &mut contact, input(ContactReport::on(Entity::from_raw(1)), Vec3::ZERO, 0.1), |_| 1.0);

        // Four ticks airborne stay inside a 0.1 s grace window.
        for _ in 0..4 {
            begin_fixed_step(policy, &mut motion, &mut contact, input(ContactReport::airborne(), Vec3::ZERO, 0.1), |_| 1.0);
            assert_eq!(motion.target_velocity(), Vec3::ZERO);
        }
        for _ in 0..2 {
            begin_fixed_step(policy, &mut motion, &mut contact, input(ContactReport::airborne(), Vec3::ZERO, 0.1), |_| 1.0);
        }
        assert!(motion.down_speed() > 0.0);
    }

    #[test]
    fn zero_coyote_time_applies_gravity_at_once() {
        let policy = MotorMode::AdvancedCharacter.policy();
        let mut motion = MotionState::new(1.0);
        let mut contact = GroundContact::default();
        begin_fixed_step(policy, &mut motion, &mut contact, input(ContactReport::airborne(), Vec3::ZERO, 0.0), |_| 1.0);
        assert_relative_eq!(motion.down_speed(), 9.8 * DT, epsilon = 1e-6);
    }

    #[test]
    fn slow_grounded_bodies_are_held() {
        let policy = MotorMode::AdvancedCharacter.policy();
        let mut motion = MotionState::new(1.0);
        let mut contact = GroundContact::default();
        let mut kinematics = Kinematics::default();
        motion.set_target_velocity(Vec3::new(0.005, 0.0, 0.0));
        begin_fixed_step(
            policy,
            &mut motion,
            &mut contact,
            input(ContactReport::on(Entity::from_raw(1)), Vec3::new(0.005, 0.0, 0.0), 0.1),
            |_| 1.0,
        );
        finish_fixed_step(policy, &mut motion, &contact, &mut kinematics);
        // The integrator still gets this tick's creep, the target is clear from
        // the next one on.
        assert_relative_eq!(kinematics.velocity.x, 0.005, epsilon = 1e-9);
        assert_eq!(motion.flat_speed(), 0.0);
    }

    #[test]
    fn static_bodies_ignore_probe_and_never_drive() {
        let policy = MotorMode::Static.policy();
        let mut motion = MotionState::new(1.0);
        let mut contact = GroundContact::default();
        let mut kinematics = Kinematics { velocity: Vec3::new(1.0, 2.0, 3.0), ..Default::default() };
        begin_fixed_step(policy, &mut motion, &mut contact, input(ContactReport::on(Entity::from_raw(1)), kinematics.velocity, 0.1), |_| 1.0);
        assert!(!contact.is_grounded());
        finish_fixed_step(policy, &mut motion, &contact, &mut kinematics);
        assert_eq!(kinematics.velocity, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(motion.stored_velocity(), Vec3::ZERO);
    }

    #[test]
    fn undriven_bodies_do_not_pile_up_gravity() {
        let mut contact = GroundContact::default();
        for mode in [MotorMode::Static, MotorMode::Pid, MotorMode::SimpleCharacter] {
            let mut motion = MotionState::new(1.0);
            for _ in 0..500 {
                begin_fixed_step(mode.policy(), &mut motion, &mut contact, input(ContactReport::airborne(), Vec3::ZERO, 0.0), |_| 1.0);
            }
            assert_eq!(motion.target_velocity(), Vec3::ZERO, "{mode:?}");
        }
    }
}
