//! Ground contact tracking.
//!
//! The probe itself (a ray or shape cast against nearby geometry) belongs to
//! the host. It writes a `ContactReport` on each body before the fixed step
//! runs, and `GroundContact::update` turns the stream of reports into
//! edge-triggered transitions:
//!
//! ```text
//!            probe hit                      probe hit
//!  Airborne ──────────► Grounded (Landed) ──────────► Grounded (StillGrounded)
//!     ▲                                                   │
//!     └──────────── probe miss (LeftGround) ◄─────────────┘
//! ```
//!
//! `time_since_last_grounded` is zero while grounded and accumulates the
//! fixed timestep while airborne. The coyote-time check reads it to withhold
//! gravity for a short grace window after walking off a ledge.

use bevy::prelude::*;

/// Probe result for the current tick, written by the host.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactReport {
    pub grounded: bool,
    /// The surface touched. A handle only, looked up when friction is needed.
    pub surface: Option<Entity>,
}

impl ContactReport {
    #[must_use]
    pub fn on(surface: Entity) -> Self {
        Self { grounded: true, surface: Some(surface) }
    }

    #[must_use]
    pub fn airborne() -> Self {
        Self::default()
    }
}

/// What changed in the last `GroundContact::update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroundTransition {
    /// Contact acquired this tick. Fires once per acquisition.
    Landed,
    StillGrounded,
    /// Contact lost this tick, the airborne timer starts.
    LeftGround,
    #[default]
    Airborne,
}

impl GroundTransition {
    #[must_use]
    pub fn is_grounded(self) -> bool {
        matches!(self, Self::Landed | Self::StillGrounded)
    }
}

/// Landing and take-off notifications for anything outside the core.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroundEvent {
    pub body: Entity,
    pub transition: GroundTransition,
    pub surface: Option<Entity>,
}

/// Per-body contact state.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct GroundContact {
    is_grounded: bool,
    was_grounded: bool,
    time_since_last_grounded: f32,
    surface: Option<Entity>,
    last_transition: GroundTransition,
}

impl GroundContact {
    /// Feed this tick's probe result.
    ///
    /// # Arguments
    /// * `report` - what the probe saw this tick
    /// * `dt` - fixed timestep in seconds
    ///
    /// # Returns
    /// The transition this report caused.
    pub fn update(&mut self, report: ContactReport, dt: f32) -> GroundTransition {
        self.was_grounded = self.is_grounded;
        self.is_grounded = report.grounded;

        let transition = match (self.was_grounded, self.is_grounded) {
            (false, true) => GroundTransition::Landed,
            (true, true) => GroundTransition::StillGrounded,
            (true, false) => GroundTransition::LeftGround,
            (false, false) => GroundTransition::Airborne,
        };

        if self.is_grounded {
            self.time_since_last_grounded = 0.0;
            self.surface = report.surface;
        } else {
            self.time_since_last_grounded += dt.max(0.0);
        }

        self.last_transition = transition;
        transition
    }

    #[must_use]
    pub fn is_grounded(&self) -> bool {
        self.is_grounded
    }

    #[must_use]
    pub fn was_grounded(&self) -> bool {
        self.was_grounded
    }

    #[must_use]
    pub fn just_landed(&self) -> bool {
        self.last_transition == GroundTransition::Landed
    }

    #[must_use]
    pub fn time_since_last_grounded(&self) -> f32 {
        self.time_since_last_grounded
    }

    /// Last surface stood on. Kept after leaving the ground, the entity may
    /// be gone by the time it is looked up.
    #[must_use]
    pub fn surface(&self) -> Option<Entity> {
        self.surface
    }

    #[must_use]
    pub fn last_transition(&self) -> GroundTransition {
        self.last_transition
    }

    /// True once the body has been airborne for at least `coyote_time`.
    #[must_use]
    pub fn coyote_time_elapsed(&self, coyote_time: f32) -> bool {
        !self.is_grounded && self.time_since_last_grounded >= coyote_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.25;

    #[test]
    fn landing_fires_once_per_contact() {
        let floor = Entity::from_raw(5);
        let mut contact = GroundContact::default();
        assert_eq!(contact.update(ContactReport::on(floor), DT), GroundTransition::Landed);
        assert!(contact.just_landed());
        assert_eq!(contact.update(ContactReport::on(floor), DT), GroundTransition::StillGrounded);
        assert_eq!(contact.update(ContactReport::on(floor), DT), GroundTransition::StillGrounded);
        assert!(!contact.just_landed());
        assert_eq!(contact.surface(), Some(floor));
    }

    #[test]
    fn airborne_timer_runs_only_off_ground() {
        let floor = Entity::from_raw(5);
        let mut contact = GroundContact::default();
        contact.update(ContactReport::on(floor), DT);
        assert_eq!(contact.time_since_last_grounded(), 0.0);

        assert_eq!(contact.update(ContactReport::airborne(), DT), GroundTransition::LeftGround);
        assert_eq!(contact.time_since_last_grounded(), 0.25);
        assert_eq!(contact.update(ContactReport::airborne(), DT), GroundTransition::Airborne);
        assert_eq!(contact.time_since_last_grounded(), 0.5);

        contact.update(ContactReport::on(floor), DT);
        assert_eq!(contact.time_since_last_grounded(), 0.0);
    }

    #[test]
    fn coyote_threshold_is_inclusive() {
        let mut contact = GroundContact::default();
        contact.update(ContactReport::on(Entity::from_raw(1)), DT);
        contact.update(ContactReport::airborne(), DT);
        assert!(!contact.coyote_time_elapsed(0.5));
        contact.update(ContactReport::airborne(), DT);
        assert!(contact.coyote_time_elapsed(0.5));
    }

    #[test]
    fn surface_survives_take_off() {
        let floor = Entity::from_raw(9);
        let mut contact = GroundContact::default();
        contact.update(ContactReport::on(floor), DT);
        contact.update(ContactReport::airborne(), DT);
        assert_eq!(contact.surface(), Some(floor));
        assert!(!contact.is_grounded());
        assert!(contact.was_grounded());
    }
}
