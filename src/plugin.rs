//! Schedule wiring.
//!
//! `DynamicGravityPlugin` registers the resources, events and systems of the
//! crate. Everything that changes body state runs in `FixedUpdate`, in five
//! chained sets:
//!
//! | set        | what runs                                               |
//! |------------|---------------------------------------------------------|
//! | `Snapshot` | source registration, field snapshot, per-body gravity   |
//! | `Probe`    | host ground probes writing `ContactReport`              |
//! | `Contact`  | contact update, landing correction, friction, gravity   |
//! | `Policy`   | player controllers                                      |
//! | `Drive`    | motors handing the target velocity to the integrator    |
//!
//! The host's integrator should run after `DgsSet::Drive`. Settings reload and
//! sync run in `Update`, auto-orient in `PostUpdate` ahead of transform
//! propagation.
//!
//! # Example
//! ```ignore
//! App::new()
//!     .add_plugins(MinimalPlugins)
//!     .add_plugins(DynamicGravityPlugin { fixed_timestep_hz: 60.0 })
//!     .add_systems(FixedUpdate, probe_ground.in_set(DgsSet::Probe))
//!     .add_systems(FixedUpdate, integrate.after(DgsSet::Drive))
//!     .run();
//! ```

use bevy::prelude::*;
use bevy::transform::TransformSystem;

use crate::body::{begin_body_steps, drive_bodies, realign_orientations};
use crate::controller::drive_player_controllers;
use crate::gravity::{register_gravity_sources, resolve_local_gravity, snapshot_gravity_sources, GravityField, GravityRegistry};
use crate::ground::GroundEvent;
use crate::motor::warn_unspecified_motors;
use crate::settings::loader::{check_settings_changes, SettingsWatcher};
use crate::settings::sync::sync_settings;
use crate::settings::{Settings, WorldSettings};

/// Stages of one fixed tick, in execution order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DgsSet {
    Snapshot,
    Probe,
    Contact,
    Policy,
    Drive,
}

pub struct DynamicGravityPlugin {
    pub fixed_timestep_hz: f64,
}

impl Default for DynamicGravityPlugin {
    fn default() -> Self {
        Self { fixed_timestep_hz: WorldSettings::default().fixed_timestep_hz }
    }
}

impl DynamicGravityPlugin {
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self { fixed_timestep_hz: settings.world.fixed_timestep_hz }
    }

    fn timestep_hz(&self) -> f64 {
        let world = WorldSettings { fixed_timestep_hz: self.fixed_timestep_hz, ..WorldSettings::default() };
        world.checked_timestep_hz().unwrap_or_else(|e| {
            let fallback = WorldSettings::default().fixed_timestep_hz;
            error!("{e}, running at {fallback} Hz");
            fallback
        })
    }
}

impl Plugin for DynamicGravityPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GravityRegistry>()
            .init_resource::<GravityField>()
            .add_event::<GroundEvent>()
            .insert_resource(Time::<Fixed>::from_hz(self.timestep_hz()));

        app.configure_sets(
            FixedUpdate,
            (DgsSet::Snapshot, DgsSet::Probe, DgsSet::Contact, DgsSet::Policy, DgsSet::Drive).chain(),
        );

        app.add_systems(
            FixedUpdate,
            (
                (register_gravity_sources, snapshot_gravity_sources, resolve_local_gravity)
                    .chain()
                    .in_set(DgsSet::Snapshot),
                begin_body_steps.in_set(DgsSet::Contact),
                drive_player_controllers.in_set(DgsSet::Policy),
                drive_bodies.in_set(DgsSet::Drive),
            ),
        );

        app.add_systems(
            Update,
            (
                check_settings_changes
                    .run_if(resource_exists::<SettingsWatcher>)
                    .run_if(resource_exists::<Settings>),
                sync_settings.run_if(resource_exists::<Settings>),
            )
                .chain(),
        );
        app.add_systems(Update, warn_unspecified_motors);
        app.add_systems(PostUpdate, realign_orientations.before(TransformSystem::TransformPropagate));
    }
}
