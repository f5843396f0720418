//! Push the `Settings` resource into the live world when it changes.
//!
//! Only entities tagged `SettingsDriven` follow the settings file, anything
//! spawned with hand-built components keeps its own values. Runtime state
//! (velocities, jump charges, crouch amount) survives a reload.

use bevy::prelude::*;

use crate::body::{DgsBody, Kinematics, MotionState, SurfaceMaterial};
use crate::controller::PlayerController;
use crate::gravity::GravityField;
use crate::settings::Settings;

/// Marks a body whose configuration comes from `Settings`.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct SettingsDriven;

/// Copy the world section into the gravity field and the tick rate.
pub fn apply_world_settings(settings: &Settings, field: &mut GravityField) {
    field.gravitational_constant = settings.world.gravitational_constant;
    field.simplified_universal_force = settings.world.simplified_universal_force;
    field.limit_to_range_of_influence = settings.world.limit_to_range_of_influence;
}

#[allow(clippy::needless_pass_by_value, clippy::type_complexity)]
pub fn sync_settings(
    settings: Res<Settings>,
    mut field: ResMut<GravityField>,
    fixed: Option<ResMut<Time<Fixed>>>,
    mut bodies: Query<
        (Entity, &mut DgsBody, &mut MotionState, &mut SurfaceMaterial, &mut Kinematics, Option<&mut PlayerController>),
        With<SettingsDriven>,
    >,
) {
    if !settings.is_changed() {
        return;
    }

    apply_world_settings(&settings, &mut field);
    if let Some(mut fixed) = fixed {
        match settings.world.checked_timestep_hz() {
            Ok(hz) => fixed.set_timestep_hz(hz),
            Err(e) => error!("{e}, keeping {:?} per tick", fixed.timestep()),
        }
    }

    let mut updated = 0usize;
    for (entity, mut body, mut motion, mut material, mut kinematics, controller) in &mut bodies {
        match DgsBody::from_settings(&settings.body) {
            Ok(configured) => {
                motion.set_mass(configured.mass());
                *body = configured;
            }
            Err(e) => {
                error!("{entity:?} keeps its body configuration: {e}");
                continue;
            }
        }
        *material = SurfaceMaterial::new(settings.body.friction, settings.body.bounciness);
        kinematics.constraints = settings.body.constraints;
        if let Some(mut controller) = controller {
            controller.apply_settings(&settings);
        }
        updated += 1;
    }
    debug!("applied settings to {updated} bodies");
}
