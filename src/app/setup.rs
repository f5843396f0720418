//! Demo scene: a planet, a moon and one settings-driven player.
use bevy::prelude::*;
use dyngrav::body::{DgsBodyBundle, SurfaceMaterial};
use dyngrav::controller::{MoveInput, PlayerController};
use dyngrav::gravity::GravitySource;
use dyngrav::settings::sync::SettingsDriven;
use dyngrav::settings::Settings;

use crate::app::world::{Collider, SphereSurface};

pub const PLANET_RADIUS: f32 = 20.0;
pub const MOON_RADIUS: f32 = 5.0;

/// Marks the body the scripted input drives.
#[derive(Component)]
pub struct Player;

/// Spawn the scene.
///
/// # Arguments
/// - `commands`: spawns the planet, moon and player.
/// - `settings`: body and controller configuration for the player.
#[allow(clippy::needless_pass_by_value)]
pub fn setup(mut commands: Commands, settings: Res<Settings>) {
    commands.spawn((
        Name::new("planet"),
        Transform::default(),
        GravitySource::center_of_mass(9.8, 60.0).with_mass(5.0e12),
        SphereSurface { radius: PLANET_RADIUS },
        SurfaceMaterial::new(0.8, 0.0),
    ));
    commands.spawn((
        Name::new("moon"),
        Transform::from_xyz(120.0, 0.0, 0.0),
        GravitySource::center_of_mass(1.6, 30.0).with_mass(7.0e10),
        SphereSurface { radius: MOON_RADIUS },
        SurfaceMaterial::new(0.3, 0.0),
    ));

    let bundle = match DgsBodyBundle::from_settings(&settings.body) {
        Ok(bundle) => bundle,
        Err(e) => {
            error!("player not spawned: {e}");
            return;
        }
    };
    let controller = PlayerController::from_settings(&settings);
    let half_height = controller.crouch.standing_height * 0.5;
    commands.spawn((
        Name::new("player"),
        Player,
        SettingsDriven,
        bundle,
        controller,
        MoveInput::default(),
        Collider { half_height },
        Transform::from_xyz(0.0, PLANET_RADIUS + half_height + 2.0, 0.0),
    ));
    info!("scene ready: planet, moon, player");
}
