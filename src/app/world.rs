//! Toy collision for the demo: spherical planets, a ground probe and an
//! explicit Euler integrator.
//!
//! A real host would plug its physics engine in here. The probe runs in
//! `DgsSet::Probe` and the integrator after `DgsSet::Drive`, which is all the
//! core needs.
use bevy::prelude::*;
use dyngrav::body::Kinematics;
use dyngrav::ground::ContactReport;

/// Distance within which a body counts as standing on a surface.
pub const CONTACT_SKIN: f32 = 0.05;

/// Solid ball that bodies can stand on.
#[derive(Component, Debug, Clone, Copy)]
pub struct SphereSurface {
    pub radius: f32,
}

/// Distance from a body's origin to its feet.
#[derive(Component, Debug, Clone, Copy)]
pub struct Collider {
    pub half_height: f32,
}

/// Gap between a body's feet and the closest sphere, with that sphere.
fn closest_surface<'a>(
    position: Vec3,
    collider: &Collider,
    spheres: impl Iterator<Item = (Entity, &'a Transform, &'a SphereSurface)>,
) -> Option<(Entity, Vec3, f32)> {
    spheres
        .map(|(entity, transform, sphere)| {
            let offset = position - transform.translation;
            let normal = offset.normalize_or_zero();
            let gap = offset.length() - sphere.radius - collider.half_height;
            (entity, normal, gap)
        })
        .min_by(|a, b| a.2.total_cmp(&b.2))
}

/// Write each body's `ContactReport` for this tick.
#[allow(clippy::needless_pass_by_value)]
pub fn probe_sphere_surfaces(
    spheres: Query<(Entity, &Transform, &SphereSurface)>,
    mut bodies: Query<(&Transform, &Collider, &Kinematics, &mut ContactReport)>,
) {
    for (transform, collider, kinematics, mut report) in &mut bodies {
        *report = match closest_surface(transform.translation, collider, spheres.iter()) {
            // Moving away from the surface means the body just took off.
            Some((surface, normal, gap)) if gap <= CONTACT_SKIN && kinematics.velocity.dot(normal) <= 0.0 => {
                ContactReport::on(surface)
            }
            _ => ContactReport::airborne(),
        };
    }
}

/// Move bodies by their velocity and push them out of any sphere.
#[allow(clippy::needless_pass_by_value)]
pub fn integrate_bodies(
    time: Res<Time>,
    spheres: Query<(Entity, &Transform, &SphereSurface), Without<Collider>>,
    mut bodies: Query<(&mut Transform, &mut Kinematics, &Collider)>,
) {
    let dt = time.delta_seconds();
    for (mut transform, mut kinematics, collider) in &mut bodies {
        let angular = kinematics.constraints.apply_angular(kinematics.angular_velocity);
        if angular.length_squared() > 0.0 {
            transform.rotation = (Quat::from_scaled_axis(angular * dt) * transform.rotation).normalize();
        }
        transform.translation += kinematics.velocity * dt;

        if let Some((_, normal, gap)) = closest_surface(transform.translation, collider, spheres.iter()) {
            if gap < 0.0 {
                transform.translation -= normal * gap;
                let into = kinematics.velocity.dot(normal);
                if into < 0.0 {
                    kinematics.velocity -= normal * into;
                }
            }
        }
    }
}
