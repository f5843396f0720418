//! Debug dump: on a `DumpRequest` event, write the gravity field and every
//! body's motion state to a timestamped text file (`./debug-dumps/` by
//! default).
//!
//! Useful for capturing the state of a misbehaving body without attaching a
//! debugger. Hosts send the event from a key binding, a console command, or
//! on exit.
use bevy::prelude::*;
use chrono::{DateTime, Utc};
use std::fmt::Write;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::body::MotionState;
use crate::controller::PlayerController;
use crate::gravity::{GravityField, LocalGravity};
use crate::ground::GroundContact;

/// Ask for a dump. `reason` ends up in the file header.
#[derive(Event, Debug, Clone, Default)]
pub struct DumpRequest {
    pub reason: String,
}

/// Where dumps are written.
#[derive(Resource, Debug, Clone)]
pub struct DumpDirectory(pub PathBuf);

pub struct DebugDumpPlugin {
    pub dir: PathBuf,
}

impl Default for DebugDumpPlugin {
    fn default() -> Self {
        Self { dir: PathBuf::from("debug-dumps") }
    }
}

impl Plugin for DebugDumpPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DumpRequest>()
            .insert_resource(DumpDirectory(self.dir.clone()))
            .add_systems(PostUpdate, write_debug_dump);
    }
}

/// One body's line in the dump.
#[derive(Debug, Clone)]
pub struct BodyReport {
    pub entity: Entity,
    pub position: Vec3,
    pub gravity: LocalGravity,
    pub contact: GroundContact,
    pub motion: MotionState,
    /// Jump charges and crouch amount, for controlled bodies.
    pub controller: Option<(u32, f32)>,
}

/// Render the dump text.
///
/// # Arguments
/// * `header` - first lines of the file (timestamp, reason)
/// * `field` - this tick's gravity snapshot
/// * `bodies` - bodies to list, in the order given
#[must_use]
pub fn render_dump(header: &str, field: &GravityField, bodies: &[BodyReport]) -> String {
    let mut out = String::new();
    out.push_str(header);
    writeln!(
        out,
        "Gravity: G={:e} simplified={} limit_to_range={}",
        field.gravitational_constant, field.simplified_universal_force, field.limit_to_range_of_influence
    )
    .ok();

    writeln!(out, "\nSources ({}):", field.sources().len()).ok();
    for s in field.sources() {
        writeln!(
            out,
            "  {:?} {:?} at {:.3} magnitude={} range={} scale={:.3}",
            s.entity, s.source.gravity_type, s.reference_point(), s.source.gravity_magnitude, s.source.range_of_influence, s.scale
        )
        .ok();
    }

    writeln!(out, "\nBodies ({}):", bodies.len()).ok();
    for b in bodies {
        let g = &b.gravity.0;
        writeln!(out, "  {:?} at {:.3}", b.entity, b.position).ok();
        writeln!(out, "    gravity: source={:?} up={:.3} g={:.3} in_range={}", g.source, g.up, g.magnitude, g.in_range).ok();
        writeln!(
            out,
            "    contact: grounded={} airborne_for={:.3}s surface={:?}",
            b.contact.is_grounded(),
            b.contact.time_since_last_grounded(),
            b.contact.surface()
        )
        .ok();
        writeln!(
            out,
            "    velocity: target={:.3} true={:.3} flat_speed={:.3} down_speed={:.3}",
            b.motion.target_velocity(),
            b.motion.true_velocity(),
            b.motion.flat_speed(),
            b.motion.down_speed()
        )
        .ok();
        if let Some((charges, crouch)) = b.controller {
            writeln!(out, "    controller: jump_charges={charges} crouch={crouch:.2}").ok();
        }
    }
    out
}

#[allow(clippy::needless_pass_by_value, clippy::type_complexity)]
fn write_debug_dump(
    mut requests: EventReader<DumpRequest>,
    dir: Res<DumpDirectory>,
    field: Option<Res<GravityField>>,
    bodies: Query<(Entity, &Transform, &LocalGravity, &GroundContact, &MotionState, Option<&PlayerController>)>,
) {
    let Some(request) = requests.read().last() else {
        return;
    };

    // timestamp & filename
    let now = SystemTime::now();
    let ts_millis = now.duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0);
    let stamp: DateTime<Utc> = DateTime::from(now);
    let mut header = String::new();
    writeln!(header, "Debug dump: {ts_millis}").ok();
    writeln!(header, "Timestamp: {}", stamp.format("%Y-%m-%d %H:%M:%S%.3f")).ok();
    if !request.reason.is_empty() {
        writeln!(header, "Reason: {}", request.reason).ok();
    }

    let mut reports: Vec<BodyReport> = bodies
        .iter()
        .map(|(entity, transform, gravity, contact, motion, controller)| BodyReport {
            entity,
            position: transform.translation,
            gravity: *gravity,
            contact: *contact,
            motion: *motion,
            controller: controller.map(|c| (c.jump.charges(), c.crouch.amount())),
        })
        .collect();
    reports.sort_by_key(|r| r.entity);

    let empty = GravityField::default();
    let out = render_dump(&header, field.as_deref().unwrap_or(&empty), &reports);
    let fname = dir.0.join(format!("dgs-{ts_millis}.txt"));

    // ensure directory & write
    if let Err(e) = fs::create_dir_all(&dir.0) {
        error!("debug dump: failed to create dir '{}': {e}", dir.0.display());
        return;
    }
    if let Err(e) = fs::write(&fname, out) {
        error!("debug dump: failed to write {}: {e}", fname.display());
    } else {
        info!("wrote debug dump: {}", fname.display());
    }
}
