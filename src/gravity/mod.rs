//! Gravity field resolver.
//!
//! Every body is pulled by exactly one gravity source: the nearest active one.
//! The field is rebuilt from a snapshot of the registered sources at the start
//! of each fixed tick, so every body sampled during that tick sees the same
//! source positions no matter in which order bodies are processed.
//!
//! Two field shapes are supported:
//! - `VectorDirection`: a uniform field, "up" is the negated source direction.
//! - `CenterOfMass`: a radial field, "up" points from the source's center of
//!   mass to the body.
//!
//! Lookups scan the sources linearly. That is fine for the tens of sources a
//! scene is expected to hold, it is not meant for thousands.
//!
//! # Example
//! ```ignore
//! let mut field = GravityField::default();
//! field.push_source(SourceSnapshot::new(planet, &planet_tf, &GravitySource::center_of_mass(9.8, 60.0)));
//! let sample = field.sample(&GravityQuery { body, position, current_up: Vec3::Y });
//! motion.apply_force(sample.vector(), dt, ForceMode::Acceleration);
//! ```

pub mod registry;

pub use registry::*;

use bevy::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::math::DIRECTION_EPSILON_SQ;

/// Newton's constant, the default for `GravityField::gravitational_constant`.
pub const UNIVERSAL_GRAVITATIONAL_CONSTANT: f32 = 6.67e-11;

/// Shape of the field a source produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GravityType {
    /// Uniform field along `gravity_direction`.
    VectorDirection,
    /// Radial field around the source's center of mass.
    CenterOfMass,
    /// Not a source. Never returned by the resolver.
    #[default]
    None,
}

/// A body or field generator that pulls other bodies.
#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GravitySource {
    #[serde(default)]
    pub gravity_type: GravityType,
    #[serde(default = "GravitySource::default_mass")]
    pub mass: f32,
    #[serde(default = "GravitySource::default_magnitude")]
    pub gravity_magnitude: f32,
    #[serde(default = "GravitySource::default_range")]
    pub range_of_influence: f32,
    /// Direction gravity pulls in, used by `VectorDirection` sources.
    #[serde(default = "GravitySource::default_direction")]
    pub gravity_direction: Vec3,
    /// World-space offset of the center of mass from the owning entity.
    #[serde(default)]
    pub center_of_mass_offset: Vec3,
}

impl GravitySource {
    fn default_mass() -> f32 { 1.0 }
    fn default_magnitude() -> f32 { 9.8 }
    fn default_range() -> f32 { 100.0 }
    fn default_direction() -> Vec3 { Vec3::NEG_Y }

    /// A uniform field pulling along `direction`.
    #[must_use]
    pub fn directional(direction: Vec3, magnitude: f32, range_of_influence: f32) -> Self {
        Self {
            gravity_type: GravityType::VectorDirection,
            gravity_direction: direction,
            gravity_magnitude: magnitude,
            range_of_influence,
            ..Default::default()
        }
    }

    /// A radial field pulling toward the owning entity.
    #[must_use]
    pub fn center_of_mass(magnitude: f32, range_of_influence: f32) -> Self {
        Self {
            gravity_type: GravityType::CenterOfMass,
            gravity_magnitude: magnitude,
            range_of_influence,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    #[must_use]
    pub fn with_center_of_mass_offset(mut self, offset: Vec3) -> Self {
        self.center_of_mass_offset = offset;
        self
    }

    /// Whether the resolver should consider this source at all.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.gravity_type != GravityType::None
    }
}

impl Default for GravitySource {
    fn default() -> Self {
        Self {
            gravity_type: GravityType::None,
            mass: Self::default_mass(),
            gravity_magnitude: Self::default_magnitude(),
            range_of_influence: Self::default_range(),
            gravity_direction: Self::default_direction(),
            center_of_mass_offset: Vec3::ZERO,
        }
    }
}

/// A gravity source frozen at the start of a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSnapshot {
    pub entity: Entity,
    pub position: Vec3,
    pub center_of_mass: Vec3,
    /// Magnitude of the owner's scale, used as tolerance by the range test.
    pub scale: f32,
    pub source: GravitySource,
}

impl SourceSnapshot {
    #[must_use]
    pub fn new(entity: Entity, transform: &Transform, source: &GravitySource) -> Self {
        Self {
            entity,
            position: transform.translation,
            center_of_mass: transform.translation + source.center_of_mass_offset,
            scale: transform.scale.length(),
            source: source.clone(),
        }
    }

    /// Point distances are measured from: the center of mass for radial
    /// sources, the entity position otherwise.
    #[must_use]
    pub fn reference_point(&self) -> Vec3 {
        match self.source.gravity_type {
            GravityType::CenterOfMass => self.center_of_mass,
            _ => self.position,
        }
    }
}

/// What one body should treat as up and how hard it is pulled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravitySample {
    /// Source the sample came from, `None` when there is no active source.
    pub source: Option<Entity>,
    pub up: Vec3,
    pub magnitude: f32,
    pub in_range: bool,
}

impl GravitySample {
    /// The "no gravity" result: zero magnitude, the body keeps its own up.
    #[must_use]
    pub fn none(current_up: Vec3) -> Self {
        let up = current_up.try_normalize().unwrap_or(Vec3::Y);
        Self { source: None, up, magnitude: 0.0, in_range: false }
    }

    /// Gravitational acceleration as a vector.
    #[must_use]
    pub fn vector(&self) -> Vec3 {
        -self.up * self.magnitude
    }
}

impl Default for GravitySample {
    fn default() -> Self {
        Self::none(Vec3::Y)
    }
}

/// Per-body gravity resolved at the start of the current fixed tick.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct LocalGravity(pub GravitySample);

/// Input for one resolver lookup.
#[derive(Debug, Clone, Copy)]
pub struct GravityQuery {
    /// The body asking. A body that is also a source never pulls itself.
    pub body: Entity,
    pub position: Vec3,
    pub current_up: Vec3,
}

/// Snapshot of every active gravity source plus the field-wide constants.
#[derive(Resource, Debug, Clone)]
pub struct GravityField {
    sources: Vec<SourceSnapshot>,
    pub gravitational_constant: f32,
    /// Radial magnitude becomes `G / distance`. Masses are ignored on purpose.
    pub simplified_universal_force: bool,
    /// Out-of-range sources yield zero magnitude instead of their full pull.
    pub limit_to_range_of_influence: bool,
}

impl Default for GravityField {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            gravitational_constant: UNIVERSAL_GRAVITATIONAL_CONSTANT,
            simplified_universal_force: false,
            limit_to_range_of_influence: false,
        }
    }
}

impl GravityField {
    #[must_use]
    pub fn new(gravitational_constant: f32, simplified_universal_force: bool) -> Self {
        Self {
            gravitational_constant,
            simplified_universal_force,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn sources(&self) -> &[SourceSnapshot] {
        &self.sources
    }

    pub fn clear(&mut self) {
        self.sources.clear();
    }

    /// Append a source. Inactive (`GravityType::None`) sources are dropped so
    /// no query can ever see them.
    pub fn push_source(&mut self, snapshot: SourceSnapshot) {
        if snapshot.source.is_active() {
            self.sources.push(snapshot);
        }
    }

    /// Nearest active source to `position`.
    ///
    /// Ties keep the first source in registration order.
    ///
    /// # Arguments
    /// * `position` - world position of the body
    /// * `exclude` - the body itself, when it is also a source
    #[must_use]
    pub fn nearest_source(&self, position: Vec3, exclude: Option<Entity>) -> Option<&SourceSnapshot> {
        let mut best: Option<(&SourceSnapshot, f32)> = None;
        for snapshot in &self.sources {
            if Some(snapshot.entity) == exclude {
                continue;
            }
            let d = snapshot.reference_point().distance(position);
            if best.is_none_or(|(_, best_d)| d < best_d) {
                best = Some((snapshot, d));
            }
        }
        best.map(|(s, _)| s)
    }

    /// Distance to the nearest active source, infinite when there is none.
    #[must_use]
    pub fn distance_to_nearest_source(&self, position: Vec3, exclude: Option<Entity>) -> f32 {
        self.nearest_source(position, exclude)
            .map_or(f32::INFINITY, |s| s.reference_point().distance(position))
    }

    /// Local up for a body at `position`, `fallback_up` when there is no source.
    #[must_use]
    pub fn up_direction(&self, position: Vec3, exclude: Option<Entity>, fallback_up: Vec3) -> Vec3 {
        match self.nearest_source(position, exclude) {
            Some(s) => Self::up_from(s, position, fallback_up),
            None => GravitySample::none(fallback_up).up,
        }
    }

    /// Gravity magnitude for a body at `position`, `0.0` when there is no source.
    #[must_use]
    pub fn gravity_magnitude(&self, position: Vec3, exclude: Option<Entity>) -> f32 {
        self.nearest_source(position, exclude)
            .map_or(0.0, |s| self.magnitude_from(s, position))
    }

    /// Whether a body at `position` with local `up` is inside `source`'s reach.
    ///
    /// Radial sources compare the straight distance against the range plus the
    /// owner's scale. Other sources compare the body position projected on its
    /// up axis against the range.
    #[must_use]
    pub fn is_in_range_of_influence(&self, position: Vec3, up: Vec3, source: &SourceSnapshot) -> bool {
        match source.source.gravity_type {
            GravityType::CenterOfMass => {
                position.distance(source.reference_point()) < source.source.range_of_influence + source.scale
            }
            _ => position.dot(up) < source.source.range_of_influence,
        }
    }

    /// Resolve up, magnitude and range for one body.
    #[must_use]
    pub fn sample(&self, query: &GravityQuery) -> GravitySample {
        let Some(source) = self.nearest_source(query.position, Some(query.body)) else {
            return GravitySample::none(query.current_up);
        };
        let up = Self::up_from(source, query.position, query.current_up);
        let in_range = self.is_in_range_of_influence(query.position, up, source);
        let magnitude = if self.limit_to_range_of_influence && !in_range {
            0.0
        } else {
            self.magnitude_from(source, query.position)
        };
        GravitySample { source: Some(source.entity), up, magnitude, in_range }
    }

    /// Resolve every query against this snapshot in parallel.
    ///
    /// The field is read-only here, so the result does not depend on the
    /// order the queries are processed in.
    #[must_use]
    pub fn sample_all(&self, queries: &[GravityQuery]) -> Vec<GravitySample> {
        queries.par_iter().map(|q| self.sample(q)).collect()
    }

    fn up_from(source: &SourceSnapshot, position: Vec3, fallback_up: Vec3) -> Vec3 {
        let up = match source.source.gravity_type {
            GravityType::VectorDirection => -source.source.gravity_direction,
            _ => position - source.reference_point(),
        };
        if up.length_squared() < DIRECTION_EPSILON_SQ {
            GravitySample::none(fallback_up).up
        } else {
            up.normalize()
        }
    }

    fn magnitude_from(&self, source: &SourceSnapshot, position: Vec3) -> f32 {
        if source.source.gravity_type == GravityType::CenterOfMass && self.simplified_universal_force {
            let d = position.distance(source.reference_point());
            if d <= f32::EPSILON { 0.0 } else { self.gravitational_constant / d }
        } else {
            source.source.gravity_magnitude
        }
    }
}
