//! Registration of gravity sources and the per-tick snapshot systems.
//!
//! Sources are kept in the order they were registered. That order is the
//! tie-break order of `GravityField::nearest_source`, so it has to be stable
//! across ticks rather than whatever order a query happens to iterate in.

use bevy::prelude::*;

use crate::gravity::{GravityField, GravityQuery, GravitySource, LocalGravity, SourceSnapshot};

/// Gravity-source entities in registration order.
#[derive(Resource, Debug, Default)]
pub struct GravityRegistry {
    order: Vec<Entity>,
}

impl GravityRegistry {
    /// Register `entity`. Returns `false` if it was already registered.
    pub fn register(&mut self, entity: Entity) -> bool {
        if self.order.contains(&entity) {
            return false;
        }
        self.order.push(entity);
        true
    }

    /// Remove `entity`. Returns `false` if it was not registered.
    pub fn unregister(&mut self, entity: Entity) -> bool {
        let before = self.order.len();
        self.order.retain(|e| *e != entity);
        before != self.order.len()
    }

    /// Keep only the entities `keep` accepts. Returns how many were dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(Entity) -> bool) -> usize {
        let before = self.order.len();
        self.order.retain(|e| keep(*e));
        before - self.order.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.order.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Track gravity sources as their components are added and removed.
///
/// # Arguments
/// * `registry` - ordered list of source entities
/// * `added` - sources whose component was added since the last run
/// * `removed` - entities that lost their `GravitySource` or were despawned
#[allow(clippy::needless_pass_by_value)]
pub fn register_gravity_sources(
    mut registry: ResMut<GravityRegistry>,
    added: Query<(Entity, &GravitySource), Added<GravitySource>>,
    mut removed: RemovedComponents<GravitySource>,
) {
    for entity in removed.read() {
        if registry.unregister(entity) {
            debug!("gravity source {entity:?} removed");
        }
    }
    for (entity, source) in &added {
        if registry.register(entity) {
            info!("registered gravity source {entity:?} ({:?}, range {})", source.gravity_type, source.range_of_influence);
        }
    }
}

/// Freeze the position of every registered source for this tick.
///
/// Entries whose source is gone are pruned here as well, since removal events
/// only live for two updates and a slow fixed clock can miss them.
#[allow(clippy::needless_pass_by_value)]
pub fn snapshot_gravity_sources(
    mut registry: ResMut<GravityRegistry>,
    sources: Query<(&Transform, &GravitySource)>,
    mut field: ResMut<GravityField>,
) {
    let stale = registry.retain(|entity| sources.contains(entity));
    if stale > 0 {
        debug!("pruned {stale} stale gravity source(s)");
    }
    field.clear();
    for entity in registry.iter() {
        if let Ok((transform, source)) = sources.get(entity) {
            field.push_source(SourceSnapshot::new(entity, transform, source));
        }
    }
}

/// Resolve gravity for every body from one position snapshot.
///
/// All queries are built before any sample is written back, so no body sees a
/// sibling's half-updated state.
#[allow(clippy::needless_pass_by_value)]
pub fn resolve_local_gravity(
    field: Res<GravityField>,
    mut bodies: Query<(Entity, &Transform, &mut LocalGravity)>,
) {
    let queries: Vec<GravityQuery> = bodies
        .iter()
        .map(|(body, transform, _)| GravityQuery {
            body,
            position: transform.translation,
            current_up: transform.rotation * Vec3::Y,
        })
        .collect();

    let samples = field.sample_all(&queries);
    for (query, sample) in queries.iter().zip(samples) {
        if let Ok((_, _, mut local)) = bodies.get_mut(query.body) {
            local.0 = sample;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_keeps_registration_order() {
        let mut registry = GravityRegistry::default();
        let (a, b, c) = (Entity::from_raw(3), Entity::from_raw(1), Entity::from_raw(2));
        assert!(registry.register(a));
        assert!(registry.register(b));
        assert!(!registry.register(a));
        assert!(registry.register(c));
        assert_eq!(registry.iter().collect::<Vec<_>>(), vec![a, b, c]);
        assert!(registry.unregister(b));
        assert!(!registry.unregister(b));
        assert_eq!(registry.iter().collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.retain(|e| e != a), 1);
        assert_eq!(registry.iter().collect::<Vec<_>>(), vec![c]);
    }

    #[test]
    fn source_despawned_between_ticks_is_dropped() {
        let mut world = World::new();
        world.init_resource::<GravityRegistry>();
        world.init_resource::<GravityField>();
        let mut schedule = Schedule::default();
        schedule.add_systems((register_gravity_sources, snapshot_gravity_sources).chain());

        let source = world.spawn((Transform::default(), GravitySource::directional(Vec3::NEG_Y, 9.8, 100.0))).id();
        schedule.run(&mut world);
        assert_eq!(world.resource::<GravityRegistry>().len(), 1);

        // Removal events expire before the next run sees them.
        world.despawn(source);
        world.clear_trackers();
        world.clear_trackers();
        schedule.run(&mut world);

        assert!(world.resource::<GravityRegistry>().is_empty());
        assert!(world.resource::<GravityField>().sources().is_empty());
    }
}
