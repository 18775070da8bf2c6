//! Gravity field with orbital rails, and its Bevy wiring.
//!
//! Far from every observer a body's motion is computed analytically from
//! cached orbital elements ("on rails"); near an observer it is integrated
//! step by step under gravity ("off rails"). [`GravityField`] owns every
//! body and decides transitions; [`GravityPlugin`] mirrors it onto entities:
//!
//! - entities with an [`Orbiter`] component are registered and receive an
//!   [`OrbitHandle`]; despawning them deregisters the body
//! - [`Thrusting`] and [`Touched`] markers feed the capability queries
//! - [`OrbitObserver`] entities keep nearby bodies simulated
//! - field events are forwarded as [`FieldEvent`] messages, and destroyed
//!   bodies are despawned

mod activity;
pub mod body;
pub mod config;
pub mod events;
pub mod field;
pub mod force;

use std::collections::HashMap;

use bevy::prelude::*;

pub use body::{BeltConstraint, BodyCapabilities, BodyId, BodyKind, BodySpawn, GravityBody, RailState};
pub use config::{ConfigError, GravityConfig};
pub use events::{DecayCause, FieldEvent, UnrailReason};
pub use field::{GravityField, Observer};

use crate::types::{OrbitSystemSet, SimulationTime};

/// Plugin running the gravity field in `FixedUpdate`.
///
/// A [`GravityConfig`] resource inserted before the plugin takes precedence
/// over the one it carries.
///
/// # Panics
/// When the configuration fails [`GravityConfig::validate`].
#[derive(Default)]
pub struct GravityPlugin {
    pub config: GravityConfig,
}

impl Plugin for GravityPlugin {
    fn build(&self, app: &mut App) {
        let config = app
            .world()
            .get_resource::<GravityConfig>()
            .cloned()
            .unwrap_or_else(|| self.config.clone());
        let field = match GravityField::initialize(config.clone()) {
            Ok(field) => field,
            Err(err) => panic!("invalid gravity configuration: {err}"),
        };

        app.insert_resource(config)
            .insert_resource(field)
            .init_resource::<OrbitEntities>()
            .init_resource::<SimulationTime>()
            .add_message::<FieldEvent>()
            .configure_sets(
                FixedUpdate,
                (
                    OrbitSystemSet::SyncCapabilities,
                    OrbitSystemSet::Step,
                    OrbitSystemSet::WriteBack,
                    OrbitSystemSet::AdvanceClock,
                )
                    .chain(),
            )
            .add_systems(
                Update,
                (
                    register_orbiters,
                    deregister_despawned,
                    periodic_sweep,
                    write_back_transforms,
                )
                    .chain(),
            )
            .add_systems(
                FixedUpdate,
                (
                    sync_capabilities.in_set(OrbitSystemSet::SyncCapabilities),
                    fixed_step.in_set(OrbitSystemSet::Step),
                    (write_back_transforms, forward_field_events)
                        .chain()
                        .in_set(OrbitSystemSet::WriteBack),
                ),
            );
    }
}

/// Request to put an entity under the gravity field.
///
/// The initial position is taken from the entity's `Transform` (local
/// coordinates).
#[derive(Component, Clone, Debug)]
pub struct Orbiter {
    pub kind: BodyKind,
    /// Mass in kilograms
    pub mass: f32,
    /// Cross-section area for drag, m²
    pub cross_section: f32,
    pub belt: Option<BeltConstraint>,
}

impl Orbiter {
    pub fn new(kind: BodyKind) -> Self {
        Self {
            kind,
            mass: 1000.0,
            cross_section: 10.0,
            belt: None,
        }
    }

    pub fn with_belt(mut self, belt: BeltConstraint) -> Self {
        self.belt = Some(belt);
        self
    }
}

/// Body id assigned once an [`Orbiter`] is registered.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrbitHandle(pub BodyId);

/// Marker: the entity is under its own propulsion.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Thrusting;

/// Marker: the entity has been interacted with; voids a belt constraint.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Touched;

/// Something that keeps nearby bodies simulated: a camera, a player.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct OrbitObserver {
    /// Entity whose body the observer rides, if any
    pub tracked: Option<Entity>,
}

/// Two-way mapping between entities and field bodies.
#[derive(Resource, Default, Debug)]
pub struct OrbitEntities {
    by_body: HashMap<BodyId, Entity>,
    by_entity: HashMap<Entity, BodyId>,
}

impl OrbitEntities {
    pub fn insert(&mut self, entity: Entity, body: BodyId) {
        self.by_body.insert(body, entity);
        self.by_entity.insert(entity, body);
    }

    pub fn entity(&self, body: BodyId) -> Option<Entity> {
        self.by_body.get(&body).copied()
    }

    pub fn body(&self, entity: Entity) -> Option<BodyId> {
        self.by_entity.get(&entity).copied()
    }

    pub fn remove_entity(&mut self, entity: Entity) -> Option<BodyId> {
        let body = self.by_entity.remove(&entity)?;
        self.by_body.remove(&body);
        Some(body)
    }

    pub fn remove_body(&mut self, body: BodyId) -> Option<Entity> {
        let entity = self.by_body.remove(&body)?;
        self.by_entity.remove(&entity);
        Some(entity)
    }

    pub fn len(&self) -> usize {
        self.by_body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_body.is_empty()
    }
}

fn observer_snapshot<'a>(
    observers: impl Iterator<Item = (&'a OrbitObserver, &'a Transform)>,
    entities: &OrbitEntities,
) -> Vec<Observer> {
    observers
        .map(|(observer, transform)| Observer {
            position: transform.translation.truncate(),
            tracked: observer.tracked.and_then(|entity| entities.body(entity)),
        })
        .collect()
}

fn register_orbiters(
    mut commands: Commands,
    mut field: ResMut<GravityField>,
    mut entities: ResMut<OrbitEntities>,
    orbiters: Query<(Entity, &Orbiter, &Transform), Without<OrbitHandle>>,
) {
    for (entity, orbiter, transform) in &orbiters {
        if entities.body(entity).is_some() {
            continue;
        }
        let spawn = BodySpawn::new(orbiter.kind, transform.translation.truncate())
            .with_mass(orbiter.mass)
            .with_cross_section(orbiter.cross_section);
        let id = field.add(spawn, orbiter.belt);
        entities.insert(entity, id);
        commands.entity(entity).insert(OrbitHandle(id));
    }
}

fn deregister_despawned(
    mut removed: RemovedComponents<OrbitHandle>,
    mut field: ResMut<GravityField>,
    mut entities: ResMut<OrbitEntities>,
) {
    for entity in removed.read() {
        if let Some(id) = entities.remove_entity(entity) {
            field.remove(id);
        }
    }
}

/// Frame-rate sweep: origin maintenance, altitude classification and
/// advisories. Observers that are not field bodies are moved with the origin
/// here; registered ones follow through the transform write-back.
fn periodic_sweep(
    time: Res<Time>,
    sim_time: Res<SimulationTime>,
    mut field: ResMut<GravityField>,
    entities: Res<OrbitEntities>,
    mut observers: Query<(&OrbitObserver, &mut Transform, Option<&OrbitHandle>)>,
) {
    let snapshot = observer_snapshot(
        observers
            .iter()
            .map(|(observer, transform, _)| (observer, transform)),
        &entities,
    );
    let Some(offset) = field.tick(sim_time.scaled(time.delta_secs_f64()), &snapshot) else {
        return;
    };

    for (_, mut transform, handle) in &mut observers {
        if handle.is_none() {
            transform.translation -= offset.extend(0.0);
        }
    }
}

fn sync_capabilities(
    mut field: ResMut<GravityField>,
    bodies: Query<(&OrbitHandle, Has<Thrusting>, Has<Touched>)>,
) {
    for (handle, thrusting, touched) in &bodies {
        if !field.contains(handle.0) {
            continue;
        }
        field.set_propulsion_active(handle.0, thrusting);
        if touched {
            field.touch(handle.0);
        }
    }
}

fn fixed_step(
    time: Res<Time>,
    sim_time: Res<SimulationTime>,
    mut field: ResMut<GravityField>,
    entities: Res<OrbitEntities>,
    observers: Query<(&OrbitObserver, &Transform)>,
) {
    let snapshot = observer_snapshot(observers.iter(), &entities);
    let dt = sim_time.scaled(time.delta_secs_f64());
    // The clock still reads the start of this step
    field.fixed_tick(dt, sim_time.current, &snapshot);
}

fn write_back_transforms(field: Res<GravityField>, mut bodies: Query<(&OrbitHandle, &mut Transform)>) {
    for (handle, mut transform) in &mut bodies {
        if !field.contains(handle.0) {
            continue;
        }
        if let Some(position) = field.position(handle.0) {
            transform.translation.x = position.x;
            transform.translation.y = position.y;
        }
    }
}

/// Forward queued field events as messages; destroyed bodies lose their
/// entity here.
fn forward_field_events(
    mut commands: Commands,
    mut field: ResMut<GravityField>,
    mut entities: ResMut<OrbitEntities>,
    mut writer: MessageWriter<FieldEvent>,
) {
    for event in field.drain_events() {
        if let FieldEvent::BodyDestroyed { body } = event
            && let Some(entity) = entities.remove_body(body)
        {
            commands.entity(entity).despawn();
        }
        writer.write(event);
    }
}
