//! The gravity field: single coordinator for every tracked body.
//!
//! Two cadences drive it:
//! - [`GravityField::fixed_tick`] once per physics step: analytic evaluation
//!   of bodies on rails, gravity for simulated ones, rail transitions and
//!   the per-body deorbit/despawn activities
//! - [`GravityField::tick`] every frame, running a sweep (floating origin,
//!   altitude classification, observer advisories) every few seconds
//!
//! Removals requested from inside an activity are deferred to the start of
//! the next fixed tick so the registry is never mutated while iterated.
//!
//! Events queue up until [`GravityField::drain_events`] takes them. The
//! plugin drains after every fixed step; code driving the field directly
//! must drain it too, or the queue grows without bound.

use std::collections::BTreeMap;

use bevy::log::{debug, info, warn};
use bevy::math::{DVec2, Vec2};
use bevy::prelude::Resource;

use super::activity::{Activity, ActivityStatus, DeorbitTask, DespawnTask};
use super::body::{BeltConstraint, BodyId, BodySpawn, GravityBody, PhysicsState};
use super::config::{ConfigError, GravityConfig, Thresholds};
use super::events::{DecayCause, FieldEvent, UnrailReason};
use super::force::gravity_acceleration;
use crate::coordinates::{exceeds_axis_limit, to_global, to_local};
use crate::orbit::{OrbitalElements, StateVector, apsides, circular_velocity};

/// Anything whose proximity keeps nearby bodies simulated.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Observer {
    /// Position in local coordinates
    pub position: Vec2,
    /// Body the observer is riding, if any
    pub tracked: Option<BodyId>,
}

/// Pre-force state captured for rail decisions.
struct Snapshot {
    id: BodyId,
    local: Vec2,
    velocity: DVec2,
}

#[derive(Resource, Debug)]
pub struct GravityField {
    config: GravityConfig,
    thresholds: Thresholds,
    mu: f64,
    /// Global position of the local origin
    origin: DVec2,
    bodies: BTreeMap<BodyId, GravityBody>,
    activities: Vec<(BodyId, Activity)>,
    pending_removals: Vec<BodyId>,
    next_id: u64,
    sweep_timer: f64,
    origin_shifted: bool,
    /// Simulation time every body has been advanced to
    time: f64,
    /// Undrained events, oldest first
    events: Vec<FieldEvent>,
}

impl GravityField {
    /// Validate `config` and build an empty field.
    ///
    /// # Errors
    /// [`ConfigError`] when a threshold is unusable.
    pub fn initialize(config: GravityConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let thresholds = Thresholds::from(&config);
        let mu = config.mu();
        let origin = config.initial_origin;
        info!("gravity field initialized: mu = {mu:.4e}, origin = {origin}");

        Ok(Self {
            config,
            thresholds,
            mu,
            origin,
            bodies: BTreeMap::new(),
            activities: Vec::new(),
            pending_removals: Vec::new(),
            next_id: 0,
            sweep_timer: 0.0,
            origin_shifted: false,
            time: 0.0,
            events: Vec::new(),
        })
    }

    pub fn config(&self) -> &GravityConfig {
        &self.config
    }

    /// Gravitational parameter of the central mass.
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Simulation time every body has been advanced to: the end of the
    /// latest fixed tick.
    pub fn time(&self) -> f64 {
        self.time
    }

    // ---- registry ----

    /// Register a body, starting it on a circular orbit through its position.
    pub fn add(&mut self, spawn: BodySpawn, belt: Option<BeltConstraint>) -> BodyId {
        let id = BodyId(self.next_id);
        self.next_id += 1;

        let global = to_global(spawn.position, self.origin);
        let physics = PhysicsState {
            position: spawn.position,
            velocity: circular_velocity(global, self.mu).as_vec2(),
            mass: spawn.mass,
            cross_section: spawn.cross_section,
            integrating: true,
        };
        self.bodies
            .insert(id, GravityBody::new(spawn.kind.capabilities(), physics, belt));
        debug!("registered {id} ({:?}) at {global}", spawn.kind);
        id
    }

    /// Deregister a body along with its activity and any pending removal.
    ///
    /// Returns false (with a warning) for an unknown body.
    pub fn remove(&mut self, id: BodyId) -> bool {
        self.activities.retain(|(owner, _)| *owner != id);
        self.pending_removals.retain(|pending| *pending != id);
        if self.bodies.remove(&id).is_some() {
            debug!("deregistered {id}");
            true
        } else {
            warn!("remove: unknown body {id}");
            false
        }
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Registered ids in ascending order.
    pub fn body_ids(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.bodies.keys().copied()
    }

    fn lookup(&self, id: BodyId) -> Option<&GravityBody> {
        let body = self.bodies.get(&id);
        if body.is_none() {
            warn!("unknown body {id}");
        }
        body
    }

    fn lookup_mut(&mut self, id: BodyId) -> Option<&mut GravityBody> {
        match self.bodies.get_mut(&id) {
            Some(body) => Some(body),
            None => {
                warn!("unknown body {id}");
                None
            }
        }
    }

    pub fn body(&self, id: BodyId) -> Option<&GravityBody> {
        self.lookup(id)
    }

    // ---- per-body queries ----

    /// Local position.
    pub fn position(&self, id: BodyId) -> Option<Vec2> {
        self.lookup(id).map(|body| body.physics().position)
    }

    pub fn global_position(&self, id: BodyId) -> Option<DVec2> {
        self.lookup(id).map(|body| body.global_position(self.origin))
    }

    pub fn velocity(&self, id: BodyId) -> Option<Vec2> {
        self.lookup(id).map(|body| body.physics().velocity)
    }

    pub fn heating(&self, id: BodyId) -> Option<f32> {
        self.lookup(id).map(GravityBody::heating)
    }

    pub fn is_decaying(&self, id: BodyId) -> bool {
        self.lookup(id).is_some_and(GravityBody::is_decaying)
    }

    pub fn is_on_rails(&self, id: BodyId) -> bool {
        self.lookup(id).is_some_and(GravityBody::is_on_rails)
    }

    /// Cached elements of a body on rails.
    pub fn elements(&self, id: BodyId) -> Option<&OrbitalElements> {
        self.lookup(id).and_then(GravityBody::elements)
    }

    // ---- control ----

    /// Hand a body to an external collaborator (docking, construction).
    ///
    /// Returns whether the body was on rails.
    pub fn request_unrail(&mut self, id: BodyId) -> bool {
        let now = self.time;
        let Some(body) = self.lookup_mut(id) else {
            return false;
        };
        if !body.is_on_rails() {
            return false;
        }
        body.unrail(now);
        debug!("{id} released from rails on request");
        self.events.push(FieldEvent::RailReleased {
            body: id,
            reason: UnrailReason::Requested,
        });
        true
    }

    /// Change a body's velocity, taking it off rails first.
    pub fn apply_impulse(&mut self, id: BodyId, delta_v: DVec2) {
        self.request_unrail(id);
        if let Some(body) = self.lookup_mut(id) {
            body.physics.apply_velocity_change(delta_v.as_vec2());
        }
    }

    pub fn set_propulsion_active(&mut self, id: BodyId, active: bool) {
        if let Some(body) = self.lookup_mut(id) {
            body.set_propulsion_active(active);
        }
    }

    /// Mark a body as interacted with, voiding its belt constraint.
    pub fn touch(&mut self, id: BodyId) {
        if let Some(body) = self.lookup_mut(id) {
            body.touch();
        }
    }

    // ---- coordinates ----

    /// Global position of the local origin.
    pub fn origin(&self) -> DVec2 {
        self.origin
    }

    pub fn to_local(&self, global: DVec2) -> Vec2 {
        to_local(global, self.origin)
    }

    pub fn to_global(&self, local: Vec2) -> DVec2 {
        to_global(local, self.origin)
    }

    /// Whether the sweep of the current frame moved the origin.
    pub fn did_origin_shift_this_tick(&self) -> bool {
        self.origin_shifted
    }

    // ---- orbital summaries ----

    /// Periapsis and apoapsis radii; apoapsis is infinite when unbound.
    fn apsides_of(&self, id: BodyId) -> Option<(f64, f64)> {
        let body = self.lookup(id)?;
        if let Some(elements) = body.elements() {
            return Some((elements.periapsis(), elements.apoapsis()));
        }
        let position = body.global_position(self.origin);
        let velocity = body.physics().velocity.as_dvec2();
        let (periapsis, apoapsis) = apsides(position, velocity, self.mu);
        Some((periapsis, apoapsis.unwrap_or(f64::INFINITY)))
    }

    /// Closest approach to the centre of the central mass.
    pub fn periapsis_altitude(&self, id: BodyId) -> Option<f64> {
        self.apsides_of(id).map(|(periapsis, _)| periapsis)
    }

    /// Farthest distance from the centre; `f64::INFINITY` while escaping.
    pub fn apoapsis_altitude(&self, id: BodyId) -> Option<f64> {
        self.apsides_of(id).map(|(_, apoapsis)| apoapsis)
    }

    /// Predicted velocity at `time` along the body's current orbit.
    ///
    /// `None` for unknown bodies and orbits with no elements.
    pub fn velocity_at(&self, id: BodyId, time: f64) -> Option<DVec2> {
        let body = self.lookup(id)?;
        let result = match body.elements() {
            Some(elements) => elements.velocity_at(time),
            None => OrbitalElements::from_state(
                body.global_position(self.origin),
                body.physics().velocity.as_dvec2(),
                self.time,
                self.mu,
            )
            .and_then(|elements| elements.velocity_at(time)),
        };
        match result {
            Ok(velocity) => Some(velocity),
            Err(err) => {
                debug!("no velocity prediction for {id}: {err}");
                None
            }
        }
    }

    /// Take every event queued since the last drain.
    ///
    /// Nothing else empties the queue.
    pub fn drain_events(&mut self) -> Vec<FieldEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- fixed step ----

    /// Advance every body by one physics step from simulation time `now` to
    /// `now + dt`.
    ///
    /// `now` is the instant the previous step ended at ([`Self::time`]).
    /// Bodies on rails are evaluated at `now + dt`; simulated ones integrate
    /// from their state at `now`, so both kinds end the tick at the same
    /// instant.
    pub fn fixed_tick(&mut self, dt: f64, now: f64, observers: &[Observer]) {
        self.flush_removals();
        if dt <= 0.0 {
            self.time = now;
            return;
        }
        let end = now + dt;

        self.evaluate_rails(now, end);

        let snapshot: Vec<Snapshot> = self
            .bodies
            .iter()
            .map(|(id, body)| Snapshot {
                id: *id,
                local: body.physics().position,
                velocity: body.physics().velocity.as_dvec2(),
            })
            .collect();

        self.apply_gravity(dt);
        self.update_rail_states(&snapshot, now, end, observers);
        self.advance_activities(dt, observers);
        self.time = end;
    }

    fn flush_removals(&mut self) {
        for id in std::mem::take(&mut self.pending_removals) {
            if self.bodies.remove(&id).is_some() {
                debug!("removed destroyed {id}");
            }
        }
    }

    /// Write the analytic state at `end` for bodies on rails. A solver
    /// failure leaves the body at its state for `now` and hands it to this
    /// tick's integration.
    fn evaluate_rails(&mut self, now: f64, end: f64) {
        let origin = self.origin;
        for (id, body) in &mut self.bodies {
            match body.evaluate(end) {
                Some(Ok(state)) => {
                    body.physics.position = to_local(state.position, origin);
                    body.physics.velocity = state.velocity.as_vec2();
                }
                Some(Err(err)) => {
                    warn!("{id} forced off rails: {err}");
                    body.unrail(now);
                    self.events.push(FieldEvent::RailReleased {
                        body: *id,
                        reason: UnrailReason::SolverFailure,
                    });
                }
                None => {}
            }
        }
    }

    fn apply_gravity(&mut self, dt: f64) {
        let origin = self.origin;
        for body in self.bodies.values_mut().filter(|body| !body.is_on_rails()) {
            let acceleration = gravity_acceleration(body.global_position(origin), self.mu);
            body.physics.apply_velocity_change((acceleration * dt).as_vec2());
            body.physics.integrate(dt as f32);
        }
    }

    /// Hysteresis transitions. Railing uses the pre-force snapshot, which is
    /// the state at `now`; unrailing happens after rails were evaluated at
    /// `end`.
    fn update_rail_states(&mut self, snapshot: &[Snapshot], now: f64, end: f64, observers: &[Observer]) {
        for entry in snapshot {
            let Some(body) = self.bodies.get_mut(&entry.id) else {
                continue;
            };
            let distance_sq = nearest_observer_distance_sq(entry.local, observers);

            if body.is_on_rails() {
                let reason = if distance_sq < self.thresholds.unrail_sq {
                    UnrailReason::ObserverNearby
                } else if body.is_propulsion_active() {
                    UnrailReason::Propulsion
                } else {
                    continue;
                };
                body.unrail(end);
                debug!("{} off rails: {reason:?}", entry.id);
                self.events.push(FieldEvent::RailReleased {
                    body: entry.id,
                    reason,
                });
            } else if distance_sq > self.thresholds.onrail_sq && body.can_rail() {
                let state = StateVector {
                    position: to_global(entry.local, self.origin),
                    velocity: entry.velocity,
                };
                match body.rail(state, now, self.mu, self.config.max_altitude) {
                    Ok(()) => {
                        debug!("{} on rails", entry.id);
                        self.events.push(FieldEvent::RailEngaged { body: entry.id });
                    }
                    // Retried next tick
                    Err(err) => debug!("{} stays off rails: {err}", entry.id),
                }
            }
        }
    }

    fn advance_activities(&mut self, dt: f64, observers: &[Observer]) {
        let activities = std::mem::take(&mut self.activities);
        let mut running = Vec::with_capacity(activities.len());

        for (id, mut activity) in activities {
            let Some(body) = self.bodies.get_mut(&id) else {
                continue;
            };
            let global = body.global_position(self.origin);
            let status = activity.advance(body, global, dt, &self.config, &self.thresholds);
            match status {
                ActivityStatus::Running => running.push((id, activity)),
                ActivityStatus::Recovered => self.cancel_decay(id),
                ActivityStatus::Expired => self.expire(id, observers),
            }
        }

        running.append(&mut self.activities);
        self.activities = running;
    }

    fn cancel_decay(&mut self, id: BodyId) {
        if let Some(body) = self.bodies.get_mut(&id) {
            body.decaying = false;
        }
        info!("{id} climbed out of the atmosphere");
        self.events.push(FieldEvent::DecayCancelled { body: id });
    }

    fn expire(&mut self, id: BodyId, observers: &[Observer]) {
        if observers.iter().any(|observer| observer.tracked == Some(id)) {
            if let Some(body) = self.bodies.get_mut(&id) {
                body.decaying = false;
                body.heating = 0.0;
            }
            info!("{id} lost with its observer aboard");
            self.events.push(FieldEvent::ObserverKilled { body: id });
        } else {
            info!("{id} destroyed");
            self.pending_removals.push(id);
            self.events.push(FieldEvent::BodyDestroyed { body: id });
        }
    }

    // ---- periodic sweep ----

    /// Per-frame update; runs [`Self::sweep`] every `sweep_interval`
    /// simulated seconds and returns the origin offset if it moved.
    pub fn tick(&mut self, dt: f64, observers: &[Observer]) -> Option<Vec2> {
        self.origin_shifted = false;
        self.sweep_timer += dt;
        if self.sweep_timer < self.config.sweep_interval {
            return None;
        }
        self.sweep_timer = 0.0;
        self.sweep(observers)
    }

    /// Origin maintenance, altitude classification and observer advisories.
    ///
    /// Returns the offset the origin moved by, if any. Observer positions are
    /// not adjusted; the caller owns them.
    pub fn sweep(&mut self, observers: &[Observer]) -> Option<Vec2> {
        let shift = self.maintain_origin(observers);
        self.classify_altitudes();
        self.advise_observers(observers);
        shift
    }

    fn maintain_origin(&mut self, observers: &[Observer]) -> Option<Vec2> {
        let nearest = observers.iter().min_by(|a, b| {
            a.position
                .length_squared()
                .total_cmp(&b.position.length_squared())
        })?;
        if !exceeds_axis_limit(nearest.position, self.config.max_local_coordinate) {
            return None;
        }
        let offset = nearest.position;
        self.shift_origin(offset);
        Some(offset)
    }

    /// Move the origin by `offset` (local coordinates) and re-base every
    /// body's local position.
    pub fn shift_origin(&mut self, offset: Vec2) {
        self.origin += offset.as_dvec2();
        for body in self.bodies.values_mut() {
            body.physics.position -= offset;
        }
        self.origin_shifted = true;
        info!("origin shifted by {offset}, now {}", self.origin);
        self.events.push(FieldEvent::OriginShifted {
            offset: offset.as_dvec2(),
        });
    }

    fn classify_altitudes(&mut self) {
        let origin = self.origin;
        for (id, body) in &mut self.bodies {
            if body.is_on_rails() || body.decaying || self.pending_removals.contains(id) {
                continue;
            }
            let r_sq = body.global_position(origin).length_squared();

            let (cause, activity) = if r_sq < self.thresholds.atmosphere_sq {
                (
                    DecayCause::AtmosphereEntry,
                    Activity::Deorbit(DeorbitTask::default()),
                )
            } else if r_sq > self.thresholds.max_altitude_sq {
                (
                    DecayCause::BeyondMaxAltitude,
                    Activity::Despawn(DespawnTask::new(self.config.despawn_duration)),
                )
            } else if body.has_belt_constraint() && body.belt().is_some_and(|belt| !belt.contains_squared(r_sq)) {
                (
                    DecayCause::LeftBelt,
                    Activity::Despawn(DespawnTask::new(self.config.despawn_duration)),
                )
            } else {
                continue;
            };

            body.decaying = true;
            info!("{id} decaying: {cause:?}");
            self.activities.push((*id, activity));
            self.events.push(FieldEvent::DecayStarted { body: *id, cause });
        }
    }

    fn advise_observers(&mut self, observers: &[Observer]) {
        let margin = self.config.advisory_margin;
        let periapsis_floor = self.config.atmosphere_radius * (1.0 + margin);
        let apoapsis_ceiling = self.config.max_altitude * (1.0 - margin);

        for id in observers.iter().filter_map(|observer| observer.tracked) {
            let Some((periapsis, apoapsis)) = self.apsides_of(id) else {
                continue;
            };
            if periapsis < periapsis_floor {
                self.events.push(FieldEvent::PeriapsisAdvisory { body: id, periapsis });
            }
            if apoapsis > apoapsis_ceiling {
                self.events.push(FieldEvent::ApoapsisAdvisory { body: id, apoapsis });
            }
        }
    }
}

/// Squared distance to the closest observer; infinite with none.
fn nearest_observer_distance_sq(local: Vec2, observers: &[Observer]) -> f64 {
    observers
        .iter()
        .map(|observer| (observer.position.as_dvec2() - local.as_dvec2()).length_squared())
        .fold(f64::INFINITY, f64::min)
}
