//! Per-body rail state machine.
//!
//! A body starts off rails (simulated). Railing swaps force integration for
//! analytic evaluation of cached orbital elements; unrailing injects the
//! analytic velocity back into the physics state so there is no velocity
//! discontinuity.

use std::fmt;

use bevy::log::{debug, warn};
use bevy::math::{DVec2, Vec2};

use crate::orbit::{OrbitError, OrbitalElements, StateVector};

/// Handle of a body registered with the gravity field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BodyId(pub(crate) u64);

impl BodyId {
    /// Raw numeric value, stable for the lifetime of the field.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// Altitude band an untouched object must stay within.
///
/// Radii are measured from the centre of the central mass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeltConstraint {
    pub min_radius: f64,
    pub max_radius: f64,
}

impl BeltConstraint {
    /// Band between two radii, in either order.
    pub fn new(a: f64, b: f64) -> Self {
        Self {
            min_radius: a.min(b),
            max_radius: a.max(b),
        }
    }

    /// Whether a squared distance from the central mass lies in the band.
    #[inline]
    pub fn contains_squared(&self, distance_sq: f64) -> bool {
        distance_sq >= self.min_radius * self.min_radius && distance_sq <= self.max_radius * self.max_radius
    }
}

/// Capability queries answered per body kind.
///
/// The field never asks what a body *is*, only what it can do.
pub trait BodyCapabilities: Send + Sync + fmt::Debug {
    /// Whether the body is currently under its own propulsion.
    fn is_propulsion_active(&self) -> bool {
        false
    }

    /// Toggle propulsion. Kinds without engines ignore this.
    fn set_propulsion_active(&mut self, _active: bool) {}

    /// Whether the kind can be confined to an altitude band.
    fn accepts_belt_constraint(&self) -> bool {
        false
    }
}

/// Player or AI ship: has engines, never belt-confined.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ship {
    pub thrusting: bool,
}

impl BodyCapabilities for Ship {
    fn is_propulsion_active(&self) -> bool {
        self.thrusting
    }

    fn set_propulsion_active(&mut self, active: bool) {
        self.thrusting = active;
    }
}

/// Belt object: no engines, may be confined to a band until touched.
#[derive(Clone, Copy, Debug, Default)]
pub struct Asteroid;

impl BodyCapabilities for Asteroid {
    fn accepts_belt_constraint(&self) -> bool {
        true
    }
}

/// Passive structure.
#[derive(Clone, Copy, Debug, Default)]
pub struct Station;

impl BodyCapabilities for Station {}

/// Kind selector used when registering a body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BodyKind {
    #[default]
    Ship,
    Asteroid,
    Station,
}

impl BodyKind {
    /// Fresh capability object for this kind.
    pub fn capabilities(self) -> Box<dyn BodyCapabilities> {
        match self {
            BodyKind::Ship => Box::new(Ship::default()),
            BodyKind::Asteroid => Box::new(Asteroid),
            BodyKind::Station => Box::new(Station),
        }
    }
}

/// Single-precision physics state in local coordinates.
#[derive(Clone, Debug)]
pub struct PhysicsState {
    /// Position relative to the floating origin
    pub position: Vec2,
    pub velocity: Vec2,
    /// Mass in kilograms
    pub mass: f32,
    /// Cross-section area for drag, m²
    pub cross_section: f32,
    /// Whether forces are integrated (false while on rails)
    pub integrating: bool,
}

impl PhysicsState {
    /// Apply a velocity change (already scaled by the timestep).
    #[inline]
    pub fn apply_velocity_change(&mut self, delta: Vec2) {
        self.velocity += delta;
    }

    /// Semi-implicit Euler position update; no-op while not integrating.
    #[inline]
    pub fn integrate(&mut self, dt: f32) {
        if self.integrating {
            self.position += self.velocity * dt;
        }
    }
}

/// Everything needed to register a body with the field.
#[derive(Clone, Debug)]
pub struct BodySpawn {
    pub kind: BodyKind,
    /// Position in local coordinates
    pub position: Vec2,
    pub mass: f32,
    pub cross_section: f32,
}

impl BodySpawn {
    /// Spawn description with a default mass (1 t) and cross-section (10 m²).
    pub fn new(kind: BodyKind, position: Vec2) -> Self {
        Self {
            kind,
            position,
            mass: 1000.0,
            cross_section: 10.0,
        }
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_cross_section(mut self, cross_section: f32) -> Self {
        self.cross_section = cross_section;
        self
    }
}

/// Whether a body is simulated or evaluated analytically.
#[derive(Clone, Debug, Default)]
pub enum RailState {
    #[default]
    OffRails,
    OnRails(OrbitalElements),
}

/// A physics-driven body tracked by the gravity field.
#[derive(Debug)]
pub struct GravityBody {
    rail: RailState,
    pub(crate) decaying: bool,
    belt: Option<BeltConstraint>,
    touched: bool,
    capabilities: Box<dyn BodyCapabilities>,
    pub(crate) physics: PhysicsState,
    pub(crate) heating: f32,
}

impl GravityBody {
    /// New body, off rails. A belt is dropped for kinds that cannot hold one.
    pub fn new(capabilities: Box<dyn BodyCapabilities>, physics: PhysicsState, belt: Option<BeltConstraint>) -> Self {
        let belt = match belt {
            Some(band) if !capabilities.accepts_belt_constraint() => {
                warn!("ignoring belt constraint {band:?} for {capabilities:?}");
                None
            }
            other => other,
        };
        Self {
            rail: RailState::OffRails,
            decaying: false,
            belt,
            touched: false,
            capabilities,
            physics,
            heating: 0.0,
        }
    }

    pub fn rail_state(&self) -> &RailState {
        &self.rail
    }

    pub fn is_on_rails(&self) -> bool {
        matches!(self.rail, RailState::OnRails(_))
    }

    /// Cached elements while on rails.
    pub fn elements(&self) -> Option<&OrbitalElements> {
        match &self.rail {
            RailState::OnRails(elements) => Some(elements),
            RailState::OffRails => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn elements_mut(&mut self) -> Option<&mut OrbitalElements> {
        match &mut self.rail {
            RailState::OnRails(elements) => Some(elements),
            RailState::OffRails => None,
        }
    }

    pub fn is_decaying(&self) -> bool {
        self.decaying
    }

    pub fn is_touched(&self) -> bool {
        self.touched
    }

    /// Mark the body as interacted with; voids its belt constraint.
    pub fn touch(&mut self) {
        self.touched = true;
    }

    /// Belt band still in force (set and not yet touched).
    pub fn has_belt_constraint(&self) -> bool {
        self.belt.is_some() && !self.touched
    }

    pub fn belt(&self) -> Option<BeltConstraint> {
        self.belt
    }

    pub fn is_propulsion_active(&self) -> bool {
        self.capabilities.is_propulsion_active()
    }

    pub fn set_propulsion_active(&mut self, active: bool) {
        self.capabilities.set_propulsion_active(active);
    }

    pub fn physics(&self) -> &PhysicsState {
        &self.physics
    }

    /// Visual heating intensity in [0, 1] while deorbiting.
    pub fn heating(&self) -> f32 {
        self.heating
    }

    /// Guards for railing other than observer distance.
    pub fn can_rail(&self) -> bool {
        !self.is_on_rails() && !self.decaying && !self.is_propulsion_active()
    }

    /// Put the body on rails from a global state vector at `now`.
    ///
    /// `max_center` bounds the orbit center's distance from the central mass.
    ///
    /// # Errors
    /// Any [`OrbitError`] from the element derivation; the body then stays
    /// off rails.
    pub fn rail(&mut self, state: StateVector, now: f64, mu: f64, max_center: f64) -> Result<(), OrbitError> {
        let elements = OrbitalElements::from_state_within(state.position, state.velocity, now, mu, max_center)?;
        self.rail = RailState::OnRails(elements);
        self.physics.integrating = false;
        Ok(())
    }

    /// Analytic state at `now`, or `None` while off rails.
    pub fn evaluate(&self, now: f64) -> Option<Result<StateVector, OrbitError>> {
        self.elements().map(|elements| elements.state_at(now))
    }

    /// Take the body off rails, injecting the analytic velocity at `now`.
    ///
    /// When the velocity cannot be evaluated the last written velocity is
    /// kept. No-op for a body already off rails.
    pub fn unrail(&mut self, now: f64) {
        let RailState::OnRails(elements) = std::mem::take(&mut self.rail) else {
            return;
        };
        match elements.velocity_at(now) {
            Ok(velocity) => self.physics.velocity = velocity.as_vec2(),
            Err(err) => debug!("keeping last velocity on unrail: {err}"),
        }
        self.physics.integrating = true;
    }

    /// Global position of this body for a given floating origin.
    pub fn global_position(&self, origin: DVec2) -> DVec2 {
        crate::coordinates::to_global(self.physics.position, origin)
    }
}
