//! Classical orbital elements derived from a state vector.
//!
//! The orbit is modelled as a parametric ellipse around its own center:
//!
//! ```text
//! p(E) = center + R(φ) · (a·cos E, b·sin E)
//! ```
//!
//! where `center` is relative to the central mass (the focus), `φ` is the
//! rotation of the major axis from the reference axis and `E` is the
//! eccentric anomaly. Clockwise orbits run the same ellipse with time
//! negated, so `E` decreases as time advances.

use std::f64::consts::TAU;

use bevy::math::DVec2;

use super::OrbitError;
use super::kepler::KeplerSolver;
use super::vector::{PlanarExt, REFERENCE_AXIS};

/// Below this eccentricity an orbit is treated as circular.
pub const CIRCULAR_ECCENTRICITY: f64 = 0.01;

/// At or above this eccentricity (parabolic/hyperbolic) no elements exist.
pub const MAX_ECCENTRICITY: f64 = 0.99;

/// Direction a body travels around the central mass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RotationSense {
    Clockwise,
    CounterClockwise,
}

impl RotationSense {
    /// +1 for counter-clockwise, -1 for clockwise.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            RotationSense::Clockwise => -1.0,
            RotationSense::CounterClockwise => 1.0,
        }
    }
}

/// Position and velocity relative to the central mass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StateVector {
    pub position: DVec2,
    pub velocity: DVec2,
}

/// Snapshot of a body's orbit, valid for eccentricity in [0, 0.99).
#[derive(Clone, Debug)]
pub struct OrbitalElements {
    /// Specific orbital energy ε = v²/2 - μ/r (J/kg)
    pub energy: f64,
    /// Eccentricity magnitude
    pub eccentricity: f64,
    /// Semi-major axis in meters
    pub semi_major_axis: f64,
    /// Semi-minor axis in meters
    pub semi_minor_axis: f64,
    /// Rotation of the major axis from the reference axis, radians
    pub rotation: f64,
    /// Mean anomaly at `epoch`, radians
    pub initial_mean_anomaly: f64,
    /// Ellipse center relative to the central mass
    pub center: DVec2,
    /// Orbital period in seconds
    pub period: f64,
    pub sense: RotationSense,
    /// Reference time t0 the elements were derived at
    pub epoch: f64,
    solver: KeplerSolver,
}

impl OrbitalElements {
    /// Derive elements from a state vector relative to the central mass.
    ///
    /// Only rejects a center that is not finite; see [`Self::from_state_within`]
    /// to bound it.
    ///
    /// # Errors
    /// - [`OrbitError::DegenerateOrbit`] for eccentricity ≥ 0.99 (or a state
    ///   that yields no finite eccentricity)
    /// - [`OrbitError::InvalidOrbitCenter`] when the center overflows
    pub fn from_state(position: DVec2, velocity: DVec2, epoch: f64, mu: f64) -> Result<Self, OrbitError> {
        Self::from_state_within(position, velocity, epoch, mu, f64::INFINITY)
    }

    /// Derive elements, rejecting orbits whose center lies farther than
    /// `max_center` from the central mass.
    ///
    /// The center sits a·e from the focus and the apoapsis a·(1 + e), so an
    /// orbit rejected here always reaches beyond `max_center`.
    ///
    /// # Errors
    /// As [`Self::from_state`], plus [`OrbitError::InvalidOrbitCenter`] past
    /// the bound.
    pub fn from_state_within(
        position: DVec2,
        velocity: DVec2,
        epoch: f64,
        mu: f64,
        max_center: f64,
    ) -> Result<Self, OrbitError> {
        let r = position.length();
        let v_squared = velocity.length_squared();

        let sense = if velocity.dot(position.perpendicular()) < 0.0 {
            RotationSense::Clockwise
        } else {
            RotationSense::CounterClockwise
        };

        let energy = 0.5 * v_squared - mu / r;
        let e_vec = eccentricity_vector(position, velocity, mu);
        let eccentricity = e_vec.length();

        // NaN shows up for a zero radius
        if eccentricity.is_nan() || eccentricity >= MAX_ECCENTRICITY || energy.is_nan() || energy >= 0.0 {
            return Err(OrbitError::DegenerateOrbit { eccentricity });
        }

        // Circular orbits use the same propagation with e = 0; the solver's
        // shortcut must not swallow the low end of the elliptical band.
        let solver = KeplerSolver::default().with_circular_threshold(CIRCULAR_ECCENTRICITY);

        let elements = if eccentricity < CIRCULAR_ECCENTRICITY {
            // The reference axis stands in for the periapsis direction
            let anomaly = REFERENCE_AXIS.angle_to_ccw(position);
            Self {
                energy,
                eccentricity,
                semi_major_axis: r,
                semi_minor_axis: r,
                rotation: 0.0,
                initial_mean_anomaly: anomaly,
                center: DVec2::ZERO,
                period: TAU * (r * r * r / mu).sqrt(),
                sense,
                epoch,
                solver,
            }
        } else {
            let a = -mu / (2.0 * energy);
            let b = a * (1.0 - eccentricity * eccentricity).sqrt();
            let rotation = REFERENCE_AXIS.angle_to_ccw(e_vec);

            let true_anomaly = e_vec.angle_to_ccw(position);
            let half = true_anomaly / 2.0;
            let e_anomaly = 2.0
                * ((1.0 - eccentricity).sqrt() * half.sin()).atan2((1.0 + eccentricity).sqrt() * half.cos());
            let initial_mean_anomaly = (e_anomaly - eccentricity * e_anomaly.sin()).rem_euclid(TAU);

            let center = position - ellipse_offset(a, b, rotation, e_anomaly);

            Self {
                energy,
                eccentricity,
                semi_major_axis: a,
                semi_minor_axis: b,
                rotation,
                initial_mean_anomaly,
                center,
                period: TAU * (a * a * a / mu).sqrt(),
                sense,
                epoch,
                solver,
            }
        };

        elements.validate_center(max_center)?;
        Ok(elements)
    }

    fn validate_center(&self, max_center: f64) -> Result<(), OrbitError> {
        let c = self.center;
        if c.is_finite() && c.length() <= max_center && self.period.is_finite() {
            Ok(())
        } else {
            Err(OrbitError::InvalidOrbitCenter { x: c.x, y: c.y })
        }
    }

    /// Same orbit propagated with a different Kepler solver.
    #[cfg(test)]
    pub(crate) fn with_solver(self, solver: KeplerSolver) -> Self {
        Self { solver, ..self }
    }

    /// Whether the orbit was derived through the circular branch.
    pub fn is_circular(&self) -> bool {
        self.eccentricity < CIRCULAR_ECCENTRICITY
    }

    /// Eccentricity used for propagation (zero for circular orbits).
    fn propagation_eccentricity(&self) -> f64 {
        if self.is_circular() { 0.0 } else { self.eccentricity }
    }

    /// Mean anomaly at `time`, normalized to [0, 2π).
    pub fn mean_anomaly_at(&self, time: f64) -> f64 {
        let dt = (time - self.epoch) * self.sense.sign();
        (self.initial_mean_anomaly + TAU * dt / self.period).rem_euclid(TAU)
    }

    /// Position and velocity relative to the central mass at `time`.
    ///
    /// # Errors
    /// [`OrbitError::NonConvergence`] if Kepler's equation cannot be solved.
    pub fn state_at(&self, time: f64) -> Result<StateVector, OrbitError> {
        let e = self.propagation_eccentricity();
        let e_anomaly = self.solver.solve(self.mean_anomaly_at(time), e)?;
        let (a, b) = (self.semi_major_axis, self.semi_minor_axis);

        let position = self.center + ellipse_offset(a, b, self.rotation, e_anomaly);

        // dE/dt = 2π / (T·(1 - e·cos E)), negated when running clockwise
        let e_rate = self.sense.sign() * TAU / (self.period * (1.0 - e * e_anomaly.cos()));
        let (sin_e, cos_e) = e_anomaly.sin_cos();
        let velocity = DVec2::new(-a * sin_e, b * cos_e).rotated(self.rotation) * e_rate;

        Ok(StateVector { position, velocity })
    }

    /// Position relative to the central mass at `time`.
    pub fn position_at(&self, time: f64) -> Result<DVec2, OrbitError> {
        self.state_at(time).map(|s| s.position)
    }

    /// Velocity at `time`.
    pub fn velocity_at(&self, time: f64) -> Result<DVec2, OrbitError> {
        self.state_at(time).map(|s| s.velocity)
    }

    /// Closest distance to the central mass.
    pub fn periapsis(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.propagation_eccentricity())
    }

    /// Farthest distance from the central mass.
    pub fn apoapsis(&self) -> f64 {
        self.semi_major_axis * (1.0 + self.propagation_eccentricity())
    }
}

/// Offset from the ellipse center at eccentric anomaly `e_anomaly`.
#[inline]
fn ellipse_offset(a: f64, b: f64, rotation: f64, e_anomaly: f64) -> DVec2 {
    let (sin_e, cos_e) = e_anomaly.sin_cos();
    DVec2::new(a * cos_e, b * sin_e).rotated(rotation)
}

/// Eccentricity vector, pointing at periapsis with magnitude |e|.
#[inline]
pub fn eccentricity_vector(position: DVec2, velocity: DVec2, mu: f64) -> DVec2 {
    let r = position.length();
    position * (velocity.length_squared() / mu - 1.0 / r) - velocity * (position.dot(velocity) / mu)
}

/// Periapsis and apoapsis radii of any conic through the state vector.
///
/// Works for orbits no [`OrbitalElements`] exist for; the apoapsis is
/// `None` once the trajectory is unbound.
pub fn apsides(position: DVec2, velocity: DVec2, mu: f64) -> (f64, Option<f64>) {
    let e = eccentricity_vector(position, velocity, mu).length();
    let h = position.perp_dot(velocity);
    let semi_latus_rectum = h * h / mu;
    let periapsis = semi_latus_rectum / (1.0 + e);
    let apoapsis = (e < 1.0).then(|| semi_latus_rectum / (1.0 - e));
    (periapsis, apoapsis)
}

/// Velocity for a circular counter-clockwise orbit through `position`.
pub fn circular_velocity(position: DVec2, mu: f64) -> DVec2 {
    let r = position.length();
    if r == 0.0 {
        return DVec2::ZERO;
    }
    position.perpendicular() / r * (mu / r).sqrt()
}
