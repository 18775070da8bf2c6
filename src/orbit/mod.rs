//! Two-body orbital mechanics around a single fixed central mass.
//!
//! Everything here is planar and double precision:
//! - `vector`: small helpers on top of `DVec2`
//! - `kepler`: Newton-Raphson solver for Kepler's equation
//! - `elements`: classical elements from a state vector, and the inverse
//!   closed-form evaluation at an arbitrary time

pub mod elements;
pub mod kepler;
pub mod vector;

#[cfg(test)]
mod proptest_orbit;

pub use elements::{OrbitalElements, RotationSense, StateVector, apsides, circular_velocity};
pub use kepler::KeplerSolver;

/// Failures of the orbital math.
///
/// None of these are fatal: the gravity field recovers by keeping (or
/// forcing) the affected body off rails.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OrbitError {
    /// Eccentricity outside the supported elliptical band.
    #[error("degenerate orbit: eccentricity {eccentricity:.4} is outside [0, 0.99)")]
    DegenerateOrbit { eccentricity: f64 },

    /// Kepler's equation did not converge within the iteration cap.
    #[error(
        "kepler solver did not converge after {iterations} iterations (M = {mean_anomaly:.6}, e = {eccentricity:.4})"
    )]
    NonConvergence {
        mean_anomaly: f64,
        eccentricity: f64,
        iterations: u32,
    },

    /// Derived orbit center is not finite or does not fit local coordinates.
    #[error("invalid orbit center ({x}, {y})")]
    InvalidOrbitCenter { x: f64, y: f64 },
}
