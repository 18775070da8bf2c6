//! Property-based tests for the orbital math using proptest.
//!
//! Orbits are generated from periapsis distance, eccentricity, orientation
//! and a time offset so every case lands somewhere generic on the ellipse.

use std::f64::consts::TAU;

use bevy::math::DVec2;
use proptest::prelude::*;

use super::elements::{OrbitalElements, circular_velocity};
use super::kepler;
use super::vector::PlanarExt;

const MU: f64 = 3.986e14;

/// State vector on an orbit with the given shape, rotated and advanced.
fn orbit_state(r_p: f64, e: f64, rotation: f64, clockwise: bool, fraction: f64) -> (DVec2, DVec2) {
    let a = r_p / (1.0 - e);
    let v = (MU * (2.0 / r_p - 1.0 / a)).sqrt();
    let pos = DVec2::new(r_p, 0.0).rotated(rotation);
    let mut vel = DVec2::new(0.0, v).rotated(rotation);
    if clockwise {
        vel = -vel;
    }
    let base = OrbitalElements::from_state(pos, vel, 0.0, MU).expect("generated orbit is elliptical");
    let state = base.state_at(base.period * fraction).expect("solver converges");
    (state.position, state.velocity)
}

fn relative_error(actual: DVec2, expected: DVec2) -> f64 {
    (actual - expected).length() / expected.length()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Elements derived at t0 reproduce the state vector at t0.
    #[test]
    fn prop_round_trip_at_epoch(
        r_p in 6.6e6f64..4.0e7,
        e in 0.02f64..0.9,
        rotation in 0.0f64..TAU,
        clockwise in any::<bool>(),
        fraction in 0.0f64..1.0,
        epoch in -1.0e5f64..1.0e5,
    ) {
        let (pos, vel) = orbit_state(r_p, e, rotation, clockwise, fraction);
        let elements = OrbitalElements::from_state(pos, vel, epoch, MU).unwrap();
        let state = elements.state_at(epoch).unwrap();

        prop_assert!(relative_error(state.position, pos) < 1e-5,
            "position mismatch: {:?} vs {:?}", state.position, pos);
        prop_assert!(relative_error(state.velocity, vel) < 1e-5,
            "velocity mismatch: {:?} vs {:?}", state.velocity, vel);
    }

    /// One full period later the body is back where it started.
    #[test]
    fn prop_periodicity(
        r_p in 6.6e6f64..4.0e7,
        e in 0.0f64..0.9,
        rotation in 0.0f64..TAU,
        clockwise in any::<bool>(),
        fraction in 0.0f64..1.0,
    ) {
        let (pos, vel) = orbit_state(r_p, e, rotation, clockwise, fraction);
        let elements = OrbitalElements::from_state(pos, vel, 0.0, MU).unwrap();

        let start = elements.state_at(0.0).unwrap();
        let after = elements.state_at(elements.period).unwrap();
        prop_assert!(relative_error(after.position, start.position) < 1e-5);
        prop_assert!(relative_error(after.velocity, start.velocity) < 1e-5);
    }

    /// The solver converges for every bound eccentricity it is asked about.
    #[test]
    fn prop_solver_converges(
        mean_anomaly in 0.0f64..TAU,
        eccentricity in 0.0f64..=0.98,
    ) {
        let e_anomaly = kepler::solve(mean_anomaly, eccentricity);
        prop_assert!(e_anomaly.is_ok(), "M={}, e={}", mean_anomaly, eccentricity);
    }

    /// Assigned circular velocity gives a circular orbit of the same radius.
    #[test]
    fn prop_circular_velocity_is_circular(
        radius in 6.6e6f64..4.0e8,
        angle in 0.0f64..TAU,
    ) {
        let pos = DVec2::new(radius, 0.0).rotated(angle);
        let vel = circular_velocity(pos, MU);

        prop_assert!((vel.length() - (MU / radius).sqrt()).abs() / vel.length() < 1e-12);
        prop_assert!(pos.dot(vel).abs() / (radius * vel.length()) < 1e-12);

        let elements = OrbitalElements::from_state(pos, vel, 0.0, MU).unwrap();
        prop_assert!(elements.is_circular());
    }
}
