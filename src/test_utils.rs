//! Test utilities for gravity field tests.
//!
//! Provides a small-scale field configuration (μ = 1e6, orbits of about a
//! kilometre) and assertions for rail state and coordinate invariants.

use bevy::math::{DVec2, Vec2};

use crate::gravity::{BodyId, GravityConfig, GravityField, Observer};

/// Fixtures for creating test fields and observers.
pub mod fixtures {
    use super::*;

    /// Compact configuration: G = 1, M = 1e6, origin at the central mass.
    ///
    /// Radii: planet 100, destruction 150, atmosphere 200, ceiling 1e6.
    /// Rails engage beyond 100 m of any observer and release within 50 m.
    pub fn small_config() -> GravityConfig {
        GravityConfig {
            gravitational_constant: 1.0,
            central_mass: 1.0e6,
            planet_radius: 100.0,
            initial_origin: DVec2::ZERO,
            unrail_distance: 50.0,
            onrail_distance: 100.0,
            atmosphere_radius: 200.0,
            destruction_radius: 150.0,
            max_altitude: 1.0e6,
            ..Default::default()
        }
    }

    /// Field built from [`small_config`].
    pub fn small_field() -> GravityField {
        match GravityField::initialize(small_config()) {
            Ok(field) => field,
            Err(err) => panic!("test config rejected: {err}"),
        }
    }

    /// Observer that does not track any body.
    pub fn observer_at(x: f32, y: f32) -> Observer {
        Observer {
            position: Vec2::new(x, y),
            tracked: None,
        }
    }

    /// Observer riding along with `body`.
    pub fn tracking(field: &GravityField, body: BodyId) -> Observer {
        Observer {
            position: field.position(body).unwrap_or_default(),
            tracked: Some(body),
        }
    }
}

/// Assertion helpers.
pub mod assertions {
    use super::*;

    /// Assert the body is registered and in the expected rail state.
    pub fn assert_rail_state(field: &GravityField, body: BodyId, on_rails: bool) {
        assert!(field.contains(body), "{body} is not registered");
        assert_eq!(
            field.is_on_rails(body),
            on_rails,
            "{body} expected on_rails = {on_rails}"
        );
    }

    /// Assert two global positions agree within `tolerance` meters.
    pub fn assert_same_global(a: DVec2, b: DVec2, tolerance: f64) {
        let distance = a.distance(b);
        assert!(
            distance <= tolerance,
            "global positions differ by {distance} m: {a} vs {b}"
        );
    }
}
