//! Common test utilities for integration tests.

#![allow(dead_code)]

use bevy::math::{DVec2, Vec2};
use orbital_rails::gravity::{BodyId, BodyKind, BodySpawn, GravityConfig, GravityField, Observer};

/// Fixed step used by every integration test.
pub const DT: f64 = 1.0 / 60.0;

/// Compact configuration: G = 1, M = 1e6 (μ = 1e6), origin at the central
/// mass. Planet 100, destruction 150, atmosphere 200, ceiling 1e6; rails
/// release within 50 m of an observer and engage beyond 100 m.
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

pub fn small_field() -> GravityField {
    GravityField::initialize(small_config()).expect("small config is valid")
}

/// Run `ticks` fixed steps of [`DT`], each starting where the last ended.
pub fn step(field: &mut GravityField, ticks: usize, observers: &[Observer]) {
    for _ in 0..ticks {
        let now = field.time();
        field.fixed_tick(DT, now, observers);
    }
}

pub fn station(field: &mut GravityField, x: f32, y: f32) -> BodyId {
    field.add(BodySpawn::new(BodyKind::Station, Vec2::new(x, y)), None)
}

/// Non-tracking observer at a local position.
pub fn observer_at(position: Vec2) -> Observer {
    Observer {
        position,
        tracked: None,
    }
}

/// Observer placed `distance` meters radially outward from the body's
/// current local position (the origin must sit at the central mass).
pub fn observer_near(field: &GravityField, body: BodyId, distance: f32) -> Observer {
    let position = field.position(body).expect("body is registered");
    observer_at(position + position.normalize_or_zero() * distance)
}

/// Relative distance between two global positions.
pub fn relative_error(actual: DVec2, expected: DVec2) -> f64 {
    actual.distance(expected) / expected.length()
}
