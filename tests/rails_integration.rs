//! Integration tests for the gravity field: rail hysteresis, floating
//! origin, deorbit outcomes and the reference circular-orbit scenario.

mod common;

use approx::assert_relative_eq;
use bevy::math::{DVec2, Vec2};
use orbital_rails::gravity::{BodyKind, BodySpawn, DecayCause, FieldEvent, UnrailReason};

use common::{DT, observer_at, observer_near, relative_error, small_field, station, step};

#[test]
fn test_full_period_returns_to_spawn_point() {
    let mut field = small_field();
    assert_relative_eq!(field.mu(), 1.0 * 1.0e6);

    let id = station(&mut field, 1000.0, 0.0);
    step(&mut field, 1, &[]);
    let elements = field.elements(id).expect("railed after one tick").clone();
    let t0 = elements.epoch;

    let after_period = elements.position_at(t0 + elements.period).unwrap();
    assert!(relative_error(after_period, DVec2::new(1000.0, 0.0)) < 1e-6);

    // The field writes the same analytic position for a step ending there
    field.fixed_tick(DT, t0 + elements.period - DT, &[]);
    let written = field.global_position(id).unwrap();
    assert!(relative_error(written, DVec2::new(1000.0, 0.0)) < 1e-6);
}

/// Exact position on the counter-clockwise circular orbit through (r, 0).
fn circular_orbit_at(mu: f64, r: f64, time: f64) -> DVec2 {
    let angle = (mu / (r * r * r)).sqrt() * time;
    DVec2::new(angle.cos(), angle.sin()) * r
}

#[test]
fn test_railed_body_keeps_pace_with_simulated_twin() {
    let mut field = small_field();
    let mu = field.mu();
    let orbiter = station(&mut field, 1000.0, 0.0);
    let ship = field.add(BodySpawn::new(BodyKind::Ship, Vec2::new(1000.0, 0.0)), None);
    field.set_propulsion_active(ship, true);

    // One step of phase is |v|·DT ≈ 0.53 m; Euler drift stays far below it
    step(&mut field, 121, &[]);
    assert!(field.is_on_rails(orbiter));
    assert!(!field.is_on_rails(ship));
    let truth = circular_orbit_at(mu, 1000.0, field.time());
    let railed = field.global_position(orbiter).unwrap();
    let simulated = field.global_position(ship).unwrap();
    assert!(railed.distance(truth) < 0.01, "railed off by {}", railed.distance(truth));
    assert!(simulated.distance(truth) < 0.05, "simulated off by {}", simulated.distance(truth));
    assert!(railed.distance(simulated) < 0.05);

    // Released mid-orbit, the body carries on from the same instant
    for _ in 0..60 {
        let observer = observer_near(&field, orbiter, 0.0);
        step(&mut field, 1, &[observer]);
    }
    assert!(!field.is_on_rails(orbiter));
    let truth = circular_orbit_at(mu, 1000.0, field.time());
    let released = field.global_position(orbiter).unwrap();
    let simulated = field.global_position(ship).unwrap();
    assert!(released.distance(truth) < 0.05, "released off by {}", released.distance(truth));
    assert!(released.distance(simulated) < 0.1);
}

#[test]
fn test_initial_velocity_is_circular() {
    let mut field = small_field();
    let mu = field.mu();

    for (x, y) in [(1000.0, 0.0), (0.0, -2500.0), (-700.0, 700.0), (3000.0, 4000.0)] {
        let id = station(&mut field, x, y);
        let r = DVec2::new(x as f64, y as f64);
        let v = field.velocity(id).unwrap().as_dvec2();

        assert_relative_eq!(v.length(), (mu / r.length()).sqrt(), max_relative = 1e-5);
        assert!(v.dot(r).abs() / (v.length() * r.length()) < 1e-6, "velocity not perpendicular");
    }
}

#[test]
fn test_close_observer_unrails() {
    for distance in [0.0, 10.0, 40.0] {
        let mut field = small_field();
        let id = station(&mut field, 1000.0, 0.0);
        step(&mut field, 1, &[]);
        assert!(field.is_on_rails(id));

        let observer = observer_near(&field, id, distance);
        step(&mut field, 1, &[observer]);
        assert!(!field.is_on_rails(id), "still on rails at {distance} m");
    }
}

#[test]
fn test_distant_observer_rails() {
    for distance in [150.0, 500.0, 4000.0] {
        let mut field = small_field();
        let id = station(&mut field, 1000.0, 0.0);
        assert!(!field.is_on_rails(id));

        let observer = observer_near(&field, id, distance);
        step(&mut field, 1, &[observer]);
        assert!(field.is_on_rails(id), "not railed at {distance} m");
    }
}

#[test]
fn test_dead_zone_keeps_previous_state() {
    for distance in [60.0, 75.0, 90.0] {
        let mut field = small_field();
        let railed = station(&mut field, 1000.0, 0.0);
        step(&mut field, 1, &[]);
        let simulated = station(&mut field, -1000.0, 0.0);

        let observers = [
            observer_near(&field, railed, distance),
            observer_near(&field, simulated, distance),
        ];
        step(&mut field, 5, &observers);

        assert!(field.is_on_rails(railed), "railed body released at {distance} m");
        assert!(!field.is_on_rails(simulated), "simulated body railed at {distance} m");
    }
}

#[test]
fn test_unrail_injects_analytic_velocity() {
    let mut field = small_field();
    let id = station(&mut field, 1000.0, 0.0);
    step(&mut field, 1, &[]);
    let elements = field.elements(id).unwrap().clone();
    step(&mut field, 120, &[]);

    let observer = observer_near(&field, id, 0.0);
    step(&mut field, 1, &[observer]);
    assert!(!field.is_on_rails(id));
    assert!(
        field
            .drain_events()
            .contains(&FieldEvent::RailReleased {
                body: id,
                reason: UnrailReason::ObserverNearby,
            })
    );

    let expected = elements.velocity_at(field.time()).unwrap();
    let actual = field.velocity(id).unwrap().as_dvec2();
    assert!(actual.distance(expected) < 1e-3, "velocity jump {}", actual.distance(expected));
}

#[test]
fn test_origin_shift_preserves_global_positions() {
    let mut field = small_field();
    let railed = station(&mut field, 1000.0, 0.0);
    step(&mut field, 1, &[]);
    let simulated = [station(&mut field, -1000.0, 0.0), station(&mut field, 200.0, 4500.0)];

    let locals: Vec<Vec2> = simulated.iter().map(|id| field.position(*id).unwrap()).collect();
    let globals: Vec<DVec2> = simulated.iter().map(|id| field.global_position(*id).unwrap()).collect();

    let railed_local = field.position(railed).unwrap();
    let railed_global = field.global_position(railed).unwrap();

    let delta = Vec2::new(7000.0, -3000.0);
    let shift = field.sweep(&[observer_at(delta)]);
    assert_eq!(shift, Some(delta));
    assert_eq!(field.position(railed).unwrap(), railed_local - delta);
    assert!(field.global_position(railed).unwrap().distance(railed_global) < 1e-2);
    assert!(field.did_origin_shift_this_tick());
    assert_eq!(field.origin(), delta.as_dvec2());

    for (i, id) in simulated.iter().enumerate() {
        assert_eq!(field.position(*id).unwrap(), locals[i] - delta);
        assert!(field.global_position(*id).unwrap().distance(globals[i]) < 1e-2);
    }

    // ...and recomputed in full from the new origin
    let elements = field.elements(railed).unwrap().clone();
    step(&mut field, 1, &[]);
    let expected = elements.position_at(field.time()).unwrap();
    assert!(field.global_position(railed).unwrap().distance(expected) < 1e-2);
    assert!(
        field
            .drain_events()
            .contains(&FieldEvent::OriginShifted { offset: delta.as_dvec2() })
    );
}

#[test]
fn test_burn_up_after_two_seconds_below_destruction() {
    let mut field = small_field();
    // Heavy enough that drag barely bends its orbit
    let id = field.add(
        BodySpawn::new(BodyKind::Station, Vec2::new(120.0, 0.0)).with_mass(1.0e9),
        None,
    );
    field.sweep(&[]);
    assert!(field.is_decaying(id));
    assert!(field.drain_events().contains(&FieldEvent::DecayStarted {
        body: id,
        cause: DecayCause::AtmosphereEntry,
    }));

    step(&mut field, 110, &[]);
    assert!(!field.drain_events().contains(&FieldEvent::BodyDestroyed { body: id }));
    assert!(field.heating(id).unwrap() > 0.0);

    step(&mut field, 15, &[]);
    assert!(field.drain_events().contains(&FieldEvent::BodyDestroyed { body: id }));

    // Removal lands at the next tick boundary
    step(&mut field, 1, &[]);
    assert!(!field.contains(id));
}

#[test]
fn test_climbing_out_cancels_decay() {
    let mut field = small_field();
    let id = field.add(
        BodySpawn::new(BodyKind::Station, Vec2::new(190.0, 0.0)).with_mass(1.0e6),
        None,
    );
    field.sweep(&[]);
    assert!(field.is_decaying(id));

    field.apply_impulse(id, DVec2::new(500.0, 0.0));
    step(&mut field, 30, &[]);

    let events = field.drain_events();
    assert!(events.contains(&FieldEvent::DecayCancelled { body: id }));
    assert!(!events.contains(&FieldEvent::BodyDestroyed { body: id }));
    assert!(!field.is_decaying(id));
    assert_eq!(field.heating(id), Some(0.0));

    step(&mut field, 150, &[]);
    assert!(field.contains(id));
}

#[test]
fn test_escaping_body_stays_simulated() {
    let mut field = small_field();
    let id = station(&mut field, 1000.0, 0.0);
    field.apply_impulse(id, DVec2::new(0.0, 40.0));

    step(&mut field, 10, &[]);
    assert!(!field.is_on_rails(id));
    assert_eq!(field.apoapsis_altitude(id), Some(f64::INFINITY));
}

#[test]
fn test_removed_body_is_neutral() {
    let mut field = small_field();
    let gone = station(&mut field, 1000.0, 0.0);
    let kept = station(&mut field, -1000.0, 0.0);
    assert!(field.remove(gone));

    assert!(!field.is_on_rails(gone));
    assert!(field.position(gone).is_none());
    assert!(field.velocity_at(gone, 5.0).is_none());
    assert!(!field.remove(gone));

    step(&mut field, 1, &[]);
    assert!(field.is_on_rails(kept));
    assert_eq!(field.len(), 1);
}
