//! Orbital Rails - headless demo
//!
//! Spawns a ship (which is also the observer), a few belt asteroids, a
//! distant station and one station already skimming the atmosphere, then
//! logs what the gravity field reports for ten simulated minutes.

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use orbital_rails::gravity::{
    BeltConstraint, BodyKind, FieldEvent, GravityConfig, GravityField, GravityPlugin, OrbitObserver, Orbiter,
};
use orbital_rails::time::TimePlugin;
use orbital_rails::types::SimulationTime;

/// Simulated seconds before the demo exits.
const DEMO_DURATION: f64 = 600.0;

fn main() {
    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(
            std::time::Duration::from_secs_f64(1.0 / 60.0),
        )))
        .add_plugins(LogPlugin::default())
        // Insert resources before plugins that depend on them
        .insert_resource(SimulationTime {
            scale: 10.0,
            ..Default::default()
        })
        .insert_resource(GravityConfig::default())
        .add_plugins((TimePlugin, GravityPlugin::default()))
        .add_systems(Startup, spawn_scene)
        .add_systems(Update, (log_field_events, stop_after_demo))
        .run();
}

fn spawn_scene(mut commands: Commands, config: Res<GravityConfig>) {
    let ship = commands
        .spawn((Orbiter::new(BodyKind::Ship), Transform::default()))
        .id();
    commands.entity(ship).insert(OrbitObserver { tracked: Some(ship) });

    let origin_radius = config.initial_origin.length();
    let belt = BeltConstraint::new(origin_radius - 2_000.0, origin_radius + 12_000.0);
    for i in 0..4 {
        let offset = Vec3::new(2_500.0 * (i + 1) as f32, 400.0 * i as f32, 0.0);
        commands.spawn((
            Orbiter::new(BodyKind::Asteroid).with_belt(belt),
            Transform::from_translation(offset),
        ));
    }

    commands.spawn((
        Orbiter::new(BodyKind::Station),
        Transform::from_xyz(0.0, 40_000.0, 0.0),
    ));

    // 90 km altitude, inside the atmosphere
    let skimming = (config.planet_radius + 90_000.0 - config.initial_origin.x) as f32;
    commands.spawn((
        Orbiter::new(BodyKind::Station),
        Transform::from_xyz(skimming, 0.0, 0.0),
    ));
}

fn log_field_events(mut events: MessageReader<FieldEvent>, field: Res<GravityField>) {
    for event in events.read() {
        match event {
            FieldEvent::PeriapsisAdvisory { body, periapsis } => {
                let altitude = periapsis - field.config().planet_radius;
                warn!("{body}: periapsis {:.1} km above the surface", altitude / 1000.0);
            }
            FieldEvent::ObserverKilled { body } => warn!("{body}: observer lost, respawn needed"),
            other => info!("{other:?}"),
        }
    }
}

fn stop_after_demo(sim_time: Res<SimulationTime>, field: Res<GravityField>, mut exit: MessageWriter<AppExit>) {
    if sim_time.current >= DEMO_DURATION {
        info!(
            "demo finished at t = {:.0} s with {} bodies, origin {}",
            sim_time.current,
            field.len(),
            field.origin()
        );
        exit.write(AppExit::Success);
    }
}
