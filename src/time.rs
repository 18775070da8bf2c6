//! Time advancement for the orbital simulation.
//!
//! The clock advances inside `FixedUpdate`, after the gravity step has read
//! it. The gravity step therefore sees the start of its step and, once the
//! clock has moved, the field and the clock agree on the time again.

use bevy::prelude::*;

use crate::types::{OrbitSystemSet, SimulationTime};

/// Plugin providing simulation clock advancement.
pub struct TimePlugin;

impl Plugin for TimePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimulationTime>()
            .add_systems(FixedUpdate, advance_time.in_set(OrbitSystemSet::AdvanceClock));
    }
}

/// Advance simulation time by the fixed delta scaled by time acceleration.
fn advance_time(mut sim_time: ResMut<SimulationTime>, time: Res<Time>) {
    let dt = sim_time.scaled(time.delta_secs_f64());
    sim_time.current += dt;
}
