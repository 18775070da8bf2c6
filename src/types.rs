//! Shared constants, the simulation clock and system ordering labels.

use bevy::prelude::*;

/// System sets for ordering the orbital systems inside `FixedUpdate`.
///
/// Capability sync must land before the step so a ship that just lit its
/// engine is not railed in the same tick.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum OrbitSystemSet {
    /// Copy propulsion/touched flags from components into the field
    SyncCapabilities,
    /// Gravity integration, analytic evaluation and rail transitions
    Step,
    /// Write positions back to transforms and forward field events
    WriteBack,
    /// Advance the simulation clock (runs last)
    AdvanceClock,
}

/// Gravitational constant (m³·kg⁻¹·s⁻²)
pub const G: f64 = 6.67430e-11;

/// Mass of the default central body in kilograms (Earth-like).
pub const DEFAULT_CENTRAL_MASS: f64 = 5.972e24;

/// Radius of the default central body in meters.
pub const DEFAULT_PLANET_RADIUS: f64 = 6.371e6;

/// Simulation clock consumed by the gravity field.
///
/// `current` advances once per fixed step by the fixed delta multiplied by
/// `scale`, so analytic evaluation and integration see the same time base.
#[derive(Resource, Clone, Debug)]
pub struct SimulationTime {
    /// Seconds since the session started
    pub current: f64,
    /// Time acceleration factor (1.0 = real time)
    pub scale: f64,
    /// Whether the simulation is paused
    pub paused: bool,
}

impl Default for SimulationTime {
    fn default() -> Self {
        Self {
            current: 0.0,
            scale: 1.0,
            paused: false,
        }
    }
}

impl SimulationTime {
    /// Clock starting at a specific simulation time.
    pub fn starting_at(seconds: f64) -> Self {
        Self {
            current: seconds,
            ..Default::default()
        }
    }

    /// Simulated seconds covered by a real-time step of `real_dt`.
    pub fn scaled(&self, real_dt: f64) -> f64 {
        if self.paused { 0.0 } else { real_dt * self.scale }
    }
}
