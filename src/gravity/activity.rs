//! Long-running per-body activities advanced once per fixed tick.
//!
//! A deorbit burns a body down through the atmosphere and can be cancelled
//! by the body climbing back out. A despawn is a fixed-length fade that
//! always runs to completion.

use bevy::math::DVec2;

use super::body::GravityBody;
use super::config::{GravityConfig, Thresholds};
use super::force::{atmospheric_density, drag_force, heating_intensity};

/// Outcome of advancing an activity by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ActivityStatus {
    Running,
    /// Altitude recovered; the body is tracked normally again
    Recovered,
    /// The body should be destroyed
    Expired,
}

#[derive(Clone, Debug)]
pub(crate) enum Activity {
    Deorbit(DeorbitTask),
    Despawn(DespawnTask),
}

impl Activity {
    pub fn advance(
        &mut self,
        body: &mut GravityBody,
        global_position: DVec2,
        dt: f64,
        config: &GravityConfig,
        thresholds: &Thresholds,
    ) -> ActivityStatus {
        match self {
            Activity::Deorbit(task) => task.advance(body, global_position, dt, config, thresholds),
            Activity::Despawn(task) => task.advance(dt),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct DeorbitTask {
    /// Continuous time spent below the destruction radius
    below_destruction_for: f64,
}

impl DeorbitTask {
    fn advance(
        &mut self,
        body: &mut GravityBody,
        global_position: DVec2,
        dt: f64,
        config: &GravityConfig,
        thresholds: &Thresholds,
    ) -> ActivityStatus {
        let r_sq = global_position.length_squared();
        if r_sq > thresholds.atmosphere_sq {
            body.heating = 0.0;
            return ActivityStatus::Recovered;
        }

        let density = atmospheric_density(r_sq.sqrt(), config);
        let velocity = body.physics.velocity.as_dvec2();
        let drag = drag_force(
            density,
            velocity,
            f64::from(body.physics.cross_section),
            config.drag_coefficient,
        );

        // Drag can stop a body but never reverse it
        let mass = f64::from(body.physics.mass).max(f64::EPSILON);
        let mut delta = drag / mass * dt;
        let speed = velocity.length();
        if delta.length() > speed {
            delta = -velocity;
        }
        body.physics.apply_velocity_change(delta.as_vec2());
        body.heating = heating_intensity(drag.length(), config);

        if r_sq < thresholds.destruction_sq {
            self.below_destruction_for += dt;
        } else {
            self.below_destruction_for = 0.0;
        }

        if self.below_destruction_for > config.destruction_delay {
            ActivityStatus::Expired
        } else {
            ActivityStatus::Running
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) struct DespawnTask {
    remaining: f64,
}

impl DespawnTask {
    pub fn new(duration: f64) -> Self {
        Self { remaining: duration }
    }

    fn advance(&mut self, dt: f64) -> ActivityStatus {
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            ActivityStatus::Expired
        } else {
            ActivityStatus::Running
        }
    }
}
