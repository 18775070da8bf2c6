//! Forces acting on simulated bodies: central gravity and atmospheric drag.

use bevy::math::DVec2;

use super::config::GravityConfig;

/// Gravitational acceleration toward the central mass at `position`.
///
/// # Arguments
/// * `position` - Global position in meters relative to the central mass
/// * `mu` - Gravitational parameter G·M
///
/// # Returns
/// Acceleration vector in m/s²
#[inline]
pub fn gravity_acceleration(position: DVec2, mu: f64) -> DVec2 {
    let r_squared = position.length_squared();

    // Avoid the singularity at the centre; nothing orbits within a meter
    if r_squared <= 1.0 {
        return DVec2::ZERO;
    }

    let r = r_squared.sqrt();
    // a = -μ·r̂ / r²
    -position * (mu / (r_squared * r))
}

/// Air density at a radius from the central mass, exponential with altitude.
pub fn atmospheric_density(radius: f64, config: &GravityConfig) -> f64 {
    let altitude = (radius - config.planet_radius).max(0.0);
    config.sea_level_density * (-altitude / config.scale_height).exp()
}

/// Drag force opposing `velocity`: F = ½·ρ·v²·Cd·A.
pub fn drag_force(density: f64, velocity: DVec2, cross_section: f64, drag_coefficient: f64) -> DVec2 {
    let speed_sq = velocity.length_squared();
    if speed_sq == 0.0 {
        return DVec2::ZERO;
    }
    let magnitude = 0.5 * density * speed_sq * drag_coefficient * cross_section;
    -velocity / speed_sq.sqrt() * magnitude
}

/// Heating intensity in [0, 1] for a drag force magnitude.
pub fn heating_intensity(drag_magnitude: f64, config: &GravityConfig) -> f32 {
    (drag_magnitude / config.heating_reference_force).clamp(0.0, 1.0) as f32
}
