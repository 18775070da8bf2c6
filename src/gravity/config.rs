//! Gravity field configuration and validation.

use bevy::math::DVec2;
use bevy::prelude::Resource;

use crate::types::{DEFAULT_CENTRAL_MASS, DEFAULT_PLANET_RADIUS, G};

/// Tunables of the gravity field. Distances are in meters; radii are
/// measured from the centre of the central mass.
#[derive(Resource, Clone, Debug)]
pub struct GravityConfig {
    /// Gravitational constant. Default: 6.6743e-11.
    pub gravitational_constant: f64,
    /// Mass of the central body in kg. Default: Earth.
    pub central_mass: f64,
    /// Surface radius of the central body. Default: 6 371 km.
    pub planet_radius: f64,
    /// Global position of the local origin at startup. Default: 400 km
    /// above the surface on the reference axis.
    pub initial_origin: DVec2,
    /// Observer distance below which a body leaves the rails. Default: 1500.
    pub unrail_distance: f64,
    /// Observer distance above which a body may go on rails. Default: 2000.
    pub onrail_distance: f64,
    /// Atmosphere-entry radius. Default: planet radius + 100 km.
    pub atmosphere_radius: f64,
    /// Radius below which a decaying body burns up. Default: planet radius + 40 km.
    pub destruction_radius: f64,
    /// Maximum tracked radius. Default: 2e8.
    pub max_altitude: f64,
    /// Local coordinate beyond which the origin is shifted. Default: 5000.
    pub max_local_coordinate: f32,
    /// Seconds between sweeps (origin, altitude, advisories). Default: 3.
    pub sweep_interval: f64,
    /// Simulated seconds below the destruction radius before a body is
    /// destroyed. Default: 2.
    pub destruction_delay: f64,
    /// Simulated seconds a despawn runs before the body is removed. Default: 1.
    pub despawn_duration: f64,
    /// Air density at the surface, kg/m³. Default: 1.225.
    pub sea_level_density: f64,
    /// Atmospheric scale height in meters. Default: 8500.
    pub scale_height: f64,
    /// Drag coefficient. Default: 2.2.
    pub drag_coefficient: f64,
    /// Drag force (N) that maps to full heating intensity. Default: 5e4.
    pub heating_reference_force: f64,
    /// Fractional margin for periapsis/apoapsis advisories. Default: 0.1.
    pub advisory_margin: f64,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            gravitational_constant: G,
            central_mass: DEFAULT_CENTRAL_MASS,
            planet_radius: DEFAULT_PLANET_RADIUS,
            initial_origin: DVec2::new(DEFAULT_PLANET_RADIUS + 400_000.0, 0.0),
            unrail_distance: 1500.0,
            onrail_distance: 2000.0,
            atmosphere_radius: DEFAULT_PLANET_RADIUS + 100_000.0,
            destruction_radius: DEFAULT_PLANET_RADIUS + 40_000.0,
            max_altitude: 2.0e8,
            max_local_coordinate: 5000.0,
            sweep_interval: 3.0,
            destruction_delay: 2.0,
            despawn_duration: 1.0,
            sea_level_density: 1.225,
            scale_height: 8500.0,
            drag_coefficient: 2.2,
            heating_reference_force: 5.0e4,
            advisory_margin: 0.1,
        }
    }
}

/// Rejected configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("onrail distance {onrail} must exceed unrail distance {unrail}")]
    InvertedHysteresis { unrail: f64, onrail: f64 },

    #[error("destruction radius {destruction} must be below atmosphere radius {atmosphere}")]
    DestructionAboveAtmosphere { destruction: f64, atmosphere: f64 },

    #[error("atmosphere radius {atmosphere} must be below maximum altitude {max_altitude}")]
    AtmosphereAboveCeiling { atmosphere: f64, max_altitude: f64 },
}

impl GravityConfig {
    /// Gravitational parameter μ = G·M.
    pub fn mu(&self) -> f64 {
        self.gravitational_constant * self.central_mass
    }

    /// Check that every threshold is usable.
    ///
    /// # Errors
    /// The first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("gravitational_constant", self.gravitational_constant),
            ("central_mass", self.central_mass),
            ("planet_radius", self.planet_radius),
            ("unrail_distance", self.unrail_distance),
            ("onrail_distance", self.onrail_distance),
            ("atmosphere_radius", self.atmosphere_radius),
            ("destruction_radius", self.destruction_radius),
            ("max_altitude", self.max_altitude),
            ("max_local_coordinate", f64::from(self.max_local_coordinate)),
            ("sweep_interval", self.sweep_interval),
            ("destruction_delay", self.destruction_delay),
            ("scale_height", self.scale_height),
        ];
        for (name, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(ConfigError::NonPositive { name, value });
            }
        }

        if self.onrail_distance <= self.unrail_distance {
            return Err(ConfigError::InvertedHysteresis {
                unrail: self.unrail_distance,
                onrail: self.onrail_distance,
            });
        }
        if self.destruction_radius >= self.atmosphere_radius {
            return Err(ConfigError::DestructionAboveAtmosphere {
                destruction: self.destruction_radius,
                atmosphere: self.atmosphere_radius,
            });
        }
        if self.atmosphere_radius >= self.max_altitude {
            return Err(ConfigError::AtmosphereAboveCeiling {
                atmosphere: self.atmosphere_radius,
                max_altitude: self.max_altitude,
            });
        }
        Ok(())
    }
}

/// Distance thresholds, squared once so per-tick checks skip the sqrt.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Thresholds {
    pub unrail_sq: f64,
    pub onrail_sq: f64,
    pub atmosphere_sq: f64,
    pub destruction_sq: f64,
    pub max_altitude_sq: f64,
}

impl From<&GravityConfig> for Thresholds {
    fn from(config: &GravityConfig) -> Self {
        let sq = |x: f64| x * x;
        Self {
            unrail_sq: sq(config.unrail_distance),
            onrail_sq: sq(config.onrail_distance),
            atmosphere_sq: sq(config.atmosphere_radius),
            destruction_sq: sq(config.destruction_radius),
            max_altitude_sq: sq(config.max_altitude),
        }
    }
}
