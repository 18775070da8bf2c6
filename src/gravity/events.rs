//! Notifications raised by the gravity field.
//!
//! The field queues these while ticking; the plugin forwards them as Bevy
//! messages so UI, audio and respawn logic can react without polling.

use bevy::math::DVec2;
use bevy::prelude::*;

use super::body::BodyId;

/// Why a body left the rails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnrailReason {
    /// An observer came within the unrail distance
    ObserverNearby,
    /// The body started thrusting
    Propulsion,
    /// Kepler's equation failed to converge
    SolverFailure,
    /// A collaborator asked for control (docking, construction, impulse)
    Requested,
}

/// Why a body was marked decaying.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecayCause {
    AtmosphereEntry,
    BeyondMaxAltitude,
    LeftBelt,
}

/// Something the field did that collaborators may care about.
#[derive(Message, Clone, Debug, PartialEq)]
pub enum FieldEvent {
    RailEngaged {
        body: BodyId,
    },
    RailReleased {
        body: BodyId,
        reason: UnrailReason,
    },
    DecayStarted {
        body: BodyId,
        cause: DecayCause,
    },
    /// Altitude recovered before the destruction timer elapsed
    DecayCancelled {
        body: BodyId,
    },
    /// Removed from the registry at the next tick boundary
    BodyDestroyed {
        body: BodyId,
    },
    /// An observer's own tracked body would have been destroyed
    ObserverKilled {
        body: BodyId,
    },
    OriginShifted {
        offset: DVec2,
    },
    /// Advisory only: periapsis close to the atmosphere
    PeriapsisAdvisory {
        body: BodyId,
        periapsis: f64,
    },
    /// Advisory only: apoapsis close to the tracking ceiling, or escaping
    /// (`f64::INFINITY`)
    ApoapsisAdvisory {
        body: BodyId,
        apoapsis: f64,
    },
}
