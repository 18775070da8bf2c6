//! Floating-origin coordinate conversion.
//!
//! Two coordinate spaces are kept apart by type:
//! - global: `DVec2`, meters relative to the central mass, used for orbital
//!   math and origin bookkeeping
//! - local: `Vec2`, meters relative to the current floating origin, used by
//!   the physics state and whatever renders it
//!
//! Conversions are pure and take the origin explicitly.

use bevy::math::{DVec2, Vec2};

/// Convert a global position to local coordinates for the given origin.
#[inline]
pub fn to_local(global: DVec2, origin: DVec2) -> Vec2 {
    (global - origin).as_vec2()
}

/// Convert a local position back to global coordinates for the given origin.
#[inline]
pub fn to_global(local: Vec2, origin: DVec2) -> DVec2 {
    origin + local.as_dvec2()
}

/// Whether a local position has drifted past `max_axis` on either axis.
#[inline]
pub fn exceeds_axis_limit(local: Vec2, max_axis: f32) -> bool {
    local.x.abs() > max_axis || local.y.abs() > max_axis
}
