//! Planar vector helpers used by the orbital math.

use std::f64::consts::TAU;

use bevy::math::DVec2;

/// Extra operations on `DVec2` that the element derivation leans on.
pub trait PlanarExt {
    /// Vector rotated a quarter turn counter-clockwise.
    fn perpendicular(self) -> Self;

    /// Angle from `self` to `other`, counter-clockwise positive, in [0, 2π).
    fn angle_to_ccw(self, other: Self) -> f64;

    /// Vector rotated counter-clockwise by `angle` radians.
    fn rotated(self, angle: f64) -> Self;
}

impl PlanarExt for DVec2 {
    #[inline]
    fn perpendicular(self) -> Self {
        DVec2::new(-self.y, self.x)
    }

    fn angle_to_ccw(self, other: Self) -> f64 {
        let denom = self.length() * other.length();
        if denom == 0.0 {
            return 0.0;
        }
        let cos = (self.dot(other) / denom).clamp(-1.0, 1.0);
        let angle = cos.acos();
        // Perpendicular-component test resolves the acos ambiguity
        if other.dot(self.perpendicular()) < 0.0 {
            TAU - angle
        } else {
            angle
        }
    }

    #[inline]
    fn rotated(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        DVec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }
}

/// Unit reference axis that angles such as the major-axis rotation are
/// measured from.
pub const REFERENCE_AXIS: DVec2 = DVec2::X;
