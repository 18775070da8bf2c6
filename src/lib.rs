//! Orbital Rails - hybrid analytic/simulated orbital mechanics
//!
//! Bodies far from every observer follow closed-form Kepler orbits; bodies
//! near an observer are integrated under gravity. A floating origin keeps
//! single-precision local coordinates small, and bodies that fall into the
//! atmosphere or drift out of range are retired.

pub mod coordinates;
pub mod gravity;
pub mod orbit;
pub mod time;
pub mod types;

#[cfg(test)]
pub mod test_utils;
