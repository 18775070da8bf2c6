//! Kepler's equation solver using Newton's method.

use std::f64::consts::PI;

use super::OrbitError;

/// Eccentricity above which the initial guess starts at π instead of M.
const HIGH_ECCENTRICITY_GUESS: f64 = 0.8;

/// Solves M = E - e·sin(E) for the eccentric anomaly E.
#[derive(Clone, Copy, Debug)]
pub struct KeplerSolver {
    /// Stop once successive iterates differ by less than this. Default: 1e-4.
    pub tolerance: f64,
    /// Iteration cap before reporting non-convergence. Default: 200.
    pub max_iterations: u32,
    /// Below this eccentricity E = M is returned without iterating.
    /// Default: 0.02.
    pub circular_threshold: f64,
}

impl Default for KeplerSolver {
    fn default() -> Self {
        Self {
            tolerance: 1e-4,
            max_iterations: 200,
            circular_threshold: 0.02,
        }
    }
}

impl KeplerSolver {
    /// Same solver with a different near-circular shortcut threshold.
    pub fn with_circular_threshold(self, circular_threshold: f64) -> Self {
        Self {
            circular_threshold,
            ..self
        }
    }

    /// Solve for the eccentric anomaly in radians.
    ///
    /// # Errors
    /// [`OrbitError::NonConvergence`] when the iteration cap is reached.
    pub fn solve(&self, mean_anomaly: f64, eccentricity: f64) -> Result<f64, OrbitError> {
        // Near-circular orbits: E and M differ by less than e
        if eccentricity < self.circular_threshold {
            return Ok(mean_anomaly);
        }

        let mut e_anomaly = if eccentricity > HIGH_ECCENTRICITY_GUESS {
            PI
        } else {
            mean_anomaly
        };

        for _ in 0..self.max_iterations {
            let (sin_e, cos_e) = e_anomaly.sin_cos();
            let f = e_anomaly - eccentricity * sin_e - mean_anomaly;
            let f_prime = 1.0 - eccentricity * cos_e;
            let next = e_anomaly - f / f_prime;

            if (next - e_anomaly).abs() < self.tolerance {
                return Ok(next);
            }
            e_anomaly = next;
        }

        Err(OrbitError::NonConvergence {
            mean_anomaly,
            eccentricity,
            iterations: self.max_iterations,
        })
    }
}

/// Solve with the default tolerance, iteration cap and shortcut threshold.
pub fn solve(mean_anomaly: f64, eccentricity: f64) -> Result<f64, OrbitError> {
    KeplerSolver::default().solve(mean_anomaly, eccentricity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn residual(e_anomaly: f64, eccentricity: f64, mean_anomaly: f64) -> f64 {
        (e_anomaly - eccentricity * e_anomaly.sin() - mean_anomaly).abs()
    }

    #[test]
    fn test_circular_returns_mean_anomaly_exactly() {
        for m in [0.0, 0.3, 1.0, PI, 4.5, TAU - 1e-9] {
            assert_eq!(solve(m, 0.0).unwrap(), m);
        }
    }

    #[test]
    fn test_near_circular_skips_iteration() {
        let solver = KeplerSolver {
            max_iterations: 0,
            ..Default::default()
        };
        // Would fail immediately if it iterated
        assert_eq!(solver.solve(1.2, 0.015).unwrap(), 1.2);
    }

    #[test]
    fn test_mercury_like_eccentricity() {
        let m = 1.5;
        let e_anom = solve(m, 0.2056).unwrap();
        assert!(residual(e_anom, 0.2056, m) < 1e-7, "Kepler equation not satisfied");
    }

    #[test]
    fn test_high_eccentricity() {
        for m in [0.1, 0.5, 1.0, 2.0, 3.0, 5.0] {
            let e_anom = solve(m, 0.9).unwrap();
            assert!(
                residual(e_anom, 0.9, m) < 1e-6,
                "High eccentricity: Kepler equation not satisfied for M={m}"
            );
        }
    }

    #[test]
    fn test_convergence_grid() {
        // e in [0, 0.98], M in [0, 2π)
        for ei in 0..=98 {
            let e = ei as f64 / 100.0;
            for mi in 0..64 {
                let m = mi as f64 / 64.0 * TAU;
                let result = solve(m, e);
                assert!(result.is_ok(), "No convergence for M={m}, e={e}");
            }
        }
    }

    #[test]
    fn test_non_convergence_is_reported() {
        let solver = KeplerSolver {
            max_iterations: 1,
            tolerance: 1e-15,
            ..Default::default()
        };
        let err = solver.solve(0.001, 0.95).unwrap_err();
        assert!(matches!(
            err,
            OrbitError::NonConvergence { iterations: 1, .. }
        ));
    }

    #[test]
    fn test_custom_circular_threshold_iterates() {
        let solver = KeplerSolver::default().with_circular_threshold(0.01);
        let e_anom = solver.solve(1.0, 0.015).unwrap();
        assert_ne!(e_anom, 1.0);
        assert!(residual(e_anom, 0.015, 1.0) < 1e-8);
    }
}
