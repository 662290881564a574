use crate::domain::{SolverError, SolverResult};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Uniform imaginary-time grid of `n_tau` points on the half-open interval
/// `[0, beta)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImTimeMesh {
    beta: f64,
    n_tau: usize,
}

impl ImTimeMesh {
    pub fn new(beta: f64, n_tau: usize) -> SolverResult<Self> {
        if !(beta > 0.0) {
            return Err(SolverError::configuration(
                "CONFIG.BETA",
                format!("inverse temperature must be positive, got {beta}"),
            ));
        }
        if n_tau < 2 {
            return Err(SolverError::configuration(
                "CONFIG.N_TAU",
                format!("imaginary-time mesh needs at least 2 points, got {n_tau}"),
            ));
        }
        Ok(Self { beta, n_tau })
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn len(&self) -> usize {
        self.n_tau
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn spacing(&self) -> f64 {
        self.beta / self.n_tau as f64
    }

    pub fn tau(&self, index: usize) -> f64 {
        self.beta * index as f64 / self.n_tau as f64
    }
}

/// Fermionic Matsubara frequencies `iw_n = i (2n + 1) pi / beta` for
/// `n = 0 .. n_iw`; the negative branch is implied by conjugate symmetry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatsubaraMesh {
    beta: f64,
    n_iw: usize,
}

impl MatsubaraMesh {
    pub fn new(beta: f64, n_iw: usize) -> SolverResult<Self> {
        if !(beta > 0.0) {
            return Err(SolverError::configuration(
                "CONFIG.BETA",
                format!("inverse temperature must be positive, got {beta}"),
            ));
        }
        if n_iw == 0 {
            return Err(SolverError::configuration(
                "CONFIG.N_IW",
                "frequency mesh needs at least 1 point",
            ));
        }
        Ok(Self { beta, n_iw })
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn len(&self) -> usize {
        self.n_iw
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn omega(&self, index: usize) -> f64 {
        (2 * index + 1) as f64 * PI / self.beta
    }

    pub fn iomega(&self, index: usize) -> Complex64 {
        Complex64::new(0.0, self.omega(index))
    }

    /// Smallest mesh index whose frequency is at least `omega`.
    pub fn index_at_or_above(&self, omega: f64) -> usize {
        let mut index = 0;
        while index < self.n_iw && self.omega(index) < omega {
            index += 1;
        }
        index
    }

    /// One past the largest mesh index whose frequency is at most `omega`.
    pub fn index_end_at_or_below(&self, omega: f64) -> usize {
        let mut end = self.n_iw;
        while end > 0 && self.omega(end - 1) > omega {
            end -= 1;
        }
        end
    }
}

#[cfg(test)]
mod tests {
    use super::{ImTimeMesh, MatsubaraMesh};
    use std::f64::consts::PI;

    #[test]
    fn imaginary_time_grid_is_half_open_and_uniform() {
        let mesh = ImTimeMesh::new(2.0, 4).expect("mesh should build");
        assert_eq!(mesh.tau(0), 0.0);
        assert_eq!(mesh.tau(3), 1.5);
        assert_eq!(mesh.spacing(), 0.5);
        assert_eq!(mesh.len(), 4);
    }

    #[test]
    fn matsubara_frequencies_are_odd_multiples_of_pi_over_beta() {
        let mesh = MatsubaraMesh::new(2.0, 3).expect("mesh should build");
        assert!((mesh.omega(0) - PI / 2.0).abs() < 1.0e-14);
        assert!((mesh.omega(1) - 3.0 * PI / 2.0).abs() < 1.0e-14);
        assert_eq!(mesh.iomega(2).re, 0.0);
        assert!((mesh.iomega(2).im - 5.0 * PI / 2.0).abs() < 1.0e-14);
    }

    #[test]
    fn frequency_window_lookups_bracket_the_mesh() {
        let mesh = MatsubaraMesh::new(1.0, 8).expect("mesh should build");
        assert_eq!(mesh.index_at_or_above(0.0), 0);
        assert_eq!(mesh.index_at_or_above(mesh.omega(3)), 3);
        assert_eq!(mesh.index_end_at_or_below(mesh.omega(5)), 6);
        assert_eq!(mesh.index_end_at_or_below(1.0e9), 8);
    }

    #[test]
    fn invalid_meshes_are_rejected() {
        assert!(ImTimeMesh::new(0.0, 10).is_err());
        assert!(ImTimeMesh::new(1.0, 1).is_err());
        assert!(MatsubaraMesh::new(-1.0, 10).is_err());
        assert!(MatsubaraMesh::new(1.0, 0).is_err());
    }
}
