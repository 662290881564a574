use crate::domain::SolverResult;
use crate::gf::{BlockGfImFreq, BlockGfImTime, MatsubaraMesh};
use crate::numerics::DenseComplexMatrix;
use num_complex::Complex64;

/// Fourier transform of a measured imaginary-time Green's function onto a
/// fermionic Matsubara mesh, `G(iw_n) = int_0^beta dtau e^{iw_n tau} G(tau)`.
///
/// The equal-time discontinuity `C_1 = -(G(0+) - G(0-))` makes the naive
/// quadrature ring at high frequency. For fermionic anti-periodicity the
/// constant `-C_1/2` transforms exactly to `C_1/(iw_n)`, so the transform
/// subtracts the discontinuity, integrates the smooth remainder on the
/// uniform grid, and restores `C_1/(iw_n)` analytically. This also pins the
/// correct `1/iw` leading tail.
pub fn fourier_to_matsubara(g_tau: &BlockGfImTime, n_iw: usize) -> SolverResult<BlockGfImFreq> {
    let time_mesh = *g_tau.mesh();
    let freq_mesh = MatsubaraMesh::new(time_mesh.beta(), n_iw)?;
    let mut g_iw = BlockGfImFreq::new(freq_mesh, g_tau.structure().clone());

    let n_tau = time_mesh.len();
    let spacing = time_mesh.spacing();

    for block_index in 0..g_tau.structure().n_blocks() {
        let dim = g_tau.structure().dim_at(block_index);
        let samples = g_tau.block(block_index);

        // G(beta-) from the last two grid points; the grid is half-open and
        // does not carry the endpoint itself.
        let mut discontinuity = DenseComplexMatrix::zeros(dim, dim);
        for row in 0..dim {
            for col in 0..dim {
                let at_beta =
                    2.0 * samples[n_tau - 1][(row, col)] - samples[n_tau - 2][(row, col)];
                discontinuity[(row, col)] = -(samples[0][(row, col)] + at_beta);
            }
        }

        for point in 0..n_iw {
            let omega = freq_mesh.omega(point);
            let iomega = freq_mesh.iomega(point);
            let mut accumulated = DenseComplexMatrix::zeros(dim, dim);

            for (tau_index, sample) in samples.iter().enumerate() {
                let phase = Complex64::from_polar(spacing, omega * time_mesh.tau(tau_index));
                for row in 0..dim {
                    for col in 0..dim {
                        let smooth = sample[(row, col)] + 0.5 * discontinuity[(row, col)];
                        accumulated[(row, col)] += phase * smooth;
                    }
                }
            }

            let value = g_iw.value_mut(block_index, point);
            for row in 0..dim {
                for col in 0..dim {
                    value[(row, col)] =
                        accumulated[(row, col)] + discontinuity[(row, col)] / iomega;
                }
            }
        }
    }

    Ok(g_iw)
}
