use crate::domain::{SolverError, SolverResult};
use crate::gf::BlockGfImFreq;
use crate::numerics::{invert, LinAlgError};

fn check_layout(
    lhs: &BlockGfImFreq,
    rhs: &BlockGfImFreq,
    context: &'static str,
) -> SolverResult<()> {
    if !lhs.same_layout(rhs) {
        return Err(SolverError::numerical(
            "NUMERICS.DYSON_LAYOUT",
            format!("{context}: operands must share block structure, mesh and dimensions"),
        ));
    }
    Ok(())
}

fn map_inversion_error(block: &str, point: usize) -> impl FnOnce(LinAlgError) -> SolverError + '_ {
    move |error| {
        SolverError::numerical(
            "NUMERICS.DYSON_INVERT",
            format!("block '{block}', frequency index {point}: {error}"),
        )
    }
}

/// Self-energy from Dyson's equation,
/// `Sigma(iw) = G0^-1(iw) - G^-1(iw)` block-wise and frequency-wise.
///
/// Each inverse is a genuine matrix inversion over the block's orbital
/// indices; Green's functions at fixed frequency are full matrices.
pub fn dyson_self_energy(
    g0_iw: &BlockGfImFreq,
    g_iw: &BlockGfImFreq,
) -> SolverResult<BlockGfImFreq> {
    check_layout(g0_iw, g_iw, "Dyson self-energy")?;

    let mut sigma_iw = BlockGfImFreq::new(*g0_iw.mesh(), g0_iw.structure().clone());
    for (block_index, name) in g0_iw.structure().names().enumerate() {
        let dim = g0_iw.structure().dim_at(block_index);
        for point in 0..g0_iw.mesh().len() {
            let bare_inverse = invert(g0_iw.value(block_index, point))
                .map_err(map_inversion_error(name, point))?;
            let full_inverse = invert(g_iw.value(block_index, point))
                .map_err(map_inversion_error(name, point))?;

            let sigma = sigma_iw.value_mut(block_index, point);
            for row in 0..dim {
                for col in 0..dim {
                    sigma[(row, col)] = bare_inverse[(row, col)] - full_inverse[(row, col)];
                }
            }
        }
    }
    Ok(sigma_iw)
}

/// Interacting propagator rebuilt from a self-energy,
/// `G(iw) = (G0^-1(iw) - Sigma(iw))^-1`; used to keep `G_iw` consistent
/// with a tail-fitted `Sigma_iw`.
pub fn dyson_greens_function(
    g0_iw: &BlockGfImFreq,
    sigma_iw: &BlockGfImFreq,
) -> SolverResult<BlockGfImFreq> {
    check_layout(g0_iw, sigma_iw, "Dyson propagator")?;

    let mut g_iw = BlockGfImFreq::new(*g0_iw.mesh(), g0_iw.structure().clone());
    for (block_index, name) in g0_iw.structure().names().enumerate() {
        let dim = g0_iw.structure().dim_at(block_index);
        for point in 0..g0_iw.mesh().len() {
            let mut denominator = invert(g0_iw.value(block_index, point))
                .map_err(map_inversion_error(name, point))?;
            let sigma = sigma_iw.value(block_index, point);
            for row in 0..dim {
                for col in 0..dim {
                    denominator[(row, col)] -= sigma[(row, col)];
                }
            }
            *g_iw.value_mut(block_index, point) =
                invert(&denominator).map_err(map_inversion_error(name, point))?;
        }
    }
    Ok(g_iw)
}
