use crate::domain::{SolverError, SolverResult};
use crate::gf::{BlockGfImFreq, BlockStructure};
use crate::numerics::identity;

/// Largest acceptable deviation of the bare propagator's tail from the
/// canonical `0 + 1/(iw)` decay before a warning is raised.
pub const BARE_TAIL_TOLERANCE: f64 = 1.0e-6;

/// The bare propagator assigned before a solve must carry exactly the
/// block layout declared at construction.
pub fn check_structure_match(
    declared: &BlockStructure,
    g0_iw: &BlockGfImFreq,
) -> SolverResult<()> {
    if g0_iw.structure() != declared {
        return Err(SolverError::configuration(
            "CONFIG.G0_STRUCTURE",
            format!(
                "bare propagator blocks [{}] do not match the declared structure [{}]",
                g0_iw.structure().names().collect::<Vec<_>>().join(", "),
                declared.names().collect::<Vec<_>>().join(", ")
            ),
        ));
    }
    Ok(())
}

/// Names of blocks whose tail metadata deviates from the canonical bare
/// decay `M_0 = 0`, `M_1 = 1`. A propagator without tail metadata cannot
/// be checked and reports no violations.
pub fn bare_tail_violations(g0_iw: &BlockGfImFreq) -> Vec<String> {
    let Some(tail) = g0_iw.tail() else {
        return Vec::new();
    };

    let mut violations = Vec::new();
    for (block_index, name) in g0_iw.structure().names().enumerate() {
        let dim = g0_iw.structure().dim_at(block_index);
        let unit = identity(dim);

        let mut deviation: f64 = 0.0;
        if let Some(m0) = tail.moment(block_index, 0) {
            for row in 0..dim {
                for col in 0..dim {
                    deviation = deviation.max(m0[(row, col)].norm());
                }
            }
        }
        if let Some(m1) = tail.moment(block_index, 1) {
            for row in 0..dim {
                for col in 0..dim {
                    deviation = deviation.max((m1[(row, col)] - unit[(row, col)]).norm());
                }
            }
        } else {
            // Tail metadata that stops at order zero cannot represent a
            // 1/(iw) decay at all.
            deviation = f64::INFINITY;
        }

        if deviation > BARE_TAIL_TOLERANCE {
            violations.push(name.to_string());
        }
    }
    violations
}
