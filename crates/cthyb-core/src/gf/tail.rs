use super::BlockStructure;
use crate::domain::{SolverError, SolverResult};
use crate::numerics::{DenseComplexMatrix, identity};

/// High-frequency moments `{M_0 .. M_k}` of `sum_k M_k / (iw)^k`, one
/// ordered list of matrix coefficients per block.
#[derive(Debug, Clone, PartialEq)]
pub struct TailMoments {
    structure: BlockStructure,
    moments: Vec<Vec<DenseComplexMatrix>>,
}

impl TailMoments {
    /// Zero moments of orders `0..=max_order` for every block.
    pub fn zero(structure: BlockStructure, max_order: usize) -> Self {
        let moments = (0..structure.n_blocks())
            .map(|block_index| {
                let dim = structure.dim_at(block_index);
                (0..=max_order)
                    .map(|_| DenseComplexMatrix::zeros(dim, dim))
                    .collect()
            })
            .collect();
        Self { structure, moments }
    }

    /// The tail of a properly normalized bare propagator: `M_0 = 0`,
    /// `M_1 = 1`.
    pub fn bare_normalized(structure: BlockStructure) -> Self {
        let mut tail = Self::zero(structure, 1);
        for block_index in 0..tail.structure.n_blocks() {
            let dim = tail.structure.dim_at(block_index);
            tail.moments[block_index][1] = identity(dim);
        }
        tail
    }

    pub fn structure(&self) -> &BlockStructure {
        &self.structure
    }

    pub fn max_order(&self) -> usize {
        self.moments[0].len() - 1
    }

    pub fn moment(&self, block_index: usize, order: usize) -> Option<&DenseComplexMatrix> {
        self.moments.get(block_index)?.get(order)
    }

    pub fn set_moment(
        &mut self,
        block_index: usize,
        order: usize,
        value: DenseComplexMatrix,
    ) -> SolverResult<()> {
        let dim = self.structure.dim_at(block_index);
        if value.nrows() != dim || value.ncols() != dim {
            return Err(SolverError::configuration(
                "CONFIG.TAIL_MOMENT_SHAPE",
                format!(
                    "moment for block '{}' must be {dim}x{dim}, got {}x{}",
                    self.structure.name_at(block_index),
                    value.nrows(),
                    value.ncols()
                ),
            ));
        }
        let slot = self
            .moments
            .get_mut(block_index)
            .and_then(|orders| orders.get_mut(order))
            .ok_or_else(|| {
                SolverError::configuration(
                    "CONFIG.TAIL_MOMENT_ORDER",
                    format!("moment order {order} out of range"),
                )
            })?;
        *slot = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::TailMoments;
    use crate::gf::BlockStructure;
    use crate::numerics::DenseComplexMatrix;
    use num_complex::Complex64;

    fn two_block_structure() -> BlockStructure {
        BlockStructure::new(vec![
            ("up".to_string(), vec![0]),
            ("down".to_string(), vec![0, 1]),
        ])
        .expect("structure should build")
    }

    #[test]
    fn bare_normalized_tail_has_identity_first_moment() {
        let tail = TailMoments::bare_normalized(two_block_structure());

        assert_eq!(tail.max_order(), 1);
        let m0 = tail.moment(0, 0).expect("order 0 should exist");
        assert_eq!(m0[(0, 0)], Complex64::new(0.0, 0.0));
        let m1 = tail.moment(1, 1).expect("order 1 should exist");
        assert_eq!(m1[(0, 0)], Complex64::new(1.0, 0.0));
        assert_eq!(m1[(0, 1)], Complex64::new(0.0, 0.0));
        assert_eq!(m1[(1, 1)], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn set_moment_rejects_mismatched_shapes() {
        let mut tail = TailMoments::zero(two_block_structure(), 2);
        let wrong = DenseComplexMatrix::zeros(3, 3);
        let error = tail
            .set_moment(0, 1, wrong)
            .expect_err("shape mismatch should fail");
        assert_eq!(error.placeholder(), "CONFIG.TAIL_MOMENT_SHAPE");

        let mut value = DenseComplexMatrix::zeros(1, 1);
        value[(0, 0)] = Complex64::new(2.5, 0.0);
        tail.set_moment(0, 1, value).expect("valid shape should set");
        assert_eq!(
            tail.moment(0, 1).expect("moment should exist")[(0, 0)],
            Complex64::new(2.5, 0.0)
        );
    }
}
