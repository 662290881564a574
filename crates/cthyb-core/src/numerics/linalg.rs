use super::DenseComplexMatrix;
use num_complex::Complex64;

const SINGULAR_PIVOT_EPSILON: f64 = 1.0e-15;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinAlgError {
    #[error("matrix inversion requires a square matrix, got {rows}x{cols}")]
    NonSquareMatrix { rows: usize, cols: usize },
    #[error("matrix inversion requires a non-empty matrix")]
    EmptyMatrix,
    #[error("matrix is singular at pivot index {pivot_index}")]
    SingularMatrix { pivot_index: usize },
    #[error("right-hand side length mismatch: expected {expected}, got {actual}")]
    RhsLengthMismatch { expected: usize, actual: usize },
}

pub fn identity(dimension: usize) -> DenseComplexMatrix {
    let mut matrix = DenseComplexMatrix::zeros(dimension, dimension);
    for index in 0..dimension {
        matrix[(index, index)] = Complex64::new(1.0, 0.0);
    }
    matrix
}

/// Inverse of a square complex matrix via pivoted LU factorization.
pub fn invert(matrix: &DenseComplexMatrix) -> Result<DenseComplexMatrix, LinAlgError> {
    let factors = Factorization::compute(matrix)?;
    let dimension = factors.dimension();
    let mut inverse = DenseComplexMatrix::zeros(dimension, dimension);
    let mut basis = vec![Complex64::new(0.0, 0.0); dimension];

    for col in 0..dimension {
        basis.fill(Complex64::new(0.0, 0.0));
        basis[col] = Complex64::new(1.0, 0.0);

        let column = factors.back_substitute(&basis)?;
        for row in 0..dimension {
            inverse[(row, col)] = column[row];
        }
    }

    Ok(inverse)
}

/// Solution of `matrix * x = rhs` for a single right-hand side.
pub fn solve(
    matrix: &DenseComplexMatrix,
    rhs: &[Complex64],
) -> Result<Vec<Complex64>, LinAlgError> {
    Factorization::compute(matrix)?.back_substitute(rhs)
}

struct Factorization {
    lu: DenseComplexMatrix,
    pivots: Vec<usize>,
}

impl Factorization {
    fn compute(matrix: &DenseComplexMatrix) -> Result<Self, LinAlgError> {
        let rows = matrix.nrows();
        let cols = matrix.ncols();
        if rows == 0 || cols == 0 {
            return Err(LinAlgError::EmptyMatrix);
        }
        if rows != cols {
            return Err(LinAlgError::NonSquareMatrix { rows, cols });
        }

        let dimension = rows;
        let mut lu = matrix.clone();
        let mut pivots: Vec<usize> = (0..dimension).collect();
        let threshold_sq = SINGULAR_PIVOT_EPSILON * SINGULAR_PIVOT_EPSILON;

        for pivot_col in 0..dimension {
            let mut pivot_row = pivot_col;
            let mut pivot_norm_sq = lu[(pivot_col, pivot_col)].norm_sqr();
            for row in (pivot_col + 1)..dimension {
                let norm_sq = lu[(row, pivot_col)].norm_sqr();
                if norm_sq > pivot_norm_sq {
                    pivot_norm_sq = norm_sq;
                    pivot_row = row;
                }
            }
            if pivot_norm_sq <= threshold_sq {
                return Err(LinAlgError::SingularMatrix {
                    pivot_index: pivot_col,
                });
            }

            if pivot_row != pivot_col {
                for col in 0..dimension {
                    let value = lu[(pivot_col, col)];
                    lu[(pivot_col, col)] = lu[(pivot_row, col)];
                    lu[(pivot_row, col)] = value;
                }
                pivots.swap(pivot_col, pivot_row);
            }

            let pivot = lu[(pivot_col, pivot_col)];
            for row in (pivot_col + 1)..dimension {
                lu[(row, pivot_col)] /= pivot;
                let multiplier = lu[(row, pivot_col)];
                for col in (pivot_col + 1)..dimension {
                    let updated = lu[(row, col)] - multiplier * lu[(pivot_col, col)];
                    lu[(row, col)] = updated;
                }
            }
        }

        Ok(Self { lu, pivots })
    }

    fn dimension(&self) -> usize {
        self.lu.nrows()
    }

    fn back_substitute(&self, rhs: &[Complex64]) -> Result<Vec<Complex64>, LinAlgError> {
        let dimension = self.dimension();
        if rhs.len() != dimension {
            return Err(LinAlgError::RhsLengthMismatch {
                expected: dimension,
                actual: rhs.len(),
            });
        }

        let mut forward = vec![Complex64::new(0.0, 0.0); dimension];
        for row in 0..dimension {
            let mut value = rhs[self.pivots[row]];
            for col in 0..row {
                value -= self.lu[(row, col)] * forward[col];
            }
            forward[row] = value;
        }

        let mut solution = vec![Complex64::new(0.0, 0.0); dimension];
        for row in (0..dimension).rev() {
            let mut value = forward[row];
            for col in (row + 1)..dimension {
                value -= self.lu[(row, col)] * solution[col];
            }

            let diagonal = self.lu[(row, row)];
            if diagonal.norm_sqr() <= SINGULAR_PIVOT_EPSILON * SINGULAR_PIVOT_EPSILON {
                return Err(LinAlgError::SingularMatrix { pivot_index: row });
            }
            solution[row] = value / diagonal;
        }

        Ok(solution)
    }
}
