/// Interaction part of the local Hamiltonian as a polynomial of density
/// factors, e.g. `U * n("up", 0) * n("down", 0)`.
///
/// The sampling engine interprets the operator; this layer only carries it
/// and checks that a mandatory `h_int` is actually non-trivial.
#[derive(Debug, Clone, PartialEq)]
pub struct ManyBodyOperator {
    terms: Vec<OperatorTerm>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperatorTerm {
    pub coefficient: f64,
    pub factors: Vec<DensityFactor>,
}

/// The occupation operator `n_{block, orbital}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DensityFactor {
    pub block: String,
    pub orbital: usize,
}

impl ManyBodyOperator {
    pub fn empty() -> Self {
        Self { terms: Vec::new() }
    }

    pub fn from_terms(terms: Vec<OperatorTerm>) -> Self {
        Self { terms }
    }

    /// `coefficient * n_{block_a, orbital_a} * n_{block_b, orbital_b}`.
    pub fn density_density(
        coefficient: f64,
        (block_a, orbital_a): (&str, usize),
        (block_b, orbital_b): (&str, usize),
    ) -> Self {
        Self {
            terms: vec![OperatorTerm {
                coefficient,
                factors: vec![
                    DensityFactor {
                        block: block_a.to_string(),
                        orbital: orbital_a,
                    },
                    DensityFactor {
                        block: block_b.to_string(),
                        orbital: orbital_b,
                    },
                ],
            }],
        }
    }

    pub fn terms(&self) -> &[OperatorTerm] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms
            .iter()
            .all(|term| term.coefficient == 0.0 || term.factors.is_empty())
    }
}
