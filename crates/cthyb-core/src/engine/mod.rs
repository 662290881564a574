pub mod operator;
pub mod params;

pub use operator::{DensityFactor, ManyBodyOperator, OperatorTerm};
pub use params::{EngineParameters, PostProcParameters, SolveParameters};

use crate::domain::{SolverError, SolverResult};
use crate::gf::{BlockGfImFreq, BlockGfImTime, BlockGfLegendre, BlockStructure};
use crate::numerics::DenseComplexMatrix;
use crate::process::ProcessContext;
use std::collections::BTreeMap;

/// Problem description handed to the sampling engine on every solve call.
#[derive(Debug, Clone, Copy)]
pub struct ImpurityProblem<'a> {
    pub beta: f64,
    pub structure: &'a BlockStructure,
    pub g0_iw: &'a BlockGfImFreq,
    pub n_tau: usize,
    pub n_l: usize,
}

/// Diagnostic histogram accumulated by the engine (perturbation orders,
/// performance counters).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Histogram {
    pub counts: Vec<f64>,
}

impl Histogram {
    pub fn n_bins(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }
}

/// Raw measurements returned by the engine after sampling. Cross-process
/// reduction has already happened inside the engine; these are final.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutput {
    pub g_tau: Option<BlockGfImTime>,
    pub g_l: Option<BlockGfLegendre>,
    pub perturbation_order_total: Option<Histogram>,
    pub perturbation_order: Option<BTreeMap<String, Histogram>>,
    pub density_matrix: Option<Vec<DenseComplexMatrix>>,
    pub average_sign: f64,
    pub solve_status: i32,
}

/// Failure reported by the external engine; carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("engine failed with status {status}: {message}")]
pub struct EngineError {
    pub status: i32,
    pub message: String,
}

/// The external continuous-time Monte Carlo engine. Opaque to this crate;
/// it receives the problem plus sampling parameters and returns the raw
/// measured quantities.
pub trait ImpurityEngine {
    fn solve(
        &mut self,
        problem: &ImpurityProblem<'_>,
        parameters: &EngineParameters,
    ) -> Result<EngineOutput, EngineError>;
}

/// The single call boundary to the engine: routes post-processing keys
/// away, forwards the rest verbatim, records the forwarded set, and adds
/// no retry or error recovery of its own.
#[derive(Debug)]
pub struct EngineInvoker<E> {
    engine: E,
    last_parameters: Option<EngineParameters>,
}

impl<E: ImpurityEngine> EngineInvoker<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            last_parameters: None,
        }
    }

    /// Parameters forwarded on the most recent invocation, recorded even
    /// when the engine subsequently failed.
    pub fn last_parameters(&self) -> Option<&EngineParameters> {
        self.last_parameters.as_ref()
    }

    pub fn invoke(
        &mut self,
        problem: &ImpurityProblem<'_>,
        parameters: &SolveParameters,
        context: &ProcessContext,
    ) -> SolverResult<(EngineOutput, PostProcParameters)> {
        let (engine_parameters, post_proc) = parameters.split(context);
        self.last_parameters = Some(engine_parameters.clone());

        let output = self
            .engine
            .solve(problem, &engine_parameters)
            .map_err(|error| SolverError::engine_failure("ENGINE.SOLVE", error.to_string()))?;
        Ok((output, post_proc))
    }
}
