//! Orchestration of a full impurity solve: input validation, engine
//! invocation, and the deterministic post-processing chain.

pub mod diagnostics;
pub mod validate;

pub use diagnostics::{Diagnostic, DiagnosticReporter};

use crate::domain::{SolverError, SolverResult};
use crate::engine::{
    EngineInvoker, EngineParameters, Histogram, ImpurityEngine, ImpurityProblem, SolveParameters,
};
use crate::gf::{BlockGfImFreq, BlockGfImTime, BlockGfLegendre, BlockStructure, TailMoments};
use crate::numerics::DenseComplexMatrix;
use crate::post::{
    TailFitOptions, dyson_greens_function, dyson_self_energy, fit_tail, fourier_to_matsubara,
};
use crate::process::ProcessContext;
use std::collections::BTreeMap;

pub const DEFAULT_N_IW: usize = 1025;
pub const DEFAULT_N_TAU: usize = 10001;
pub const DEFAULT_N_L: usize = 30;

/// Impurity solver wrapping an opaque continuous-time sampling engine.
///
/// Holds the bare propagator the caller fills in, drives the engine, and
/// derives `G(iw)` and `Sigma(iw)` from the measured `G(tau)`. Result
/// containers start zero-filled and are overwritten on each solve.
#[derive(Debug)]
pub struct Solver<E> {
    beta: f64,
    structure: BlockStructure,
    n_iw: usize,
    n_tau: usize,
    n_l: usize,
    context: ProcessContext,
    invoker: EngineInvoker<E>,
    g0_iw: BlockGfImFreq,
    g_tau: Option<BlockGfImTime>,
    g_l: Option<BlockGfLegendre>,
    g_iw: BlockGfImFreq,
    sigma_iw: BlockGfImFreq,
    perturbation_order_total: Option<Histogram>,
    perturbation_order: Option<BTreeMap<String, Histogram>>,
    density_matrix: Option<Vec<DenseComplexMatrix>>,
    average_sign: f64,
    solve_status: i32,
    diagnostics: Vec<Diagnostic>,
}

impl<E: ImpurityEngine> Solver<E> {
    /// Serial solver with the default mesh sizes.
    pub fn new(engine: E, beta: f64, structure: BlockStructure) -> SolverResult<Self> {
        Self::with_options(
            engine,
            beta,
            structure,
            DEFAULT_N_IW,
            DEFAULT_N_TAU,
            DEFAULT_N_L,
            ProcessContext::serial(),
        )
    }

    pub fn with_options(
        engine: E,
        beta: f64,
        structure: BlockStructure,
        n_iw: usize,
        n_tau: usize,
        n_l: usize,
        context: ProcessContext,
    ) -> SolverResult<Self> {
        let freq_mesh = crate::gf::MatsubaraMesh::new(beta, n_iw)?;
        crate::gf::ImTimeMesh::new(beta, n_tau)?;
        if n_tau < 2 * n_iw {
            return Err(SolverError::configuration(
                "CONFIG.N_TAU",
                format!(
                    "n_tau ({n_tau}) must be at least twice n_iw ({n_iw}) to resolve every \
                     Matsubara frequency"
                ),
            ));
        }

        let g0_iw = BlockGfImFreq::new(freq_mesh, structure.clone());
        let g_iw = BlockGfImFreq::new(freq_mesh, structure.clone());
        let sigma_iw = BlockGfImFreq::new(freq_mesh, structure.clone());

        Ok(Self {
            beta,
            structure,
            n_iw,
            n_tau,
            n_l,
            context,
            invoker: EngineInvoker::new(engine),
            g0_iw,
            g_tau: None,
            g_l: None,
            g_iw,
            sigma_iw,
            perturbation_order_total: None,
            perturbation_order: None,
            density_matrix: None,
            average_sign: 0.0,
            solve_status: 0,
            diagnostics: Vec::new(),
        })
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn structure(&self) -> &BlockStructure {
        &self.structure
    }

    pub fn n_iw(&self) -> usize {
        self.n_iw
    }

    pub fn n_tau(&self) -> usize {
        self.n_tau
    }

    pub fn n_l(&self) -> usize {
        self.n_l
    }

    pub fn context(&self) -> &ProcessContext {
        &self.context
    }

    pub fn g0_iw(&self) -> &BlockGfImFreq {
        &self.g0_iw
    }

    /// The caller fills the bare propagator in place between construction
    /// and solve; nothing is validated at this transition.
    pub fn g0_iw_mut(&mut self) -> &mut BlockGfImFreq {
        &mut self.g0_iw
    }

    pub fn set_g0_iw(&mut self, g0_iw: BlockGfImFreq) {
        self.g0_iw = g0_iw;
    }

    pub fn g_tau(&self) -> Option<&BlockGfImTime> {
        self.g_tau.as_ref()
    }

    pub fn g_l(&self) -> Option<&BlockGfLegendre> {
        self.g_l.as_ref()
    }

    pub fn g_iw(&self) -> &BlockGfImFreq {
        &self.g_iw
    }

    pub fn sigma_iw(&self) -> &BlockGfImFreq {
        &self.sigma_iw
    }

    /// Fitted high-frequency moments of the self-energy, present only
    /// after a tail-fitted solve.
    pub fn sigma_tail(&self) -> Option<&TailMoments> {
        self.sigma_iw.tail()
    }

    pub fn perturbation_order_total(&self) -> Option<&Histogram> {
        self.perturbation_order_total.as_ref()
    }

    pub fn perturbation_order(&self) -> Option<&BTreeMap<String, Histogram>> {
        self.perturbation_order.as_ref()
    }

    pub fn density_matrix(&self) -> Option<&[DenseComplexMatrix]> {
        self.density_matrix.as_deref()
    }

    pub fn average_sign(&self) -> f64 {
        self.average_sign
    }

    pub fn solve_status(&self) -> i32 {
        self.solve_status
    }

    /// Engine keyword set forwarded on the most recent solve.
    pub fn last_solve_parameters(&self) -> Option<&EngineParameters> {
        self.invoker.last_parameters()
    }

    /// Diagnostics raised by the most recent solve.
    pub fn last_diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Runs one full solve: validate, warn, sample, post-process. Returns
    /// the engine's status code; identical inputs produce identical
    /// post-processed outputs.
    pub fn solve(&mut self, parameters: &SolveParameters) -> SolverResult<i32> {
        parameters.validate()?;
        validate::check_structure_match(&self.structure, &self.g0_iw)?;

        let mut reporter = DiagnosticReporter::new(self.context);
        let tail_violations = validate::bare_tail_violations(&self.g0_iw);
        if !tail_violations.is_empty() {
            reporter.report(Diagnostic::BareTailDecay {
                blocks: tail_violations,
            });
        }
        if parameters.perform_post_proc
            && parameters.perform_tail_fit
            && parameters.uses_default_fit_window()
        {
            reporter.report(Diagnostic::DefaultTailFitWindow);
        }
        // Everything this solve will warn about has been emitted by now;
        // record it before the engine call so introspection matches the
        // printed output even when the invocation fails.
        self.diagnostics = reporter.into_emitted();

        let problem = ImpurityProblem {
            beta: self.beta,
            structure: &self.structure,
            g0_iw: &self.g0_iw,
            n_tau: self.n_tau,
            n_l: self.n_l,
        };
        let (output, post_proc) = self.invoker.invoke(&problem, parameters, &self.context)?;

        self.g_tau = output.g_tau;
        self.g_l = output.g_l;
        self.perturbation_order_total = output.perturbation_order_total;
        self.perturbation_order = output.perturbation_order;
        self.density_matrix = output.density_matrix;
        self.average_sign = output.average_sign;
        self.solve_status = output.solve_status;

        if post_proc.perform_post_proc {
            if let Some(g_tau) = &self.g_tau {
                self.g_iw = fourier_to_matsubara(g_tau, self.n_iw)?;
                self.sigma_iw = dyson_self_energy(&self.g0_iw, &self.g_iw)?;

                if post_proc.perform_tail_fit {
                    fit_tail(&mut self.sigma_iw, &TailFitOptions::from_post_proc(&post_proc))?;
                    // Rebuild G from the smoothed self-energy so the pair
                    // stays Dyson-consistent.
                    self.g_iw = dyson_greens_function(&self.g0_iw, &self.sigma_iw)?;
                }
            }
        }

        Ok(self.solve_status)
    }
}
