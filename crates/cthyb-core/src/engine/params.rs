use super::operator::ManyBodyOperator;
use crate::domain::{SolverError, SolverResult};
use crate::gf::TailMoments;
use crate::process::ProcessContext;
use std::collections::BTreeMap;

/// Full keyword set accepted by `solve`.
///
/// `h_int` and `n_cycles` are mandatory (constructor arguments); every
/// other field carries the documented default. The engine never mutates
/// this structure. Unknown keys are unrepresentable by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveParameters {
    // Engine-bound keys, forwarded verbatim.
    pub h_int: ManyBodyOperator,
    pub n_cycles: u64,
    pub partition_method: String,
    pub length_cycle: u64,
    pub n_warmup_cycles: u64,
    /// `None` derives the rank-injective default seed.
    pub random_seed: Option<u64>,
    pub random_name: String,
    /// Wall-clock budget in seconds; -1 means unbounded.
    pub max_time: i64,
    /// `None` defaults to 3 on the master rank, 0 elsewhere.
    pub verbosity: Option<u32>,
    pub move_shift: bool,
    pub move_double: bool,
    pub use_trace_estimator: bool,
    pub measure_g_tau: bool,
    pub measure_g_l: bool,
    pub measure_pert_order: bool,
    pub measure_density_matrix: bool,
    pub use_norm_as_weight: bool,
    pub performance_analysis: bool,
    pub proposal_prob: BTreeMap<String, f64>,
    pub imag_threshold: f64,

    // Post-processing keys, consumed by this layer and never forwarded.
    pub perform_post_proc: bool,
    pub perform_tail_fit: bool,
    pub fit_max_moment: usize,
    pub fit_known_moments: Option<TailMoments>,
    pub fit_min_n: Option<usize>,
    pub fit_max_n: Option<usize>,
    pub fit_min_w: Option<f64>,
    pub fit_max_w: Option<f64>,
}

impl SolveParameters {
    pub fn new(h_int: ManyBodyOperator, n_cycles: u64) -> Self {
        Self {
            h_int,
            n_cycles,
            partition_method: "autopartition".to_string(),
            length_cycle: 50,
            n_warmup_cycles: 5000,
            random_seed: None,
            random_name: String::new(),
            max_time: -1,
            verbosity: None,
            move_shift: true,
            move_double: false,
            use_trace_estimator: false,
            measure_g_tau: true,
            measure_g_l: false,
            measure_pert_order: false,
            measure_density_matrix: false,
            use_norm_as_weight: false,
            performance_analysis: false,
            proposal_prob: BTreeMap::new(),
            imag_threshold: 1.0e-15,
            perform_post_proc: true,
            perform_tail_fit: false,
            fit_max_moment: 3,
            fit_known_moments: None,
            fit_min_n: None,
            fit_max_n: None,
            fit_min_w: None,
            fit_max_w: None,
        }
    }

    pub fn validate(&self) -> SolverResult<()> {
        if self.h_int.is_empty() {
            return Err(SolverError::configuration(
                "CONFIG.H_INT",
                "h_int is mandatory and must contain at least one non-trivial term",
            ));
        }
        if self.n_cycles == 0 {
            return Err(SolverError::configuration(
                "CONFIG.N_CYCLES",
                "n_cycles is mandatory and must be positive",
            ));
        }
        Ok(())
    }

    /// True when no tail-fit window was supplied, neither by index nor by
    /// frequency; the fitter then falls back to the outer 20% heuristic.
    pub fn uses_default_fit_window(&self) -> bool {
        self.fit_min_n.is_none()
            && self.fit_max_n.is_none()
            && self.fit_min_w.is_none()
            && self.fit_max_w.is_none()
    }

    /// Routes post-processing-only keys away from the engine keyword set
    /// and resolves the rank-dependent defaults of the remainder.
    pub fn split(&self, context: &ProcessContext) -> (EngineParameters, PostProcParameters) {
        let engine = EngineParameters {
            h_int: self.h_int.clone(),
            n_cycles: self.n_cycles,
            partition_method: self.partition_method.clone(),
            length_cycle: self.length_cycle,
            n_warmup_cycles: self.n_warmup_cycles,
            random_seed: self.random_seed.unwrap_or_else(|| context.derived_seed()),
            random_name: self.random_name.clone(),
            max_time: self.max_time,
            verbosity: self.verbosity.unwrap_or_else(|| context.default_verbosity()),
            move_shift: self.move_shift,
            move_double: self.move_double,
            use_trace_estimator: self.use_trace_estimator,
            measure_g_tau: self.measure_g_tau,
            measure_g_l: self.measure_g_l,
            measure_pert_order: self.measure_pert_order,
            measure_density_matrix: self.measure_density_matrix,
            use_norm_as_weight: self.use_norm_as_weight,
            performance_analysis: self.performance_analysis,
            proposal_prob: self.proposal_prob.clone(),
            imag_threshold: self.imag_threshold,
        };
        let post_proc = PostProcParameters {
            perform_post_proc: self.perform_post_proc,
            perform_tail_fit: self.perform_tail_fit,
            fit_max_moment: self.fit_max_moment,
            fit_known_moments: self.fit_known_moments.clone(),
            fit_min_n: self.fit_min_n,
            fit_max_n: self.fit_max_n,
            fit_min_w: self.fit_min_w,
            fit_max_w: self.fit_max_w,
        };
        (engine, post_proc)
    }
}

/// The subset of `SolveParameters` forwarded to the sampling engine, with
/// rank-dependent defaults resolved. Retained as `last_solve_parameters`.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineParameters {
    pub h_int: ManyBodyOperator,
    pub n_cycles: u64,
    pub partition_method: String,
    pub length_cycle: u64,
    pub n_warmup_cycles: u64,
    pub random_seed: u64,
    pub random_name: String,
    pub max_time: i64,
    pub verbosity: u32,
    pub move_shift: bool,
    pub move_double: bool,
    pub use_trace_estimator: bool,
    pub measure_g_tau: bool,
    pub measure_g_l: bool,
    pub measure_pert_order: bool,
    pub measure_density_matrix: bool,
    pub use_norm_as_weight: bool,
    pub performance_analysis: bool,
    pub proposal_prob: BTreeMap<String, f64>,
    pub imag_threshold: f64,
}

/// Keys consumed by the post-processing pipeline only.
#[derive(Debug, Clone, PartialEq)]
pub struct PostProcParameters {
    pub perform_post_proc: bool,
    pub perform_tail_fit: bool,
    pub fit_max_moment: usize,
    pub fit_known_moments: Option<TailMoments>,
    pub fit_min_n: Option<usize>,
    pub fit_max_n: Option<usize>,
    pub fit_min_w: Option<f64>,
    pub fit_max_w: Option<f64>,
}
