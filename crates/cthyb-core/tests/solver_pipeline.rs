//! End-to-end solves against analytic engine doubles: a single-pole
//! Anderson-style scenario where the exact self-energy is a constant
//! level shift.

use cthyb_core::domain::SolverErrorCategory;
use cthyb_core::engine::{
    EngineError, EngineOutput, EngineParameters, ImpurityEngine, ImpurityProblem,
};
use cthyb_core::gf::{BlockStructure, ImTimeMesh, TailMoments};
use cthyb_core::solver::Diagnostic;
use cthyb_core::{BlockGfImTime, ManyBodyOperator, SolveParameters, Solver};
use num_complex::Complex64;

const BETA: f64 = 5.0;
const N_IW: usize = 16;
const N_TAU: usize = 65536;
const BARE_LEVEL: f64 = 0.3;
const LEVEL_SHIFT: f64 = 0.8;

/// Deterministic engine double measuring the exact `G(tau)` of a single
/// fermionic pole at `epsilon + shift`. With the bare propagator set to
/// the pole at `epsilon`, Dyson's equation gives a constant self-energy
/// equal to `shift`.
struct PoleEngine {
    epsilon: f64,
    shift: f64,
}

impl ImpurityEngine for PoleEngine {
    fn solve(
        &mut self,
        problem: &ImpurityProblem<'_>,
        parameters: &EngineParameters,
    ) -> Result<EngineOutput, EngineError> {
        let g_tau = if parameters.measure_g_tau {
            let mesh = ImTimeMesh::new(problem.beta, problem.n_tau).map_err(|error| {
                EngineError {
                    status: 1,
                    message: error.to_string(),
                }
            })?;
            let mut g_tau = BlockGfImTime::new(mesh, problem.structure.clone());
            let pole = self.epsilon + self.shift;
            let norm = 1.0 + (-pole * problem.beta).exp();
            for block_index in 0..problem.structure.n_blocks() {
                let dim = problem.structure.dim_at(block_index);
                for point in 0..problem.n_tau {
                    let tau = mesh.tau(point);
                    let sample = Complex64::new(-(-pole * tau).exp() / norm, 0.0);
                    for orbital in 0..dim {
                        g_tau.value_mut(block_index, point)[(orbital, orbital)] = sample;
                    }
                }
            }
            Some(g_tau)
        } else {
            None
        };

        Ok(EngineOutput {
            g_tau,
            g_l: None,
            perturbation_order_total: None,
            perturbation_order: None,
            density_matrix: None,
            average_sign: 1.0,
            solve_status: 0,
        })
    }
}

struct FailingEngine;

impl ImpurityEngine for FailingEngine {
    fn solve(
        &mut self,
        _problem: &ImpurityProblem<'_>,
        _parameters: &EngineParameters,
    ) -> Result<EngineOutput, EngineError> {
        Err(EngineError {
            status: 3,
            message: "configuration space exhausted".to_string(),
        })
    }
}

fn single_orbital_structure() -> BlockStructure {
    BlockStructure::new(vec![("up".to_string(), vec![0])]).expect("structure should build")
}

fn pole_solver() -> Solver<PoleEngine> {
    let engine = PoleEngine {
        epsilon: BARE_LEVEL,
        shift: LEVEL_SHIFT,
    };
    let mut solver = Solver::with_options(
        engine,
        BETA,
        single_orbital_structure(),
        N_IW,
        N_TAU,
        30,
        cthyb_core::ProcessContext::serial(),
    )
    .expect("solver should build");

    for point in 0..N_IW {
        let iw = solver.g0_iw().mesh().iomega(point);
        let value = (iw - Complex64::new(BARE_LEVEL, 0.0)).inv();
        solver.g0_iw_mut().value_mut(0, point)[(0, 0)] = value;
    }
    solver
        .g0_iw_mut()
        .set_tail(TailMoments::bare_normalized(single_orbital_structure()));
    solver
}

fn hubbard_parameters() -> SolveParameters {
    SolveParameters::new(
        ManyBodyOperator::density_density(4.0, ("up", 0), ("up", 0)),
        10_000,
    )
}

#[test]
fn single_pole_solve_yields_a_constant_level_shift_self_energy() {
    let mut solver = pole_solver();
    let status = solver
        .solve(&hubbard_parameters())
        .expect("solve should succeed");

    assert_eq!(status, 0);
    assert_eq!(solver.average_sign(), 1.0);
    assert!(solver.g_tau().is_some(), "raw measurement is retained");

    for point in 0..N_IW {
        let sigma = solver.sigma_iw().value(0, point)[(0, 0)];
        assert!(
            (sigma - Complex64::new(LEVEL_SHIFT, 0.0)).norm() < 0.05,
            "point {point}: sigma {sigma} should approximate the shift {LEVEL_SHIFT}"
        );
    }
    assert!(solver.last_diagnostics().is_empty(), "clean inputs warn about nothing");
}

#[test]
fn identical_solves_produce_identical_outputs() {
    let mut solver = pole_solver();
    let parameters = hubbard_parameters();

    solver.solve(&parameters).expect("first solve should succeed");
    let first_g = solver.g_iw().clone();
    let first_sigma = solver.sigma_iw().clone();

    solver.solve(&parameters).expect("second solve should succeed");

    assert_eq!(solver.g_iw(), &first_g);
    assert_eq!(solver.sigma_iw(), &first_sigma);
}

#[test]
fn forwarded_engine_parameters_are_retained_with_resolved_defaults() {
    let mut solver = pole_solver();
    solver
        .solve(&hubbard_parameters())
        .expect("solve should succeed");

    let recorded = solver
        .last_solve_parameters()
        .expect("parameters should be recorded");
    assert_eq!(recorded.n_cycles, 10_000);
    assert_eq!(recorded.random_seed, 34788, "serial rank derives the base seed");
    assert_eq!(recorded.verbosity, 3, "master rank defaults to verbose");
}

#[test]
fn deviating_bare_tails_raise_one_aggregated_warning() {
    let structure = BlockStructure::new(vec![
        ("up".to_string(), vec![0]),
        ("down".to_string(), vec![0]),
    ])
    .expect("structure should build");

    let engine = PoleEngine {
        epsilon: BARE_LEVEL,
        shift: LEVEL_SHIFT,
    };
    let mut solver = Solver::with_options(
        engine,
        BETA,
        structure.clone(),
        N_IW,
        N_TAU,
        30,
        cthyb_core::ProcessContext::serial(),
    )
    .expect("solver should build");

    for block_index in 0..2 {
        for point in 0..N_IW {
            let iw = solver.g0_iw().mesh().iomega(point);
            solver.g0_iw_mut().value_mut(block_index, point)[(0, 0)] =
                (iw - Complex64::new(BARE_LEVEL, 0.0)).inv();
        }
    }
    let mut tail = TailMoments::bare_normalized(structure);
    for block_index in 0..2 {
        let mut skewed = cthyb_core::numerics::DenseComplexMatrix::zeros(1, 1);
        skewed[(0, 0)] = Complex64::new(1.0 + 1.0e-3, 0.0);
        tail.set_moment(block_index, 1, skewed)
            .expect("moment should set");
    }
    solver.g0_iw_mut().set_tail(tail);

    solver
        .solve(&hubbard_parameters())
        .expect("tail deviation is a warning, not an error");

    assert_eq!(
        solver.last_diagnostics(),
        &[Diagnostic::BareTailDecay {
            blocks: vec!["up".to_string(), "down".to_string()],
        }],
        "both blocks collapse into a single warning"
    );
}

#[test]
fn engine_failures_surface_with_parameters_still_recorded() {
    let mut solver = Solver::with_options(
        FailingEngine,
        BETA,
        single_orbital_structure(),
        N_IW,
        N_TAU,
        30,
        cthyb_core::ProcessContext::serial(),
    )
    .expect("solver should build");

    let error = solver
        .solve(&hubbard_parameters())
        .expect_err("engine failure should propagate");

    assert_eq!(error.category(), SolverErrorCategory::EngineFailure);
    assert_eq!(error.category().exit_code(), 5);
    assert!(error.message().contains("configuration space exhausted"));
    assert!(
        solver.last_solve_parameters().is_some(),
        "the forwarded keyword set survives a failed invocation"
    );
}

#[test]
fn aborted_solves_still_record_their_own_diagnostics() {
    let mut solver = Solver::with_options(
        FailingEngine,
        BETA,
        single_orbital_structure(),
        N_IW,
        N_TAU,
        30,
        cthyb_core::ProcessContext::serial(),
    )
    .expect("solver should build");

    let mut tail = TailMoments::bare_normalized(single_orbital_structure());
    let mut skewed = cthyb_core::numerics::DenseComplexMatrix::zeros(1, 1);
    skewed[(0, 0)] = Complex64::new(1.0 + 1.0e-3, 0.0);
    tail.set_moment(0, 1, skewed).expect("moment should set");
    solver.g0_iw_mut().set_tail(tail);

    solver
        .solve(&hubbard_parameters())
        .expect_err("engine failure should propagate");

    // The warning was printed before the engine ran, so introspection
    // must report it for this solve, not a stale earlier one.
    assert_eq!(
        solver.last_diagnostics(),
        &[Diagnostic::BareTailDecay {
            blocks: vec!["up".to_string()],
        }]
    );
}

#[test]
fn default_window_tail_fit_warns_and_attaches_sigma_moments() {
    let mut solver = pole_solver();
    let mut parameters = hubbard_parameters();
    parameters.perform_tail_fit = true;
    // First order suffices for a constant self-energy and keeps the
    // extrapolation to infinite frequency well conditioned.
    parameters.fit_max_moment = 1;

    solver.solve(&parameters).expect("solve should succeed");

    assert!(
        solver
            .last_diagnostics()
            .contains(&Diagnostic::DefaultTailFitWindow),
        "fitting without an explicit window must warn"
    );

    let tail = solver.sigma_tail().expect("fitted moments should be attached");
    let m0 = tail.moment(0, 0).expect("order 0 should exist")[(0, 0)];
    assert!(
        (m0.re - LEVEL_SHIFT).abs() < 0.05,
        "constant self-energy fits into M0, got {m0}"
    );

    // G is rebuilt from the smoothed self-energy, staying Dyson-consistent.
    for point in 0..N_IW {
        let g0_inv = solver.g0_iw().value(0, point)[(0, 0)].inv();
        let sigma = solver.sigma_iw().value(0, point)[(0, 0)];
        let g = solver.g_iw().value(0, point)[(0, 0)];
        assert!(
            ((g0_inv - sigma).inv() - g).norm() < 1.0e-10,
            "point {point} violates Dyson consistency"
        );
    }
}

#[test]
fn explicit_window_tail_fit_does_not_warn() {
    let mut solver = pole_solver();
    let mut parameters = hubbard_parameters();
    parameters.perform_tail_fit = true;
    parameters.fit_max_moment = 1;
    parameters.fit_min_n = Some(8);

    solver.solve(&parameters).expect("solve should succeed");
    assert!(solver.last_diagnostics().is_empty());
    assert!(solver.sigma_tail().is_some());
}

#[test]
fn disabling_post_processing_leaves_derived_quantities_zeroed() {
    let mut solver = pole_solver();
    let mut parameters = hubbard_parameters();
    parameters.perform_post_proc = false;

    solver.solve(&parameters).expect("solve should succeed");

    assert!(solver.g_tau().is_some(), "the raw measurement is still stored");
    assert!(solver.g_iw().is_zero());
    assert!(solver.sigma_iw().is_zero());
}

#[test]
fn without_a_time_measurement_nothing_is_derived() {
    let mut solver = pole_solver();
    let mut parameters = hubbard_parameters();
    parameters.measure_g_tau = false;

    solver.solve(&parameters).expect("solve should succeed");

    assert!(solver.g_tau().is_none());
    assert!(solver.g_iw().is_zero());
    assert!(solver.sigma_iw().is_zero());
}

#[test]
fn structure_mismatch_fails_before_the_engine_runs() {
    let mut solver = pole_solver();
    let other = BlockStructure::new(vec![("down".to_string(), vec![0])])
        .expect("structure should build");
    solver.set_g0_iw(cthyb_core::BlockGfImFreq::new(
        *pole_solver().g0_iw().mesh(),
        other,
    ));

    let error = solver
        .solve(&hubbard_parameters())
        .expect_err("mismatched structure should fail");
    assert_eq!(error.category(), SolverErrorCategory::ConfigurationError);
    assert!(
        solver.last_solve_parameters().is_none(),
        "validation failures never reach the engine"
    );
}
