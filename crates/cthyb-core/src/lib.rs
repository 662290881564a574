//! Post-processing and orchestration around a continuous-time quantum
//! impurity Monte Carlo engine.
//!
//! The sampling engine itself is opaque behind [`engine::ImpurityEngine`];
//! this crate owns everything around it: block Green's function
//! containers, solve-parameter handling with rank-aware defaults, the
//! Fourier transform of the measured `G(tau)`, Dyson inversion for the
//! self-energy, and high-frequency tail fitting.

pub mod domain;
pub mod engine;
pub mod gf;
pub mod numerics;
pub mod post;
pub mod process;
pub mod solver;

pub use domain::{SolverError, SolverErrorCategory, SolverResult};
pub use engine::{
    EngineError, EngineOutput, EngineParameters, Histogram, ImpurityEngine, ImpurityProblem,
    ManyBodyOperator, SolveParameters,
};
pub use gf::{
    BlockGfImFreq, BlockGfImTime, BlockGfLegendre, BlockStructure, ImTimeMesh, MatsubaraMesh,
    TailMoments,
};
pub use process::ProcessContext;
pub use solver::{Diagnostic, Solver};
