//! Deterministic post-processing of the raw engine measurements: Fourier
//! transform onto the Matsubara axis, Dyson inversion, and high-frequency
//! tail fitting.

pub mod dyson;
pub mod fourier;
pub mod tail_fit;

pub use dyson::{dyson_greens_function, dyson_self_energy};
pub use fourier::fourier_to_matsubara;
pub use tail_fit::{TailFitOptions, TailFitOutcome, fit_tail};
