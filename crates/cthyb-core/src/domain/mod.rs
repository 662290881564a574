pub mod errors;

pub use errors::{SolverError, SolverErrorCategory, SolverResult};
