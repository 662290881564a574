pub mod linalg;

pub use linalg::{LinAlgError, identity, invert, solve};

use faer::Mat;
use num_complex::Complex64;

pub type DenseComplexMatrix = Mat<Complex64>;
