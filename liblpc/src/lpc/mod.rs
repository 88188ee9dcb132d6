//! Linear predictive coding for a single analysis frame
//!
//! Autocorrelation method: `r[0..=p]` of the windowed frame, then the
//! Levinson-Durbin recursion for the inverse filter `A(z)`.

pub mod levinson;
pub mod solver;

pub use levinson::{
    autocorrelation, canonical_coefficients, is_silent, levinson_durbin, residual, LpcModel,
};
pub use solver::{solve, AutocorrelationSolver, FrameSolver};
