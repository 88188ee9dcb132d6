use crate::core::{LpcError, LpcResult};

use super::levinson::{autocorrelation, canonical_coefficients, levinson_durbin};

/// Per-frame LPC solve, the unit of work handed to the worker pool
///
/// Implementations must be pure: the same frame and order always give the
/// same vector, with no state shared between calls. A solver may answer a
/// silent frame with the single element `[1.0]` instead of the full
/// `[1, 0, ..., 0]`; the assembler restores the full row.
pub trait FrameSolver: Send + Sync {
    fn solve(&self, frame: &[f64], order: usize) -> LpcResult<Vec<f64>>;
}

/// Autocorrelation-method LPC (Levinson-Durbin)
#[derive(Debug, Clone, Copy, Default)]
pub struct AutocorrelationSolver;

impl FrameSolver for AutocorrelationSolver {
    fn solve(&self, frame: &[f64], order: usize) -> LpcResult<Vec<f64>> {
        solve(frame, order)
    }
}

impl<F> FrameSolver for F
where
    F: Fn(&[f64], usize) -> LpcResult<Vec<f64>> + Send + Sync,
{
    fn solve(&self, frame: &[f64], order: usize) -> LpcResult<Vec<f64>> {
        self(frame, order)
    }
}

/// LPC coefficients `[1, a1, ..., ap]` of one windowed frame
///
/// An all-zero frame returns exactly `[1, 0, ..., 0]` for any order.
pub fn solve(frame: &[f64], order: usize) -> LpcResult<Vec<f64>> {
    if order == 0 {
        return Err(LpcError::invalid("model order must be at least 1"));
    }
    if order >= frame.len() {
        return Err(LpcError::invalid(format!(
            "model order {order} must be smaller than the frame length {}",
            frame.len()
        )));
    }

    if frame.iter().all(|&s| s == 0.0) {
        return Ok(canonical_coefficients(order));
    }

    let autocorr = autocorrelation(frame, order);
    Ok(levinson_durbin(&autocorr, order)?.coefficients)
}
