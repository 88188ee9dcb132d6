//! Error types for LPC analysis

use thiserror::Error;

/// Analysis errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LpcError {
    /// Bad frame length, model order, worker count or filter parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Signal too short to form a single analysis frame
    #[error("Insufficient samples: need at least {required}, got {actual}")]
    InsufficientSamples { required: usize, actual: usize },

    /// Solver could not produce a well-defined coefficient set
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// A dispatched unit errored, panicked, was cancelled or never reported
    #[error("Worker failure on frame(s) {frames:?}: {reason}")]
    WorkerFailure { frames: Vec<usize>, reason: String },

    /// The assembler received a payload it does not recognize
    #[error("Result shape error at frame {frame_index}: {reason}")]
    ResultShapeError { frame_index: usize, reason: String },
}

impl LpcError {
    /// Frame indices this error refers to (empty for parameter errors)
    pub fn frames(&self) -> Vec<usize> {
        match self {
            LpcError::WorkerFailure { frames, .. } => frames.clone(),
            LpcError::ResultShapeError { frame_index, .. } => vec![*frame_index],
            _ => Vec::new(),
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        LpcError::InvalidParameter(msg.into())
    }
}

/// Result type for analysis operations
pub type LpcResult<T> = Result<T, LpcError>;
