//! Frame-wise linear predictive coding analysis
//!
//! A signal is cut into 50%-overlapping Hann-windowed frames, each frame is
//! solved independently on a pool of workers, and the tagged results are
//! placed back into a `frame_count × (order + 1)` matrix in frame order.
//!
//! Silent frames always come out as `[1, 0, ..., 0]`, whether the solver
//! returned the full vector or the single-element `[1.0]`.

#![allow(clippy::needless_range_loop)]

pub mod analyzer;
pub mod assemble;
pub mod core;
pub mod dispatch;
pub mod filters;
pub mod framing;
pub mod lpc;
pub mod spectrum;

pub use analyzer::LpcAnalyzer;
pub use assemble::assemble;
pub use crate::core::{
    default_worker_count, AnalysisConfig, CoefficientMatrix, DispatchStrategy, LpcError,
    LpcResult, RawResult,
};
pub use dispatch::{
    partition, CancelToken, PoolError, TaskHandle, WorkDispatcher, WorkUnit, WorkerPool,
};
pub use filters::{BandPassGain, Biquad, FilterKind};
pub use framing::{frame_count, frame_signal, hann_window, pad_to_hop, Frames};
pub use lpc::{solve, AutocorrelationSolver, FrameSolver, LpcModel};
pub use spectrum::{frame_spectra, lpc_envelope, overlap_add};

/// Analyze a mono signal with `config`
pub fn analyze(signal: &[f64], config: &AnalysisConfig) -> LpcResult<CoefficientMatrix> {
    LpcAnalyzer::new(config.clone()).analyze(signal)
}
