//! Full analysis pass: frame, dispatch, assemble

use std::sync::Arc;
use std::time::Instant;

use log::debug;

use crate::assemble::assemble;
use crate::core::{AnalysisConfig, CoefficientMatrix, LpcError, LpcResult};
use crate::dispatch::{CancelToken, WorkDispatcher};
use crate::framing::{frame_count, frame_signal, Frames};
use crate::lpc::{is_silent, AutocorrelationSolver, FrameSolver};

/// Frame-wise LPC analyzer
///
/// ```
/// use liblpc::{AnalysisConfig, LpcAnalyzer};
///
/// let signal: Vec<f64> = (0..4096).map(|i| (i as f64 * 0.05).sin()).collect();
/// let analyzer = LpcAnalyzer::new(AnalysisConfig::new(512, 12).with_workers(2));
/// let matrix = analyzer.analyze(&signal).unwrap();
/// assert_eq!(matrix.frame_count(), 15);
/// assert_eq!(matrix.width(), 13);
/// ```
pub struct LpcAnalyzer {
    config: AnalysisConfig,
    solver: Arc<dyn FrameSolver>,
    cancel: CancelToken,
}

impl LpcAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        LpcAnalyzer {
            config,
            solver: Arc::new(AutocorrelationSolver),
            cancel: CancelToken::new(),
        }
    }

    /// Replace the per-frame solver
    pub fn with_solver(mut self, solver: Arc<dyn FrameSolver>) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Token that cancels passes run by this analyzer
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Analyze a mono signal
    ///
    /// Parameters and signal length are checked before any work is
    /// dispatched.
    pub fn analyze(&self, signal: &[f64]) -> LpcResult<CoefficientMatrix> {
        self.config.validate()?;
        frame_count(signal.len(), self.config.frame_len)?;

        let frames = frame_signal(signal, self.config.frame_len)?;
        self.analyze_frames(&frames)
    }

    /// Analyze frames that are already cut and windowed
    pub fn analyze_frames(&self, frames: &Frames) -> LpcResult<CoefficientMatrix> {
        self.config.validate()?;
        if self.config.order >= frames.frame_len() {
            return Err(LpcError::invalid(format!(
                "model order {} must be smaller than the frame length {}",
                self.config.order,
                frames.frame_len()
            )));
        }

        let started = Instant::now();
        let dispatcher = WorkDispatcher::new(self.config.worker_count)
            .with_strategy(self.config.strategy)
            .with_solver(Arc::clone(&self.solver))
            .with_cancel_token(self.cancel.clone());

        let raw = dispatcher.dispatch(frames, self.config.order)?;
        let matrix = assemble(frames.len(), self.config.order, raw)?;

        debug!(
            "analyzed {} frames ({} silent) in {:.3} ms",
            matrix.frame_count(),
            matrix.rows().filter(|row| is_silent(row)).count(),
            started.elapsed().as_secs_f64() * 1000.0
        );

        Ok(matrix)
    }
}
