use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::core::{DispatchStrategy, LpcError, LpcResult, RawResult};
use crate::framing::Frames;
use crate::lpc::{AutocorrelationSolver, FrameSolver};

use super::pool::{panic_message, CancelToken, WorkerPool};

/// One frame paired with the model order, as handed to a solver
#[derive(Debug, Clone, Copy)]
pub struct WorkUnit<'a> {
    pub frame_index: usize,
    pub frame: &'a [f64],
    pub order: usize,
}

impl WorkUnit<'_> {
    /// Solve this unit; a panicking solver is reported as a failed unit
    fn run(&self, solver: &dyn FrameSolver) -> Envelope {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| solver.solve(self.frame, self.order)))
            .unwrap_or_else(|payload| {
                Err(LpcError::WorkerFailure {
                    frames: vec![self.frame_index],
                    reason: format!("solver panicked: {}", panic_message(payload.as_ref())),
                })
            });

        Envelope {
            frame_index: self.frame_index,
            outcome,
        }
    }
}

/// Tagged per-frame message from a worker
struct Envelope {
    frame_index: usize,
    outcome: LpcResult<Vec<f64>>,
}

/// Everything that came back from one pass
#[derive(Default)]
struct PassOutcome {
    envelopes: Vec<Envelope>,
    /// first pool-level fault (lost task, spawn failure)
    fault: Option<String>,
}

impl PassOutcome {
    fn record_fault(&mut self, fault: String) {
        warn!("{fault}");
        self.fault.get_or_insert(fault);
    }
}

/// Split `frame_count` frames into `worker_count` contiguous partitions of
/// `frame_count / worker_count` frames, plus one remainder partition
pub fn partition(frame_count: usize, worker_count: usize) -> Vec<Range<usize>> {
    let worker_count = worker_count.max(1);
    let frag = frame_count / worker_count;
    let mut ranges = Vec::with_capacity(worker_count + 1);

    if frag > 0 {
        for i in 0..worker_count {
            ranges.push(i * frag..(i + 1) * frag);
        }
    }

    let tail = worker_count * frag;
    if tail < frame_count {
        ranges.push(tail..frame_count);
    }

    ranges
}

/// Runs per-frame solves on a fixed number of workers
///
/// Results come back as `(frame_index, coefficients)` pairs in whatever
/// order the workers finish; any failed or unresolved frame fails the
/// whole pass.
pub struct WorkDispatcher {
    worker_count: usize,
    strategy: DispatchStrategy,
    solver: Arc<dyn FrameSolver>,
    cancel: CancelToken,
}

impl WorkDispatcher {
    pub fn new(worker_count: usize) -> Self {
        WorkDispatcher {
            worker_count,
            strategy: DispatchStrategy::default(),
            solver: Arc::new(AutocorrelationSolver),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: DispatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_solver(mut self, solver: Arc<dyn FrameSolver>) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn strategy(&self) -> DispatchStrategy {
        self.strategy
    }

    /// A clone of the token this dispatcher watches
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Solve every frame once and return the tagged results
    pub fn dispatch(&self, frames: &Frames, order: usize) -> LpcResult<Vec<RawResult>> {
        if self.worker_count == 0 {
            return Err(LpcError::invalid("worker count must be at least 1"));
        }
        if order == 0 {
            return Err(LpcError::invalid("model order must be at least 1"));
        }

        debug!(
            "dispatching {} frames (order {}) to {} workers, {:?}",
            frames.len(),
            order,
            self.worker_count,
            self.strategy
        );

        let outcome = match self.strategy {
            DispatchStrategy::Partitioned => self.run_partitioned(frames, order),
            DispatchStrategy::PerFrame => self.run_per_frame(frames, order),
        };

        self.collect(frames.len(), outcome)
    }

    fn run_partitioned(&self, frames: &Frames, order: usize) -> PassOutcome {
        let mut outcome = PassOutcome::default();

        let pool = match WorkerPool::new(self.worker_count) {
            Ok(pool) => pool,
            Err(e) => {
                outcome.record_fault(e.to_string());
                return outcome;
            }
        };

        let mut handles = Vec::new();
        for range in partition(frames.len(), self.worker_count) {
            if self.cancel.is_cancelled() {
                break;
            }

            trace!("submitting frames {range:?}");
            let frames = frames.clone();
            let solver = Arc::clone(&self.solver);
            let cancel = self.cancel.clone();
            let task_range = range.clone();

            let handle = pool.submit(move || {
                let mut envelopes = Vec::with_capacity(task_range.len());
                for frame_index in task_range {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let unit = WorkUnit {
                        frame_index,
                        frame: frames.frame(frame_index),
                        order,
                    };
                    envelopes.push(unit.run(solver.as_ref()));
                }
                envelopes
            });

            handles.push((range, handle));
        }

        for (range, handle) in handles {
            match handle.wait() {
                Ok(envelopes) => outcome.envelopes.extend(envelopes),
                Err(e) => outcome.record_fault(format!("partition {range:?} lost: {e}")),
            }
        }

        outcome
    }

    fn run_per_frame(&self, frames: &Frames, order: usize) -> PassOutcome {
        let mut outcome = PassOutcome::default();

        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.worker_count)
            .thread_name(|i| format!("lpc-frame-{i}"))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                outcome.record_fault(format!("failed to build thread pool: {e}"));
                return outcome;
            }
        };

        let (tx, rx) = crossbeam_channel::unbounded::<Envelope>();
        let solver = self.solver.as_ref();
        let cancel = &self.cancel;

        pool.scope(|scope| {
            for frame_index in 0..frames.len() {
                if cancel.is_cancelled() {
                    break;
                }
                let tx = tx.clone();
                scope.spawn(move |_| {
                    if cancel.is_cancelled() {
                        return;
                    }
                    let unit = WorkUnit {
                        frame_index,
                        frame: frames.frame(frame_index),
                        order,
                    };
                    // the receiver lives until after the scope ends
                    let _ = tx.send(unit.run(solver));
                });
            }
        });
        drop(tx);

        outcome.envelopes.extend(rx.iter());
        outcome
    }

    fn collect(&self, frame_count: usize, outcome: PassOutcome) -> LpcResult<Vec<RawResult>> {
        let mut resolved = vec![false; frame_count];
        let mut failed = Vec::new();
        let mut first_error = None;
        let mut results = Vec::with_capacity(outcome.envelopes.len());

        for envelope in outcome.envelopes {
            if let Some(slot) = resolved.get_mut(envelope.frame_index) {
                *slot = true;
            }
            match envelope.outcome {
                Ok(coefficients) => {
                    results.push(RawResult::new(envelope.frame_index, coefficients))
                }
                Err(e) => {
                    failed.push(envelope.frame_index);
                    first_error.get_or_insert_with(|| e.to_string());
                }
            }
        }

        let unresolved = resolved
            .iter()
            .enumerate()
            .filter(|(_, done)| !**done)
            .map(|(i, _)| i);

        let mut frames = failed;
        frames.extend(unresolved);
        if frames.is_empty() {
            return Ok(results);
        }
        frames.sort_unstable();
        frames.dedup();

        let reason = first_error
            .or(outcome.fault)
            .unwrap_or_else(|| {
                if self.cancel.is_cancelled() {
                    "analysis cancelled".to_string()
                } else {
                    "no result returned".to_string()
                }
            });

        warn!("analysis pass failed on {} frame(s): {reason}", frames.len());
        Err(LpcError::WorkerFailure { frames, reason })
    }
}
