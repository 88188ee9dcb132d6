//! Worker dispatch tests for liblpc
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use liblpc::{
    assemble, hann_window, solve, CancelToken, DispatchStrategy, FrameSolver, Frames, LpcError,
    LpcResult, WorkDispatcher,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const STRATEGIES: [DispatchStrategy; 2] =
    [DispatchStrategy::Partitioned, DispatchStrategy::PerFrame];

/// `count` windowed noise frames; frames listed in `silent` are all zero
fn noise_frames(count: usize, frame_len: usize, silent: &[usize], seed: u64) -> Vec<Vec<f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let window = hann_window(frame_len);
    (0..count)
        .map(|i| {
            if silent.contains(&i) {
                vec![0.0; frame_len]
            } else {
                window
                    .iter()
                    .map(|w| w * rng.random_range(-1.0..1.0))
                    .collect()
            }
        })
        .collect()
}

/// Answers silent frames with the short `[1.0]` marker
struct TruncatingSolver;

impl FrameSolver for TruncatingSolver {
    fn solve(&self, frame: &[f64], order: usize) -> LpcResult<Vec<f64>> {
        if frame.iter().all(|&s| s == 0.0) {
            Ok(vec![1.0])
        } else {
            solve(frame, order)
        }
    }
}

// ============================================================================
// Result completeness
// ============================================================================

#[test]
fn test_every_frame_returned_once() {
    let rows = noise_frames(37, 64, &[], 1);
    let frames = Frames::from_rows(&rows).unwrap();

    for strategy in STRATEGIES {
        for workers in [1, 3, 8, 64] {
            let dispatcher = WorkDispatcher::new(workers).with_strategy(strategy);
            let results = dispatcher.dispatch(&frames, 8).unwrap();

            let mut indices: Vec<usize> = results.iter().map(|r| r.frame_index).collect();
            indices.sort_unstable();
            assert_eq!(indices, (0..37).collect::<Vec<_>>(), "{strategy:?} x{workers}");
            assert!(results.iter().all(|r| r.coefficients.len() == 9));
        }
    }
}

#[test]
fn test_tagged_results_match_direct_solve() {
    let rows = noise_frames(12, 128, &[], 2);
    let frames = Frames::from_rows(&rows).unwrap();

    for strategy in STRATEGIES {
        let results = WorkDispatcher::new(4)
            .with_strategy(strategy)
            .dispatch(&frames, 10)
            .unwrap();
        for result in results {
            assert_eq!(result.coefficients, solve(&rows[result.frame_index], 10).unwrap());
        }
    }
}

#[test]
fn test_zero_workers_rejected() {
    let frames = Frames::from_rows(&noise_frames(2, 32, &[], 3)).unwrap();
    assert!(matches!(
        WorkDispatcher::new(0).dispatch(&frames, 4),
        Err(LpcError::InvalidParameter(_))
    ));
}

// ============================================================================
// Silent frame in a 10-frame pass
// ============================================================================

#[test]
fn test_silent_frame_row_is_unity() {
    let (frame_len, order) = (512, 20);
    let rows = noise_frames(10, frame_len, &[4], 4);
    let frames = Frames::from_rows(&rows).unwrap();

    for strategy in STRATEGIES {
        let results = WorkDispatcher::new(3)
            .with_strategy(strategy)
            .dispatch(&frames, order)
            .unwrap();
        let matrix = assemble(frames.len(), order, results).unwrap();

        assert_eq!(matrix.frame_count(), 10);
        let mut unity = vec![0.0; order + 1];
        unity[0] = 1.0;
        assert_eq!(matrix.row(4).unwrap(), &unity[..]);

        for i in (0..10).filter(|&i| i != 4) {
            assert_eq!(matrix.row(i).unwrap(), &solve(&rows[i], order).unwrap()[..]);
        }
    }
}

#[test]
fn test_short_marker_is_repaired() {
    let order = 20;
    let rows = noise_frames(10, 512, &[4, 9], 5);
    let frames = Frames::from_rows(&rows).unwrap();

    for strategy in STRATEGIES {
        let results = WorkDispatcher::new(4)
            .with_strategy(strategy)
            .with_solver(Arc::new(TruncatingSolver))
            .dispatch(&frames, order)
            .unwrap();
        let marker = results.iter().find(|r| r.frame_index == 4).unwrap();
        assert_eq!(marker.coefficients, vec![1.0]);

        let matrix = assemble(frames.len(), order, results).unwrap();
        for i in [4, 9] {
            let row = matrix.row(i).unwrap();
            assert_eq!(row.len(), order + 1);
            assert_eq!(row[0], 1.0);
            assert!(row[1..].iter().all(|&c| c == 0.0));
        }
    }
}

// ============================================================================
// Failure propagation
// ============================================================================

#[test]
fn test_numerical_failure_names_frame() {
    let mut rows = noise_frames(10, 512, &[], 6);
    rows[7][100] = f64::NAN;
    let frames = Frames::from_rows(&rows).unwrap();

    for strategy in STRATEGIES {
        for workers in [1, 4] {
            let err = WorkDispatcher::new(workers)
                .with_strategy(strategy)
                .dispatch(&frames, 20)
                .unwrap_err();
            match err {
                LpcError::WorkerFailure { frames, reason } => {
                    assert_eq!(frames, vec![7]);
                    assert!(reason.contains("not finite"), "{reason}");
                }
                other => panic!("expected WorkerFailure, got {other:?}"),
            }
        }
    }
}

#[test]
fn test_failing_solver_reports_every_failed_frame() {
    let rows = noise_frames(16, 64, &[], 7);
    let frames = Frames::from_rows(&rows).unwrap();
    let bad = [rows[2][10], rows[11][10]];

    let solver = move |frame: &[f64], order: usize| -> LpcResult<Vec<f64>> {
        if bad.contains(&frame[10]) {
            Err(LpcError::NumericalError("injected".to_string()))
        } else {
            solve(frame, order)
        }
    };
    let solver: Arc<dyn FrameSolver> = Arc::new(solver);

    for strategy in STRATEGIES {
        let err = WorkDispatcher::new(3)
            .with_strategy(strategy)
            .with_solver(Arc::clone(&solver))
            .dispatch(&frames, 4)
            .unwrap_err();
        assert_eq!(err.frames(), vec![2, 11]);
    }
}

#[test]
fn test_panicking_solver_becomes_worker_failure() {
    let rows = noise_frames(8, 64, &[], 8);
    let frames = Frames::from_rows(&rows).unwrap();
    let poisoned = rows[5][3];

    let solver = move |frame: &[f64], order: usize| -> LpcResult<Vec<f64>> {
        if frame[3] == poisoned {
            panic!("solver blew up");
        }
        solve(frame, order)
    };
    let solver: Arc<dyn FrameSolver> = Arc::new(solver);

    for strategy in STRATEGIES {
        let err = WorkDispatcher::new(2)
            .with_strategy(strategy)
            .with_solver(Arc::clone(&solver))
            .dispatch(&frames, 4)
            .unwrap_err();
        match err {
            LpcError::WorkerFailure { frames, reason } => {
                assert_eq!(frames, vec![5]);
                assert!(reason.contains("solver blew up"), "{reason}");
            }
            other => panic!("expected WorkerFailure, got {other:?}"),
        }
    }
}

// ============================================================================
// Cancellation
// ============================================================================

#[test]
fn test_cancel_before_dispatch() {
    let frames = Frames::from_rows(&noise_frames(6, 64, &[], 9)).unwrap();
    let token = CancelToken::new();
    token.cancel();

    for strategy in STRATEGIES {
        let err = WorkDispatcher::new(2)
            .with_strategy(strategy)
            .with_cancel_token(token.clone())
            .dispatch(&frames, 4)
            .unwrap_err();
        match err {
            LpcError::WorkerFailure { frames, reason } => {
                assert_eq!(frames, (0..6).collect::<Vec<_>>());
                assert_eq!(reason, "analysis cancelled");
            }
            other => panic!("expected WorkerFailure, got {other:?}"),
        }
    }
}

#[test]
fn test_cancel_during_pass() {
    let frames = Frames::from_rows(&noise_frames(40, 64, &[], 10)).unwrap();

    for strategy in STRATEGIES {
        let token = CancelToken::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let solver = {
            let token = token.clone();
            let calls = Arc::clone(&calls);
            move |frame: &[f64], order: usize| -> LpcResult<Vec<f64>> {
                if calls.fetch_add(1, Ordering::SeqCst) == 2 {
                    token.cancel();
                }
                solve(frame, order)
            }
        };

        let err = WorkDispatcher::new(1)
            .with_strategy(strategy)
            .with_solver(Arc::new(solver))
            .with_cancel_token(token.clone())
            .dispatch(&frames, 4)
            .unwrap_err();

        assert!(matches!(err, LpcError::WorkerFailure { .. }));
        assert!(calls.load(Ordering::SeqCst) < 40);

        // the token can be lowered and the same frames analyzed again
        token.reset();
        let results = WorkDispatcher::new(1)
            .with_strategy(strategy)
            .with_cancel_token(token)
            .dispatch(&frames, 4)
            .unwrap();
        assert_eq!(results.len(), 40);
    }
}
