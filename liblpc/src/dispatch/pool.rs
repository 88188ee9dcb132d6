//! Fixed-size worker pool with per-task result handles

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam_channel::Receiver;
use thiserror::Error;

/// Pool and task handle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(String),

    #[error("Task panicked: {0}")]
    Panicked(String),

    #[error("Task was dropped before it produced a result")]
    Disconnected,
}

/// Cooperative cancellation flag shared between a caller and its workers
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag; workers stop before their next unit of work
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Lower the flag so the token can be reused for another pass
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }
}

/// Handle to one submitted task
pub struct TaskHandle<T> {
    receiver: Receiver<thread::Result<T>>,
}

impl<T> TaskHandle<T> {
    /// Block until the task finishes; a panic inside the task comes back as
    /// `PoolError::Panicked`
    pub fn wait(self) -> Result<T, PoolError> {
        match self.receiver.recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(payload)) => Err(PoolError::Panicked(panic_message(payload.as_ref()))),
            Err(_) => Err(PoolError::Disconnected),
        }
    }
}

/// Fixed set of named rayon worker threads with per-task result handles
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    pub fn new(size: usize) -> Result<Self, PoolError> {
        if size == 0 {
            return Err(PoolError::Spawn("pool size must be at least 1".to_string()));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(size)
            .thread_name(|id| format!("lpc-worker-{id}"))
            .build()
            .map_err(|e| PoolError::Spawn(e.to_string()))?;

        Ok(WorkerPool { pool })
    }

    /// number of worker threads
    pub fn size(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Queue `task` and return a handle to its result
    pub fn submit<T, F>(&self, task: F) -> TaskHandle<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.pool.spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(task));
            // receiver may already be gone if the caller gave up waiting
            let _ = tx.send(outcome);
        });

        TaskHandle { receiver: rx }
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_and_wait() {
        let pool = WorkerPool::new(2).unwrap();
        assert_eq!(pool.size(), 2);
        let handles: Vec<_> = (0..8).map(|i| pool.submit(move || i * i)).collect();
        let results: Vec<i32> = handles.into_iter().map(|h| h.wait().unwrap()).collect();
        assert_eq!(results, vec![0, 1, 4, 9, 16, 25, 36, 49]);
    }

    #[test]
    fn test_panic_is_propagated() {
        let pool = WorkerPool::new(1).unwrap();
        let handle = pool.submit(|| -> u32 { panic!("boom") });
        assert_eq!(handle.wait(), Err(PoolError::Panicked("boom".to_string())));

        // the worker survives the panic
        let handle = pool.submit(|| 7);
        assert_eq!(handle.wait(), Ok(7));
    }

    #[test]
    fn test_tasks_run_on_named_workers() {
        let pool = WorkerPool::new(3).unwrap();
        assert_eq!(pool.size(), 3);
        let name = pool
            .submit(|| thread::current().name().map(str::to_string))
            .wait()
            .unwrap();
        assert!(name.unwrap().starts_with("lpc-worker-"));
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(WorkerPool::new(0).is_err());
    }

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
        token.reset();
        assert!(!clone.is_cancelled());
    }
}
