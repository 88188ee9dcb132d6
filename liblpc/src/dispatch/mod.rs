//! Concurrent dispatch of per-frame solves
//!
//! Two strategies share one contract: each frame is submitted once, every
//! result carries its frame index, and the caller blocks until the pass is
//! complete.

pub mod dispatcher;
pub mod pool;

pub use dispatcher::{partition, WorkDispatcher, WorkUnit};
pub use pool::{CancelToken, PoolError, TaskHandle, WorkerPool};
