//! Configuration for an analysis pass

use serde::{Deserialize, Serialize};

use super::{LpcError, LpcResult};

/// How frames are handed to workers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchStrategy {
    /// `worker_count` contiguous partitions plus one remainder partition,
    /// one task per partition on a fixed worker pool
    #[default]
    Partitioned,
    /// one task per frame on a rayon thread pool
    PerFrame,
}

impl std::str::FromStr for DispatchStrategy {
    type Err = LpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "partitioned" | "partition" => Ok(DispatchStrategy::Partitioned),
            "per-frame" | "perframe" | "frame" => Ok(DispatchStrategy::PerFrame),
            _ => Err(LpcError::invalid(format!(
                "unknown dispatch strategy: {s} (use partitioned or per-frame)"
            ))),
        }
    }
}

/// Number of logical CPUs, the default worker count
pub fn default_worker_count() -> usize {
    num_cpus::get().max(1)
}

/// Analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Frame length in samples, positive and even (hop is half of it)
    pub frame_len: usize,

    /// LPC model order `p`; rows hold `p + 1` coefficients
    pub order: usize,

    /// Number of concurrent workers. Defaults to the number of logical
    /// CPUs reported by the OS.
    pub worker_count: usize,

    /// Partitioning policy
    pub strategy: DispatchStrategy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            frame_len: 512,
            order: 20,
            worker_count: default_worker_count(),
            strategy: DispatchStrategy::Partitioned,
        }
    }
}

impl AnalysisConfig {
    pub fn new(frame_len: usize, order: usize) -> Self {
        Self {
            frame_len,
            order,
            ..Default::default()
        }
    }

    /// Parse from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> LpcResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| LpcError::invalid(format!("bad analysis config: {e}")))
    }

    /// Set worker count
    pub fn with_workers(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    /// Set dispatch strategy
    pub fn with_strategy(mut self, strategy: DispatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Hop size, `frame_len / 2`
    pub fn hop(&self) -> usize {
        self.frame_len / 2
    }

    /// Check every parameter before any work is started
    pub fn validate(&self) -> LpcResult<()> {
        if self.frame_len == 0 || self.frame_len % 2 != 0 {
            return Err(LpcError::invalid(format!(
                "frame length must be positive and even, got {}",
                self.frame_len
            )));
        }
        if self.order == 0 {
            return Err(LpcError::invalid("model order must be at least 1"));
        }
        if self.order >= self.frame_len {
            return Err(LpcError::invalid(format!(
                "model order {} must be smaller than the frame length {}",
                self.order, self.frame_len
            )));
        }
        if self.worker_count == 0 {
            return Err(LpcError::invalid("worker count must be at least 1"));
        }
        Ok(())
    }
}
