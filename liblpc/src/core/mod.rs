pub mod config;
pub mod error;
pub mod types;

pub use config::{default_worker_count, AnalysisConfig, DispatchStrategy};
pub use error::{LpcError, LpcResult};
pub use types::{CoefficientMatrix, RawResult};
