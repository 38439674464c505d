//! Fleetsync daemon runtime: sync scheduler + status page server + metrics server.

mod error;
pub mod http;
pub mod jitter;
pub mod metrics;
mod runtime;
pub mod scheduler;

pub use error::DaemonError;
pub use jitter::Jitter;
pub use metrics::SyncMetrics;
pub use runtime::{init_tracing, run, start_blocking, Collaborators};
pub use scheduler::{CycleOutcome, CyclePhase, Scheduler};
