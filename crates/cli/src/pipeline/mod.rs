//! Pipeline orchestration module.

mod orchestrator;
mod shutdown;
mod stats;

pub use orchestrator::{Pipeline, PipelineConfig, Source};
pub use shutdown::shutdown_signal;
pub use stats::PipelineStats;
