//! Wires the simulated sources, the motion engine and the dispatcher together.

mod orchestrator;
mod stats;

pub use orchestrator::{Pipeline, PipelineConfig};
pub use stats::{PipelineStats, StopReason};
