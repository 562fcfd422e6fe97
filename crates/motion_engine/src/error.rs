//! Motion engine error types.

use contracts::ContractError;
use thiserror::Error;

/// Errors surfaced by [`crate::MotionHandler`] construction and configuration
///
/// Anomalies inside an analysis pass are logged, never returned.
#[derive(Debug, Error)]
pub enum MotionError {
    #[error("invalid motion config: {0}")]
    Config(#[from] ContractError),

    #[error("threshold {0}% out of range [0, 100]")]
    InvalidThreshold(u8),

    #[error("analysis window must be positive, got {0}")]
    InvalidWindow(i64),

    #[error("failed to spawn engine thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("engine thread for stream '{stream}' panicked")]
    WorkerPanicked { stream: String },
}
