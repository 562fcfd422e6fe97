//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration invalid after command-line overrides
    #[error("Configuration validation failed: {0}")]
    ConfigValidation(#[from] contracts::ContractError),

    /// Simulated source could not be created
    #[error("Failed to create simulated source: {0}")]
    Source(#[from] ingestion::IngestionError),

    /// Recording engine could not be started or stopped
    #[error("Motion engine error: {0}")]
    Engine(#[from] motion_engine::MotionError),

    /// Dispatcher could not be created
    #[error("Dispatcher error: {0}")]
    Dispatcher(#[from] dispatcher::DispatcherError),

    /// Graceful shutdown error
    #[error("Error during shutdown: {message}")]
    Shutdown { message: String },
}

impl CliError {
    pub fn shutdown(message: impl Into<String>) -> Self {
        Self::Shutdown {
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
