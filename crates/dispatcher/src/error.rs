//! Errors raised while assembling the dispatcher

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatcherError {
    /// A configured sink could not be started
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Two sinks share a name; the report is keyed by it
    #[error("sink name '{name}' is used more than once")]
    DuplicateSink { name: String },
}

impl DispatcherError {
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn duplicate_sink(name: impl Into<String>) -> Self {
        Self::DuplicateSink { name: name.into() }
    }
}
