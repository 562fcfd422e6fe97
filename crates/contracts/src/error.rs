//! Error type shared across crate boundaries
//!
//! Configuration problems surface while loading a blueprint; sink problems
//! surface while handing packets or segments downstream.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContractError {
    /// Text could not be decoded as TOML/JSON, or could not be encoded
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A decoded blueprint breaks a field constraint
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// The downstream queue had no room; the item was not taken
    #[error("sink '{sink_name}' queue full")]
    SinkQueueFull { sink_name: String },

    /// The sink was closed or its consumer went away
    #[error("sink '{sink_name}' closed")]
    SinkClosed { sink_name: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContractError {
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}

/// Reports the first offending field; `__all__` for struct-level checks
impl From<validator::ValidationErrors> for ContractError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "__all__".to_string());
        Self::config_validation(field, errors.to_string())
    }
}

