//! Ingestion 错误类型

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 模拟源配置非法
    #[error("invalid config for source {source_name}: {message}")]
    InvalidConfig {
        /// 源名称
        source_name: String,
        /// 错误消息
        message: String,
    },
}

impl IngestionError {
    pub fn invalid_config(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
