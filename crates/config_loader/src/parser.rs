//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, RecorderBlueprint};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<RecorderBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<RecorderBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<RecorderBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::SinkType;

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[stream]
name = "front-door"
"#;
        let bp = parse_toml(content).unwrap();
        assert_eq!(bp.stream.name, "front-door");
        assert_eq!(bp.stream.fps, 10.0);
        assert!(bp.stream.in_band_motion);
        assert_eq!(bp.motion.prerecord_secs, 5);
        assert!(bp.sinks.is_empty());
        assert_eq!(bp.observability.log_format, "compact");
    }

    #[test]
    fn test_parse_toml_full() {
        let content = r#"
version = "V1"

[stream]
name = "garage"
fps = 25.0
flag_delay_ms = 40
in_band_motion = false

[motion]
prerecord_secs = 3
postrecord_secs = 9
analysis_window = 500000
threshold_percent = 40

[[sinks]]
name = "log"
sink_type = "log"
queue_capacity = 8

[simulation]
duration_secs = 30
motion = [{ from_secs = 5.0, to_secs = 8.5 }]

[observability]
log_format = "json"
metrics_port = 9100
"#;
        let bp = parse_toml(content).unwrap();
        assert_eq!(bp.stream.flag_delay_ms, 40);
        assert_eq!(bp.motion.threshold_percent, 40);
        assert_eq!(bp.sinks[0].sink_type, SinkType::Log);
        assert_eq!(bp.sinks[0].queue_capacity, 8);
        assert_eq!(bp.simulation.motion.len(), 1);
        assert!(bp.simulation.motion[0].contains(5.0));
        assert!(!bp.simulation.motion[0].contains(8.5));
        assert_eq!(bp.observability.metrics_port, Some(9100));
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "stream": { "name": "cam1", "fps": 15.0 },
            "motion": { "threshold_percent": 70 },
            "sinks": [{ "name": "log", "sink_type": "log" }]
        }"#;
        let bp = parse_json(content).unwrap();
        assert_eq!(bp.motion.threshold_percent, 70);
        assert_eq!(bp.sinks[0].queue_capacity, 64);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let result = parse_toml("invalid toml [[[");
        assert!(matches!(result, Err(ContractError::ConfigParse { .. })));
    }

    #[test]
    fn test_parse_unknown_sink_type() {
        let content = r#"
[stream]
name = "cam"

[[sinks]]
name = "s3"
sink_type = "bucket"
"#;
        assert!(parse_toml(content).is_err());
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_extension("toml"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
