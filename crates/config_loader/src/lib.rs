//! # Config Loader
//!
//! 录制器配置加载：读取 TOML/JSON，校验后生成 [`RecorderBlueprint`]。
//!
//! 校验失败时返回 `ContractError::ConfigValidation`，字段名指向出错的配置项。
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("recorder.toml")).unwrap();
//! println!("stream {} at {} fps", blueprint.stream.name, blueprint.stream.fps);
//! ```

mod parser;
mod validator;

pub use contracts::RecorderBlueprint;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Stateless entry point for reading and writing recorder configuration
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a file, picking the format from its extension (.toml / .json)
    pub fn load_from_path(path: &Path) -> Result<RecorderBlueprint, ContractError> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Parse `content` and validate the result
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<RecorderBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Re-run validation, e.g. after applying command-line overrides
    pub fn validate(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
        validator::validate(blueprint)
    }

    pub fn to_toml(blueprint: &RecorderBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    pub fn to_json(blueprint: &RecorderBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }

    /// Serialize in the format matching `path` and write it
    pub fn save_to_path(blueprint: &RecorderBlueprint, path: &Path) -> Result<(), ContractError> {
        let content = match format_of(path)? {
            ConfigFormat::Toml => Self::to_toml(blueprint)?,
            ConfigFormat::Json => Self::to_json(blueprint)?,
        };
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn format_of(path: &Path) -> Result<ConfigFormat, ContractError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ContractError::config_parse("config path has no file extension"))?;

    ConfigFormat::from_extension(ext)
        .ok_or_else(|| ContractError::config_parse(format!("unsupported config format: .{ext}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL_TOML: &str = r#"
[stream]
name = "front-door"
fps = 12.5

[motion]
prerecord_secs = 4
postrecord_secs = 12
threshold_percent = 60

[[sinks]]
name = "log_sink"
sink_type = "log"

[simulation]
duration_secs = 20
motion = [{ from_secs = 2.0, to_secs = 6.0 }]
"#;

    #[test]
    fn test_load_from_str_toml() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.stream.name, "front-door");
        assert_eq!(bp.motion.hold_secs(), 8);
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.stream.name, bp2.stream.name);
        assert_eq!(bp.motion, bp2.motion);
        assert_eq!(bp.simulation.motion, bp2.simulation.motion);
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.motion, bp2.motion);
        assert_eq!(bp.sinks.len(), bp2.sinks.len());
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[stream]
name = "cam"

[[sinks]]
name = "log"
sink_type = "log"

[[sinks]]
name = "log"
sink_type = "log"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(MINIMAL_TOML.as_bytes()).unwrap();

        let bp = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(bp.stream.fps, 12.5);
    }

    #[test]
    fn test_save_and_reload_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recorder.json");

        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        ConfigLoader::save_to_path(&bp, &path).unwrap();
        let bp2 = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(bp2.motion.threshold_percent, 60);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported"));
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::load_from_path(Path::new("/nonexistent/recorder.toml")).unwrap_err();
        assert!(matches!(err, ContractError::Io(_)));
    }

    #[test]
    fn test_shipped_sample_config() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../recorder.toml");
        let bp = ConfigLoader::load_from_path(&path).unwrap();
        assert_eq!(bp.stream.name, "front_door");
        assert_eq!(bp.motion.hold_secs(), 7);
        assert_eq!(bp.simulation.motion.len(), 3);
    }
}
