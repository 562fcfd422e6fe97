//! 配置校验模块
//!
//! 校验规则：
//! - stream.name 非空，fps > 0
//! - motion 字段范围合法，postrecord_secs >= prerecord_secs
//! - simulation.motion 区间合法 (0 <= from < to)
//! - sink 名称非空且唯一，queue_capacity > 0
//! - observability.log_format 为 json / pretty / compact

use std::collections::HashSet;

use contracts::{ContractError, RecorderBlueprint};

const LOG_FORMATS: [&str; 3] = ["json", "pretty", "compact"];

/// 校验 RecorderBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    validate_stream(blueprint)?;
    validate_motion(blueprint)?;
    validate_simulation(blueprint)?;
    validate_sinks(blueprint)?;
    validate_observability(blueprint)?;
    Ok(())
}

fn validate_stream(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    let stream = &blueprint.stream;
    if stream.name.trim().is_empty() {
        return Err(ContractError::config_validation(
            "stream.name",
            "stream name cannot be empty",
        ));
    }
    if !(stream.fps.is_finite() && stream.fps > 0.0) {
        return Err(ContractError::config_validation(
            "stream.fps",
            format!("fps must be > 0, got {}", stream.fps),
        ));
    }
    Ok(())
}

/// 字段名加上 `motion.` 前缀
fn validate_motion(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    blueprint.motion.check().map_err(|e| match e {
        ContractError::ConfigValidation { field, message } => {
            ContractError::config_validation(format!("motion.{field}"), message)
        }
        other => other,
    })
}

fn validate_simulation(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    for (idx, span) in blueprint.simulation.motion.iter().enumerate() {
        if span.from_secs < 0.0 || span.from_secs >= span.to_secs {
            return Err(ContractError::config_validation(
                format!("simulation.motion[{idx}]"),
                format!(
                    "span must satisfy 0 <= from_secs < to_secs, got [{}, {})",
                    span.from_secs, span.to_secs
                ),
            ));
        }
    }
    Ok(())
}

fn validate_sinks(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{idx}].name"),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be > 0",
            ));
        }
    }
    Ok(())
}

fn validate_observability(blueprint: &RecorderBlueprint) -> Result<(), ContractError> {
    let format = blueprint.observability.log_format.to_ascii_lowercase();
    if !LOG_FORMATS.contains(&format.as_str()) {
        return Err(ContractError::config_validation(
            "observability.log_format",
            format!(
                "unknown log format '{}', expected one of {:?}",
                blueprint.observability.log_format, LOG_FORMATS
            ),
        ));
    }
    Ok(())
}
