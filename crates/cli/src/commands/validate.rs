//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::RecorderBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    stream: String,
    fps: f64,
    prerecord_secs: u64,
    postrecord_secs: u64,
    threshold_percent: u8,
    sink_count: usize,
    motion_spans: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: (!warnings.is_empty()).then_some(warnings),
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    stream: blueprint.stream.name.clone(),
                    fps: blueprint.stream.fps,
                    prerecord_secs: blueprint.motion.prerecord_secs,
                    postrecord_secs: blueprint.motion.postrecord_secs,
                    threshold_percent: blueprint.motion.threshold_percent,
                    sink_count: blueprint.sinks.len(),
                    motion_spans: blueprint.simulation.motion.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &RecorderBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sinks.is_empty() {
        warnings.push("No sinks configured - recorded segments will only be counted".to_string());
    }

    let simulation = &blueprint.simulation;
    if simulation.motion.is_empty() {
        warnings.push("simulation.motion is empty - the simulated stream never triggers".to_string());
    }
    if simulation.duration_secs == 0 {
        warnings.push("simulation.duration_secs is 0 - run continues until interrupted".to_string());
    } else {
        let end = simulation.duration_secs as f64;
        for span in simulation.motion.iter().filter(|s| s.from_secs >= end) {
            warnings.push(format!(
                "motion span [{}, {}) starts after the simulated stream ends",
                span.from_secs, span.to_secs
            ));
        }
    }

    if !blueprint.stream.in_band_motion {
        warnings.push(
            "stream.in_band_motion is false - detector flags usually arrive after a packet is analyzed and only update its stored flags"
                .to_string(),
        );
    }

    if blueprint.motion.prerecord_secs == 0 {
        warnings.push("motion.prerecord_secs is 0 - segments start at the triggering packet".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Stream: {} ({} fps)", summary.stream, summary.fps);
            println!(
                "  Pre/post-roll: {}s / {}s",
                summary.prerecord_secs, summary.postrecord_secs
            );
            println!("  Threshold: {}%", summary.threshold_percent);
            println!("  Sinks: {}", summary.sink_count);
            println!("  Motion spans: {}", summary.motion_spans);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn args(file: &tempfile::NamedTempFile) -> ValidateArgs {
        ValidateArgs {
            config: file.path().to_path_buf(),
            json: true,
        }
    }

    #[test]
    fn test_valid_config_with_warnings() {
        let file = write_config("[stream]\nname = \"cam\"\n");
        let result = validate_config(&args(&file));
        assert!(result.valid);
        let warnings = result.warnings.unwrap();
        assert!(warnings.iter().any(|w| w.contains("No sinks")));
        assert!(warnings.iter().any(|w| w.contains("never triggers")));
        assert_eq!(result.summary.unwrap().stream, "cam");
    }

    #[test]
    fn test_span_after_end_warns() {
        let file = write_config(
            r#"
[stream]
name = "cam"

[[sinks]]
name = "log"
sink_type = "log"

[simulation]
duration_secs = 10
motion = [{ from_secs = 12.0, to_secs = 14.0 }]
"#,
        );
        let result = validate_config(&args(&file));
        let warnings = result.warnings.unwrap();
        assert!(warnings.iter().any(|w| w.contains("after the simulated stream ends")));
    }

    #[test]
    fn test_invalid_config() {
        let file = write_config("[stream]\nname = \"cam\"\n[motion]\nthreshold_percent = 101\n");
        let result = validate_config(&args(&file));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("threshold_percent"));
        assert!(run_validate(&args(&file)).is_err());
    }

    #[test]
    fn test_missing_file() {
        let args = ValidateArgs {
            config: "/nonexistent/recorder.toml".into(),
            json: false,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}
