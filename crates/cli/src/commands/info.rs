//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::RecorderBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    stream: StreamInfo,
    motion: MotionInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    simulation: Option<SimulationInfo>,
}

#[derive(Serialize)]
struct StreamInfo {
    name: String,
    fps: f64,
    flag_delay_ms: u64,
    in_band_motion: bool,
}

#[derive(Serialize)]
struct MotionInfo {
    prerecord_secs: u64,
    postrecord_secs: u64,
    hold_secs: u64,
    analysis_window: i64,
    threshold_percent: u8,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
}

#[derive(Serialize)]
struct SimulationInfo {
    duration_secs: u64,
    motion: Vec<(f64, f64)>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &RecorderBlueprint, args: &InfoArgs) -> ConfigInfo {
    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
            })
            .collect()
    } else {
        Vec::new()
    };

    let simulation = args.schedule.then(|| SimulationInfo {
        duration_secs: blueprint.simulation.duration_secs,
        motion: blueprint
            .simulation
            .motion
            .iter()
            .map(|span| (span.from_secs, span.to_secs))
            .collect(),
    });

    let motion = &blueprint.motion;
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        stream: StreamInfo {
            name: blueprint.stream.name.clone(),
            fps: blueprint.stream.fps,
            flag_delay_ms: blueprint.stream.flag_delay_ms,
            in_band_motion: blueprint.stream.in_band_motion,
        },
        motion: MotionInfo {
            prerecord_secs: motion.prerecord_secs,
            postrecord_secs: motion.postrecord_secs,
            hold_secs: motion.hold_secs(),
            analysis_window: motion.analysis_window,
            threshold_percent: motion.threshold_percent,
        },
        sinks,
        simulation,
    }
}

fn print_config_info(blueprint: &RecorderBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Motion Recorder Configuration                  ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let stream = &blueprint.stream;
    println!("🎥 Stream");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Name: {}", stream.name);
    println!("   ├─ FPS: {}", stream.fps);
    println!("   ├─ Flag delay: {} ms", stream.flag_delay_ms);
    println!("   └─ In-band motion: {}", stream.in_band_motion);

    let motion = &blueprint.motion;
    println!("\n⚙️  Motion");
    println!("   ├─ Pre-roll: {}s", motion.prerecord_secs);
    println!("   ├─ Post-roll: {}s", motion.postrecord_secs);
    println!("   ├─ Hold after last trigger: {}s", motion.hold_secs());
    println!("   ├─ Analysis window: {} pts", motion.analysis_window);
    println!("   └─ Threshold: {}%", motion.threshold_percent);

    if args.schedule {
        let simulation = &blueprint.simulation;
        println!("\n🕒 Simulation");
        match simulation.duration_secs {
            0 => println!("   ├─ Duration: until interrupted"),
            secs => println!("   ├─ Duration: {}s", secs),
        }
        if simulation.motion.is_empty() {
            println!("   └─ Motion: none");
        }
        for (i, span) in simulation.motion.iter().enumerate() {
            let prefix = if i == simulation.motion.len() - 1 {
                "└─"
            } else {
                "├─"
            };
            println!(
                "   {} Motion [{:.1}s, {:.1}s)",
                prefix, span.from_secs, span.to_secs
            );
        }
    }

    if args.sinks && !blueprint.sinks.is_empty() {
        println!("\n📤 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i == blueprint.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            println!(
                "   {} {} ({:?}, queue {})",
                prefix, sink.name, sink.sink_type, sink.queue_capacity
            );
        }
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn blueprint() -> RecorderBlueprint {
        config_loader::ConfigLoader::load_from_str(
            r#"
[stream]
name = "cam"

[motion]
prerecord_secs = 3
postrecord_secs = 10

[[sinks]]
name = "log"
sink_type = "log"

[simulation]
duration_secs = 30
motion = [{ from_secs = 5.0, to_secs = 9.0 }]
"#,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap()
    }

    fn args(schedule: bool, sinks: bool) -> InfoArgs {
        InfoArgs {
            config: PathBuf::from("recorder.toml"),
            json: true,
            schedule,
            sinks,
        }
    }

    #[test]
    fn test_info_hides_optional_sections() {
        let info = build_config_info(&blueprint(), &args(false, false));
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["motion"]["hold_secs"], 7);
        assert!(json.get("sinks").is_none());
        assert!(json.get("simulation").is_none());
    }

    #[test]
    fn test_info_with_schedule_and_sinks() {
        let info = build_config_info(&blueprint(), &args(true, true));
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["sinks"][0]["sink_type"], "Log");
        assert_eq!(json["simulation"]["motion"][0][1], 9.0);
        assert_eq!(json["stream"]["in_band_motion"], true);
    }
}
