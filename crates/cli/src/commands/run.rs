//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::RecorderBlueprint;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::{Cli, RunArgs};
use crate::init_logging;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(cli: &Cli, args: &RunArgs) -> Result<()> {
    // Validate config path
    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    // Load and parse configuration
    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    init_logging(cli, Some(&blueprint.observability), args.metrics_port)?;
    info!(config = %args.config.display(), "Configuration loaded");

    // Apply CLI overrides
    if apply_overrides(&mut blueprint, args) {
        config_loader::ConfigLoader::validate(&blueprint)
            .context("Configuration invalid after command-line overrides")?;
    }

    info!(
        stream = %blueprint.stream.name,
        fps = blueprint.stream.fps,
        prerecord_secs = blueprint.motion.prerecord_secs,
        postrecord_secs = blueprint.motion.postrecord_secs,
        threshold_percent = blueprint.motion.threshold_percent,
        sinks = blueprint.sinks.len(),
        "Recorder configured"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    if args.speed <= 0.0 || !args.speed.is_finite() {
        anyhow::bail!("--speed must be > 0, got {}", args.speed);
    }
    if args.queue_size == 0 {
        anyhow::bail!("--queue-size must be > 0");
    }

    let pipeline_config = PipelineConfig {
        blueprint,
        speed: args.speed,
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        segment_queue: args.queue_size,
    };

    let pipeline = Pipeline::new(pipeline_config);

    info!("Starting pipeline...");
    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        reason = stats.stop_reason.as_str(),
        segments = stats.report.segments,
        packets_forwarded = stats.forwarded(),
        duration_secs = stats.duration.as_secs_f64(),
        "Pipeline completed"
    );
    stats.print_summary();

    info!("Motion Recorder finished");
    Ok(())
}

/// Apply command-line overrides, returning whether anything changed
fn apply_overrides(blueprint: &mut RecorderBlueprint, args: &RunArgs) -> bool {
    let mut changed = false;

    if let Some(ref stream) = args.stream {
        info!(stream = %stream, "Overriding stream name from CLI");
        blueprint.stream.name = stream.clone();
        changed = true;
    }
    if let Some(secs) = args.prerecord {
        info!(prerecord_secs = secs, "Overriding pre-roll from CLI");
        blueprint.motion.prerecord_secs = secs;
        changed = true;
    }
    if let Some(secs) = args.postrecord {
        info!(postrecord_secs = secs, "Overriding post-roll from CLI");
        blueprint.motion.postrecord_secs = secs;
        changed = true;
    }
    if let Some(threshold) = args.threshold {
        info!(threshold_percent = threshold, "Overriding threshold from CLI");
        blueprint.motion.threshold_percent = threshold;
        changed = true;
    }
    if let Some(window) = args.window {
        info!(analysis_window = window, "Overriding analysis window from CLI");
        blueprint.motion.analysis_window = window;
        changed = true;
    }
    if let Some(duration) = args.duration {
        info!(duration_secs = duration, "Overriding simulation duration from CLI");
        blueprint.simulation.duration_secs = duration;
        changed = true;
    }

    changed
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal, stopping pipeline...");
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &RecorderBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Stream:");
    println!("  Name: {}", blueprint.stream.name);
    println!("  FPS: {}", blueprint.stream.fps);
    println!("  Flag delay: {} ms", blueprint.stream.flag_delay_ms);

    let motion = &blueprint.motion;
    println!("\nMotion:");
    println!("  Pre-roll: {}s", motion.prerecord_secs);
    println!("  Post-roll: {}s (hold {}s)", motion.postrecord_secs, motion.hold_secs());
    println!("  Window: {} pts", motion.analysis_window);
    println!("  Threshold: {}%", motion.threshold_percent);

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    let simulation = &blueprint.simulation;
    println!("\nSimulation:");
    match simulation.duration_secs {
        0 => println!("  Duration: until interrupted"),
        secs => println!("  Duration: {secs}s"),
    }
    println!("  Motion spans: {}", simulation.motion.len());

    println!();
}
