//! Pipeline orchestrator - coordinates all components.
//!
//! Mock camera and detector → `MotionHandler` → `SegmentAssembler` →
//! dispatcher → sinks. Stops when the simulated schedule completes, the
//! timeout expires, or the shutdown future resolves.

use std::future::Future;
use std::time::{Duration, Instant};

use contracts::{PacketSource, RecordedSegment, RecorderBlueprint};
use dispatcher::SegmentAssembler;
use ingestion::{CameraConfig, MockCameraSource};
use motion_engine::MotionHandler;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::{PipelineStats, StopReason};
use crate::error::{CliError, Result};

/// How often the orchestrator checks for completion
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Extra time granted to in-flight detector flags after the camera stops
const FLAG_GRACE: Duration = Duration::from_millis(50);

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The recorder configuration
    pub blueprint: RecorderBlueprint,

    /// Stream seconds per wall-clock second
    pub speed: f64,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Capacity of the engine → dispatcher queue
    pub segment_queue: usize,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline until the simulated stream ends or `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<PipelineStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;
        let stream = blueprint.stream.name.clone();

        // Setup Dispatcher
        info!("Setting up dispatcher...");
        let (segment_tx, segment_rx) =
            mpsc::channel::<RecordedSegment>(self.config.segment_queue);

        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - recorded segments will only be counted");
        }
        let dispatcher = dispatcher::create_dispatcher(blueprint.sinks.clone(), segment_rx)?;
        let dispatcher_handle = dispatcher.spawn();
        info!(active_sinks = blueprint.sinks.len(), "Dispatcher started");

        // Setup motion engine
        let assembler = SegmentAssembler::new("assembler", &stream, segment_tx);
        let handler = MotionHandler::spawn(&stream, blueprint.motion.clone(), Box::new(assembler))?;
        info!(
            stream = %stream,
            hold_secs = blueprint.motion.hold_secs(),
            "Motion engine started"
        );

        // Setup simulated sources
        let camera_config = CameraConfig::from_blueprint(blueprint).with_speed(self.config.speed);
        let (camera, detector) = MockCameraSource::with_detector(camera_config)?;

        detector.listen(handler.flag_port().callback());
        camera.listen(handler.input_port().callback());
        info!(
            fps = blueprint.stream.fps,
            speed = self.config.speed,
            duration_secs = blueprint.simulation.duration_secs,
            in_band_motion = blueprint.stream.in_band_motion,
            "Simulated stream running"
        );

        let stop_reason = wait_for_stop(&camera, self.config.timeout, shutdown).await;
        info!(reason = stop_reason.as_str(), "Shutting down pipeline...");

        // Sources first, so flags for the last frames still land in the buffer.
        // Stopping joins OS threads; keep that off the async workers.
        let camera = blocking(move || {
            camera.stop();
            camera
        })
        .await?;
        tokio::time::sleep(detector.delay() + FLAG_GRACE).await;

        // Destroy closes the open segment and drops the assembler's sender
        let (detector, status) = blocking(move || {
            detector.stop();
            handler.destroy().map(|status| (detector, status))
        })
        .await??;

        let report = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle)
            .await
            .map_err(|_| CliError::shutdown("dispatcher did not drain within 5s"))?
            .map_err(|e| CliError::shutdown(format!("dispatcher task failed: {e}")))?;

        let stats = PipelineStats {
            stop_reason,
            duration: start_time.elapsed(),
            camera: camera.metrics().snapshot(),
            detector: detector.metrics().snapshot(),
            handler: status,
            report,
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            packets = stats.camera.packets_emitted,
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CliError::shutdown(format!("teardown task failed: {e}")))
}

async fn wait_for_stop<F>(
    camera: &MockCameraSource,
    timeout: Option<Duration>,
    shutdown: F,
) -> StopReason
where
    F: Future<Output = ()>,
{
    let deadline = timeout.map(|t| Instant::now() + t);
    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => return StopReason::Interrupted,
            _ = ticker.tick() => {
                if camera.is_finished() || !camera.is_listening() {
                    return StopReason::Completed;
                }
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    warn!(timeout_secs = timeout.map(|t| t.as_secs()), "Pipeline timed out");
                    return StopReason::TimedOut;
                }
            }
        }
    }
}
