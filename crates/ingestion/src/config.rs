//! Simulated source configuration and metrics

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use contracts::{MotionSpan, RecorderBlueprint};

use crate::error::{IngestionError, Result};
use crate::schedule::StreamSchedule;

/// Mock camera configuration
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Source name
    pub name: String,

    /// Frames per second of stream time
    pub fps: f64,

    /// Spans with motion, in seconds since stream start
    pub motion: Vec<MotionSpan>,

    /// Raw packets carry the motion bit themselves
    pub in_band_motion: bool,

    /// Stream length in seconds (0 = until stopped)
    pub duration_secs: u64,

    /// Payload bytes per packet
    pub payload_size: usize,

    /// Stream seconds per wall-clock second
    pub speed: f64,

    /// Detector latency after a frame is captured
    pub flag_delay: Duration,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            name: "mock_camera".to_string(),
            fps: 10.0,
            motion: Vec::new(),
            in_band_motion: true,
            duration_secs: 0,
            payload_size: 1024,
            speed: 1.0,
            flag_delay: Duration::from_millis(20),
        }
    }
}

impl CameraConfig {
    /// Derive a camera from the stream and simulation sections
    pub fn from_blueprint(blueprint: &RecorderBlueprint) -> Self {
        Self {
            name: blueprint.stream.name.clone(),
            fps: blueprint.stream.fps,
            motion: blueprint.simulation.motion.clone(),
            in_band_motion: blueprint.stream.in_band_motion,
            duration_secs: blueprint.simulation.duration_secs,
            flag_delay: Duration::from_millis(blueprint.stream.flag_delay_ms),
            ..Self::default()
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub(crate) fn check(&self) -> Result<()> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(IngestionError::invalid_config(
                &self.name,
                format!("fps must be > 0, got {}", self.fps),
            ));
        }
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(IngestionError::invalid_config(
                &self.name,
                format!("speed must be > 0, got {}", self.speed),
            ));
        }
        Ok(())
    }

    /// Frame timeline for this camera
    pub fn schedule(&self) -> StreamSchedule {
        StreamSchedule::new(self.fps, self.motion.clone())
            .with_payload_size(self.payload_size)
            .with_in_band_motion(self.in_band_motion)
    }

    /// Total frames, `None` when unbounded
    pub fn frame_limit(&self) -> Option<u64> {
        (self.duration_secs > 0).then(|| self.schedule().frames_for(self.duration_secs))
    }

    /// Wall-clock interval between frames
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / (self.fps * self.speed))
    }
}

/// Source metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Raw packets handed to the callback
    pub packets_emitted: AtomicU64,

    /// Motion flags handed to the callback
    pub flags_emitted: AtomicU64,

    /// Frames the detector feed had no room for
    pub frames_dropped: AtomicU64,
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_packet(&self) {
        self.packets_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_flag(&self) {
        self.flags_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            packets_emitted: self.packets_emitted.load(Ordering::Relaxed),
            flags_emitted: self.flags_emitted.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub packets_emitted: u64,
    pub flags_emitted: u64,
    pub frames_dropped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_limit() {
        let config = CameraConfig {
            fps: 4.0,
            duration_secs: 3,
            ..Default::default()
        };
        assert_eq!(config.frame_limit(), Some(12));
        assert_eq!(CameraConfig::default().frame_limit(), None);
    }

    #[test]
    fn test_frame_interval_scales_with_speed() {
        let config = CameraConfig {
            fps: 10.0,
            ..Default::default()
        }
        .with_speed(4.0);
        assert_eq!(config.frame_interval(), Duration::from_millis(25));
    }

    #[test]
    fn test_check_rejects_bad_rates() {
        let config = CameraConfig {
            fps: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            config.check(),
            Err(IngestionError::InvalidConfig { .. })
        ));
        assert!(CameraConfig::default().with_speed(-1.0).check().is_err());
        assert!(CameraConfig::default().check().is_ok());
    }
}
