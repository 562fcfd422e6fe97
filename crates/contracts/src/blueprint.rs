//! RecorderBlueprint - Config Loader output
//!
//! Describes one recorded stream: source, motion policy, output routing and
//! the optional simulation schedule used when no camera is attached.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::MotionConfig;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete recorder configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Stream settings
    pub stream: StreamConfig,

    /// Motion-triggered recording policy
    #[serde(default)]
    pub motion: MotionConfig,

    /// Output routing
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,

    /// Simulated source schedule
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Logging and metrics export
    #[serde(default)]
    pub observability: ObservabilitySettings,
}

/// Stream settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Stream name (used in logs, metrics and segment metadata)
    pub name: String,

    /// Packet rate of the source
    #[serde(default = "default_fps")]
    pub fps: f64,

    /// Delay between a raw packet and its motion flag
    #[serde(default = "default_flag_delay_ms")]
    pub flag_delay_ms: u64,

    /// Camera marks motion in-band on raw packets; detector flags then override the stored bit
    #[serde(default = "default_in_band_motion")]
    pub in_band_motion: bool,
}

fn default_fps() -> f64 {
    10.0
}

fn default_flag_delay_ms() -> u64 {
    20
}

fn default_in_band_motion() -> bool {
    true
}

/// Sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Queue capacity between the recording engine and the sink worker
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Sink-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    64
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log segment summaries via tracing
    Log,
}

/// Simulated source schedule
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// How long the simulated stream runs (0 = until interrupted)
    #[serde(default)]
    pub duration_secs: u64,

    /// Time spans (relative to stream start) during which the detector reports motion
    #[serde(default)]
    pub motion: Vec<MotionSpan>,
}

/// Half-open span `[from_secs, to_secs)` with motion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionSpan {
    pub from_secs: f64,
    pub to_secs: f64,
}

impl MotionSpan {
    /// Whether `t` (seconds since stream start) falls inside the span
    pub fn contains(&self, t: f64) -> bool {
        t >= self.from_secs && t < self.to_secs
    }
}

/// Logging and metrics export settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilitySettings {
    /// `json`, `pretty` or `compact`
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Default level when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prometheus listener port (absent = disabled)
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_format() -> String {
    "compact".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_format: default_log_format(),
            log_level: default_log_level(),
            metrics_port: None,
        }
    }
}
