//! Motion engine configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::ContractError;

/// Motion-triggered recording configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_roll_times"))]
pub struct MotionConfig {
    /// Pre-roll: seconds of packets retained before a trigger
    #[serde(default = "default_prerecord")]
    pub prerecord_secs: u64,

    /// Post-roll: seconds recording continues after motion stops
    #[serde(default = "default_postrecord")]
    pub postrecord_secs: u64,

    /// Sliding analysis window, in pts units
    #[serde(default = "default_analysis_window")]
    #[validate(range(min = 1))]
    pub analysis_window: i64,

    /// Percentage of motion-flagged packets in the window that triggers recording
    #[serde(default = "default_threshold")]
    #[validate(range(max = 100))]
    pub threshold_percent: u8,
}

fn default_prerecord() -> u64 {
    5
}

fn default_postrecord() -> u64 {
    15
}

fn default_analysis_window() -> i64 {
    1_000_000
}

fn default_threshold() -> u8 {
    50
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            prerecord_secs: default_prerecord(),
            postrecord_secs: default_postrecord(),
            analysis_window: default_analysis_window(),
            threshold_percent: default_threshold(),
        }
    }
}

impl MotionConfig {
    /// Run field and cross-field validation
    pub fn check(&self) -> Result<(), ContractError> {
        self.validate().map_err(ContractError::from)
    }

    /// Grace period after the last trigger before recording pauses
    pub fn hold_secs(&self) -> u64 {
        self.postrecord_secs.saturating_sub(self.prerecord_secs)
    }
}

fn validate_roll_times(config: &MotionConfig) -> Result<(), ValidationError> {
    if config.postrecord_secs < config.prerecord_secs {
        let mut err = ValidationError::new("postrecord_before_prerecord");
        err.message = Some("postrecord_secs must be >= prerecord_secs".into());
        return Err(err);
    }
    Ok(())
}
