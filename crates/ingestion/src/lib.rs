//! # Ingestion
//!
//! Simulated packet sources for running the recorder without a camera.
//!
//! Responsibilities:
//! - Produce raw packets on a deterministic frame timeline (`MockCameraSource`)
//! - Produce delayed motion flags for the same frames (`MockMotionDetector`)
//! - Drive both from the `[simulation]` section of a blueprint
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::PacketSource;
//! use ingestion::{CameraConfig, MockCameraSource};
//!
//! let config = CameraConfig::from_blueprint(&blueprint);
//! let (camera, detector) = MockCameraSource::with_detector(config)?;
//!
//! detector.listen(handler.flag_port().callback());
//! camera.listen(handler.input_port().callback());
//! camera.join();
//! detector.stop();
//! ```

mod camera;
mod config;
mod detector;
mod error;
mod schedule;

pub use camera::MockCameraSource;
pub use config::{CameraConfig, IngestionMetrics, MetricsSnapshot};
pub use detector::MockMotionDetector;
pub use error::{IngestionError, Result};
pub use schedule::{StreamSchedule, PTS_PER_SEC};
