//! # Dispatcher
//!
//! 录像分段分发模块。
//!
//! 负责：
//! - `SegmentAssembler`: 将引擎转发的包按哨兵切分为 `RecordedSegment`
//! - Fan-out 到多个 sinks
//! - 隔离慢 sink，不阻塞录像引擎

pub mod assembler;
pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;

pub use assembler::SegmentAssembler;
pub use contracts::{RecordedSegment, SegmentSink};
pub use dispatcher::{
    create_dispatcher, create_sink_handle, DispatchReport, Dispatcher, DispatcherBuilder,
    DispatcherConfig,
};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{ChannelSink, LogSink};
