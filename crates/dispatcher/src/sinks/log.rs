//! LogSink - logs segment summaries via tracing

use contracts::{ContractError, RecordedSegment, SegmentSink};
use tracing::{info, instrument};

/// Sink that logs segment summaries
pub struct LogSink {
    name: String,
    written: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            written: 0,
        }
    }

    fn log_segment_summary(&self, segment: &RecordedSegment) {
        info!(
            sink = %self.name,
            stream = %segment.stream,
            index = segment.index,
            first_seq = ?segment.first_seq(),
            last_seq = ?segment.last_seq(),
            packets = segment.packets.len(),
            motion_packets = segment.motion_packets(),
            duration_secs = segment.duration_secs(),
            bytes = segment.total_bytes(),
            "Segment recorded"
        );
    }
}

impl SegmentSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, segment),
        fields(sink = %self.name, index = segment.index)
    )]
    async fn write(&mut self, segment: &RecordedSegment) -> Result<(), ContractError> {
        self.log_segment_summary(segment);
        self.written += 1;
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, segments = self.written, "LogSink closed");
        Ok(())
    }
}
