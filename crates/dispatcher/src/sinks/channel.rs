//! ChannelSink - hands segments to an in-process consumer

use contracts::{ContractError, RecordedSegment, SegmentSink};
use tokio::sync::mpsc;
use tracing::debug;

/// Sink that forwards every segment to an unbounded channel
///
/// Used by the CLI run summary and by tests to observe recorded output.
pub struct ChannelSink {
    name: String,
    tx: Option<mpsc::UnboundedSender<RecordedSegment>>,
}

impl ChannelSink {
    /// Create the sink and the receiving end
    pub fn new(name: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<RecordedSegment>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                name: name.into(),
                tx: Some(tx),
            },
            rx,
        )
    }
}

impl SegmentSink for ChannelSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, segment: &RecordedSegment) -> Result<(), ContractError> {
        let tx = self.tx.as_ref().ok_or_else(|| ContractError::SinkClosed {
            sink_name: self.name.clone(),
        })?;
        tx.send(segment.clone())
            .map_err(|_| ContractError::sink_write(&self.name, "receiver dropped"))
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        // Dropping the sender ends the receiver's stream
        self.tx = None;
        debug!(sink = %self.name, "ChannelSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_sink_delivers_and_closes() {
        let (mut sink, mut rx) = ChannelSink::new("capture");
        let segment = RecordedSegment {
            index: 7,
            stream: "cam".to_string(),
            packets: Vec::new(),
        };

        sink.write(&segment).await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(rx.recv().await.unwrap().index, 7);
        assert!(rx.recv().await.is_none());
        assert!(sink.write(&segment).await.is_err());
    }

    #[tokio::test]
    async fn test_dropped_receiver_fails_write() {
        let (mut sink, rx) = ChannelSink::new("capture");
        drop(rx);
        let segment = RecordedSegment::default();
        assert!(sink.write(&segment).await.is_err());
    }
}
