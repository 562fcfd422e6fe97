//! Dispatcher - fan-out of finished segments to sinks

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use contracts::{RecordedSegment, SinkConfig, SinkType};
use observability::metrics::{record_segment, MetricsSummary, SegmentMetricsAggregator};

use crate::error::DispatcherError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sinks::LogSink;

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Sink configurations
    pub sinks: Vec<SinkConfig>,
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    input_rx: mpsc::Receiver<RecordedSegment>,
    extra: Vec<SinkHandle>,
}

impl DispatcherBuilder {
    pub fn new(config: DispatcherConfig, input_rx: mpsc::Receiver<RecordedSegment>) -> Self {
        Self {
            config,
            input_rx,
            extra: Vec::new(),
        }
    }

    /// Add an already running sink next to the configured ones
    pub fn with_handle(mut self, handle: SinkHandle) -> Self {
        self.extra.push(handle);
        self
    }

    /// Build and start the configured sinks
    #[instrument(name = "dispatcher_builder_build", skip(self))]
    pub fn build(self) -> Result<Dispatcher, DispatcherError> {
        let mut handles = Vec::with_capacity(self.config.sinks.len() + self.extra.len());
        for sink_config in &self.config.sinks {
            handles.push(create_sink_handle(sink_config)?);
        }
        for handle in self.extra {
            if handles.iter().any(|h| h.name() == handle.name()) {
                return Err(DispatcherError::duplicate_sink(handle.name()));
            }
            handles.push(handle);
        }

        Ok(Dispatcher::with_handles(handles, self.input_rx))
    }
}

/// Create a SinkHandle from configuration
#[instrument(
    name = "dispatcher_create_sink_handle",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
pub fn create_sink_handle(config: &SinkConfig) -> Result<SinkHandle, DispatcherError> {
    if config.queue_capacity == 0 {
        return Err(DispatcherError::sink_creation(
            &config.name,
            "queue_capacity must be > 0",
        ));
    }

    match config.sink_type {
        SinkType::Log => {
            let sink = LogSink::new(&config.name);
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
    }
}

/// Final dispatcher report
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub segments: u64,
    pub summary: MetricsSummary,
    pub sinks: Vec<(String, MetricsSnapshot)>,
}

/// Fans out every finished segment to all sinks
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    input_rx: mpsc::Receiver<RecordedSegment>,
    aggregator: SegmentMetricsAggregator,
}

impl Dispatcher {
    /// Create a dispatcher with custom sink handles
    pub fn with_handles(
        handles: Vec<SinkHandle>,
        input_rx: mpsc::Receiver<RecordedSegment>,
    ) -> Self {
        Self {
            handles,
            input_rx,
            aggregator: SegmentMetricsAggregator::new(),
        }
    }

    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Run the dispatcher main loop
    ///
    /// Returns when the input channel is closed and every sink has drained.
    #[instrument(name = "dispatcher_run", skip(self))]
    pub async fn run(mut self) -> DispatchReport {
        info!(sinks = self.handles.len(), "Dispatcher started");

        let mut segment_count: u64 = 0;
        while let Some(segment) = self.input_rx.recv().await {
            segment_count += 1;
            record_segment(&segment);
            self.aggregator.update(&segment);
            self.dispatch_segment(&segment);

            debug!(
                segments = segment_count,
                index = segment.index,
                "Segment dispatched"
            );
        }

        info!(
            segments = segment_count,
            "Dispatcher input closed, shutting down"
        );

        let sink_metrics: Vec<_> = self
            .handles
            .iter()
            .map(|h| (h.name().to_string(), Arc::clone(h.metrics())))
            .collect();
        for handle in self.handles {
            handle.shutdown().await;
        }
        let sinks = sink_metrics
            .into_iter()
            .map(|(name, metrics)| (name, metrics.snapshot()))
            .collect();

        info!("Dispatcher shutdown complete");
        DispatchReport {
            segments: segment_count,
            summary: self.aggregator.summary(),
            sinks,
        }
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(self) -> JoinHandle<DispatchReport> {
        tokio::spawn(self.run())
    }

    fn dispatch_segment(&self, segment: &RecordedSegment) {
        for handle in &self.handles {
            handle.try_send(segment.clone());
        }
    }
}

/// Convenience function to create a dispatcher from sink configs
pub fn create_dispatcher(
    sink_configs: Vec<SinkConfig>,
    input_rx: mpsc::Receiver<RecordedSegment>,
) -> Result<Dispatcher, DispatcherError> {
    let config = DispatcherConfig {
        sinks: sink_configs,
    };
    DispatcherBuilder::new(config, input_rx).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sinks::ChannelSink;
    use contracts::Packet;
    use std::collections::HashMap;

    fn segment(index: u64, seqs: std::ops::RangeInclusive<u64>) -> RecordedSegment {
        RecordedSegment {
            index,
            stream: "cam".to_string(),
            packets: seqs
                .map(|seq| Packet {
                    seq,
                    ts_monotonic: seq,
                    ..Default::default()
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_dispatcher_fanout() {
        let (input_tx, input_rx) = mpsc::channel(10);
        let (first, mut first_rx) = ChannelSink::new("first");
        let (second, mut second_rx) = ChannelSink::new("second");

        let handles = vec![SinkHandle::spawn(first, 10), SinkHandle::spawn(second, 10)];
        let handle = Dispatcher::with_handles(handles, input_rx).spawn();

        for i in 0..3 {
            input_tx.send(segment(i, 1..=4)).await.unwrap();
        }
        drop(input_tx);

        let report = handle.await.unwrap();
        assert_eq!(report.segments, 3);
        assert_eq!(report.summary.total_packets, 12);

        for rx in [&mut first_rx, &mut second_rx] {
            let mut indices = Vec::new();
            while let Some(segment) = rx.recv().await {
                indices.push(segment.index);
            }
            assert_eq!(indices, vec![0, 1, 2]);
        }
    }

    #[tokio::test]
    async fn test_create_dispatcher_from_config() {
        let (input_tx, input_rx) = mpsc::channel(10);
        let configs = vec![SinkConfig {
            name: "test_log".to_string(),
            sink_type: SinkType::Log,
            queue_capacity: 50,
            params: HashMap::new(),
        }];

        let dispatcher = create_dispatcher(configs, input_rx).unwrap();
        let handle = dispatcher.spawn();

        input_tx.send(segment(0, 5..=9)).await.unwrap();
        drop(input_tx);

        let report = handle.await.unwrap();
        assert_eq!(report.sinks.len(), 1);
        assert_eq!(report.sinks[0].0, "test_log");
        assert!((report.summary.duration_secs.max - 4.0).abs() < 1e-10);
    }

    #[tokio::test]
    async fn test_zero_capacity_rejected() {
        let (_tx, input_rx) = mpsc::channel(1);
        let configs = vec![SinkConfig {
            name: "broken".to_string(),
            sink_type: SinkType::Log,
            queue_capacity: 0,
            params: HashMap::new(),
        }];

        let result = create_dispatcher(configs, input_rx);
        assert!(matches!(result, Err(DispatcherError::SinkCreation { .. })));
    }

    #[tokio::test]
    async fn test_attached_handle_name_collision() {
        let (_tx, input_rx) = mpsc::channel(1);
        let configs = vec![SinkConfig {
            name: "log".to_string(),
            sink_type: SinkType::Log,
            queue_capacity: 4,
            params: HashMap::new(),
        }];
        let (sink, _rx) = ChannelSink::new("log");

        let result = DispatcherBuilder::new(DispatcherConfig { sinks: configs }, input_rx)
            .with_handle(SinkHandle::spawn(sink, 4))
            .build();
        assert!(matches!(result, Err(DispatcherError::DuplicateSink { name }) if name == "log"));
    }
}
