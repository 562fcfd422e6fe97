//! SinkHandle - one sink behind its own bounded queue and worker task

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{RecordedSegment, SegmentSink};
use observability::metrics::record_segment_dispatched;

use crate::metrics::SinkMetrics;

/// Owning side of a sink worker: the queue sender, shared counters and the task
pub struct SinkHandle {
    name: String,
    tx: mpsc::Sender<RecordedSegment>,
    metrics: Arc<SinkMetrics>,
    worker: JoinHandle<()>,
}

impl SinkHandle {
    /// Spawn the worker task on the current runtime
    ///
    /// `queue_capacity` must be non-zero.
    pub fn spawn<S: SegmentSink + Send + 'static>(sink: S, queue_capacity: usize) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::channel(queue_capacity);
        let metrics = Arc::new(SinkMetrics::new());

        let worker_metrics = Arc::clone(&metrics);
        let worker_name = name.clone();
        let worker = tokio::spawn(async move {
            drain_into_sink(sink, rx, worker_metrics, worker_name).await;
        });

        Self {
            name,
            tx,
            metrics,
            worker,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Queue a segment without waiting
    ///
    /// Returns false if the queue is full (segment dropped) or the worker is gone.
    pub fn try_send(&self, segment: RecordedSegment) -> bool {
        match self.tx.try_send(segment) {
            Ok(()) => {
                self.metrics
                    .set_queue_len(self.tx.max_capacity() - self.tx.capacity());
                true
            }
            Err(mpsc::error::TrySendError::Full(segment)) => {
                self.metrics.record_drop();
                warn!(
                    sink = %self.name,
                    index = segment.index,
                    packets = segment.packets.len(),
                    "Queue full, segment dropped"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(segment)) => {
                self.metrics.record_drop();
                error!(sink = %self.name, index = segment.index, "Sink worker is gone, segment lost");
                false
            }
        }
    }

    /// Close the queue, drain it and wait for the worker
    #[instrument(name = "sink_handle_shutdown", skip(self), fields(sink = %self.name))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            error!(sink = %self.name, error = ?e, "Sink worker panicked");
        }
        debug!(sink = %self.name, "Sink stopped");
    }
}

#[instrument(
    name = "sink_drain",
    skip(sink, rx, metrics),
    fields(sink = %name)
)]
async fn drain_into_sink<S: SegmentSink>(
    mut sink: S,
    mut rx: mpsc::Receiver<RecordedSegment>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!(sink = %name, "Draining segments into sink");

    while let Some(segment) = rx.recv().await {
        metrics.set_queue_len(rx.len());

        match sink.write(&segment).await {
            Ok(()) => {
                metrics.record_write(segment.packets.len());
                record_segment_dispatched(&name, true);
            }
            Err(e) => {
                metrics.record_failure();
                record_segment_dispatched(&name, false);
                error!(
                    sink = %name,
                    index = segment.index,
                    error = %e,
                    "Write failed"
                );
            }
        }
    }

    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Sink queue closed and drained");
}
