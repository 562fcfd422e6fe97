//! Mock motion detector
//!
//! Observes the frames of one camera and reports a flag-only packet for each
//! of them once the detector latency has passed. The motion decision comes
//! from the schedule, not from the raw packet's own bit.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::{Packet, PacketCallback, PacketSource};
use parking_lot::Mutex;
use tracing::{debug, error, trace};

use crate::config::{CameraConfig, IngestionMetrics};
use crate::schedule::StreamSchedule;

/// Frames the detector may lag behind the camera
const FEED_CAPACITY: usize = 1024;

/// `None` wakes the detector thread so it can observe a stop
type FeedItem = Option<(Instant, Packet)>;

/// Camera side of the detector feed
#[derive(Clone)]
pub(crate) struct DetectorFeed {
    tx: async_channel::Sender<FeedItem>,
}

impl DetectorFeed {
    /// Returns false when the detector has no room for the frame
    pub(crate) fn push(&self, packet: Packet) -> bool {
        self.tx.try_send(Some((Instant::now(), packet))).is_ok()
    }
}

/// Simulated motion detector paired with a [`MockCameraSource`](crate::MockCameraSource)
pub struct MockMotionDetector {
    name: String,
    schedule: StreamSchedule,
    delay: Duration,
    rx: async_channel::Receiver<FeedItem>,
    wake: async_channel::Sender<FeedItem>,
    listening: Arc<AtomicBool>,
    metrics: Arc<IngestionMetrics>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MockMotionDetector {
    pub(crate) fn attach(config: &CameraConfig) -> (DetectorFeed, Self) {
        let (tx, rx) = async_channel::bounded(FEED_CAPACITY);
        let detector = Self {
            name: format!("{}-detector", config.name),
            schedule: config.schedule(),
            delay: config.flag_delay,
            rx,
            wake: tx.clone(),
            listening: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(IngestionMetrics::new()),
            worker: Mutex::new(None),
        };
        (DetectorFeed { tx }, detector)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn metrics(&self) -> &Arc<IngestionMetrics> {
        &self.metrics
    }

    /// Frames observed but not yet flagged
    pub fn backlog(&self) -> usize {
        self.rx.len()
    }

    fn join(&self) {
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                error!(source = %self.name, "detector thread panicked");
            }
        }
    }
}

impl PacketSource for MockMotionDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn listen(&self, callback: PacketCallback) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }
        self.join();

        let name = self.name.clone();
        let schedule = self.schedule.clone();
        let delay = self.delay;
        let rx = self.rx.clone();
        let listening = Arc::clone(&self.listening);
        let metrics = Arc::clone(&self.metrics);

        let spawned = thread::Builder::new()
            .name(format!("detector-{name}"))
            .spawn(move || {
                debug!(source = %name, delay_ms = delay.as_millis() as u64, "mock detector started");

                while let Ok(item) = rx.recv_blocking() {
                    if !listening.load(Ordering::Relaxed) {
                        break;
                    }
                    let Some((observed_at, frame)) = item else {
                        continue;
                    };

                    let due = observed_at + delay;
                    let now = Instant::now();
                    if due > now {
                        thread::sleep(due - now);
                    }

                    let motion = schedule.motion_at_pts(frame.pts);
                    trace!(source = %name, seq = frame.seq, motion, "flag");
                    callback(Packet::motion_flag(frame.seq, motion));
                    metrics.record_flag();
                }

                debug!(source = %name, "mock detector stopped");
            });

        match spawned {
            Ok(handle) => *self.worker.lock() = Some(handle),
            Err(e) => {
                self.listening.store(false, Ordering::SeqCst);
                error!(source = %self.name, error = %e, "failed to spawn detector thread");
            }
        }
    }

    fn stop(&self) {
        if !self.listening.swap(false, Ordering::SeqCst) {
            return;
        }
        // a full feed means the thread is busy and will see the flag anyway
        let _ = self.wake.try_send(None);
        self.join();
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }
}

impl Drop for MockMotionDetector {
    fn drop(&mut self) {
        self.stop();
    }
}
