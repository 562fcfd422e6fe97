//! Mock camera
//!
//! Implements `PacketSource`, producing raw packets on a background thread
//! at the configured frame rate. Timestamps come from the frame timeline,
//! not from the wall clock, so a run at `speed > 1` yields the same packets
//! as a real-time one.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use contracts::{Packet, PacketCallback, PacketSource};
use parking_lot::Mutex;
use tracing::{debug, error, trace};

use crate::config::{CameraConfig, IngestionMetrics};
use crate::detector::{DetectorFeed, MockMotionDetector};
use crate::error::Result;

/// Simulated camera stream
pub struct MockCameraSource {
    config: CameraConfig,
    listening: Arc<AtomicBool>,
    next_index: Arc<AtomicU64>,
    clock_base: u64,
    metrics: Arc<IngestionMetrics>,
    feed: Option<DetectorFeed>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MockCameraSource {
    pub fn new(config: CameraConfig) -> Result<Self> {
        config.check()?;
        let clock_base = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        Ok(Self {
            config,
            listening: Arc::new(AtomicBool::new(false)),
            next_index: Arc::new(AtomicU64::new(0)),
            clock_base,
            metrics: Arc::new(IngestionMetrics::new()),
            feed: None,
            worker: Mutex::new(None),
        })
    }

    /// Camera plus a detector that flags every frame after `config.flag_delay`
    pub fn with_detector(config: CameraConfig) -> Result<(Self, MockMotionDetector)> {
        let mut camera = Self::new(config)?;
        let (feed, detector) = MockMotionDetector::attach(&camera.config);
        camera.feed = Some(feed);
        Ok((camera, detector))
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<IngestionMetrics> {
        &self.metrics
    }

    /// Packets produced so far
    pub fn frames_emitted(&self) -> u64 {
        self.next_index.load(Ordering::Acquire)
    }

    /// Whether a bounded run has produced every frame
    pub fn is_finished(&self) -> bool {
        self.config
            .frame_limit()
            .is_some_and(|limit| self.frames_emitted() >= limit)
    }

    /// Wait for the producer thread to exit
    pub fn join(&self) {
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                error!(source = %self.config.name, "camera thread panicked");
            }
        }
    }
}

impl PacketSource for MockCameraSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn listen(&self, callback: PacketCallback) {
        // Idempotent: if already listening, don't start again
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }
        if self.is_finished() {
            self.listening.store(false, Ordering::SeqCst);
            debug!(source = %self.config.name, "schedule already complete");
            return;
        }
        // a previous run may still be sleeping on its last frame
        self.join();

        let name = self.config.name.clone();
        let schedule = self.config.schedule();
        let limit = self.config.frame_limit();
        let interval = self.config.frame_interval();
        let clock_base = self.clock_base;
        let listening = Arc::clone(&self.listening);
        let next_index = Arc::clone(&self.next_index);
        let metrics = Arc::clone(&self.metrics);
        let feed = self.feed.clone();

        let spawned = thread::Builder::new()
            .name(format!("camera-{name}"))
            .spawn(move || {
                let start = Instant::now();
                let first = next_index.load(Ordering::Acquire);
                debug!(source = %name, fps = schedule.fps(), first_seq = first + 1, "mock camera started");

                while listening.load(Ordering::Relaxed) {
                    let index = next_index.load(Ordering::Acquire);
                    if limit.is_some_and(|limit| index >= limit) {
                        listening.store(false, Ordering::SeqCst);
                        debug!(source = %name, frames = index, "mock camera schedule complete");
                        break;
                    }

                    let due = start + interval.mul_f64((index - first) as f64);
                    let now = Instant::now();
                    if due > now {
                        thread::sleep(due - now);
                    }
                    if !listening.load(Ordering::Relaxed) {
                        break;
                    }

                    let packet = schedule.packet(index, clock_base);
                    trace!(source = %name, seq = packet.seq, motion = packet.has_motion(), "frame");

                    // raw packet first so the flag never precedes it
                    callback(packet.clone());
                    metrics.record_packet();
                    metrics::counter!("ingestion_packets_emitted_total", "source" => name.clone())
                        .increment(1);

                    if let Some(feed) = &feed {
                        if !feed.push(packet) {
                            metrics.record_frame_dropped();
                        }
                    }
                    next_index.store(index + 1, Ordering::Release);
                }

                debug!(source = %name, "mock camera stopped");
            });

        match spawned {
            Ok(handle) => *self.worker.lock() = Some(handle),
            Err(e) => {
                self.listening.store(false, Ordering::SeqCst);
                error!(source = %self.config.name, error = %e, "failed to spawn camera thread");
            }
        }
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
        self.join();
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::SeqCst)
    }
}

impl Drop for MockCameraSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::MotionSpan;
    use std::sync::mpsc;
    use std::time::Duration;

    fn fast_config(duration_secs: u64) -> CameraConfig {
        CameraConfig {
            name: "cam".to_string(),
            fps: 10.0,
            duration_secs,
            payload_size: 16,
            motion: vec![MotionSpan {
                from_secs: 1.0,
                to_secs: 2.0,
            }],
            ..Default::default()
        }
        .with_speed(100.0)
    }

    fn collect(rx: &mpsc::Receiver<Packet>) -> Vec<Packet> {
        rx.try_iter().collect()
    }

    #[test]
    fn test_bounded_run_emits_every_frame() {
        let camera = MockCameraSource::new(fast_config(3)).unwrap();
        let (tx, rx) = mpsc::channel();
        camera.listen(Arc::new(move |p| {
            let _ = tx.send(p);
        }));
        camera.join();

        let packets = collect(&rx);
        assert_eq!(packets.len(), 30);
        assert!(packets.windows(2).all(|w| w[1].seq == w[0].seq + 1));
        assert_eq!(packets[0].seq, 1);
        assert_eq!(packets.iter().filter(|p| p.has_motion()).count(), 10);
        assert_eq!(packets[29].ts_monotonic, 2);
        assert!(!camera.is_listening());
        assert!(camera.is_finished());
        assert_eq!(camera.metrics().snapshot().packets_emitted, 30);
    }

    #[test]
    fn test_listen_is_idempotent() {
        let camera = MockCameraSource::new(fast_config(2)).unwrap();
        let (tx, rx) = mpsc::channel();
        let first = tx.clone();
        camera.listen(Arc::new(move |p| {
            let _ = first.send(p);
        }));
        camera.listen(Arc::new(move |p| {
            let _ = tx.send(p);
        }));
        camera.join();
        assert_eq!(collect(&rx).len(), 20);
    }

    #[test]
    fn test_restart_continues_sequence() {
        let camera = MockCameraSource::new(fast_config(0)).unwrap();
        let (tx, rx) = mpsc::channel();
        let callback: PacketCallback = Arc::new(move |p| {
            let _ = tx.send(p);
        });

        camera.listen(Arc::clone(&callback));
        thread::sleep(Duration::from_millis(30));
        camera.stop();
        let before = collect(&rx);
        assert!(!before.is_empty());
        assert!(!camera.is_listening());

        camera.listen(callback);
        thread::sleep(Duration::from_millis(30));
        camera.stop();
        let after = collect(&rx);
        assert_eq!(
            after.first().map(|p| p.seq),
            before.last().map(|p| p.seq + 1)
        );
    }

    #[test]
    fn test_finished_camera_does_not_restart() {
        let camera = MockCameraSource::new(fast_config(1)).unwrap();
        camera.listen(Arc::new(|_| {}));
        camera.join();
        camera.listen(Arc::new(|_| {}));
        assert!(!camera.is_listening());
        assert_eq!(camera.frames_emitted(), 10);
    }

    #[test]
    fn test_invalid_config() {
        let config = CameraConfig {
            fps: -5.0,
            ..Default::default()
        };
        assert!(MockCameraSource::new(config).is_err());
    }
}
