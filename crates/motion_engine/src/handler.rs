//! Motion handler: shared state, engine thread and lifecycle.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use contracts::{MotionConfig, PacketSink};
use observability::metrics;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use crate::buffer::PacketBuffer;
use crate::engine::{EngineStats, RecordingEngine, RecordingState};
use crate::error::MotionError;
use crate::ports::{FlagMergePort, PortStats, RawInputPort};

/// Everything guarded by the handler lock
pub(crate) struct StreamState {
    pub(crate) buffer: PacketBuffer,
    pub(crate) engine: RecordingEngine,
    /// Set by producers before notifying; cleared by the engine at the start of a pass
    pub(crate) pending: bool,
    pub(crate) destroyed: bool,
    pub(crate) ports: PortStats,
}

pub(crate) struct Shared {
    pub(crate) name: String,
    pub(crate) state: Mutex<StreamState>,
    pub(crate) wake: Condvar,
    attached: AtomicBool,
    ignored: AtomicU64,
}

impl Shared {
    pub(crate) fn is_attached(&self) -> bool {
        self.attached.load(Ordering::Acquire)
    }

    pub(crate) fn note_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    fn signal_destroy(&self) {
        self.state.lock().destroyed = true;
        self.wake.notify_all();
    }
}

/// Point-in-time view of a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerStatus {
    pub stream: String,
    pub state: RecordingState,
    pub attached: bool,
    pub buffer_depth: usize,
    pub front_seq: Option<u64>,
    pub back_seq: Option<u64>,
    pub analysis_cursor: Option<u64>,
    pub last_recorded_seq: Option<u64>,
    pub config: MotionConfig,
    pub engine: EngineStats,
    pub ports: PortStats,
    /// Packets dropped by detached ports
    pub ignored: u64,
}

/// Motion-triggered recording for one stream
///
/// Owns the shared state and the engine thread. Producers feed it through
/// [`RawInputPort`] and [`FlagMergePort`]; forwarded packets go to the sink
/// handed to [`MotionHandler::spawn`], called on the engine thread with the
/// lock held.
pub struct MotionHandler {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl MotionHandler {
    /// Validate `config` and start the engine thread
    pub fn spawn(
        name: impl Into<String>,
        config: MotionConfig,
        sink: Box<dyn PacketSink>,
    ) -> Result<Self, MotionError> {
        config.check()?;
        let name = name.into();

        let shared = Arc::new(Shared {
            state: Mutex::new(StreamState {
                buffer: PacketBuffer::new(config.prerecord_secs),
                engine: RecordingEngine::new(name.clone(), config.clone()),
                pending: false,
                destroyed: false,
                ports: PortStats::default(),
            }),
            wake: Condvar::new(),
            attached: AtomicBool::new(true),
            ignored: AtomicU64::new(0),
            name: name.clone(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name(format!("motion-{name}"))
            .spawn(move || run(worker_shared, sink))
            .map_err(MotionError::Spawn)?;

        info!(
            stream = %name,
            prerecord_secs = config.prerecord_secs,
            postrecord_secs = config.postrecord_secs,
            analysis_window = config.analysis_window,
            threshold_percent = config.threshold_percent,
            "motion handler started"
        );

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Port for raw packets
    pub fn input_port(&self) -> RawInputPort {
        RawInputPort::new(Arc::downgrade(&self.shared))
    }

    /// Port for motion flags
    pub fn flag_port(&self) -> FlagMergePort {
        FlagMergePort::new(Arc::downgrade(&self.shared))
    }

    /// Set pre/post-roll
    ///
    /// Applied under the lock and observed from the next pass. Re-applying the
    /// current pair is a silent no-op and returns `false`.
    pub fn set_buffer_time(&self, prerecord_secs: u64, postrecord_secs: u64) -> bool {
        let mut state = self.shared.state.lock();
        if !state.engine.set_roll_times(prerecord_secs, postrecord_secs) {
            return false;
        }
        state.buffer.set_duration(prerecord_secs);
        debug!(stream = %self.shared.name, prerecord_secs, postrecord_secs, "buffer time updated");
        true
    }

    /// Set the sliding analysis window (pts units)
    pub fn set_analysis_window(&self, window: i64) -> Result<(), MotionError> {
        if window <= 0 {
            return Err(MotionError::InvalidWindow(window));
        }
        self.shared.state.lock().engine.set_analysis_window(window);
        debug!(stream = %self.shared.name, window, "analysis window updated");
        Ok(())
    }

    /// Set the trigger threshold percentage
    pub fn set_threshold(&self, threshold_percent: u8) -> Result<(), MotionError> {
        if threshold_percent > 100 {
            return Err(MotionError::InvalidThreshold(threshold_percent));
        }
        self.shared.state.lock().engine.set_threshold(threshold_percent);
        debug!(stream = %self.shared.name, threshold_percent, "threshold updated");
        Ok(())
    }

    /// Detach both ports from their producers
    ///
    /// The engine keeps running until [`MotionHandler::destroy`].
    pub fn disconnect(&self) {
        if self.shared.attached.swap(false, Ordering::AcqRel) {
            info!(stream = %self.shared.name, "motion handler ports disconnected");
        }
    }

    pub fn status(&self) -> HandlerStatus {
        let state = self.shared.state.lock();
        let session = state.engine.session();
        HandlerStatus {
            stream: self.shared.name.clone(),
            state: session.state(),
            attached: self.shared.is_attached(),
            buffer_depth: state.buffer.len(),
            front_seq: state.buffer.front().map(|p| p.seq),
            back_seq: state.buffer.back().map(|p| p.seq),
            analysis_cursor: state.engine.analysis_cursor(),
            last_recorded_seq: session.last_recorded_seq,
            config: state.engine.config().clone(),
            engine: state.engine.stats(),
            ports: state.ports,
            ignored: self.shared.ignored.load(Ordering::Relaxed),
        }
    }

    /// Stop the engine, join its thread and return the final status
    pub fn destroy(mut self) -> Result<HandlerStatus, MotionError> {
        self.shared.signal_destroy();
        if let Some(worker) = self.worker.take() {
            worker.join().map_err(|_| MotionError::WorkerPanicked {
                stream: self.shared.name.clone(),
            })?;
        }
        Ok(self.status())
    }
}

impl Drop for MotionHandler {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.shared.signal_destroy();
            if worker.join().is_err() {
                warn!(stream = %self.shared.name, "engine thread panicked");
            }
        }
    }
}

fn run(shared: Arc<Shared>, mut sink: Box<dyn PacketSink>) {
    let mut state = shared.state.lock();
    loop {
        while !state.pending && !state.destroyed {
            shared.wake.wait(&mut state);
        }
        if state.destroyed {
            break;
        }
        state.pending = false;

        let StreamState { buffer, engine, .. } = &mut *state;
        engine.process(buffer, sink.as_mut());
        metrics::record_buffer_depth(&shared.name, buffer.len());
    }

    state.engine.finish(sink.as_mut());
    debug!(stream = %shared.name, "motion handler destroying");
}
