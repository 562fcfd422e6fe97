//! Recording decision engine.
//!
//! One [`RecordingEngine::process`] call is one analysis pass over the
//! visible buffer. The caller holds the shared lock for the whole pass.

use contracts::{MotionConfig, Packet, PacketSink};
use observability::metrics;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::buffer::PacketBuffer;
use crate::window::MotionWindow;

/// Externally visible recording state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    /// Nothing forwarded since the last stop
    Idle,
    /// Forwarding every new packet
    Active,
    /// Motion ended; the segment stays open until its tail ages out of the buffer
    PostRoll,
}

impl RecordingState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingState::Idle => "idle",
            RecordingState::Active => "active",
            RecordingState::PostRoll => "post_roll",
        }
    }
}

/// State change made during a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Idle to Active, forwarding the whole pre-roll
    Start,
    /// PostRoll to Active, continuing after the last forwarded packet
    Resume,
    /// PostRoll to Active with an aged-out resume point
    ///
    /// Emits the previous segment's sentinel before forwarding the new pre-roll.
    Restart,
    /// Active to PostRoll
    Pause,
    /// PostRoll to Idle, sentinel emitted
    Stop,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Start => "start",
            Transition::Resume => "resume",
            Transition::Restart => "restart",
            Transition::Pause => "pause",
            Transition::Stop => "stop",
        }
    }
}

/// Session state owned by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordingSession {
    pub recording: bool,
    /// Seq of the last forwarded packet; `None` once fully stopped
    pub last_recorded_seq: Option<u64>,
    /// `ts_monotonic` of the most recent triggering packet
    pub last_motion_ts: u64,
}

impl RecordingSession {
    pub fn state(&self) -> RecordingState {
        match (self.recording, self.last_recorded_seq) {
            (true, _) => RecordingState::Active,
            (false, Some(_)) => RecordingState::PostRoll,
            (false, None) => RecordingState::Idle,
        }
    }
}

/// Engine counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub passes: u64,
    pub packets_analyzed: u64,
    pub packets_forwarded: u64,
    pub segments_started: u64,
    pub segments_closed: u64,
    pub defects: u64,
    pub sink_errors: u64,
}

/// Result of one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassOutcome {
    pub triggered: bool,
    pub transitions: Vec<Transition>,
    pub forwarded: usize,
}

/// Motion-triggered recording state machine
#[derive(Debug)]
pub struct RecordingEngine {
    stream: String,
    config: MotionConfig,
    window: MotionWindow,
    session: RecordingSession,
    /// Seq of the last packet fed to the analyzer
    analysis_cursor: Option<u64>,
    stats: EngineStats,
}

impl RecordingEngine {
    pub fn new(stream: impl Into<String>, config: MotionConfig) -> Self {
        Self {
            stream: stream.into(),
            window: MotionWindow::new(config.analysis_window),
            config,
            session: RecordingSession::default(),
            analysis_cursor: None,
            stats: EngineStats::default(),
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    pub fn state(&self) -> RecordingState {
        self.session.state()
    }

    pub fn session(&self) -> RecordingSession {
        self.session
    }

    pub fn analysis_cursor(&self) -> Option<u64> {
        self.analysis_cursor
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    /// Motion percentage of the current window
    pub fn window_percentage(&self) -> Option<u64> {
        self.window.percentage()
    }

    /// Update pre/post-roll; returns `false` if both values are unchanged
    pub fn set_roll_times(&mut self, prerecord_secs: u64, postrecord_secs: u64) -> bool {
        if self.config.prerecord_secs == prerecord_secs
            && self.config.postrecord_secs == postrecord_secs
        {
            return false;
        }
        self.config.prerecord_secs = prerecord_secs;
        self.config.postrecord_secs = postrecord_secs;
        true
    }

    pub fn set_analysis_window(&mut self, window: i64) {
        self.config.analysis_window = window;
        self.window.set_window(window);
    }

    pub fn set_threshold(&mut self, threshold_percent: u8) {
        self.config.threshold_percent = threshold_percent;
    }

    /// Run one analysis pass
    ///
    /// Feeds unseen packets to the analyzer, applies at most one start/resume
    /// and at most one pause or stop, then forwards whatever the session owes
    /// the sink. Sink errors are logged and counted; they never abort the pass.
    #[instrument(
        level = "trace",
        name = "motion_engine_pass",
        skip(self, buffer, sink),
        fields(stream = %self.stream, depth = buffer.len())
    )]
    pub fn process(&mut self, buffer: &PacketBuffer, sink: &mut dyn PacketSink) -> PassOutcome {
        self.stats.passes += 1;
        let mut outcome = PassOutcome::default();

        let (Some(front_seq), Some(back_ts)) =
            (buffer.front().map(|p| p.seq), buffer.back().map(|p| p.ts_monotonic))
        else {
            return outcome;
        };

        // Feed the analyzer from the cursor, stopping at the first trigger
        let mut trigger_ts = None;
        let scan_from = self.analysis_cursor.map_or(0, |cursor| buffer.first_after(cursor));
        for packet in buffer.iter_from(scan_from) {
            self.window.push(packet.pts, packet.has_motion());
            self.analysis_cursor = Some(packet.seq);
            self.stats.packets_analyzed += 1;

            trace!(
                seq = packet.seq,
                pts = packet.pts,
                motion = packet.has_motion(),
                sum = self.window.sum(),
                count = self.window.count(),
                "analyzed packet"
            );

            if self.window.meets(self.config.threshold_percent) {
                trigger_ts = Some(packet.ts_monotonic);
                break;
            }
        }
        outcome.triggered = trigger_ts.is_some();

        // Start or resume
        let mut forward_from = None;
        if outcome.triggered && !self.session.recording {
            let transition = match self.session.last_recorded_seq {
                Some(last) if last >= front_seq => {
                    forward_from = Some(buffer.first_after(last));
                    Transition::Resume
                }
                Some(last) => {
                    // Resume point already trimmed; close the old segment first
                    debug!(last_recorded_seq = last, front_seq, "resume point aged out");
                    self.emit_sentinel(sink);
                    self.session.last_recorded_seq = None;
                    forward_from = Some(0);
                    Transition::Restart
                }
                None => {
                    forward_from = Some(0);
                    Transition::Start
                }
            };

            if transition != Transition::Resume {
                self.stats.segments_started += 1;
            }
            self.session.recording = true;
            self.note_transition(transition, &mut outcome, buffer);
        }

        // Pause once the hold period since the last trigger has elapsed
        if !outcome.triggered
            && self.session.recording
            && back_ts.saturating_sub(self.session.last_motion_ts) > self.config.hold_secs()
        {
            self.session.recording = false;
            self.window.reset();
            self.note_transition(Transition::Pause, &mut outcome, buffer);
        }

        // Stop once the last forwarded packet has left the buffer
        if !self.session.recording {
            if let Some(last) = self.session.last_recorded_seq {
                if front_seq > last {
                    self.emit_sentinel(sink);
                    self.session.last_recorded_seq = None;
                    self.window.reset();
                    self.note_transition(Transition::Stop, &mut outcome, buffer);
                    return outcome;
                }
            }
        }

        // Remember the trigger time for the hold period
        if let Some(ts) = trigger_ts {
            self.session.last_motion_ts = ts;
        }

        // Nothing to forward while paused
        if !self.session.recording {
            return outcome;
        }

        // Locate the forward range
        let start = match forward_from {
            Some(pos) => pos,
            None => match self.session.last_recorded_seq {
                None => 0,
                Some(last) => match buffer.resume_position(last) {
                    Some(pos) => pos,
                    None => {
                        error!(
                            stream = %self.stream,
                            last_recorded_seq = last,
                            front_seq,
                            "last_recorded_seq is not in buffer, forwarding whole buffer"
                        );
                        self.stats.defects += 1;
                        metrics::record_defect(&self.stream, "last_recorded_missing");
                        0
                    }
                },
            },
        };

        // Forward in order
        let mut last_forwarded = None;
        for packet in buffer.iter_from(start) {
            if let Err(e) = sink.send(packet) {
                self.stats.sink_errors += 1;
                warn!(sink = sink.name(), seq = packet.seq, error = %e, "sink rejected packet");
            }
            trace!(seq = packet.seq, "forwarded packet");
            last_forwarded = Some(packet.seq);
            outcome.forwarded += 1;
        }

        if last_forwarded.is_some() {
            self.session.last_recorded_seq = last_forwarded;
        }
        self.stats.packets_forwarded += outcome.forwarded as u64;
        metrics::record_packets_forwarded(&self.stream, outcome.forwarded);

        outcome
    }

    /// Close an open segment on shutdown
    ///
    /// Returns `true` if a sentinel was emitted.
    pub fn finish(&mut self, sink: &mut dyn PacketSink) -> bool {
        if self.session.last_recorded_seq.is_none() {
            return false;
        }

        self.emit_sentinel(sink);
        self.session = RecordingSession::default();
        self.window.reset();
        info!(stream = %self.stream, "closed open segment on shutdown");
        metrics::record_transition(&self.stream, Transition::Stop.as_str());
        true
    }

    fn emit_sentinel(&mut self, sink: &mut dyn PacketSink) {
        if let Err(e) = sink.send(&Packet::sentinel()) {
            self.stats.sink_errors += 1;
            warn!(sink = sink.name(), error = %e, "sink rejected end-of-segment");
        }
        self.stats.segments_closed += 1;
    }

    fn note_transition(
        &self,
        transition: Transition,
        outcome: &mut PassOutcome,
        buffer: &PacketBuffer,
    ) {
        info!(
            stream = %self.stream,
            transition = transition.as_str(),
            state = self.state().as_str(),
            last_recorded_seq = ?self.session.last_recorded_seq,
            front_seq = ?buffer.front().map(|p| p.seq),
            back_seq = ?buffer.back().map(|p| p.seq),
            percentage = ?self.window.percentage(),
            "recording state changed"
        );
        metrics::record_transition(&self.stream, transition.as_str());
        outcome.transitions.push(transition);
    }
}
