//! Deterministic frame timeline for simulated streams.
//!
//! Frame `n` (0-based) is captured at `n / fps` seconds of stream time and
//! carries `seq = n + 1`, since seq 0 is reserved for the sentinel.

use bytes::Bytes;
use contracts::{MotionSpan, Packet, PacketFlags};

/// Microseconds per second of `pts`
pub const PTS_PER_SEC: i64 = 1_000_000;

/// Timeline of a simulated camera
#[derive(Debug, Clone)]
pub struct StreamSchedule {
    fps: f64,
    motion: Vec<MotionSpan>,
    keyframe_interval: u64,
    payload: Bytes,
    in_band_motion: bool,
}

impl StreamSchedule {
    pub fn new(fps: f64, motion: Vec<MotionSpan>) -> Self {
        Self {
            fps,
            motion,
            keyframe_interval: fps.round().max(1.0) as u64,
            payload: Bytes::new(),
            in_band_motion: true,
        }
    }

    /// Emit a keyframe every `interval` frames
    pub fn with_keyframe_interval(mut self, interval: u64) -> Self {
        self.keyframe_interval = interval.max(1);
        self
    }

    /// Attach a zero-filled payload of `size` bytes to every packet
    pub fn with_payload_size(mut self, size: usize) -> Self {
        self.payload = Bytes::from(vec![0u8; size]);
        self
    }

    /// Whether raw packets carry the motion bit themselves
    pub fn with_in_band_motion(mut self, enabled: bool) -> Self {
        self.in_band_motion = enabled;
        self
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Stream time of frame `index`, in seconds
    pub fn time_of(&self, index: u64) -> f64 {
        index as f64 / self.fps
    }

    /// Whether the schedule has motion at stream time `secs`
    pub fn motion_at(&self, secs: f64) -> bool {
        self.motion.iter().any(|span| span.contains(secs))
    }

    /// Whether the frame with this `pts` shows motion
    pub fn motion_at_pts(&self, pts: i64) -> bool {
        self.motion_at(pts as f64 / PTS_PER_SEC as f64)
    }

    /// Frames needed to cover `duration_secs`
    pub fn frames_for(&self, duration_secs: u64) -> u64 {
        (duration_secs as f64 * self.fps).ceil() as u64
    }

    /// Build raw packet `index`; `clock_base` is the wall-clock second of frame 0
    pub fn packet(&self, index: u64, clock_base: u64) -> Packet {
        let secs = self.time_of(index);
        let mut flags = PacketFlags::NONE;
        if index % self.keyframe_interval == 0 {
            flags |= PacketFlags::KEYFRAME;
        }
        if self.in_band_motion && self.motion_at(secs) {
            flags |= PacketFlags::MOTION;
        }

        Packet {
            seq: index + 1,
            pts: (secs * PTS_PER_SEC as f64).round() as i64,
            ts_monotonic: secs.floor() as u64,
            ts_clock: clock_base + secs.floor() as u64,
            flags,
            size: self.payload.len() as u32,
            payload: self.payload.clone(),
        }
    }
}
