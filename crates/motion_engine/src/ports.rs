//! Producer-side ports of a [`crate::MotionHandler`].
//!
//! Ports hold a `Weak` reference to the handler state. A port whose handler
//! has been disconnected or destroyed ignores every packet with a warning.

use std::sync::{Arc, Weak};

use contracts::{Packet, PacketCallback};
use observability::metrics;
use tracing::{debug, error, instrument, trace, warn};

use crate::buffer::SeqLookup;
use crate::handler::Shared;

/// Port counters, kept under the handler lock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PortStats {
    pub raw_received: u64,
    /// Sentinel or out-of-order raw packets
    pub raw_rejected: u64,
    pub flags_merged: u64,
    /// Flags for a seq missing from the buffer
    pub flag_gaps: u64,
    /// Flags newer than every buffered packet
    pub flags_dropped: u64,
}

fn upgrade(shared: &Weak<Shared>, port: &'static str) -> Option<Arc<Shared>> {
    match shared.upgrade() {
        Some(shared) if shared.is_attached() => Some(shared),
        Some(shared) => {
            shared.note_ignored();
            warn!(stream = %shared.name, port, "ignoring packet due to missing target");
            None
        }
        None => {
            warn!(port, "ignoring packet due to missing target");
            None
        }
    }
}

/// Receives newly arrived raw packets
#[derive(Debug, Clone)]
pub struct RawInputPort {
    shared: Weak<Shared>,
}

impl RawInputPort {
    pub(crate) fn new(shared: Weak<Shared>) -> Self {
        Self { shared }
    }

    /// Append a packet and wake the engine
    ///
    /// Packets must arrive with strictly increasing `seq`; the sentinel and
    /// out-of-order packets are logged and dropped.
    #[instrument(level = "trace", name = "raw_input_push", skip(self, packet), fields(seq = packet.seq))]
    pub fn push(&self, packet: Packet) {
        let Some(shared) = upgrade(&self.shared, "raw") else {
            return;
        };

        let mut state = shared.state.lock();
        if packet.is_sentinel() {
            state.ports.raw_rejected += 1;
            error!(stream = %shared.name, "raw input received a sentinel packet");
            metrics::record_defect(&shared.name, "raw_sentinel");
            return;
        }
        if let Some(back) = state.buffer.back() {
            if packet.seq <= back.seq {
                let back_seq = back.seq;
                state.ports.raw_rejected += 1;
                error!(stream = %shared.name, seq = packet.seq, back_seq, "raw input out of order");
                metrics::record_defect(&shared.name, "raw_out_of_order");
                return;
            }
        }

        trace!(
            seq = packet.seq,
            pts = packet.pts,
            ts_monotonic = packet.ts_monotonic,
            flags = ?packet.flags,
            size = packet.size,
            "raw packet"
        );
        state.buffer.append(packet);
        state.ports.raw_received += 1;
        state.pending = true;
        drop(state);

        shared.wake.notify_one();
        metrics::record_packet_received(&shared.name);
    }

    /// Adapt the port into a source callback
    pub fn callback(&self) -> PacketCallback {
        let port = self.clone();
        Arc::new(move |packet| port.push(packet))
    }
}

/// Receives motion flags keyed by `seq`
#[derive(Debug, Clone)]
pub struct FlagMergePort {
    shared: Weak<Shared>,
}

impl FlagMergePort {
    pub(crate) fn new(shared: Weak<Shared>) -> Self {
        Self { shared }
    }

    /// Merge the motion bit of `packet` into the buffered packet with the same `seq`
    ///
    /// Only the `MOTION` bit is taken from `packet`; every other stored bit is kept.
    #[instrument(level = "trace", name = "flag_merge_push", skip(self, packet), fields(seq = packet.seq))]
    pub fn push(&self, packet: Packet) {
        let Some(shared) = upgrade(&self.shared, "flags") else {
            return;
        };

        let mut state = shared.state.lock();
        let result = match state.buffer.find_by_seq(packet.seq) {
            SeqLookup::Exact(pos) => {
                let merged = state.buffer.merge_motion_at(pos, packet.flags);
                trace!(seq = packet.seq, flags = ?merged, "merged motion flag");
                state.ports.flags_merged += 1;
                "merged"
            }
            SeqLookup::Gap { next_seq, .. } => {
                debug!(
                    stream = %shared.name,
                    seq = packet.seq,
                    next_seq,
                    "missing packet in input for motion flag"
                );
                state.ports.flag_gaps += 1;
                "gap"
            }
            SeqLookup::TooNew => {
                state.ports.flags_dropped += 1;
                let back_seq = state.buffer.back().map(|p| p.seq);
                drop(state);
                error!(
                    stream = %shared.name,
                    seq = packet.seq,
                    back_seq = ?back_seq,
                    "motion flag is newer than every buffered packet"
                );
                metrics::record_flag_merge(&shared.name, "too_new");
                return;
            }
        };
        state.pending = true;
        drop(state);

        shared.wake.notify_one();
        metrics::record_flag_merge(&shared.name, result);
    }

    /// Adapt the port into a source callback
    pub fn callback(&self) -> PacketCallback {
        let port = self.clone();
        Arc::new(move |packet| port.push(packet))
    }
}
