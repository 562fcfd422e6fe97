//! RecordedSegment - Dispatcher output
//!
//! One contiguous recording, from the first forwarded packet to the
//! end-of-segment sentinel.

use serde::{Deserialize, Serialize};

use crate::Packet;

/// Recording segment assembled from forwarded packets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordedSegment {
    /// Segment counter (monotonically increasing per stream)
    pub index: u64,

    /// Stream name the segment belongs to
    pub stream: String,

    /// Packets in forwarding order
    pub packets: Vec<Packet>,
}

impl RecordedSegment {
    /// First sequence number in the segment
    pub fn first_seq(&self) -> Option<u64> {
        self.packets.first().map(|p| p.seq)
    }

    /// Last sequence number in the segment
    pub fn last_seq(&self) -> Option<u64> {
        self.packets.last().map(|p| p.seq)
    }

    /// Span of monotonic receive time covered by the segment (seconds)
    pub fn duration_secs(&self) -> u64 {
        match (self.packets.first(), self.packets.last()) {
            (Some(first), Some(last)) => last.ts_monotonic.saturating_sub(first.ts_monotonic),
            _ => 0,
        }
    }

    /// Total payload bytes
    pub fn total_bytes(&self) -> u64 {
        self.packets.iter().map(|p| u64::from(p.size)).sum()
    }

    /// Number of packets that carry the motion flag
    pub fn motion_packets(&self) -> usize {
        self.packets.iter().filter(|p| p.has_motion()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PacketFlags;

    fn packet(seq: u64, ts: u64, motion: bool) -> Packet {
        Packet {
            seq,
            ts_monotonic: ts,
            size: 100,
            flags: if motion {
                PacketFlags::MOTION
            } else {
                PacketFlags::NONE
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_segment_summary() {
        let segment = RecordedSegment {
            index: 1,
            stream: "cam".into(),
            packets: vec![packet(4, 10, false), packet(5, 11, true), packet(6, 13, true)],
        };
        assert_eq!(segment.first_seq(), Some(4));
        assert_eq!(segment.last_seq(), Some(6));
        assert_eq!(segment.duration_secs(), 3);
        assert_eq!(segment.total_bytes(), 300);
        assert_eq!(segment.motion_packets(), 2);
    }

    #[test]
    fn test_empty_segment() {
        let segment = RecordedSegment::default();
        assert_eq!(segment.first_seq(), None);
        assert_eq!(segment.duration_secs(), 0);
    }
}
