//! Pre-roll packet buffer.
//!
//! Packets are kept in ascending `seq` order and trimmed from the front so
//! that only the trailing `duration_secs` (measured on `ts_monotonic` of the
//! newest packet) is retained. The bound is time, not count.

use std::collections::{vec_deque, VecDeque};
use std::fmt;

use contracts::{Packet, PacketFlags};

/// Result of a sequence lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqLookup {
    /// Packet with this seq is buffered at `pos`
    Exact(usize),
    /// Seq is missing; the next buffered packet is at `pos` with `next_seq`
    Gap { pos: usize, next_seq: u64 },
    /// Seq is newer than every buffered packet (or the buffer is empty)
    TooNew,
}

/// Time-bounded, seq-ordered packet buffer
pub struct PacketBuffer {
    packets: VecDeque<Packet>,
    duration_secs: u64,
    trimmed_count: u64,
}

impl fmt::Debug for PacketBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PacketBuffer")
            .field("len", &self.packets.len())
            .field("duration_secs", &self.duration_secs)
            .field("front_seq", &self.front().map(|p| p.seq))
            .field("back_seq", &self.back().map(|p| p.seq))
            .finish()
    }
}

impl PacketBuffer {
    /// Create an empty buffer retaining `duration_secs` of packets
    pub fn new(duration_secs: u64) -> Self {
        Self {
            packets: VecDeque::new(),
            duration_secs,
            trimmed_count: 0,
        }
    }

    /// Append a packet at the back, then trim expired packets from the front
    ///
    /// The caller guarantees `packet.seq` is greater than every buffered seq.
    #[inline]
    pub fn append(&mut self, packet: Packet) {
        debug_assert!(
            self.back().map_or(true, |back| back.seq < packet.seq),
            "packet buffer append out of order"
        );
        self.packets.push_back(packet);
        self.trim();
    }

    /// Change the retention window; applied on subsequent appends
    pub fn set_duration(&mut self, duration_secs: u64) {
        self.duration_secs = duration_secs;
    }

    /// Current retention window in seconds
    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    fn trim(&mut self) {
        let Some(newest) = self.packets.back().map(|p| p.ts_monotonic) else {
            return;
        };

        // Never drops the newest packet
        while self.packets.len() > 1 {
            match self.packets.front() {
                Some(front) if newest.saturating_sub(front.ts_monotonic) > self.duration_secs => {
                    self.packets.pop_front();
                    self.trimmed_count += 1;
                }
                _ => break,
            }
        }
    }

    /// Binary search by seq
    pub fn find_by_seq(&self, seq: u64) -> SeqLookup {
        match self.packets.binary_search_by_key(&seq, |p| p.seq) {
            Ok(pos) => SeqLookup::Exact(pos),
            Err(pos) => match self.packets.get(pos) {
                Some(next) => SeqLookup::Gap {
                    pos,
                    next_seq: next.seq,
                },
                None => SeqLookup::TooNew,
            },
        }
    }

    /// Replace the motion bit of the packet at `pos`, keeping all other bits
    ///
    /// Returns the merged flags, or `None` if `pos` is out of range.
    pub fn merge_motion_at(&mut self, pos: usize, incoming: PacketFlags) -> Option<PacketFlags> {
        let packet = self.packets.get_mut(pos)?;
        packet.flags = packet.flags.merge_motion(incoming);
        Some(packet.flags)
    }

    /// Index of the first packet with `seq > after` (binary search)
    ///
    /// Returns `len()` if no such packet exists.
    pub fn first_after(&self, after: u64) -> usize {
        self.packets.partition_point(|p| p.seq <= after)
    }

    /// Index just past the newest packet with `seq <= seq`, searched from the back
    ///
    /// Returns `None` when every buffered packet is newer than `seq`.
    pub fn resume_position(&self, seq: u64) -> Option<usize> {
        self.packets
            .iter()
            .rposition(|p| p.seq <= seq)
            .map(|idx| idx + 1)
    }

    /// Packet at buffer position
    #[inline]
    pub fn get(&self, pos: usize) -> Option<&Packet> {
        self.packets.get(pos)
    }

    /// Oldest retained packet
    #[inline]
    pub fn front(&self) -> Option<&Packet> {
        self.packets.front()
    }

    /// Newest packet
    #[inline]
    pub fn back(&self) -> Option<&Packet> {
        self.packets.back()
    }

    /// Iterate from `pos` to the back
    pub fn iter_from(&self, pos: usize) -> impl Iterator<Item = &Packet> {
        self.packets.iter().skip(pos)
    }

    /// Iterate over all packets, oldest first
    pub fn iter(&self) -> vec_deque::Iter<'_, Packet> {
        self.packets.iter()
    }

    /// Get the number of packets in the buffer
    #[inline]
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    /// Check if the buffer is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Packets dropped from the front by trimming
    #[inline]
    pub fn trimmed_count(&self) -> u64 {
        self.trimmed_count
    }
}
