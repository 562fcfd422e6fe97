//! Packet - Ingestion output, Motion Engine input
//!
//! One encoded video packet as seen by the recording core.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Packet flag bitmask
///
/// Only [`PacketFlags::MOTION`] carries meaning for the recording core.
/// Every other bit is opaque and must survive flag merges unchanged.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PacketFlags(u32);

impl PacketFlags {
    /// No flags set
    pub const NONE: Self = Self(0);
    /// Packet is a keyframe (opaque to the recording core)
    pub const KEYFRAME: Self = Self(1 << 0);
    /// Motion detector marked this packet as containing motion
    pub const MOTION: Self = Self(1 << 1);

    /// Build from raw bits
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bits
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Check whether all bits of `other` are set
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Replace only the motion bit with the motion bit of `incoming`
    ///
    /// All other bits of `self` are kept as-is; all other bits of `incoming`
    /// are ignored.
    #[must_use]
    pub const fn merge_motion(self, incoming: Self) -> Self {
        Self((self.0 & !Self::MOTION.0) | (incoming.0 & Self::MOTION.0))
    }
}

impl BitOr for PacketFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PacketFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for PacketFlags {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for PacketFlags {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Debug for PacketFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PacketFlags({:#04x})", self.0)
    }
}

/// Encoded video packet
///
/// `seq` is the identity and ordering key. The default value is the
/// end-of-segment sentinel; real streams start at `seq = 1`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// Stream sequence number, strictly increasing, unique
    pub seq: u64,

    /// Codec presentation timestamp (drives the sliding-window analyzer)
    pub pts: i64,

    /// Monotonic receive time in seconds (drives pre/post-roll arithmetic)
    pub ts_monotonic: u64,

    /// Wall-clock receive time in seconds (diagnostics only)
    pub ts_clock: u64,

    /// Flag bitmask
    pub flags: PacketFlags,

    /// Payload size in bytes
    pub size: u32,

    /// Encoded payload (zero-copy, opaque)
    pub payload: Bytes,
}

impl Packet {
    /// End-of-segment marker forwarded to sinks
    pub fn sentinel() -> Self {
        Self::default()
    }

    /// Whether this packet is the end-of-segment marker
    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.seq == 0
    }

    /// Whether the motion bit is set
    #[inline]
    pub fn has_motion(&self) -> bool {
        self.flags.contains(PacketFlags::MOTION)
    }

    /// Build a flag-only packet as produced by a motion detector
    pub fn motion_flag(seq: u64, motion: bool) -> Self {
        Self {
            seq,
            flags: if motion {
                PacketFlags::MOTION
            } else {
                PacketFlags::NONE
            },
            ..Default::default()
        }
    }
}
