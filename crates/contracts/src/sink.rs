//! Sink traits - Motion Engine / Dispatcher output interfaces
//!
//! Two layers:
//! - [`PacketSink`]: synchronous, called by the recording engine while its
//!   internal lock is held. Implementations must not block for long.
//! - [`SegmentSink`]: asynchronous, receives fully assembled segments on a
//!   dispatcher worker task.

use crate::{ContractError, Packet, RecordedSegment};

/// Receiver of forwarded packets
///
/// Gets an ordered run of packets per segment, each segment terminated by
/// exactly one [`Packet::sentinel`].
pub trait PacketSink: Send {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Accept one forwarded packet or the end-of-segment sentinel
    ///
    /// # Errors
    /// Returns a send error; the engine logs it and keeps going.
    fn send(&mut self, packet: &Packet) -> Result<(), ContractError>;
}

impl<S: PacketSink + ?Sized> PacketSink for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn send(&mut self, packet: &Packet) -> Result<(), ContractError> {
        (**self).send(packet)
    }
}

/// Segment output trait
///
/// All segment sink implementations must implement this trait.
#[trait_variant::make(SegmentSink: Send)]
pub trait LocalSegmentSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write a finished recording segment
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, segment: &RecordedSegment) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
