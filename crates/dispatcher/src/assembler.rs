//! SegmentAssembler - groups forwarded packets into segments
//!
//! Runs on the motion engine thread with the engine lock held, so it never
//! waits: finished segments are handed to the dispatcher with `try_send`.

use std::mem;

use contracts::{ContractError, Packet, PacketSink, RecordedSegment};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// [`PacketSink`] that turns a forwarded packet run plus its sentinel into a [`RecordedSegment`]
pub struct SegmentAssembler {
    name: String,
    stream: String,
    tx: mpsc::Sender<RecordedSegment>,
    current: Vec<Packet>,
    next_index: u64,
}

impl SegmentAssembler {
    pub fn new(
        name: impl Into<String>,
        stream: impl Into<String>,
        tx: mpsc::Sender<RecordedSegment>,
    ) -> Self {
        Self {
            name: name.into(),
            stream: stream.into(),
            tx,
            current: Vec::new(),
            next_index: 0,
        }
    }

    /// Packets gathered for the open segment
    pub fn pending_packets(&self) -> usize {
        self.current.len()
    }

    /// Index the next finished segment will carry
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    fn finish_segment(&mut self) -> Result<(), ContractError> {
        if self.current.is_empty() {
            debug!(sink = %self.name, "end of segment with no packets");
            return Ok(());
        }

        let segment = RecordedSegment {
            index: self.next_index,
            stream: self.stream.clone(),
            packets: mem::take(&mut self.current),
        };
        self.next_index += 1;

        debug!(
            sink = %self.name,
            index = segment.index,
            first_seq = ?segment.first_seq(),
            last_seq = ?segment.last_seq(),
            packets = segment.packets.len(),
            "segment assembled"
        );

        match self.tx.try_send(segment) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(segment)) => {
                warn!(sink = %self.name, index = segment.index, "queue full, segment dropped");
                Err(ContractError::SinkQueueFull {
                    sink_name: self.name.clone(),
                })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(ContractError::SinkClosed {
                sink_name: self.name.clone(),
            }),
        }
    }
}

impl PacketSink for SegmentAssembler {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&mut self, packet: &Packet) -> Result<(), ContractError> {
        if packet.is_sentinel() {
            return self.finish_segment();
        }

        if let Some(last) = self.current.last() {
            if packet.seq <= last.seq {
                return Err(ContractError::sink_write(
                    &self.name,
                    format!("seq {} after {} within one segment", packet.seq, last.seq),
                ));
            }
        }

        self.current.push(packet.clone());
        Ok(())
    }
}
