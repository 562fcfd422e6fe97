//! Recording pipeline metrics.
//!
//! Thin helpers over the `metrics` facade plus an in-memory aggregator of
//! finished segments used for end-of-run summaries.

use contracts::RecordedSegment;
use metrics::{counter, gauge, histogram};

/// Record one raw packet accepted by an input port
pub fn record_packet_received(stream: &str) {
    counter!(
        "motion_packets_received_total",
        "stream" => stream.to_string()
    )
    .increment(1);
}

/// Record the outcome of a flag merge (`merged`, `gap`, `too_new`)
pub fn record_flag_merge(stream: &str, result: &'static str) {
    counter!(
        "motion_flags_merged_total",
        "stream" => stream.to_string(),
        "result" => result
    )
    .increment(1);
}

/// Record packets forwarded to the recording sink in one pass
pub fn record_packets_forwarded(stream: &str, count: usize) {
    if count == 0 {
        return;
    }
    counter!(
        "motion_packets_forwarded_total",
        "stream" => stream.to_string()
    )
    .increment(count as u64);
}

/// Record a recording state transition
pub fn record_transition(stream: &str, transition: &'static str) {
    counter!(
        "motion_state_transitions_total",
        "stream" => stream.to_string(),
        "transition" => transition
    )
    .increment(1);
}

/// Record an internal invariant violation
pub fn record_defect(stream: &str, kind: &'static str) {
    counter!(
        "motion_defects_total",
        "stream" => stream.to_string(),
        "kind" => kind
    )
    .increment(1);
}

/// Record the pre-roll buffer depth
pub fn record_buffer_depth(stream: &str, depth: usize) {
    gauge!(
        "motion_buffer_depth",
        "stream" => stream.to_string()
    )
    .set(depth as f64);
}

/// Record a finished segment
pub fn record_segment(segment: &RecordedSegment) {
    counter!(
        "motion_segments_total",
        "stream" => segment.stream.clone()
    )
    .increment(1);
    histogram!("motion_segment_duration_secs").record(segment.duration_secs() as f64);
    histogram!("motion_segment_packets").record(segment.packets.len() as f64);
}

/// Record a segment handed to a sink
pub fn record_segment_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "motion_segments_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
}

/// Segment metrics aggregator
///
/// Aggregates finished segments in memory for summary output.
#[derive(Debug, Clone, Default)]
pub struct SegmentMetricsAggregator {
    /// Finished segments
    pub total_segments: u64,

    /// Packets across all segments
    pub total_packets: u64,

    /// Motion-flagged packets across all segments
    pub motion_packets: u64,

    /// Payload bytes across all segments
    pub total_bytes: u64,

    /// Segment duration statistics (seconds)
    pub duration_stats: RunningStats,

    /// Packets-per-segment statistics
    pub packet_stats: RunningStats,

    /// Segments per stream
    pub stream_counts: std::collections::HashMap<String, u64>,
}

impl SegmentMetricsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one finished segment into the statistics
    pub fn update(&mut self, segment: &RecordedSegment) {
        self.total_segments += 1;
        self.total_packets += segment.packets.len() as u64;
        self.motion_packets += segment.motion_packets() as u64;
        self.total_bytes += segment.total_bytes();

        self.duration_stats.push(segment.duration_secs() as f64);
        self.packet_stats.push(segment.packets.len() as f64);

        *self
            .stream_counts
            .entry(segment.stream.clone())
            .or_insert(0) += 1;
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_segments: self.total_segments,
            total_packets: self.total_packets,
            motion_packets: self.motion_packets,
            total_bytes: self.total_bytes,
            motion_rate: if self.total_packets > 0 {
                self.motion_packets as f64 / self.total_packets as f64 * 100.0
            } else {
                0.0
            },
            duration_secs: StatsSummary::from(&self.duration_stats),
            packets_per_segment: StatsSummary::from(&self.packet_stats),
            stream_counts: self.stream_counts.clone(),
        }
    }
}

/// Summary of recorded segments
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_segments: u64,
    pub total_packets: u64,
    pub motion_packets: u64,
    pub total_bytes: u64,
    pub motion_rate: f64,
    pub duration_secs: StatsSummary,
    pub packets_per_segment: StatsSummary,
    pub stream_counts: std::collections::HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Recording Summary ===")?;
        writeln!(f, "Segments: {}", self.total_segments)?;
        writeln!(
            f,
            "Packets recorded: {} ({} with motion, {:.2}%)",
            self.total_packets, self.motion_packets, self.motion_rate
        )?;
        writeln!(f, "Bytes recorded: {}", self.total_bytes)?;
        writeln!(f, "Segment duration (s): {}", self.duration_secs)?;
        writeln!(f, "Packets per segment: {}", self.packets_per_segment)?;

        if !self.stream_counts.is_empty() {
            writeln!(f, "Segments per stream:")?;
            for (stream, count) in &self.stream_counts {
                writeln!(f, "  {}: {}", stream, count)?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online mean/variance (Welford)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Packet, PacketFlags};

    fn segment(stream: &str, spans: &[(u64, u64, bool)]) -> RecordedSegment {
        RecordedSegment {
            index: 0,
            stream: stream.to_string(),
            packets: spans
                .iter()
                .map(|&(seq, ts, motion)| Packet {
                    seq,
                    ts_monotonic: ts,
                    size: 10,
                    flags: if motion {
                        PacketFlags::MOTION
                    } else {
                        PacketFlags::NONE
                    },
                    ..Default::default()
                })
                .collect(),
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for value in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(value);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = SegmentMetricsAggregator::new();
        aggregator.update(&segment("cam", &[(1, 10, false), (2, 11, true), (3, 14, true)]));
        aggregator.update(&segment("cam", &[(9, 30, true)]));

        assert_eq!(aggregator.total_segments, 2);
        assert_eq!(aggregator.total_packets, 4);
        assert_eq!(aggregator.motion_packets, 3);
        assert_eq!(aggregator.total_bytes, 40);
        assert_eq!(aggregator.stream_counts.get("cam"), Some(&2));

        let summary = aggregator.summary();
        assert!((summary.motion_rate - 75.0).abs() < 1e-10);
        assert!((summary.duration_secs.max - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = SegmentMetricsAggregator::new();
        aggregator.update(&segment("front", &[(1, 0, true), (2, 2, false)]));

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Segments: 1"));
        assert!(output.contains("50.00%"));
        assert!(output.contains("front: 1"));
    }
}
