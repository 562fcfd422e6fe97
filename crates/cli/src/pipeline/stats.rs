//! Pipeline statistics.

use std::time::Duration;

use dispatcher::DispatchReport;
use ingestion::MetricsSnapshot as SourceSnapshot;
use motion_engine::HandlerStatus;

/// Why the pipeline stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The simulated schedule produced every frame
    Completed,
    /// `--timeout` expired
    TimedOut,
    /// Ctrl+C or SIGTERM
    Interrupted,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Completed => "completed",
            StopReason::TimedOut => "timed_out",
            StopReason::Interrupted => "interrupted",
        }
    }
}

/// Statistics from a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub stop_reason: StopReason,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Raw packet source counters
    pub camera: SourceSnapshot,

    /// Motion flag source counters
    pub detector: SourceSnapshot,

    /// Final motion handler status
    pub handler: HandlerStatus,

    /// Dispatcher totals and per-sink metrics
    pub report: DispatchReport,
}

impl PipelineStats {
    /// Packets the engine forwarded to the assembler
    pub fn forwarded(&self) -> u64 {
        self.handler.engine.packets_forwarded
    }

    /// Share of produced packets that ended up recorded, in percent
    pub fn recorded_rate(&self) -> f64 {
        if self.camera.packets_emitted > 0 {
            self.forwarded() as f64 / self.camera.packets_emitted as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Recording Statistics                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Stream: {}", self.handler.stream);
        println!("   ├─ Stopped: {}", self.stop_reason.as_str());
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Packets produced: {}", self.camera.packets_emitted);
        println!("   ├─ Flags produced: {}", self.detector.flags_emitted);
        println!(
            "   └─ Packets recorded: {} ({:.2}%)",
            self.forwarded(),
            self.recorded_rate()
        );

        let engine = &self.handler.engine;
        let ports = &self.handler.ports;
        println!("\n🎥 Motion Engine");
        println!("   ├─ Final state: {}", self.handler.state.as_str());
        println!("   ├─ Passes: {}", engine.passes);
        println!(
            "   ├─ Segments: {} started, {} closed",
            engine.segments_started, engine.segments_closed
        );
        println!(
            "   ├─ Flags: {} merged, {} gaps, {} dropped",
            ports.flags_merged, ports.flag_gaps, ports.flags_dropped
        );
        println!("   ├─ Raw packets rejected: {}", ports.raw_rejected);
        println!("   ├─ Sink errors: {}", engine.sink_errors);
        println!("   └─ Defects: {}", engine.defects);

        let summary = &self.report.summary;
        println!("\n📦 Segments");
        println!("   ├─ Dispatched: {}", self.report.segments);
        println!("   ├─ Bytes: {}", summary.total_bytes);
        println!("   ├─ Duration (s): {}", summary.duration_secs);
        println!("   └─ Packets per segment: {}", summary.packets_per_segment);

        if !self.report.sinks.is_empty() {
            println!("\n📤 Sinks");
            for (i, (name, snapshot)) in self.report.sinks.iter().enumerate() {
                let prefix = if i == self.report.sinks.len() - 1 {
                    "└─"
                } else {
                    "├─"
                };
                if snapshot.lost() > 0 {
                    println!("   {} {}: {} ⚠", prefix, name, snapshot);
                } else {
                    println!("   {} {}: {}", prefix, name, snapshot);
                }
            }
        }

        println!();
    }
}
