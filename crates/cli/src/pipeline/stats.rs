//! Pipeline statistics and metrics.

use ingestion::{RunSummary, StopReason};

/// Statistics from a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Outcome reported by the ingestion loop
    pub summary: RunSummary,

    /// Byte stream name (port, "simulator", capture file)
    pub source: String,

    /// Record sink name (database file or "dry_run")
    pub sink: String,
}

impl PipelineStats {
    /// Records persisted per second
    pub fn records_per_sec(&self) -> f64 {
        self.summary.records_per_sec()
    }

    /// Share of packet lines rejected, as a percentage
    pub fn reject_rate(&self) -> f64 {
        let metrics = &self.summary.metrics;
        let packets = metrics.records_persisted + metrics.rejected();
        if packets > 0 {
            metrics.rejected() as f64 / packets as f64 * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        let metrics = &self.summary.metrics;
        let stopped = match self.summary.stop_reason {
            StopReason::EndOfStream => "end of stream",
            StopReason::Cancelled => "interrupted",
            StopReason::LimitReached => "record limit reached",
        };

        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                    Ingestion Statistics                      ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("Overview");
        println!("   ├─ Source: {}", self.source);
        println!("   ├─ Store: {}", self.sink);
        println!("   ├─ Stopped: {}", stopped);
        println!("   ├─ Duration: {:.2}s", self.summary.duration.as_secs_f64());
        println!("   └─ Records/s: {:.2}", self.records_per_sec());

        println!("\nLines");
        println!("   ├─ Received: {}", metrics.lines_received);
        println!("   ├─ Informational: {}", metrics.informational_lines);
        println!("   ├─ Records persisted: {}", metrics.records_persisted);
        println!("   ├─ Fault records: {}", metrics.fault_records);
        println!("   └─ Commits: {}", metrics.commits);

        if metrics.rejected() > 0 {
            println!("\nRejected ({:.2}%)", self.reject_rate());
            println!("   ├─ Malformed length: {}", metrics.malformed_lines);
            println!("   ├─ Conversion errors: {}", metrics.conversion_errors);
            println!("   └─ Out of domain: {}", metrics.out_of_domain);
        }

        println!();
    }
}
