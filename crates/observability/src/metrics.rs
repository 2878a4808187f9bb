//! Pipeline metric descriptions and run-level helpers
//!
//! Per-line counters are emitted by the ingestion loop itself; this module
//! describes them for the exporter and records run outcomes.

use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, Unit};

/// Register descriptions for every pipeline metric
pub fn describe_metrics() {
    describe_counter!(
        "line_telemetry_lines_total",
        "Lines received, labelled by kind (record / informational)"
    );
    describe_counter!(
        "line_telemetry_records_total",
        "Records appended and committed"
    );
    describe_counter!(
        "line_telemetry_rejects_total",
        "Packet lines skipped, labelled by reject reason"
    );
    describe_counter!("line_telemetry_commits_total", "Store commits");
    describe_counter!(
        "line_telemetry_faults_total",
        "Records carrying a short-circuit signature"
    );
    describe_histogram!(
        "line_telemetry_chunk_records",
        Unit::Count,
        "Records committed per received chunk"
    );
    describe_counter!("line_telemetry_runs_total", "Completed runs by outcome");
    describe_gauge!(
        "line_telemetry_last_run_seconds",
        Unit::Seconds,
        "Duration of the last completed run"
    );
}

/// Record a run that stopped without a fatal error
pub fn record_run_outcome(stop_reason: &str, duration: Duration) {
    counter!("line_telemetry_runs_total", "outcome" => stop_reason.to_string()).increment(1);
    gauge!("line_telemetry_last_run_seconds").set(duration.as_secs_f64());
}

/// Record a run that stopped on a fatal error (`storage` / `transport`)
pub fn record_run_failure(kind: &str) {
    counter!("line_telemetry_runs_total", "outcome" => format!("{kind}_failure")).increment(1);
}

/// Statistics summary
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
                "min={:.2}, max={:.2}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}
