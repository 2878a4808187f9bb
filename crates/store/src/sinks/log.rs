//! LogSink - logs record summary via tracing

use contracts::{ContractError, Record, RecordSink};
use tracing::{info, instrument};

/// Sink that logs records for dry runs
pub struct LogSink {
    name: String,
    total: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            total: 0,
        }
    }

    /// Records accepted since creation
    pub fn total(&self) -> u64 {
        self.total
    }
}

impl RecordSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_append",
        skip(self, record),
        fields(sink = %self.name, loopcount = record.loopcount)
    )]
    fn append(&mut self, record: &Record) -> Result<(), ContractError> {
        info!(
            line = %record.active_line,
            raw_a = record.raw_a,
            raw_b = record.raw_b,
            raw_c = record.raw_c,
            vout = record.vout,
            resistance = record.resistance,
            short_circuit = record.short_circuit,
            "record"
        );
        self.total += 1;
        Ok(())
    }

    #[instrument(name = "log_sink_commit", skip(self))]
    fn commit(&mut self) -> Result<(), ContractError> {
        // Nothing to commit for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, records = self.total, "LogSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ActiveLine;

    #[test]
    fn test_log_sink_counts_records() {
        let mut sink = LogSink::new("dry_run");
        let record = Record {
            loopcount: 1,
            active_line: ActiveLine::A,
            digi_a: 0,
            digi_b: 0,
            digi_c: 0,
            raw_a: 600,
            raw_b: 700,
            raw_c: 800,
            vout: 2.4,
            resistance: 15.58,
            short_circuit: 0,
        };

        sink.append(&record).unwrap();
        sink.append(&record).unwrap();
        sink.commit().unwrap();
        sink.close().unwrap();

        assert_eq!(sink.total(), 2);
        assert_eq!(sink.name(), "dry_run");
    }
}
