//! # Integration Tests
//!
//! End-to-end tests across crates.
//!
//! Covers:
//! - Contract snapshot tests
//! - Simulator -> ingestion loop -> SQLite, without hardware
//! - Capture replay and failure paths

#[cfg(test)]
mod contract_tests {
    use contracts::{ActiveLine, Record, FIELD_COUNT, FIELD_NAMES};

    #[test]
    fn test_wire_field_order() {
        assert_eq!(FIELD_COUNT, 11);
        assert_eq!(FIELD_NAMES[1], "active_line");
        assert_eq!(FIELD_NAMES[10], "short_circuit");
    }

    #[test]
    fn test_reference_packet_round_trip() {
        let line = "data:5;B;0;0;0;700;800;900;3.20;5.43;0";
        let record = match ingestion::parse_line(line).unwrap() {
            ingestion::ParsedLine::Record(record) => record,
            ingestion::ParsedLine::Informational => panic!("packet treated as informational"),
        };

        assert_eq!(
            record,
            Record {
                loopcount: 5,
                active_line: ActiveLine::B,
                digi_a: 0,
                digi_b: 0,
                digi_c: 0,
                raw_a: 700,
                raw_b: 800,
                raw_c: 900,
                vout: 3.20,
                resistance: 5.43,
                short_circuit: 0,
            }
        );
        assert_eq!(record.to_wire_line(), line);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Write;
    use std::path::Path;

    use contracts::{
        ByteStream, CancellationToken, ContractError, RecordSink, SimulatorConfig, StoreConfig,
        StreamChunk,
    };
    use device::{DeviceSimulator, ReplayStream, SimulatedStream};
    use ingestion::{IngestionError, IngestionLoop, LoopOptions, StopReason};
    use rusqlite::Connection;
    use store::SqliteSink;

    fn fast_simulator(seed: u64) -> SimulatorConfig {
        SimulatorConfig {
            cycle_delay_ms: 0,
            seed: Some(seed),
            ..Default::default()
        }
    }

    fn store_at(path: &Path) -> StoreConfig {
        StoreConfig {
            path: path.to_path_buf(),
            table: "data".to_string(),
        }
    }

    fn quiet() -> LoopOptions {
        LoopOptions {
            echo_lines: false,
            ..Default::default()
        }
    }

    fn count_rows(path: &Path, filter: &str) -> i64 {
        let conn = Connection::open(path).unwrap();
        conn.query_row(&format!("SELECT COUNT(*) FROM data {filter}"), [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    /// Simulator -> IngestionLoop -> SqliteSink
    ///
    /// Every simulated cycle lands as exactly one row, in channel order.
    #[test]
    fn test_e2e_simulated_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("serial_output.db");

        let stream = SimulatedStream::new(&fast_simulator(42)).with_max_cycles(300);
        let sink = SqliteSink::open(&store_at(&db)).unwrap();

        let summary = IngestionLoop::new(
            Box::new(stream),
            Box::new(sink),
            quiet(),
            CancellationToken::new(),
        )
        .run()
        .unwrap();

        assert_eq!(summary.stop_reason, StopReason::EndOfStream);
        assert_eq!(summary.metrics.records_persisted, 300);
        assert_eq!(summary.metrics.rejected(), 0);
        assert!(summary.metrics.informational_lines > 0);

        assert_eq!(count_rows(&db, ""), 300);
        assert_eq!(count_rows(&db, "WHERE short_circuit NOT IN (0, 2, 3)"), 0);
        assert_eq!(count_rows(&db, "WHERE loopcount = 99"), 3);

        let conn = Connection::open(&db).unwrap();
        let lines: Vec<String> = conn
            .prepare("SELECT active_line FROM data ORDER BY id LIMIT 6")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(lines, ["C", "B", "A", "C", "B", "A"]);
    }

    /// Normal-mode rows keep resistance inside [0, 20]
    #[test]
    fn test_e2e_normal_resistance_clamped() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("out.db");

        let stream = SimulatedStream::new(&fast_simulator(5)).with_max_cycles(1_000);
        let sink = SqliteSink::open(&store_at(&db)).unwrap();
        IngestionLoop::new(
            Box::new(stream),
            Box::new(sink),
            quiet(),
            CancellationToken::new(),
        )
        .run()
        .unwrap();

        assert_eq!(
            count_rows(
                &db,
                "WHERE short_circuit = 0 AND (resistance < 0 OR resistance > 20)"
            ),
            0
        );
    }

    /// Capture written from simulator text, replayed through the loop
    #[test]
    fn test_e2e_replay_capture_with_noise() {
        let dir = tempfile::tempdir().unwrap();
        let capture = dir.path().join("capture.log");
        let db = dir.path().join("replay.db");

        let mut sim = DeviceSimulator::new(&fast_simulator(8));
        let mut file = std::fs::File::create(&capture).unwrap();
        for _ in 0..30 {
            // CRLF, like the firmware's println
            let text = sim.next_cycle().to_text().replace('\n', "\r\n");
            file.write_all(text.as_bytes()).unwrap();
        }
        file.write_all(b"data:1;A;0;0\r\ndata:2;A;0;0;0;x;1;1;0.00;0.00;0\r\n")
            .unwrap();
        drop(file);

        let stream = ReplayStream::open(&capture, 37, None).unwrap();
        let sink = SqliteSink::open(&store_at(&db)).unwrap();
        let summary = IngestionLoop::new(
            Box::new(stream),
            Box::new(sink),
            quiet(),
            CancellationToken::new(),
        )
        .run()
        .unwrap();

        assert_eq!(summary.metrics.records_persisted, 30);
        assert_eq!(summary.metrics.malformed_lines, 1);
        assert_eq!(summary.metrics.conversion_errors, 1);
        assert_eq!(count_rows(&db, ""), 30);
    }

    /// A loopcount SQLite cannot hold is rejected; the rest of the chunk persists
    #[test]
    fn test_e2e_oversized_loopcount_does_not_stop_run() {
        let dir = tempfile::tempdir().unwrap();
        let capture = dir.path().join("capture.log");
        let db = dir.path().join("out.db");
        std::fs::write(
            &capture,
            "data:9223372036854775808;A;0;0;0;700;800;900;3.20;5.43;0\n\
             data:6;A;0;0;0;700;800;900;3.20;5.43;0\n",
        )
        .unwrap();

        let stream = ReplayStream::open(&capture, 4096, None).unwrap();
        let sink = SqliteSink::open(&store_at(&db)).unwrap();
        let summary = IngestionLoop::new(
            Box::new(stream),
            Box::new(sink),
            quiet(),
            CancellationToken::new(),
        )
        .run()
        .unwrap();

        assert_eq!(summary.stop_reason, StopReason::EndOfStream);
        assert_eq!(summary.metrics.conversion_errors, 1);
        assert_eq!(summary.metrics.records_persisted, 1);
        assert_eq!(count_rows(&db, "WHERE loopcount = 6"), 1);
        assert_eq!(count_rows(&db, ""), 1);
    }

    /// Two runs against the same file append to one table
    #[test]
    fn test_e2e_second_run_appends() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("out.db");

        for seed in [1, 2] {
            let stream = SimulatedStream::new(&fast_simulator(seed)).with_max_cycles(9);
            let sink = SqliteSink::open(&store_at(&db)).unwrap();
            IngestionLoop::new(
                Box::new(stream),
                Box::new(sink),
                quiet(),
                CancellationToken::new(),
            )
            .run()
            .unwrap();
        }

        assert_eq!(count_rows(&db, ""), 18);
    }

    /// Stream that delivers one packet then fails like an unplugged device
    struct UnpluggedAfterOne {
        sent: bool,
    }

    impl ByteStream for UnpluggedAfterOne {
        fn name(&self) -> &str {
            "unplugged"
        }

        fn read_chunk(&mut self) -> Result<StreamChunk, ContractError> {
            if self.sent {
                return Err(ContractError::transport("unplugged", "device disconnected"));
            }
            self.sent = true;
            Ok(StreamChunk::Data(
                "data:0;C;0;0;0;600;600;600;2.40;15.58;0\n".into(),
            ))
        }

        fn close(&mut self) -> Result<(), ContractError> {
            Ok(())
        }
    }

    /// Transport failure keeps committed rows and closes the store
    #[test]
    fn test_e2e_transport_failure_keeps_committed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("out.db");
        let sink = SqliteSink::open(&store_at(&db)).unwrap();

        let err = IngestionLoop::new(
            Box::new(UnpluggedAfterOne { sent: false }),
            Box::new(sink),
            quiet(),
            CancellationToken::new(),
        )
        .run()
        .unwrap_err();

        assert!(matches!(err, IngestionError::Transport(_)));
        assert_eq!(count_rows(&db, ""), 1);

        // store was closed: the file opens cleanly with no pending transaction
        let mut reopened = SqliteSink::open(&store_at(&db)).unwrap();
        reopened.close().unwrap();
    }

    /// Record limit stops a run that would otherwise never end
    #[test]
    fn test_e2e_limit_on_endless_simulator() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("out.db");

        let stream = SimulatedStream::new(&fast_simulator(3));
        let sink = SqliteSink::open(&store_at(&db)).unwrap();
        let options = LoopOptions {
            max_records: Some(25),
            ..quiet()
        };

        let summary =
            IngestionLoop::new(Box::new(stream), Box::new(sink), options, CancellationToken::new())
                .run()
                .unwrap();

        assert_eq!(summary.stop_reason, StopReason::LimitReached);
        assert_eq!(count_rows(&db, ""), 25);
    }

    /// Configuration file drives store and simulator
    #[test]
    fn test_e2e_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("configured.db");
        let toml = format!(
            "[store]\npath = {:?}\ntable = \"samples\"\n\n[simulator]\ncycle_delay_ms = 0\nseed = 11\n\n[ingest]\nmax_records = 12\necho_lines = false\n",
            db.display().to_string()
        );
        let config =
            config_loader::ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml)
                .unwrap();

        let stream = SimulatedStream::new(&config.simulator);
        let sink = SqliteSink::open(&config.store).unwrap();
        let summary = IngestionLoop::new(
            Box::new(stream),
            Box::new(sink),
            LoopOptions::from(&config.ingest),
            CancellationToken::new(),
        )
        .run()
        .unwrap();

        assert_eq!(summary.metrics.records_persisted, 12);
        let conn = Connection::open(&db).unwrap();
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM samples", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 12);
    }
}
