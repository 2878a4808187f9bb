//! SqliteSink - appends records to a SQLite table
//!
//! Appends open a transaction lazily; `commit` ends it. The ingestion loop
//! commits once per received chunk, so a crash loses at most one chunk.

use std::path::Path;

use contracts::{ContractError, Record, RecordSink, StoreConfig};
use rusqlite::{params, Connection};
use tracing::{debug, info, instrument, warn};

/// SQLite-backed record sink
pub struct SqliteSink {
    name: String,
    table: String,
    conn: Option<Connection>,
    insert_sql: String,
    pending: u64,
    committed: u64,
}

impl SqliteSink {
    /// Open (or create) the database file and initialise the schema
    pub fn open(config: &StoreConfig) -> Result<Self, ContractError> {
        Self::open_path(&config.path, &config.table)
    }

    /// Open a database file with an explicit table name
    pub fn open_path(path: &Path, table: &str) -> Result<Self, ContractError> {
        let name = path.display().to_string();
        let conn =
            Connection::open(path).map_err(|e| ContractError::storage_with_source(&name, e))?;
        let sink = Self::with_connection(name, conn, table)?;
        info!(path = %sink.name, table = %sink.table, "record store opened");
        Ok(sink)
    }

    /// In-memory database, gone on close
    pub fn open_in_memory(table: &str) -> Result<Self, ContractError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| ContractError::storage_with_source(":memory:", e))?;
        Self::with_connection(":memory:".to_string(), conn, table)
    }

    fn with_connection(name: String, conn: Connection, table: &str) -> Result<Self, ContractError> {
        let probe = StoreConfig {
            table: table.to_string(),
            ..Default::default()
        };
        if !probe.has_plain_table_name() {
            return Err(ContractError::config_validation(
                "store.table",
                format!("'{table}' is not a plain SQL identifier"),
            ));
        }

        let mut sink = Self {
            name,
            table: table.to_string(),
            conn: Some(conn),
            insert_sql: format!(
                "INSERT INTO {table} (loopcount, active_line, digi_A, digi_B, digi_C, \
                 raw_A, raw_B, raw_C, vout, resistance, short_circuit) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ),
            pending: 0,
            committed: 0,
        };
        sink.init_schema()?;
        Ok(sink)
    }

    /// Create the records table if it does not exist
    ///
    /// Idempotent: calling it on an initialised database is a no-op.
    #[instrument(name = "sqlite_sink_init_schema", skip(self), fields(table = %self.table))]
    pub fn init_schema(&mut self) -> Result<(), ContractError> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                loopcount INTEGER,
                active_line VARCHAR(1),
                digi_A INTEGER,
                digi_B INTEGER,
                digi_C INTEGER,
                raw_A INTEGER,
                raw_B INTEGER,
                raw_C INTEGER,
                vout REAL,
                resistance REAL,
                short_circuit INTEGER
            )",
            self.table
        );
        let name = self.name.clone();
        self.connection()?
            .execute_batch(&sql)
            .map_err(|e| ContractError::storage_with_source(name, e))
    }

    /// Rows currently stored in the table, committed or not
    pub fn row_count(&self) -> Result<u64, ContractError> {
        let conn = self.conn.as_ref().ok_or_else(|| self.closed_error())?;
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", self.table), [], |row| {
                row.get(0)
            })
            .map_err(|e| ContractError::storage_with_source(&self.name, e))?;
        Ok(count.max(0) as u64)
    }

    /// Records committed since open
    pub fn committed(&self) -> u64 {
        self.committed
    }

    fn connection(&mut self) -> Result<&mut Connection, ContractError> {
        self.conn
            .as_mut()
            .ok_or_else(|| ContractError::storage(&self.name, "store is closed"))
    }

    fn closed_error(&self) -> ContractError {
        ContractError::storage(&self.name, "store is closed")
    }
}

impl RecordSink for SqliteSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "sqlite_sink_append",
        skip(self, record),
        fields(sink = %self.name, loopcount = record.loopcount)
    )]
    fn append(&mut self, record: &Record) -> Result<(), ContractError> {
        let name = self.name.clone();
        let loopcount = i64::try_from(record.loopcount).map_err(|_| {
            ContractError::storage(&name, format!("loopcount {} overflows", record.loopcount))
        })?;
        let active_line = record.active_line.as_char().to_string();
        let sql = self.insert_sql.clone();
        let conn = self.connection()?;

        if conn.is_autocommit() {
            conn.execute_batch("BEGIN")
                .map_err(|e| ContractError::storage_with_source(&name, e))?;
        }

        conn.prepare_cached(&sql)
            .and_then(|mut stmt| {
                stmt.execute(params![
                    loopcount,
                    active_line,
                    record.digi_a,
                    record.digi_b,
                    record.digi_c,
                    record.raw_a,
                    record.raw_b,
                    record.raw_c,
                    record.vout,
                    record.resistance,
                    record.short_circuit,
                ])
            })
            .map_err(|e| ContractError::storage_with_source(&name, e))?;

        self.pending += 1;
        Ok(())
    }

    #[instrument(name = "sqlite_sink_commit", skip(self), fields(sink = %self.name))]
    fn commit(&mut self) -> Result<(), ContractError> {
        let name = self.name.clone();
        let conn = self.connection()?;
        if !conn.is_autocommit() {
            conn.execute_batch("COMMIT")
                .map_err(|e| ContractError::storage_with_source(&name, e))?;
        }

        if self.pending > 0 {
            debug!(records = self.pending, "committed");
        }
        self.committed += self.pending;
        self.pending = 0;
        Ok(())
    }

    #[instrument(name = "sqlite_sink_close", skip(self), fields(sink = %self.name))]
    fn close(&mut self) -> Result<(), ContractError> {
        if self.conn.is_none() {
            return Ok(());
        }

        let committed = self.commit();
        let Some(conn) = self.conn.take() else {
            return committed;
        };

        if committed.is_err() && !conn.is_autocommit() {
            if let Err(e) = conn.execute_batch("ROLLBACK") {
                warn!(error = %e, "rollback failed");
            }
        }

        conn.close()
            .map_err(|(_, e)| ContractError::storage_with_source(&self.name, e))?;
        info!(records = self.committed, "SqliteSink closed");
        committed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ActiveLine;

    fn record(loopcount: u64, line: ActiveLine, short_circuit: i64) -> Record {
        Record {
            loopcount,
            active_line: line,
            digi_a: 0,
            digi_b: 0,
            digi_c: 0,
            raw_a: 700,
            raw_b: 800,
            raw_c: 900,
            vout: 3.2,
            resistance: 5.43,
            short_circuit,
        }
    }

    #[test]
    fn test_init_schema_twice_is_noop() {
        let mut sink = SqliteSink::open_in_memory("data").unwrap();
        sink.init_schema().unwrap();
        sink.init_schema().unwrap();

        let tables: i64 = sink
            .conn
            .as_ref()
            .unwrap()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'data'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[test]
    fn test_append_commit_persists_fields() {
        let mut sink = SqliteSink::open_in_memory("data").unwrap();
        sink.append(&record(5, ActiveLine::B, 0)).unwrap();
        sink.append(&record(5, ActiveLine::A, 2)).unwrap();
        sink.commit().unwrap();

        assert_eq!(sink.row_count().unwrap(), 2);
        assert_eq!(sink.committed(), 2);

        let (id, line, raw_b, vout, short): (i64, String, i64, f64, i64) = sink
            .conn
            .as_ref()
            .unwrap()
            .query_row(
                "SELECT id, active_line, raw_B, vout, short_circuit FROM data ORDER BY id DESC LIMIT 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .unwrap();
        assert_eq!(id, 2);
        assert_eq!(line, "A");
        assert_eq!(raw_b, 800);
        assert!((vout - 3.2).abs() < 1e-9);
        assert_eq!(short, 2);
    }

    #[test]
    fn test_close_commits_pending_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("serial_output.db");

        let mut sink = SqliteSink::open_path(&path, "data").unwrap();
        sink.append(&record(1, ActiveLine::C, 0)).unwrap();
        sink.close().unwrap();
        sink.close().unwrap();

        let reopened = SqliteSink::open_path(&path, "data").unwrap();
        assert_eq!(reopened.row_count().unwrap(), 1);
    }

    #[test]
    fn test_reopen_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig {
            path: dir.path().join("station.db"),
            table: "samples".to_string(),
        };

        let mut first = SqliteSink::open(&config).unwrap();
        first.append(&record(1, ActiveLine::C, 0)).unwrap();
        first.commit().unwrap();
        first.close().unwrap();

        let mut second = SqliteSink::open(&config).unwrap();
        second.append(&record(2, ActiveLine::C, 0)).unwrap();
        second.commit().unwrap();
        assert_eq!(second.row_count().unwrap(), 2);
    }

    #[test]
    fn test_append_after_close_is_storage_error() {
        let mut sink = SqliteSink::open_in_memory("data").unwrap();
        sink.close().unwrap();

        let err = sink.append(&record(1, ActiveLine::A, 0)).unwrap_err();
        assert!(matches!(err, ContractError::Storage { .. }));
    }

    #[test]
    fn test_rejects_unsafe_table_name() {
        let err = SqliteSink::open_in_memory("data; DROP TABLE x").err().unwrap();
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
    }

    #[test]
    fn test_largest_loopcount_is_stored() {
        let mut sink = SqliteSink::open_in_memory("data").unwrap();
        sink.append(&record(i64::MAX as u64, ActiveLine::A, 0)).unwrap();
        sink.commit().unwrap();

        let stored: i64 = sink
            .conn
            .as_ref()
            .unwrap()
            .query_row("SELECT loopcount FROM data", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stored, i64::MAX);
    }
}
